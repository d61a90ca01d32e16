pub mod client;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub use client::SparqlClient;

pub const DEFAULT_SVU_NAMESPACE: &str = "http://www.geoscienceontology.org/svo/svu#";

/// A variable found through one of its component labels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableMatch {
    /// Local name of the variable IRI (the part after `#`).
    pub iri: String,
    pub label: String,
}

impl VariableMatch {
    pub fn new(iri: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            iri: iri.into(),
            label: label.into(),
        }
    }
}

/// Source of ontology lookups: a remote SPARQL endpoint or a local dump.
#[async_trait]
pub trait OntologyBackend: Send + Sync {
    /// Class names of the entities whose label is exactly `term`.
    async fn classes_for_label(&self, term: &str) -> Result<Vec<String>>;

    /// Variables having `term` as a sub-label, one entry per variable.
    async fn variables_for_sublabel(&self, term: &str) -> Result<Vec<VariableMatch>>;

    fn describe(&self) -> String;
}

/// SPARQL 1.1 query results, JSON serialization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SparqlResults {
    #[serde(default)]
    pub head: SparqlHead,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub results: Option<SparqlBindings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub boolean: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SparqlHead {
    #[serde(default)]
    pub vars: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SparqlBindings {
    pub bindings: Vec<HashMap<String, SparqlTerm>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SparqlTerm {
    #[serde(rename = "type")]
    pub kind: String,
    pub value: String,
    #[serde(rename = "xml:lang", default, skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datatype: Option<String>,
}

impl SparqlResults {
    pub fn bindings(&self) -> &[HashMap<String, SparqlTerm>] {
        self.results.as_ref().map(|r| r.bindings.as_slice()).unwrap_or(&[])
    }

    /// Distinct class local names from a class lookup, in result order.
    pub fn classes(&self) -> Vec<String> {
        let mut classes: Vec<String> = Vec::new();
        for binding in self.bindings() {
            if let Some(class) = binding.get("class") {
                let name = iri_fragment(&class.value).to_string();
                if !classes.contains(&name) {
                    classes.push(name);
                }
            }
        }
        classes
    }

    /// Variables from a variable lookup, keeping the first label per variable.
    pub fn variables(&self) -> Vec<VariableMatch> {
        let mut variables: Vec<VariableMatch> = Vec::new();
        for binding in self.bindings() {
            let (Some(variable), Some(label)) = (binding.get("variable"), binding.get("varlabel")) else {
                continue;
            };
            let iri = iri_fragment(&variable.value);
            if !variables.iter().any(|v| v.iri == iri) {
                variables.push(VariableMatch::new(iri, label.value.clone()));
            }
        }
        variables
    }
}

/// The text after the first `#` of an IRI, or the whole IRI when it has none.
pub fn iri_fragment(iri: &str) -> &str {
    iri.split('#').nth(1).unwrap_or(iri)
}

/// Metacharacters of the XPath regex dialect used by SPARQL `regex()`.
const XPATH_META: &[char] = &['\\', '.', '?', '*', '+', '(', ')', '[', ']', '{', '}', '^', '$', '|', '-'];

/// Make `term` safe inside `regex(?label, "^...$")`: XPath regex
/// metacharacters are escaped, then the result is escaped as a SPARQL string.
pub fn regex_literal(term: &str) -> String {
    let mut literal = String::new();
    for c in term.chars() {
        if XPATH_META.contains(&c) {
            // regex escape, itself escaped for the SPARQL string
            literal.push_str("\\\\");
        }
        match c {
            '\\' => literal.push_str("\\\\"),
            '"' => literal.push_str("\\\""),
            '\n' => literal.push_str("\\n"),
            '\r' => literal.push_str("\\r"),
            '\t' => literal.push_str("\\t"),
            c => literal.push(c),
        }
    }
    literal
}

#[cfg(test)]
mod tests {
    use super::*;

    const VARIABLE_RESULTS: &str = r#"{
        "head": {"vars": ["variable", "label", "varlabel"]},
        "results": {"bindings": [
            {"variable": {"type": "uri", "value": "http://www.geoscienceontology.org/svo/svl/variable#river__discharge"},
             "label": {"type": "literal", "value": "river"},
             "varlabel": {"type": "literal", "value": "river discharge"}},
            {"variable": {"type": "uri", "value": "http://www.geoscienceontology.org/svo/svl/variable#river__discharge"},
             "label": {"type": "literal", "value": "river"},
             "varlabel": {"type": "literal", "xml:lang": "en", "value": "discharge of river"}},
            {"variable": {"type": "uri", "value": "http://www.geoscienceontology.org/svo/svl/variable#river_bed__width"},
             "label": {"type": "literal", "value": "river"},
             "varlabel": {"type": "literal", "value": "river bed width"}}
        ]}
    }"#;

    #[test]
    fn test_variables_deduplicate_by_iri() {
        let results: SparqlResults = serde_json::from_str(VARIABLE_RESULTS).unwrap();
        let variables = results.variables();

        assert_eq!(
            variables,
            vec![
                VariableMatch::new("river__discharge", "river discharge"),
                VariableMatch::new("river_bed__width", "river bed width"),
            ]
        );
    }

    #[test]
    fn test_classes_deduplicate() {
        let results: SparqlResults = serde_json::from_str(
            r#"{"head": {"vars": ["entity", "class"]}, "results": {"bindings": [
                {"entity": {"type": "uri", "value": "http://x#a"}, "class": {"type": "uri", "value": "http://svo#Phenomenon"}},
                {"entity": {"type": "uri", "value": "http://x#b"}, "class": {"type": "uri", "value": "http://svo#Phenomenon"}},
                {"entity": {"type": "uri", "value": "http://x#b"}, "class": {"type": "uri", "value": "http://svo#Matter"}}
            ]}}"#,
        )
        .unwrap();

        assert_eq!(results.classes(), vec!["Phenomenon", "Matter"]);
    }

    #[test]
    fn test_boolean_results() {
        let results: SparqlResults = serde_json::from_str(r#"{"head": {}, "boolean": true}"#).unwrap();
        assert_eq!(results.boolean, Some(true));
        assert!(results.bindings().is_empty());
    }

    #[test]
    fn test_iri_fragment() {
        assert_eq!(iri_fragment("http://example.org/svu#Variable"), "Variable");
        assert_eq!(iri_fragment("http://example.org/a#b#c"), "b");
        assert_eq!(iri_fragment("http://example.org/plain"), "http://example.org/plain");
    }

    #[test]
    fn test_regex_literal() {
        assert_eq!(regex_literal("river"), "river");
        assert_eq!(regex_literal("a.b"), r"a\\.b");
        assert_eq!(regex_literal("say \"hi\""), r#"say \"hi\""#);
        assert_eq!(regex_literal("north-east (a|b)"), r"north\\-east \\(a\\|b\\)");
        assert_eq!(regex_literal(r"a\b"), r"a\\\\b");
    }

    #[test]
    fn test_regex_literal_leaves_non_xpath_characters() {
        // `\#`, `\&` and `\~` are not valid XPath regex escapes
        assert_eq!(regex_literal("a#b&c~d"), "a#b&c~d");
        assert_eq!(regex_literal("river%7Eflow"), "river%7Eflow");
    }
}
