use anyhow::{Context, Result};
use handlebars::Handlebars;
use serde::Serialize;
use serde_json::json;

use crate::sparql::regex_literal;

const CLASS_LOOKUP: &str = r#"PREFIX rdf: <http://www.w3.org/1999/02/22-rdf-syntax-ns#>
PREFIX rdfs: <http://www.w3.org/2000/01/rdf-schema#>

SELECT ?entity ?class
WHERE { ?entity a ?class .
       ?entity rdfs:label ?label .
       FILTER regex(?label,"^{{{term}}}$") .}
"#;

const VARIABLE_LOOKUP: &str = r#"PREFIX rdf: <http://www.w3.org/1999/02/22-rdf-syntax-ns#>
PREFIX rdfs: <http://www.w3.org/2000/01/rdf-schema#>
PREFIX svu: <{{{svu_namespace}}}>

SELECT ?variable ?label ?varlabel
WHERE { ?variable a svu:Variable .
       ?variable rdfs:label ?varlabel .
       ?variable svu:subLabel ?label .
       FILTER regex(?label,"^{{{term}}}$") .}
"#;

const INSTRUCTIONS: &str = r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="utf-8">
  <title>{{name}}</title>
</head>
<body>
  <h1>{{name}}</h1>
  <p>Match a phrase against the variables of the Scientific Variables Ontology.</p>
  <h2>Usage</h2>
  <pre>GET /match_phrase/&lt;phrase&gt;</pre>
  <p>
    The phrase is made of letters, with words separated by underscores,
    for example <a href="/match_phrase/{{example}}">/match_phrase/{{example}}</a>.
  </p>
  <p>
    The response is a JSON object whose <code>results</code> list holds up to
    {{max_results}} matches, best first. Each match carries the variable
    <code>IRI</code>, its <code>label</code> and a <code>matchrank</code> between 0 and 1.
  </p>
  <pre>{"results": [{"IRI": "...", "label": "...", "matchrank": 0.875}]}</pre>
  <p>Words describing a state are expanded through their WordNet definitions.</p>
  <p>Ontology source: <code>{{backend}}</code></p>
  <hr>
  <small>version {{version}}</small>
</body>
</html>
"#;

#[derive(Debug, Clone, Serialize)]
pub struct InstructionsContext {
    pub name: String,
    pub version: String,
    pub example: String,
    pub max_results: usize,
    pub backend: String,
}

/// Renders SPARQL query text and the instructions page.
pub struct TemplateManager {
    handlebars: Handlebars<'static>,
}

impl TemplateManager {
    pub fn new() -> Result<Self> {
        let mut handlebars = Handlebars::new();
        handlebars.set_strict_mode(true);

        handlebars
            .register_template_string("class_lookup", CLASS_LOOKUP)
            .context("Invalid class lookup template")?;
        handlebars
            .register_template_string("variable_lookup", VARIABLE_LOOKUP)
            .context("Invalid variable lookup template")?;
        handlebars
            .register_template_string("instructions", INSTRUCTIONS)
            .context("Invalid instructions template")?;

        Ok(Self { handlebars })
    }

    /// Query for the classes of entities labelled exactly `term`.
    pub fn class_query(&self, term: &str) -> Result<String> {
        self.handlebars
            .render("class_lookup", &json!({ "term": regex_literal(term) }))
            .with_context(|| format!("Failed to render class query for '{}'", term))
    }

    /// Query for the variables having `term` as a component label.
    pub fn variable_query(&self, term: &str, svu_namespace: &str) -> Result<String> {
        self.handlebars
            .render(
                "variable_lookup",
                &json!({ "term": regex_literal(term), "svu_namespace": svu_namespace }),
            )
            .with_context(|| format!("Failed to render variable query for '{}'", term))
    }

    pub fn instructions(&self, context: &InstructionsContext) -> Result<String> {
        self.handlebars
            .render("instructions", context)
            .context("Failed to render instructions page")
    }
}
