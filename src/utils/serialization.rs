use anyhow::{Result, Context};
use serde::{Deserialize, Serialize};

use crate::core::RankedMatch;
use crate::ontology::{SenseCategories, SenseMembership};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
}

pub struct MatchSerializer;

impl MatchSerializer {
    pub fn new() -> Self {
        Self
    }

    pub fn serialize(&self, matches: &[RankedMatch], format: OutputFormat) -> Result<String> {
        match format {
            OutputFormat::Table => Ok(self.serialize_table(matches)),
            OutputFormat::Json => self.serialize_json(matches),
            OutputFormat::Csv => self.serialize_csv(matches),
        }
    }

    fn serialize_table(&self, matches: &[RankedMatch]) -> String {
        if matches.is_empty() {
            return "No matching variables\n".to_string();
        }

        let iri_width = matches.iter().map(|m| m.iri.len()).max().unwrap_or(0).max(3);
        let label_width = matches.iter().map(|m| m.label.len()).max().unwrap_or(0).max(5);

        let mut output = String::new();
        output.push_str(&format!(
            "{:<4} {:<iri_width$}  {:<label_width$}  {}\n",
            "#", "IRI", "label", "matchrank",
        ));
        for (i, m) in matches.iter().enumerate() {
            output.push_str(&format!(
                "{:<4} {:<iri_width$}  {:<label_width$}  {:.3}\n",
                i + 1,
                m.iri,
                m.label,
                m.match_rank,
            ));
        }
        output
    }

    /// Same shape as the HTTP response body.
    fn serialize_json(&self, matches: &[RankedMatch]) -> Result<String> {
        serde_json::to_string_pretty(&serde_json::json!({ "results": matches }))
            .context("Failed to serialize to JSON")
    }

    /// Header comes from the serde field names: `IRI,label,matchrank`.
    fn serialize_csv(&self, matches: &[RankedMatch]) -> Result<String> {
        let mut wtr = csv::WriterBuilder::new()
            .has_headers(true)
            .from_writer(Vec::new());

        if matches.is_empty() {
            wtr.write_record(["IRI", "label", "matchrank"])?;
        }
        for m in matches {
            wtr.serialize(m).context("Failed to serialize to CSV")?;
        }
        wtr.flush()?;

        let data = wtr
            .into_inner()
            .map_err(|e| anyhow::anyhow!("Failed to finish CSV output: {}", e))?;
        String::from_utf8(data).context("CSV output is not valid UTF-8")
    }
}

impl Default for MatchSerializer {
    fn default() -> Self {
        Self::new()
    }
}

/// One line per sense: index, part of speech, categories and definition.
pub fn format_what_is(rows: &[SenseCategories]) -> String {
    let mut output = String::new();
    for row in rows {
        let categories = if row.categories.is_empty() {
            "-".to_string()
        } else {
            row.categories.join(", ")
        };
        output.push_str(&format!(
            "{}.{} ({}) [{}] {}\n",
            row.term, row.index, row.pos, categories, row.definition
        ));
    }
    output
}

pub fn format_is_cat(rows: &[SenseMembership], category: &str) -> String {
    let mut output = String::new();
    for row in rows {
        output.push_str(&format!(
            "{}.{} ({}) {}: {} | {}\n",
            row.term,
            row.index,
            row.pos,
            category,
            if row.member { "yes" } else { "no" },
            row.definition
        ));
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wordnet::Pos;

    fn matches() -> Vec<RankedMatch> {
        vec![
            RankedMatch {
                iri: "river%7Evolume__flow_rate".to_string(),
                label: "river volume flow rate".to_string(),
                match_rank: 0.875,
            },
            RankedMatch {
                iri: "river__depth".to_string(),
                label: "depth, of river".to_string(),
                match_rank: 0.5,
            },
        ]
    }

    #[test]
    fn test_serialize_json_matches_http_shape() {
        let output = MatchSerializer::new().serialize(&matches(), OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();

        assert_eq!(value["results"][0]["IRI"], "river%7Evolume__flow_rate");
        assert_eq!(value["results"][1]["matchrank"], 0.5);
    }

    #[test]
    fn test_serialize_csv_quotes_fields() {
        let output = MatchSerializer::new().serialize(&matches(), OutputFormat::Csv).unwrap();
        let lines: Vec<&str> = output.lines().collect();

        assert_eq!(lines[0], "IRI,label,matchrank");
        assert_eq!(lines[2], "river__depth,\"depth, of river\",0.5");
    }

    #[test]
    fn test_serialize_csv_quotes_line_breaks() {
        let mut rows = matches();
        rows[0].label = "flow\rrate".to_string();
        let output = MatchSerializer::new().serialize(&rows, OutputFormat::Csv).unwrap();

        assert!(output.contains("river%7Evolume__flow_rate,\"flow\rrate\",0.875\n"));
        assert_eq!(
            MatchSerializer::new().serialize(&[], OutputFormat::Csv).unwrap(),
            "IRI,label,matchrank\n"
        );
    }

    #[test]
    fn test_serialize_table() {
        let output = MatchSerializer::new().serialize(&matches(), OutputFormat::Table).unwrap();
        assert!(output.lines().nth(1).unwrap().contains("0.875"));
        assert_eq!(MatchSerializer::new().serialize(&[], OutputFormat::Table).unwrap(), "No matching variables\n");
    }

    #[test]
    fn test_format_reports() {
        let what_is = format_what_is(&[SenseCategories {
            term: "flood".to_string(),
            index: 0,
            definition: "the rising of a body of water".to_string(),
            pos: Pos::Noun,
            categories: vec!["process".to_string(), "state".to_string()],
            labels: vec![],
        }]);
        assert_eq!(what_is, "flood.0 (n) [process, state] the rising of a body of water\n");

        let is_cat = format_is_cat(
            &[SenseMembership {
                term: "flood".to_string(),
                index: 1,
                definition: "a large flow".to_string(),
                pos: Pos::Noun,
                member: false,
            }],
            "state",
        );
        assert_eq!(is_cat, "flood.1 (n) state: no | a large flow\n");
    }
}
