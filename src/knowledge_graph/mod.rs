use anyhow::{Context, Result};
use async_trait::async_trait;
use rio_api::model::{Literal, Subject, Term};
use rio_api::parser::TriplesParser;
use rio_turtle::{NTriplesParser, TurtleError, TurtleParser};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

use crate::sparql::{iri_fragment, OntologyBackend, VariableMatch};

const RDF_TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";
const RDFS_LABEL: &str = "http://www.w3.org/2000/01/rdf-schema#label";

#[derive(Debug, Default)]
struct Resource {
    types: Vec<String>,
    labels: Vec<String>,
    sub_labels: Vec<String>,
}

/// An ontology dump held in memory, answering the same lookups as the
/// SPARQL endpoint.
pub struct LocalOntology {
    source: String,
    svu_namespace: String,
    order: Vec<String>,
    resources: HashMap<String, Resource>,
    triple_count: usize,
}

impl LocalOntology {
    pub fn new(source: &str, svu_namespace: &str) -> Self {
        Self {
            source: source.to_string(),
            svu_namespace: svu_namespace.to_string(),
            order: Vec::new(),
            resources: HashMap::new(),
            triple_count: 0,
        }
    }

    /// Load a `.nt` file as N-Triples, anything else as Turtle.
    pub fn from_file<P: AsRef<Path>>(path: P, svu_namespace: &str) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read ontology file: {}", path.display()))?;

        let mut ontology = Self::new(&path.display().to_string(), svu_namespace);
        let is_ntriples = path.extension().and_then(|s| s.to_str()) == Some("nt");
        let loaded = if is_ntriples {
            ontology.load(NTriplesParser::new(content.as_bytes()))
        } else {
            ontology.load(TurtleParser::new(content.as_bytes(), None))
        };
        loaded.with_context(|| format!("Failed to parse ontology file: {}", path.display()))?;

        info!(
            "Loaded {} triples about {} resources from: {}",
            ontology.triple_count,
            ontology.order.len(),
            path.display()
        );
        Ok(ontology)
    }

    pub fn from_turtle(content: &str, svu_namespace: &str) -> Result<Self> {
        let mut ontology = Self::new("inline turtle", svu_namespace);
        ontology
            .load(TurtleParser::new(content.as_bytes(), None))
            .context("Failed to parse turtle")?;
        Ok(ontology)
    }

    fn load<P>(&mut self, mut parser: P) -> Result<(), TurtleError>
    where
        P: TriplesParser<Error = TurtleError>,
    {
        let sub_label = format!("{}subLabel", self.svu_namespace);

        parser.parse_all(&mut |triple| -> Result<(), TurtleError> {
            let subject = match triple.subject {
                Subject::NamedNode(node) => node.iri.to_string(),
                Subject::BlankNode(node) => format!("_:{}", node.id),
                _ => return Ok(()),
            };
            let object = match triple.object {
                Term::NamedNode(node) => node.iri.to_string(),
                Term::BlankNode(node) => format!("_:{}", node.id),
                Term::Literal(Literal::Simple { value })
                | Term::Literal(Literal::LanguageTaggedString { value, .. })
                | Term::Literal(Literal::Typed { value, .. }) => value.to_string(),
                _ => return Ok(()),
            };

            self.triple_count += 1;
            let predicate = triple.predicate.iri;
            if predicate != RDF_TYPE && predicate != RDFS_LABEL && predicate != sub_label {
                return Ok(());
            }

            if !self.resources.contains_key(&subject) {
                self.order.push(subject.clone());
            }
            let resource = self.resources.entry(subject).or_default();
            match predicate {
                RDF_TYPE => resource.types.push(object),
                RDFS_LABEL => resource.labels.push(object),
                _ => resource.sub_labels.push(object),
            }
            Ok(())
        })
    }

    fn resources(&self) -> impl Iterator<Item = (&str, &Resource)> {
        self.order
            .iter()
            .filter_map(|iri| self.resources.get(iri).map(|r| (iri.as_str(), r)))
    }

    /// Class names of the resources labelled exactly `term`.
    pub fn classes(&self, term: &str) -> Vec<String> {
        let mut classes: Vec<String> = Vec::new();
        for (_, resource) in self.resources() {
            if !resource.labels.iter().any(|l| l == term) {
                continue;
            }
            for class in &resource.types {
                let name = iri_fragment(class).to_string();
                if !classes.contains(&name) {
                    classes.push(name);
                }
            }
        }
        classes
    }

    /// Variables having `term` as a sub-label, with their first label.
    pub fn variables(&self, term: &str) -> Vec<VariableMatch> {
        let variable_class = format!("{}Variable", self.svu_namespace);
        let mut variables: Vec<VariableMatch> = Vec::new();

        for (iri, resource) in self.resources() {
            if !resource.types.contains(&variable_class) || !resource.sub_labels.iter().any(|l| l == term) {
                continue;
            }
            let Some(label) = resource.labels.first() else {
                debug!("Skipping unlabelled variable {}", iri);
                continue;
            };
            let name = iri_fragment(iri);
            if !variables.iter().any(|v| v.iri == name) {
                variables.push(VariableMatch::new(name, label.clone()));
            }
        }
        variables
    }

    pub fn get_statistics(&self) -> OntologyStats {
        let variable_class = format!("{}Variable", self.svu_namespace);
        let resources: Vec<&Resource> = self.resources().map(|(_, r)| r).collect();

        OntologyStats {
            total_triples: self.triple_count,
            resources: resources.len(),
            labelled_resources: resources.iter().filter(|r| !r.labels.is_empty()).count(),
            variables: resources.iter().filter(|r| r.types.contains(&variable_class)).count(),
        }
    }
}

#[async_trait]
impl OntologyBackend for LocalOntology {
    async fn classes_for_label(&self, term: &str) -> Result<Vec<String>> {
        Ok(self.classes(term))
    }

    async fn variables_for_sublabel(&self, term: &str) -> Result<Vec<VariableMatch>> {
        Ok(self.variables(term))
    }

    fn describe(&self) -> String {
        format!("local ontology {}", self.source)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OntologyStats {
    pub total_triples: usize,
    pub resources: usize,
    pub labelled_resources: usize,
    pub variables: usize,
}

impl std::fmt::Display for OntologyStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f,
            "Ontology Statistics:\n\
             Total Triples: {}\n\
             Resources: {}\n\
             Labelled Resources: {}\n\
             Variables: {}",
            self.total_triples,
            self.resources,
            self.labelled_resources,
            self.variables
        )
    }
}
