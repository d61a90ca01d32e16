pub mod config;
pub mod core;
pub mod handlers;
pub mod utils;
pub mod knowledge_graph;
pub mod nlp;
pub mod ontology;
pub mod sparql;
pub mod templates;
pub mod wordnet;

pub use config::Configuration;
pub use crate::core::{PhraseMatcher, RankedMatch, TermResult};
pub use handlers::{create_router, AppState};
pub use knowledge_graph::LocalOntology;
pub use ontology::OntologyCategorizer;
pub use sparql::{OntologyBackend, SparqlClient};
pub use templates::TemplateManager;
pub use wordnet::WordNet;
