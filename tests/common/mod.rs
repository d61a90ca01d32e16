#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use svo_term_matcher::{
    config::Configuration,
    core::PhraseMatcher,
    knowledge_graph::LocalOntology,
    nlp::{LexiconTagger, PosTagger},
    ontology::OntologyCategorizer,
    sparql::{OntologyBackend, DEFAULT_SVU_NAMESPACE},
    wordnet::WordNet,
};

pub fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name)
}

pub fn config() -> Configuration {
    let mut config = Configuration::default();
    config.wordnet.dict_dir = fixture("wordnet");
    config.sparql.local_ontology = Some(fixture("svo.ttl"));
    config
}

pub fn wordnet() -> Arc<WordNet> {
    Arc::new(WordNet::open(fixture("wordnet")).unwrap())
}

pub fn categorizer(wordnet: Arc<WordNet>) -> Arc<OntologyCategorizer> {
    Arc::new(OntologyCategorizer::svo(wordnet))
}

pub fn local_ontology() -> Arc<LocalOntology> {
    Arc::new(LocalOntology::from_file(fixture("svo.ttl"), DEFAULT_SVU_NAMESPACE).unwrap())
}

pub fn matcher_with(backend: Arc<dyn OntologyBackend>) -> Arc<PhraseMatcher> {
    let config = config();
    let wordnet = wordnet();
    let tagger: Arc<dyn PosTagger> = Arc::new(LexiconTagger::new(wordnet.clone()));
    Arc::new(PhraseMatcher::new(
        backend,
        categorizer(wordnet),
        tagger,
        config.match_settings(),
    ))
}

pub fn matcher() -> Arc<PhraseMatcher> {
    matcher_with(local_ontology())
}
