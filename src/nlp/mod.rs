pub mod tagger;
pub mod tokenizer;

use std::path::PathBuf;
use thiserror::Error;

pub use tagger::{AveragedPerceptron, LexiconTagger, PerceptronTagger};
pub use tokenizer::word_tokenize;

#[derive(Debug, Error)]
pub enum TaggerError {
    #[error("no '*{suffix}' model file in {dir}")]
    MissingModelFile { dir: PathBuf, suffix: String },

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid tagger model {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Assigns Penn Treebank part-of-speech tags to tokens.
pub trait PosTagger: Send + Sync {
    fn tag(&self, tokens: &[String]) -> Vec<(String, String)>;

    fn name(&self) -> &'static str;
}

/// Tokenize `text` and keep the words tagged as nouns (`NN*`).
pub fn extract_nouns(text: &str, tagger: &dyn PosTagger) -> Vec<String> {
    let tokens = word_tokenize(text);
    tagger
        .tag(&tokens)
        .into_iter()
        .filter(|(_, tag)| tag.starts_with("NN"))
        .map(|(word, _)| word)
        .collect()
}
