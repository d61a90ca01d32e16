use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

use super::{PosTagger, TaggerError};
use crate::wordnet::{Pos, WordNet};

const START: [&str; 2] = ["-START-", "-START2-"];
const END: [&str; 2] = ["-END-", "-END2-"];

/// Averaged perceptron weights: feature -> class -> weight.
#[derive(Debug, Default)]
pub struct AveragedPerceptron {
    pub weights: HashMap<String, HashMap<String, f64>>,
    pub classes: Vec<String>,
}

impl AveragedPerceptron {
    /// Highest scoring class; ties go to the lexicographically greater class.
    pub fn predict(&self, features: &HashMap<String, f64>) -> Option<&str> {
        let mut scores: HashMap<&str, f64> = HashMap::new();
        for (feature, value) in features {
            if *value == 0.0 {
                continue;
            }
            if let Some(weights) = self.weights.get(feature) {
                for (label, weight) in weights {
                    *scores.entry(label.as_str()).or_insert(0.0) += value * weight;
                }
            }
        }

        self.classes
            .iter()
            .map(|class| (scores.get(class.as_str()).copied().unwrap_or(0.0), class.as_str()))
            .max_by(|a, b| a.0.total_cmp(&b.0).then_with(|| a.1.cmp(b.1)))
            .map(|(_, class)| class)
    }
}

/// Greedy averaged perceptron tagger reading the NLTK JSON model layout
/// (`*.weights.json`, `*.tagdict.json`, `*.classes.json`).
#[derive(Debug, Default)]
pub struct PerceptronTagger {
    model: AveragedPerceptron,
    tagdict: HashMap<String, String>,
}

impl PerceptronTagger {
    pub fn new(model: AveragedPerceptron, tagdict: HashMap<String, String>) -> Self {
        Self { model, tagdict }
    }

    pub fn from_dir<P: AsRef<Path>>(model_dir: P) -> Result<Self, TaggerError> {
        let model_dir = model_dir.as_ref();

        let weights: HashMap<String, HashMap<String, f64>> =
            read_json(&find_model_file(model_dir, ".weights.json")?)?;
        let tagdict: HashMap<String, String> = read_json(&find_model_file(model_dir, ".tagdict.json")?)?;
        let classes: Vec<String> = read_json(&find_model_file(model_dir, ".classes.json")?)?;

        info!(
            "Perceptron tagger loaded from {}: {} features, {} classes, {} dictionary words",
            model_dir.display(),
            weights.len(),
            classes.len(),
            tagdict.len()
        );

        Ok(Self::new(AveragedPerceptron { weights, classes }, tagdict))
    }

    fn normalize(word: &str) -> String {
        if word.contains('-') && !word.starts_with('-') {
            "!HYPHEN".to_string()
        } else if word.len() == 4 && word.chars().all(|c| c.is_ascii_digit()) {
            "!YEAR".to_string()
        } else if word.chars().next().map_or(false, |c| c.is_ascii_digit()) {
            "!DIGITS".to_string()
        } else {
            word.to_lowercase()
        }
    }

    fn features(i: usize, word: &str, context: &[String], prev: &str, prev2: &str) -> HashMap<String, f64> {
        let i = i + START.len();
        let mut features = HashMap::new();
        let mut add = |name: String| *features.entry(name).or_insert(0.0) += 1.0;

        add("bias".to_string());
        add(format!("i suffix {}", suffix(word)));
        add(format!("i pref1 {}", word.chars().next().map(String::from).unwrap_or_default()));
        add(format!("i-1 tag {}", prev));
        add(format!("i-2 tag {}", prev2));
        add(format!("i tag+i-2 tag {} {}", prev, prev2));
        add(format!("i word {}", context[i]));
        add(format!("i-1 tag+i word {} {}", prev, context[i]));
        add(format!("i-1 word {}", context[i - 1]));
        add(format!("i-1 suffix {}", suffix(&context[i - 1])));
        add(format!("i-2 word {}", context[i - 2]));
        add(format!("i+1 word {}", context[i + 1]));
        add(format!("i+1 suffix {}", suffix(&context[i + 1])));
        add(format!("i+2 word {}", context[i + 2]));

        features
    }
}

impl PosTagger for PerceptronTagger {
    fn tag(&self, tokens: &[String]) -> Vec<(String, String)> {
        let context: Vec<String> = START
            .iter()
            .map(|s| s.to_string())
            .chain(tokens.iter().map(|w| Self::normalize(w)))
            .chain(END.iter().map(|s| s.to_string()))
            .collect();

        let mut prev = START[0].to_string();
        let mut prev2 = START[1].to_string();
        let mut output = Vec::with_capacity(tokens.len());

        for (i, word) in tokens.iter().enumerate() {
            let tag = match self.tagdict.get(word) {
                Some(tag) => tag.clone(),
                None => {
                    let features = Self::features(i, word, &context, &prev, &prev2);
                    self.model.predict(&features).unwrap_or("NN").to_string()
                }
            };

            output.push((word.clone(), tag.clone()));
            prev2 = std::mem::replace(&mut prev, tag);
        }

        output
    }

    fn name(&self) -> &'static str {
        "averaged-perceptron"
    }
}

const CLOSED_CLASS: &[(&str, &str)] = &[
    ("a", "DT"),
    ("an", "DT"),
    ("the", "DT"),
    ("this", "DT"),
    ("that", "WDT"),
    ("these", "DT"),
    ("those", "DT"),
    ("each", "DT"),
    ("every", "DT"),
    ("some", "DT"),
    ("any", "DT"),
    ("no", "DT"),
    ("all", "DT"),
    ("of", "IN"),
    ("in", "IN"),
    ("on", "IN"),
    ("at", "IN"),
    ("by", "IN"),
    ("for", "IN"),
    ("from", "IN"),
    ("with", "IN"),
    ("without", "IN"),
    ("into", "IN"),
    ("onto", "IN"),
    ("over", "IN"),
    ("under", "IN"),
    ("between", "IN"),
    ("through", "IN"),
    ("during", "IN"),
    ("about", "IN"),
    ("than", "IN"),
    ("as", "IN"),
    ("or", "CC"),
    ("and", "CC"),
    ("but", "CC"),
    ("nor", "CC"),
    ("to", "TO"),
    ("it", "PRP"),
    ("they", "PRP"),
    ("he", "PRP"),
    ("she", "PRP"),
    ("we", "PRP"),
    ("you", "PRP"),
    ("its", "PRP$"),
    ("their", "PRP$"),
    ("his", "PRP$"),
    ("her", "PRP$"),
    ("which", "WDT"),
    ("who", "WP"),
    ("whose", "WP$"),
    ("is", "VBZ"),
    ("are", "VBP"),
    ("was", "VBD"),
    ("were", "VBD"),
    ("be", "VB"),
    ("been", "VBN"),
    ("being", "VBG"),
    ("has", "VBZ"),
    ("have", "VBP"),
    ("had", "VBD"),
    ("not", "RB"),
    ("n't", "RB"),
    ("'s", "POS"),
    ("can", "MD"),
    ("may", "MD"),
    ("might", "MD"),
    ("will", "MD"),
    ("would", "MD"),
    ("should", "MD"),
    ("must", "MD"),
];

/// Fallback tagger driven by WordNet lookups, used when no perceptron model
/// is configured.
pub struct LexiconTagger {
    wordnet: Arc<WordNet>,
    closed_class: HashMap<&'static str, &'static str>,
}

impl LexiconTagger {
    pub fn new(wordnet: Arc<WordNet>) -> Self {
        Self {
            wordnet,
            closed_class: CLOSED_CLASS.iter().copied().collect(),
        }
    }

    fn tag_word(&self, word: &str) -> String {
        let lower = word.to_lowercase();

        if let Some(tag) = self.closed_class.get(lower.as_str()) {
            return tag.to_string();
        }
        if lower.chars().next().map_or(false, |c| c.is_ascii_digit()) {
            return "CD".to_string();
        }
        if !lower.chars().any(char::is_alphanumeric) {
            return word.to_string();
        }

        for pos in Pos::LOOKUP_ORDER {
            let forms = self.wordnet.morphy(&lower, pos);
            if forms.is_empty() {
                continue;
            }
            return match pos {
                Pos::Noun if !forms.iter().any(|f| *f == lower) => "NNS",
                Pos::Noun => "NN",
                Pos::Verb => "VB",
                Pos::Adjective | Pos::Satellite => "JJ",
                Pos::Adverb => "RB",
            }
            .to_string();
        }

        debug!("No WordNet entry for '{}', tagging as NN", word);
        "NN".to_string()
    }
}

impl PosTagger for LexiconTagger {
    fn tag(&self, tokens: &[String]) -> Vec<(String, String)> {
        tokens
            .iter()
            .map(|word| (word.clone(), self.tag_word(word)))
            .collect()
    }

    fn name(&self) -> &'static str {
        "wordnet-lexicon"
    }
}

fn suffix(word: &str) -> String {
    let count = word.chars().count();
    word.chars().skip(count.saturating_sub(3)).collect()
}

fn find_model_file(dir: &Path, suffix: &str) -> Result<PathBuf, TaggerError> {
    let entries = fs::read_dir(dir).map_err(|source| TaggerError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    for entry in entries.flatten() {
        let path = entry.path();
        if path
            .file_name()
            .and_then(|n| n.to_str())
            .map_or(false, |n| n.ends_with(suffix))
        {
            return Ok(path);
        }
    }

    Err(TaggerError::MissingModelFile {
        dir: dir.to_path_buf(),
        suffix: suffix.to_string(),
    })
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, TaggerError> {
    let content = fs::read_to_string(path).map_err(|source| TaggerError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| TaggerError::Json {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wordnet::test_support::sample;

    fn tokens(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    fn toy_model() -> PerceptronTagger {
        let mut weights = HashMap::new();
        weights.insert(
            "i suffix ing".to_string(),
            HashMap::from([("VBG".to_string(), 2.0), ("NN".to_string(), 0.5)]),
        );
        weights.insert("bias".to_string(), HashMap::from([("NN".to_string(), 1.0)]));
        let model = AveragedPerceptron {
            weights,
            classes: vec!["NN".to_string(), "VBG".to_string(), "DT".to_string()],
        };
        let tagdict = HashMap::from([("the".to_string(), "DT".to_string())]);
        PerceptronTagger::new(model, tagdict)
    }

    #[test]
    fn test_perceptron_uses_tagdict_then_model() {
        let tagger = toy_model();
        let tagged = tagger.tag(&tokens(&["the", "rising", "water"]));

        assert_eq!(tagged[0].1, "DT");
        assert_eq!(tagged[1].1, "VBG");
        assert_eq!(tagged[2].1, "NN");
    }

    #[test]
    fn test_predict_tie_breaks_on_greater_label() {
        let model = AveragedPerceptron {
            weights: HashMap::new(),
            classes: vec!["NN".to_string(), "VB".to_string(), "DT".to_string()],
        };
        assert_eq!(model.predict(&HashMap::new()), Some("VB"));
    }

    #[test]
    fn test_normalize() {
        assert_eq!(PerceptronTagger::normalize("well-known"), "!HYPHEN");
        assert_eq!(PerceptronTagger::normalize("-minus"), "-minus");
        assert_eq!(PerceptronTagger::normalize("1998"), "!YEAR");
        assert_eq!(PerceptronTagger::normalize("50km"), "!DIGITS");
        assert_eq!(PerceptronTagger::normalize("River"), "river");
    }

    #[test]
    fn test_from_dir_loads_nltk_layout() {
        let dir = tempfile::tempdir().unwrap();
        let stem = dir.path().join("averaged_perceptron_tagger_eng");
        fs::write(format!("{}.weights.json", stem.display()), r#"{"bias": {"NN": 1.0}}"#).unwrap();
        fs::write(format!("{}.tagdict.json", stem.display()), r#"{"of": "IN"}"#).unwrap();
        fs::write(format!("{}.classes.json", stem.display()), r#"["NN", "IN"]"#).unwrap();

        let tagger = PerceptronTagger::from_dir(dir.path()).unwrap();
        let tagged = tagger.tag(&tokens(&["body", "of", "water"]));
        assert_eq!(
            tagged.iter().map(|(_, t)| t.as_str()).collect::<Vec<_>>(),
            vec!["NN", "IN", "NN"]
        );
    }

    #[test]
    fn test_from_dir_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        let err = PerceptronTagger::from_dir(dir.path()).unwrap_err();
        assert!(matches!(err, TaggerError::MissingModelFile { .. }));
    }

    #[test]
    fn test_lexicon_tagger() {
        let tagger = LexiconTagger::new(Arc::new(sample()));
        let tagged = tagger.tag(&tokens(&["the", "rivers", "flooded", "land", "3", ","]));
        let tags: Vec<&str> = tagged.iter().map(|(_, t)| t.as_str()).collect();

        assert_eq!(tags, vec!["DT", "NNS", "VB", "NN", "CD", ","]);
    }
}
