//! Ontological categorization of word senses.
//!
//! A category is a set of WordNet synsets acting as subtree roots. A sense
//! belongs to a category when one of those roots lies on its hypernym tree.
//! The `process` category additionally claims every verb sense and the
//! `attribute` category every adjective sense.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

use crate::wordnet::{Pos, Synset, SynsetId, WordNet};

#[derive(Debug, Error, PartialEq)]
pub enum OntologyError {
    #[error("category '{0}' not found")]
    UnknownCategory(String),
}

/// Configuration form of a category: a name and the `(term, sense indices)`
/// pairs naming its root synsets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorySpec {
    pub name: String,
    #[serde(default)]
    pub roots: Vec<RootSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RootSpec {
    pub term: String,
    pub senses: Vec<usize>,
}

impl CategorySpec {
    pub fn new(name: &str, roots: &[(&str, &[usize])]) -> Self {
        Self {
            name: name.to_string(),
            roots: roots
                .iter()
                .map(|(term, senses)| RootSpec {
                    term: term.to_string(),
                    senses: senses.to_vec(),
                })
                .collect(),
        }
    }
}

/// The Scientific Variables Ontology category set.
pub fn svo_categories() -> Vec<CategorySpec> {
    vec![
        CategorySpec::new(
            "process",
            &[("process", &[1, 5]), ("act", &[1, 5, 6]), ("action", &[0, 1, 3, 4]), ("event", &[0])],
        ),
        CategorySpec::new("property", &[("property", &[1, 3]), ("attribute", &[0, 1])]),
        CategorySpec::new(
            "quantity",
            &[
                ("quantity", &[0, 2]),
                ("amount", &[0, 2]),
                ("ratio", &[0]),
                ("quantitative_relation", &[0]),
                ("distance", &[0]),
            ],
        ),
        CategorySpec::new(
            "phenomenon",
            &[
                ("object", &[0, 2, 3, 4]),
                ("system", &[1, 4, 5]),
                ("phenomenon", &[0]),
                ("body", &[0, 3, 8]),
                ("matter", &[2]),
                ("form", &[2, 3, 5, 6]),
                ("biological_group", &[0]),
                ("body_of_water", &[0]),
                ("part", &[2]),
            ],
        ),
        CategorySpec::new("state", &[("condition", &[0, 1, 2]), ("state", &[1, 4])]),
        CategorySpec::new("attribute", &[]),
    ]
}

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryRoot {
    pub term: String,
    pub index: usize,
    pub synset: SynsetId,
}

impl CategoryRoot {
    pub fn label(&self) -> String {
        format!("{}.{}", self.term, self.index)
    }
}

#[derive(Debug, Clone)]
pub struct OntologyCategory {
    pub name: String,
    pub verb: bool,
    pub adj: bool,
    roots: Vec<CategoryRoot>,
}

impl OntologyCategory {
    pub fn new(name: &str) -> Self {
        let name = if name.is_empty() { "Anonymous" } else { name };
        Self {
            name: name.to_string(),
            verb: name == "process",
            adj: name == "attribute",
            roots: Vec::new(),
        }
    }

    pub fn from_spec(spec: &CategorySpec, wordnet: &WordNet) -> Self {
        let mut category = Self::new(&spec.name);
        for root in &spec.roots {
            for &index in &root.senses {
                category.add_synset(wordnet, &root.term, index);
            }
        }
        category
    }

    /// Add sense `index` of `term` as a root. Returns false when the sense
    /// does not exist.
    pub fn add_synset(&mut self, wordnet: &WordNet, term: &str, index: usize) -> bool {
        let synset = match wordnet.synsets(term).get(index) {
            Some(synset) => synset.id,
            None => {
                warn!("Could not find synset {} for '{}' (category {})", index, term, self.name);
                return false;
            }
        };

        let root = CategoryRoot {
            term: term.to_string(),
            index,
            synset,
        };
        if !self.roots.contains(&root) {
            self.roots.push(root);
        }
        true
    }

    pub fn remove_synset(&mut self, term: &str, index: usize) -> bool {
        match self.roots.iter().position(|r| r.term == term && r.index == index) {
            Some(position) => {
                self.roots.remove(position);
                true
            }
            None => {
                warn!(
                    "Could not remove synset {} for '{}': not in category {}",
                    index, term, self.name
                );
                false
            }
        }
    }

    pub fn roots(&self) -> &[CategoryRoot] {
        &self.roots
    }

    /// `(label, definition)` of every root.
    pub fn definitions(&self, wordnet: &WordNet) -> Vec<(String, String)> {
        self.roots
            .iter()
            .map(|root| {
                let definition = wordnet
                    .synset(root.synset)
                    .map(|s| s.definition.clone())
                    .unwrap_or_default();
                (root.label(), definition)
            })
            .collect()
    }

    /// Labels of the roots found on `tree`, plus `verb`/`adjective` markers,
    /// followed by the category name. Empty when nothing matched.
    pub fn is_hypernym_of(&self, tree: &[SynsetId]) -> Vec<String> {
        let mut hits = Vec::new();
        for synset in tree {
            for root in &self.roots {
                if root.synset == *synset {
                    hits.push(root.label());
                }
            }
            if self.verb && synset.pos == Pos::Verb {
                hits.push("verb".to_string());
            }
            if self.adj && synset.pos.is_adjective() {
                hits.push("adjective".to_string());
            }
        }

        if !hits.is_empty() {
            hits.push(self.name.clone());
        }
        hits
    }
}

/// One sense of a term with the categories it falls into.
#[derive(Debug, Clone, Serialize)]
pub struct SenseCategories {
    pub term: String,
    pub index: usize,
    pub definition: String,
    pub pos: Pos,
    /// Matched category names, in category order.
    pub categories: Vec<String>,
    /// Every label produced while matching (roots, markers, names).
    pub labels: Vec<String>,
}

/// One sense of a term and whether it belongs to a single category.
#[derive(Debug, Clone, Serialize)]
pub struct SenseMembership {
    pub term: String,
    pub index: usize,
    pub definition: String,
    pub pos: Pos,
    pub member: bool,
}

pub struct OntologyCategorizer {
    pub name: String,
    wordnet: Arc<WordNet>,
    categories: Vec<OntologyCategory>,
}

impl OntologyCategorizer {
    pub fn new(name: &str, wordnet: Arc<WordNet>) -> Self {
        let name = if name.is_empty() { "Anonymous" } else { name };
        Self {
            name: name.to_string(),
            wordnet,
            categories: Vec::new(),
        }
    }

    pub fn with_categories(name: &str, wordnet: Arc<WordNet>, specs: &[CategorySpec]) -> Self {
        let mut categorizer = Self::new(name, wordnet);
        for spec in specs {
            categorizer.add_category(spec);
        }
        categorizer
    }

    pub fn svo(wordnet: Arc<WordNet>) -> Self {
        Self::with_categories("svo", wordnet, &svo_categories())
    }

    pub fn wordnet(&self) -> &Arc<WordNet> {
        &self.wordnet
    }

    pub fn add_category(&mut self, spec: &CategorySpec) {
        let category = OntologyCategory::from_spec(spec, &self.wordnet);
        debug!("Category {} has {} root synsets", category.name, category.roots().len());
        self.categories.push(category);
    }

    pub fn get_category(&self, name: &str) -> Result<&OntologyCategory, OntologyError> {
        self.categories
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| OntologyError::UnknownCategory(name.to_string()))
    }

    pub fn get_categories(&self) -> Vec<&str> {
        self.categories.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn remove_category(&mut self, name: &str) -> Result<(), OntologyError> {
        let position = self
            .categories
            .iter()
            .position(|c| c.name == name)
            .ok_or_else(|| OntologyError::UnknownCategory(name.to_string()))?;
        self.categories.remove(position);
        Ok(())
    }

    /// Labels for `synset` against one category, or against all of them.
    pub fn categorize_term(&self, synset: &Synset, category: Option<&OntologyCategory>) -> Vec<String> {
        let tree = self.wordnet.hypernym_tree(synset.id);
        match category {
            Some(category) => category.is_hypernym_of(&tree),
            None => self
                .categories
                .iter()
                .flat_map(|c| c.is_hypernym_of(&tree))
                .collect(),
        }
    }

    pub fn is_cat_synset(&self, synset: &Synset, category: &str) -> Result<bool, OntologyError> {
        let category = self.get_category(category)?;
        Ok(!self.categorize_term(synset, Some(category)).is_empty())
    }

    /// Categorize every sense of `term`.
    pub fn what_is(&self, term: &str) -> Vec<SenseCategories> {
        self.wordnet
            .synsets(term)
            .into_iter()
            .enumerate()
            .map(|(index, synset)| {
                let tree = self.wordnet.hypernym_tree(synset.id);
                let mut categories = Vec::new();
                let mut labels = Vec::new();
                for category in &self.categories {
                    let hits = category.is_hypernym_of(&tree);
                    if !hits.is_empty() {
                        categories.push(category.name.clone());
                        labels.extend(hits);
                    }
                }

                SenseCategories {
                    term: term.to_string(),
                    index,
                    definition: synset.definition.clone(),
                    pos: synset.pos,
                    categories,
                    labels,
                }
            })
            .collect()
    }

    /// Membership of every sense of `term` in `category`.
    pub fn is_cat(&self, term: &str, category: &str) -> Result<Vec<SenseMembership>, OntologyError> {
        let category = self.get_category(category)?;
        Ok(self
            .wordnet
            .synsets(term)
            .into_iter()
            .enumerate()
            .map(|(index, synset)| SenseMembership {
                term: term.to_string(),
                index,
                definition: synset.definition.clone(),
                pos: synset.pos,
                member: !self.categorize_term(synset, Some(category)).is_empty(),
            })
            .collect())
    }

    /// Whether any sense of `term` belongs to `category`; false for unknown terms.
    pub fn is_cat_any(&self, term: &str, category: &str) -> Result<bool, OntologyError> {
        Ok(self.is_cat(term, category)?.iter().any(|row| row.member))
    }
}
