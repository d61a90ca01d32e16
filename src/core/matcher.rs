use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use futures::future::{BoxFuture, FutureExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::ranking::{rank_matches, RankedMatch};
use crate::nlp::{extract_nouns, PosTagger};
use crate::ontology::OntologyCategorizer;
use crate::sparql::{OntologyBackend, VariableMatch};

/// One entry of a phrase search, in phrase order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TermResult {
    Lookup {
        term: String,
        classes: Vec<String>,
        variables: Vec<VariableMatch>,
    },
    /// Searches over the nouns of each matching sense definition of `term`.
    Expansion {
        term: String,
        expansions: Vec<Vec<TermResult>>,
    },
}

impl TermResult {
    pub fn term(&self) -> &str {
        match self {
            TermResult::Lookup { term, .. } | TermResult::Expansion { term, .. } => term,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MatchSettings {
    pub max_results: usize,
    pub max_depth: usize,
    pub attempts: usize,
    pub expansion_category: String,
    pub phenomenon_class: String,
}

impl Default for MatchSettings {
    fn default() -> Self {
        Self {
            max_results: 5,
            max_depth: 2,
            attempts: 2,
            expansion_category: "state".to_string(),
            phenomenon_class: "Phenomenon".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchReport {
    pub id: String,
    pub phrase: String,
    pub results: Vec<RankedMatch>,
    pub searched_terms: usize,
    pub timestamp: DateTime<Utc>,
    pub processing_time_seconds: f64,
}

pub struct PhraseMatcher {
    backend: Arc<dyn OntologyBackend>,
    categorizer: Arc<OntologyCategorizer>,
    tagger: Arc<dyn PosTagger>,
    settings: MatchSettings,
}

impl PhraseMatcher {
    pub fn new(
        backend: Arc<dyn OntologyBackend>,
        categorizer: Arc<OntologyCategorizer>,
        tagger: Arc<dyn PosTagger>,
        settings: MatchSettings,
    ) -> Self {
        Self {
            backend,
            categorizer,
            tagger,
            settings,
        }
    }

    pub fn settings(&self) -> &MatchSettings {
        &self.settings
    }

    pub fn backend(&self) -> &Arc<dyn OntologyBackend> {
        &self.backend
    }

    /// Definitions of the senses of `term` that fall in the expansion category.
    fn expansion_definitions(&self, term: &str) -> Result<Vec<String>> {
        let rows = self
            .categorizer
            .is_cat(term, &self.settings.expansion_category)
            .context("Expansion category is not configured")?;

        Ok(rows
            .into_iter()
            .filter(|row| row.member)
            .map(|row| row.definition)
            .collect())
    }

    /// Look up every `_`-separated term of `phrase`, expanding state-like
    /// terms through their definitions until `max_depth`.
    pub fn search_phrase<'a>(&'a self, phrase: &'a str, depth: usize) -> BoxFuture<'a, Result<Vec<TermResult>>> {
        async move {
            let mut results = Vec::new();

            for term in phrase.split('_') {
                // Empty segments still count towards the ranking denominators
                if term.is_empty() {
                    results.push(TermResult::Lookup {
                        term: String::new(),
                        classes: Vec::new(),
                        variables: Vec::new(),
                    });
                    continue;
                }

                let (classes, variables) = tokio::try_join!(
                    self.backend.classes_for_label(term),
                    self.backend.variables_for_sublabel(term),
                )?;
                debug!(
                    "Term '{}' at depth {}: {} classes, {} variables",
                    term,
                    depth,
                    classes.len(),
                    variables.len()
                );
                results.push(TermResult::Lookup {
                    term: term.to_string(),
                    classes,
                    variables,
                });

                if depth >= self.settings.max_depth {
                    continue;
                }

                let definitions = self.expansion_definitions(term)?;
                if definitions.is_empty() {
                    continue;
                }

                let mut expansions = Vec::with_capacity(definitions.len());
                for definition in &definitions {
                    let nouns = extract_nouns(definition, self.tagger.as_ref()).join("_");
                    debug!("Expanding '{}' through '{}'", term, nouns);
                    expansions.push(self.search_phrase(&nouns, depth + 1).await?);
                }
                results.push(TermResult::Expansion {
                    term: term.to_string(),
                    expansions,
                });
            }

            Ok(results)
        }
        .boxed()
    }

    /// `search_phrase` from the top, retried up to the configured attempts.
    pub async fn search_with_retry(&self, phrase: &str) -> Result<Vec<TermResult>> {
        let mut last_error = None;

        for attempt in 1..=self.settings.attempts {
            match self.search_phrase(phrase, 0).await {
                Ok(results) => return Ok(results),
                Err(e) => {
                    warn!(
                        "Search attempt {}/{} for '{}' failed: {:#}",
                        attempt, self.settings.attempts, phrase, e
                    );
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| anyhow!("No search attempts configured")))
    }

    pub async fn match_phrase(&self, phrase: &str) -> Result<Vec<RankedMatch>> {
        let results = self.search_with_retry(phrase).await?;
        Ok(rank_matches(
            &results,
            self.settings.max_results,
            &self.settings.phenomenon_class,
        ))
    }

    /// `match_phrase` with timing and identity, for reports.
    pub async fn match_report(&self, phrase: &str) -> Result<MatchReport> {
        let start_time = Instant::now();
        let searched = self.search_with_retry(phrase).await?;
        Ok(self.report(phrase, &searched, start_time))
    }

    /// Rank an already searched phrase into a report timed from `start_time`.
    pub fn report(&self, phrase: &str, searched: &[TermResult], start_time: Instant) -> MatchReport {
        let results = rank_matches(
            searched,
            self.settings.max_results,
            &self.settings.phenomenon_class,
        );
        let processing_time_seconds = start_time.elapsed().as_secs_f64();

        info!(
            "Matched '{}' to {} variables in {:.2}s",
            phrase,
            results.len(),
            processing_time_seconds
        );

        MatchReport {
            id: Uuid::new_v4().to_string(),
            phrase: phrase.to_string(),
            results,
            searched_terms: count_terms(searched),
            timestamp: Utc::now(),
            processing_time_seconds,
        }
    }
}

fn count_terms(results: &[TermResult]) -> usize {
    results
        .iter()
        .map(|r| match r {
            TermResult::Lookup { .. } => 1,
            TermResult::Expansion { expansions, .. } => expansions.iter().map(|e| count_terms(e)).sum(),
        })
        .sum()
}


#[cfg(test)]
mod tests {
    use super::test_support::MockBackend;
    use super::*;
    use crate::nlp::LexiconTagger;
    use crate::ontology::CategorySpec;
    use crate::wordnet::test_support::sample;

    fn matcher(backend: MockBackend, settings: MatchSettings) -> PhraseMatcher {
        matcher_sharing(Arc::new(backend), settings)
    }

    fn matcher_sharing(backend: Arc<MockBackend>, settings: MatchSettings) -> PhraseMatcher {
        let wordnet = Arc::new(sample());
        let categorizer = OntologyCategorizer::with_categories(
            "test",
            wordnet.clone(),
            &[
                CategorySpec::new("process", &[("act", &[0])]),
                CategorySpec::new("state", &[("condition", &[0]), ("state", &[0])]),
            ],
        );
        PhraseMatcher::new(
            backend,
            Arc::new(categorizer),
            Arc::new(LexiconTagger::new(wordnet)),
            settings,
        )
    }

    #[tokio::test]
    async fn test_plain_terms_are_looked_up_in_order() {
        let backend = MockBackend::default()
            .with_class("river", "Phenomenon")
            .with_variable("river", "river__depth", "river depth");
        let matcher = matcher(backend, MatchSettings::default());

        let results = matcher.search_phrase("river_depth", 0).await.unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].term(), "river");
        assert_eq!(results[1].term(), "depth");
        match &results[0] {
            TermResult::Lookup { classes, variables, .. } => {
                assert_eq!(classes, &vec!["Phenomenon".to_string()]);
                assert_eq!(variables.len(), 1);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_state_terms_expand_until_max_depth() {
        let matcher = matcher(MockBackend::default(), MatchSettings::default());

        let results = matcher.search_phrase("deluge", 0).await.unwrap();

        // deluge -> "an overwhelming flood" -> flood's condition sense
        assert_eq!(results.len(), 2);
        let TermResult::Expansion { expansions, .. } = &results[1] else {
            panic!("expected an expansion, got {:?}", results[1]);
        };
        assert_eq!(expansions.len(), 1);
        let terms: Vec<&str> = expansions[0].iter().map(|r| r.term()).collect();
        assert_eq!(terms, vec!["overwhelming", "flood", "flood"]);

        let TermResult::Expansion { expansions: nested, .. } = &expansions[0][2] else {
            panic!("expected a nested expansion");
        };
        assert_eq!(nested.len(), 1);
        assert!(nested[0]
            .iter()
            .all(|r| matches!(r, TermResult::Lookup { .. })));
    }

    #[tokio::test]
    async fn test_zero_depth_disables_expansion() {
        let settings = MatchSettings {
            max_depth: 0,
            ..MatchSettings::default()
        };
        let matcher = matcher(MockBackend::default(), settings);

        let results = matcher.search_phrase("deluge", 0).await.unwrap();
        assert_eq!(results.len(), 1);
    }

    #[tokio::test]
    async fn test_empty_segments_are_kept_without_querying() {
        let backend = Arc::new(MockBackend::default().with_variable("river", "river__discharge", "river discharge"));
        let matcher = matcher_sharing(backend.clone(), MatchSettings::default());

        let results = matcher.search_phrase("river__discharge", 0).await.unwrap();
        let terms: Vec<&str> = results.iter().map(|r| r.term()).collect();
        assert_eq!(terms, vec!["river", "", "discharge"]);
        assert_eq!(*backend.queried.lock().unwrap(), vec!["river", "discharge"]);

        let empty = matcher.search_phrase("", 0).await.unwrap();
        assert_eq!(empty.len(), 1);
        assert_eq!(empty[0].term(), "");
    }

    #[tokio::test]
    async fn test_empty_segments_count_in_ranking() {
        let backend = MockBackend::default()
            .with_variable("river", "river__discharge", "river discharge")
            .with_variable("discharge", "river__discharge", "river discharge");
        let matcher = matcher(backend, MatchSettings::default());

        let ranked = matcher.match_phrase("river__discharge").await.unwrap();

        // 0.75 * 2/3 + 0.25 * 2/2, no phenomenon class
        assert_eq!(ranked[0].match_rank, 0.3);
    }

    #[tokio::test]
    async fn test_retry_recovers_from_one_failure() {
        let backend = MockBackend::default()
            .with_variable("river", "river__depth", "river depth")
            .failing(1);
        let matcher = matcher(backend, MatchSettings::default());

        let ranked = matcher.match_phrase("river").await.unwrap();
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].iri, "river__depth");
    }

    #[tokio::test]
    async fn test_retry_gives_up_after_attempts() {
        let backend = MockBackend::default().failing(2);
        let matcher = matcher(backend, MatchSettings::default());

        let err = matcher.match_phrase("river").await.unwrap_err();
        assert!(err.to_string().contains("connection reset"));
    }

    #[tokio::test]
    async fn test_match_report() {
        let backend = MockBackend::default().with_variable("river", "river__depth", "river depth");
        let matcher = matcher(backend, MatchSettings::default());

        let report = matcher.match_report("river_depth").await.unwrap();
        assert_eq!(report.phrase, "river_depth");
        assert_eq!(report.searched_terms, 2);
        assert_eq!(report.results[0].label, "river depth");
    }

    #[tokio::test]
    async fn test_report_from_one_search() {
        let backend = Arc::new(MockBackend::default().with_variable("river", "river__depth", "river depth"));
        let matcher = matcher_sharing(backend.clone(), MatchSettings::default());

        let start_time = Instant::now();
        let searched = matcher.search_with_retry("river_depth").await.unwrap();
        let report = matcher.report("river_depth", &searched, start_time);

        assert_eq!(report.searched_terms, 2);
        assert_eq!(report.results[0].iri, "river__depth");
        assert_eq!(backend.queried.lock().unwrap().len(), 2);
    }
}
