use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::matcher::TermResult;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedMatch {
    #[serde(rename = "IRI")]
    pub iri: String,
    pub label: String,
    #[serde(rename = "matchrank")]
    pub match_rank: f64,
}

#[derive(Debug)]
struct Tally {
    matched: f64,
    phenomenon: f64,
    label: String,
}

/// Variables seen during a walk, in first-seen order.
#[derive(Default)]
struct Tallies {
    order: Vec<String>,
    by_iri: HashMap<String, Tally>,
}

impl Tallies {
    /// Counters are local to one list level and keep growing across siblings.
    fn walk(
        &mut self,
        results: &[TermResult],
        mut num_expansions: usize,
        mut num_terms: usize,
        phenomenon_class: &str,
    ) {
        for result in results {
            match result {
                TermResult::Lookup { classes, variables, .. } => {
                    let weight = 1.0 / num_expansions as f64 / num_terms as f64;
                    for variable in variables {
                        if let Some(tally) = self.by_iri.get_mut(&variable.iri) {
                            tally.matched += weight;
                            continue;
                        }
                        let phenomenon = if classes.iter().any(|c| c == phenomenon_class) {
                            weight
                        } else {
                            0.0
                        };
                        self.order.push(variable.iri.clone());
                        self.by_iri.insert(
                            variable.iri.clone(),
                            Tally {
                                matched: weight,
                                phenomenon,
                                label: variable.label.clone(),
                            },
                        );
                    }
                }
                TermResult::Expansion { expansions, .. } => {
                    num_expansions += expansions.len();
                    for expansion in expansions {
                        num_terms += expansion.len();
                        self.walk(expansion, num_expansions, num_terms, phenomenon_class);
                    }
                }
            }
        }
    }
}

/// Number of terms a variable name is made of: its non-empty `_` parts
/// other than `of`, plus one per `%7E` attribute marker.
pub fn variable_term_count(iri: &str) -> usize {
    let parts = iri.split('_').filter(|p| !p.is_empty() && *p != "of").count();
    parts + iri.matches("%7E").count()
}

/// Round to 3 decimals on the exact binary value, ties to even.
///
/// `value * 1000.0` can itself round onto a half, so the product error
/// (exact through `mul_add`) decides which side of the tie the value lies.
fn round3(value: f64) -> f64 {
    let scaled = value * 1000.0;
    let error = value.mul_add(1000.0, -scaled);
    let floor = scaled.floor();

    let rounded = if scaled - floor != 0.5 {
        scaled.round()
    } else if error > 0.0 {
        floor + 1.0
    } else if error < 0.0 {
        floor
    } else if floor % 2.0 == 0.0 {
        floor
    } else {
        floor + 1.0
    };
    rounded / 1000.0
}

/// Score every variable reached by a search and keep the best `max_results`.
pub fn rank_matches(results: &[TermResult], max_results: usize, phenomenon_class: &str) -> Vec<RankedMatch> {
    let mut tallies = Tallies::default();
    tallies.walk(results, 1, 1, phenomenon_class);

    let num_total = results.len() as f64;
    let mut ranked: Vec<RankedMatch> = tallies
        .order
        .iter()
        .filter_map(|iri| tallies.by_iri.get(iri).map(|tally| (iri, tally)))
        .map(|(iri, tally)| {
            let num_variable = variable_term_count(iri);
            let term_share = 0.75 * (tally.matched / num_total);
            let variable_share = if num_variable == 0 {
                0.0
            } else {
                0.25 * (tally.matched / num_variable as f64)
            };
            let rank = (term_share + variable_share) * (0.4 + 0.6 * tally.phenomenon);

            RankedMatch {
                iri: iri.clone(),
                label: tally.label.clone(),
                match_rank: round3(rank),
            }
        })
        .collect();

    // stable ascending sort then reverse, so equal keys come out last-seen first
    ranked.sort_by(|a, b| {
        a.match_rank
            .total_cmp(&b.match_rank)
            .then_with(|| a.label.cmp(&b.label))
    });
    ranked.reverse();
    ranked.truncate(max_results);
    ranked
}
