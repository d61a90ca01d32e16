pub mod matcher;
pub mod ranking;

pub use matcher::{MatchReport, MatchSettings, PhraseMatcher, TermResult};
pub use ranking::{rank_matches, RankedMatch};
