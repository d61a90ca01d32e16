pub mod serialization;

pub use serialization::{format_is_cat, format_what_is, MatchSerializer, OutputFormat};
