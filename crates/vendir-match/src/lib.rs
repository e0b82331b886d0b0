//! Matching engine: turns noisy scraped location and category strings into
//! canonical taxonomy references.
//!
//! The cascade is ordered cheapest/most-precise first — alias rewrite, exact
//! lookup, ZIP-region heuristics, fuzzy edit distance, and only then the AI
//! oracle. Everything except the AI stage is pure and synchronous; the
//! [`vendir_core::SuggestionService`] handle is passed in explicitly so the
//! matcher stays independently testable.

pub mod category;
pub mod city;
pub mod fuzzy;
pub mod index;
pub mod parser;
pub mod tables;
pub mod types;

pub use category::{needs_category_resolution, resolve_category};
pub use city::resolve_city;
pub use index::LookupIndex;
pub use parser::parse_location;
pub use tables::resolve_region;
pub use types::{CategoryResolution, CityResolution, MatchMethod, MatchResult, ParsedLocation};
