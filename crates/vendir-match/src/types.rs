//! Ephemeral result types produced by the matching cascade.
//!
//! None of these are persisted; they exist so callers can decide what to
//! write back and how to tag it for human audit.

use vendir_core::CountryHint;

/// Which cascade stage produced a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMethod {
    /// Alias-table rewrite or direct canonical lookup.
    Exact,
    /// Substring containment in either direction.
    Partial,
    /// Levenshtein similarity above the acceptance threshold.
    Fuzzy,
    /// Postal-code prefix mapped to its regional major city.
    ZipRegion,
    /// The external suggestion oracle.
    Ai,
    /// Cascade exhausted without a match. Not an error.
    None,
}

impl MatchMethod {
    #[must_use]
    pub fn is_resolved(self) -> bool {
        !matches!(self, MatchMethod::None)
    }
}

/// Outcome of a single cascade run against one candidate string.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchResult {
    pub value: String,
    pub method: MatchMethod,
    /// 1.0 for deterministic stages, the similarity score for fuzzy ones.
    pub confidence: f64,
}

/// Structured form of a raw `"city[,zip][,tags]"` string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedLocation {
    /// Never empty; falls back to `"Unknown"`.
    pub city: String,
    pub zip: Option<String>,
    pub country_hint: Option<CountryHint>,
}

impl ParsedLocation {
    /// Canonical string form: `"AT-3021 Pressbaum"`, `"10115 Berlin"`,
    /// `"DE-Hamburg"`, or just the city.
    ///
    /// Parsing the recombined form yields the same [`ParsedLocation`] back
    /// (the parser's idempotence contract).
    #[must_use]
    pub fn recombine(&self) -> String {
        match (self.country_hint, self.zip.as_deref()) {
            (Some(hint), Some(zip)) => format!("{}-{} {}", hint.code(), zip, self.city),
            (Some(hint), None) => format!("{}-{}", hint.code(), self.city),
            (None, Some(zip)) => format!("{} {}", zip, self.city),
            (None, None) => self.city.clone(),
        }
    }
}

/// Fully resolved city output of the cascade.
#[derive(Debug, Clone, PartialEq)]
pub struct CityResolution {
    /// Display string to write back; carries a bracketed audit tag when a
    /// rewrite changed it (`"Wien (Vienna) [eski: Pressbaum]"`).
    pub city: String,
    /// Canonical name without the audit tag, for vendor materialization.
    pub canonical_name: Option<String>,
    pub city_id: Option<i64>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub zip: Option<String>,
    pub method: MatchMethod,
    /// Name-level match with no id in the lookup index: the canonical table
    /// is missing an entry. Tracked separately from "unresolved".
    pub orphan: bool,
}

impl CityResolution {
    /// Unresolved outcome: the working string is left as-is.
    #[must_use]
    pub fn unresolved(parsed: &ParsedLocation) -> Self {
        Self {
            city: parsed.city.clone(),
            canonical_name: None,
            city_id: None,
            state: None,
            country: parsed.country_hint.map(|h| h.code().to_owned()),
            zip: parsed.zip.clone(),
            method: MatchMethod::None,
            orphan: false,
        }
    }
}

/// Resolved category output.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryResolution {
    pub category_id: Option<i64>,
    pub name: Option<String>,
    pub method: MatchMethod,
    /// Name known, id missing from the index.
    pub orphan: bool,
}

impl CategoryResolution {
    #[must_use]
    pub fn unresolved() -> Self {
        Self {
            category_id: None,
            name: None,
            method: MatchMethod::None,
            orphan: false,
        }
    }
}
