//! Canonical taxonomy types the matcher resolves toward.

use serde::{Deserialize, Serialize};

/// Country hint extracted from a raw location string.
///
/// Derived from leading prefix markers (`A-`/`AT-` → Austria, `CH-` →
/// Switzerland, `D-`/`DE-` → Germany).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CountryHint {
    At,
    Ch,
    De,
}

impl CountryHint {
    /// ISO 3166-1 alpha-2 code.
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            CountryHint::At => "AT",
            CountryHint::Ch => "CH",
            CountryHint::De => "DE",
        }
    }

    /// Parses a prefix marker (without the trailing dash) into a hint.
    #[must_use]
    pub fn from_prefix(prefix: &str) -> Option<Self> {
        match prefix.to_ascii_uppercase().as_str() {
            "A" | "AT" => Some(CountryHint::At),
            "CH" => Some(CountryHint::Ch),
            "D" | "DE" => Some(CountryHint::De),
            _ => None,
        }
    }
}

impl std::fmt::Display for CountryHint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// Locale aliases for a canonical city (listing sources mix English, German
/// and Turkish spellings).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CityAliases {
    pub en: Option<String>,
    pub de: Option<String>,
    pub tr: Option<String>,
}

impl CityAliases {
    /// All non-empty alias strings, in a stable order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        [self.en.as_deref(), self.de.as_deref(), self.tr.as_deref()]
            .into_iter()
            .flatten()
            .filter(|s| !s.is_empty())
    }
}

/// An authoritative city entry in the vendor directory taxonomy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalCity {
    pub id: i64,
    /// Display name, e.g. `"Wien (Vienna)"`.
    pub name: String,
    pub aliases: CityAliases,
}

/// An authoritative category entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalCategory {
    pub id: i64,
    /// Canonical English name, e.g. `"Wedding Photography"`.
    pub name: String,
    /// Localization key used by the presentation layer.
    pub label_key: String,
}
