//! Lookup index: normalized name→id snapshot of the canonical tables.
//!
//! Built once per sweep from the canonical source and passed explicitly into
//! the matchers. There is no global cache; the snapshot makes the cascade a
//! pure function of its inputs.

use std::collections::{HashMap, HashSet};

use vendir_core::{CanonicalCategory, CanonicalCity};

/// Immutable name→id snapshot for cities and categories.
#[derive(Debug, Default)]
pub struct LookupIndex {
    city_by_name: HashMap<String, i64>,
    city_ids: HashSet<i64>,
    city_display_by_id: HashMap<i64, String>,
    city_names: Vec<String>,
    category_by_name: HashMap<String, i64>,
    category_ids: HashSet<i64>,
    category_name_by_id: HashMap<i64, String>,
    category_names: Vec<String>,
}

/// Key normalization: trimmed, lowercased.
fn normalize(s: &str) -> String {
    s.trim().to_lowercase()
}

/// Additional lookup keys for a display name like `"Wien (Vienna)"`:
/// the bare name (`"Wien"`) and the parenthetical exonym (`"Vienna"`).
fn display_name_variants(name: &str) -> Vec<String> {
    let mut variants = Vec::new();
    if let (Some(open), Some(close)) = (name.find('('), name.rfind(')')) {
        if open < close {
            let bare = name[..open].trim();
            let inner = name[open + 1..close].trim();
            if !bare.is_empty() {
                variants.push(bare.to_owned());
            }
            if !inner.is_empty() {
                variants.push(inner.to_owned());
            }
        }
    }
    variants
}

impl LookupIndex {
    /// Builds the snapshot. First writer wins on key collisions so the
    /// canonical table order stays authoritative.
    #[must_use]
    pub fn build(cities: &[CanonicalCity], categories: &[CanonicalCategory]) -> Self {
        let mut index = Self::default();

        for city in cities {
            index.city_ids.insert(city.id);
            index
                .city_display_by_id
                .insert(city.id, city.name.clone());
            index.city_names.push(city.name.clone());

            let mut keys = vec![city.name.clone()];
            keys.extend(display_name_variants(&city.name));
            keys.extend(city.aliases.iter().map(str::to_owned));
            for key in keys {
                index.city_by_name.entry(normalize(&key)).or_insert(city.id);
            }
        }

        for category in categories {
            index.category_ids.insert(category.id);
            index
                .category_name_by_id
                .insert(category.id, category.name.clone());
            index.category_names.push(category.name.clone());

            for key in [category.name.as_str(), category.label_key.as_str()] {
                index
                    .category_by_name
                    .entry(normalize(key))
                    .or_insert(category.id);
            }
        }

        index
    }

    #[must_use]
    pub fn city_id(&self, name: &str) -> Option<i64> {
        self.city_by_name.get(&normalize(name)).copied()
    }

    #[must_use]
    pub fn has_city_id(&self, id: i64) -> bool {
        self.city_ids.contains(&id)
    }

    #[must_use]
    pub fn city_display(&self, id: i64) -> Option<&str> {
        self.city_display_by_id.get(&id).map(String::as_str)
    }

    /// Canonical display names, for fuzzy matching and as the AI allowed list.
    #[must_use]
    pub fn city_names(&self) -> &[String] {
        &self.city_names
    }

    #[must_use]
    pub fn category_id(&self, name: &str) -> Option<i64> {
        self.category_by_name.get(&normalize(name)).copied()
    }

    #[must_use]
    pub fn has_category_id(&self, id: i64) -> bool {
        self.category_ids.contains(&id)
    }

    #[must_use]
    pub fn category_name(&self, id: i64) -> Option<&str> {
        self.category_name_by_id.get(&id).map(String::as_str)
    }

    #[must_use]
    pub fn category_names(&self) -> &[String] {
        &self.category_names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vendir_core::CityAliases;

    fn city(id: i64, name: &str, en: Option<&str>, tr: Option<&str>) -> CanonicalCity {
        CanonicalCity {
            id,
            name: name.to_owned(),
            aliases: CityAliases {
                en: en.map(str::to_owned),
                de: None,
                tr: tr.map(str::to_owned),
            },
        }
    }

    fn category(id: i64, name: &str, key: &str) -> CanonicalCategory {
        CanonicalCategory {
            id,
            name: name.to_owned(),
            label_key: key.to_owned(),
        }
    }

    #[test]
    fn city_lookup_covers_display_variants_and_aliases() {
        let cities = vec![city(1, "Wien (Vienna)", Some("Vienna"), Some("Viyana"))];
        let index = LookupIndex::build(&cities, &[]);

        assert_eq!(index.city_id("Wien (Vienna)"), Some(1));
        assert_eq!(index.city_id("wien"), Some(1));
        assert_eq!(index.city_id("VIENNA"), Some(1));
        assert_eq!(index.city_id("viyana"), Some(1));
        assert_eq!(index.city_id("Graz"), None);
        assert!(index.has_city_id(1));
        assert_eq!(index.city_display(1), Some("Wien (Vienna)"));
    }

    #[test]
    fn category_lookup_accepts_name_and_label_key() {
        let categories = vec![category(7, "Wedding Photography", "cat.wedding_photography")];
        let index = LookupIndex::build(&[], &categories);

        assert_eq!(index.category_id("wedding photography"), Some(7));
        assert_eq!(index.category_id("cat.wedding_photography"), Some(7));
        assert_eq!(index.category_name(7), Some("Wedding Photography"));
        assert!(!index.has_category_id(8));
    }

    #[test]
    fn first_city_wins_on_key_collision() {
        let cities = vec![
            city(1, "Salzburg", None, None),
            city(2, "Salzburg", None, None),
        ];
        let index = LookupIndex::build(&cities, &[]);
        assert_eq!(index.city_id("salzburg"), Some(1));
    }
}
