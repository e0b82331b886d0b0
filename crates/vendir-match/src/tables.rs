//! Static geography and alias tables backing the city cascade.
//!
//! These tables encode postal geography and editorially curated rewrites:
//! diacritic/typo variants, known small-town→metro collapses, and the
//! state/country membership used to classify a matched city. They are code,
//! not data, on purpose — they change rarely and reviews happen in diffs.

use std::sync::LazyLock;

use regex::Regex;

use vendir_core::CountryHint;

/// Whole-word, case-insensitive matchers for every alias, compiled once.
static ALIAS_WORD_RES: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    CITY_ALIASES
        .iter()
        .map(|&(alias, canonical)| {
            let pattern = format!(r"(?i)\b{}\b", regex::escape(alias));
            (Regex::new(&pattern).expect("valid alias regex"), canonical)
        })
        .collect()
});

/// Non-geographic placeholders that must never reach the AI fallback.
const PLACEHOLDER_CITIES: &[&str] = &[
    "nationwide",
    "unknown",
    "n/a",
    "na",
    "none",
    "online",
    "various",
    "deutschlandweit",
    "bundesweit",
    "österreichweit",
    "schweizweit",
];

/// Sentinel category values left behind by the scraper.
const PLACEHOLDER_CATEGORIES: &[&str] = &["uncategorized", "dom-scraped"];

/// Alias → canonical display name. Lowercase keys, whole-word matched.
///
/// Covers three classes: plain-ASCII spellings of umlaut names, English
/// exonyms, and small towns collapsed into the metro the directory lists
/// them under (Pressbaum sits in the Wienerwald commuter belt, so it files
/// under Vienna).
const CITY_ALIASES: &[(&str, &str)] = &[
    // Diacritic / spelling variants.
    ("muenchen", "München (Munich)"),
    ("munich", "München (Munich)"),
    ("munchen", "München (Munich)"),
    ("koeln", "Köln (Cologne)"),
    ("cologne", "Köln (Cologne)"),
    ("nuernberg", "Nürnberg (Nuremberg)"),
    ("nurnberg", "Nürnberg (Nuremberg)"),
    ("nuremberg", "Nürnberg (Nuremberg)"),
    ("duesseldorf", "Düsseldorf"),
    ("dusseldorf", "Düsseldorf"),
    ("zuerich", "Zürich (Zurich)"),
    ("zurich", "Zürich (Zurich)"),
    ("vienna", "Wien (Vienna)"),
    ("wien", "Wien (Vienna)"),
    ("viyana", "Wien (Vienna)"),
    ("geneva", "Genf (Geneva)"),
    ("geneve", "Genf (Geneva)"),
    ("frankfurt", "Frankfurt am Main"),
    ("frankfurt a.m.", "Frankfurt am Main"),
    ("frankfurt/main", "Frankfurt am Main"),
    ("st. poelten", "St. Pölten"),
    ("sankt pölten", "St. Pölten"),
    // Small-town → metro collapses (Vienna commuter belt).
    ("pressbaum", "Wien (Vienna)"),
    ("purkersdorf", "Wien (Vienna)"),
    ("klosterneuburg", "Wien (Vienna)"),
    ("moedling", "Wien (Vienna)"),
    ("mödling", "Wien (Vienna)"),
    ("schwechat", "Wien (Vienna)"),
];

/// Major German cities used by the cross-validation guard: a 4-digit zip
/// cannot be German, so an alias/exact hit on one of these alongside a
/// 4-digit code is a false positive.
const MAJOR_GERMAN_CITIES: &[&str] = &[
    "Berlin",
    "Hamburg",
    "München (Munich)",
    "Köln (Cologne)",
    "Frankfurt am Main",
    "Stuttgart",
    "Düsseldorf",
    "Hannover",
    "Nürnberg (Nuremberg)",
    "Leipzig",
    "Dresden",
    "Bremen",
    "Dortmund",
    "Essen",
];

/// German 5-digit codes: two-digit prefix → regional major city.
const ZIP_REGION_DE: &[(&str, &str)] = &[
    ("01", "Dresden"),
    ("04", "Leipzig"),
    ("10", "Berlin"),
    ("12", "Berlin"),
    ("13", "Berlin"),
    ("20", "Hamburg"),
    ("21", "Hamburg"),
    ("22", "Hamburg"),
    ("28", "Bremen"),
    ("30", "Hannover"),
    ("40", "Düsseldorf"),
    ("44", "Dortmund"),
    ("45", "Essen"),
    ("50", "Köln (Cologne)"),
    ("51", "Köln (Cologne)"),
    ("60", "Frankfurt am Main"),
    ("65", "Frankfurt am Main"),
    ("70", "Stuttgart"),
    ("80", "München (Munich)"),
    ("81", "München (Munich)"),
    ("85", "München (Munich)"),
    ("90", "Nürnberg (Nuremberg)"),
];

/// German single-digit Leitzone fallback, broader than the table above.
const ZIP_REGION_DE_FALLBACK: &[(&str, &str)] = &[
    ("0", "Leipzig"),
    ("1", "Berlin"),
    ("2", "Hamburg"),
    ("3", "Hannover"),
    ("4", "Düsseldorf"),
    ("5", "Köln (Cologne)"),
    ("6", "Frankfurt am Main"),
    ("7", "Stuttgart"),
    ("8", "München (Munich)"),
    ("9", "Nürnberg (Nuremberg)"),
];

/// Austrian 4-digit codes: two-digit prefix → major city.
const ZIP_REGION_AT: &[(&str, &str)] = &[
    ("10", "Wien (Vienna)"),
    ("11", "Wien (Vienna)"),
    ("12", "Wien (Vienna)"),
    ("13", "Wien (Vienna)"),
    ("14", "Wien (Vienna)"),
    ("19", "Wien (Vienna)"),
    ("21", "Wien (Vienna)"),
    ("22", "Wien (Vienna)"),
    ("23", "Wien (Vienna)"),
    // Wienerwald / Lower Austria commuter belt files under Vienna.
    ("30", "Wien (Vienna)"),
    ("31", "St. Pölten"),
    ("40", "Linz"),
    ("50", "Salzburg"),
    ("60", "Innsbruck"),
    ("80", "Graz"),
    ("90", "Klagenfurt"),
];

/// Swiss 4-digit codes: two-digit prefix → major city. Consulted when the
/// country hint says CH, or after the Austrian table misses.
const ZIP_REGION_CH: &[(&str, &str)] = &[
    ("12", "Genf (Geneva)"),
    ("30", "Bern"),
    ("40", "Basel"),
    ("60", "Luzern"),
    ("69", "Lugano"),
    ("80", "Zürich (Zurich)"),
    ("81", "Zürich (Zurich)"),
];

/// German state → member cities. Used to classify a matched city; cities not
/// listed here and not in the AT/CH overrides stay unclassified.
const STATE_CITIES_DE: &[(&str, &[&str])] = &[
    ("Berlin", &["Berlin"]),
    ("Hamburg", &["Hamburg"]),
    ("Bremen", &["Bremen"]),
    (
        "Bayern",
        &["München (Munich)", "Nürnberg (Nuremberg)", "Augsburg", "Regensburg"],
    ),
    ("Hessen", &["Frankfurt am Main", "Wiesbaden", "Kassel"]),
    (
        "Nordrhein-Westfalen",
        &["Köln (Cologne)", "Düsseldorf", "Dortmund", "Essen", "Bonn"],
    ),
    (
        "Baden-Württemberg",
        &["Stuttgart", "Karlsruhe", "Mannheim", "Freiburg"],
    ),
    ("Niedersachsen", &["Hannover", "Braunschweig"]),
    ("Sachsen", &["Leipzig", "Dresden"]),
];

/// Austrian overrides: city → (state, country). Checked before the German
/// membership table because naive prefix matching conflates DE and AT
/// regional codes.
const AT_OVERRIDES: &[(&str, &str)] = &[
    ("Wien (Vienna)", "Wien"),
    ("St. Pölten", "Niederösterreich"),
    ("Linz", "Oberösterreich"),
    ("Salzburg", "Salzburg"),
    ("Innsbruck", "Tirol"),
    ("Graz", "Steiermark"),
    ("Klagenfurt", "Kärnten"),
];

/// Swiss overrides: city → canton.
const CH_OVERRIDES: &[(&str, &str)] = &[
    ("Zürich (Zurich)", "Zürich"),
    ("Bern", "Bern"),
    ("Basel", "Basel-Stadt"),
    ("Genf (Geneva)", "Genf"),
    ("Luzern", "Luzern"),
    ("Lugano", "Tessin"),
];

/// `true` for strings that mean "no usable location" rather than a place.
#[must_use]
pub fn is_placeholder_city(s: &str) -> bool {
    let s = s.trim().to_lowercase();
    PLACEHOLDER_CITIES.contains(&s.as_str())
}

/// `true` for sentinel category values the scraper leaves behind.
#[must_use]
pub fn is_placeholder_category(s: &str) -> bool {
    let s = s.trim().to_lowercase();
    PLACEHOLDER_CATEGORIES.contains(&s.as_str())
}

/// `true` when `name` is one of the guard-listed major German cities.
#[must_use]
pub fn is_major_german_city(name: &str) -> bool {
    MAJOR_GERMAN_CITIES.iter().any(|c| c.eq_ignore_ascii_case(name))
}

/// Looks up a canonical rewrite for `working` in the alias table.
///
/// Matches the whole string first, then any whole-word occurrence, both
/// case-insensitive. Returns the canonical display name on a hit.
#[must_use]
pub fn alias_canonical(working: &str) -> Option<&'static str> {
    let lowered = working.trim().to_lowercase();
    if let Some(&(_, canonical)) = CITY_ALIASES.iter().find(|&&(alias, _)| lowered == alias) {
        return Some(canonical);
    }
    ALIAS_WORD_RES
        .iter()
        .find(|(re, _)| re.is_match(working))
        .map(|(_, canonical)| *canonical)
}

/// Maps a postal code to its regional major city and country.
///
/// 5-digit codes are German: exact two-digit prefix first, then the broader
/// single-digit Leitzone fallback. 4-digit codes are Austrian or Swiss; the
/// country hint picks the table, otherwise Austria is tried first (the
/// directory skews Austrian) and Switzerland second.
#[must_use]
pub fn zip_region_city(zip: &str, hint: Option<CountryHint>) -> Option<(&'static str, &'static str)> {
    match zip.len() {
        5 => {
            let prefix = &zip[..2];
            if let Some((_, city)) = ZIP_REGION_DE.iter().find(|(p, _)| *p == prefix) {
                return Some((city, "DE"));
            }
            let leitzone = &zip[..1];
            ZIP_REGION_DE_FALLBACK
                .iter()
                .find(|(p, _)| *p == leitzone)
                .map(|(_, city)| (*city, "DE"))
        }
        4 => {
            let prefix = &zip[..2];
            let at = ZIP_REGION_AT
                .iter()
                .find(|(p, _)| *p == prefix)
                .map(|(_, city)| (*city, "AT"));
            let ch = ZIP_REGION_CH
                .iter()
                .find(|(p, _)| *p == prefix)
                .map(|(_, city)| (*city, "CH"));
            match hint {
                Some(CountryHint::At) => at,
                Some(CountryHint::Ch) => ch,
                // A 4-digit code is never German; a DE hint is noise here.
                Some(CountryHint::De) | None => at.or(ch),
            }
        }
        _ => None,
    }
}

/// Classifies a canonical city into (state, country).
///
/// AT/CH override tables win over the German membership table.
#[must_use]
pub fn resolve_region(city: &str) -> Option<(&'static str, &'static str)> {
    if let Some((_, state)) = AT_OVERRIDES.iter().find(|(c, _)| *c == city) {
        return Some((state, "AT"));
    }
    if let Some((_, state)) = CH_OVERRIDES.iter().find(|(c, _)| *c == city) {
        return Some((state, "CH"));
    }
    for (state, cities) in STATE_CITIES_DE {
        if cities.contains(&city) {
            return Some((state, "DE"));
        }
    }
    None
}
