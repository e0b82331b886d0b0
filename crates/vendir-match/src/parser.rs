//! Location parser: splits raw `"city[,zip][,tags]"` strings.
//!
//! Raw location strings arrive in many shapes: `"A-3021 Pressbaum"`,
//! `"Berlin, 10115"`, `"DE-Hamburg"`, or the output of a previous
//! reconciliation pass carrying an `[eski: ...]` / `[AI: ...]` audit tag.
//! The parser is idempotent: feeding its own recombined output back in
//! yields the same result.

use std::sync::LazyLock;

use regex::Regex;

use vendir_core::CountryHint;

use crate::types::ParsedLocation;

static ZIP_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:(A|AT|CH|D|DE)-)?(\d{4,5})\b").expect("valid zip regex")
});
static PREFIX_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(A|AT|CH|D|DE)-(\p{Alphabetic})").expect("valid prefix regex")
});

/// City value used when the raw string yields nothing usable. A parse never
/// fails; ambiguity falls back to this sentinel.
pub const UNKNOWN_CITY: &str = "Unknown";

/// Parses a free-text location string into `{city, zip, country_hint}`.
///
/// Rules, applied in order:
/// 1. Strip a trailing `[eski: ...]` or `[AI: ...]` audit tag.
/// 2. Extract the first run of 4-5 digits anywhere in the string as the zip,
///    together with an optional country-prefix marker (`A-`, `AT-`, `CH-`,
///    `D-`, `DE-`) attached to it.
/// 3. Strip a remaining leading country-prefix marker.
/// 4. Take the first non-empty comma segment as the city and trim residual
///    punctuation.
#[must_use]
pub fn parse_location(raw: &str) -> ParsedLocation {
    let mut working = strip_audit_tags(raw.trim());
    let mut country_hint = None;
    let mut zip = None;

    let zip_hit = ZIP_RE.captures(&working).map(|caps| {
        let hint = caps
            .get(1)
            .and_then(|prefix| CountryHint::from_prefix(prefix.as_str()));
        let range = caps.get(0).expect("capture 0 always present").range();
        (range, hint, caps[2].to_owned())
    });
    if let Some((range, hint, value)) = zip_hit {
        country_hint = hint;
        zip = Some(value);
        working.replace_range(range, "");
    }

    let prefix_hit = PREFIX_RE.captures(&working).map(|caps| {
        let hint = CountryHint::from_prefix(&caps[1]);
        // Keep the first city letter, drop the marker.
        let city_start = caps.get(2).expect("capture present").start();
        (city_start, hint)
    });
    if let Some((city_start, hint)) = prefix_hit {
        if country_hint.is_none() {
            country_hint = hint;
        }
        working.replace_range(..city_start, "");
    }

    let city = working
        .split(',')
        .map(str::trim)
        .find(|segment| !segment.is_empty())
        .map(trim_residual)
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| UNKNOWN_CITY.to_owned());

    ParsedLocation {
        city,
        zip,
        country_hint,
    }
}

/// Removes trailing bracketed audit annotations left by earlier passes.
fn strip_audit_tags(raw: &str) -> String {
    let mut s = raw.trim().to_owned();
    loop {
        let Some(open) = s.rfind('[') else { break };
        if !s.ends_with(']') {
            break;
        }
        let inner = s[open + 1..s.len() - 1].trim_start().to_lowercase();
        if inner.starts_with("eski:") || inner.starts_with("ai:") {
            s.truncate(open);
            s = s.trim_end().to_owned();
        } else {
            break;
        }
    }
    s
}

/// Trims leading/trailing punctuation noise left by zip/prefix removal.
fn trim_residual(segment: &str) -> String {
    segment
        .trim_matches(|c: char| c.is_whitespace() || matches!(c, '-' | ';' | '/' | ':'))
        .trim()
        .to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_prefix_zip_city() {
        let parsed = parse_location("A-3021 Pressbaum");
        assert_eq!(parsed.city, "Pressbaum");
        assert_eq!(parsed.zip.as_deref(), Some("3021"));
        assert_eq!(parsed.country_hint, Some(CountryHint::At));
    }

    #[test]
    fn parses_zip_after_city_with_comma() {
        let parsed = parse_location("Berlin, 10115");
        assert_eq!(parsed.city, "Berlin");
        assert_eq!(parsed.zip.as_deref(), Some("10115"));
        assert_eq!(parsed.country_hint, None);
    }

    #[test]
    fn parses_bare_country_prefix_without_zip() {
        let parsed = parse_location("DE-Hamburg");
        assert_eq!(parsed.city, "Hamburg");
        assert_eq!(parsed.zip, None);
        assert_eq!(parsed.country_hint, Some(CountryHint::De));
    }

    #[test]
    fn strips_previous_pass_audit_tag() {
        let parsed = parse_location("Wien (Vienna) [eski: Pressbaum]");
        assert_eq!(parsed.city, "Wien (Vienna)");
        assert_eq!(parsed.zip, None);
    }

    #[test]
    fn strips_ai_audit_tag_case_insensitive() {
        let parsed = parse_location("Berlin [AI: berln]");
        assert_eq!(parsed.city, "Berlin");
    }

    #[test]
    fn keeps_non_audit_brackets() {
        let parsed = parse_location("Wien (Vienna) [1. Bezirk]");
        assert_eq!(parsed.city, "Wien (Vienna) [1. Bezirk]");
    }

    #[test]
    fn empty_input_falls_back_to_unknown() {
        assert_eq!(parse_location("").city, UNKNOWN_CITY);
        assert_eq!(parse_location("  , ,").city, UNKNOWN_CITY);
    }

    #[test]
    fn zip_only_input_falls_back_to_unknown_city() {
        let parsed = parse_location("CH-8001");
        assert_eq!(parsed.city, UNKNOWN_CITY);
        assert_eq!(parsed.zip.as_deref(), Some("8001"));
        assert_eq!(parsed.country_hint, Some(CountryHint::Ch));
    }

    #[test]
    fn six_digit_runs_are_not_zips() {
        let parsed = parse_location("Musterstadt 123456");
        assert_eq!(parsed.zip, None);
        assert_eq!(parsed.city, "Musterstadt 123456");
    }

    #[test]
    fn drops_trailing_tag_segments_after_comma() {
        let parsed = parse_location("10115 Berlin, featured, top");
        assert_eq!(parsed.city, "Berlin");
        assert_eq!(parsed.zip.as_deref(), Some("10115"));
    }

    #[test]
    fn lowercase_prefix_marker_is_recognized() {
        let parsed = parse_location("d-80331 München");
        assert_eq!(parsed.city, "München");
        assert_eq!(parsed.zip.as_deref(), Some("80331"));
        assert_eq!(parsed.country_hint, Some(CountryHint::De));
    }

    #[test]
    fn parse_is_idempotent_over_recombined_output() {
        let samples = [
            "A-3021 Pressbaum",
            "Berlin, 10115",
            "DE-Hamburg",
            "Wien (Vienna) [eski: A-3021 Pressbaum]",
            "d-80331 München",
            "CH-8001",
            "",
            "???",
            "St. Pölten",
            "10115 Berlin, featured",
        ];
        for raw in samples {
            let first = parse_location(raw);
            let second = parse_location(&first.recombine());
            assert_eq!(first, second, "not idempotent for {raw:?}");
        }
    }
}
