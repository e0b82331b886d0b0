//! City matching cascade.
//!
//! Stages run cheapest-first and short-circuit on the first hit:
//! alias rewrite → exact lookup → cross-validation guard → ZIP-region →
//! substring/fuzzy → AI oracle. ZIP geography deliberately outranks fuzzy
//! string similarity: postal prefixes are a stronger signal than edit
//! distance on noisy scraped text.

use vendir_core::{SuggestError, SuggestionService};

use crate::fuzzy::{best_fuzzy_match, contains_either_way};
use crate::index::LookupIndex;
use crate::tables;
use crate::types::{CityResolution, MatchMethod, MatchResult, ParsedLocation};

/// Minimum working-string length for the AI fallback to fire.
const MIN_AI_QUERY_LEN: usize = 3;

/// Resolves a parsed location against the canonical city index.
///
/// `ai` is the optional suggestion oracle; when `None` the cascade simply
/// ends after the fuzzy stage. The oracle is consulted at most once per
/// call, and only for strings that are plausibly geographic.
///
/// # Errors
///
/// Returns [`SuggestError`] from the AI stage. `RateLimited` means the
/// record should be skipped for this pass, not marked unresolved forever.
pub async fn resolve_city(
    parsed: &ParsedLocation,
    index: &LookupIndex,
    ai: Option<&dyn SuggestionService>,
) -> Result<CityResolution, SuggestError> {
    let original = parsed.city.as_str();
    let mut working = original.to_owned();
    let mut hit: Option<MatchResult> = None;

    // Stage 1: alias/canonical rewrite.
    if let Some(canonical) = tables::alias_canonical(&working) {
        working = canonical.to_owned();
        hit = Some(MatchResult {
            value: canonical.to_owned(),
            method: MatchMethod::Exact,
            confidence: 1.0,
        });
    }

    // Stage 2: exact canonical lookup (aliases from the canonical table
    // included via the index keys).
    if hit.is_none() {
        if let Some(id) = index.city_id(&working) {
            if let Some(display) = index.city_display(id) {
                hit = Some(MatchResult {
                    value: display.to_owned(),
                    method: MatchMethod::Exact,
                    confidence: 1.0,
                });
            }
        }
    }

    // Stage 3: cross-validation guard. A 4-digit postal code cannot be
    // German, so an exact/alias hit on a major German city is a false
    // positive (short aliases collide with unrelated metros). Discard and
    // fall through with the original string.
    if let Some(result) = &hit {
        let four_digit_zip = parsed.zip.as_deref().is_some_and(|z| z.len() == 4);
        if four_digit_zip && tables::is_major_german_city(&result.value) {
            tracing::debug!(
                city = %result.value,
                zip = parsed.zip.as_deref().unwrap_or(""),
                "discarding major-German-city match contradicted by 4-digit zip"
            );
            hit = None;
            working = original.to_owned();
        }
    }

    // Stage 4: ZIP-region lookup. Postal geography beats fuzzy similarity.
    if hit.is_none() {
        if let Some(zip) = parsed.zip.as_deref() {
            if let Some((city, _country)) = tables::zip_region_city(zip, parsed.country_hint) {
                hit = Some(MatchResult {
                    value: city.to_owned(),
                    method: MatchMethod::ZipRegion,
                    confidence: 1.0,
                });
            }
        }
    }

    // Stage 5: substring containment, then fuzzy edit distance.
    if hit.is_none() {
        if let Some(name) = index
            .city_names()
            .iter()
            .find(|name| contains_either_way(&working, name))
        {
            hit = Some(MatchResult {
                value: name.clone(),
                method: MatchMethod::Partial,
                confidence: 1.0,
            });
        } else if let Some((name, score)) = best_fuzzy_match(&working, index.city_names()) {
            hit = Some(MatchResult {
                value: name.to_owned(),
                method: MatchMethod::Fuzzy,
                confidence: score,
            });
        }
    }

    // Stage 6: AI fallback, gated so placeholders and fragments never spend
    // provider budget.
    if hit.is_none() && ai_eligible(&working) {
        if let Some(service) = ai {
            let suggestion = service
                .suggest_city(
                    &working,
                    index.city_names(),
                    parsed.country_hint,
                    parsed.zip.as_deref(),
                )
                .await?;
            if let Some(name) = suggestion {
                hit = Some(MatchResult {
                    value: name,
                    method: MatchMethod::Ai,
                    confidence: 1.0,
                });
            }
        }
    }

    let Some(result) = hit else {
        return Ok(CityResolution::unresolved(parsed));
    };

    Ok(finish(parsed, original, result, index))
}

/// AI stage gate: skip placeholders and strings too short to mean anything.
fn ai_eligible(working: &str) -> bool {
    !tables::is_placeholder_city(working) && working.chars().count() >= MIN_AI_QUERY_LEN
}

/// Builds the final resolution: id lookup, state/country classification,
/// and the audit tag when the display string changed.
fn finish(
    parsed: &ParsedLocation,
    original: &str,
    result: MatchResult,
    index: &LookupIndex,
) -> CityResolution {
    let city_id = index.city_id(&result.value);
    let orphan = city_id.is_none();

    let region = tables::resolve_region(&result.value);
    let state = region.map(|(state, _)| state.to_owned());
    let country = region
        .map(|(_, country)| country.to_owned())
        .or_else(|| parsed.country_hint.map(|h| h.code().to_owned()));

    let display = if result.value == original {
        result.value.clone()
    } else {
        let marker = if result.method == MatchMethod::Ai {
            "AI"
        } else {
            "eski"
        };
        format!("{} [{marker}: {original}]", result.value)
    };

    CityResolution {
        city: display,
        canonical_name: Some(result.value),
        city_id,
        state,
        country,
        zip: parsed.zip.clone(),
        method: result.method,
        orphan,
    }
}
