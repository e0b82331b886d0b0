//! Category matching cascade.
//!
//! Much narrower than the city cascade: categories form a small closed
//! vocabulary where a fuzzy false positive costs more than a missed match,
//! so it is direct lookup → AI and nothing in between.

use vendir_core::{SuggestError, SuggestionService};

use crate::index::LookupIndex;
use crate::tables;
use crate::types::{CategoryResolution, MatchMethod};

/// Minimum raw-string length for the AI fallback.
const MIN_AI_QUERY_LEN: usize = 3;

/// `true` when the record's category still needs the cascade.
///
/// A valid existing id paired with a non-sentinel raw value is settled;
/// anything else (null id, id missing from the index, or a scraper sentinel
/// like `"dom-scraped"`) goes through resolution again.
#[must_use]
pub fn needs_category_resolution(raw: &str, current_id: Option<i64>, index: &LookupIndex) -> bool {
    match current_id {
        Some(id) => !index.has_category_id(id) || tables::is_placeholder_category(raw),
        None => true,
    }
}

/// Resolves a free-text category against the canonical category index.
///
/// # Errors
///
/// Returns [`SuggestError`] from the AI stage; `RateLimited` means "skip
/// this record for the current pass".
pub async fn resolve_category(
    raw: &str,
    index: &LookupIndex,
    ai: Option<&dyn SuggestionService>,
) -> Result<CategoryResolution, SuggestError> {
    let trimmed = raw.trim();

    // Direct lookup by canonical name or label key.
    if let Some(id) = index.category_id(trimmed) {
        return Ok(CategoryResolution {
            category_id: Some(id),
            name: index.category_name(id).map(str::to_owned),
            method: MatchMethod::Exact,
            orphan: false,
        });
    }

    // AI fallback. Sentinels and fragments carry no signal worth a call.
    if ai_eligible(trimmed) {
        if let Some(service) = ai {
            let suggestion = service
                .suggest_category(trimmed, index.category_names())
                .await?;
            if let Some(name) = suggestion {
                let category_id = index.category_id(&name);
                let orphan = category_id.is_none();
                return Ok(CategoryResolution {
                    category_id,
                    name: Some(name),
                    method: MatchMethod::Ai,
                    orphan,
                });
            }
        }
    }

    Ok(CategoryResolution::unresolved())
}

fn ai_eligible(raw: &str) -> bool {
    !raw.is_empty()
        && !tables::is_placeholder_category(raw)
        && raw.chars().count() >= MIN_AI_QUERY_LEN
}
