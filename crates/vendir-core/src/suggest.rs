//! Contract for the external AI suggestion oracle.

use async_trait::async_trait;
use thiserror::Error;

use crate::canonical::CountryHint;

#[derive(Debug, Error)]
pub enum SuggestError {
    /// Provider asked us to back off. Transient: skip the record for this
    /// pass, never treat as a firm negative.
    #[error("suggestion provider rate limited (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    /// Missing credentials or endpoint configuration. Checked once before a
    /// sweep starts, not per record.
    #[error("suggestion service unavailable: {0}")]
    Unavailable(String),

    #[error("suggestion HTTP error: {0}")]
    Http(String),

    #[error("suggestion response parse error for {context}: {reason}")]
    Deserialize { context: String, reason: String },

    /// Provider returned free text instead of a value from the allowed list.
    #[error("provider answer {value:?} is not in the allowed list")]
    Contract { value: String },
}

/// Rate-limited oracle that maps a noisy candidate string onto one value from
/// a closed allowed list, or `None` when it cannot.
///
/// Implementations own their throttling: callers may invoke back to back and
/// rely on the service to space provider calls out.
#[async_trait]
pub trait SuggestionService: Send + Sync {
    /// Suggests a canonical city name for `raw`, constrained to `allowed`.
    async fn suggest_city(
        &self,
        raw: &str,
        allowed: &[String],
        country_hint: Option<CountryHint>,
        zip: Option<&str>,
    ) -> Result<Option<String>, SuggestError>;

    /// Suggests a canonical category name for `raw`, constrained to `allowed`.
    async fn suggest_category(
        &self,
        raw: &str,
        allowed: &[String],
    ) -> Result<Option<String>, SuggestError>;
}
