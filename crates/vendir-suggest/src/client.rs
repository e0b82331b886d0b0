//! OpenAI-compatible chat-completions client for canonical suggestions.
//!
//! The provider contract is strict: the model must answer with exactly one
//! value from the allowed list or the word `null`. Anything else is a
//! [`SuggestError::Contract`] violation, never silently accepted.

use std::fmt::Write as _;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use vendir_core::{AppConfig, CountryHint, SuggestError, SuggestionService};

use crate::throttle::{Cooldown, Throttle};

const CITY_SYSTEM_PROMPT: &str = "You normalize noisy city names from scraped business listings. \
     Reply with exactly one name from the allowed list, or the word null if none applies. \
     Never reply with free text.";

const CATEGORY_SYSTEM_PROMPT: &str = "You map free-text business categories onto a fixed category list. \
     Reply with exactly one name from the allowed list, or the word null if none applies. \
     Never reply with free text.";

/// Answers the provider may use to say "no match".
const NULL_ANSWERS: &[&str] = &["", "null", "none", "n/a", "unknown"];

/// HTTP client for the suggestion provider.
///
/// Owns the global call spacing (one [`Throttle`] per operation kind) and
/// the shared post-429 [`Cooldown`]. Use [`SuggestClient::from_config`] in
/// production or [`SuggestClient::with_base_url`] to point at a mock server
/// in tests.
pub struct SuggestClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
    city_throttle: Throttle,
    category_throttle: Throttle,
    cooldown: Cooldown,
    cooldown_duration: Duration,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

impl SuggestClient {
    /// Builds a client from [`AppConfig`].
    ///
    /// Returns `Ok(None)` when no suggestion endpoint is configured (the AI
    /// stage is simply disabled). A configured endpoint without an API key
    /// is a hard configuration error, caught here once rather than once per
    /// record.
    ///
    /// # Errors
    ///
    /// [`SuggestError::Unavailable`] for a URL without a key;
    /// [`SuggestError::Http`] if the HTTP client cannot be constructed.
    pub fn from_config(config: &AppConfig) -> Result<Option<Self>, SuggestError> {
        let Some(base_url) = config.suggest_api_url.as_deref() else {
            return Ok(None);
        };
        let Some(api_key) = config.suggest_api_key.as_deref() else {
            return Err(SuggestError::Unavailable(
                "VENDIR_SUGGEST_API_URL is set but VENDIR_SUGGEST_API_KEY is not".to_owned(),
            ));
        };
        Self::with_base_url(
            base_url,
            api_key,
            &config.suggest_model,
            config.suggest_timeout_secs,
            config.city_suggest_delay_ms,
            config.category_suggest_delay_ms,
            config.suggest_cooldown_ms,
        )
        .map(Some)
    }

    /// Builds a client against an explicit base URL (wiremock in tests).
    ///
    /// # Errors
    ///
    /// Returns [`SuggestError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    #[allow(clippy::too_many_arguments)]
    pub fn with_base_url(
        base_url: &str,
        api_key: &str,
        model: &str,
        timeout_secs: u64,
        city_delay_ms: u64,
        category_delay_ms: u64,
        cooldown_ms: u64,
    ) -> Result<Self, SuggestError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("vendir/0.1 (listing-reconciliation)")
            .build()
            .map_err(|e| SuggestError::Http(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            api_key: api_key.to_owned(),
            model: model.to_owned(),
            city_throttle: Throttle::new(city_delay_ms),
            category_throttle: Throttle::new(category_delay_ms),
            cooldown: Cooldown::new(),
            cooldown_duration: Duration::from_millis(cooldown_ms),
        })
    }

    /// One throttled round trip: cooldown gate, spacing, request, and the
    /// 429 → cooldown transition.
    async fn complete(
        &self,
        system: &str,
        user: &str,
        throttle: &Throttle,
    ) -> Result<String, SuggestError> {
        self.cooldown.check().await?;
        throttle.wait().await;

        let request = ChatRequest {
            model: &self.model,
            temperature: 0.0,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| SuggestError::Http(e.to_string()))?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or_else(|| self.cooldown_duration.as_secs());
            let cooldown = self
                .cooldown_duration
                .max(Duration::from_secs(retry_after_secs));
            self.cooldown.engage(cooldown).await;
            tracing::warn!(
                retry_after_secs,
                "suggestion provider rate limited — engaging cooldown"
            );
            return Err(SuggestError::RateLimited { retry_after_secs });
        }

        let status = response.status();
        if !status.is_success() {
            return Err(SuggestError::Http(format!(
                "suggestion provider returned status {status}"
            )));
        }

        let parsed: ChatResponse =
            response
                .json()
                .await
                .map_err(|e| SuggestError::Deserialize {
                    context: "chat completion response".to_owned(),
                    reason: e.to_string(),
                })?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| SuggestError::Deserialize {
                context: "chat completion response".to_owned(),
                reason: "no choices in response".to_owned(),
            })?;

        Ok(content.trim().to_owned())
    }
}

#[async_trait]
impl SuggestionService for SuggestClient {
    async fn suggest_city(
        &self,
        raw: &str,
        allowed: &[String],
        country_hint: Option<CountryHint>,
        zip: Option<&str>,
    ) -> Result<Option<String>, SuggestError> {
        let user = build_city_prompt(raw, allowed, country_hint, zip);
        let answer = self
            .complete(CITY_SYSTEM_PROMPT, &user, &self.city_throttle)
            .await?;
        interpret_answer(&answer, allowed)
    }

    async fn suggest_category(
        &self,
        raw: &str,
        allowed: &[String],
    ) -> Result<Option<String>, SuggestError> {
        let user = build_category_prompt(raw, allowed);
        let answer = self
            .complete(CATEGORY_SYSTEM_PROMPT, &user, &self.category_throttle)
            .await?;
        interpret_answer(&answer, allowed)
    }
}

fn build_city_prompt(
    raw: &str,
    allowed: &[String],
    country_hint: Option<CountryHint>,
    zip: Option<&str>,
) -> String {
    let mut prompt = format!("Raw city: {raw}\n");
    if let Some(hint) = country_hint {
        let _ = writeln!(prompt, "Country hint: {hint}");
    }
    if let Some(zip) = zip {
        let _ = writeln!(prompt, "Postal code: {zip}");
    }
    prompt.push_str("Allowed cities:\n");
    for name in allowed {
        let _ = writeln!(prompt, "- {name}");
    }
    prompt
}

fn build_category_prompt(raw: &str, allowed: &[String]) -> String {
    let mut prompt = format!("Raw category: {raw}\nAllowed categories:\n");
    for name in allowed {
        let _ = writeln!(prompt, "- {name}");
    }
    prompt
}

/// Validates a provider answer against the allowed list.
///
/// Null-ish answers map to `None`; an allowed value (any casing, optional
/// surrounding quotes) maps to its canonical spelling; anything else is a
/// contract violation.
fn interpret_answer(answer: &str, allowed: &[String]) -> Result<Option<String>, SuggestError> {
    let cleaned = answer
        .trim()
        .trim_matches(|c| matches!(c, '"' | '\'' | '`' | '.'))
        .trim();
    let lowered = cleaned.to_lowercase();

    if NULL_ANSWERS.contains(&lowered.as_str()) {
        return Ok(None);
    }
    if let Some(canonical) = allowed.iter().find(|a| a.to_lowercase() == lowered) {
        return Ok(Some(canonical.clone()));
    }
    Err(SuggestError::Contract {
        value: cleaned.to_owned(),
    })
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
