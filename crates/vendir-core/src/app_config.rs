//! Application configuration assembled from environment variables.

const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_SUGGEST_MODEL: &str = "gpt-4o-mini";
const DEFAULT_SUGGEST_TIMEOUT_SECS: u64 = 30;
// Provider rate limits are shared across the whole sweep, so the spacing is
// global per operation kind, not per record.
const DEFAULT_CITY_SUGGEST_DELAY_MS: u64 = 1200;
const DEFAULT_CATEGORY_SUGGEST_DELAY_MS: u64 = 800;
const DEFAULT_SUGGEST_COOLDOWN_MS: u64 = 5000;
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_DB_MIN_CONNECTIONS: u32 = 1;
const DEFAULT_DB_ACQUIRE_TIMEOUT_SECS: u64 = 10;
const DEFAULT_SWEEP_PROGRESS_EVERY: u64 = 25;
const DEFAULT_DELETE_TOKEN_TTL_SECS: u64 = 300;

/// Runtime configuration for the reconciliation pipeline.
///
/// The suggestion provider is optional: when `suggest_api_url` is absent the
/// AI cascade stages are disabled and everything else still runs.
#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub log_level: String,
    pub suggest_api_url: Option<String>,
    pub suggest_api_key: Option<String>,
    pub suggest_model: String,
    pub suggest_timeout_secs: u64,
    pub city_suggest_delay_ms: u64,
    pub category_suggest_delay_ms: u64,
    pub suggest_cooldown_ms: u64,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub sweep_progress_every: u64,
    pub delete_token_ttl_secs: u64,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("database_url", &"[redacted]")
            .field("log_level", &self.log_level)
            .field("suggest_api_url", &self.suggest_api_url)
            .field(
                "suggest_api_key",
                &self.suggest_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("suggest_model", &self.suggest_model)
            .field("suggest_timeout_secs", &self.suggest_timeout_secs)
            .field("city_suggest_delay_ms", &self.city_suggest_delay_ms)
            .field(
                "category_suggest_delay_ms",
                &self.category_suggest_delay_ms,
            )
            .field("suggest_cooldown_ms", &self.suggest_cooldown_ms)
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("sweep_progress_every", &self.sweep_progress_every)
            .field("delete_token_ttl_secs", &self.delete_token_ttl_secs)
            .finish()
    }
}

impl AppConfig {
    /// Builds config from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error string listing every missing required variable, so an
    /// operator fixes the environment in one round trip.
    pub fn from_env() -> Result<Self, String> {
        let get = |key: &str| -> Option<String> { std::env::var(key).ok().filter(|v| !v.is_empty()) };

        let mut missing = Vec::new();

        let database_url = get("DATABASE_URL");
        if database_url.is_none() {
            missing.push("DATABASE_URL");
        }

        if !missing.is_empty() {
            return Err(format!("missing env vars: {}", missing.join(", ")));
        }

        Ok(Self {
            database_url: database_url.unwrap(),
            log_level: get("VENDIR_LOG_LEVEL").unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_owned()),
            suggest_api_url: get("VENDIR_SUGGEST_API_URL"),
            suggest_api_key: get("VENDIR_SUGGEST_API_KEY"),
            suggest_model: get("VENDIR_SUGGEST_MODEL")
                .unwrap_or_else(|| DEFAULT_SUGGEST_MODEL.to_owned()),
            suggest_timeout_secs: read_u64(
                "VENDIR_SUGGEST_TIMEOUT_SECS",
                DEFAULT_SUGGEST_TIMEOUT_SECS,
            ),
            city_suggest_delay_ms: read_u64(
                "VENDIR_CITY_SUGGEST_DELAY_MS",
                DEFAULT_CITY_SUGGEST_DELAY_MS,
            ),
            category_suggest_delay_ms: read_u64(
                "VENDIR_CATEGORY_SUGGEST_DELAY_MS",
                DEFAULT_CATEGORY_SUGGEST_DELAY_MS,
            ),
            suggest_cooldown_ms: read_u64("VENDIR_SUGGEST_COOLDOWN_MS", DEFAULT_SUGGEST_COOLDOWN_MS),
            db_max_connections: read_u32("VENDIR_DB_MAX_CONNECTIONS", DEFAULT_DB_MAX_CONNECTIONS),
            db_min_connections: read_u32("VENDIR_DB_MIN_CONNECTIONS", DEFAULT_DB_MIN_CONNECTIONS),
            db_acquire_timeout_secs: read_u64(
                "VENDIR_DB_ACQUIRE_TIMEOUT_SECS",
                DEFAULT_DB_ACQUIRE_TIMEOUT_SECS,
            ),
            sweep_progress_every: read_u64(
                "VENDIR_SWEEP_PROGRESS_EVERY",
                DEFAULT_SWEEP_PROGRESS_EVERY,
            )
            .max(1),
            delete_token_ttl_secs: read_u64(
                "VENDIR_DELETE_TOKEN_TTL_SECS",
                DEFAULT_DELETE_TOKEN_TTL_SECS,
            ),
        })
    }

    /// `true` when the AI fallback stage can run at all.
    ///
    /// A URL without a key is a configuration error the caller should fail
    /// fast on; this only answers "is the stage configured".
    #[must_use]
    pub fn suggestions_configured(&self) -> bool {
        self.suggest_api_url.is_some()
    }
}

fn read_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn read_u32(key: &str, default: u32) -> u32 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
