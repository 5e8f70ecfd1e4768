// Fetch client configuration

use gbflat_common::{GbflatError, Result};
use std::time::Duration;

// ============================================================================
// Fetch Configuration Constants
// ============================================================================

/// Default NCBI E-utilities base URL.
pub const DEFAULT_EUTILS_URL: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils";

/// Default Entrez database for nucleotide records.
pub const DEFAULT_DATABASE: &str = "nuccore";

/// Default per-request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default number of attempts per record, the first one included.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default delay before the first retry in milliseconds.
pub const DEFAULT_INITIAL_BACKOFF_MS: u64 = 500;

/// Default cap on the retry delay in milliseconds.
pub const DEFAULT_MAX_BACKOFF_MS: u64 = 8_000;

/// Default number of records fetched at once by `fetch_many`.
/// NCBI allows three requests per second without an API key.
pub const DEFAULT_CONCURRENCY: usize = 3;

pub const DEFAULT_USER_AGENT: &str = concat!("gbflat/", env!("CARGO_PKG_VERSION"));

/// Settings for [`FetchClient`](super::FetchClient)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchConfig {
    /// E-utilities base URL, without a trailing slash
    pub base_url: String,

    /// Entrez database queried by efetch
    pub database: String,

    /// Timeout applied to each HTTP request
    pub timeout: Duration,

    /// Attempts per record, at least 1
    pub max_attempts: u32,

    pub initial_backoff: Duration,
    pub max_backoff: Duration,

    /// Overall limit for one fetch across all attempts
    pub deadline: Option<Duration>,

    pub concurrency: usize,

    /// NCBI API key, raises the rate limit when present
    pub api_key: Option<String>,

    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_EUTILS_URL.to_string(),
            database: DEFAULT_DATABASE.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            initial_backoff: Duration::from_millis(DEFAULT_INITIAL_BACKOFF_MS),
            max_backoff: Duration::from_millis(DEFAULT_MAX_BACKOFF_MS),
            deadline: None,
            concurrency: DEFAULT_CONCURRENCY,
            api_key: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl FetchConfig {
    /// Load configuration from the environment (and `.env` if present)
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let defaults = Self::default();
        let config = Self {
            base_url: std::env::var("GBFLAT_EUTILS_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.base_url),
            database: std::env::var("GBFLAT_FETCH_DATABASE").unwrap_or(defaults.database),
            timeout: env_parse("GBFLAT_FETCH_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
            max_attempts: env_parse("GBFLAT_FETCH_MAX_ATTEMPTS").unwrap_or(defaults.max_attempts),
            initial_backoff: env_parse("GBFLAT_FETCH_BACKOFF_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.initial_backoff),
            max_backoff: env_parse("GBFLAT_FETCH_MAX_BACKOFF_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.max_backoff),
            deadline: env_parse("GBFLAT_FETCH_DEADLINE_SECS").map(Duration::from_secs),
            concurrency: env_parse("GBFLAT_FETCH_CONCURRENCY").unwrap_or(defaults.concurrency),
            api_key: std::env::var("NCBI_API_KEY").ok().filter(|k| !k.is_empty()),
            user_agent: defaults.user_agent,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = database.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    pub fn with_backoff(mut self, initial: Duration, max: Duration) -> Self {
        self.initial_backoff = initial;
        self.max_backoff = max;
        self
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Delay before retry number `retry` (1-based), doubling up to `max_backoff`
    pub fn backoff_for(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry.saturating_sub(1));
        self.initial_backoff
            .checked_mul(factor)
            .map_or(self.max_backoff, |delay| delay.min(self.max_backoff))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.base_url.is_empty() {
            return Err(GbflatError::config("E-utilities base URL cannot be empty"));
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(GbflatError::config(format!(
                "E-utilities base URL must be http(s): {}",
                self.base_url
            )));
        }
        if self.database.is_empty() {
            return Err(GbflatError::config("Entrez database cannot be empty"));
        }
        if self.timeout.is_zero() {
            return Err(GbflatError::config("Timeout must be greater than 0"));
        }
        if self.max_attempts == 0 {
            return Err(GbflatError::config("max_attempts must be at least 1"));
        }
        if self.initial_backoff > self.max_backoff {
            return Err(GbflatError::config("initial backoff cannot exceed max backoff"));
        }
        if self.deadline.is_some_and(|d| d.is_zero()) {
            return Err(GbflatError::config("Deadline must be greater than 0"));
        }
        if self.concurrency == 0 {
            return Err(GbflatError::config("concurrency must be at least 1"));
        }
        Ok(())
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.parse().ok())
}
