//! Configuration for the API client and the reconciliation engine.

use std::time::Duration;

/// API configuration constants.
pub mod api {
    use std::time::Duration;

    /// Base URL for Elsevier content APIs (Scopus search, retrieval, citations).
    pub const CONTENT_API: &str = "https://api.elsevier.com/content";

    /// Base URL for SciVal analytics.
    pub const SCIVAL_API: &str = "https://api.elsevier.com/analytics/scival";

    /// Request timeout.
    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

    /// Connection timeout.
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Delay between requests (Scopus allows ~9 req/s per key).
    pub const RATE_LIMIT_DELAY: Duration = Duration::from_millis(120);

    /// Cache TTL (10 minutes).
    pub const CACHE_TTL: Duration = Duration::from_secs(600);

    /// Maximum cache size.
    pub const CACHE_MAX_SIZE: u64 = 1000;

    /// Page size for search endpoints.
    pub const PAGE_SIZE: usize = 25;

    /// Scopus refuses `start` offsets beyond this without a cursor.
    pub const MAX_SEARCH_RESULTS: usize = 5000;

    /// Maximum keepalive connections.
    pub const MAX_KEEPALIVE: usize = 10;

    /// Keepalive expiry.
    pub const KEEPALIVE_EXPIRY: Duration = Duration::from_secs(30);
}

/// Tunable engine constants.
///
/// These encode assumptions about the upstream windowing contract and the
/// author-matching heuristics, so every one of them can be overridden.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tuning {
    /// Maximum identifiers per citation overview call.
    pub citation_batch_size: usize,

    /// Forward margin of the per-period year lists (current year plus one future slot).
    pub forward_margin_years: i32,

    /// Default medium period anchor, in years before now.
    pub default_mid_offset: i32,

    /// Default short period anchor, in years before now.
    pub default_short_offset: i32,

    /// Indices into a merged metric series used when an anchor year falls outside it.
    /// Negative values count from the end.
    pub window_fallback_indices: [i64; 3],

    /// Number of trailing years taken from the short metric window when merging.
    pub short_window_tail: usize,

    /// Minimum similarity ratio (0-100) for a fuzzy roster match.
    pub fuzzy_threshold: u8,

    /// Leading first-name characters compared by the identity rule.
    pub first_name_prefix: usize,

    /// Default span of a collaboration year range, ending at the current year.
    pub default_collaboration_span: i32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            citation_batch_size: 25,
            forward_margin_years: 2,
            default_mid_offset: 6,
            default_short_offset: 4,
            window_fallback_indices: [0, -7, -5],
            short_window_tail: 2,
            fuzzy_threshold: 80,
            first_name_prefix: 2,
            default_collaboration_span: 5,
        }
    }
}

impl Tuning {
    /// Apply `BIBLIO_*` environment overrides on top of the defaults.
    ///
    /// # Errors
    ///
    /// Returns error if an override is present but not a valid number.
    pub fn from_env() -> anyhow::Result<Self> {
        let mut tuning = Self::default();
        if let Ok(value) = std::env::var("BIBLIO_FUZZY_THRESHOLD") {
            tuning.fuzzy_threshold = value.trim().parse()?;
        }
        if let Ok(value) = std::env::var("BIBLIO_FIRST_NAME_PREFIX") {
            tuning.first_name_prefix = value.trim().parse()?;
        }
        if let Ok(value) = std::env::var("BIBLIO_CITATION_BATCH_SIZE") {
            tuning.citation_batch_size = value.trim().parse()?;
        }
        anyhow::ensure!(tuning.citation_batch_size > 0, "citation batch size must be positive");
        anyhow::ensure!(tuning.fuzzy_threshold <= 100, "fuzzy threshold is a percentage");
        Ok(tuning)
    }
}

/// Client and engine configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Elsevier API key.
    pub api_key: Option<String>,

    /// Institution token for off-campus access (optional).
    pub inst_token: Option<String>,

    /// Base URL for content APIs (for testing with mock servers).
    pub content_api_url: String,

    /// Base URL for SciVal (for testing with mock servers).
    pub scival_api_url: String,

    /// Request timeout.
    pub request_timeout: Duration,

    /// Connection timeout.
    pub connect_timeout: Duration,

    /// Delay before each request.
    pub rate_limit_delay: Duration,

    /// Cache TTL.
    pub cache_ttl: Duration,

    /// Maximum cache size.
    pub cache_max_size: u64,

    /// Page size for search endpoints.
    pub page_size: usize,

    /// Engine constants.
    pub tuning: Tuning,
}

impl Config {
    /// Create a new configuration with the given credentials.
    #[must_use]
    pub fn new(api_key: Option<String>, inst_token: Option<String>) -> Self {
        Self {
            api_key,
            inst_token,
            content_api_url: api::CONTENT_API.to_string(),
            scival_api_url: api::SCIVAL_API.to_string(),
            request_timeout: api::REQUEST_TIMEOUT,
            connect_timeout: api::CONNECT_TIMEOUT,
            rate_limit_delay: api::RATE_LIMIT_DELAY,
            cache_ttl: api::CACHE_TTL,
            cache_max_size: api::CACHE_MAX_SIZE,
            page_size: api::PAGE_SIZE,
            tuning: Tuning::default(),
        }
    }

    /// Create a test configuration with custom URLs for mock servers.
    #[must_use]
    pub fn for_testing(base_url: &str) -> Self {
        Self {
            api_key: Some("test-key".to_string()),
            inst_token: None,
            content_api_url: format!("{}/content", base_url),
            scival_api_url: format!("{}/analytics/scival", base_url),
            request_timeout: Duration::from_secs(5),
            connect_timeout: Duration::from_secs(2),
            rate_limit_delay: Duration::from_millis(0), // No delay in tests
            cache_ttl: Duration::from_secs(0),          // No caching in tests
            cache_max_size: 0,
            page_size: api::PAGE_SIZE,
            tuning: Tuning::default(),
        }
    }

    /// Create configuration from environment variables (and a `.env` file if present).
    ///
    /// # Errors
    ///
    /// Returns error if environment variables are invalid.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv::dotenv().ok();
        let api_key = std::env::var("ELSEVIER_API_KEY").ok();
        let inst_token = std::env::var("ELSEVIER_INST_TOKEN").ok();
        let mut config = Self::new(api_key, inst_token);
        config.tuning = Tuning::from_env()?;
        Ok(config)
    }

    /// Check if an API key is configured.
    #[must_use]
    pub const fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(None, None)
    }
}
