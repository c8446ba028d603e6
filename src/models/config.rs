//! Configuration module for BlinkGuard
//!
//! Uses defaults from utils/constants.rs, overridable through the
//! environment. Heuristic pattern tables live here so that severity rules
//! can be exercised without the aggregator.

use std::path::PathBuf;
use std::str::FromStr;

use tracing::info;

use crate::models::errors::{AppError, AppResult};
use crate::utils::constants::{
    APPROVAL_KEYWORDS, DEFAULT_HOST, DEFAULT_MAX_CONCURRENCY, DEFAULT_PORT,
    DEFAULT_RATE_LIMIT_PER_MINUTE, DEFAULT_REGISTRY_PATH, DEFAULT_REMOTE_URL, ENV_ADMIN_KEY,
    ENV_HOST, ENV_MAX_CONCURRENCY, ENV_PLATFORM_PORT, ENV_PORT, ENV_RATE_LIMIT, ENV_REGISTRY_PATH,
    ENV_REMOTE_URL, TRUSTED_DOMAINS, TRUSTED_PROGRAMS, UNLIMITED_APPROVAL_PATTERNS,
};

/// Case-insensitive "`anchor` ... `marker`" pattern on a single log line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderedTermsPattern {
    pub anchor: String,
    pub marker: String,
}

impl OrderedTermsPattern {
    pub fn new(anchor: impl Into<String>, marker: impl Into<String>) -> Self {
        Self {
            anchor: anchor.into().to_lowercase(),
            marker: marker.into().to_lowercase(),
        }
    }

    /// True when some line of `text` contains `anchor` and, after it, `marker`
    pub fn is_match(&self, text: &str) -> bool {
        text.lines().any(|line| {
            let line = line.to_lowercase();
            match line.find(&self.anchor) {
                Some(start) => line[start + self.anchor.len()..].contains(&self.marker),
                None => false,
            }
        })
    }
}

/// Pattern tables consumed by the heuristic classifiers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeuristicConfig {
    /// Keywords denoting an approval, matched case-insensitively
    pub approval_keywords: Vec<String>,
    /// Patterns that escalate an approval to critical
    pub unlimited_approval_patterns: Vec<OrderedTermsPattern>,
    /// Program ids that never count as unknown contracts
    pub trusted_programs: Vec<String>,
    /// Substrings that mark a domain as trusted
    pub trusted_domains: Vec<String>,
}

impl Default for HeuristicConfig {
    fn default() -> Self {
        Self {
            approval_keywords: APPROVAL_KEYWORDS.iter().map(|k| k.to_string()).collect(),
            unlimited_approval_patterns: UNLIMITED_APPROVAL_PATTERNS
                .iter()
                .map(|(anchor, marker)| OrderedTermsPattern::new(*anchor, *marker))
                .collect(),
            trusted_programs: TRUSTED_PROGRAMS.iter().map(|p| p.to_string()).collect(),
            trusted_domains: TRUSTED_DOMAINS.iter().map(|d| d.to_string()).collect(),
        }
    }
}

/// Runtime configuration of the BlinkGuard service
#[derive(Debug, Clone)]
pub struct GuardConfig {
    /// Registry JSON file
    pub registry_path: PathBuf,
    /// Bind host
    pub host: String,
    /// Bind port
    pub port: u16,
    /// Key required by admin endpoints; `None` disables them
    pub admin_key: Option<String>,
    /// Requests per minute per client
    pub rate_limit_per_minute: u32,
    /// In-flight request cap
    pub max_concurrency: usize,
    /// Remote registry base URL used by `sync`
    pub remote_url: String,
    /// Classifier pattern tables
    pub heuristics: HeuristicConfig,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            registry_path: PathBuf::from(DEFAULT_REGISTRY_PATH),
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            admin_key: None,
            rate_limit_per_minute: DEFAULT_RATE_LIMIT_PER_MINUTE,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            remote_url: DEFAULT_REMOTE_URL.to_string(),
            heuristics: HeuristicConfig::default(),
        }
    }
}

impl GuardConfig {
    /// Load configuration from the process environment
    pub fn from_env() -> AppResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let registry_path = non_empty(ENV_REGISTRY_PATH)
            .map(PathBuf::from)
            .unwrap_or(defaults.registry_path);
        let host = non_empty(ENV_HOST).unwrap_or(defaults.host);

        // Platform PORT wins over our own variable
        let port = match non_empty(ENV_PLATFORM_PORT) {
            Some(raw) => parse_value(ENV_PLATFORM_PORT, &raw)?,
            None => match non_empty(ENV_PORT) {
                Some(raw) => parse_value(ENV_PORT, &raw)?,
                None => defaults.port,
            },
        };

        let rate_limit_per_minute = match non_empty(ENV_RATE_LIMIT) {
            Some(raw) => parse_value(ENV_RATE_LIMIT, &raw)?,
            None => defaults.rate_limit_per_minute,
        };
        let max_concurrency: usize = match non_empty(ENV_MAX_CONCURRENCY) {
            Some(raw) => parse_value(ENV_MAX_CONCURRENCY, &raw)?,
            None => defaults.max_concurrency,
        };
        if max_concurrency == 0 {
            return Err(AppError::invalid_config(ENV_MAX_CONCURRENCY, "0"));
        }

        let admin_key = non_empty(ENV_ADMIN_KEY);
        if admin_key.is_some() {
            info!("🔑 {} configured (key hidden)", ENV_ADMIN_KEY);
        }

        Ok(Self {
            registry_path,
            host,
            port,
            admin_key,
            rate_limit_per_minute,
            max_concurrency,
            remote_url: non_empty(ENV_REMOTE_URL).unwrap_or(defaults.remote_url),
            heuristics: defaults.heuristics,
        })
    }

    /// `host:port` string for binding
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_value<T: FromStr>(key: &str, raw: &str) -> AppResult<T> {
    raw.trim()
        .parse()
        .map_err(|_| AppError::invalid_config(key, raw))
}
