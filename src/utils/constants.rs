//! Constants Module - Single Source of Truth
//!
//! Thresholds, deductions, default allow-lists and environment keys used
//! across BlinkGuard. No other module hardcodes these values.

// ============================================
// APPLICATION CONSTANTS
// ============================================

/// Application name
pub const APP_NAME: &str = "BlinkGuard";

/// Application version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// User-Agent for outbound HTTP requests
pub const USER_AGENT: &str = concat!("BlinkGuard/", env!("CARGO_PKG_VERSION"));

/// Timeout for remote registry requests (seconds)
pub const REMOTE_TIMEOUT_SECS: u64 = 10;

// ============================================
// BALANCE TRANSFER THRESHOLDS (fraction of pre-balance)
// ============================================

/// 90% of balance or more = drainer
pub const DRAINER_THRESHOLD: f64 = 0.9;

/// Above 50% of balance
pub const HIGH_TRANSFER_THRESHOLD: f64 = 0.5;

/// Above 10% of balance
pub const CAUTION_THRESHOLD: f64 = 0.1;

// ============================================
// SCORE DEDUCTIONS
// ============================================

pub const STARTING_SCORE: i32 = 100;

pub const DRAINER_DEDUCTION: i32 = 50;
pub const HIGH_TRANSFER_DEDUCTION: i32 = 30;
pub const CAUTION_TRANSFER_DEDUCTION: i32 = 15;
pub const CRITICAL_APPROVAL_DEDUCTION: i32 = 40;
pub const APPROVAL_DEDUCTION: i32 = 20;
pub const UNKNOWN_CONTRACT_DEDUCTION: i32 = 10;
pub const DOMAIN_RISK_DEDUCTION: i32 = 5;

/// Score at or above which a transaction is `safe`
pub const SAFE_MIN_SCORE: u8 = 80;

/// Score at or above which a transaction is `caution` (below = `high_risk`)
pub const CAUTION_MIN_SCORE: u8 = 50;

/// Score reported when there is no data to analyze
pub const UNKNOWN_SCORE: u8 = 50;

// ============================================
// DEFAULT PATTERN TABLES
// ============================================

/// Log keywords that denote an approval / authority change
pub const APPROVAL_KEYWORDS: [&str; 3] = ["approve", "setAuthority", "authorize"];

/// (anchor, marker) pairs: `anchor` followed later on the same line by `marker`
/// means an approval of an unlimited / maximum amount
pub const UNLIMITED_APPROVAL_PATTERNS: [(&str, &str); 3] = [
    ("approve", "unlimited"),
    ("approve", "max"),
    ("approve", "0xffff"),
];

/// Jupiter Aggregator Program ID
pub const JUPITER_PROGRAM: &str = "JUP6LkbZbjS1jKKwapdHNy74zcZ3tLUZoi5QNyVTaV4";

/// Helium Program ID
pub const HELIUM_PROGRAM: &str = "hadeK9DLv9eA7ya5KCTqSvSvRZeJC3JgD5a9Y3CNbvu";

pub const TRUSTED_PROGRAMS: [&str; 2] = [JUPITER_PROGRAM, HELIUM_PROGRAM];

/// Substrings of first-party domains
pub const TRUSTED_DOMAINS: [&str; 4] = ["jup.ag", "helium.com", "dialect.to", "solana.com"];

/// Word that introduces a program id in Solana logs
pub const PROGRAM_LOG_PREFIX: &str = "Program";

/// Length bounds of a base58 program id
pub const PROGRAM_ID_MIN_LEN: usize = 32;
pub const PROGRAM_ID_MAX_LEN: usize = 44;

/// Domain used when the caller does not supply one
pub const UNKNOWN_DOMAIN: &str = "unknown";

// ============================================
// CONFIGURATION DEFAULTS & ENV KEYS
// ============================================

pub const DEFAULT_REGISTRY_PATH: &str = "data/registry.json";
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_RATE_LIMIT_PER_MINUTE: u32 = 100;
pub const DEFAULT_MAX_CONCURRENCY: usize = 256;
pub const DEFAULT_REMOTE_URL: &str = "https://api.blinkguard.io";

pub const ENV_REGISTRY_PATH: &str = "BLINKGUARD_REGISTRY_PATH";
pub const ENV_HOST: &str = "BLINKGUARD_HOST";
pub const ENV_PORT: &str = "BLINKGUARD_PORT";
/// Platform-provided port (Railway, Koyeb, ...), wins over `BLINKGUARD_PORT`
pub const ENV_PLATFORM_PORT: &str = "PORT";
pub const ENV_ADMIN_KEY: &str = "BLINKGUARD_ADMIN_KEY";
pub const ENV_RATE_LIMIT: &str = "BLINKGUARD_RATE_LIMIT";
pub const ENV_MAX_CONCURRENCY: &str = "BLINKGUARD_MAX_CONCURRENCY";
pub const ENV_REMOTE_URL: &str = "BLINKGUARD_REMOTE_URL";

/// Header carrying the admin key for registry verification
pub const ADMIN_KEY_HEADER: &str = "x-admin-key";

/// Header carrying the per-request id
pub const REQUEST_ID_HEADER: &str = "x-request-id";
