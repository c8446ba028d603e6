//! Hostname extraction with WHATWG URL semantics.
//!
//! `reqwest::Url` is the `url` crate re-exported, so hosts come back
//! lowercased and IDNA-normalized exactly like a browser's `URL.hostname`.

use reqwest::Url;

/// Hostname of `url`, or `None` when it does not parse.
///
/// A parseable URL without a host (e.g. `solana-action:...`) yields an
/// empty string, mirroring `URL.hostname` in the browser.
pub fn parse_hostname(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    Some(parsed.host_str().unwrap_or_default().to_string())
}

/// Hostname usable for domain matching: parseable and non-empty.
pub fn matchable_hostname(url: &str) -> Option<String> {
    // Hostless URLs all have host "": they must not domain-match each other.
    // A verified `solana-action:` entry only matches by exact url.
    parse_hostname(url).filter(|host| !host.is_empty())
}
