//! Registry Matcher
//!
//! Answers "is this URL or its domain flagged?" against the store. Only
//! verified entries ever match; unverified reports are advisory.

use std::sync::Arc;

use tracing::debug;

use crate::models::errors::AppResult;
use crate::models::types::{MaliciousUrlEntry, RegistryCheck};
use crate::registry::store::RegistryStore;
use crate::utils::hostname::matchable_hostname;

#[derive(Debug, Clone)]
pub struct RegistryMatcher {
    store: Arc<RegistryStore>,
}

impl RegistryMatcher {
    pub fn new(store: Arc<RegistryStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<RegistryStore> {
        &self.store
    }

    /// Check `url` against the current registry.
    ///
    /// Storage failures propagate; a malformed `url` only skips the domain
    /// stage.
    pub fn check(&self, url: &str) -> AppResult<RegistryCheck> {
        let entries = self.store.read()?;
        let result = match_url(&entries, url);
        if result.is_malicious {
            debug!(url = %url, "registry hit");
        }
        Ok(result)
    }
}

/// Exact verified match first, then the first verified entry on the same host
pub fn match_url(entries: &[MaliciousUrlEntry], url: &str) -> RegistryCheck {
    if let Some(entry) = entries.iter().find(|e| e.verified && e.url == url) {
        return RegistryCheck::matched(entry);
    }

    let Some(host) = matchable_hostname(url) else {
        return RegistryCheck::clean();
    };

    entries
        .iter()
        .filter(|e| e.verified)
        .find(|e| matchable_hostname(&e.url).as_deref() == Some(host.as_str()))
        .map(RegistryCheck::matched)
        .unwrap_or_else(RegistryCheck::clean)
}
