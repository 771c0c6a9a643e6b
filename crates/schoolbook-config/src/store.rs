//! Store defaults.

use std::env;
use std::time::Duration;

/// Resource store configuration loaded from environment variables.
///
/// # Environment Variables
///
/// - `STORE_PAGE_LIMIT`: Page size used by debounced searches (default: `10`, clamped to 1-100)
/// - `SEARCH_DEBOUNCE_MS`: Delay before a search-as-you-type request is issued (default: `300`)
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoreConfig {
    pub page_limit: i64,
    pub search_debounce: Duration,
}

impl StoreConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            page_limit: lookup("STORE_PAGE_LIMIT")
                .and_then(|v| v.parse::<i64>().ok())
                .map(|v| v.clamp(1, 100))
                .unwrap_or(defaults.page_limit),
            search_debounce: lookup("SEARCH_DEBOUNCE_MS")
                .and_then(|v| v.parse::<u64>().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.search_debounce),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            page_limit: 10,
            search_debounce: Duration::from_millis(300),
        }
    }
}
