//! Feed configuration.

use crate::api::DEFAULT_BASE_URL;

/// Environment variable overriding the API base URL.
pub const BASE_URL_ENV: &str = "POSTFEED_BASE_URL";
/// Environment variable overriding the page size.
pub const PAGE_SIZE_ENV: &str = "POSTFEED_PAGE_SIZE";

const DEFAULT_PAGE_SIZE: u64 = 20;

/// Configuration for a posts feed session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Base URL of the posts API
    pub base_url: String,
    /// Number of posts per page
    pub page_size: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl Config {
    /// Build a configuration from the environment, falling back to
    /// defaults for unset or unparseable values.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(base_url) = std::env::var(BASE_URL_ENV) {
            if !base_url.is_empty() {
                config.base_url = base_url;
            }
        }
        if let Ok(page_size) = std::env::var(PAGE_SIZE_ENV) {
            if let Ok(page_size) = page_size.parse::<u64>() {
                if page_size > 0 {
                    config.page_size = page_size;
                }
            }
        }
        config
    }

    /// Override the base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Override the page size.
    pub fn with_page_size(mut self, page_size: u64) -> Self {
        self.page_size = page_size;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.page_size, DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn test_builder_overrides() {
        let config = Config::default()
            .with_base_url("http://localhost:3000")
            .with_page_size(5);
        assert_eq!(config.base_url, "http://localhost:3000");
        assert_eq!(config.page_size, 5);
    }
}
