//! Server configuration from environment variables.

use std::fmt;
use std::path::PathBuf;

use analyst::{CachePolicy, DEFAULT_GEMINI_MODEL, DEFAULT_TTL_DAYS, DataError, Result};
use chrono::TimeDelta;

const DEFAULT_DATABASE_PATH: &str = "stocks.db";
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8000;

/// Runtime configuration of the server.
#[derive(Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Gemini API key. `None` disables fresh analyses.
    pub gemini_api_key: Option<String>,
    /// Gemini model name.
    pub gemini_model: String,
    /// SQLite database file.
    pub database_path: PathBuf,
    /// Optional JSON symbol list imported at startup.
    pub symbols_path: Option<PathBuf>,
    /// Bind host.
    pub host: String,
    /// Bind port.
    pub port: u16,
    /// Days an analysis stays fresh. [`AppConfig::from_lookup`] only accepts
    /// positive values that fit a [`TimeDelta`].
    pub cache_ttl_days: i64,
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field(
                "gemini_api_key",
                &self.gemini_api_key.as_ref().map(|_| "[REDACTED]"),
            )
            .field("gemini_model", &self.gemini_model)
            .field("database_path", &self.database_path)
            .field("symbols_path", &self.symbols_path)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("cache_ttl_days", &self.cache_ttl_days)
            .finish()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            gemini_api_key: None,
            gemini_model: DEFAULT_GEMINI_MODEL.to_string(),
            database_path: PathBuf::from(DEFAULT_DATABASE_PATH),
            symbols_path: None,
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            cache_ttl_days: DEFAULT_TTL_DAYS,
        }
    }
}

impl AppConfig {
    /// Reads the configuration from the process environment.
    ///
    /// # Errors
    /// Returns an error if `PORT` or `CACHE_TTL_DAYS` is not a valid number.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the configuration through `lookup`. Blank values count as unset.
    ///
    /// # Errors
    /// Returns an error if `PORT` or `CACHE_TTL_DAYS` is not a valid number.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let defaults = Self::default();

        let port = match get("PORT") {
            Some(port) => port
                .parse()
                .map_err(|e| DataError::InvalidParameter(format!("PORT={port}: {e}")))?,
            None => defaults.port,
        };
        let cache_ttl_days = match get("CACHE_TTL_DAYS") {
            Some(days) => days
                .parse::<i64>()
                .ok()
                .filter(|d| *d > 0 && TimeDelta::try_days(*d).is_some())
                .ok_or_else(|| {
                    DataError::InvalidParameter(format!(
                        "CACHE_TTL_DAYS={days}: expected a positive number of days within range"
                    ))
                })?,
            None => defaults.cache_ttl_days,
        };

        Ok(Self {
            gemini_api_key: get("GEMINI_API_KEY"),
            gemini_model: get("GEMINI_MODEL").unwrap_or(defaults.gemini_model),
            database_path: get("DATABASE_PATH").map_or(defaults.database_path, PathBuf::from),
            symbols_path: get("SYMBOLS_PATH").map(PathBuf::from),
            host: get("HOST").unwrap_or(defaults.host),
            port,
            cache_ttl_days,
        })
    }

    /// `host:port` to bind.
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Freshness policy for cached analyses.
    ///
    /// Falls back to the default policy if `cache_ttl_days` was set by hand to
    /// a value [`TimeDelta`] cannot hold.
    #[must_use]
    pub fn cache_policy(&self) -> CachePolicy {
        TimeDelta::try_days(self.cache_ttl_days).map_or_else(CachePolicy::default, CachePolicy::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<AppConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[]).unwrap();

        assert_eq!(config, AppConfig::default());
        assert_eq!(config.bind_address(), "0.0.0.0:8000");
        assert_eq!(config.gemini_model, DEFAULT_GEMINI_MODEL);
        assert_eq!(config.gemini_model, "gemini-2.5-flash");
        assert_eq!(config.cache_policy(), CachePolicy::default());
    }

    #[test]
    fn test_overrides() {
        let config = config(&[
            ("GEMINI_API_KEY", "secret"),
            ("GEMINI_MODEL", "gemini-pro"),
            ("DATABASE_PATH", "/tmp/analyst.db"),
            ("SYMBOLS_PATH", "stocks.json"),
            ("HOST", "127.0.0.1"),
            ("PORT", "9000"),
            ("CACHE_TTL_DAYS", "1"),
        ])
        .unwrap();

        assert_eq!(config.gemini_api_key.as_deref(), Some("secret"));
        assert_eq!(config.gemini_model, "gemini-pro");
        assert_eq!(config.database_path, PathBuf::from("/tmp/analyst.db"));
        assert_eq!(config.symbols_path, Some(PathBuf::from("stocks.json")));
        assert_eq!(config.bind_address(), "127.0.0.1:9000");
        assert_eq!(config.cache_policy().ttl(), TimeDelta::days(1));
    }

    #[test]
    fn test_blank_key_is_unset() {
        let config = config(&[("GEMINI_API_KEY", "  ")]).unwrap();
        assert!(config.gemini_api_key.is_none());
    }

    #[test]
    fn test_invalid_numbers() {
        assert!(matches!(
            config(&[("PORT", "http")]),
            Err(DataError::InvalidParameter(_))
        ));
        assert!(config(&[("CACHE_TTL_DAYS", "0")]).is_err());
        assert!(config(&[("CACHE_TTL_DAYS", "week")]).is_err());
    }

    #[test]
    fn test_out_of_range_ttl_is_rejected() {
        assert!(matches!(
            config(&[("CACHE_TTL_DAYS", "200000000000000")]),
            Err(DataError::InvalidParameter(_))
        ));
        assert!(matches!(
            config(&[("CACHE_TTL_DAYS", i64::MAX.to_string().as_str())]),
            Err(DataError::InvalidParameter(_))
        ));

        let config = config(&[("CACHE_TTL_DAYS", "36500")]).unwrap();
        assert_eq!(config.cache_policy().ttl(), TimeDelta::days(36500));
    }

    #[test]
    fn test_hand_built_huge_ttl_falls_back_to_default_policy() {
        let config = AppConfig {
            cache_ttl_days: i64::MAX,
            ..AppConfig::default()
        };
        assert_eq!(config.cache_policy(), CachePolicy::default());
    }

    #[test]
    fn test_debug_redacts_key() {
        let config = config(&[("GEMINI_API_KEY", "secret")]).unwrap();
        let debug_str = format!("{config:?}");
        assert!(debug_str.contains("[REDACTED]"));
        assert!(!debug_str.contains("secret"));
    }
}
