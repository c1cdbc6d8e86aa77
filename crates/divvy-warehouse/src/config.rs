use dotenv::var;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_BASE_URL: &str = "https://finance.yahoo.com";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing environment variable: {0}")]
    Missing(&'static str),

    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

/// Runtime settings, read from the environment (and `.env`, when present).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub postgres_url: Option<String>,
    pub user_agent: String,
    pub base_url: String,
    pub http_timeout: Option<Duration>,
    pub case_sensitive: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            postgres_url: None,
            user_agent: format!("divvy/{}", env!("CARGO_PKG_VERSION")),
            base_url: DEFAULT_BASE_URL.to_string(),
            http_timeout: None,
            case_sensitive: true,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| var(key).ok())
    }

    /// Build from an arbitrary key lookup; unset keys fall back to [`Config::default`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let config = Self {
            postgres_url: lookup("POSTGRES_URL"),
            user_agent: lookup("USER_AGENT").unwrap_or(defaults.user_agent),
            base_url: lookup("YAHOO_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.base_url),
            http_timeout: parse(&lookup, "HTTP_TIMEOUT_SECS")?.map(Duration::from_secs),
            case_sensitive: parse(&lookup, "AUTOCOMPLETE_CASE_SENSITIVE")?
                .unwrap_or(defaults.case_sensitive),
        };
        debug!("configuration loaded: {config:?}");
        Ok(config)
    }

    pub fn require_postgres_url(&self) -> Result<&str, ConfigError> {
        self.postgres_url
            .as_deref()
            .ok_or(ConfigError::Missing("POSTGRES_URL"))
    }
}

fn parse<F, T>(lookup: &F, key: &'static str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid { key, value }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_environment_gives_defaults() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, Config::default());
        assert!(config.require_postgres_url().is_err());
    }

    #[test]
    fn reads_every_key() {
        let config = Config::from_lookup(lookup(&[
            ("POSTGRES_URL", "postgres://localhost/divvy"),
            ("USER_AGENT", "tester"),
            ("YAHOO_BASE_URL", "http://127.0.0.1:8080/"),
            ("HTTP_TIMEOUT_SECS", "15"),
            ("AUTOCOMPLETE_CASE_SENSITIVE", "false"),
        ]))
        .unwrap();

        assert_eq!(config.require_postgres_url().unwrap(), "postgres://localhost/divvy");
        assert_eq!(config.user_agent, "tester");
        assert_eq!(config.base_url, "http://127.0.0.1:8080");
        assert_eq!(config.http_timeout, Some(Duration::from_secs(15)));
        assert!(!config.case_sensitive);
    }

    #[test]
    fn rejects_unparsable_values() {
        let err = Config::from_lookup(lookup(&[("HTTP_TIMEOUT_SECS", "soon")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "HTTP_TIMEOUT_SECS", .. }));
    }
}
