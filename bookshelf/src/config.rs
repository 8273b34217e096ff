use std::fmt;
use std::path::Path;
use std::time::Duration;

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use tracing::trace;

use googlebooks::client::{API_KEY_ENV, DEFAULT_TIMEOUT};
use googlebooks::query::BASE_URL;
use googlebooks::{CacheConfig, ClientConfig};

use crate::Error;

/// The prefix of environment variables that override configuration values.
pub const ENV_PREFIX: &str = "BOOKSHELF_";

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct Config {
    /// Book service configuration
    #[serde(default)]
    pub api: ApiConfig,
    /// Result cache configuration
    #[serde(default)]
    pub cache: CacheSettings,
    /// Tracing configuration
    #[serde(default)]
    pub tracing: TracingConfig,
}

#[derive(Clone, Deserialize, Serialize)]
pub struct ApiConfig {
    /// URL of the volumes endpoint
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// API key, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Duration before a request is cancelled
    #[serde(default = "default_timeout", with = "humantime_serde")]
    pub timeout: Duration,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct CacheSettings {
    /// Maximum number of cached results
    #[serde(default = "default_cache_max_size")]
    pub max_size: usize,
    /// Duration a cached result stays fresh
    #[serde(default = "default_cache_ttl", with = "humantime_serde")]
    pub ttl: Duration,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct TracingConfig {
    /// Enable exporting spans over OTLP
    #[serde(default)]
    pub enabled: bool,
}

impl Config {
    /// Loads the configuration from defaults, the TOML file at `path` (if it exists) and
    /// `BOOKSHELF_`-prefixed environment variables, in increasing order of precedence.
    ///
    /// Nested keys are separated by `__` in environment variables, e.g. `BOOKSHELF_CACHE__TTL=10m`.
    /// If no API key is configured, `GOOGLE_BOOKS_API_KEY` is used.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LoadConfig`] if a source can't be parsed, and [`Error::InvalidConfig`] if
    /// the merged configuration is invalid.
    pub fn load(path: impl AsRef<Path>) -> Result<Config, Error> {
        let path = path.as_ref();

        trace!(?path, "loading config");

        let mut config: Config = Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .map_err(|e| Error::LoadConfig {
                path: path.display().to_string(),
                source: Box::new(e),
            })?;

        if config.api.api_key.is_none() {
            config.api.api_key = std::env::var(API_KEY_ENV).ok();
        }

        config.validate()?;

        trace!(?path, "loaded config");

        Ok(config)
    }

    fn validate(&self) -> Result<(), Error> {
        if self.cache.max_size == 0 {
            return Err(Error::InvalidConfig("cache.max_size must be at least 1".into()));
        }

        if self.api.timeout.is_zero() {
            return Err(Error::InvalidConfig("api.timeout must not be zero".into()));
        }

        Ok(())
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            base_url: default_base_url(),
            api_key: None,
            timeout: default_timeout(),
        }
    }
}

impl fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Default for CacheSettings {
    fn default() -> Self {
        CacheSettings {
            max_size: default_cache_max_size(),
            ttl: default_cache_ttl(),
        }
    }
}

impl From<&Config> for ClientConfig {
    fn from(config: &Config) -> Self {
        ClientConfig {
            base_url: config.api.base_url.clone(),
            api_key: None,
            timeout: config.api.timeout,
            cache: CacheConfig {
                max_size: config.cache.max_size,
                ttl: config.cache.ttl,
            },
        }
        .with_api_key(config.api.api_key.clone())
    }
}

#[must_use]
pub fn default_base_url() -> String {
    BASE_URL.to_string()
}

#[must_use]
pub const fn default_timeout() -> Duration {
    DEFAULT_TIMEOUT
}

#[must_use]
pub const fn default_cache_max_size() -> usize {
    googlebooks::cache::DEFAULT_MAX_SIZE
}

#[must_use]
pub const fn default_cache_ttl() -> Duration {
    googlebooks::cache::DEFAULT_TTL
}

#[cfg(test)]
mod tests {
    use figment::Jail;

    use super::*;

    #[test]
    fn it_should_use_defaults_without_sources() {
        Jail::expect_with(|jail| {
            jail.clear_env();

            let config = Config::load("missing.toml").map_err(|e| e.to_string())?;

            assert_eq!(config.api.base_url, BASE_URL);
            assert_eq!(config.api.api_key, None);
            assert_eq!(config.api.timeout, Duration::from_secs(10));
            assert_eq!(config.cache.max_size, 100);
            assert_eq!(config.cache.ttl, Duration::from_secs(300));
            assert!(!config.tracing.enabled);

            Ok(())
        });
    }

    #[test]
    fn it_should_merge_file_and_environment() {
        Jail::expect_with(|jail| {
            jail.clear_env();
            jail.create_file(
                "bookshelf.toml",
                r#"
                [api]
                timeout = "5s"
                api_key = "from-file"

                [cache]
                max_size = 10
                ttl = "1m"
                "#,
            )?;
            jail.set_env("BOOKSHELF_CACHE__MAX_SIZE", "25");

            let config = Config::load("bookshelf.toml").map_err(|e| e.to_string())?;

            assert_eq!(config.api.timeout, Duration::from_secs(5));
            assert_eq!(config.api.api_key.as_deref(), Some("from-file"));
            assert_eq!(config.cache.max_size, 25);
            assert_eq!(config.cache.ttl, Duration::from_secs(60));

            Ok(())
        });
    }

    #[test]
    fn it_should_fall_back_to_api_key_variable() {
        Jail::expect_with(|jail| {
            jail.clear_env();
            jail.set_env("GOOGLE_BOOKS_API_KEY", "from-env");

            let config = Config::load("missing.toml").map_err(|e| e.to_string())?;

            assert_eq!(config.api.api_key.as_deref(), Some("from-env"));

            Ok(())
        });
    }

    #[test]
    fn it_should_reject_invalid_values() {
        Jail::expect_with(|jail| {
            jail.clear_env();
            jail.set_env("BOOKSHELF_CACHE__MAX_SIZE", "0");

            assert!(matches!(
                Config::load("missing.toml"),
                Err(Error::InvalidConfig(_))
            ));

            jail.set_env("BOOKSHELF_CACHE__MAX_SIZE", "lots");

            assert!(matches!(
                Config::load("missing.toml"),
                Err(Error::LoadConfig { .. })
            ));

            Ok(())
        });
    }

    #[test]
    fn it_should_convert_into_client_config() {
        let mut config = Config::default();
        config.api.api_key = Some("  ".into());

        let client_config = ClientConfig::from(&config);

        assert_eq!(client_config.api_key, None);
        assert_eq!(client_config.cache, CacheConfig::default());
        assert_eq!(client_config.timeout, Duration::from_secs(10));
    }

    #[test]
    fn it_should_not_leak_api_key_in_debug_output() {
        let mut config = Config::default();
        config.api.api_key = Some("secret".into());

        assert!(!format!("{config:?}").contains("secret"));
    }
}
