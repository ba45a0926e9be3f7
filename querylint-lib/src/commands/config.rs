use crate::Result;
use crate::backend::{ClientOptions, RetryPolicy};
use camino::{Utf8Path, Utf8PathBuf};
use core::time::Duration;
use ohno::{IntoAppError, app_err};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use url::Url;

/// The default configuration TOML content, embedded from `default_config.toml`
pub const DEFAULT_CONFIG_TOML: &str = include_str!("../../default_config.toml");

/// File name looked up in the working directory when no `--config` is given.
pub const CONFIG_FILE_NAME: &str = "querylint.toml";

#[derive(Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Root URL of the metrics API
    #[serde(default = "default_site")]
    pub site: String,

    /// How far back each validation query looks
    #[serde(default = "default_query_window", with = "humantime_serde")]
    pub query_window: Duration,

    /// Timeout for a single HTTP request
    #[serde(default = "default_request_timeout", with = "humantime_serde")]
    pub request_timeout: Duration,

    /// Retries on top of the first attempt for transient failures
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Delay before the first retry, doubled for each subsequent one
    #[serde(default = "default_retry_base_delay", with = "humantime_serde")]
    pub retry_base_delay: Duration,

    /// Maximum number of metric queries in flight
    #[serde(default = "default_max_concurrent_queries")]
    pub max_concurrent_queries: usize,
}

fn default_site() -> String {
    "https://api.datadoghq.com".to_string()
}

const fn default_query_window() -> Duration {
    Duration::from_secs(60)
}

const fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

const fn default_max_retries() -> u32 {
    3
}

const fn default_retry_base_delay() -> Duration {
    Duration::from_secs(1)
}

const fn default_max_concurrent_queries() -> usize {
    8
}

impl Config {
    /// Load configuration from a file or use defaults
    ///
    /// An explicit `config_path` must exist. Otherwise `querylint.toml` in `base_dir` is
    /// used if present.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated
    pub fn load(base_dir: &Utf8Path, config_path: Option<&Utf8PathBuf>) -> Result<Self> {
        let (final_path, text) = if let Some(path) = config_path {
            let text = fs::read_to_string(path).into_app_err_with(|| format!("reading querylint configuration file '{path}'"))?;
            (path.clone(), text)
        } else {
            let path = base_dir.join(CONFIG_FILE_NAME);
            match fs::read_to_string(&path) {
                Ok(text) => (path, text),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    log::debug!("no {CONFIG_FILE_NAME} found in '{base_dir}', using default configuration");
                    return Ok(Self::default());
                }
                Err(e) => return Err(e).into_app_err_with(|| format!("reading querylint configuration file '{path}'")),
            }
        };

        let config: Self = toml::from_str(&text).into_app_err_with(|| format!("parsing configuration file '{final_path}'"))?;
        config.validate().into_app_err_with(|| format!("validating configuration file '{final_path}'"))?;

        Ok(config)
    }

    /// Save the default configuration to a TOML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written
    pub fn save_default(output_path: &Utf8Path) -> Result<()> {
        fs::write(output_path, DEFAULT_CONFIG_TOML).into_app_err_with(|| format!("writing default configuration to {output_path}"))?;
        Ok(())
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns an error if the site is not a URL or a value is out of range
    fn validate(&self) -> Result<()> {
        let site = Url::parse(&self.site).into_app_err_with(|| format!("site '{}' is not a valid URL", self.site))?;
        if !matches!(site.scheme(), "http" | "https") {
            return Err(app_err!("site '{}' must use http or https", self.site));
        }

        if self.query_window.is_zero() {
            return Err(app_err!("query_window must be greater than zero"));
        }

        if self.request_timeout.is_zero() {
            return Err(app_err!("request_timeout must be greater than zero"));
        }

        if self.max_concurrent_queries == 0 {
            return Err(app_err!("max_concurrent_queries must be at least 1"));
        }

        Ok(())
    }

    /// Connection settings derived from this configuration.
    #[must_use]
    pub fn client_options(&self) -> ClientOptions {
        ClientOptions {
            site: self.site.clone(),
            query_window: self.query_window,
            request_timeout: self.request_timeout,
            retry: RetryPolicy {
                max_retries: self.max_retries,
                base_delay: self.retry_base_delay,
            },
            max_concurrent_queries: self.max_concurrent_queries,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        toml::from_str(DEFAULT_CONFIG_TOML).expect("default_config.toml should be valid TOML that deserializes to Config")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        config.validate().unwrap();
    }

    #[test]
    fn test_default_config_matches_field_defaults() {
        let from_file = Config::default();
        let from_empty: Config = toml::from_str("").unwrap();

        assert_eq!(from_file.site, from_empty.site);
        assert_eq!(from_file.query_window, from_empty.query_window);
        assert_eq!(from_file.request_timeout, from_empty.request_timeout);
        assert_eq!(from_file.max_retries, from_empty.max_retries);
        assert_eq!(from_file.retry_base_delay, from_empty.retry_base_delay);
        assert_eq!(from_file.max_concurrent_queries, from_empty.max_concurrent_queries);
    }

    #[test]
    fn test_humantime_durations() {
        let config: Config = toml::from_str("query_window = \"5m\"\nretry_base_delay = \"250ms\"").unwrap();
        assert_eq!(config.query_window, Duration::from_secs(300));
        assert_eq!(config.retry_base_delay, Duration::from_millis(250));
    }

    #[test]
    fn test_unknown_fields_are_rejected() {
        assert!(toml::from_str::<Config>("sites = \"https://api.datadoghq.eu\"").is_err());
    }

    #[test]
    fn test_validate_bad_site() {
        let config = Config { site: "api.datadoghq.com".to_string(), ..Config::default() };
        assert!(config.validate().is_err());

        let config = Config { site: "ftp://api.datadoghq.com".to_string(), ..Config::default() };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_zero_window() {
        let config = Config { query_window: Duration::ZERO, ..Config::default() };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_zero_timeout() {
        let config = Config { request_timeout: Duration::ZERO, ..Config::default() };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_zero_concurrency() {
        let config = Config { max_concurrent_queries: 0, ..Config::default() };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_client_options() {
        let config = Config { max_retries: 7, ..Config::default() };
        let options = config.client_options();
        assert_eq!(options.site, "https://api.datadoghq.com");
        assert_eq!(options.retry.max_retries, 7);
        assert_eq!(options.retry.base_delay, Duration::from_secs(1));
        assert_eq!(options.max_concurrent_queries, 8);
    }

    #[test]
    #[cfg_attr(miri, ignore = "Miri cannot call GetTempPathW")]
    fn test_save_default_and_load() {
        let tmp = tempfile::tempdir().unwrap();
        let output_path = Utf8PathBuf::try_from(tmp.path().join("querylint.toml")).unwrap();
        Config::save_default(&output_path).unwrap();
        let loaded = Config::load(&Utf8PathBuf::try_from(tmp.path().to_path_buf()).unwrap(), Some(&output_path)).unwrap();
        loaded.validate().unwrap();
    }

    #[test]
    #[cfg_attr(miri, ignore = "Miri cannot call GetTempPathW")]
    fn test_load_finds_file_in_base_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let base_dir = Utf8PathBuf::try_from(tmp.path().to_path_buf()).unwrap();
        fs::write(base_dir.join(CONFIG_FILE_NAME), "site = \"https://api.datadoghq.eu\"\n").unwrap();

        let config = Config::load(&base_dir, None).unwrap();
        assert_eq!(config.site, "https://api.datadoghq.eu");
    }

    #[test]
    #[cfg_attr(miri, ignore = "Miri cannot call GetTempPathW")]
    fn test_load_missing_config_uses_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let base_dir = Utf8PathBuf::try_from(tmp.path().to_path_buf()).unwrap();
        let config = Config::load(&base_dir, None).unwrap();
        config.validate().unwrap();
    }

    #[test]
    #[cfg_attr(miri, ignore = "Miri cannot call GetTempPathW")]
    fn test_load_missing_explicit_config_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let path = Utf8PathBuf::try_from(tmp.path().join("nope.toml")).unwrap();
        assert!(Config::load(Utf8Path::new("."), Some(&path)).is_err());
    }

    #[test]
    fn test_default_config_toml_is_not_empty() {
        assert!(!DEFAULT_CONFIG_TOML.is_empty());
    }
}
