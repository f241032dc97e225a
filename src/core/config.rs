/// Smoketest configuration
///
/// Layered: built-in defaults, then the TOML config file, then the service's
/// own env vars (`FLASK_BASE_URL`, `LOG_DIR`), then CLI flags.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::endpoint::{EndpointSpec, ShapeTag};
use super::error::ConfigError;
use super::validator::ValidationRules;
use crate::utils::{
    default_endpoints, CONFIG_DIR_NAME, CONFIG_FILE_NAME, DEFAULT_BASE_URL, DEFAULT_CONCURRENCY,
    DEFAULT_HIGH_TIMEFRAME, DEFAULT_LOGS_DIR, DEFAULT_MARKET_MAX_AGE_SECS, DEFAULT_TIMEOUT_SECS,
    ENV_BASE_URL, ENV_LOGS_DIR, LOG_FILES, TRACKED_SYMBOLS,
};

/// Config file as written on disk; every field optional
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub base_url: Option<String>,
    pub logs_dir: Option<String>,
    /// Per-probe timeout, humantime syntax ("10s", "1500ms")
    pub timeout: Option<String>,
    pub concurrency: Option<usize>,
    pub log_window: Option<String>,
    /// "0s" disables the staleness check
    pub market_max_age: Option<String>,
    pub high_timeframe: Option<String>,
    pub tracked_symbols: Option<Vec<String>>,
    pub log_files: Option<Vec<String>>,
    pub endpoints: Option<Vec<EndpointSpec>>,
}

/// Values picked up from the environment
#[derive(Debug, Clone, Default)]
pub struct EnvOverrides {
    pub base_url: Option<String>,
    pub logs_dir: Option<String>,
}

impl EnvOverrides {
    pub fn from_env() -> Self {
        let non_empty = |key: &str| std::env::var(key).ok().filter(|v| !v.trim().is_empty());
        Self {
            base_url: non_empty(ENV_BASE_URL),
            logs_dir: non_empty(ENV_LOGS_DIR),
        }
    }
}

/// Values given on the command line; these win over everything else
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub base_url: Option<String>,
    pub logs_dir: Option<PathBuf>,
    pub timeout: Option<Duration>,
    pub concurrency: Option<usize>,
    pub log_window: Option<Duration>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SmokeConfig {
    pub base_url: String,
    pub logs_dir: PathBuf,
    pub timeout: Duration,
    pub concurrency: usize,
    /// Minimum time between the two log samples
    pub log_window: Duration,
    pub market_max_age: Option<Duration>,
    pub high_timeframe: String,
    pub tracked_symbols: Vec<String>,
    pub log_files: Vec<String>,
    pub endpoints: Vec<EndpointSpec>,
}

impl Default for SmokeConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            logs_dir: PathBuf::from(DEFAULT_LOGS_DIR),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            concurrency: DEFAULT_CONCURRENCY,
            log_window: Duration::ZERO,
            market_max_age: Some(Duration::from_secs(DEFAULT_MARKET_MAX_AGE_SECS)),
            high_timeframe: DEFAULT_HIGH_TIMEFRAME.to_string(),
            tracked_symbols: TRACKED_SYMBOLS.iter().map(|s| s.to_string()).collect(),
            log_files: LOG_FILES.iter().map(|s| s.to_string()).collect(),
            endpoints: default_endpoints(),
        }
    }
}

impl SmokeConfig {
    /// `~/.config/signal-smoke/config.toml` (platform config dir)
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Load and validate. An explicit `path` must exist; a missing default
    /// config file just means built-in defaults.
    pub fn load(
        path: Option<&Path>,
        env: EnvOverrides,
        overrides: Overrides,
    ) -> Result<Self, ConfigError> {
        let file = match path {
            Some(path) => {
                if !path.exists() {
                    return Err(ConfigError::NotFound(path.to_path_buf()));
                }
                Self::read_file(path)?
            }
            None => match Self::default_path().filter(|p| p.exists()) {
                Some(path) => Self::read_file(&path)?,
                None => {
                    tracing::debug!("No config file found, using built-in defaults");
                    FileConfig::default()
                }
            },
        };

        let config = Self::resolve(file, env, overrides)?;
        config.validate()?;
        Ok(config)
    }

    pub fn read_file(path: &Path) -> Result<FileConfig, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        tracing::info!(path = %path.display(), "Loaded config file");

        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Merge the layers over the defaults. Does not validate.
    pub fn resolve(
        file: FileConfig,
        env: EnvOverrides,
        overrides: Overrides,
    ) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(v) = file.base_url {
            config.base_url = v;
        }
        if let Some(v) = file.logs_dir {
            config.logs_dir = PathBuf::from(v);
        }
        if let Some(v) = file.timeout {
            config.timeout = parse_duration("timeout", &v)?;
        }
        if let Some(v) = file.concurrency {
            config.concurrency = v;
        }
        if let Some(v) = file.log_window {
            config.log_window = parse_duration("log_window", &v)?;
        }
        if let Some(v) = file.market_max_age {
            let age = parse_duration("market_max_age", &v)?;
            config.market_max_age = (!age.is_zero()).then_some(age);
        }
        if let Some(v) = file.high_timeframe {
            config.high_timeframe = v;
        }
        if let Some(v) = file.tracked_symbols {
            config.tracked_symbols = v;
        }
        if let Some(v) = file.log_files {
            config.log_files = v;
        }
        if let Some(v) = file.endpoints {
            config.endpoints = v;
        }

        if let Some(v) = env.base_url {
            config.base_url = v;
        }
        if let Some(v) = env.logs_dir {
            config.logs_dir = PathBuf::from(v);
        }

        if let Some(v) = overrides.base_url {
            config.base_url = v;
        }
        if let Some(v) = overrides.logs_dir {
            config.logs_dir = v;
        }
        if let Some(v) = overrides.timeout {
            config.timeout = v;
        }
        if let Some(v) = overrides.concurrency {
            config.concurrency = v;
        }
        if let Some(v) = overrides.log_window {
            config.log_window = v;
        }

        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.base_url.trim().is_empty() {
            return Err(ConfigError::EmptyBaseUrl);
        }

        if self.endpoints.is_empty() {
            return Err(ConfigError::NoEndpoints);
        }

        if self.timeout.is_zero() {
            return Err(ConfigError::Zero("timeout"));
        }

        if self.concurrency == 0 {
            return Err(ConfigError::Zero("concurrency"));
        }

        let mut seen = HashSet::new();
        for endpoint in &self.endpoints {
            if !seen.insert(endpoint.name.as_str()) {
                return Err(ConfigError::DuplicateEndpoint(endpoint.name.clone()));
            }
        }

        if let Some(market) = self
            .endpoints
            .iter()
            .find(|e| e.shape == ShapeTag::MarketSnapshot)
        {
            if self.tracked_symbols.is_empty() {
                return Err(ConfigError::NoTrackedSymbols(market.name.clone()));
            }
        }

        Ok(())
    }

    pub fn rules(&self) -> ValidationRules {
        ValidationRules {
            tracked_symbols: self.tracked_symbols.clone(),
            high_timeframe: self.high_timeframe.clone(),
            market_max_age: self.market_max_age,
        }
    }

    pub fn log_paths(&self) -> Vec<PathBuf> {
        self.log_files.iter().map(|f| self.logs_dir.join(f)).collect()
    }
}

fn parse_duration(field: &'static str, value: &str) -> Result<Duration, ConfigError> {
    humantime::parse_duration(value.trim()).map_err(|_| ConfigError::InvalidDuration {
        field,
        value: value.to_string(),
    })
}
