//! Runner and harness configuration
//!
//! Configuration is loaded from environment variables. The binary loads a
//! `.env` file from the working directory first, if one exists.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;

/// Host used when `HOST` is not set
pub const DEFAULT_HOST: &str = "http://20.105.36.20";

/// Per-request timeout used when `REQUEST_TIMEOUT_SECS` is not set
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(90);

/// Configuration of a single scenario runner.
///
/// Validated once by `ScenarioRunner::new` and never mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Base URL substituted into step path templates
    pub host: String,
    /// Timeout applied to every request
    pub timeout: Duration,
    /// Log successes and request details for failures
    pub debug: bool,
}

/// Local orchestration settings used by the binary
#[derive(Debug, Clone, PartialEq)]
pub struct HarnessConfig {
    /// Number of concurrent simulated users
    pub users: usize,
    /// Scenario iterations per user
    pub iterations: usize,
    /// Lower bound of the pause between iterations
    pub think_time_min: Duration,
    /// Upper bound of the pause between iterations
    pub think_time_max: Duration,
    /// Delay between starting consecutive users
    pub spawn_interval: Duration,
    /// Product fetched by the built-in scenario
    pub product_id: u64,
    /// JSON scenario replacing the built-in one
    pub scenario_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            timeout: DEFAULT_TIMEOUT,
            debug: true,
        }
    }
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            users: 1,
            iterations: 1,
            think_time_min: Duration::from_secs(1),
            think_time_max: Duration::from_secs(3),
            spawn_interval: Duration::ZERO,
            product_id: 1,
            scenario_file: None,
        }
    }
}

impl Config {
    pub fn new(host: impl Into<String>, timeout: Duration, debug: bool) -> Self {
        Self {
            host: host.into(),
            timeout,
            debug,
        }
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(host) = lookup("HOST") {
            config.host = host;
        }
        if let Some(val) = lookup("DEBUG_MODE")
            && let Some(debug) = parse_bool(&val)
        {
            config.debug = debug;
        }
        if let Some(val) = lookup("REQUEST_TIMEOUT_SECS") {
            config.timeout = parse_timeout(&val)?;
        }

        Ok(config)
    }

    /// Check the invariants a runner relies on
    pub fn validate(&self) -> Result<(), ConfigError> {
        let host = self.host.trim();
        if host.is_empty() {
            return Err(ConfigError::EmptyHost);
        }

        let url = reqwest::Url::parse(host).map_err(|e| ConfigError::InvalidHost {
            host: self.host.clone(),
            reason: e.to_string(),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidHost {
                host: self.host.clone(),
                reason: format!("unsupported scheme {:?}", url.scheme()),
            });
        }

        if self.timeout.is_zero() {
            return Err(ConfigError::InvalidTimeout(format!("{:?}", self.timeout)));
        }

        Ok(())
    }
}

impl HarnessConfig {
    /// Load harness settings from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(val) = lookup("USERS")
            && let Ok(v) = val.parse()
        {
            config.users = v;
        }
        if let Some(val) = lookup("ITERATIONS")
            && let Ok(v) = val.parse()
        {
            config.iterations = v;
        }
        if let Some(val) = lookup("THINK_TIME_MIN_SECS")
            && let Some(d) = parse_secs(&val)
        {
            config.think_time_min = d;
        }
        if let Some(val) = lookup("THINK_TIME_MAX_SECS")
            && let Some(d) = parse_secs(&val)
        {
            config.think_time_max = d;
        }
        if let Some(val) = lookup("SPAWN_INTERVAL_MS")
            && let Ok(ms) = val.parse::<u64>()
        {
            config.spawn_interval = Duration::from_millis(ms);
        }
        if let Some(val) = lookup("PRODUCT_ID")
            && let Ok(id) = val.parse()
        {
            config.product_id = id;
        }
        if let Some(path) = lookup("SCENARIO_FILE")
            && !path.is_empty()
        {
            config.scenario_file = Some(PathBuf::from(path));
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.think_time_min > self.think_time_max {
            return Err(ConfigError::InvalidThinkTime {
                min: self.think_time_min,
                max: self.think_time_max,
            });
        }
        Ok(())
    }
}

fn parse_bool(val: &str) -> Option<bool> {
    match val.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

fn parse_secs(val: &str) -> Option<Duration> {
    val.trim()
        .parse::<f64>()
        .ok()
        .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
}

fn parse_timeout(val: &str) -> Result<Duration, ConfigError> {
    match parse_secs(val) {
        Some(d) if !d.is_zero() => Ok(d),
        _ => Err(ConfigError::InvalidTimeout(val.to_string())),
    }
}
