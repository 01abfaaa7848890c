//! Configuration loading for the `far117` CLI.
//!
//! Sources, later overriding earlier:
//! 1. Built-in defaults
//! 2. TOML file at `<config_dir>/far117/config.toml` (or `--config FILE`)
//! 3. Environment variables prefixed with `FAR117_`, nested keys joined by
//!    `__` (e.g. `FAR117_HOME_BASE__TIMEZONE=America/Denver`)

use std::path::PathBuf;

use far117_engine::HomeBase;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const CONFIG_DIR_NAME: &str = "far117";
const CONFIG_FILE_NAME: &str = "config.toml";
const ENV_PREFIX: &str = "FAR117_";

/// Largest UTC offset in use anywhere (Line Islands, +14:00).
const MAX_UTC_OFFSET_HOURS: f64 = 14.0;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(Box<figment::Error>),

    #[error("invalid configuration: {message}")]
    Validation { message: String },
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Load(Box::new(err))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub home_base: HomeBaseConfig,
    pub schedule: ScheduleConfig,
}

/// Where the pilot is acclimated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HomeBaseConfig {
    /// Fixed UTC offset used when no timezone is set.
    pub utc_offset_hours: f64,
    /// IANA timezone; takes precedence over the fixed offset.
    pub timezone: Option<String>,
}

impl Default for HomeBaseConfig {
    fn default() -> Self {
        Self {
            utc_offset_hours: -7.0,
            timezone: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// Schedule JSON used when `--schedule` is not given.
    pub path: Option<PathBuf>,
}

impl Config {
    /// Load configuration, optionally from a custom file.
    ///
    /// A missing file is not an error; defaults and environment still apply.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);
        tracing::debug!(path = %config_file.display(), "loading configuration");

        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()?;
        config.validate()?;
        Ok(config)
    }

    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(CONFIG_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let offset = self.home_base.utc_offset_hours;
        if !offset.is_finite() || offset.abs() > MAX_UTC_OFFSET_HOURS {
            return Err(ConfigError::Validation {
                message: format!(
                    "home_base.utc_offset_hours ({offset}) must be within \
                     -{MAX_UTC_OFFSET_HOURS}..={MAX_UTC_OFFSET_HOURS}"
                ),
            });
        }
        self.home_base()?;
        Ok(())
    }

    /// Resolve the configured home base, preferring the IANA timezone.
    pub fn home_base(&self) -> Result<HomeBase, ConfigError> {
        match &self.home_base.timezone {
            Some(name) => HomeBase::parse_zone(name).map_err(|e| ConfigError::Validation {
                message: format!("home_base.timezone: {e}"),
            }),
            None => Ok(HomeBase::FixedOffset(self.home_base.utc_offset_hours)),
        }
    }
}
