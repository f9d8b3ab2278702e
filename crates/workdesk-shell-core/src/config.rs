use std::env;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_SIDEBAR_MIN_WIDTH: u32 = 220;
pub const DEFAULT_SIDEBAR_MAX_WIDTH: u32 = 480;
pub const DEFAULT_SIDEBAR_WIDTH: u32 = 256;
pub const DEFAULT_RAIL_WIDTH: u32 = 64;
pub const DEFAULT_MOBILE_BREAKPOINT: u32 = 768;
pub const DEFAULT_STORAGE_PREFIX: &str = "sidebar";

const ENV_SIDEBAR_MIN_WIDTH: &str = "WORKDESK_SIDEBAR_MIN_WIDTH";
const ENV_SIDEBAR_MAX_WIDTH: &str = "WORKDESK_SIDEBAR_MAX_WIDTH";
const ENV_SIDEBAR_DEFAULT_WIDTH: &str = "WORKDESK_SIDEBAR_DEFAULT_WIDTH";
const ENV_RAIL_WIDTH: &str = "WORKDESK_RAIL_WIDTH";
const ENV_MOBILE_BREAKPOINT: &str = "WORKDESK_MOBILE_BREAKPOINT";
const ENV_STORAGE_PREFIX: &str = "WORKDESK_STORAGE_PREFIX";

/// Layout tunables shared by every surface that hosts the shell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellConfig {
    pub sidebar_min_width: u32,
    pub sidebar_max_width: u32,
    pub sidebar_default_width: u32,
    pub rail_width: u32,
    /// Viewports narrower than this render the sidebar as an overlay drawer.
    pub mobile_breakpoint: u32,
    pub storage_prefix: String,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            sidebar_min_width: DEFAULT_SIDEBAR_MIN_WIDTH,
            sidebar_max_width: DEFAULT_SIDEBAR_MAX_WIDTH,
            sidebar_default_width: DEFAULT_SIDEBAR_WIDTH,
            rail_width: DEFAULT_RAIL_WIDTH,
            mobile_breakpoint: DEFAULT_MOBILE_BREAKPOINT,
            storage_prefix: DEFAULT_STORAGE_PREFIX.to_string(),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid {name} value '{value}': expected a non-negative integer")]
    InvalidNumber { name: &'static str, value: String },
    #[error(
        "sidebar widths must satisfy min <= default <= max (min={min}, default={default}, max={max})"
    )]
    InconsistentWidths { min: u32, default: u32, max: u32 },
    #[error("mobile breakpoint must be greater than zero")]
    ZeroBreakpoint,
    #[error("storage prefix must not be empty")]
    EmptyStoragePrefix,
}

impl ShellConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds a config from any key lookup. Blank values fall back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |name: &'static str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let number = |name: &'static str, default: u32| -> Result<u32, ConfigError> {
            match read(name) {
                Some(value) => value
                    .parse::<u32>()
                    .map_err(|_| ConfigError::InvalidNumber { name, value }),
                None => Ok(default),
            }
        };

        let config = Self {
            sidebar_min_width: number(ENV_SIDEBAR_MIN_WIDTH, DEFAULT_SIDEBAR_MIN_WIDTH)?,
            sidebar_max_width: number(ENV_SIDEBAR_MAX_WIDTH, DEFAULT_SIDEBAR_MAX_WIDTH)?,
            sidebar_default_width: number(ENV_SIDEBAR_DEFAULT_WIDTH, DEFAULT_SIDEBAR_WIDTH)?,
            rail_width: number(ENV_RAIL_WIDTH, DEFAULT_RAIL_WIDTH)?,
            mobile_breakpoint: number(ENV_MOBILE_BREAKPOINT, DEFAULT_MOBILE_BREAKPOINT)?,
            storage_prefix: read(ENV_STORAGE_PREFIX)
                .unwrap_or_else(|| DEFAULT_STORAGE_PREFIX.to_string()),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sidebar_min_width > self.sidebar_default_width
            || self.sidebar_default_width > self.sidebar_max_width
        {
            return Err(ConfigError::InconsistentWidths {
                min: self.sidebar_min_width,
                default: self.sidebar_default_width,
                max: self.sidebar_max_width,
            });
        }
        if self.mobile_breakpoint == 0 {
            return Err(ConfigError::ZeroBreakpoint);
        }
        if self.storage_prefix.trim().is_empty() {
            return Err(ConfigError::EmptyStoragePrefix);
        }
        Ok(())
    }
}
