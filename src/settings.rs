//! Runtime settings for the path finder.
//!
//! Defaults work out of the box; an optional `config/orderbook.yaml` and
//! `ORDERBOOK_`-prefixed environment variables override them. The library
//! itself never reads settings - the hosting process loads them once and
//! passes a [`PathFinderConfig`] down.

use config::{Config, ConfigError, File};
use serde::Deserialize;

use crate::search::finder::{DEFAULT_MAX_ASSETS_PARAM_LENGTH, DEFAULT_MAX_PATH_LENGTH};
use crate::search::PathFinderConfig;

#[derive(Debug, Deserialize)]
pub struct Settings {
    /// Maximum conversions per payment path.
    pub max_path_length: u32,
    /// Maximum number of assets accepted in an explicit source or
    /// destination list.
    pub max_assets_param_length: usize,
    /// Log level for the hosting binary.
    pub log_level: String,
}

pub fn load_settings() -> Result<Settings, ConfigError> {
    let s = Config::builder()
        // Set defaults
        .set_default("max_path_length", DEFAULT_MAX_PATH_LENGTH as i64)?
        .set_default("max_assets_param_length", DEFAULT_MAX_ASSETS_PARAM_LENGTH as i64)?
        .set_default("log_level", "info")?
        // Add configuration from a file, when present
        .add_source(File::with_name("config/orderbook").required(false))
        // Add configuration from environment variables
        .add_source(config::Environment::with_prefix("ORDERBOOK"))
        .build()?;

    s.try_deserialize()
}

impl From<&Settings> for PathFinderConfig {
    fn from(settings: &Settings) -> Self {
        PathFinderConfig {
            max_path_length: settings.max_path_length,
            max_assets_param_length: settings.max_assets_param_length,
        }
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
