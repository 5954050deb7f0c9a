//! Configuration loading functionality.
//!
//! This module provides the [`ConfigLoader`] type for loading engine
//! configuration from a directory of YAML and JSON files.

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::calendar::HolidaySnapshot;
use crate::error::{EngineError, EngineResult};

use super::types::{EngineConfig, EngineSettings, ReleasePointConfig};

/// Loads and provides access to engine configuration.
///
/// # Directory Structure
///
/// The configuration directory should have the following structure:
/// ```text
/// config/
/// ├── engine.yaml          # Region and release-day policy
/// ├── release_points.yaml  # Default fraction and track groups
/// └── bank_holidays.json   # GOV.UK bank-holidays document
/// ```
///
/// # Example
///
/// ```no_run
/// use release_date_engine::config::ConfigLoader;
///
/// let loader = ConfigLoader::load("./config").unwrap();
/// println!("Region: {:?}", loader.settings().region);
/// ```
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    config: EngineConfig,
}

impl ConfigLoader {
    /// Loads configuration from the specified directory.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration directory (e.g., "./config")
    ///
    /// # Returns
    ///
    /// Returns a `ConfigLoader` instance on success, or an error if:
    /// - Any required file is missing
    /// - Any file contains invalid YAML or JSON
    /// - A release-point fraction is out of range or a track is configured twice
    ///
    /// # Example
    ///
    /// ```no_run
    /// use release_date_engine::config::ConfigLoader;
    ///
    /// let loader = ConfigLoader::load("./config")?;
    /// # Ok::<(), release_date_engine::error::EngineError>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        let path = path.as_ref();

        let settings = Self::load_yaml::<EngineSettings>(&path.join("engine.yaml"))?;

        let release_points =
            Self::load_yaml::<ReleasePointConfig>(&path.join("release_points.yaml"))?;
        release_points.validate()?;

        let holidays = Self::load_holidays(&path.join("bank_holidays.json"))?;

        debug!(
            path = %path.display(),
            region = settings.region.division(),
            groups = release_points.multipliers.len(),
            holidays = holidays.len(),
            "loaded engine configuration"
        );

        Ok(Self {
            config: EngineConfig::new(settings, release_points, holidays),
        })
    }

    fn read(path: &Path) -> EngineResult<String> {
        fs::read_to_string(path).map_err(|_| EngineError::ConfigNotFound {
            path: path.display().to_string(),
        })
    }

    /// Loads and parses a YAML file.
    fn load_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> EngineResult<T> {
        let content = Self::read(path)?;

        serde_yaml::from_str(&content).map_err(|e| EngineError::ConfigParseError {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// Loads the GOV.UK bank-holidays document.
    fn load_holidays(path: &Path) -> EngineResult<HolidaySnapshot> {
        let content = Self::read(path)?;

        HolidaySnapshot::from_gov_uk_json(&content).map_err(|e| EngineError::ConfigParseError {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// Returns the underlying engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Returns the engine settings.
    pub fn settings(&self) -> &EngineSettings {
        self.config.settings()
    }

    /// Consumes the loader, returning the configuration.
    pub fn into_config(self) -> EngineConfig {
        self.config
    }
}
