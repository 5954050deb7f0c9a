//! Configuration loading and management for the release date engine.
//!
//! This module loads engine settings, release-point fractions and the initial
//! bank-holiday snapshot from a configuration directory.
//!
//! # Example
//!
//! ```no_run
//! use release_date_engine::config::ConfigLoader;
//!
//! let config = ConfigLoader::load("./config").unwrap();
//! println!("Region: {:?}", config.settings().region);
//! ```

mod loader;
mod types;

pub use loader::ConfigLoader;
pub use types::{EngineConfig, EngineSettings, MultiplierGroup, ReleasePointConfig};
