//! Configuration types for the release date engine.
//!
//! This module contains the strongly-typed configuration structures that
//! are deserialized from the files in a configuration directory.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::calculation::{ReleaseFraction, statutory_fraction};
use crate::calendar::{HolidaySnapshot, Region};
use crate::error::{EngineError, EngineResult};
use crate::models::SentenceIdentificationTrack;

/// Engine-wide settings from engine.yaml.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineSettings {
    /// The bank-holiday division used for working-day adjustment.
    pub region: Region,
    /// Whether release days are moved off Fridays and pre-holiday days.
    #[serde(default)]
    pub non_friday_release_policy: bool,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            region: Region::EnglandAndWales,
            non_friday_release_policy: true,
        }
    }
}

/// A group of tracks that share a release-point fraction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultiplierGroup {
    /// The tracks in the group.
    pub tracks: Vec<SentenceIdentificationTrack>,
    /// The fraction of the sentence served before release.
    pub multiplier: ReleaseFraction,
}

/// Release-point configuration from release_points.yaml.
///
/// # Example
///
/// ```
/// use release_date_engine::calculation::ReleaseFraction;
/// use release_date_engine::config::ReleasePointConfig;
///
/// let yaml = r#"
/// default: "1/2"
/// multipliers:
///   - tracks: [SDS_PLUS_RELEASE, SDS_TWO_THIRDS_RELEASE]
///     multiplier: "2/3"
/// "#;
/// let config: ReleasePointConfig = serde_yaml::from_str(yaml).unwrap();
/// assert!(config.validate().is_ok());
/// assert_eq!(config.multipliers[0].multiplier, ReleaseFraction::TWO_THIRDS);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleasePointConfig {
    /// Fraction for tracks not listed in any group.
    pub default: ReleaseFraction,
    /// Track groups with their own fraction.
    #[serde(default)]
    pub multipliers: Vec<MultiplierGroup>,
}

impl ReleasePointConfig {
    /// Checks that no track is listed in more than one group.
    ///
    /// Fraction ranges are checked when each fraction is parsed.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::DuplicateTrackConfiguration`] naming the first
    /// repeated track.
    pub fn validate(&self) -> EngineResult<()> {
        let mut seen = BTreeSet::new();
        for track in self.multipliers.iter().flat_map(|group| &group.tracks) {
            if !seen.insert(*track) {
                return Err(EngineError::DuplicateTrackConfiguration {
                    track: track.to_string(),
                });
            }
        }
        Ok(())
    }
}

impl Default for ReleasePointConfig {
    /// The statutory release points, grouped by fraction.
    fn default() -> Self {
        let default = ReleaseFraction::HALF;
        let mut multipliers: Vec<MultiplierGroup> = Vec::new();
        for track in SentenceIdentificationTrack::ALL {
            let fraction = statutory_fraction(track);
            if fraction == default {
                continue;
            }
            match multipliers.iter_mut().find(|group| group.multiplier == fraction) {
                Some(group) => group.tracks.push(track),
                None => multipliers.push(MultiplierGroup {
                    tracks: vec![track],
                    multiplier: fraction,
                }),
            }
        }
        Self {
            default,
            multipliers,
        }
    }
}

/// The complete engine configuration loaded from a configuration directory.
///
/// This struct aggregates all configuration loaded from the files in the
/// directory.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Engine settings.
    settings: EngineSettings,
    /// Release-point fractions.
    release_points: ReleasePointConfig,
    /// Initial bank-holiday snapshot.
    holidays: HolidaySnapshot,
}

impl EngineConfig {
    /// Creates a new EngineConfig from its component parts.
    pub fn new(
        settings: EngineSettings,
        release_points: ReleasePointConfig,
        holidays: HolidaySnapshot,
    ) -> Self {
        Self {
            settings,
            release_points,
            holidays,
        }
    }

    /// Returns the engine settings.
    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Returns the release-point configuration.
    pub fn release_points(&self) -> &ReleasePointConfig {
        &self.release_points
    }

    /// Returns the initial bank-holiday snapshot.
    pub fn holidays(&self) -> &HolidaySnapshot {
        &self.holidays
    }
}

impl Default for EngineConfig {
    /// Statutory release points, England and Wales, and no bank holidays.
    fn default() -> Self {
        Self::new(
            EngineSettings::default(),
            ReleasePointConfig::default(),
            HolidaySnapshot::default(),
        )
    }
}
