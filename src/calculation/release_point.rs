//! Release-point multiplier lookup.
//!
//! Every identification track releases at a fixed fraction of the sentence.
//! This module holds the exact [`ReleaseFraction`] type, the per-track
//! [`Rounding`] table, the statutory fraction table, and the
//! [`ReleasePointMultiplierLookup`] built from configuration.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::ReleasePointConfig;
use crate::error::{EngineError, EngineResult};
use crate::models::SentenceIdentificationTrack;

/// How a fractional day count is turned into whole days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rounding {
    /// Round any part day up to the next whole day.
    Up,
    /// Drop any part day.
    Down,
}

/// An exact release-point fraction such as 1/2 or 2/3.
///
/// Fractions are kept as reduced integer ratios so multiplying a day count
/// never drifts the way a floating-point 0.6666 would. Configuration may write
/// them as `"2/3"` or as a decimal string like `"0.4"`.
///
/// # Example
///
/// ```
/// use release_date_engine::calculation::{ReleaseFraction, Rounding};
///
/// let two_thirds: ReleaseFraction = "2/3".parse().unwrap();
/// assert_eq!(two_thirds.apply(365, Rounding::Up), 244);
/// assert_eq!(two_thirds.apply(366, Rounding::Up), 244);
///
/// let forty_percent: ReleaseFraction = "0.4".parse().unwrap();
/// assert_eq!(forty_percent, ReleaseFraction::TWO_FIFTHS);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ReleaseFraction {
    numerator: u32,
    denominator: u32,
}

impl ReleaseFraction {
    /// One half.
    pub const HALF: ReleaseFraction = ReleaseFraction {
        numerator: 1,
        denominator: 2,
    };
    /// Two thirds.
    pub const TWO_THIRDS: ReleaseFraction = ReleaseFraction {
        numerator: 2,
        denominator: 3,
    };
    /// Two fifths (40%).
    pub const TWO_FIFTHS: ReleaseFraction = ReleaseFraction {
        numerator: 2,
        denominator: 5,
    };
    /// Three quarters.
    pub const THREE_QUARTERS: ReleaseFraction = ReleaseFraction {
        numerator: 3,
        denominator: 4,
    };
    /// The whole term.
    pub const FULL_TERM: ReleaseFraction = ReleaseFraction {
        numerator: 1,
        denominator: 1,
    };

    /// Creates a reduced fraction in the range (0, 1].
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidReleaseFraction`] for a zero denominator,
    /// a zero numerator, or a fraction greater than one.
    pub fn new(numerator: u32, denominator: u32) -> EngineResult<Self> {
        let invalid = |message: &str| EngineError::InvalidReleaseFraction {
            value: format!("{}/{}", numerator, denominator),
            message: message.to_string(),
        };
        if denominator == 0 {
            return Err(invalid("denominator must be non-zero"));
        }
        if numerator == 0 {
            return Err(invalid("fraction must be greater than zero"));
        }
        if numerator > denominator {
            return Err(invalid("fraction must not exceed the full term"));
        }
        let divisor = gcd(numerator, denominator);
        Ok(Self {
            numerator: numerator / divisor,
            denominator: denominator / divisor,
        })
    }

    /// The numerator of the reduced fraction.
    pub fn numerator(&self) -> u32 {
        self.numerator
    }

    /// The denominator of the reduced fraction.
    pub fn denominator(&self) -> u32 {
        self.denominator
    }

    /// Returns true for the whole term (1/1).
    pub fn is_full_term(&self) -> bool {
        self.numerator == self.denominator
    }

    /// The fraction as a decimal, for display only.
    pub fn as_decimal(&self) -> Decimal {
        Decimal::from(self.numerator) / Decimal::from(self.denominator)
    }

    /// Applies the fraction to a day count using exact integer arithmetic.
    pub fn apply(&self, days: i64, rounding: Rounding) -> i64 {
        let scaled = days * i64::from(self.numerator);
        let denominator = i64::from(self.denominator);
        let whole = scaled.div_euclid(denominator);
        match rounding {
            Rounding::Up if scaled.rem_euclid(denominator) > 0 => whole + 1,
            Rounding::Up | Rounding::Down => whole,
        }
    }
}

fn gcd(a: u32, b: u32) -> u32 {
    if b == 0 { a } else { gcd(b, a % b) }
}

impl fmt::Display for ReleaseFraction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.denominator == 1 {
            write!(f, "{}", self.numerator)
        } else {
            write!(f, "{}/{}", self.numerator, self.denominator)
        }
    }
}

impl FromStr for ReleaseFraction {
    type Err = EngineError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let invalid = |message: String| EngineError::InvalidReleaseFraction {
            value: value.to_string(),
            message,
        };
        let trimmed = value.trim();

        if let Some((numerator, denominator)) = trimmed.split_once('/') {
            let numerator: u32 = numerator
                .trim()
                .parse()
                .map_err(|e| invalid(format!("bad numerator: {}", e)))?;
            let denominator: u32 = denominator
                .trim()
                .parse()
                .map_err(|e| invalid(format!("bad denominator: {}", e)))?;
            return Self::new(numerator, denominator);
        }

        let decimal =
            Decimal::from_str(trimmed).map_err(|e| invalid(format!("not a number: {}", e)))?;
        let scale = decimal.scale();
        let mantissa = u32::try_from(decimal.mantissa())
            .map_err(|_| invalid("value out of range".to_string()))?;
        let denominator = 10u32
            .checked_pow(scale)
            .ok_or_else(|| invalid("too many decimal places".to_string()))?;
        Self::new(mantissa, denominator)
    }
}

impl TryFrom<String> for ReleaseFraction {
    type Error = EngineError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ReleaseFraction> for String {
    fn from(fraction: ReleaseFraction) -> Self {
        fraction.to_string()
    }
}

/// The fraction each track is released at by statute.
///
/// This table is an exhaustive match: a new track does not compile until it
/// is given a fraction here.
pub fn statutory_fraction(track: SentenceIdentificationTrack) -> ReleaseFraction {
    use SentenceIdentificationTrack::*;
    match track {
        SdsTwoThirdsRelease | SdsPlusRelease | EdsAutomaticRelease | EdsDiscretionaryRelease
        | SopcPedAtTwoThirds => ReleaseFraction::TWO_THIRDS,
        SdsEarlyRelease => ReleaseFraction::TWO_FIFTHS,
        AFineArdAtFullTerm | Botus | Indeterminate => ReleaseFraction::FULL_TERM,
        SdsStandardRelease | Recall | SopcPedAtHalfway | AFineArdAtHalfway | DtoBeforePcsc
        | DtoAfterPcsc => ReleaseFraction::HALF,
    }
}

/// How part days are rounded for each track.
///
/// Every current track rounds up; the table is kept per track because the
/// legacy worked examples are the only definition of the rule.
pub fn rounding_for(track: SentenceIdentificationTrack) -> Rounding {
    use SentenceIdentificationTrack::*;
    match track {
        SdsStandardRelease | SdsEarlyRelease | SdsTwoThirdsRelease | SdsPlusRelease | Recall
        | EdsAutomaticRelease | EdsDiscretionaryRelease | SopcPedAtHalfway
        | SopcPedAtTwoThirds | AFineArdAtHalfway | AFineArdAtFullTerm | DtoBeforePcsc
        | DtoAfterPcsc | Botus | Indeterminate => Rounding::Up,
    }
}

/// Maps identification tracks to release-point fractions.
///
/// Built from a [`ReleasePointConfig`]: the first group listing a track wins,
/// and unlisted tracks take the configured default.
///
/// # Example
///
/// ```
/// use release_date_engine::calculation::{ReleaseFraction, ReleasePointMultiplierLookup};
/// use release_date_engine::config::ReleasePointConfig;
/// use release_date_engine::models::SentenceIdentificationTrack;
///
/// let lookup = ReleasePointMultiplierLookup::new(ReleasePointConfig::default()).unwrap();
/// assert_eq!(
///     lookup.multiplier_for(SentenceIdentificationTrack::SdsPlusRelease),
///     ReleaseFraction::TWO_THIRDS
/// );
/// assert_eq!(
///     lookup.multiplier_for(SentenceIdentificationTrack::SdsStandardRelease),
///     ReleaseFraction::HALF
/// );
/// ```
#[derive(Debug, Clone)]
pub struct ReleasePointMultiplierLookup {
    config: ReleasePointConfig,
}

impl ReleasePointMultiplierLookup {
    /// Creates a lookup after validating the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::DuplicateTrackConfiguration`] if a track is
    /// listed in more than one group.
    pub fn new(config: ReleasePointConfig) -> EngineResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Returns the release-point fraction for `track`.
    pub fn multiplier_for(&self, track: SentenceIdentificationTrack) -> ReleaseFraction {
        self.config
            .multipliers
            .iter()
            .find(|group| group.tracks.contains(&track))
            .map(|group| group.multiplier)
            .unwrap_or(self.config.default)
    }

    /// The configuration the lookup was built from.
    pub fn config(&self) -> &ReleasePointConfig {
        &self.config
    }
}

impl Default for ReleasePointMultiplierLookup {
    fn default() -> Self {
        Self {
            config: ReleasePointConfig::default(),
        }
    }
}
