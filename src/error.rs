//! Error types for the Release Date Calculation Engine.
//!
//! This module provides strongly-typed errors using the `thiserror` crate.
//! Inputs reach the engine already validated, so the taxonomy is narrow:
//! configuration defects, malformed bookings, and dates pushed outside the
//! representable calendar.

use chrono::NaiveDate;
use thiserror::Error;

/// The main error type for the Release Date Calculation Engine.
///
/// Any error surfaced by the engine indicates a configuration defect or a
/// booking the validation collaborator should have rejected; none of them is
/// worth retrying.
///
/// # Example
///
/// ```
/// use release_date_engine::error::EngineError;
///
/// let error = EngineError::ConfigNotFound {
///     path: "/missing/release_points.yaml".to_string(),
/// };
/// assert_eq!(
///     error.to_string(),
///     "Configuration file not found: /missing/release_points.yaml"
/// );
/// ```
#[derive(Debug, Error)]
pub enum EngineError {
    /// Configuration file was not found at the specified path.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// The path that was not found.
        path: String,
    },

    /// Configuration file could not be parsed.
    #[error("Failed to parse configuration file '{path}': {message}")]
    ConfigParseError {
        /// The path to the file that failed to parse.
        path: String,
        /// A description of the parse error.
        message: String,
    },

    /// A release-point fraction could not be interpreted.
    #[error("Invalid release fraction '{value}': {message}")]
    InvalidReleaseFraction {
        /// The raw configured value.
        value: String,
        /// Why the value was rejected.
        message: String,
    },

    /// The same identification track appears in more than one multiplier group.
    #[error("Track {track} is configured in more than one multiplier group")]
    DuplicateTrackConfiguration {
        /// The track that was configured twice.
        track: String,
    },

    /// A booking could not be organised into calculable sentences.
    #[error("Invalid booking: {message}")]
    InvalidBooking {
        /// A description of what made the booking invalid.
        message: String,
    },

    /// Date arithmetic left the range chrono can represent.
    #[error("Date out of range from {date}: {message}")]
    DateOutOfRange {
        /// The date the arithmetic started from.
        date: NaiveDate,
        /// The operation that overflowed.
        message: String,
    },
}

/// A type alias for Results that return EngineError.
pub type EngineResult<T> = Result<T, EngineError>;
