//! Core data models for the Release Date Calculation Engine.
//!
//! This module contains all the domain models used throughout the engine.

mod adjustment;
mod booking;
mod calculation_result;
mod duration;
mod offender;
mod release_date_type;
mod sentence;

pub use adjustment::{Adjustment, AdjustmentType, Adjustments};
pub use booking::Booking;
pub use calculation_result::{
    AuditStep, AuditTrace, AuditWarning, BookingCalculation, CalculationOutcome,
    SentenceCalculation,
};
pub use duration::{CalendarUnit, Duration, DurationComponent};
pub use offender::{ADULT_AGE, Offender};
pub use release_date_type::{ReleaseDateType, SentenceIdentificationTrack};
pub use sentence::{
    CalculableSentence, ConsecutiveSentence, Identification, Offence, Sentence, SentenceKind,
};
