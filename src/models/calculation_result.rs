//! Calculation result models for the Release Date Calculation Engine.
//!
//! This module contains the [`SentenceCalculation`] and [`BookingCalculation`]
//! types that capture the outputs of a calculation, the audit trace explaining
//! each decision, and the historic [`CalculationOutcome`] records the engine
//! reconciles against.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::calendar::{NonFridayReleaseDay, WorkingDay};

use super::{ReleaseDateType, SentenceIdentificationTrack};

/// A single step in the audit trace recording a calculation decision.
///
/// Each step captures the input, output, and reasoning for a rule application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditStep {
    /// The sequential step number.
    pub step_number: u32,
    /// The unique identifier of the rule that was applied.
    pub rule_id: String,
    /// The human-readable name of the rule.
    pub rule_name: String,
    /// Reference to the legislation behind this rule.
    pub clause_ref: String,
    /// The input data for this step.
    pub input: serde_json::Value,
    /// The output data from this step.
    pub output: serde_json::Value,
    /// Human-readable explanation of the decision.
    pub reasoning: String,
}

/// A warning generated during calculation.
///
/// Warnings flag outcomes a case administrator should look at but which do
/// not stop the calculation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditWarning {
    /// A code identifying the type of warning.
    pub code: String,
    /// A human-readable description of the warning.
    pub message: String,
    /// The severity level (e.g., "low", "medium", "high").
    pub severity: String,
}

/// The complete audit trace for a calculation.
///
/// # Example
///
/// ```
/// use release_date_engine::models::AuditTrace;
///
/// let trace = AuditTrace {
///     steps: vec![],
///     warnings: vec![],
///     duration_us: 1234,
/// };
/// assert!(trace.steps.is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditTrace {
    /// The sequence of calculation steps.
    pub steps: Vec<AuditStep>,
    /// Any warnings generated during calculation.
    pub warnings: Vec<AuditWarning>,
    /// The total calculation duration in microseconds.
    pub duration_us: u64,
}

/// The result of calculating one sentence (or consecutive chain).
///
/// `dates` holds exactly one entry per type in `release_date_types`. The
/// accessors project SLED over LED/SED so callers never need to care which
/// form a sentence printed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentenceCalculation {
    /// The sentences covered by this calculation.
    pub sentence_ids: Vec<String>,
    /// The track the sentence was identified under.
    pub identification_track: SentenceIdentificationTrack,
    /// The date types produced, in identification order.
    pub release_date_types: Vec<ReleaseDateType>,
    /// The date the calculation starts from.
    pub sentenced_at: NaiveDate,
    /// Days from the start date to sentence expiry, inclusive.
    pub number_of_days_to_sentence_expiry: i64,
    /// Days from the start date to the release point, inclusive.
    pub number_of_days_to_release: i64,
    /// Sentence expiry before adjustments.
    pub unadjusted_expiry_date: NaiveDate,
    /// Release point before adjustments.
    pub unadjusted_release_date: NaiveDate,
    /// Calculated dates keyed by type.
    pub dates: BTreeMap<ReleaseDateType, NaiveDate>,
    /// The decisions made while calculating.
    pub audit_steps: Vec<AuditStep>,
}

impl SentenceCalculation {
    /// Returns the date calculated for `date_type`, if any.
    pub fn date(&self, date_type: ReleaseDateType) -> Option<NaiveDate> {
        self.dates.get(&date_type).copied()
    }

    /// The date the offender leaves custody: CRD, ARD or NPD.
    pub fn release_date(&self) -> Option<NaiveDate> {
        [ReleaseDateType::Crd, ReleaseDateType::Ard, ReleaseDateType::Npd]
            .into_iter()
            .find_map(|date_type| self.date(date_type))
    }

    /// The sentence expiry date, from SED or SLED.
    pub fn expiry_date(&self) -> Option<NaiveDate> {
        self.date(ReleaseDateType::Sed)
            .or_else(|| self.date(ReleaseDateType::Sled))
    }

    /// The licence expiry date, from LED or SLED.
    pub fn licence_expiry_date(&self) -> Option<NaiveDate> {
        self.date(ReleaseDateType::Led)
            .or_else(|| self.date(ReleaseDateType::Sled))
    }
}

/// A previously recorded determination of an expiry date.
///
/// These come from earlier calculations, possibly made by a legacy system,
/// and may hold manually entered overrides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalculationOutcome {
    /// The calculation request that produced the outcome.
    pub calculation_request_id: i64,
    /// The recorded date.
    pub outcome_date: NaiveDate,
    /// The type of the recorded date.
    pub calculation_date_type: ReleaseDateType,
}

/// The published result for a whole booking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingCalculation {
    /// Unique identifier for this calculation.
    pub calculation_id: Uuid,
    /// When the calculation was performed.
    pub calculated_at: DateTime<Utc>,
    /// The engine version that produced the result.
    pub engine_version: String,
    /// The offender the booking belongs to.
    pub offender_reference: String,
    /// One calculation per sentence or consecutive chain.
    pub sentence_calculations: Vec<SentenceCalculation>,
    /// Booking-level dates after historic reconciliation.
    pub dates: BTreeMap<ReleaseDateType, NaiveDate>,
    /// Working-day adjustments for release and eligibility dates.
    pub working_day_adjustments: BTreeMap<ReleaseDateType, WorkingDay>,
    /// The release day under the non-Friday release policy, when enabled.
    pub non_friday_release: Option<NonFridayReleaseDay>,
    /// Complete audit trace of booking-level decisions.
    pub audit_trace: AuditTrace,
}

impl BookingCalculation {
    /// Returns the booking-level date for `date_type`, if any.
    pub fn date(&self, date_type: ReleaseDateType) -> Option<NaiveDate> {
        self.dates.get(&date_type).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn create_sample_calculation(dates: Vec<(ReleaseDateType, NaiveDate)>) -> SentenceCalculation {
        SentenceCalculation {
            sentence_ids: vec!["S1".to_string()],
            identification_track: SentenceIdentificationTrack::SdsStandardRelease,
            release_date_types: dates.iter().map(|(t, _)| *t).collect(),
            sentenced_at: date(2021, 1, 1),
            number_of_days_to_sentence_expiry: 365,
            number_of_days_to_release: 183,
            unadjusted_expiry_date: date(2021, 12, 31),
            unadjusted_release_date: date(2021, 7, 2),
            dates: dates.into_iter().collect(),
            audit_steps: vec![],
        }
    }

    #[test]
    fn test_sled_projects_to_expiry_and_licence_expiry() {
        let calculation = create_sample_calculation(vec![
            (ReleaseDateType::Sled, date(2021, 12, 31)),
            (ReleaseDateType::Crd, date(2021, 7, 2)),
        ]);

        assert_eq!(calculation.expiry_date(), Some(date(2021, 12, 31)));
        assert_eq!(calculation.licence_expiry_date(), Some(date(2021, 12, 31)));
        assert_eq!(calculation.release_date(), Some(date(2021, 7, 2)));
    }

    #[test]
    fn test_separate_led_and_sed() {
        let calculation = create_sample_calculation(vec![
            (ReleaseDateType::Led, date(2021, 10, 1)),
            (ReleaseDateType::Crd, date(2021, 7, 2)),
            (ReleaseDateType::Sed, date(2021, 12, 31)),
        ]);

        assert_eq!(calculation.expiry_date(), Some(date(2021, 12, 31)));
        assert_eq!(calculation.licence_expiry_date(), Some(date(2021, 10, 1)));
    }

    #[test]
    fn test_ard_is_release_date_without_licence() {
        let calculation = create_sample_calculation(vec![
            (ReleaseDateType::Ard, date(2021, 4, 1)),
            (ReleaseDateType::Sed, date(2021, 6, 30)),
        ]);

        assert_eq!(calculation.release_date(), Some(date(2021, 4, 1)));
        assert_eq!(calculation.licence_expiry_date(), None);
    }

    #[test]
    fn test_indeterminate_calculation_has_no_dates() {
        let calculation = create_sample_calculation(vec![]);
        assert_eq!(calculation.release_date(), None);
        assert_eq!(calculation.expiry_date(), None);
    }

    #[test]
    fn test_calculation_outcome_round_trips_through_json() {
        let outcome = CalculationOutcome {
            calculation_request_id: 42,
            outcome_date: date(2021, 1, 1),
            calculation_date_type: ReleaseDateType::Led,
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["calculation_date_type"], "LED");
        let parsed: CalculationOutcome = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, outcome);
    }
}
