//! Sentence calculation.
//!
//! This module turns an identified sentence (or consecutive chain) into its
//! release and expiry dates. Day counts come from calendar arithmetic over the
//! aggregated term; the release point is an exact fraction of the term;
//! adjustments then move the dates by whole days.

use std::collections::BTreeMap;

use chrono::{Days, NaiveDate};
use serde_json::json;
use tracing::debug;

use crate::error::{EngineError, EngineResult};
use crate::models::{
    AdjustmentType, AuditStep, Booking, CalculableSentence, CalendarUnit, DurationComponent,
    ReleaseDateType, SentenceCalculation, SentenceIdentificationTrack,
};

use super::duration_aggregator::add_components;
use super::identification::identify;
use super::release_point::{ReleaseFraction, ReleasePointMultiplierLookup, Rounding, rounding_for};

/// Days before the release date that a long-term HDCED falls.
pub const HDCED_DAYS_BEFORE_RELEASE: i64 = 135;
/// The minimum number of days served before home detention curfew.
pub const HDCED_MINIMUM_CUSTODIAL_DAYS: i64 = 28;
/// Terms below this length use the proportional HDCED rule.
pub const HDCED_PROPORTIONAL_TERM_MONTHS: u32 = 18;
/// Length of top-up supervision after release.
pub const TOP_UP_SUPERVISION_MONTHS: u32 = 12;

/// Shifts `date` by a signed number of days.
pub fn offset_days(date: NaiveDate, days: i64) -> EngineResult<NaiveDate> {
    let magnitude = Days::new(days.unsigned_abs());
    let shifted = if days >= 0 {
        date.checked_add_days(magnitude)
    } else {
        date.checked_sub_days(magnitude)
    };
    shifted.ok_or_else(|| EngineError::DateOutOfRange {
        date,
        message: format!("offset by {} days", days),
    })
}

/// The statutory provision governing release on each track.
pub fn release_provision(track: SentenceIdentificationTrack) -> &'static str {
    use SentenceIdentificationTrack::*;
    match track {
        SdsStandardRelease => "CJA 2003 s.244",
        SdsEarlyRelease => "CJA 2003 s.244, SI 2024/844",
        SdsTwoThirdsRelease => "CJA 1991 s.33-35",
        SdsPlusRelease => "CJA 2003 s.244ZA",
        Recall => "CJA 2003 s.255A-255C",
        EdsAutomaticRelease => "CJA 2003 s.246A(2)",
        EdsDiscretionaryRelease => "CJA 2003 s.246A(3)",
        SopcPedAtHalfway | SopcPedAtTwoThirds => "CJA 2003 s.244A",
        AFineArdAtHalfway | AFineArdAtFullTerm => "CJA 2003 s.258",
        DtoBeforePcsc | DtoAfterPcsc => "Sentencing Act 2020 s.241-243",
        Botus => "CJA 2003 s.256AC",
        Indeterminate => "Crime (Sentences) Act 1997 s.28",
    }
}

/// Day totals of each adjustment type that apply to one sentence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct AdjustmentTotals {
    deductions: i64,
    unlawfully_at_large: i64,
    additional_days: i64,
    restored_days: i64,
}

impl AdjustmentTotals {
    fn for_term(booking: &Booking, sentenced_at: NaiveDate, unadjusted_expiry: NaiveDate) -> Self {
        let adjustments = &booking.adjustments;
        let during_term =
            |applies_from: NaiveDate| sentenced_at <= applies_from && applies_from <= unadjusted_expiry;
        Self {
            deductions: adjustments.total(&AdjustmentType::DEDUCTIONS, |a| {
                a.applies_from <= sentenced_at
            }),
            unlawfully_at_large: adjustments
                .total(&[AdjustmentType::UnlawfullyAtLarge], |a| during_term(a.applies_from)),
            additional_days: adjustments.total(&[AdjustmentType::AdditionalDaysAwarded], |a| {
                during_term(a.applies_from)
            }),
            restored_days: adjustments
                .total(&[AdjustmentType::RestorationOfAdditionalDaysAwarded], |a| {
                    during_term(a.applies_from)
                }),
        }
    }

    /// Net shift applied to expiry dates.
    fn expiry_shift(&self) -> i64 {
        self.unlawfully_at_large - self.deductions
    }

    /// Net shift applied to release dates.
    fn release_shift(&self) -> i64 {
        self.expiry_shift() + self.additional_days - self.restored_days
    }
}

/// Calculates release and expiry dates for a single sentence or chain.
///
/// # Example
///
/// ```
/// use release_date_engine::calculation::{ReleasePointMultiplierLookup, SentenceCalculator};
/// use release_date_engine::models::{
///     Adjustments, Booking, Duration, Offence, Offender, ReleaseDateType, Sentence, SentenceKind,
/// };
/// use chrono::NaiveDate;
///
/// let date = |y, m, d| NaiveDate::from_ymd_opt(y, m, d).unwrap();
/// let sentence = Sentence {
///     id: "1".to_string(),
///     sentenced_at: date(2021, 1, 1),
///     duration: Duration::years(5),
///     offence: Offence {
///         code: "TH68001".to_string(),
///         committed_at: date(2020, 6, 1),
///         is_schedule_15_life: false,
///         is_excluded_from_early_release: false,
///     },
///     kind: SentenceKind::StandardDeterminate,
///     is_recall: false,
///     consecutive_to: None,
///     release_date_types: vec![],
///     identification_track: None,
/// };
/// let booking = Booking {
///     offender: Offender {
///         reference: "A1234BC".to_string(),
///         date_of_birth: date(1980, 1, 1),
///         is_sex_offender: false,
///     },
///     sentences: vec![sentence.clone()],
///     adjustments: Adjustments::default(),
/// };
///
/// let calculator = SentenceCalculator::new(ReleasePointMultiplierLookup::default());
/// let result = calculator.calculate(&mut sentence.clone(), &booking).unwrap();
///
/// // 1,826 days; half of that is 913 days.
/// assert_eq!(result.date(ReleaseDateType::Sled), Some(date(2025, 12, 31)));
/// assert_eq!(result.date(ReleaseDateType::Crd), Some(date(2023, 7, 2)));
/// ```
#[derive(Debug, Clone, Default)]
pub struct SentenceCalculator {
    lookup: ReleasePointMultiplierLookup,
}

impl SentenceCalculator {
    /// Creates a calculator over a release-point lookup.
    pub fn new(lookup: ReleasePointMultiplierLookup) -> Self {
        Self { lookup }
    }

    /// The release-point lookup in use.
    pub fn lookup(&self) -> &ReleasePointMultiplierLookup {
        &self.lookup
    }

    /// Calculates the dates for `sentence` within `booking`.
    ///
    /// The sentence is identified first if it has not been already. The
    /// booking supplies the offender and the adjustments.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::DateOutOfRange`] if any date leaves the range
    /// chrono can represent.
    pub fn calculate<S>(&self, sentence: &mut S, booking: &Booking) -> EngineResult<SentenceCalculation>
    where
        S: CalculableSentence + ?Sized,
    {
        let mut audit_steps: Vec<AuditStep> = Vec::new();

        let identification = match sentence.identification() {
            Some(identification) => identification,
            None => identify(sentence, &booking.offender),
        };
        let track = identification.track;
        let provision = release_provision(track);
        audit_steps.push(AuditStep {
            step_number: 1,
            rule_id: "sentence_identification".to_string(),
            rule_name: "Sentence Identification".to_string(),
            clause_ref: provision.to_string(),
            input: json!({
                "sentence_ids": sentence.sentence_ids(),
                "sentenced_at": sentence.sentenced_at().to_string(),
                "offence_committed_at": sentence.offence_committed_at().to_string(),
            }),
            output: json!({
                "track": track,
                "release_date_types": identification.release_date_types,
            }),
            reasoning: format!("Sentence identified under track {}", track),
        });

        // Term lengths.
        let start = sentence.sentenced_at();
        let custodial = sentence.custodial_components();
        let extension = sentence.extension_components();
        let custodial_end = add_components(start, &custodial)?;
        let sentence_end = add_components(custodial_end, &extension)?;
        let custodial_days = (custodial_end - start).num_days();
        let number_of_days_to_sentence_expiry = (sentence_end - start).num_days();
        let unadjusted_expiry_date = offset_days(sentence_end, -1)?;

        // Release point.
        let fraction = self.lookup.multiplier_for(track);
        let rounding = rounding_for(track);
        let days_to_fraction = fraction.apply(custodial_days, rounding);
        let number_of_days_to_release = if track.releases_at_custodial_end() {
            custodial_days
        } else {
            days_to_fraction
        };
        let unadjusted_release_date = offset_days(start, number_of_days_to_release - 1)?;
        audit_steps.push(AuditStep {
            step_number: 2,
            rule_id: "release_point".to_string(),
            rule_name: "Release Point".to_string(),
            clause_ref: provision.to_string(),
            input: json!({
                "custodial_term": custodial.iter().map(ToString::to_string).collect::<Vec<_>>(),
                "licence_extension": extension.iter().map(ToString::to_string).collect::<Vec<_>>(),
                "custodial_days": custodial_days,
                "multiplier": fraction,
                "rounding": rounding,
            }),
            output: json!({
                "number_of_days_to_sentence_expiry": number_of_days_to_sentence_expiry,
                "number_of_days_to_release": number_of_days_to_release,
                "unadjusted_expiry_date": unadjusted_expiry_date.to_string(),
                "unadjusted_release_date": unadjusted_release_date.to_string(),
            }),
            reasoning: format!(
                "{} of {} custodial days is {} days",
                fraction, custodial_days, days_to_fraction
            ),
        });

        // Adjustments.
        let totals = AdjustmentTotals::for_term(booking, start, unadjusted_expiry_date);
        audit_steps.push(AuditStep {
            step_number: 3,
            rule_id: "adjustments".to_string(),
            rule_name: "Day Adjustments".to_string(),
            clause_ref: "CJA 2003 s.240ZA, s.240A, s.257".to_string(),
            input: json!({
                "deductions": totals.deductions,
                "unlawfully_at_large": totals.unlawfully_at_large,
                "additional_days_awarded": totals.additional_days,
                "restoration_of_additional_days_awarded": totals.restored_days,
            }),
            output: json!({
                "expiry_shift": totals.expiry_shift(),
                "release_shift": totals.release_shift(),
            }),
            reasoning: format!(
                "Expiry dates move {} days and release dates move {} days",
                totals.expiry_shift(),
                totals.release_shift()
            ),
        });

        let release = offset_days(unadjusted_release_date, totals.release_shift())?;
        let at_fraction_of_term = |fraction: ReleaseFraction| -> EngineResult<NaiveDate> {
            let days = fraction.apply(custodial_days, rounding);
            offset_days(start, days - 1 + totals.release_shift())
        };

        let mut dates: BTreeMap<ReleaseDateType, NaiveDate> = BTreeMap::new();
        let mut release_date_types = Vec::with_capacity(identification.release_date_types.len());
        for date_type in &identification.release_date_types {
            let date = match date_type {
                ReleaseDateType::Sed | ReleaseDateType::Sled => {
                    offset_days(unadjusted_expiry_date, totals.expiry_shift())?
                }
                ReleaseDateType::Led => at_fraction_of_term(ReleaseFraction::THREE_QUARTERS)?,
                ReleaseDateType::Crd | ReleaseDateType::Ard | ReleaseDateType::Npd => release,
                ReleaseDateType::Ped => match track {
                    SentenceIdentificationTrack::SdsTwoThirdsRelease => {
                        at_fraction_of_term(ReleaseFraction::HALF)?
                    }
                    _ => offset_days(start, days_to_fraction - 1 + totals.release_shift())?,
                },
                ReleaseDateType::Hdced => {
                    let hdced = self.home_detention_curfew_eligibility(
                        start,
                        custodial_end,
                        number_of_days_to_release,
                        totals.release_shift(),
                        release,
                        rounding,
                    )?;
                    match hdced {
                        Some(hdced) => hdced,
                        None => {
                            audit_steps.push(AuditStep {
                                step_number: audit_steps.len() as u32 + 1,
                                rule_id: "hdced_dropped".to_string(),
                                rule_name: "HDCED Not Applicable".to_string(),
                                clause_ref: "CJA 2003 s.246".to_string(),
                                input: json!({ "release_date": release.to_string() }),
                                output: json!({ "hdced": null }),
                                reasoning: "HDCED would not fall before the release date"
                                    .to_string(),
                            });
                            continue;
                        }
                    }
                }
                ReleaseDateType::Tused => {
                    let released = offset_days(unadjusted_release_date, totals.expiry_shift())?;
                    DurationComponent::new(CalendarUnit::Months, TOP_UP_SUPERVISION_MONTHS)
                        .add_to(released)
                        .ok_or_else(|| EngineError::DateOutOfRange {
                            date: released,
                            message: "adding top-up supervision period".to_string(),
                        })?
                }
                ReleaseDateType::None => {
                    release_date_types.push(*date_type);
                    continue;
                }
            };
            dates.insert(*date_type, date);
            release_date_types.push(*date_type);
        }

        audit_steps.push(AuditStep {
            step_number: audit_steps.len() as u32 + 1,
            rule_id: "release_dates".to_string(),
            rule_name: "Release Dates".to_string(),
            clause_ref: provision.to_string(),
            input: json!({ "release_date_types": release_date_types }),
            output: json!(
                dates
                    .iter()
                    .map(|(date_type, date)| (date_type.code(), date.to_string()))
                    .collect::<BTreeMap<_, _>>()
            ),
            reasoning: format!("Calculated {} dates", dates.len()),
        });

        debug!(
            sentence_ids = ?sentence.sentence_ids(),
            %track,
            custodial_days,
            number_of_days_to_release,
            dates = ?dates,
            "calculated sentence"
        );

        Ok(SentenceCalculation {
            sentence_ids: sentence.sentence_ids(),
            identification_track: track,
            release_date_types,
            sentenced_at: start,
            number_of_days_to_sentence_expiry,
            number_of_days_to_release,
            unadjusted_expiry_date,
            unadjusted_release_date,
            dates,
            audit_steps,
        })
    }

    /// HDCED, or `None` when it would not fall before the release date.
    fn home_detention_curfew_eligibility(
        &self,
        start: NaiveDate,
        custodial_end: NaiveDate,
        days_to_release: i64,
        release_shift: i64,
        release: NaiveDate,
        rounding: Rounding,
    ) -> EngineResult<Option<NaiveDate>> {
        let proportional_limit =
            DurationComponent::new(CalendarUnit::Months, HDCED_PROPORTIONAL_TERM_MONTHS)
                .add_to(start);
        let proportional = proportional_limit.is_none_or(|limit| custodial_end < limit);

        let hdced = if proportional {
            let days = ReleaseFraction::HALF
                .apply(days_to_release, rounding)
                .max(HDCED_MINIMUM_CUSTODIAL_DAYS);
            offset_days(start, days - 1 + release_shift)?
        } else {
            offset_days(release, -HDCED_DAYS_BEFORE_RELEASE)?
        };

        Ok((hdced < release).then_some(hdced))
    }
}
