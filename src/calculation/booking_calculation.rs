//! Booking calculation.
//!
//! This module provides the [`ReleaseDateEngine`], which takes a whole
//! booking through chain building, per-sentence calculation, combination into
//! booking-level dates, historic reconciliation and working-day adjustment.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;
use std::time::Instant;

use chrono::{NaiveDate, Utc};
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use crate::calendar::{CalendarService, NonFridayReleaseDay, WorkingDay};
use crate::config::{ConfigLoader, EngineConfig, EngineSettings};
use crate::error::{EngineError, EngineResult};
use crate::models::{
    AuditStep, AuditTrace, AuditWarning, Booking, BookingCalculation, CalculableSentence,
    CalculationOutcome, ConsecutiveSentence, ReleaseDateType, Sentence, SentenceCalculation,
};

use super::dominant_historic_date::calculate_from_sled;
use super::release_point::ReleasePointMultiplierLookup;
use super::sentence_calculation::SentenceCalculator;

/// Groups a booking's sentences into consecutive chains.
///
/// Each chain starts at a sentence with no `consecutive_to` link and follows
/// successors in serving order. Chains are returned in the order their first
/// sentence appears in `sentences`; a sentence served on its own is a chain of
/// one.
///
/// # Errors
///
/// Returns [`EngineError::InvalidBooking`] when:
/// - two sentences share an identifier
/// - a sentence follows an identifier not in the booking
/// - two sentences follow the same sentence
/// - the links form a cycle
/// - a chain contains a kind that cannot run consecutively, or mixes kinds
///
/// # Example
///
/// ```
/// use release_date_engine::calculation::build_chains;
/// use release_date_engine::models::{Duration, Offence, Sentence, SentenceKind};
/// use chrono::NaiveDate;
///
/// let date = |y, m, d| NaiveDate::from_ymd_opt(y, m, d).unwrap();
/// let sentence = |id: &str, consecutive_to: Option<&str>| Sentence {
///     id: id.to_string(),
///     sentenced_at: date(2021, 1, 1),
///     duration: Duration::months(6),
///     offence: Offence {
///         code: "TH68001".to_string(),
///         committed_at: date(2020, 6, 1),
///         is_schedule_15_life: false,
///         is_excluded_from_early_release: false,
///     },
///     kind: SentenceKind::StandardDeterminate,
///     is_recall: false,
///     consecutive_to: consecutive_to.map(str::to_string),
///     release_date_types: vec![],
///     identification_track: None,
/// };
///
/// let chains = build_chains(&[
///     sentence("B", Some("A")),
///     sentence("A", None),
///     sentence("C", None),
/// ])
/// .unwrap();
///
/// let ids: Vec<Vec<&str>> = chains
///     .iter()
///     .map(|chain| chain.iter().map(|s| s.id.as_str()).collect())
///     .collect();
/// assert_eq!(ids, vec![vec!["A", "B"], vec!["C"]]);
/// ```
pub fn build_chains(sentences: &[Sentence]) -> EngineResult<Vec<Vec<Sentence>>> {
    let mut by_id: HashMap<&str, &Sentence> = HashMap::with_capacity(sentences.len());
    for sentence in sentences {
        if by_id.insert(sentence.id.as_str(), sentence).is_some() {
            return Err(invalid_booking(format!(
                "sentence '{}' appears more than once",
                sentence.id
            )));
        }
    }

    let mut successors: HashMap<&str, &Sentence> = HashMap::new();
    for sentence in sentences {
        let Some(predecessor) = sentence.consecutive_to.as_deref() else {
            continue;
        };
        if !by_id.contains_key(predecessor) {
            return Err(invalid_booking(format!(
                "sentence '{}' is consecutive to unknown sentence '{}'",
                sentence.id, predecessor
            )));
        }
        if let Some(existing) = successors.insert(predecessor, sentence) {
            return Err(invalid_booking(format!(
                "sentences '{}' and '{}' are both consecutive to '{}'",
                existing.id, sentence.id, predecessor
            )));
        }
    }

    let mut chains = Vec::new();
    let mut visited: HashSet<&str> = HashSet::with_capacity(sentences.len());
    for root in sentences.iter().filter(|s| s.consecutive_to.is_none()) {
        let mut chain = vec![root.clone()];
        visited.insert(root.id.as_str());
        let mut current = root;
        while let Some(&next) = successors.get(current.id.as_str()) {
            visited.insert(next.id.as_str());
            chain.push(next.clone());
            current = next;
        }
        check_chain_kinds(&chain)?;
        chains.push(chain);
    }

    if visited.len() != sentences.len() {
        let mut cyclic: Vec<&str> = sentences
            .iter()
            .map(|s| s.id.as_str())
            .filter(|id| !visited.contains(id))
            .collect();
        cyclic.sort_unstable();
        return Err(invalid_booking(format!(
            "consecutive links form a cycle through {}",
            cyclic.join(", ")
        )));
    }

    Ok(chains)
}

fn check_chain_kinds(chain: &[Sentence]) -> EngineResult<()> {
    let [first, rest @ ..] = chain else {
        return Ok(());
    };
    if rest.is_empty() {
        return Ok(());
    }
    for sentence in chain {
        if !sentence.kind.can_run_consecutively() {
            return Err(invalid_booking(format!(
                "sentence '{}' cannot be served consecutively",
                sentence.id
            )));
        }
        if sentence.kind != first.kind {
            return Err(invalid_booking(format!(
                "sentence '{}' is a different kind from '{}' in the same chain",
                sentence.id, first.id
            )));
        }
    }
    Ok(())
}

fn invalid_booking(message: String) -> EngineError {
    EngineError::InvalidBooking { message }
}

fn insert_latest(
    dates: &mut BTreeMap<ReleaseDateType, NaiveDate>,
    date_type: ReleaseDateType,
    date: NaiveDate,
) {
    dates
        .entry(date_type)
        .and_modify(|existing| *existing = (*existing).max(date))
        .or_insert(date);
}

/// Combines sentence dates into booking dates.
///
/// Each type takes its latest date. SLED counts as both LED and SED, and the
/// pair is folded back into a SLED when the two coincide. HDCED is only kept
/// from the sentence that controls the latest release date.
fn combine_dates(calculations: &[SentenceCalculation]) -> BTreeMap<ReleaseDateType, NaiveDate> {
    use ReleaseDateType::{Hdced, Led, Sed, Sled};

    let mut dates = BTreeMap::new();
    for calculation in calculations {
        for (&date_type, &date) in &calculation.dates {
            match date_type {
                Sled => {
                    insert_latest(&mut dates, Led, date);
                    insert_latest(&mut dates, Sed, date);
                }
                Hdced => {}
                _ => insert_latest(&mut dates, date_type, date),
            }
        }
    }

    if let (Some(led), Some(sed)) = (dates.get(&Led).copied(), dates.get(&Sed).copied()) {
        if led == sed {
            dates.remove(&Led);
            dates.remove(&Sed);
            dates.insert(Sled, led);
        }
    }

    let controlling = calculations
        .iter()
        .filter_map(|calculation| calculation.release_date().map(|date| (date, calculation)))
        .max_by_key(|(date, _)| *date);
    if let Some(hdced) = controlling.and_then(|(_, calculation)| calculation.date(Hdced)) {
        dates.insert(Hdced, hdced);
    }

    dates
}

fn dates_json(dates: &BTreeMap<ReleaseDateType, NaiveDate>) -> serde_json::Value {
    json!(
        dates
            .iter()
            .map(|(date_type, date)| (date_type.code(), date.to_string()))
            .collect::<BTreeMap<_, _>>()
    )
}

fn next_step_number(steps: &[AuditStep]) -> u32 {
    steps.len() as u32 + 1
}

/// Calculates release dates for whole bookings.
///
/// The engine owns the release-point lookup, the calendar and the engine
/// settings. It is `Send + Sync` and cheap to clone; clones share the
/// bank-holiday snapshot.
///
/// # Example
///
/// ```
/// use release_date_engine::calculation::ReleaseDateEngine;
/// use release_date_engine::config::EngineConfig;
/// use release_date_engine::models::{
///     Adjustments, Booking, Duration, Offence, Offender, ReleaseDateType, Sentence, SentenceKind,
/// };
/// use chrono::NaiveDate;
///
/// let date = |y, m, d| NaiveDate::from_ymd_opt(y, m, d).unwrap();
/// let booking = Booking {
///     offender: Offender {
///         reference: "A1234BC".to_string(),
///         date_of_birth: date(1980, 1, 1),
///         is_sex_offender: false,
///     },
///     sentences: vec![Sentence {
///         id: "1".to_string(),
///         sentenced_at: date(2021, 1, 1),
///         duration: Duration::years(5),
///         offence: Offence {
///             code: "TH68001".to_string(),
///             committed_at: date(2020, 6, 1),
///             is_schedule_15_life: false,
///             is_excluded_from_early_release: false,
///         },
///         kind: SentenceKind::StandardDeterminate,
///         is_recall: false,
///         consecutive_to: None,
///         release_date_types: vec![],
///         identification_track: None,
///     }],
///     adjustments: Adjustments::default(),
/// };
///
/// let engine = ReleaseDateEngine::new(EngineConfig::default()).unwrap();
/// let result = engine.calculate_booking(&booking, &[]).unwrap();
///
/// assert_eq!(result.date(ReleaseDateType::Sled), Some(date(2025, 12, 31)));
/// // The CRD falls on a Sunday; the offender is released on the Thursday.
/// assert_eq!(result.date(ReleaseDateType::Crd), Some(date(2023, 7, 2)));
/// assert_eq!(result.non_friday_release.unwrap().date, date(2023, 6, 29));
/// ```
#[derive(Debug, Clone)]
pub struct ReleaseDateEngine {
    settings: EngineSettings,
    calculator: SentenceCalculator,
    calendar: CalendarService,
}

impl ReleaseDateEngine {
    /// Creates an engine from loaded configuration.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::DuplicateTrackConfiguration`] if the release
    /// points configure a track twice.
    pub fn new(config: EngineConfig) -> EngineResult<Self> {
        let lookup = ReleasePointMultiplierLookup::new(config.release_points().clone())?;
        let settings = config.settings().clone();
        let calendar = CalendarService::new(settings.region, config.holidays().clone());
        Ok(Self {
            settings,
            calculator: SentenceCalculator::new(lookup),
            calendar,
        })
    }

    /// Loads configuration from `path` and creates an engine from it.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use release_date_engine::calculation::ReleaseDateEngine;
    ///
    /// let engine = ReleaseDateEngine::from_config_dir("./config")?;
    /// # Ok::<(), release_date_engine::error::EngineError>(())
    /// ```
    pub fn from_config_dir<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        Self::new(ConfigLoader::load(path)?.into_config())
    }

    /// The engine settings.
    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// The calendar used for working-day adjustment.
    pub fn calendar(&self) -> &CalendarService {
        &self.calendar
    }

    /// The per-sentence calculator.
    pub fn calculator(&self) -> &SentenceCalculator {
        &self.calculator
    }

    /// Calculates the release dates for a booking.
    ///
    /// `historic` holds earlier calculation outcomes for the same booking;
    /// later LED, SED or SLED values among them dominate the calculated SLED.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidBooking`] for malformed consecutive links
    /// and [`EngineError::DateOutOfRange`] if a date leaves the supported range.
    pub fn calculate_booking(
        &self,
        booking: &Booking,
        historic: &[CalculationOutcome],
    ) -> EngineResult<BookingCalculation> {
        let start_time = Instant::now();
        let mut steps: Vec<AuditStep> = Vec::new();
        let mut warnings: Vec<AuditWarning> = Vec::new();

        // Chains
        let chains = build_chains(&booking.sentences)?;
        steps.push(AuditStep {
            step_number: next_step_number(&steps),
            rule_id: "consecutive_chains".to_string(),
            rule_name: "Consecutive Chains".to_string(),
            clause_ref: "CJA 2003 s.264".to_string(),
            input: json!({
                "sentence_ids": booking.sentences.iter().map(|s| s.id.as_str()).collect::<Vec<_>>(),
            }),
            output: json!({
                "chains": chains
                    .iter()
                    .map(|chain| chain.iter().map(|s| s.id.as_str()).collect::<Vec<_>>())
                    .collect::<Vec<_>>(),
            }),
            reasoning: format!(
                "{} sentences form {} concurrent terms",
                booking.sentences.len(),
                chains.len()
            ),
        });

        // Per-sentence calculation
        let mut sentence_calculations = Vec::with_capacity(chains.len());
        for chain in chains {
            let mut sentence: Box<dyn CalculableSentence> = match <[Sentence; 1]>::try_from(chain) {
                Ok([single]) => Box::new(single),
                Err(chain) => Box::new(ConsecutiveSentence::new(chain).ok_or_else(|| {
                    invalid_booking("consecutive chain is empty".to_string())
                })?),
            };
            let calculation = self.calculator.calculate(sentence.as_mut(), booking)?;

            if let Some(release) = calculation.release_date() {
                if release < calculation.sentenced_at {
                    warnings.push(AuditWarning {
                        code: "RELEASE_BEFORE_START".to_string(),
                        message: format!(
                            "Release date {} for sentences {} is before the start date {}",
                            release,
                            calculation.sentence_ids.join(", "),
                            calculation.sentenced_at
                        ),
                        severity: "medium".to_string(),
                    });
                }
            }
            sentence_calculations.push(calculation);
        }

        // Booking dates
        let mut dates = combine_dates(&sentence_calculations);
        steps.push(AuditStep {
            step_number: next_step_number(&steps),
            rule_id: "booking_dates".to_string(),
            rule_name: "Booking Dates".to_string(),
            clause_ref: "CJA 2003 s.263".to_string(),
            input: json!({
                "sentence_calculations": sentence_calculations
                    .iter()
                    .map(|c| json!({ "sentence_ids": c.sentence_ids, "dates": dates_json(&c.dates) }))
                    .collect::<Vec<_>>(),
            }),
            output: dates_json(&dates),
            reasoning: "Latest date of each type across concurrent terms".to_string(),
        });

        // Historic reconciliation
        if let Some(calculated_sled) = dates.remove(&ReleaseDateType::Sled) {
            let reconciled = calculate_from_sled(calculated_sled, historic);
            let split = !reconciled.contains_key(&ReleaseDateType::Sled);
            let overridden = reconciled.values().any(|date| *date != calculated_sled);
            if split {
                warnings.push(AuditWarning {
                    code: "HISTORIC_OVERRIDE_SPLIT".to_string(),
                    message: format!(
                        "Historic outcomes split SLED {} into separate LED and SED",
                        calculated_sled
                    ),
                    severity: "high".to_string(),
                });
            } else if overridden {
                warnings.push(AuditWarning {
                    code: "HISTORIC_OVERRIDE_APPLIED".to_string(),
                    message: format!("A later historic SLED replaced {}", calculated_sled),
                    severity: "medium".to_string(),
                });
            }
            steps.push(AuditStep {
                step_number: next_step_number(&steps),
                rule_id: "dominant_historic_date".to_string(),
                rule_name: "Dominant Historic Date".to_string(),
                clause_ref: "Historic calculation outcomes".to_string(),
                input: json!({
                    "calculated_sled": calculated_sled.to_string(),
                    "historic_outcomes": historic.len(),
                }),
                output: dates_json(&reconciled),
                reasoning: if overridden {
                    "A later historic expiry date dominates".to_string()
                } else {
                    "No historic expiry date is later than the calculated SLED".to_string()
                },
            });
            dates.extend(reconciled);
        }

        // Working days
        let mut working_day_adjustments = BTreeMap::new();
        for (&date_type, &date) in &dates {
            let working_day = match date_type {
                ReleaseDateType::Crd | ReleaseDateType::Ard | ReleaseDateType::Npd => {
                    self.calendar.previous_working_day(date)
                }
                ReleaseDateType::Hdced | ReleaseDateType::Ped => {
                    self.calendar.next_working_day(date)
                }
                _ => continue,
            };
            if date_type.is_release_point() && working_day.was_adjusted() {
                warn!(
                    %date_type,
                    %date,
                    working_day = %working_day.date,
                    "release date falls on a non-working day"
                );
            }
            working_day_adjustments.insert(date_type, working_day);
        }
        steps.push(AuditStep {
            step_number: next_step_number(&steps),
            rule_id: "working_days".to_string(),
            rule_name: "Working Day Adjustment".to_string(),
            clause_ref: "Release on a non-working day".to_string(),
            input: json!({ "region": self.calendar.region().division() }),
            output: json!(
                working_day_adjustments
                    .iter()
                    .map(|(date_type, day): (&ReleaseDateType, &WorkingDay)| {
                        (date_type.code(), day.date.to_string())
                    })
                    .collect::<BTreeMap<_, _>>()
            ),
            reasoning: format!(
                "{} of {} dates moved onto a working day",
                working_day_adjustments
                    .values()
                    .filter(|day| day.was_adjusted())
                    .count(),
                working_day_adjustments.len()
            ),
        });

        // Non-Friday release
        let release = dates
            .get(&ReleaseDateType::Crd)
            .or_else(|| dates.get(&ReleaseDateType::Ard))
            .copied();
        let non_friday_release: Option<NonFridayReleaseDay> = match release {
            Some(release) if self.settings.non_friday_release_policy => {
                let day = self.calendar.non_friday_release_date(release);
                steps.push(AuditStep {
                    step_number: next_step_number(&steps),
                    rule_id: "non_friday_release".to_string(),
                    rule_name: "Non-Friday Release".to_string(),
                    clause_ref: "Non-Friday release policy".to_string(),
                    input: json!({ "release_date": release.to_string() }),
                    output: json!({
                        "date": day.date.to_string(),
                        "used_policy": day.used_policy,
                    }),
                    reasoning: if day.used_policy {
                        format!("Release brought forward from {} to {}", release, day.date)
                    } else {
                        "Release day needs no change".to_string()
                    },
                });
                Some(day)
            }
            _ => None,
        };

        let duration_us = start_time.elapsed().as_micros() as u64;
        info!(
            offender = %booking.offender.reference,
            sentences = booking.sentences.len(),
            calculations = sentence_calculations.len(),
            dates = ?dates,
            warnings = warnings.len(),
            duration_us,
            "calculated booking"
        );

        Ok(BookingCalculation {
            calculation_id: Uuid::new_v4(),
            calculated_at: Utc::now(),
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            offender_reference: booking.offender.reference.clone(),
            sentence_calculations,
            dates,
            working_day_adjustments,
            non_friday_release,
            audit_trace: AuditTrace {
                steps,
                warnings,
                duration_us,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::{BankHoliday, HolidaySnapshot, Region};
    use crate::config::ReleasePointConfig;
    use crate::models::{
        Adjustment, AdjustmentType, Adjustments, Duration, Offence, Offender, SentenceKind,
    };
    use ReleaseDateType::{Ard, Crd, Hdced, Led, Sed, Sled, Tused};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn create_test_sentence(
        id: &str,
        sentenced_at: NaiveDate,
        committed_at: NaiveDate,
        duration: Duration,
    ) -> Sentence {
        Sentence {
            id: id.to_string(),
            sentenced_at,
            duration,
            offence: Offence {
                code: "TH68001".to_string(),
                committed_at,
                is_schedule_15_life: false,
                is_excluded_from_early_release: false,
            },
            kind: SentenceKind::StandardDeterminate,
            is_recall: false,
            consecutive_to: None,
            release_date_types: vec![],
            identification_track: None,
        }
    }

    fn create_test_booking(sentences: Vec<Sentence>) -> Booking {
        Booking {
            offender: Offender {
                reference: "A1234BC".to_string(),
                date_of_birth: date(1980, 1, 1),
                is_sex_offender: false,
            },
            sentences,
            adjustments: Adjustments::default(),
        }
    }

    fn create_test_engine() -> ReleaseDateEngine {
        let holidays = HolidaySnapshot::default().with_region(
            Region::EnglandAndWales,
            vec![
                BankHoliday::new("Good Friday", date(2023, 4, 7)),
                BankHoliday::new("Easter Monday", date(2023, 4, 10)),
            ],
        );
        ReleaseDateEngine::new(EngineConfig::new(
            EngineSettings::default(),
            ReleasePointConfig::default(),
            holidays,
        ))
        .unwrap()
    }

    fn five_year_sentence() -> Sentence {
        create_test_sentence("1", date(2021, 1, 1), date(2020, 6, 1), Duration::years(5))
    }

    fn three_year_sentence() -> Sentence {
        create_test_sentence("1", date(2021, 1, 1), date(2020, 6, 1), Duration::years(3))
    }

    fn chain_ids(chains: &[Vec<Sentence>]) -> Vec<Vec<String>> {
        chains
            .iter()
            .map(|chain| chain.iter().map(|s| s.id.clone()).collect())
            .collect()
    }

    fn expect_invalid_booking(result: EngineResult<Vec<Vec<Sentence>>>, fragment: &str) {
        match result {
            Err(EngineError::InvalidBooking { message }) => {
                assert!(message.contains(fragment), "unexpected message: {}", message)
            }
            other => panic!("Expected InvalidBooking, got {:?}", other.map(|c| chain_ids(&c))),
        }
    }

    #[test]
    fn test_build_chains_orders_by_root() {
        let mut second = five_year_sentence();
        second.id = "2".to_string();
        second.consecutive_to = Some("1".to_string());
        let mut third = five_year_sentence();
        third.id = "3".to_string();
        third.consecutive_to = Some("2".to_string());
        let mut other = five_year_sentence();
        other.id = "4".to_string();

        let chains = build_chains(&[third, other, second, five_year_sentence()]).unwrap();
        assert_eq!(
            chain_ids(&chains),
            vec![
                vec!["4".to_string()],
                vec!["1".to_string(), "2".to_string(), "3".to_string()],
            ]
        );
    }

    #[test]
    fn test_build_chains_rejects_duplicate_ids() {
        let result = build_chains(&[five_year_sentence(), five_year_sentence()]);
        expect_invalid_booking(result, "more than once");
    }

    #[test]
    fn test_build_chains_rejects_unknown_predecessor() {
        let mut sentence = five_year_sentence();
        sentence.consecutive_to = Some("missing".to_string());
        expect_invalid_booking(build_chains(&[sentence]), "unknown sentence 'missing'");
    }

    #[test]
    fn test_build_chains_rejects_two_successors() {
        let mut second = five_year_sentence();
        second.id = "2".to_string();
        second.consecutive_to = Some("1".to_string());
        let mut third = five_year_sentence();
        third.id = "3".to_string();
        third.consecutive_to = Some("1".to_string());

        let result = build_chains(&[five_year_sentence(), second, third]);
        expect_invalid_booking(result, "both consecutive to '1'");
    }

    #[test]
    fn test_build_chains_rejects_cycles() {
        let mut first = five_year_sentence();
        first.consecutive_to = Some("2".to_string());
        let mut second = five_year_sentence();
        second.id = "2".to_string();
        second.consecutive_to = Some("1".to_string());

        expect_invalid_booking(build_chains(&[first, second]), "cycle through 1, 2");
    }

    #[test]
    fn test_build_chains_rejects_self_reference() {
        let mut sentence = five_year_sentence();
        sentence.consecutive_to = Some("1".to_string());
        expect_invalid_booking(build_chains(&[sentence]), "cycle");
    }

    #[test]
    fn test_build_chains_rejects_non_chainable_kind() {
        let mut extended = five_year_sentence();
        extended.id = "2".to_string();
        extended.kind = SentenceKind::ExtendedDeterminate {
            extension: Duration::years(4),
        };
        extended.consecutive_to = Some("1".to_string());

        let result = build_chains(&[five_year_sentence(), extended]);
        expect_invalid_booking(result, "cannot be served consecutively");
    }

    #[test]
    fn test_build_chains_rejects_mixed_kinds() {
        let mut fine = five_year_sentence();
        fine.id = "2".to_string();
        fine.kind = SentenceKind::FineDefault;
        fine.consecutive_to = Some("1".to_string());

        let result = build_chains(&[five_year_sentence(), fine]);
        expect_invalid_booking(result, "different kind");
    }

    #[test]
    fn test_single_sentence_booking() {
        let engine = create_test_engine();
        let booking = create_test_booking(vec![three_year_sentence()]);

        let result = engine.calculate_booking(&booking, &[]).unwrap();

        assert_eq!(result.offender_reference, "A1234BC");
        assert_eq!(result.sentence_calculations.len(), 1);
        assert_eq!(
            result.dates,
            BTreeMap::from([
                (Sled, date(2023, 12, 31)),
                (Crd, date(2022, 7, 2)),
                (Hdced, date(2022, 2, 17)),
            ])
        );
        assert_eq!(result.engine_version, env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn test_long_sentence_booking_has_no_hdced() {
        let engine = create_test_engine();
        let booking = create_test_booking(vec![five_year_sentence()]);

        let result = engine.calculate_booking(&booking, &[]).unwrap();

        assert_eq!(
            result.dates,
            BTreeMap::from([(Sled, date(2025, 12, 31)), (Crd, date(2023, 7, 2))])
        );
        assert!(!result.working_day_adjustments.contains_key(&Hdced));
    }

    #[test]
    fn test_release_on_saturday_moves_to_friday_and_thursday() {
        let engine = create_test_engine();
        let booking = create_test_booking(vec![three_year_sentence()]);

        let result = engine.calculate_booking(&booking, &[]).unwrap();

        let crd = result.working_day_adjustments[&Crd];
        assert_eq!(crd.date, date(2022, 7, 1));
        assert!(crd.adjusted_for_weekend);
        assert!(!crd.adjusted_for_bank_holiday);

        // Thursday HDCED stays put.
        let hdced = result.working_day_adjustments[&Hdced];
        assert_eq!(hdced.date, date(2022, 2, 17));
        assert!(!hdced.was_adjusted());

        assert!(!result.working_day_adjustments.contains_key(&Sled));
        assert_eq!(
            result.non_friday_release,
            Some(NonFridayReleaseDay {
                date: date(2022, 6, 30),
                used_policy: true,
            })
        );
    }

    #[test]
    fn test_release_on_sunday_moves_to_friday_and_thursday() {
        let engine = create_test_engine();
        let booking = create_test_booking(vec![five_year_sentence()]);

        let result = engine.calculate_booking(&booking, &[]).unwrap();

        let crd = result.working_day_adjustments[&Crd];
        assert_eq!(crd.date, date(2023, 6, 30));
        assert!(crd.adjusted_for_weekend);
        assert_eq!(result.non_friday_release.map(|r| r.date), Some(date(2023, 6, 29)));
    }

    #[test]
    fn test_easter_monday_release() {
        let engine = create_test_engine();
        let sentence =
            create_test_sentence("1", date(2022, 4, 10), date(2021, 6, 1), Duration::years(2));
        let booking = create_test_booking(vec![sentence]);

        let result = engine.calculate_booking(&booking, &[]).unwrap();

        assert_eq!(result.date(Crd), Some(date(2023, 4, 10)));
        assert_eq!(result.date(Sled), Some(date(2024, 4, 9)));
        assert_eq!(result.date(Hdced), Some(date(2022, 11, 26)));

        let crd = result.working_day_adjustments[&Crd];
        assert_eq!(crd.date, date(2023, 4, 6));
        assert!(crd.adjusted_for_weekend);
        assert!(crd.adjusted_for_bank_holiday);

        // Saturday HDCED moves forward.
        assert_eq!(result.working_day_adjustments[&Hdced].date, date(2022, 11, 28));

        let release = result.non_friday_release.unwrap();
        assert_eq!(release.date, date(2023, 4, 5));
        assert!(release.used_policy);
    }

    #[test]
    fn test_non_friday_policy_disabled() {
        let config = EngineConfig::new(
            EngineSettings {
                region: Region::EnglandAndWales,
                non_friday_release_policy: false,
            },
            ReleasePointConfig::default(),
            HolidaySnapshot::default(),
        );
        let engine = ReleaseDateEngine::new(config).unwrap();
        let booking = create_test_booking(vec![five_year_sentence()]);

        let result = engine.calculate_booking(&booking, &[]).unwrap();

        assert_eq!(result.non_friday_release, None);
        assert!(
            result
                .audit_trace
                .steps
                .iter()
                .all(|step| step.rule_id != "non_friday_release")
        );
    }

    #[test]
    fn test_concurrent_sentences_take_latest_dates() {
        let engine = create_test_engine();
        let short =
            create_test_sentence("1", date(2021, 1, 1), date(2020, 6, 1), Duration::years(2));
        let long =
            create_test_sentence("2", date(2021, 1, 1), date(2020, 6, 1), Duration::years(8));
        let booking = create_test_booking(vec![short, long]);

        let result = engine.calculate_booking(&booking, &[]).unwrap();

        assert_eq!(result.sentence_calculations.len(), 2);
        assert_eq!(
            result.sentence_calculations[0].date(Hdced),
            Some(date(2021, 8, 18))
        );
        // The eight year sentence controls release and has no HDCED.
        assert_eq!(
            result.dates,
            BTreeMap::from([(Sled, date(2028, 12, 31)), (Crd, date(2024, 12, 31))])
        );
    }

    #[test]
    fn test_hdced_taken_from_controlling_sentence() {
        let engine = create_test_engine();
        // Releases earlier but has the later HDCED.
        let short =
            create_test_sentence("1", date(2022, 1, 1), date(2021, 6, 1), Duration::months(10));
        let mut controlling = three_year_sentence();
        controlling.id = "2".to_string();
        let booking = create_test_booking(vec![short, controlling]);

        let result = engine.calculate_booking(&booking, &[]).unwrap();

        let short_calculation = &result.sentence_calculations[0];
        assert_eq!(short_calculation.date(Crd), Some(date(2022, 6, 1)));
        assert_eq!(short_calculation.date(Hdced), Some(date(2022, 3, 17)));

        assert_eq!(result.date(Crd), Some(date(2022, 7, 2)));
        assert_eq!(result.date(Hdced), Some(date(2022, 2, 17)));
    }

    #[test]
    fn test_consecutive_chain_is_one_calculation() {
        let engine = create_test_engine();
        let first = create_test_sentence("1", date(2016, 1, 1), date(2014, 6, 1), Duration::months(8));
        let mut second =
            create_test_sentence("2", date(2016, 1, 1), date(2015, 6, 1), Duration::months(8));
        second.consecutive_to = Some("1".to_string());
        let booking = create_test_booking(vec![second, first]);

        let result = engine.calculate_booking(&booking, &[]).unwrap();

        assert_eq!(result.sentence_calculations.len(), 1);
        assert_eq!(
            result.sentence_calculations[0].sentence_ids,
            vec!["1".to_string(), "2".to_string()]
        );
        assert_eq!(result.date(Sled), Some(date(2017, 4, 30)));
        assert_eq!(result.date(Crd), Some(date(2016, 8, 30)));
        assert_eq!(result.date(Tused), Some(date(2017, 8, 30)));
    }

    #[test]
    fn test_automatic_release_booking_keeps_separate_sed() {
        let engine = create_test_engine();
        let sentence =
            create_test_sentence("1", date(2014, 1, 6), date(2013, 6, 1), Duration::months(6));
        let booking = create_test_booking(vec![sentence]);

        let result = engine.calculate_booking(&booking, &[]).unwrap();

        assert_eq!(
            result.dates,
            BTreeMap::from([
                (Ard, date(2014, 4, 6)),
                (Sed, date(2014, 7, 5)),
                (Hdced, date(2014, 2, 20)),
            ])
        );
        assert_eq!(result.working_day_adjustments[&Ard].date, date(2014, 4, 4));
        assert_eq!(result.non_friday_release.unwrap().date, date(2014, 4, 3));
        assert!(
            result
                .audit_trace
                .steps
                .iter()
                .all(|step| step.rule_id != "dominant_historic_date")
        );
    }

    #[test]
    fn test_historic_sled_dominates() {
        let engine = create_test_engine();
        let booking = create_test_booking(vec![five_year_sentence()]);
        let historic = vec![CalculationOutcome {
            calculation_request_id: 7,
            outcome_date: date(2026, 2, 1),
            calculation_date_type: Sled,
        }];

        let result = engine.calculate_booking(&booking, &historic).unwrap();

        assert_eq!(result.date(Sled), Some(date(2026, 2, 1)));
        let warning = &result.audit_trace.warnings[0];
        assert_eq!(warning.code, "HISTORIC_OVERRIDE_APPLIED");
    }

    #[test]
    fn test_historic_led_splits_booking_sled() {
        let engine = create_test_engine();
        let booking = create_test_booking(vec![five_year_sentence()]);
        let historic = vec![CalculationOutcome {
            calculation_request_id: 7,
            outcome_date: date(2026, 3, 1),
            calculation_date_type: Led,
        }];

        let result = engine.calculate_booking(&booking, &historic).unwrap();

        assert_eq!(result.date(Sled), None);
        assert_eq!(result.date(Led), Some(date(2026, 3, 1)));
        assert_eq!(result.date(Sed), Some(date(2025, 12, 31)));
        assert!(
            result
                .audit_trace
                .warnings
                .iter()
                .any(|w| w.code == "HISTORIC_OVERRIDE_SPLIT" && w.severity == "high")
        );
    }

    #[test]
    fn test_earlier_historic_dates_raise_no_warning() {
        let engine = create_test_engine();
        let booking = create_test_booking(vec![five_year_sentence()]);
        let historic = vec![CalculationOutcome {
            calculation_request_id: 7,
            outcome_date: date(2024, 1, 1),
            calculation_date_type: Sled,
        }];

        let result = engine.calculate_booking(&booking, &historic).unwrap();

        assert_eq!(result.date(Sled), Some(date(2025, 12, 31)));
        assert!(result.audit_trace.warnings.is_empty());
    }

    #[test]
    fn test_release_before_start_is_warned() {
        let engine = create_test_engine();
        let mut booking = create_test_booking(vec![create_test_sentence(
            "1",
            date(2021, 3, 1),
            date(2020, 6, 1),
            Duration::months(6),
        )]);
        booking.adjustments.add(
            AdjustmentType::Remand,
            Adjustment {
                number_of_days: 400,
                applies_from: date(2020, 1, 1),
            },
        );

        let result = engine.calculate_booking(&booking, &[]).unwrap();

        assert!(result.date(Crd).unwrap() < date(2021, 3, 1));
        assert_eq!(result.audit_trace.warnings.len(), 1);
        assert_eq!(result.audit_trace.warnings[0].code, "RELEASE_BEFORE_START");
    }

    #[test]
    fn test_indeterminate_booking_has_no_dates() {
        let engine = create_test_engine();
        let mut sentence = five_year_sentence();
        sentence.kind = SentenceKind::Indeterminate;
        let booking = create_test_booking(vec![sentence]);

        let result = engine.calculate_booking(&booking, &[]).unwrap();

        assert!(result.dates.is_empty());
        assert!(result.working_day_adjustments.is_empty());
        assert_eq!(result.non_friday_release, None);
        assert_eq!(
            result.sentence_calculations[0].release_date_types,
            vec![ReleaseDateType::None]
        );
    }

    #[test]
    fn test_invalid_booking_is_rejected() {
        let engine = create_test_engine();
        let mut sentence = five_year_sentence();
        sentence.consecutive_to = Some("missing".to_string());
        let booking = create_test_booking(vec![sentence]);

        let result = engine.calculate_booking(&booking, &[]);
        assert!(matches!(result, Err(EngineError::InvalidBooking { .. })));
    }

    #[test]
    fn test_audit_steps_are_numbered_in_order() {
        let engine = create_test_engine();
        let booking = create_test_booking(vec![five_year_sentence()]);

        let result = engine.calculate_booking(&booking, &[]).unwrap();

        let rule_ids: Vec<&str> = result
            .audit_trace
            .steps
            .iter()
            .map(|step| step.rule_id.as_str())
            .collect();
        assert_eq!(
            rule_ids,
            vec![
                "consecutive_chains",
                "booking_dates",
                "dominant_historic_date",
                "working_days",
                "non_friday_release",
            ]
        );
        for (index, step) in result.audit_trace.steps.iter().enumerate() {
            assert_eq!(step.step_number, index as u32 + 1);
        }
    }

    #[test]
    fn test_calculations_get_distinct_ids() {
        let engine = create_test_engine();
        let booking = create_test_booking(vec![five_year_sentence()]);

        let first = engine.calculate_booking(&booking, &[]).unwrap();
        let second = engine.calculate_booking(&booking, &[]).unwrap();
        assert_ne!(first.calculation_id, second.calculation_id);
        assert_eq!(first.dates, second.dates);
    }

    #[test]
    fn test_engine_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ReleaseDateEngine>();
    }
}
