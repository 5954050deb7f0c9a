//! Dominant historic date reconciliation.
//!
//! Earlier calculations, including manual overrides held by legacy systems,
//! may record a licence or sentence expiry later than the one just
//! calculated. The later date dominates. LED and SED are reconciled
//! separately, so an override in only one of them splits a combined SLED.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use tracing::warn;

use crate::models::{CalculationOutcome, ReleaseDateType};

/// Returns `other` if present and strictly after `base`, otherwise `base`.
///
/// # Example
///
/// ```
/// use release_date_engine::calculation::latest_of;
/// use chrono::NaiveDate;
///
/// let base = NaiveDate::from_ymd_opt(2021, 1, 2).unwrap();
/// let earlier = NaiveDate::from_ymd_opt(2021, 1, 1).unwrap();
/// let later = NaiveDate::from_ymd_opt(2021, 1, 3).unwrap();
///
/// assert_eq!(latest_of(base, None), base);
/// assert_eq!(latest_of(base, Some(earlier)), base);
/// assert_eq!(latest_of(base, Some(later)), later);
/// ```
pub fn latest_of(base: NaiveDate, other: Option<NaiveDate>) -> NaiveDate {
    match other {
        Some(other) if other > base => other,
        _ => base,
    }
}

fn latest_outcome(outcomes: &[CalculationOutcome], types: [ReleaseDateType; 2]) -> Option<NaiveDate> {
    outcomes
        .iter()
        .filter(|outcome| types.contains(&outcome.calculation_date_type))
        .map(|outcome| outcome.outcome_date)
        .max()
}

/// Reconciles a calculated SLED with historic outcomes.
///
/// Returns either a single SLED entry or an LED and SED pair, never both.
/// Outcomes of types other than LED, SED and SLED are ignored.
///
/// # Example
///
/// ```
/// use release_date_engine::calculation::calculate_from_sled;
/// use release_date_engine::models::{CalculationOutcome, ReleaseDateType};
/// use chrono::NaiveDate;
///
/// let date = |d| NaiveDate::from_ymd_opt(2021, 1, d).unwrap();
/// let historic = vec![
///     CalculationOutcome {
///         calculation_request_id: 1,
///         outcome_date: date(1),
///         calculation_date_type: ReleaseDateType::Sled,
///     },
///     CalculationOutcome {
///         calculation_request_id: 1,
///         outcome_date: date(1),
///         calculation_date_type: ReleaseDateType::Led,
///     },
/// ];
///
/// let result = calculate_from_sled(date(2), &historic);
/// assert_eq!(result.len(), 1);
/// assert_eq!(result.get(&ReleaseDateType::Sled), Some(&date(2)));
/// ```
pub fn calculate_from_sled(
    calculated_sled: NaiveDate,
    historic: &[CalculationOutcome],
) -> BTreeMap<ReleaseDateType, NaiveDate> {
    let dominant_led = latest_of(
        calculated_sled,
        latest_outcome(historic, [ReleaseDateType::Led, ReleaseDateType::Sled]),
    );
    let dominant_sed = latest_of(
        calculated_sled,
        latest_outcome(historic, [ReleaseDateType::Sed, ReleaseDateType::Sled]),
    );

    if dominant_led == dominant_sed {
        BTreeMap::from([(ReleaseDateType::Sled, dominant_led)])
    } else {
        warn!(
            %calculated_sled,
            led = %dominant_led,
            sed = %dominant_sed,
            "historic override splits SLED into LED and SED"
        );
        BTreeMap::from([
            (ReleaseDateType::Led, dominant_led),
            (ReleaseDateType::Sed, dominant_sed),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn outcome(date_type: ReleaseDateType, outcome_date: NaiveDate) -> CalculationOutcome {
        CalculationOutcome {
            calculation_request_id: 1,
            outcome_date,
            calculation_date_type: date_type,
        }
    }

    #[test]
    fn test_earlier_historic_dates_do_not_override() {
        let historic = vec![
            outcome(ReleaseDateType::Sled, date(2021, 1, 1)),
            outcome(ReleaseDateType::Led, date(2021, 1, 1)),
        ];
        let result = calculate_from_sled(date(2021, 1, 2), &historic);
        assert_eq!(result, BTreeMap::from([(ReleaseDateType::Sled, date(2021, 1, 2))]));
    }

    #[test]
    fn test_no_history_keeps_calculated_sled() {
        let result = calculate_from_sled(date(2021, 1, 2), &[]);
        assert_eq!(result, BTreeMap::from([(ReleaseDateType::Sled, date(2021, 1, 2))]));
    }

    #[test]
    fn test_later_historic_sled_overrides_both() {
        let historic = vec![outcome(ReleaseDateType::Sled, date(2021, 3, 1))];
        let result = calculate_from_sled(date(2021, 1, 2), &historic);
        assert_eq!(result, BTreeMap::from([(ReleaseDateType::Sled, date(2021, 3, 1))]));
    }

    #[test]
    fn test_later_led_splits_sled() {
        let historic = vec![outcome(ReleaseDateType::Led, date(2021, 3, 1))];
        let result = calculate_from_sled(date(2021, 1, 2), &historic);
        assert_eq!(
            result,
            BTreeMap::from([
                (ReleaseDateType::Led, date(2021, 3, 1)),
                (ReleaseDateType::Sed, date(2021, 1, 2)),
            ])
        );
    }

    #[test]
    fn test_later_sed_splits_sled() {
        let historic = vec![
            outcome(ReleaseDateType::Sed, date(2021, 5, 1)),
            outcome(ReleaseDateType::Led, date(2021, 2, 1)),
        ];
        let result = calculate_from_sled(date(2021, 1, 2), &historic);
        assert_eq!(
            result,
            BTreeMap::from([
                (ReleaseDateType::Led, date(2021, 2, 1)),
                (ReleaseDateType::Sed, date(2021, 5, 1)),
            ])
        );
    }

    #[test]
    fn test_matching_led_and_sed_overrides_recombine() {
        let historic = vec![
            outcome(ReleaseDateType::Led, date(2021, 4, 1)),
            outcome(ReleaseDateType::Sed, date(2021, 4, 1)),
        ];
        let result = calculate_from_sled(date(2021, 1, 2), &historic);
        assert_eq!(result, BTreeMap::from([(ReleaseDateType::Sled, date(2021, 4, 1))]));
    }

    #[test]
    fn test_other_date_types_are_ignored() {
        let historic = vec![
            outcome(ReleaseDateType::Crd, date(2030, 1, 1)),
            outcome(ReleaseDateType::Hdced, date(2030, 1, 1)),
            outcome(ReleaseDateType::Ped, date(2030, 1, 1)),
        ];
        let result = calculate_from_sled(date(2021, 1, 2), &historic);
        assert_eq!(result, BTreeMap::from([(ReleaseDateType::Sled, date(2021, 1, 2))]));
    }

    fn arb_date() -> impl Strategy<Value = NaiveDate> {
        (0i64..2000).prop_map(|offset| date(2020, 1, 1) + chrono::Duration::days(offset))
    }

    fn arb_outcome() -> impl Strategy<Value = CalculationOutcome> {
        let date_type = prop_oneof![
            Just(ReleaseDateType::Led),
            Just(ReleaseDateType::Sed),
            Just(ReleaseDateType::Sled),
            Just(ReleaseDateType::Crd),
            Just(ReleaseDateType::Hdced),
        ];
        (date_type, arb_date(), 1i64..100).prop_map(|(date_type, outcome_date, id)| {
            CalculationOutcome {
                calculation_request_id: id,
                outcome_date,
                calculation_date_type: date_type,
            }
        })
    }

    proptest! {
        #[test]
        fn prop_latest_of_laws(base in arb_date(), other in arb_date()) {
            prop_assert_eq!(latest_of(base, None), base);
            let latest = latest_of(base, Some(other));
            prop_assert_eq!(latest, base.max(other));
        }

        #[test]
        fn prop_never_sled_with_led_or_sed(
            calculated in arb_date(),
            historic in prop::collection::vec(arb_outcome(), 0..8),
        ) {
            let result = calculate_from_sled(calculated, &historic);
            let has_sled = result.contains_key(&ReleaseDateType::Sled);
            let has_led = result.contains_key(&ReleaseDateType::Led);
            let has_sed = result.contains_key(&ReleaseDateType::Sed);
            prop_assert!(has_sled != (has_led || has_sed));
            prop_assert_eq!(has_led, has_sed);
            prop_assert!(result.values().all(|date| *date >= calculated));
        }
    }
}
