//! Duration aggregation for consecutive sentences.
//!
//! This module combines the terms of a chain of consecutive sentences into a
//! single ordered list of [`DurationComponent`]s and adds such a list to a start
//! date.
//!
//! Aggregation only merges components that sit next to each other. Two spans of
//! weeks either side of a span of months stay separate, because adding
//! `3w + 4m + 3w` to a date is not the same as adding `6w + 4m`.

use chrono::NaiveDate;

use crate::error::{EngineError, EngineResult};
use crate::models::{Duration, DurationComponent};

/// Aggregates the durations of a consecutive chain.
///
/// Each duration is flattened in canonical descending order (years, months,
/// weeks, days) and adjacent components of the same unit are then summed.
///
/// # Arguments
///
/// * `durations` - The chain's terms in serving order
///
/// # Returns
///
/// The combined components in the order they must be added to the start date.
/// An empty chain yields an empty list.
///
/// # Example
///
/// ```
/// use release_date_engine::calculation::aggregate;
/// use release_date_engine::models::{CalendarUnit, Duration, DurationComponent};
///
/// let chain = vec![
///     Duration::weeks(3),
///     Duration::months(4),
///     Duration::months(5),
///     Duration::weeks(3),
///     Duration::months(3),
///     Duration::months(4),
/// ];
///
/// assert_eq!(
///     aggregate(&chain),
///     vec![
///         DurationComponent::new(CalendarUnit::Weeks, 3),
///         DurationComponent::new(CalendarUnit::Months, 9),
///         DurationComponent::new(CalendarUnit::Weeks, 3),
///         DurationComponent::new(CalendarUnit::Months, 7),
///     ]
/// );
/// ```
pub fn aggregate(durations: &[Duration]) -> Vec<DurationComponent> {
    merge_adjacent(durations.iter().flat_map(|duration| duration.descending()))
}

/// Run-length merges adjacent components that share a unit.
///
/// Components separated by a different unit are never merged.
pub fn merge_adjacent<I>(components: I) -> Vec<DurationComponent>
where
    I: IntoIterator<Item = DurationComponent>,
{
    let mut merged: Vec<DurationComponent> = Vec::new();
    for component in components {
        match merged.last_mut() {
            Some(last) if last.unit == component.unit => {
                last.magnitude = last.magnitude.saturating_add(component.magnitude);
            }
            _ => merged.push(component),
        }
    }
    merged
}

/// Adds components to `start` one at a time, in order.
///
/// # Errors
///
/// Returns [`EngineError::DateOutOfRange`] if the result cannot be represented.
pub fn add_components(start: NaiveDate, components: &[DurationComponent]) -> EngineResult<NaiveDate> {
    components.iter().try_fold(start, |date, component| {
        component
            .add_to(date)
            .ok_or_else(|| EngineError::DateOutOfRange {
                date: start,
                message: format!("adding {}", component),
            })
    })
}

/// Number of days covered by `components` when served from `start`.
pub fn length_in_days(start: NaiveDate, components: &[DurationComponent]) -> EngineResult<i64> {
    let end = add_components(start, components)?;
    Ok((end - start).num_days())
}
