//! Day adjustments applied to calculated dates.
//!
//! This module contains the [`Adjustment`] and [`Adjustments`] types. Remand and
//! tagged bail are deducted from a sentence; time unlawfully at large and
//! additional days awarded are added to it.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A kind of day adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AdjustmentType {
    /// Time spent on remand in custody.
    Remand,
    /// Time spent on bail subject to a qualifying electronically monitored curfew.
    TaggedBail,
    /// Time spent unlawfully at large.
    UnlawfullyAtLarge,
    /// Additional days awarded for offences against prison discipline.
    AdditionalDaysAwarded,
    /// Additional days restored (remitted) after being awarded.
    RestorationOfAdditionalDaysAwarded,
}

impl AdjustmentType {
    /// Adjustments credited against the sentence before it starts.
    pub const DEDUCTIONS: [AdjustmentType; 2] =
        [AdjustmentType::Remand, AdjustmentType::TaggedBail];

    /// Returns true for adjustments that shorten the sentence.
    pub fn is_deduction(&self) -> bool {
        Self::DEDUCTIONS.contains(self)
    }
}

/// A single day adjustment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Adjustment {
    /// Number of days; always counted in the direction of the adjustment type.
    pub number_of_days: i64,
    /// The date from which the adjustment applies.
    pub applies_from: NaiveDate,
}

/// All adjustments for a booking, keyed by type.
///
/// # Example
///
/// ```
/// use release_date_engine::models::{Adjustment, AdjustmentType, Adjustments};
/// use chrono::NaiveDate;
///
/// let mut adjustments = Adjustments::default();
/// adjustments.add(
///     AdjustmentType::Remand,
///     Adjustment {
///         number_of_days: 20,
///         applies_from: NaiveDate::from_ymd_opt(2021, 1, 1).unwrap(),
///     },
/// );
/// let total = adjustments.total(&[AdjustmentType::Remand], |_| true);
/// assert_eq!(total, 20);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Adjustments {
    by_type: BTreeMap<AdjustmentType, Vec<Adjustment>>,
}

impl Adjustments {
    /// Adds an adjustment of the given type.
    pub fn add(&mut self, adjustment_type: AdjustmentType, adjustment: Adjustment) {
        self.by_type
            .entry(adjustment_type)
            .or_default()
            .push(adjustment);
    }

    /// Returns the adjustments recorded for a type, in insertion order.
    pub fn get(&self, adjustment_type: AdjustmentType) -> &[Adjustment] {
        self.by_type
            .get(&adjustment_type)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Sums the days of the given types for adjustments accepted by `applies`.
    pub fn total<F>(&self, types: &[AdjustmentType], applies: F) -> i64
    where
        F: Fn(&Adjustment) -> bool,
    {
        types
            .iter()
            .flat_map(|adjustment_type| self.get(*adjustment_type))
            .filter(|adjustment| applies(adjustment))
            .map(|adjustment| adjustment.number_of_days)
            .sum()
    }

    /// Returns true if no adjustments are recorded.
    pub fn is_empty(&self) -> bool {
        self.by_type.values().all(Vec::is_empty)
    }
}
