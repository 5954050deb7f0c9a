//! Sentence durations expressed in calendar units.
//!
//! Durations are never converted to an average number of days: months and years
//! are added to a start date with calendar rules, so "6 months from 31 August"
//! lands on the last day of February exactly as a court would read it.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};

/// A calendar unit a sentence term can be expressed in.
///
/// The derived ordering (`Days < Weeks < Months < Years`) is the canonical
/// iteration order; aggregation walks it in reverse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalendarUnit {
    /// Whole days.
    Days,
    /// Whole weeks (7 days).
    Weeks,
    /// Calendar months.
    Months,
    /// Calendar years (12 calendar months).
    Years,
}

impl CalendarUnit {
    /// All units in canonical descending order (years first).
    pub const DESCENDING: [CalendarUnit; 4] = [
        CalendarUnit::Years,
        CalendarUnit::Months,
        CalendarUnit::Weeks,
        CalendarUnit::Days,
    ];

    /// Short suffix used when printing components, e.g. `3w`.
    pub fn suffix(&self) -> &'static str {
        match self {
            CalendarUnit::Days => "d",
            CalendarUnit::Weeks => "w",
            CalendarUnit::Months => "m",
            CalendarUnit::Years => "y",
        }
    }
}

/// A sentence term: an ordered mapping from calendar unit to magnitude.
///
/// Units that are absent read as zero. Explicitly constructed zero components
/// are kept, so `Duration::days(0)` is not equal to `Duration::new()`.
///
/// # Example
///
/// ```
/// use release_date_engine::models::{CalendarUnit, Duration};
///
/// let term = Duration::years(2).with(CalendarUnit::Months, 6);
/// assert_eq!(term.get(CalendarUnit::Years), 2);
/// assert_eq!(term.get(CalendarUnit::Months), 6);
/// assert_eq!(term.get(CalendarUnit::Days), 0);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Duration {
    components: BTreeMap<CalendarUnit, u32>,
}

impl Duration {
    /// Creates an empty duration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a duration of `n` days.
    pub fn days(n: u32) -> Self {
        Self::new().with(CalendarUnit::Days, n)
    }

    /// Creates a duration of `n` weeks.
    pub fn weeks(n: u32) -> Self {
        Self::new().with(CalendarUnit::Weeks, n)
    }

    /// Creates a duration of `n` months.
    pub fn months(n: u32) -> Self {
        Self::new().with(CalendarUnit::Months, n)
    }

    /// Creates a duration of `n` years.
    pub fn years(n: u32) -> Self {
        Self::new().with(CalendarUnit::Years, n)
    }

    /// Returns a copy with `unit` set to `magnitude`.
    pub fn with(mut self, unit: CalendarUnit, magnitude: u32) -> Self {
        self.components.insert(unit, magnitude);
        self
    }

    /// Returns the magnitude stored for `unit`, zero when absent.
    pub fn get(&self, unit: CalendarUnit) -> u32 {
        self.components.get(&unit).copied().unwrap_or(0)
    }

    /// Returns true when every present unit has zero magnitude.
    pub fn is_zero(&self) -> bool {
        self.components.values().all(|magnitude| *magnitude == 0)
    }

    /// Present components in canonical descending order (years first).
    pub fn descending(&self) -> impl Iterator<Item = DurationComponent> + '_ {
        self.components
            .iter()
            .rev()
            .map(|(unit, magnitude)| DurationComponent::new(*unit, *magnitude))
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.descending().map(|c| c.to_string()).collect();
        write!(f, "[{}]", parts.join(", "))
    }
}

/// One step of an aggregated duration: a magnitude in a single unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DurationComponent {
    /// The calendar unit.
    pub unit: CalendarUnit,
    /// The number of units.
    pub magnitude: u32,
}

impl DurationComponent {
    /// Creates a component.
    pub fn new(unit: CalendarUnit, magnitude: u32) -> Self {
        Self { unit, magnitude }
    }

    /// Adds this component to `date` using calendar rules.
    ///
    /// Months and years clamp to the end of shorter months (31 January plus
    /// one month is 28 or 29 February). Returns `None` when the result is out
    /// of chrono's range.
    pub fn add_to(&self, date: NaiveDate) -> Option<NaiveDate> {
        match self.unit {
            CalendarUnit::Days => date.checked_add_days(Days::new(u64::from(self.magnitude))),
            CalendarUnit::Weeks => {
                date.checked_add_days(Days::new(u64::from(self.magnitude) * 7))
            }
            CalendarUnit::Months => date.checked_add_months(Months::new(self.magnitude)),
            CalendarUnit::Years => self
                .magnitude
                .checked_mul(12)
                .and_then(|months| date.checked_add_months(Months::new(months))),
        }
    }
}

impl fmt::Display for DurationComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.magnitude, self.unit.suffix())
    }
}
