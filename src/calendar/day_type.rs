//! Day classification for release-day rules.
//!
//! This module provides [`DayType`], the classification the calendar service
//! uses to decide whether a date is a working day.

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

/// Represents the type of day for release purposes.
///
/// Prisons do not release on weekends or bank holidays, so only
/// [`DayType::Working`] days are valid release days.
///
/// # Example
///
/// ```
/// use release_date_engine::calendar::DayType;
///
/// let day_type = DayType::Weekend;
/// assert_eq!(format!("{:?}", day_type), "Weekend");
/// assert!(!day_type.is_working());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayType {
    /// Monday to Friday and not a bank holiday.
    Working,
    /// Saturday or Sunday.
    Weekend,
    /// A bank holiday in the calendar's region.
    BankHoliday,
}

impl DayType {
    /// Returns true for days on which a release can take place.
    pub fn is_working(&self) -> bool {
        matches!(self, DayType::Working)
    }
}

impl std::fmt::Display for DayType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DayType::Working => write!(f, "Working day"),
            DayType::Weekend => write!(f, "Weekend"),
            DayType::BankHoliday => write!(f, "Bank holiday"),
        }
    }
}

/// Returns true if `date` falls on a Saturday or Sunday.
///
/// # Example
///
/// ```
/// use release_date_engine::calendar::is_weekend;
/// use chrono::NaiveDate;
///
/// // 2021-10-23 is a Saturday
/// assert!(is_weekend(NaiveDate::from_ymd_opt(2021, 10, 23).unwrap()));
/// // 2021-10-25 is a Monday
/// assert!(!is_weekend(NaiveDate::from_ymd_opt(2021, 10, 25).unwrap()));
/// ```
pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}
