//! Offender model.
//!
//! This module defines the [`Offender`] struct carrying the personal attributes
//! sentence identification depends on.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Age below which an offender is treated as a young offender.
pub const ADULT_AGE: u32 = 18;

/// Represents the person a booking's sentences were imposed on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Offender {
    /// The offender reference from the source record system.
    pub reference: String,
    /// The offender's date of birth.
    pub date_of_birth: NaiveDate,
    /// Whether the offender is subject to sex offender notification.
    #[serde(default)]
    pub is_sex_offender: bool,
}

impl Offender {
    /// Returns the offender's age in whole years on `date`.
    ///
    /// A date before the date of birth yields zero.
    ///
    /// # Examples
    ///
    /// ```
    /// use release_date_engine::models::Offender;
    /// use chrono::NaiveDate;
    ///
    /// let offender = Offender {
    ///     reference: "A1234AA".to_string(),
    ///     date_of_birth: NaiveDate::from_ymd_opt(2005, 6, 15).unwrap(),
    ///     is_sex_offender: false,
    /// };
    /// assert_eq!(offender.age_on(NaiveDate::from_ymd_opt(2023, 6, 14).unwrap()), 17);
    /// assert_eq!(offender.age_on(NaiveDate::from_ymd_opt(2023, 6, 15).unwrap()), 18);
    /// ```
    pub fn age_on(&self, date: NaiveDate) -> u32 {
        date.years_since(self.date_of_birth).unwrap_or(0)
    }

    /// Returns true if the offender was under 18 on `date`.
    pub fn is_under_eighteen_on(&self, date: NaiveDate) -> bool {
        self.age_on(date) < ADULT_AGE
    }
}
