//! Working-day and non-Friday release adjustment.
//!
//! This module provides the [`CalendarService`], which moves a raw calculated
//! date onto a day a prison can actually release on.

use std::fmt;
use std::sync::Arc;

use arc_swap::ArcSwap;
use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::day_type::DayType;
use super::holidays::{HolidaySnapshot, Region};

/// A date moved onto a working day.
///
/// # Example
///
/// ```
/// use release_date_engine::calendar::WorkingDay;
/// use chrono::NaiveDate;
///
/// let day = WorkingDay::unadjusted(NaiveDate::from_ymd_opt(2021, 10, 25).unwrap());
/// assert!(!day.was_adjusted());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkingDay {
    /// The resulting working day.
    pub date: NaiveDate,
    /// Whether a weekend day was skipped.
    pub adjusted_for_weekend: bool,
    /// Whether a bank holiday was skipped.
    pub adjusted_for_bank_holiday: bool,
}

impl WorkingDay {
    /// A date that needed no adjustment.
    pub fn unadjusted(date: NaiveDate) -> Self {
        Self {
            date,
            adjusted_for_weekend: false,
            adjusted_for_bank_holiday: false,
        }
    }

    /// Returns true if the date was moved.
    pub fn was_adjusted(&self) -> bool {
        self.adjusted_for_weekend || self.adjusted_for_bank_holiday
    }
}

/// A release day chosen under the non-Friday release policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NonFridayReleaseDay {
    /// The release day.
    pub date: NaiveDate,
    /// Whether the policy moved the date.
    pub used_policy: bool,
}

#[derive(Debug, Clone, Copy)]
enum Direction {
    Forward,
    Backward,
}

impl Direction {
    fn step(self, date: NaiveDate) -> Option<NaiveDate> {
        match self {
            Direction::Forward => date.succ_opt(),
            Direction::Backward => date.pred_opt(),
        }
    }
}

/// Calendar queries against a swappable bank-holiday snapshot.
///
/// The snapshot sits behind an [`ArcSwap`]. Every query loads it once, so a
/// concurrent [`CalendarService::replace_snapshot`] is never observed half
/// applied. Clones share the same snapshot.
///
/// # Example
///
/// ```
/// use release_date_engine::calendar::{CalendarService, HolidaySnapshot, Region};
/// use chrono::NaiveDate;
///
/// let calendar = CalendarService::new(Region::EnglandAndWales, HolidaySnapshot::default());
///
/// // Saturday 23 October 2021 moves to Monday 25 October.
/// let saturday = NaiveDate::from_ymd_opt(2021, 10, 23).unwrap();
/// let working_day = calendar.next_working_day(saturday);
///
/// assert_eq!(working_day.date, NaiveDate::from_ymd_opt(2021, 10, 25).unwrap());
/// assert!(working_day.adjusted_for_weekend);
/// assert!(!working_day.adjusted_for_bank_holiday);
/// ```
#[derive(Clone)]
pub struct CalendarService {
    region: Region,
    snapshot: Arc<ArcSwap<HolidaySnapshot>>,
}

impl CalendarService {
    /// Creates a calendar for `region` over an initial snapshot.
    pub fn new(region: Region, snapshot: HolidaySnapshot) -> Self {
        Self {
            region,
            snapshot: Arc::new(ArcSwap::from_pointee(snapshot)),
        }
    }

    /// The region whose holidays apply.
    pub fn region(&self) -> Region {
        self.region
    }

    /// The current snapshot.
    pub fn snapshot(&self) -> Arc<HolidaySnapshot> {
        self.snapshot.load_full()
    }

    /// Atomically replaces the holiday table.
    pub fn replace_snapshot(&self, snapshot: HolidaySnapshot) {
        info!(
            region = self.region.division(),
            holidays = snapshot.holidays(self.region).len(),
            "replacing bank holiday snapshot"
        );
        self.snapshot.store(Arc::new(snapshot));
    }

    /// Classifies `date` against the current snapshot.
    pub fn day_type(&self, date: NaiveDate) -> DayType {
        self.snapshot.load().day_type(self.region, date)
    }

    /// Returns true if `date` is a bank holiday in the calendar's region.
    pub fn is_bank_holiday(&self, date: NaiveDate) -> bool {
        self.snapshot.load().is_bank_holiday(self.region, date)
    }

    /// The first working day on or after `date`.
    pub fn next_working_day(&self, date: NaiveDate) -> WorkingDay {
        self.step_to_working_day(date, Direction::Forward)
    }

    /// The last working day on or before `date`.
    pub fn previous_working_day(&self, date: NaiveDate) -> WorkingDay {
        self.step_to_working_day(date, Direction::Backward)
    }

    /// Applies the non-Friday release policy to `date`.
    ///
    /// Steps back a day at a time while the candidate is a weekend day, a bank
    /// holiday, a Friday, or the day before a bank holiday.
    ///
    /// # Example
    ///
    /// ```
    /// use release_date_engine::calendar::{BankHoliday, CalendarService, HolidaySnapshot, Region};
    /// use chrono::NaiveDate;
    ///
    /// let date = |d| NaiveDate::from_ymd_opt(2023, 4, d).unwrap();
    /// let snapshot = HolidaySnapshot::default().with_region(
    ///     Region::EnglandAndWales,
    ///     vec![
    ///         BankHoliday::new("Good Friday", date(7)),
    ///         BankHoliday::new("Easter Monday", date(10)),
    ///     ],
    /// );
    /// let calendar = CalendarService::new(Region::EnglandAndWales, snapshot);
    ///
    /// let release = calendar.non_friday_release_date(date(10));
    /// assert_eq!(release.date, date(5));
    /// assert!(release.used_policy);
    /// ```
    pub fn non_friday_release_date(&self, date: NaiveDate) -> NonFridayReleaseDay {
        let snapshot = self.snapshot.load();
        let blocks_release = |candidate: NaiveDate| {
            !snapshot.day_type(self.region, candidate).is_working()
                || candidate.weekday() == Weekday::Fri
                || candidate
                    .succ_opt()
                    .is_some_and(|next| snapshot.is_bank_holiday(self.region, next))
        };

        let mut candidate = date;
        while blocks_release(candidate) {
            match candidate.pred_opt() {
                Some(previous) => candidate = previous,
                None => break,
            }
        }

        if candidate != date {
            debug!(%date, release = %candidate, "non-Friday release policy moved date");
        }
        NonFridayReleaseDay {
            date: candidate,
            used_policy: candidate != date,
        }
    }

    fn step_to_working_day(&self, date: NaiveDate, direction: Direction) -> WorkingDay {
        let snapshot = self.snapshot.load();
        let mut working_day = WorkingDay::unadjusted(date);
        loop {
            match snapshot.day_type(self.region, working_day.date) {
                DayType::Working => break,
                DayType::Weekend => working_day.adjusted_for_weekend = true,
                DayType::BankHoliday => working_day.adjusted_for_bank_holiday = true,
            }
            match direction.step(working_day.date) {
                Some(next) => working_day.date = next,
                None => break,
            }
        }

        if working_day.was_adjusted() {
            debug!(
                %date,
                working_day = %working_day.date,
                ?direction,
                "moved date onto a working day"
            );
        }
        working_day
    }
}

impl fmt::Debug for CalendarService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CalendarService")
            .field("region", &self.region)
            .field("holidays", &self.snapshot.load().holidays(self.region).len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::BankHoliday;
    use proptest::prelude::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn create_test_calendar() -> CalendarService {
        let snapshot = HolidaySnapshot::default().with_region(
            Region::EnglandAndWales,
            vec![
                BankHoliday::new("Good Friday", date(2023, 4, 7)),
                BankHoliday::new("Easter Monday", date(2023, 4, 10)),
                BankHoliday::new("Early May bank holiday", date(2023, 5, 1)),
                BankHoliday::new("Christmas Day", date(2023, 12, 25)),
                BankHoliday::new("Boxing Day", date(2023, 12, 26)),
            ],
        );
        CalendarService::new(Region::EnglandAndWales, snapshot)
    }

    #[test]
    fn test_saturday_moves_to_monday() {
        let calendar = create_test_calendar();
        let result = calendar.next_working_day(date(2021, 10, 23));

        assert_eq!(result.date, date(2021, 10, 25));
        assert!(result.adjusted_for_weekend);
        assert!(!result.adjusted_for_bank_holiday);
    }

    #[test]
    fn test_working_day_is_unchanged() {
        let calendar = create_test_calendar();
        let result = calendar.next_working_day(date(2021, 10, 21));

        assert_eq!(result, WorkingDay::unadjusted(date(2021, 10, 21)));
    }

    #[test]
    fn test_next_working_day_skips_weekend_and_bank_holiday() {
        let calendar = create_test_calendar();
        // Christmas Day 2023 is a Monday; Boxing Day follows.
        let result = calendar.next_working_day(date(2023, 12, 23));

        assert_eq!(result.date, date(2023, 12, 27));
        assert!(result.adjusted_for_weekend);
        assert!(result.adjusted_for_bank_holiday);
    }

    #[test]
    fn test_previous_working_day_over_easter() {
        let calendar = create_test_calendar();
        let result = calendar.previous_working_day(date(2023, 4, 10));

        assert_eq!(result.date, date(2023, 4, 6));
        assert!(result.adjusted_for_weekend);
        assert!(result.adjusted_for_bank_holiday);
    }

    #[test]
    fn test_non_friday_release_over_easter() {
        let calendar = create_test_calendar();
        let result = calendar.non_friday_release_date(date(2023, 4, 10));

        assert_eq!(result.date, date(2023, 4, 5));
        assert!(result.used_policy);
    }

    #[test]
    fn test_non_friday_release_plain_thursday_unchanged() {
        let calendar = create_test_calendar();
        let result = calendar.non_friday_release_date(date(2021, 10, 21));

        assert_eq!(result.date, date(2021, 10, 21));
        assert!(!result.used_policy);
    }

    #[test]
    fn test_non_friday_release_moves_friday_to_thursday() {
        let calendar = create_test_calendar();
        let result = calendar.non_friday_release_date(date(2021, 10, 22));

        assert_eq!(result.date, date(2021, 10, 21));
        assert!(result.used_policy);
    }

    #[test]
    fn test_non_friday_release_avoids_day_before_bank_holiday() {
        let calendar = create_test_calendar();
        // Friday 28 April, then the weekend before the May bank holiday.
        let result = calendar.non_friday_release_date(date(2023, 4, 30));

        assert_eq!(result.date, date(2023, 4, 27));
        assert!(result.used_policy);
    }

    #[test]
    fn test_replace_snapshot_is_seen_by_clones() {
        let calendar = create_test_calendar();
        let shared = calendar.clone();
        let coronation = date(2023, 5, 8);
        assert!(!shared.is_bank_holiday(coronation));

        calendar.replace_snapshot(HolidaySnapshot::default().with_region(
            Region::EnglandAndWales,
            vec![BankHoliday::new("Coronation of King Charles III", coronation)],
        ));

        assert!(shared.is_bank_holiday(coronation));
        assert!(!shared.is_bank_holiday(date(2023, 4, 10)));
        assert_eq!(shared.day_type(coronation), DayType::BankHoliday);
    }

    fn arb_date() -> impl Strategy<Value = NaiveDate> {
        (0i64..3650).prop_map(|offset| date(2020, 1, 1) + chrono::Duration::days(offset))
    }

    proptest! {
        #[test]
        fn prop_next_working_day_is_working_and_not_earlier(day in arb_date()) {
            let calendar = create_test_calendar();
            let result = calendar.next_working_day(day);
            prop_assert!(result.date >= day);
            prop_assert!(calendar.day_type(result.date).is_working());
            prop_assert_eq!(result.was_adjusted(), result.date != day);
        }

        #[test]
        fn prop_previous_working_day_is_working_and_not_later(day in arb_date()) {
            let calendar = create_test_calendar();
            let result = calendar.previous_working_day(day);
            prop_assert!(result.date <= day);
            prop_assert!(calendar.day_type(result.date).is_working());
        }

        #[test]
        fn prop_non_friday_release_is_never_a_friday(day in arb_date()) {
            let calendar = create_test_calendar();
            let result = calendar.non_friday_release_date(day);
            prop_assert!(result.date <= day);
            prop_assert_ne!(result.date.weekday(), Weekday::Fri);
            prop_assert!(calendar.day_type(result.date).is_working());
            prop_assert_eq!(result.used_policy, result.date != day);
        }
    }
}
