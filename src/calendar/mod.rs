//! Calendar service for release-day adjustment.
//!
//! This module owns the bank-holiday tables and the rules that move a
//! calculated date onto a day a prison can release on: the next or previous
//! working day, and the non-Friday release policy.

mod day_type;
mod holidays;
mod service;

pub use day_type::{DayType, is_weekend};
pub use holidays::{BankHoliday, HolidaySnapshot, Region};
pub use service::{CalendarService, NonFridayReleaseDay, WorkingDay};
