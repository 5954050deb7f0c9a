//! Bank holiday tables.
//!
//! A [`HolidaySnapshot`] is an immutable table of bank holidays per
//! [`Region`]. Snapshots are built in code or parsed from the GOV.UK
//! bank-holidays document and are swapped whole, never edited in place.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::de::value::{Error as ValueError, StrDeserializer};
use serde::de::IntoDeserializer;
use serde::{Deserialize, Serialize};

use super::day_type::{DayType, is_weekend};

/// A UK bank-holiday division.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Region {
    /// England and Wales.
    EnglandAndWales,
    /// Scotland.
    Scotland,
    /// Northern Ireland.
    NorthernIreland,
}

impl Region {
    /// The division name used by the GOV.UK document.
    pub fn division(&self) -> &'static str {
        match self {
            Region::EnglandAndWales => "england-and-wales",
            Region::Scotland => "scotland",
            Region::NorthernIreland => "northern-ireland",
        }
    }

    /// Looks a region up by its GOV.UK division name.
    ///
    /// Division names are the serialized region names.
    pub fn from_division(division: &str) -> Option<Self> {
        let deserializer: StrDeserializer<'_, ValueError> = division.into_deserializer();
        Self::deserialize(deserializer).ok()
    }
}

/// A single named bank holiday.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankHoliday {
    /// The holiday's name, e.g. "Easter Monday".
    pub title: String,
    /// The date the holiday is observed.
    pub date: NaiveDate,
}

impl BankHoliday {
    /// Creates a bank holiday.
    pub fn new(title: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            title: title.into(),
            date,
        }
    }
}

/// Bank holidays per region, each list ordered by date.
///
/// # Example
///
/// ```
/// use release_date_engine::calendar::{BankHoliday, HolidaySnapshot, Region};
/// use chrono::NaiveDate;
///
/// let easter_monday = NaiveDate::from_ymd_opt(2023, 4, 10).unwrap();
/// let snapshot = HolidaySnapshot::default().with_region(
///     Region::EnglandAndWales,
///     vec![BankHoliday::new("Easter Monday", easter_monday)],
/// );
///
/// assert!(snapshot.is_bank_holiday(Region::EnglandAndWales, easter_monday));
/// assert!(!snapshot.is_bank_holiday(Region::Scotland, easter_monday));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HolidaySnapshot {
    regions: BTreeMap<Region, Vec<BankHoliday>>,
}

#[derive(Debug, Deserialize)]
struct GovUkDivision {
    events: Vec<BankHoliday>,
}

impl HolidaySnapshot {
    /// Returns the snapshot with `region`'s holidays replaced.
    ///
    /// Holidays are sorted by date and duplicate dates are dropped.
    pub fn with_region(mut self, region: Region, mut holidays: Vec<BankHoliday>) -> Self {
        holidays.sort_by_key(|holiday| holiday.date);
        holidays.dedup_by_key(|holiday| holiday.date);
        self.regions.insert(region, holidays);
        self
    }

    /// Parses the GOV.UK bank-holidays JSON document.
    ///
    /// Each top-level key is a division holding an `events` list of
    /// `{title, date, ...}` objects. Divisions the engine does not know are
    /// skipped and unknown event fields are ignored.
    ///
    /// # Errors
    ///
    /// Returns the JSON error if the document does not have that shape.
    pub fn from_gov_uk_json(json: &str) -> serde_json::Result<Self> {
        let divisions: BTreeMap<String, GovUkDivision> = serde_json::from_str(json)?;
        let snapshot = divisions
            .into_iter()
            .filter_map(|(division, body)| {
                Region::from_division(&division).map(|region| (region, body.events))
            })
            .fold(Self::default(), |snapshot, (region, events)| {
                snapshot.with_region(region, events)
            });
        Ok(snapshot)
    }

    /// The holidays for `region`, ordered by date.
    pub fn holidays(&self, region: Region) -> &[BankHoliday] {
        self.regions
            .get(&region)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Returns true if `date` is a bank holiday in `region`.
    pub fn is_bank_holiday(&self, region: Region, date: NaiveDate) -> bool {
        self.holidays(region)
            .binary_search_by_key(&date, |holiday| holiday.date)
            .is_ok()
    }

    /// Classifies `date` for `region`. Weekends take precedence over holidays.
    pub fn day_type(&self, region: Region, date: NaiveDate) -> DayType {
        if is_weekend(date) {
            DayType::Weekend
        } else if self.is_bank_holiday(region, date) {
            DayType::BankHoliday
        } else {
            DayType::Working
        }
    }

    /// Total number of holidays across all regions.
    pub fn len(&self) -> usize {
        self.regions.values().map(Vec::len).sum()
    }

    /// Returns true if the snapshot holds no holidays.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
