//! Sentence identification.
//!
//! Identification decides which release dates a sentence produces and which
//! legal track governs its release. A sentence is classified along three axes:
//! the legislative era it falls under, its length bucket, and category flags
//! describing the offender and offence. The decision itself is a table over
//! those axes, so a new era is a new set of rows rather than a new branch.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::{
    CalculableSentence, CalendarUnit, DurationComponent, Identification, Offender, ReleaseDateType,
    SentenceIdentificationTrack, SentenceKind,
};

use super::duration_aggregator::add_components;

/// The date a piece of legislation took effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Commencement {
    year: i32,
    month: u32,
    day: u32,
}

impl Commencement {
    const fn new(year: i32, month: u32, day: u32) -> Self {
        Self { year, month, day }
    }

    /// The commencement date.
    pub fn date(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, self.day)
    }

    /// Returns true if `date` is on or after commencement.
    pub fn is_in_force_on(&self, date: NaiveDate) -> bool {
        self.date().is_some_and(|commencement| date >= commencement)
    }
}

impl fmt::Display for Commencement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

/// Criminal Justice Act 2003 release provisions (offence date).
pub const CJA_2003_COMMENCEMENT: Commencement = Commencement::new(2005, 4, 4);
/// Legal Aid, Sentencing and Punishment of Offenders Act 2012 (sentence date).
pub const LASPO_COMMENCEMENT: Commencement = Commencement::new(2012, 12, 3);
/// Offender Rehabilitation Act 2014 (offence date).
pub const ORA_COMMENCEMENT: Commencement = Commencement::new(2015, 2, 1);
/// Automatic release of extended sentences abolished (sentence date).
pub const EDS_AUTOMATIC_RELEASE_ABOLISHED: Commencement = Commencement::new(2015, 4, 13);
/// Two-thirds release for serious violent and sexual offences of 7 years or more.
pub const SDS_PLUS_COMMENCEMENT: Commencement = Commencement::new(2020, 4, 1);
/// Police, Crime, Sentencing and Courts Act 2022 release changes.
pub const PCSC_COMMENCEMENT: Commencement = Commencement::new(2022, 6, 28);
/// 40% release for standard determinate sentences.
pub const SDS_EARLY_RELEASE_COMMENCEMENT: Commencement = Commencement::new(2024, 9, 10);

/// The legislative era a sentence is released under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LegislativeEra {
    /// Criminal Justice Act 1991.
    Cja1991,
    /// Criminal Justice Act 2003.
    Cja2003,
    /// LASPO 2012, offence before the Offender Rehabilitation Act.
    Laspo,
    /// Offender Rehabilitation Act 2014.
    Ora,
}

impl LegislativeEra {
    /// Selects the era from the sentence and offence dates.
    ///
    /// # Example
    ///
    /// ```
    /// use release_date_engine::calculation::LegislativeEra;
    /// use chrono::NaiveDate;
    ///
    /// let date = |y, m, d| NaiveDate::from_ymd_opt(y, m, d).unwrap();
    /// assert_eq!(LegislativeEra::of(date(2010, 1, 1), date(2004, 1, 1)), LegislativeEra::Cja1991);
    /// assert_eq!(LegislativeEra::of(date(2016, 1, 1), date(2014, 1, 1)), LegislativeEra::Laspo);
    /// assert_eq!(LegislativeEra::of(date(2016, 1, 1), date(2015, 6, 1)), LegislativeEra::Ora);
    /// ```
    pub fn of(sentenced_at: NaiveDate, offence_committed_at: NaiveDate) -> Self {
        let post_laspo = LASPO_COMMENCEMENT.is_in_force_on(sentenced_at);
        match post_laspo {
            false if CJA_2003_COMMENCEMENT.is_in_force_on(offence_committed_at) => {
                LegislativeEra::Cja2003
            }
            false => LegislativeEra::Cja1991,
            true if ORA_COMMENCEMENT.is_in_force_on(offence_committed_at) => LegislativeEra::Ora,
            true => LegislativeEra::Laspo,
        }
    }

    fn is_post_laspo(&self) -> bool {
        matches!(self, LegislativeEra::Laspo | LegislativeEra::Ora)
    }
}

/// Length buckets used by the identification table, shortest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LengthBucket {
    /// Less than 12 weeks.
    UnderTwelveWeeks,
    /// 12 weeks to less than 12 months.
    UnderTwelveMonths,
    /// 12 months to less than 2 years.
    UnderTwoYears,
    /// 2 years to less than 4 years.
    UnderFourYears,
    /// 4 years to less than 7 years.
    UnderSevenYears,
    /// 7 years or more.
    SevenYearsOrMore,
}

impl LengthBucket {
    /// Buckets a term served from `start`.
    ///
    /// Lengths are compared as calendar dates, so a 12 month term is never
    /// "under 12 months" whatever the month lengths involved.
    pub fn of(start: NaiveDate, components: &[DurationComponent]) -> Self {
        use CalendarUnit::{Months, Weeks, Years};
        let thresholds = [
            (LengthBucket::UnderTwelveWeeks, DurationComponent::new(Weeks, 12)),
            (LengthBucket::UnderTwelveMonths, DurationComponent::new(Months, 12)),
            (LengthBucket::UnderTwoYears, DurationComponent::new(Years, 2)),
            (LengthBucket::UnderFourYears, DurationComponent::new(Years, 4)),
            (LengthBucket::UnderSevenYears, DurationComponent::new(Years, 7)),
        ];
        thresholds
            .into_iter()
            .find(|(_, threshold)| is_shorter_than(start, components, *threshold))
            .map(|(bucket, _)| bucket)
            .unwrap_or(LengthBucket::SevenYearsOrMore)
    }

    fn under_twelve_months(&self) -> bool {
        *self <= LengthBucket::UnderTwelveMonths
    }
}

/// Returns true if the term ends before `start + threshold`.
fn is_shorter_than(
    start: NaiveDate,
    components: &[DurationComponent],
    threshold: DurationComponent,
) -> bool {
    match (add_components(start, components).ok(), threshold.add_to(start)) {
        (Some(end), Some(limit)) => end < limit,
        (Some(_), None) => true,
        (None, _) => false,
    }
}

/// Category flags that modify the base identification row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentenceCategory {
    /// The offender is subject to sex offender notification.
    pub sex_offender: bool,
    /// The offender was under 18 on the sentence date.
    pub under_eighteen: bool,
    /// A Schedule 15 offence carrying a life maximum.
    pub schedule_15_life: bool,
    /// An offence excluded from 40% early release.
    pub excluded_from_early_release: bool,
    /// The offender has been recalled.
    pub recall: bool,
}

/// The axes a sentence was classified on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentenceProfile {
    /// Legislative era.
    pub era: LegislativeEra,
    /// Length bucket of the custodial term.
    pub length: LengthBucket,
    /// Category flags.
    pub category: SentenceCategory,
}

impl SentenceProfile {
    /// Classifies `sentence` for `offender`.
    pub fn of<S>(sentence: &S, offender: &Offender) -> Self
    where
        S: CalculableSentence + ?Sized,
    {
        let sentenced_at = sentence.sentenced_at();
        Self {
            era: LegislativeEra::of(sentenced_at, sentence.offence_committed_at()),
            length: LengthBucket::of(sentenced_at, &sentence.custodial_components()),
            category: SentenceCategory {
                sex_offender: offender.is_sex_offender,
                under_eighteen: offender.is_under_eighteen_on(sentenced_at),
                schedule_15_life: sentence.is_schedule_15_life(),
                excluded_from_early_release: sentence.is_excluded_from_early_release(),
                recall: sentence.is_recall(),
            },
        }
    }
}

/// Identifies a sentence and stores the result on it.
///
/// Identification is total: every sentence kind, era, length and category
/// combination maps to exactly one row.
///
/// # Example
///
/// ```
/// use release_date_engine::calculation::identify;
/// use release_date_engine::models::{
///     Duration, Offence, Offender, ReleaseDateType, Sentence, SentenceIdentificationTrack,
///     SentenceKind,
/// };
/// use chrono::NaiveDate;
///
/// let date = |y, m, d| NaiveDate::from_ymd_opt(y, m, d).unwrap();
/// let offender = Offender {
///     reference: "A1234BC".to_string(),
///     date_of_birth: date(1980, 1, 1),
///     is_sex_offender: false,
/// };
/// let mut sentence = Sentence {
///     id: "1".to_string(),
///     sentenced_at: date(2021, 1, 1),
///     duration: Duration::years(5),
///     offence: Offence {
///         code: "TH68001".to_string(),
///         committed_at: date(2020, 6, 1),
///         is_schedule_15_life: false,
///         is_excluded_from_early_release: false,
///     },
///     kind: SentenceKind::StandardDeterminate,
///     is_recall: false,
///     consecutive_to: None,
///     release_date_types: vec![],
///     identification_track: None,
/// };
///
/// let identification = identify(&mut sentence, &offender);
/// assert_eq!(identification.track, SentenceIdentificationTrack::SdsStandardRelease);
/// assert_eq!(
///     sentence.release_date_types,
///     vec![ReleaseDateType::Sled, ReleaseDateType::Crd]
/// );
/// ```
pub fn identify<S>(sentence: &mut S, offender: &Offender) -> Identification
where
    S: CalculableSentence + ?Sized,
{
    let profile = SentenceProfile::of(sentence, offender);
    let identification = classify(sentence, &profile);

    debug!(
        sentence_ids = ?sentence.sentence_ids(),
        era = ?profile.era,
        length = ?profile.length,
        track = %identification.track,
        release_date_types = ?identification.release_date_types,
        "identified sentence"
    );

    sentence.set_identification(identification.clone());
    identification
}

/// The identification table, without storing the result.
pub fn classify<S>(sentence: &S, profile: &SentenceProfile) -> Identification
where
    S: CalculableSentence + ?Sized,
{
    use ReleaseDateType::*;
    use SentenceIdentificationTrack::*;

    let sentenced_at = sentence.sentenced_at();
    let (release_date_types, track) = match sentence.kind() {
        SentenceKind::StandardDeterminate => return standard_determinate(sentenced_at, profile),
        SentenceKind::ExtendedDeterminate { .. } => {
            let ten_years = DurationComponent::new(CalendarUnit::Years, 10);
            let automatic = !EDS_AUTOMATIC_RELEASE_ABOLISHED.is_in_force_on(sentenced_at)
                && !profile.category.schedule_15_life
                && is_shorter_than(sentenced_at, &sentence.custodial_components(), ten_years);
            if automatic {
                (vec![Sled, Crd], EdsAutomaticRelease)
            } else {
                (vec![Sled, Crd, Ped], EdsDiscretionaryRelease)
            }
        }
        SentenceKind::SentenceOfParticularConcern { .. } => {
            if PCSC_COMMENCEMENT.is_in_force_on(sentenced_at) {
                (vec![Sled, Crd, Ped], SopcPedAtTwoThirds)
            } else {
                (vec![Sled, Crd, Ped], SopcPedAtHalfway)
            }
        }
        SentenceKind::FineDefault => {
            if profile.length.under_twelve_months() {
                (vec![Ard, Sed], AFineArdAtHalfway)
            } else {
                (vec![Ard, Sed], AFineArdAtFullTerm)
            }
        }
        SentenceKind::DetentionAndTrainingOrder => {
            if PCSC_COMMENCEMENT.is_in_force_on(sentenced_at) {
                (vec![Sed, Crd], DtoAfterPcsc)
            } else {
                (vec![Sed, Crd], DtoBeforePcsc)
            }
        }
        SentenceKind::BreachOfTopUpSupervision => (vec![Ard, Sed], Botus),
        SentenceKind::Indeterminate => (vec![ReleaseDateType::None], Indeterminate),
    };

    Identification {
        release_date_types,
        track,
    }
}

fn standard_determinate(sentenced_at: NaiveDate, profile: &SentenceProfile) -> Identification {
    use LegislativeEra::*;
    use LengthBucket::*;
    use ReleaseDateType::*;
    use SentenceIdentificationTrack::*;

    let SentenceProfile {
        era,
        length,
        category,
    } = *profile;

    let (mut release_date_types, mut track) = match (era, length, category.schedule_15_life) {
        (Cja1991, UnderTwelveWeeks | UnderTwelveMonths, _) => (vec![Ard, Sed], SdsStandardRelease),
        (Cja1991, UnderTwoYears | UnderFourYears, _) => {
            (vec![Led, Crd, Sed], SdsStandardRelease)
        }
        (Cja1991, UnderSevenYears | SevenYearsOrMore, true) => {
            (vec![Ped, Npd, Led, Sed], SdsTwoThirdsRelease)
        }
        (Cja1991, UnderSevenYears | SevenYearsOrMore, false) => {
            (vec![Sled, Crd], SdsStandardRelease)
        }
        (Cja2003 | Laspo, UnderTwelveWeeks | UnderTwelveMonths, _) => {
            (vec![Ard, Sed], SdsStandardRelease)
        }
        (Cja2003 | Laspo, _, _) => (vec![Sled, Crd], SdsStandardRelease),
        (Ora, UnderTwelveWeeks | UnderTwelveMonths | UnderTwoYears, _) => {
            (vec![Sled, Crd, Tused], SdsStandardRelease)
        }
        (Ora, _, _) => (vec![Sled, Crd], SdsStandardRelease),
    };

    if is_sds_plus(sentenced_at, profile) {
        track = SdsPlusRelease;
    } else if track == SdsStandardRelease
        && era.is_post_laspo()
        && !category.excluded_from_early_release
        && SDS_EARLY_RELEASE_COMMENCEMENT.is_in_force_on(sentenced_at)
    {
        track = SdsEarlyRelease;
    }

    let hdc_eligible = length > UnderTwelveWeeks
        && length < UnderSevenYears
        && !category.sex_offender
        && !category.under_eighteen
        && !category.recall;
    if hdc_eligible {
        release_date_types.push(Hdced);
    }

    if category.under_eighteen {
        release_date_types.retain(|date_type| *date_type != Tused);
    }

    if category.recall {
        track = Recall;
    }

    Identification {
        release_date_types,
        track,
    }
}

fn is_sds_plus(sentenced_at: NaiveDate, profile: &SentenceProfile) -> bool {
    let category = &profile.category;
    if !profile.era.is_post_laspo() || category.under_eighteen || !category.schedule_15_life {
        return false;
    }
    let seven_years_or_more = profile.length == LengthBucket::SevenYearsOrMore;
    let four_years_or_more = profile.length >= LengthBucket::UnderSevenYears;
    (SDS_PLUS_COMMENCEMENT.is_in_force_on(sentenced_at) && seven_years_or_more)
        || (PCSC_COMMENCEMENT.is_in_force_on(sentenced_at) && four_years_or_more)
}
