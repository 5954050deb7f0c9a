//! Calculation logic for the Release Date Calculation Engine.
//!
//! This module contains the duration aggregation used for consecutive terms,
//! the release-point fraction lookup, sentence identification, per-sentence
//! date calculation, dominant historic date reconciliation, and the booking
//! engine that ties them together.

mod booking_calculation;
mod dominant_historic_date;
mod duration_aggregator;
mod identification;
mod release_point;
mod sentence_calculation;

pub use booking_calculation::{ReleaseDateEngine, build_chains};
pub use dominant_historic_date::{calculate_from_sled, latest_of};
pub use duration_aggregator::{add_components, aggregate, length_in_days, merge_adjacent};
pub use identification::{
    CJA_2003_COMMENCEMENT, Commencement, EDS_AUTOMATIC_RELEASE_ABOLISHED, LASPO_COMMENCEMENT,
    LegislativeEra, LengthBucket, ORA_COMMENCEMENT, PCSC_COMMENCEMENT,
    SDS_EARLY_RELEASE_COMMENCEMENT, SDS_PLUS_COMMENCEMENT, SentenceCategory, SentenceProfile,
    classify, identify,
};
pub use release_point::{
    ReleaseFraction, ReleasePointMultiplierLookup, Rounding, rounding_for, statutory_fraction,
};
pub use sentence_calculation::{
    HDCED_DAYS_BEFORE_RELEASE, HDCED_MINIMUM_CUSTODIAL_DAYS, HDCED_PROPORTIONAL_TERM_MONTHS,
    SentenceCalculator, TOP_UP_SUPERVISION_MONTHS, offset_days, release_provision,
};
