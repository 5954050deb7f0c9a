//! Release date types and sentence identification tracks.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A kind of date the engine can produce for a sentence.
///
/// `Sled` is a display simplification: it is only emitted when the licence
/// expiry and sentence expiry coincide, and never stored as a third fact.
///
/// # Example
///
/// ```
/// use release_date_engine::models::ReleaseDateType;
///
/// assert_eq!(ReleaseDateType::Hdced.to_string(), "HDCED");
/// assert!(ReleaseDateType::Crd.is_release_point());
/// assert!(!ReleaseDateType::Sled.is_release_point());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ReleaseDateType {
    /// Automatic Release Date.
    Ard,
    /// Sentence Expiry Date.
    Sed,
    /// Licence Expiry Date.
    Led,
    /// Combined Sentence and Licence Expiry Date.
    Sled,
    /// Conditional Release Date.
    Crd,
    /// Non-Parole Date.
    Npd,
    /// Parole Eligibility Date.
    Ped,
    /// Home Detention Curfew Eligibility Date.
    Hdced,
    /// Top-Up Supervision Expiry Date.
    Tused,
    /// Indeterminate sentence with no computed date.
    None,
}

impl ReleaseDateType {
    /// Returns true for the dates on which an offender actually leaves custody.
    pub fn is_release_point(&self) -> bool {
        matches!(
            self,
            ReleaseDateType::Ard | ReleaseDateType::Crd | ReleaseDateType::Npd
        )
    }

    /// Returns true for expiry dates (SED, LED and their SLED projection).
    pub fn is_expiry(&self) -> bool {
        matches!(
            self,
            ReleaseDateType::Sed | ReleaseDateType::Led | ReleaseDateType::Sled
        )
    }

    /// The upper-case code used on printed calculations.
    pub fn code(&self) -> &'static str {
        match self {
            ReleaseDateType::Ard => "ARD",
            ReleaseDateType::Sed => "SED",
            ReleaseDateType::Led => "LED",
            ReleaseDateType::Sled => "SLED",
            ReleaseDateType::Crd => "CRD",
            ReleaseDateType::Npd => "NPD",
            ReleaseDateType::Ped => "PED",
            ReleaseDateType::Hdced => "HDCED",
            ReleaseDateType::Tused => "TUSED",
            ReleaseDateType::None => "None",
        }
    }
}

impl fmt::Display for ReleaseDateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// The legal regime that governs when a sentence is released.
///
/// Each track maps to one release-point fraction (see
/// [`crate::calculation::ReleasePointMultiplierLookup`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SentenceIdentificationTrack {
    /// Standard determinate sentence released at the halfway point.
    SdsStandardRelease,
    /// Standard determinate sentence released at 40%.
    SdsEarlyRelease,
    /// Pre-2005 long-term sentence released at the two-thirds non-parole date.
    SdsTwoThirdsRelease,
    /// SDS+ sentence for a serious offence, released at two-thirds.
    SdsPlusRelease,
    /// Recalled standard determinate sentence.
    Recall,
    /// Extended sentence with automatic release at two-thirds of custody.
    EdsAutomaticRelease,
    /// Extended sentence with parole eligibility at two-thirds of custody.
    EdsDiscretionaryRelease,
    /// Offender of particular concern, parole eligible at halfway.
    SopcPedAtHalfway,
    /// Offender of particular concern, parole eligible at two-thirds.
    SopcPedAtTwoThirds,
    /// Fine default term released at halfway.
    #[serde(rename = "AFINE_ARD_AT_HALFWAY")]
    AFineArdAtHalfway,
    /// Fine default term served in full.
    #[serde(rename = "AFINE_ARD_AT_FULL_TERM")]
    AFineArdAtFullTerm,
    /// Detention and training order sentenced before the PCSC Act 2022.
    DtoBeforePcsc,
    /// Detention and training order sentenced under the PCSC Act 2022.
    DtoAfterPcsc,
    /// Committal for breach of top-up supervision, served in full.
    Botus,
    /// Indeterminate sentence; no release date is calculated.
    Indeterminate,
}

impl SentenceIdentificationTrack {
    /// Every track, in declaration order.
    pub const ALL: [SentenceIdentificationTrack; 15] = [
        SentenceIdentificationTrack::SdsStandardRelease,
        SentenceIdentificationTrack::SdsEarlyRelease,
        SentenceIdentificationTrack::SdsTwoThirdsRelease,
        SentenceIdentificationTrack::SdsPlusRelease,
        SentenceIdentificationTrack::Recall,
        SentenceIdentificationTrack::EdsAutomaticRelease,
        SentenceIdentificationTrack::EdsDiscretionaryRelease,
        SentenceIdentificationTrack::SopcPedAtHalfway,
        SentenceIdentificationTrack::SopcPedAtTwoThirds,
        SentenceIdentificationTrack::AFineArdAtHalfway,
        SentenceIdentificationTrack::AFineArdAtFullTerm,
        SentenceIdentificationTrack::DtoBeforePcsc,
        SentenceIdentificationTrack::DtoAfterPcsc,
        SentenceIdentificationTrack::Botus,
        SentenceIdentificationTrack::Indeterminate,
    ];

    /// Returns true when the track fraction locates the parole eligibility
    /// date and release follows at the end of the custodial term.
    pub fn releases_at_custodial_end(&self) -> bool {
        matches!(
            self,
            SentenceIdentificationTrack::EdsDiscretionaryRelease
                | SentenceIdentificationTrack::SopcPedAtHalfway
                | SentenceIdentificationTrack::SopcPedAtTwoThirds
        )
    }
}

impl fmt::Display for SentenceIdentificationTrack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SentenceIdentificationTrack::SdsStandardRelease => "SDS_STANDARD_RELEASE",
            SentenceIdentificationTrack::SdsEarlyRelease => "SDS_EARLY_RELEASE",
            SentenceIdentificationTrack::SdsTwoThirdsRelease => "SDS_TWO_THIRDS_RELEASE",
            SentenceIdentificationTrack::SdsPlusRelease => "SDS_PLUS_RELEASE",
            SentenceIdentificationTrack::Recall => "RECALL",
            SentenceIdentificationTrack::EdsAutomaticRelease => "EDS_AUTOMATIC_RELEASE",
            SentenceIdentificationTrack::EdsDiscretionaryRelease => "EDS_DISCRETIONARY_RELEASE",
            SentenceIdentificationTrack::SopcPedAtHalfway => "SOPC_PED_AT_HALFWAY",
            SentenceIdentificationTrack::SopcPedAtTwoThirds => "SOPC_PED_AT_TWO_THIRDS",
            SentenceIdentificationTrack::AFineArdAtHalfway => "AFINE_ARD_AT_HALFWAY",
            SentenceIdentificationTrack::AFineArdAtFullTerm => "AFINE_ARD_AT_FULL_TERM",
            SentenceIdentificationTrack::DtoBeforePcsc => "DTO_BEFORE_PCSC",
            SentenceIdentificationTrack::DtoAfterPcsc => "DTO_AFTER_PCSC",
            SentenceIdentificationTrack::Botus => "BOTUS",
            SentenceIdentificationTrack::Indeterminate => "INDETERMINATE",
        };
        f.write_str(name)
    }
}
