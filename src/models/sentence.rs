//! Sentence and offence models.
//!
//! This module defines the [`Sentence`] record supplied by the calling system,
//! the [`ConsecutiveSentence`] chain built from several of them, and the
//! [`CalculableSentence`] trait both implement so identification and
//! calculation can treat them alike.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::calculation::aggregate;

use super::{Duration, DurationComponent, ReleaseDateType, SentenceIdentificationTrack};

/// The offence a sentence was imposed for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Offence {
    /// The offence code from the source record system.
    pub code: String,
    /// The date the offence was committed (or the start of the offence range).
    pub committed_at: NaiveDate,
    /// Whether the offence is listed in Schedule 15 and carries a life maximum.
    #[serde(default)]
    pub is_schedule_15_life: bool,
    /// Whether the offence falls in the sexual/violent categories excluded from
    /// 40% early release.
    #[serde(default)]
    pub is_excluded_from_early_release: bool,
}

/// The legal kind of custodial sentence.
///
/// For extended sentences and sentences for offenders of particular concern
/// the sentence `duration` is the custodial term; the licence extension is
/// carried here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SentenceKind {
    /// Standard determinate sentence.
    StandardDeterminate,
    /// Extended determinate sentence (EDS).
    ExtendedDeterminate {
        /// The extended licence period.
        extension: Duration,
    },
    /// Sentence for an offender of particular concern (SOPC).
    SentenceOfParticularConcern {
        /// The licence period following the custodial term.
        extension: Duration,
    },
    /// Imprisonment in default of payment of a fine (A/FINE).
    FineDefault,
    /// Detention and training order for a young offender.
    DetentionAndTrainingOrder,
    /// Committal for breach of top-up supervision.
    BreachOfTopUpSupervision,
    /// Indeterminate sentence; the duration is the minimum term.
    Indeterminate,
}

impl SentenceKind {
    /// Returns true if sentences of this kind may be served consecutively
    /// and have their terms aggregated.
    pub fn can_run_consecutively(&self) -> bool {
        matches!(
            self,
            SentenceKind::StandardDeterminate | SentenceKind::FineDefault
        )
    }

    /// The extension period for extended sentence kinds.
    pub fn extension(&self) -> Option<&Duration> {
        match self {
            SentenceKind::ExtendedDeterminate { extension }
            | SentenceKind::SentenceOfParticularConcern { extension } => Some(extension),
            _ => None,
        }
    }
}

/// The outcome of sentence identification: which dates apply and under
/// which track.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identification {
    /// Applicable date types, in the order they are printed.
    pub release_date_types: Vec<ReleaseDateType>,
    /// The legal track governing release.
    pub track: SentenceIdentificationTrack,
}

/// A single custodial sentence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sentence {
    /// Unique identifier for the sentence within its booking.
    pub id: String,
    /// The date the sentence was imposed; calculation starts from here.
    pub sentenced_at: NaiveDate,
    /// The custodial term.
    pub duration: Duration,
    /// The offence the sentence was imposed for.
    pub offence: Offence,
    /// The legal kind of sentence.
    #[serde(default = "default_kind")]
    pub kind: SentenceKind,
    /// Whether the offender has been recalled on this sentence.
    #[serde(default)]
    pub is_recall: bool,
    /// The sentence this one is served consecutively to, if any.
    #[serde(default)]
    pub consecutive_to: Option<String>,
    /// Applicable date types; populated by identification.
    #[serde(default)]
    pub release_date_types: Vec<ReleaseDateType>,
    /// The legal track; populated by identification.
    #[serde(default)]
    pub identification_track: Option<SentenceIdentificationTrack>,
}

fn default_kind() -> SentenceKind {
    SentenceKind::StandardDeterminate
}

/// Behaviour shared by anything the engine can identify and calculate.
pub trait CalculableSentence {
    /// Identifiers of the sentences this calculation covers.
    fn sentence_ids(&self) -> Vec<String>;

    /// The date the (first) sentence was imposed.
    fn sentenced_at(&self) -> NaiveDate;

    /// The offence date used to select the legislative era.
    fn offence_committed_at(&self) -> NaiveDate;

    /// The legal kind of sentence.
    fn kind(&self) -> &SentenceKind;

    /// Whether the offender has been recalled.
    fn is_recall(&self) -> bool;

    /// Whether any offence is a Schedule 15 offence with a life maximum.
    fn is_schedule_15_life(&self) -> bool;

    /// Whether any offence is excluded from 40% early release.
    fn is_excluded_from_early_release(&self) -> bool;

    /// Custodial term components, in the order they are added to the start date.
    fn custodial_components(&self) -> Vec<DurationComponent>;

    /// Licence extension components for extended sentences; empty otherwise.
    fn extension_components(&self) -> Vec<DurationComponent> {
        self.kind()
            .extension()
            .map(|extension| extension.descending().collect())
            .unwrap_or_default()
    }

    /// The identification result, once identification has run and produced
    /// at least one date type.
    fn identification(&self) -> Option<Identification>;

    /// Stores an identification result.
    fn set_identification(&mut self, identification: Identification);
}

impl CalculableSentence for Sentence {
    fn sentence_ids(&self) -> Vec<String> {
        vec![self.id.clone()]
    }

    fn sentenced_at(&self) -> NaiveDate {
        self.sentenced_at
    }

    fn offence_committed_at(&self) -> NaiveDate {
        self.offence.committed_at
    }

    fn kind(&self) -> &SentenceKind {
        &self.kind
    }

    fn is_recall(&self) -> bool {
        self.is_recall
    }

    fn is_schedule_15_life(&self) -> bool {
        self.offence.is_schedule_15_life
    }

    fn is_excluded_from_early_release(&self) -> bool {
        self.offence.is_excluded_from_early_release
    }

    fn custodial_components(&self) -> Vec<DurationComponent> {
        self.duration.descending().collect()
    }

    fn identification(&self) -> Option<Identification> {
        // A track without date types is incomplete and gets identified again.
        if self.release_date_types.is_empty() {
            return None;
        }
        self.identification_track.map(|track| Identification {
            release_date_types: self.release_date_types.clone(),
            track,
        })
    }

    fn set_identification(&mut self, identification: Identification) {
        self.release_date_types = identification.release_date_types;
        self.identification_track = Some(identification.track);
    }
}

/// A chain of sentences served back to back.
///
/// The chain starts on the first sentence's date and its term is the
/// aggregation of every member's term in chain order. For identification the
/// chain takes the latest offence date, and any member's Schedule 15 or
/// exclusion flag applies to the whole chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConsecutiveSentence {
    sentences: Vec<Sentence>,
    components: Vec<DurationComponent>,
    release_date_types: Vec<ReleaseDateType>,
    identification_track: Option<SentenceIdentificationTrack>,
}

impl ConsecutiveSentence {
    /// Builds a chain from sentences given in serving order.
    ///
    /// Returns `None` for an empty chain.
    pub fn new(sentences: Vec<Sentence>) -> Option<Self> {
        if sentences.is_empty() {
            return None;
        }
        let durations: Vec<Duration> = sentences.iter().map(|s| s.duration.clone()).collect();
        Some(Self {
            components: aggregate(&durations),
            sentences,
            release_date_types: Vec::new(),
            identification_track: None,
        })
    }

    /// The member sentences in serving order.
    pub fn sentences(&self) -> &[Sentence] {
        &self.sentences
    }

    fn first(&self) -> &Sentence {
        // The constructor rejects empty chains.
        &self.sentences[0]
    }
}

impl CalculableSentence for ConsecutiveSentence {
    fn sentence_ids(&self) -> Vec<String> {
        self.sentences.iter().map(|s| s.id.clone()).collect()
    }

    fn sentenced_at(&self) -> NaiveDate {
        self.first().sentenced_at
    }

    fn offence_committed_at(&self) -> NaiveDate {
        self.sentences
            .iter()
            .map(|s| s.offence.committed_at)
            .max()
            .unwrap_or(self.first().offence.committed_at)
    }

    fn kind(&self) -> &SentenceKind {
        &self.first().kind
    }

    fn is_recall(&self) -> bool {
        self.sentences.iter().any(|s| s.is_recall)
    }

    fn is_schedule_15_life(&self) -> bool {
        self.sentences.iter().any(|s| s.offence.is_schedule_15_life)
    }

    fn is_excluded_from_early_release(&self) -> bool {
        self.sentences
            .iter()
            .any(|s| s.offence.is_excluded_from_early_release)
    }

    fn custodial_components(&self) -> Vec<DurationComponent> {
        self.components.clone()
    }

    fn identification(&self) -> Option<Identification> {
        // A track without date types is incomplete and gets identified again.
        if self.release_date_types.is_empty() {
            return None;
        }
        self.identification_track.map(|track| Identification {
            release_date_types: self.release_date_types.clone(),
            track,
        })
    }

    fn set_identification(&mut self, identification: Identification) {
        self.release_date_types = identification.release_date_types;
        self.identification_track = Some(identification.track);
    }
}
