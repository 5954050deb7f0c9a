//! Booking model.
//!
//! A [`Booking`] is one period in custody: the offender, the sentences being
//! served, and the adjustments recorded against them. It is assembled per
//! calculation request and never persisted by the engine.

use serde::{Deserialize, Serialize};

use super::{Adjustments, Offender, Sentence};

/// Everything needed to calculate release dates for one custodial period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    /// The offender serving the sentences.
    pub offender: Offender,
    /// The sentences, in the order supplied by the record system.
    pub sentences: Vec<Sentence>,
    /// Day adjustments recorded against the booking.
    #[serde(default)]
    pub adjustments: Adjustments,
}

impl Booking {
    /// Looks up a sentence by identifier.
    pub fn sentence(&self, id: &str) -> Option<&Sentence> {
        self.sentences.iter().find(|sentence| sentence.id == id)
    }
}
