use serde::{Deserialize, Serialize};

use crate::model::common::{tally::Participation, ElectionId};

/// Participation in one election, for the admin dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElectionSummary {
    pub election_id: ElectionId,
    pub title: String,
    /// Live candidates.
    pub candidates: u64,
    /// Eligible voters overall.
    pub voters: u64,
    /// Eligible voters who voted in this election.
    pub voted: u64,
    pub turnout: f64,
}

impl ElectionSummary {
    pub fn new(
        election_id: ElectionId,
        title: String,
        candidates: u64,
        participation: Participation,
    ) -> Self {
        Self {
            election_id,
            title,
            candidates,
            voters: participation.eligible,
            voted: participation.voted,
            turnout: participation.turnout(),
        }
    }
}

/// One candidate's line in the full results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateResult {
    pub votes: u64,
    pub photo_url: Option<String>,
}
