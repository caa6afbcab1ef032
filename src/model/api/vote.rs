use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{
    api::id::ApiId,
    common::{CandidateId, ElectionId},
    db::vote::Vote,
};

/// A ballot, as submitted by a voter. The voter is whoever is logged in.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct VoteRequest {
    pub election_id: ElectionId,
    pub candidate_id: CandidateId,
}

/// A recorded vote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteDescription {
    pub id: ApiId,
    pub election_id: ElectionId,
    pub candidate_id: CandidateId,
    pub cast_at: DateTime<Utc>,
}

impl From<Vote> for VoteDescription {
    fn from(vote: Vote) -> Self {
        Self {
            id: vote.id.into(),
            election_id: vote.election_id,
            candidate_id: vote.candidate_id,
            cast_at: vote.cast_at,
        }
    }
}

/// The response to a successful vote, including how the confirmation went.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteReceipt {
    pub vote: VoteDescription,
    pub email_sent: bool,
    pub email_error: Option<String>,
}
