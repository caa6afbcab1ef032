//! Vote counting. Everything here works on records already loaded from the
//! database and never touches it.

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::model::{
    api::report::CandidateResult,
    common::{CandidateId, ElectionId},
    db::{candidate::Candidate, user::User, vote::Vote},
    mongodb::Id,
};

use super::policy::RegistrationPolicy;

/// Votes per candidate for one election.
///
/// Only live candidates appear. Votes naming a removed (or unknown)
/// candidate are counted as dropped and contribute to no candidate.
#[derive(Debug)]
pub struct Tally<'c> {
    counts: Vec<(&'c Candidate, u64)>,
    dropped: u64,
}

impl<'c> Tally<'c> {
    /// Count `votes` (given by the candidate each one is for) against the
    /// election's `candidates`. Every live candidate starts from zero.
    pub fn count(
        candidates: &'c [Candidate],
        votes: impl IntoIterator<Item = CandidateId>,
    ) -> Self {
        let live: Vec<&Candidate> = candidates.iter().filter(|c| !c.removed).collect();
        let mut counts: HashMap<CandidateId, u64> = live.iter().map(|c| (c.id, 0)).collect();
        let mut dropped = 0;
        for candidate_id in votes {
            match counts.get_mut(&candidate_id) {
                Some(count) => *count += 1,
                None => dropped += 1,
            }
        }
        let counts = live
            .into_iter()
            .map(|c| (c, counts.get(&c.id).copied().unwrap_or(0)))
            .collect();
        Self { counts, dropped }
    }

    /// Votes that went to no live candidate.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    /// Votes that went to live candidates.
    pub fn counted(&self) -> u64 {
        self.counts.iter().map(|(_, n)| n).sum()
    }

    /// Candidate name to number of votes.
    pub fn by_name(&self) -> BTreeMap<String, u64> {
        self.counts
            .iter()
            .map(|(c, n)| (c.name.clone(), *n))
            .collect()
    }

    /// Candidate name to number of votes and photo.
    pub fn results(&self) -> BTreeMap<String, CandidateResult> {
        self.counts
            .iter()
            .map(|(c, n)| {
                let result = CandidateResult {
                    votes: *n,
                    photo_url: c.photo_url.clone(),
                };
                (c.name.clone(), result)
            })
            .collect()
    }
}

/// How many eligible voters took part in one election.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Participation {
    /// Eligible voters overall.
    pub eligible: u64,
    /// Eligible voters with a ballot in this election.
    pub voted: u64,
}

impl Participation {
    /// Intersect the users who voted with the eligible users. Voters outside
    /// the eligible set (the super-admin) are ignored, and each user counts
    /// once however many votes they appear in.
    pub fn count(eligible: &HashSet<Id>, voters: impl IntoIterator<Item = Id>) -> Self {
        let voted: HashSet<Id> = voters
            .into_iter()
            .filter(|id| eligible.contains(id))
            .collect();
        Self {
            eligible: eligible.len() as u64,
            voted: voted.len() as u64,
        }
    }

    /// Fraction of eligible voters who voted; zero when nobody is eligible.
    pub fn turnout(&self) -> f64 {
        if self.eligible == 0 {
            0.0
        } else {
            self.voted as f64 / self.eligible as f64
        }
    }
}

/// The IDs of all users who count towards turnout.
pub fn eligible_voters(users: &[User], policy: &RegistrationPolicy) -> HashSet<Id> {
    users
        .iter()
        .filter(|u| policy.is_eligible_voter(&u.username))
        .map(|u| u.id)
        .collect()
}

/// Group votes by election.
pub fn votes_by_election(votes: &[Vote]) -> HashMap<ElectionId, Vec<&Vote>> {
    let mut grouped: HashMap<ElectionId, Vec<&Vote>> = HashMap::new();
    for vote in votes {
        grouped.entry(vote.election_id).or_default().push(vote);
    }
    grouped
}
