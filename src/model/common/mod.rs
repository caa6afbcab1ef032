pub mod contact;
pub mod policy;
pub mod role;
pub mod tally;

/// Elections are identified by a counter-allocated number.
pub type ElectionId = u32;

/// Candidates are identified by a counter-allocated number, unique across all elections.
pub type CandidateId = u32;
