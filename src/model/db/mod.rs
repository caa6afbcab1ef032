//! DB-compatible (e.g. de/serialisable) types.
//!
//! The types in this module are serialised in an DB-friendly way, e.g.:
//!
//! - IDs and datetimes are serialised in MongoDB's own format.
//!
//! Operations that must hold up under concurrent requests (unique
//! usernames, one vote per user per election, atomic election creation)
//! live next to the type they protect.

pub mod candidate;
pub mod election;
pub mod settings;
pub mod user;
pub mod vote;
