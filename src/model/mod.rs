//! Data types and the domain rules that operate on them.
//!
//! - [`api`]: request and response bodies, as seen by clients.
//! - [`common`]: pure domain logic shared by the other layers: roles, the
//!   registration policy, contact methods and vote tallying.
//! - [`db`]: documents as stored in MongoDB, and the operations that enforce
//!   the storage-level invariants.
//! - [`mongodb`]: collection plumbing.

pub mod api;
pub mod common;
pub mod db;
pub mod mongodb;
