//! Request handlers.

pub mod broadcast;
pub mod dedup;

pub use broadcast::{BroadcastError, BroadcastHandler};
pub use dedup::{CandidateContact, DedupError, DedupHandler, DedupOutcome, InsertedContact};
