//! Remote synchronization.
//!
//! # Responsibility
//! - Decode remote records and keep the local note collection in step with
//!   the remote add/change/remove stream.
//!
//! # Invariants
//! - The local collection is mutated only by feed events.

pub mod feed;
pub mod note_store;
pub mod record;
