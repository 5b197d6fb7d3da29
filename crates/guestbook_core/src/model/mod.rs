//! Guestbook domain model.
//!
//! # Responsibility
//! - Define the canonical note record shared by sync, paging and display.
//!
//! # Invariants
//! - Every note is identified by a remote-assigned `NoteId`.
//! - Notes are never invented locally; they always originate from the feed.

pub mod note;
