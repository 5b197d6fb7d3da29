//! Note domain model.
//!
//! # Responsibility
//! - Define one guestbook entry as delivered by the remote feed.
//!
//! # Invariants
//! - `id` is unique inside one `NoteStore`.
//! - `created_at_ms` is a server timestamp; `0` means unknown.

use serde::{Deserialize, Serialize};

/// Remote-assigned opaque note key.
///
/// Kept as a type alias to make semantic intent explicit in signatures.
pub type NoteId = String;

/// Author id used when the remote record carries none.
pub const ANONYMOUS_AUTHOR: &str = "anon";

/// One guestbook entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    /// Remote key of the record.
    pub id: NoteId,
    /// Serialized as `userId` to match the remote record schema.
    #[serde(rename = "userId")]
    pub author_id: String,
    /// Plain text body, may contain newlines.
    #[serde(rename = "text")]
    pub body: String,
    /// Unix epoch milliseconds assigned by the remote store.
    #[serde(rename = "timestamp")]
    pub created_at_ms: i64,
}

impl Note {
    /// Creates a note with an explicit id and timestamp.
    pub fn new(
        id: impl Into<NoteId>,
        author_id: impl Into<String>,
        body: impl Into<String>,
        created_at_ms: i64,
    ) -> Self {
        Self {
            id: id.into(),
            author_id: author_id.into(),
            body: body.into(),
            created_at_ms,
        }
    }

    /// Returns whether the server timestamp is known.
    pub fn has_timestamp(&self) -> bool {
        self.created_at_ms > 0
    }
}
