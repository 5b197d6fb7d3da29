//! Ordered, deduplicated note collection fed by remote events.
//!
//! # Responsibility
//! - Apply add/change/remove events as a reducer over the note collection.
//! - Keep notes sorted by server timestamp.
//!
//! # Invariants
//! - Note ids are unique.
//! - Notes are sorted ascending by `created_at_ms`; ties keep arrival order.
//! - Malformed records are dropped with a warning, never fatal.
//! - The store never invents or discards notes on its own.

use crate::model::note::{Note, NoteId};
use crate::sync::feed::FeedEvent;
use crate::sync::record::{parse_note, RawRecord, RecordParseError};
use log::{debug, error, warn};
use std::collections::HashSet;

/// Effect of one applied event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreChange {
    /// New note placed at `index`; `previous_len` is the size before insert.
    Inserted { index: usize, previous_len: usize },
    /// Existing note replaced and re-sorted.
    Updated { id: NoteId },
    /// Note removed.
    Removed { id: NoteId },
    /// Event had no effect (duplicate add, unknown change/remove).
    Ignored,
    /// Record could not be decoded and was dropped.
    Rejected(RecordParseError),
    /// Transport error reported by the feed.
    FeedError,
}

impl StoreChange {
    /// Returns whether the collection was mutated.
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            Self::Inserted { .. } | Self::Updated { .. } | Self::Removed { .. }
        )
    }
}

/// Authoritative local note collection.
#[derive(Debug, Default)]
pub struct NoteStore {
    notes: Vec<Note>,
    ids: HashSet<NoteId>,
}

impl NoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    /// Returns the ordered notes.
    pub fn snapshot(&self) -> &[Note] {
        &self.notes
    }

    /// Applies one feed event.
    pub fn apply(&mut self, event: FeedEvent) -> StoreChange {
        match event {
            FeedEvent::Added(record) => self.on_remote_added(&record),
            FeedEvent::Changed(record) => self.on_remote_changed(&record),
            FeedEvent::Removed { key } => self.on_remote_removed(&key),
            FeedEvent::Error { message } => {
                error!(
                    "event=feed_error module=sync status=error message={}",
                    message
                );
                StoreChange::FeedError
            }
        }
    }

    /// Inserts a newly added note unless its id is already present.
    pub fn on_remote_added(&mut self, record: &RawRecord) -> StoreChange {
        let note = match decode("feed_added", record) {
            Ok(note) => note,
            Err(err) => return StoreChange::Rejected(err),
        };
        if self.ids.contains(note.id.as_str()) {
            debug!(
                "event=feed_added module=sync status=ignored reason=duplicate id={}",
                note.id
            );
            return StoreChange::Ignored;
        }

        let previous_len = self.notes.len();
        // Inserting after every equal timestamp keeps ties in arrival order.
        let index = self
            .notes
            .partition_point(|existing| existing.created_at_ms <= note.created_at_ms);
        debug!(
            "event=feed_added module=sync status=ok id={} index={} count={}",
            note.id,
            index,
            previous_len + 1
        );
        self.ids.insert(note.id.clone());
        self.notes.insert(index, note);
        StoreChange::Inserted {
            index,
            previous_len,
        }
    }

    /// Replaces an existing note and re-derives its position.
    pub fn on_remote_changed(&mut self, record: &RawRecord) -> StoreChange {
        let note = match decode("feed_changed", record) {
            Ok(note) => note,
            Err(err) => return StoreChange::Rejected(err),
        };
        let Some(position) = self.position(note.id.as_str()) else {
            debug!(
                "event=feed_changed module=sync status=ignored reason=unknown_id id={}",
                note.id
            );
            return StoreChange::Ignored;
        };

        let id = note.id.clone();
        self.notes[position] = note;
        self.notes.sort_by_key(|note| note.created_at_ms);
        debug!("event=feed_changed module=sync status=ok id={}", id);
        StoreChange::Updated { id }
    }

    /// Removes the note with `id` if present.
    pub fn on_remote_removed(&mut self, id: &str) -> StoreChange {
        let Some(position) = self.position(id) else {
            debug!(
                "event=feed_removed module=sync status=ignored reason=unknown_id id={}",
                id
            );
            return StoreChange::Ignored;
        };

        let removed = self.notes.remove(position);
        self.ids.remove(removed.id.as_str());
        debug!(
            "event=feed_removed module=sync status=ok id={} count={}",
            removed.id,
            self.notes.len()
        );
        StoreChange::Removed { id: removed.id }
    }

    fn position(&self, id: &str) -> Option<usize> {
        if !self.ids.contains(id) {
            return None;
        }
        self.notes.iter().position(|note| note.id == id)
    }
}

fn decode(event: &str, record: &RawRecord) -> Result<Note, RecordParseError> {
    parse_note(record).map_err(|err| {
        warn!(
            "event={} module=sync status=error error_code=record_parse error={}",
            event, err
        );
        err
    })
}
