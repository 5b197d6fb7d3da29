//! Note slot formatting for the book pages.
//!
//! # Responsibility
//! - Build per-slot display data (timestamp label + wrapped body).
//! - Build the page label and paging button state.
//!
//! # Invariants
//! - Each side always yields exactly `capacity_per_side` slots.
//! - Body lines never exceed the display column count or line cap.

use crate::model::note::{Note, NoteId};
use crate::view::pagination::PageCursor;
use chrono::{Local, TimeZone};
use std::fmt::Display;

/// Label shown when the timestamp is unknown.
pub const UNKNOWN_DATE_LABEL: &str = "—";
/// Page label for an empty guestbook.
pub const EMPTY_PAGE_LABEL: &str = "No notes yet.";

const DATE_LABEL_FORMAT: &str = "%d.%m.%Y   %H:%M:%S";

/// Display data for one note slot. Empty slots carry no note.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SlotView {
    pub note_id: Option<NoteId>,
    pub date_label: String,
    pub body: String,
}

impl SlotView {
    pub fn is_empty(&self) -> bool {
        self.note_id.is_none()
    }
}

/// Everything the renderer needs for one double page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageView {
    pub left: Vec<SlotView>,
    pub right: Vec<SlotView>,
    pub label: String,
    pub has_prev: bool,
    pub has_next: bool,
    pub page_index: usize,
    pub total_pages: usize,
}

/// Column and line caps for note bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotFormat {
    pub columns: usize,
    pub max_lines: usize,
}

/// Builds the view for the cursor's current double page.
pub fn page_view(notes: &[Note], cursor: &PageCursor, format: SlotFormat) -> PageView {
    let page = cursor.layout(notes);
    let capacity = cursor.capacity_per_side();
    let label = if notes.is_empty() {
        EMPTY_PAGE_LABEL.to_string()
    } else {
        format!("Page {} / {}", page.page_index + 1, page.total_pages)
    };

    PageView {
        left: side_slots(page.left, capacity, format),
        right: side_slots(page.right, capacity, format),
        label,
        has_prev: !notes.is_empty() && cursor.has_prev(),
        has_next: !notes.is_empty() && cursor.has_next(notes.len()),
        page_index: page.page_index,
        total_pages: page.total_pages,
    }
}

fn side_slots(notes: &[Note], capacity: usize, format: SlotFormat) -> Vec<SlotView> {
    let mut slots: Vec<SlotView> = notes
        .iter()
        .take(capacity)
        .map(|note| slot_view(note, format))
        .collect();
    slots.resize_with(capacity, SlotView::default);
    slots
}

/// Formats one note in the local time zone.
pub fn slot_view(note: &Note, format: SlotFormat) -> SlotView {
    SlotView {
        note_id: Some(note.id.clone()),
        date_label: date_label(note.created_at_ms, &Local),
        body: hard_wrap_columns(&note.body.replace('\r', ""), format.columns, format.max_lines),
    }
}

/// Formats an epoch-millisecond timestamp as `dd.MM.yyyy   HH:mm:ss`.
pub fn date_label<Tz>(created_at_ms: i64, zone: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    if created_at_ms <= 0 {
        return UNKNOWN_DATE_LABEL.to_string();
    }
    zone.timestamp_millis_opt(created_at_ms)
        .single()
        .map(|at| at.format(DATE_LABEL_FORMAT).to_string())
        .unwrap_or_else(|| UNKNOWN_DATE_LABEL.to_string())
}

/// Chops every line into `columns`-wide pieces and keeps at most
/// `max_lines` of them. Empty lines produce no output line. No word
/// search; this is the fixed-width display wrap, not the editor wrap.
pub fn hard_wrap_columns(text: &str, columns: usize, max_lines: usize) -> String {
    if text.is_empty() || columns == 0 {
        return text.to_string();
    }

    let mut out: Vec<String> = Vec::new();
    'lines: for line in text.split('\n') {
        let chars: Vec<char> = line.chars().collect();
        for piece in chars.chunks(columns) {
            if out.len() >= max_lines {
                break 'lines;
            }
            out.push(piece.iter().collect());
        }
    }
    out.join("\n")
}
