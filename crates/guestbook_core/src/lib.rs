//! Core domain logic for the live guestbook.
//! Hosts (engine bindings, CLI) drive it through `GuestbookService`.

pub mod config;
pub mod editor;
pub mod glyph_fit;
pub mod logging;
pub mod model;
pub mod service;
pub mod sync;
pub mod throttle;
pub mod view;

pub use config::{ConfigError, GuestbookConfig};
pub use editor::policy::{EditLimits, TextEdit, SOFT_BREAK};
pub use editor::text_editor::{
    CharacterCounter, ConstrainedTextEditor, CounterSeverity, EditOutcome, EditorView,
};
pub use glyph_fit::{chars_that_fit, TextMeasurer};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::note::{Note, NoteId, ANONYMOUS_AUTHOR};
pub use service::guestbook_service::{GuestbookService, SubmitOutcome};
pub use service::overlay::Closable;
pub use service::renderer::{GuestbookRenderer, LatestFrameRenderer};
pub use sync::feed::{
    FeedEvent, FeedHandle, FeedQuery, InMemoryFeed, RemoteFeed, RemoteWriteError,
    SubscribeError, WriteCallback, WriteRecord,
};
pub use sync::note_store::{NoteStore, StoreChange};
pub use sync::record::{RawRecord, RecordParseError};
pub use throttle::{Clock, ManualClock, SubmissionThrottler, SystemClock};
pub use view::display::{PageView, SlotView};
pub use view::pagination::PageCursor;

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
