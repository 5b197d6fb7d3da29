//! FFI use-case API for the guestbook overlay.
//!
//! # Responsibility
//! - Expose session-level guestbook calls to Dart via FRB.
//! - Bridge the host's realtime database listener into the core feed
//!   contract: the host pushes child events in and drains write requests out.
//!
//! # Invariants
//! - Exported functions must not panic across the FFI boundary.
//! - The session lives on the calling thread; every call is `sync` and must
//!   come from the UI isolate's thread.
//! - Calls without an open session return an envelope with `ok = false`.
//! - Carets crossing the boundary are UTF-16 code unit offsets, the unit of
//!   Dart strings and `TextSelection`; the core works in char indices.
//! - At most `MAX_IN_FLIGHT_WRITES` writes await completion; older ones are
//!   failed as disconnected when the host never reports them.

use guestbook_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    Closable, CounterSeverity, EditOutcome, EditorView, FeedEvent, FeedQuery, GuestbookConfig,
    GuestbookService, LatestFrameRenderer, PageView, RawRecord, RemoteFeed, RemoteWriteError,
    SlotView, SubmitOutcome, SubscribeError, SystemClock, TextMeasurer, WriteCallback,
    WriteRecord,
};
use log::{info, warn};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::sync::mpsc::{channel, Receiver, Sender};
use uuid::Uuid;

type Session = GuestbookService<HostBridgeFeed, LatestFrameRenderer>;

const MAX_IN_FLIGHT_WRITES: usize = 32;

thread_local! {
    static SESSION: RefCell<Option<Session>> = const { RefCell::new(None) };
}

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir` (idempotent).
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err.to_string(),
    }
}

/// Generic action response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuestbookActionResponse {
    /// Whether the operation succeeded.
    pub ok: bool,
    /// Human-readable response message for diagnostics.
    pub message: String,
}

impl GuestbookActionResponse {
    fn success(message: impl Into<String>) -> Self {
        Self {
            ok: true,
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            message: message.into(),
        }
    }
}

/// One note slot on a book page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuestbookSlot {
    /// Empty for padding slots.
    pub note_id: String,
    pub date_label: String,
    pub body: String,
}

/// Current double page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuestbookPageResponse {
    pub ok: bool,
    pub left: Vec<GuestbookSlot>,
    pub right: Vec<GuestbookSlot>,
    pub label: String,
    pub has_prev: bool,
    pub has_next: bool,
    pub page_index: u32,
    pub total_pages: u32,
    pub message: String,
}

/// Composer state after a change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuestbookEditorResponse {
    pub ok: bool,
    /// `true` when the host must replace its field text and caret.
    pub rewritten: bool,
    pub text: String,
    /// UTF-16 code unit offset into `text`.
    pub caret: u32,
    pub counter_text: String,
    /// `normal|warning|limit`.
    pub severity: String,
    pub message: String,
}

/// Submission result.
#[derive(Debug, Clone, PartialEq)]
pub struct GuestbookSubmitResponse {
    /// `sent|throttled|empty|no_session`.
    pub status: String,
    pub text: Option<String>,
    pub remaining_secs: f64,
}

/// Write the host must perform against its realtime database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuestbookPendingWrite {
    /// Token passed back to `guestbook_complete_write`.
    pub write_id: String,
    pub path: String,
    /// Record JSON with the server timestamp placeholder.
    pub payload_json: String,
}

/// Opens the guestbook session on the calling thread.
///
/// Input semantics:
/// - `config_json`: optional `GuestbookConfig` JSON; `None` uses defaults.
/// - `user_id`: author id written with submissions; `None` or blank keeps `anon`.
/// - `char_width` + `target_width`: monospace glyph width and slot width in
///   pixels, used to derive display columns when the config leaves them at 0.
///
/// # FFI contract
/// - Replaces a previously open session.
/// - Never panics; returns an error envelope for invalid config.
#[flutter_rust_bridge::frb(sync)]
pub fn guestbook_open_session(
    config_json: Option<String>,
    user_id: Option<String>,
    char_width: Option<f32>,
    target_width: Option<f32>,
) -> GuestbookActionResponse {
    let config = match config_json.as_deref() {
        Some(json) => match GuestbookConfig::from_json_str(json) {
            Ok(config) => config,
            Err(err) => return GuestbookActionResponse::failure(err.to_string()),
        },
        None => GuestbookConfig::default(),
    };

    let mut session = GuestbookService::new(
        &config,
        HostBridgeFeed::default(),
        LatestFrameRenderer::default(),
        Box::new(SystemClock::new()),
    );
    if let Some(user_id) = user_id {
        session = session.with_user_id(user_id);
    }
    if let (Some(char_width), Some(target_width)) = (char_width, target_width) {
        let measurer = move |sample: &str| sample.chars().count() as f32 * char_width;
        let measurer: Option<&dyn TextMeasurer> = if char_width > 0.0 {
            Some(&measurer)
        } else {
            None
        };
        session = session.with_measured_columns(measurer, target_width);
    }

    if let Err(err) = session.start() {
        return GuestbookActionResponse::failure(err.to_string());
    }
    let columns = session.display_columns();
    SESSION.with(|slot| *slot.borrow_mut() = Some(session));
    info!("event=ffi_session_open module=ffi status=ok columns={}", columns);
    GuestbookActionResponse::success(format!("session open, {columns} columns"))
}

/// Closes the session and drops its subscription.
#[flutter_rust_bridge::frb(sync)]
pub fn guestbook_close_session() -> GuestbookActionResponse {
    let closed = SESSION.with(|slot| slot.borrow_mut().take());
    match closed {
        Some(mut session) => {
            session.dispose();
            GuestbookActionResponse::success("session closed")
        }
        None => GuestbookActionResponse::failure("no open session"),
    }
}

/// Query the host must subscribe with, as `path|order_by_child|limit`.
#[flutter_rust_bridge::frb(sync)]
pub fn guestbook_feed_query() -> Option<String> {
    with_session(|session| {
        session.feed().query().map(|query| {
            format!(
                "{}|{}|{}",
                query.path, query.order_by_child, query.limit_to_last
            )
        })
    })
    .flatten()
}

/// Host-side `child_added` callback.
#[flutter_rust_bridge::frb(sync)]
pub fn guestbook_push_added(key: String, value_json: String) -> GuestbookActionResponse {
    match parse_value(&value_json) {
        Ok(value) => push_event(FeedEvent::Added(RawRecord::new(key, value))),
        Err(message) => GuestbookActionResponse::failure(message),
    }
}

/// Host-side `child_changed` callback.
#[flutter_rust_bridge::frb(sync)]
pub fn guestbook_push_changed(key: String, value_json: String) -> GuestbookActionResponse {
    match parse_value(&value_json) {
        Ok(value) => push_event(FeedEvent::Changed(RawRecord::new(key, value))),
        Err(message) => GuestbookActionResponse::failure(message),
    }
}

/// Host-side `child_removed` callback.
#[flutter_rust_bridge::frb(sync)]
pub fn guestbook_push_removed(key: String) -> GuestbookActionResponse {
    push_event(FeedEvent::Removed { key })
}

/// Host-side listener error.
#[flutter_rust_bridge::frb(sync)]
pub fn guestbook_push_error(message: String) -> GuestbookActionResponse {
    push_event(FeedEvent::Error { message })
}

/// Drains writes requested since the last call.
#[flutter_rust_bridge::frb(sync)]
pub fn guestbook_take_pending_writes() -> Vec<GuestbookPendingWrite> {
    with_session(|session| session.feed().take_pending()).unwrap_or_default()
}

/// Reports the outcome of a pending write.
///
/// `error = None` means the push succeeded under `pushed_key`.
#[flutter_rust_bridge::frb(sync)]
pub fn guestbook_complete_write(
    write_id: String,
    pushed_key: Option<String>,
    error: Option<String>,
) -> GuestbookActionResponse {
    let completed = with_session(|session| session.feed().complete(&write_id, pushed_key, error));
    match completed {
        Some(true) => GuestbookActionResponse::success("write completed"),
        Some(false) => GuestbookActionResponse::failure(format!("unknown write `{write_id}`")),
        None => GuestbookActionResponse::failure("no open session"),
    }
}

/// Composer change reported by the input field.
///
/// `caret` is the selection offset in UTF-16 code units.
#[flutter_rust_bridge::frb(sync)]
pub fn guestbook_input_changed(text: String, caret: u32) -> GuestbookEditorResponse {
    let outcome = with_session(|session| {
        let caret = utf16_to_char_index(&text, caret as usize);
        let outcome = session.on_input_changed(&text, caret);
        (outcome, session.editor_view())
    });
    match outcome {
        Some((outcome, view)) => {
            editor_response(matches!(outcome, EditOutcome::Rewritten(_)), view)
        }
        None => GuestbookEditorResponse {
            ok: false,
            rewritten: false,
            text,
            caret,
            counter_text: String::new(),
            severity: severity_label(CounterSeverity::Normal).to_string(),
            message: "no open session".to_string(),
        },
    }
}

/// Submit button handler.
#[flutter_rust_bridge::frb(sync)]
pub fn guestbook_submit() -> GuestbookSubmitResponse {
    match with_session(|session| session.submit()) {
        Some(SubmitOutcome::Sent { text }) => GuestbookSubmitResponse {
            status: "sent".to_string(),
            text: Some(text),
            remaining_secs: 0.0,
        },
        Some(SubmitOutcome::Throttled { remaining_secs }) => GuestbookSubmitResponse {
            status: "throttled".to_string(),
            text: None,
            remaining_secs,
        },
        Some(SubmitOutcome::Empty) => GuestbookSubmitResponse {
            status: "empty".to_string(),
            text: None,
            remaining_secs: 0.0,
        },
        None => GuestbookSubmitResponse {
            status: "no_session".to_string(),
            text: None,
            remaining_secs: 0.0,
        },
    }
}

/// Current double page.
#[flutter_rust_bridge::frb(sync)]
pub fn guestbook_page() -> GuestbookPageResponse {
    page_response(with_session(|session| session.page_view()))
}

#[flutter_rust_bridge::frb(sync)]
pub fn guestbook_prev_page() -> GuestbookPageResponse {
    page_response(with_session(|session| {
        session.prev_page();
        session.page_view()
    }))
}

#[flutter_rust_bridge::frb(sync)]
pub fn guestbook_next_page() -> GuestbookPageResponse {
    page_response(with_session(|session| {
        session.next_page();
        session.page_view()
    }))
}

/// Opens, closes or toggles the overlay. Returns the new open state.
///
/// `action` is one of `open|close|toggle`; anything else leaves the state.
#[flutter_rust_bridge::frb(sync)]
pub fn guestbook_overlay(action: String) -> bool {
    with_session(|session| {
        match action.trim().to_ascii_lowercase().as_str() {
            "open" => session.open(),
            "close" => session.close(),
            "toggle" => session.toggle(),
            other => warn!(
                "event=ffi_overlay module=ffi status=error error_code=unknown_action action={}",
                other
            ),
        }
        session.is_open()
    })
    .unwrap_or(false)
}

fn with_session<T>(f: impl FnOnce(&mut Session) -> T) -> Option<T> {
    SESSION.with(|slot| {
        let mut slot = slot.try_borrow_mut().ok()?;
        slot.as_mut().map(f)
    })
}

fn push_event(event: FeedEvent) -> GuestbookActionResponse {
    let pushed = with_session(|session| {
        if !session.feed().deliver(event) {
            return None;
        }
        Some(session.pump())
    });
    match pushed {
        Some(Some(mutations)) => {
            GuestbookActionResponse::success(format!("{mutations} change(s) applied"))
        }
        Some(None) => GuestbookActionResponse::failure("feed subscription is closed"),
        None => GuestbookActionResponse::failure("no open session"),
    }
}

fn parse_value(json: &str) -> Result<serde_json::Value, String> {
    serde_json::from_str(json).map_err(|err| format!("invalid record json: {err}"))
}

fn page_response(view: Option<PageView>) -> GuestbookPageResponse {
    let Some(view) = view else {
        return GuestbookPageResponse {
            ok: false,
            left: Vec::new(),
            right: Vec::new(),
            label: String::new(),
            has_prev: false,
            has_next: false,
            page_index: 0,
            total_pages: 0,
            message: "no open session".to_string(),
        };
    };
    GuestbookPageResponse {
        ok: true,
        left: view.left.into_iter().map(to_slot).collect(),
        right: view.right.into_iter().map(to_slot).collect(),
        label: view.label,
        has_prev: view.has_prev,
        has_next: view.has_next,
        page_index: u32::try_from(view.page_index).unwrap_or(u32::MAX),
        total_pages: u32::try_from(view.total_pages).unwrap_or(u32::MAX),
        message: String::new(),
    }
}

fn to_slot(slot: SlotView) -> GuestbookSlot {
    GuestbookSlot {
        note_id: slot.note_id.unwrap_or_default(),
        date_label: slot.date_label,
        body: slot.body,
    }
}

fn editor_response(rewritten: bool, view: EditorView) -> GuestbookEditorResponse {
    GuestbookEditorResponse {
        ok: true,
        rewritten,
        caret: u32::try_from(char_to_utf16_index(&view.display_text, view.caret))
            .unwrap_or(u32::MAX),
        text: view.display_text,
        counter_text: view.counter_text,
        severity: severity_label(view.severity).to_string(),
        message: String::new(),
    }
}

/// Char index of a UTF-16 offset; an offset inside a surrogate pair maps
/// to the position after that character.
fn utf16_to_char_index(text: &str, offset: usize) -> usize {
    let mut units = 0;
    for (index, c) in text.chars().enumerate() {
        if units >= offset {
            return index;
        }
        units += c.len_utf16();
    }
    text.chars().count()
}

fn char_to_utf16_index(text: &str, index: usize) -> usize {
    text.chars().take(index).map(char::len_utf16).sum()
}

fn severity_label(severity: CounterSeverity) -> &'static str {
    match severity {
        CounterSeverity::Normal => "normal",
        CounterSeverity::Warning => "warning",
        CounterSeverity::Limit => "limit",
    }
}

/// Feed whose transport lives on the host side of the bridge.
#[derive(Default)]
struct HostBridgeFeed {
    sender: Option<Sender<FeedEvent>>,
    query: Option<FeedQuery>,
    pending: RefCell<Vec<GuestbookPendingWrite>>,
    in_flight: RefCell<VecDeque<InFlightWrite>>,
}

struct InFlightWrite {
    write_id: String,
    path: String,
    on_complete: WriteCallback,
}

impl HostBridgeFeed {
    fn query(&self) -> Option<&FeedQuery> {
        self.query.as_ref()
    }

    fn deliver(&self, event: FeedEvent) -> bool {
        self.sender
            .as_ref()
            .is_some_and(|sender| sender.send(event).is_ok())
    }

    fn take_pending(&self) -> Vec<GuestbookPendingWrite> {
        std::mem::take(&mut *self.pending.borrow_mut())
    }

    fn complete(&self, write_id: &str, pushed_key: Option<String>, error: Option<String>) -> bool {
        let entry = {
            let mut in_flight = self.in_flight.borrow_mut();
            let position = in_flight
                .iter()
                .position(|entry| entry.write_id == write_id);
            position.and_then(|position| in_flight.remove(position))
        };
        let Some(InFlightWrite {
            path, on_complete, ..
        }) = entry
        else {
            return false;
        };
        match error {
            Some(message) => on_complete(Err(RemoteWriteError::Rejected { path, message })),
            None => on_complete(Ok(pushed_key.unwrap_or_else(|| write_id.to_string()))),
        }
        true
    }

    #[cfg(test)]
    fn in_flight_len(&self) -> usize {
        self.in_flight.borrow().len()
    }
}

impl RemoteFeed for HostBridgeFeed {
    fn subscribe(&mut self, query: &FeedQuery) -> Result<Receiver<FeedEvent>, SubscribeError> {
        if self.sender.is_some() {
            return Err(SubscribeError::AlreadySubscribed);
        }
        let (sender, receiver) = channel();
        self.sender = Some(sender);
        self.query = Some(query.clone());
        Ok(receiver)
    }

    fn write(&self, path: &str, record: WriteRecord, on_complete: WriteCallback) {
        let write_id = Uuid::new_v4().to_string();
        self.pending.borrow_mut().push(GuestbookPendingWrite {
            write_id: write_id.clone(),
            path: path.to_string(),
            payload_json: record.to_value().to_string(),
        });
        let evicted = {
            let mut in_flight = self.in_flight.borrow_mut();
            in_flight.push_back(InFlightWrite {
                write_id,
                path: path.to_string(),
                on_complete,
            });
            if in_flight.len() > MAX_IN_FLIGHT_WRITES {
                in_flight.pop_front()
            } else {
                None
            }
        };
        if let Some(stale) = evicted {
            warn!(
                "event=remote_write module=ffi status=error error_code=completion_missing write_id={}",
                stale.write_id
            );
            self.pending
                .borrow_mut()
                .retain(|write| write.write_id != stale.write_id);
            (stale.on_complete)(Err(RemoteWriteError::Disconnected));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{
        char_to_utf16_index, core_version, guestbook_close_session, guestbook_complete_write,
        guestbook_feed_query, guestbook_input_changed, guestbook_open_session, guestbook_overlay,
        guestbook_page, guestbook_push_added, guestbook_push_removed, guestbook_submit,
        guestbook_take_pending_writes, init_logging, ping, utf16_to_char_index, HostBridgeFeed,
        MAX_IN_FLIGHT_WRITES,
    };
    use guestbook_core::{RemoteFeed, WriteRecord};
    use serde_json::Value;
    use std::sync::mpsc::channel;

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }

    #[test]
    fn init_logging_rejects_empty_log_dir() {
        let error = init_logging("info".to_string(), String::new());
        assert!(!error.is_empty());
    }

    #[test]
    fn init_logging_rejects_unsupported_level() {
        let error = init_logging("verbose".to_string(), "tmp/logs".to_string());
        assert!(!error.is_empty());
    }

    #[test]
    fn calls_without_session_fail_softly() {
        assert!(!guestbook_page().ok);
        assert_eq!(guestbook_submit().status, "no_session");
        assert!(!guestbook_close_session().ok);
        assert!(guestbook_take_pending_writes().is_empty());
    }

    #[test]
    fn open_session_rejects_invalid_config() {
        let response = guestbook_open_session(Some("{ nope".to_string()), None, None, None);
        assert!(!response.ok);
    }

    #[test]
    fn pushed_notes_show_up_on_the_page() {
        let opened = guestbook_open_session(None, None, None, None);
        assert!(opened.ok, "{}", opened.message);
        assert_eq!(
            guestbook_feed_query().as_deref(),
            Some("guestbook|timestamp|2000")
        );

        let added = guestbook_push_added(
            "-Nabc".to_string(),
            r#"{"userId":"u1","text":"hello","timestamp":1700000000000}"#.to_string(),
        );
        assert!(added.ok, "{}", added.message);
        let page = guestbook_page();
        assert_eq!(page.label, "Page 1 / 1");
        assert_eq!(page.left[0].note_id, "-Nabc");
        assert_eq!(page.left[0].body, "hello");
        assert_eq!(page.left.len(), 5);

        assert!(guestbook_push_removed("-Nabc".to_string()).ok);
        assert_eq!(guestbook_page().label, "No notes yet.");
        assert!(guestbook_close_session().ok);
    }

    #[test]
    fn submit_queues_write_for_host_and_throttles_repeat() {
        let opened = guestbook_open_session(None, Some("guest".to_string()), None, None);
        assert!(opened.ok, "{}", opened.message);

        let editor = guestbook_input_changed("first note".to_string(), 10);
        assert!(editor.ok);
        assert!(!editor.rewritten);
        assert_eq!(editor.counter_text, "10 / 300");

        let submitted = guestbook_submit();
        assert_eq!(submitted.status, "sent");
        assert_eq!(submitted.text.as_deref(), Some("first note"));

        let writes = guestbook_take_pending_writes();
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].path, "guestbook");
        let payload: Value =
            serde_json::from_str(&writes[0].payload_json).expect("payload should be json");
        assert_eq!(payload["userId"], "guest");
        assert_eq!(payload["text"], "first note");
        assert_eq!(payload["timestamp"][".sv"], "timestamp");

        let completed =
            guestbook_complete_write(writes[0].write_id.clone(), Some("-Nnew".to_string()), None);
        assert!(completed.ok, "{}", completed.message);
        assert!(!guestbook_complete_write(writes[0].write_id.clone(), None, None).ok);

        guestbook_input_changed("second".to_string(), 6);
        assert_eq!(guestbook_submit().status, "throttled");
        assert!(guestbook_close_session().ok);
    }

    #[test]
    fn long_input_is_rewritten_for_the_host() {
        let config = r#"{ "max_chars_per_line": 10 }"#.to_string();
        let opened = guestbook_open_session(Some(config), None, Some(10.0), Some(105.0));
        assert!(opened.ok, "{}", opened.message);
        assert!(opened.message.contains("10 columns"));

        let editor = guestbook_input_changed("abcdefghijklmno".to_string(), 15);
        assert!(editor.rewritten);
        assert_eq!(editor.text, "abcdefghij\nklmno");
        assert_eq!(editor.caret, 16);
        assert!(guestbook_close_session().ok);
    }

    #[test]
    fn overlay_actions_report_open_state() {
        assert!(guestbook_open_session(None, None, None, None).ok);
        assert!(guestbook_overlay("open".to_string()));
        assert!(!guestbook_overlay("toggle".to_string()));
        assert!(!guestbook_overlay("close".to_string()));
        assert!(!guestbook_overlay("bogus".to_string()));
        assert!(guestbook_close_session().ok);
    }

    #[test]
    fn caret_offsets_convert_between_utf16_and_chars() {
        let text = "a😀b";
        assert_eq!(utf16_to_char_index(text, 0), 0);
        assert_eq!(utf16_to_char_index(text, 1), 1);
        assert_eq!(utf16_to_char_index(text, 3), 2);
        assert_eq!(utf16_to_char_index(text, 2), 2);
        assert_eq!(utf16_to_char_index(text, 99), 3);
        assert_eq!(char_to_utf16_index(text, 2), 3);
        assert_eq!(char_to_utf16_index(text, 3), 4);
    }

    #[test]
    fn rewritten_caret_is_reported_in_utf16_units() {
        let config = r#"{ "max_chars_per_line": 4 }"#.to_string();
        assert!(guestbook_open_session(Some(config), None, None, None).ok);

        // "😀😀😀😀😀" is five chars and ten UTF-16 units.
        let typed = "😀".repeat(5);
        let editor = guestbook_input_changed(typed, 10);
        assert!(editor.rewritten);
        assert_eq!(editor.text, format!("{}\n😀", "😀".repeat(4)));
        assert_eq!(editor.caret, 11);
        assert!(guestbook_close_session().ok);
    }

    #[test]
    fn unreported_writes_are_failed_once_the_cap_is_reached() {
        let feed = HostBridgeFeed::default();
        let (done_tx, done_rx) = channel();
        for i in 0..=MAX_IN_FLIGHT_WRITES {
            let done_tx = done_tx.clone();
            feed.write(
                "guestbook",
                WriteRecord::new("anon", format!("note {i}")),
                Box::new(move |result| done_tx.send((i, result)).expect("send result")),
            );
        }

        let (first, result) = done_rx.try_recv().expect("oldest write should be failed");
        assert_eq!(first, 0);
        assert!(result.is_err());
        assert!(done_rx.try_recv().is_err());
        assert_eq!(feed.in_flight_len(), MAX_IN_FLIGHT_WRITES);
        assert_eq!(feed.take_pending().len(), MAX_IN_FLIGHT_WRITES);
    }
}
