//! Remote feed contract and in-memory fake.
//!
//! # Responsibility
//! - Describe the subscription/write surface the core needs from a remote
//!   store, without binding to any transport.
//! - Deliver feed events as messages over a channel so the store can be
//!   driven as a reducer, one event at a time.
//! - Provide `InMemoryFeed` for tests, demos and host bridges.
//!
//! # Invariants
//! - Events for one key arrive in the order the remote store applied them.
//! - Writes are fire-and-forget; completion is reported through a callback
//!   used only for diagnostics.

use crate::sync::record::{RawRecord, FIELD_TEXT, FIELD_TIMESTAMP, FIELD_USER_ID};
use chrono::Utc;
use log::warn;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::{json, Value};
use std::cell::Cell;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::mpsc::{channel, Receiver, Sender};
use uuid::Uuid;

/// Field name of the server-value placeholder.
pub const SERVER_VALUE_KEY: &str = ".sv";
/// Placeholder value asking the remote store to stamp its own clock.
pub const SERVER_VALUE_TIMESTAMP: &str = "timestamp";

/// One message from the remote feed.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedEvent {
    Added(RawRecord),
    Changed(RawRecord),
    Removed { key: String },
    /// Transport-level failure reported in place of a record.
    Error { message: String },
}

/// Subscription request: last `limit_to_last` children of `path` ordered by
/// `order_by_child`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedQuery {
    pub path: String,
    pub order_by_child: String,
    pub limit_to_last: u32,
}

impl FeedQuery {
    /// Query ordered by the note timestamp field.
    pub fn by_timestamp(path: impl Into<String>, limit_to_last: u32) -> Self {
        Self {
            path: path.into(),
            order_by_child: FIELD_TIMESTAMP.to_string(),
            limit_to_last,
        }
    }
}

/// Marker serialized as `{".sv": "timestamp"}` and resolved remotely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ServerTimestamp;

impl Serialize for ServerTimestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(SERVER_VALUE_KEY, SERVER_VALUE_TIMESTAMP)?;
        map.end()
    }
}

/// Payload written when a note is submitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WriteRecord {
    #[serde(rename = "userId")]
    pub user_id: String,
    pub text: String,
    pub timestamp: ServerTimestamp,
}

impl WriteRecord {
    pub fn new(user_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            text: text.into(),
            timestamp: ServerTimestamp,
        }
    }

    /// Wire form of this record.
    pub fn to_value(&self) -> Value {
        json!({
            FIELD_USER_ID: self.user_id,
            FIELD_TEXT: self.text,
            FIELD_TIMESTAMP: { SERVER_VALUE_KEY: SERVER_VALUE_TIMESTAMP },
        })
    }
}

/// Remote write failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteWriteError {
    /// Remote store refused the write.
    Rejected { path: String, message: String },
    /// No live connection to deliver the write.
    Disconnected,
}

impl Display for RemoteWriteError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Rejected { path, message } => {
                write!(f, "write to `{path}` rejected: {message}")
            }
            Self::Disconnected => write!(f, "remote feed is disconnected"),
        }
    }
}

impl Error for RemoteWriteError {}

/// Subscription failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubscribeError {
    /// The feed hands out a single event stream.
    AlreadySubscribed,
}

impl Display for SubscribeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AlreadySubscribed => write!(f, "feed already has an active subscription"),
        }
    }
}

impl Error for SubscribeError {}

/// Completion callback for one write; receives the pushed key on success.
pub type WriteCallback = Box<dyn FnOnce(Result<String, RemoteWriteError>) + Send + 'static>;

/// Transport-agnostic remote store.
pub trait RemoteFeed {
    /// Starts delivering events for `query` over the returned channel.
    fn subscribe(&mut self, query: &FeedQuery) -> Result<Receiver<FeedEvent>, SubscribeError>;

    /// Pushes `record` as a new child of `path`. Must not block.
    fn write(&self, path: &str, record: WriteRecord, on_complete: WriteCallback);
}

/// Cloneable producer side of an `InMemoryFeed`.
#[derive(Debug, Clone)]
pub struct FeedHandle {
    sender: Sender<FeedEvent>,
}

impl FeedHandle {
    /// Returns `false` when the subscriber side is gone.
    pub fn send(&self, event: FeedEvent) -> bool {
        self.sender.send(event).is_ok()
    }

    pub fn added(&self, key: impl Into<String>, value: Value) -> bool {
        self.send(FeedEvent::Added(RawRecord::new(key, value)))
    }

    pub fn changed(&self, key: impl Into<String>, value: Value) -> bool {
        self.send(FeedEvent::Changed(RawRecord::new(key, value)))
    }

    pub fn removed(&self, key: impl Into<String>) -> bool {
        self.send(FeedEvent::Removed { key: key.into() })
    }

    pub fn error(&self, message: impl Into<String>) -> bool {
        self.send(FeedEvent::Error {
            message: message.into(),
        })
    }
}

/// Channel-backed fake remote store.
///
/// Writes to the subscribed path are echoed back as `Added` events with a
/// fresh key and a resolved server timestamp, the way a live store echoes
/// local pushes to its listeners.
pub struct InMemoryFeed {
    sender: Sender<FeedEvent>,
    receiver: Option<Receiver<FeedEvent>>,
    query: Option<FeedQuery>,
    server_clock_ms: Cell<Option<i64>>,
    reject_writes: Cell<Option<String>>,
}

impl InMemoryFeed {
    /// Creates a feed stamping writes with the wall clock.
    pub fn new() -> (Self, FeedHandle) {
        let (sender, receiver) = channel();
        let handle = FeedHandle {
            sender: sender.clone(),
        };
        let feed = Self {
            sender,
            receiver: Some(receiver),
            query: None,
            server_clock_ms: Cell::new(None),
            reject_writes: Cell::new(None),
        };
        (feed, handle)
    }

    /// Creates a feed whose server clock starts at `start_ms` and advances
    /// by one millisecond per accepted write.
    pub fn with_server_clock(start_ms: i64) -> (Self, FeedHandle) {
        let (feed, handle) = Self::new();
        feed.server_clock_ms.set(Some(start_ms));
        (feed, handle)
    }

    /// Makes every following write fail with `message`.
    pub fn reject_writes(&self, message: impl Into<String>) {
        self.reject_writes.set(Some(message.into()));
    }

    /// Accepts writes again.
    pub fn accept_writes(&self) {
        self.reject_writes.set(None);
    }

    /// Active subscription query, if any.
    pub fn query(&self) -> Option<&FeedQuery> {
        self.query.as_ref()
    }

    fn next_server_millis(&self) -> i64 {
        match self.server_clock_ms.get() {
            Some(now) => {
                self.server_clock_ms.set(Some(now + 1));
                now
            }
            None => Utc::now().timestamp_millis(),
        }
    }
}

impl RemoteFeed for InMemoryFeed {
    fn subscribe(&mut self, query: &FeedQuery) -> Result<Receiver<FeedEvent>, SubscribeError> {
        let receiver = self
            .receiver
            .take()
            .ok_or(SubscribeError::AlreadySubscribed)?;
        self.query = Some(query.clone());
        Ok(receiver)
    }

    fn write(&self, path: &str, record: WriteRecord, on_complete: WriteCallback) {
        let rejection = self.reject_writes.take();
        if let Some(message) = rejection {
            self.reject_writes.set(Some(message.clone()));
            on_complete(Err(RemoteWriteError::Rejected {
                path: path.to_string(),
                message,
            }));
            return;
        }

        let key = Uuid::new_v4().to_string();
        let mut value = record.to_value();
        value[FIELD_TIMESTAMP] = json!(self.next_server_millis());

        let subscribed = self
            .query
            .as_ref()
            .is_some_and(|query| query.path == path);
        if subscribed
            && self
                .sender
                .send(FeedEvent::Added(RawRecord::new(key.clone(), value)))
                .is_err()
        {
            warn!("event=remote_write module=feed status=error error_code=echo_dropped");
            on_complete(Err(RemoteWriteError::Disconnected));
            return;
        }

        on_complete(Ok(key));
    }
}

#[cfg(test)]
mod tests {
    use super::{FeedEvent, FeedQuery, InMemoryFeed, RemoteFeed, SubscribeError, WriteRecord};
    use serde_json::json;
    use std::sync::mpsc::channel;

    #[test]
    fn write_record_serializes_server_timestamp_placeholder() {
        let record = WriteRecord::new("anon", "hello");
        let via_serde = serde_json::to_value(&record).expect("record should serialize");
        assert_eq!(via_serde, record.to_value());
        assert_eq!(via_serde["timestamp"], json!({".sv": "timestamp"}));
    }

    #[test]
    fn subscribe_hands_out_single_stream() {
        let (mut feed, _handle) = InMemoryFeed::new();
        let query = FeedQuery::by_timestamp("guestbook", 2000);
        feed.subscribe(&query).expect("first subscribe");
        assert_eq!(
            feed.subscribe(&query).expect_err("second subscribe must fail"),
            SubscribeError::AlreadySubscribed
        );
        assert_eq!(feed.query().map(|q| q.order_by_child.as_str()), Some("timestamp"));
    }

    #[test]
    fn write_echoes_added_event_with_resolved_timestamp() {
        let (mut feed, _handle) = InMemoryFeed::with_server_clock(1_000);
        let events = feed
            .subscribe(&FeedQuery::by_timestamp("guestbook", 10))
            .expect("subscribe");
        let (done_tx, done_rx) = channel();
        feed.write(
            "guestbook",
            WriteRecord::new("u1", "hi"),
            Box::new(move |result| done_tx.send(result).expect("send result")),
        );

        let key = done_rx
            .recv()
            .expect("callback should run")
            .expect("write should succeed");
        match events.try_recv().expect("echo event") {
            FeedEvent::Added(record) => {
                assert_eq!(record.key, key);
                assert_eq!(record.value["timestamp"], 1_000);
                assert_eq!(record.value["text"], "hi");
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn rejected_write_reports_error_and_emits_nothing() {
        let (mut feed, _handle) = InMemoryFeed::new();
        let events = feed
            .subscribe(&FeedQuery::by_timestamp("guestbook", 10))
            .expect("subscribe");
        feed.reject_writes("permission denied");
        let (done_tx, done_rx) = channel();
        feed.write(
            "guestbook",
            WriteRecord::new("u1", "hi"),
            Box::new(move |result| done_tx.send(result).expect("send result")),
        );
        assert!(done_rx.recv().expect("callback should run").is_err());
        assert!(events.try_recv().is_err());

        feed.accept_writes();
        let (done_tx, done_rx) = channel();
        feed.write(
            "guestbook",
            WriteRecord::new("u1", "again"),
            Box::new(move |result| done_tx.send(result).expect("send result")),
        );
        assert!(done_rx.recv().expect("callback should run").is_ok());
    }

    #[test]
    fn handle_events_reach_subscriber_in_order() {
        let (mut feed, handle) = InMemoryFeed::new();
        let events = feed
            .subscribe(&FeedQuery::by_timestamp("guestbook", 10))
            .expect("subscribe");
        assert!(handle.added("a", json!({})));
        assert!(handle.removed("a"));
        assert!(matches!(events.try_recv(), Ok(FeedEvent::Added(_))));
        assert!(matches!(events.try_recv(), Ok(FeedEvent::Removed { .. })));
    }
}
