//! Raw remote record decoding.
//!
//! # Responsibility
//! - Turn key-value records from the remote feed into `Note` values.
//! - Normalize loosely typed fields (numeric timestamps, missing author).
//!
//! # Invariants
//! - Missing author becomes `"anon"`, missing body becomes `""`.
//! - Missing or unparseable timestamp becomes `0`.
//! - Only structurally unusable records (no key, non-object value) fail.

use crate::model::note::{Note, ANONYMOUS_AUTHOR};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Field holding the author id.
pub const FIELD_USER_ID: &str = "userId";
/// Field holding the note body.
pub const FIELD_TEXT: &str = "text";
/// Field holding the server timestamp in epoch milliseconds.
pub const FIELD_TIMESTAMP: &str = "timestamp";

/// One keyed record as delivered by the remote feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    /// Remote child key.
    pub key: String,
    /// Record payload, expected to be an object.
    #[serde(default)]
    pub value: Value,
}

impl RawRecord {
    pub fn new(key: impl Into<String>, value: Value) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }
}

/// Record decoding failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordParseError {
    /// Record key is empty.
    MissingKey,
    /// Record payload is neither an object nor null.
    NotAnObject { key: String },
}

impl Display for RecordParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingKey => write!(f, "remote record has no key"),
            Self::NotAnObject { key } => {
                write!(f, "remote record `{key}` payload is not an object")
            }
        }
    }
}

impl Error for RecordParseError {}

/// Decodes one raw record into a note.
///
/// A `null` payload is accepted and yields all-default fields, matching a
/// child snapshot whose fields were never written.
///
/// # Errors
/// - `MissingKey` when the key is empty. Keys are opaque and kept verbatim.
/// - `NotAnObject` when the payload is a scalar or an array.
pub fn parse_note(record: &RawRecord) -> Result<Note, RecordParseError> {
    let key = record.key.as_str();
    if key.is_empty() {
        return Err(RecordParseError::MissingKey);
    }

    let fields = match &record.value {
        Value::Object(map) => Some(map),
        Value::Null => None,
        _ => {
            return Err(RecordParseError::NotAnObject {
                key: key.to_string(),
            })
        }
    };
    let field = |name: &str| fields.and_then(|map| map.get(name));

    Ok(Note {
        id: key.to_string(),
        author_id: field_to_string(field(FIELD_USER_ID))
            .unwrap_or_else(|| ANONYMOUS_AUTHOR.to_string()),
        body: field_to_string(field(FIELD_TEXT)).unwrap_or_default(),
        created_at_ms: field(FIELD_TIMESTAMP).map(timestamp_millis).unwrap_or(0),
    })
}

/// Normalizes an integer or floating-point timestamp to epoch milliseconds.
///
/// Floating values round half-to-even. Non-finite or out-of-range values,
/// and anything that is not numeric, map to `0`. Numeric strings are
/// accepted because some writers store the timestamp as text.
pub fn timestamp_millis(value: &Value) -> i64 {
    match value {
        Value::Number(number) => {
            if let Some(value) = number.as_i64() {
                value
            } else {
                number.as_f64().map(float_millis).unwrap_or(0)
            }
        }
        Value::String(text) => {
            let text = text.trim();
            text.parse::<i64>()
                .ok()
                .or_else(|| text.parse::<f64>().ok().map(float_millis))
                .unwrap_or(0)
        }
        _ => 0,
    }
}

fn float_millis(value: f64) -> i64 {
    if !value.is_finite() {
        return 0;
    }
    let rounded = value.round_ties_even();
    if rounded < i64::MIN as f64 || rounded >= i64::MAX as f64 {
        return 0;
    }
    rounded as i64
}

fn field_to_string(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Null => None,
        Value::String(text) => Some(text.clone()),
        other => Some(other.to_string()),
    }
}
