//! Composer buffer state machine.
//!
//! # Responsibility
//! - Own the composer text and caret between edits.
//! - Apply `EditLimits` on every host-reported change.
//! - Expose counter state and the submission snapshot.
//!
//! # Invariants
//! - The stored buffer always satisfies `EditLimits`.
//! - A rewrite handed to the host is not reprocessed when the host reports
//!   it back as a change.

use crate::editor::policy::{visible_len, EditLimits, TextEdit};

/// Share of the limit at which the counter turns into a warning.
const WARNING_RATIO: f64 = 0.8;

/// Visual tier of the character counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterSeverity {
    Normal,
    /// At least 80% of the limit used.
    Warning,
    /// Limit reached.
    Limit,
}

/// Character counter state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CharacterCounter {
    pub current: usize,
    pub limit: usize,
}

impl CharacterCounter {
    pub fn severity(&self) -> CounterSeverity {
        if self.current >= self.limit {
            CounterSeverity::Limit
        } else if self.current as f64 >= self.limit as f64 * WARNING_RATIO {
            CounterSeverity::Warning
        } else {
            CounterSeverity::Normal
        }
    }

    pub fn text(&self) -> String {
        format!("{} / {}", self.current, self.limit)
    }
}

/// Everything the renderer needs for the composer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorView {
    pub display_text: String,
    pub caret: usize,
    pub counter_text: String,
    pub severity: CounterSeverity,
}

/// Result of one host-reported change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOutcome {
    /// Policies rewrote the buffer; the host must show this text and caret.
    Rewritten(TextEdit),
    /// Buffer already satisfied every policy.
    Unchanged,
    /// Host reported our own rewrite back; nothing was reprocessed.
    Echo,
}

/// Composer buffer with live wrap and limit enforcement.
#[derive(Debug, Clone)]
pub struct ConstrainedTextEditor {
    limits: EditLimits,
    buffer: TextEdit,
    pending_echo: Option<String>,
}

impl ConstrainedTextEditor {
    pub fn new(limits: EditLimits) -> Self {
        Self {
            limits,
            buffer: TextEdit::default(),
            pending_echo: None,
        }
    }

    pub fn limits(&self) -> &EditLimits {
        &self.limits
    }

    pub fn text(&self) -> &str {
        &self.buffer.text
    }

    pub fn caret(&self) -> usize {
        self.buffer.caret
    }

    /// Handles a change reported by the host input field.
    pub fn on_value_changed(&mut self, text: &str, caret: usize) -> EditOutcome {
        let incoming = TextEdit::new(text, caret);
        if let Some(echo) = self.pending_echo.take() {
            if echo == incoming.text {
                self.buffer = incoming;
                return EditOutcome::Echo;
            }
        }

        let result = self.limits.apply(incoming.clone());
        if result == incoming {
            self.buffer = incoming;
            return EditOutcome::Unchanged;
        }

        self.pending_echo = Some(result.text.clone());
        self.buffer = result.clone();
        EditOutcome::Rewritten(result)
    }

    pub fn counter(&self) -> CharacterCounter {
        // Soft break markers are not counted; the character limit is
        // enforced on the same visible length, so a full buffer reads
        // `limit / limit`.
        CharacterCounter {
            current: visible_len(&self.buffer.text),
            limit: self.limits.character_limit.max(1),
        }
    }

    pub fn view(&self) -> EditorView {
        let counter = self.counter();
        EditorView {
            display_text: self.buffer.text.clone(),
            caret: self.buffer.caret,
            counter_text: counter.text(),
            severity: counter.severity(),
        }
    }

    /// Final submission text, or `None` when the buffer is blank.
    pub fn submission_text(&self) -> Option<String> {
        self.limits.submission_text(&self.buffer.text)
    }

    /// Empties the buffer after a submission.
    pub fn clear(&mut self) {
        if !self.buffer.text.is_empty() {
            self.pending_echo = Some(String::new());
        }
        self.buffer = TextEdit::default();
    }
}
