//! Constrained note composer.
//!
//! # Responsibility
//! - Keep the composer buffer inside line-length, line-count and total
//!   character limits while the user types.
//! - Produce the final submission text.
//!
//! # Invariants
//! - Limits are measured on marker-free text.
//! - The caret is a character index inside `0..=char_count(text)`.

pub mod policy;
pub mod text_editor;
