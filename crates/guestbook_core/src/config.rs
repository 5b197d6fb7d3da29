//! Guestbook configuration.
//!
//! # Responsibility
//! - Hold paging, composer, display and feed settings with their defaults.
//! - Load settings from JSON and clamp invalid values to safe minimums.
//!
//! # Invariants
//! - `normalized()` never fails; invalid values are clamped and logged.
//! - Counts that size pages, lines or runs are at least 1 after
//!   normalization (`max_word_length_before_break` may stay 0 to disable
//!   soft breaks; `display_chars_per_line` may stay 0 to derive it).

use crate::editor::policy::EditLimits;
use log::warn;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

/// Configuration loading failures.
#[derive(Debug)]
pub enum ConfigError {
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse(serde_json::Error),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Read { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "invalid config json: {err}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Read { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(value: serde_json::Error) -> Self {
        Self::Parse(value)
    }
}

/// Guestbook settings. Unknown fields are rejected, missing ones default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GuestbookConfig {
    /// Note slots per page side.
    pub items_per_side: usize,
    pub submit_cooldown_secs: f64,
    /// `0` disables soft break markers.
    pub max_word_length_before_break: usize,
    pub input_character_limit: usize,
    pub max_input_lines: usize,
    pub max_chars_per_line: usize,
    /// `0` derives the column count from glyph fit.
    pub display_chars_per_line: usize,
    pub display_max_lines: usize,
    /// Upper bound of the glyph-fit search.
    pub glyph_fit_max_test: usize,
    /// Remote collection holding the notes.
    pub collection_path: String,
    /// Number of newest notes the subscription asks for.
    pub feed_limit: u32,
}

impl Default for GuestbookConfig {
    fn default() -> Self {
        Self {
            items_per_side: 5,
            submit_cooldown_secs: 5.0,
            max_word_length_before_break: 20,
            input_character_limit: 300,
            max_input_lines: 7,
            max_chars_per_line: 50,
            display_chars_per_line: 0,
            display_max_lines: 7,
            glyph_fit_max_test: 200,
            collection_path: "guestbook".to_string(),
            feed_limit: 2000,
        }
    }
}

impl GuestbookConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// Returns a copy with every invalid value clamped to a safe minimum.
    pub fn normalized(&self) -> Self {
        let mut config = self.clone();
        clamp_min("items_per_side", &mut config.items_per_side, 1);
        clamp_min("input_character_limit", &mut config.input_character_limit, 1);
        clamp_min("max_input_lines", &mut config.max_input_lines, 1);
        clamp_min("max_chars_per_line", &mut config.max_chars_per_line, 1);
        clamp_min("display_max_lines", &mut config.display_max_lines, 1);
        clamp_min("glyph_fit_max_test", &mut config.glyph_fit_max_test, 1);
        if config.feed_limit == 0 {
            warn!("event=config_clamp module=config status=warn field=feed_limit value=0 clamped=1");
            config.feed_limit = 1;
        }
        if !(config.submit_cooldown_secs.is_finite() && config.submit_cooldown_secs >= 0.0) {
            warn!(
                "event=config_clamp module=config status=warn field=submit_cooldown_secs value={} clamped=0",
                config.submit_cooldown_secs
            );
            config.submit_cooldown_secs = 0.0;
        }
        let trimmed = config.collection_path.trim().trim_matches('/').to_string();
        if trimmed.is_empty() {
            warn!("event=config_clamp module=config status=warn field=collection_path clamped=guestbook");
            config.collection_path = Self::default().collection_path;
        } else {
            config.collection_path = trimmed;
        }
        config
    }

    /// Composer limits derived from this configuration.
    pub fn edit_limits(&self) -> EditLimits {
        EditLimits {
            max_run_length: self.max_word_length_before_break,
            max_chars_per_line: self.max_chars_per_line.max(1),
            max_lines: self.max_input_lines.max(1),
            character_limit: self.input_character_limit.max(1),
        }
    }
}

fn clamp_min(field: &str, value: &mut usize, min: usize) {
    if *value < min {
        warn!(
            "event=config_clamp module=config status=warn field={} value={} clamped={}",
            field, value, min
        );
        *value = min;
    }
}

#[cfg(test)]
mod tests {
    use super::GuestbookConfig;

    #[test]
    fn defaults_match_guestbook_layout() {
        let config = GuestbookConfig::default();
        assert_eq!(config.items_per_side, 5);
        assert_eq!(config.input_character_limit, 300);
        assert_eq!(config.max_input_lines, 7);
        assert_eq!(config.max_chars_per_line, 50);
        assert_eq!(config.max_word_length_before_break, 20);
        assert_eq!(config.feed_limit, 2000);
    }

    #[test]
    fn normalized_clamps_non_positive_values() {
        let config = GuestbookConfig {
            items_per_side: 0,
            max_chars_per_line: 0,
            submit_cooldown_secs: f64::NAN,
            collection_path: " / ".to_string(),
            ..GuestbookConfig::default()
        }
        .normalized();
        assert_eq!(config.items_per_side, 1);
        assert_eq!(config.max_chars_per_line, 1);
        assert_eq!(config.submit_cooldown_secs, 0.0);
        assert_eq!(config.collection_path, "guestbook");
    }

    #[test]
    fn zero_break_length_stays_disabled() {
        let config = GuestbookConfig {
            max_word_length_before_break: 0,
            ..GuestbookConfig::default()
        }
        .normalized();
        assert_eq!(config.edit_limits().max_run_length, 0);
    }
}
