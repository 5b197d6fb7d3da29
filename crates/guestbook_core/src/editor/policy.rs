//! Pure edit policies for the composer buffer.
//!
//! Every step maps `(text, caret) -> (text, caret)` and is composed in the
//! fixed order soft breaks, line wrap, line limit, character limit. The
//! composition is iterated to a fixed point, so applying it to its own
//! output changes nothing.
//!
//! All positions are character indices; text is never sliced by byte.

/// Zero-width break marker inserted into long unbroken runs.
pub const SOFT_BREAK: char = '\u{200B}';

const MAX_POLICY_PASSES: usize = 4;

/// Buffer text plus caret, the unit every policy step maps.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextEdit {
    pub text: String,
    /// Character index, `0..=char_count(text)`.
    pub caret: usize,
}

impl TextEdit {
    /// Creates an edit, clamping the caret into the text.
    pub fn new(text: impl Into<String>, caret: usize) -> Self {
        let text = text.into();
        let caret = caret.min(text.chars().count());
        Self { text, caret }
    }

    /// Creates an edit with the caret after the last character.
    pub fn at_end(text: impl Into<String>) -> Self {
        Self::new(text, usize::MAX)
    }

    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }
}

/// Limits enforced on the composer buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditLimits {
    /// Non-separator run length after which a soft break is inserted;
    /// `0` disables soft breaks.
    pub max_run_length: usize,
    pub max_chars_per_line: usize,
    pub max_lines: usize,
    pub character_limit: usize,
}

impl EditLimits {
    /// Runs all policies in order until the buffer stops changing.
    pub fn apply(&self, edit: TextEdit) -> TextEdit {
        let mut current = edit;
        for _ in 0..MAX_POLICY_PASSES {
            let next = self.apply_once(current.clone());
            if next == current {
                return next;
            }
            current = next;
        }
        current
    }

    /// One pass of soft breaks, line wrap, line limit, character limit.
    pub fn apply_once(&self, edit: TextEdit) -> TextEdit {
        let edit = insert_soft_breaks(edit, self.max_run_length);
        let edit = wrap_lines(edit, self.max_chars_per_line);
        let edit = limit_lines(edit, self.max_lines);
        limit_characters(edit, self.character_limit)
    }

    /// Final clamp for submitted text, independent of the live policies.
    ///
    /// Returns `None` when nothing but whitespace is left.
    pub fn submission_text(&self, text: &str) -> Option<String> {
        let clean = strip_soft_breaks(text);
        let trimmed = clean.trim();
        if trimmed.is_empty() {
            return None;
        }

        let max_chars = self.max_chars_per_line.max(1);
        let clamped = trimmed
            .split('\n')
            .take(self.max_lines.max(1))
            .map(|line| line.chars().take(max_chars).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n");
        Some(clamped.chars().take(self.character_limit.max(1)).collect())
    }
}

pub fn is_soft_break(c: char) -> bool {
    c == SOFT_BREAK
}

pub fn strip_soft_breaks(text: &str) -> String {
    text.chars().filter(|c| !is_soft_break(*c)).collect()
}

/// Character count ignoring soft break markers.
pub fn visible_len(text: &str) -> usize {
    text.chars().filter(|c| !is_soft_break(*c)).count()
}

/// Whitespace, punctuation and symbols end a run; letters, digits and
/// everything else extend it.
fn ends_run(c: char) -> bool {
    c.is_whitespace() || (!c.is_alphanumeric() && !c.is_control())
}

/// Recomputes soft break markers from the marker-free text.
///
/// The caret keeps its marker-free offset `k` and gains one position for
/// every marker placed after one of the first `k` characters.
pub fn insert_soft_breaks(edit: TextEdit, max_run_length: usize) -> TextEdit {
    let chars: Vec<char> = edit.text.chars().collect();
    let caret = edit.caret.min(chars.len());
    let clean_caret = caret - chars[..caret].iter().filter(|c| is_soft_break(**c)).count();
    let clean: Vec<char> = chars.into_iter().filter(|c| !is_soft_break(*c)).collect();

    if max_run_length == 0 {
        return TextEdit {
            text: clean.into_iter().collect(),
            caret: clean_caret,
        };
    }

    let mut text = String::with_capacity(edit.text.len() + clean.len() / max_run_length * 3);
    let mut written = 0;
    let mut new_caret = 0;
    let mut run = 0;
    for (index, c) in clean.iter().copied().enumerate() {
        text.push(c);
        written += 1;
        if ends_run(c) {
            run = 0;
        } else {
            run += 1;
            if run >= max_run_length {
                text.push(SOFT_BREAK);
                written += 1;
                run = 0;
            }
        }
        if index + 1 == clean_caret {
            new_caret = written;
        }
    }

    TextEdit {
        text,
        caret: new_caret,
    }
}

/// Wraps every line longer than `max_chars_per_line` visible characters.
///
/// Breaks at the last whitespace inside the limit, trimming whitespace at
/// the break; without whitespace the line is cut exactly at the limit. The
/// overflow is prepended to the next line, separated by one space when the
/// next line starts with a non-whitespace character.
pub fn wrap_lines(edit: TextEdit, max_chars_per_line: usize) -> TextEdit {
    let max = max_chars_per_line.max(1);
    let mut lines: Vec<Vec<char>> = edit
        .text
        .split('\n')
        .map(|line| line.chars().collect())
        .collect();
    if lines.iter().all(|line| visible_count(line) <= max) {
        return edit;
    }

    let (mut caret_line, mut caret_col) = locate(&lines, edit.caret);
    let mut index = 0;
    while index < lines.len() {
        if visible_count(&lines[index]) <= max {
            index += 1;
            continue;
        }

        let line = std::mem::take(&mut lines[index]);
        let search_end = raw_index_of_visible(&line, max - 1);
        let break_at = (0..=search_end).rev().find(|&j| line[j].is_whitespace());

        let mut moved_caret = None;
        let (head, overflow) = match break_at {
            Some(split) => {
                let mut head_end = split;
                while head_end > 0 && line[head_end - 1].is_whitespace() {
                    head_end -= 1;
                }
                let mut tail_start = split + 1;
                while tail_start < line.len() && line[tail_start].is_whitespace() {
                    tail_start += 1;
                }
                if caret_line == index {
                    if caret_col <= split {
                        caret_col = caret_col.min(head_end);
                    } else {
                        moved_caret = Some(caret_col.saturating_sub(tail_start));
                    }
                }
                (line[..head_end].to_vec(), line[tail_start..].to_vec())
            }
            None => {
                let cut = cut_after_visible(&line, max);
                if caret_line == index && caret_col > cut {
                    moved_caret = Some(caret_col - cut);
                }
                (line[..cut].to_vec(), line[cut..].to_vec())
            }
        };
        lines[index] = head;

        if let Some(next) = lines.get_mut(index + 1) {
            let separated = !overflow.is_empty()
                && next.first().is_some_and(|first| !first.is_whitespace());
            if caret_line == index + 1 {
                caret_col += overflow.len() + usize::from(separated);
            }
            let mut joined = overflow;
            if separated {
                joined.push(' ');
            }
            joined.append(next);
            *next = joined;
        } else {
            lines.push(overflow);
        }

        if let Some(col) = moved_caret {
            caret_line = index + 1;
            caret_col = col;
        }
        index += 1;
    }

    let caret_col = caret_col.min(lines[caret_line].len());
    let caret = lines[..caret_line]
        .iter()
        .map(|line| line.len() + 1)
        .sum::<usize>()
        + caret_col;
    let text = lines
        .iter()
        .map(|line| line.iter().collect::<String>())
        .collect::<Vec<_>>()
        .join("\n");
    TextEdit { text, caret }
}

/// Keeps at most `max_lines` newline-separated lines.
pub fn limit_lines(edit: TextEdit, max_lines: usize) -> TextEdit {
    let max = max_lines.max(1);
    if edit.text.split('\n').count() <= max {
        return edit;
    }
    let text = edit.text.split('\n').take(max).collect::<Vec<_>>().join("\n");
    let caret = edit.caret.min(text.chars().count());
    TextEdit { text, caret }
}

/// Truncates the buffer to `character_limit` visible characters.
pub fn limit_characters(edit: TextEdit, character_limit: usize) -> TextEdit {
    let limit = character_limit.max(1);
    if visible_len(&edit.text) <= limit {
        return edit;
    }
    let chars: Vec<char> = edit.text.chars().collect();
    let cut = cut_after_visible(&chars, limit);
    TextEdit {
        text: chars[..cut].iter().collect(),
        caret: edit.caret.min(cut),
    }
}

fn visible_count(line: &[char]) -> usize {
    line.iter().filter(|c| !is_soft_break(**c)).count()
}

/// Raw index of the visible character with zero-based visible index `n`.
/// The caller guarantees the line holds more than `n` visible characters.
fn raw_index_of_visible(line: &[char], n: usize) -> usize {
    line.iter()
        .enumerate()
        .filter(|(_, c)| !is_soft_break(**c))
        .nth(n)
        .map(|(index, _)| index)
        .unwrap_or(line.len().saturating_sub(1))
}

/// Raw position right after the `n`-th visible character, markers that
/// directly follow it included.
fn cut_after_visible(chars: &[char], n: usize) -> usize {
    let mut cut = if n == 0 {
        0
    } else {
        raw_index_of_visible(chars, n - 1) + 1
    };
    while cut < chars.len() && is_soft_break(chars[cut]) {
        cut += 1;
    }
    cut
}

/// Splits a flat caret into (line, column).
fn locate(lines: &[Vec<char>], caret: usize) -> (usize, usize) {
    let mut remaining = caret;
    for (index, line) in lines.iter().enumerate() {
        if remaining <= line.len() {
            return (index, remaining);
        }
        remaining -= line.len() + 1;
    }
    let last = lines.len().saturating_sub(1);
    (last, lines.get(last).map_or(0, Vec::len))
}

#[cfg(test)]
mod tests {
    use super::{
        insert_soft_breaks, limit_characters, limit_lines, strip_soft_breaks, wrap_lines,
        EditLimits, TextEdit, SOFT_BREAK,
    };

    fn marked(text: &str) -> String {
        text.replace('|', &SOFT_BREAK.to_string())
    }

    #[test]
    fn soft_breaks_follow_every_full_run() {
        let edit = insert_soft_breaks(TextEdit::at_end("abcdefg"), 3);
        assert_eq!(edit.text, marked("abc|def|g"));
        assert_eq!(edit.caret, 9);
    }

    #[test]
    fn whitespace_and_punctuation_reset_the_run() {
        let edit = insert_soft_breaks(TextEdit::at_end("ab cd,ef+gh"), 3);
        assert_eq!(edit.text, "ab cd,ef+gh");
    }

    #[test]
    fn stale_markers_are_recomputed_not_accumulated() {
        let stale = TextEdit::new(marked("a|bcdef|"), 0);
        let edit = insert_soft_breaks(stale, 3);
        assert_eq!(edit.text, marked("abc|def|"));
        assert_eq!(edit.caret, 0);
    }

    #[test]
    fn soft_break_caret_counts_markers_before_it() {
        // Caret after "abcd" in marker-free terms.
        let edit = insert_soft_breaks(TextEdit::new("abcdefg", 4), 3);
        assert_eq!(edit.caret, 5);
        // Caret right after a completed run lands after its marker.
        let edit = insert_soft_breaks(TextEdit::new("abcdefg", 3), 3);
        assert_eq!(edit.caret, 4);
    }

    #[test]
    fn disabled_soft_breaks_only_strip_markers() {
        let edit = insert_soft_breaks(TextEdit::new(marked("ab|c"), 3), 0);
        assert_eq!(edit.text, "abc");
        assert_eq!(edit.caret, 2);
    }

    #[test]
    fn wrap_splits_at_last_whitespace_and_trims() {
        let edit = wrap_lines(TextEdit::at_end("hello big  world"), 10);
        assert_eq!(edit.text, "hello big\nworld");
        assert_eq!(edit.caret, edit.text.chars().count());
    }

    #[test]
    fn wrap_without_whitespace_cuts_at_limit() {
        let edit = wrap_lines(TextEdit::at_end("abcdefghijklmno"), 10);
        assert_eq!(edit.text, "abcdefghij\nklmno");
        assert_eq!(edit.caret, 16);
    }

    #[test]
    fn wrap_prepends_overflow_with_separator() {
        let edit = wrap_lines(TextEdit::new("aaaa bbbb cc\ndd", 0), 10);
        assert_eq!(edit.text, "aaaa bbbb\ncc dd");
    }

    #[test]
    fn wrap_keeps_caret_on_following_line_text() {
        // Caret before "dd" on the second line.
        let edit = wrap_lines(TextEdit::new("aaaa bbbb cc\ndd", 13), 10);
        assert_eq!(edit.text, "aaaa bbbb\ncc dd");
        assert_eq!(edit.caret, 13);
        assert_eq!(edit.text.chars().nth(edit.caret), Some('d'));
    }

    #[test]
    fn wrap_moves_caret_with_overflow() {
        // Caret between "c" and "c".
        let edit = wrap_lines(TextEdit::new("aaaa bbbb cc", 11), 10);
        assert_eq!(edit.text, "aaaa bbbb\ncc");
        assert_eq!(edit.caret, 11);
        // Caret in the untouched head stays.
        let edit = wrap_lines(TextEdit::new("aaaa bbbb cc", 2), 10);
        assert_eq!(edit.caret, 2);
    }

    #[test]
    fn wrap_ignores_markers_when_measuring() {
        let text = marked("abcde|fghij");
        let edit = wrap_lines(TextEdit::at_end(text.clone()), 10);
        assert_eq!(edit.text, text);
    }

    #[test]
    fn wrap_handles_multibyte_text() {
        let edit = wrap_lines(TextEdit::at_end("ěščřžýáíéúů"), 5);
        assert_eq!(edit.text, "ěščřž\nýáíéú\nů");
    }

    #[test]
    fn line_limit_drops_extra_lines_and_clamps_caret() {
        let edit = limit_lines(TextEdit::at_end("a\nb\nc\nd"), 2);
        assert_eq!(edit.text, "a\nb");
        assert_eq!(edit.caret, 3);
    }

    #[test]
    fn character_limit_counts_visible_characters() {
        let edit = limit_characters(TextEdit::at_end(marked("abc|def")), 4);
        assert_eq!(edit.text, marked("abc|d"));
        assert_eq!(edit.caret, 5);
    }

    #[test]
    fn full_pass_is_a_fixed_point() {
        let limits = EditLimits {
            max_run_length: 20,
            max_chars_per_line: 10,
            max_lines: 3,
            character_limit: 25,
        };
        let inputs = [
            "abcdefghijklmnopqrstuvwxy",
            "hello there general kenobi you are a bold one",
            "short\nlines\nonly\nfour",
            "",
            "   spaced    out    words   everywhere   ",
        ];
        for input in inputs {
            let once = limits.apply(TextEdit::at_end(input));
            let twice = limits.apply(once.clone());
            assert_eq!(once, twice, "input {input:?}");
            let clean = strip_soft_breaks(&once.text);
            assert!(clean.chars().count() <= 25);
            assert!(clean.split('\n').count() <= 3);
            assert!(clean.split('\n').all(|line| line.chars().count() <= 10));
            assert!(once.caret <= once.char_count());
        }
    }

    #[test]
    fn submission_text_trims_and_clamps() {
        let limits = EditLimits {
            max_run_length: 3,
            max_chars_per_line: 4,
            max_lines: 2,
            character_limit: 6,
        };
        assert_eq!(limits.submission_text("  \n \t "), None);
        assert_eq!(
            limits.submission_text(&marked("  abc|def\nghijk\nxyz  ")),
            Some("abcd\ng".to_string())
        );
    }
}
