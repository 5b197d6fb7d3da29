//! Glyph-fit search.
//!
//! # Responsibility
//! - Find how many characters of a fixed font/size fit a target width.
//!
//! # Invariants
//! - Probe width is assumed non-decreasing in character count.
//! - The result is at least 1 whenever a measurer is available.

use log::debug;

/// Character used to build probe strings.
pub const PROBE_CHAR: char = 'X';
/// Default upper bound of the search.
pub const DEFAULT_MAX_TEST: usize = 200;

/// Text measurement for one font/size context.
pub trait TextMeasurer {
    /// Width of `sample` in pixels.
    fn measure(&self, sample: &str) -> f32;
}

impl<F> TextMeasurer for F
where
    F: Fn(&str) -> f32,
{
    fn measure(&self, sample: &str) -> f32 {
        self(sample)
    }
}

/// Largest probe length in `1..=max_test` whose width fits `target_width`.
///
/// Returns `fallback` when no measurer is available or the target width is
/// not a finite number.
pub fn chars_that_fit(
    measurer: Option<&dyn TextMeasurer>,
    target_width: f32,
    max_test: usize,
    fallback: usize,
) -> usize {
    let Some(measurer) = measurer else {
        return fallback;
    };
    if !target_width.is_finite() {
        return fallback;
    }

    let mut lo = 1usize;
    let mut hi = max_test.max(1);
    let mut best = 0usize;
    while lo <= hi {
        let mid = lo + (hi - lo) / 2;
        let probe: String = std::iter::repeat(PROBE_CHAR).take(mid).collect();
        if measurer.measure(&probe) <= target_width {
            best = mid;
            lo = mid + 1;
        } else {
            hi = mid - 1;
        }
    }

    let fit = best.max(1);
    debug!(
        "event=glyph_fit module=glyph_fit status=ok target_width={} chars={}",
        target_width, fit
    );
    fit
}

#[cfg(test)]
mod tests {
    use super::{chars_that_fit, TextMeasurer, DEFAULT_MAX_TEST};

    fn ten_px(sample: &str) -> f32 {
        sample.chars().count() as f32 * 10.0
    }

    #[test]
    fn finds_largest_fitting_count() {
        let measurer: &dyn TextMeasurer = &ten_px;
        assert_eq!(chars_that_fit(Some(measurer), 105.0, DEFAULT_MAX_TEST, 40), 10);
        assert_eq!(chars_that_fit(Some(measurer), 100.0, DEFAULT_MAX_TEST, 40), 10);
    }

    #[test]
    fn caps_at_max_test_and_floors_at_one() {
        let measurer: &dyn TextMeasurer = &ten_px;
        assert_eq!(chars_that_fit(Some(measurer), 1e9, 50, 40), 50);
        assert_eq!(chars_that_fit(Some(measurer), 3.0, 50, 40), 1);
    }

    #[test]
    fn falls_back_without_measurer_or_with_bad_width() {
        assert_eq!(chars_that_fit(None, 105.0, DEFAULT_MAX_TEST, 40), 40);
        let measurer: &dyn TextMeasurer = &ten_px;
        assert_eq!(chars_that_fit(Some(measurer), f32::NAN, 50, 40), 40);
    }
}
