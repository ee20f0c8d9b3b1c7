//! # Page Break Decisions
//!
//! The pure arithmetic behind pagination: whether a space counts as a
//! fresh page, how many stacked children fit whole, and how many lines of a
//! leaf fit. Kept free of tree types so the rules can be tested on plain
//! numbers.

/// Tolerance when comparing available space against a fresh page.
pub const FRESH_TOLERANCE: f64 = 0.5;

/// Lines of content a node must have room for before it may start on a page.
pub const MIN_CONTENT_LINES: f64 = 3.0;

/// Slack allowed when checking a fragment against its granted space.
pub const HEIGHT_EPSILON: f64 = 1e-6;

/// True when nothing has been consumed yet, i.e. `available` is as tall as
/// the page the content would move to.
pub fn is_fresh(available: f64, next_page: f64) -> bool {
    (next_page - available).abs() < FRESH_TOLERANCE
}

/// True when the node's fixed parts, plus room for a few lines, cannot start
/// in `available`.
pub fn base_too_tall(base: f64, line_height: f64, available: f64) -> bool {
    base > available || base + MIN_CONTENT_LINES * line_height > available
}

/// How many leading children fit whole after `base` has been consumed.
///
/// Returns the count and the height consumed including `base`. A child only
/// counts as fitting when it leaves some space behind; the child that
/// would exactly fill the rest is treated as the one to split.
pub fn fit_count(base: f64, heights: &[f64], available: f64) -> (usize, f64) {
    let mut consumed = base;
    let mut count = 0;
    for &h in heights {
        if consumed + h >= available {
            break;
        }
        consumed += h;
        count += 1;
    }
    (count, consumed)
}

/// Number of whole lines that fit in `available` after line padding.
pub fn max_lines(available: f64, line_padding: f64, line_height: f64) -> usize {
    if line_height <= 0.0 {
        return 0;
    }
    let room = available - line_padding;
    if room <= 0.0 {
        return 0;
    }
    ((room + HEIGHT_EPSILON) / line_height).floor() as usize
}
