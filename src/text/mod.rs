//! # Text Measurement
//!
//! Line wrapping, line height and string width.
//!
//! The layout engine never measures text itself; it asks a `Measure`
//! implementation. `StandardMetrics` covers the standard PDF font families
//! and breaks lines at UAX#14 opportunities.

use crate::style::ResolvedStyle;
use unicode_linebreak::{linebreaks, BreakOpportunity};

/// Multiplier from font size to line height.
pub const LINE_HEIGHT_FACTOR: f64 = 1.15;

/// The measurement collaborator. Implementations must be deterministic for a
/// fixed (text, width, style) triple.
pub trait Measure {
    /// Break `text` into lines no wider than `max_width`.
    fn wrap_text(&self, text: &str, max_width: f64, style: &ResolvedStyle) -> Vec<String>;

    /// Height of one line of text in this style.
    fn line_height(&self, style: &ResolvedStyle) -> f64;

    /// Advance width of `text` in this style.
    fn string_width(&self, text: &str, style: &ResolvedStyle) -> f64;
}

/// Font families with built-in metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StandardFamily {
    Courier,
    Helvetica,
    Times,
}

impl StandardFamily {
    /// Map a family name to a standard family. Unknown names fall back to
    /// Helvetica.
    pub fn from_name(name: &str) -> Self {
        let lower = name.to_ascii_lowercase();
        if lower.starts_with("courier") || lower == "monospace" {
            StandardFamily::Courier
        } else if lower.starts_with("times") || lower == "serif" {
            StandardFamily::Times
        } else {
            StandardFamily::Helvetica
        }
    }

    /// Advance width of `ch` in 1/1000 em.
    ///
    /// Courier is exact. Helvetica and Times use per-class approximations of
    /// their AFM widths.
    fn advance(&self, ch: char, bold: bool) -> f64 {
        match self {
            StandardFamily::Courier => 600.0,
            StandardFamily::Helvetica => {
                let base = match ch {
                    ' ' | 'i' | 'j' | 'l' | '.' | ',' | ':' | ';' | '!' | '\'' | '|' => 278.0,
                    'f' | 't' | 'r' | 'I' | '(' | ')' | '-' | '/' => 333.0,
                    'm' | 'M' => 833.0,
                    'w' | 'W' => 778.0,
                    c if c.is_ascii_uppercase() => 667.0,
                    _ => 556.0,
                };
                if bold {
                    base * 1.08
                } else {
                    base
                }
            }
            StandardFamily::Times => {
                let base = match ch {
                    ' ' | 'i' | 'j' | 'l' | '.' | ',' | ':' | ';' | '\'' | '|' => 250.0,
                    'f' | 't' | 'r' | 'I' | '(' | ')' | '-' | '/' | '!' => 333.0,
                    'm' | 'M' => 889.0,
                    'w' | 'W' => 722.0,
                    c if c.is_ascii_uppercase() => 667.0,
                    _ => 500.0,
                };
                if bold {
                    base * 1.05
                } else {
                    base
                }
            }
        }
    }
}

/// Measurement with the standard PDF font families.
#[derive(Debug, Clone, Default)]
pub struct StandardMetrics;

impl StandardMetrics {
    pub fn new() -> Self {
        Self
    }

    fn char_width(&self, ch: char, style: &ResolvedStyle) -> f64 {
        let family = StandardFamily::from_name(&style.font);
        family.advance(ch, style.font_style.is_bold()) / 1000.0 * style.font_size
    }

    /// Append a segment that is wider than a whole line, cutting it between
    /// characters.
    fn push_overlong(
        &self,
        segment: &str,
        max_width: f64,
        style: &ResolvedStyle,
        lines: &mut Vec<String>,
        current: &mut String,
    ) {
        let mut width = self.string_width(current, style);
        for ch in segment.chars() {
            let w = self.char_width(ch, style);
            if !current.is_empty() && width + w > max_width && !ch.is_whitespace() {
                lines.push(current.trim_end().to_string());
                current.clear();
                width = 0.0;
            }
            current.push(ch);
            width += w;
        }
    }
}

impl Measure for StandardMetrics {
    fn wrap_text(&self, text: &str, max_width: f64, style: &ResolvedStyle) -> Vec<String> {
        if text.is_empty() {
            return vec![String::new()];
        }

        let mut lines = Vec::new();
        let mut current = String::new();
        let mut start = 0;

        for (end, opportunity) in linebreaks(text) {
            let segment = &text[start..end];
            start = end;

            let candidate = format!("{}{}", current, segment);
            if self.string_width(candidate.trim_end(), style) <= max_width {
                current = candidate;
            } else {
                if !current.is_empty() {
                    lines.push(current.trim_end().to_string());
                    current.clear();
                }
                if self.string_width(segment.trim_end(), style) <= max_width {
                    current.push_str(segment);
                } else {
                    self.push_overlong(segment, max_width, style, &mut lines, &mut current);
                }
            }

            if opportunity == BreakOpportunity::Mandatory {
                lines.push(current.trim_end().to_string());
                current.clear();
            }
        }

        if !current.is_empty() {
            lines.push(current.trim_end().to_string());
        }
        lines
    }

    fn line_height(&self, style: &ResolvedStyle) -> f64 {
        style.font_size * LINE_HEIGHT_FACTOR
    }

    fn string_width(&self, text: &str, style: &ResolvedStyle) -> f64 {
        text.chars().map(|ch| self.char_width(ch, style)).sum()
    }
}
