//! # Style System
//!
//! The typographic and color settings a section carries, and the rules for
//! inheriting them down the tree.
//!
//! A node declares a `Style` where every property is optional. At
//! initialization it is resolved against the parent's `ResolvedStyle`:
//! explicit values win, then inherited ones, then the hard-coded defaults.
//! The resolved style is immutable for the node's lifetime.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

pub const DEFAULT_FONT: &str = "courier";
pub const DEFAULT_FONT_SIZE: f64 = 10.0;

/// The declared style of a node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Style {
    /// Font family name.
    #[serde(alias = "fontFamily")]
    pub font: Option<String>,
    /// Font size in points.
    pub font_size: Option<f64>,
    /// Font style.
    #[serde(alias = "fontType")]
    pub font_style: Option<FontStyle>,
    /// Text color.
    pub text_color: Option<Color>,
    /// Stroke color for borders.
    pub draw_color: Option<Color>,
    /// Text alignment within the text block.
    pub text_align: Option<TextAlign>,
}

impl Style {
    pub fn font(mut self, family: &str) -> Self {
        self.font = Some(family.to_string());
        self
    }

    pub fn font_size(mut self, size: f64) -> Self {
        self.font_size = Some(size);
        self
    }

    pub fn font_style(mut self, style: FontStyle) -> Self {
        self.font_style = Some(style);
        self
    }

    pub fn text_color(mut self, color: Color) -> Self {
        self.text_color = Some(color);
        self
    }

    pub fn draw_color(mut self, color: Color) -> Self {
        self.draw_color = Some(color);
        self
    }

    pub fn text_align(mut self, align: TextAlign) -> Self {
        self.text_align = Some(align);
        self
    }

    /// Resolve against a parent's resolved style.
    pub fn resolve(&self, inherited: &ResolvedStyle) -> ResolvedStyle {
        ResolvedStyle {
            font: self
                .font
                .clone()
                .unwrap_or_else(|| inherited.font.clone()),
            font_size: self.font_size.unwrap_or(inherited.font_size),
            font_style: self.font_style.unwrap_or(inherited.font_style),
            text_color: self.text_color.unwrap_or(inherited.text_color),
            draw_color: self.draw_color.unwrap_or(inherited.draw_color),
            text_align: self.text_align.unwrap_or(inherited.text_align),
        }
    }
}

/// Resolved style: every value is concrete.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedStyle {
    pub font: String,
    pub font_size: f64,
    pub font_style: FontStyle,
    pub text_color: Color,
    pub draw_color: Color,
    pub text_align: TextAlign,
}

impl Default for ResolvedStyle {
    fn default() -> Self {
        Self {
            font: DEFAULT_FONT.to_string(),
            font_size: DEFAULT_FONT_SIZE,
            font_style: FontStyle::Normal,
            text_color: Color::BLACK,
            draw_color: Color::BLACK,
            text_align: TextAlign::Left,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontStyle {
    #[default]
    Normal,
    Bold,
    Italic,
    #[serde(alias = "bolditalic")]
    BoldItalic,
}

impl FontStyle {
    pub fn is_bold(&self) -> bool {
        matches!(self, FontStyle::Bold | FontStyle::BoldItalic)
    }

    pub fn is_italic(&self) -> bool {
        matches!(self, FontStyle::Italic | FontStyle::BoldItalic)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

/// What a section does when it does not fit the space left on a page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OverflowPolicy {
    /// Place what fits, flow the rest to the next page.
    #[default]
    Split,
    /// Keep the block whole and defer it to the next page. Only split when it
    /// is already the first block on a fresh page.
    NoSplit,
}

/// An RGB color with components in 0.0-1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl Color {
    pub const BLACK: Color = Color {
        r: 0.0,
        g: 0.0,
        b: 0.0,
    };
    pub const WHITE: Color = Color {
        r: 1.0,
        g: 1.0,
        b: 1.0,
    };

    pub fn rgb(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b }
    }

    /// From 0-255 channel values.
    pub fn rgb8(r: u8, g: u8, b: u8) -> Self {
        Self {
            r: r as f64 / 255.0,
            g: g as f64 / 255.0,
            b: b as f64 / 255.0,
        }
    }

    /// Parse `#rgb` or `#rrggbb`. `None` for anything else.
    pub fn hex(hex: &str) -> Option<Self> {
        let digits = hex
            .trim_start_matches('#')
            .chars()
            .map(|c| c.to_digit(16).map(|d| d as u8))
            .collect::<Option<Vec<u8>>>()?;
        let (r, g, b) = match digits.as_slice() {
            [r, g, b] => (r * 17, g * 17, b * 17),
            [r1, r2, g1, g2, b1, b2] => (r1 * 16 + r2, g1 * 16 + g2, b1 * 16 + b2),
            _ => return None,
        };
        Some(Self::rgb8(r, g, b))
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::BLACK
    }
}

/// Colors are written either as `[r, g, b]` with 0-255 channels,
/// as a `"#rrggbb"` string, or as `{ "r": .., "g": .., "b": .. }` in 0.0-1.0.
impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum ColorRepr {
            Channels([f64; 3]),
            Hex(String),
            Unit { r: f64, g: f64, b: f64 },
        }

        Ok(match ColorRepr::deserialize(deserializer)? {
            ColorRepr::Channels([r, g, b]) => Color::rgb(r / 255.0, g / 255.0, b / 255.0),
            ColorRepr::Hex(s) => Color::hex(&s)
                .ok_or_else(|| D::Error::custom(format!("invalid color `{}`", s)))?,
            ColorRepr::Unit { r, g, b } => Color::rgb(r, g, b),
        })
    }
}
