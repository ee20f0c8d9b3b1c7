//! # Drawing Surfaces
//!
//! The render pass never writes bytes itself. It talks to a `Surface`: a
//! stateful canvas with a current font and current colors, addressed in
//! points with the origin at the top-left of the page and y growing down.
//!
//! Two surfaces ship with the crate: `RecordingSurface` keeps a display list
//! per page (used by tests and `--dump`), and [`pdf::PdfSurface`] writes a
//! PDF file.

pub mod pdf;

use crate::error::Result;
use crate::image_loader::ImageHandle;
use crate::style::{Color, FontStyle};

/// How a rectangle is painted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawMode {
    Stroke,
    Fill,
    Both,
}

impl DrawMode {
    /// The mode for a box with the given border and fill flags, or `None`
    /// when there is nothing to paint.
    pub fn for_box(border: bool, fill: bool) -> Option<Self> {
        match (border, fill) {
            (true, true) => Some(DrawMode::Both),
            (true, false) => Some(DrawMode::Stroke),
            (false, true) => Some(DrawMode::Fill),
            (false, false) => None,
        }
    }
}

/// The drawing collaborator.
pub trait Surface {
    /// Start a new page. Subsequent draws land on it.
    fn begin_page(&mut self, width: f64, height: f64);

    fn set_font(&mut self, family: &str, style: FontStyle, size: f64);
    fn set_text_color(&mut self, color: Color);
    fn set_draw_color(&mut self, color: Color);
    fn set_fill_color(&mut self, color: Color);

    /// Draw one line of text with its baseline at `y`.
    fn draw_text(&mut self, x: f64, y: f64, text: &str);

    fn draw_rect(&mut self, x: f64, y: f64, width: f64, height: f64, mode: DrawMode);

    fn draw_image(
        &mut self,
        image: &ImageHandle,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    ) -> Result<()>;
}

/// One recorded drawing call.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Font {
        family: String,
        style: FontStyle,
        size: f64,
    },
    TextColor(Color),
    DrawColor(Color),
    FillColor(Color),
    Text {
        x: f64,
        y: f64,
        text: String,
    },
    Rect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        mode: DrawMode,
    },
    Image {
        src: String,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    },
}

#[derive(Debug, Clone, Default)]
pub struct RecordedPage {
    pub width: f64,
    pub height: f64,
    pub ops: Vec<DrawOp>,
}

impl RecordedPage {
    /// Text drawn on this page, in drawing order.
    pub fn texts(&self) -> Vec<&str> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }
}

/// A surface that records every call as a display list.
#[derive(Debug, Clone, Default)]
pub struct RecordingSurface {
    pub pages: Vec<RecordedPage>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, op: DrawOp) {
        if self.pages.is_empty() {
            self.pages.push(RecordedPage::default());
        }
        if let Some(page) = self.pages.last_mut() {
            page.ops.push(op);
        }
    }
}

impl Surface for RecordingSurface {
    fn begin_page(&mut self, width: f64, height: f64) {
        self.pages.push(RecordedPage {
            width,
            height,
            ops: Vec::new(),
        });
    }

    fn set_font(&mut self, family: &str, style: FontStyle, size: f64) {
        self.push(DrawOp::Font {
            family: family.to_string(),
            style,
            size,
        });
    }

    fn set_text_color(&mut self, color: Color) {
        self.push(DrawOp::TextColor(color));
    }

    fn set_draw_color(&mut self, color: Color) {
        self.push(DrawOp::DrawColor(color));
    }

    fn set_fill_color(&mut self, color: Color) {
        self.push(DrawOp::FillColor(color));
    }

    fn draw_text(&mut self, x: f64, y: f64, text: &str) {
        self.push(DrawOp::Text {
            x,
            y,
            text: text.to_string(),
        });
    }

    fn draw_rect(&mut self, x: f64, y: f64, width: f64, height: f64, mode: DrawMode) {
        self.push(DrawOp::Rect {
            x,
            y,
            width,
            height,
            mode,
        });
    }

    fn draw_image(
        &mut self,
        image: &ImageHandle,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    ) -> Result<()> {
        self.push(DrawOp::Image {
            src: image.src.clone(),
            x,
            y,
            width,
            height,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draw_mode_from_flags() {
        assert_eq!(DrawMode::for_box(true, true), Some(DrawMode::Both));
        assert_eq!(DrawMode::for_box(true, false), Some(DrawMode::Stroke));
        assert_eq!(DrawMode::for_box(false, true), Some(DrawMode::Fill));
        assert_eq!(DrawMode::for_box(false, false), None);
    }

    #[test]
    fn recording_groups_ops_by_page() {
        let mut s = RecordingSurface::new();
        s.begin_page(100.0, 200.0);
        s.draw_text(1.0, 2.0, "first");
        s.begin_page(100.0, 200.0);
        s.draw_text(1.0, 2.0, "second");
        s.draw_rect(0.0, 0.0, 5.0, 5.0, DrawMode::Fill);
        assert_eq!(s.pages.len(), 2);
        assert_eq!(s.pages[0].texts(), vec!["first"]);
        assert_eq!(s.pages[1].ops.len(), 2);
    }

    #[test]
    fn draws_before_a_page_open_one() {
        let mut s = RecordingSurface::new();
        s.set_text_color(Color::BLACK);
        assert_eq!(s.pages.len(), 1);
    }
}
