//! # Layout
//!
//! Sizing happens in two directions.
//!
//! Widths flow top-down: `split_to_width` records the width a node was
//! given, removes margin and padding, and hands the rest to its children.
//! Columns give every child the full content width, rows partition it
//! (see [`row`]), text blocks re-wrap their leaf at the new width.
//!
//! Heights flow bottom-up: `height()` is a pure function of the tree after
//! the width pass. It never measures text; the line height and wrapped lines
//! were cached when the width was assigned.
//!
//! Pagination lives in [`split`]: given the space left on the current page
//! and the space of a fresh page, a node decides what of it stays here and
//! what flows on.

pub mod page_break;
pub mod row;
pub mod split;

use crate::error::{LayoutError, Result};
use crate::section::{Content, Leaf, Section, SectionKind};
use crate::text::Measure;

impl Section {
    /// Assign widths to this node and everything below it.
    pub fn split_to_width(&mut self, available: f64, measure: &dyn Measure) -> Result<&mut Self> {
        let mut width = available;
        if let Some(fixed) = self.fixed_width {
            width = width.min(fixed);
        }
        if let Some(declared) = self.position.and_then(|p| p.declared_width()) {
            width = width.min(declared);
        }
        let width = width.max(0.0);
        self.width = Some(width);
        self.line_height = Some(measure.line_height(&self.style));

        let inner = (width - self.margin.horizontal() - self.padding.horizontal()).max(0.0);

        if let Some(header) = self.header.as_mut() {
            header.split_to_width(inner, measure)?;
        }
        if let Some(footer) = self.footer.as_mut() {
            footer.split_to_width(inner, measure)?;
        }

        match self.kind {
            SectionKind::Row => {
                let fixed: Vec<Option<f64>> = self
                    .content
                    .iter()
                    .filter(|c| !c.is_overlay())
                    .map(|c| c.fixed_width())
                    .collect();
                let mut widths = row::distribute(&fixed, inner).into_iter();
                for item in &mut self.content {
                    let share = if item.is_overlay() {
                        inner
                    } else {
                        widths.next().unwrap_or(0.0)
                    };
                    item.split_to_width(share, measure)?;
                }
            }
            SectionKind::Column | SectionKind::Text => {
                for item in &mut self.content {
                    item.split_to_width(inner, measure)?;
                }
            }
            SectionKind::Image(_) => {}
        }
        Ok(self)
    }

    /// Height of everything except content: margin, padding, header and
    /// footer.
    pub fn base_height(&self) -> Result<f64> {
        let mut base = self.margin.vertical() + self.padding.vertical();
        if let Some(header) = &self.header {
            base += header.height()?;
        }
        if let Some(footer) = &self.footer {
            base += footer.height()?;
        }
        Ok(base)
    }

    /// Height of the content alone.
    pub fn content_height(&self) -> Result<f64> {
        let mut flow = 0.0_f64;
        let mut overlay = 0.0_f64;
        for item in &self.content {
            let h = item.height()?;
            match item.position() {
                Some(p) => overlay = overlay.max(p.y + h),
                None => match self.kind {
                    SectionKind::Row => flow = flow.max(h),
                    _ => flow += h,
                },
            }
        }
        let own = match &self.kind {
            SectionKind::Image(handle) => handle.height,
            _ => 0.0,
        };
        Ok(flow.max(overlay).max(own))
    }

    /// Total height. Fails with `NotLaidOut` before the width pass.
    pub fn height(&self) -> Result<f64> {
        if self.width.is_none() {
            return Err(LayoutError::NotLaidOut(self.kind.name()));
        }
        Ok(self.base_height()? + self.content_height()?)
    }

    /// Tallest overlay contribution (`y + height`) among the children.
    pub fn overlay_height(&self) -> Result<f64> {
        let mut max = 0.0_f64;
        for item in &self.content {
            if let Some(p) = item.position() {
                max = max.max(p.y + item.height()?);
            }
        }
        Ok(max)
    }

    /// Line height cached by the width pass.
    pub fn cached_line_height(&self) -> Result<f64> {
        self.line_height
            .ok_or(LayoutError::NotLaidOut(self.kind.name()))
    }
}

impl Leaf {
    /// Re-wrap the text at `available` minus line padding.
    pub fn split_to_width(&mut self, available: f64, measure: &dyn Measure) -> &mut Self {
        let width = available.max(0.0);
        let text_width = (width - self.line_padding.horizontal()).max(0.0);
        self.lines = measure.wrap_text(&self.text, text_width, &self.style);
        self.line_height = Some(measure.line_height(&self.style));
        self.width = Some(width);
        self
    }

    pub fn height(&self) -> Result<f64> {
        if self.width.is_none() {
            return Err(LayoutError::NotLaidOut("leaf"));
        }
        let line_height = self.line_height.ok_or(LayoutError::NotLaidOut("leaf"))?;
        Ok(self.lines.len() as f64 * line_height + self.line_padding.vertical())
    }
}

impl Content {
    pub fn split_to_width(&mut self, available: f64, measure: &dyn Measure) -> Result<()> {
        match self {
            Content::Section(section) => {
                section.split_to_width(available, measure)?;
            }
            Content::Leaf(leaf) => {
                leaf.split_to_width(available, measure);
            }
        }
        Ok(())
    }

    pub fn height(&self) -> Result<f64> {
        match self {
            Content::Section(section) => section.height(),
            Content::Leaf(leaf) => leaf.height(),
        }
    }

    pub fn width(&self) -> Option<f64> {
        match self {
            Content::Section(section) => section.width,
            Content::Leaf(leaf) => leaf.width,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Offset, Position};
    use crate::image_loader::ImageHandle;
    use crate::style::{ResolvedStyle, Style};
    use crate::text::StandardMetrics;

    fn laid_out(mut section: Section, width: f64) -> Section {
        section.initialize(&ResolvedStyle::default());
        section
            .split_to_width(width, &StandardMetrics::new())
            .unwrap();
        section
    }

    #[test]
    fn height_before_width_is_an_error() {
        let s = Section::text("x");
        assert!(matches!(s.height(), Err(LayoutError::NotLaidOut("text"))));
    }

    #[test]
    fn fixed_width_clamps() {
        let s = laid_out(Section::column(vec![]).fixed_width(120.0), 300.0);
        assert_eq!(s.width, Some(120.0));
    }

    #[test]
    fn position_width_clamps() {
        let s = laid_out(
            Section::text("x").at(Position::at(0.0, 0.0).with_width(80.0)),
            300.0,
        );
        assert_eq!(s.width, Some(80.0));
    }

    #[test]
    fn column_children_get_content_width() {
        let s = laid_out(
            Section::column(vec![Section::text("a"), Section::text("b")])
                .margin(Offset::uniform(10.0))
                .padding(Offset::symmetric(0.0, 5.0)),
            200.0,
        );
        for item in &s.content {
            assert_eq!(item.width(), Some(170.0));
        }
    }

    #[test]
    fn text_height_counts_lines_and_padding() {
        // Courier 10pt: 6pt per char, 11.5pt per line.
        let s = laid_out(
            Section::text("aaaa bbbb cccc").padding(Offset::ZERO),
            60.0,
        );
        assert!((s.height().unwrap() - 23.0).abs() < 1e-9);
        let s = laid_out(Section::text("aaaa bbbb cccc"), 66.0);
        assert!((s.height().unwrap() - 29.0).abs() < 1e-9);
    }

    #[test]
    fn header_and_footer_are_part_of_base() {
        let s = laid_out(
            Section::column(vec![Section::text("body")])
                .header(Section::text("head").padding(Offset::ZERO))
                .footer(Section::text("foot").padding(Offset::ZERO))
                .padding(Offset::uniform(2.0)),
            200.0,
        );
        assert!((s.base_height().unwrap() - 27.0).abs() < 1e-9);
    }

    #[test]
    fn overlays_take_the_max_instead_of_summing() {
        let s = laid_out(
            Section::overlay()
                .add_text_at("one", 0.0, 0.0)
                .add_text_at("two", 0.0, 40.0),
            200.0,
        );
        // Each overlay text is 11.5 + 6 padding.
        assert!((s.height().unwrap() - 57.5).abs() < 1e-9);
    }

    #[test]
    fn image_height_is_display_height() {
        let s = laid_out(
            Section::image(ImageHandle::placeholder(50.0, 80.0)).margin(Offset::top(5.0)),
            200.0,
        );
        assert_eq!(s.height().unwrap(), 85.0);
    }

    #[test]
    fn row_height_is_tallest_column() {
        let s = laid_out(
            Section::row(vec![
                Section::text("short").padding(Offset::ZERO),
                Section::lines(&["a", "b", "c"]).padding(Offset::ZERO),
            ]),
            300.0,
        );
        assert!((s.height().unwrap() - 34.5).abs() < 1e-9);
    }

    #[test]
    fn height_is_idempotent() {
        let s = laid_out(
            Section::column(vec![Section::text("a b c d e f g"), Section::text("h")])
                .style(Style::default().font_size(12.0)),
            40.0,
        );
        assert_eq!(s.height().unwrap(), s.height().unwrap());
    }
}
