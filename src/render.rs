//! # Render Pass
//!
//! Walks laid-out fragments and emits drawing calls. Nothing here changes
//! the tree: positions are derived from the widths and heights the layout
//! passes already fixed. Every node sets the style it draws with before
//! drawing, so no state leaks between siblings.

use crate::error::{LayoutError, Result};
use crate::geometry::Rect;
use crate::section::{Content, Leaf, Section, SectionKind};
use crate::style::{ResolvedStyle, TextAlign};
use crate::surface::{DrawMode, Surface};
use crate::text::Measure;

impl Section {
    /// Draw this node with its top-left corner at the top-left of `space`.
    pub fn render(
        &self,
        space: Rect,
        measure: &dyn Measure,
        surface: &mut dyn Surface,
    ) -> Result<()> {
        let width = self.width.ok_or(LayoutError::NotLaidOut(self.kind.name()))?;
        let height = self.height()?;

        let mut rect = space;
        if let Some(p) = self.position {
            rect.translate(p.x, p.y);
        }
        rect.set_width(width, false).set_height(height, false);
        rect.offset(self.margin);

        if let Some(mode) = DrawMode::for_box(self.border, self.fill_color.is_some()) {
            surface.set_draw_color(self.style.draw_color);
            if let Some(fill) = self.fill_color {
                surface.set_fill_color(fill);
            }
            surface.draw_rect(rect.x1, rect.y1, rect.width(), rect.height(), mode);
        }

        rect.offset(self.padding);

        if let Some(header) = &self.header {
            let h = header.height()?;
            header.render(rect, measure, surface)?;
            rect.offset_top(h);
        }
        if let Some(footer) = &self.footer {
            let h = footer.height()?;
            let mut anchored = rect;
            anchored.set_height(h, true);
            footer.render(anchored, measure, surface)?;
            rect.offset_bottom(h);
        }

        match &self.kind {
            SectionKind::Image(handle) => {
                surface.draw_image(handle, rect.x1, rect.y1, handle.width, handle.height)?;
            }
            SectionKind::Row => {
                let mut cursor = rect.x1;
                for item in &self.content {
                    if item.is_overlay() {
                        item.render(rect, measure, surface)?;
                        continue;
                    }
                    let mut slot = rect;
                    slot.x1 = cursor;
                    item.render(slot, measure, surface)?;
                    cursor += item.width().unwrap_or(0.0);
                }
            }
            SectionKind::Column | SectionKind::Text => {
                let mut cursor = rect.y1;
                for item in &self.content {
                    if item.is_overlay() {
                        item.render(rect, measure, surface)?;
                        continue;
                    }
                    let mut slot = rect;
                    slot.y1 = cursor;
                    item.render(slot, measure, surface)?;
                    cursor += item.height()?;
                }
            }
        }
        Ok(())
    }
}

impl Leaf {
    pub fn render(
        &self,
        space: Rect,
        measure: &dyn Measure,
        surface: &mut dyn Surface,
    ) -> Result<()> {
        let line_height = self.line_height.ok_or(LayoutError::NotLaidOut("leaf"))?;
        let width = self.width.ok_or(LayoutError::NotLaidOut("leaf"))?;

        let mut rect = space;
        rect.set_width(width, false);
        rect.offset(self.line_padding);

        apply_text_style(&self.style, surface);
        for (i, line) in self.lines.iter().enumerate() {
            if line.is_empty() {
                continue;
            }
            let x = match self.style.text_align {
                TextAlign::Left => rect.x1,
                TextAlign::Center => {
                    rect.x1 + (rect.width() - measure.string_width(line, &self.style)) / 2.0
                }
                TextAlign::Right => rect.x2 - measure.string_width(line, &self.style),
            };
            let baseline = rect.y1 + line_height * i as f64 + self.style.font_size;
            surface.draw_text(x, baseline, line);
        }
        Ok(())
    }
}

impl Content {
    pub fn render(
        &self,
        space: Rect,
        measure: &dyn Measure,
        surface: &mut dyn Surface,
    ) -> Result<()> {
        match self {
            Content::Section(section) => section.render(space, measure, surface),
            Content::Leaf(leaf) => leaf.render(space, measure, surface),
        }
    }
}

fn apply_text_style(style: &ResolvedStyle, surface: &mut dyn Surface) {
    surface.set_font(&style.font, style.font_style, style.font_size);
    surface.set_text_color(style.text_color);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Offset, Position};
    use crate::style::{Color, Style};
    use crate::surface::{DrawOp, RecordingSurface};
    use crate::text::StandardMetrics;

    fn draw(mut section: Section, width: f64) -> RecordingSurface {
        let measure = StandardMetrics::new();
        section.initialize(&ResolvedStyle::default());
        section.split_to_width(width, &measure).unwrap();
        let mut surface = RecordingSurface::new();
        surface.begin_page(width, 1000.0);
        section
            .render(Rect::sized(width, 1000.0), &measure, &mut surface)
            .unwrap();
        surface
    }

    fn text_positions(surface: &RecordingSurface) -> Vec<(f64, f64, String)> {
        surface.pages[0]
            .ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Text { x, y, text } => Some((*x, *y, text.clone())),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn stacked_children_advance_downward() {
        let s = draw(
            Section::column(vec![
                Section::text("a").padding(Offset::ZERO),
                Section::text("b").padding(Offset::ZERO),
            ]),
            200.0,
        );
        let texts = text_positions(&s);
        assert_eq!(texts.len(), 2);
        assert!((texts[0].1 - 10.0).abs() < 1e-9);
        assert!((texts[1].1 - 21.5).abs() < 1e-9);
    }

    #[test]
    fn row_children_advance_rightward() {
        let s = draw(
            Section::row(vec![
                Section::text("a").padding(Offset::ZERO),
                Section::text("b").padding(Offset::ZERO),
                Section::text("c").padding(Offset::ZERO),
            ]),
            300.0,
        );
        let xs: Vec<f64> = text_positions(&s).iter().map(|t| t.0).collect();
        assert_eq!(xs, vec![0.0, 100.0, 200.0]);
    }

    #[test]
    fn margin_and_padding_move_content() {
        let s = draw(
            Section::text("a")
                .margin(Offset::uniform(10.0))
                .padding(Offset::uniform(5.0)),
            200.0,
        );
        let texts = text_positions(&s);
        assert_eq!(texts[0].0, 15.0);
        assert!((texts[0].1 - 25.0).abs() < 1e-9);
    }

    #[test]
    fn border_and_fill_draw_a_rect() {
        let s = draw(
            Section::text("a").border(true).fill(Color::rgb(1.0, 0.0, 0.0)),
            200.0,
        );
        let rect = s.pages[0].ops.iter().find_map(|op| match op {
            DrawOp::Rect { mode, width, .. } => Some((*mode, *width)),
            _ => None,
        });
        assert_eq!(rect, Some((DrawMode::Both, 200.0)));
        assert!(s.pages[0]
            .ops
            .contains(&DrawOp::FillColor(Color::rgb(1.0, 0.0, 0.0))));
    }

    #[test]
    fn plain_box_draws_no_rect() {
        let s = draw(Section::text("a"), 200.0);
        assert!(!s.pages[0]
            .ops
            .iter()
            .any(|op| matches!(op, DrawOp::Rect { .. })));
    }

    #[test]
    fn right_alignment_uses_string_width() {
        let s = draw(
            Section::text("abc")
                .padding(Offset::ZERO)
                .style(Style::default().text_align(TextAlign::Right)),
            100.0,
        );
        // Courier 10pt: 18pt for three characters.
        assert!((text_positions(&s)[0].0 - 82.0).abs() < 1e-9);
    }

    #[test]
    fn footer_is_anchored_to_the_bottom() {
        let s = draw(
            Section::column(vec![Section::lines(&["1", "2", "3"]).padding(Offset::ZERO)])
                .header(Section::text("head").padding(Offset::ZERO))
                .footer(Section::text("foot").padding(Offset::ZERO)),
            200.0,
        );
        let texts = text_positions(&s);
        let head = texts.iter().find(|t| t.2 == "head").unwrap();
        let foot = texts.iter().find(|t| t.2 == "foot").unwrap();
        let last = texts.iter().find(|t| t.2 == "3").unwrap();
        assert!(head.1 < last.1);
        assert!(foot.1 > last.1);
        // Total height 5 lines; the footer's baseline sits on the last line.
        assert!((foot.1 - (4.0 * 11.5 + 10.0)).abs() < 1e-9);
    }

    #[test]
    fn overlays_render_at_their_position() {
        let s = draw(
            Section::overlay()
                .child(Section::text("flow").padding(Offset::ZERO))
                .child(
                    Section::text("pinned")
                        .padding(Offset::ZERO)
                        .at(Position::at(50.0, 100.0)),
                ),
            200.0,
        );
        let texts = text_positions(&s);
        let pinned = texts.iter().find(|t| t.2 == "pinned").unwrap();
        assert_eq!(pinned.0, 50.0);
        assert!((pinned.1 - 110.0).abs() < 1e-9);
    }

    #[test]
    fn render_before_layout_fails() {
        let mut surface = RecordingSurface::new();
        let err = Section::text("x")
            .render(Rect::sized(100.0, 100.0), &StandardMetrics::new(), &mut surface)
            .unwrap_err();
        assert!(matches!(err, LayoutError::NotLaidOut(_)));
    }
}
