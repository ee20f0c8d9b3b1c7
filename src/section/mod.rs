//! # Section Tree
//!
//! The node type the layout engine works on. A `Section` is one box in the
//! box model: margin, optional border and fill, padding, an optional header
//! and footer, then content. What the content means depends on the kind:
//!
//! - `Text` holds exactly one `Leaf` of wrapped lines.
//! - `Column` stacks its children vertically. It is the default container.
//! - `Row` lays its children side by side and partitions its width.
//! - `Image` holds a resolved image handle and is never split.
//!
//! A child carrying a `Position` is an overlay: it does not take part in the
//! stacking flow and contributes `y + height` to its parent instead of adding
//! to the sum.
//!
//! Sections are built with the constructors and chainable setters below, or
//! from JSON through [`crate::model`]. After construction, `initialize` is
//! called once to resolve styles down the tree.

use std::fmt::Write;

use crate::geometry::{Offset, Position};
use crate::image_loader::ImageHandle;
use crate::style::{Color, OverflowPolicy, ResolvedStyle, Style};

/// Padding a text block gets when none is declared.
pub const DEFAULT_TEXT_PADDING: f64 = 3.0;

#[derive(Debug, Clone)]
pub enum SectionKind {
    Text,
    Row,
    Column,
    Image(ImageHandle),
}

impl SectionKind {
    pub fn name(&self) -> &'static str {
        match self {
            SectionKind::Text => "text",
            SectionKind::Row => "row",
            SectionKind::Column => "column",
            SectionKind::Image(_) => "image",
        }
    }
}

/// A child of a section.
#[derive(Debug, Clone)]
pub enum Content {
    Section(Section),
    Leaf(Leaf),
}

impl Content {
    /// Overlay-positioned children do not take part in the flow.
    pub fn position(&self) -> Option<Position> {
        match self {
            Content::Section(s) => s.position,
            Content::Leaf(_) => None,
        }
    }

    pub fn is_overlay(&self) -> bool {
        self.position().is_some()
    }

    pub fn fixed_width(&self) -> Option<f64> {
        match self {
            Content::Section(s) => s.fixed_width,
            Content::Leaf(_) => None,
        }
    }
}

impl From<Section> for Content {
    fn from(section: Section) -> Self {
        Content::Section(section)
    }
}

impl From<Leaf> for Content {
    fn from(leaf: Leaf) -> Self {
        Content::Leaf(leaf)
    }
}

/// A run of text that is wrapped into lines by the width pass and can only
/// be cut between lines afterwards.
#[derive(Debug, Clone)]
pub struct Leaf {
    /// Source text. Fragments hold their lines joined by newlines.
    pub text: String,
    /// Lines produced by the last width pass.
    pub lines: Vec<String>,
    pub line_padding: Offset,
    /// Leaf-level style declarations, layered over the owning text block.
    pub declared: Style,
    pub style: ResolvedStyle,
    /// Line height cached by the width pass.
    pub line_height: Option<f64>,
    /// Width assigned by the width pass.
    pub width: Option<f64>,
}

impl Leaf {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            lines: Vec::new(),
            line_padding: Offset::ZERO,
            declared: Style::default(),
            style: ResolvedStyle::default(),
            line_height: None,
            width: None,
        }
    }

    /// Style declarations for this run, layered over its text block's
    /// resolved style.
    pub fn style(mut self, style: Style) -> Self {
        self.declared = style;
        self
    }

    /// A leaf holding a slice of already-wrapped lines. The lines are kept
    /// as they are; they are not re-wrapped unless the width changes.
    pub(crate) fn fragment(&self, lines: &[String]) -> Self {
        Self {
            text: lines.join("\n"),
            lines: lines.to_vec(),
            line_padding: self.line_padding,
            declared: self.declared.clone(),
            style: self.style.clone(),
            line_height: self.line_height,
            width: self.width,
        }
    }

    pub fn initialize(&mut self, inherited: &ResolvedStyle) {
        self.style = self.declared.resolve(inherited);
    }
}

/// One box in the layout tree.
#[derive(Debug, Clone)]
pub struct Section {
    pub kind: SectionKind,
    pub margin: Offset,
    pub padding: Offset,
    pub border: bool,
    pub fill_color: Option<Color>,
    pub overflow: OverflowPolicy,
    pub fixed_width: Option<f64>,
    /// Width assigned by the width pass. `None` until then.
    pub width: Option<f64>,
    pub header: Option<Box<Section>>,
    pub footer: Option<Box<Section>>,
    pub content: Vec<Content>,
    pub position: Option<Position>,
    pub declared: Style,
    pub style: ResolvedStyle,
    /// Line height of the resolved style, cached by the width pass. Used to
    /// reserve a minimum content allowance when splitting.
    pub line_height: Option<f64>,
}

impl Section {
    fn empty(kind: SectionKind) -> Self {
        Self {
            kind,
            margin: Offset::ZERO,
            padding: Offset::ZERO,
            border: false,
            fill_color: None,
            overflow: OverflowPolicy::Split,
            fixed_width: None,
            width: None,
            header: None,
            footer: None,
            content: Vec::new(),
            position: None,
            declared: Style::default(),
            style: ResolvedStyle::default(),
            line_height: None,
        }
    }

    /// A single text block.
    pub fn text(text: impl Into<String>) -> Self {
        Self::leaf(Leaf::new(text))
    }

    /// A text block around an already-built leaf.
    pub fn leaf(leaf: Leaf) -> Self {
        let mut section = Self::empty(SectionKind::Text);
        section.padding = Offset::uniform(DEFAULT_TEXT_PADDING);
        section.content.push(Content::Leaf(leaf));
        section
    }

    /// A text block from explicit lines. Each entry starts a new line.
    pub fn lines<S: AsRef<str>>(lines: &[S]) -> Self {
        let joined: Vec<&str> = lines.iter().map(|l| l.as_ref()).collect();
        Self::text(joined.join("\n"))
    }

    pub fn column(children: Vec<Section>) -> Self {
        let mut section = Self::empty(SectionKind::Column);
        section.content = children.into_iter().map(Content::Section).collect();
        section
    }

    pub fn row(children: Vec<Section>) -> Self {
        let mut section = Self::empty(SectionKind::Row);
        section.content = children.into_iter().map(Content::Section).collect();
        section
    }

    pub fn image(handle: ImageHandle) -> Self {
        Self::empty(SectionKind::Image(handle))
    }

    /// An empty column for positioned content, filled with `add_text_at`
    /// and `add_image_at`.
    pub fn overlay() -> Self {
        Self::empty(SectionKind::Column)
    }

    /// Place a text block at `(x, y)` in this section's content box.
    pub fn add_text_at(mut self, text: impl Into<String>, x: f64, y: f64) -> Self {
        self.content
            .push(Content::Section(Section::text(text).at(Position::at(x, y))));
        self
    }

    /// Place an image at `(x, y)` in this section's content box.
    pub fn add_image_at(mut self, handle: ImageHandle, x: f64, y: f64) -> Self {
        let position = Position::at(x, y).with_width(handle.width);
        self.content
            .push(Content::Section(Section::image(handle).at(position)));
        self
    }

    pub fn child(mut self, child: Section) -> Self {
        self.content.push(Content::Section(child));
        self
    }

    pub fn margin(mut self, margin: Offset) -> Self {
        self.margin = margin;
        self
    }

    pub fn padding(mut self, padding: Offset) -> Self {
        self.padding = padding;
        self
    }

    pub fn border(mut self, border: bool) -> Self {
        self.border = border;
        self
    }

    pub fn fill(mut self, color: Color) -> Self {
        self.fill_color = Some(color);
        self
    }

    pub fn fixed_width(mut self, width: f64) -> Self {
        self.fixed_width = Some(width);
        self
    }

    pub fn no_split(mut self) -> Self {
        self.overflow = OverflowPolicy::NoSplit;
        self
    }

    pub fn overflow(mut self, policy: OverflowPolicy) -> Self {
        self.overflow = policy;
        self
    }

    pub fn at(mut self, position: Position) -> Self {
        self.position = Some(position);
        self
    }

    pub fn header(mut self, header: Section) -> Self {
        self.header = Some(Box::new(header));
        self
    }

    pub fn footer(mut self, footer: Section) -> Self {
        self.footer = Some(Box::new(footer));
        self
    }

    pub fn style(mut self, style: Style) -> Self {
        self.declared = style;
        self
    }

    /// Line padding of the text leaf. Has no effect on other kinds.
    pub fn line_padding(mut self, line_padding: Offset) -> Self {
        for item in &mut self.content {
            if let Content::Leaf(leaf) = item {
                leaf.line_padding = line_padding;
            }
        }
        self
    }

    /// Resolve styles for this node and everything below it.
    pub fn initialize(&mut self, inherited: &ResolvedStyle) {
        self.style = self.declared.resolve(inherited);
        let style = self.style.clone();
        if let Some(header) = self.header.as_mut() {
            header.initialize(&style);
        }
        if let Some(footer) = self.footer.as_mut() {
            footer.initialize(&style);
        }
        for item in &mut self.content {
            match item {
                Content::Section(child) => child.initialize(&style),
                Content::Leaf(leaf) => leaf.initialize(&style),
            }
        }
    }

    /// A copy of this node carrying `content` instead of its own children.
    /// Header, footer and box settings are repeated on the copy.
    pub fn with_content(&self, content: Vec<Content>) -> Section {
        Section {
            kind: self.kind.clone(),
            margin: self.margin,
            padding: self.padding,
            border: self.border,
            fill_color: self.fill_color,
            overflow: self.overflow,
            fixed_width: self.fixed_width,
            width: self.width,
            header: self.header.clone(),
            footer: self.footer.clone(),
            content,
            position: self.position,
            declared: self.declared.clone(),
            style: self.style.clone(),
            line_height: self.line_height,
        }
    }

    /// An empty slot of the same width, used to keep a row's column
    /// positions in an overflow fragment.
    pub fn shell(&self) -> Section {
        let mut shell = Section::empty(SectionKind::Column);
        shell.width = self.width;
        shell.fixed_width = self.fixed_width;
        shell.style = self.style.clone();
        shell.line_height = self.line_height;
        shell
    }

    /// Children that take part in the flow.
    pub fn flow_children(&self) -> impl Iterator<Item = &Content> {
        self.content.iter().filter(|c| !c.is_overlay())
    }

    /// Indented tree of node kinds and their computed heights.
    pub fn describe(&self) -> String {
        let mut out = String::new();
        self.describe_into(0, "", &mut out);
        out
    }

    fn describe_into(&self, depth: usize, role: &str, out: &mut String) {
        let height = match self.height() {
            Ok(h) => format!("{:.1}", h),
            Err(_) => "?".to_string(),
        };
        let width = self
            .width
            .map(|w| format!("{:.1}", w))
            .unwrap_or_else(|| "?".to_string());
        let _ = write!(
            out,
            "{:indent$}{}{} w={} h={}",
            "",
            role,
            self.kind.name(),
            width,
            height,
            indent = depth * 2
        );
        if let Some(p) = self.position {
            let _ = write!(out, " @({:.1}, {:.1})", p.x, p.y);
        }
        out.push('\n');

        if let Some(header) = &self.header {
            header.describe_into(depth + 1, "header: ", out);
        }
        for item in &self.content {
            match item {
                Content::Section(child) => child.describe_into(depth + 1, "", out),
                Content::Leaf(leaf) => {
                    let height = leaf
                        .height()
                        .map(|h| format!("{:.1}", h))
                        .unwrap_or_else(|_| "?".to_string());
                    let _ = writeln!(
                        out,
                        "{:indent$}leaf lines={} h={}",
                        "",
                        leaf.lines.len(),
                        height,
                        indent = (depth + 1) * 2
                    );
                }
            }
        }
        if let Some(footer) = &self.footer {
            footer.describe_into(depth + 1, "footer: ", out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::FontStyle;

    #[test]
    fn text_gets_default_padding() {
        let s = Section::text("hello");
        assert_eq!(s.padding, Offset::uniform(3.0));
        assert!(matches!(s.content.as_slice(), [Content::Leaf(_)]));
    }

    #[test]
    fn declared_padding_replaces_default() {
        let s = Section::text("hello").padding(Offset::ZERO);
        assert_eq!(s.padding, Offset::ZERO);
    }

    #[test]
    fn initialize_inherits_down_the_tree() {
        let mut root = Section::column(vec![
            Section::text("a"),
            Section::row(vec![Section::text("b").style(Style::default().font_size(20.0))]),
        ])
        .style(Style::default().font("times").font_style(FontStyle::Bold));
        root.initialize(&ResolvedStyle::default());

        let Content::Section(a) = &root.content[0] else { panic!() };
        assert_eq!(a.style.font, "times");
        let Content::Leaf(leaf) = &a.content[0] else { panic!() };
        assert_eq!(leaf.style.font_style, FontStyle::Bold);

        let Content::Section(row) = &root.content[1] else { panic!() };
        let Content::Section(b) = &row.content[0] else { panic!() };
        assert_eq!(b.style.font_size, 20.0);
        assert_eq!(b.style.font, "times");
    }

    #[test]
    fn leaf_declarations_layer_over_the_block() {
        let leaf = Leaf::new("small print").style(Style::default().font_size(6.0));
        let mut s = Section::leaf(leaf).style(Style::default().font("helvetica").font_size(12.0));
        s.initialize(&ResolvedStyle::default());
        assert_eq!(s.style.font_size, 12.0);
        let Content::Leaf(leaf) = &s.content[0] else { panic!() };
        assert_eq!(leaf.style.font_size, 6.0);
        assert_eq!(leaf.style.font, "helvetica");
    }

    #[test]
    fn header_inherits_owner_style() {
        let mut s = Section::column(vec![])
            .header(Section::text("head"))
            .style(Style::default().font_size(7.0));
        s.initialize(&ResolvedStyle::default());
        assert_eq!(s.header.unwrap().style.font_size, 7.0);
    }

    #[test]
    fn clones_do_not_alias() {
        let original = Section::column(vec![Section::text("a")]);
        let mut copy = original.clone();
        copy.content.push(Content::Section(Section::text("b")));
        assert_eq!(original.content.len(), 1);
        assert_eq!(copy.content.len(), 2);
    }

    #[test]
    fn overlay_children_leave_the_flow() {
        let s = Section::overlay()
            .add_text_at("note", 10.0, 20.0)
            .child(Section::text("body"));
        assert_eq!(s.content.len(), 2);
        assert_eq!(s.flow_children().count(), 1);
        assert_eq!(s.content[0].position(), Some(Position::at(10.0, 20.0)));
    }

    #[test]
    fn add_image_at_pins_the_width() {
        let s = Section::overlay().add_image_at(ImageHandle::placeholder(40.0, 30.0), 5.0, 5.0);
        assert_eq!(
            s.content[0].position().and_then(|p| p.declared_width()),
            Some(40.0)
        );
    }

    #[test]
    fn lines_join_with_newlines() {
        let s = Section::lines(&["one", "two"]);
        let Content::Leaf(leaf) = &s.content[0] else { panic!() };
        assert_eq!(leaf.text, "one\ntwo");
    }

    #[test]
    fn describe_before_layout_marks_unknown() {
        let s = Section::column(vec![Section::text("a")]);
        let tree = s.describe();
        assert!(tree.starts_with("column w=? h=?"));
        assert!(tree.contains("  text w=? h=?"));
    }
}
