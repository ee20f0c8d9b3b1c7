//! # Document Model
//!
//! The declarative input format: a JSON description of a document and its
//! content tree, and the normalization that turns it into typed sections.
//!
//! Content is deliberately loose. A string or a number is a one-line text
//! block, an array is flattened into its parent, and an object is a node
//! whose `type` picks the section kind:
//!
//! ```json
//! {
//!   "pageSize": { "width": 612, "height": 792 },
//!   "margin": 36,
//!   "header": "Quarterly report",
//!   "content": [
//!     "A paragraph of text.",
//!     { "type": "row", "content": ["left", "right"], "border": true },
//!     { "image": "./logo.png", "width": 120 }
//!   ]
//! }
//! ```
//!
//! A content item that cannot be understood is logged and dropped; the rest
//! of the document is still built.

use serde::Deserialize;
use tracing::warn;

use crate::error::{LayoutError, Result};
use crate::geometry::{Offset, Position};
use crate::image_loader::ImageProvider;
use crate::section::Section;
use crate::style::{Color, OverflowPolicy, Style};

/// US Letter in points.
pub const LETTER: (f64, f64) = (612.0, 792.0);

/// A complete document description.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DocumentSpec {
    /// Document title, written to the PDF metadata.
    pub name: Option<String>,
    pub page_size: Option<PageSize>,
    pub orientation: Orientation,
    pub margin: Option<OffsetSpec>,
    pub padding: Option<OffsetSpec>,
    /// Repeated at the top of every page.
    pub header: Option<ContentSpec>,
    /// Repeated at the bottom of every page.
    pub footer: Option<ContentSpec>,
    pub content: Option<ContentSpec>,
    /// Document-wide style declarations inherited by all content.
    #[serde(flatten)]
    pub style: Style,
}

impl DocumentSpec {
    /// Page dimensions after applying the orientation.
    pub fn page_dimensions(&self) -> (f64, f64) {
        let (w, h) = self
            .page_size
            .map(|s| (s.width, s.height))
            .unwrap_or(LETTER);
        match self.orientation {
            Orientation::Portrait => (w.min(h), w.max(h)),
            Orientation::Landscape => (w.max(h), w.min(h)),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PageSize {
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

/// Edge values as written in input: a number for all sides, `{ "all": n }`,
/// or individual edges. Negative values are clamped to zero.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(untagged)]
pub enum OffsetSpec {
    Uniform(f64),
    All {
        all: f64,
    },
    Edges {
        #[serde(default)]
        top: f64,
        #[serde(default)]
        right: f64,
        #[serde(default)]
        bottom: f64,
        #[serde(default)]
        left: f64,
    },
}

impl OffsetSpec {
    pub fn to_offset(self) -> Offset {
        match self {
            OffsetSpec::Uniform(v) | OffsetSpec::All { all: v } => Offset::uniform(v),
            OffsetSpec::Edges {
                top,
                right,
                bottom,
                left,
            } => Offset::new(top, right, bottom, left),
        }
        .clamped()
    }
}

/// One content item as written in input.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ContentSpec {
    Text(String),
    Number(f64),
    List(Vec<ContentSpec>),
    Node(Box<NodeSpec>),
    /// Anything else; rejected during normalization.
    Other(serde_json::Value),
}

/// A content node.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NodeSpec {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub content: Option<ContentSpec>,
    pub header: Option<ContentSpec>,
    pub footer: Option<ContentSpec>,
    pub margin: Option<OffsetSpec>,
    pub padding: Option<OffsetSpec>,
    pub line_padding: Option<OffsetSpec>,
    pub border: bool,
    pub fill_color: Option<Color>,
    pub overflow: OverflowPolicy,
    pub fixed_width: Option<f64>,
    pub position: Option<Position>,
    /// Image source: a path, a data URI, or raw base64.
    pub image: Option<String>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    #[serde(flatten)]
    pub style: Style,
}

/// Normalize content into sections, dropping items that cannot be built.
pub fn normalize(spec: ContentSpec, images: &dyn ImageProvider) -> Vec<Section> {
    let mut out = Vec::new();
    normalize_into(spec, images, &mut out);
    out
}

fn normalize_into(spec: ContentSpec, images: &dyn ImageProvider, out: &mut Vec<Section>) {
    match spec {
        ContentSpec::List(items) => {
            for item in items {
                normalize_into(item, images, out);
            }
        }
        other => match build_section(other, images) {
            Ok(section) => out.push(section),
            Err(e) => warn!(error = %e, "dropping content item"),
        },
    }
}

/// Normalize content that must become a single section, such as a header.
/// Several items are wrapped in a column.
pub fn normalize_one(spec: ContentSpec, images: &dyn ImageProvider) -> Option<Section> {
    let mut sections = normalize(spec, images);
    match sections.len() {
        0 => None,
        1 => sections.pop(),
        _ => Some(Section::column(sections)),
    }
}

/// Build one section from a non-list content item.
pub fn build_section(spec: ContentSpec, images: &dyn ImageProvider) -> Result<Section> {
    match spec {
        ContentSpec::Text(text) => Ok(Section::text(text)),
        ContentSpec::Number(n) => Ok(Section::text(format_number(n))),
        ContentSpec::List(items) => {
            let children = normalize(ContentSpec::List(items), images);
            Ok(Section::column(children))
        }
        ContentSpec::Node(node) => build_node(*node, images),
        ContentSpec::Other(value) => Err(LayoutError::ContentType(describe_value(&value))),
    }
}

fn build_node(node: NodeSpec, images: &dyn ImageProvider) -> Result<Section> {
    let kind = node.kind.as_deref().map(str::to_ascii_lowercase);

    let mut section = if let Some(src) = &node.image {
        let handle = images.resolve(src, node.width, node.height)?;
        Section::image(handle)
    } else {
        match kind.as_deref() {
            Some("text") => Section::text(text_content(node.content.clone())?),
            Some("row") => Section::row(children_of(node.content.clone(), images)),
            Some("column") | Some("col") | None => {
                Section::column(children_of(node.content.clone(), images))
            }
            Some("image") => {
                return Err(LayoutError::ContentType(
                    "image node without an `image` source".to_string(),
                ))
            }
            Some(other) => return Err(LayoutError::ContentType(format!("type `{}`", other))),
        }
    };

    if let Some(margin) = node.margin {
        section = section.margin(margin.to_offset());
    }
    if let Some(padding) = node.padding {
        section = section.padding(padding.to_offset());
    }
    if let Some(line_padding) = node.line_padding {
        section = section.line_padding(line_padding.to_offset());
    }
    if let Some(fill) = node.fill_color {
        section = section.fill(fill);
    }
    if let Some(width) = node.fixed_width {
        section = section.fixed_width(width);
    }
    if let Some(position) = node.position {
        section = section.at(position);
    }
    if let Some(header) = node.header.and_then(|h| normalize_one(h, images)) {
        section = section.header(header);
    }
    if let Some(footer) = node.footer.and_then(|f| normalize_one(f, images)) {
        section = section.footer(footer);
    }
    Ok(section
        .border(node.border)
        .overflow(node.overflow)
        .style(node.style))
}

fn children_of(content: Option<ContentSpec>, images: &dyn ImageProvider) -> Vec<Section> {
    content.map(|c| normalize(c, images)).unwrap_or_default()
}

/// The text of a text node: a string, a number, or a list of those, one per
/// line.
fn text_content(content: Option<ContentSpec>) -> Result<String> {
    match content {
        None => Ok(String::new()),
        Some(ContentSpec::Text(text)) => Ok(text),
        Some(ContentSpec::Number(n)) => Ok(format_number(n)),
        Some(ContentSpec::List(items)) => {
            let lines = items
                .into_iter()
                .map(|item| text_content(Some(item)))
                .collect::<Result<Vec<_>>>()?;
            Ok(lines.join("\n"))
        }
        Some(ContentSpec::Node(_)) => Err(LayoutError::ContentType(
            "text node content must be text".to_string(),
        )),
        Some(ContentSpec::Other(value)) => Err(LayoutError::ContentType(describe_value(&value))),
    }
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

fn describe_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => "null".to_string(),
        serde_json::Value::Bool(b) => format!("boolean {}", b),
        serde_json::Value::Object(_) => "object with invalid fields".to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_loader::ImageHandle;
    use crate::section::{Content, SectionKind};

    /// Resolves every source to a 100x50 placeholder, except "missing".
    struct FixedImages;

    impl ImageProvider for FixedImages {
        fn resolve(&self, src: &str, width: Option<f64>, height: Option<f64>) -> Result<ImageHandle> {
            if src == "missing" {
                return Err(LayoutError::Image("not found".to_string()));
            }
            let (w, h) = crate::image_loader::display_size((100.0, 50.0), width, height);
            Ok(ImageHandle::placeholder(w, h))
        }
    }

    fn parse(json: &str) -> Vec<Section> {
        let spec: ContentSpec = serde_json::from_str(json).unwrap();
        normalize(spec, &FixedImages)
    }

    #[test]
    fn strings_and_numbers_become_text() {
        let sections = parse(r#"["hello", 42, 1.5]"#);
        assert_eq!(sections.len(), 3);
        assert!(sections.iter().all(|s| matches!(s.kind, SectionKind::Text)));
        let Content::Leaf(leaf) = &sections[1].content[0] else { panic!() };
        assert_eq!(leaf.text, "42");
    }

    #[test]
    fn nested_arrays_flatten() {
        let sections = parse(r#"["a", ["b", ["c"]]]"#);
        assert_eq!(sections.len(), 3);
    }

    #[test]
    fn node_types() {
        let sections = parse(
            r#"[
                {"type": "row", "content": ["a", "b"]},
                {"type": "col", "content": "c"},
                {"type": "text", "content": ["one", "two"]},
                {"content": ["d"]}
            ]"#,
        );
        assert!(matches!(sections[0].kind, SectionKind::Row));
        assert_eq!(sections[0].content.len(), 2);
        assert!(matches!(sections[1].kind, SectionKind::Column));
        let Content::Leaf(leaf) = &sections[2].content[0] else { panic!() };
        assert_eq!(leaf.text, "one\ntwo");
        assert!(matches!(sections[3].kind, SectionKind::Column));
    }

    #[test]
    fn unknown_items_are_dropped() {
        let sections = parse(r#"["keep", true, null, {"type": "table"}, "also"]"#);
        assert_eq!(sections.len(), 2);
    }

    #[test]
    fn bad_colors_drop_only_their_item() {
        let sections = parse(
            r##"[
                "keep",
                {"type": "text", "content": "x", "fillColor": "#éa"},
                {"type": "text", "content": "y", "textColor": "#zz0000"},
                {"type": "text", "content": "z", "textColor": "#00f"}
            ]"##,
        );
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[1].declared.text_color, Some(Color::rgb(0.0, 0.0, 1.0)));
    }

    #[test]
    fn failed_images_are_dropped() {
        let sections = parse(r#"[{"image": "missing"}, {"image": "ok.png", "width": 50}]"#);
        assert_eq!(sections.len(), 1);
        let SectionKind::Image(handle) = &sections[0].kind else { panic!() };
        assert_eq!((handle.width, handle.height), (50.0, 25.0));
    }

    #[test]
    fn image_key_wins_over_type() {
        let sections = parse(r#"[{"type": "text", "image": "a.png"}]"#);
        assert!(matches!(sections[0].kind, SectionKind::Image(_)));
    }

    #[test]
    fn box_settings_are_applied() {
        let sections = parse(
            r##"[{
                "type": "text", "content": "x",
                "margin": {"top": 4, "left": -2}, "padding": 0, "border": true,
                "fillColor": "#ff0000", "overflow": "noSplit", "fixedWidth": 80,
                "position": {"x": 5, "y": 6}, "fontSize": 14, "fontStyle": "bold"
            }]"##,
        );
        let s = &sections[0];
        assert_eq!(s.margin, Offset::new(4.0, 0.0, 0.0, 0.0));
        assert_eq!(s.padding, Offset::ZERO);
        assert!(s.border);
        assert_eq!(s.fill_color, Some(Color::rgb(1.0, 0.0, 0.0)));
        assert_eq!(s.overflow, OverflowPolicy::NoSplit);
        assert_eq!(s.fixed_width, Some(80.0));
        assert_eq!(s.position, Some(Position::at(5.0, 6.0)));
        assert_eq!(s.declared.font_size, Some(14.0));
    }

    #[test]
    fn text_keeps_default_padding_when_undeclared() {
        let sections = parse(r#"[{"type": "text", "content": "x"}]"#);
        assert_eq!(sections[0].padding, Offset::uniform(3.0));
    }

    #[test]
    fn offsets_accept_all_forms() {
        let o: OffsetSpec = serde_json::from_str("5").unwrap();
        assert_eq!(o.to_offset(), Offset::uniform(5.0));
        let o: OffsetSpec = serde_json::from_str(r#"{"all": 2}"#).unwrap();
        assert_eq!(o.to_offset(), Offset::uniform(2.0));
        let o: OffsetSpec = serde_json::from_str(r#"{"bottom": 3}"#).unwrap();
        assert_eq!(o.to_offset(), Offset::bottom(3.0));
    }

    #[test]
    fn orientation_swaps_dimensions() {
        let spec: DocumentSpec =
            serde_json::from_str(r#"{"orientation": "landscape"}"#).unwrap();
        assert_eq!(spec.page_dimensions(), (792.0, 612.0));
        let spec: DocumentSpec = serde_json::from_str("{}").unwrap();
        assert_eq!(spec.page_dimensions(), LETTER);
    }

    #[test]
    fn document_style_is_flattened() {
        let spec: DocumentSpec =
            serde_json::from_str(r#"{"font": "times", "fontSize": 12, "content": "x"}"#).unwrap();
        assert_eq!(spec.style.font.as_deref(), Some("times"));
        assert_eq!(spec.style.font_size, Some(12.0));
    }

    #[test]
    fn headers_wrap_several_items() {
        let header = normalize_one(
            serde_json::from_str(r#"["a", "b"]"#).unwrap(),
            &FixedImages,
        )
        .unwrap();
        assert!(matches!(header.kind, SectionKind::Column));
        assert_eq!(header.content.len(), 2);
    }
}
