//! # Quire
//!
//! A box-model layout and pagination engine.
//!
//! Content is a tree of sections: text blocks, rows of columns, stacked
//! columns, images, each with margin, padding, border and an optional header
//! and footer. Quire sizes that tree bottom-up and flows it *into* fixed-size
//! pages. A node that does not fit decides for itself what stays on the
//! current page and what continues on the next, and the fragment it leaves
//! behind is never taller than the space it was given.
//!
//! ## Architecture
//!
//! ```text
//! Input (JSON/API)
//!       ↓
//!   [model]     Declarative description → typed sections
//!       ↓
//!   [section]   Section tree, style inheritance
//!       ↓
//!   [layout]    Width pass, heights, pagination split
//!       ↓
//!   [document]  Pages, driven one top-level item at a time
//!       ↓
//!   [render]    Placement → Surface calls
//!       ↓
//!   [surface]   Display list or PDF bytes
//! ```
//!
//! Measurement (`text::Measure`), drawing (`surface::Surface`) and image
//! resolution (`image_loader::ImageProvider`) are traits, passed in
//! explicitly. The crate ships a default implementation of each.

pub mod document;
pub mod error;
pub mod geometry;
pub mod image_loader;
pub mod layout;
pub mod model;
pub mod render;
pub mod section;
pub mod style;
pub mod surface;
pub mod text;

pub use document::{Document, Page, Paginator};
pub use error::{LayoutError, Result};
pub use layout::split::SplitResult;
pub use section::{Content, Leaf, Section, SectionKind};

use image_loader::SourceImageProvider;
use surface::pdf::PdfSurface;
use text::StandardMetrics;

/// Lay out and render a document to PDF bytes.
pub fn render(document: &mut Document) -> Result<Vec<u8>> {
    let measure = StandardMetrics::new();
    document.layout(&measure)?;
    let mut surface = match &document.name {
        Some(name) => PdfSurface::new().with_title(name),
        None => PdfSurface::new(),
    };
    document.render(&measure, &mut surface)?;
    Ok(surface.finish())
}

/// Render a document described as JSON to PDF bytes.
pub fn render_json(json: &str) -> Result<Vec<u8>> {
    let mut document = Document::from_json(json, &SourceImageProvider::new())?;
    render(&mut document)
}
