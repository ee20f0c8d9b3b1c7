//! # Document Driver
//!
//! A `Document` owns the page template (size, margin, padding, running
//! header and footer) and the top-level content items. `layout` flows the
//! items into pages one at a time through a `Paginator`:
//!
//! 1. Assign widths once, at the page content width.
//! 2. Split against the space left on the current page.
//! 3. `Normal`: place it and move on to the next item.
//!    `Split`: place the first fragment, open a page, continue with the rest.
//!    `NewPage`: open a page and retry the whole remainder there.
//!    `NoSpace`: the build fails.
//!
//! Items are placed strictly in order and each item is one step; a caller
//! driving a `Paginator` directly may stop between steps. A layout error
//! fails the whole build. No partial document is produced.

use std::fmt::Write;

use tracing::debug;

use crate::error::{LayoutError, Result};
use crate::geometry::{Offset, Rect};
use crate::image_loader::ImageProvider;
use crate::layout::split::SplitResult;
use crate::model::{self, DocumentSpec};
use crate::section::Section;
use crate::style::{ResolvedStyle, Style};
use crate::surface::Surface;
use crate::text::Measure;

/// Page geometry and the running header and footer shared by every page.
#[derive(Debug, Clone)]
pub struct PageFrame {
    pub width: f64,
    pub height: f64,
    pub margin: Offset,
    pub padding: Offset,
    pub header: Option<Section>,
    pub footer: Option<Section>,
}

impl PageFrame {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            margin: Offset::ZERO,
            padding: Offset::ZERO,
            header: None,
            footer: None,
        }
    }

    pub fn full_rect(&self) -> Rect {
        Rect::sized(self.width, self.height)
    }

    /// The page minus its margin.
    pub fn page_rect(&self) -> Rect {
        let mut rect = self.full_rect();
        rect.offset(self.margin);
        rect
    }

    /// The page minus margin and padding: where header, footer and content
    /// live.
    pub fn inner_rect(&self) -> Rect {
        let mut rect = self.page_rect();
        rect.offset(self.padding);
        rect
    }

    /// The space a fresh page offers to content.
    pub fn content_rect(&self) -> Result<Rect> {
        let mut rect = self.inner_rect();
        if let Some(header) = &self.header {
            rect.offset_top(header.height()?);
        }
        if let Some(footer) = &self.footer {
            rect.offset_bottom(footer.height()?);
        }
        Ok(rect)
    }

    /// Width-split the header and footer at the inner width.
    fn lay_out(&mut self, measure: &dyn Measure) -> Result<()> {
        let width = self.inner_rect().width();
        if let Some(header) = self.header.as_mut() {
            header.split_to_width(width, measure)?;
        }
        if let Some(footer) = self.footer.as_mut() {
            footer.split_to_width(width, measure)?;
        }
        Ok(())
    }

    fn open_page(&self) -> Result<Page> {
        let content_rect = self.content_rect()?;
        Ok(Page {
            content: Vec::new(),
            full: self.full_rect(),
            page_rect: self.page_rect(),
            content_rect,
            remaining: content_rect,
        })
    }
}

/// One realized page.
#[derive(Debug, Clone)]
pub struct Page {
    /// Top-level fragments, stacked from the top of `content_rect`.
    pub content: Vec<Section>,
    pub full: Rect,
    pub page_rect: Rect,
    pub content_rect: Rect,
    /// What is left for further content.
    pub remaining: Rect,
}

impl Page {
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    fn push(&mut self, fragment: Section) -> Result<()> {
        self.remaining.offset_top(fragment.height()?);
        self.content.push(fragment);
        Ok(())
    }

    /// Draw the page: running header and footer, then the fragments.
    pub fn render(
        &self,
        frame: &PageFrame,
        measure: &dyn Measure,
        surface: &mut dyn Surface,
    ) -> Result<()> {
        surface.begin_page(self.full.width(), self.full.height());

        let inner = frame.inner_rect();
        if let Some(header) = &frame.header {
            header.render(inner, measure, surface)?;
        }
        if let Some(footer) = &frame.footer {
            let mut anchored = inner;
            anchored.set_height(footer.height()?, true);
            footer.render(anchored, measure, surface)?;
        }

        let mut cursor = self.content_rect;
        for fragment in &self.content {
            fragment.render(cursor, measure, surface)?;
            cursor.offset_top(fragment.height()?);
        }
        Ok(())
    }

    pub fn describe(&self) -> String {
        let used = self.content_rect.height() - self.remaining.height();
        let mut out = format!(
            "page {:.1}x{:.1} content={:.1} used={:.1}\n",
            self.full.width(),
            self.full.height(),
            self.content_rect.height(),
            used
        );
        for fragment in &self.content {
            for line in fragment.describe().lines() {
                let _ = writeln!(out, "  {}", line);
            }
        }
        out
    }
}

/// Places top-level items into pages, one item per call.
pub struct Paginator<'a> {
    frame: &'a PageFrame,
    measure: &'a dyn Measure,
    next_page: Rect,
    pages: Vec<Page>,
    current: Page,
    items: usize,
}

impl<'a> Paginator<'a> {
    /// `frame` must already have its header and footer laid out.
    pub fn new(frame: &'a PageFrame, measure: &'a dyn Measure) -> Result<Self> {
        let current = frame.open_page()?;
        Ok(Self {
            frame,
            measure,
            next_page: current.content_rect,
            pages: Vec::new(),
            current,
            items: 0,
        })
    }

    /// Number of pages opened so far, including the current one.
    pub fn page_count(&self) -> usize {
        self.pages.len() + 1
    }

    fn break_page(&mut self) -> Result<()> {
        let next = self.frame.open_page()?;
        let done = std::mem::replace(&mut self.current, next);
        self.pages.push(done);
        debug!(page = self.page_count(), "page break");
        Ok(())
    }

    /// Lay out and place one top-level item.
    pub fn place(&mut self, mut section: Section) -> Result<()> {
        let item = self.items;
        self.items += 1;
        section.split_to_width(self.next_page.width(), self.measure)?;

        loop {
            let available = self.current.remaining;
            match section.split_to_height(&available, &self.next_page)? {
                SplitResult::Normal { to_add } => {
                    self.current.push(to_add)?;
                    return Ok(());
                }
                SplitResult::Split {
                    to_add,
                    overflow,
                    forced,
                } => {
                    if forced {
                        debug!(item, "forced split of a no-split block");
                    }
                    self.current.push(to_add)?;
                    self.break_page()?;
                    section = overflow;
                }
                SplitResult::NewPage { overflow } => {
                    // An empty page is as fresh as it gets.
                    if self.current.is_empty() {
                        return Err(LayoutError::InsufficientSpace { item });
                    }
                    debug!(item, "deferred to the next page");
                    self.break_page()?;
                    section = overflow;
                }
                SplitResult::NoSpace { .. } => {
                    return Err(LayoutError::InsufficientSpace { item });
                }
            }
        }
    }

    /// Finished pages. An empty trailing page is dropped unless it is the
    /// only page.
    pub fn finish(mut self) -> Vec<Page> {
        if !self.current.is_empty() || self.pages.is_empty() {
            self.pages.push(self.current);
        }
        self.pages
    }
}

/// A document: page template plus content, and the pages once laid out.
#[derive(Debug, Clone)]
pub struct Document {
    pub name: Option<String>,
    pub frame: PageFrame,
    pub style: ResolvedStyle,
    content: Vec<Section>,
    pages: Vec<Page>,
}

impl Document {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            name: None,
            frame: PageFrame::new(width, height),
            style: ResolvedStyle::default(),
            content: Vec::new(),
            pages: Vec::new(),
        }
    }

    /// Build from a parsed description. Content items that cannot be built
    /// are logged and skipped.
    pub fn from_spec(spec: DocumentSpec, images: &dyn ImageProvider) -> Self {
        let (width, height) = spec.page_dimensions();
        let mut doc = Document::new(width, height).style(&spec.style);
        doc.name = spec.name;
        if let Some(margin) = spec.margin {
            doc.frame.margin = margin.to_offset();
        }
        if let Some(padding) = spec.padding {
            doc.frame.padding = padding.to_offset();
        }
        if let Some(header) = spec.header.and_then(|h| model::normalize_one(h, images)) {
            doc = doc.header(header);
        }
        if let Some(footer) = spec.footer.and_then(|f| model::normalize_one(f, images)) {
            doc = doc.footer(footer);
        }
        if let Some(content) = spec.content {
            for section in model::normalize(content, images) {
                doc.push(section);
            }
        }
        doc
    }

    pub fn from_json(json: &str, images: &dyn ImageProvider) -> Result<Self> {
        let spec: DocumentSpec = serde_json::from_str(json)?;
        Ok(Self::from_spec(spec, images))
    }

    /// Set document-wide style declarations. Applies to items added after.
    pub fn style(mut self, style: &Style) -> Self {
        self.style = style.resolve(&ResolvedStyle::default());
        self
    }

    pub fn margin(mut self, margin: Offset) -> Self {
        self.frame.margin = margin;
        self
    }

    pub fn padding(mut self, padding: Offset) -> Self {
        self.frame.padding = padding;
        self
    }

    pub fn header(mut self, mut header: Section) -> Self {
        header.initialize(&self.style);
        self.frame.header = Some(header);
        self
    }

    pub fn footer(mut self, mut footer: Section) -> Self {
        footer.initialize(&self.style);
        self.frame.footer = Some(footer);
        self
    }

    /// Add a top-level item. Its style is resolved against the document's.
    pub fn push(&mut self, mut section: Section) {
        section.initialize(&self.style);
        self.content.push(section);
    }

    pub fn with(mut self, section: Section) -> Self {
        self.push(section);
        self
    }

    /// Flow all content into pages.
    pub fn layout(&mut self, measure: &dyn Measure) -> Result<&[Page]> {
        self.frame.lay_out(measure)?;
        let mut paginator = Paginator::new(&self.frame, measure)?;
        for section in &self.content {
            paginator.place(section.clone())?;
        }
        self.pages = paginator.finish();
        debug!(pages = self.pages.len(), "layout complete");
        Ok(&self.pages)
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    /// Draw every page. `layout` must have run.
    pub fn render(&self, measure: &dyn Measure, surface: &mut dyn Surface) -> Result<()> {
        if self.pages.is_empty() {
            return Err(LayoutError::NotLaidOut("document"));
        }
        for page in &self.pages {
            page.render(&self.frame, measure, surface)?;
        }
        Ok(())
    }

    pub fn describe(&self) -> String {
        let mut out = String::new();
        for (i, page) in self.pages.iter().enumerate() {
            let _ = write!(out, "#{} {}", i + 1, page.describe());
        }
        out
    }
}
