//! # Pagination Split
//!
//! `split_to_height` decides, for one node, what stays on the current page
//! and what flows to the next. It is called with the space left on the
//! current page and the space a fresh page would offer.
//!
//! The rules, in order:
//!
//! 1. A node that fits is placed whole.
//! 2. A node whose fixed parts (margin, padding, header, footer) plus room
//!    for a few lines do not fit cannot start here.
//! 3. A node that cannot be split below its own granularity (a single text
//!    leaf, a lone child) moves whole rather than leaving an orphan.
//! 4. A `NoSplit` node moves whole unless it already heads a fresh page,
//!    where it is split anyway and the split is reported as forced.
//! 5. Otherwise the stacked children are scanned: those that fit whole stay,
//!    the next one is split recursively, the rest overflow. When the next
//!    one cannot start here at all, the node is cut just before it.
//!
//! On a fresh page nothing can be deferred further, so the rules that would
//! move a node cut it instead, or report `NoSpace` when even that fails.
//! Both fragments of a split repeat the node's header and footer. Overlay
//! children always stay with the first fragment.

use tracing::trace;

use super::page_break::{self, HEIGHT_EPSILON};
use crate::error::{LayoutError, Result};
use crate::geometry::Rect;
use crate::section::{Content, Leaf, Section, SectionKind};
use crate::style::OverflowPolicy;

/// Outcome of a pagination split.
#[derive(Debug, Clone)]
pub enum SplitResult<T> {
    /// Fits entirely in the available space.
    Normal { to_add: T },
    /// Partially fits. `forced` marks a `NoSplit` node cut on a fresh page.
    Split { to_add: T, overflow: T, forced: bool },
    /// Nothing usable fits here; retry the whole node on a fresh page.
    NewPage { overflow: T },
    /// Even a fresh page cannot host the smallest unit of this node.
    NoSpace { overflow: T },
}

impl<T> SplitResult<T> {
    pub fn map<U>(self, f: impl Fn(T) -> U) -> SplitResult<U> {
        match self {
            SplitResult::Normal { to_add } => SplitResult::Normal { to_add: f(to_add) },
            SplitResult::Split {
                to_add,
                overflow,
                forced,
            } => SplitResult::Split {
                to_add: f(to_add),
                overflow: f(overflow),
                forced,
            },
            SplitResult::NewPage { overflow } => SplitResult::NewPage {
                overflow: f(overflow),
            },
            SplitResult::NoSpace { overflow } => SplitResult::NoSpace {
                overflow: f(overflow),
            },
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            SplitResult::Normal { .. } => "normal",
            SplitResult::Split { .. } => "split",
            SplitResult::NewPage { .. } => "new-page",
            SplitResult::NoSpace { .. } => "no-space",
        }
    }
}

/// Move to the next page, or report that even a fresh page is too small.
fn defer<T>(node: T, fresh: bool) -> SplitResult<T> {
    if fresh {
        SplitResult::NoSpace { overflow: node }
    } else {
        SplitResult::NewPage { overflow: node }
    }
}

fn checked_split(
    to_add: Section,
    overflow: Section,
    forced: bool,
    available: f64,
) -> Result<SplitResult<Section>> {
    let height = to_add.height()?;
    if height > available + HEIGHT_EPSILON {
        return Err(LayoutError::InternalConsistency { height, available });
    }
    Ok(SplitResult::Split {
        to_add,
        overflow,
        forced,
    })
}

/// A fragment with nothing in it: a leaf cut before its first line.
fn is_starved(part: &Content) -> bool {
    matches!(part, Content::Leaf(leaf) if leaf.lines.is_empty())
}

impl Section {
    /// Split this node against the space left on the current page.
    pub fn split_to_height(
        self,
        available: &Rect,
        next_page: &Rect,
    ) -> Result<SplitResult<Section>> {
        if let SectionKind::Image(handle) = &self.kind {
            let size = (handle.width, handle.height);
            return self.split_image(size, available, next_page);
        }

        let avail = available.height();
        if self.height()? <= avail {
            return Ok(SplitResult::Normal { to_add: self });
        }

        let fresh = page_break::is_fresh(avail, next_page.height());
        let base = self.base_height()?;
        if page_break::base_too_tall(base, self.cached_line_height()?, avail) {
            trace!(kind = self.kind.name(), base, avail, fresh, "base does not fit");
            return Ok(defer(self, fresh));
        }

        if matches!(self.kind, SectionKind::Row) {
            return self.split_row(available, next_page, base, fresh);
        }

        if !fresh && self.is_orphan() {
            trace!(kind = self.kind.name(), avail, "orphan guard");
            return Ok(SplitResult::NewPage { overflow: self });
        }

        let forced = self.overflow == OverflowPolicy::NoSplit;
        if forced && !fresh {
            return Ok(SplitResult::NewPage { overflow: self });
        }

        self.split_stack(available, next_page, base, fresh, forced)
    }

    /// True when this node, or the innermost node of a chain of single
    /// children below it, has nothing left to split between.
    pub fn is_orphan(&self) -> bool {
        let mut node = self;
        loop {
            let mut flow = node.flow_children();
            match (flow.next(), flow.next()) {
                (Some(Content::Section(child)), None) => node = child,
                (Some(Content::Leaf(_)), None) => return true,
                (None, _) => return true,
                (Some(_), Some(_)) => return false,
            }
        }
    }

    fn split_stack(
        mut self,
        available: &Rect,
        next_page: &Rect,
        base: f64,
        fresh: bool,
        forced: bool,
    ) -> Result<SplitResult<Section>> {
        let avail = available.height();
        if base + self.overlay_height()? > avail {
            return Ok(defer(self, fresh));
        }

        let heights = self
            .flow_children()
            .map(Content::height)
            .collect::<Result<Vec<f64>>>()?;
        let (count, consumed) = page_break::fit_count(base, &heights, avail);
        trace!(kind = self.kind.name(), count, consumed, avail, fresh, "stack scan");
        if count == 0 && !fresh {
            return Ok(SplitResult::NewPage { overflow: self });
        }

        // Index in `content` of the first flow child that does not fit whole.
        let pivot_index = self
            .content
            .iter()
            .enumerate()
            .filter(|(_, c)| !c.is_overlay())
            .nth(count)
            .map(|(i, _)| i);
        let Some(pivot_index) = pivot_index else {
            return Ok(SplitResult::Normal { to_add: self });
        };

        let mut head = std::mem::take(&mut self.content);
        let tail = head.split_off(pivot_index + 1);
        let Some(pivot) = head.pop() else {
            return Err(LayoutError::InternalConsistency {
                height: consumed,
                available: avail,
            });
        };

        let mut child_available = *available;
        child_available.offset_top(consumed);
        let mut child_next = *next_page;
        child_next.offset_top(base);

        let (tail_overlays, tail_flow): (Vec<Content>, Vec<Content>) =
            tail.into_iter().partition(Content::is_overlay);

        let outcome = match pivot.split_to_height(&child_available, &child_next)? {
            SplitResult::Split { to_add, overflow, .. } if is_starved(&to_add) => {
                SplitResult::NewPage { overflow }
            }
            other => other,
        };
        match outcome {
            SplitResult::Normal { to_add: part } => {
                head.push(part);
                head.extend(tail_overlays);
                if tail_flow.is_empty() {
                    return Ok(SplitResult::Normal {
                        to_add: self.with_content(head),
                    });
                }
                let to_add = self.with_content(head);
                let overflow = self.with_content(tail_flow);
                checked_split(to_add, overflow, forced, avail)
            }
            SplitResult::Split {
                to_add: part,
                overflow: rest,
                forced: child_forced,
            } => {
                head.push(part);
                head.extend(tail_overlays);
                let mut remainder = vec![rest];
                remainder.extend(tail_flow);
                let to_add = self.with_content(head);
                let overflow = self.with_content(remainder);
                checked_split(to_add, overflow, forced || child_forced, avail)
            }
            SplitResult::NewPage { overflow: child } if count > 0 => {
                head.extend(tail_overlays);
                let mut remainder = vec![child];
                remainder.extend(tail_flow);
                let to_add = self.with_content(head);
                let overflow = self.with_content(remainder);
                checked_split(to_add, overflow, forced, avail)
            }
            SplitResult::NewPage { overflow: child } => {
                head.push(child);
                head.extend(tail_overlays);
                head.extend(tail_flow);
                self.content = head;
                Ok(defer(self, fresh))
            }
            SplitResult::NoSpace { overflow: child } => {
                head.push(child);
                head.extend(tail_overlays);
                head.extend(tail_flow);
                self.content = head;
                Ok(SplitResult::NoSpace { overflow: self })
            }
        }
    }

    /// Every column is split against the same space. Columns that fit whole
    /// leave an empty slot of their width in the overflow row.
    fn split_row(
        self,
        available: &Rect,
        next_page: &Rect,
        base: f64,
        fresh: bool,
    ) -> Result<SplitResult<Section>> {
        let avail = available.height();
        let mut forced = self.overflow == OverflowPolicy::NoSplit;
        if forced && !fresh {
            return Ok(SplitResult::NewPage { overflow: self });
        }
        if base + self.overlay_height()? > avail {
            return Ok(defer(self, fresh));
        }

        let mut child_available = *available;
        child_available.offset_top(base);
        let mut child_next = *next_page;
        child_next.offset_top(base);

        let mut here = Vec::with_capacity(self.content.len());
        let mut rest = Vec::with_capacity(self.content.len());
        let mut deferred = false;
        let mut no_space = false;
        for item in &self.content {
            if item.is_overlay() {
                here.push(item.clone());
                continue;
            }
            match item.clone().split_to_height(&child_available, &child_next)? {
                SplitResult::Normal { to_add } => {
                    rest.push(to_add.shell());
                    here.push(to_add);
                }
                SplitResult::Split {
                    to_add,
                    overflow,
                    forced: child_forced,
                } => {
                    here.push(to_add);
                    rest.push(overflow);
                    forced |= child_forced;
                }
                SplitResult::NewPage { .. } => {
                    deferred = true;
                    break;
                }
                SplitResult::NoSpace { .. } => {
                    no_space = true;
                    break;
                }
            }
        }
        if no_space {
            return Ok(SplitResult::NoSpace { overflow: self });
        }
        if deferred {
            trace!(avail, fresh, "row column deferred");
            return Ok(defer(self, fresh));
        }

        let to_add = self.with_content(here);
        let overflow = self.with_content(rest);
        checked_split(to_add, overflow, forced, avail)
    }

    fn split_image(
        self,
        (image_width, image_height): (f64, f64),
        available: &Rect,
        next_page: &Rect,
    ) -> Result<SplitResult<Section>> {
        let width = self.width.ok_or(LayoutError::NotLaidOut("image"))?;
        let content_width = width - self.margin.horizontal() - self.padding.horizontal();
        let height = self.height()?;

        if image_width > content_width + HEIGHT_EPSILON {
            return Err(LayoutError::ContentTooLarge {
                what: "image",
                width: image_width,
                height: image_height,
                page_width: content_width,
                page_height: next_page.height(),
            });
        }
        if height <= available.height() {
            return Ok(SplitResult::Normal { to_add: self });
        }
        if height <= next_page.height() {
            return Ok(SplitResult::NewPage { overflow: self });
        }
        Err(LayoutError::ContentTooLarge {
            what: "image",
            width: image_width,
            height,
            page_width: next_page.width(),
            page_height: next_page.height(),
        })
    }
}

impl Leaf {
    /// Cut between lines. The lines are never re-wrapped. When not even one
    /// line fits, the first fragment is empty and the whole leaf overflows.
    pub fn split_to_height(self, available: &Rect) -> Result<SplitResult<Leaf>> {
        let avail = available.height();
        if self.height()? <= avail {
            return Ok(SplitResult::Normal { to_add: self });
        }
        let line_height = self.line_height.ok_or(LayoutError::NotLaidOut("leaf"))?;
        let max_lines = page_break::max_lines(avail, self.line_padding.vertical(), line_height);
        if max_lines >= self.lines.len() {
            return Ok(SplitResult::Normal { to_add: self });
        }
        let to_add = self.fragment(&self.lines[..max_lines]);
        let overflow = self.fragment(&self.lines[max_lines..]);
        Ok(SplitResult::Split {
            to_add,
            overflow,
            forced: false,
        })
    }
}

impl Content {
    pub fn split_to_height(
        self,
        available: &Rect,
        next_page: &Rect,
    ) -> Result<SplitResult<Content>> {
        match self {
            Content::Section(section) => Ok(section
                .split_to_height(available, next_page)?
                .map(Content::Section)),
            Content::Leaf(leaf) => Ok(leaf.split_to_height(available)?.map(Content::Leaf)),
        }
    }

    /// An empty slot with the same width.
    pub fn shell(&self) -> Content {
        match self {
            Content::Section(section) => Content::Section(section.shell()),
            Content::Leaf(leaf) => Content::Leaf(leaf.fragment(&[])),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Offset;
    use crate::image_loader::ImageHandle;
    use crate::style::ResolvedStyle;
    use crate::text::StandardMetrics;

    fn laid_out(mut section: Section, width: f64) -> Section {
        section.initialize(&ResolvedStyle::default());
        section
            .split_to_width(width, &StandardMetrics::new())
            .unwrap();
        section
    }

    fn space(height: f64) -> Rect {
        Rect::sized(400.0, height)
    }

    fn block(lines: usize) -> Section {
        let lines: Vec<String> = (0..lines).map(|i| format!("line {}", i)).collect();
        Section::lines(&lines).padding(Offset::ZERO)
    }

    #[test]
    fn fitting_node_is_normal() {
        let s = laid_out(block(2), 400.0);
        let result = s.split_to_height(&space(100.0), &space(100.0)).unwrap();
        assert!(matches!(result, SplitResult::Normal { .. }));
    }

    #[test]
    fn lone_text_in_a_column_moves_whole() {
        let s = laid_out(Section::column(vec![block(10)]), 400.0);
        let result = s.split_to_height(&space(60.0), &space(700.0)).unwrap();
        assert!(matches!(result, SplitResult::NewPage { .. }));
    }

    #[test]
    fn text_on_a_fresh_page_is_cut_by_lines() {
        let s = laid_out(block(10), 400.0);
        // 11.5pt lines: 4 lines fit in 50pt.
        let result = s.split_to_height(&space(50.0), &space(50.0)).unwrap();
        let SplitResult::Split { to_add, overflow, forced } = result else {
            panic!("expected split");
        };
        assert!(!forced);
        let (Content::Leaf(a), Content::Leaf(b)) = (&to_add.content[0], &overflow.content[0]) else {
            panic!("text fragments hold leaves");
        };
        assert_eq!(a.lines.len(), 4);
        assert_eq!(b.lines.len(), 6);
        assert!(to_add.height().unwrap() <= 50.0);
    }

    #[test]
    fn tall_base_defers_or_reports_no_space() {
        let s = laid_out(
            Section::column(vec![block(3), block(3)]).padding(Offset::uniform(30.0)),
            400.0,
        );
        let result = s.clone().split_to_height(&space(50.0), &space(700.0)).unwrap();
        assert!(matches!(result, SplitResult::NewPage { .. }));
        let result = s.split_to_height(&space(50.0), &space(50.0)).unwrap();
        assert!(matches!(result, SplitResult::NoSpace { .. }));
    }

    #[test]
    fn stack_keeps_whole_children_and_splits_the_next() {
        let s = laid_out(Section::column(vec![block(2), block(2), block(4)]), 400.0);
        // The first two blocks take 46pt. The third gets 34pt, too little to
        // start in, so it overflows whole.
        let result = s.split_to_height(&space(80.0), &space(80.0)).unwrap();
        let SplitResult::Split { to_add, overflow, .. } = result else {
            panic!("expected split");
        };
        assert_eq!(to_add.content.len(), 2);
        assert_eq!(overflow.content.len(), 1);
    }

    #[test]
    fn child_that_cannot_start_is_left_for_the_next_page() {
        let s = laid_out(Section::column(vec![block(2), block(2), block(4)]), 400.0);
        // Not a fresh page: the third block gets 34pt, less than three lines,
        // so the column is cut before it instead of moving whole.
        let result = s.split_to_height(&space(80.0), &space(700.0)).unwrap();
        let SplitResult::Split { to_add, overflow, forced } = result else {
            panic!("expected split");
        };
        assert!(!forced);
        assert_eq!(to_add.content.len(), 2);
        assert_eq!(overflow.content.len(), 1);
    }

    #[test]
    fn leaf_with_no_room_leaves_an_empty_first_fragment() {
        let mut leaf = Leaf::new("a\nb\nc");
        leaf.split_to_width(400.0, &StandardMetrics::new());
        let result = leaf.split_to_height(&space(0.0)).unwrap();
        let SplitResult::Split { to_add, overflow, .. } = result else {
            panic!("expected split");
        };
        assert!(to_add.lines.is_empty());
        assert_eq!(overflow.lines.len(), 3);
    }

    #[test]
    fn no_split_defers_then_forces_on_a_fresh_page() {
        let s = laid_out(Section::column(vec![block(4), block(4)]).no_split(), 400.0);
        let result = s.clone().split_to_height(&space(50.0), &space(60.0)).unwrap();
        assert!(matches!(result, SplitResult::NewPage { .. }));
        let result = s.split_to_height(&space(60.0), &space(60.0)).unwrap();
        assert!(matches!(result, SplitResult::Split { forced: true, .. }));
    }

    #[test]
    fn fragments_repeat_header_and_footer() {
        let s = laid_out(
            Section::column(vec![block(3), block(3), block(3)])
                .header(block(1))
                .footer(block(1)),
            400.0,
        );
        let result = s.split_to_height(&space(100.0), &space(100.0)).unwrap();
        let SplitResult::Split { to_add, overflow, .. } = result else {
            panic!("expected split");
        };
        assert!(to_add.header.is_some() && to_add.footer.is_some());
        assert!(overflow.header.is_some() && overflow.footer.is_some());
    }

    #[test]
    fn overlays_stay_with_the_first_fragment() {
        let s = laid_out(
            Section::overlay()
                .child(block(3))
                .add_text_at("pinned", 0.0, 0.0)
                .child(block(3))
                .child(block(3)),
            400.0,
        );
        let result = s.split_to_height(&space(80.0), &space(80.0)).unwrap();
        let SplitResult::Split { to_add, overflow, .. } = result else {
            panic!("expected split");
        };
        assert_eq!(to_add.content.iter().filter(|c| c.is_overlay()).count(), 1);
        assert_eq!(overflow.content.iter().filter(|c| c.is_overlay()).count(), 0);
    }

    #[test]
    fn row_columns_split_against_the_same_space() {
        let s = laid_out(Section::row(vec![block(2), block(8)]), 400.0);
        let result = s.split_to_height(&space(50.0), &space(50.0)).unwrap();
        let SplitResult::Split { to_add, overflow, .. } = result else {
            panic!("expected split");
        };
        assert_eq!(to_add.content.len(), 2);
        assert_eq!(overflow.content.len(), 2);
        // The short column left an empty slot of the same width.
        let Content::Section(slot) = &overflow.content[0] else { panic!() };
        assert!(slot.content.is_empty());
        assert_eq!(slot.width, Some(200.0));
        assert_eq!(slot.height().unwrap(), 0.0);
    }

    #[test]
    fn image_that_fits_a_fresh_page_moves() {
        let s = laid_out(Section::image(ImageHandle::placeholder(100.0, 500.0)), 400.0);
        let result = s.split_to_height(&space(300.0), &space(700.0)).unwrap();
        assert!(matches!(result, SplitResult::NewPage { .. }));
    }

    #[test]
    fn oversized_image_is_rejected() {
        let s = laid_out(Section::image(ImageHandle::placeholder(100.0, 900.0)), 400.0);
        let err = s.split_to_height(&space(700.0), &space(700.0)).unwrap_err();
        assert!(matches!(err, LayoutError::ContentTooLarge { what: "image", .. }));
    }

    #[test]
    fn image_wider_than_its_slot_is_rejected() {
        let s = laid_out(Section::image(ImageHandle::placeholder(500.0, 10.0)), 400.0);
        let err = s.split_to_height(&space(700.0), &space(700.0)).unwrap_err();
        assert!(matches!(err, LayoutError::ContentTooLarge { .. }));
    }

    #[test]
    fn orphan_chain_detection() {
        let chain = Section::column(vec![Section::column(vec![block(5)])]);
        assert!(chain.is_orphan());
        let pair = Section::column(vec![Section::column(vec![block(1), block(1)])]);
        assert!(!pair.is_orphan());
        assert!(Section::column(vec![]).is_orphan());
    }
}
