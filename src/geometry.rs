//! # Geometry
//!
//! Edge and box arithmetic shared by every pass.
//!
//! `Offset` describes the four edges of a margin, padding or line padding.
//! `Rect` is an axis-aligned box that plays two roles: during pagination it
//! is the space still available on a page (its top edge advances as content
//! is consumed), during rendering it is the absolute box a node is drawn in.
//! Coordinates grow downward, like the page the content flows into.

use serde::{Deserialize, Serialize};

/// Edge lengths (top, right, bottom, left) used for margin and padding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Offset {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Offset {
    pub const ZERO: Offset = Offset {
        top: 0.0,
        right: 0.0,
        bottom: 0.0,
        left: 0.0,
    };

    pub fn new(top: f64, right: f64, bottom: f64, left: f64) -> Self {
        Self {
            top,
            right,
            bottom,
            left,
        }
    }

    pub fn uniform(v: f64) -> Self {
        Self::new(v, v, v, v)
    }

    pub fn symmetric(vertical: f64, horizontal: f64) -> Self {
        Self::new(vertical, horizontal, vertical, horizontal)
    }

    pub fn top(v: f64) -> Self {
        Self::new(v, 0.0, 0.0, 0.0)
    }

    pub fn bottom(v: f64) -> Self {
        Self::new(0.0, 0.0, v, 0.0)
    }

    pub fn left(v: f64) -> Self {
        Self::new(0.0, 0.0, 0.0, v)
    }

    pub fn right(v: f64) -> Self {
        Self::new(0.0, v, 0.0, 0.0)
    }

    /// Edge-wise sum.
    pub fn add(mut self, other: Offset) -> Self {
        self.top += other.top;
        self.right += other.right;
        self.bottom += other.bottom;
        self.left += other.left;
        self
    }

    /// Flip the sign of the selected edges.
    pub fn negate(mut self, top: bool, right: bool, bottom: bool, left: bool) -> Self {
        if top {
            self.top = -self.top;
        }
        if right {
            self.right = -self.right;
        }
        if bottom {
            self.bottom = -self.bottom;
        }
        if left {
            self.left = -self.left;
        }
        self
    }

    /// Clamp every edge to be non-negative.
    pub fn clamped(self) -> Self {
        Self::new(
            self.top.max(0.0),
            self.right.max(0.0),
            self.bottom.max(0.0),
            self.left.max(0.0),
        )
    }

    pub fn horizontal(&self) -> f64 {
        self.left + self.right
    }

    pub fn vertical(&self) -> f64 {
        self.top + self.bottom
    }
}

/// An axis-aligned box `{x1, y1, x2, y2}`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rect {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x1: x,
            y1: y,
            x2: x + width,
            y2: y + height,
        }
    }

    /// A box of the given size anchored at the origin.
    pub fn sized(width: f64, height: f64) -> Self {
        Self::new(0.0, 0.0, width, height)
    }

    pub fn width(&self) -> f64 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> f64 {
        self.y2 - self.y1
    }

    /// Shift both edges on each axis.
    pub fn translate(&mut self, dx: f64, dy: f64) -> &mut Self {
        self.x1 += dx;
        self.x2 += dx;
        self.y1 += dy;
        self.y2 += dy;
        self
    }

    /// Shrink inward by `by` on every side. Negative edges grow the box.
    pub fn offset(&mut self, by: Offset) -> &mut Self {
        self.x1 += by.left;
        self.x2 -= by.right;
        self.y1 += by.top;
        self.y2 -= by.bottom;
        self
    }

    /// Advance the top edge downward.
    pub fn offset_top(&mut self, dy: f64) -> &mut Self {
        self.offset(Offset::top(dy))
    }

    /// Pull the bottom edge upward.
    pub fn offset_bottom(&mut self, dy: f64) -> &mut Self {
        self.offset(Offset::bottom(dy))
    }

    /// Set the width, keeping the left edge fixed unless `hold_right`.
    pub fn set_width(&mut self, width: f64, hold_right: bool) -> &mut Self {
        if hold_right {
            self.x1 = self.x2 - width;
        } else {
            self.x2 = self.x1 + width;
        }
        self
    }

    /// Set the height, keeping the top edge fixed unless `hold_bottom`.
    pub fn set_height(&mut self, height: f64, hold_bottom: bool) -> &mut Self {
        if hold_bottom {
            self.y1 = self.y2 - height;
        } else {
            self.y2 = self.y1 + height;
        }
        self
    }
}

/// Explicit coordinates for an overlay-positioned node, relative to the
/// parent's content box.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub width: Option<f64>,
    #[serde(default)]
    pub height: Option<f64>,
}

impl Position {
    pub fn at(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            width: None,
            height: None,
        }
    }

    pub fn with_width(mut self, width: f64) -> Self {
        self.width = Some(width);
        self
    }

    pub fn with_height(mut self, height: f64) -> Self {
        self.height = Some(height);
        self
    }

    /// Declared width, if positive.
    pub fn declared_width(&self) -> Option<f64> {
        self.width.filter(|w| *w > 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_sums() {
        let o = Offset::new(1.0, 2.0, 3.0, 4.0);
        assert_eq!(o.horizontal(), 6.0);
        assert_eq!(o.vertical(), 4.0);
    }

    #[test]
    fn offset_add_and_negate() {
        let o = Offset::uniform(2.0).add(Offset::top(3.0));
        assert_eq!(o.top, 5.0);
        let n = o.negate(true, false, true, false);
        assert_eq!(n.top, -5.0);
        assert_eq!(n.right, 2.0);
        assert_eq!(n.bottom, -2.0);
        assert_eq!(n.left, 2.0);
    }

    #[test]
    fn clamped_drops_negative_edges() {
        let o = Offset::new(-1.0, 2.0, -3.0, 4.0).clamped();
        assert_eq!(o, Offset::new(0.0, 2.0, 0.0, 4.0));
    }

    #[test]
    fn rect_offset_shrinks_inward() {
        let mut r = Rect::new(0.0, 0.0, 100.0, 50.0);
        r.offset(Offset::uniform(10.0));
        assert_eq!(r, Rect::new(10.0, 10.0, 80.0, 30.0));
    }

    #[test]
    fn rect_negative_offset_grows() {
        let mut r = Rect::new(10.0, 10.0, 80.0, 30.0);
        r.offset(Offset::uniform(10.0).negate(true, true, true, true));
        assert_eq!(r, Rect::new(0.0, 0.0, 100.0, 50.0));
    }

    #[test]
    fn rect_translate_moves_both_edges() {
        let mut r = Rect::sized(10.0, 20.0);
        r.translate(5.0, 7.0);
        assert_eq!(r.x1, 5.0);
        assert_eq!(r.y2, 27.0);
        assert_eq!(r.width(), 10.0);
        assert_eq!(r.height(), 20.0);
    }

    #[test]
    fn rect_set_height_holding_bottom() {
        let mut r = Rect::new(0.0, 0.0, 100.0, 100.0);
        r.set_height(30.0, true);
        assert_eq!(r.y1, 70.0);
        assert_eq!(r.y2, 100.0);

        let mut r = Rect::new(0.0, 0.0, 100.0, 100.0);
        r.set_height(30.0, false);
        assert_eq!(r.y1, 0.0);
        assert_eq!(r.y2, 30.0);
    }

    #[test]
    fn rect_set_width_holding_right() {
        let mut r = Rect::new(0.0, 0.0, 100.0, 100.0);
        r.set_width(40.0, true);
        assert_eq!(r.x1, 60.0);
        r.set_width(10.0, false);
        assert_eq!(r.x2, 70.0);
    }

    #[test]
    fn position_ignores_zero_width() {
        assert_eq!(Position::at(1.0, 2.0).with_width(0.0).declared_width(), None);
        assert_eq!(Position::at(1.0, 2.0).with_width(5.0).declared_width(), Some(5.0));
    }
}
