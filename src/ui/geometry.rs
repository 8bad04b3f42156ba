//! Integer geometry primitives in logical pixels
//!
//! Rectangles are half-open: a rect at (x, y) with size (w, h) covers
//! columns x..x+w and rows y..y+h. Empty rects (w <= 0 or h <= 0) never
//! intersect anything.

use std::ops::{Add, Neg, Sub};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Same point in device pixels
    pub fn device_point(self, ratio: i32) -> Point {
        Point::new(self.x * ratio, self.y * ratio)
    }
}

impl Add for Point {
    type Output = Point;
    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;
    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Neg for Point {
    type Output = Point;
    fn neg(self) -> Point {
        Point::new(-self.x, -self.y)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Size {
    pub width: i32,
    pub height: i32,
}

impl Size {
    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// Size in device pixels for an integer device pixel ratio
    pub fn device(&self, ratio: i32) -> Size {
        Size::new(self.width * ratio, self.height * ratio)
    }

    /// Component-wise maximum, used for the bounding size across scales
    pub fn expanded_to(&self, other: Size) -> Size {
        Size::new(self.width.max(other.width), self.height.max(other.height))
    }
}

/// Per-side extents (left, top, right, bottom)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Margins {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Margins {
    pub const fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn horizontal(&self) -> i32 {
        self.left + self.right
    }

    pub fn vertical(&self) -> i32 {
        self.top + self.bottom
    }

    /// Offset of the inner box inside a box grown by these margins
    pub fn top_left(&self) -> Point {
        Point::new(self.left, self.top)
    }
}

impl Add for Margins {
    type Output = Margins;
    fn add(self, rhs: Margins) -> Margins {
        Margins::new(
            self.left + rhs.left,
            self.top + rhs.top,
            self.right + rhs.right,
            self.bottom + rhs.bottom,
        )
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn from_parts(origin: Point, size: Size) -> Self {
        Self::new(origin.x, origin.y, size.width, size.height)
    }

    pub fn from_size(size: Size) -> Self {
        Self::from_parts(Point::default(), size)
    }

    pub fn left(&self) -> i32 {
        self.x
    }

    pub fn top(&self) -> i32 {
        self.y
    }

    /// One past the last column
    pub fn right(&self) -> i32 {
        self.x + self.width
    }

    /// One past the last row
    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }

    pub fn top_left(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    pub fn translated(&self, offset: Point) -> Rect {
        Rect::new(self.x + offset.x, self.y + offset.y, self.width, self.height)
    }

    pub fn moved_to(&self, origin: Point) -> Rect {
        Rect::from_parts(origin, self.size())
    }

    pub fn intersected(&self, other: &Rect) -> Rect {
        if self.is_empty() || other.is_empty() {
            return Rect::default();
        }
        let left = self.x.max(other.x);
        let top = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        if right <= left || bottom <= top {
            return Rect::default();
        }
        Rect::new(left, top, right - left, bottom - top)
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        !self.intersected(other).is_empty()
    }

    /// True if `other` lies entirely inside this rect (empty rects are never contained)
    pub fn contains_rect(&self, other: &Rect) -> bool {
        !other.is_empty()
            && other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    pub fn margins_added(&self, margins: Margins) -> Rect {
        Rect::new(
            self.x - margins.left,
            self.y - margins.top,
            self.width + margins.horizontal(),
            self.height + margins.vertical(),
        )
    }

    /// Same rect in device pixels
    pub fn device(&self, ratio: i32) -> Rect {
        Rect::new(
            self.x * ratio,
            self.y * ratio,
            self.width * ratio,
            self.height * ratio,
        )
    }

    /// Smallest rect covering both (an empty side is ignored)
    pub fn united(&self, other: &Rect) -> Rect {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        let left = self.x.min(other.x);
        let top = self.y.min(other.y);
        let right = self.right().max(other.right());
        let bottom = self.bottom().max(other.bottom());
        Rect::new(left, top, right - left, bottom - top)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intersection_of_disjoint_rects_is_empty() {
        let a = Rect::new(0, 0, 10, 10);
        let b = Rect::new(10, 0, 5, 5);
        assert!(a.intersected(&b).is_empty());
        assert!(!a.intersects(&b));
    }

    #[test]
    fn test_intersection_overlap() {
        let a = Rect::new(0, 0, 10, 10);
        let b = Rect::new(5, -5, 10, 10);
        assert_eq!(a.intersected(&b), Rect::new(5, 0, 5, 5));
    }

    #[test]
    fn test_margins_added_and_containment() {
        let inner = Rect::new(4, 4, 10, 6);
        let outer = inner.margins_added(Margins::new(1, 2, 3, 4));
        assert_eq!(outer, Rect::new(3, 2, 14, 12));
        assert!(outer.contains_rect(&inner));
        assert!(!inner.contains_rect(&outer));
        assert!(!outer.contains_rect(&Rect::default()));
    }

    #[test]
    fn test_united_ignores_empty() {
        let a = Rect::new(0, 0, 2, 2);
        assert_eq!(a.united(&Rect::default()), a);
        assert_eq!(a.united(&Rect::new(4, 4, 1, 1)), Rect::new(0, 0, 5, 5));
    }
}
