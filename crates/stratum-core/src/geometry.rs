//! Cell-grid geometry: signed rectangles in terminal coordinates.

use serde::{Deserialize, Serialize};

/// Rows × columns extent of a plane or frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Dims {
    /// Number of rows.
    pub rows: u32,
    /// Number of columns.
    pub cols: u32,
}

impl Dims {
    /// Create new dimensions.
    #[must_use]
    pub const fn new(rows: u32, cols: u32) -> Self {
        Self { rows, cols }
    }

    /// Number of cells.
    #[must_use]
    pub const fn area(self) -> usize {
        (self.rows as usize).saturating_mul(self.cols as usize)
    }

    /// Either extent is zero.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.rows == 0 || self.cols == 0
    }
}

/// A rectangle of cells. The origin may be negative (off-screen).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rect {
    /// Top row.
    pub y: i32,
    /// Left column.
    pub x: i32,
    /// Height in rows.
    pub rows: u32,
    /// Width in columns.
    pub cols: u32,
}

impl Rect {
    /// Create a new rectangle.
    #[must_use]
    pub const fn new(y: i32, x: i32, rows: u32, cols: u32) -> Self {
        Self { y, x, rows, cols }
    }

    /// Rectangle at the origin covering `dims`.
    #[must_use]
    pub const fn from_dims(dims: Dims) -> Self {
        Self::new(0, 0, dims.rows, dims.cols)
    }

    /// One past the bottom row.
    #[must_use]
    pub const fn bottom(self) -> i64 {
        self.y as i64 + self.rows as i64
    }

    /// One past the rightmost column.
    #[must_use]
    pub const fn right(self) -> i64 {
        self.x as i64 + self.cols as i64
    }

    /// Whether the rectangle covers no cell.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.rows == 0 || self.cols == 0
    }

    /// Whether `(y, x)` lies inside.
    #[must_use]
    pub const fn contains(self, y: i64, x: i64) -> bool {
        y >= self.y as i64 && y < self.bottom() && x >= self.x as i64 && x < self.right()
    }

    /// Overlap of two rectangles, if any.
    #[must_use]
    pub fn intersect(self, other: Self) -> Option<Self> {
        let y1 = i64::from(self.y.max(other.y));
        let x1 = i64::from(self.x.max(other.x));
        let y2 = self.bottom().min(other.bottom());
        let x2 = self.right().min(other.right());

        if y2 > y1 && x2 > x1 {
            Some(Self::new(y1 as i32, x1 as i32, (y2 - y1) as u32, (x2 - x1) as u32))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_dims_area() {
        assert_eq!(Dims::new(24, 80).area(), 1920);
        assert!(Dims::new(0, 80).is_empty());
        assert!(!Dims::new(1, 1).is_empty());
    }

    #[test]
    fn test_rect_contains() {
        let r = Rect::new(2, 1, 10, 40);
        assert!(r.contains(2, 1));
        assert!(r.contains(11, 40));
        assert!(!r.contains(12, 40));
        assert!(!r.contains(2, 41));
        assert!(!r.contains(1, 1));
    }

    #[test]
    fn test_rect_intersect() {
        let a = Rect::new(0, 0, 10, 10);
        let b = Rect::new(5, 5, 10, 10);
        assert_eq!(a.intersect(b), Some(Rect::new(5, 5, 5, 5)));
    }

    #[test]
    fn test_rect_intersect_negative_origin() {
        let screen = Rect::new(0, 0, 24, 80);
        let plane = Rect::new(-3, -5, 10, 10);
        assert_eq!(plane.intersect(screen), Some(Rect::new(0, 0, 7, 5)));
    }

    #[test]
    fn test_rect_disjoint() {
        let a = Rect::new(0, 0, 2, 2);
        let b = Rect::new(2, 0, 2, 2);
        assert_eq!(a.intersect(b), None);
    }

    proptest! {
        #[test]
        fn prop_intersection_inside_both(
            y1 in -50i32..50, x1 in -50i32..50, r1 in 0u32..40, c1 in 0u32..40,
            y2 in -50i32..50, x2 in -50i32..50, r2 in 0u32..40, c2 in 0u32..40,
        ) {
            let a = Rect::new(y1, x1, r1, c1);
            let b = Rect::new(y2, x2, r2, c2);
            if let Some(i) = a.intersect(b) {
                prop_assert!(!i.is_empty());
                prop_assert!(a.contains(i64::from(i.y), i64::from(i.x)));
                prop_assert!(b.contains(i64::from(i.y), i64::from(i.x)));
                prop_assert!(a.contains(i.bottom() - 1, i.right() - 1));
                prop_assert!(b.contains(i.bottom() - 1, i.right() - 1));
            }
            prop_assert_eq!(a.intersect(b), b.intersect(a));
        }
    }
}
