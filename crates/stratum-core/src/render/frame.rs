//! Composited screen contents.
//!
//! One frame holds the fully resolved cell for every screen position plus
//! the pixel graphics placed on it. The renderer keeps two: the frame the
//! terminal currently shows and the one just composited.

use crate::cell::Cell;
use crate::geometry::Dims;
use crate::pile::PlaneId;
use bitvec::prelude::*;

/// Pixel graphics placed on screen by a plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    /// Plane carrying the graphics.
    pub plane: PlaneId,
    /// Terminal image id.
    pub image_id: u32,
    /// Bumped on every new blit into the plane.
    pub generation: u32,
    /// Screen row of the top-left cell.
    pub y: u32,
    /// Screen column of the top-left cell.
    pub x: u32,
}

/// A screen-sized grid of resolved cells.
///
/// Memory footprint for an 80×24 terminal is about 75KB.
#[derive(Debug, Clone)]
pub struct FrameBuffer {
    cells: Vec<Cell>,
    dims: Dims,
    graphics: Vec<Placement>,
}

impl FrameBuffer {
    /// Create a frame of blank cells.
    #[must_use]
    pub fn new(dims: Dims) -> Self {
        Self {
            cells: vec![Cell::blank(); dims.area()],
            dims,
            graphics: Vec::new(),
        }
    }

    #[must_use]
    pub const fn dims(&self) -> Dims {
        self.dims
    }

    /// Get total cell count.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Check if the frame has no cells.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Convert `(y, x)` to a linear index.
    #[must_use]
    pub const fn index(&self, y: u32, x: u32) -> usize {
        y as usize * self.dims.cols as usize + x as usize
    }

    /// Convert a linear index to `(y, x)`.
    #[must_use]
    pub const fn coords(&self, idx: usize) -> (u32, u32) {
        let cols = self.dims.cols as usize;
        ((idx / cols) as u32, (idx % cols) as u32)
    }

    /// Get a cell reference.
    #[must_use]
    pub fn get(&self, y: u32, x: u32) -> Option<&Cell> {
        if y < self.dims.rows && x < self.dims.cols {
            Some(&self.cells[self.index(y, x)])
        } else {
            None
        }
    }

    /// Get a mutable cell reference.
    pub fn get_mut(&mut self, y: u32, x: u32) -> Option<&mut Cell> {
        if y < self.dims.rows && x < self.dims.cols {
            let idx = self.index(y, x);
            Some(&mut self.cells[idx])
        } else {
            None
        }
    }

    #[must_use]
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub(crate) fn cells_mut(&mut self) -> &mut [Cell] {
        &mut self.cells
    }

    /// Text of row `y`, continuation cells skipped.
    #[must_use]
    pub fn row_text(&self, y: u32) -> String {
        if y >= self.dims.rows {
            return String::new();
        }
        let start = self.index(y, 0);
        self.cells[start..start + self.dims.cols as usize]
            .iter()
            .map(Cell::glyph)
            .collect()
    }

    /// Pixel graphics on this frame.
    #[must_use]
    pub fn graphics(&self) -> &[Placement] {
        &self.graphics
    }

    pub(crate) fn graphics_mut(&mut self) -> &mut Vec<Placement> {
        &mut self.graphics
    }

    /// Resize the frame (clears all content).
    pub fn resize(&mut self, dims: Dims) {
        self.dims = dims;
        self.cells.clear();
        self.cells.resize(dims.area(), Cell::blank());
        self.graphics.clear();
    }

    /// Reset every cell to `cell`.
    pub(crate) fn fill(&mut self, cell: &Cell) {
        for c in &mut self.cells {
            c.assign(cell);
        }
        self.graphics.clear();
    }

    /// Mask of positions whose cell differs from `other`'s.
    ///
    /// Frames of different sizes differ everywhere.
    #[must_use]
    pub fn diff_mask(&self, other: &Self) -> BitVec {
        if self.dims != other.dims {
            return bitvec![1; self.cells.len()];
        }
        self.cells
            .iter()
            .zip(&other.cells)
            .map(|(a, b)| a != b)
            .collect()
    }
}
