//! Planes: owned rectangular grids of cells.
//!
//! A [`Plane`] knows its own grid, base cell, cursor and drawing state.
//! Everything that involves more than one plane (creation, z-order,
//! destruction, resizing with margin re-derivation, merging) lives on
//! [`crate::Pile`], which owns every plane.

use crate::blit::Sprixel;
use crate::cell::{glyph_width, Cell};
use crate::channel::Channels;
use crate::error::{Error, Result};
use crate::geometry::Dims;
use crate::pile::PlaneId;
use crate::style::Style;
use unicode_segmentation::UnicodeSegmentation;

/// Plane creation flags.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct PlaneFlags(u32);

impl PlaneFlags {
    /// No flags.
    pub const NONE: Self = Self(0);
    /// Size is derived from the parent minus margins and follows parent resizes.
    pub const MARGINALIZED: Self = Self(1 << 0);
    /// Writes wrap at the right edge and scroll the grid past the last row.
    pub const VSCROLL: Self = Self(1 << 1);

    /// Check if every flag of `other` is set.
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }

    /// Add flags.
    #[must_use]
    pub const fn with(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Remove flags.
    #[must_use]
    pub const fn without(self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }

    /// Get raw bits.
    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Create from raw bits; unknown bits are dropped.
    #[must_use]
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits & 0b11)
    }
}

impl std::ops::BitOr for PlaneFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

/// Distances kept from the parent's edges by a marginalized plane.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Margins {
    pub top: u32,
    pub left: u32,
    pub bottom: u32,
    pub right: u32,
}

impl Margins {
    /// Size left inside `parent` once the margins are taken away.
    #[must_use]
    pub const fn fit(self, parent: Dims) -> Dims {
        Dims::new(
            parent.rows.saturating_sub(self.top.saturating_add(self.bottom)),
            parent.cols.saturating_sub(self.left.saturating_add(self.right)),
        )
    }
}

/// Border glyph sets for [`Plane::draw_box`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BoxStyle {
    /// Single line: ┌─┐│└─┘
    #[default]
    Light,
    /// Rounded corners: ╭─╮│╰─╯
    Rounded,
    /// Double line: ╔═╗║╚═╝
    Double,
    /// Heavy/thick: ┏━┓┃┗━┛
    Heavy,
    /// ASCII only: +-+|+-+
    Ascii,
}

impl BoxStyle {
    /// Border glyphs: (`top_left`, `top_right`, `bottom_left`, `bottom_right`, horizontal, vertical)
    #[must_use]
    pub const fn glyphs(self) -> (&'static str, &'static str, &'static str, &'static str, &'static str, &'static str) {
        match self {
            Self::Light => ("┌", "┐", "└", "┘", "─", "│"),
            Self::Rounded => ("╭", "╮", "╰", "╯", "─", "│"),
            Self::Double => ("╔", "╗", "╚", "╝", "═", "║"),
            Self::Heavy => ("┏", "┓", "┗", "┛", "━", "┃"),
            Self::Ascii => ("+", "+", "+", "+", "-", "|"),
        }
    }
}

/// Called with the plane's id and new size after every resize.
pub type ResizeCallback = Box<dyn FnMut(PlaneId, Dims)>;

/// A positioned rectangular grid of cells.
pub struct Plane {
    id: PlaneId,
    name: String,
    /// Origin relative to the parent (root: relative to the screen).
    pub(crate) origin: (i32, i32),
    dims: Dims,
    grid: Vec<Cell>,
    base: Cell,
    cursor: (u32, u32),
    flags: PlaneFlags,
    styles: Style,
    channels: Channels,
    pub(crate) margins: Option<Margins>,
    pub(crate) parent: Option<PlaneId>,
    pub(crate) children: Vec<PlaneId>,
    pub(crate) resize_cb: Option<ResizeCallback>,
    pub(crate) sprixel: Option<Sprixel>,
}

impl std::fmt::Debug for Plane {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Plane")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("origin", &self.origin)
            .field("dims", &self.dims)
            .field("cursor", &self.cursor)
            .field("flags", &self.flags)
            .field("parent", &self.parent)
            .field("children", &self.children)
            .finish_non_exhaustive()
    }
}

/// Allocate a grid of empty cells, reporting exhaustion instead of aborting.
fn alloc_grid(dims: Dims) -> Result<Vec<Cell>> {
    let mut grid = Vec::new();
    grid.try_reserve_exact(dims.area())?;
    grid.resize(dims.area(), Cell::empty());
    Ok(grid)
}

impl Plane {
    pub(crate) fn new(
        id: PlaneId,
        name: String,
        origin: (i32, i32),
        dims: Dims,
        flags: PlaneFlags,
    ) -> Result<Self> {
        if dims.is_empty() {
            return Err(Error::InvalidGeometry(format!(
                "plane '{name}' would be {}x{}",
                dims.rows, dims.cols
            )));
        }
        Ok(Self {
            id,
            name,
            origin,
            dims,
            grid: alloc_grid(dims)?,
            base: Cell::empty(),
            cursor: (0, 0),
            flags,
            styles: Style::NONE,
            channels: Channels::DEFAULT,
            margins: None,
            parent: None,
            children: Vec::new(),
            resize_cb: None,
            sprixel: None,
        })
    }

    /// Stable identifier.
    #[must_use]
    pub const fn id(&self) -> PlaneId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Origin `(y, x)` relative to the parent.
    #[must_use]
    pub const fn origin(&self) -> (i32, i32) {
        self.origin
    }

    #[must_use]
    pub const fn dims(&self) -> Dims {
        self.dims
    }

    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.dims.rows
    }

    #[must_use]
    pub const fn cols(&self) -> u32 {
        self.dims.cols
    }

    #[must_use]
    pub const fn flags(&self) -> PlaneFlags {
        self.flags
    }

    /// Parent plane; `None` for the root.
    #[must_use]
    pub const fn parent(&self) -> Option<PlaneId> {
        self.parent
    }

    /// Direct children, in creation order.
    #[must_use]
    pub fn children(&self) -> &[PlaneId] {
        &self.children
    }

    /// Cursor `(y, x)`. `x` may equal the width after a run ends at the right edge.
    #[must_use]
    pub const fn cursor(&self) -> (u32, u32) {
        self.cursor
    }

    /// Move the cursor.
    pub fn cursor_move_yx(&mut self, y: u32, x: u32) -> Result<()> {
        self.check_bounds(y, x)?;
        self.cursor = (y, x);
        Ok(())
    }

    /// Move the cursor to the origin.
    pub fn home(&mut self) {
        self.cursor = (0, 0);
    }

    /// Styles applied by subsequent writes.
    #[must_use]
    pub const fn styles(&self) -> Style {
        self.styles
    }

    pub fn set_styles(&mut self, styles: Style) {
        self.styles = styles;
    }

    pub fn on_styles(&mut self, styles: Style) {
        self.styles |= styles;
    }

    pub fn off_styles(&mut self, styles: Style) {
        self.styles = self.styles.without(styles);
    }

    /// Channels applied by subsequent writes.
    #[must_use]
    pub const fn channels(&self) -> Channels {
        self.channels
    }

    pub fn set_channels(&mut self, channels: Channels) {
        self.channels = channels;
    }

    /// Fallback cell for every position whose glyph is empty.
    #[must_use]
    pub const fn base(&self) -> &Cell {
        &self.base
    }

    /// Set the base cell. Only the first grapheme cluster of `glyph` is kept.
    pub fn set_base(&mut self, glyph: &str, style: Style, channels: Channels) {
        let first = glyph.graphemes(true).next().unwrap_or("");
        self.base = Cell::new(first, style, channels);
    }

    /// Set the base cell from an existing cell.
    pub fn set_base_cell(&mut self, cell: &Cell) {
        self.base.assign(cell);
    }

    /// Pixel graphics attached by a pixel blit, if any.
    #[must_use]
    pub const fn sprixel(&self) -> Option<&Sprixel> {
        self.sprixel.as_ref()
    }

    /// Cell at `(y, x)` as it displays: the base cell where the grid cell is empty.
    #[must_use]
    pub fn cell_at(&self, y: u32, x: u32) -> Option<&Cell> {
        let cell = self.raw_cell(y, x)?;
        if cell.is_empty() {
            Some(&self.base)
        } else {
            Some(cell)
        }
    }

    /// Grid cell at `(y, x)` without base-cell resolution.
    #[must_use]
    pub fn raw_cell(&self, y: u32, x: u32) -> Option<&Cell> {
        if y < self.dims.rows && x < self.dims.cols {
            Some(&self.grid[self.index(y, x)])
        } else {
            None
        }
    }

    const fn index(&self, y: u32, x: u32) -> usize {
        y as usize * self.dims.cols as usize + x as usize
    }

    fn check_bounds(&self, y: u32, x: u32) -> Result<()> {
        if y < self.dims.rows && x < self.dims.cols {
            Ok(())
        } else {
            Err(Error::OutOfBounds {
                y,
                x,
                rows: self.dims.rows,
                cols: self.dims.cols,
            })
        }
    }

    /// Clear the grid back to the base cell and home the cursor.
    pub fn erase(&mut self) {
        for cell in &mut self.grid {
            cell.reset();
        }
        self.sprixel = None;
        self.cursor = (0, 0);
    }

    /// Clear half-written wide glyphs around `(y, x)` before it is overwritten.
    fn clear_wide_remnants(&mut self, y: u32, x: u32) {
        let idx = self.index(y, x);
        if self.grid[idx].is_continuation() && x > 0 {
            self.grid[idx - 1].reset();
        }
        if self.grid[idx].width() == 2 && x + 1 < self.dims.cols {
            self.grid[idx + 1].reset();
        }
    }

    /// Store one cluster at `(y, x)`; the caller guarantees it fits.
    fn store(&mut self, y: u32, x: u32, glyph: &str, style: Style, channels: Channels) {
        let width = u32::from(glyph_width(glyph));
        self.clear_wide_remnants(y, x);
        if width == 2 {
            self.clear_wide_remnants(y, x + 1);
        }
        let idx = self.index(y, x);
        self.grid[idx].update(glyph, style, channels);
        if width == 2 {
            self.grid[idx + 1].make_continuation(style, channels);
        }
    }

    /// Write a copy of `cell` at `(y, x)`. Wide cells that would cross the
    /// right edge are not written. Returns the columns consumed.
    pub fn putc_yx(&mut self, y: u32, x: u32, cell: &Cell) -> Result<u32> {
        self.check_bounds(y, x)?;
        if cell.is_continuation() {
            return Ok(0);
        }
        let width = u32::from(cell.width());
        if x + width > self.dims.cols {
            return Ok(0);
        }
        self.store(y, x, cell.glyph(), cell.style, cell.channels);
        Ok(width)
    }

    /// Scroll the grid up by `lines`, blanking the rows that appear at the bottom.
    fn scroll_up(&mut self, lines: u32) {
        let cols = self.dims.cols as usize;
        let lines = lines.min(self.dims.rows) as usize;
        self.grid.rotate_left(lines * cols);
        let fresh = self.grid.len() - lines * cols;
        for cell in &mut self.grid[fresh..] {
            cell.reset();
        }
        log::trace!("plane {} scrolled {lines} line(s)", self.id);
    }

    /// Advance `(y, x)` to the start of the next row. Returns `false` when
    /// the plane has no further row and cannot scroll.
    fn next_line(&mut self, y: &mut u32, x: &mut u32) -> bool {
        if *y + 1 < self.dims.rows {
            *y += 1;
            *x = 0;
            true
        } else if self.flags.contains(PlaneFlags::VSCROLL) {
            self.scroll_up(1);
            *x = 0;
            true
        } else {
            false
        }
    }

    /// Write `s` at the cursor.
    pub fn putstr(&mut self, s: &str) -> Result<usize> {
        self.putstr_yx(None, None, s)
    }

    /// Write `s` starting at `(y, x)`; `None` keeps the cursor's coordinate.
    ///
    /// Uses the plane's current styles and channels. Returns the number of
    /// grapheme clusters written; line breaks are not counted.
    ///
    /// Without [`PlaneFlags::VSCROLL`] the run is truncated at the right edge
    /// and a start outside the grid is an [`Error::OutOfBounds`]. With it the
    /// run wraps to the next row, scrolling the grid when it passes the last
    /// row.
    pub fn putstr_yx(&mut self, y: Option<u32>, x: Option<u32>, s: &str) -> Result<usize> {
        let mut y = y.unwrap_or(self.cursor.0);
        let mut x = x.unwrap_or(self.cursor.1);
        let vscroll = self.flags.contains(PlaneFlags::VSCROLL);

        if !vscroll {
            self.check_bounds(y, x)?;
        } else {
            if y >= self.dims.rows {
                self.scroll_up(y - self.dims.rows + 1);
                y = self.dims.rows - 1;
            }
            if x >= self.dims.cols && !self.next_line(&mut y, &mut x) {
                return Err(Error::OutOfBounds {
                    y,
                    x,
                    rows: self.dims.rows,
                    cols: self.dims.cols,
                });
            }
        }

        let (styles, channels) = (self.styles, self.channels);
        let mut written = 0;
        for g in s.graphemes(true) {
            if g == "\n" || g == "\r\n" {
                if !self.next_line(&mut y, &mut x) {
                    break;
                }
                continue;
            }
            if g.chars().any(char::is_control) {
                continue;
            }
            let width = u32::from(glyph_width(g));
            if width > self.dims.cols {
                break;
            }
            if x + width > self.dims.cols {
                if !vscroll || !self.next_line(&mut y, &mut x) {
                    break;
                }
            }
            self.store(y, x, g, styles, channels);
            x += width;
            written += 1;
        }
        self.cursor = (y, x);
        Ok(written)
    }

    /// Draw `len` copies of `cell` rightwards from the cursor, stopping at the
    /// edge. The cursor ends just past the last cell drawn.
    pub fn hline(&mut self, cell: &Cell, len: u32) -> Result<u32> {
        let (y, mut x) = self.cursor;
        self.check_bounds(y, x)?;
        let mut drawn = 0;
        while drawn < len {
            let used = self.putc_yx(y, x, cell)?;
            if used == 0 {
                break;
            }
            x += used;
            drawn += 1;
            if x >= self.dims.cols {
                break;
            }
        }
        self.cursor = (y, x);
        Ok(drawn)
    }

    /// Draw `len` copies of `cell` downwards from the cursor, stopping at the
    /// bottom edge. The cursor ends on the last cell drawn.
    pub fn vline(&mut self, cell: &Cell, len: u32) -> Result<u32> {
        let (mut y, x) = self.cursor;
        self.check_bounds(y, x)?;
        let mut drawn = 0;
        while drawn < len && y < self.dims.rows {
            if self.putc_yx(y, x, cell)? == 0 {
                break;
            }
            drawn += 1;
            y += 1;
        }
        self.cursor = (y.saturating_sub(1).max(self.cursor.0), x);
        Ok(drawn)
    }

    /// Draw a one-cell border along the perimeter. The cursor is unchanged.
    pub fn draw_box(&mut self, style: Style, channels: Channels, kind: BoxStyle) -> Result<()> {
        let Dims { rows, cols } = self.dims;
        if rows < 2 || cols < 2 {
            return Err(Error::InvalidGeometry(format!(
                "a box needs at least 2x2 cells, plane is {rows}x{cols}"
            )));
        }
        let (tl, tr, bl, br, h, v) = kind.glyphs();
        let (bottom, right) = (rows - 1, cols - 1);

        self.store(0, 0, tl, style, channels);
        self.store(0, right, tr, style, channels);
        self.store(bottom, 0, bl, style, channels);
        self.store(bottom, right, br, style, channels);
        for x in 1..right {
            self.store(0, x, h, style, channels);
            self.store(bottom, x, h, style, channels);
        }
        for y in 1..bottom {
            self.store(y, 0, v, style, channels);
            self.store(y, right, v, style, channels);
        }
        Ok(())
    }

    /// Replace the grid with one of `dims`, keeping content top-left anchored.
    ///
    /// The new grid is allocated before anything changes, so a failed
    /// allocation leaves the plane untouched.
    pub(crate) fn resize_grid(&mut self, dims: Dims) -> Result<()> {
        if let Some(grid) = self.regrid(dims)? {
            self.install_grid(dims, grid);
        }
        Ok(())
    }

    /// This plane's content laid out at `dims`, or `None` if the size is
    /// unchanged. Leaves the plane untouched.
    pub(crate) fn regrid(&self, dims: Dims) -> Result<Option<Vec<Cell>>> {
        if dims.is_empty() {
            return Err(Error::InvalidGeometry(format!(
                "cannot resize plane '{}' to {}x{}",
                self.name, dims.rows, dims.cols
            )));
        }
        if dims == self.dims {
            return Ok(None);
        }
        let mut grid = alloc_grid(dims)?;
        let keep_rows = self.dims.rows.min(dims.rows);
        let keep_cols = self.dims.cols.min(dims.cols);
        for y in 0..keep_rows {
            for x in 0..keep_cols {
                let new = y as usize * dims.cols as usize + x as usize;
                grid[new].clone_from(&self.grid[self.index(y, x)]);
            }
            // a wide glyph cut in half by the new right edge goes away
            let last = y as usize * dims.cols as usize + keep_cols as usize - 1;
            if grid[last].width() == 2 {
                grid[last].reset();
            }
        }
        Ok(Some(grid))
    }

    /// Swap in a grid built by [`Plane::regrid`] for `dims`.
    pub(crate) fn install_grid(&mut self, dims: Dims, grid: Vec<Cell>) {
        self.grid = grid;
        self.dims = dims;
        self.cursor = (
            self.cursor.0.min(dims.rows - 1),
            self.cursor.1.min(dims.cols),
        );
    }

    /// Overwrite `(y, x)` with an already-resolved cell, continuation included.
    pub(crate) fn put_resolved(&mut self, y: u32, x: u32, cell: &Cell) {
        if y >= self.dims.rows || x >= self.dims.cols {
            return;
        }
        self.clear_wide_remnants(y, x);
        let idx = self.index(y, x);
        self.grid[idx].assign(cell);
    }

    /// Invoke the resize callback, if any.
    pub(crate) fn notify_resized(&mut self) {
        if let Some(cb) = self.resize_cb.as_mut() {
            cb(self.id, self.dims);
        }
    }
}
