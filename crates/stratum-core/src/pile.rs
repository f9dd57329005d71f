//! The plane tree.
//!
//! A [`Pile`] owns every plane of one screen in an arena indexed by
//! generational [`PlaneId`]s. The tree (parent/children) governs coordinate
//! transforms and clipping; painting follows a single global z-order kept
//! bottom to top.

use crate::blend::layer_cell;
use crate::cell::Cell;
use crate::error::{Error, Result};
use crate::geometry::{Dims, Rect};
use crate::plane::{Margins, Plane, PlaneFlags, ResizeCallback};
use std::fmt;

/// A plane's pending size and, if it changes, its rebuilt grid.
type StagedGrid = (PlaneId, Dims, Option<Vec<Cell>>);

/// Stable handle to a plane.
///
/// Ids of destroyed planes never resolve again, even when their slot is
/// reused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PlaneId {
    index: u32,
    generation: u32,
}

impl PlaneId {
    pub(crate) const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Arena slot.
    #[must_use]
    pub const fn index(self) -> u32 {
        self.index
    }

    /// Times the slot had been reused when this id was issued.
    #[must_use]
    pub const fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Display for PlaneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}.{}", self.index, self.generation)
    }
}

/// Creation parameters for [`Pile::create`].
///
/// `rows`/`cols` take [`PlaneOptions::INHERIT`] to copy the parent's extent
/// on that axis. Both zero, or the [`PlaneFlags::MARGINALIZED`] flag, make
/// the plane fill its parent: `y`/`x` become the top/left margins and
/// `margin_b`/`margin_r` the bottom/right ones.
#[derive(Default)]
pub struct PlaneOptions {
    pub y: i32,
    pub x: i32,
    pub rows: i32,
    pub cols: i32,
    pub flags: PlaneFlags,
    pub margin_b: u32,
    pub margin_r: u32,
    pub name: Option<String>,
    pub resize_cb: Option<ResizeCallback>,
}

impl fmt::Debug for PlaneOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlaneOptions")
            .field("y", &self.y)
            .field("x", &self.x)
            .field("rows", &self.rows)
            .field("cols", &self.cols)
            .field("flags", &self.flags)
            .field("margin_b", &self.margin_b)
            .field("margin_r", &self.margin_r)
            .field("name", &self.name)
            .field("resize_cb", &self.resize_cb.is_some())
            .finish()
    }
}

impl PlaneOptions {
    /// Take the parent's extent on this axis.
    pub const INHERIT: i32 = -1;

    /// Plane at `(y, x)` of `rows` × `cols`.
    #[must_use]
    pub fn new(y: i32, x: i32, rows: i32, cols: i32) -> Self {
        Self {
            y,
            x,
            rows,
            cols,
            ..Self::default()
        }
    }

    /// Plane filling its parent minus the given margins.
    #[must_use]
    pub fn marginalized(top: u32, left: u32, bottom: u32, right: u32) -> Self {
        Self {
            y: top as i32,
            x: left as i32,
            flags: PlaneFlags::MARGINALIZED,
            margin_b: bottom,
            margin_r: right,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_flags(mut self, flags: PlaneFlags) -> Self {
        self.flags = self.flags | flags;
        self
    }

    /// Install a callback run after every resize of the plane.
    #[must_use]
    pub fn on_resize(mut self, cb: impl FnMut(PlaneId, Dims) + 'static) -> Self {
        self.resize_cb = Some(Box::new(cb));
        self
    }

    fn is_marginalized(&self) -> bool {
        self.flags.contains(PlaneFlags::MARGINALIZED) || (self.rows == 0 && self.cols == 0)
    }

    /// Resolve the plane's size against its parent.
    fn geometry(&self, parent: Dims) -> Result<(Dims, Option<Margins>)> {
        if self.is_marginalized() {
            if self.y < 0 || self.x < 0 {
                return Err(Error::InvalidGeometry(format!(
                    "negative margins ({}, {})",
                    self.y, self.x
                )));
            }
            let margins = Margins {
                top: self.y as u32,
                left: self.x as u32,
                bottom: self.margin_b,
                right: self.margin_r,
            };
            let dims = margins.fit(parent);
            if dims.is_empty() {
                return Err(Error::InvalidGeometry(format!(
                    "margins leave no room in a {}x{} parent",
                    parent.rows, parent.cols
                )));
            }
            return Ok((dims, Some(margins)));
        }

        let axis = |value: i32, inherited: u32, what: &str| match value {
            Self::INHERIT => Ok(inherited),
            v if v < 0 => Err(Error::InvalidGeometry(format!("negative {what}: {v}"))),
            v => Ok(v as u32),
        };
        let dims = Dims::new(
            axis(self.rows, parent.rows, "rows")?,
            axis(self.cols, parent.cols, "cols")?,
        );
        if dims.is_empty() {
            return Err(Error::InvalidGeometry(format!(
                "{}x{}: only one dimension is zero",
                dims.rows, dims.cols
            )));
        }
        Ok((dims, None))
    }
}

#[derive(Debug)]
struct Slot {
    generation: u32,
    plane: Option<Plane>,
}

/// Arena of planes rooted at the screen-sized standard plane.
#[derive(Debug)]
pub struct Pile {
    slots: Vec<Slot>,
    free: Vec<u32>,
    root: PlaneId,
    /// Paint order, bottom to top.
    zorder: Vec<PlaneId>,
}

impl Pile {
    /// Create a pile whose root plane covers `screen`.
    pub fn new(screen: Dims) -> Result<Self> {
        let root = PlaneId::new(0, 0);
        let plane = Plane::new(root, "std".to_string(), (0, 0), screen, PlaneFlags::NONE)?;
        Ok(Self {
            slots: vec![Slot {
                generation: 0,
                plane: Some(plane),
            }],
            free: Vec::new(),
            root,
            zorder: vec![root],
        })
    }

    /// The standard plane.
    #[must_use]
    pub const fn root(&self) -> PlaneId {
        self.root
    }

    /// Screen size, which is the root plane's size.
    #[must_use]
    pub fn dims(&self) -> Dims {
        self.slots[self.root.index as usize]
            .plane
            .as_ref()
            .map_or_else(Dims::default, Plane::dims)
    }

    /// Number of live planes, root included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.zorder.len()
    }

    /// Never true: the root always exists.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.zorder.is_empty()
    }

    /// Whether `id` names a live plane.
    #[must_use]
    pub fn contains(&self, id: PlaneId) -> bool {
        self.plane(id).is_ok()
    }

    pub fn plane(&self, id: PlaneId) -> Result<&Plane> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.plane.as_ref())
            .ok_or(Error::UnknownPlane(id))
    }

    pub fn plane_mut(&mut self, id: PlaneId) -> Result<&mut Plane> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.plane.as_mut())
            .ok_or(Error::UnknownPlane(id))
    }

    /// The root plane.
    pub fn root_plane_mut(&mut self) -> Result<&mut Plane> {
        self.plane_mut(self.root)
    }

    /// Id the next created plane will get.
    fn next_id(&self) -> PlaneId {
        match self.free.last() {
            Some(&index) => PlaneId::new(index, self.slots[index as usize].generation),
            None => PlaneId::new(self.slots.len() as u32, 0),
        }
    }

    fn occupy(&mut self, plane: Plane) {
        let id = plane.id();
        if self.free.last() == Some(&id.index) {
            self.free.pop();
            self.slots[id.index as usize].plane = Some(plane);
        } else {
            self.slots.push(Slot {
                generation: id.generation,
                plane: Some(plane),
            });
        }
    }

    /// Create a plane under `parent`, on top of the z-order.
    pub fn create(&mut self, parent: PlaneId, opts: PlaneOptions) -> Result<PlaneId> {
        let parent_dims = self.plane(parent)?.dims();
        let (dims, margins) = opts.geometry(parent_dims)?;
        let id = self.next_id();
        let name = opts.name.unwrap_or_default();

        let mut plane = Plane::new(id, name, (opts.y, opts.x), dims, opts.flags)?;
        plane.margins = margins;
        plane.parent = Some(parent);
        plane.resize_cb = opts.resize_cb;

        self.occupy(plane);
        self.plane_mut(parent)?.children.push(id);
        self.zorder.push(id);
        log::debug!(
            "created plane {id} ({}x{}) at ({}, {}) under {parent}",
            dims.rows,
            dims.cols,
            opts.y,
            opts.x
        );
        Ok(id)
    }

    fn release(&mut self, id: PlaneId) {
        let slot = &mut self.slots[id.index as usize];
        slot.plane = None;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        self.zorder.retain(|&z| z != id);
    }

    /// Destroy a plane.
    ///
    /// With `family`, every descendant goes too. Otherwise the children are
    /// handed to the destroyed plane's parent, their origins shifted so they
    /// stay where they were on screen.
    pub fn destroy(&mut self, id: PlaneId, family: bool) -> Result<()> {
        if id == self.root {
            return Err(Error::RootPlane);
        }
        let plane = self.plane_mut(id)?;
        let parent = plane.parent.ok_or(Error::RootPlane)?;
        let origin = plane.origin;
        let children = std::mem::take(&mut plane.children);

        if family {
            let mut doomed = children;
            while let Some(victim) = doomed.pop() {
                if let Ok(p) = self.plane_mut(victim) {
                    doomed.append(&mut p.children);
                }
                self.release(victim);
            }
            self.plane_mut(parent)?.children.retain(|&c| c != id);
        } else {
            for &child in &children {
                let c = self.plane_mut(child)?;
                c.parent = Some(parent);
                c.origin = (
                    c.origin.0.saturating_add(origin.0),
                    c.origin.1.saturating_add(origin.1),
                );
            }
            let siblings = &mut self.plane_mut(parent)?.children;
            if let Some(pos) = siblings.iter().position(|&c| c == id) {
                siblings.splice(pos..=pos, children);
            }
        }
        self.release(id);
        log::debug!("destroyed plane {id} (family: {family})");
        Ok(())
    }

    /// Move a plane's origin, relative to its parent.
    pub fn move_yx(&mut self, id: PlaneId, y: i32, x: i32) -> Result<()> {
        if id == self.root {
            return Err(Error::RootPlane);
        }
        self.plane_mut(id)?.origin = (y, x);
        Ok(())
    }

    /// Resize a plane; see [`Pile::resize_screen`] for the root.
    pub fn resize(&mut self, id: PlaneId, rows: u32, cols: u32) -> Result<()> {
        if id == self.root {
            return Err(Error::RootPlane);
        }
        self.resize_plane(id, Dims::new(rows, cols))
    }

    /// Resize the root plane to a new screen size.
    ///
    /// Reserved for the terminal driver reacting to a terminal resize.
    pub fn resize_screen(&mut self, screen: Dims) -> Result<()> {
        log::debug!("screen resized to {}x{}", screen.rows, screen.cols);
        self.resize_plane(self.root, screen)
    }

    /// Resize `id` and refit its marginalized descendants.
    ///
    /// Every new grid is built before any plane changes, so a failure
    /// anywhere in the subtree leaves all of them as they were.
    fn resize_plane(&mut self, id: PlaneId, dims: Dims) -> Result<()> {
        let mut staged = Vec::new();
        self.stage_resize(id, dims, &mut staged)?;
        for (id, dims, grid) in staged {
            // staged ids were all resolved above
            let plane = self.plane_mut(id)?;
            if let Some(grid) = grid {
                plane.install_grid(dims, grid);
            }
            plane.notify_resized();
        }
        Ok(())
    }

    fn stage_resize(&self, id: PlaneId, dims: Dims, staged: &mut Vec<StagedGrid>) -> Result<()> {
        let plane = self.plane(id)?;
        staged.push((id, dims, plane.regrid(dims)?));
        for &child in &plane.children {
            let Some(margins) = self.plane(child)?.margins else {
                continue;
            };
            let fitted = margins.fit(dims);
            if fitted.is_empty() {
                log::warn!("plane {child} keeps its size: margins exceed {}x{}", dims.rows, dims.cols);
                continue;
            }
            self.stage_resize(child, fitted, staged)?;
        }
        Ok(())
    }

    /// Raise a plane to the top of the z-order.
    pub fn move_top(&mut self, id: PlaneId) -> Result<()> {
        self.plane(id)?;
        self.zorder.retain(|&z| z != id);
        self.zorder.push(id);
        Ok(())
    }

    /// Sink a plane to the bottom of the z-order.
    pub fn move_bottom(&mut self, id: PlaneId) -> Result<()> {
        self.plane(id)?;
        self.zorder.retain(|&z| z != id);
        self.zorder.insert(0, id);
        Ok(())
    }

    /// All planes, bottom to top.
    #[must_use]
    pub fn zorder(&self) -> &[PlaneId] {
        &self.zorder
    }

    fn z_position(&self, id: PlaneId) -> Result<usize> {
        self.zorder
            .iter()
            .position(|&z| z == id)
            .ok_or(Error::UnknownPlane(id))
    }

    /// Plane directly above in the z-order.
    pub fn above(&self, id: PlaneId) -> Result<Option<PlaneId>> {
        let pos = self.z_position(id)?;
        Ok(self.zorder.get(pos + 1).copied())
    }

    /// Plane directly below in the z-order.
    pub fn below(&self, id: PlaneId) -> Result<Option<PlaneId>> {
        let pos = self.z_position(id)?;
        Ok(pos.checked_sub(1).map(|p| self.zorder[p]))
    }

    pub fn parent(&self, id: PlaneId) -> Result<Option<PlaneId>> {
        Ok(self.plane(id)?.parent)
    }

    pub fn children(&self, id: PlaneId) -> Result<&[PlaneId]> {
        Ok(self.plane(id)?.children())
    }

    /// Screen position of a plane's origin.
    pub fn abs_yx(&self, id: PlaneId) -> Result<(i32, i32)> {
        let mut plane = self.plane(id)?;
        let (mut y, mut x) = plane.origin;
        while let Some(parent) = plane.parent {
            plane = self.plane(parent)?;
            y = y.saturating_add(plane.origin.0);
            x = x.saturating_add(plane.origin.1);
        }
        Ok((y, x))
    }

    /// Screen rectangle covered by a plane, before clipping.
    pub fn abs_rect(&self, id: PlaneId) -> Result<Rect> {
        let (y, x) = self.abs_yx(id)?;
        let dims = self.plane(id)?.dims();
        Ok(Rect::new(y, x, dims.rows, dims.cols))
    }

    /// Part of a plane that can reach the screen: its rectangle clipped by
    /// every ancestor and by the screen itself.
    pub fn visible_rect(&self, id: PlaneId) -> Result<Option<Rect>> {
        let rect = self.abs_rect(id)?;
        let clip = match self.plane(id)?.parent {
            Some(parent) => match self.visible_rect(parent)? {
                Some(r) => r,
                None => return Ok(None),
            },
            None => Rect::from_dims(self.dims()),
        };
        Ok(rect.intersect(clip))
    }

    /// Composite `src` onto `dst` over their overlap on screen.
    ///
    /// `dst` is modified in place with the compositor's blending rules;
    /// `src` is left as it was. A wide glyph of `src` that the overlap cuts
    /// in half lands as a space. Returns the number of cells merged.
    pub fn merge_down(&mut self, src: PlaneId, dst: PlaneId) -> Result<usize> {
        if src == dst {
            return Err(Error::InvalidGeometry(format!(
                "cannot merge plane {src} onto itself"
            )));
        }
        let src_rect = self.abs_rect(src)?;
        let dst_rect = self.abs_rect(dst)?;
        let Some(overlap) = src_rect.intersect(dst_rect) else {
            return Ok(0);
        };

        let top = self.plane(src)?;
        let under = self.plane(dst)?;
        let mut merged: Vec<(u32, u32, Cell)> = Vec::new();
        merged.try_reserve_exact(overlap.rows as usize * overlap.cols as usize)?;
        let right = overlap.x + overlap.cols as i32;
        for ay in overlap.y..(overlap.y + overlap.rows as i32) {
            for ax in overlap.x..right {
                let (sy, sx) = ((ay - src_rect.y) as u32, (ax - src_rect.x) as u32);
                let (dy, dx) = ((ay - dst_rect.y) as u32, (ax - dst_rect.x) as u32);
                let (Some(t), Some(u)) = (top.cell_at(sy, sx), under.cell_at(dy, dx)) else {
                    continue;
                };
                let mut cell = u.clone();
                layer_cell(&mut cell, t);
                // halves of a wide glyph cut off by the overlap become spaces
                let cut_head = t.width() == 2 && ax + 1 == right;
                let cut_tail = t.is_continuation() && ax == overlap.x;
                if cut_head || cut_tail {
                    let (style, channels) = (cell.style, cell.channels);
                    cell.update(" ", style, channels);
                }
                merged.push((dy, dx, cell));
            }
        }

        let count = merged.len();
        let target = self.plane_mut(dst)?;
        for (y, x, cell) in &merged {
            target.put_resolved(*y, *x, cell);
        }
        log::debug!("merged {count} cell(s) of plane {src} onto {dst}");
        Ok(count)
    }
}
