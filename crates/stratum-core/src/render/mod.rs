//! Differential rendering.
//!
//! Minimizes terminal output by:
//! - Only emitting cells that changed since the displayed frame
//! - Coalescing adjacent cells into one text run
//! - Skipping redundant cursor moves
//! - Caching the current style and colours
//!
//! The renderer produces semantic [`RenderOp`]s; an [`OpSink`] turns them
//! into bytes for a particular terminal.

mod compose;
mod frame;

pub use compose::compose;
pub use frame::{FrameBuffer, Placement};

use crate::blit::pixel;
use crate::channel::Channel;
use crate::error::{Error, Result};
use crate::geometry::Dims;
use crate::pile::Pile;
use crate::style::Style;
use std::io;

/// One terminal-independent output instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderOp {
    /// Reset style and colours to the terminal defaults.
    Reset,
    /// Move the cursor to a screen position.
    MoveTo { y: u32, x: u32 },
    /// Switch style flags: `style` is the new set, `removed` what must be turned off.
    SetStyle { style: Style, removed: Style },
    SetForeground(Channel),
    SetBackground(Channel),
    /// Text printed at the cursor with the current style and colours.
    Print(String),
    /// Pixel graphics at a screen position; `payload` is the complete
    /// terminal escape sequence transmitting and placing the image.
    Graphics {
        image_id: u32,
        y: u32,
        x: u32,
        payload: String,
    },
    /// Remove a previously placed image.
    DeleteGraphics { image_id: u32 },
}

/// Destination of render output.
pub trait OpSink {
    /// Write one frame's worth of ops. An error means the frame may be
    /// partially written.
    fn apply(&mut self, ops: &[RenderOp]) -> io::Result<()>;
}

/// Collects ops, mainly for tests and headless use.
impl OpSink for Vec<RenderOp> {
    fn apply(&mut self, ops: &[RenderOp]) -> io::Result<()> {
        self.extend_from_slice(ops);
        Ok(())
    }
}

/// Counters for one render.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub cells_written: usize,
    pub cursor_moves: usize,
    pub style_changes: usize,
    pub color_changes: usize,
    pub text_bytes: usize,
    pub graphics: usize,
    pub ops: usize,
}

/// Attributes the terminal currently draws with.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Pen {
    style: Style,
    fg: Channel,
    bg: Channel,
}

impl Pen {
    const RESET: Self = Self {
        style: Style::NONE,
        fg: Channel::DEFAULT,
        bg: Channel::DEFAULT,
    };
}

/// Terminal state as the op stream leaves it.
#[derive(Clone, Copy, Debug)]
struct Tracked {
    cursor: Option<(u32, u32)>,
    pen: Option<Pen>,
}

/// Composites piles and emits the difference to the displayed frame.
#[derive(Debug)]
pub struct Renderer {
    displayed: FrameBuffer,
    pending: FrameBuffer,
    tracked: Tracked,
    full_redraw: bool,
    ops: Vec<RenderOp>,
    frames: u64,
    last_stats: RenderStats,
}

impl Renderer {
    /// Create a renderer for a screen assumed blank.
    #[must_use]
    pub fn new(screen: Dims) -> Self {
        Self {
            displayed: FrameBuffer::new(screen),
            pending: FrameBuffer::new(screen),
            tracked: Tracked {
                cursor: None,
                pen: None,
            },
            full_redraw: false,
            ops: Vec::with_capacity(256),
            frames: 0,
            last_stats: RenderStats::default(),
        }
    }

    /// The frame the terminal is showing.
    #[must_use]
    pub const fn displayed(&self) -> &FrameBuffer {
        &self.displayed
    }

    /// Forget what the terminal shows; the next render redraws everything.
    pub fn damage(&mut self) {
        self.full_redraw = true;
        self.tracked = Tracked {
            cursor: None,
            pen: None,
        };
    }

    /// Number of successful renders.
    #[must_use]
    pub const fn frames(&self) -> u64 {
        self.frames
    }

    #[must_use]
    pub const fn last_stats(&self) -> RenderStats {
        self.last_stats
    }

    /// Composite `pile`, diff against the displayed frame and write the
    /// changes to `sink`.
    ///
    /// On a sink error nothing is committed: the displayed frame stays, and
    /// the cursor and attributes are treated as unknown.
    pub fn render<S: OpSink + ?Sized>(&mut self, pile: &Pile, sink: &mut S) -> Result<RenderStats> {
        compose(pile, &mut self.pending)?;

        self.ops.clear();
        let (stats, tracked) = plan(
            &self.displayed,
            &self.pending,
            self.full_redraw,
            self.tracked,
            pile,
            &mut self.ops,
        )?;

        if !self.ops.is_empty() {
            if let Err(e) = sink.apply(&self.ops) {
                log::debug!("render aborted after sink error: {e}");
                self.tracked = Tracked {
                    cursor: None,
                    pen: None,
                };
                self.ops.clear();
                return Err(Error::RenderIo(e));
            }
        }

        self.tracked = tracked;
        std::mem::swap(&mut self.displayed, &mut self.pending);
        self.full_redraw = false;
        self.frames += 1;
        self.last_stats = stats;
        log::trace!(
            "frame {}: {} op(s), {} cell(s), {} move(s)",
            self.frames,
            stats.ops,
            stats.cells_written,
            stats.cursor_moves
        );
        Ok(stats)
    }
}

fn flush_run(run: &mut String, ops: &mut Vec<RenderOp>, stats: &mut RenderStats) {
    if !run.is_empty() {
        stats.text_bytes += run.len();
        ops.push(RenderOp::Print(std::mem::take(run)));
    }
}

/// Compute the ops turning `prev` into `next`.
fn plan(
    prev: &FrameBuffer,
    next: &FrameBuffer,
    full: bool,
    mut tracked: Tracked,
    pile: &Pile,
    ops: &mut Vec<RenderOp>,
) -> Result<(RenderStats, Tracked)> {
    let mut stats = RenderStats::default();
    let cols = next.dims().cols;
    let mask = if full {
        bitvec::bitvec![1; next.len()]
    } else {
        prev.diff_mask(next)
    };

    let mut run = String::new();
    for idx in mask.iter_ones() {
        let cell = &next.cells()[idx];
        if cell.is_continuation() {
            continue;
        }
        let (y, x) = next.coords(idx);

        if tracked.cursor != Some((y, x)) {
            flush_run(&mut run, ops, &mut stats);
            ops.push(RenderOp::MoveTo { y, x });
            stats.cursor_moves += 1;
        }

        let pen = match tracked.pen {
            Some(pen) => pen,
            None => {
                flush_run(&mut run, ops, &mut stats);
                ops.push(RenderOp::Reset);
                Pen::RESET
            }
        };
        if pen.style != cell.style {
            flush_run(&mut run, ops, &mut stats);
            ops.push(RenderOp::SetStyle {
                style: cell.style,
                removed: pen.style & !cell.style,
            });
            stats.style_changes += 1;
        }
        let (fg, bg) = (cell.channels.fg(), cell.channels.bg());
        if pen.fg != fg {
            flush_run(&mut run, ops, &mut stats);
            ops.push(RenderOp::SetForeground(fg));
            stats.color_changes += 1;
        }
        if pen.bg != bg {
            flush_run(&mut run, ops, &mut stats);
            ops.push(RenderOp::SetBackground(bg));
            stats.color_changes += 1;
        }
        tracked.pen = Some(Pen {
            style: cell.style,
            fg,
            bg,
        });

        run.push_str(cell.glyph());
        stats.cells_written += 1;
        let after = x + u32::from(cell.width());
        tracked.cursor = (after < cols).then_some((y, after));
    }
    flush_run(&mut run, ops, &mut stats);

    for old in prev.graphics() {
        if full || !next.graphics().contains(old) {
            ops.push(RenderOp::DeleteGraphics {
                image_id: old.image_id,
            });
        }
    }
    for placed in next.graphics() {
        if !full && prev.graphics().contains(placed) {
            continue;
        }
        let Some(sprixel) = pile.plane(placed.plane)?.sprixel() else {
            continue;
        };
        ops.push(RenderOp::Graphics {
            image_id: placed.image_id,
            y: placed.y,
            x: placed.x,
            payload: pixel::placement_sequence(sprixel),
        });
        stats.graphics += 1;
        // the terminal may move the cursor while placing an image
        tracked.cursor = None;
    }

    stats.ops = ops.len();
    Ok((stats, tracked))
}
