//! Rendering RGBA bitmaps onto planes.
//!
//! Cell blitters approximate each cell's pixels with a block-element glyph
//! and two colours; the pixel blitter hands the bitmap to the terminal.

mod cells;
pub mod pixel;

pub use pixel::Sprixel;

use crate::caps::Capabilities;
use crate::cell::Cell;
use crate::channel::{Alpha, Channel, Channels};
use crate::error::{Error, Result};
use crate::plane::Plane;
use crate::style::Style;
use cells::{quantize, sextant, HALVES, QUADRANTS};
use serde::{Deserialize, Serialize};

/// Samples with alpha below this are transparent.
const ALPHA_THRESHOLD: u8 = 128;

/// A decoded bitmap, stored as RGBA.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Visual {
    width: u32,
    height: u32,
    pixels: Vec<[u8; 4]>,
}

impl Visual {
    /// Build from packed pixel data, 4 bytes per pixel (RGBA) or 3 (RGB).
    pub fn from_rgba(data: &[u8], width: u32, height: u32, bytes_per_pixel: usize) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::UnsupportedGeometry(format!(
                "{width}x{height} bitmap"
            )));
        }
        if bytes_per_pixel != 3 && bytes_per_pixel != 4 {
            return Err(Error::UnsupportedPixelFormat(bytes_per_pixel));
        }
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|n| n.checked_mul(bytes_per_pixel))
            .ok_or_else(|| Error::UnsupportedGeometry(format!("{width}x{height} bitmap")))?;
        if data.len() != expected {
            return Err(Error::SourceBufferMismatch {
                expected,
                actual: data.len(),
            });
        }

        let mut pixels = Vec::new();
        pixels.try_reserve_exact(width as usize * height as usize)?;
        pixels.extend(data.chunks_exact(bytes_per_pixel).map(|p| match *p {
            [r, g, b, a] => [r, g, b, a],
            [r, g, b] => [r, g, b, 0xff],
            _ => [0, 0, 0, 0],
        }));
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// RGBA of the pixel at `(y, x)`.
    #[must_use]
    pub fn pixel(&self, y: u32, x: u32) -> Option<[u8; 4]> {
        if y < self.height && x < self.width {
            Some(self.pixels[y as usize * self.width as usize + x as usize])
        } else {
            None
        }
    }

    /// Packed RGB of an opaque pixel, `None` if transparent or outside.
    fn opaque_rgb(&self, y: u32, x: u32) -> Option<u32> {
        let [r, g, b, a] = self.pixel(y, x)?;
        (a >= ALPHA_THRESHOLD).then(|| (u32::from(r) << 16) | (u32::from(g) << 8) | u32::from(b))
    }
}

/// How the bitmap is fitted to the destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Scale {
    /// One sample per pixel; the bitmap is clipped.
    #[default]
    None,
    /// Fill the destination, ignoring aspect ratio.
    Stretch,
    /// Largest uniform fit, anchored top-left.
    Scale,
    /// Uniform fit in physical pixels, using the cell's pixel size.
    ScaleHiRes,
}

/// Glyph set used to approximate pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Blitter {
    /// Best the terminal supports.
    #[default]
    Default,
    /// One space per pixel, coloured by its background.
    Ascii,
    /// Upper/lower half blocks, 1×2 pixels per cell.
    Half,
    /// Quadrant blocks, 2×2 pixels per cell.
    Quadrant,
    /// Sextant blocks, 2×3 pixels per cell.
    Sextant,
    /// Terminal pixel graphics.
    Pixel,
}

impl Blitter {
    /// Degradation order, best first.
    const CHAIN: [Self; 5] = [
        Self::Pixel,
        Self::Sextant,
        Self::Quadrant,
        Self::Half,
        Self::Ascii,
    ];

    fn supported(self, caps: &Capabilities) -> bool {
        match self {
            Self::Default => false,
            Self::Ascii => true,
            Self::Half | Self::Quadrant => caps.utf8,
            Self::Sextant => caps.utf8 && caps.sextants,
            Self::Pixel => caps.pixel && usable_cell_px(caps).is_some(),
        }
    }

    /// The blitter actually used on a terminal with `caps`: the requested
    /// one if supported, otherwise the next one down the chain.
    #[must_use]
    pub fn resolve(self, caps: &Capabilities) -> Self {
        let start = Self::CHAIN.iter().position(|&b| b == self).unwrap_or(0);
        Self::CHAIN[start..]
            .iter()
            .copied()
            .find(|b| b.supported(caps))
            .unwrap_or(Self::Ascii)
    }

    /// Pixels per cell as `(rows, cols)` for the cell blitters.
    #[must_use]
    pub const fn cell_samples(self) -> (u32, u32) {
        match self {
            Self::Half => (2, 1),
            Self::Quadrant => (2, 2),
            Self::Sextant => (3, 2),
            Self::Default | Self::Ascii | Self::Pixel => (1, 1),
        }
    }
}

/// Cell size in pixels, when known and non-degenerate.
fn usable_cell_px(caps: &Capabilities) -> Option<(u32, u32)> {
    caps.cell_px.filter(|&(h, w)| h > 0 && w > 0)
}

/// Where and how to blit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlitOptions {
    /// Destination origin in the plane.
    pub y: u32,
    pub x: u32,
    /// Destination size in cells; `None` extends to the plane's edge.
    pub rows: Option<u32>,
    pub cols: Option<u32>,
    pub scaling: Scale,
    pub blitter: Blitter,
}

/// Outcome of a blit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlitReport {
    /// Blitter used after degradation.
    pub blitter: Blitter,
    /// Cells written (cell blitters) or covered (pixel blitter).
    pub cells: usize,
}

/// Portion of the sample space the bitmap occupies, as `(rows, cols)`.
///
/// `space` is the destination in samples and `sample_px` the physical
/// `(height, width)` of one sample, when known.
fn fitted_area(
    visual: &Visual,
    scaling: Scale,
    space: (u32, u32),
    sample_px: Option<(u32, u32)>,
) -> (u32, u32) {
    let (vh, vw) = (u64::from(visual.height), u64::from(visual.width));
    let (sh, sw) = (u64::from(space.0), u64::from(space.1));
    let uniform = |ph: u64, pw: u64| {
        // fit (vh, vw) into (sh * ph, sw * pw) physical units
        let (th, tw) = (sh * ph, sw * pw);
        let (fh, fw) = if th * vw <= tw * vh {
            (th, (vw * th / vh).max(1))
        } else {
            ((vh * tw / vw).max(1), tw)
        };
        (
            (fh / ph).clamp(1, sh) as u32,
            (fw / pw).clamp(1, sw) as u32,
        )
    };
    match scaling {
        Scale::None => (visual.height.min(space.0), visual.width.min(space.1)),
        Scale::Stretch => space,
        Scale::Scale => uniform(1, 1),
        Scale::ScaleHiRes => match sample_px {
            Some((ph, pw)) if ph > 0 && pw > 0 => uniform(u64::from(ph), u64::from(pw)),
            _ => uniform(1, 1),
        },
    }
}

/// Nearest-neighbour sampler over the fitted area.
struct Sampler<'a> {
    visual: &'a Visual,
    scaling: Scale,
    area: (u32, u32),
}

impl Sampler<'_> {
    /// Opaque RGB at sample `(sy, sx)`; `None` when transparent or outside.
    fn sample(&self, sy: u32, sx: u32) -> Option<u32> {
        if sy >= self.area.0 || sx >= self.area.1 {
            return None;
        }
        if self.scaling == Scale::None {
            return self.visual.opaque_rgb(sy, sx);
        }
        let py = u64::from(sy) * u64::from(self.visual.height) / u64::from(self.area.0);
        let px = u64::from(sx) * u64::from(self.visual.width) / u64::from(self.area.1);
        self.visual.opaque_rgb(py as u32, px as u32)
    }

    /// Full RGBA at sample `(sy, sx)`, transparent black outside.
    fn sample_rgba(&self, sy: u32, sx: u32) -> [u8; 4] {
        if sy >= self.area.0 || sx >= self.area.1 {
            return [0; 4];
        }
        let (py, px) = if self.scaling == Scale::None {
            (sy, sx)
        } else {
            (
                (u64::from(sy) * u64::from(self.visual.height) / u64::from(self.area.0)) as u32,
                (u64::from(sx) * u64::from(self.visual.width) / u64::from(self.area.1)) as u32,
            )
        };
        self.visual.pixel(py, px).unwrap_or([0; 4])
    }
}

/// Destination rectangle in cells, clipped to the plane.
fn destination(plane: &Plane, opts: &BlitOptions) -> Result<(u32, u32)> {
    let avail_rows = plane.rows().saturating_sub(opts.y);
    let avail_cols = plane.cols().saturating_sub(opts.x);
    let rows = opts.rows.map_or(avail_rows, |r| r.min(avail_rows));
    let cols = opts.cols.map_or(avail_cols, |c| c.min(avail_cols));
    if rows == 0 || cols == 0 {
        return Err(Error::UnsupportedGeometry(format!(
            "empty destination at ({}, {}) in a {}x{} plane",
            opts.y,
            opts.x,
            plane.rows(),
            plane.cols()
        )));
    }
    Ok((rows, cols))
}

/// Render `visual` into `plane`.
///
/// The plane is only modified once every output cell is known.
pub fn blit(
    visual: &Visual,
    plane: &mut Plane,
    opts: &BlitOptions,
    caps: &Capabilities,
) -> Result<BlitReport> {
    let (rows, cols) = destination(plane, opts)?;
    let blitter = opts.blitter.resolve(caps);
    if blitter != opts.blitter && opts.blitter != Blitter::Default {
        log::warn!("{:?} blitter unsupported, using {blitter:?}", opts.blitter);
    }

    if blitter == Blitter::Pixel {
        if let Some(cell_px) = usable_cell_px(caps) {
            return blit_pixels(visual, plane, opts, (rows, cols), cell_px);
        }
    }

    let (ch, cw) = blitter.cell_samples();
    let space = (rows * ch, cols * cw);
    let sample_px = caps.cell_px.map(|(h, w)| (h / ch, w / cw));
    let sampler = Sampler {
        visual,
        scaling: opts.scaling,
        area: fitted_area(visual, opts.scaling, space, sample_px),
    };

    let mut out: Vec<(u32, u32, Cell)> = Vec::new();
    out.try_reserve_exact(rows as usize * cols as usize)?;
    let mut samples = [None; 6];
    for r in 0..rows {
        for c in 0..cols {
            let n = (ch * cw) as usize;
            for i in 0..ch {
                for j in 0..cw {
                    samples[(i * cw + j) as usize] = sampler.sample(r * ch + i, c * cw + j);
                }
            }
            if let Some(cell) = cell_for(blitter, &samples[..n]) {
                out.push((opts.y + r, opts.x + c, cell));
            }
        }
    }

    for (y, x, cell) in &out {
        plane.put_resolved(*y, *x, cell);
    }
    log::debug!(
        "blitted {}x{} bitmap into {} cell(s) of plane {} with {blitter:?}",
        visual.width,
        visual.height,
        out.len(),
        plane.id()
    );
    Ok(BlitReport {
        blitter,
        cells: out.len(),
    })
}

/// Glyph and colours for one cell, `None` when entirely transparent.
fn cell_for(blitter: Blitter, samples: &[Option<u32>]) -> Option<Cell> {
    if let (Blitter::Half, [Some(top), Some(bottom)]) = (blitter, samples) {
        return Some(Cell::new("▀", Style::NONE, Channels::from_rgb(*top, *bottom)));
    }
    let q = quantize(samples)?;
    let glyph = match blitter {
        Blitter::Half => HALVES[usize::from(q.mask & 0x3)],
        Blitter::Quadrant => QUADRANTS[usize::from(q.mask & 0xf)],
        Blitter::Sextant => sextant(q.mask),
        Blitter::Ascii | Blitter::Default | Blitter::Pixel => ' ',
    };
    let bg = match (blitter, q.bg) {
        // a lone ascii sample shows as a coloured space
        (Blitter::Ascii | Blitter::Default | Blitter::Pixel, _) => Channel::from_rgb(q.fg),
        (_, Some(rgb)) => Channel::from_rgb(rgb),
        (_, None) => Channel::DEFAULT.with_alpha(Alpha::Transparent),
    };
    let mut buf = [0u8; 4];
    Some(Cell::new(
        glyph.encode_utf8(&mut buf),
        Style::NONE,
        Channels::combine(Channel::from_rgb(q.fg), bg),
    ))
}

/// Attach `visual` to `plane` as terminal pixel graphics.
fn blit_pixels(
    visual: &Visual,
    plane: &mut Plane,
    opts: &BlitOptions,
    (rows, cols): (u32, u32),
    (cell_h, cell_w): (u32, u32),
) -> Result<BlitReport> {
    let space = (rows * cell_h, cols * cell_w);
    let area = fitted_area(visual, opts.scaling, space, Some((1, 1)));
    let sampler = Sampler {
        visual,
        scaling: opts.scaling,
        area,
    };

    let mut rgba = Vec::new();
    rgba.try_reserve_exact(area.0 as usize * area.1 as usize * 4)?;
    for sy in 0..area.0 {
        for sx in 0..area.1 {
            rgba.extend_from_slice(&sampler.sample_rgba(sy, sx));
        }
    }

    let covered = (area.0.div_ceil(cell_h), area.1.div_ceil(cell_w));
    let generation = plane.sprixel().map_or(1, |s| s.generation.wrapping_add(1));
    let sprixel = Sprixel::new(
        plane.id().index() + 1,
        generation,
        (opts.y, opts.x),
        covered,
        area,
        &rgba,
    );
    plane.sprixel = Some(sprixel);
    log::debug!(
        "attached {}x{} px graphics to plane {}",
        area.1,
        area.0,
        plane.id()
    );
    Ok(BlitReport {
        blitter: Blitter::Pixel,
        cells: covered.0 as usize * covered.1 as usize,
    })
}
