//! Alpha compositing of channels and palette expansion.

use crate::cell::Cell;
use crate::channel::{Alpha, Channel, Channels};

/// Weight of the upper colour in a blended mean.
pub const BLEND_WEIGHT_TOP: u32 = 1;
/// Weight of the accumulated colour beneath in a blended mean.
pub const BLEND_WEIGHT_BENEATH: u32 = 1;

/// xterm palette entries 0-15.
const ANSI16: [u32; 16] = [
    0x000000, 0x800000, 0x008000, 0x808000, 0x000080, 0x800080, 0x008080, 0xc0c0c0, 0x808080,
    0xff0000, 0x00ff00, 0xffff00, 0x0000ff, 0xff00ff, 0x00ffff, 0xffffff,
];

/// Levels of the 6×6×6 colour cube (entries 16-231).
const CUBE_LEVELS: [u32; 6] = [0, 95, 135, 175, 215, 255];

/// RGB value of an xterm 256-colour palette entry.
#[must_use]
pub fn index_to_rgb(idx: u8) -> u32 {
    match idx {
        0..=15 => ANSI16[idx as usize],
        16..=231 => {
            let i = u32::from(idx - 16);
            let r = CUBE_LEVELS[(i / 36) as usize];
            let g = CUBE_LEVELS[((i / 6) % 6) as usize];
            let b = CUBE_LEVELS[(i % 6) as usize];
            (r << 16) | (g << 8) | b
        }
        232..=255 => {
            let v = 8 + 10 * u32::from(idx - 232);
            (v << 16) | (v << 8) | v
        }
    }
}

/// RGB value a channel displays as, or `None` for the terminal default.
#[must_use]
pub fn resolve_rgb(channel: Channel) -> Option<u32> {
    if channel.is_default() {
        None
    } else if channel.is_indexed() {
        Some(index_to_rgb(channel.palindex()))
    } else {
        Some(channel.rgb())
    }
}

/// Per-component weighted mean of two RGB values.
#[must_use]
pub fn mean_rgb(top: u32, beneath: u32) -> u32 {
    let total = BLEND_WEIGHT_TOP + BLEND_WEIGHT_BENEATH;
    let component = |shift: u32| {
        let t = (top >> shift) & 0xff;
        let b = (beneath >> shift) & 0xff;
        ((t * BLEND_WEIGHT_TOP + b * BLEND_WEIGHT_BENEATH) / total) << shift
    };
    component(16) | component(8) | component(0)
}

/// Composite one colour role of an upper cell over the accumulated colour.
///
/// `acc` is what lies beneath; the result becomes the new accumulation.
#[must_use]
pub fn composite(acc: Channel, top: Channel) -> Channel {
    match top.alpha() {
        Alpha::Opaque | Alpha::HighContrast => top,
        Alpha::Transparent => acc,
        Alpha::Blend => match (resolve_rgb(top), resolve_rgb(acc)) {
            (None, _) => acc,
            (Some(_), None) => top.with_alpha(Alpha::Opaque),
            (Some(t), Some(b)) => Channel::from_rgb(mean_rgb(t, b)),
        },
    }
}

/// Stack `top` over the accumulated cell `acc`.
///
/// Each colour role composites on its own. A non-empty glyph (or a wide
/// glyph's continuation) replaces glyph and style; an empty one lets
/// whatever is beneath show through.
pub fn layer_cell(acc: &mut Cell, top: &Cell) {
    let fg = composite(acc.channels.fg(), top.channels.fg());
    let bg = composite(acc.channels.bg(), top.channels.bg());
    if !top.is_empty() {
        acc.assign(top);
    }
    acc.channels = Channels::combine(fg, bg);
}

/// Relative luminance on a 0-255 scale.
#[must_use]
pub fn luminance(rgb: u32) -> u32 {
    let r = (rgb >> 16) & 0xff;
    let g = (rgb >> 8) & 0xff;
    let b = rgb & 0xff;
    (r * 299 + g * 587 + b * 114) / 1000
}

/// Resolve a high-contrast foreground against the final background.
///
/// Other foregrounds are returned unchanged.
#[must_use]
pub fn resolve_high_contrast(fg: Channel, bg: Channel) -> Channel {
    if fg.alpha() != Alpha::HighContrast {
        return fg;
    }
    let bright_bg = resolve_rgb(bg).is_some_and(|rgb| luminance(rgb) > 127);
    if bright_bg {
        Channel::from_rgb(0x000000)
    } else {
        Channel::from_rgb(0xffffff)
    }
}

/// Squared RGB distance.
#[must_use]
pub fn distance_sq(a: u32, b: u32) -> u32 {
    let d = |shift: u32| {
        let x = ((a >> shift) & 0xff) as i32 - ((b >> shift) & 0xff) as i32;
        (x * x) as u32
    };
    d(16) + d(8) + d(0)
}
