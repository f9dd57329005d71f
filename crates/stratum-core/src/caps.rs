//! Terminal capability facts.

use serde::{Deserialize, Serialize};

/// What the terminal can display, determined once by the terminal driver.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    /// Pixel graphics (kitty graphics protocol).
    pub pixel: bool,
    /// 24-bit colour.
    pub rgb: bool,
    /// UTF-8 output, needed for block-element glyphs.
    pub utf8: bool,
    /// Unicode 13 sextant glyphs render correctly.
    pub sextants: bool,
    /// Size of one cell in pixels as `(height, width)`, when known.
    pub cell_px: Option<(u32, u32)>,
}

impl Capabilities {
    /// Plain ASCII terminal with the 16 basic colours.
    pub const ASCII: Self = Self {
        pixel: false,
        rgb: false,
        utf8: false,
        sextants: false,
        cell_px: None,
    };

    /// Modern UTF-8 truecolor terminal without pixel graphics.
    pub const UNICODE: Self = Self {
        pixel: false,
        rgb: true,
        utf8: true,
        sextants: true,
        cell_px: None,
    };
}
