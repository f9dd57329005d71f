//! One terminal grid position.
//!
//! Uses `CompactString` to inline small grapheme clusters (≤24 bytes), so
//! plane grids and frame buffers do not allocate per cell.

use crate::channel::Channels;
use crate::style::Style;
use compact_str::CompactString;
use unicode_width::UnicodeWidthStr;

/// A grapheme cluster with its style and colours.
///
/// An empty glyph means "inherit from the plane's base cell". A width of 0
/// marks the right half of a wide glyph.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cell {
    glyph: CompactString,
    /// Style flags.
    pub style: Style,
    /// Foreground and background colours.
    pub channels: Channels,
    width: u8,
}

impl Default for Cell {
    fn default() -> Self {
        Self::empty()
    }
}

impl Cell {
    /// Create a cell holding `glyph`.
    #[must_use]
    pub fn new(glyph: &str, style: Style, channels: Channels) -> Self {
        Self {
            glyph: CompactString::new(glyph),
            style,
            channels,
            width: glyph_width(glyph),
        }
    }

    /// Empty cell: inherits everything from the base cell.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            glyph: CompactString::const_new(""),
            style: Style::NONE,
            channels: Channels::DEFAULT,
            width: 1,
        }
    }

    /// Blank cell showing a space.
    #[must_use]
    pub const fn blank() -> Self {
        Self {
            glyph: CompactString::const_new(" "),
            style: Style::NONE,
            channels: Channels::DEFAULT,
            width: 1,
        }
    }

    /// The grapheme cluster, possibly empty.
    #[must_use]
    pub fn glyph(&self) -> &str {
        &self.glyph
    }

    /// Whether the glyph is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.glyph.is_empty() && self.width != 0
    }

    /// Replace the content (zero-allocation for small strings).
    pub fn update(&mut self, glyph: &str, style: Style, channels: Channels) {
        self.glyph.clear();
        self.glyph.push_str(glyph);
        self.style = style;
        self.channels = channels;
        self.width = glyph_width(glyph);
    }

    /// Copy another cell's content into this one without reallocating.
    pub fn assign(&mut self, other: &Self) {
        self.glyph.clear();
        self.glyph.push_str(&other.glyph);
        self.style = other.style;
        self.channels = other.channels;
        self.width = other.width;
    }

    /// Mark this cell as the right half of a wide glyph.
    pub fn make_continuation(&mut self, style: Style, channels: Channels) {
        self.glyph.clear();
        self.style = style;
        self.channels = channels;
        self.width = 0;
    }

    /// Check if this is a continuation cell.
    #[must_use]
    pub const fn is_continuation(&self) -> bool {
        self.width == 0
    }

    /// Display width: 1, 2, or 0 for a continuation.
    #[must_use]
    pub const fn width(&self) -> u8 {
        self.width
    }

    /// Reset to empty.
    pub fn reset(&mut self) {
        self.glyph.clear();
        self.style = Style::NONE;
        self.channels = Channels::DEFAULT;
        self.width = 1;
    }
}

/// Display width of a grapheme cluster, clamped to 1..=2.
pub(crate) fn glyph_width(glyph: &str) -> u8 {
    UnicodeWidthStr::width(glyph).clamp(1, 2) as u8
}
