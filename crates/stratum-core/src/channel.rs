//! Packed colour channels.
//!
//! A [`Channel`] is one 32-bit colour descriptor (foreground *or*
//! background). [`Channels`] packs two of them into a `u64`, foreground in
//! the upper half and background in the lower half.
//!
//! Layout of one half:
//!
//! ```text
//!  31  30       29..28     27       26..24   23..0
//! [ 0 | !DEF | ALPHA(2) | INDEXED | unused | RGB / palette index ]
//! ```
//!
//! The all-zero value is "terminal default colour, opaque". Setting an RGB
//! value or a palette index always sets the not-default bit; the two modes
//! exclude one another.

use serde::{Deserialize, Serialize};

const NOT_DEFAULT_MASK: u32 = 0x4000_0000;
const ALPHA_MASK: u32 = 0x3000_0000;
const ALPHA_SHIFT: u32 = 28;
const INDEXED_MASK: u32 = 0x0800_0000;
const RGB_MASK: u32 = 0x00ff_ffff;
const INDEX_MASK: u32 = 0x0000_00ff;
const CHANNEL_MASK: u32 = NOT_DEFAULT_MASK | ALPHA_MASK | INDEXED_MASK | RGB_MASK;

/// Compositing behaviour of one colour role of a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Alpha {
    /// Replaces whatever lies beneath.
    #[default]
    Opaque,
    /// Averaged with the colour beneath.
    Blend,
    /// Ignored for colour; the colour beneath shows through.
    Transparent,
    /// Foreground only: replaced by black or white against the final background.
    HighContrast,
}

impl Alpha {
    const fn bits(self) -> u32 {
        match self {
            Self::Opaque => 0,
            Self::Blend => 1,
            Self::Transparent => 2,
            Self::HighContrast => 3,
        }
    }

    const fn from_bits(bits: u32) -> Self {
        match bits & 0b11 {
            0 => Self::Opaque,
            1 => Self::Blend,
            2 => Self::Transparent,
            _ => Self::HighContrast,
        }
    }
}

/// One 32-bit colour descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Channel(u32);

impl Channel {
    /// Terminal default colour, opaque.
    pub const DEFAULT: Self = Self(0);

    /// Build from raw bits (unused bits are dropped).
    #[must_use]
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits & CHANNEL_MASK)
    }

    /// Raw bits.
    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Opaque RGB channel; `rgb` is masked to 24 bits.
    #[must_use]
    pub const fn from_rgb(rgb: u32) -> Self {
        Self::DEFAULT.with_rgb(rgb)
    }

    /// Opaque RGB channel from components.
    #[must_use]
    pub const fn from_rgb8(r: u8, g: u8, b: u8) -> Self {
        Self::from_rgb(((r as u32) << 16) | ((g as u32) << 8) | b as u32)
    }

    /// Opaque palette-indexed channel.
    #[must_use]
    pub const fn from_palindex(idx: u8) -> Self {
        Self::DEFAULT.with_palindex(idx as u32)
    }

    /// Copy with an RGB value; clears indexed mode and the default flag.
    #[must_use]
    pub const fn with_rgb(self, rgb: u32) -> Self {
        Self((self.0 & ALPHA_MASK) | NOT_DEFAULT_MASK | (rgb & RGB_MASK))
    }

    /// Copy with a palette index (masked to 8 bits); clears RGB mode and the default flag.
    #[must_use]
    pub const fn with_palindex(self, idx: u32) -> Self {
        Self((self.0 & ALPHA_MASK) | NOT_DEFAULT_MASK | INDEXED_MASK | (idx & INDEX_MASK))
    }

    /// Copy with a different alpha class.
    #[must_use]
    pub const fn with_alpha(self, alpha: Alpha) -> Self {
        Self((self.0 & !ALPHA_MASK) | (alpha.bits() << ALPHA_SHIFT))
    }

    /// Set the RGB value.
    pub fn set_rgb(&mut self, rgb: u32) {
        *self = self.with_rgb(rgb);
    }

    /// Set the RGB value from components.
    pub fn set_rgb8(&mut self, r: u8, g: u8, b: u8) {
        self.set_rgb((u32::from(r) << 16) | (u32::from(g) << 8) | u32::from(b));
    }

    /// Set the palette index.
    pub fn set_palindex(&mut self, idx: u32) {
        *self = self.with_palindex(idx);
    }

    /// Set the alpha class.
    pub fn set_alpha(&mut self, alpha: Alpha) {
        *self = self.with_alpha(alpha);
    }

    /// Return to the terminal default colour. Alpha is kept.
    pub fn set_default(&mut self) {
        self.0 &= ALPHA_MASK;
    }

    /// 24-bit RGB value. Meaningful only when [`Self::is_rgb`].
    #[must_use]
    pub const fn rgb(self) -> u32 {
        self.0 & RGB_MASK
    }

    /// RGB components.
    #[must_use]
    pub const fn rgb8(self) -> (u8, u8, u8) {
        let rgb = self.rgb();
        ((rgb >> 16) as u8, (rgb >> 8) as u8, rgb as u8)
    }

    /// Palette index. Meaningful only when [`Self::is_indexed`].
    #[must_use]
    pub const fn palindex(self) -> u8 {
        (self.0 & INDEX_MASK) as u8
    }

    /// Alpha class.
    #[must_use]
    pub const fn alpha(self) -> Alpha {
        Alpha::from_bits(self.0 >> ALPHA_SHIFT)
    }

    /// Uses the terminal default colour.
    #[must_use]
    pub const fn is_default(self) -> bool {
        self.0 & NOT_DEFAULT_MASK == 0
    }

    /// Holds a direct RGB value.
    #[must_use]
    pub const fn is_rgb(self) -> bool {
        !self.is_default() && self.0 & INDEXED_MASK == 0
    }

    /// Holds a palette index.
    #[must_use]
    pub const fn is_indexed(self) -> bool {
        !self.is_default() && self.0 & INDEXED_MASK != 0
    }
}

/// Foreground and background channels packed into 64 bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Channels(u64);

impl Channels {
    /// Default foreground and background, both opaque.
    pub const DEFAULT: Self = Self(0);

    /// Pack two halves.
    #[must_use]
    pub const fn combine(fg: Channel, bg: Channel) -> Self {
        Self(((fg.0 as u64) << 32) | bg.0 as u64)
    }

    /// Build from raw bits.
    #[must_use]
    pub const fn from_bits(bits: u64) -> Self {
        Self::combine(
            Channel::from_bits((bits >> 32) as u32),
            Channel::from_bits(bits as u32),
        )
    }

    /// Raw bits.
    #[must_use]
    pub const fn bits(self) -> u64 {
        self.0
    }

    /// Opaque RGB foreground and background.
    #[must_use]
    pub const fn from_rgb(fg: u32, bg: u32) -> Self {
        Self::combine(Channel::from_rgb(fg), Channel::from_rgb(bg))
    }

    /// Foreground half.
    #[must_use]
    pub const fn fg(self) -> Channel {
        Channel((self.0 >> 32) as u32)
    }

    /// Background half.
    #[must_use]
    pub const fn bg(self) -> Channel {
        Channel(self.0 as u32)
    }

    /// Replace the foreground half.
    pub fn set_fg(&mut self, fg: Channel) {
        *self = Self::combine(fg, self.bg());
    }

    /// Replace the background half.
    pub fn set_bg(&mut self, bg: Channel) {
        *self = Self::combine(self.fg(), bg);
    }

    /// Copy with a new foreground.
    #[must_use]
    pub const fn with_fg(self, fg: Channel) -> Self {
        Self::combine(fg, self.bg())
    }

    /// Copy with a new background.
    #[must_use]
    pub const fn with_bg(self, bg: Channel) -> Self {
        Self::combine(self.fg(), bg)
    }

    /// Swap foreground and background, alpha classes included.
    #[must_use]
    pub const fn reverse(self) -> Self {
        Self::combine(self.bg(), self.fg())
    }

    #[must_use]
    pub const fn fg_rgb(self) -> u32 {
        self.fg().rgb()
    }

    #[must_use]
    pub const fn bg_rgb(self) -> u32 {
        self.bg().rgb()
    }

    pub fn set_fg_rgb(&mut self, rgb: u32) {
        self.set_fg(self.fg().with_rgb(rgb));
    }

    pub fn set_bg_rgb(&mut self, rgb: u32) {
        self.set_bg(self.bg().with_rgb(rgb));
    }

    #[must_use]
    pub const fn fg_palindex(self) -> u8 {
        self.fg().palindex()
    }

    #[must_use]
    pub const fn bg_palindex(self) -> u8 {
        self.bg().palindex()
    }

    pub fn set_fg_palindex(&mut self, idx: u32) {
        self.set_fg(self.fg().with_palindex(idx));
    }

    pub fn set_bg_palindex(&mut self, idx: u32) {
        self.set_bg(self.bg().with_palindex(idx));
    }

    #[must_use]
    pub const fn fg_alpha(self) -> Alpha {
        self.fg().alpha()
    }

    #[must_use]
    pub const fn bg_alpha(self) -> Alpha {
        self.bg().alpha()
    }

    pub fn set_fg_alpha(&mut self, alpha: Alpha) {
        self.set_fg(self.fg().with_alpha(alpha));
    }

    /// High-contrast is a foreground-only class; on the background it is stored as transparent.
    pub fn set_bg_alpha(&mut self, alpha: Alpha) {
        let alpha = if alpha == Alpha::HighContrast {
            Alpha::Transparent
        } else {
            alpha
        };
        self.set_bg(self.bg().with_alpha(alpha));
    }

    #[must_use]
    pub const fn is_fg_default(self) -> bool {
        self.fg().is_default()
    }

    #[must_use]
    pub const fn is_bg_default(self) -> bool {
        self.bg().is_default()
    }

    #[must_use]
    pub const fn is_fg_rgb(self) -> bool {
        self.fg().is_rgb()
    }

    #[must_use]
    pub const fn is_bg_rgb(self) -> bool {
        self.bg().is_rgb()
    }

    #[must_use]
    pub const fn is_fg_indexed(self) -> bool {
        self.fg().is_indexed()
    }

    #[must_use]
    pub const fn is_bg_indexed(self) -> bool {
        self.bg().is_indexed()
    }
}

impl From<u64> for Channels {
    fn from(bits: u64) -> Self {
        Self::from_bits(bits)
    }
}

impl From<Channels> for u64 {
    fn from(c: Channels) -> Self {
        c.bits()
    }
}
