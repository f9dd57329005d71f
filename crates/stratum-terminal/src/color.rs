//! Colour depth of the terminal and how cell channels are squeezed into it.

use crate::caps::TermEnv;
use crossterm::style::Color as CrosstermColor;
use serde::{Deserialize, Serialize};
use stratum_core::blend::{distance_sq, index_to_rgb};
use stratum_core::Channel;

/// How many colours the terminal can show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ColorMode {
    /// Any 24-bit RGB value.
    #[default]
    TrueColor,
    /// The xterm 256-entry palette.
    Color256,
    /// Palette entries 0-15 only.
    Color16,
    /// No colour; everything uses the terminal's defaults.
    Mono,
}

impl ColorMode {
    /// Colour depth of the controlling terminal.
    #[must_use]
    pub fn detect() -> Self {
        Self::from_env(&TermEnv::from_env())
    }

    /// Colour depth implied by `COLORTERM` and `TERM`.
    #[must_use]
    pub fn from_env(env: &TermEnv) -> Self {
        let colorterm = env.colorterm.as_deref().map(str::to_ascii_lowercase);
        if matches!(colorterm.as_deref(), Some("truecolor" | "24bit")) {
            return Self::TrueColor;
        }
        let Some(term) = env.term.as_deref() else {
            return Self::Mono;
        };
        if term == "dumb" {
            Self::Mono
        } else if term.ends_with("-direct") || term.contains("kitty") || term.contains("ghostty")
        {
            Self::TrueColor
        } else if term.contains("256color") {
            Self::Color256
        } else {
            Self::Color16
        }
    }

    #[must_use]
    pub const fn is_truecolor(self) -> bool {
        matches!(self, Self::TrueColor)
    }

    /// Colour to emit for `channel` in this mode.
    ///
    /// Default channels become `Reset` so the terminal's own colours show.
    /// Palette entries go out as-is unless the mode cannot address them;
    /// anything else is replaced by the nearest colour the mode can show.
    #[must_use]
    pub fn to_crossterm(self, channel: Channel) -> CrosstermColor {
        if channel.is_default() || self == Self::Mono {
            return CrosstermColor::Reset;
        }
        let rgb = if channel.is_indexed() {
            let idx = channel.palindex();
            if self != Self::Color16 || idx < 16 {
                return CrosstermColor::AnsiValue(idx);
            }
            index_to_rgb(idx)
        } else {
            channel.rgb()
        };
        match self {
            Self::TrueColor => {
                let [_, r, g, b] = rgb.to_be_bytes();
                CrosstermColor::Rgb { r, g, b }
            }
            Self::Color256 => CrosstermColor::AnsiValue(nearest_256(rgb)),
            Self::Color16 | Self::Mono => CrosstermColor::AnsiValue(nearest_16(rgb)),
        }
    }
}

/// Closest of the sixteen basic palette entries.
fn nearest_16(rgb: u32) -> u8 {
    (0..16u8)
        .min_by_key(|&i| distance_sq(rgb, index_to_rgb(i)))
        .unwrap_or(0)
}

/// Closest entry of the colour cube or the grey ramp.
fn nearest_256(rgb: u32) -> u8 {
    // cube levels are 0, 95, 135, 175, 215, 255
    let level = |shift: u32| match (rgb >> shift) & 0xff {
        v if v < 48 => 0,
        v if v < 115 => 1,
        v => (v - 35) / 40,
    };
    let cube = (16 + 36 * level(16) + 6 * level(8) + level(0)) as u8;

    // ramp entries are 8, 18, .., 238
    let mean = (((rgb >> 16) & 0xff) + ((rgb >> 8) & 0xff) + (rgb & 0xff)) / 3;
    let grey = 232 + (mean.saturating_sub(3) / 10).min(23) as u8;

    // ties go to the cube
    if distance_sq(rgb, index_to_rgb(grey)) < distance_sq(rgb, index_to_rgb(cube)) {
        grey
    } else {
        cube
    }
}
