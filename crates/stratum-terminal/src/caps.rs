//! Capability detection from the environment.

use crate::color::ColorMode;
use stratum_core::Capabilities;

/// Environment facts capabilities are derived from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TermEnv {
    pub term: Option<String>,
    pub colorterm: Option<String>,
    pub term_program: Option<String>,
    pub kitty_window_id: Option<String>,
    /// First of `LC_ALL`, `LC_CTYPE`, `LANG` that is set.
    pub locale: Option<String>,
}

impl TermEnv {
    /// Read the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());
        Self {
            term: var("TERM"),
            colorterm: var("COLORTERM"),
            term_program: var("TERM_PROGRAM"),
            kitty_window_id: var("KITTY_WINDOW_ID"),
            locale: var("LC_ALL").or_else(|| var("LC_CTYPE")).or_else(|| var("LANG")),
        }
    }

    fn term_is(&self, needle: &str) -> bool {
        self.term.as_deref().is_some_and(|t| t.contains(needle))
    }

    fn program_is(&self, name: &str) -> bool {
        self.term_program
            .as_deref()
            .is_some_and(|p| p.eq_ignore_ascii_case(name))
    }

    fn utf8(&self) -> bool {
        match self.locale.as_deref() {
            Some(l) => {
                let l = l.to_ascii_lowercase();
                l.contains("utf-8") || l.contains("utf8")
            }
            None => !matches!(self.term.as_deref(), Some("dumb" | "linux") | None),
        }
    }

    fn kitty_graphics(&self) -> bool {
        self.kitty_window_id.is_some()
            || self.term_is("kitty")
            || self.term_is("ghostty")
            || self.program_is("WezTerm")
            || self.program_is("ghostty")
    }
}

/// Derive capabilities from environment facts and the cell size in pixels.
#[must_use]
pub fn detect_with_env(env: &TermEnv, cell_px: Option<(u32, u32)>) -> Capabilities {
    let utf8 = env.utf8();
    let mode = ColorMode::from_env(env);
    let cell_px = cell_px.filter(|&(h, w)| h > 0 && w > 0);
    let pixel = utf8 && env.kitty_graphics();
    let sextants = utf8 && !env.term_is("linux") && !env.program_is("Apple_Terminal");

    if pixel && cell_px.is_none() {
        log::warn!("terminal speaks kitty graphics but reports no cell size; bitmaps use cell blitters");
    }
    if !utf8 {
        log::warn!("non-UTF-8 locale; bitmaps degrade to the ASCII blitter");
    }

    Capabilities {
        pixel,
        rgb: mode.is_truecolor() || env.kitty_graphics(),
        utf8,
        sextants,
        cell_px,
    }
}

/// Detect capabilities of the controlling terminal.
#[must_use]
pub fn detect() -> Capabilities {
    let caps = detect_with_env(&TermEnv::from_env(), cell_pixels());
    log::debug!("terminal capabilities: {caps:?}");
    caps
}

/// Cell size in pixels as `(height, width)`, if the terminal reports it.
#[must_use]
pub fn cell_pixels() -> Option<(u32, u32)> {
    let ws = crossterm::terminal::window_size().ok()?;
    cell_size((ws.rows, ws.columns), (ws.height, ws.width))
}

/// Split a window of `px` pixels into `cells`, both as `(rows, cols)`.
///
/// `None` unless every cell is at least one pixel in each direction.
fn cell_size(cells: (u16, u16), px: (u16, u16)) -> Option<(u32, u32)> {
    let h = u32::from(px.0).checked_div(u32::from(cells.0))?;
    let w = u32::from(px.1).checked_div(u32::from(cells.1))?;
    (h > 0 && w > 0).then_some((h, w))
}
