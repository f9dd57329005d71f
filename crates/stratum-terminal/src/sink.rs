//! ANSI output sink.
//!
//! Turns the renderer's [`RenderOp`]s into crossterm commands, queued into a
//! buffered writer and flushed once per frame.

use crate::color::ColorMode;
use crossterm::cursor::MoveTo;
use crossterm::queue;
use crossterm::style::{
    Attribute, Print, ResetColor, SetAttribute, SetBackgroundColor, SetForegroundColor,
};
use std::io::{self, BufWriter, Write};
use stratum_core::blit::pixel;
use stratum_core::{MiceEvents, OpSink, RenderOp, Style};

/// Output buffer size; one frame normally fits.
const BUFFER_CAPACITY: usize = 8192;

/// Escape sequences switching mouse reporting to `mice`.
///
/// Every mode first clears the others, then enables SGR extended
/// coordinates together with the requested tracking level.
#[must_use]
pub fn mice_sequence(mice: MiceEvents) -> &'static str {
    match mice {
        MiceEvents::None => "\x1b[?1003l\x1b[?1002l\x1b[?1000l\x1b[?1006l",
        MiceEvents::Buttons => "\x1b[?1003l\x1b[?1002l\x1b[?1000h\x1b[?1006h",
        MiceEvents::Drag => "\x1b[?1003l\x1b[?1000h\x1b[?1002h\x1b[?1006h",
        MiceEvents::All => "\x1b[?1000h\x1b[?1002h\x1b[?1003h\x1b[?1006h",
    }
}

/// Writes render ops as ANSI escape sequences.
pub struct AnsiSink<W: Write> {
    out: BufWriter<W>,
    mode: ColorMode,
    frames: u64,
}

impl<W: Write> AnsiSink<W> {
    pub fn new(writer: W, mode: ColorMode) -> Self {
        Self {
            out: BufWriter::with_capacity(BUFFER_CAPACITY, writer),
            mode,
            frames: 0,
        }
    }

    #[must_use]
    pub const fn mode(&self) -> ColorMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: ColorMode) {
        self.mode = mode;
    }

    /// Frames flushed so far.
    #[must_use]
    pub const fn frames(&self) -> u64 {
        self.frames
    }

    pub fn get_ref(&self) -> &W {
        self.out.get_ref()
    }

    /// Raw access for control sequences outside the op stream.
    pub fn writer(&mut self) -> &mut BufWriter<W> {
        &mut self.out
    }

    /// Flush and return the underlying writer.
    pub fn into_inner(self) -> io::Result<W> {
        self.out.into_inner().map_err(io::IntoInnerError::into_error)
    }

    fn queue_op(&mut self, op: &RenderOp) -> io::Result<()> {
        match op {
            RenderOp::Reset => {
                queue!(self.out, SetAttribute(Attribute::Reset), ResetColor)?;
            }
            RenderOp::MoveTo { y, x } => {
                queue!(self.out, MoveTo(to_u16(*x), to_u16(*y)))?;
            }
            RenderOp::SetStyle { style, removed } => {
                self.queue_style(*style, *removed)?;
            }
            RenderOp::SetForeground(channel) => {
                queue!(self.out, SetForegroundColor(self.mode.to_crossterm(*channel)))?;
            }
            RenderOp::SetBackground(channel) => {
                queue!(self.out, SetBackgroundColor(self.mode.to_crossterm(*channel)))?;
            }
            RenderOp::Print(text) => {
                queue!(self.out, Print(text))?;
            }
            RenderOp::Graphics {
                y, x, payload, ..
            } => {
                queue!(self.out, MoveTo(to_u16(*x), to_u16(*y)))?;
                self.out.write_all(payload.as_bytes())?;
            }
            RenderOp::DeleteGraphics { image_id } => {
                self.out
                    .write_all(pixel::delete_sequence(*image_id).as_bytes())?;
            }
        }
        Ok(())
    }

    /// Turn off what `removed` names, then assert every flag of `style`.
    ///
    /// SGR has a single "normal intensity" for bold and dim, and a single
    /// "no underline" for both underline kinds, so flags sharing an off
    /// switch are re-asserted afterwards.
    fn queue_style(&mut self, style: Style, removed: Style) -> io::Result<()> {
        const OFF: [(Style, Attribute); 7] = [
            (Style::BOLD, Attribute::NormalIntensity),
            (Style::DIM, Attribute::NormalIntensity),
            (Style::ITALIC, Attribute::NoItalic),
            (Style::UNDERLINE, Attribute::NoUnderline),
            (Style::UNDERCURL, Attribute::NoUnderline),
            (Style::BLINK, Attribute::NoBlink),
            (Style::REVERSE, Attribute::NoReverse),
        ];
        const ON: [(Style, Attribute); 8] = [
            (Style::BOLD, Attribute::Bold),
            (Style::DIM, Attribute::Dim),
            (Style::ITALIC, Attribute::Italic),
            (Style::UNDERLINE, Attribute::Underlined),
            (Style::UNDERCURL, Attribute::Undercurled),
            (Style::BLINK, Attribute::SlowBlink),
            (Style::REVERSE, Attribute::Reverse),
            (Style::STRUCK, Attribute::CrossedOut),
        ];

        let mut last_off = None;
        for (flag, attr) in OFF {
            if removed.contains(flag) && last_off != Some(attr) {
                queue!(self.out, SetAttribute(attr))?;
                last_off = Some(attr);
            }
        }
        if removed.contains(Style::STRUCK) {
            queue!(self.out, SetAttribute(Attribute::NotCrossedOut))?;
        }
        for (flag, attr) in ON {
            if style.contains(flag) {
                queue!(self.out, SetAttribute(attr))?;
            }
        }
        Ok(())
    }
}

impl<W: Write> OpSink for AnsiSink<W> {
    fn apply(&mut self, ops: &[RenderOp]) -> io::Result<()> {
        for op in ops {
            self.queue_op(op)?;
        }
        self.out.flush()?;
        self.frames += 1;
        Ok(())
    }
}

impl<W: Write> std::fmt::Debug for AnsiSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnsiSink")
            .field("mode", &self.mode)
            .field("buffered", &self.out.buffer().len())
            .field("frames", &self.frames)
            .finish()
    }
}

fn to_u16(v: u32) -> u16 {
    u16::try_from(v).unwrap_or(u16::MAX)
}
