//! Raw terminal control behind a trait, so the engine runs without a TTY.

use crate::color::ColorMode;
use crate::error::Result;
use crate::sink::{mice_sequence, AnsiSink};
use crossterm::event::{DisableBracketedPaste, EnableBracketedPaste};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{cursor, execute};
use std::io::{self, Stdout, Write};
use stratum_core::{MiceEvents, OpSink, RenderOp};

/// Terminal operations the engine needs beyond writing frames.
///
/// Frames go through the [`OpSink`] supertrait so control sequences and
/// frame output share one ordered stream.
pub trait TerminalBackend: OpSink {
    fn enable_raw_mode(&mut self) -> Result<()>;
    fn disable_raw_mode(&mut self) -> Result<()>;
    fn enter_alternate_screen(&mut self) -> Result<()>;
    fn leave_alternate_screen(&mut self) -> Result<()>;
    fn hide_cursor(&mut self) -> Result<()>;
    fn show_cursor(&mut self) -> Result<()>;
    fn set_bracketed_paste(&mut self, enabled: bool) -> Result<()>;
    fn set_mice(&mut self, mice: MiceEvents) -> Result<()>;
    /// Terminal size as `(cols, rows)`.
    fn size(&self) -> Result<(u16, u16)>;
}

/// Real crossterm backend on standard output.
#[derive(Debug)]
pub struct CrosstermBackend {
    sink: AnsiSink<Stdout>,
}

impl CrosstermBackend {
    pub fn new(mode: ColorMode) -> Self {
        Self {
            sink: AnsiSink::new(io::stdout(), mode),
        }
    }
}

impl Default for CrosstermBackend {
    fn default() -> Self {
        Self::new(ColorMode::detect())
    }
}

impl OpSink for CrosstermBackend {
    fn apply(&mut self, ops: &[RenderOp]) -> io::Result<()> {
        self.sink.apply(ops)
    }
}

impl TerminalBackend for CrosstermBackend {
    fn enable_raw_mode(&mut self) -> Result<()> {
        enable_raw_mode()?;
        Ok(())
    }
    fn disable_raw_mode(&mut self) -> Result<()> {
        disable_raw_mode()?;
        Ok(())
    }
    fn enter_alternate_screen(&mut self) -> Result<()> {
        execute!(self.sink.writer(), EnterAlternateScreen)?;
        Ok(())
    }
    fn leave_alternate_screen(&mut self) -> Result<()> {
        execute!(self.sink.writer(), LeaveAlternateScreen)?;
        Ok(())
    }
    fn hide_cursor(&mut self) -> Result<()> {
        execute!(self.sink.writer(), cursor::Hide)?;
        Ok(())
    }
    fn show_cursor(&mut self) -> Result<()> {
        execute!(self.sink.writer(), cursor::Show)?;
        Ok(())
    }
    fn set_bracketed_paste(&mut self, enabled: bool) -> Result<()> {
        if enabled {
            execute!(self.sink.writer(), EnableBracketedPaste)?;
        } else {
            execute!(self.sink.writer(), DisableBracketedPaste)?;
        }
        Ok(())
    }
    fn set_mice(&mut self, mice: MiceEvents) -> Result<()> {
        let out = self.sink.writer();
        out.write_all(mice_sequence(mice).as_bytes())?;
        out.flush()?;
        Ok(())
    }
    fn size(&self) -> Result<(u16, u16)> {
        Ok(crossterm::terminal::size()?)
    }
}

/// Testable backend with generic writer for capturing escape sequences.
/// This backend allows testing terminal output without a real TTY.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug)]
pub struct TestableBackend<W: Write> {
    sink: AnsiSink<W>,
    size: (u16, u16),
    raw_mode: bool,
    alternate_screen: bool,
    cursor_hidden: bool,
    bracketed_paste: bool,
    mice: MiceEvents,
    size_fails: bool,
}

impl<W: Write> TestableBackend<W> {
    /// Create a backend writing to `writer` and reporting `cols`×`rows`.
    pub fn new(writer: W, cols: u16, rows: u16) -> Self {
        Self {
            sink: AnsiSink::new(writer, ColorMode::TrueColor),
            size: (cols, rows),
            raw_mode: false,
            alternate_screen: false,
            cursor_hidden: false,
            bracketed_paste: false,
            mice: MiceEvents::None,
            size_fails: false,
        }
    }

    #[must_use]
    pub fn with_mode(mut self, mode: ColorMode) -> Self {
        self.sink.set_mode(mode);
        self
    }

    /// Change the size the next `size()` reports.
    pub fn set_size(&mut self, cols: u16, rows: u16) {
        self.size = (cols, rows);
    }

    /// Make `size()` fail until switched off again.
    pub fn fail_size_queries(&mut self, fail: bool) {
        self.size_fails = fail;
    }

    pub fn is_raw_mode(&self) -> bool {
        self.raw_mode
    }

    pub fn is_alternate_screen(&self) -> bool {
        self.alternate_screen
    }

    pub fn is_cursor_hidden(&self) -> bool {
        self.cursor_hidden
    }

    pub fn is_bracketed_paste(&self) -> bool {
        self.bracketed_paste
    }

    pub fn mice(&self) -> MiceEvents {
        self.mice
    }

    /// Bytes written so far (flushed frames and control sequences).
    pub fn output(&self) -> &W {
        self.sink.get_ref()
    }

    /// Get the underlying writer (consumes self).
    pub fn into_writer(self) -> io::Result<W> {
        self.sink.into_inner()
    }
}

impl<W: Write> OpSink for TestableBackend<W> {
    fn apply(&mut self, ops: &[RenderOp]) -> io::Result<()> {
        self.sink.apply(ops)
    }
}

impl<W: Write> TerminalBackend for TestableBackend<W> {
    fn enable_raw_mode(&mut self) -> Result<()> {
        self.raw_mode = true;
        Ok(())
    }

    fn disable_raw_mode(&mut self) -> Result<()> {
        self.raw_mode = false;
        Ok(())
    }

    fn enter_alternate_screen(&mut self) -> Result<()> {
        self.alternate_screen = true;
        execute!(self.sink.writer(), EnterAlternateScreen)?;
        Ok(())
    }

    fn leave_alternate_screen(&mut self) -> Result<()> {
        self.alternate_screen = false;
        execute!(self.sink.writer(), LeaveAlternateScreen)?;
        Ok(())
    }

    fn hide_cursor(&mut self) -> Result<()> {
        self.cursor_hidden = true;
        execute!(self.sink.writer(), cursor::Hide)?;
        Ok(())
    }

    fn show_cursor(&mut self) -> Result<()> {
        self.cursor_hidden = false;
        execute!(self.sink.writer(), cursor::Show)?;
        Ok(())
    }

    fn set_bracketed_paste(&mut self, enabled: bool) -> Result<()> {
        self.bracketed_paste = enabled;
        Ok(())
    }

    fn set_mice(&mut self, mice: MiceEvents) -> Result<()> {
        self.mice = mice;
        let out = self.sink.writer();
        out.write_all(mice_sequence(mice).as_bytes())?;
        out.flush()?;
        Ok(())
    }

    fn size(&self) -> Result<(u16, u16)> {
        if self.size_fails {
            return Err(io::Error::other("size query failed").into());
        }
        Ok(self.size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(backend: &TestableBackend<Vec<u8>>) -> String {
        String::from_utf8_lossy(backend.output()).into_owned()
    }

    #[test]
    fn test_testable_backend_state() {
        let mut backend = TestableBackend::new(Vec::new(), 80, 24);
        assert_eq!(backend.size().unwrap(), (80, 24));

        backend.enable_raw_mode().unwrap();
        backend.enter_alternate_screen().unwrap();
        backend.hide_cursor().unwrap();
        assert!(backend.is_raw_mode());
        assert!(backend.is_alternate_screen());
        assert!(backend.is_cursor_hidden());
        assert!(text(&backend).contains("\x1b[?1049h"));
        assert!(text(&backend).contains("\x1b[?25l"));

        backend.leave_alternate_screen().unwrap();
        backend.show_cursor().unwrap();
        backend.disable_raw_mode().unwrap();
        assert!(!backend.is_raw_mode());
        assert!(!backend.is_alternate_screen());
        assert!(!backend.is_cursor_hidden());
        assert!(text(&backend).contains("\x1b[?1049l"));
    }

    #[test]
    fn test_testable_backend_mice() {
        let mut backend = TestableBackend::new(Vec::new(), 10, 10);
        backend.set_mice(MiceEvents::Drag).unwrap();
        assert_eq!(backend.mice(), MiceEvents::Drag);
        assert!(text(&backend).ends_with(mice_sequence(MiceEvents::Drag)));
    }

    #[test]
    fn test_testable_backend_resize() {
        let mut backend = TestableBackend::new(Vec::new(), 10, 10);
        backend.set_size(40, 12);
        assert_eq!(backend.size().unwrap(), (40, 12));
        backend.fail_size_queries(true);
        assert!(backend.size().is_err());
    }

    #[test]
    fn test_frames_share_stream_with_control() {
        let mut backend = TestableBackend::new(Vec::new(), 10, 2);
        backend.hide_cursor().unwrap();
        backend
            .apply(&[RenderOp::MoveTo { y: 0, x: 0 }, RenderOp::Print("ok".into())])
            .unwrap();
        backend.show_cursor().unwrap();
        assert_eq!(text(&backend), "\x1b[?25l\x1b[1;1Hok\x1b[?25h");
    }
}
