//! The engine handle: one pile, one renderer, one terminal.
//!
//! Creating an [`Engine`] puts the terminal into raw mode (and, by default,
//! the alternate screen). Dropping it, or calling [`Engine::stop`], puts
//! everything back.

use crate::backend::{CrosstermBackend, TerminalBackend};
use crate::caps;
use crate::color::ColorMode;
use crate::config::EngineConfig;
use crate::error::{Result, TermError};
use crate::input::{CrosstermSource, EventSource, InputLoop};
use std::collections::VecDeque;
use std::io::{self, IsTerminal};
use std::time::Duration;
use stratum_core::{
    blit, keys, BlitOptions, BlitReport, Capabilities, Dims, FrameBuffer, InputEvent,
    MiceEvents, Pile, PlaneId, RenderOp, RenderStats, Renderer, Visual,
};

/// A running terminal session.
pub struct Engine<B: TerminalBackend = CrosstermBackend> {
    backend: B,
    pile: Pile,
    renderer: Renderer,
    caps: Capabilities,
    config: EngineConfig,
    input: Option<InputLoop>,
    backlog: VecDeque<InputEvent>,
    mice: MiceEvents,
    restored: bool,
}

impl Engine<CrosstermBackend> {
    /// Take over the process's terminal.
    ///
    /// Fails with [`TermError::TerminalNotAvailable`] when standard output
    /// is not a terminal.
    pub fn new(config: EngineConfig) -> Result<Self> {
        if !io::stdout().is_terminal() {
            return Err(TermError::TerminalNotAvailable);
        }
        let mode = config.color_mode.unwrap_or_else(ColorMode::detect);
        let caps = config.capabilities.unwrap_or_else(caps::detect);
        log::debug!("color mode {mode:?}");
        Self::with_backend(CrosstermBackend::new(mode), caps, config)
    }

    /// Start reading the terminal's input on a background thread.
    pub fn input_start(&mut self) -> Result<()> {
        self.input_start_with(CrosstermSource)
    }
}

impl<B: TerminalBackend> Engine<B> {
    /// Run on an arbitrary backend with known capabilities.
    pub fn with_backend(backend: B, caps: Capabilities, config: EngineConfig) -> Result<Self> {
        let screen = screen_dims(backend.size()?);
        let pile = Pile::new(screen)?;
        let mut renderer = Renderer::new(screen);
        // Whatever the terminal shows now is unknown.
        renderer.damage();

        let mut engine = Self {
            backend,
            pile,
            renderer,
            caps,
            config,
            input: None,
            backlog: VecDeque::new(),
            mice: MiceEvents::None,
            restored: true,
        };
        engine.enter()?;
        log::debug!(
            "engine started at {}x{} with {:?}",
            screen.rows,
            screen.cols,
            engine.caps
        );
        Ok(engine)
    }

    fn enter(&mut self) -> Result<()> {
        self.restored = false;
        self.backend.enable_raw_mode()?;
        if self.config.alternate_screen {
            self.backend.enter_alternate_screen()?;
        }
        if self.config.hide_cursor {
            self.backend.hide_cursor()?;
        }
        if self.config.bracketed_paste {
            self.backend.set_bracketed_paste(true)?;
        }
        self.mice_enable(self.config.mice)
    }

    pub fn pile(&self) -> &Pile {
        &self.pile
    }

    pub fn pile_mut(&mut self) -> &mut Pile {
        &mut self.pile
    }

    /// The standard plane.
    pub fn root(&self) -> PlaneId {
        self.pile.root()
    }

    pub fn dims(&self) -> Dims {
        self.pile.dims()
    }

    pub fn capabilities(&self) -> &Capabilities {
        &self.caps
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// What the terminal is showing, as of the last successful render.
    pub fn displayed(&self) -> &FrameBuffer {
        self.renderer.displayed()
    }

    /// Composite the pile and write the changes to the terminal.
    ///
    /// After a write error the next render repaints everything.
    pub fn render(&mut self) -> Result<RenderStats> {
        match self.renderer.render(&self.pile, &mut self.backend) {
            Ok(stats) => Ok(stats),
            Err(e) => {
                if matches!(e, stratum_core::Error::RenderIo(_)) {
                    self.renderer.damage();
                }
                Err(e.into())
            }
        }
    }

    /// Repaint the whole screen on the next render.
    pub fn damage(&mut self) {
        self.renderer.damage();
    }

    /// Re-read the terminal size and resize the pile if it changed.
    pub fn refresh(&mut self) -> Result<Dims> {
        let screen = screen_dims(self.backend.size()?);
        if screen != self.pile.dims() {
            self.pile.resize_screen(screen)?;
            self.renderer.damage();
        }
        Ok(screen)
    }

    /// Blit a bitmap into `plane` using the detected capabilities.
    pub fn blit(
        &mut self,
        visual: &Visual,
        plane: PlaneId,
        opts: &BlitOptions,
    ) -> Result<BlitReport> {
        let report = blit(visual, self.pile.plane_mut(plane)?, opts, &self.caps)?;
        Ok(report)
    }

    /// Change which mouse events the terminal reports.
    pub fn mice_enable(&mut self, mice: MiceEvents) -> Result<()> {
        self.backend.set_mice(mice)?;
        self.mice = mice;
        Ok(())
    }

    pub fn mice(&self) -> MiceEvents {
        self.mice
    }

    /// Start the input thread on `source`.
    pub fn input_start_with<S>(&mut self, source: S) -> Result<()>
    where
        S: EventSource + Send + 'static,
    {
        if self.input.as_ref().is_some_and(InputLoop::is_running) {
            return Err(TermError::InputAlreadyRunning);
        }
        self.input_stop();
        self.input = Some(InputLoop::spawn(source, self.config.input_poll())?);
        Ok(())
    }

    /// Stop the input thread. Idempotent; queued events stay deliverable.
    pub fn input_stop(&mut self) {
        if let Some(mut input) = self.input.take() {
            input.stop();
            self.backlog.extend(input.drain());
        }
    }

    pub fn input_running(&self) -> bool {
        self.input.as_ref().is_some_and(InputLoop::is_running)
    }

    fn next_queued(&mut self) -> Option<InputEvent> {
        self.backlog
            .pop_front()
            .or_else(|| self.input.as_ref().and_then(InputLoop::try_recv))
    }

    /// Resize notifications update the pile before anyone sees them.
    fn deliver(&mut self, event: &InputEvent) -> Result<()> {
        if event.id == keys::RESIZE {
            self.refresh()?;
        }
        Ok(())
    }

    /// Wait up to `timeout` for the next event.
    ///
    /// On error the event stays queued.
    pub fn get(&mut self, timeout: Duration) -> Result<Option<InputEvent>> {
        let event = match self.next_queued() {
            Some(ev) => ev,
            None => match self
                .input
                .as_ref()
                .and_then(|input| input.recv_timeout(timeout))
            {
                Some(ev) => ev,
                None => return Ok(None),
            },
        };
        if let Err(e) = self.deliver(&event) {
            self.backlog.push_front(event);
            return Err(e);
        }
        Ok(Some(event))
    }

    /// Hand every queued event to `handler`, on this thread, in order.
    ///
    /// Returns how many events were delivered. When an event fails to
    /// deliver, it and everything after it stay queued for the next call.
    pub fn dispatch_input<F>(&mut self, mut handler: F) -> Result<usize>
    where
        F: FnMut(&mut Pile, &InputEvent),
    {
        let mut pending: VecDeque<InputEvent> = self.backlog.drain(..).collect();
        if let Some(input) = &self.input {
            pending.extend(input.drain());
        }
        let mut count = 0;
        while let Some(event) = pending.pop_front() {
            if let Err(e) = self.deliver(&event) {
                pending.push_front(event);
                log::debug!("{} input event(s) requeued after {e}", pending.len());
                pending.append(&mut self.backlog);
                self.backlog = pending;
                return Err(e);
            }
            handler(&mut self.pile, &event);
            count += 1;
        }
        Ok(count)
    }

    /// Restore the terminal, reporting the first failure.
    pub fn stop(mut self) -> Result<()> {
        self.restore()
    }

    fn restore(&mut self) -> Result<()> {
        if self.restored {
            return Ok(());
        }
        self.restored = true;
        self.input_stop();

        // Every step runs even if an earlier one failed.
        let steps = [
            self.backend
                .apply(&[RenderOp::Reset])
                .map_err(TermError::from),
            self.backend.set_mice(MiceEvents::None),
            if self.config.bracketed_paste {
                self.backend.set_bracketed_paste(false)
            } else {
                Ok(())
            },
            self.backend.show_cursor(),
            if self.config.alternate_screen {
                self.backend.leave_alternate_screen()
            } else {
                Ok(())
            },
            self.backend.disable_raw_mode(),
        ];
        self.mice = MiceEvents::None;
        log::debug!("terminal restored after {} frame(s)", self.renderer.frames());
        steps.into_iter().collect()
    }
}

impl<B: TerminalBackend> Drop for Engine<B> {
    fn drop(&mut self) {
        if let Err(e) = self.restore() {
            log::warn!("terminal restore failed: {e}");
        }
    }
}

impl<B: TerminalBackend + std::fmt::Debug> std::fmt::Debug for Engine<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("backend", &self.backend)
            .field("dims", &self.pile.dims())
            .field("caps", &self.caps)
            .field("mice", &self.mice)
            .field("input_running", &self.input_running())
            .field("restored", &self.restored)
            .finish()
    }
}

fn screen_dims((cols, rows): (u16, u16)) -> Dims {
    Dims::new(u32::from(rows.max(1)), u32::from(cols.max(1)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::TestableBackend;
    use crate::input::ScriptedSource;
    use crossterm::event::{Event, KeyCode, KeyEvent, KeyModifiers as Ct};
    use stratum_core::{Channels, PlaneOptions, Style};

    type TestEngine = Engine<TestableBackend<Vec<u8>>>;

    fn engine(config: EngineConfig) -> TestEngine {
        let backend = TestableBackend::new(Vec::new(), 20, 5);
        Engine::with_backend(backend, Capabilities::UNICODE, config).unwrap()
    }

    fn output(engine: &TestEngine) -> String {
        String::from_utf8_lossy(engine.backend().output()).into_owned()
    }

    #[test]
    fn test_enter_sets_terminal_modes() {
        let e = engine(EngineConfig::high_performance());
        assert!(e.backend().is_raw_mode());
        assert!(e.backend().is_alternate_screen());
        assert!(e.backend().is_cursor_hidden());
        assert!(e.backend().is_bracketed_paste());
        assert_eq!(e.backend().mice(), MiceEvents::All);
        assert_eq!(e.dims(), Dims::new(5, 20));
    }

    #[test]
    fn test_inline_config_skips_alt_screen() {
        let e = engine(EngineConfig::inline());
        assert!(e.backend().is_raw_mode());
        assert!(!e.backend().is_alternate_screen());
        assert!(!e.backend().is_cursor_hidden());
    }

    #[test]
    fn test_stop_restores() {
        let mut e = engine(EngineConfig::high_performance());
        e.restore().unwrap();
        assert!(!e.backend().is_raw_mode());
        assert!(!e.backend().is_alternate_screen());
        assert!(!e.backend().is_cursor_hidden());
        assert_eq!(e.backend().mice(), MiceEvents::None);
        assert!(output(&e).ends_with("\x1b[?1049l"));

        // Second restore writes nothing.
        let len = e.backend().output().len();
        e.restore().unwrap();
        assert_eq!(e.backend().output().len(), len);
    }

    #[test]
    fn test_first_render_paints_every_cell() {
        let mut e = engine(EngineConfig::default());
        let stats = e.render().unwrap();
        assert_eq!(stats.cells_written, 100);

        let again = e.render().unwrap();
        assert_eq!(again.ops, 0);
    }

    #[test]
    fn test_render_text() {
        let mut e = engine(EngineConfig::default());
        e.render().unwrap();
        let root = e.root();
        {
            let plane = e.pile_mut().plane_mut(root).unwrap();
            plane.set_styles(Style::BOLD);
            plane.set_channels(Channels::from_rgb(0xff_00_00, 0x00_00_00));
            plane.putstr_yx(Some(1), Some(2), "hi").unwrap();
        }
        e.render().unwrap();
        let out = output(&e);
        assert!(out.contains("\x1b[2;3H"));
        assert!(out.contains("\x1b[38;2;255;0;0m"));
        assert!(out.contains("hi"));
        assert_eq!(
            e.displayed().get(1, 2).map(|c| c.glyph().to_string()),
            Some("h".to_string())
        );
    }

    #[test]
    fn test_resize_event_resizes_pile() {
        let mut e = engine(EngineConfig::default());
        e.render().unwrap();
        e.backend_mut().set_size(30, 8);
        e.input_start_with(ScriptedSource::new([Event::Resize(30, 8)]).then_eof())
            .unwrap();

        let mut seen = Vec::new();
        let deadline = std::time::Instant::now() + Duration::from_secs(2);
        while !seen.contains(&keys::EOF) && std::time::Instant::now() < deadline {
            e.dispatch_input(|pile, ev| {
                if ev.id == keys::RESIZE {
                    assert_eq!(pile.dims(), Dims::new(8, 30));
                }
                seen.push(ev.id);
            })
            .unwrap();
            std::thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(seen, vec![keys::RESIZE, keys::EOF]);
        assert_eq!(e.dims(), Dims::new(8, 30));

        let stats = e.render().unwrap();
        assert_eq!(stats.cells_written, 240);
    }

    #[test]
    fn test_input_already_running() {
        let mut e = engine(EngineConfig::default());
        e.input_start_with(ScriptedSource::default()).unwrap();
        assert!(matches!(
            e.input_start_with(ScriptedSource::default()),
            Err(TermError::InputAlreadyRunning)
        ));
        e.input_stop();
        e.input_stop();
        assert!(!e.input_running());
        e.input_start_with(ScriptedSource::default()).unwrap();
    }

    #[test]
    fn test_get_with_timeout() {
        let mut e = engine(EngineConfig::default());
        assert!(e.get(Duration::from_millis(1)).unwrap().is_none());

        e.input_start_with(ScriptedSource::new([Event::Key(KeyEvent::new(
            KeyCode::Char('z'),
            Ct::NONE,
        ))]))
        .unwrap();
        let ev = e.get(Duration::from_secs(2)).unwrap().unwrap();
        assert_eq!(ev.id, u32::from('z'));
    }

    #[test]
    fn test_events_survive_input_stop() {
        let mut e = engine(EngineConfig::default());
        e.input_start_with(
            ScriptedSource::new([Event::Key(KeyEvent::new(KeyCode::Up, Ct::NONE))]).then_eof(),
        )
        .unwrap();
        std::thread::sleep(Duration::from_millis(100));
        e.input_stop();

        let mut ids = Vec::new();
        let n = e.dispatch_input(|_, ev| ids.push(ev.id)).unwrap();
        assert_eq!(n, 2);
        assert_eq!(ids, vec![keys::UP, keys::EOF]);
    }

    #[test]
    fn test_failed_resize_keeps_remaining_events() {
        let mut e = engine(EngineConfig::default());
        let key = |c| Event::Key(KeyEvent::new(KeyCode::Char(c), Ct::NONE));
        e.input_start_with(
            ScriptedSource::new([key('a'), Event::Resize(30, 8), key('b')]).then_eof(),
        )
        .unwrap();
        std::thread::sleep(Duration::from_millis(100));
        e.input_stop();

        e.backend_mut().fail_size_queries(true);
        let mut ids = Vec::new();
        assert!(matches!(
            e.dispatch_input(|_, ev| ids.push(ev.id)),
            Err(TermError::Io(_))
        ));
        assert_eq!(ids, vec![u32::from('a')]);
        assert!(matches!(e.get(Duration::ZERO), Err(TermError::Io(_))));

        e.backend_mut().fail_size_queries(false);
        e.backend_mut().set_size(30, 8);
        ids.clear();
        let n = e.dispatch_input(|_, ev| ids.push(ev.id)).unwrap();
        assert_eq!(n, 3);
        assert_eq!(ids, vec![keys::RESIZE, u32::from('b'), keys::EOF]);
        assert_eq!(e.dims(), Dims::new(8, 30));
    }

    #[test]
    fn test_blit_uses_engine_caps() {
        let mut e = engine(EngineConfig::default());
        let root = e.root();
        let plane = e
            .pile_mut()
            .create(root, PlaneOptions::new(0, 0, 1, 1))
            .unwrap();
        let red = [0xff, 0, 0, 0xff].repeat(4);
        let visual = Visual::from_rgba(&red, 2, 2, 4).unwrap();
        let opts = BlitOptions {
            blitter: stratum_core::Blitter::Half,
            ..BlitOptions::default()
        };
        let report = e.blit(&visual, plane, &opts).unwrap();
        assert_eq!(report.blitter, stratum_core::Blitter::Half);
    }
}
