//! Input decoding and the reader thread.
//!
//! ```text
//! ┌──────────────────┐     mpsc::channel      ┌──────────────────┐
//! │   Input Thread   │ ────────────────────▶  │   Caller Thread  │
//! │                  │     InputEvent queue   │                  │
//! │  source.poll()   │                        │  dispatch_input  │
//! │  source.read()   │                        │  render()        │
//! └──────────────────┘                        └──────────────────┘
//! ```
//!
//! The reader never touches planes; it only decodes crossterm events into
//! [`InputEvent`]s and queues them.

use crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyEventKind, KeyEventState, MouseButton, MouseEvent,
    MouseEventKind,
};
use std::collections::VecDeque;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use stratum_core::{keys, EventKind, InputEvent, KeyModifiers};

/// Where raw terminal events come from.
pub trait EventSource {
    /// Wait up to `timeout` for an event to become readable.
    fn poll(&mut self, timeout: Duration) -> io::Result<bool>;
    /// Read the next event. Only called after `poll` returned true.
    fn read(&mut self) -> io::Result<Event>;
}

/// The process's terminal, via crossterm.
#[derive(Debug, Clone, Copy, Default)]
pub struct CrosstermSource;

impl EventSource for CrosstermSource {
    fn poll(&mut self, timeout: Duration) -> io::Result<bool> {
        event::poll(timeout)
    }

    fn read(&mut self) -> io::Result<Event> {
        event::read()
    }
}

/// Replays a fixed list of events. Useful for tests and demos.
#[derive(Debug, Clone, Default)]
pub struct ScriptedSource {
    events: VecDeque<Event>,
    eof: bool,
}

impl ScriptedSource {
    pub fn new(events: impl IntoIterator<Item = Event>) -> Self {
        Self {
            events: events.into_iter().collect(),
            eof: false,
        }
    }

    /// Report end of input once the script is exhausted, instead of idling.
    #[must_use]
    pub fn then_eof(mut self) -> Self {
        self.eof = true;
        self
    }
}

impl EventSource for ScriptedSource {
    fn poll(&mut self, timeout: Duration) -> io::Result<bool> {
        if !self.events.is_empty() || self.eof {
            return Ok(true);
        }
        thread::sleep(timeout);
        Ok(false)
    }

    fn read(&mut self) -> io::Result<Event> {
        self.events
            .pop_front()
            .ok_or_else(|| io::Error::new(io::ErrorKind::UnexpectedEof, "script exhausted"))
    }
}

/// Decode one crossterm event. Events with no meaning here yield `None`.
#[must_use]
pub fn convert(event: &Event) -> Option<InputEvent> {
    match event {
        Event::Key(key) => convert_key(key),
        Event::Mouse(mouse) => Some(convert_mouse(mouse)),
        Event::Resize(..) => Some(InputEvent::resize()),
        Event::Paste(text) => Some(InputEvent {
            id: keys::PASTE,
            text: text.clone(),
            ..InputEvent::default()
        }),
        Event::FocusGained => Some(InputEvent::key(keys::FOCUS_GAINED, KeyModifiers::NONE)),
        Event::FocusLost => Some(InputEvent::key(keys::FOCUS_LOST, KeyModifiers::NONE)),
    }
}

fn convert_key(key: &KeyEvent) -> Option<InputEvent> {
    let mut modifiers = modifiers(key.modifiers);
    if key.state.contains(KeyEventState::CAPS_LOCK) {
        modifiers |= KeyModifiers::CAPSLOCK;
    }
    if key.state.contains(KeyEventState::NUM_LOCK) {
        modifiers |= KeyModifiers::NUMLOCK;
    }

    let id = match key.code {
        KeyCode::Char(c) => u32::from(c),
        KeyCode::Backspace => keys::BACKSPACE,
        KeyCode::Enter => keys::ENTER,
        KeyCode::Left => keys::LEFT,
        KeyCode::Right => keys::RIGHT,
        KeyCode::Up => keys::UP,
        KeyCode::Down => keys::DOWN,
        KeyCode::Home => keys::HOME,
        KeyCode::End => keys::END,
        KeyCode::PageUp => keys::PGUP,
        KeyCode::PageDown => keys::PGDOWN,
        KeyCode::Tab => keys::TAB,
        KeyCode::BackTab => {
            modifiers |= KeyModifiers::SHIFT;
            keys::TAB
        }
        KeyCode::Delete => keys::DEL,
        KeyCode::Insert => keys::INS,
        KeyCode::F(n) => keys::f(u32::from(n)),
        KeyCode::Esc => keys::ESC,
        KeyCode::CapsLock => keys::CAPS_LOCK,
        KeyCode::ScrollLock => keys::SCROLL_LOCK,
        KeyCode::NumLock => keys::NUM_LOCK,
        KeyCode::PrintScreen => keys::PRINT_SCREEN,
        KeyCode::Pause => keys::PAUSE,
        KeyCode::Menu => keys::MENU,
        KeyCode::KeypadBegin => keys::BEGIN,
        KeyCode::Null | KeyCode::Media(_) | KeyCode::Modifier(_) => return None,
    };

    let kind = match key.kind {
        KeyEventKind::Press => EventKind::Press,
        KeyEventKind::Repeat => EventKind::Repeat,
        KeyEventKind::Release => EventKind::Release,
    };
    Some(InputEvent::key(id, modifiers).with_kind(kind))
}

fn convert_mouse(mouse: &MouseEvent) -> InputEvent {
    let button = |b: MouseButton| match b {
        MouseButton::Left => keys::BUTTON1,
        MouseButton::Middle => keys::BUTTON2,
        MouseButton::Right => keys::BUTTON3,
    };
    let (id, kind) = match mouse.kind {
        MouseEventKind::Down(b) | MouseEventKind::Drag(b) => (button(b), EventKind::Press),
        MouseEventKind::Up(b) => (button(b), EventKind::Release),
        MouseEventKind::Moved => (keys::MOTION, EventKind::Unknown),
        MouseEventKind::ScrollUp => (keys::SCROLL_UP, EventKind::Press),
        MouseEventKind::ScrollDown => (keys::SCROLL_DOWN, EventKind::Press),
        MouseEventKind::ScrollLeft => (keys::BUTTON6, EventKind::Press),
        MouseEventKind::ScrollRight => (keys::BUTTON7, EventKind::Press),
    };
    InputEvent::mouse(
        id,
        kind,
        u32::from(mouse.row),
        u32::from(mouse.column),
        modifiers(mouse.modifiers),
    )
}

fn modifiers(m: event::KeyModifiers) -> KeyModifiers {
    use event::KeyModifiers as Ct;
    const MAP: [(Ct, KeyModifiers); 6] = [
        (Ct::SHIFT, KeyModifiers::SHIFT),
        (Ct::ALT, KeyModifiers::ALT),
        (Ct::CONTROL, KeyModifiers::CTRL),
        (Ct::SUPER, KeyModifiers::SUPER),
        (Ct::HYPER, KeyModifiers::HYPER),
        (Ct::META, KeyModifiers::META),
    ];
    MAP.iter()
        .filter(|(ct, _)| m.contains(*ct))
        .fold(KeyModifiers::NONE, |acc, (_, ours)| acc | *ours)
}

/// Background thread reading an [`EventSource`] into a queue.
///
/// Stopping is idempotent; events queued before the stop stay receivable.
#[derive(Debug)]
pub struct InputLoop {
    rx: Receiver<InputEvent>,
    shutdown: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl InputLoop {
    /// Spawn the reader thread, polling `source` every `poll`.
    pub fn spawn<S>(source: S, poll: Duration) -> io::Result<Self>
    where
        S: EventSource + Send + 'static,
    {
        let (tx, rx) = mpsc::channel();
        let shutdown = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&shutdown);

        let handle = thread::Builder::new()
            .name("stratum-input".to_string())
            .spawn(move || read_loop(source, &tx, &flag, poll))?;

        Ok(Self {
            rx,
            shutdown,
            handle: Some(handle),
        })
    }

    /// Whether the reader thread is still alive.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Next queued event, without blocking.
    pub fn try_recv(&self) -> Option<InputEvent> {
        match self.rx.try_recv() {
            Ok(ev) => Some(ev),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }

    /// Next event, waiting up to `timeout`.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<InputEvent> {
        match self.rx.recv_timeout(timeout) {
            Ok(ev) => Some(ev),
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
        }
    }

    /// All queued events, in arrival order.
    pub fn drain(&self) -> Vec<InputEvent> {
        std::iter::from_fn(|| self.try_recv()).collect()
    }

    /// Stop the reader and wait for it to exit.
    pub fn stop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::warn!("input thread panicked");
            }
        }
    }
}

impl Drop for InputLoop {
    fn drop(&mut self) {
        self.stop();
    }
}

fn read_loop<S: EventSource>(
    mut source: S,
    tx: &Sender<InputEvent>,
    shutdown: &AtomicBool,
    poll: Duration,
) {
    while !shutdown.load(Ordering::Relaxed) {
        let event = match source.poll(poll) {
            Ok(false) => continue,
            Ok(true) => source.read(),
            Err(e) => Err(e),
        };
        match event {
            Ok(raw) => {
                if let Some(ev) = convert(&raw) {
                    // Receiver gone: nobody left to deliver to.
                    if tx.send(ev).is_err() {
                        return;
                    }
                }
            }
            Err(e) => {
                if e.kind() == io::ErrorKind::UnexpectedEof {
                    log::debug!("input source ended");
                } else {
                    log::warn!("input source failed: {e}");
                }
                let _ = tx.send(InputEvent::key(keys::EOF, KeyModifiers::NONE));
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers as Ct;
    use std::time::Instant;

    fn key(code: KeyCode, m: Ct) -> Event {
        Event::Key(KeyEvent::new(code, m))
    }

    #[test]
    fn test_convert_char() {
        let ev = convert(&key(KeyCode::Char('q'), Ct::NONE)).unwrap();
        assert_eq!(ev.id, u32::from('q'));
        assert_eq!(ev.text, "q");
        assert_eq!(ev.kind, EventKind::Press);
    }

    #[test]
    fn test_convert_special_keys() {
        let cases = [
            (KeyCode::Up, keys::UP),
            (KeyCode::Enter, keys::ENTER),
            (KeyCode::Backspace, keys::BACKSPACE),
            (KeyCode::PageDown, keys::PGDOWN),
            (KeyCode::F(5), keys::f(5)),
            (KeyCode::Esc, keys::ESC),
            (KeyCode::Tab, keys::TAB),
        ];
        for (code, id) in cases {
            assert_eq!(convert(&key(code, Ct::NONE)).unwrap().id, id, "{code:?}");
        }
    }

    #[test]
    fn test_convert_modifiers_and_state() {
        let mut raw = KeyEvent::new(KeyCode::Char('c'), Ct::CONTROL | Ct::ALT);
        raw.state = KeyEventState::CAPS_LOCK;
        raw.kind = KeyEventKind::Release;
        let ev = convert(&Event::Key(raw)).unwrap();
        assert!(ev.ctrl() && ev.alt() && ev.capslock());
        assert!(!ev.shift());
        assert_eq!(ev.kind, EventKind::Release);
    }

    #[test]
    fn test_backtab_is_shift_tab() {
        let ev = convert(&key(KeyCode::BackTab, Ct::NONE)).unwrap();
        assert_eq!(ev.id, keys::TAB);
        assert!(ev.shift());
    }

    #[test]
    fn test_null_key_dropped() {
        assert!(convert(&key(KeyCode::Null, Ct::NONE)).is_none());
    }

    #[test]
    fn test_convert_mouse() {
        let raw = Event::Mouse(MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Right),
            column: 12,
            row: 4,
            modifiers: Ct::SHIFT,
        });
        let ev = convert(&raw).unwrap();
        assert!(ev.mouse);
        assert_eq!(ev.id, keys::BUTTON3);
        assert_eq!((ev.y, ev.x), (Some(4), Some(12)));
        assert!(ev.shift());

        let wheel = Event::Mouse(MouseEvent {
            kind: MouseEventKind::ScrollDown,
            column: 0,
            row: 0,
            modifiers: Ct::NONE,
        });
        assert_eq!(convert(&wheel).unwrap().id, keys::SCROLL_DOWN);
    }

    #[test]
    fn test_convert_resize_paste_focus() {
        assert_eq!(convert(&Event::Resize(80, 24)).unwrap().id, keys::RESIZE);
        let paste = convert(&Event::Paste("abc".into())).unwrap();
        assert_eq!(paste.id, keys::PASTE);
        assert_eq!(paste.text, "abc");
        assert_eq!(
            convert(&Event::FocusLost).unwrap().id,
            keys::FOCUS_LOST
        );
    }

    #[test]
    fn test_loop_delivers_in_order_then_eof() {
        let source = ScriptedSource::new([
            key(KeyCode::Char('a'), Ct::NONE),
            key(KeyCode::Null, Ct::NONE),
            key(KeyCode::Char('b'), Ct::NONE),
        ])
        .then_eof();
        let input = InputLoop::spawn(source, Duration::from_millis(5)).unwrap();

        let mut ids = Vec::new();
        while let Some(ev) = input.recv_timeout(Duration::from_secs(2)) {
            ids.push(ev.id);
            if ev.id == keys::EOF {
                break;
            }
        }
        assert_eq!(ids, vec![u32::from('a'), u32::from('b'), keys::EOF]);
    }

    #[test]
    fn test_stop_is_idempotent_and_prompt() {
        let mut input =
            InputLoop::spawn(ScriptedSource::default(), Duration::from_millis(10)).unwrap();
        assert!(input.is_running());

        let start = Instant::now();
        input.stop();
        input.stop();
        assert!(!input.is_running());
        assert!(start.elapsed() < Duration::from_millis(500));
    }

    #[test]
    fn test_queued_events_survive_stop() {
        let source = ScriptedSource::new([key(KeyCode::Char('x'), Ct::NONE)]);
        let input = InputLoop::spawn(source, Duration::from_millis(5)).unwrap();
        // Let the reader queue the event.
        let deadline = Instant::now() + Duration::from_secs(2);
        let mut first = None;
        while first.is_none() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
            first = input.try_recv();
        }
        assert_eq!(first.map(|e| e.id), Some(u32::from('x')));

        let source = ScriptedSource::new([
            key(KeyCode::Char('y'), Ct::NONE),
            key(KeyCode::Char('z'), Ct::NONE),
        ])
        .then_eof();
        let mut input = InputLoop::spawn(source, Duration::from_millis(5)).unwrap();
        thread::sleep(Duration::from_millis(100));
        input.stop();
        let ids: Vec<u32> = input.drain().iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![u32::from('y'), u32::from('z'), keys::EOF]);
    }
}
