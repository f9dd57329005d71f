//! Decoded input events.
//!
//! Terminal drivers turn raw input into [`InputEvent`]s. Printable keys
//! carry their Unicode scalar value as the id; everything else (arrows,
//! function keys, mouse buttons, resize) gets a synthesized id from
//! [`keys`], placed in Supplementary Private Use Area-B so it can never
//! collide with a real character.

use serde::{Deserialize, Serialize};

/// Synthesized key ids.
pub mod keys {
    /// First synthesized id.
    pub const BASE: u32 = 0x10_0000;

    /// Synthesized id number `n`.
    #[must_use]
    pub const fn synthesized(n: u32) -> u32 {
        BASE + n
    }

    /// Whether `id` is synthesized rather than a Unicode scalar value.
    #[must_use]
    pub const fn is_synthesized(id: u32) -> bool {
        id >= BASE
    }

    pub const INVALID: u32 = synthesized(0);
    /// The terminal was resized.
    pub const RESIZE: u32 = synthesized(1);
    pub const UP: u32 = synthesized(2);
    pub const RIGHT: u32 = synthesized(3);
    pub const DOWN: u32 = synthesized(4);
    pub const LEFT: u32 = synthesized(5);
    pub const INS: u32 = synthesized(6);
    pub const DEL: u32 = synthesized(7);
    pub const BACKSPACE: u32 = synthesized(8);
    pub const PGDOWN: u32 = synthesized(9);
    pub const PGUP: u32 = synthesized(10);
    pub const HOME: u32 = synthesized(11);
    pub const END: u32 = synthesized(12);

    /// Function key `n` (F0 through F60).
    #[must_use]
    pub const fn f(n: u32) -> u32 {
        synthesized(20 + n)
    }

    pub const ENTER: u32 = synthesized(121);
    pub const CLS: u32 = synthesized(122);
    pub const BEGIN: u32 = synthesized(129);
    pub const CANCEL: u32 = synthesized(130);
    pub const PRINT_SCREEN: u32 = synthesized(141);
    pub const PAUSE: u32 = synthesized(142);
    pub const MENU: u32 = synthesized(143);
    pub const CAPS_LOCK: u32 = synthesized(150);
    pub const SCROLL_LOCK: u32 = synthesized(151);
    pub const NUM_LOCK: u32 = synthesized(152);
    pub const FOCUS_GAINED: u32 = synthesized(160);
    pub const FOCUS_LOST: u32 = synthesized(161);
    /// Pasted text; the event's `text` holds it.
    pub const PASTE: u32 = synthesized(162);

    /// Mouse moved with no button held.
    pub const MOTION: u32 = synthesized(200);
    pub const BUTTON1: u32 = synthesized(201);
    pub const BUTTON2: u32 = synthesized(202);
    pub const BUTTON3: u32 = synthesized(203);
    /// Wheel up.
    pub const BUTTON4: u32 = synthesized(204);
    /// Wheel down.
    pub const BUTTON5: u32 = synthesized(205);
    pub const BUTTON6: u32 = synthesized(206);
    pub const BUTTON7: u32 = synthesized(207);
    pub const SCROLL_UP: u32 = BUTTON4;
    pub const SCROLL_DOWN: u32 = BUTTON5;

    /// End of input.
    pub const EOF: u32 = synthesized(300);

    pub const TAB: u32 = 0x09;
    pub const ESC: u32 = 0x1b;
    pub const SPACE: u32 = 0x20;
}

/// Press/repeat/release distinction, where the terminal reports it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    /// The terminal does not distinguish.
    #[default]
    Unknown,
    Press,
    Repeat,
    Release,
}

/// Modifier keys held during an event.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyModifiers(u8);

impl KeyModifiers {
    pub const NONE: Self = Self(0);
    pub const SHIFT: Self = Self(1 << 0);
    pub const ALT: Self = Self(1 << 1);
    pub const CTRL: Self = Self(1 << 2);
    pub const SUPER: Self = Self(1 << 3);
    pub const HYPER: Self = Self(1 << 4);
    pub const META: Self = Self(1 << 5);
    pub const CAPSLOCK: Self = Self(1 << 6);
    pub const NUMLOCK: Self = Self(1 << 7);

    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Check if every modifier of `other` is held.
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }

    #[must_use]
    pub const fn with(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }

    #[must_use]
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }
}

impl std::ops::BitOr for KeyModifiers {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

impl std::ops::BitOrAssign for KeyModifiers {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// Which mouse events the terminal should report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MiceEvents {
    #[default]
    None,
    /// Button presses and releases.
    Buttons,
    /// Buttons plus motion while a button is held.
    Drag,
    /// Every event, including bare motion.
    All,
}

/// One decoded input event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputEvent {
    /// Unicode scalar value, or a synthesized id from [`keys`].
    pub id: u32,
    pub kind: EventKind,
    /// Cell coordinates, for mouse events.
    pub y: Option<u32>,
    pub x: Option<u32>,
    /// Pixel coordinates, when the terminal reports them.
    pub ypx: Option<u32>,
    pub xpx: Option<u32>,
    /// Text the event produces; empty if not printable.
    pub text: String,
    pub modifiers: KeyModifiers,
    /// Whether this came from the mouse.
    pub mouse: bool,
}

impl InputEvent {
    /// Key event for `id`. Printable ids get their text filled in.
    #[must_use]
    pub fn key(id: u32, modifiers: KeyModifiers) -> Self {
        let text = if keys::is_synthesized(id) {
            String::new()
        } else {
            char::from_u32(id)
                .filter(|c| !c.is_control())
                .map(String::from)
                .unwrap_or_default()
        };
        Self {
            id,
            kind: EventKind::Press,
            text,
            modifiers,
            ..Self::default()
        }
    }

    /// Mouse event for `button` (a `keys::BUTTON*` or `keys::MOTION`) at a cell.
    #[must_use]
    pub fn mouse(button: u32, kind: EventKind, y: u32, x: u32, modifiers: KeyModifiers) -> Self {
        Self {
            id: button,
            kind,
            y: Some(y),
            x: Some(x),
            modifiers,
            mouse: true,
            ..Self::default()
        }
    }

    /// Terminal resize notification.
    #[must_use]
    pub fn resize() -> Self {
        Self {
            id: keys::RESIZE,
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn with_kind(mut self, kind: EventKind) -> Self {
        self.kind = kind;
        self
    }

    /// The character for a non-synthesized id.
    #[must_use]
    pub fn char(&self) -> Option<char> {
        if keys::is_synthesized(self.id) {
            None
        } else {
            char::from_u32(self.id)
        }
    }

    #[must_use]
    pub const fn is_synthesized(&self) -> bool {
        keys::is_synthesized(self.id)
    }

    #[must_use]
    pub const fn shift(&self) -> bool {
        self.modifiers.contains(KeyModifiers::SHIFT)
    }

    #[must_use]
    pub const fn alt(&self) -> bool {
        self.modifiers.contains(KeyModifiers::ALT)
    }

    #[must_use]
    pub const fn ctrl(&self) -> bool {
        self.modifiers.contains(KeyModifiers::CTRL)
    }

    #[must_use]
    pub const fn meta(&self) -> bool {
        self.modifiers.contains(KeyModifiers::META)
    }

    #[must_use]
    pub const fn super_key(&self) -> bool {
        self.modifiers.contains(KeyModifiers::SUPER)
    }

    #[must_use]
    pub const fn hyper(&self) -> bool {
        self.modifiers.contains(KeyModifiers::HYPER)
    }

    #[must_use]
    pub const fn capslock(&self) -> bool {
        self.modifiers.contains(KeyModifiers::CAPSLOCK)
    }

    #[must_use]
    pub const fn numlock(&self) -> bool {
        self.modifiers.contains(KeyModifiers::NUMLOCK)
    }
}
