//! Typed input events.
//!
//! Produced by the keyboard and mouse decoders, consumed synchronously by bus
//! listeners. Events are immutable once created; decoding the same bytes
//! twice yields equal events (timestamps excepted).

use std::time::Instant;

// =============================================================================
// Keys
// =============================================================================

/// Symbolic key identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Enter,
    Escape,
    Backspace,
    Tab,
    Space,
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    PageUp,
    PageDown,
    Delete,
    Insert,
    F(u8),
    /// Ctrl-C (byte 0x03). Kept distinct because it means "interrupt", not
    /// "the letter c".
    CtrlC,
}

/// Press or release. Release events only appear on terminals that report
/// them; all legacy encodings produce presses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyEventKind {
    Press,
    Release,
}

/// A decoded keyboard event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: Key,
    pub kind: KeyEventKind,
    /// The bytes this event was decoded from.
    pub raw: Vec<u8>,
}

impl KeyEvent {
    pub fn press(key: Key, raw: &[u8]) -> Self {
        Self { key, kind: KeyEventKind::Press, raw: raw.to_vec() }
    }
}

// =============================================================================
// Mouse
// =============================================================================

bitflags::bitflags! {
    /// Modifier keys held during a mouse event.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Modifiers: u8 {
        const SHIFT = 1 << 0;
        const ALT   = 1 << 1;
        const CTRL  = 1 << 2;
        const META  = 1 << 3;
    }
}

/// Mouse button identity, wheel directions included.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MouseButton {
    Left,
    Middle,
    Right,
    WheelUp,
    WheelDown,
    WheelLeft,
    WheelRight,
    #[default]
    None,
}

impl MouseButton {
    /// Whether this is one of the four wheel directions.
    pub fn is_wheel(self) -> bool {
        matches!(
            self,
            Self::WheelUp | Self::WheelDown | Self::WheelLeft | Self::WheelRight
        )
    }
}

/// Classified mouse action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseEventKind {
    Press,
    Release,
    Drag,
    Move,
}

/// A decoded mouse event. Coordinates are 1-based terminal cells, exactly as
/// the wire formats report them.
#[derive(Debug, Clone, PartialEq)]
pub struct MouseEvent {
    pub x: u16,
    pub y: u16,
    pub button: MouseButton,
    pub modifiers: Modifiers,
    pub kind: MouseEventKind,
    pub at: Instant,
}

// =============================================================================
// Combined stream
// =============================================================================

/// One event from the shared input byte stream.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Key(KeyEvent),
    Mouse(MouseEvent),
    /// Reply to a cursor-position query (`ESC [ row ; col R`), 1-based.
    CursorReport { row: u16, col: u16 },
}
