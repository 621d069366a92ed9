//! Mouse escape-sequence decoder.
//!
//! Three competing wire formats share the `ESC [` prefix and are mutually
//! exclusive beyond it, tried in priority order:
//!
//! 1. SGR      `ESC [ < Pb ; Px ; Py (M|m)` — decimal, unbounded, `m` = release
//! 2. urxvt    `ESC [ Pb ; Px ; Py M`       — decimal, always press/motion
//! 3. basic    `ESC [ M b x y`              — single bytes offset by 32
//!
//! All three encode the same `Pb` bitfield: bits 0-1 select the button
//! (3 = none/motion), 0x40 marks a wheel event (bits 0-1 then select
//! up/down/left/right), 0x04 = shift, 0x08 = alt, 0x10 = ctrl.
//!
//! Event kind is inferred, not read off the wire: wheels are always presses;
//! an explicit release marker or a button-none code after a recorded press is
//! a release (clearing drag state); a button-none code with no recorded press
//! is a move; anything else compares against the first recorded press
//! position — displacement beyond the threshold in either axis latches a
//! dragging flag, and while latched every motion stays a drag until release
//! (hysteresis).

use std::time::Instant;

use super::events::{Modifiers, MouseButton, MouseEvent, MouseEventKind};

/// Default drag threshold in cells.
pub const DEFAULT_DRAG_THRESHOLD: u16 = 3;

/// Outcome of offering bytes to the decoder.
#[derive(Debug, Clone, PartialEq)]
pub enum MouseDecode {
    /// A complete event, plus how many bytes it consumed.
    Event { event: MouseEvent, consumed: usize },
    /// The bytes could still become a mouse sequence; keep buffering.
    Incomplete,
    /// Not a mouse sequence.
    NoMatch,
}

/// Stateful mouse decoder. The state is only the drag-detection memory
/// (first press position + latched dragging flag); decoding itself is pure.
pub struct MouseDecoder {
    drag_threshold: u16,
    last_press: Option<(u16, u16)>,
    dragging: bool,
}

impl MouseDecoder {
    pub fn new() -> Self {
        Self {
            drag_threshold: DEFAULT_DRAG_THRESHOLD,
            last_press: None,
            dragging: false,
        }
    }

    pub fn with_drag_threshold(mut self, cells: u16) -> Self {
        self.drag_threshold = cells;
        self
    }

    /// Try to decode one mouse event from the front of `buf`.
    pub fn decode(&mut self, buf: &[u8]) -> MouseDecode {
        if buf.is_empty() || buf[0] != 0x1b {
            return MouseDecode::NoMatch;
        }
        if buf.len() < 2 {
            return MouseDecode::Incomplete;
        }
        if buf[1] != b'[' {
            return MouseDecode::NoMatch;
        }
        if buf.len() < 3 {
            return MouseDecode::Incomplete;
        }
        match buf[2] {
            b'<' => self.decode_sgr(buf),
            b'M' => self.decode_basic(buf),
            b'0'..=b'9' => self.decode_urxvt(buf),
            _ => MouseDecode::NoMatch,
        }
    }

    // -------------------------------------------------------------------------
    // Wire formats
    // -------------------------------------------------------------------------

    /// SGR: `ESC [ < Pb ; Px ; Py (M|m)`.
    fn decode_sgr(&mut self, buf: &[u8]) -> MouseDecode {
        let mut end = 3;
        while end < buf.len() {
            match buf[end] {
                b'0'..=b'9' | b';' => end += 1,
                b'M' | b'm' => break,
                _ => return MouseDecode::NoMatch,
            }
        }
        if end >= buf.len() {
            return MouseDecode::Incomplete;
        }

        let release_marker = buf[end] == b'm';
        let Some((cb, x, y)) = parse_params(&buf[3..end]) else {
            return MouseDecode::NoMatch;
        };

        let event = self.classify(cb, x, y, release_marker);
        MouseDecode::Event { event, consumed: end + 1 }
    }

    /// Legacy urxvt: `ESC [ Pb ; Px ; Py M`. No release marker.
    fn decode_urxvt(&mut self, buf: &[u8]) -> MouseDecode {
        let mut end = 2;
        while end < buf.len() {
            match buf[end] {
                b'0'..=b'9' | b';' => end += 1,
                b'M' => break,
                _ => return MouseDecode::NoMatch,
            }
        }
        if end >= buf.len() {
            return MouseDecode::Incomplete;
        }

        let Some((cb, x, y)) = parse_params(&buf[2..end]) else {
            return MouseDecode::NoMatch;
        };

        let event = self.classify(cb, x, y, false);
        MouseDecode::Event { event, consumed: end + 1 }
    }

    /// Basic X10: `ESC [ M b x y` — each payload byte offset by 32.
    /// Coordinates top out at 223 (255 - 32), a byte-range limit.
    fn decode_basic(&mut self, buf: &[u8]) -> MouseDecode {
        if buf.len() < 6 {
            return MouseDecode::Incomplete;
        }
        let cb = u16::from(buf[3].wrapping_sub(32));
        let x = u16::from(buf[4].wrapping_sub(32));
        let y = u16::from(buf[5].wrapping_sub(32));

        let event = self.classify(cb, x, y, false);
        MouseDecode::Event { event, consumed: 6 }
    }

    // -------------------------------------------------------------------------
    // Shared bitfield + kind inference
    // -------------------------------------------------------------------------

    fn classify(&mut self, cb: u16, x: u16, y: u16, release_marker: bool) -> MouseEvent {
        let mut modifiers = Modifiers::empty();
        if cb & 0x04 != 0 {
            modifiers |= Modifiers::SHIFT;
        }
        if cb & 0x08 != 0 {
            modifiers |= Modifiers::ALT;
        }
        if cb & 0x10 != 0 {
            modifiers |= Modifiers::CTRL;
        }

        let base = cb & 0x03;
        let wheel = cb & 0x40 != 0;

        let button = if wheel {
            match base {
                0 => MouseButton::WheelUp,
                1 => MouseButton::WheelDown,
                2 => MouseButton::WheelLeft,
                _ => MouseButton::WheelRight,
            }
        } else {
            match base {
                0 => MouseButton::Left,
                1 => MouseButton::Middle,
                2 => MouseButton::Right,
                _ => MouseButton::None,
            }
        };

        let kind = if wheel {
            MouseEventKind::Press
        } else if release_marker {
            self.clear_drag_state();
            MouseEventKind::Release
        } else if button == MouseButton::None {
            // Button-none without a recorded press is a move, never a
            // release. With one, the terminal is reporting button-up in an
            // encoding that has no release marker.
            if self.last_press.is_some() {
                self.clear_drag_state();
                MouseEventKind::Release
            } else {
                MouseEventKind::Move
            }
        } else if self.dragging {
            MouseEventKind::Drag
        } else if let Some((px, py)) = self.last_press {
            let dx = x.abs_diff(px);
            let dy = y.abs_diff(py);
            if dx > self.drag_threshold || dy > self.drag_threshold {
                self.dragging = true;
                MouseEventKind::Drag
            } else {
                MouseEventKind::Press
            }
        } else {
            self.last_press = Some((x, y));
            MouseEventKind::Press
        };

        MouseEvent { x, y, button, modifiers, kind, at: Instant::now() }
    }

    fn clear_drag_state(&mut self) {
        self.last_press = None;
        self.dragging = false;
    }
}

impl Default for MouseDecoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse exactly three `;`-separated decimal parameters.
fn parse_params(bytes: &[u8]) -> Option<(u16, u16, u16)> {
    let s = std::str::from_utf8(bytes).ok()?;
    let mut parts = s.split(';');
    let cb = parts.next()?.parse::<u32>().ok()?;
    let x = parts.next()?.parse::<u32>().ok()?;
    let y = parts.next()?.parse::<u32>().ok()?;
    if parts.next().is_some() {
        return None;
    }
    let clamp = |v: u32| v.min(u32::from(u16::MAX)) as u16;
    Some((clamp(cb), clamp(x), clamp(y)))
}
