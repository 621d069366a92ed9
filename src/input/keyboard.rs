//! Keyboard escape-sequence decoder.
//!
//! Buffers raw stdin bytes and recognizes:
//! - single control bytes (Enter = CR/LF, Escape, Backspace 0x08/0x7F, Tab,
//!   Space, Ctrl-C)
//! - CSI sequences (arrows, Home/End, PageUp/Down, Insert/Delete, F1-F12,
//!   Shift-Tab, cursor-position reports)
//! - SS3 sequences (F1-F4, alternate arrow encodings)
//! - Kitty keyboard protocol (`CSI ... u`), which is where key releases
//!   come from on terminals that report them
//! - UTF-8 multi-byte characters
//!
//! Sequences the keyboard grammar does not claim are offered to an attached
//! mouse decoder before being discarded, so both decoders share one raw byte
//! stream without a second reader. Incomplete sequences stay buffered; the
//! engine calls [`KeyboardDecoder::flush_pending`] after the escape timeout
//! to tell a genuine ESC keypress apart from the start of a sequence.

use tracing::trace;

use super::events::{Event, Key, KeyEvent, KeyEventKind};
use super::mouse::{MouseDecode, MouseDecoder};

enum Parse {
    Event(Event),
    Incomplete,
    Skip,
}

/// Buffering keyboard parser with an optional mouse hand-off.
pub struct KeyboardDecoder {
    buf: Vec<u8>,
    mouse: Option<MouseDecoder>,
}

impl KeyboardDecoder {
    pub fn new() -> Self {
        Self { buf: Vec::with_capacity(64), mouse: None }
    }

    /// Register the mouse decoder that unclaimed escape sequences are
    /// offered to.
    pub fn attach_mouse(&mut self, mouse: MouseDecoder) {
        self.mouse = Some(mouse);
    }

    /// Feed raw bytes; returns every event that became complete.
    pub fn feed(&mut self, data: &[u8]) -> Vec<Event> {
        self.buf.extend_from_slice(data);
        let mut events = Vec::new();

        while !self.buf.is_empty() {
            match self.try_parse_one() {
                Parse::Event(ev) => {
                    trace!(?ev, "decoded input event");
                    events.push(ev);
                }
                Parse::Incomplete => break,
                Parse::Skip => {
                    self.buf.remove(0);
                }
            }
        }

        events
    }

    /// Whether an incomplete sequence is buffered.
    pub fn has_pending(&self) -> bool {
        !self.buf.is_empty()
    }

    /// Drain buffered bytes after the escape timeout: a lone buffered ESC is
    /// a real Escape keypress, remaining printable bytes are literals.
    pub fn flush_pending(&mut self) -> Vec<Event> {
        let mut events = Vec::new();
        while !self.buf.is_empty() {
            let byte = self.buf.remove(0);
            match byte {
                0x1b => events.push(Event::Key(KeyEvent::press(Key::Escape, &[byte]))),
                0x20..=0x7e => {
                    events.push(Event::Key(KeyEvent::press(Key::Char(byte as char), &[byte])));
                }
                _ => {}
            }
        }
        events
    }

    fn try_parse_one(&mut self) -> Parse {
        let Some(&first) = self.buf.first() else {
            return Parse::Skip;
        };

        match first {
            0x1b => self.parse_escape(),
            0x03 => self.emit(Key::CtrlC, 1),
            0x08 | 0x7f => self.emit(Key::Backspace, 1),
            0x09 => self.emit(Key::Tab, 1),
            0x0a | 0x0d => self.emit(Key::Enter, 1),
            0x20 => self.emit(Key::Space, 1),
            // Remaining control bytes have no prompt meaning; swallow them
            // rather than leak them into text input.
            0x00..=0x1f => {
                self.buf.remove(0);
                Parse::Skip
            }
            0x21..=0x7e => self.emit(Key::Char(first as char), 1),
            0x80..=0xff => self.parse_utf8(),
        }
    }

    fn parse_escape(&mut self) -> Parse {
        if self.buf.len() < 2 {
            return Parse::Incomplete;
        }

        match self.buf[1] {
            b'[' => self.parse_csi(),
            b'O' => self.parse_ss3(),
            // Alt+char carries no meaning for line prompts; consume silently.
            0x20..=0x7e => {
                self.consume(2);
                Parse::Skip
            }
            _ => self.emit(Key::Escape, 1),
        }
    }

    fn parse_csi(&mut self) -> Parse {
        if self.buf.len() < 3 {
            return Parse::Incomplete;
        }

        // SGR (`ESC [ <`) and basic (`ESC [ M`) mouse prefixes are never
        // keyboard sequences; hand them straight over once the full
        // sequence has arrived.
        if self.buf[2] == b'<' {
            let mut i = 3;
            while i < self.buf.len() && !matches!(self.buf[i], b'M' | b'm') {
                i += 1;
            }
            if i >= self.buf.len() {
                return Parse::Incomplete;
            }
            return self.offer_mouse(i + 1);
        }
        if self.buf[2] == b'M' {
            if self.buf.len() < 6 {
                return Parse::Incomplete;
            }
            return self.offer_mouse(6);
        }

        // Find the final byte (0x40-0x7E), skipping parameters.
        let mut end = 2;
        while end < self.buf.len() {
            match self.buf[end] {
                b'0'..=b'9' | b';' => end += 1,
                _ => break,
            }
        }
        if end >= self.buf.len() {
            return Parse::Incomplete;
        }

        let final_byte = self.buf[end];
        let params: Vec<u16> = self.buf[2..end]
            .split(|&b| b == b';')
            .filter(|s| !s.is_empty())
            .map(|s| {
                std::str::from_utf8(s)
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(0)
            })
            .collect();
        let consumed = end + 1;

        let key = match final_byte {
            b'A' => Key::Up,
            b'B' => Key::Down,
            b'C' => Key::Right,
            b'D' => Key::Left,
            b'H' => Key::Home,
            b'F' => Key::End,
            b'Z' => Key::Tab, // Shift+Tab
            b'P' => Key::F(1),
            b'Q' => Key::F(2),
            b'S' => Key::F(4),
            b'R' => {
                // CSI R is both F3 and the cursor-position report; a report
                // always carries exactly two parameters.
                if params.len() == 2 {
                    self.consume(consumed);
                    return Parse::Event(Event::CursorReport {
                        row: params[0],
                        col: params[1],
                    });
                }
                Key::F(3)
            }
            b'u' => return self.parse_kitty(&params, consumed),
            b'~' => match params.first().copied().unwrap_or(0) {
                1 | 7 => Key::Home,
                2 => Key::Insert,
                3 => Key::Delete,
                4 | 8 => Key::End,
                5 => Key::PageUp,
                6 => Key::PageDown,
                15 => Key::F(5),
                17 => Key::F(6),
                18 => Key::F(7),
                19 => Key::F(8),
                20 => Key::F(9),
                21 => Key::F(10),
                23 => Key::F(11),
                24 => Key::F(12),
                _ => {
                    self.consume(consumed);
                    return Parse::Skip;
                }
            },
            // `ESC [ Pb ; Px ; Py M` lands here via the urxvt encoding; let
            // the mouse decoder reclaim the whole sequence.
            _ => return self.offer_mouse(consumed),
        };

        self.emit(key, consumed)
    }

    fn parse_ss3(&mut self) -> Parse {
        if self.buf.len() < 3 {
            return Parse::Incomplete;
        }
        let key = match self.buf[2] {
            b'A' => Key::Up,
            b'B' => Key::Down,
            b'C' => Key::Right,
            b'D' => Key::Left,
            b'H' => Key::Home,
            b'F' => Key::End,
            b'P' => Key::F(1),
            b'Q' => Key::F(2),
            b'R' => Key::F(3),
            b'S' => Key::F(4),
            _ => {
                self.consume(3);
                return Parse::Skip;
            }
        };
        self.emit(key, 3)
    }

    /// Kitty keyboard protocol: `CSI codepoint ; modifiers ; state u`.
    fn parse_kitty(&mut self, params: &[u16], consumed: usize) -> Parse {
        let codepoint = u32::from(params.first().copied().unwrap_or(0));
        let kind = if params.get(2) == Some(&3) {
            KeyEventKind::Release
        } else {
            KeyEventKind::Press
        };

        let key = match codepoint {
            9 => Key::Tab,
            13 => Key::Enter,
            27 => Key::Escape,
            32 => Key::Space,
            127 => Key::Backspace,
            cp => match char::from_u32(cp) {
                Some(ch) => Key::Char(ch),
                None => {
                    self.consume(consumed);
                    return Parse::Skip;
                }
            },
        };

        let raw = self.buf[..consumed].to_vec();
        self.consume(consumed);
        Parse::Event(Event::Key(KeyEvent { key, kind, raw }))
    }

    fn parse_utf8(&mut self) -> Parse {
        let first = self.buf[0];
        let expected_len = if first & 0xe0 == 0xc0 {
            2
        } else if first & 0xf0 == 0xe0 {
            3
        } else if first & 0xf8 == 0xf0 {
            4
        } else {
            self.buf.remove(0);
            return Parse::Skip;
        };

        if self.buf.len() < expected_len {
            return Parse::Incomplete;
        }

        match std::str::from_utf8(&self.buf[..expected_len]) {
            Ok(s) => {
                let ch = s.chars().next().unwrap_or('\u{fffd}');
                self.emit(Key::Char(ch), expected_len)
            }
            Err(_) => {
                self.buf.remove(0);
                Parse::Skip
            }
        }
    }

    /// Offer the buffered sequence to the mouse decoder. `seq_len` is the
    /// full extent of the sequence; if nobody claims it, the whole thing is
    /// discarded rather than leaking back into the stream byte by byte.
    fn offer_mouse(&mut self, seq_len: usize) -> Parse {
        let Some(mouse) = self.mouse.as_mut() else {
            self.consume(seq_len);
            return Parse::Skip;
        };
        match mouse.decode(&self.buf) {
            MouseDecode::Event { event, consumed } => {
                self.consume(consumed);
                Parse::Event(Event::Mouse(event))
            }
            MouseDecode::Incomplete => Parse::Incomplete,
            MouseDecode::NoMatch => {
                self.consume(seq_len);
                Parse::Skip
            }
        }
    }

    fn emit(&mut self, key: Key, n: usize) -> Parse {
        let raw = self.buf[..n].to_vec();
        self.consume(n);
        Parse::Event(Event::Key(KeyEvent::press(key, &raw)))
    }

    fn consume(&mut self, n: usize) {
        self.buf.drain(..n);
    }
}

impl Default for KeyboardDecoder {
    fn default() -> Self {
        Self::new()
    }
}
