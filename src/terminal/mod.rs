//! Terminal I/O adapter.
//!
//! The one place that touches the real terminal. Everything above it
//! (decoders, engine, prompts, renderer) receives a `Terminal` reference at
//! construction — there is no global terminal handle.
//!
//! - [`Terminal`] — the adapter contract
//! - [`StdTerminal`] — stdout + crossterm raw-mode implementation
//! - [`CaptureTerminal`] — in-memory double for tests and non-tty hosts

use std::io::{self, Write};

pub mod ansi;
pub mod output;

pub use output::OutputBuffer;

// =============================================================================
// Contract
// =============================================================================

/// Terminal adapter contract.
///
/// Raw-mode toggling must be idempotent and must only take effect when the
/// process's input stream is a real terminal; callers are expected to check
/// [`Terminal::is_tty`] before relying on raw input.
pub trait Terminal {
    /// Enable or disable raw mode. Idempotent; a no-op off-tty.
    fn enable_raw(&mut self, enabled: bool) -> io::Result<()>;

    /// Write bytes followed by an unbuffered flush.
    fn write(&mut self, bytes: &[u8]) -> io::Result<()>;

    /// Terminal size as (cols, rows). Falls back to 80x24 off-tty.
    fn size(&self) -> (u16, u16);

    /// Whether the input stream is an interactive terminal.
    fn is_tty(&self) -> bool;

    /// Write a string slice; convenience over [`Terminal::write`].
    fn write_str(&mut self, s: &str) -> io::Result<()> {
        self.write(s.as_bytes())
    }
}

// =============================================================================
// StdTerminal
// =============================================================================

/// The real terminal: stdout writes, crossterm raw-mode and size queries.
pub struct StdTerminal {
    raw: bool,
}

impl StdTerminal {
    pub fn new() -> Self {
        Self { raw: false }
    }
}

impl Default for StdTerminal {
    fn default() -> Self {
        Self::new()
    }
}

impl Terminal for StdTerminal {
    fn enable_raw(&mut self, enabled: bool) -> io::Result<()> {
        if !self.is_tty() || self.raw == enabled {
            return Ok(());
        }
        if enabled {
            crossterm::terminal::enable_raw_mode()?;
        } else {
            crossterm::terminal::disable_raw_mode()?;
        }
        self.raw = enabled;
        Ok(())
    }

    fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
        let mut stdout = io::stdout().lock();
        stdout.write_all(bytes)?;
        stdout.flush()
    }

    fn size(&self) -> (u16, u16) {
        crossterm::terminal::size().unwrap_or((80, 24))
    }

    fn is_tty(&self) -> bool {
        use crossterm::tty::IsTty;
        io::stdin().is_tty()
    }
}

impl Drop for StdTerminal {
    fn drop(&mut self) {
        // Leaving raw mode enabled would wedge the host shell.
        let _ = self.enable_raw(false);
    }
}

// =============================================================================
// CaptureTerminal
// =============================================================================

/// An in-memory terminal that records every write.
///
/// Used by the crate's own tests and useful to hosts that drive prompts from
/// scripted input.
pub struct CaptureTerminal {
    pub written: Vec<u8>,
    pub raw: bool,
    size: (u16, u16),
    tty: bool,
}

impl CaptureTerminal {
    pub fn new() -> Self {
        Self::with_size(80, 24)
    }

    pub fn with_size(cols: u16, rows: u16) -> Self {
        Self {
            written: Vec::new(),
            raw: false,
            size: (cols, rows),
            tty: true,
        }
    }

    /// Pretend not to be a terminal (exercises the off-tty paths).
    pub fn not_a_tty(mut self) -> Self {
        self.tty = false;
        self
    }

    /// Everything written so far, lossily decoded.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.written).into_owned()
    }

    /// Number of writes containing the given sequence.
    pub fn count_of(&self, needle: &str) -> usize {
        let hay = self.text();
        hay.match_indices(needle).count()
    }
}

impl Default for CaptureTerminal {
    fn default() -> Self {
        Self::new()
    }
}

impl Terminal for CaptureTerminal {
    fn enable_raw(&mut self, enabled: bool) -> io::Result<()> {
        if self.tty {
            self.raw = enabled;
        }
        Ok(())
    }

    fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.written.extend_from_slice(bytes);
        Ok(())
    }

    fn size(&self) -> (u16, u16) {
        self.size
    }

    fn is_tty(&self) -> bool {
        self.tty
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_records_writes() {
        let mut term = CaptureTerminal::new();
        term.write_str("hello").unwrap();
        term.write(b" world").unwrap();
        assert_eq!(term.text(), "hello world");
    }

    #[test]
    fn test_raw_mode_noop_off_tty() {
        let mut term = CaptureTerminal::new().not_a_tty();
        term.enable_raw(true).unwrap();
        assert!(!term.raw);
    }

    #[test]
    fn test_raw_mode_tracks_on_tty() {
        let mut term = CaptureTerminal::new();
        term.enable_raw(true).unwrap();
        assert!(term.raw);
        term.enable_raw(false).unwrap();
        assert!(!term.raw);
    }
}
