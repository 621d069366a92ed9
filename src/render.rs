//! Render scheduling: declarative lines → minimal terminal writes.
//!
//! Prompts describe their screen as an ordered list of lines; the scheduler
//! decides when and how those lines hit the terminal.
//!
//! - Debounce: a request inside the debounce window (~16 ms) of the previous
//!   paint sets a single `pending` flag instead of painting; the engine tick
//!   flushes it once, so a burst of key repeats becomes one paint that shows
//!   the latest state.
//! - Reentrancy guard: a request while a paint is physically writing also
//!   just sets `pending`; the in-flight paint re-checks the flag when it
//!   finishes and repaints at most once. No recursion, no double paint.
//! - Two strategies: alternate-screen sessions clear and rewrite the whole
//!   private screen; inline sessions save the cursor on first paint, then
//!   restore + clear-below + rewrite so scrollback above stays untouched.

use std::io;
use std::time::{Duration, Instant};

use unicode_width::UnicodeWidthChar;

use crate::terminal::{ansi, OutputBuffer, Terminal};

/// How the session occupies the screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionMode {
    /// Private alternate screen buffer; paint = clear + home + rewrite.
    AltScreen,
    /// Normal buffer; paint = restore saved cursor + clear below + rewrite.
    Inline,
}

/// Default debounce window.
pub const DEBOUNCE: Duration = Duration::from_millis(16);

/// Per-prompt render scheduler.
pub struct RenderScheduler {
    mode: SessionMode,
    debounce: Duration,
    last_paint: Option<Instant>,
    pending: bool,
    painting: bool,
    cursor_saved: bool,
    painted_lines: u16,
    origin_row: Option<u16>,
}

impl RenderScheduler {
    pub fn new(mode: SessionMode) -> Self {
        Self {
            mode,
            debounce: DEBOUNCE,
            last_paint: None,
            pending: false,
            painting: false,
            cursor_saved: false,
            painted_lines: 0,
            origin_row: match mode {
                SessionMode::AltScreen => Some(1),
                SessionMode::Inline => None,
            },
        }
    }

    pub fn with_debounce(mut self, window: Duration) -> Self {
        self.debounce = window;
        self
    }

    pub fn mode(&self) -> SessionMode {
        self.mode
    }

    /// Ask to paint. `true` means paint now; `false` means the request was
    /// coalesced into the pending slot and the engine tick will flush it.
    pub fn request(&mut self, now: Instant) -> bool {
        if self.painting {
            self.pending = true;
            return false;
        }
        if let Some(last) = self.last_paint {
            if now.duration_since(last) < self.debounce {
                self.pending = true;
                return false;
            }
        }
        true
    }

    /// Whether a deferred request is due for flushing.
    pub fn pending_due(&self, now: Instant) -> bool {
        if !self.pending || self.painting {
            return false;
        }
        match self.last_paint {
            Some(last) => now.duration_since(last) >= self.debounce,
            None => true,
        }
    }

    /// Absolute 1-based terminal row of the rendered block's first line, if
    /// known. Alt-screen sessions always start at row 1; inline sessions
    /// learn it from a cursor-position report.
    pub fn origin_row(&self) -> Option<u16> {
        self.origin_row
    }

    /// Record the cursor row reported right after a paint; the cursor sits
    /// on the block's last line then.
    pub fn set_origin_from_report(&mut self, cursor_row: u16) {
        let lines = self.painted_lines.max(1);
        self.origin_row = Some(cursor_row.saturating_sub(lines - 1).max(1));
    }

    /// Number of lines the last paint wrote.
    pub fn painted_lines(&self) -> u16 {
        self.painted_lines
    }

    /// Physically write the given lines.
    pub fn paint<T: Terminal>(&mut self, term: &mut T, lines: &[String]) -> io::Result<()> {
        self.painting = true;
        let result = self.paint_once(term, lines);
        self.painting = false;
        self.last_paint = Some(Instant::now());

        // A request that arrived mid-write parked itself in the pending
        // slot; honor it exactly once.
        if std::mem::take(&mut self.pending) && result.is_ok() {
            return self.paint_once(term, lines);
        }
        self.pending = false;
        result
    }

    fn paint_once<T: Terminal>(&mut self, term: &mut T, lines: &[String]) -> io::Result<()> {
        let (cols, _) = term.size();
        let mut out = OutputBuffer::new();

        match self.mode {
            SessionMode::AltScreen => {
                out.write_str(ansi::CLEAR_SCREEN);
                out.write_str(ansi::CURSOR_HOME);
            }
            SessionMode::Inline => {
                if self.cursor_saved {
                    out.write_str(ansi::CURSOR_RESTORE);
                    out.write_str(ansi::CLEAR_DOWN);
                } else {
                    out.write_str(ansi::CURSOR_SAVE);
                    self.cursor_saved = true;
                }
            }
        }

        for (i, line) in lines.iter().enumerate() {
            if i > 0 {
                out.write_str("\r\n");
            }
            out.write_str(&fit_line(line, cols));
        }

        term.write(out.as_bytes())?;
        self.painted_lines = lines.len() as u16;
        Ok(())
    }

    /// Final write when the prompt completes. Inline sessions either erase
    /// the rendered block or leave the last frame and move past it.
    pub fn finish<T: Terminal>(&mut self, term: &mut T, clear_after: bool) -> io::Result<()> {
        if self.mode == SessionMode::Inline && self.cursor_saved {
            if clear_after {
                let mut out = OutputBuffer::new();
                out.write_str(ansi::CURSOR_RESTORE);
                out.write_str(ansi::CLEAR_DOWN);
                term.write(out.as_bytes())?;
            } else {
                term.write_str("\r\n")?;
            }
        }
        self.cursor_saved = false;
        self.last_paint = None;
        self.pending = false;
        self.painted_lines = 0;
        Ok(())
    }
}

/// Truncate a line to `cols` display cells, skipping ANSI escape sequences
/// when counting width. Styled lines keep their styling; a reset is appended
/// if anything was cut.
pub fn fit_line(line: &str, cols: u16) -> String {
    let cols = usize::from(cols.max(1));
    let mut width = 0usize;
    let mut out = String::with_capacity(line.len());
    let mut chars = line.chars().peekable();
    let mut truncated = false;

    while let Some(ch) = chars.next() {
        if ch == '\x1b' {
            out.push(ch);
            if chars.peek() == Some(&'[') {
                for esc in chars.by_ref() {
                    out.push(esc);
                    if ('\u{40}'..='\u{7e}').contains(&esc) && esc != '[' {
                        break;
                    }
                }
            }
            continue;
        }
        let w = ch.width().unwrap_or(0);
        if width + w > cols {
            truncated = true;
            break;
        }
        width += w;
        out.push(ch);
    }

    if truncated && line.contains('\x1b') {
        out.push_str(ansi::STYLE_RESET);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terminal::CaptureTerminal;

    fn lines(strs: &[&str]) -> Vec<String> {
        strs.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_debounce_coalesces_burst_into_one_paint() {
        let mut term = CaptureTerminal::new();
        let mut sched = RenderScheduler::new(SessionMode::AltScreen);
        let t0 = Instant::now();

        assert!(sched.request(t0));
        sched.paint(&mut term, &lines(&["frame 1"])).unwrap();

        // Two requests inside the window: both defer, one pending slot.
        assert!(!sched.request(t0 + Duration::from_millis(1)));
        assert!(!sched.request(t0 + Duration::from_millis(5)));
        assert!(!sched.pending_due(t0 + Duration::from_millis(5)));

        // After the window, exactly one flush is due.
        let later = t0 + Duration::from_secs(1);
        assert!(sched.pending_due(later));
        sched.paint(&mut term, &lines(&["frame 3"])).unwrap();
        assert!(!sched.pending_due(later));

        // Two physical paints total, and the second shows the latest state.
        assert_eq!(term.count_of("\x1b[2J"), 2);
        assert!(term.text().contains("frame 3"));
        assert!(!term.text().contains("frame 2"));
    }

    #[test]
    fn test_alt_screen_paint_clears_and_homes() {
        let mut term = CaptureTerminal::new();
        let mut sched = RenderScheduler::new(SessionMode::AltScreen);
        sched.paint(&mut term, &lines(&["a", "b"])).unwrap();
        assert!(term.text().starts_with("\x1b[2J\x1b[H"));
        assert!(term.text().contains("a\r\nb"));
        assert_eq!(sched.origin_row(), Some(1));
    }

    #[test]
    fn test_inline_saves_then_restores_cursor() {
        let mut term = CaptureTerminal::new();
        let mut sched = RenderScheduler::new(SessionMode::Inline);
        sched.paint(&mut term, &lines(&["one"])).unwrap();
        assert!(term.text().starts_with(ansi::CURSOR_SAVE));

        sched.paint(&mut term, &lines(&["two"])).unwrap();
        let text = term.text();
        assert!(text.contains(ansi::CURSOR_RESTORE));
        assert!(text.contains(ansi::CLEAR_DOWN));
        assert_eq!(term.count_of(ansi::CURSOR_SAVE), 1);
    }

    #[test]
    fn test_finish_clear_after_erases_block() {
        let mut term = CaptureTerminal::new();
        let mut sched = RenderScheduler::new(SessionMode::Inline);
        sched.paint(&mut term, &lines(&["gone"])).unwrap();
        sched.finish(&mut term, true).unwrap();
        assert!(term.text().ends_with(&format!(
            "{}{}",
            ansi::CURSOR_RESTORE,
            ansi::CLEAR_DOWN
        )));
    }

    #[test]
    fn test_finish_keep_frame_emits_newline() {
        let mut term = CaptureTerminal::new();
        let mut sched = RenderScheduler::new(SessionMode::Inline);
        sched.paint(&mut term, &lines(&["kept"])).unwrap();
        sched.finish(&mut term, false).unwrap();
        assert!(term.text().ends_with("\r\n"));
    }

    #[test]
    fn test_origin_from_cursor_report() {
        let mut term = CaptureTerminal::new();
        let mut sched = RenderScheduler::new(SessionMode::Inline);
        sched.paint(&mut term, &lines(&["a", "b", "c"])).unwrap();
        // Cursor reported on row 12 = last of 3 lines → block starts at 10.
        sched.set_origin_from_report(12);
        assert_eq!(sched.origin_row(), Some(10));
    }

    #[test]
    fn test_fit_line_skips_escape_sequences() {
        let styled = "\x1b[36mhello\x1b[0m world";
        assert_eq!(fit_line(styled, 80), styled);
        let cut = fit_line(styled, 7);
        assert!(cut.contains("hello"));
        assert!(cut.ends_with(ansi::STYLE_RESET));
    }

    #[test]
    fn test_fit_line_counts_wide_chars() {
        // CJK chars are two cells wide.
        assert_eq!(fit_line("日本語", 4), "日本");
    }
}
