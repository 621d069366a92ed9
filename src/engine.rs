//! Prompt engine: session lifecycle and the event loop.
//!
//! The engine owns the terminal for the duration of a session. `start`
//! switches into raw mode, enables the mouse protocol ladder and (inline
//! sessions) probes the cursor position; `stop` undoes all of it. In
//! between, bytes from stdin are decoded, broadcast on the bus, routed to
//! the active prompt, and every state change is funneled through the
//! debounced render scheduler.
//!
//! The engine is single threaded. The only other thread is the blocking
//! stdin reader, which hands bytes over a channel; decoding, dispatch and
//! painting all happen on the caller's thread inside [`Engine::run`].

use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::bus::{EventBus, Subscription};
use crate::error::{Error, Result};
use crate::input::{
    Event, KeyboardDecoder, MouseCapabilities, MouseDecoder, StdinMessage, StdinReader,
};
use crate::prompts::{ActivePrompt, Outcome, PromptConfig, PromptResult};
use crate::render::{RenderScheduler, SessionMode};
use crate::terminal::{ansi, Terminal};
use crate::theme::ThemeOverride;

/// Event-loop granularity; also the ceiling on tick latency.
const TICK: Duration = Duration::from_millis(10);

/// How long a lone ESC may sit in the decode buffer before it is flushed
/// as an Escape key press.
const ESCAPE_TIMEOUT: Duration = Duration::from_millis(10);

// =============================================================================
// Session options
// =============================================================================

/// Per-session screen behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOptions {
    /// Run on the private alternate screen instead of inline at the cursor.
    pub alternate_screen: bool,
    /// Erase the rendered block when the session ends instead of leaving
    /// the final summary line behind.
    pub clear_after: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self { alternate_screen: false, clear_after: false }
    }
}

impl SessionOptions {
    fn mode(&self) -> SessionMode {
        if self.alternate_screen { SessionMode::AltScreen } else { SessionMode::Inline }
    }
}

// =============================================================================
// Engine
// =============================================================================

/// Drives one prompt at a time over a [`Terminal`].
pub struct Engine<T: Terminal> {
    terminal: T,
    capabilities: MouseCapabilities,
    decoder: KeyboardDecoder,
    bus: EventBus,
    scheduler: RenderScheduler,
    options: SessionOptions,
    global_theme: Option<ThemeOverride>,
    active: Option<ActivePrompt>,
    outcome: Option<Outcome>,
    last_feed: Option<Instant>,
    /// One reader thread per session; it survives across `run` calls so a
    /// successor never contends for the stdin lock mid-flow.
    reader: Option<(StdinReader, Receiver<StdinMessage>)>,
    running: bool,
}

impl<T: Terminal> Engine<T> {
    pub fn new(terminal: T) -> Self {
        let capabilities = MouseCapabilities::detect();
        Self::with_capabilities(terminal, capabilities)
    }

    pub fn with_capabilities(terminal: T, capabilities: MouseCapabilities) -> Self {
        let mut decoder = KeyboardDecoder::new();
        decoder.attach_mouse(MouseDecoder::new());
        let options = SessionOptions::default();
        Self {
            terminal,
            capabilities,
            decoder,
            bus: EventBus::new(),
            scheduler: RenderScheduler::new(options.mode()),
            options,
            global_theme: None,
            active: None,
            outcome: None,
            last_feed: None,
            reader: None,
            running: false,
        }
    }

    pub fn with_options(mut self, options: SessionOptions) -> Self {
        self.options = options;
        self.scheduler = RenderScheduler::new(options.mode());
        self
    }

    /// Theme overrides applied to every prompt this engine runs, underneath
    /// any per-prompt overrides.
    pub fn set_global_theme(&mut self, theme: ThemeOverride) {
        self.global_theme = Some(theme);
    }

    pub fn subscribe<F>(&mut self, listener: F) -> Subscription
    where
        F: FnMut(&Event) -> std::result::Result<(), Error> + 'static,
    {
        self.bus.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, sub: Subscription) {
        self.bus.unsubscribe(sub);
    }

    pub fn terminal(&self) -> &T {
        &self.terminal
    }

    /// Absolute terminal row of the rendered block's first line, once known.
    pub fn origin_row(&self) -> Option<u16> {
        self.scheduler.origin_row()
    }

    // -------------------------------------------------------------------------
    // Session lifecycle
    // -------------------------------------------------------------------------

    /// Enter raw mode and arm the terminal. Idempotent.
    ///
    /// Escape-sequence writes here are capability probes: a terminal that
    /// rejects one gets the session anyway, minus that capability. Only a
    /// raw-mode toggle failure is surfaced.
    pub fn start(&mut self) -> Result<()> {
        if self.running {
            return Ok(());
        }
        self.terminal.enable_raw(true)?;

        let mut setup = String::new();
        setup.push_str(ansi::CURSOR_HIDE);
        if self.options.alternate_screen {
            setup.push_str(ansi::ALT_SCREEN_ENTER);
        }
        // Protocol ladder: every tier is requested and the terminal honors
        // what it supports. The coordinate format upgrade comes last.
        setup.push_str(ansi::MOUSE_BASIC_ON);
        setup.push_str(ansi::MOUSE_BUTTON_EVENT_ON);
        setup.push_str(ansi::MOUSE_ANY_EVENT_ON);
        if self.capabilities.supports_sgr {
            setup.push_str(ansi::MOUSE_SGR_ON);
        } else if self.capabilities.supports_urxvt {
            setup.push_str(ansi::MOUSE_URXVT_ON);
        }
        if let Err(err) = self.terminal.write_str(&setup) {
            warn!(%err, "terminal setup write failed");
        }

        self.probe_origin();
        // Raw mode is on at this point, so the session counts as started
        // even if the writes above failed; stop() must be able to undo it.
        self.running = true;
        debug!(
            alt = self.options.alternate_screen,
            sgr = self.capabilities.supports_sgr,
            "session started"
        );
        Ok(())
    }

    /// Restore the terminal. Idempotent; safe to call after a panic unwind.
    /// Raw mode is always disabled, even when the reset write fails.
    pub fn stop(&mut self) -> Result<()> {
        if !self.running {
            return Ok(());
        }
        self.running = false;
        self.active = None;
        if let Some((reader, _)) = self.reader.take() {
            reader.stop();
        }
        if let Err(err) = self.terminal.write_str(&ansi::reset_sequence()) {
            warn!(%err, "terminal reset write failed");
        }
        self.terminal.enable_raw(false)?;
        debug!("session stopped");
        Ok(())
    }

    /// Ask the terminal where the cursor is so inline mouse hit-testing can
    /// translate absolute rows. The reply arrives through the input stream
    /// as a cursor report.
    fn probe_origin(&mut self) {
        if self.options.alternate_screen || !self.terminal.is_tty() {
            return;
        }
        if let Err(err) = self.terminal.write_str(ansi::CURSOR_POSITION_QUERY) {
            // Hit-testing degrades to row 1; not fatal.
            warn!(%err, "cursor position probe failed");
        }
    }

    // -------------------------------------------------------------------------
    // Prompt activation and dispatch
    // -------------------------------------------------------------------------

    /// Install a prompt and paint its first frame.
    pub fn set_active(&mut self, prompt: ActivePrompt) -> Result<()> {
        prompt.borrow_mut().init();
        self.outcome = None;
        self.active = Some(prompt);
        self.repaint()
    }

    /// Decode and dispatch raw input bytes.
    pub fn feed(&mut self, bytes: &[u8]) -> Result<()> {
        self.last_feed = Some(Instant::now());
        let events = self.decoder.feed(bytes);
        self.dispatch(events)
    }

    /// The terminal outcome of the active prompt, if it has settled.
    pub fn take_outcome(&mut self) -> Option<Outcome> {
        self.outcome.take()
    }

    /// Timer edge: prompt animation, pending escape flush, debounced paint.
    pub fn tick(&mut self, now: Instant) -> Result<()> {
        if self.decoder.has_pending()
            && self
                .last_feed
                .is_some_and(|at| now.duration_since(at) >= ESCAPE_TIMEOUT)
        {
            let events = self.decoder.flush_pending();
            self.dispatch(events)?;
        }

        let mut repaint = false;
        if let Some(prompt) = &self.active {
            repaint = prompt.borrow_mut().tick(now);
        }
        if repaint {
            self.scheduler.request(now);
        }
        if self.scheduler.pending_due(now) {
            self.repaint()?;
        }
        Ok(())
    }

    fn dispatch(&mut self, events: Vec<Event>) -> Result<()> {
        for event in events {
            if let Event::CursorReport { row, .. } = event {
                self.scheduler.set_origin_from_report(row);
            }
            self.bus.emit(&event);

            let Some(prompt) = self.active.clone() else { continue };
            let outcome = match &event {
                Event::Key(key) => prompt.borrow_mut().handle_key(key),
                Event::Mouse(mouse) => {
                    let origin = self.scheduler.origin_row().unwrap_or(1);
                    prompt.borrow_mut().handle_mouse(mouse, origin)
                }
                Event::CursorReport { .. } => Outcome::Continue,
            };

            match outcome {
                Outcome::Continue => {
                    if self.scheduler.request(Instant::now()) {
                        self.repaint()?;
                    }
                }
                settled => {
                    self.outcome = Some(settled);
                    // Final frame shows the summary line immediately.
                    self.repaint()?;
                }
            }
        }
        Ok(())
    }

    fn repaint(&mut self) -> Result<()> {
        let Some(prompt) = self.active.clone() else { return Ok(()) };
        let lines = prompt.borrow().render();
        self.scheduler.paint(&mut self.terminal, &lines)?;
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Blocking run loop
    // -------------------------------------------------------------------------

    /// Run one prompt to completion: start the session if needed, pump
    /// stdin through the decoders, and return the settled result.
    pub fn run(&mut self, config: PromptConfig) -> Result<PromptResult> {
        let name = config.name().to_string();
        let prompt = config.into_prompt(self.global_theme.as_ref());

        self.start()?;
        self.set_active(prompt)?;

        // Exactly one thread reads stdin for the whole session. A per-run
        // reader would leave its predecessor parked inside a blocking read
        // holding the stdin lock, stealing the next prompt's first bytes.
        if self.reader.is_none() {
            self.reader = Some(StdinReader::spawn()?);
        }

        let result = loop {
            if let Some(outcome) = self.take_outcome() {
                self.scheduler.finish(&mut self.terminal, self.options.clear_after)?;
                break match outcome {
                    Outcome::Submit(value) => {
                        PromptResult { name, value: Some(value), cancelled: false }
                    }
                    _ => PromptResult { name, value: None, cancelled: true },
                };
            }
            let msg = match &self.reader {
                Some((_, input)) => input.recv_timeout(TICK),
                None => return Err(Error::InputClosed),
            };
            match msg {
                Ok(StdinMessage::Data(bytes)) => self.feed(&bytes)?,
                Ok(StdinMessage::Closed) | Err(RecvTimeoutError::Disconnected) => {
                    self.scheduler.finish(&mut self.terminal, self.options.clear_after)?;
                    self.stop()?;
                    return Err(Error::InputClosed);
                }
                Err(RecvTimeoutError::Timeout) => self.tick(Instant::now())?,
            }
        };
        self.active = None;
        Ok(result)
    }

    #[cfg(test)]
    pub(crate) fn set_reader(&mut self, pair: (StdinReader, Receiver<StdinMessage>)) {
        self.reader = Some(pair);
    }
}

impl<T: Terminal> Drop for Engine<T> {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::io;
    use std::rc::Rc;

    use super::*;
    use crate::prompts::{select, text, Answer, SelectOption};
    use crate::terminal::CaptureTerminal;

    /// A terminal whose raw-mode toggle works but every write fails.
    struct WriteFailTerminal {
        raw: bool,
    }

    impl Terminal for WriteFailTerminal {
        fn enable_raw(&mut self, enabled: bool) -> io::Result<()> {
            self.raw = enabled;
            Ok(())
        }

        fn write(&mut self, _bytes: &[u8]) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "terminal gone"))
        }

        fn size(&self) -> (u16, u16) {
            (80, 24)
        }

        fn is_tty(&self) -> bool {
            true
        }
    }

    fn sgr_caps() -> MouseCapabilities {
        MouseCapabilities {
            supports_sgr: true,
            supports_urxvt: true,
            supports_pixel: false,
            max_coordinates: u16::MAX,
        }
    }

    fn engine() -> Engine<CaptureTerminal> {
        Engine::with_capabilities(CaptureTerminal::new(), sgr_caps())
    }

    fn options() -> Vec<SelectOption> {
        vec![SelectOption::new("a", "Apple"), SelectOption::new("b", "Banana")]
    }

    fn active(config: impl Into<PromptConfig>) -> ActivePrompt {
        config.into().into_prompt(None)
    }

    #[test]
    fn test_start_enables_raw_hides_cursor_and_arms_mouse() {
        let mut e = engine();
        e.start().unwrap();
        let term = e.terminal();
        assert!(term.raw);
        assert_eq!(term.count_of("\x1b[?25l"), 1);
        for seq in ["\x1b[?1000h", "\x1b[?1002h", "\x1b[?1003h", "\x1b[?1006h"] {
            assert_eq!(term.count_of(seq), 1, "missing {seq:?}");
        }
        // SGR requested, so the urxvt tier is skipped.
        assert_eq!(term.count_of("\x1b[?1015h"), 0);
    }

    #[test]
    fn test_start_and_stop_are_idempotent() {
        let mut e = engine();
        e.start().unwrap();
        e.start().unwrap();
        assert_eq!(e.terminal().count_of("\x1b[?1000h"), 1);
        e.stop().unwrap();
        e.stop().unwrap();
        assert_eq!(e.terminal().count_of("\x1b[?1000l"), 1);
        assert!(!e.terminal().raw);
    }

    #[test]
    fn test_inline_start_probes_cursor_position() {
        let mut e = engine();
        e.start().unwrap();
        assert_eq!(e.terminal().count_of("\x1b[6n"), 1);
    }

    #[test]
    fn test_alt_screen_start_skips_probe_and_enters_alt() {
        let mut e = engine()
            .with_options(SessionOptions { alternate_screen: true, clear_after: false });
        e.start().unwrap();
        assert_eq!(e.terminal().count_of("\x1b[?1049h"), 1);
        assert_eq!(e.terminal().count_of("\x1b[6n"), 0);
        assert_eq!(e.origin_row(), Some(1));
    }

    #[test]
    fn test_cursor_report_sets_inline_origin() {
        let mut e = engine();
        e.start().unwrap();
        e.set_active(active(select("f", "Fruit?", options()))).unwrap();
        e.feed(b"\x1b[12;1R").unwrap();
        // One rendered block of 3 lines ending at row 12 starts at row 10.
        assert_eq!(e.origin_row(), Some(10));
    }

    #[test]
    fn test_set_active_paints_first_frame() {
        let mut e = engine();
        e.start().unwrap();
        e.set_active(active(select("f", "Fruit?", options()))).unwrap();
        let text = e.terminal().text();
        assert!(text.contains("Fruit?"));
        assert!(text.contains("Apple"));
    }

    #[test]
    fn test_key_submit_surfaces_outcome() {
        let mut e = engine();
        e.start().unwrap();
        e.set_active(active(select("f", "Fruit?", options()))).unwrap();
        e.feed(b"\x1b[B").unwrap(); // Down
        e.feed(b"\r").unwrap();
        assert_eq!(
            e.take_outcome(),
            Some(Outcome::Submit(Answer::String("b".into())))
        );
        assert_eq!(e.take_outcome(), None);
    }

    #[test]
    fn test_ctrl_c_cancels_and_stop_restores_terminal() {
        let mut e = engine();
        e.start().unwrap();
        e.set_active(active(text("name", "Name"))).unwrap();
        e.feed(&[0x03]).unwrap();
        assert_eq!(e.take_outcome(), Some(Outcome::Cancel));
        e.stop().unwrap();
        let term = e.terminal();
        assert!(!term.raw);
        assert_eq!(term.count_of("\x1b[?25h"), 1);
        assert_eq!(term.count_of("\x1b[?1000l"), 1);
    }

    #[test]
    fn test_mouse_events_reach_the_prompt() {
        let mut e = engine();
        e.start().unwrap();
        e.set_active(active(select("f", "Fruit?", options()))).unwrap();
        // Wheel down moves the cursor, then Enter submits the second option.
        e.feed(b"\x1b[<65;1;1M").unwrap();
        e.feed(b"\r").unwrap();
        assert_eq!(
            e.take_outcome(),
            Some(Outcome::Submit(Answer::String("b".into())))
        );
    }

    #[test]
    fn test_bus_sees_every_event() {
        let seen = Rc::new(RefCell::new(0usize));
        let counter = seen.clone();
        let mut e = engine();
        e.subscribe(move |_event| {
            *counter.borrow_mut() += 1;
            Ok(())
        });
        e.start().unwrap();
        e.set_active(active(text("name", "Name"))).unwrap();
        e.feed(b"hi").unwrap();
        e.feed(b"\x1b[<65;1;1M").unwrap();
        assert_eq!(*seen.borrow(), 3);
    }

    #[test]
    fn test_pending_escape_flushes_on_tick() {
        let mut e = engine();
        e.start().unwrap();
        e.set_active(active(text("name", "Name"))).unwrap();
        e.feed(b"\x1b").unwrap();
        assert_eq!(e.take_outcome(), None);
        e.tick(Instant::now() + Duration::from_millis(50)).unwrap();
        assert_eq!(e.take_outcome(), Some(Outcome::Cancel));
    }

    #[test]
    fn test_failed_setup_writes_do_not_wedge_raw_mode() {
        let mut e = Engine::with_capabilities(WriteFailTerminal { raw: false }, sgr_caps());
        e.start().unwrap();
        assert!(e.terminal().raw);
        // The reset write fails too, but raw mode still comes back off.
        e.stop().unwrap();
        assert!(!e.terminal().raw);
    }

    #[test]
    fn test_stop_releases_the_stdin_reader() {
        let mut e = engine();
        e.start().unwrap();
        e.set_reader(StdinReader::scripted(&[]));
        e.stop().unwrap();
        assert!(e.reader.is_none());
    }
}
