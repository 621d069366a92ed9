//! Free-text and password state machine.
//!
//! Grapheme-aware editing at a logical cursor, optional length cap, required
//! check and custom validation on submit, and a blinking cursor that pauses
//! while the user is typing. Password mode renders one mask glyph per
//! grapheme and never echoes the value.
//!
//! Text input only comes from single-`Char` key events. Composed input that
//! arrives as multiple scalar values is inserted scalar-by-scalar — a known
//! limitation inherited deliberately (see the test documenting it).

use std::time::{Duration, Instant};

use unicode_segmentation::UnicodeSegmentation;

use crate::input::{Key, KeyEvent};
use crate::theme::Theme;

use super::{Answer, Outcome, Prompt, TextConfig, Validator};

/// Cursor blink half-period.
pub const BLINK_INTERVAL: Duration = Duration::from_millis(530);

/// How long input must be quiet before blinking resumes.
pub const TYPING_QUIET: Duration = Duration::from_millis(400);

const REQUIRED_MESSAGE: &str = "This field is required";

/// Text / password prompt.
pub struct TextPrompt {
    name: String,
    message: String,
    placeholder: Option<String>,
    max_length: Option<usize>,
    required: bool,
    masked: bool,
    validate: Option<Validator>,
    theme: Theme,

    value: String,
    /// Logical cursor as a grapheme offset into `value`.
    cursor: usize,
    error: Option<String>,
    blink_visible: bool,
    last_input: Instant,
    last_blink: Instant,
    done: bool,
}

impl TextPrompt {
    pub fn new(config: TextConfig, theme: Theme) -> Self {
        let now = Instant::now();
        Self {
            name: config.name,
            message: config.message,
            placeholder: config.placeholder,
            max_length: config.max_length,
            required: config.required,
            masked: config.masked,
            validate: config.validate,
            theme,
            value: String::new(),
            cursor: 0,
            error: None,
            blink_visible: true,
            last_input: now,
            last_blink: now,
            done: false,
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    // -------------------------------------------------------------------------
    // Editing
    // -------------------------------------------------------------------------

    fn grapheme_count(&self) -> usize {
        self.value.graphemes(true).count()
    }

    /// Byte offset of the grapheme boundary at logical position `pos`.
    fn byte_at(&self, pos: usize) -> usize {
        self.value
            .grapheme_indices(true)
            .nth(pos)
            .map(|(i, _)| i)
            .unwrap_or(self.value.len())
    }

    fn insert(&mut self, ch: char) {
        if let Some(max) = self.max_length {
            if self.grapheme_count() >= max {
                return; // refuse further insertion
            }
        }
        let at = self.byte_at(self.cursor);
        self.value.insert(at, ch);
        // A combining scalar merges into the previous grapheme, so the
        // logical position may not have grown.
        self.cursor = (self.cursor + 1).min(self.grapheme_count());
        self.error = None;
    }

    fn delete_before_cursor(&mut self) {
        if self.cursor == 0 {
            return;
        }
        let start = self.byte_at(self.cursor - 1);
        let end = self.byte_at(self.cursor);
        self.value.replace_range(start..end, "");
        self.cursor -= 1;
        self.error = None;
    }

    fn delete_at_cursor(&mut self) {
        if self.cursor >= self.grapheme_count() {
            return;
        }
        let start = self.byte_at(self.cursor);
        let end = self.byte_at(self.cursor + 1);
        self.value.replace_range(start..end, "");
        self.error = None;
    }

    fn submit(&mut self) -> Outcome {
        if self.required && self.value.trim().is_empty() {
            self.error = Some(REQUIRED_MESSAGE.to_string());
            return Outcome::Continue;
        }
        if let Some(validate) = &self.validate {
            if let Err(message) = validate(&self.value) {
                self.error = Some(message);
                return Outcome::Continue;
            }
        }
        self.done = true;
        Outcome::Submit(Answer::String(self.value.clone()))
    }

    fn note_activity(&mut self) {
        self.last_input = Instant::now();
        self.blink_visible = true;
    }

    // -------------------------------------------------------------------------
    // Rendering
    // -------------------------------------------------------------------------

    /// The value as displayed: masked one glyph per grapheme, or verbatim.
    fn display_value(&self) -> String {
        if self.masked {
            std::iter::repeat(self.theme.mask)
                .take(self.grapheme_count())
                .collect()
        } else {
            self.value.clone()
        }
    }

    /// Display string with the cursor cell inverted when visible.
    fn value_with_cursor(&self) -> String {
        let shown = self.display_value();
        if !self.blink_visible {
            return shown;
        }
        let graphemes: Vec<&str> = shown.graphemes(true).collect();
        let mut out = String::new();
        for (i, g) in graphemes.iter().enumerate() {
            if i == self.cursor {
                out.push_str(&format!("\x1b[7m{g}\x1b[27m"));
            } else {
                out.push_str(g);
            }
        }
        if self.cursor >= graphemes.len() {
            out.push_str("\x1b[7m \x1b[27m");
        }
        out
    }
}

impl Prompt for TextPrompt {
    fn name(&self) -> &str {
        &self.name
    }

    fn render(&self) -> Vec<String> {
        if self.done {
            return vec![format!(
                "{} {} {}",
                self.theme.paint(&self.theme.accent, &self.theme.done_pointer),
                self.message,
                self.theme.paint(&self.theme.dim, &self.display_value()),
            )];
        }

        let body = if self.value.is_empty() {
            match &self.placeholder {
                Some(p) if !self.blink_visible => self.theme.paint(&self.theme.dim, p),
                Some(p) => format!("\x1b[7m{}\x1b[27m{}", " ", self.theme.paint(&self.theme.dim, p)),
                None => self.value_with_cursor(),
            }
        } else {
            self.value_with_cursor()
        };

        let mut lines = vec![format!(
            "{} {} {} {}",
            self.theme.paint(&self.theme.accent, "?"),
            self.message,
            self.theme.paint(&self.theme.dim, "›"),
            body,
        )];

        if let Some(error) = &self.error {
            lines.push(format!(
                "{} {}",
                self.theme.paint(&self.theme.error, &self.theme.error_prefix),
                self.theme.paint(&self.theme.error, error),
            ));
        }

        lines
    }

    fn handle_key(&mut self, event: &KeyEvent) -> Outcome {
        if self.done {
            return Outcome::Continue;
        }
        self.note_activity();

        match &event.key {
            Key::Escape | Key::CtrlC => {
                self.done = true;
                Outcome::Cancel
            }
            Key::Enter => self.submit(),
            Key::Backspace => {
                self.delete_before_cursor();
                Outcome::Continue
            }
            Key::Delete => {
                self.delete_at_cursor();
                Outcome::Continue
            }
            Key::Left => {
                self.cursor = self.cursor.saturating_sub(1);
                Outcome::Continue
            }
            Key::Right => {
                self.cursor = (self.cursor + 1).min(self.grapheme_count());
                Outcome::Continue
            }
            Key::Home => {
                self.cursor = 0;
                Outcome::Continue
            }
            Key::End => {
                self.cursor = self.grapheme_count();
                Outcome::Continue
            }
            Key::Space => {
                self.insert(' ');
                Outcome::Continue
            }
            Key::Char(c) => {
                self.insert(*c);
                Outcome::Continue
            }
            _ => Outcome::Continue,
        }
    }

    fn tick(&mut self, now: Instant) -> bool {
        if self.done {
            return false;
        }
        // While typing, the cursor holds steady and visible; blinking
        // resumes once input quiets down.
        if now.duration_since(self.last_input) < TYPING_QUIET {
            self.last_blink = now;
            if !self.blink_visible {
                self.blink_visible = true;
                return true;
            }
            return false;
        }
        if now.duration_since(self.last_blink) >= BLINK_INTERVAL {
            self.blink_visible = !self.blink_visible;
            self.last_blink = now;
            return true;
        }
        false
    }

    fn done(&self) -> bool {
        self.done
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompts::{password, text};

    fn key(k: Key) -> KeyEvent {
        KeyEvent::press(k, &[])
    }

    fn prompt(config: TextConfig) -> TextPrompt {
        TextPrompt::new(config, Theme::default_theme())
    }

    fn type_str(p: &mut TextPrompt, s: &str) {
        for c in s.chars() {
            p.handle_key(&key(Key::Char(c)));
        }
    }

    #[test]
    fn test_typing_and_submit() {
        let mut p = prompt(text("name", "Your name"));
        type_str(&mut p, "ada");
        assert_eq!(
            p.handle_key(&key(Key::Enter)),
            Outcome::Submit(Answer::String("ada".into()))
        );
        assert!(p.done());
    }

    #[test]
    fn test_required_empty_sets_error_and_does_not_submit() {
        let mut p = prompt(text("name", "Your name").required(true));
        assert_eq!(p.handle_key(&key(Key::Enter)), Outcome::Continue);
        assert!(p.error().is_some_and(|e| !e.is_empty()));
        assert!(!p.done());
        // Whitespace-only is still empty after trimming.
        p.handle_key(&key(Key::Space));
        assert_eq!(p.handle_key(&key(Key::Enter)), Outcome::Continue);
        assert!(p.error().is_some());
    }

    #[test]
    fn test_validator_blocks_with_message() {
        let mut p = prompt(
            text("port", "Port").validate(|v| {
                v.parse::<u16>().map(|_| ()).map_err(|_| "not a port number".to_string())
            }),
        );
        type_str(&mut p, "abc");
        assert_eq!(p.handle_key(&key(Key::Enter)), Outcome::Continue);
        assert_eq!(p.error(), Some("not a port number"));

        // Editing clears the error; a valid value passes.
        for _ in 0..3 {
            p.handle_key(&key(Key::Backspace));
        }
        type_str(&mut p, "8080");
        assert_eq!(
            p.handle_key(&key(Key::Enter)),
            Outcome::Submit(Answer::String("8080".into()))
        );
    }

    #[test]
    fn test_max_length_refuses_insertion() {
        let mut p = prompt(text("code", "Code").max_length(3));
        type_str(&mut p, "abcdef");
        assert_eq!(p.value(), "abc");
    }

    #[test]
    fn test_cursor_editing_in_middle() {
        let mut p = prompt(text("t", "T"));
        type_str(&mut p, "ac");
        p.handle_key(&key(Key::Left));
        p.handle_key(&key(Key::Char('b')));
        assert_eq!(p.value(), "abc");
        p.handle_key(&key(Key::Delete));
        assert_eq!(p.value(), "ab");
        p.handle_key(&key(Key::Backspace));
        assert_eq!(p.value(), "a");
    }

    #[test]
    fn test_backspace_removes_whole_grapheme() {
        let mut p = prompt(text("t", "T"));
        type_str(&mut p, "a日");
        p.handle_key(&key(Key::Backspace));
        assert_eq!(p.value(), "a");
    }

    #[test]
    fn test_password_masks_and_never_echoes() {
        let mut p = prompt(password("pw", "Password"));
        type_str(&mut p, "hunter2");
        let rendered = p.render().join("\n");
        assert!(!rendered.contains("hunter2"));
        assert!(!rendered.contains('h'));
        assert_eq!(rendered.matches('•').count(), 7);
        // The submitted answer is still the raw value.
        assert_eq!(
            p.handle_key(&key(Key::Enter)),
            Outcome::Submit(Answer::String("hunter2".into()))
        );
    }

    #[test]
    fn test_placeholder_shown_when_empty() {
        let p = prompt(text("t", "T").placeholder("type here"));
        assert!(p.render()[0].contains("type here"));
    }

    #[test]
    fn test_blink_pauses_while_typing_and_resumes_after_quiet() {
        let mut p = prompt(text("t", "T"));
        let t0 = Instant::now();
        p.handle_key(&key(Key::Char('a')));

        // Within the quiet window: no toggle, cursor stays visible.
        assert!(!p.tick(t0 + Duration::from_millis(100)));
        assert!(p.blink_visible);

        // After quiet + interval: toggles off, then back on.
        let later = t0 + TYPING_QUIET + BLINK_INTERVAL + Duration::from_millis(600);
        assert!(p.tick(later));
        assert!(!p.blink_visible);
        assert!(p.tick(later + BLINK_INTERVAL));
        assert!(p.blink_visible);
    }

    #[test]
    fn test_escape_cancels_and_done_is_monotonic() {
        let mut p = prompt(text("t", "T"));
        assert_eq!(p.handle_key(&key(Key::Escape)), Outcome::Cancel);
        assert!(p.done());
        p.handle_key(&key(Key::Char('x')));
        assert_eq!(p.value(), "");
        assert!(!p.tick(Instant::now() + Duration::from_secs(5)));
    }

    #[test]
    fn test_combining_scalars_insert_individually() {
        // Composed input arriving as separate scalar values is inserted
        // scalar-by-scalar; "e" + U+0301 still ends up as one grapheme.
        // Preserved limitation: no input-method composition handling.
        let mut p = prompt(text("t", "T"));
        p.handle_key(&key(Key::Char('e')));
        p.handle_key(&key(Key::Char('\u{301}')));
        assert_eq!(p.value(), "e\u{301}");
        assert_eq!(p.grapheme_count(), 1);
        p.handle_key(&key(Key::Backspace));
        assert_eq!(p.value(), "");
    }
}
