//! Yes/no confirmation state machine.

use crate::input::{Key, KeyEvent};
use crate::theme::Theme;

use super::{Answer, ConfirmConfig, Outcome, Prompt};

/// Binary confirmation prompt. `y`/`n` pick a choice and arrows, Tab and
/// Space flip the highlighted one; Enter submits.
pub struct ConfirmPrompt {
    name: String,
    message: String,
    value: bool,
    theme: Theme,
    done: bool,
}

impl ConfirmPrompt {
    pub fn new(config: ConfirmConfig, theme: Theme) -> Self {
        Self {
            name: config.name,
            message: config.message,
            value: config.initial,
            theme,
            done: false,
        }
    }

    pub fn value(&self) -> bool {
        self.value
    }

    fn submit(&mut self, value: bool) -> Outcome {
        self.value = value;
        self.done = true;
        Outcome::Submit(Answer::Bool(value))
    }

    fn choice_line(&self) -> String {
        let (yes, no) = if self.value {
            (self.theme.paint(&self.theme.accent, "Yes"), "No".to_string())
        } else {
            ("Yes".to_string(), self.theme.paint(&self.theme.accent, "No"))
        };
        format!("{yes} {} {no}", self.theme.paint(&self.theme.dim, "/"))
    }
}

impl Prompt for ConfirmPrompt {
    fn name(&self) -> &str {
        &self.name
    }

    fn render(&self) -> Vec<String> {
        if self.done {
            let shown = if self.value { "Yes" } else { "No" };
            return vec![format!(
                "{} {} {}",
                self.theme.paint(&self.theme.accent, &self.theme.done_pointer),
                self.message,
                self.theme.paint(&self.theme.dim, shown),
            )];
        }
        vec![format!(
            "{} {} {} {}",
            self.theme.paint(&self.theme.accent, "?"),
            self.message,
            self.theme.paint(&self.theme.dim, "›"),
            self.choice_line(),
        )]
    }

    fn handle_key(&mut self, event: &KeyEvent) -> Outcome {
        if self.done {
            return Outcome::Continue;
        }
        match &event.key {
            Key::Escape | Key::CtrlC => {
                self.done = true;
                Outcome::Cancel
            }
            Key::Char('y') | Key::Char('Y') => {
                self.value = true;
                Outcome::Continue
            }
            Key::Char('n') | Key::Char('N') => {
                self.value = false;
                Outcome::Continue
            }
            Key::Enter => self.submit(self.value),
            Key::Left | Key::Right | Key::Up | Key::Down | Key::Tab | Key::Space => {
                self.value = !self.value;
                Outcome::Continue
            }
            _ => Outcome::Continue,
        }
    }

    fn done(&self) -> bool {
        self.done
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompts::confirm;

    fn key(k: Key) -> KeyEvent {
        KeyEvent::press(k, &[])
    }

    fn prompt(initial: bool) -> ConfirmPrompt {
        ConfirmPrompt::new(confirm("ok", "Proceed?", initial), Theme::default_theme())
    }

    #[test]
    fn test_y_and_n_set_value_without_submitting() {
        let mut p = prompt(false);
        assert_eq!(p.handle_key(&key(Key::Char('y'))), Outcome::Continue);
        assert!(p.value());
        assert!(!p.done());
        assert_eq!(p.handle_key(&key(Key::Enter)), Outcome::Submit(Answer::Bool(true)));

        let mut p = prompt(true);
        assert_eq!(p.handle_key(&key(Key::Char('N'))), Outcome::Continue);
        assert_eq!(p.handle_key(&key(Key::Enter)), Outcome::Submit(Answer::Bool(false)));
    }

    #[test]
    fn test_enter_submits_highlighted_choice() {
        let mut p = prompt(true);
        assert_eq!(p.handle_key(&key(Key::Enter)), Outcome::Submit(Answer::Bool(true)));
    }

    #[test]
    fn test_arrows_and_tab_toggle() {
        let mut p = prompt(true);
        p.handle_key(&key(Key::Left));
        assert!(!p.value());
        p.handle_key(&key(Key::Tab));
        assert!(p.value());
        p.handle_key(&key(Key::Space));
        assert_eq!(p.handle_key(&key(Key::Enter)), Outcome::Submit(Answer::Bool(false)));
    }

    #[test]
    fn test_escape_cancels() {
        let mut p = prompt(false);
        assert_eq!(p.handle_key(&key(Key::Escape)), Outcome::Cancel);
        assert!(p.done());
        // No further transitions once settled.
        assert_eq!(p.handle_key(&key(Key::Char('y'))), Outcome::Continue);
    }

    #[test]
    fn test_render_highlights_current_choice() {
        let p = prompt(true);
        let line = &p.render()[0];
        assert!(line.contains("Yes"));
        assert!(line.contains("No"));
        assert!(line.contains("Proceed?"));
    }
}
