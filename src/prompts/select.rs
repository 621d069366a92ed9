//! Select and multiselect state machines.
//!
//! One machine serves both kinds; multiselect adds a checked-index set and
//! changes what Space and Enter mean. State is a *filtered view*: the full
//! option list intersected with a live search query, plus a selection cursor
//! into that view. The cursor clamps at the bounds (no wraparound) and
//! pagination windows the view around it.

use std::collections::BTreeSet;

use crate::input::{Key, KeyEvent, MouseButton, MouseEvent, MouseEventKind};
use crate::theme::Theme;

use super::{Answer, MultiSelectConfig, Outcome, Prompt, SelectConfig};

// =============================================================================
// Options
// =============================================================================

/// One selectable entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
    pub description: Option<String>,
    /// Disabled options stay navigable but cannot be chosen.
    pub disabled: bool,
}

impl SelectOption {
    pub fn new(value: &str, label: &str) -> Self {
        Self {
            value: value.to_string(),
            label: label.to_string(),
            description: None,
            disabled: false,
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    pub fn disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }
}

// =============================================================================
// State machine
// =============================================================================

/// Select / multiselect prompt.
pub struct SelectPrompt {
    name: String,
    message: String,
    options: Vec<SelectOption>,
    page_size: usize,
    theme: Theme,
    multi: bool,

    /// Live search query.
    query: String,
    /// Indices into `options` that match the query, in option order.
    filtered: Vec<usize>,
    /// Cursor position within `filtered`.
    cursor: usize,
    /// Checked entries (multiselect), as indices into the FULL option list —
    /// selection follows option identity, not filtered position, so choices
    /// survive a search round-trip.
    selected: BTreeSet<usize>,
    done: bool,
    answer: Option<Answer>,
}

impl SelectPrompt {
    pub fn single(config: SelectConfig, theme: Theme) -> Self {
        Self::build(
            config.name,
            config.message,
            config.options,
            config.page_size,
            theme,
            false,
        )
    }

    pub fn multi(config: MultiSelectConfig, theme: Theme) -> Self {
        Self::build(
            config.name,
            config.message,
            config.options,
            config.page_size,
            theme,
            true,
        )
    }

    fn build(
        name: String,
        message: String,
        options: Vec<SelectOption>,
        page_size: usize,
        theme: Theme,
        multi: bool,
    ) -> Self {
        let filtered = (0..options.len()).collect();
        Self {
            name,
            message,
            options,
            page_size: page_size.max(1),
            theme,
            multi,
            query: String::new(),
            filtered,
            cursor: 0,
            selected: BTreeSet::new(),
            done: false,
            answer: None,
        }
    }

    // -------------------------------------------------------------------------
    // View maintenance
    // -------------------------------------------------------------------------

    /// Recompute the filtered view: case-insensitive substring match over
    /// label and description. Resets the cursor; the selected set is keyed
    /// by option identity and needs no remapping.
    fn refilter(&mut self) {
        let needle = self.query.to_lowercase();
        self.filtered = self
            .options
            .iter()
            .enumerate()
            .filter(|(_, opt)| {
                needle.is_empty()
                    || opt.label.to_lowercase().contains(&needle)
                    || opt
                        .description
                        .as_ref()
                        .is_some_and(|d| d.to_lowercase().contains(&needle))
            })
            .map(|(i, _)| i)
            .collect();
        self.cursor = 0;
    }

    fn move_cursor(&mut self, delta: isize) {
        if self.filtered.is_empty() {
            self.cursor = 0;
            return;
        }
        let max = self.filtered.len() - 1;
        let next = self.cursor as isize + delta;
        self.cursor = next.clamp(0, max as isize) as usize;
    }

    /// First visible row of the current page.
    fn page_start(&self) -> usize {
        (self.cursor / self.page_size) * self.page_size
    }

    fn visible(&self) -> &[usize] {
        let start = self.page_start().min(self.filtered.len());
        let end = (start + self.page_size).min(self.filtered.len());
        &self.filtered[start..end]
    }

    // -------------------------------------------------------------------------
    // Transitions
    // -------------------------------------------------------------------------

    fn toggle_at_cursor(&mut self) {
        let Some(&idx) = self.filtered.get(self.cursor) else {
            return;
        };
        if self.options[idx].disabled {
            return;
        }
        if !self.selected.remove(&idx) {
            self.selected.insert(idx);
        }
    }

    /// Single-select submission of the option under the cursor.
    fn submit_cursor(&mut self) -> Outcome {
        let Some(&idx) = self.filtered.get(self.cursor) else {
            return Outcome::Continue;
        };
        if self.options[idx].disabled {
            return Outcome::Continue;
        }
        let answer = Answer::String(self.options[idx].value.clone());
        self.finish(answer)
    }

    /// Multiselect submission: values of checked entries still visible in
    /// the filtered view, in option order. Checked entries hidden by the
    /// current query are dropped, not silently kept.
    fn submit_selected(&mut self) -> Outcome {
        let values: Vec<String> = self
            .filtered
            .iter()
            .filter(|idx| self.selected.contains(idx))
            .map(|&idx| self.options[idx].value.clone())
            .collect();
        self.finish(Answer::List(values))
    }

    fn finish(&mut self, answer: Answer) -> Outcome {
        self.done = true;
        self.answer = Some(answer.clone());
        Outcome::Submit(answer)
    }

    // -------------------------------------------------------------------------
    // Mouse mapping
    // -------------------------------------------------------------------------

    /// Map an absolute terminal position back to a filtered-view index by
    /// walking the same line accounting `render` uses: one header line, then
    /// each visible option takes one line plus one per description line.
    fn hit_test(&self, x: u16, y: u16, origin_row: u16) -> Option<usize> {
        if x == 0 || y < origin_row {
            return None;
        }
        let rel = usize::from(y - origin_row);
        if rel == 0 {
            return None; // header
        }

        let mut row = 1usize;
        let start = self.page_start();
        for (offset, &idx) in self.visible().iter().enumerate() {
            let span = 1 + usize::from(self.options[idx].description.is_some());
            if (row..row + span).contains(&rel) {
                return Some(start + offset);
            }
            row += span;
        }
        None
    }

    fn handle_click(&mut self, view_idx: usize) -> Outcome {
        let idx = self.filtered[view_idx];
        if self.options[idx].disabled {
            // Repaint happens regardless; disabled entries change nothing.
            return Outcome::Continue;
        }
        self.cursor = view_idx;
        if self.multi {
            self.toggle_at_cursor();
            Outcome::Continue
        } else {
            self.submit_cursor()
        }
    }

    // -------------------------------------------------------------------------
    // Rendering
    // -------------------------------------------------------------------------

    fn render_done(&self) -> Vec<String> {
        let summary = match &self.answer {
            Some(Answer::List(values)) => values.join(", "),
            Some(Answer::String(value)) => value.clone(),
            _ => String::new(),
        };
        vec![format!(
            "{} {} {}",
            self.theme.paint(&self.theme.accent, &self.theme.done_pointer),
            self.message,
            self.theme.paint(&self.theme.dim, &summary),
        )]
    }
}

impl Prompt for SelectPrompt {
    fn name(&self) -> &str {
        &self.name
    }

    fn render(&self) -> Vec<String> {
        if self.done {
            return self.render_done();
        }

        let mut lines = Vec::new();
        let query = if self.query.is_empty() {
            String::new()
        } else {
            format!(" {}", self.theme.paint(&self.theme.accent, &self.query))
        };
        lines.push(format!(
            "{} {} {}{}",
            self.theme.paint(&self.theme.accent, "?"),
            self.message,
            self.theme.paint(&self.theme.dim, "›"),
            query,
        ));

        if self.filtered.is_empty() {
            lines.push(self.theme.paint(&self.theme.dim, "  (no matches)"));
            return lines;
        }

        let start = self.page_start();
        for (offset, &idx) in self.visible().iter().enumerate() {
            let opt = &self.options[idx];
            let at_cursor = start + offset == self.cursor;
            let marker = if at_cursor {
                self.theme.paint(&self.theme.accent, &self.theme.pointer)
            } else {
                " ".to_string()
            };
            let checkbox = if self.multi {
                let glyph = if self.selected.contains(&idx) {
                    &self.theme.checked
                } else {
                    &self.theme.unchecked
                };
                format!("{} ", self.theme.paint(&self.theme.accent, glyph))
            } else {
                String::new()
            };
            let label = if opt.disabled {
                self.theme.paint(&self.theme.dim, &opt.label)
            } else if at_cursor {
                self.theme.paint(&self.theme.accent, &opt.label)
            } else {
                opt.label.clone()
            };
            lines.push(format!("{} {}{}", marker, checkbox, label));
            if let Some(desc) = &opt.description {
                lines.push(self.theme.paint(&self.theme.dim, &format!("    {desc}")));
            }
        }

        lines
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
            Key::Up => {
                self.move_cursor(-1);
                Outcome::Continue
            }
            Key::Down => {
                self.move_cursor(1);
                Outcome::Continue
            }
            Key::PageUp => {
                self.move_cursor(-(self.page_size as isize));
                Outcome::Continue
            }
            Key::PageDown => {
                self.move_cursor(self.page_size as isize);
                Outcome::Continue
            }
            Key::Home => {
                self.cursor = 0;
                Outcome::Continue
            }
            Key::End => {
                self.cursor = self.filtered.len().saturating_sub(1);
                Outcome::Continue
            }
            Key::Space => {
                if self.multi {
                    self.toggle_at_cursor();
                    Outcome::Continue
                } else {
                    self.submit_cursor()
                }
            }
            Key::Enter => {
                if self.multi {
                    self.submit_selected()
                } else {
                    self.submit_cursor()
                }
            }
            Key::Backspace => {
                if self.query.pop().is_some() {
                    self.refilter();
                }
                Outcome::Continue
            }
            Key::Char(c) => {
                self.query.push(*c);
                self.refilter();
                Outcome::Continue
            }
            _ => Outcome::Continue,
        }
    }

    fn handle_mouse(&mut self, event: &MouseEvent, origin_row: u16) -> Outcome {
        if self.done {
            return Outcome::Continue;
        }
        match (event.kind, event.button) {
            (MouseEventKind::Press, MouseButton::WheelUp) => {
                self.move_cursor(-1);
                Outcome::Continue
            }
            (MouseEventKind::Press, MouseButton::WheelDown) => {
                self.move_cursor(1);
                Outcome::Continue
            }
            (MouseEventKind::Press, MouseButton::Left) => {
                match self.hit_test(event.x, event.y, origin_row) {
                    Some(view_idx) => self.handle_click(view_idx),
                    // Clicks outside the option region have no side effects.
                    None => Outcome::Continue,
                }
            }
            _ => Outcome::Continue,
        }
    }

    fn done(&self) -> bool {
        self.done
    }
}
