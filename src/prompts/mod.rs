//! Prompt state machines.
//!
//! Every prompt kind shares the same lifecycle: initialize state, render on
//! demand, fold decoded events into state transitions, and eventually
//! produce an [`Outcome`] — a typed answer or a cancellation. The engine
//! owns routing and painting; prompts are pure state.
//!
//! - [`PromptConfig`] — tagged configuration, one payload struct per kind
//! - [`Prompt`] — the state-machine contract the engine drives
//! - [`Answer`] / [`PromptResult`] — what comes back out

use std::collections::BTreeMap;
use std::rc::Rc;
use std::cell::RefCell;
use std::time::Instant;

use crate::input::{KeyEvent, MouseEvent};
use crate::theme::{Theme, ThemeOverride};

pub mod confirm;
pub mod select;
pub mod text;

pub use confirm::ConfirmPrompt;
pub use select::{SelectOption, SelectPrompt};
pub use text::TextPrompt;

// =============================================================================
// Answers
// =============================================================================

/// A typed prompt answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    String(String),
    Bool(bool),
    List(Vec<String>),
}

impl Answer {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Self::List(l) => Some(l),
            _ => None,
        }
    }
}

/// Accumulated answers of a flow, keyed by prompt name.
pub type Answers = BTreeMap<String, Answer>;

/// Terminal output of exactly one prompt execution.
#[derive(Debug, Clone, PartialEq)]
pub struct PromptResult {
    pub name: String,
    pub value: Option<Answer>,
    pub cancelled: bool,
}

/// What a state transition produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Continue,
    Submit(Answer),
    Cancel,
}

// =============================================================================
// Prompt contract
// =============================================================================

/// A prompt state machine. Driven by the engine: events in, lines out.
///
/// `done()` is monotonic — once true, implementations must ignore further
/// input and stop their timers.
pub trait Prompt {
    fn name(&self) -> &str;

    /// Called once before the first render.
    fn init(&mut self) {}

    /// Current screen as ordered lines, top to bottom.
    fn render(&self) -> Vec<String>;

    fn handle_key(&mut self, event: &KeyEvent) -> Outcome;

    /// `origin_row` is the absolute terminal row of the first rendered line.
    fn handle_mouse(&mut self, _event: &MouseEvent, _origin_row: u16) -> Outcome {
        Outcome::Continue
    }

    /// Timer hook (cursor blink). Returns true if a repaint is needed.
    fn tick(&mut self, _now: Instant) -> bool {
        false
    }

    fn done(&self) -> bool;
}

/// Shared handle type the engine routes events to.
pub type ActivePrompt = Rc<RefCell<dyn Prompt>>;

// =============================================================================
// Configuration
// =============================================================================

/// Conditional-skip predicate evaluated against answers collected so far.
pub type WhenFn = Box<dyn Fn(&Answers) -> bool>;

/// Text validator: `Err(message)` blocks submission.
pub type Validator = Box<dyn Fn(&str) -> std::result::Result<(), String>>;

/// Default options per page in option lists.
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Single-select configuration.
pub struct SelectConfig {
    pub name: String,
    pub message: String,
    pub options: Vec<SelectOption>,
    pub page_size: usize,
    pub theme: Option<ThemeOverride>,
    pub when: Option<WhenFn>,
}

/// Multi-select configuration.
pub struct MultiSelectConfig {
    pub name: String,
    pub message: String,
    pub options: Vec<SelectOption>,
    pub page_size: usize,
    pub theme: Option<ThemeOverride>,
    pub when: Option<WhenFn>,
}

/// Free-text / password configuration.
pub struct TextConfig {
    pub name: String,
    pub message: String,
    pub placeholder: Option<String>,
    pub max_length: Option<usize>,
    pub required: bool,
    /// Render a mask glyph per grapheme instead of the value.
    pub masked: bool,
    pub validate: Option<Validator>,
    pub theme: Option<ThemeOverride>,
    pub when: Option<WhenFn>,
}

/// Yes/no configuration.
pub struct ConfirmConfig {
    pub name: String,
    pub message: String,
    pub initial: bool,
    pub theme: Option<ThemeOverride>,
    pub when: Option<WhenFn>,
}

/// Tagged prompt configuration, decoded by exhaustive match — never by
/// field-presence sniffing.
pub enum PromptConfig {
    Select(SelectConfig),
    MultiSelect(MultiSelectConfig),
    Text(TextConfig),
    Confirm(ConfirmConfig),
}

impl PromptConfig {
    pub fn name(&self) -> &str {
        match self {
            Self::Select(c) => &c.name,
            Self::MultiSelect(c) => &c.name,
            Self::Text(c) => &c.name,
            Self::Confirm(c) => &c.name,
        }
    }

    /// Evaluate the skip predicate; absent means "always run".
    pub fn should_run(&self, answers: &Answers) -> bool {
        let when = match self {
            Self::Select(c) => &c.when,
            Self::MultiSelect(c) => &c.when,
            Self::Text(c) => &c.when,
            Self::Confirm(c) => &c.when,
        };
        when.as_ref().is_none_or(|f| f(answers))
    }

    /// Build the matching state machine, merging theme layers once.
    pub fn into_prompt(self, global_theme: Option<&ThemeOverride>) -> ActivePrompt {
        match self {
            Self::Select(c) => {
                let theme = Theme::merge(Theme::default_theme(), global_theme, c.theme.as_ref());
                Rc::new(RefCell::new(SelectPrompt::single(c, theme)))
            }
            Self::MultiSelect(c) => {
                let theme = Theme::merge(Theme::default_theme(), global_theme, c.theme.as_ref());
                Rc::new(RefCell::new(SelectPrompt::multi(c, theme)))
            }
            Self::Text(c) => {
                let theme = Theme::merge(Theme::default_theme(), global_theme, c.theme.as_ref());
                Rc::new(RefCell::new(TextPrompt::new(c, theme)))
            }
            Self::Confirm(c) => {
                let theme = Theme::merge(Theme::default_theme(), global_theme, c.theme.as_ref());
                Rc::new(RefCell::new(ConfirmPrompt::new(c, theme)))
            }
        }
    }
}

// =============================================================================
// Constructors
// =============================================================================

/// Single-select prompt over a list of options.
pub fn select(name: &str, message: &str, options: Vec<SelectOption>) -> SelectConfig {
    SelectConfig {
        name: name.to_string(),
        message: message.to_string(),
        options,
        page_size: DEFAULT_PAGE_SIZE,
        theme: None,
        when: None,
    }
}

/// Multi-select prompt over a list of options.
pub fn multiselect(name: &str, message: &str, options: Vec<SelectOption>) -> MultiSelectConfig {
    MultiSelectConfig {
        name: name.to_string(),
        message: message.to_string(),
        options,
        page_size: DEFAULT_PAGE_SIZE,
        theme: None,
        when: None,
    }
}

/// Free-text prompt.
pub fn text(name: &str, message: &str) -> TextConfig {
    TextConfig {
        name: name.to_string(),
        message: message.to_string(),
        placeholder: None,
        max_length: None,
        required: false,
        masked: false,
        validate: None,
        theme: None,
        when: None,
    }
}

/// Text prompt that never echoes its value.
pub fn password(name: &str, message: &str) -> TextConfig {
    TextConfig { masked: true, ..text(name, message) }
}

/// Yes/no prompt.
pub fn confirm(name: &str, message: &str, initial: bool) -> ConfirmConfig {
    ConfirmConfig {
        name: name.to_string(),
        message: message.to_string(),
        initial,
        theme: None,
        when: None,
    }
}

// Builder-style refinement methods.

impl SelectConfig {
    pub fn page_size(mut self, n: usize) -> Self {
        self.page_size = n.max(1);
        self
    }

    pub fn theme(mut self, t: ThemeOverride) -> Self {
        self.theme = Some(t);
        self
    }

    pub fn when<F: Fn(&Answers) -> bool + 'static>(mut self, f: F) -> Self {
        self.when = Some(Box::new(f));
        self
    }
}

impl MultiSelectConfig {
    pub fn page_size(mut self, n: usize) -> Self {
        self.page_size = n.max(1);
        self
    }

    pub fn theme(mut self, t: ThemeOverride) -> Self {
        self.theme = Some(t);
        self
    }

    pub fn when<F: Fn(&Answers) -> bool + 'static>(mut self, f: F) -> Self {
        self.when = Some(Box::new(f));
        self
    }
}

impl TextConfig {
    pub fn placeholder(mut self, s: &str) -> Self {
        self.placeholder = Some(s.to_string());
        self
    }

    pub fn max_length(mut self, n: usize) -> Self {
        self.max_length = Some(n);
        self
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn validate<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) -> std::result::Result<(), String> + 'static,
    {
        self.validate = Some(Box::new(f));
        self
    }

    pub fn theme(mut self, t: ThemeOverride) -> Self {
        self.theme = Some(t);
        self
    }

    pub fn when<F: Fn(&Answers) -> bool + 'static>(mut self, f: F) -> Self {
        self.when = Some(Box::new(f));
        self
    }
}

impl ConfirmConfig {
    pub fn theme(mut self, t: ThemeOverride) -> Self {
        self.theme = Some(t);
        self
    }

    pub fn when<F: Fn(&Answers) -> bool + 'static>(mut self, f: F) -> Self {
        self.when = Some(Box::new(f));
        self
    }
}

impl From<SelectConfig> for PromptConfig {
    fn from(c: SelectConfig) -> Self {
        Self::Select(c)
    }
}

impl From<MultiSelectConfig> for PromptConfig {
    fn from(c: MultiSelectConfig) -> Self {
        Self::MultiSelect(c)
    }
}

impl From<TextConfig> for PromptConfig {
    fn from(c: TextConfig) -> Self {
        Self::Text(c)
    }
}

impl From<ConfirmConfig> for PromptConfig {
    fn from(c: ConfirmConfig) -> Self {
        Self::Confirm(c)
    }
}
