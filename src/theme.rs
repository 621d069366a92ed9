//! Prompt presentation: glyphs and styling.
//!
//! A theme is merged once, at prompt construction, from three layers:
//! built-in default < global session theme < per-prompt override. The merge
//! is per-field (most specific wins) and the result is immutable — prompts
//! never restyle themselves mid-session.

use crate::terminal::ansi::STYLE_RESET;

// =============================================================================
// Theme
// =============================================================================

/// Fully-resolved presentation values for one prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Theme {
    /// Cursor glyph in option lists.
    pub pointer: String,
    /// Multiselect checked / unchecked glyphs.
    pub checked: String,
    pub unchecked: String,
    /// Password mask, one per grapheme.
    pub mask: char,
    /// Prefix glyph for an answered prompt line.
    pub done_pointer: String,
    /// Prefix glyph for validation errors.
    pub error_prefix: String,
    /// ANSI style prefixes (reset is appended by [`Theme::paint`]).
    pub accent: String,
    pub dim: String,
    pub error: String,
}

impl Theme {
    /// Built-in default theme.
    pub fn default_theme() -> Self {
        Self {
            pointer: "❯".to_string(),
            checked: "◉".to_string(),
            unchecked: "◯".to_string(),
            mask: '•',
            done_pointer: "✔".to_string(),
            error_prefix: "✖".to_string(),
            accent: "\x1b[36m".to_string(),
            dim: "\x1b[2m".to_string(),
            error: "\x1b[31m".to_string(),
        }
    }

    /// Explicit three-way merge: default < global < local, per field.
    pub fn merge(default: Theme, global: Option<&ThemeOverride>, local: Option<&ThemeOverride>) -> Theme {
        let mut theme = default;
        for layer in [global, local].into_iter().flatten() {
            layer.apply(&mut theme);
        }
        theme
    }

    /// Wrap text in a style prefix and a reset.
    pub fn paint(&self, style: &str, text: &str) -> String {
        if style.is_empty() {
            return text.to_string();
        }
        format!("{style}{text}{STYLE_RESET}")
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::default_theme()
    }
}

// =============================================================================
// Override layers
// =============================================================================

/// One override layer: any subset of theme fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ThemeOverride {
    pub pointer: Option<String>,
    pub checked: Option<String>,
    pub unchecked: Option<String>,
    pub mask: Option<char>,
    pub done_pointer: Option<String>,
    pub error_prefix: Option<String>,
    pub accent: Option<String>,
    pub dim: Option<String>,
    pub error: Option<String>,
}

impl ThemeOverride {
    fn apply(&self, theme: &mut Theme) {
        if let Some(v) = &self.pointer {
            theme.pointer = v.clone();
        }
        if let Some(v) = &self.checked {
            theme.checked = v.clone();
        }
        if let Some(v) = &self.unchecked {
            theme.unchecked = v.clone();
        }
        if let Some(v) = self.mask {
            theme.mask = v;
        }
        if let Some(v) = &self.done_pointer {
            theme.done_pointer = v.clone();
        }
        if let Some(v) = &self.error_prefix {
            theme.error_prefix = v.clone();
        }
        if let Some(v) = &self.accent {
            theme.accent = v.clone();
        }
        if let Some(v) = &self.dim {
            theme.dim = v.clone();
        }
        if let Some(v) = &self.error {
            theme.error = v.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_most_specific_field_wins() {
        let global = ThemeOverride {
            pointer: Some(">".to_string()),
            mask: Some('*'),
            ..Default::default()
        };
        let local = ThemeOverride {
            pointer: Some("→".to_string()),
            ..Default::default()
        };
        let theme = Theme::merge(Theme::default_theme(), Some(&global), Some(&local));
        // Local beats global on the field both set.
        assert_eq!(theme.pointer, "→");
        // Global survives where local is silent.
        assert_eq!(theme.mask, '*');
        // Default survives where both are silent.
        assert_eq!(theme.checked, "◉");
    }

    #[test]
    fn test_merge_without_layers_is_default() {
        let theme = Theme::merge(Theme::default_theme(), None, None);
        assert_eq!(theme, Theme::default_theme());
    }

    #[test]
    fn test_paint_wraps_with_reset() {
        let theme = Theme::default_theme();
        assert_eq!(theme.paint("\x1b[31m", "x"), "\x1b[31mx\x1b[0m");
        assert_eq!(theme.paint("", "x"), "x");
    }
}
