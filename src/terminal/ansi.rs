//! ANSI escape sequences for terminal control.
//!
//! Every sequence the engine emits lives here:
//! - Cursor visibility, positioning, save/restore
//! - Screen and line clearing
//! - Alternate screen buffer enter/exit
//! - Mouse tracking enable/disable for three protocols
//! - A composite reset that returns the terminal to a known-safe baseline
//!
//! The exact byte sequences are part of the compatibility contract with
//! terminal emulators; change them only against a protocol reference.

// =============================================================================
// Constants
// =============================================================================

/// Escape character.
pub const ESC: &str = "\x1b";

/// Control Sequence Introducer.
pub const CSI: &str = "\x1b[";

// Cursor
pub const CURSOR_HIDE: &str = "\x1b[?25l";
pub const CURSOR_SHOW: &str = "\x1b[?25h";
pub const CURSOR_HOME: &str = "\x1b[H";
pub const CURSOR_SAVE: &str = "\x1b[s";
pub const CURSOR_RESTORE: &str = "\x1b[u";

/// Device Status Report: ask the terminal where the cursor is.
/// The reply arrives on stdin as `ESC [ row ; col R` and is decoded by the
/// keyboard parser.
pub const CURSOR_POSITION_QUERY: &str = "\x1b[6n";

// Clearing
pub const CLEAR_SCREEN: &str = "\x1b[2J";
pub const CLEAR_DOWN: &str = "\x1b[J";
pub const CLEAR_LINE: &str = "\x1b[2K";

// Alternate screen buffer
pub const ALT_SCREEN_ENTER: &str = "\x1b[?1049h";
pub const ALT_SCREEN_EXIT: &str = "\x1b[?1049l";

// Mouse tracking modes
pub const MOUSE_BASIC_ON: &str = "\x1b[?1000h";
pub const MOUSE_BASIC_OFF: &str = "\x1b[?1000l";
pub const MOUSE_BUTTON_EVENT_ON: &str = "\x1b[?1002h";
pub const MOUSE_BUTTON_EVENT_OFF: &str = "\x1b[?1002l";
pub const MOUSE_ANY_EVENT_ON: &str = "\x1b[?1003h";
pub const MOUSE_ANY_EVENT_OFF: &str = "\x1b[?1003l";
pub const MOUSE_SGR_ON: &str = "\x1b[?1006h";
pub const MOUSE_SGR_OFF: &str = "\x1b[?1006l";
pub const MOUSE_URXVT_ON: &str = "\x1b[?1015h";
pub const MOUSE_URXVT_OFF: &str = "\x1b[?1015l";

// Styling
pub const STYLE_RESET: &str = "\x1b[0m";

// =============================================================================
// Builders
// =============================================================================

/// Move cursor to an absolute 1-based position.
#[inline]
pub fn cursor_to(row: u16, col: u16) -> String {
    format!("\x1b[{};{}H", row, col)
}

/// Move cursor up n rows (no-op string for n == 0).
#[inline]
pub fn cursor_up(n: u16) -> String {
    if n > 0 { format!("\x1b[{}A", n) } else { String::new() }
}

/// Composite reset: disable every mouse protocol, leave the alternate screen,
/// clear styling, and show the cursor. Safe to send to a terminal in any
/// state this engine can have put it in.
pub fn reset_sequence() -> String {
    let mut s = String::new();
    s.push_str(MOUSE_SGR_OFF);
    s.push_str(MOUSE_URXVT_OFF);
    s.push_str(MOUSE_ANY_EVENT_OFF);
    s.push_str(MOUSE_BUTTON_EVENT_OFF);
    s.push_str(MOUSE_BASIC_OFF);
    s.push_str(ALT_SCREEN_EXIT);
    s.push_str(STYLE_RESET);
    s.push_str(CURSOR_SHOW);
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_to_is_one_based() {
        assert_eq!(cursor_to(1, 1), "\x1b[1;1H");
        assert_eq!(cursor_to(5, 10), "\x1b[5;10H");
    }

    #[test]
    fn test_cursor_up_zero_is_empty() {
        assert_eq!(cursor_up(0), "");
        assert_eq!(cursor_up(3), "\x1b[3A");
    }

    #[test]
    fn test_reset_disables_all_mouse_protocols() {
        let reset = reset_sequence();
        for seq in ["?1000l", "?1002l", "?1003l", "?1006l", "?1015l"] {
            assert!(reset.contains(seq), "missing {seq}");
        }
        assert!(reset.contains("?1049l"));
        assert!(reset.ends_with(CURSOR_SHOW));
    }
}
