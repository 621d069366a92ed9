//! Mouse capability detection.
//!
//! Reads terminal-identifying environment variables once per session and
//! caches the result. The snapshot only biases which *enable* sequences the
//! engine sends; the decoders accept all three wire formats regardless, so a
//! misdetected terminal still works.

/// Coordinate ceiling of the basic (X10) encoding: 255 - 32.
pub const BASIC_MAX_COORD: u16 = 223;

/// Per-session mouse capability snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MouseCapabilities {
    pub supports_sgr: bool,
    pub supports_urxvt: bool,
    pub supports_pixel: bool,
    /// Largest coordinate the preferred protocol can report.
    pub max_coordinates: u16,
}

impl MouseCapabilities {
    /// Detect from the process environment.
    pub fn detect() -> Self {
        Self::from_env(
            std::env::var("TERM").ok().as_deref(),
            std::env::var("TERM_PROGRAM").ok().as_deref(),
            std::env::var("TMUX").is_ok(),
        )
    }

    /// Detect from explicit signals (test seam).
    pub fn from_env(term: Option<&str>, term_program: Option<&str>, tmux: bool) -> Self {
        let term = term.unwrap_or("").to_ascii_lowercase();
        let program = term_program.unwrap_or("").to_ascii_lowercase();

        if term == "dumb" || term.is_empty() {
            return Self {
                supports_sgr: false,
                supports_urxvt: false,
                supports_pixel: false,
                max_coordinates: BASIC_MAX_COORD,
            };
        }

        let urxvt = term.contains("rxvt");
        // Modern emulators (and anything multiplexed through tmux, which
        // translates for its clients) speak SGR.
        let sgr = !urxvt || tmux;
        let pixel = matches!(program.as_str(), "kitty" | "wezterm" | "ghostty")
            || term.contains("kitty");

        Self {
            supports_sgr: sgr,
            supports_urxvt: urxvt,
            supports_pixel: pixel,
            max_coordinates: if sgr || urxvt { u16::MAX } else { BASIC_MAX_COORD },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modern_term_prefers_sgr() {
        let caps = MouseCapabilities::from_env(Some("xterm-256color"), None, false);
        assert!(caps.supports_sgr);
        assert!(!caps.supports_urxvt);
        assert_eq!(caps.max_coordinates, u16::MAX);
    }

    #[test]
    fn test_rxvt_marks_urxvt() {
        let caps = MouseCapabilities::from_env(Some("rxvt-unicode-256color"), None, false);
        assert!(caps.supports_urxvt);
        assert!(!caps.supports_sgr);
    }

    #[test]
    fn test_rxvt_under_tmux_gains_sgr() {
        let caps = MouseCapabilities::from_env(Some("rxvt-unicode"), None, true);
        assert!(caps.supports_sgr);
    }

    #[test]
    fn test_dumb_terminal_is_basic_only() {
        let caps = MouseCapabilities::from_env(Some("dumb"), None, false);
        assert!(!caps.supports_sgr);
        assert!(!caps.supports_urxvt);
        assert_eq!(caps.max_coordinates, BASIC_MAX_COORD);
    }

    #[test]
    fn test_kitty_reports_pixel_support() {
        let caps = MouseCapabilities::from_env(Some("xterm-kitty"), Some("kitty"), false);
        assert!(caps.supports_pixel);
        assert!(caps.supports_sgr);
    }
}
