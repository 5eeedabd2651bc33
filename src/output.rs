//! Diagnostics sink.
//!
//! The historical tools read a process-global verbosity flag from wherever
//! they happened to run; here the sink is constructed once in `main` and
//! handed to each component, with the threshold as ordinary configuration.
//!
//! Levels: 1 reports top-level decisions, 2 adds resolved namespace/URI pairs
//! and version mapping, 3 adds the assembled schema text and engine detail.

use crate::coordinator::ValidationOutcome;

/// Stdout diagnostics gated by a verbosity threshold.
pub struct Diagnostics {
    level: u8,
    show_colors: bool,
}

impl Diagnostics {
    pub fn new(level: u8) -> Self {
        Self {
            level: level.min(3),
            show_colors: atty::is(atty::Stream::Stdout),
        }
    }

    /// Sink that prints nothing; used by tests.
    pub fn silent() -> Self {
        Self {
            level: 0,
            show_colors: false,
        }
    }

    pub fn level(&self) -> u8 {
        self.level
    }

    /// Print `message` when the threshold admits `level`.
    pub fn say(&self, level: u8, message: &str) {
        if self.level >= level {
            println!("{message}");
        }
    }

    /// Verdict line for the final outcome.
    pub fn verdict(&self, outcome: &ValidationOutcome) {
        let (text, color) = match outcome {
            ValidationOutcome::Valid => ("document is valid", "32"),
            ValidationOutcome::Invalid { .. } => ("document is not valid", "31"),
            ValidationOutcome::NotResolvable { .. } => ("schema not resolvable", "33"),
        };
        if self.level >= 1 {
            println!("{}", self.colorize(text, color));
        }
    }

    fn colorize(&self, text: &str, color: &str) -> String {
        if self.show_colors {
            format!("\x1b[{color}m{text}\x1b[0m")
        } else {
            text.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_is_clamped() {
        let diag = Diagnostics::new(9);
        assert_eq!(diag.level(), 3);
    }

    #[test]
    fn test_silent_sink() {
        let diag = Diagnostics::silent();
        assert_eq!(diag.level(), 0);
        // Nothing observable to assert beyond not panicking.
        diag.say(1, "suppressed");
    }

    #[test]
    fn test_colorize_disabled_without_terminal() {
        let diag = Diagnostics {
            level: 1,
            show_colors: false,
        };
        assert_eq!(diag.colorize("ok", "32"), "ok");
    }
}
