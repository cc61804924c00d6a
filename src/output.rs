//! # Output Configuration
//!
//! Controls how the `pack` summary looks on the terminal. Color is resolved
//! from the `--color` flag and the usual environment conventions:
//!
//! - `--color=never|always|auto`
//! - `NO_COLOR` disables colors when set (per https://no-color.org/)
//! - `CLICOLOR=0` disables colors
//! - `CLICOLOR_FORCE=1` forces colors even when stdout is not a TTY
//! - `TERM=dumb` disables colors
//!
//! Without color, status markers fall back to bracketed plain-text tags.

use std::env;

use console::style;

/// Output configuration for controlling colors.
#[derive(Debug, Clone)]
pub struct OutputConfig {
    pub use_color: bool,
}

impl OutputConfig {
    /// Resolve from the `--color` flag value (`always`, `never` or `auto`).
    pub fn from_env_and_flag(color_flag: &str) -> Self {
        let use_color = match color_flag.to_lowercase().as_str() {
            "always" => true,
            "never" => false,
            _ => Self::detect_color_support(),
        };

        Self { use_color }
    }

    fn detect_color_support() -> bool {
        // Presence alone disables colors, even when empty.
        if env::var_os("NO_COLOR").is_some() {
            return false;
        }

        if env::var("CLICOLOR").is_ok_and(|v| v == "0") {
            return false;
        }

        if env::var("CLICOLOR_FORCE").is_ok_and(|v| v != "0" && !v.is_empty()) {
            return true;
        }

        if env::var("TERM").is_ok_and(|v| v == "dumb") {
            return false;
        }

        console::Term::stdout().features().colors_supported()
    }

    #[cfg(test)]
    pub fn with_color() -> Self {
        Self { use_color: true }
    }

    #[cfg(test)]
    pub fn without_color() -> Self {
        Self { use_color: false }
    }

    /// Prefix for a summary line of the given kind.
    pub fn marker(&self, kind: Marker) -> String {
        let plain = kind.plain();
        if !self.use_color {
            return plain.to_string();
        }
        let styled = style(plain).force_styling(true);
        match kind {
            Marker::Done => styled.green().bold().to_string(),
            Marker::Copied => styled.cyan().to_string(),
            Marker::Skipped => styled.dim().to_string(),
            Marker::Warning => styled.yellow().bold().to_string(),
            Marker::Kept => styled.magenta().to_string(),
        }
    }

    /// Emphasize a path or other value inside a summary line.
    pub fn emphasis(&self, text: &str) -> String {
        if self.use_color {
            style(text).force_styling(true).bold().to_string()
        } else {
            text.to_string()
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self::from_env_and_flag("auto")
    }
}

/// Kinds of summary lines printed after a pack run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    Done,
    Copied,
    Skipped,
    Warning,
    Kept,
}

impl Marker {
    fn plain(self) -> &'static str {
        match self {
            Marker::Done => "[done]",
            Marker::Copied => "[copy]",
            Marker::Skipped => "[skip]",
            Marker::Warning => "[warn]",
            Marker::Kept => "[keep]",
        }
    }
}
