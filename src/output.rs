//! # Output Configuration
//!
//! This module provides utilities for controlling CLI output appearance,
//! including color and emoji support based on terminal capabilities and
//! user preferences, and the terminal rendering of attribute conflicts.
//!
//! ## Respecting User Preferences
//!
//! The module respects the following environment variables and flags:
//! - `--color=never|always|auto` - CLI flag for color control
//! - `NO_COLOR` - Disables colors when set (per https://no-color.org/)
//! - `CLICOLOR=0` - Disables colors
//! - `CLICOLOR_FORCE=1` - Forces colors even in non-TTY
//! - `TERM=dumb` - Disables colors for dumb terminals
//!
//! ## Usage
//!
//! ```rust,ignore
//! use attr_merge::output::{OutputConfig, emoji, render_conflict};
//!
//! let config = OutputConfig::from_env_and_flag("auto");
//!
//! println!("{} Checking attributes...", emoji(&config, "🔍", "[SCAN]"));
//! eprint!("{}", render_conflict(&conflict, &config));
//! ```

use std::env;

use console::style;

use crate::error::ConflictError;

/// Output configuration for controlling colors and emojis.
#[derive(Debug, Clone)]
pub struct OutputConfig {
    /// Whether colors and emojis should be used in output.
    pub use_color: bool,
}

impl OutputConfig {
    /// Create an output configuration from environment and CLI flag.
    ///
    /// # Arguments
    /// * `color_flag` - The value of the --color CLI flag: "always", "never", or "auto"
    ///
    /// # Behavior
    /// - `--color=always`: Force colors on (overrides NO_COLOR)
    /// - `--color=never`: Force colors off
    /// - `--color=auto`: Detect based on environment
    ///
    /// In auto mode, colors are disabled if:
    /// - `NO_COLOR` environment variable is set (any value, including empty)
    /// - `CLICOLOR=0` is set
    /// - `TERM=dumb` is set
    /// - stdout is not a TTY (unless `CLICOLOR_FORCE=1`)
    pub fn from_env_and_flag(color_flag: &str) -> Self {
        let use_color = match color_flag.to_lowercase().as_str() {
            "always" => true,
            "never" => false,
            _ => Self::detect_color_support(),
        };

        Self { use_color }
    }

    fn detect_color_support() -> bool {
        // The presence of NO_COLOR (even if empty) disables colors
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

    /// Create a configuration with colors always enabled.
    #[cfg(test)]
    pub fn with_color() -> Self {
        Self { use_color: true }
    }

    /// Create a configuration with colors always disabled.
    #[cfg(test)]
    pub fn without_color() -> Self {
        Self { use_color: false }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self::from_env_and_flag("auto")
    }
}

/// Returns the emoji when colors are enabled, the plain text otherwise.
pub fn emoji<'a>(config: &OutputConfig, emoji_str: &'a str, plain: &'a str) -> &'a str {
    if config.use_color {
        emoji_str
    } else {
        plain
    }
}

/// Render a conflict for the terminal.
///
/// The path is highlighted and each contributing source gets its own line,
/// in the order the sources were added. A conflict at the root path is shown
/// as `(root)`.
pub fn render_conflict(conflict: &ConflictError, config: &OutputConfig) -> String {
    let path = if conflict.attribute_path.is_empty() {
        "(root)".to_string()
    } else {
        conflict.attribute_path.to_string()
    };

    let mut out = if config.use_color {
        format!(
            "{} Attribute conflict at {}\n",
            style("✗").red().bold(),
            style(path).yellow().bold()
        )
    } else {
        format!("[CONFLICT] Attribute conflict at {}\n", path)
    };

    for source in &conflict.provided_by {
        if config.use_color {
            out.push_str(&format!("  provided by {}\n", style(source).cyan()));
        } else {
            out.push_str(&format!("  provided by {}\n", source));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::AttributePath;
    use serial_test::serial;

    fn conflict() -> ConflictError {
        ConflictError::new(
            AttributePath::new(["nginx", "port"]),
            vec!["web".to_string(), "proxy".to_string()],
        )
    }

    #[test]
    fn test_color_always() {
        let config = OutputConfig::from_env_and_flag("always");
        assert!(config.use_color);
    }

    #[test]
    fn test_color_never() {
        let config = OutputConfig::from_env_and_flag("never");
        assert!(!config.use_color);
    }

    #[test]
    #[serial]
    fn test_no_color_env_disables_auto() {
        env::set_var("NO_COLOR", "1");
        let config = OutputConfig::from_env_and_flag("auto");
        env::remove_var("NO_COLOR");
        assert!(!config.use_color);
    }

    #[test]
    #[serial]
    fn test_always_overrides_no_color() {
        env::set_var("NO_COLOR", "1");
        let config = OutputConfig::from_env_and_flag("always");
        env::remove_var("NO_COLOR");
        assert!(config.use_color);
    }

    #[test]
    fn test_emoji_helper() {
        assert_eq!(emoji(&OutputConfig::with_color(), "🔍", "[SCAN]"), "🔍");
        assert_eq!(emoji(&OutputConfig::without_color(), "🔍", "[SCAN]"), "[SCAN]");
    }

    #[test]
    fn test_render_conflict_plain() {
        let rendered = render_conflict(&conflict(), &OutputConfig::without_color());
        insta::assert_snapshot!(rendered.trim_end(), @r"
        [CONFLICT] Attribute conflict at [nginx][port]
          provided by web
          provided by proxy
        ");
    }

    #[test]
    fn test_render_conflict_root_path() {
        let root = ConflictError::new(AttributePath::root(), vec!["a".to_string()]);
        let rendered = render_conflict(&root, &OutputConfig::without_color());
        assert!(rendered.starts_with("[CONFLICT] Attribute conflict at (root)"));
    }

    #[test]
    fn test_render_conflict_colored_keeps_text() {
        let rendered = render_conflict(&conflict(), &OutputConfig::with_color());
        let plain = console::strip_ansi_codes(&rendered);
        assert!(plain.contains("Attribute conflict at [nginx][port]"));
        assert!(plain.contains("provided by proxy"));
    }
}
