//! # Check Command Implementation
//!
//! This module implements the `check` subcommand, which merges every attribute
//! source and reports whether any two of them disagree.
//!
//! ## Functionality
//!
//! - **Input Gathering**: Evaluates the manifest (when present or given) and
//!   loads the attribute files named on the command line.
//! - **Conflict Detection**: Merges all sources in order and stops at the
//!   first conflicting attribute path.
//! - **Reporting**: Prints a human-readable report or, with `--format json`,
//!   a machine-readable status object.
//!
//! The command exits with status 1 when a conflict is found. It never writes
//! any files.

use anyhow::Result;
use clap::{Args, ValueEnum};
use serde_json::json;

use attr_merge::output::{emoji, render_conflict, OutputConfig};
use attr_merge::suggestions;

use super::{gather_checker, InputArgs};

/// Report format for `check`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum CheckFormat {
    /// Human-readable report
    #[default]
    Text,
    /// Single JSON object on stdout
    Json,
}

/// Check that all attribute sources merge without conflicts
#[derive(Args, Debug)]
pub struct CheckArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Output format of the report.
    #[arg(long, value_enum, default_value_t = CheckFormat::Text)]
    pub format: CheckFormat,
}

/// Execute the `check` command.
///
/// # Arguments
/// * `args` - The command arguments
/// * `color_flag` - The value of the global --color flag ("always", "never", or "auto")
pub fn execute(args: CheckArgs, color_flag: &str) -> Result<()> {
    let out = OutputConfig::from_env_and_flag(color_flag);
    let checker = gather_checker(&args.input)?;

    if args.format == CheckFormat::Text {
        println!(
            "{} Checking {} attribute source(s)...",
            emoji(&out, "🔍", "[SCAN]"),
            checker.len()
        );
    }

    match checker.check() {
        Ok(merged) => {
            match args.format {
                CheckFormat::Json => println!("{}", json!({"status": "ok"})),
                CheckFormat::Text => println!(
                    "{} No conflicts: {} attribute(s) merged",
                    emoji(&out, "✅", "[OK]"),
                    merged.tree().leaf_count()
                ),
            }
            Ok(())
        }
        Err(conflict) => {
            match args.format {
                CheckFormat::Json => println!(
                    "{}",
                    json!({
                        "status": "conflict",
                        "attribute_path": conflict.attribute_path,
                        "provided_by": conflict.provided_by,
                    })
                ),
                CheckFormat::Text => print!("{}", render_conflict(&conflict, &out)),
            }
            Err(suggestions::attribute_conflict(&conflict))
        }
    }
}
