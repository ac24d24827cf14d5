//! # Validate Command Implementation
//!
//! This module implements the `validate` subcommand, which evaluates the
//! `.attr-merge.yaml` manifest and reports everything wrong with it.
//!
//! ## Functionality
//!
//! - **Manifest Evaluation**: Parses the manifest and collects syntax errors,
//!   unknown options, malformed run-list entries, source URLs and version
//!   requirements, and unreadable attribute files.
//! - **Summary**: Prints the run-list, default source, per-cookbook source
//!   overrides and the attribute sets the manifest contributes.
//! - **Conflict Check**: Merges the manifest's own attribute sets.
//! - **Warnings**: Run-list recipes whose cookbook is not declared. With
//!   `--strict` these fail validation too.
//!
//! This command is a safe, read-only operation that does not modify any files.

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

use attr_merge::config::{self, DEFAULT_CONFIG_FILE};
use attr_merge::output::{emoji, render_conflict, OutputConfig};
use attr_merge::suggestions;

/// Validate a .attr-merge.yaml manifest
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Path to the .attr-merge.yaml manifest to validate.
    #[arg(
        short,
        long,
        value_name = "FILE",
        env = "ATTR_MERGE_CONFIG",
        default_value = DEFAULT_CONFIG_FILE
    )]
    pub config: PathBuf,

    /// Use strict validation (fail on warnings).
    #[arg(long)]
    pub strict: bool,
}

/// Execute the `validate` command.
///
/// # Arguments
/// * `args` - The command arguments
/// * `color_flag` - The value of the global --color flag ("always", "never", or "auto")
pub fn execute(args: ValidateArgs, color_flag: &str) -> Result<()> {
    let out = OutputConfig::from_env_and_flag(color_flag);
    let config_path = &args.config;
    if !config_path.is_file() {
        return Err(suggestions::config_not_found(config_path));
    }

    println!(
        "{} Validating manifest: {}",
        emoji(&out, "🔍", "[SCAN]"),
        config_path.display()
    );

    let evaluation = config::evaluate_file(config_path)?;

    println!("\n{} Manifest Summary:", emoji(&out, "📊", "[INFO]"));
    println!(
        "   Default source: {}",
        evaluation.default_source.as_deref().unwrap_or("(none)")
    );
    println!("   Cookbooks: {}", evaluation.cookbooks.len());
    for (cookbook, source) in &evaluation.cookbook_sources {
        println!("     {} from {}", cookbook, source);
    }
    for (cookbook, requirement) in &evaluation.cookbook_versions {
        println!("     {} version {}", cookbook, requirement);
    }
    println!("   Run-list entries: {}", evaluation.run_list.len());
    for entry in &evaluation.run_list {
        println!("     {}", entry);
    }
    println!("   Attribute sets: {}", evaluation.contributions.len());
    for contribution in &evaluation.contributions {
        println!(
            "     {} ({} attribute(s))",
            contribution.source,
            contribution.tree.leaf_count()
        );
    }

    let mut has_errors = !evaluation.is_ok();
    for error in &evaluation.errors {
        println!("{} {}", emoji(&out, "❌", "[ERR]"), error);
    }

    if evaluation.is_ok() {
        println!(
            "\n{} Checking attribute sets for conflicts...",
            emoji(&out, "🔄", "[CHECK]")
        );
        match evaluation.checker().check() {
            Ok(_) => println!("{} No conflicting attributes", emoji(&out, "✅", "[OK]")),
            Err(conflict) => {
                print!("{}", render_conflict(&conflict, &out));
                has_errors = true;
            }
        }
    }

    let warnings = evaluation.warnings();
    for warning in &warnings {
        println!("{} {}", emoji(&out, "⚠️", "[WARN]"), warning);
    }

    println!("\n{} Validation Result:", emoji(&out, "🎯", "[RESULT]"));

    if has_errors {
        println!(
            "{} Manifest has errors that must be fixed",
            emoji(&out, "❌", "[ERR]")
        );
        return Err(anyhow::anyhow!("Manifest validation failed"));
    }

    if !warnings.is_empty() && args.strict {
        println!(
            "{} Manifest has warnings (strict mode enabled)",
            emoji(&out, "❌", "[ERR]")
        );
        return Err(anyhow::anyhow!("Manifest validation failed in strict mode"));
    }

    if warnings.is_empty() {
        println!("{} Manifest is valid", emoji(&out, "✅", "[OK]"));
    } else {
        println!(
            "{} Manifest is valid but has warnings",
            emoji(&out, "⚠️", "[WARN]")
        );
    }

    Ok(())
}
