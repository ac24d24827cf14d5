//! # CLI Command Implementations
//!
//! This module contains the implementation for each subcommand of the `attr-merge`
//! command-line tool. Each subcommand is defined in its own file to keep the
//! logic separated and maintainable.
//!
//! ## Structure
//!
//! Each command module typically contains:
//! - An `Args` struct that defines the command-specific arguments and options,
//!   derived using `clap`.
//! - An `execute` function that takes the parsed `Args` and performs the
//!   command's logic.
//!
//! `check` and `merge` read the same inputs, described by [`InputArgs`] and
//! gathered into a checker by [`gather_checker`].

pub mod check;
pub mod completions;
pub mod merge;
pub mod validate;

use anyhow::{Context, Result};
use clap::Args;
use log::{debug, info};
use std::path::{Path, PathBuf};

use attr_merge::checker::MergeConflictChecker;
use attr_merge::config::{self, DEFAULT_CONFIG_FILE};
use attr_merge::loader;
use attr_merge::suggestions;

/// Attribute inputs shared by `check` and `merge`.
#[derive(Args, Debug, Clone)]
pub struct InputArgs {
    /// Path to the .attr-merge.yaml manifest.
    ///
    /// Without this flag the manifest in the current directory is used when
    /// it exists. Can also be set with the `ATTR_MERGE_CONFIG` environment
    /// variable.
    #[arg(short, long, value_name = "FILE", env = "ATTR_MERGE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Ignore the manifest and check only the given sources.
    #[arg(long, conflicts_with = "config")]
    pub no_config: bool,

    /// Attribute files, directories or glob patterns. Prefix with `NAME=` to
    /// choose the source name, e.g. `web=attrs/web.json`. A prefix containing
    /// `/` or starting with `.` is read as part of the path.
    #[arg(value_name = "SOURCES")]
    pub sources: Vec<String>,
}

/// Resolve the manifest to use, if any.
fn manifest_path(args: &InputArgs) -> Result<Option<PathBuf>> {
    if args.no_config {
        return Ok(None);
    }
    match &args.config {
        Some(path) if path.is_file() => Ok(Some(path.clone())),
        Some(path) => Err(suggestions::config_not_found(path)),
        None => {
            let default = Path::new(DEFAULT_CONFIG_FILE);
            Ok(default.is_file().then(|| default.to_path_buf()))
        }
    }
}

/// Build a checker from the manifest contributions followed by the
/// command-line sources.
///
/// Fails when the manifest has evaluation errors, when a source cannot be
/// loaded, or when there is nothing to check.
pub fn gather_checker(args: &InputArgs) -> Result<MergeConflictChecker> {
    let mut checker = MergeConflictChecker::new();

    if let Some(path) = manifest_path(args)? {
        info!("Evaluating manifest {}", path.display());
        let evaluation = config::evaluate_file(&path)
            .with_context(|| format!("Failed to read manifest {}", path.display()))?;
        evaluation.ensure_valid()?;
        checker.extend(evaluation.contributions);
    } else {
        debug!("No manifest in use");
    }

    let specs = loader::expand_inputs(&args.sources)?;
    checker.extend(loader::load_contributions(&specs)?);

    if checker.is_empty() {
        return Err(suggestions::no_sources());
    }
    debug!("Gathered {} attribute source(s)", checker.len());
    Ok(checker)
}
