//! # Manifest Evaluation
//!
//! This module reads the `.attr-merge.yaml` manifest, which declares the
//! cookbooks of a project and the attributes each one contributes. Evaluating
//! a manifest never stops at the first problem: every error is collected into
//! the [`Evaluation`] so a user can fix them all in one pass.
//!
//! ## Manifest Format
//!
//! ```yaml
//! default_source: https://supermarket.chef.io
//! run_list:
//!   - recipe[nginx::default]
//!   - role[web]
//! cookbooks:
//!   nginx:
//!     source: https://github.com/example/nginx.git
//!     version: "~> 2.7"
//!     attributes:
//!       nginx:
//!         port: 80
//!   app:
//!     attributes_file: attributes/app.json
//!   postgresql: ">= 9.0"
//! ```
//!
//! - **`default_source`**: where cookbooks come from unless overridden.
//! - **`run_list`**: `recipe[cookbook]`, `recipe[cookbook::recipe]`,
//!   `role[name]`, or a bare `cookbook[::recipe]`.
//! - **`cookbooks`**: cookbook name to either a version requirement string or
//!   a mapping with `source`, `version`, `attributes` and `attributes_file`.
//!
//! ## Errors
//!
//! - **Syntax**: the YAML does not parse; carries the line, column and the
//!   offending source line.
//! - **Runtime**: a declared attributes file cannot be loaded.
//! - **Invalid option**: unknown keys (with a "did you mean" suggestion),
//!   malformed run-list entries, URLs or version requirements.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::sync::OnceLock;

use log::{debug, warn};
use regex::Regex;
use semver::VersionReq;
use serde_yaml::Value as YamlValue;
use thiserror::Error;

use crate::attributes::{yaml_key_to_string, AttributeTree};
use crate::checker::{Contribution, MergeConflictChecker};
use crate::error::{Error, Result};
use crate::loader;
use crate::suggestions::find_similar;

/// Manifest file name looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = ".attr-merge.yaml";

const TOP_LEVEL_OPTIONS: &[&str] = &["default_source", "run_list", "cookbooks"];
const COOKBOOK_OPTIONS: &[&str] = &["source", "version", "attributes", "attributes_file"];

/// A problem found while evaluating a manifest.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EvaluationError {
    /// The manifest is not valid YAML.
    #[error("syntax error{}: {message}{}", describe_location(line, column), context.as_ref().map(|c| format!("\n  | {}", c)).unwrap_or_default())]
    Syntax {
        line: Option<usize>,
        column: Option<usize>,
        message: String,
        /// The manifest line the error points at, if known.
        context: Option<String>,
    },

    /// A cookbook declaration could not be carried out.
    #[error("cookbook '{cookbook}': {message}")]
    Runtime { cookbook: String, message: String },

    /// An option is unknown or has an unusable value.
    #[error("invalid option '{option}': {message}{}", suggestion.as_ref().map(|s| format!(" (did you mean '{}'?)", s)).unwrap_or_default())]
    InvalidOption {
        option: String,
        message: String,
        suggestion: Option<String>,
    },
}

fn describe_location(line: &Option<usize>, column: &Option<usize>) -> String {
    match (line, column) {
        (Some(line), Some(column)) => format!(" at line {}, column {}", line, column),
        (Some(line), None) => format!(" at line {}", line),
        _ => String::new(),
    }
}

/// One entry of a run-list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunListEntry {
    Recipe {
        cookbook: String,
        recipe: Option<String>,
    },
    Role(String),
}

impl RunListEntry {
    /// Parse `recipe[cookbook::recipe]`, `role[name]` or a bare
    /// `cookbook::recipe`.
    pub fn parse(entry: &str) -> Option<Self> {
        static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
        let pattern = PATTERN
            .get_or_init(|| {
                Regex::new(
                    r"^(?:(recipe|role)\[([A-Za-z0-9_.-]+)(?:::([A-Za-z0-9_.-]+))?\]|([A-Za-z0-9_.-]+)(?:::([A-Za-z0-9_.-]+))?)$",
                )
                .ok()
            })
            .as_ref()?;

        let captures = pattern.captures(entry.trim())?;
        let text = |idx: usize| captures.get(idx).map(|m| m.as_str().to_string());

        match captures.get(1).map(|m| m.as_str()) {
            Some("role") if captures.get(3).is_none() => Some(RunListEntry::Role(text(2)?)),
            Some("role") => None,
            Some(_) => Some(RunListEntry::Recipe {
                cookbook: text(2)?,
                recipe: text(3),
            }),
            None => Some(RunListEntry::Recipe {
                cookbook: text(4)?,
                recipe: text(5),
            }),
        }
    }

    /// The cookbook a recipe entry draws from. Roles name no cookbook.
    pub fn cookbook(&self) -> Option<&str> {
        match self {
            RunListEntry::Recipe { cookbook, .. } => Some(cookbook),
            RunListEntry::Role(_) => None,
        }
    }
}

impl fmt::Display for RunListEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunListEntry::Recipe {
                cookbook,
                recipe: Some(recipe),
            } => write!(f, "recipe[{}::{}]", cookbook, recipe),
            RunListEntry::Recipe {
                cookbook,
                recipe: None,
            } => write!(f, "recipe[{}]", cookbook),
            RunListEntry::Role(role) => write!(f, "role[{}]", role),
        }
    }
}

/// Everything a manifest declares, plus the problems found reading it.
#[derive(Debug, Clone, Default)]
pub struct Evaluation {
    pub errors: Vec<EvaluationError>,
    pub run_list: Vec<RunListEntry>,
    pub default_source: Option<String>,
    /// Declared cookbook names in manifest order.
    pub cookbooks: Vec<String>,
    /// Cookbook name to source override.
    pub cookbook_sources: BTreeMap<String, String>,
    pub cookbook_versions: BTreeMap<String, VersionReq>,
    /// Attribute sets in manifest order, one per inline block or file.
    pub contributions: Vec<Contribution>,
}

impl Evaluation {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    /// Fail with `Error::Evaluation` if any errors were collected.
    pub fn ensure_valid(&self) -> Result<()> {
        if self.is_ok() {
            return Ok(());
        }
        let summary = self
            .errors
            .iter()
            .map(|error| format!("  - {}", error))
            .collect::<Vec<_>>()
            .join("\n");
        Err(Error::Evaluation {
            count: self.errors.len(),
            summary,
        })
    }

    /// Non-fatal findings: run-list recipes whose cookbook is not declared
    /// under `cookbooks`.
    pub fn warnings(&self) -> Vec<String> {
        self.run_list
            .iter()
            .filter_map(|entry| {
                let cookbook = entry.cookbook()?;
                (!self.cookbooks.iter().any(|declared| declared == cookbook)).then(|| {
                    format!(
                        "run-list entry {} uses undeclared cookbook '{}'",
                        entry, cookbook
                    )
                })
            })
            .collect()
    }

    /// A checker preloaded with this manifest's attribute sets.
    pub fn checker(&self) -> MergeConflictChecker {
        self.contributions.iter().cloned().collect()
    }

    pub fn into_checker(self) -> MergeConflictChecker {
        self.contributions.into_iter().collect()
    }
}

/// Evaluate manifest text. Relative `attributes_file` paths resolve against
/// `base_dir`.
pub fn evaluate(content: &str, base_dir: &Path) -> Evaluation {
    let mut evaluation = Evaluation::default();

    let document = match serde_yaml::from_str::<YamlValue>(content) {
        Ok(document) => document,
        Err(err) => {
            evaluation.errors.push(syntax_error(content, &err));
            warn_errors(&evaluation);
            return evaluation;
        }
    };

    let manifest = match document {
        YamlValue::Null => return evaluation,
        YamlValue::Mapping(manifest) => manifest,
        _ => {
            evaluation.errors.push(EvaluationError::InvalidOption {
                option: "manifest".to_string(),
                message: "top level must be a mapping".to_string(),
                suggestion: None,
            });
            warn_errors(&evaluation);
            return evaluation;
        }
    };

    for (key, value) in manifest {
        let key = yaml_key_to_string(&key);
        match key.as_str() {
            "default_source" => match evaluate_source("default_source", &value) {
                Ok(source) => evaluation.default_source = Some(source),
                Err(error) => evaluation.errors.push(error),
            },
            "run_list" => evaluate_run_list(&value, &mut evaluation),
            "cookbooks" => evaluate_cookbooks(&value, base_dir, &mut evaluation),
            other => evaluation
                .errors
                .push(unknown_option(other, other, TOP_LEVEL_OPTIONS)),
        }
    }

    debug!(
        "Evaluated manifest: {} run-list entries, {} attribute set(s), {} error(s)",
        evaluation.run_list.len(),
        evaluation.contributions.len(),
        evaluation.errors.len()
    );
    warn_errors(&evaluation);
    evaluation
}

/// Read and evaluate a manifest file.
///
/// # Errors
///
/// Only reading the file can fail here; problems inside the manifest are
/// reported through [`Evaluation::errors`].
pub fn evaluate_file<P: AsRef<Path>>(path: P) -> Result<Evaluation> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(Error::Io)?;
    let base_dir = path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    Ok(evaluate(&content, base_dir))
}

fn warn_errors(evaluation: &Evaluation) {
    for error in &evaluation.errors {
        warn!("{}", error);
    }
}

fn syntax_error(content: &str, err: &serde_yaml::Error) -> EvaluationError {
    let location = err.location();
    let line = location.as_ref().map(|l| l.line());
    let column = location.as_ref().map(|l| l.column());
    // Errors at end of input point past the last line
    let context = line
        .and_then(|line| {
            content
                .lines()
                .nth(line.saturating_sub(1))
                .filter(|text| !text.trim().is_empty())
                .or_else(|| content.lines().rev().find(|text| !text.trim().is_empty()))
        })
        .map(|text| text.trim_end().to_string());

    EvaluationError::Syntax {
        line,
        column,
        message: err.to_string(),
        context,
    }
}

fn unknown_option(option: &str, key: &str, valid: &[&str]) -> EvaluationError {
    EvaluationError::InvalidOption {
        option: option.to_string(),
        message: format!("unknown option, expected one of: {}", valid.join(", ")),
        suggestion: find_similar(key, valid).map(str::to_string),
    }
}

fn invalid(option: &str, message: impl Into<String>) -> EvaluationError {
    EvaluationError::InvalidOption {
        option: option.to_string(),
        message: message.into(),
        suggestion: None,
    }
}

fn evaluate_source(option: &str, value: &YamlValue) -> std::result::Result<String, EvaluationError> {
    let source = value
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| invalid(option, "expected a non-empty URL or path"))?;

    if source.contains("://") {
        url::Url::parse(source)
            .map_err(|err| invalid(option, format!("'{}' is not a valid URL: {}", source, err)))?;
    }

    Ok(source.to_string())
}

fn evaluate_run_list(value: &YamlValue, evaluation: &mut Evaluation) {
    let entries = match value {
        YamlValue::Null => return,
        YamlValue::Sequence(entries) => entries,
        _ => {
            evaluation
                .errors
                .push(invalid("run_list", "expected a list of run-list entries"));
            return;
        }
    };

    for entry in entries {
        let parsed = entry.as_str().and_then(RunListEntry::parse);
        match parsed {
            Some(parsed) => evaluation.run_list.push(parsed),
            None => evaluation.errors.push(invalid(
                "run_list",
                format!(
                    "'{}' is not a run-list entry (expected recipe[cookbook::recipe] or role[name])",
                    yaml_key_to_string(entry)
                ),
            )),
        }
    }
}

fn evaluate_cookbooks(value: &YamlValue, base_dir: &Path, evaluation: &mut Evaluation) {
    let cookbooks = match value {
        YamlValue::Null => return,
        YamlValue::Mapping(cookbooks) => cookbooks,
        _ => {
            evaluation
                .errors
                .push(invalid("cookbooks", "expected a mapping of cookbook names"));
            return;
        }
    };

    for (name, entry) in cookbooks {
        let name = yaml_key_to_string(name);
        evaluation.cookbooks.push(name.clone());
        match entry {
            YamlValue::Null => {}
            YamlValue::String(requirement) => {
                record_version(&name, requirement, evaluation);
            }
            YamlValue::Mapping(options) => evaluate_cookbook(&name, options, base_dir, evaluation),
            _ => evaluation.errors.push(invalid(
                &format!("cookbooks.{}", name),
                "expected a version requirement or a mapping of options",
            )),
        }
    }
}

fn evaluate_cookbook(
    name: &str,
    options: &serde_yaml::Mapping,
    base_dir: &Path,
    evaluation: &mut Evaluation,
) {
    let mut inline = None;
    let mut from_file = None;

    for (key, value) in options {
        let key = yaml_key_to_string(key);
        let option = format!("cookbooks.{}.{}", name, key);
        match key.as_str() {
            "source" => match evaluate_source(&option, value) {
                Ok(source) => {
                    evaluation.cookbook_sources.insert(name.to_string(), source);
                }
                Err(error) => evaluation.errors.push(error),
            },
            "version" => match value.as_str() {
                Some(requirement) => record_version(name, requirement, evaluation),
                None => evaluation
                    .errors
                    .push(invalid(&option, "expected a version requirement string")),
            },
            "attributes" => match value {
                YamlValue::Mapping(_) => match AttributeTree::from_yaml(value.clone()) {
                    Ok(tree) => inline = Some(tree),
                    Err(err) => evaluation.errors.push(invalid(&option, err.to_string())),
                },
                YamlValue::Null => {}
                _ => evaluation
                    .errors
                    .push(invalid(&option, "expected a mapping of attributes")),
            },
            "attributes_file" => match value.as_str() {
                Some(file) => match loader::load_attribute_file(&base_dir.join(file)) {
                    Ok(tree) => from_file = Some(tree),
                    Err(err) => evaluation.errors.push(EvaluationError::Runtime {
                        cookbook: name.to_string(),
                        message: err.to_string(),
                    }),
                },
                None => evaluation
                    .errors
                    .push(invalid(&option, "expected a file path")),
            },
            other => evaluation
                .errors
                .push(unknown_option(&option, other, COOKBOOK_OPTIONS)),
        }
    }

    for tree in [inline, from_file].into_iter().flatten() {
        evaluation.contributions.push(Contribution::new(name, tree));
    }
}

fn record_version(name: &str, requirement: &str, evaluation: &mut Evaluation) {
    match parse_version_requirement(requirement) {
        Ok(requirement) => {
            evaluation
                .cookbook_versions
                .insert(name.to_string(), requirement);
        }
        Err(message) => evaluation.errors.push(invalid(
            &format!("cookbooks.{}.version", name),
            format!("'{}' is not a valid version requirement: {}", requirement, message),
        )),
    }
}

/// Parse a version requirement, accepting the pessimistic `~>` operator
/// common in cookbook metadata alongside semver syntax.
pub fn parse_version_requirement(text: &str) -> std::result::Result<VersionReq, String> {
    let parts = text
        .split(',')
        .map(|part| {
            let compact: String = part.split_whitespace().collect();
            match compact.strip_prefix("~>") {
                Some(version) => pessimistic_range(version),
                None => Ok(compact),
            }
        })
        .collect::<std::result::Result<Vec<_>, String>>()?;

    VersionReq::parse(&parts.join(", ")).map_err(|err| err.to_string())
}

/// `~> 2.7` allows `>= 2.7, < 3.0`; `~> 2.7.1` allows `>= 2.7.1, < 2.8`.
fn pessimistic_range(version: &str) -> std::result::Result<String, String> {
    let numbers = version
        .split('.')
        .map(|part| part.parse::<u64>())
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|_| format!("'{}' is not a numeric version", version))?;

    let out_of_range = || format!("'{}' is out of range", version);
    let next = |n: u64| n.checked_add(1).ok_or_else(out_of_range);

    match numbers.as_slice() {
        [major] => Ok(format!(">={}.0.0, <{}.0.0", major, next(*major)?)),
        [major, minor] => Ok(format!(
            ">={}.{}.0, <{}.0.0",
            major,
            minor,
            next(*major)?
        )),
        [major, minor, patch] => Ok(format!(
            ">={}.{}.{}, <{}.{}.0",
            major,
            minor,
            patch,
            major,
            next(*minor)?
        )),
        _ => Err(format!("'{}' has too many components", version)),
    }
}
