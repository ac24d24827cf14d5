//! # Attribute File Loading
//!
//! Reads attribute files from disk and turns them into named
//! [`Contribution`]s for the checker.
//!
//! ## Formats
//!
//! The format is chosen by file extension:
//!
//! - `.json` - JSON object
//! - `.yaml` / `.yml` - YAML mapping (an empty document is an empty mapping)
//! - `.toml` - TOML table
//!
//! ## Naming Sources
//!
//! A command-line input is either `NAME=PATH`, which names the source
//! explicitly, or a bare path, in which case the file stem becomes the source
//! name (`attributes/nginx.json` is source `nginx`). Bare inputs may also be
//! glob patterns or directories; both expand to every supported file they
//! match, in sorted order.

use std::path::{Path, PathBuf};

use log::debug;
use rayon::prelude::*;
use walkdir::WalkDir;

use crate::attributes::AttributeTree;
use crate::checker::Contribution;
use crate::error::{Error, Result};

/// Supported attribute file formats.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AttributeFormat {
    Json,
    Yaml,
    Toml,
}

impl AttributeFormat {
    /// Pick the format from a path's extension (case-insensitive).
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "json" => Some(AttributeFormat::Json),
            "yaml" | "yml" => Some(AttributeFormat::Yaml),
            "toml" => Some(AttributeFormat::Toml),
            _ => None,
        }
    }
}

/// Parse attribute text in the given format.
///
/// # Errors
///
/// Returns the format's parse error, or `Error::InvalidAttributes` when the
/// document is valid but its top level is not a mapping, a YAML mapping has
/// two keys with the same string form, or a float is NaN or infinite.
pub fn parse_attributes(content: &str, format: AttributeFormat) -> Result<AttributeTree> {
    let tree = match format {
        AttributeFormat::Json => {
            AttributeTree::from_json(serde_json::from_str::<serde_json::Value>(content)?)
        }
        AttributeFormat::Yaml => match serde_yaml::from_str::<serde_yaml::Value>(content)? {
            serde_yaml::Value::Null => AttributeTree::empty(),
            value => AttributeTree::from_yaml(value)?,
        },
        AttributeFormat::Toml => {
            AttributeTree::from_toml(toml::Value::Table(toml::from_str::<toml::Table>(content)?))?
        }
    };

    if !tree.is_mapping() {
        return Err(Error::InvalidAttributes {
            message: "top level must be a mapping of attribute names to values".to_string(),
        });
    }

    Ok(tree)
}

/// Read and parse one attribute file.
///
/// # Errors
///
/// Returns `Error::UnsupportedFormat` for unknown extensions and
/// `Error::AttributeFile` (carrying the path) for read or parse failures.
pub fn load_attribute_file(path: &Path) -> Result<AttributeTree> {
    let format = AttributeFormat::from_path(path).ok_or_else(|| Error::UnsupportedFormat {
        path: path.display().to_string(),
    })?;

    let content = std::fs::read_to_string(path).map_err(|err| Error::AttributeFile {
        path: path.display().to_string(),
        message: err.to_string(),
    })?;

    parse_attributes(&content, format).map_err(|err| Error::AttributeFile {
        path: path.display().to_string(),
        message: err.to_string(),
    })
}

/// A named attribute file to load.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceSpec {
    pub name: String,
    pub path: PathBuf,
}

impl SourceSpec {
    /// Name the source after the file stem.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self { name, path }
    }

    /// Parse `NAME=PATH`, falling back to [`SourceSpec::from_path`].
    ///
    /// The part before `=` only counts as a name if it is non-empty, has no
    /// path separator and does not start with `.`, so `./a=b.json` stays a
    /// plain path while `my.cookbook=attrs.json` is named `my.cookbook`.
    pub fn parse(input: &str) -> Self {
        match input.split_once('=') {
            Some((name, path))
                if !name.is_empty()
                    && !path.is_empty()
                    && !name.contains(['/', '\\'])
                    && !name.starts_with('.') =>
            {
                Self {
                    name: name.to_string(),
                    path: PathBuf::from(path),
                }
            }
            _ => Self::from_path(input),
        }
    }

    fn is_named(input: &str) -> bool {
        Self::parse(input) != Self::from_path(input)
    }
}

/// Expand command-line inputs into source specs.
///
/// Named inputs (`NAME=PATH`) are taken literally. Directories are walked
/// recursively and globs are expanded; both keep only supported formats and
/// are sorted by path. Anything else is a single file.
///
/// # Errors
///
/// Returns `Error::Glob` for invalid patterns and `Error::AttributeFile` when
/// a pattern or directory yields no attribute files.
pub fn expand_inputs(inputs: &[String]) -> Result<Vec<SourceSpec>> {
    let mut specs = Vec::new();

    for input in inputs {
        if SourceSpec::is_named(input) {
            specs.push(SourceSpec::parse(input));
            continue;
        }

        let path = Path::new(input);
        let expanded = if path.is_dir() {
            walk_directory(path)
        } else if input.contains(['*', '?', '[']) {
            expand_glob(input)?
        } else {
            specs.push(SourceSpec::from_path(path));
            continue;
        };

        if expanded.is_empty() {
            return Err(Error::AttributeFile {
                path: input.clone(),
                message: "no .json, .yaml, .yml or .toml files found".to_string(),
            });
        }
        debug!("Expanded '{}' to {} attribute file(s)", input, expanded.len());
        specs.extend(expanded.into_iter().map(SourceSpec::from_path));
    }

    Ok(specs)
}

fn walk_directory(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| AttributeFormat::from_path(path).is_some())
        .collect();
    files.sort();
    files
}

fn expand_glob(pattern: &str) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in glob::glob(pattern)? {
        let path = entry.map_err(|err| Error::AttributeFile {
            path: err.path().display().to_string(),
            message: err.error().to_string(),
        })?;
        if path.is_file() && AttributeFormat::from_path(&path).is_some() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Load every spec into a contribution, keeping input order.
///
/// Files are parsed in parallel. If several files fail, which error is
/// returned is unspecified.
pub fn load_contributions(specs: &[SourceSpec]) -> Result<Vec<Contribution>> {
    specs
        .par_iter()
        .map(|spec| {
            load_attribute_file(&spec.path).map(|tree| Contribution::new(spec.name.clone(), tree))
        })
        .collect()
}
