//! # Attribute Merge Library
//!
//! This library checks that attribute sets contributed by several independent
//! sources can be deep-merged without any two sources disagreeing on a value.
//! It is designed to be used by the `attr-merge` command-line tool but can
//! also be embedded wherever nested configuration from several owners has to
//! be combined safely.
//!
//! ## Quick Example
//!
//! ```
//! use attr_merge::attributes::AttributeTree;
//! use attr_merge::checker::MergeConflictChecker;
//! use serde_json::json;
//!
//! let mut checker = MergeConflictChecker::new();
//! checker.add("nginx", AttributeTree::from_json(json!({"web": {"port": 80}})));
//! checker.add("app", AttributeTree::from_json(json!({"web": {"root": "/srv"}})));
//!
//! let merged = checker.check().unwrap();
//! assert_eq!(
//!     merged.tree().to_json(),
//!     json!({"web": {"port": 80, "root": "/srv"}})
//! );
//! ```
//!
//! ## Core Concepts
//!
//! - **Attribute trees (`attributes`)**: A closed mapping-or-scalar type built
//!   from JSON, YAML or TOML documents.
//! - **Paths (`path`)**: The location of a node, rendered as `[a][b]`.
//! - **Checker (`checker`)**: Collects named contributions and merges them,
//!   failing at the first conflicting path.
//! - **Loading (`loader`)**: Turns attribute files, directories and globs into
//!   contributions.
//! - **Manifests (`config`)**: Evaluates `.attr-merge.yaml`, which declares
//!   cookbooks, their sources and the attributes each one contributes.
//!
//! ## Execution Flow
//!
//! 1.  **Evaluate**: Read the manifest and collect every problem in it.
//! 2.  **Load**: Parse the attribute files named on the command line.
//! 3.  **Check**: Merge all contributions in order, manifest first.
//! 4.  **Report**: Print the merged result or the conflict with its sources.

pub mod attributes;
pub mod checker;
pub mod config;
pub mod error;
pub mod loader;
pub mod output;
pub mod path;
pub mod suggestions;

#[cfg(test)]
mod checker_proptest;
