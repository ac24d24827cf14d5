//! # Merge Command Implementation
//!
//! This module implements the `merge` subcommand, which merges every attribute
//! source and prints the combined tree.
//!
//! ## Output Formats
//!
//! - **yaml** (default): The merged attributes as a YAML document.
//! - **json**: The merged attributes as pretty-printed JSON.
//! - **tree**: A hierarchical view where every leaf is annotated with the
//!   sources that supplied it.
//!
//! A conflict aborts the command before anything is printed.

use anyhow::Result;
use clap::{Args, ValueEnum};
use ptree::{print_tree, TreeItem};
use std::borrow::Cow;

use attr_merge::attributes::AttributeTree;
use attr_merge::checker::MergedAttributes;
use attr_merge::output::{render_conflict, OutputConfig};
use attr_merge::path::AttributePath;
use attr_merge::suggestions;

use super::{gather_checker, InputArgs};

/// Output format for `merge`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum MergeOutput {
    #[default]
    Yaml,
    Json,
    /// Annotated tree view
    Tree,
}

/// Merge all attribute sources and print the result
#[derive(Args, Debug)]
pub struct MergeArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// How to print the merged attributes.
    #[arg(short, long, value_enum, default_value_t = MergeOutput::Yaml)]
    pub output: MergeOutput,
}

/// Execute the `merge` command.
pub fn execute(args: MergeArgs, color_flag: &str) -> Result<()> {
    let out = OutputConfig::from_env_and_flag(color_flag);
    let checker = gather_checker(&args.input)?;

    let merged = match checker.check() {
        Ok(merged) => merged,
        Err(conflict) => {
            eprint!("{}", render_conflict(&conflict, &out));
            return Err(suggestions::attribute_conflict(&conflict));
        }
    };

    match args.output {
        MergeOutput::Yaml => print!("{}", serde_yaml::to_string(merged.tree())?),
        MergeOutput::Json => println!("{}", serde_json::to_string_pretty(merged.tree())?),
        MergeOutput::Tree => {
            let root = build_tree_node(&merged, "attributes".to_string(), &AttributePath::root());
            print_tree(&root).map_err(|e| anyhow::anyhow!("Failed to display tree: {}", e))?;
        }
    }

    Ok(())
}

/// Build a display node for the merged node at `path`.
fn build_tree_node(merged: &MergedAttributes, label: String, path: &AttributePath) -> TreeNode {
    let sources = merged
        .sources_at(path)
        .map(|sources| sources.join(", "))
        .unwrap_or_default();

    match merged.get(path) {
        Some(AttributeTree::Mapping(children)) => TreeNode {
            label,
            children: children
                .keys()
                .map(|key| build_tree_node(merged, key.clone(), &path.child(key)))
                .collect(),
        },
        Some(AttributeTree::Scalar(value)) => TreeNode {
            label: format!("{} = {} ({})", label, value, sources),
            children: vec![],
        },
        None => TreeNode {
            label,
            children: vec![],
        },
    }
}

/// Tree node structure for ptree visualization
#[derive(Clone)]
struct TreeNode {
    label: String,
    children: Vec<TreeNode>,
}

impl TreeItem for TreeNode {
    type Child = TreeNode;

    fn write_self<W: std::io::Write>(
        &self,
        f: &mut W,
        _style: &ptree::Style,
    ) -> std::io::Result<()> {
        write!(f, "{}", self.label)
    }

    fn children(&self) -> Cow<'_, [Self::Child]> {
        Cow::Borrowed(&self.children)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use attr_merge::checker::MergeConflictChecker;
    use serde_json::json;

    #[test]
    fn test_build_tree_node_annotates_leaves() {
        let mut checker = MergeConflictChecker::new();
        checker.add("web", AttributeTree::from_json(json!({"nginx": {"port": 80}})));
        checker.add("proxy", AttributeTree::from_json(json!({"nginx": {"port": 80, "ssl": true}})));
        let merged = checker.check().unwrap();

        let root = build_tree_node(&merged, "attributes".to_string(), &AttributePath::root());
        assert_eq!(root.label, "attributes");
        let nginx = &root.children[0];
        assert_eq!(nginx.label, "nginx");
        let labels: Vec<_> = nginx.children.iter().map(|c| c.label.as_str()).collect();
        assert_eq!(labels, ["port = 80 (web, proxy)", "ssl = true (proxy)"]);
    }
}
