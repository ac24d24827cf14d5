//! # Merge Conflict Checker
//!
//! The checker collects named attribute contributions and deep-merges them in
//! one pass, failing on the first path where two sources disagree.
//!
//! ## Merge Rules
//!
//! Contributions are merged in the order they were added. Within one
//! contribution keys are visited in sorted order, parents before children.
//! For every key an incoming tree offers:
//!
//! - A key nobody supplied yet is taken as-is and tagged with the source.
//! - Two mappings are merged key by key, so sources may fill disjoint
//!   sub-keys of a shared parent.
//! - Two equal scalars collapse into one value; the new source is recorded as
//!   another provider of that path.
//! - Anything else is a conflict at the current path: two different scalars,
//!   or a mapping meeting a scalar.
//!
//! Conflicts are therefore always reported at the deepest path where the
//! disagreement shows up, never at an ancestor.
//!
//! ## Example
//!
//! ```
//! use attr_merge::attributes::AttributeTree;
//! use attr_merge::checker::MergeConflictChecker;
//! use serde_json::json;
//!
//! let mut checker = MergeConflictChecker::new();
//! checker.add("foo", AttributeTree::from_json(json!({"a": {"b": "c"}})));
//! checker.add("bar", AttributeTree::from_json(json!({"a": {"b": "d"}})));
//!
//! let conflict = checker.check().unwrap_err();
//! assert_eq!(conflict.attribute_path.to_string(), "[a][b]");
//! assert_eq!(conflict.provided_by, ["foo", "bar"]);
//! ```

use std::collections::BTreeMap;

use log::debug;
use serde_json::Value as JsonValue;

use crate::attributes::{AttributeTree, Mapping};
use crate::error::ConflictError;
use crate::path::AttributePath;

/// One source's offered attributes.
#[derive(Clone, Debug, PartialEq)]
pub struct Contribution {
    /// Name of the source, e.g. a cookbook name. Not required to be unique.
    pub source: String,
    pub tree: AttributeTree,
}

impl Contribution {
    pub fn new(source: impl Into<String>, tree: AttributeTree) -> Self {
        Self {
            source: source.into(),
            tree,
        }
    }
}

/// Accumulates contributions and validates that they merge cleanly.
///
/// A checker belongs to a single validation run: feed it with [`add`] and
/// finish with [`check`]. `check` borrows the checker immutably, so it can be
/// called any number of times and always re-derives its answer from the same
/// stored contributions.
///
/// [`add`]: MergeConflictChecker::add
/// [`check`]: MergeConflictChecker::check
#[derive(Clone, Debug, Default)]
pub struct MergeConflictChecker {
    contributions: Vec<Contribution>,
}

impl MergeConflictChecker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a contribution. Nothing is validated until [`check`](Self::check).
    pub fn add(&mut self, source: impl Into<String>, tree: AttributeTree) {
        self.contributions.push(Contribution::new(source, tree));
    }

    /// Contributions in the order they were added.
    pub fn contributions(&self) -> &[Contribution] {
        &self.contributions
    }

    pub fn len(&self) -> usize {
        self.contributions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contributions.is_empty()
    }

    /// Merge every stored contribution, stopping at the first conflict.
    ///
    /// # Errors
    ///
    /// Returns a [`ConflictError`] naming the conflicting path and every source
    /// that supplied a value there. No partial merge result is produced.
    pub fn check(&self) -> Result<MergedAttributes, ConflictError> {
        let mut root: Option<MergedNode> = None;
        let mut path = AttributePath::root();

        for contribution in &self.contributions {
            debug!(
                "Merging {} attribute(s) from '{}'",
                contribution.tree.leaf_count(),
                contribution.source
            );
            match root.as_mut() {
                Some(node) => node
                    .absorb(&contribution.tree, &contribution.source, &mut path)
                    .inspect_err(|conflict| debug!("{}", conflict))?,
                None => root = Some(MergedNode::from_tree(&contribution.tree, &contribution.source)),
            }
        }

        let root = root.unwrap_or_else(|| MergedNode::Branch {
            children: BTreeMap::new(),
            sources: Vec::new(),
        });
        let mut provenance = BTreeMap::new();
        let tree = root.into_tree(&mut path, &mut provenance);

        Ok(MergedAttributes { tree, provenance })
    }
}

impl Extend<Contribution> for MergeConflictChecker {
    fn extend<I: IntoIterator<Item = Contribution>>(&mut self, iter: I) {
        self.contributions.extend(iter);
    }
}

impl FromIterator<Contribution> for MergeConflictChecker {
    fn from_iter<I: IntoIterator<Item = Contribution>>(iter: I) -> Self {
        Self {
            contributions: iter.into_iter().collect(),
        }
    }
}

/// The outcome of a successful check: the unified tree plus, for each path,
/// the sources that supplied it.
#[derive(Clone, Debug, PartialEq)]
pub struct MergedAttributes {
    tree: AttributeTree,
    provenance: BTreeMap<AttributePath, Vec<String>>,
}

impl MergedAttributes {
    pub fn tree(&self) -> &AttributeTree {
        &self.tree
    }

    pub fn into_tree(self) -> AttributeTree {
        self.tree
    }

    pub fn get(&self, path: &AttributePath) -> Option<&AttributeTree> {
        self.tree.get(path)
    }

    /// Sources that supplied a value at `path`, in merge order.
    pub fn sources_at(&self, path: &AttributePath) -> Option<&[String]> {
        self.provenance.get(path).map(Vec::as_slice)
    }

    /// Every merged path with its providers, parents before children.
    pub fn provenance(&self) -> impl Iterator<Item = (&AttributePath, &[String])> {
        self.provenance
            .iter()
            .map(|(path, sources)| (path, sources.as_slice()))
    }
}

/// Working node of the merge: a value plus the sources that supplied it.
enum MergedNode {
    Leaf {
        value: JsonValue,
        sources: Vec<String>,
    },
    Branch {
        children: BTreeMap<String, MergedNode>,
        sources: Vec<String>,
    },
}

impl MergedNode {
    fn from_tree(tree: &AttributeTree, source: &str) -> Self {
        match tree {
            AttributeTree::Scalar(value) => MergedNode::Leaf {
                value: value.clone(),
                sources: vec![source.to_string()],
            },
            AttributeTree::Mapping(mapping) => MergedNode::Branch {
                children: mapping
                    .iter()
                    .map(|(key, child)| (key.clone(), MergedNode::from_tree(child, source)))
                    .collect(),
                sources: vec![source.to_string()],
            },
        }
    }

    fn sources(&self) -> &[String] {
        match self {
            MergedNode::Leaf { sources, .. } | MergedNode::Branch { sources, .. } => sources,
        }
    }

    /// Fold `incoming` from `source` into this node, which lives at `path`.
    fn absorb(
        &mut self,
        incoming: &AttributeTree,
        source: &str,
        path: &mut AttributePath,
    ) -> Result<(), ConflictError> {
        match (self, incoming) {
            (MergedNode::Branch { children, sources }, AttributeTree::Mapping(mapping)) => {
                sources.push(source.to_string());
                merge_mapping(children, mapping, source, path)
            }
            (MergedNode::Leaf { value, sources }, AttributeTree::Scalar(scalar))
                if *value == *scalar =>
            {
                sources.push(source.to_string());
                Ok(())
            }
            (node, _) => {
                let mut provided_by = node.sources().to_vec();
                provided_by.push(source.to_string());
                Err(ConflictError::new(path.clone(), provided_by))
            }
        }
    }

    fn into_tree(
        self,
        path: &mut AttributePath,
        provenance: &mut BTreeMap<AttributePath, Vec<String>>,
    ) -> AttributeTree {
        match self {
            MergedNode::Leaf { value, sources } => {
                provenance.insert(path.clone(), sources);
                AttributeTree::Scalar(value)
            }
            MergedNode::Branch { children, sources } => {
                provenance.insert(path.clone(), sources);
                let mut mapping = Mapping::new();
                for (key, child) in children {
                    path.push(&key);
                    let tree = child.into_tree(path, provenance);
                    path.pop();
                    mapping.insert(key, tree);
                }
                AttributeTree::Mapping(mapping)
            }
        }
    }
}

fn merge_mapping(
    target: &mut BTreeMap<String, MergedNode>,
    incoming: &Mapping,
    source: &str,
    path: &mut AttributePath,
) -> Result<(), ConflictError> {
    for (key, value) in incoming {
        path.push(key);
        match target.get_mut(key) {
            Some(existing) => existing.absorb(value, source, path)?,
            None => {
                target.insert(key.clone(), MergedNode::from_tree(value, source));
            }
        }
        path.pop();
    }
    Ok(())
}
