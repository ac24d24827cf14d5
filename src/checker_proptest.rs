//! Property-based tests for the merge conflict checker.
//!
//! These tests use proptest to generate random attribute trees and verify
//! that the merge invariants hold for all of them.

#[cfg(test)]
mod proptest_tests {
    use crate::attributes::{AttributeTree, Mapping};
    use crate::checker::MergeConflictChecker;
    use crate::path::AttributePath;
    use proptest::prelude::*;
    use serde_json::Value;

    fn scalar() -> impl Strategy<Value = AttributeTree> {
        prop_oneof![
            any::<bool>().prop_map(AttributeTree::scalar),
            (0i64..4).prop_map(AttributeTree::scalar),
            "[a-c]{1,2}".prop_map(AttributeTree::scalar),
            Just(AttributeTree::Scalar(Value::Null)),
        ]
    }

    /// Trees over a small key alphabet so independent trees overlap often.
    fn tree() -> impl Strategy<Value = AttributeTree> {
        scalar().prop_recursive(3, 24, 3, |inner| {
            prop::collection::btree_map("[a-c]", inner, 0..3).prop_map(AttributeTree::Mapping)
        })
    }

    fn mapping() -> impl Strategy<Value = AttributeTree> {
        prop::collection::btree_map("[a-c]", tree(), 0..3).prop_map(AttributeTree::Mapping)
    }

    fn checker_of(trees: &[AttributeTree]) -> MergeConflictChecker {
        let mut checker = MergeConflictChecker::new();
        for (index, tree) in trees.iter().enumerate() {
            checker.add(format!("s{}", index), tree.clone());
        }
        checker
    }

    /// Split a mapping into two trees with disjoint top-level keys.
    fn split(tree: &AttributeTree) -> (AttributeTree, AttributeTree) {
        let mut left = Mapping::new();
        let mut right = Mapping::new();
        if let Some(map) = tree.as_mapping() {
            for (index, (key, value)) in map.iter().enumerate() {
                let side = if index % 2 == 0 { &mut left } else { &mut right };
                side.insert(key.clone(), value.clone());
            }
        }
        (AttributeTree::Mapping(left), AttributeTree::Mapping(right))
    }

    proptest! {
        /// Property: a single source never conflicts and merges to itself
        #[test]
        fn single_source_passes_through(t in tree()) {
            let merged = checker_of(std::slice::from_ref(&t)).check().unwrap();
            prop_assert_eq!(merged.tree(), &t);
        }

        /// Property: merging a tree with itself is the same tree
        #[test]
        fn self_merge_is_idempotent(t in mapping()) {
            let merged = checker_of(&[t.clone(), t.clone()]).check().unwrap();
            prop_assert_eq!(merged.tree(), &t);
        }

        /// Property: disjoint halves of a tree merge back into the tree
        #[test]
        fn disjoint_halves_reassemble(t in mapping()) {
            let (left, right) = split(&t);
            let merged = checker_of(&[left, right]).check().unwrap();
            prop_assert_eq!(merged.tree(), &t);
        }

        /// Property: success or failure does not depend on contribution order
        #[test]
        fn outcome_is_order_independent(a in mapping(), b in mapping()) {
            let forward = checker_of(&[a.clone(), b.clone()]).check();
            let backward = checker_of(&[b, a]).check();
            prop_assert_eq!(forward.is_ok(), backward.is_ok());
        }

        /// Property: a reported conflict names a path both sources supply
        #[test]
        fn conflict_path_exists_in_sources(a in mapping(), b in mapping()) {
            if let Err(conflict) = checker_of(&[a.clone(), b.clone()]).check() {
                prop_assert!(a.get(&conflict.attribute_path).is_some());
                prop_assert!(b.get(&conflict.attribute_path).is_some());
                prop_assert_eq!(conflict.provided_by.last().map(String::as_str), Some("s1"));
            }
        }

        /// Property: every merged leaf appears in at least one source
        #[test]
        fn merged_leaves_come_from_sources(a in mapping(), b in mapping()) {
            if let Ok(merged) = checker_of(&[a.clone(), b.clone()]).check() {
                for (path, sources) in merged.provenance() {
                    prop_assert!(!sources.is_empty());
                    let node = merged.get(path);
                    prop_assert!(node.is_some());
                    if let Some(AttributeTree::Scalar(_)) = node {
                        prop_assert!(
                            a.get(path) == node || b.get(path) == node,
                            "leaf at {} not found in any source",
                            path
                        );
                    }
                }
            }
        }

        /// Property: rendered paths parse back to the same path
        #[test]
        fn path_render_parse_round_trip(keys in prop::collection::vec("[a-z0-9_]{1,6}", 0..5)) {
            let path = AttributePath::new(keys);
            let parsed = AttributePath::parse(&path.to_string()).unwrap();
            prop_assert_eq!(parsed, path);
        }
    }
}
