//! Property-based tests for the object model, differ, graph and file merge.
//!
//! These tests use proptest to verify invariants hold across
//! randomly generated inputs.

use std::collections::HashMap;

use proptest::prelude::*;
use tempfile::TempDir;

use kitwork::core::graph::{is_ancestor, merge_base};
use kitwork::core::object::Tree;
use kitwork::core::types::ObjectId;
use kitwork::diff::line::{apply_hunks, diff_lines, join_lines, split_lines};
use kitwork::merge::file::{merge_files, FileMergeOutcome};
use kitwork::merge::strategy::MergeStrategy;
use kitwork::store::ObjectStore;

/// Lines drawn from a tiny alphabet so repeats are common.
fn content() -> impl Strategy<Value = String> {
    prop::collection::vec(
        prop::sample::select(vec!["a", "b", "c", "d", "{", "}", ""]),
        0..40,
    )
    .prop_map(|lines| join_lines(&lines))
}

fn tree_path() -> impl Strategy<Value = String> {
    prop::collection::vec("[a-z]{1,6}", 1..4).prop_map(|parts| parts.join("/"))
}

/// A random DAG: commit `i` has one or two parents among `0..i`.
fn dag() -> impl Strategy<Value = Vec<Vec<usize>>> {
    (1usize..30).prop_flat_map(|n| {
        (0..n)
            .map(|i| {
                if i == 0 {
                    Just(Vec::new()).boxed()
                } else {
                    prop::collection::vec(0..i, 1..=2).boxed()
                }
            })
            .collect::<Vec<_>>()
    })
}

fn node(i: usize) -> ObjectId {
    ObjectId::hash_bytes(format!("commit-{i}").as_bytes())
}

fn graph_of(parents: &[Vec<usize>]) -> HashMap<ObjectId, Vec<ObjectId>> {
    parents
        .iter()
        .enumerate()
        .map(|(i, ps)| (node(i), ps.iter().map(|&p| node(p)).collect()))
        .collect()
}

proptest! {
    /// Diffing content against itself yields no hunks.
    #[test]
    fn diff_with_self_is_empty(x in content(), context in 0usize..5) {
        prop_assert!(diff_lines(&x, &x, context).is_empty());
    }

    /// Applying diff(A, B) to A reconstructs B.
    #[test]
    fn applying_diff_reconstructs_target(a in content(), b in content(), context in 0usize..5) {
        let hunks = diff_lines(&a, &b, context);
        let rebuilt = apply_hunks(&split_lines(&a), &hunks).unwrap();
        prop_assert_eq!(rebuilt, split_lines(&b));
    }

    /// Hunk headers agree with the lines they carry.
    #[test]
    fn hunk_counts_match_lines(a in content(), b in content()) {
        for hunk in diff_lines(&a, &b, 3) {
            prop_assert_eq!(hunk.old_len, hunk.lines.len() - hunk.added());
            prop_assert_eq!(hunk.new_len, hunk.lines.len() - hunk.removed());
        }
    }

    /// Tree ids do not depend on insertion order.
    #[test]
    fn tree_id_is_order_independent(paths in prop::collection::btree_set(tree_path(), 0..20)) {
        let entries: Vec<(String, ObjectId)> = paths
            .iter()
            .map(|p| (p.clone(), ObjectId::hash_bytes(p.as_bytes())))
            .collect();
        let forward = Tree::from_blobs(entries.clone()).unwrap();
        let backward = Tree::from_blobs(entries.into_iter().rev()).unwrap();
        prop_assert_eq!(forward.id(), backward.id());
        prop_assert_eq!(forward.encode(), backward.encode());
    }

    /// Stored bytes come back unchanged under their content hash.
    #[test]
    fn put_get_identity(bytes in prop::collection::vec(any::<u8>(), 0..512)) {
        let temp = TempDir::new().unwrap();
        let store = ObjectStore::new(temp.path().join("objects"));
        store.init().unwrap();

        let id = store.put(&bytes).unwrap();
        prop_assert_eq!(&id, &ObjectId::hash_bytes(&bytes));
        prop_assert_eq!(store.get(&id).unwrap(), bytes.clone());
        prop_assert_eq!(store.put(&bytes).unwrap(), id);
    }

    /// merge_base(a, a) == a, and any merge base is an ancestor of both sides.
    #[test]
    fn merge_base_is_common_ancestor(
        parents in dag(),
        a in any::<prop::sample::Index>(),
        b in any::<prop::sample::Index>(),
    ) {
        let graph = graph_of(&parents);
        let a = node(a.index(parents.len()));
        let b = node(b.index(parents.len()));

        prop_assert_eq!(merge_base(&graph, &a, &a).unwrap(), a.clone());

        let base = merge_base(&graph, &a, &b).unwrap();
        prop_assert!(is_ancestor(&graph, &base, &a).unwrap());
        prop_assert!(is_ancestor(&graph, &base, &b).unwrap());
    }

    /// When only one side changed, the merge takes that side for any strategy.
    #[test]
    fn one_sided_change_takes_that_side(base in content(), changed in content()) {
        for strategy in MergeStrategy::ALL {
            prop_assert_eq!(
                merge_files(&base, &base, &changed, strategy),
                FileMergeOutcome::Clean(changed.clone())
            );
            prop_assert_eq!(
                merge_files(&base, &changed, &base, strategy),
                FileMergeOutcome::Clean(changed.clone())
            );
        }
    }
}
