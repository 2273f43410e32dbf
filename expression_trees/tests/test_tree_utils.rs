mod common;

use common::*;
use expression_trees::{
    NodeKind, Tree, count_depth, count_function_nodes, count_leaf_nodes, has_variables, is_valid_postfix,
    lengths_consistent, subtree_range, subtree_sizes, tree_mapreduce,
};

#[test]
fn depth_and_counts_match_expected() {
    let tree = tree_readme_like();
    let nodes = tree.nodes();

    assert_eq!(count_leaf_nodes(nodes), 3);
    assert_eq!(count_function_nodes(nodes), 3);
    assert!(has_variables(nodes));
    assert!(is_valid_postfix(nodes));
    assert!(lengths_consistent(nodes));

    // x1 * cos(x2 - c) has depth 4 with leaf depth 1.
    assert_eq!(count_depth(nodes), 4);
    assert_eq!(tree.depth(), 4);

    let depth_via_fold = tree_mapreduce(
        nodes,
        |_| 1usize,
        |_| 1usize,
        |p, ch| p + ch.iter().copied().max().unwrap_or(0),
    );
    assert_eq!(depth_via_fold, 4);
}

#[test]
fn stored_lengths_match_stack_sizes() {
    let tree = tree_readme_like();
    let sizes = subtree_sizes(tree.nodes());
    for (i, n) in tree.nodes().iter().enumerate() {
        assert_eq!(n.subtree_len(), sizes[i]);
        assert_eq!(subtree_range(tree.nodes(), i).len(), sizes[i]);
    }
    assert_eq!(tree.subtree_range(4), 1..5);
}

#[test]
fn levels_and_subtree_depths_agree_with_depth() {
    let tree = tree_readme_like();
    let levels = tree.levels();
    let depths = tree.subtree_depths();
    for i in 0..tree.len() {
        assert!(levels[i] + depths[i] - 1 <= tree.depth());
    }
    assert_eq!(depths[tree.len() - 1], tree.depth());
    assert_eq!(levels.iter().copied().max(), Some(tree.depth()));
}

#[test]
fn replace_subtree_keeps_invariants() {
    let tree = tree_readme_like();
    let repl = Tree::new(vec![var(0), op(NodeKind::Exp), op(NodeKind::Log)]).unwrap();
    let out = tree.replace_subtree(3, repl.nodes());
    assert!(out.is_valid());
    assert_eq!(out.len(), tree.len() - 3 + 3);
    assert_eq!(out.count_kind(NodeKind::Sub), 0);
    assert_eq!(out.count_kind(NodeKind::Log), 1);
}

#[test]
fn fingerprint_tracks_values() {
    let a = tree_readme_like();
    let mut b = a.clone();
    assert_eq!(a.fingerprint(), b.fingerprint());
    b.nodes_mut()[2].value = 0.25;
    assert_ne!(a.fingerprint(), b.fingerprint());
}
