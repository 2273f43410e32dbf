use std::cell::RefCell;
use std::ops::Range;

use crate::node::Node;

pub fn tree_mapreduce<R>(
    nodes: &[Node],
    f_leaf: impl FnMut(&Node) -> R,
    f_branch: impl FnMut(&Node) -> R,
    op: impl FnMut(R, &[R]) -> R,
) -> R {
    tree_mapreduce_with_stack(nodes, f_leaf, f_branch, op, None)
}

pub fn tree_mapreduce_with_stack<R>(
    nodes: &[Node],
    mut f_leaf: impl FnMut(&Node) -> R,
    mut f_branch: impl FnMut(&Node) -> R,
    mut op: impl FnMut(R, &[R]) -> R,
    reusable_stack: Option<&mut Vec<R>>,
) -> R {
    match reusable_stack {
        Some(stack) => {
            stack.clear();
            tree_mapreduce_impl(nodes, stack, &mut f_leaf, &mut f_branch, &mut op)
        }
        None => {
            let mut stack = Vec::with_capacity(nodes.len());
            tree_mapreduce_impl(nodes, &mut stack, &mut f_leaf, &mut f_branch, &mut op)
        }
    }
}

fn tree_mapreduce_impl<R>(
    nodes: &[Node],
    stack: &mut Vec<R>,
    f_leaf: &mut impl FnMut(&Node) -> R,
    f_branch: &mut impl FnMut(&Node) -> R,
    op: &mut impl FnMut(R, &[R]) -> R,
) -> R {
    for n in nodes {
        if n.is_leaf() {
            stack.push(f_leaf(n));
        } else {
            let a = n.arity as usize;
            let start = stack.len().checked_sub(a).expect("invalid postfix (stack underflow)");
            let parent = f_branch(n);
            let out = op(parent, &stack[start..]);
            stack.truncate(start);
            stack.push(out);
        }
    }
    assert_eq!(stack.len(), 1, "invalid postfix (did not reduce to one root)");
    stack.pop().expect("non-empty stack")
}

thread_local! {
    static COUNT_DEPTH_STACK: RefCell<Vec<usize>> = const { RefCell::new(Vec::new()) };
}

/// Depth of the tree; a single leaf has depth 1.
pub fn count_depth(nodes: &[Node]) -> usize {
    COUNT_DEPTH_STACK.with(|stack| {
        let mut stack = stack.borrow_mut();
        tree_mapreduce_with_stack(
            nodes,
            |_| 1usize,
            |_| 0usize,
            |_, children| children.iter().copied().max().unwrap_or(0) + 1,
            Some(&mut stack),
        )
    })
}

pub fn count_leaf_nodes(nodes: &[Node]) -> usize {
    nodes.iter().filter(|n| n.is_leaf()).count()
}

pub fn count_function_nodes(nodes: &[Node]) -> usize {
    nodes.iter().filter(|n| n.is_function()).count()
}

pub fn has_variables(nodes: &[Node]) -> bool {
    nodes.iter().any(|n| n.is_variable())
}

/// Arity check only: every function finds enough operands and one root remains.
pub fn is_valid_postfix(nodes: &[Node]) -> bool {
    let mut stack: usize = 0;
    for n in nodes {
        if n.arity != n.kind.arity() {
            return false;
        }
        let a = n.arity as usize;
        if stack < a {
            return false;
        }
        stack = stack - a + 1;
    }
    stack == 1
}

/// Subtree slot counts computed from arities alone.
pub fn subtree_sizes(nodes: &[Node]) -> Vec<usize> {
    let mut sizes = vec![0usize; nodes.len()];
    let mut stack: Vec<usize> = Vec::with_capacity(nodes.len());

    for (i, n) in nodes.iter().enumerate() {
        let mut sum = 1usize;
        for _ in 0..n.arity {
            sum += stack.pop().expect("invalid postfix (stack underflow)");
        }
        sizes[i] = sum;
        stack.push(sum);
    }

    assert_eq!(stack.len(), 1, "invalid postfix (did not reduce to one root)");
    sizes
}

/// Slot range of the subtree rooted at `root_idx`, read from the stored lengths.
#[inline]
pub fn subtree_range(nodes: &[Node], root_idx: usize) -> Range<usize> {
    let sz = nodes[root_idx].subtree_len();
    (root_idx + 1 - sz)..(root_idx + 1)
}

/// Roots of the children of `root_idx`, last child first.
pub fn child_indices(nodes: &[Node], root_idx: usize) -> impl Iterator<Item = usize> + '_ {
    let arity = nodes[root_idx].arity as usize;
    let mut next = root_idx;
    (0..arity).map(move |_| {
        let child = next - 1;
        next = child + 1 - nodes[child].subtree_len();
        child
    })
}

/// True when every stored length equals one plus the lengths of its children.
pub fn lengths_consistent(nodes: &[Node]) -> bool {
    for (i, n) in nodes.iter().enumerate() {
        let len = n.subtree_len();
        if len == 0 || len > i + 1 {
            return false;
        }
        let mut next = i;
        let mut sum = 1usize;
        for _ in 0..n.arity {
            if next == 0 {
                return false;
            }
            let child = next - 1;
            let child_len = nodes[child].subtree_len();
            if child_len == 0 || child_len > child + 1 {
                return false;
            }
            sum += child_len;
            next = child + 1 - child_len;
        }
        if sum != len {
            return false;
        }
    }
    nodes.last().is_some_and(|root| root.subtree_len() == nodes.len())
}

/// Distance of every node from the root (the root is at level 1).
pub fn node_levels(nodes: &[Node]) -> Vec<usize> {
    let mut levels = vec![0usize; nodes.len()];
    let Some(root) = nodes.len().checked_sub(1) else {
        return levels;
    };
    levels[root] = 1;
    for i in (0..nodes.len()).rev() {
        let level = levels[i];
        for c in child_indices(nodes, i) {
            levels[c] = level + 1;
        }
    }
    levels
}

/// Depth of the subtree rooted at every node (leaves have depth 1).
pub fn subtree_depths(nodes: &[Node]) -> Vec<usize> {
    let mut depths = vec![1usize; nodes.len()];
    for i in 0..nodes.len() {
        if nodes[i].is_function() {
            depths[i] = 1 + child_indices(nodes, i).map(|c| depths[c]).max().unwrap_or(0);
        }
    }
    depths
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeKind;

    // (x0 + 2) * sin(x1)
    fn sample() -> Vec<Node> {
        let mut nodes = vec![
            Node::variable(0, 1.0),
            Node::constant(2.0),
            Node::function(NodeKind::Add),
            Node::variable(1, 1.0),
            Node::function(NodeKind::Sin),
            Node::function(NodeKind::Mul),
        ];
        let sizes = subtree_sizes(&nodes);
        for (n, s) in nodes.iter_mut().zip(sizes) {
            n.length = s as u32;
        }
        nodes
    }

    #[test]
    fn sizes_and_ranges() {
        let nodes = sample();
        assert_eq!(subtree_sizes(&nodes), vec![1, 1, 3, 1, 2, 6]);
        assert_eq!(subtree_range(&nodes, 2), 0..3);
        assert_eq!(subtree_range(&nodes, 4), 3..5);
        assert_eq!(child_indices(&nodes, 5).collect::<Vec<_>>(), vec![4, 2]);
        assert!(lengths_consistent(&nodes));
    }

    #[test]
    fn levels_and_depths() {
        let nodes = sample();
        assert_eq!(node_levels(&nodes), vec![3, 3, 2, 3, 2, 1]);
        assert_eq!(subtree_depths(&nodes), vec![1, 1, 2, 1, 2, 3]);
        assert_eq!(count_depth(&nodes), 3);
    }

    #[test]
    fn detects_broken_lengths() {
        let mut nodes = sample();
        nodes[2].length = 2;
        assert!(is_valid_postfix(&nodes));
        assert!(!lengths_consistent(&nodes));
    }

    #[test]
    fn detects_missing_operands() {
        let nodes = vec![Node::constant(1.0), Node::function(NodeKind::Add)];
        assert!(!is_valid_postfix(&nodes));
    }
}
