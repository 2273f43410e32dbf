use std::ops::Range;

use thiserror::Error;

use crate::node::{Node, NodeKind};
use crate::node_utils::{
    child_indices, count_depth, is_valid_postfix, lengths_consistent, node_levels, subtree_depths, subtree_range,
    subtree_sizes,
};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TreeError {
    #[error("tree has no nodes")]
    Empty,

    #[error("node sequence is not a valid postfix encoding")]
    InvalidPostfix,

    #[error("tree has {0} nodes, more than a subtree length can address")]
    TooLong(usize),

    #[error("unknown symbol {0:?}")]
    UnknownSymbol(String),
}

/// An expression tree stored as a postfix array.
///
/// Children precede their parent and every node records the number of slots
/// its subtree spans, so the subtree of node `i` is `i + 1 - length ..= i`.
/// The root is the last node.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    /// Build a tree from postfix nodes, recomputing subtree lengths.
    pub fn new(nodes: Vec<Node>) -> Result<Self, TreeError> {
        if nodes.is_empty() {
            return Err(TreeError::Empty);
        }
        if nodes.len() > u32::MAX as usize {
            return Err(TreeError::TooLong(nodes.len()));
        }
        if !is_valid_postfix(&nodes) {
            return Err(TreeError::InvalidPostfix);
        }
        let mut tree = Self { nodes };
        tree.update_lengths();
        Ok(tree)
    }

    pub fn leaf(node: Node) -> Self {
        debug_assert!(node.is_leaf());
        Self {
            nodes: vec![Node { length: 1, ..node }],
        }
    }

    #[inline]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Mutable access to the nodes. Structural edits must keep arities valid
    /// and be followed by [`Tree::update_lengths`].
    #[inline]
    pub fn nodes_mut(&mut self) -> &mut [Node] {
        &mut self.nodes
    }

    pub fn into_nodes(self) -> Vec<Node> {
        self.nodes
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn depth(&self) -> usize {
        count_depth(&self.nodes)
    }

    #[inline]
    pub fn root(&self) -> &Node {
        &self.nodes[self.nodes.len() - 1]
    }

    pub fn update_lengths(&mut self) {
        let sizes = subtree_sizes(&self.nodes);
        for (n, s) in self.nodes.iter_mut().zip(sizes) {
            n.length = s as u32;
        }
    }

    /// Full structural check: arities, stored lengths, and a single root.
    pub fn is_valid(&self) -> bool {
        !self.nodes.is_empty() && is_valid_postfix(&self.nodes) && lengths_consistent(&self.nodes)
    }

    #[inline]
    pub fn subtree_range(&self, i: usize) -> Range<usize> {
        subtree_range(&self.nodes, i)
    }

    pub fn subtree(&self, i: usize) -> &[Node] {
        &self.nodes[self.subtree_range(i)]
    }

    /// Child roots of node `i`, first child first.
    pub fn children(&self, i: usize) -> Vec<usize> {
        let mut out: Vec<usize> = child_indices(&self.nodes, i).collect();
        out.reverse();
        out
    }

    /// Level of each node, the root being at level 1.
    pub fn levels(&self) -> Vec<usize> {
        node_levels(&self.nodes)
    }

    /// Depth of the subtree rooted at each node.
    pub fn subtree_depths(&self) -> Vec<usize> {
        subtree_depths(&self.nodes)
    }

    /// Number of numeric parameters (one per leaf).
    pub fn coefficient_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_leaf()).count()
    }

    /// Leaf values in node order: constants and variable weights.
    pub fn coefficients(&self) -> Vec<f64> {
        self.nodes.iter().filter(|n| n.is_leaf()).map(|n| n.value).collect()
    }

    pub fn set_coefficients(&mut self, values: &[f64]) {
        debug_assert_eq!(values.len(), self.coefficient_count());
        for (n, &v) in self.nodes.iter_mut().filter(|n| n.is_leaf()).zip(values) {
            n.value = v;
        }
    }

    pub fn count_kind(&self, kind: NodeKind) -> usize {
        self.nodes.iter().filter(|n| n.kind == kind).count()
    }

    /// Copy of this tree with the subtree rooted at `i` replaced by `replacement`.
    ///
    /// `replacement` must itself be a complete postfix subtree.
    pub fn replace_subtree(&self, i: usize, replacement: &[Node]) -> Tree {
        let range = self.subtree_range(i);
        let mut nodes = Vec::with_capacity(self.nodes.len() - range.len() + replacement.len());
        nodes.extend_from_slice(&self.nodes[..range.start]);
        nodes.extend_from_slice(replacement);
        nodes.extend_from_slice(&self.nodes[range.end..]);
        let mut tree = Tree { nodes };
        tree.update_lengths();
        tree
    }

    /// Hash of the structure and leaf values; equal trees hash equally.
    pub fn fingerprint(&self) -> u64 {
        use std::hash::{DefaultHasher, Hash, Hasher};
        let mut h = DefaultHasher::new();
        for n in &self.nodes {
            n.kind.hash(&mut h);
            n.feature.hash(&mut h);
            n.value.to_bits().hash(&mut h);
        }
        h.finish()
    }
}

impl TryFrom<Vec<Node>> for Tree {
    type Error = TreeError;

    fn try_from(nodes: Vec<Node>) -> Result<Self, Self::Error> {
        Tree::new(nodes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn x(f: u16) -> Node {
        Node::variable(f, 1.0)
    }

    fn f(kind: NodeKind) -> Node {
        Node::function(kind)
    }

    #[test]
    fn new_rejects_bad_input() {
        assert_eq!(Tree::new(vec![]), Err(TreeError::Empty));
        assert_eq!(Tree::new(vec![x(0), x(1)]), Err(TreeError::InvalidPostfix));
        assert_eq!(Tree::new(vec![x(0), f(NodeKind::Mul)]), Err(TreeError::InvalidPostfix));
    }

    #[test]
    fn children_are_first_to_last() {
        // (x0 - x1) / exp(x2)
        let t = Tree::new(vec![x(0), x(1), f(NodeKind::Sub), x(2), f(NodeKind::Exp), f(NodeKind::Div)]).unwrap();
        assert!(t.is_valid());
        assert_eq!(t.children(5), vec![2, 4]);
        assert_eq!(t.children(2), vec![0, 1]);
        assert_eq!(t.depth(), 3);
        assert_eq!(t.root().kind, NodeKind::Div);
    }

    #[test]
    fn replace_subtree_recomputes_lengths() {
        let t = Tree::new(vec![x(0), x(1), f(NodeKind::Add)]).unwrap();
        let sub = Tree::new(vec![x(2), f(NodeKind::Sin)]).unwrap();
        let out = t.replace_subtree(0, sub.nodes());
        assert_eq!(out.len(), 4);
        assert!(out.is_valid());
        assert_eq!(out.root().length, 4);
        assert_eq!(out.nodes()[1].kind, NodeKind::Sin);
    }

    #[test]
    fn coefficients_cover_all_leaves() {
        let mut t = Tree::new(vec![Node::constant(2.0), Node::variable(0, 3.0), f(NodeKind::Mul)]).unwrap();
        assert_eq!(t.coefficients(), vec![2.0, 3.0]);
        t.set_coefficients(&[-1.0, 0.5]);
        assert_eq!(t.coefficients(), vec![-1.0, 0.5]);
        assert_eq!(t.root().kind, NodeKind::Mul);
    }
}
