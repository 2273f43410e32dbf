use expression_trees::{Node, NodeKind, Tree};
use ndarray::Array2;

#[allow(dead_code)]
pub fn var(feature: u16) -> Node {
    Node::variable(feature, 1.0)
}

#[allow(dead_code)]
pub fn c(value: f64) -> Node {
    Node::constant(value)
}

#[allow(dead_code)]
pub fn op(kind: NodeKind) -> Node {
    Node::function(kind)
}

/// Feature-major matrix with distinct, strictly positive entries.
#[allow(dead_code)]
pub fn make_x(n_features: usize, n_rows: usize) -> Array2<f64> {
    Array2::from_shape_fn((n_features, n_rows), |(f, r)| (r as f64 + 1.0) * (f as f64 + 1.0) * 0.01 + 0.1)
}

/// x1 * cos(x2 - 0.5)
#[allow(dead_code)]
pub fn tree_readme_like() -> Tree {
    Tree::new(vec![
        var(1),
        var(2),
        c(0.5),
        op(NodeKind::Sub),
        op(NodeKind::Cos),
        op(NodeKind::Mul),
    ])
    .unwrap()
}
