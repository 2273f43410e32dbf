use proptest::prelude::*;
use proptest::strategy::{BoxedStrategy, Union};

use crate::node::{Node, NodeKind};
use crate::tree::Tree;

#[derive(Clone, Debug)]
pub enum GenExpr {
    Var { feature: u16, weight: f64 },
    Const(f64),
    Op { kind: NodeKind, children: Vec<GenExpr> },
}

impl GenExpr {
    pub fn to_postfix(&self, out: &mut Vec<Node>) {
        match self {
            GenExpr::Var { feature, weight } => out.push(Node::variable(*feature, *weight)),
            GenExpr::Const(v) => out.push(Node::constant(*v)),
            GenExpr::Op { kind, children } => {
                for child in children {
                    child.to_postfix(out);
                }
                out.push(Node::function(*kind));
            }
        }
    }
}

pub fn arb_leaf_expr(n_features: usize) -> impl Strategy<Value = GenExpr> {
    let mut leaf_choices: Vec<BoxedStrategy<GenExpr>> = vec![(-3.0f64..3.0).prop_map(GenExpr::Const).boxed()];
    if n_features > 0 {
        leaf_choices.push(
            ((0u16..(n_features as u16)), -2.0f64..2.0)
                .prop_map(|(feature, weight)| GenExpr::Var { feature, weight })
                .boxed(),
        );
    }
    Union::new(leaf_choices)
}

/// Random expressions over the given function kinds.
///
/// `max_depth` bounds the recursion depth, so tree depth is at most `max_depth + 1`.
pub fn arb_expr(
    n_features: usize,
    kinds: Vec<NodeKind>,
    max_depth: u32,
    max_size: u32,
) -> impl Strategy<Value = GenExpr> {
    let unary: Vec<NodeKind> = kinds.iter().copied().filter(|k| k.arity() == 1).collect();
    let binary: Vec<NodeKind> = kinds.iter().copied().filter(|k| k.arity() == 2).collect();
    let leaf = arb_leaf_expr(n_features);

    leaf.prop_recursive(max_depth, max_size, 2, move |inner| {
        let mut choices: Vec<BoxedStrategy<GenExpr>> = vec![inner.clone().boxed()];

        if !unary.is_empty() {
            choices.push(
                (prop::sample::select(unary.clone()), inner.clone())
                    .prop_map(|(kind, child)| GenExpr::Op {
                        kind,
                        children: vec![child],
                    })
                    .boxed(),
            );
        }

        if !binary.is_empty() {
            choices.push(
                (prop::sample::select(binary.clone()), prop::collection::vec(inner.clone(), 2))
                    .prop_map(|(kind, children)| GenExpr::Op { kind, children })
                    .boxed(),
            );
        }

        Union::new(choices)
    })
}

pub fn arb_tree(n_features: usize, kinds: Vec<NodeKind>, max_depth: u32, max_size: u32) -> impl Strategy<Value = Tree> {
    arb_expr(n_features, kinds, max_depth, max_size).prop_map(|expr| {
        let mut nodes = Vec::new();
        expr.to_postfix(&mut nodes);
        Tree::new(nodes).expect("generated expressions are valid postfix")
    })
}

/// Arithmetic plus every unary kind.
pub fn all_function_kinds() -> Vec<NodeKind> {
    NodeKind::ALL.iter().copied().filter(|k| !k.is_leaf()).collect()
}
