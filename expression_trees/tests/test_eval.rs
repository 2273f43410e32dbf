mod common;

use approx::assert_relative_eq;
use common::*;
use expression_trees::{EvalContext, EvalOptions, NodeKind, Tree, eval_tree_array, eval_tree_array_into};
use rstest::rstest;

#[rstest]
#[case(NodeKind::Exp, f64::exp as fn(f64) -> f64)]
#[case(NodeKind::Log, f64::ln as fn(f64) -> f64)]
#[case(NodeKind::Sin, f64::sin as fn(f64) -> f64)]
#[case(NodeKind::Cos, f64::cos as fn(f64) -> f64)]
#[case(NodeKind::Tan, f64::tan as fn(f64) -> f64)]
#[case(NodeKind::Sqrt, f64::sqrt as fn(f64) -> f64)]
#[case(NodeKind::Cbrt, f64::cbrt as fn(f64) -> f64)]
fn unary_kinds_match_std(#[case] kind: NodeKind, #[case] f: fn(f64) -> f64) {
    let x = make_x(1, 16);
    let t = Tree::new(vec![var(0), op(kind)]).unwrap();
    let (y, ok) = eval_tree_array(&t, x.view(), &EvalOptions::default());
    assert!(ok);
    for (r, &v) in y.iter().enumerate() {
        assert_relative_eq!(v, f(x[(0, r)]), max_relative = 1e-14);
    }
}

#[test]
fn readme_expression_matches_closed_form() {
    let x = make_x(3, 32);
    let t = tree_readme_like();
    let (y, ok) = eval_tree_array(&t, x.view(), &EvalOptions::default());
    assert!(ok);
    for r in 0..32 {
        assert_relative_eq!(y[r], x[(1, r)] * (x[(2, r)] - 0.5).cos(), max_relative = 1e-14);
    }
}

#[test]
fn context_reuse_across_trees() {
    let x = make_x(2, 8);
    let mut ctx = EvalContext::new(8);
    let mut out = vec![0.0; 8];
    let big = tree_readme_like();
    let small = Tree::leaf(c(3.0));

    let x3 = make_x(3, 8);
    assert!(eval_tree_array_into(&mut out, &big, x3.view(), &mut ctx, &EvalOptions::default()));
    assert!(eval_tree_array_into(&mut out, &small, x.view(), &mut ctx, &EvalOptions::default()));
    assert!(out.iter().all(|&v| v == 3.0));
}

#[test]
fn non_finite_is_reported_but_not_hidden() {
    let x = make_x(1, 4);
    let t = Tree::new(vec![c(-1.0), op(NodeKind::Log)]).unwrap();
    let (y, ok) = eval_tree_array(&t, x.view(), &EvalOptions::default());
    assert!(!ok);
    assert!(y.iter().all(|v| v.is_nan()));

    let (_, ok) = eval_tree_array(&t, x.view(), &EvalOptions { check_finite: false });
    assert!(ok);
}
