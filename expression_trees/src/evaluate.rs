use ndarray::{Array2, ArrayView2, ArrayViewMut2, Axis, Zip};

use crate::node::{Node, NodeKind};
use crate::operators::{binary_fn, unary_fn};
use crate::tree::Tree;

#[derive(Copy, Clone, Debug)]
pub struct EvalOptions {
    pub check_finite: bool,
}

impl Default for EvalOptions {
    fn default() -> Self {
        Self { check_finite: true }
    }
}

/// Reusable node-major scratch: row `i` holds the values of node `i`.
#[derive(Debug)]
pub struct EvalContext {
    pub scratch: Array2<f64>,
    pub n_rows: usize,
}

impl EvalContext {
    pub fn new(n_rows: usize) -> Self {
        Self {
            scratch: Array2::zeros((0, n_rows)),
            n_rows,
        }
    }

    pub fn ensure_scratch(&mut self, n_nodes: usize) {
        if self.scratch.nrows() < n_nodes || self.scratch.ncols() != self.n_rows {
            self.scratch = Array2::zeros((n_nodes, self.n_rows));
        }
    }
}

/// Evaluate every node of `nodes` over the columns of `x_columns`
/// (shape `n_features x n_rows`), writing node `i` into `values.row(i)`.
pub(crate) fn forward_pass(nodes: &[Node], x_columns: ArrayView2<'_, f64>, mut values: ArrayViewMut2<'_, f64>) {
    for (i, node) in nodes.iter().enumerate() {
        let (done, mut rest) = values.view_mut().split_at(Axis(0), i);
        let dst = rest.row_mut(0);
        match node.arity {
            0 => {
                if node.kind == NodeKind::Constant {
                    let mut dst = dst;
                    dst.fill(node.value);
                } else {
                    let w = node.value;
                    Zip::from(dst)
                        .and(x_columns.row(node.feature as usize))
                        .for_each(|d, &x| *d = w * x);
                }
            }
            1 => {
                let f = unary_fn(node.kind).expect("unary node without a unary kernel");
                Zip::from(dst).and(done.row(i - 1)).for_each(|d, &a| *d = f(a));
            }
            _ => {
                let f = binary_fn(node.kind).expect("binary node without a binary kernel");
                let r = i - 1;
                let l = r - nodes[r].subtree_len();
                Zip::from(dst)
                    .and(done.row(l))
                    .and(done.row(r))
                    .for_each(|d, &a, &b| *d = f(a, b));
            }
        }
    }
}

pub fn eval_tree_array(tree: &Tree, x_columns: ArrayView2<'_, f64>, opts: &EvalOptions) -> (Vec<f64>, bool) {
    let n_rows = x_columns.ncols();
    let mut ctx = EvalContext::new(n_rows);
    let mut out = vec![0.0; n_rows];
    let complete = eval_tree_array_into(&mut out, tree, x_columns, &mut ctx, opts);
    (out, complete)
}

/// Evaluate `tree` into `out`. Returns false when `check_finite` is set and
/// any output is NaN or infinite; `out` is filled either way.
pub fn eval_tree_array_into(
    out: &mut [f64],
    tree: &Tree,
    x_columns: ArrayView2<'_, f64>,
    ctx: &mut EvalContext,
    opts: &EvalOptions,
) -> bool {
    assert_eq!(out.len(), x_columns.ncols());
    assert_eq!(ctx.n_rows, x_columns.ncols());

    let nodes = tree.nodes();
    ctx.ensure_scratch(nodes.len());
    let values = ctx.scratch.slice_mut(ndarray::s![..nodes.len(), ..]);
    forward_pass(nodes, x_columns, values);

    let root = ctx.scratch.row(nodes.len() - 1);
    for (o, &v) in out.iter_mut().zip(root.iter()) {
        *o = v;
    }
    !opts.check_finite || out.iter().all(|v| v.is_finite())
}
