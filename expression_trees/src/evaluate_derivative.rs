use ndarray::{Array2, ArrayView2, ArrayViewMut2, Axis, Zip, s};

use crate::evaluate::forward_pass;
use crate::node::NodeKind;
use crate::operators::{binary_partials, unary_partial};
use crate::tree::Tree;

/// Scratch for a forward pass plus the reverse adjoint sweep.
#[derive(Debug)]
pub struct JacobianContext {
    pub val_scratch: Array2<f64>,
    pub adj_scratch: Array2<f64>,
    pub n_rows: usize,
}

impl JacobianContext {
    pub fn new(n_rows: usize) -> Self {
        Self {
            val_scratch: Array2::zeros((0, n_rows)),
            adj_scratch: Array2::zeros((0, n_rows)),
            n_rows,
        }
    }

    pub fn ensure_scratch(&mut self, n_nodes: usize) {
        if self.val_scratch.nrows() < n_nodes || self.val_scratch.ncols() != self.n_rows {
            self.val_scratch = Array2::zeros((n_nodes, self.n_rows));
        }
        if self.adj_scratch.nrows() < n_nodes || self.adj_scratch.ncols() != self.n_rows {
            self.adj_scratch = Array2::zeros((n_nodes, self.n_rows));
        }
    }
}

/// Values of `tree` and the Jacobian of those values with respect to its
/// coefficients (see [`Tree::coefficients`]). The Jacobian is `n_rows x n_coefficients`.
pub fn eval_jacobian(tree: &Tree, x_columns: ArrayView2<'_, f64>) -> (Vec<f64>, Array2<f64>) {
    let n_rows = x_columns.ncols();
    let mut ctx = JacobianContext::new(n_rows);
    let mut out = vec![0.0; n_rows];
    let mut jac = Array2::zeros((n_rows, tree.coefficient_count()));
    eval_jacobian_into(&mut out, jac.view_mut(), tree, x_columns, &mut ctx);
    (out, jac)
}

/// Reverse-mode sweep over the postfix array.
///
/// Every node has exactly one parent, so a node's adjoint is final once its
/// parent has been visited and is assigned rather than accumulated.
pub fn eval_jacobian_into(
    out: &mut [f64],
    mut jac: ArrayViewMut2<'_, f64>,
    tree: &Tree,
    x_columns: ArrayView2<'_, f64>,
    ctx: &mut JacobianContext,
) {
    let nodes = tree.nodes();
    let n = nodes.len();
    assert_eq!(out.len(), x_columns.ncols());
    assert_eq!(ctx.n_rows, x_columns.ncols());
    assert_eq!(jac.dim(), (x_columns.ncols(), tree.coefficient_count()));

    ctx.ensure_scratch(n);
    forward_pass(nodes, x_columns, ctx.val_scratch.slice_mut(s![..n, ..]));
    for (o, &v) in out.iter_mut().zip(ctx.val_scratch.row(n - 1).iter()) {
        *o = v;
    }

    let values = ctx.val_scratch.slice(s![..n, ..]);
    let mut adjoints = ctx.adj_scratch.slice_mut(s![..n, ..]);
    adjoints.row_mut(n - 1).fill(1.0);

    let mut param = jac.ncols();
    for i in (0..n).rev() {
        let node = nodes[i];
        let (mut lower, upper) = adjoints.view_mut().split_at(Axis(0), i);
        let g = upper.row(0);
        match node.arity {
            0 => {
                param -= 1;
                let col = jac.column_mut(param);
                if node.kind == NodeKind::Constant {
                    Zip::from(col).and(&g).for_each(|j, &g| *j = g);
                } else {
                    Zip::from(col)
                        .and(&g)
                        .and(x_columns.row(node.feature as usize))
                        .for_each(|j, &g, &x| *j = g * x);
                }
            }
            1 => {
                let d = unary_partial(node.kind).expect("unary node without a derivative");
                let c = i - 1;
                Zip::from(lower.row_mut(c))
                    .and(&g)
                    .and(values.row(c))
                    .and(values.row(i))
                    .for_each(|adj, &g, &a, &v| *adj = g * d(a, v));
            }
            _ => {
                let r = i - 1;
                let l = r - nodes[r].subtree_len();
                let kind = node.kind;
                Zip::from(lower.row_mut(l))
                    .and(&g)
                    .and(values.row(l))
                    .and(values.row(r))
                    .for_each(|adj, &g, &a, &b| *adj = g * binary_partials(kind, a, b).0);
                Zip::from(lower.row_mut(r))
                    .and(&g)
                    .and(values.row(l))
                    .and(values.row(r))
                    .for_each(|adj, &g, &a, &b| *adj = g * binary_partials(kind, a, b).1);
            }
        }
    }
    debug_assert_eq!(param, 0);
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use ndarray::array;

    use super::*;
    use crate::node::Node;

    #[test]
    fn jacobian_of_affine_model() {
        // 2*x0 + 0.5
        let x = array![[1.0, 2.0, 3.0]];
        let t = Tree::new(vec![Node::variable(0, 2.0), Node::constant(0.5), Node::function(NodeKind::Add)]).unwrap();
        let (y, j) = eval_jacobian(&t, x.view());
        assert_eq!(y, vec![2.5, 4.5, 6.5]);
        assert_eq!(j.dim(), (3, 2));
        for r in 0..3 {
            assert_relative_eq!(j[(r, 0)], x[(0, r)]);
            assert_relative_eq!(j[(r, 1)], 1.0);
        }
    }

    #[test]
    fn jacobian_through_product_and_exp() {
        // exp(a * x0) with a = 0.3
        let x = array![[0.0, 1.0, -2.0]];
        let t = Tree::new(vec![Node::variable(0, 0.3), Node::function(NodeKind::Exp)]).unwrap();
        let (y, j) = eval_jacobian(&t, x.view());
        for r in 0..3 {
            let xr = x[(0, r)];
            assert_relative_eq!(y[r], (0.3 * xr).exp());
            assert_relative_eq!(j[(r, 0)], xr * (0.3 * xr).exp(), max_relative = 1e-12);
        }
    }
}
