//! Scalar kernels for every function kind.
//!
//! Domain errors follow IEEE semantics (`log(-1)` is NaN, `x / 0` is ±inf);
//! callers decide what a non-finite result means.

use crate::node::NodeKind;

pub type UnaryFn = fn(f64) -> f64;
pub type BinaryFn = fn(f64, f64) -> f64;

pub fn unary_fn(kind: NodeKind) -> Option<UnaryFn> {
    let f: UnaryFn = match kind {
        NodeKind::Exp => f64::exp,
        NodeKind::Log => f64::ln,
        NodeKind::Sin => f64::sin,
        NodeKind::Cos => f64::cos,
        NodeKind::Tan => f64::tan,
        NodeKind::Sqrt => f64::sqrt,
        NodeKind::Cbrt => f64::cbrt,
        _ => return None,
    };
    Some(f)
}

pub fn binary_fn(kind: NodeKind) -> Option<BinaryFn> {
    let f: BinaryFn = match kind {
        NodeKind::Add => |a, b| a + b,
        NodeKind::Sub => |a, b| a - b,
        NodeKind::Mul => |a, b| a * b,
        NodeKind::Div => |a, b| a / b,
        _ => return None,
    };
    Some(f)
}

/// d out / d a for a unary kind, given the argument `a` and the result `v`.
pub fn unary_partial(kind: NodeKind) -> Option<fn(f64, f64) -> f64> {
    let f: fn(f64, f64) -> f64 = match kind {
        NodeKind::Exp => |_, v| v,
        NodeKind::Log => |a, _| 1.0 / a,
        NodeKind::Sin => |a, _| a.cos(),
        NodeKind::Cos => |a, _| -a.sin(),
        NodeKind::Tan => |_, v| 1.0 + v * v,
        NodeKind::Sqrt => |_, v| 0.5 / v,
        NodeKind::Cbrt => |_, v| 1.0 / (3.0 * v * v),
        _ => return None,
    };
    Some(f)
}

/// (d out / d a, d out / d b) for a binary kind.
pub fn binary_partials(kind: NodeKind, a: f64, b: f64) -> (f64, f64) {
    match kind {
        NodeKind::Add => (1.0, 1.0),
        NodeKind::Sub => (1.0, -1.0),
        NodeKind::Mul => (b, a),
        NodeKind::Div => (1.0 / b, -a / (b * b)),
        _ => (f64::NAN, f64::NAN),
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn unary_partials_match_central_differences() {
        let h = 1e-6;
        for kind in [
            NodeKind::Exp,
            NodeKind::Log,
            NodeKind::Sin,
            NodeKind::Cos,
            NodeKind::Tan,
            NodeKind::Sqrt,
            NodeKind::Cbrt,
        ] {
            let f = unary_fn(kind).unwrap();
            let d = unary_partial(kind).unwrap();
            let a = 0.7;
            let fd = (f(a + h) - f(a - h)) / (2.0 * h);
            assert_relative_eq!(d(a, f(a)), fd, max_relative = 1e-6);
        }
    }

    #[test]
    fn binary_partials_for_div() {
        let (da, db) = binary_partials(NodeKind::Div, 3.0, 2.0);
        assert_relative_eq!(da, 0.5);
        assert_relative_eq!(db, -0.75);
    }

    #[test]
    fn leaves_have_no_kernels() {
        assert!(unary_fn(NodeKind::Constant).is_none());
        assert!(binary_fn(NodeKind::Exp).is_none());
    }
}
