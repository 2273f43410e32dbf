use std::fmt;
use std::str::FromStr;

use crate::TreeError;

/// Symbol kinds a [`Node`] can take.
///
/// The discriminant doubles as the bit position in a symbol mask.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum NodeKind {
    Add = 0,
    Sub,
    Mul,
    Div,
    Exp,
    Log,
    Sin,
    Cos,
    Tan,
    Sqrt,
    Cbrt,
    Constant,
    Variable,
}

impl NodeKind {
    pub const COUNT: usize = 13;

    pub const ALL: [NodeKind; Self::COUNT] = [
        NodeKind::Add,
        NodeKind::Sub,
        NodeKind::Mul,
        NodeKind::Div,
        NodeKind::Exp,
        NodeKind::Log,
        NodeKind::Sin,
        NodeKind::Cos,
        NodeKind::Tan,
        NodeKind::Sqrt,
        NodeKind::Cbrt,
        NodeKind::Constant,
        NodeKind::Variable,
    ];

    #[inline]
    pub const fn arity(self) -> u8 {
        match self {
            NodeKind::Add | NodeKind::Sub | NodeKind::Mul | NodeKind::Div => 2,
            NodeKind::Exp
            | NodeKind::Log
            | NodeKind::Sin
            | NodeKind::Cos
            | NodeKind::Tan
            | NodeKind::Sqrt
            | NodeKind::Cbrt => 1,
            NodeKind::Constant | NodeKind::Variable => 0,
        }
    }

    #[inline]
    pub const fn is_leaf(self) -> bool {
        self.arity() == 0
    }

    /// Children of a commutative node can be permuted without changing its value.
    #[inline]
    pub const fn is_commutative(self) -> bool {
        matches!(self, NodeKind::Add | NodeKind::Mul)
    }

    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    #[inline]
    pub const fn bit(self) -> u16 {
        1u16 << (self as u16)
    }

    pub const fn name(self) -> &'static str {
        match self {
            NodeKind::Add => "add",
            NodeKind::Sub => "sub",
            NodeKind::Mul => "mul",
            NodeKind::Div => "div",
            NodeKind::Exp => "exp",
            NodeKind::Log => "log",
            NodeKind::Sin => "sin",
            NodeKind::Cos => "cos",
            NodeKind::Tan => "tan",
            NodeKind::Sqrt => "sqrt",
            NodeKind::Cbrt => "cbrt",
            NodeKind::Constant => "constant",
            NodeKind::Variable => "variable",
        }
    }

    /// Infix token for binary kinds.
    pub const fn infix(self) -> Option<&'static str> {
        match self {
            NodeKind::Add => Some("+"),
            NodeKind::Sub => Some("-"),
            NodeKind::Mul => Some("*"),
            NodeKind::Div => Some("/"),
            _ => None,
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for NodeKind {
    type Err = TreeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        NodeKind::ALL
            .iter()
            .copied()
            .find(|k| k.name().eq_ignore_ascii_case(s) || k.infix() == Some(s))
            .ok_or_else(|| TreeError::UnknownSymbol(s.to_string()))
    }
}

/// One slot of a postfix tree.
///
/// `length` counts the slots of the subtree rooted here, including the node
/// itself. It is maintained by [`crate::Tree`] and never set by hand.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Node {
    pub kind: NodeKind,
    pub arity: u8,
    pub length: u32,
    pub value: f64,
    pub feature: u16,
}

impl Node {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            arity: kind.arity(),
            length: 1,
            value: if kind == NodeKind::Variable { 1.0 } else { 0.0 },
            feature: 0,
        }
    }

    pub fn constant(value: f64) -> Self {
        Self {
            value,
            ..Self::new(NodeKind::Constant)
        }
    }

    /// A variable leaf evaluating to `weight * x[feature]`.
    pub fn variable(feature: u16, weight: f64) -> Self {
        Self {
            value: weight,
            feature,
            ..Self::new(NodeKind::Variable)
        }
    }

    pub fn function(kind: NodeKind) -> Self {
        debug_assert!(!kind.is_leaf(), "{kind} is a leaf kind");
        Self::new(kind)
    }

    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.arity == 0
    }

    #[inline]
    pub fn is_constant(&self) -> bool {
        self.kind == NodeKind::Constant
    }

    #[inline]
    pub fn is_variable(&self) -> bool {
        self.kind == NodeKind::Variable
    }

    #[inline]
    pub fn is_function(&self) -> bool {
        self.arity > 0
    }

    #[inline]
    pub fn subtree_len(&self) -> usize {
        self.length as usize
    }

    /// Replace the kind, keeping position and length. Arity must match.
    pub fn set_kind(&mut self, kind: NodeKind) {
        debug_assert_eq!(kind.arity(), self.arity);
        self.kind = kind;
    }
}
