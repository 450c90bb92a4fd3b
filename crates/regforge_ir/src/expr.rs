//! Expression trees.
//!
//! Bit indices in [`Expr::Index`] and [`Expr::Slice`] are absolute: slicing a
//! signal declared with a non-zero low index uses that signal's numbering.
//! Sub-expressions that are not signals are numbered from zero.

use crate::SignalId;
use regforge_common::Logic;
use serde::{Deserialize, Serialize};

/// A unary operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryOp {
    /// Bitwise NOT.
    Not,
}

/// A binary operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOp {
    /// Bitwise (or logical, on single bits) AND.
    And,
    /// Bitwise OR.
    Or,
    /// Bitwise XOR.
    Xor,
    /// Equality.
    Eq,
    /// Inequality.
    Ne,
    /// Unsigned less than.
    Lt,
    /// Unsigned less than or equal.
    Le,
    /// Unsigned greater than.
    Gt,
    /// Unsigned greater than or equal.
    Ge,
    /// Addition.
    Add,
    /// Subtraction.
    Sub,
    /// Multiplication.
    Mul,
}

impl BinaryOp {
    /// Whether the operator yields a single bit.
    pub fn is_relational(self) -> bool {
        matches!(
            self,
            BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge
        )
    }
}

/// An expression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Expr {
    /// A whole signal.
    Signal(SignalId),
    /// A single-bit constant.
    Bit(Logic),
    /// All bits undefined; takes the width of its context.
    Undef,
    /// A sized unsigned constant.
    Const {
        /// Value (only the low `width` bits are meaningful).
        value: u64,
        /// Width in bits.
        width: u32,
    },
    /// An unsized integer; takes the width of its context.
    Number(i64),
    /// A constant declared outside the module (e.g. in a package).
    Named {
        /// Constant name.
        name: String,
        /// Width in bits.
        width: u32,
    },
    /// One bit of an expression.
    Index {
        /// Indexed expression.
        expr: Box<Expr>,
        /// Absolute bit index.
        index: u32,
    },
    /// A contiguous range of bits.
    Slice {
        /// Sliced expression.
        expr: Box<Expr>,
        /// Absolute index of the lowest bit.
        lo: u32,
        /// Number of bits.
        width: u32,
    },
    /// Concatenation, most significant part first.
    Concat(Vec<Expr>),
    /// Zero-extension to `width` bits.
    Zext {
        /// Extended expression.
        expr: Box<Expr>,
        /// Resulting width.
        width: u32,
    },
    /// `count` copies of a bit pattern.
    Replicate {
        /// Replicated expression.
        expr: Box<Expr>,
        /// Number of copies.
        count: u32,
    },
    /// A unary operation.
    Unary {
        /// Operator.
        op: UnaryOp,
        /// Operand.
        expr: Box<Expr>,
    },
    /// A binary operation.
    Binary {
        /// Operator.
        op: BinaryOp,
        /// Left operand.
        lhs: Box<Expr>,
        /// Right operand.
        rhs: Box<Expr>,
    },
}

impl Expr {
    /// Reference to a whole signal.
    pub fn sig(id: SignalId) -> Expr {
        Expr::Signal(id)
    }

    /// Constant `0` bit.
    pub fn zero() -> Expr {
        Expr::Bit(Logic::Zero)
    }

    /// Constant `1` bit.
    pub fn one() -> Expr {
        Expr::Bit(Logic::One)
    }

    /// Sized constant.
    pub fn konst(value: u64, width: u32) -> Expr {
        Expr::Const { value, width }
    }

    /// Named external constant.
    pub fn named(name: impl Into<String>, width: u32) -> Expr {
        Expr::Named {
            name: name.into(),
            width,
        }
    }

    /// `self[index]`.
    pub fn index(self, index: u32) -> Expr {
        Expr::Index {
            expr: Box::new(self),
            index,
        }
    }

    /// `self[lo + width - 1 : lo]`.
    pub fn slice(self, lo: u32, width: u32) -> Expr {
        Expr::Slice {
            expr: Box::new(self),
            lo,
            width,
        }
    }

    /// Zero-extends `self` to `width` bits.
    pub fn zext(self, width: u32) -> Expr {
        Expr::Zext {
            expr: Box::new(self),
            width,
        }
    }

    /// `count` copies of `self`.
    pub fn replicate(self, count: u32) -> Expr {
        Expr::Replicate {
            expr: Box::new(self),
            count,
        }
    }

    /// Bitwise complement.
    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Expr {
        Expr::Unary {
            op: UnaryOp::Not,
            expr: Box::new(self),
        }
    }

    /// Binary operation.
    pub fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Expr {
        Expr::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    /// `self and rhs`.
    pub fn and(self, rhs: Expr) -> Expr {
        Expr::binary(BinaryOp::And, self, rhs)
    }

    /// `self or rhs`.
    pub fn or(self, rhs: Expr) -> Expr {
        Expr::binary(BinaryOp::Or, self, rhs)
    }

    /// `self = rhs`.
    pub fn equals(self, rhs: Expr) -> Expr {
        Expr::binary(BinaryOp::Eq, self, rhs)
    }

    /// `self >= rhs`.
    pub fn ge(self, rhs: Expr) -> Expr {
        Expr::binary(BinaryOp::Ge, self, rhs)
    }

    /// `self <= rhs`.
    pub fn le(self, rhs: Expr) -> Expr {
        Expr::binary(BinaryOp::Le, self, rhs)
    }

    /// ANDs a list of conditions together; an empty list is constant `1`.
    pub fn all(conds: impl IntoIterator<Item = Expr>) -> Expr {
        conds
            .into_iter()
            .reduce(|acc, c| acc.and(c))
            .unwrap_or_else(Expr::one)
    }

    /// ORs a list of terms together; an empty list is constant `0`.
    pub fn any(terms: impl IntoIterator<Item = Expr>) -> Expr {
        terms
            .into_iter()
            .reduce(|acc, t| acc.or(t))
            .unwrap_or_else(Expr::zero)
    }

    /// Calls `f` on every signal referenced by the expression.
    pub fn for_each_signal(&self, f: &mut impl FnMut(SignalId)) {
        match self {
            Expr::Signal(id) => f(*id),
            Expr::Bit(_)
            | Expr::Undef
            | Expr::Const { .. }
            | Expr::Number(_)
            | Expr::Named { .. } => {}
            Expr::Index { expr, .. }
            | Expr::Slice { expr, .. }
            | Expr::Zext { expr, .. }
            | Expr::Replicate { expr, .. }
            | Expr::Unary { expr, .. } => expr.for_each_signal(f),
            Expr::Concat(parts) => {
                for p in parts {
                    p.for_each_signal(f);
                }
            }
            Expr::Binary { lhs, rhs, .. } => {
                lhs.for_each_signal(f);
                rhs.for_each_signal(f);
            }
        }
    }
}
