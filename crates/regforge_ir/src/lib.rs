//! The structural hardware IR emitted by the regforge generators.
//!
//! A [`Module`] holds ports, signals, component declarations and an ordered
//! list of [`Statement`]s built from [`Expr`] trees. It is the contract with
//! the (external) HDL renderers, and [`check_widths`] verifies the one
//! invariant renderers rely on: every assignment, comparison and connection
//! is width consistent.

#![warn(missing_docs)]

pub mod check;
pub mod component;
pub mod expr;
pub mod module;
pub mod port;
pub mod signal;
pub mod stmt;

pub use check::{check_widths, expr_width, WidthError, WidthErrorKind};
pub use component::{ComponentDecl, ComponentParam, ComponentPort, ParamKind, PortWidth};
pub use expr::{BinaryOp, Expr, UnaryOp};
pub use module::Module;
pub use port::{Port, PortDirection};
pub use regforge_common::Logic;
pub use signal::{Signal, SignalKind};
pub use stmt::{sensitivity, Choice, Instance, Reset, Statement};

regforge_common::define_id!(
    /// Opaque, copyable ID for a [`Signal`] of a [`Module`].
    SignalId
);
