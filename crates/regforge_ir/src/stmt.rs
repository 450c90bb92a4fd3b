//! Statements: concurrent assignments, instances and process bodies.

use crate::expr::Expr;
use crate::SignalId;
use serde::{Deserialize, Serialize};

/// Reset input of a clocked process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reset {
    /// Reset signal.
    pub signal: SignalId,
    /// `true` when the reset is asserted low.
    pub active_low: bool,
}

/// An instance of a declared component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instance {
    /// Instance label.
    pub name: String,
    /// Name of the instantiated component.
    pub template: String,
    /// Parameter bindings.
    pub params: Vec<(String, i64)>,
    /// Port connections, in declaration order of the instance.
    pub conns: Vec<(String, Expr)>,
}

/// One alternative of a [`Statement::Switch`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Choice {
    /// Taken when the subject equals `value`.
    Value {
        /// Label; a sized constant of the subject's width.
        value: Expr,
        /// Body.
        stmts: Vec<Statement>,
    },
    /// Taken when no other choice matches.
    Default {
        /// Body.
        stmts: Vec<Statement>,
    },
}

impl Choice {
    /// Body of the choice.
    pub fn stmts(&self) -> &[Statement] {
        match self {
            Choice::Value { stmts, .. } | Choice::Default { stmts } => stmts,
        }
    }
}

/// A statement. Top-level statements of a module are concurrent; the bodies
/// of [`Statement::Comb`] and [`Statement::Sync`] are sequential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Statement {
    /// A comment line.
    Comment(String),
    /// `target <= value`.
    Assign {
        /// Assigned signal, index or slice.
        target: Expr,
        /// Value.
        value: Expr,
    },
    /// A component instance.
    Instance(Instance),
    /// A combinational process.
    Comb {
        /// Process label.
        name: String,
        /// Signals the process is sensitive to.
        sensitivity: Vec<SignalId>,
        /// Body.
        stmts: Vec<Statement>,
    },
    /// A clocked process with an optional synchronous reset.
    Sync {
        /// Process label.
        name: String,
        /// Rising-edge clock.
        clock: SignalId,
        /// Reset input.
        reset: Option<Reset>,
        /// Body while reset is asserted.
        reset_stmts: Vec<Statement>,
        /// Body otherwise.
        stmts: Vec<Statement>,
    },
    /// Conditional.
    If {
        /// Single-bit condition.
        condition: Expr,
        /// Taken when the condition is `1`.
        then_stmts: Vec<Statement>,
        /// Taken otherwise.
        else_stmts: Vec<Statement>,
    },
    /// Multi-way branch on an expression.
    Switch {
        /// Switched expression.
        subject: Expr,
        /// Alternatives, at most one of them `Default`.
        choices: Vec<Choice>,
    },
}

impl Statement {
    /// `target <= value`.
    pub fn assign(target: Expr, value: Expr) -> Statement {
        Statement::Assign { target, value }
    }

    /// Combinational process whose sensitivity list is every signal read in
    /// `stmts`.
    pub fn comb(name: impl Into<String>, stmts: Vec<Statement>) -> Statement {
        Statement::Comb {
            name: name.into(),
            sensitivity: sensitivity(&stmts),
            stmts,
        }
    }

    /// `if condition then ... end if` without an else branch.
    pub fn if_then(condition: Expr, then_stmts: Vec<Statement>) -> Statement {
        Statement::If {
            condition,
            then_stmts,
            else_stmts: Vec::new(),
        }
    }
}

/// Signals read by a list of sequential statements, in order of first use.
pub fn sensitivity(stmts: &[Statement]) -> Vec<SignalId> {
    let mut out = Vec::new();
    let mut add = |id: SignalId| {
        if !out.contains(&id) {
            out.push(id);
        }
    };
    for s in stmts {
        collect_reads(s, &mut add);
    }
    out
}

fn collect_reads(stmt: &Statement, f: &mut impl FnMut(SignalId)) {
    match stmt {
        Statement::Comment(_) => {}
        Statement::Assign { value, .. } => value.for_each_signal(f),
        Statement::Instance(inst) => {
            for (_, e) in &inst.conns {
                e.for_each_signal(f);
            }
        }
        Statement::Comb { stmts, .. } => {
            for s in stmts {
                collect_reads(s, f);
            }
        }
        Statement::Sync {
            reset_stmts, stmts, ..
        } => {
            for s in reset_stmts.iter().chain(stmts) {
                collect_reads(s, f);
            }
        }
        Statement::If {
            condition,
            then_stmts,
            else_stmts,
        } => {
            condition.for_each_signal(f);
            for s in then_stmts.iter().chain(else_stmts) {
                collect_reads(s, f);
            }
        }
        Statement::Switch { subject, choices } => {
            subject.for_each_signal(f);
            for c in choices {
                for s in c.stmts() {
                    collect_reads(s, f);
                }
            }
        }
    }
}
