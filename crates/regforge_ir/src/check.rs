//! Width consistency checking.
//!
//! Widths are `Option<u32>`: `None` marks a context-sized expression
//! ([`Expr::Undef`], [`Expr::Number`]) that is compatible with any width.

use crate::expr::Expr;
use crate::module::Module;
use crate::stmt::{Choice, Statement};
use std::collections::HashSet;
use thiserror::Error;

/// A width inconsistency found by [`check_widths`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("in {context}: {kind}")]
pub struct WidthError {
    /// Where the problem is (process, instance, or `concurrent statement`).
    pub context: String,
    /// What is wrong.
    pub kind: WidthErrorKind,
}

/// The kinds of width inconsistency.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WidthErrorKind {
    /// Two sides that must agree do not.
    #[error("{what}: expected {expected} bits, found {found}")]
    Mismatch {
        /// What was compared.
        what: String,
        /// Width required.
        expected: u32,
        /// Width found.
        found: u32,
    },
    /// An index or slice outside its operand.
    #[error("bits {lo}..{end} are outside the operand's bits {base}..{limit}")]
    OutOfRange {
        /// First bit accessed.
        lo: u32,
        /// One past the last bit accessed.
        end: u32,
        /// First bit of the operand.
        base: u32,
        /// One past the last bit of the operand.
        limit: u32,
    },
    /// A zero-extension that would drop bits.
    #[error("cannot zero-extend {from} bits to {to}")]
    Narrowing {
        /// Operand width.
        from: u32,
        /// Requested width.
        to: u32,
    },
    /// A context-sized expression where a definite width is required.
    #[error("{0} needs a definite width")]
    Unsized(&'static str),
    /// A signal ID that does not belong to the module.
    #[error("unknown signal #{0}")]
    UnknownSignal(u32),
    /// An assignment target that is not a signal, index or slice of one.
    #[error("cannot assign to this expression")]
    BadTarget,
    /// An instance of an undeclared component.
    #[error("unknown component '{0}'")]
    UnknownComponent(String),
    /// A connection to a port the component does not have.
    #[error("component '{component}' has no port '{port}'")]
    UnknownPort {
        /// Component name.
        component: String,
        /// Port name.
        port: String,
    },
    /// Two signals with the same name.
    #[error("duplicate signal name '{0}'")]
    DuplicateName(String),
}

/// Checks every assignment, comparison, switch label, condition and instance
/// connection of `module` for width consistency. Returns all problems found.
pub fn check_widths(module: &Module) -> Vec<WidthError> {
    let mut checker = Checker {
        module,
        errors: Vec::new(),
        context: "concurrent statement".to_string(),
    };
    let mut names = HashSet::new();
    for (_, s) in module.signals.iter() {
        if !names.insert(s.name.as_str()) {
            checker.report(WidthErrorKind::DuplicateName(s.name.clone()));
        }
    }
    for stmt in &module.stmts {
        checker.context = "concurrent statement".to_string();
        checker.stmt(stmt);
    }
    checker.errors
}

/// Width of an expression, or `None` when it adapts to its context.
pub fn expr_width(module: &Module, expr: &Expr) -> Result<Option<u32>, WidthErrorKind> {
    Ok(match expr {
        Expr::Signal(id) => {
            if id.as_raw() as usize >= module.signals.len() {
                return Err(WidthErrorKind::UnknownSignal(id.as_raw()));
            }
            Some(module.signal(*id).bit_width())
        }
        Expr::Bit(_) => Some(1),
        Expr::Undef | Expr::Number(_) => None,
        Expr::Const { width, .. } | Expr::Named { width, .. } => Some(*width),
        Expr::Index { expr, index } => {
            check_range(module, expr, *index, 1)?;
            Some(1)
        }
        Expr::Slice { expr, lo, width } => {
            check_range(module, expr, *lo, *width)?;
            Some(*width)
        }
        Expr::Concat(parts) => {
            let mut total = 0;
            for p in parts {
                total += expr_width(module, p)?
                    .ok_or(WidthErrorKind::Unsized("concatenation part"))?;
            }
            Some(total)
        }
        Expr::Zext { expr, width } => {
            if let Some(from) = expr_width(module, expr)? {
                if from > *width {
                    return Err(WidthErrorKind::Narrowing { from, to: *width });
                }
            }
            Some(*width)
        }
        Expr::Replicate { expr, count } => {
            let w = expr_width(module, expr)?.ok_or(WidthErrorKind::Unsized("replicated value"))?;
            Some(w * count)
        }
        Expr::Unary { expr, .. } => expr_width(module, expr)?,
        Expr::Binary { op, lhs, rhs } => {
            let l = expr_width(module, lhs)?;
            let r = expr_width(module, rhs)?;
            if let (Some(l), Some(r)) = (l, r) {
                if l != r {
                    return Err(WidthErrorKind::Mismatch {
                        what: format!("operands of {op:?}"),
                        expected: l,
                        found: r,
                    });
                }
            }
            if op.is_relational() {
                Some(1)
            } else {
                l.or(r)
            }
        }
    })
}

/// Checks that bits `lo .. lo + width` exist in `expr`, using the signal's
/// own numbering when `expr` is a signal.
fn check_range(module: &Module, expr: &Expr, lo: u32, width: u32) -> Result<(), WidthErrorKind> {
    let base = match expr {
        Expr::Signal(id) if (id.as_raw() as usize) < module.signals.len() => module.signal(*id).lo,
        _ => 0,
    };
    let Some(inner) = expr_width(module, expr)? else {
        return Err(WidthErrorKind::Unsized("sliced value"));
    };
    if lo < base || lo + width > base + inner {
        return Err(WidthErrorKind::OutOfRange {
            lo,
            end: lo + width,
            base,
            limit: base + inner,
        });
    }
    Ok(())
}

struct Checker<'a> {
    module: &'a Module,
    errors: Vec<WidthError>,
    context: String,
}

impl Checker<'_> {
    fn report(&mut self, kind: WidthErrorKind) {
        self.errors.push(WidthError {
            context: self.context.clone(),
            kind,
        });
    }

    fn width(&mut self, expr: &Expr) -> Option<u32> {
        match expr_width(self.module, expr) {
            Ok(w) => w,
            Err(kind) => {
                self.report(kind);
                None
            }
        }
    }

    fn expect(&mut self, what: &str, expected: Option<u32>, expr: &Expr) {
        let found = self.width(expr);
        if let (Some(expected), Some(found)) = (expected, found) {
            if expected != found {
                self.report(WidthErrorKind::Mismatch {
                    what: what.to_string(),
                    expected,
                    found,
                });
            }
        }
    }

    fn stmts(&mut self, stmts: &[Statement]) {
        for s in stmts {
            self.stmt(s);
        }
    }

    fn stmt(&mut self, stmt: &Statement) {
        match stmt {
            Statement::Comment(_) => {}
            Statement::Assign { target, value } => {
                if !is_target(target) {
                    self.report(WidthErrorKind::BadTarget);
                    return;
                }
                let tw = self.width(target);
                self.expect("assignment", tw, value);
            }
            Statement::Instance(inst) => {
                let saved = std::mem::replace(&mut self.context, format!("instance {}", inst.name));
                match self.module.component(&inst.template) {
                    None => self.report(WidthErrorKind::UnknownComponent(inst.template.clone())),
                    Some(decl) => {
                        for (port, expr) in &inst.conns {
                            if decl.port(port).is_none() {
                                self.report(WidthErrorKind::UnknownPort {
                                    component: decl.name.clone(),
                                    port: port.clone(),
                                });
                                continue;
                            }
                            let pw = decl.port_width(port, &inst.params);
                            self.expect(&format!("port {port}"), pw, expr);
                        }
                    }
                }
                self.context = saved;
            }
            Statement::Comb { name, stmts, .. } => {
                let saved = std::mem::replace(&mut self.context, format!("process {name}"));
                self.stmts(stmts);
                self.context = saved;
            }
            Statement::Sync {
                name,
                reset_stmts,
                stmts,
                ..
            } => {
                let saved = std::mem::replace(&mut self.context, format!("process {name}"));
                self.stmts(reset_stmts);
                self.stmts(stmts);
                self.context = saved;
            }
            Statement::If {
                condition,
                then_stmts,
                else_stmts,
            } => {
                self.expect("condition", Some(1), condition);
                self.stmts(then_stmts);
                self.stmts(else_stmts);
            }
            Statement::Switch { subject, choices } => {
                let sw = self.width(subject);
                if sw.is_none() {
                    self.report(WidthErrorKind::Unsized("switch subject"));
                }
                for c in choices {
                    if let Choice::Value { value, .. } = c {
                        self.expect("switch label", sw, value);
                    }
                    self.stmts(c.stmts());
                }
            }
        }
    }
}

fn is_target(expr: &Expr) -> bool {
    match expr {
        Expr::Signal(_) => true,
        Expr::Index { expr, .. } | Expr::Slice { expr, .. } => is_target(expr),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{ComponentDecl, ComponentParam, ComponentPort, ParamKind, PortWidth};
    use crate::port::PortDirection;
    use crate::signal::SignalKind;
    use crate::stmt::Instance;

    fn module() -> (Module, crate::SignalId, crate::SignalId, crate::SignalId) {
        let mut m = Module::new("t");
        let dat = m.add_port("dat", PortDirection::Input, Some(32));
        let adr = m.add_port_full("adr", PortDirection::Input, Some(4), 2, None);
        let r = m.add_signal("r", Some(8), SignalKind::Reg);
        (m, dat, adr, r)
    }

    #[test]
    fn matching_assignment_passes() {
        let (mut m, dat, _, r) = module();
        m.push(Statement::assign(Expr::sig(r), Expr::sig(dat).slice(0, 8)));
        m.push(Statement::assign(Expr::sig(dat).slice(8, 24), Expr::konst(0, 24)));
        m.push(Statement::assign(Expr::sig(dat), Expr::Undef));
        assert!(check_widths(&m).is_empty());
    }

    #[test]
    fn mismatched_assignment_is_reported() {
        let (mut m, dat, _, r) = module();
        m.push(Statement::comb(
            "p",
            vec![Statement::assign(Expr::sig(r), Expr::sig(dat).slice(0, 9))],
        ));
        let errs = check_widths(&m);
        assert_eq!(errs.len(), 1);
        assert_eq!(errs[0].context, "process p");
        assert!(matches!(
            errs[0].kind,
            WidthErrorKind::Mismatch { expected: 8, found: 9, .. }
        ));
    }

    #[test]
    fn slices_use_absolute_indices() {
        let (m, _, adr, _) = module();
        assert_eq!(expr_width(&m, &Expr::sig(adr).slice(2, 4)), Ok(Some(4)));
        assert_eq!(expr_width(&m, &Expr::sig(adr).index(5)), Ok(Some(1)));
        assert!(matches!(
            expr_width(&m, &Expr::sig(adr).slice(0, 2)),
            Err(WidthErrorKind::OutOfRange { base: 2, .. })
        ));
        assert!(matches!(
            expr_width(&m, &Expr::sig(adr).index(6)),
            Err(WidthErrorKind::OutOfRange { limit: 6, .. })
        ));
    }

    #[test]
    fn zext_and_concat() {
        let (m, dat, _, r) = module();
        assert_eq!(expr_width(&m, &Expr::sig(r).zext(32)), Ok(Some(32)));
        assert!(matches!(
            expr_width(&m, &Expr::sig(dat).zext(8)),
            Err(WidthErrorKind::Narrowing { from: 32, to: 8 })
        ));
        let cat = Expr::Concat(vec![Expr::sig(r), Expr::zero(), Expr::konst(0, 3)]);
        assert_eq!(expr_width(&m, &cat), Ok(Some(12)));
        assert_eq!(expr_width(&m, &Expr::sig(r).replicate(2)), Ok(Some(16)));
    }

    #[test]
    fn relational_yields_bit() {
        let (m, dat, _, r) = module();
        assert_eq!(expr_width(&m, &Expr::sig(r).ge(Expr::konst(3, 8))), Ok(Some(1)));
        assert_eq!(expr_width(&m, &Expr::sig(r).equals(Expr::Number(3))), Ok(Some(1)));
        assert!(expr_width(&m, &Expr::sig(r).equals(Expr::sig(dat))).is_err());
    }

    #[test]
    fn switch_labels_checked() {
        let (mut m, dat, _, r) = module();
        m.push(Statement::Switch {
            subject: Expr::sig(dat).slice(2, 2),
            choices: vec![
                Choice::Value {
                    value: Expr::konst(1, 2),
                    stmts: vec![],
                },
                Choice::Value {
                    value: Expr::konst(1, 3),
                    stmts: vec![],
                },
                Choice::Default {
                    stmts: vec![Statement::assign(Expr::sig(r), Expr::konst(0, 8))],
                },
            ],
        });
        let errs = check_widths(&m);
        assert_eq!(errs.len(), 1);
        assert!(matches!(
            &errs[0].kind,
            WidthErrorKind::Mismatch { what, .. } if what == "switch label"
        ));
    }

    #[test]
    fn wide_condition_is_reported() {
        let (mut m, _, _, r) = module();
        m.push(Statement::if_then(Expr::sig(r), vec![]));
        assert_eq!(check_widths(&m).len(), 1);
    }

    #[test]
    fn bad_target() {
        let (mut m, _, _, r) = module();
        m.push(Statement::assign(Expr::sig(r).zext(9), Expr::konst(0, 9)));
        assert_eq!(check_widths(&m)[0].kind, WidthErrorKind::BadTarget);
    }

    #[test]
    fn duplicate_names() {
        let (mut m, _, _, _) = module();
        m.add_signal("r", None, SignalKind::Wire);
        assert_eq!(
            check_widths(&m)[0].kind,
            WidthErrorKind::DuplicateName("r".into())
        );
    }

    #[test]
    fn instance_connections_resolve_parameters() {
        let (mut m, dat, _, r) = module();
        m.components.push(ComponentDecl {
            name: "CtrlRegN".into(),
            params: vec![ComponentParam {
                name: "N".into(),
                kind: ParamKind::Integer,
                default: 16,
            }],
            ports: vec![ComponentPort {
                name: "CReg".into(),
                direction: PortDirection::Output,
                width: PortWidth::Param {
                    param: "N".into(),
                    scale: 1,
                },
            }],
            binding: None,
        });
        m.push(Statement::Instance(Instance {
            name: "Reg_a".into(),
            template: "CtrlRegN".into(),
            params: vec![("N".into(), 8)],
            conns: vec![("CReg".into(), Expr::sig(r))],
        }));
        assert!(check_widths(&m).is_empty());

        m.push(Statement::Instance(Instance {
            name: "Reg_b".into(),
            template: "CtrlRegN".into(),
            params: vec![],
            conns: vec![("CReg".into(), Expr::sig(dat)), ("Bogus".into(), Expr::one())],
        }));
        let errs = check_widths(&m);
        assert_eq!(errs.len(), 2);
        assert_eq!(errs[0].context, "instance Reg_b");
        assert!(matches!(errs[0].kind, WidthErrorKind::Mismatch { expected: 16, found: 32, .. }));
        assert!(matches!(errs[1].kind, WidthErrorKind::UnknownPort { .. }));
    }

    #[test]
    fn unknown_component() {
        let (mut m, _, _, _) = module();
        m.push(Statement::Instance(Instance {
            name: "x".into(),
            template: "Nope".into(),
            params: vec![],
            conns: vec![],
        }));
        assert_eq!(
            check_widths(&m)[0].kind,
            WidthErrorKind::UnknownComponent("Nope".into())
        );
    }
}
