//! Modules: the unit of generated hardware.

use crate::component::ComponentDecl;
use crate::port::{Port, PortDirection};
use crate::signal::{Signal, SignalKind};
use crate::stmt::Statement;
use crate::SignalId;
use regforge_common::Arena;
use serde::{Deserialize, Serialize};

/// A generated hardware module.
///
/// Ports are listed in declaration order and each one is backed by a signal
/// of kind [`SignalKind::Port`]. Component declarations are rendered ahead
/// of the statements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Module {
    /// Module name.
    pub name: String,
    /// Interface, in declaration order.
    pub ports: Vec<Port>,
    /// Every signal, ports included.
    pub signals: Arena<SignalId, Signal>,
    /// Components the statements may instantiate.
    pub components: Vec<ComponentDecl>,
    /// Concurrent statements.
    pub stmts: Vec<Statement>,
    /// Libraries the module uses.
    pub libraries: Vec<String>,
    /// Packages the module depends on.
    pub deps: Vec<String>,
}

impl Module {
    /// Creates an empty module.
    pub fn new(name: impl Into<String>) -> Self {
        Module {
            name: name.into(),
            ports: Vec::new(),
            signals: Arena::new(),
            components: Vec::new(),
            stmts: Vec::new(),
            libraries: Vec::new(),
            deps: Vec::new(),
        }
    }

    /// Adds a port numbered from bit 0 and returns its backing signal.
    pub fn add_port(
        &mut self,
        name: impl Into<String>,
        direction: PortDirection,
        width: Option<u32>,
    ) -> SignalId {
        self.add_port_full(name, direction, width, 0, None)
    }

    /// Adds a port with every attribute spelled out.
    pub fn add_port_full(
        &mut self,
        name: impl Into<String>,
        direction: PortDirection,
        width: Option<u32>,
        lo: u32,
        comment: Option<String>,
    ) -> SignalId {
        let name = name.into();
        let signal = self.signals.alloc(Signal {
            name: name.clone(),
            width,
            lo,
            kind: SignalKind::Port,
        });
        self.ports.push(Port {
            name,
            direction,
            width,
            lo,
            comment,
            signal,
        });
        signal
    }

    /// Declares an internal signal numbered from bit 0.
    pub fn add_signal(
        &mut self,
        name: impl Into<String>,
        width: Option<u32>,
        kind: SignalKind,
    ) -> SignalId {
        self.signals.alloc(Signal {
            name: name.into(),
            width,
            lo: 0,
            kind,
        })
    }

    /// Returns a signal.
    pub fn signal(&self, id: SignalId) -> &Signal {
        &self.signals[id]
    }

    /// Finds a signal by name.
    pub fn find_signal(&self, name: &str) -> Option<SignalId> {
        self.signals
            .iter()
            .find(|(_, s)| s.name == name)
            .map(|(id, _)| id)
    }

    /// Finds a port by name.
    pub fn port(&self, name: &str) -> Option<&Port> {
        self.ports.iter().find(|p| p.name == name)
    }

    /// Finds a component declaration by name.
    pub fn component(&self, name: &str) -> Option<&ComponentDecl> {
        self.components.iter().find(|c| c.name == name)
    }

    /// Appends a concurrent statement.
    pub fn push(&mut self, stmt: Statement) {
        self.stmts.push(stmt);
    }

    /// Number of statements of each kind at any depth: `(assignments,
    /// processes, instances)`.
    pub fn stats(&self) -> (usize, usize, usize) {
        fn walk(stmts: &[Statement], acc: &mut (usize, usize, usize)) {
            for s in stmts {
                match s {
                    Statement::Comment(_) => {}
                    Statement::Assign { .. } => acc.0 += 1,
                    Statement::Instance(_) => acc.2 += 1,
                    Statement::Comb { stmts, .. } => {
                        acc.1 += 1;
                        walk(stmts, acc);
                    }
                    Statement::Sync {
                        reset_stmts, stmts, ..
                    } => {
                        acc.1 += 1;
                        walk(reset_stmts, acc);
                        walk(stmts, acc);
                    }
                    Statement::If {
                        then_stmts,
                        else_stmts,
                        ..
                    } => {
                        walk(then_stmts, acc);
                        walk(else_stmts, acc);
                    }
                    Statement::Switch { choices, .. } => {
                        for c in choices {
                            walk(c.stmts(), acc);
                        }
                    }
                }
            }
        }
        let mut acc = (0, 0, 0);
        walk(&self.stmts, &mut acc);
        acc
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::Expr;

    #[test]
    fn ports_are_backed_by_signals() {
        let mut m = Module::new("top");
        let clk = m.add_port("clk_i", PortDirection::Input, None);
        let adr = m.add_port_full("VMEAddr", PortDirection::Input, Some(4), 2, None);
        assert_eq!(m.ports.len(), 2);
        assert_eq!(m.signal(clk).kind, SignalKind::Port);
        assert_eq!(m.signal(adr).lo, 2);
        assert_eq!(m.port("VMEAddr").map(|p| p.signal), Some(adr));
        assert_eq!(m.find_signal("clk_i"), Some(clk));
    }

    #[test]
    fn internal_signals_are_not_ports() {
        let mut m = Module::new("top");
        let ack = m.add_signal("ack_int", None, SignalKind::Wire);
        assert!(m.ports.is_empty());
        assert_eq!(m.find_signal("ack_int"), Some(ack));
        assert_eq!(m.find_signal("missing"), None);
    }

    #[test]
    fn stats_count_nested_statements() {
        let mut m = Module::new("top");
        let a = m.add_signal("a", None, SignalKind::Wire);
        m.push(Statement::assign(Expr::sig(a), Expr::one()));
        m.push(Statement::comb(
            "p",
            vec![Statement::if_then(
                Expr::sig(a).equals(Expr::one()),
                vec![Statement::assign(Expr::sig(a), Expr::zero())],
            )],
        ));
        assert_eq!(m.stats(), (2, 1, 0));
    }

    #[test]
    fn serde_roundtrip() {
        let mut m = Module::new("top");
        m.add_port("clk_i", PortDirection::Input, None);
        m.libraries.push("CommonVisual".into());
        let json = serde_json::to_string(&m).unwrap();
        let back: Module = serde_json::from_str(&json).unwrap();
        assert_eq!(m, back);
    }
}
