//! Address decoding over the sub-block hierarchy.
//!
//! [`decode`] turns the elements of a container into nested `Switch`
//! statements on slices of a byte-address expression. It does not know what
//! a case should do: the backend supplies a [`DecodeVisitor`] that fills in
//! the body for every register word, every array, and the default case.

use crate::errors::GenError;
use crate::width::{mask, word_address};
use regforge_ir::{Choice, Expr, Statement};
use regforge_tree::{NodeId, NodeKind, RegMap};

/// What a decoded case selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// One word of a register; word 0 holds the least significant bits.
    Reg {
        /// Register node.
        reg: NodeId,
        /// Word index.
        word: u32,
    },
    /// A whole array, occupying one sub-block.
    Array {
        /// Array node.
        array: NodeId,
        /// Word-address bits of the sub-block holding it.
        index_bits: u32,
    },
}

/// Fills in the bodies of the decoded cases.
pub trait DecodeVisitor {
    /// Body of the case selecting `target`.
    fn visit_node(&mut self, stmts: &mut Vec<Statement>, target: Target) -> Result<(), GenError>;

    /// Body of the case no element matches.
    fn visit_default(&mut self, stmts: &mut Vec<Statement>) -> Result<(), GenError>;
}

/// Appends to `stmts` the decoder for the elements of `container`, switching
/// on bits of `addr` (a byte address with absolute bit numbering).
pub fn decode(
    map: &RegMap,
    container: NodeId,
    addr: &Expr,
    stmts: &mut Vec<Statement>,
    visitor: &mut impl DecodeVisitor,
) -> Result<(), GenError> {
    let Some(view) = map.container(container) else {
        return Err(layout(map, container, "not a container"));
    };
    let children = view.children;
    if view.sel_bits == 0 {
        return decode_regs(map, container, children, view.blk_bits, addr, stmts, visitor);
    }

    // Group elements by sub-block.
    let mut groups: Vec<(u64, Vec<NodeId>)> = Vec::new();
    for &child in children {
        let idx = mask(map.address(child) >> view.blk_bits, view.sel_bits);
        match groups.iter_mut().find(|(i, _)| *i == idx) {
            Some((_, g)) => g.push(child),
            None => groups.push((idx, vec![child])),
        }
    }

    let mut choices = Vec::with_capacity(groups.len() + 1);
    for (idx, group) in groups {
        let mut body = Vec::new();
        let first = group[0];
        match (&map.node(first).kind, group.len()) {
            (NodeKind::Block(_), 1) => decode(map, first, addr, &mut body, visitor)?,
            (NodeKind::Array(_), 1) => visitor.visit_node(
                &mut body,
                Target::Array {
                    array: first,
                    index_bits: view.blk_bits.saturating_sub(map.addr_word_bits()),
                },
            )?,
            _ if group.iter().all(|&c| map.reg(c).is_some()) => {
                decode_regs(map, container, &group, view.blk_bits, addr, &mut body, visitor)?
            }
            _ => {
                return Err(layout(
                    map,
                    container,
                    "a block or array must have its sub-block to itself",
                ))
            }
        }
        choices.push(Choice::Value {
            value: Expr::konst(idx, view.sel_bits),
            stmts: body,
        });
    }
    let mut default = Vec::new();
    visitor.visit_default(&mut default)?;
    choices.push(Choice::Default { stmts: default });
    stmts.push(Statement::Switch {
        subject: addr.clone().slice(view.blk_bits, view.sel_bits),
        choices,
    });
    Ok(())
}

/// Register-level switch over the word addresses below `blk_bits`.
fn decode_regs(
    map: &RegMap,
    container: NodeId,
    regs: &[NodeId],
    blk_bits: u32,
    addr: &Expr,
    stmts: &mut Vec<Statement>,
    visitor: &mut impl DecodeVisitor,
) -> Result<(), GenError> {
    let awb = map.addr_word_bits();
    let mut words = Vec::new();
    for &id in regs {
        let Some(reg) = map.reg(id) else {
            return Err(layout(
                map,
                container,
                "only registers can share a sub-block",
            ));
        };
        for word in 0..reg.nwords {
            let waddr = word_address(reg.address, word, reg.nwords, map.word_size());
            words.push((waddr >> awb, Target::Reg { reg: id, word }));
        }
    }
    words.sort_by_key(|(a, _)| *a);

    let width = blk_bits.saturating_sub(awb);
    if width == 0 {
        return match words.as_slice() {
            [] => visitor.visit_default(stmts),
            [(_, target)] => visitor.visit_node(stmts, *target),
            _ => Err(layout(map, container, "several words share one address")),
        };
    }

    let mut choices = Vec::with_capacity(words.len() + 1);
    for (waddr, target) in words {
        let mut body = Vec::new();
        visitor.visit_node(&mut body, target)?;
        choices.push(Choice::Value {
            value: Expr::konst(mask(waddr, width), width),
            stmts: body,
        });
    }
    let mut default = Vec::new();
    visitor.visit_default(&mut default)?;
    choices.push(Choice::Default { stmts: default });
    stmts.push(Statement::Switch {
        subject: addr.clone().slice(awb, width),
        choices,
    });
    Ok(())
}

fn layout(map: &RegMap, container: NodeId, reason: &str) -> GenError {
    GenError::Layout {
        path: map.path(container),
        reason: reason.to_string(),
    }
}
