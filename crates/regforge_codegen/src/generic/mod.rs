//! Generic backend: a Wishbone classic slave (`wb-32-be`).
//!
//! The module exposes the Wishbone bus, one port per field value, strobe and
//! array interface, and two clocked processes: one decoding writes into the
//! field registers, one decoding reads into `wb_dat_o`. Every access is
//! acknowledged one cycle after it is seen, whether or not it hits anything.

mod processes;

use crate::annotations::{Annotations, ArrayHandles, FieldHandles};
use crate::errors::{warn_constant_without_preset, warn_register_hints_ignored, GenError};
use log::debug;
use regforge_diagnostics::DiagnosticSink;
use regforge_ir::{Expr, Module, PortDirection, SignalId, SignalKind, Statement};
use regforge_tree::{Access, NodeId, NodeKind, RegMap, Storage};

/// Wishbone ports.
pub(crate) struct Bus {
    pub rst_n: SignalId,
    pub clk: SignalId,
    pub adr: SignalId,
    pub dat_i: SignalId,
    pub dat_o: SignalId,
    pub cyc: SignalId,
    pub stb: SignalId,
    pub we: SignalId,
    pub ack: SignalId,
    pub stall: SignalId,
}

/// Handshake signals shared by both processes.
pub(crate) struct Handshake {
    pub rd_int: SignalId,
    pub wr_int: SignalId,
    pub rd_ack: SignalId,
    pub wr_ack: SignalId,
}

/// Lowers `map` into a Wishbone slave called `name`.
pub(crate) fn generate(
    map: &RegMap,
    name: &str,
    sink: &DiagnosticSink,
) -> Result<(Module, Annotations), GenError> {
    let mut module = Module::new(name);
    let mut ann = Annotations::default();

    // Phase 1: bus and per-node ports
    let bus = bus_ports(map, &mut module);
    let prefix = format!("{}_", map.name().to_lowercase());
    for &child in map.children(map.root()) {
        node_ports(map, child, &prefix, &mut module, &mut ann, sink)?;
    }

    // Phase 2: handshake network and field outputs
    let hs = handshake(&mut module, &bus);
    field_outputs(map, &bus, &ann, &mut module);

    // Phase 3: write and read processes
    processes::write_process(map, &bus, &hs, &ann, &mut module)?;
    processes::read_process(map, &bus, &hs, &ann, &mut module)?;

    let (assigns, procs, _) = module.stats();
    debug!(
        "generic: {} ports, {} assignments, {} processes",
        module.ports.len(),
        assigns,
        procs
    );
    Ok((module, ann))
}

fn bus_ports(map: &RegMap, module: &mut Module) -> Bus {
    let root = map.root_data();
    let word_bits = map.word_bits();
    let rst_n = module.add_port("rst_n_i", PortDirection::Input, None);
    let clk = module.add_port("clk_i", PortDirection::Input, None);
    let adr = module.add_port(
        "wb_adr_i",
        PortDirection::Input,
        Some((root.sel_bits + root.blk_bits).max(1)),
    );
    let dat_i = module.add_port("wb_dat_i", PortDirection::Input, Some(word_bits));
    let dat_o = module.add_port("wb_dat_o", PortDirection::Output, Some(word_bits));
    let cyc = module.add_port("wb_cyc_i", PortDirection::Input, None);
    module.add_port("wb_sel_i", PortDirection::Input, Some(map.word_size()));
    let stb = module.add_port("wb_stb_i", PortDirection::Input, None);
    let we = module.add_port("wb_we_i", PortDirection::Input, None);
    let ack = module.add_port("wb_ack_o", PortDirection::Output, None);
    let stall = module.add_port("wb_stall_o", PortDirection::Output, None);
    Bus {
        rst_n,
        clk,
        adr,
        dat_i,
        dat_o,
        cyc,
        stb,
        we,
        ack,
        stall,
    }
}

/// Storage of a field, `None` for constants.
fn storage(
    map: &RegMap,
    field: NodeId,
    access: Access,
    hint: Option<Storage>,
) -> Result<Option<Storage>, GenError> {
    match (access, hint) {
        (Access::Ro | Access::Cst, Some(Storage::Reg)) => Err(GenError::StorageNotAllowed {
            path: map.path(field),
            access,
        }),
        (Access::Cst, _) => Ok(None),
        (Access::Ro, _) => Ok(Some(Storage::Wire)),
        (Access::Wo | Access::Rw, hint) => Ok(Some(hint.unwrap_or(Storage::Reg))),
    }
}

/// Field value width on a port: single bits are scalars.
pub(crate) fn port_width(width: u32) -> Option<u32> {
    (width > 1).then_some(width)
}

fn node_ports(
    map: &RegMap,
    id: NodeId,
    prefix: &str,
    module: &mut Module,
    ann: &mut Annotations,
    sink: &DiagnosticSink,
) -> Result<(), GenError> {
    use PortDirection::{Input, Output};
    let node = map.node(id);
    match &node.kind {
        NodeKind::Block(b) => {
            let prefix = format!("{prefix}{}_", node.name.to_lowercase());
            for &child in &b.children {
                node_ports(map, child, &prefix, module, ann, sink)?;
            }
        }
        NodeKind::Array(a) => {
            let base = format!("{prefix}{}", node.name);
            let access = map.reg(a.element).map_or(Access::Rw, |r| r.access);
            let width = map.reg(a.element).map_or(map.word_bits(), |r| r.width);
            let comment = node.description.clone();
            let address = module.add_port_full(
                format!("{base}_adr_o"),
                Output,
                Some(a.sel_bits.max(1)),
                0,
                comment,
            );
            let read_data = access
                .is_readable()
                .then(|| module.add_port(format!("{base}_dat_i"), Input, Some(width)));
            let (write_data, write_strobe) = if access.is_writable() {
                (
                    Some(module.add_port(format!("{base}_dat_o"), Output, Some(width))),
                    Some(module.add_port(format!("{base}_wr_o"), Output, None)),
                )
            } else {
                (None, None)
            };
            ann.arrays.insert(
                id,
                ArrayHandles {
                    address,
                    read_data,
                    write_data,
                    select: None,
                    read_strobe: None,
                    write_strobe,
                    read_done: None,
                    write_done: None,
                },
            );
        }
        NodeKind::Reg(r) => {
            if r.fields.len() > 1 && !r.x_hdl.is_empty() {
                sink.emit(warn_register_hints_ignored(&map.path(id), r.fields.len()));
            }
            for (fid, f) in map.fields(id) {
                let fnode = map.node(fid);
                let base = if f.anonymous {
                    format!("{prefix}{}", node.name)
                } else {
                    format!("{prefix}{}_{}", node.name, fnode.name)
                };
                let width = port_width(f.width());
                let comment = fnode.description.clone().or_else(|| node.description.clone());
                let mut h = FieldHandles::default();
                let store = storage(map, fid, r.access, f.hints.storage)?;
                if r.access == Access::Cst && f.preset.is_none() {
                    sink.emit(warn_constant_without_preset(&map.path(fid)));
                }
                if store == Some(Storage::Wire) && r.access.is_readable() {
                    h.input = Some(module.add_port_full(
                        format!("{base}_i"),
                        Input,
                        width,
                        0,
                        comment.clone(),
                    ));
                }
                if r.access.is_writable() {
                    h.output = Some(module.add_port_full(
                        format!("{base}_o"),
                        Output,
                        width,
                        0,
                        comment,
                    ));
                    if f.hints.write_strobe.unwrap_or(false) {
                        h.strobe = Some(module.add_port(format!("{base}_wr_o"), Output, None));
                    }
                }
                if store == Some(Storage::Reg) {
                    let reg = module.add_signal(format!("{base}_reg"), width, SignalKind::Reg);
                    h.storage = Some(reg);
                }
                debug!("{}: {:?} storage, {}", map.path(fid), store, r.access);
                ann.fields.insert(fid, h);
            }
        }
        NodeKind::Root(_) | NodeKind::Field(_) => {}
    }
    Ok(())
}

fn handshake(module: &mut Module, bus: &Bus) -> Handshake {
    let wb_en = module.add_signal("wb_en", None, SignalKind::Wire);
    let rd_int = module.add_signal("rd_int", None, SignalKind::Wire);
    let wr_int = module.add_signal("wr_int", None, SignalKind::Wire);
    let ack_int = module.add_signal("ack_int", None, SignalKind::Wire);
    let rd_ack = module.add_signal("rd_ack_int", None, SignalKind::Reg);
    let wr_ack = module.add_signal("wr_ack_int", None, SignalKind::Reg);

    module.push(Statement::assign(
        Expr::sig(wb_en),
        Expr::sig(bus.cyc).and(Expr::sig(bus.stb)),
    ));
    module.push(Statement::assign(
        Expr::sig(rd_int),
        Expr::sig(wb_en).and(Expr::sig(bus.we).not()),
    ));
    module.push(Statement::assign(
        Expr::sig(wr_int),
        Expr::sig(wb_en).and(Expr::sig(bus.we)),
    ));
    module.push(Statement::assign(
        Expr::sig(ack_int),
        Expr::sig(rd_ack).or(Expr::sig(wr_ack)),
    ));
    module.push(Statement::assign(Expr::sig(bus.ack), Expr::sig(ack_int)));
    module.push(Statement::assign(
        Expr::sig(bus.stall),
        Expr::sig(ack_int).not().and(Expr::sig(wb_en)),
    ));
    Handshake {
        rd_int,
        wr_int,
        rd_ack,
        wr_ack,
    }
}

/// Drives field outputs from their registers and array addresses from the
/// bus address.
fn field_outputs(map: &RegMap, bus: &Bus, ann: &Annotations, module: &mut Module) {
    for (_, h) in ann.fields.iter() {
        if let (Some(out), Some(reg)) = (h.output, h.storage) {
            module.push(Statement::assign(Expr::sig(out), Expr::sig(reg)));
        }
    }
    for (id, h) in ann.arrays.iter() {
        let sel_bits = map.array(id).map_or(1, |a| a.sel_bits.max(1));
        module.push(Statement::assign(
            Expr::sig(h.address),
            Expr::sig(bus.adr).slice(map.addr_word_bits(), sel_bits),
        ));
    }
}
