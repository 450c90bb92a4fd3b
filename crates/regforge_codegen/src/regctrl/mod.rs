//! Multiplexed control backend (`cern-be-vme`).
//!
//! Every writable register word is stored in an instance of a register IP
//! (`CtrlRegN` or `RMWReg`) selected by a decoded `WrSel_` strobe. Reads go
//! through a chain of registered multiplexers: control registers, then the
//! other registers, then memories. Each stage that exists adds one clock of
//! latency, and the `Done` outputs tap the delayed bus strobes
//! (`Loc_VMERdMem`, `Loc_VMEWrMem`) at the matching depth.
//!
//! Nested blocks are lowered as areas of their own, guarded by their
//! address-hit condition and selected by the parent's `AreaMux`.

mod area;
mod mem;

use self::area::Area;
use crate::annotations::Annotations;
use crate::component::declaration;
use crate::errors::GenError;
use crate::width::ilog2;
use log::debug;
use regforge_config::RegctrlConfig;
use regforge_diagnostics::DiagnosticSink;
use regforge_ir::{Choice, Expr, Module, PortDirection, SignalId, SignalKind, Statement};
use regforge_tree::{RegMap, RegTemplate};
use std::collections::BTreeSet;

/// VME-style bus ports.
pub(crate) struct Bus {
    pub clk: SignalId,
    pub rst: SignalId,
    pub addr: SignalId,
    pub rd_data: SignalId,
    pub wr_data: SignalId,
    pub rd_mem: SignalId,
    pub wr_mem: SignalId,
    pub rd_done: SignalId,
    pub wr_done: SignalId,
    pub rd_error: Option<SignalId>,
    pub wr_error: Option<SignalId>,
}

/// Lowering state shared by every area.
pub(crate) struct Lowering<'a> {
    pub map: &'a RegMap,
    pub config: &'a RegctrlConfig,
    pub sink: &'a DiagnosticSink,
    pub module: Module,
    pub ann: Annotations,
    pub bus: Bus,
    /// Read strobe delay line, `Loc_VMERdMem[2:0]`.
    pub rd_taps: SignalId,
    /// Write strobe delay line, `Loc_VMEWrMem[1:0]`.
    pub wr_taps: SignalId,
    /// Register IP kinds instantiated so far.
    pub templates: BTreeSet<RegTemplate>,
}

impl Lowering<'_> {
    pub fn word_bits(&self) -> u32 {
        self.map.word_bits()
    }

    pub fn awb(&self) -> u32 {
        self.map.addr_word_bits()
    }

    /// Word-address bits of the bus address, `VMEAddr[adr_bits-1:awb]`.
    pub fn addr_word(&self, adr_bits: u32) -> Expr {
        Expr::sig(self.bus.addr).slice(self.awb(), adr_bits - self.awb())
    }

    /// Switch on the word address of `area`. An area of a single word has
    /// no word-address bits and takes its one case directly.
    pub fn select(&self, area: &Area, choices: Vec<Choice>) -> Vec<Statement> {
        if area.adr_bits > self.awb() {
            return vec![Statement::Switch {
                subject: self.addr_word(area.adr_bits),
                choices,
            }];
        }
        let mut default = Vec::new();
        for choice in choices {
            match choice {
                Choice::Value { stmts, .. } => return stmts,
                Choice::Default { stmts } => default = stmts,
            }
        }
        default
    }

    /// Tap `depth` of a strobe delay line.
    pub fn tap(&self, taps: SignalId, depth: u32) -> Expr {
        Expr::sig(taps).index(depth)
    }
}

fn bus_ports(map: &RegMap, module: &mut Module) -> Bus {
    use PortDirection::{Input, Output};
    let word_bits = map.word_bits();
    let awb = map.addr_word_bits();
    let adr_bits = ilog2(map.root_data().size);
    let clk = module.add_port("Clk", Input, None);
    let rst = module.add_port("Rst", Input, None);
    // A single-word map still gets a one-bit address, which nothing decodes.
    let addr_bits = adr_bits.saturating_sub(awb).max(1);
    let addr = module.add_port_full("VMEAddr", Input, Some(addr_bits), awb, None);
    let rd_data = module.add_port("VMERdData", Output, Some(word_bits));
    let wr_data = module.add_port("VMEWrData", Input, Some(word_bits));
    let rd_mem = module.add_port("VMERdMem", Input, None);
    let wr_mem = module.add_port("VMEWrMem", Input, None);
    let rd_done = module.add_port("VMERdDone", Output, None);
    let wr_done = module.add_port("VMEWrDone", Output, None);
    let (rd_error, wr_error) = if map.bus_error() {
        (
            Some(module.add_port("VMERdError", Output, None)),
            Some(module.add_port("VMEWrError", Output, None)),
        )
    } else {
        (None, None)
    };
    Bus {
        clk,
        rst,
        addr,
        rd_data,
        wr_data,
        rd_mem,
        wr_mem,
        rd_done,
        wr_done,
        rd_error,
        wr_error,
    }
}

/// Lowers `map` into a register control module called `name`.
pub(crate) fn generate(
    map: &RegMap,
    config: &RegctrlConfig,
    name: &str,
    sink: &DiagnosticSink,
) -> Result<(Module, Annotations), GenError> {
    let mut module = Module::new(name);
    module.libraries.push(config.library.clone());
    module.deps.push(format!("{}{}", config.memmap_prefix, map.name()));
    let bus = bus_ports(map, &mut module);
    let rd_taps = module.add_signal("Loc_VMERdMem", Some(3), SignalKind::Reg);
    let wr_taps = module.add_signal("Loc_VMEWrMem", Some(2), SignalKind::Reg);

    let mut lowering = Lowering {
        map,
        config,
        sink,
        module,
        ann: Annotations::default(),
        bus,
        rd_taps,
        wr_taps,
        templates: BTreeSet::new(),
    };
    let outputs = lowering.area(map.root(), "", None)?;
    lowering.strobe_seq();

    let bus = &lowering.bus;
    let mut tail = vec![
        Statement::assign(Expr::sig(bus.rd_data), Expr::sig(outputs.rd_data)),
        Statement::assign(Expr::sig(bus.rd_done), Expr::sig(outputs.rd_done)),
        Statement::assign(Expr::sig(bus.wr_done), Expr::sig(outputs.wr_done)),
    ];
    if let (Some(port), Some(sig)) = (bus.rd_error, outputs.rd_error) {
        tail.push(Statement::assign(Expr::sig(port), Expr::sig(sig)));
    }
    if let (Some(port), Some(sig)) = (bus.wr_error, outputs.wr_error) {
        tail.push(Statement::assign(Expr::sig(port), Expr::sig(sig)));
    }
    lowering.module.stmts.extend(tail);

    for &template in &lowering.templates {
        lowering
            .module
            .components
            .push(declaration(template, lowering.config));
    }
    let (assigns, procs, insts) = lowering.module.stats();
    debug!(
        "regctrl: {} ports, {} assignments, {} processes, {} instances",
        lowering.module.ports.len(),
        assigns,
        procs,
        insts
    );
    Ok((lowering.module, lowering.ann))
}

impl Lowering<'_> {
    /// Shift registers delaying the raw bus strobes.
    fn strobe_seq(&mut self) {
        let rd = Expr::sig(self.rd_taps);
        let wr = Expr::sig(self.wr_taps);
        let stmts = vec![
            Statement::assign(
                rd.clone(),
                Expr::Concat(vec![rd.slice(0, 2), Expr::sig(self.bus.rd_mem)]),
            ),
            Statement::assign(
                wr.clone(),
                Expr::Concat(vec![wr.slice(0, 1), Expr::sig(self.bus.wr_mem)]),
            ),
        ];
        self.module.push(Statement::Sync {
            name: "StrobeSeq".to_string(),
            clock: self.bus.clk,
            reset: None,
            reset_stmts: Vec::new(),
            stmts,
        });
    }
}
