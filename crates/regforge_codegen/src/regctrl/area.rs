//! Lowering of one decoded area (the root or a nested block).

use super::Lowering;
use crate::annotations::{FieldHandles, RegHandles};
use crate::errors::{warn_constant_without_preset, GenError};
use crate::width::{
    bit_layout, extend, ilog2, mask, part, split_words, word_address, word_width,
};
use log::debug;
use regforge_ir::{Choice, Expr, Instance, Logic, PortDirection, SignalId, SignalKind, Statement};
use regforge_tree::{Access, NodeId, NodeKind, RegTemplate};

/// Per-area signals. `Loc_` signals are combinational, the others their
/// registered (or passed-through) versions.
pub(crate) struct AreaSignals {
    pub creg_rd_data: SignalId,
    pub creg_rd_ok: SignalId,
    pub creg_wr_ok: SignalId,
    pub loc_creg_rd_data: SignalId,
    pub loc_creg_rd_ok: SignalId,
    pub loc_creg_wr_ok: SignalId,
    pub reg_rd_done: SignalId,
    pub reg_wr_done: SignalId,
    pub reg_rd_data: SignalId,
    pub reg_rd_ok: SignalId,
    pub loc_reg_rd_data: SignalId,
    pub loc_reg_rd_ok: SignalId,
    pub mem_rd_data: SignalId,
    pub mem_rd_done: SignalId,
    pub mem_wr_done: SignalId,
    pub loc_mem_rd_data: SignalId,
    pub loc_mem_rd_done: SignalId,
    pub loc_mem_wr_done: SignalId,
    pub rd_data: SignalId,
    pub rd_done: SignalId,
    pub wr_done: SignalId,
    pub errors: Option<ErrorSignals>,
}

/// Bus-error variants of the area signals.
pub(crate) struct ErrorSignals {
    pub reg_rd_error: SignalId,
    pub reg_wr_error: SignalId,
    pub mem_rd_error: SignalId,
    pub mem_wr_error: SignalId,
    pub loc_mem_rd_error: SignalId,
    pub loc_mem_wr_error: SignalId,
    pub rd_error: SignalId,
    pub wr_error: SignalId,
}

/// What the parent area needs from a lowered area.
pub(crate) struct AreaOutputs {
    pub rd_data: SignalId,
    pub rd_done: SignalId,
    pub wr_done: SignalId,
    pub rd_error: Option<SignalId>,
    pub wr_error: Option<SignalId>,
}

/// Decoding context of an area.
pub(crate) struct Area {
    pub prefix: String,
    /// Bits of the byte address decoded inside the area.
    pub adr_bits: u32,
    /// Address-hit condition; `None` at the root.
    pub hit: Option<Expr>,
}

impl Area {
    /// `if hit then body else otherwise`, or just `body` at the root.
    pub fn guard(&self, body: Vec<Statement>, otherwise: Vec<Statement>) -> Vec<Statement> {
        match &self.hit {
            None => body,
            Some(hit) => vec![Statement::If {
                condition: hit.clone(),
                then_stmts: body,
                else_stmts: otherwise,
            }],
        }
    }

    /// `cond` restricted to addresses inside the area.
    pub fn within(&self, cond: Expr) -> Expr {
        match &self.hit {
            None => cond,
            Some(hit) => hit.clone().and(cond),
        }
    }
}

/// A register as the multiplexers see it.
struct RegInfo {
    id: NodeId,
    access: Access,
    nwords: u32,
    iwidth: u32,
    loc: SignalId,
    wrsel: Vec<SignalId>,
    /// Word labels, word 0 first.
    labels: Vec<Expr>,
}

fn word_suffix(word: u32, nwords: u32) -> String {
    if nwords > 1 {
        format!("_{word}")
    } else {
        String::new()
    }
}

fn bit_const(value: u64, width: u32, scalar: bool) -> Expr {
    if scalar {
        Expr::Bit(Logic::from(value & 1 == 1))
    } else {
        Expr::konst(mask(value, width), width)
    }
}

impl Lowering<'_> {
    fn area_signals(&mut self, prefix: &str) -> AreaSignals {
        let w = Some(self.word_bits());
        let mut sig = |name: String, width: Option<u32>| {
            self.module.add_signal(name, width, SignalKind::Wire)
        };
        let p = prefix;
        let signals = AreaSignals {
            creg_rd_data: sig(format!("{p}CRegRdData"), w),
            creg_rd_ok: sig(format!("{p}CRegRdOK"), None),
            creg_wr_ok: sig(format!("{p}CRegWrOK"), None),
            loc_creg_rd_data: sig(format!("Loc_{p}CRegRdData"), w),
            loc_creg_rd_ok: sig(format!("Loc_{p}CRegRdOK"), None),
            loc_creg_wr_ok: sig(format!("Loc_{p}CRegWrOK"), None),
            reg_rd_done: sig(format!("{p}RegRdDone"), None),
            reg_wr_done: sig(format!("{p}RegWrDone"), None),
            reg_rd_data: sig(format!("{p}RegRdData"), w),
            reg_rd_ok: sig(format!("{p}RegRdOK"), None),
            loc_reg_rd_data: sig(format!("Loc_{p}RegRdData"), w),
            loc_reg_rd_ok: sig(format!("Loc_{p}RegRdOK"), None),
            mem_rd_data: sig(format!("{p}MemRdData"), w),
            mem_rd_done: sig(format!("{p}MemRdDone"), None),
            mem_wr_done: sig(format!("{p}MemWrDone"), None),
            loc_mem_rd_data: sig(format!("Loc_{p}MemRdData"), w),
            loc_mem_rd_done: sig(format!("Loc_{p}MemRdDone"), None),
            loc_mem_wr_done: sig(format!("Loc_{p}MemWrDone"), None),
            rd_data: sig(format!("{p}RdData"), w),
            rd_done: sig(format!("{p}RdDone"), None),
            wr_done: sig(format!("{p}WrDone"), None),
            errors: None,
        };
        if !self.map.bus_error() {
            return signals;
        }
        let mut sig = |name: String| self.module.add_signal(name, None, SignalKind::Wire);
        AreaSignals {
            errors: Some(ErrorSignals {
                reg_rd_error: sig(format!("{p}RegRdError")),
                reg_wr_error: sig(format!("{p}RegWrError")),
                mem_rd_error: sig(format!("{p}MemRdError")),
                mem_wr_error: sig(format!("{p}MemWrError")),
                loc_mem_rd_error: sig(format!("Loc_{p}MemRdError")),
                loc_mem_wr_error: sig(format!("Loc_{p}MemWrError")),
                rd_error: sig(format!("{p}RdError")),
                wr_error: sig(format!("{p}WrError")),
            }),
            ..signals
        }
    }

    /// Lowers the area rooted at `id` and every block nested in it.
    pub(crate) fn area(
        &mut self,
        id: NodeId,
        prefix: &str,
        hit: Option<Expr>,
    ) -> Result<AreaOutputs, GenError> {
        let map = self.map;
        let adr_bits = ilog2(map.span(id));
        let area = Area {
            prefix: prefix.to_string(),
            adr_bits,
            hit,
        };
        debug!("area {}: {} address bits", map.path(id), adr_bits);
        let sigs = self.area_signals(prefix);

        // Declarations
        let mut regs = Vec::new();
        let mut mems = Vec::new();
        let mut blocks = Vec::new();
        for &child in map.children(id) {
            match &map.node(child).kind {
                NodeKind::Reg(_) => regs.push(self.reg_decls(&area, child)?),
                NodeKind::Array(_) => mems.push(self.mem_decls(&area, child)),
                NodeKind::Block(_) => blocks.push(child),
                NodeKind::Root(_) | NodeKind::Field(_) => {}
            }
        }

        // Field wiring
        for reg in &regs {
            self.reg_stmts(&area, reg);
        }
        let (wr_regs, rd_regs): (Vec<&RegInfo>, Vec<&RegInfo>) =
            regs.iter().partition(|r| r.access.is_writable());

        // Register read and write multiplexers
        let wr_depth = if wr_regs.is_empty() {
            self.no_creg_rd_mux(&sigs);
            0
        } else {
            self.wr_sel_dec(&area, &sigs, &wr_regs);
            self.creg_rd_mux(&area, &sigs, &wr_regs);
            1
        };
        let rd_depth = if rd_regs.is_empty() {
            self.no_reg_rd_mux(&sigs);
            wr_depth
        } else {
            self.reg_rd_mux(&area, &sigs, &rd_regs);
            wr_depth + 1
        };
        self.reg_done(&sigs, rd_depth, wr_depth);

        // Memories
        if mems.is_empty() {
            self.no_mem_mux(&sigs);
        } else {
            self.mem_rd_mux(&area, &sigs, &mems);
            self.mem_wr_mux(&area, &sigs, &mems);
            self.mem_assigns(&mems);
        }

        // Nested areas
        let mut children = Vec::with_capacity(blocks.len());
        for block in blocks {
            let child_hit = self.block_hit(&area, block)?;
            let child_prefix = format!("{prefix}{}_", map.node(block).name);
            let outputs = self.area(block, &child_prefix, Some(child_hit.clone()))?;
            children.push((child_hit, outputs));
        }
        self.area_outputs(prefix, &sigs, children);

        Ok(AreaOutputs {
            rd_data: sigs.rd_data,
            rd_done: sigs.rd_done,
            wr_done: sigs.wr_done,
            rd_error: sigs.errors.as_ref().map(|e| e.rd_error),
            wr_error: sigs.errors.as_ref().map(|e| e.wr_error),
        })
    }

    /// Hit condition of a block nested in `area`: the block's address bits
    /// above its own size match.
    fn block_hit(&self, area: &Area, block: NodeId) -> Result<Expr, GenError> {
        let map = self.map;
        let address = map.address(block);
        let size = map.span(block);
        let bits = ilog2(size);
        if bits < self.awb() || address % (1u64 << bits) != 0 {
            return Err(GenError::Area {
                path: map.path(block),
                address,
                size,
            });
        }
        let cond = (area.adr_bits > bits).then(|| {
            let width = area.adr_bits - bits;
            Expr::sig(self.bus.addr)
                .slice(bits, width)
                .equals(Expr::konst(address >> bits, width))
        });
        Ok(match (&area.hit, cond) {
            (Some(h), Some(c)) => h.clone().and(c),
            (Some(h), None) => h.clone(),
            (None, Some(c)) => c,
            (None, None) => Expr::one(),
        })
    }

    /// Ports, live value, write selects and register instances of a register.
    fn reg_decls(&mut self, area: &Area, id: NodeId) -> Result<RegInfo, GenError> {
        let map = self.map;
        let node = map.node(id);
        let Some(reg) = map.reg(id) else {
            return Err(GenError::Layout {
                path: map.path(id),
                reason: "not a register".to_string(),
            });
        };
        let p = &area.prefix;
        let name = format!("{p}{}", node.name);
        let Some(iwidth) = word_width(reg.width, reg.nwords) else {
            return Err(GenError::WordSplit {
                path: map.path(id),
                width: reg.width,
                nwords: reg.nwords,
            });
        };

        // Field ports
        let direction = if reg.access.is_writable() {
            PortDirection::Output
        } else {
            PortDirection::Input
        };
        for (fid, f) in map.fields(id) {
            if reg.access == Access::Cst {
                if f.preset.is_none() {
                    self.sink.emit(warn_constant_without_preset(&map.path(fid)));
                }
                continue;
            }
            let port_name = if f.anonymous {
                name.clone()
            } else {
                format!("{name}_{}", map.node(fid).name)
            };
            let (width, lo) = if f.is_scalar() {
                (None, 0)
            } else {
                (Some(f.width()), f.lo)
            };
            let comment = map.node(fid).description.clone().or_else(|| node.description.clone());
            let port = self
                .module
                .add_port_full(port_name, direction, width, lo, comment);
            let handles = if reg.access.is_writable() {
                FieldHandles {
                    output: Some(port),
                    ..FieldHandles::default()
                }
            } else {
                FieldHandles {
                    input: Some(port),
                    ..FieldHandles::default()
                }
            };
            self.ann.fields.insert(fid, handles);
        }

        let loc = self
            .module
            .add_signal(format!("Loc_{name}"), Some(reg.width), SignalKind::Wire);
        let awb = self.awb();
        let label_width = area.adr_bits.saturating_sub(awb);
        let labels = (0..reg.nwords)
            .map(|i| {
                let addr = word_address(reg.address, i, reg.nwords, map.word_size());
                Expr::konst(mask(addr >> awb, label_width), label_width)
            })
            .collect();
        let mut info = RegInfo {
            id,
            access: reg.access,
            nwords: reg.nwords,
            iwidth,
            loc,
            wrsel: Vec::new(),
            labels,
        };
        let mut handles = RegHandles {
            value: Some(loc),
            ..RegHandles::default()
        };
        if !reg.access.is_writable() {
            self.ann.regs.insert(id, handles);
            return Ok(info);
        }

        let template = RegTemplate::parse(&reg.x_gena).map_err(|source| GenError::Template {
            path: map.path(id),
            source,
        })?;
        let dwidth = match template {
            RegTemplate::CtrlRegN => iwidth,
            RegTemplate::RmwReg => 2 * iwidth,
        };
        if dwidth > self.word_bits() {
            return Err(GenError::RmwTooWide {
                path: map.path(id),
                needed: dwidth,
                word_bits: self.word_bits(),
            });
        }
        self.templates.insert(template);

        for i in (0..reg.nwords).rev() {
            let sfx = word_suffix(i, reg.nwords);
            info.wrsel.push(self.module.add_signal(
                format!("WrSel_{name}{sfx}"),
                None,
                SignalKind::Wire,
            ));
        }
        info.wrsel.reverse();

        let bus = &self.bus;
        for i in (0..reg.nwords).rev() {
            let sfx = word_suffix(i, reg.nwords);
            let inst = Instance {
                name: format!("Reg_{name}{sfx}"),
                template: template.name().to_string(),
                params: vec![("N".to_string(), i64::from(iwidth))],
                conns: vec![
                    (
                        "VMEWrData".to_string(),
                        part(Expr::sig(bus.wr_data), 0, dwidth, self.word_bits(), false),
                    ),
                    ("Clk".to_string(), Expr::sig(bus.clk)),
                    ("Rst".to_string(), Expr::sig(bus.rst)),
                    ("WriteMem".to_string(), Expr::sig(bus.wr_mem)),
                    ("CRegSel".to_string(), Expr::sig(info.wrsel[i as usize])),
                    (
                        "AutoClrMsk".to_string(),
                        Expr::named(format!("C_ACM_{name}{sfx}"), iwidth),
                    ),
                    (
                        "Preset".to_string(),
                        Expr::named(format!("C_PSM_{name}{sfx}"), iwidth),
                    ),
                    (
                        "CReg".to_string(),
                        part(Expr::sig(loc), i * iwidth, iwidth, reg.width, false),
                    ),
                ],
            };
            handles.instances.push(inst.name.clone());
            self.module.push(Statement::Instance(inst));
        }
        handles.instances.reverse();
        handles.write_selects = info.wrsel.clone();
        self.ann.regs.insert(id, handles);
        Ok(info)
    }

    /// Connects field ports, presets and preset-mask gaps to `Loc_`.
    fn reg_stmts(&mut self, area: &Area, info: &RegInfo) {
        let map = self.map;
        let Some(reg) = map.reg(info.id) else { return };
        let name = format!("{}{}", area.prefix, map.node(info.id).name);
        let fields: Vec<_> = map
            .fields(info.id)
            .map(|(id, f)| (id, f.lo, f.width()))
            .collect();
        let layout = bit_layout(&fields, reg.width);
        let loc = Expr::sig(info.loc);
        let mut stmts = Vec::new();
        for (_, seg) in split_words(&layout, info.iwidth).into_iter().rev() {
            match seg.field {
                Some(fid) => {
                    let Some(f) = map.field(fid) else { continue };
                    if seg.lo != f.lo {
                        // Continuation of a field cut at a word boundary.
                        continue;
                    }
                    let scalar = f.is_scalar();
                    let tgt = part(loc.clone(), f.lo, f.width(), reg.width, scalar);
                    let port = self
                        .ann
                        .fields
                        .get(fid)
                        .and_then(|h| h.input.or(h.output));
                    match (reg.access, port) {
                        (Access::Cst, _) => stmts.push(Statement::assign(
                            tgt,
                            bit_const(f.preset.unwrap_or(0), f.width(), scalar),
                        )),
                        (Access::Ro, Some(port)) => {
                            stmts.push(Statement::assign(tgt, Expr::sig(port)))
                        }
                        (Access::Wo | Access::Rw, Some(port)) => {
                            stmts.push(Statement::assign(Expr::sig(port), tgt))
                        }
                        _ => {}
                    }
                }
                None if !reg.access.is_writable() => {
                    let word = seg.lo / info.iwidth;
                    let local = seg.lo - word * info.iwidth;
                    let scalar = seg.width == 1;
                    let psm = Expr::named(
                        format!("C_PSM_{name}{}", word_suffix(word, info.nwords)),
                        info.iwidth,
                    );
                    stmts.push(Statement::assign(
                        part(loc.clone(), seg.lo, seg.width, reg.width, scalar),
                        part(psm, local, seg.width, info.iwidth, scalar),
                    ));
                }
                None => {}
            }
        }
        self.module.stmts.extend(stmts);
    }

    /// Value of word `word` of a register, widened to the bus word.
    fn word_value(&self, info: &RegInfo, word: u32) -> Expr {
        let width = info.iwidth * info.nwords;
        let value = part(
            Expr::sig(info.loc),
            word * info.iwidth,
            info.iwidth,
            width,
            false,
        );
        extend(value, info.iwidth, self.word_bits())
    }

    /// Decodes writes into the per-word `WrSel_` strobes.
    fn wr_sel_dec(&mut self, area: &Area, sigs: &AreaSignals, regs: &[&RegInfo]) {
        let mut stmts = Vec::new();
        for reg in regs {
            for i in (0..reg.nwords).rev() {
                stmts.push(Statement::assign(
                    Expr::sig(reg.wrsel[i as usize]),
                    Expr::zero(),
                ));
            }
        }
        let mut choices = Vec::new();
        for reg in regs {
            for i in (0..reg.nwords).rev() {
                choices.push(Choice::Value {
                    value: reg.labels[i as usize].clone(),
                    stmts: vec![
                        Statement::assign(Expr::sig(reg.wrsel[i as usize]), Expr::one()),
                        Statement::assign(Expr::sig(sigs.loc_creg_wr_ok), Expr::one()),
                    ],
                });
            }
        }
        let not_ok = vec![Statement::assign(Expr::sig(sigs.loc_creg_wr_ok), Expr::zero())];
        choices.push(Choice::Default {
            stmts: not_ok.clone(),
        });
        stmts.extend(area.guard(self.select(area, choices), not_ok));
        self.module
            .push(Statement::comb(format!("{}WrSelDec", area.prefix), stmts));
    }

    /// Read multiplexer of the control (writable) registers.
    fn creg_rd_mux(&mut self, area: &Area, sigs: &AreaSignals, regs: &[&RegInfo]) {
        let w = self.word_bits();
        let data = Expr::sig(sigs.loc_creg_rd_data);
        let ok = Expr::sig(sigs.loc_creg_rd_ok);
        let mut choices = Vec::new();
        for reg in regs {
            for i in (0..reg.nwords).rev() {
                let (value, hit) = if reg.access == Access::Wo {
                    (Expr::konst(0, w), Expr::zero())
                } else {
                    (self.word_value(reg, i), Expr::one())
                };
                choices.push(Choice::Value {
                    value: reg.labels[i as usize].clone(),
                    stmts: vec![
                        Statement::assign(data.clone(), value),
                        Statement::assign(ok.clone(), hit),
                    ],
                });
            }
        }
        let miss = vec![
            Statement::assign(data.clone(), Expr::konst(0, w)),
            Statement::assign(ok.clone(), Expr::zero()),
        ];
        choices.push(Choice::Default {
            stmts: miss.clone(),
        });
        let stmts = area.guard(self.select(area, choices), miss);
        self.module
            .push(Statement::comb(format!("{}CRegRdMux", area.prefix), stmts));
        let dff = self.creg_asgn(sigs);
        self.dff(format!("{}CRegRdMux_DFF", area.prefix), dff);
    }

    fn creg_asgn(&self, sigs: &AreaSignals) -> Vec<Statement> {
        vec![
            Statement::assign(Expr::sig(sigs.creg_rd_data), Expr::sig(sigs.loc_creg_rd_data)),
            Statement::assign(Expr::sig(sigs.creg_rd_ok), Expr::sig(sigs.loc_creg_rd_ok)),
            Statement::assign(Expr::sig(sigs.creg_wr_ok), Expr::sig(sigs.loc_creg_wr_ok)),
        ]
    }

    fn no_creg_rd_mux(&mut self, sigs: &AreaSignals) {
        let w = self.word_bits();
        let mut stmts = vec![
            Statement::assign(Expr::sig(sigs.loc_creg_rd_data), Expr::konst(0, w)),
            Statement::assign(Expr::sig(sigs.loc_creg_rd_ok), Expr::zero()),
            Statement::assign(Expr::sig(sigs.loc_creg_wr_ok), Expr::zero()),
        ];
        stmts.extend(self.creg_asgn(sigs));
        self.module.stmts.extend(stmts);
    }

    /// Read multiplexer of the read-only and constant registers, falling back
    /// to the control register path.
    fn reg_rd_mux(&mut self, area: &Area, sigs: &AreaSignals, regs: &[&RegInfo]) {
        let data = Expr::sig(sigs.loc_reg_rd_data);
        let ok = Expr::sig(sigs.loc_reg_rd_ok);
        let mut choices = Vec::new();
        for reg in regs {
            for i in (0..reg.nwords).rev() {
                choices.push(Choice::Value {
                    value: reg.labels[i as usize].clone(),
                    stmts: vec![
                        Statement::assign(data.clone(), self.word_value(reg, i)),
                        Statement::assign(ok.clone(), Expr::one()),
                    ],
                });
            }
        }
        let fallback = vec![
            Statement::assign(data, Expr::sig(sigs.creg_rd_data)),
            Statement::assign(ok, Expr::sig(sigs.creg_rd_ok)),
        ];
        choices.push(Choice::Default {
            stmts: fallback.clone(),
        });
        let stmts = area.guard(self.select(area, choices), fallback);
        self.module
            .push(Statement::comb(format!("{}RegRdMux", area.prefix), stmts));
        self.dff(
            format!("{}RegRdMux_DFF", area.prefix),
            vec![
                Statement::assign(Expr::sig(sigs.reg_rd_data), Expr::sig(sigs.loc_reg_rd_data)),
                Statement::assign(Expr::sig(sigs.reg_rd_ok), Expr::sig(sigs.loc_reg_rd_ok)),
            ],
        );
    }

    fn no_reg_rd_mux(&mut self, sigs: &AreaSignals) {
        self.module.stmts.extend([
            Statement::assign(Expr::sig(sigs.loc_reg_rd_data), Expr::sig(sigs.creg_rd_data)),
            Statement::assign(Expr::sig(sigs.loc_reg_rd_ok), Expr::sig(sigs.creg_rd_ok)),
            Statement::assign(Expr::sig(sigs.reg_rd_data), Expr::sig(sigs.loc_reg_rd_data)),
            Statement::assign(Expr::sig(sigs.reg_rd_ok), Expr::sig(sigs.loc_reg_rd_ok)),
        ]);
    }

    /// Register-path completion: the delayed strobe at the pipeline depth,
    /// qualified by the decoder's OK.
    fn reg_done(&mut self, sigs: &AreaSignals, rd_depth: u32, wr_depth: u32) {
        let rd_tap = self.tap(self.rd_taps, rd_depth);
        let wr_tap = self.tap(self.wr_taps, wr_depth);
        let mut stmts = vec![
            Statement::assign(
                Expr::sig(sigs.reg_rd_done),
                rd_tap.clone().and(Expr::sig(sigs.reg_rd_ok)),
            ),
            Statement::assign(
                Expr::sig(sigs.reg_wr_done),
                wr_tap.clone().and(Expr::sig(sigs.creg_wr_ok)),
            ),
        ];
        if let Some(e) = &sigs.errors {
            stmts.push(Statement::assign(
                Expr::sig(e.reg_rd_error),
                rd_tap.and(Expr::sig(sigs.reg_rd_ok).not()),
            ));
            stmts.push(Statement::assign(
                Expr::sig(e.reg_wr_error),
                wr_tap.and(Expr::sig(sigs.creg_wr_ok).not()),
            ));
        }
        self.module.stmts.extend(stmts);
    }

    /// Drives the area outputs from the memory stage, or from the nested
    /// area the address hits.
    fn area_outputs(
        &mut self,
        prefix: &str,
        sigs: &AreaSignals,
        children: Vec<(Expr, AreaOutputs)>,
    ) {
        let own = |sigs: &AreaSignals| {
            let mut stmts = vec![
                Statement::assign(Expr::sig(sigs.rd_data), Expr::sig(sigs.mem_rd_data)),
                Statement::assign(Expr::sig(sigs.rd_done), Expr::sig(sigs.mem_rd_done)),
                Statement::assign(Expr::sig(sigs.wr_done), Expr::sig(sigs.mem_wr_done)),
            ];
            if let Some(e) = &sigs.errors {
                stmts.push(Statement::assign(Expr::sig(e.rd_error), Expr::sig(e.mem_rd_error)));
                stmts.push(Statement::assign(Expr::sig(e.wr_error), Expr::sig(e.mem_wr_error)));
            }
            stmts
        };
        if children.is_empty() {
            let stmts = own(sigs);
            self.module.stmts.extend(stmts);
            return;
        }
        let mut chain = own(sigs);
        for (hit, child) in children.into_iter().rev() {
            let mut then_stmts = vec![
                Statement::assign(Expr::sig(sigs.rd_data), Expr::sig(child.rd_data)),
                Statement::assign(Expr::sig(sigs.rd_done), Expr::sig(child.rd_done)),
                Statement::assign(Expr::sig(sigs.wr_done), Expr::sig(child.wr_done)),
            ];
            if let (Some(e), Some(rd), Some(wr)) = (&sigs.errors, child.rd_error, child.wr_error) {
                then_stmts.push(Statement::assign(Expr::sig(e.rd_error), Expr::sig(rd)));
                then_stmts.push(Statement::assign(Expr::sig(e.wr_error), Expr::sig(wr)));
            }
            chain = vec![Statement::If {
                condition: hit,
                then_stmts,
                else_stmts: chain,
            }];
        }
        self.module
            .push(Statement::comb(format!("{prefix}AreaMux"), chain));
    }

    /// Clocked process without reset.
    pub(crate) fn dff(&mut self, name: String, stmts: Vec<Statement>) {
        self.module.push(Statement::Sync {
            name,
            clock: self.bus.clk,
            reset: None,
            reset_stmts: Vec::new(),
            stmts,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suffix_only_for_multi_word() {
        assert_eq!(word_suffix(0, 1), "");
        assert_eq!(word_suffix(1, 2), "_1");
    }

    #[test]
    fn scalar_constants_are_bits() {
        assert_eq!(bit_const(1, 1, true), Expr::one());
        assert_eq!(bit_const(0x1ff, 8, false), Expr::konst(0xff, 8));
    }

    #[test]
    fn root_area_is_unguarded() {
        let area = Area {
            prefix: String::new(),
            adr_bits: 4,
            hit: None,
        };
        let body = vec![Statement::Comment("x".into())];
        assert_eq!(area.guard(body.clone(), Vec::new()), body);
        assert_eq!(area.within(Expr::one()), Expr::one());
    }
}
