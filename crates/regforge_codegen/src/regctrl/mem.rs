//! Memory interfaces of an area and the memory read/write multiplexers.

use super::area::{Area, AreaSignals};
use super::Lowering;
use crate::annotations::ArrayHandles;
use crate::width::{extend, mask, part};
use regforge_ir::{Expr, PortDirection, SignalId, SignalKind, Statement};
use regforge_tree::{Access, NodeId};

/// A memory as the multiplexers see it.
pub(crate) struct MemInfo {
    width: u32,
    sel_bits: u32,
    /// Inclusive range of word addresses, at the width of the area decoder.
    start: Expr,
    end: Expr,
    sel: SignalId,
    sel_port: SignalId,
    addr: SignalId,
    rd: Option<(SignalId, SignalId, SignalId)>,
    wr: Option<(SignalId, SignalId, SignalId)>,
}

impl Lowering<'_> {
    /// Declares the ports of memory `id`: select, entry address, and a data,
    /// strobe and done triple per supported direction.
    pub(crate) fn mem_decls(&mut self, area: &Area, id: NodeId) -> MemInfo {
        use PortDirection::{Input, Output};
        let map = self.map;
        let awb = self.awb();
        let name = format!("{}{}", area.prefix, map.node(id).name);
        let (address, size, sel_bits, element) = match map.array(id) {
            Some(a) => (a.address, a.size, a.sel_bits, a.element),
            None => (map.address(id), map.span(id), 0, id),
        };
        let (access, width) = map
            .reg(element)
            .map(|r| (r.access, r.width))
            .unwrap_or((Access::Rw, self.word_bits()));
        let comment = map.node(id).description.clone();

        let sel_port = self
            .module
            .add_port_full(format!("{name}_Sel"), Output, None, 0, comment);
        let addr = self.module.add_port_full(
            format!("{name}_Addr"),
            Output,
            Some(sel_bits.max(1)),
            awb,
            None,
        );
        let rd = access.is_readable().then(|| {
            (
                self.module
                    .add_port(format!("{name}_RdData"), Input, Some(width)),
                self.module.add_port(format!("{name}_RdMem"), Output, None),
                self.module.add_port(format!("{name}_RdDone"), Input, None),
            )
        });
        let wr = access.is_writable().then(|| {
            (
                self.module
                    .add_port(format!("{name}_WrData"), Output, Some(width)),
                self.module.add_port(format!("{name}_WrMem"), Output, None),
                self.module.add_port(format!("{name}_WrDone"), Input, None),
            )
        });
        let sel = self
            .module
            .add_signal(format!("Sel_{name}"), None, SignalKind::Wire);

        self.ann.arrays.insert(
            id,
            ArrayHandles {
                address: addr,
                read_data: rd.map(|r| r.0),
                write_data: wr.map(|w| w.0),
                select: Some(sel_port),
                read_strobe: rd.map(|r| r.1),
                write_strobe: wr.map(|w| w.1),
                read_done: rd.map(|r| r.2),
                write_done: wr.map(|w| w.2),
            },
        );

        let label_width = area.adr_bits.saturating_sub(awb);
        let last = address + size.saturating_sub(1);
        MemInfo {
            width,
            sel_bits,
            start: Expr::konst(mask(address >> awb, label_width), label_width),
            end: Expr::konst(mask(last >> awb, label_width), label_width),
            sel,
            sel_port,
            addr,
            rd,
            wr,
        }
    }

    fn mem_hit(&self, area: &Area, mem: &MemInfo) -> Expr {
        if area.adr_bits <= self.awb() {
            return area.hit.clone().unwrap_or_else(Expr::one);
        }
        let word = self.addr_word(area.adr_bits);
        area.within(
            word.clone()
                .ge(mem.start.clone())
                .and(word.le(mem.end.clone())),
        )
    }

    /// Selects the memory the address falls in for reads, falling back to
    /// the register path.
    pub(crate) fn mem_rd_mux(&mut self, area: &Area, sigs: &AreaSignals, mems: &[MemInfo]) {
        let w = self.word_bits();
        let data = Expr::sig(sigs.loc_mem_rd_data);
        let done = Expr::sig(sigs.loc_mem_rd_done);
        let error = sigs.errors.as_ref().map(|e| Expr::sig(e.loc_mem_rd_error));

        let mut chain = vec![
            Statement::assign(data.clone(), Expr::sig(sigs.reg_rd_data)),
            Statement::assign(done.clone(), Expr::sig(sigs.reg_rd_done)),
        ];
        if let (Some(error), Some(e)) = (&error, &sigs.errors) {
            chain.push(Statement::assign(error.clone(), Expr::sig(e.reg_rd_error)));
        }
        for mem in mems.iter().rev() {
            let mut body = Vec::new();
            match mem.rd {
                Some((rd_data, _, rd_done)) => {
                    body.push(Statement::assign(Expr::sig(mem.sel), Expr::one()));
                    body.push(Statement::assign(
                        data.clone(),
                        extend(Expr::sig(rd_data), mem.width, w),
                    ));
                    body.push(Statement::assign(done.clone(), Expr::sig(rd_done)));
                    if let Some(error) = &error {
                        body.push(Statement::assign(error.clone(), Expr::zero()));
                    }
                }
                // Reading a write-only memory terminates on the strobe.
                None => {
                    body.push(Statement::assign(data.clone(), Expr::konst(0, w)));
                    match &error {
                        Some(error) => {
                            body.push(Statement::assign(done.clone(), Expr::zero()));
                            body.push(Statement::assign(
                                error.clone(),
                                self.tap(self.rd_taps, 0),
                            ));
                        }
                        None => {
                            body.push(Statement::assign(done.clone(), self.tap(self.rd_taps, 0)))
                        }
                    }
                }
            }
            chain = vec![Statement::If {
                condition: self.mem_hit(area, mem),
                then_stmts: body,
                else_stmts: chain,
            }];
        }
        let mut stmts: Vec<Statement> = mems
            .iter()
            .filter(|m| m.rd.is_some())
            .map(|m| Statement::assign(Expr::sig(m.sel), Expr::zero()))
            .collect();
        stmts.extend(chain);
        self.module
            .push(Statement::comb(format!("{}MemRdMux", area.prefix), stmts));

        let mut dff = vec![
            Statement::assign(Expr::sig(sigs.mem_rd_data), Expr::sig(sigs.loc_mem_rd_data)),
            Statement::assign(Expr::sig(sigs.mem_rd_done), Expr::sig(sigs.loc_mem_rd_done)),
        ];
        if let Some(e) = &sigs.errors {
            dff.push(Statement::assign(
                Expr::sig(e.mem_rd_error),
                Expr::sig(e.loc_mem_rd_error),
            ));
        }
        self.dff(format!("{}MemRdMux_DFF", area.prefix), dff);
    }

    /// Write completion of the memory the address falls in, falling back to
    /// the register path. Write-only memories drive their select from here.
    pub(crate) fn mem_wr_mux(&mut self, area: &Area, sigs: &AreaSignals, mems: &[MemInfo]) {
        let done = Expr::sig(sigs.loc_mem_wr_done);
        let error = sigs.errors.as_ref().map(|e| Expr::sig(e.loc_mem_wr_error));

        let mut chain = vec![Statement::assign(done.clone(), Expr::sig(sigs.reg_wr_done))];
        if let (Some(error), Some(e)) = (&error, &sigs.errors) {
            chain.push(Statement::assign(error.clone(), Expr::sig(e.reg_wr_error)));
        }
        for mem in mems.iter().rev() {
            let mut body = Vec::new();
            if mem.rd.is_none() {
                body.push(Statement::assign(Expr::sig(mem.sel), Expr::one()));
            }
            match (mem.wr, &error) {
                (Some((_, _, wr_done)), _) => {
                    body.push(Statement::assign(done.clone(), Expr::sig(wr_done)));
                    if let Some(error) = &error {
                        body.push(Statement::assign(error.clone(), Expr::zero()));
                    }
                }
                (None, Some(error)) => {
                    body.push(Statement::assign(done.clone(), Expr::zero()));
                    body.push(Statement::assign(error.clone(), self.tap(self.wr_taps, 0)));
                }
                (None, None) => {
                    body.push(Statement::assign(done.clone(), self.tap(self.wr_taps, 0)))
                }
            }
            chain = vec![Statement::If {
                condition: self.mem_hit(area, mem),
                then_stmts: body,
                else_stmts: chain,
            }];
        }
        let mut stmts: Vec<Statement> = mems
            .iter()
            .filter(|m| m.rd.is_none())
            .map(|m| Statement::assign(Expr::sig(m.sel), Expr::zero()))
            .collect();
        stmts.extend(chain);
        self.module
            .push(Statement::comb(format!("{}MemWrMux", area.prefix), stmts));

        let mut dff = vec![Statement::assign(
            Expr::sig(sigs.mem_wr_done),
            Expr::sig(sigs.loc_mem_wr_done),
        )];
        if let Some(e) = &sigs.errors {
            dff.push(Statement::assign(
                Expr::sig(e.mem_wr_error),
                Expr::sig(e.loc_mem_wr_error),
            ));
        }
        self.dff(format!("{}MemWrMux_DFF", area.prefix), dff);
    }

    /// Drives the memory ports from the bus and the decoded selects.
    pub(crate) fn mem_assigns(&mut self, mems: &[MemInfo]) {
        let awb = self.awb();
        let w = self.word_bits();
        let bus = &self.bus;
        let mut stmts = Vec::new();
        for mem in mems {
            stmts.push(Statement::assign(
                Expr::sig(mem.addr),
                Expr::sig(bus.addr).slice(awb, mem.sel_bits.max(1)),
            ));
            stmts.push(Statement::assign(Expr::sig(mem.sel_port), Expr::sig(mem.sel)));
            if let Some((_, rd_mem, _)) = mem.rd {
                stmts.push(Statement::assign(
                    Expr::sig(rd_mem),
                    Expr::sig(mem.sel).and(Expr::sig(bus.rd_mem)),
                ));
            }
            if let Some((wr_data, wr_mem, _)) = mem.wr {
                stmts.push(Statement::assign(
                    Expr::sig(wr_mem),
                    Expr::sig(mem.sel).and(Expr::sig(bus.wr_mem)),
                ));
                stmts.push(Statement::assign(
                    Expr::sig(wr_data),
                    part(Expr::sig(bus.wr_data), 0, mem.width, w, false),
                ));
            }
        }
        self.module.stmts.extend(stmts);
    }

    /// An area without memories passes the register path through.
    pub(crate) fn no_mem_mux(&mut self, sigs: &AreaSignals) {
        let mut stmts = vec![
            Statement::assign(Expr::sig(sigs.loc_mem_rd_data), Expr::sig(sigs.reg_rd_data)),
            Statement::assign(Expr::sig(sigs.loc_mem_rd_done), Expr::sig(sigs.reg_rd_done)),
            Statement::assign(Expr::sig(sigs.loc_mem_wr_done), Expr::sig(sigs.reg_wr_done)),
            Statement::assign(Expr::sig(sigs.mem_rd_data), Expr::sig(sigs.loc_mem_rd_data)),
            Statement::assign(Expr::sig(sigs.mem_rd_done), Expr::sig(sigs.loc_mem_rd_done)),
            Statement::assign(Expr::sig(sigs.mem_wr_done), Expr::sig(sigs.loc_mem_wr_done)),
        ];
        if let Some(e) = &sigs.errors {
            stmts.extend([
                Statement::assign(Expr::sig(e.loc_mem_rd_error), Expr::sig(e.reg_rd_error)),
                Statement::assign(Expr::sig(e.loc_mem_wr_error), Expr::sig(e.reg_wr_error)),
                Statement::assign(Expr::sig(e.mem_rd_error), Expr::sig(e.loc_mem_rd_error)),
                Statement::assign(Expr::sig(e.mem_wr_error), Expr::sig(e.loc_mem_wr_error)),
            ]);
        }
        self.module.stmts.extend(stmts);
    }
}
