//! The clocked write and read processes of the Wishbone slave.

use super::{Bus, Handshake};
use crate::annotations::Annotations;
use crate::decoder::{decode, DecodeVisitor, Target};
use crate::errors::GenError;
use crate::width::{bit_layout, extend, mask, part, word_parts};
use regforge_ir::{Expr, Logic, Module, Reset, Statement};
use regforge_tree::{Access, NodeId, RegMap};

/// A constant of `width` bits; single bits are scalar.
fn constant(value: u64, width: u32) -> Expr {
    if width == 1 {
        Expr::Bit(Logic::from(value & 1 == 1))
    } else {
        Expr::konst(mask(value, width), width)
    }
}

/// Bits `[lo, lo + width)` of a bus data word.
fn data_part(data: Expr, lo: u32, width: u32, word_bits: u32) -> Expr {
    part(data, lo, width, word_bits, width == 1)
}

/// `rd_or_wr_int = '1' and ack = '0'`.
fn request(int: Expr, ack: Expr) -> Expr {
    int.equals(Expr::one()).and(ack.equals(Expr::zero()))
}

/// Word-address bits below `index_bits` selecting an array entry, compared
/// against the last entry when the array does not fill its sub-block.
fn array_guard(
    map: &RegMap,
    bus: &Bus,
    array: NodeId,
    index_bits: u32,
    body: Vec<Statement>,
) -> Vec<Statement> {
    let count = map
        .array(array)
        .map_or(0, |a| a.size / u64::from(map.word_size()));
    if count == 0 || index_bits >= 64 || count >= 1u64 << index_bits {
        return body;
    }
    let index = Expr::sig(bus.adr).slice(map.addr_word_bits(), index_bits);
    vec![Statement::if_then(
        index.le(Expr::konst(count - 1, index_bits)),
        body,
    )]
}

struct WriteCases<'a> {
    map: &'a RegMap,
    bus: &'a Bus,
    hs: &'a Handshake,
    ann: &'a Annotations,
}

impl DecodeVisitor for WriteCases<'_> {
    fn visit_node(&mut self, stmts: &mut Vec<Statement>, target: Target) -> Result<(), GenError> {
        let map = self.map;
        let word_bits = map.word_bits();
        match target {
            Target::Reg { reg, word } => {
                stmts.push(Statement::Comment(map.path(reg)));
                let writable = map.reg(reg).is_some_and(|r| r.access.is_writable());
                for (fid, f) in map.fields(reg).filter(|_| writable) {
                    let Some(h) = self.ann.fields.get(fid) else {
                        continue;
                    };
                    let Some(dest) = h.storage.or(h.output) else {
                        continue;
                    };
                    let fw = f.width();
                    let lo = f.lo.max(word * word_bits);
                    let end = (f.lo + fw).min((word + 1) * word_bits);
                    if lo >= end {
                        continue;
                    }
                    let w = end - lo;
                    stmts.push(Statement::assign(
                        part(Expr::sig(dest), lo - f.lo, w, fw, w == 1),
                        data_part(Expr::sig(self.bus.dat_i), lo - word * word_bits, w, word_bits),
                    ));
                    if let Some(strobe) = h.strobe {
                        stmts.push(Statement::assign(Expr::sig(strobe), Expr::one()));
                    }
                }
            }
            Target::Array { array, index_bits } => {
                stmts.push(Statement::Comment(map.path(array)));
                let handles = self.ann.arrays.get(array);
                if let Some((data, strobe)) =
                    handles.and_then(|h| h.write_data.zip(h.write_strobe))
                {
                    let width = map
                        .array(array)
                        .and_then(|a| map.reg(a.element))
                        .map_or(word_bits, |r| r.width);
                    let body = vec![
                        Statement::assign(
                            Expr::sig(data),
                            part(Expr::sig(self.bus.dat_i), 0, width, word_bits, false),
                        ),
                        Statement::assign(Expr::sig(strobe), Expr::one()),
                    ];
                    stmts.extend(array_guard(map, self.bus, array, index_bits, body));
                }
            }
        }
        stmts.push(Statement::assign(Expr::sig(self.hs.wr_ack), Expr::one()));
        Ok(())
    }

    fn visit_default(&mut self, stmts: &mut Vec<Statement>) -> Result<(), GenError> {
        stmts.push(Statement::assign(Expr::sig(self.hs.wr_ack), Expr::one()));
        Ok(())
    }
}

/// Clocked process decoding writes into field registers and strobes.
pub(crate) fn write_process(
    map: &RegMap,
    bus: &Bus,
    hs: &Handshake,
    ann: &Annotations,
    module: &mut Module,
) -> Result<(), GenError> {
    let mut reset_stmts = Vec::new();
    let mut strobes = Vec::new();
    for (fid, h) in ann.fields.iter() {
        let Some(f) = map.field(fid) else { continue };
        if let Some(dest) = h.storage {
            reset_stmts.push(Statement::assign(
                Expr::sig(dest),
                constant(f.preset.unwrap_or(0), f.width()),
            ));
        }
        strobes.extend(h.strobe);
    }
    strobes.extend(ann.arrays.iter().filter_map(|(_, h)| h.write_strobe));
    let clear: Vec<_> = strobes
        .iter()
        .map(|&s| Statement::assign(Expr::sig(s), Expr::zero()))
        .collect();
    reset_stmts.extend(clear.iter().cloned());
    reset_stmts.push(Statement::assign(Expr::sig(hs.wr_ack), Expr::zero()));

    let mut cases = Vec::new();
    decode(
        map,
        map.root(),
        &Expr::sig(bus.adr),
        &mut cases,
        &mut WriteCases { map, bus, hs, ann },
    )?;
    let mut stmts = clear;
    stmts.push(Statement::If {
        condition: request(Expr::sig(hs.wr_int), Expr::sig(hs.wr_ack)),
        then_stmts: cases,
        else_stmts: vec![Statement::assign(Expr::sig(hs.wr_ack), Expr::zero())],
    });

    module.push(Statement::Sync {
        name: "wb_write".to_string(),
        clock: bus.clk,
        reset: Some(Reset {
            signal: bus.rst_n,
            active_low: true,
        }),
        reset_stmts,
        stmts,
    });
    Ok(())
}

struct ReadCases<'a> {
    map: &'a RegMap,
    bus: &'a Bus,
    hs: &'a Handshake,
    ann: &'a Annotations,
}

impl ReadCases<'_> {
    /// Value the bus reads for bits `[off, off + width)` of a field.
    fn source(&self, fid: NodeId, access: Access, off: u32, width: u32) -> Option<Expr> {
        let f = self.map.field(fid)?;
        let fw = f.width();
        if access == Access::Cst {
            // Presets hold 64 bits; higher words of a wider constant read zero.
            let value = f.preset.unwrap_or(0).checked_shr(off).unwrap_or(0);
            return Some(constant(value, width));
        }
        let h = self.ann.fields.get(fid)?;
        let signal = match access {
            Access::Rw => h.storage.or(h.input),
            _ => h.input,
        }?;
        Some(part(Expr::sig(signal), off, width, fw, width == 1))
    }
}

impl DecodeVisitor for ReadCases<'_> {
    fn visit_node(&mut self, stmts: &mut Vec<Statement>, target: Target) -> Result<(), GenError> {
        let map = self.map;
        let word_bits = map.word_bits();
        let dat_o = Expr::sig(self.bus.dat_o);
        match target {
            Target::Reg { reg, word } => {
                stmts.push(Statement::Comment(map.path(reg)));
                let Some(r) = map.reg(reg).filter(|r| r.access.is_readable()) else {
                    stmts.push(Statement::assign(Expr::sig(self.hs.rd_ack), Expr::one()));
                    return Ok(());
                };
                let fields: Vec<_> = map
                    .fields(reg)
                    .map(|(id, f)| (id, f.lo, f.width()))
                    .collect();
                let start = word * word_bits;
                for seg in word_parts(&bit_layout(&fields, r.width), word, word_bits) {
                    let value = match seg.field {
                        Some(fid) => {
                            let off = seg.lo - map.field(fid).map_or(0, |f| f.lo);
                            self.source(fid, r.access, off, seg.width)
                        }
                        None => None,
                    };
                    stmts.push(Statement::assign(
                        data_part(dat_o.clone(), seg.lo - start, seg.width, word_bits),
                        value.unwrap_or_else(|| constant(0, seg.width)),
                    ));
                }
                let used = r.width.saturating_sub(start).min(word_bits);
                if used < word_bits {
                    stmts.push(Statement::assign(
                        data_part(dat_o, used, word_bits - used, word_bits),
                        constant(0, word_bits - used),
                    ));
                }
            }
            Target::Array { array, index_bits } => {
                stmts.push(Statement::Comment(map.path(array)));
                if let Some(data) = self.ann.arrays.get(array).and_then(|h| h.read_data) {
                    let width = map
                        .array(array)
                        .and_then(|a| map.reg(a.element))
                        .map_or(word_bits, |r| r.width);
                    let body = vec![Statement::assign(
                        dat_o,
                        extend(Expr::sig(data), width, word_bits),
                    )];
                    stmts.extend(array_guard(map, self.bus, array, index_bits, body));
                }
            }
        }
        stmts.push(Statement::assign(Expr::sig(self.hs.rd_ack), Expr::one()));
        Ok(())
    }

    fn visit_default(&mut self, stmts: &mut Vec<Statement>) -> Result<(), GenError> {
        stmts.push(Statement::assign(Expr::sig(self.hs.rd_ack), Expr::one()));
        Ok(())
    }
}

/// Clocked process decoding reads into `wb_dat_o`.
pub(crate) fn read_process(
    map: &RegMap,
    bus: &Bus,
    hs: &Handshake,
    ann: &Annotations,
    module: &mut Module,
) -> Result<(), GenError> {
    let mut cases = Vec::new();
    decode(
        map,
        map.root(),
        &Expr::sig(bus.adr),
        &mut cases,
        &mut ReadCases { map, bus, hs, ann },
    )?;
    let stmts = vec![
        Statement::assign(Expr::sig(bus.dat_o), Expr::Undef),
        Statement::If {
            condition: request(Expr::sig(hs.rd_int), Expr::sig(hs.rd_ack)),
            then_stmts: cases,
            else_stmts: vec![Statement::assign(Expr::sig(hs.rd_ack), Expr::zero())],
        },
    ];
    module.push(Statement::Sync {
        name: "wb_read".to_string(),
        clock: bus.clk,
        reset: Some(Reset {
            signal: bus.rst_n,
            active_low: true,
        }),
        reset_stmts: vec![
            Statement::assign(Expr::sig(hs.rd_ack), Expr::zero()),
            Statement::assign(Expr::sig(bus.dat_o), Expr::Undef),
        ],
        stmts,
    });
    Ok(())
}
