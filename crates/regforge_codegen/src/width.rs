//! Bit and word arithmetic shared by the backends.
//!
//! Registers wider than the bus word are split into words; word `i` holds
//! bits `[i*W, (i+1)*W)` and, the bus being big-endian, lives at the
//! `nwords - 1 - i`th word address of the register.

use regforge_ir::Expr;
use regforge_tree::NodeId;

/// Number of bits needed to address `n` items (`ceil(log2(n))`, 0 for 0 or 1).
pub fn ilog2(n: u64) -> u32 {
    if n <= 1 {
        0
    } else {
        64 - (n - 1).leading_zeros()
    }
}

/// Keeps the low `width` bits of `value`.
pub fn mask(value: u64, width: u32) -> u64 {
    if width >= 64 {
        value
    } else {
        value & ((1u64 << width) - 1)
    }
}

/// Byte address of word `word` of a register at `address`.
pub fn word_address(address: u64, word: u32, nwords: u32, word_size: u32) -> u64 {
    address + u64::from(nwords - 1 - word) * u64::from(word_size)
}

/// Width of each word of a register split evenly over `nwords` words, or
/// `None` when the width does not divide.
pub fn word_width(width: u32, nwords: u32) -> Option<u32> {
    (nwords > 0 && width % nwords == 0).then(|| width / nwords)
}

/// A contiguous run of register bits, either a field (or part of one) or a
/// gap no field covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    /// Lowest register bit.
    pub lo: u32,
    /// Number of bits.
    pub width: u32,
    /// The field the bits belong to; `None` for a gap.
    pub field: Option<NodeId>,
}

impl Segment {
    /// One past the highest bit.
    pub fn end(&self) -> u32 {
        self.lo + self.width
    }
}

/// Orders fields by `lo` and fills every uncovered range of `[0, width)` with
/// a gap. `fields` are `(id, lo, width)` triples and must not overlap.
pub fn bit_layout(fields: &[(NodeId, u32, u32)], width: u32) -> Vec<Segment> {
    let mut sorted = fields.to_vec();
    sorted.sort_by_key(|f| f.1);
    let mut out = Vec::with_capacity(sorted.len() * 2 + 1);
    let mut next = 0;
    for (id, lo, w) in sorted {
        if lo > next {
            out.push(Segment {
                lo: next,
                width: lo - next,
                field: None,
            });
        }
        out.push(Segment {
            lo,
            width: w,
            field: Some(id),
        });
        next = lo + w;
    }
    if next < width {
        out.push(Segment {
            lo: next,
            width: width - next,
            field: None,
        });
    }
    out
}

/// Cuts segments at every multiple of `word_bits`, returning `(word, part)`
/// pairs in ascending bit order.
pub fn split_words(segments: &[Segment], word_bits: u32) -> Vec<(u32, Segment)> {
    let mut out = Vec::new();
    for seg in segments {
        let mut lo = seg.lo;
        while lo < seg.end() {
            let word = lo / word_bits;
            let end = seg.end().min((word + 1) * word_bits);
            out.push((
                word,
                Segment {
                    lo,
                    width: end - lo,
                    field: seg.field,
                },
            ));
            lo = end;
        }
    }
    out
}

/// The parts of `segments` falling into word `word`, clipped to it.
pub fn word_parts(segments: &[Segment], word: u32, word_bits: u32) -> Vec<Segment> {
    split_words(segments, word_bits)
        .into_iter()
        .filter(|(w, _)| *w == word)
        .map(|(_, s)| s)
        .collect()
}

/// Bits `[lo, lo + width)` of a vector `expr` that is `full` bits wide: the
/// expression itself when the range is all of it, a single index when
/// `scalar`, a slice otherwise.
pub fn part(expr: Expr, lo: u32, width: u32, full: u32, scalar: bool) -> Expr {
    if lo == 0 && width == full {
        expr
    } else if scalar {
        expr.index(lo)
    } else {
        expr.slice(lo, width)
    }
}

/// Zero-extends `expr` from `width` to `target` bits when it is narrower.
pub fn extend(expr: Expr, width: u32, target: u32) -> Expr {
    if width < target {
        expr.zext(target)
    } else {
        expr
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(n: u32) -> NodeId {
        NodeId::from_raw(n)
    }

    fn seg(lo: u32, width: u32, field: Option<NodeId>) -> Segment {
        Segment { lo, width, field }
    }

    #[test]
    fn ilog2_rounds_up() {
        assert_eq!(ilog2(0), 0);
        assert_eq!(ilog2(1), 0);
        assert_eq!(ilog2(2), 1);
        assert_eq!(ilog2(3), 2);
        assert_eq!(ilog2(4), 2);
        assert_eq!(ilog2(4096), 12);
        assert_eq!(ilog2(4097), 13);
    }

    #[test]
    fn mask_keeps_low_bits() {
        assert_eq!(mask(0x1ff, 8), 0xff);
        assert_eq!(mask(5, 0), 0);
        assert_eq!(mask(u64::MAX, 64), u64::MAX);
    }

    #[test]
    fn big_endian_word_addresses() {
        // A 2-word register at 0x10: word 1 (high bits) comes first.
        assert_eq!(word_address(0x10, 1, 2, 4), 0x10);
        assert_eq!(word_address(0x10, 0, 2, 4), 0x14);
        assert_eq!(word_address(0x8, 0, 1, 4), 0x8);
    }

    #[test]
    fn word_width_divides() {
        assert_eq!(word_width(64, 2), Some(32));
        assert_eq!(word_width(16, 1), Some(16));
        assert_eq!(word_width(33, 2), None);
        assert_eq!(word_width(8, 0), None);
    }

    #[test]
    fn layout_fills_gaps() {
        let segs = bit_layout(&[(id(2), 8, 4), (id(1), 0, 1)], 16);
        assert_eq!(
            segs,
            [
                seg(0, 1, Some(id(1))),
                seg(1, 7, None),
                seg(8, 4, Some(id(2))),
                seg(12, 4, None),
            ]
        );
    }

    #[test]
    fn layout_widths_sum_to_register() {
        let segs = bit_layout(&[(id(1), 3, 5), (id(2), 20, 12)], 32);
        assert_eq!(segs.iter().map(|s| s.width).sum::<u32>(), 32);
        for pair in segs.windows(2) {
            assert_eq!(pair[0].end(), pair[1].lo);
        }
    }

    #[test]
    fn full_field_has_no_gap() {
        let segs = bit_layout(&[(id(1), 0, 32)], 32);
        assert_eq!(segs.len(), 1);
    }

    #[test]
    fn split_reconstructs_register() {
        let segs = bit_layout(&[(id(1), 0, 40), (id(2), 48, 8)], 64);
        let parts = split_words(&segs, 32);
        assert_eq!(
            parts,
            [
                (0, seg(0, 32, Some(id(1)))),
                (1, seg(32, 8, Some(id(1)))),
                (1, seg(40, 8, None)),
                (1, seg(48, 8, Some(id(2)))),
                (1, seg(56, 8, None)),
            ]
        );
        let mut next = 0;
        for (_, p) in &parts {
            assert_eq!(p.lo, next);
            next = p.end();
        }
        assert_eq!(next, 64);
        assert_eq!(word_parts(&segs, 0, 32).len(), 1);
        assert_eq!(word_parts(&segs, 1, 32).len(), 4);
    }

    #[test]
    fn part_picks_cheapest_form() {
        let e = Expr::named("x", 8);
        assert_eq!(part(e.clone(), 0, 8, 8, false), e);
        assert_eq!(part(e.clone(), 3, 1, 8, true), e.clone().index(3));
        assert_eq!(part(e.clone(), 3, 1, 8, false), e.clone().slice(3, 1));
        assert_eq!(extend(e.clone(), 8, 32), e.clone().zext(32));
        assert_eq!(extend(e.clone(), 32, 32), e);
    }
}
