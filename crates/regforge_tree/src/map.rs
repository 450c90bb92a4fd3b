//! The validated register-map arena.

use crate::bus::BusKind;
use crate::desc::{ArrayDesc, BlockDesc, ElementDesc, FieldDesc, RegDesc, RootDesc};
use crate::error::TreeError;
use crate::ext::HdlHints;
use crate::node::{Array, Block, Field, Node, NodeKind, Reg, Root};
use crate::NodeId;
use regforge_common::Arena;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Loads and validates a register map from a JSON file.
pub fn load_map(path: &Path) -> Result<RegMap, TreeError> {
    let text = std::fs::read_to_string(path).map_err(|source| TreeError::Io {
        path: path.display().to_string(),
        source,
    })?;
    load_map_from_str(&text)
}

/// Loads and validates a register map from a JSON string.
pub fn load_map_from_str(text: &str) -> Result<RegMap, TreeError> {
    let desc: RootDesc = serde_json::from_str(text)?;
    RegMap::from_desc(&desc)
}

/// A validated, immutable register map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegMap {
    nodes: Arena<NodeId, Node>,
    root: NodeId,
}

/// The decoding geometry of a container (the root or a block).
#[derive(Debug, Clone, Copy)]
pub struct ContainerView<'a> {
    /// The container node.
    pub id: NodeId,
    /// Size in bytes.
    pub size: u64,
    /// Sub-block selector bits.
    pub sel_bits: u32,
    /// Address bits below the selector.
    pub blk_bits: u32,
    /// Children in address order.
    pub children: &'a [NodeId],
}

impl RegMap {
    /// Builds the arena from a description and checks every structural
    /// invariant. Fails on the first violation.
    pub fn from_desc(desc: &RootDesc) -> Result<Self, TreeError> {
        let path = desc.name.clone();
        let bus: BusKind = desc
            .bus
            .parse()
            .map_err(|bus| TreeError::UnsupportedBus {
                path: path.clone(),
                bus,
            })?;
        if !desc.word_size.is_power_of_two() {
            return Err(TreeError::BadWordSize {
                path,
                word_size: desc.word_size,
            });
        }

        let mut builder = Builder {
            nodes: Arena::new(),
            word_size: desc.word_size,
        };
        builder.check_blk_bits(&path, desc.sel_bits, desc.blk_bits)?;
        let root = builder.nodes.alloc(Node {
            name: desc.name.clone(),
            description: desc.description.clone(),
            parent: None,
            kind: NodeKind::Root(Root {
                bus,
                word_size: desc.word_size,
                bus_error: desc.bus_error,
                size: desc.size,
                sel_bits: desc.sel_bits,
                blk_bits: desc.blk_bits,
                children: Vec::new(),
            }),
        });
        let children = builder.elements(root, &path, desc.size, &desc.elements)?;
        if let NodeKind::Root(r) = &mut builder.nodes[root].kind {
            r.children = children;
        }
        Ok(RegMap {
            nodes: builder.nodes,
            root,
        })
    }

    /// The root node.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Root name.
    pub fn name(&self) -> &str {
        &self.nodes[self.root].name
    }

    /// Root data.
    pub fn root_data(&self) -> &Root {
        match &self.nodes[self.root].kind {
            NodeKind::Root(r) => r,
            _ => unreachable!("the first node is always the root"),
        }
    }

    /// Selected bus.
    pub fn bus(&self) -> BusKind {
        self.root_data().bus
    }

    /// Whether decode failures raise bus errors.
    pub fn bus_error(&self) -> bool {
        self.root_data().bus_error
    }

    /// Bus word size in bytes.
    pub fn word_size(&self) -> u32 {
        self.root_data().word_size
    }

    /// Bus word width in bits.
    pub fn word_bits(&self) -> u32 {
        self.word_size() * 8
    }

    /// Number of byte-address bits inside one word.
    pub fn addr_word_bits(&self) -> u32 {
        self.word_size().trailing_zeros()
    }

    /// Returns a node.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    /// Iterates over all nodes in creation (pre-order) order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes.iter()
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always `false`: a map has at least its root.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Register data, if `id` is a register.
    pub fn reg(&self, id: NodeId) -> Option<&Reg> {
        match &self.nodes[id].kind {
            NodeKind::Reg(r) => Some(r),
            _ => None,
        }
    }

    /// Field data, if `id` is a field.
    pub fn field(&self, id: NodeId) -> Option<&Field> {
        match &self.nodes[id].kind {
            NodeKind::Field(f) => Some(f),
            _ => None,
        }
    }

    /// Array data, if `id` is an array.
    pub fn array(&self, id: NodeId) -> Option<&Array> {
        match &self.nodes[id].kind {
            NodeKind::Array(a) => Some(a),
            _ => None,
        }
    }

    /// Block data, if `id` is a block.
    pub fn block(&self, id: NodeId) -> Option<&Block> {
        match &self.nodes[id].kind {
            NodeKind::Block(b) => Some(b),
            _ => None,
        }
    }

    /// Fields of a register with their data, in `lo` order.
    pub fn fields(&self, reg: NodeId) -> impl Iterator<Item = (NodeId, &Field)> + '_ {
        self.reg(reg)
            .map(|r| r.fields.as_slice())
            .unwrap_or(&[])
            .iter()
            .filter_map(move |&f| self.field(f).map(|data| (f, data)))
    }

    /// Children of a container, in address order. Empty for anything else.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        match &self.nodes[id].kind {
            NodeKind::Root(r) => &r.children,
            NodeKind::Block(b) => &b.children,
            _ => &[],
        }
    }

    /// Decoding geometry of a container.
    pub fn container(&self, id: NodeId) -> Option<ContainerView<'_>> {
        match &self.nodes[id].kind {
            NodeKind::Root(r) => Some(ContainerView {
                id,
                size: r.size,
                sel_bits: r.sel_bits,
                blk_bits: r.blk_bits,
                children: &r.children,
            }),
            NodeKind::Block(b) => Some(ContainerView {
                id,
                size: b.size,
                sel_bits: b.sel_bits,
                blk_bits: b.blk_bits,
                children: &b.children,
            }),
            _ => None,
        }
    }

    /// Byte address of an element relative to its parent (0 for the root and
    /// for fields).
    pub fn address(&self, id: NodeId) -> u64 {
        match &self.nodes[id].kind {
            NodeKind::Block(b) => b.address,
            NodeKind::Array(a) => a.address,
            NodeKind::Reg(r) => r.address,
            NodeKind::Root(_) | NodeKind::Field(_) => 0,
        }
    }

    /// Byte address of an element relative to the root.
    pub fn absolute_address(&self, id: NodeId) -> u64 {
        let mut addr = 0;
        let mut cur = Some(id);
        while let Some(n) = cur {
            addr += self.address(n);
            cur = self.nodes[n].parent;
        }
        addr
    }

    /// Bytes spanned by an element.
    pub fn span(&self, id: NodeId) -> u64 {
        match &self.nodes[id].kind {
            NodeKind::Root(r) => r.size,
            NodeKind::Block(b) => b.size,
            NodeKind::Array(a) => a.size,
            NodeKind::Reg(r) => u64::from(r.nwords) * u64::from(self.word_size()),
            NodeKind::Field(_) => 0,
        }
    }

    /// Dotted path of a node (`top.blk.reg.field`). A nameless field shares
    /// the path of its register.
    pub fn path(&self, id: NodeId) -> String {
        let mut parts = Vec::new();
        let mut cur = Some(id);
        while let Some(n) = cur {
            let node = &self.nodes[n];
            let anonymous = matches!(&node.kind, NodeKind::Field(f) if f.anonymous);
            if !anonymous {
                parts.push(node.name.as_str());
            }
            cur = node.parent;
        }
        parts.reverse();
        parts.join(".")
    }
}

struct Builder {
    nodes: Arena<NodeId, Node>,
    word_size: u32,
}

impl Builder {
    fn word_bits(&self) -> u32 {
        self.word_size * 8
    }

    /// Allocates the children of a container and checks their placement.
    fn elements(
        &mut self,
        parent: NodeId,
        parent_path: &str,
        size: u64,
        elements: &[ElementDesc],
    ) -> Result<Vec<NodeId>, TreeError> {
        let mut placed: Vec<(u64, u64, NodeId, String)> = Vec::new();
        for el in elements {
            let (name, address) = match el {
                ElementDesc::Block(b) => (&b.name, b.address),
                ElementDesc::Array(a) => (&a.name, a.address),
                ElementDesc::Reg(r) => (&r.name, r.address),
            };
            let path = format!("{parent_path}.{name}");
            if address % u64::from(self.word_size) != 0 {
                return Err(TreeError::Misaligned {
                    path,
                    address,
                    word_size: self.word_size,
                });
            }
            let (id, span) = match el {
                ElementDesc::Block(b) => (self.block(parent, &path, b)?, b.size),
                ElementDesc::Array(a) => (self.array(parent, &path, a)?, a.size),
                ElementDesc::Reg(r) => {
                    let span = u64::from(r.nwords) * u64::from(self.word_size);
                    (self.reg(parent, &path, r)?, span)
                }
            };
            let Some(end) = address.checked_add(span.max(1) - 1) else {
                return Err(TreeError::OutOfBounds {
                    path,
                    end: u64::MAX,
                    size,
                });
            };
            if size > 0 && end >= size {
                return Err(TreeError::OutOfBounds { path, end, size });
            }
            placed.push((address, end, id, name.clone()));
        }

        placed.sort_by_key(|p| p.0);
        for pair in placed.windows(2) {
            let (prev, next) = (&pair[0], &pair[1]);
            if next.0 <= prev.1 {
                return Err(TreeError::AddressOverlap {
                    path: format!("{parent_path}.{}", next.3),
                    other: prev.3.clone(),
                });
            }
        }
        Ok(placed.into_iter().map(|p| p.2).collect())
    }

    /// A container decoding sub-blocks needs each sub-block to span at least
    /// one bus word, and the sub-block index must fit a 64-bit address.
    fn check_blk_bits(&self, path: &str, sel_bits: u32, blk_bits: u32) -> Result<(), TreeError> {
        let awb = self.word_size.trailing_zeros();
        if sel_bits > 0 && (blk_bits < awb || blk_bits >= 64) {
            return Err(TreeError::BlockBits {
                path: path.to_string(),
                blk_bits,
                word_size: self.word_size,
            });
        }
        Ok(())
    }

    fn block(&mut self, parent: NodeId, path: &str, b: &BlockDesc) -> Result<NodeId, TreeError> {
        self.check_blk_bits(path, b.sel_bits, b.blk_bits)?;
        let id = self.nodes.alloc(Node {
            name: b.name.clone(),
            description: b.description.clone(),
            parent: Some(parent),
            kind: NodeKind::Block(Block {
                address: b.address,
                size: b.size,
                sel_bits: b.sel_bits,
                blk_bits: b.blk_bits,
                children: Vec::new(),
            }),
        });
        let children = self.elements(id, path, b.size, &b.elements)?;
        if let NodeKind::Block(blk) = &mut self.nodes[id].kind {
            blk.children = children;
        }
        Ok(id)
    }

    fn array(&mut self, parent: NodeId, path: &str, a: &ArrayDesc) -> Result<NodeId, TreeError> {
        let reg = match a.elements.as_slice() {
            [ElementDesc::Reg(r)] => r,
            _ => {
                return Err(TreeError::ArrayElement {
                    path: path.to_string(),
                })
            }
        };
        if reg.width > self.word_bits() {
            return Err(TreeError::ArrayWidth {
                path: path.to_string(),
                width: reg.width,
                word_bits: self.word_bits(),
            });
        }
        // The entry register is allocated right after the array, so the
        // array's element ID is known up front.
        let id = self.nodes.alloc(Node {
            name: a.name.clone(),
            description: a.description.clone(),
            parent: Some(parent),
            kind: NodeKind::Array(Array {
                address: a.address,
                size: a.size,
                sel_bits: a.sel_bits,
                element: NodeId::from_raw(0),
            }),
        });
        let element = self.reg(id, &format!("{path}.{}", reg.name), reg)?;
        if let NodeKind::Array(arr) = &mut self.nodes[id].kind {
            arr.element = element;
        }
        Ok(id)
    }

    fn reg(&mut self, parent: NodeId, path: &str, r: &RegDesc) -> Result<NodeId, TreeError> {
        let word_bits = self.word_bits();
        if u64::from(r.nwords) * u64::from(word_bits) < u64::from(r.width) || r.nwords == 0 {
            return Err(TreeError::RegWidth {
                path: path.to_string(),
                width: r.width,
                nwords: r.nwords,
                word_bits,
            });
        }
        if r.fields.is_empty() {
            return Err(TreeError::NoFields {
                path: path.to_string(),
            });
        }
        if r.fields.len() > 1 && r.fields.iter().any(|f| f.name.is_none()) {
            return Err(TreeError::AnonymousField {
                path: path.to_string(),
            });
        }
        let reg_hints = HdlHints::parse(&r.x_hdl).map_err(|source| TreeError::Extension {
            path: path.to_string(),
            source,
        })?;

        let id = self.nodes.alloc(Node {
            name: r.name.clone(),
            description: r.description.clone(),
            parent: Some(parent),
            kind: NodeKind::Reg(Reg {
                access: r.access,
                width: r.width,
                nwords: r.nwords,
                address: r.address,
                fields: Vec::new(),
                x_hdl: r.x_hdl.clone(),
                x_gena: r.x_gena.clone(),
            }),
        });

        let mut sorted: Vec<&FieldDesc> = r.fields.iter().collect();
        sorted.sort_by_key(|f| f.lo);
        let single = sorted.len() == 1;
        let mut fields = Vec::with_capacity(sorted.len());
        let mut prev: Option<(u32, String)> = None;
        for f in sorted {
            let fname = f.name.clone().unwrap_or_else(|| r.name.clone());
            let fpath = match &f.name {
                Some(n) => format!("{path}.{n}"),
                None => path.to_string(),
            };
            let hi = f.hi.unwrap_or(f.lo);
            if hi < f.lo || hi >= r.width {
                return Err(TreeError::FieldRange {
                    path: fpath,
                    lo: f.lo,
                    hi,
                    width: r.width,
                });
            }
            if let Some((prev_hi, prev_name)) = &prev {
                if f.lo <= *prev_hi {
                    return Err(TreeError::FieldOverlap {
                        path: fpath,
                        other: prev_name.clone(),
                    });
                }
            }
            let field_hints =
                HdlHints::parse(&f.x_hdl).map_err(|source| TreeError::Extension {
                    path: fpath.clone(),
                    source,
                })?;
            let hints = if single {
                reg_hints.merge(field_hints)
            } else {
                field_hints
            };
            prev = Some((hi, fname.clone()));
            fields.push(self.nodes.alloc(Node {
                name: fname,
                description: f.description.clone(),
                parent: Some(id),
                kind: NodeKind::Field(Field {
                    lo: f.lo,
                    hi: f.hi,
                    preset: f.preset,
                    x_hdl: f.x_hdl.clone(),
                    hints,
                    anonymous: f.name.is_none(),
                }),
            }));
        }
        if let NodeKind::Reg(reg) = &mut self.nodes[id].kind {
            reg.fields = fields;
        }
        Ok(id)
    }
}
