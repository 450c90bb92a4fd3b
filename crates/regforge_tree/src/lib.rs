//! The resolved register-map tree consumed by the regforge generators.
//!
//! The textual description is parsed and laid out by external tools; this
//! crate loads their JSON output ([`desc`]), validates the structural
//! invariants the generators rely on, and exposes the result as an immutable
//! arena of nodes ([`RegMap`]) addressed by [`NodeId`].
//!
//! Generators never mutate the map. Anything they need to remember about a
//! node (ports, signals, ...) goes into a [`SideTable`] keyed by [`NodeId`].

#![warn(missing_docs)]

pub mod bus;
pub mod desc;
pub mod error;
pub mod ext;
pub mod map;
pub mod node;

pub use bus::BusKind;
pub use desc::{ArrayDesc, BlockDesc, ElementDesc, FieldDesc, RegDesc, RootDesc};
pub use error::TreeError;
pub use ext::{ExtError, Extensions, HdlHints, RegTemplate, Storage};
pub use map::{load_map, load_map_from_str, ContainerView, RegMap};
pub use node::{Access, Array, Block, Field, Node, NodeKind, Reg, Root};
pub use regforge_common::SideTable;

regforge_common::define_id!(
    /// Opaque, copyable ID for a node of a [`RegMap`].
    NodeId
);
