//! Shared foundational types used across the regforge workspace.
//!
//! This crate provides the dense ID-indexed [`Arena`], the [`SideTable`] used to
//! attach generation-scoped data to arena entries, the [`define_id!`] macro for
//! opaque ID newtypes, and the [`Logic`] bit value.

#![warn(missing_docs)]

pub mod arena;
pub mod logic;

pub use arena::{Arena, ArenaId, SideTable};
pub use logic::Logic;

/// Defines an opaque, copyable `u32` ID newtype that implements [`ArenaId`].
///
/// ```
/// regforge_common::define_id!(
///     /// ID of a widget.
///     WidgetId
/// );
/// let id = WidgetId::from_raw(3);
/// assert_eq!(id.as_raw(), 3);
/// ```
#[macro_export]
macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, serde::Serialize, serde::Deserialize)]
        pub struct $name(u32);

        impl $name {
            /// Creates an ID from a raw `u32` index.
            pub fn from_raw(index: u32) -> Self {
                Self(index)
            }

            /// Returns the raw `u32` index.
            pub fn as_raw(self) -> u32 {
                self.0
            }
        }

        impl $crate::arena::ArenaId for $name {
            fn from_raw(index: u32) -> Self {
                Self(index)
            }

            fn as_raw(self) -> u32 {
                self.0
            }
        }
    };
}
