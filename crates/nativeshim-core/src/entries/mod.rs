//! Type description entries.
//!
//! - [`TypeEntry`] - Unified enum wrapping all type descriptions
//! - [`InterfaceEntry`] - Interface types (the only valid shim targets)
//! - [`ClassEntry`] - Class types
//! - [`ITable`] - Interface method table used for dispatch

mod class;
mod interface;
mod type_entry;

pub use class::ClassEntry;
pub use interface::{ITable, InterfaceEntry, SlotError};
pub use type_entry::TypeEntry;
