//! Core types for nativeshim.
//!
//! This crate holds everything the binding-synthesis engine reasons about
//! structurally:
//!
//! - [`TypeEntry`] / [`InterfaceEntry`] - the interface descriptions callers hand in
//! - [`MethodSignature`] and [`DataType`] - method shapes and identities
//! - [`NativeBinding`], [`BindingTable`], [`BindingDescriptor`] - native-binding metadata
//! - [`Dynamic`] - runtime argument and return values
//! - [`NativeLinker`] - the seam to whatever actually loads and calls native code

pub mod binding;
mod data_type;
mod dynamic;
pub mod entries;
pub mod error;
mod linker;
mod method_signature;
mod type_hash;

pub use binding::{
    BindingDefaults, BindingDescriptor, BindingTable, CallingConvention, CharSet, MarshalFlags,
    NativeBinding,
};
pub use data_type::{DataType, PrimitiveKind};
pub use dynamic::Dynamic;
pub use entries::{ClassEntry, ITable, InterfaceEntry, SlotError, TypeEntry};
pub use error::{BindingError, NativeError};
pub use linker::{NativeLinker, UnlinkedLinker};
pub use method_signature::MethodSignature;
pub use type_hash::{TypeHash, hash_constants};
