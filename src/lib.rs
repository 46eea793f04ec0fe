//! Runtime implementations of interfaces backed by native libraries.
//!
//! Given an [`InterfaceEntry`] and a [`BindingTable`] saying which of its
//! methods live in which shared library, nativeshim synthesizes an object
//! implementing the interface: bound methods forward to the foreign function,
//! every other method fails with [`InvokeError::NotImplemented`].
//!
//! ```
//! use nativeshim::{
//!     BindingDescriptor, BindingTable, DataType, Dynamic, InterfaceEntry, MethodSignature,
//!     NativeBinding, NativeError, NativeLinker, ShimFactory,
//! };
//!
//! // Stands in for a shared library exporting `Add`.
//! struct Math;
//!
//! impl NativeLinker for Math {
//!     fn invoke(&self, _: &BindingDescriptor, args: &[Dynamic]) -> Result<Dynamic, NativeError> {
//!         let sum = args.iter().filter_map(Dynamic::as_int).sum();
//!         Ok(Dynamic::Int(sum))
//!     }
//! }
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let add = MethodSignature::new("Add", vec![DataType::INT32, DataType::INT32], DataType::INT32);
//!     let calculator = InterfaceEntry::new("ICalculator")
//!         .with_method(add.clone())
//!         .with_method(MethodSignature::new("Unsupported", vec![], DataType::VOID));
//!     let bindings = BindingTable::new().with(&add, NativeBinding::new("math"));
//!
//!     let calc = ShimFactory::new()
//!         .with_linker(Math)
//!         .build(&calculator.into(), &bindings)?;
//!     assert_eq!(calc.call("Add", &[Dynamic::Int(2), Dynamic::Int(3)])?, Dynamic::Int(5));
//!     assert!(calc.call("Unsupported", &[]).unwrap_err().is_not_implemented());
//!     Ok(())
//! }
//! ```

mod classify;
pub mod error;
mod factory;
mod filter;
mod instance;
mod synth;

use std::sync::Arc;

pub use classify::{Classification, UnboundMethod, classify, classify_with_defaults};
pub use error::{BoxError, InvokeError, ShimError};
pub use factory::ShimFactory;
pub use filter::{FilterHook, apply_filter};
pub use instance::{Dispatch, ShimInstance};
pub use synth::{NativeCall, ShimType, ShimTypeId, Slot, synthesize};

pub use nativeshim_core::{
    BindingDefaults, BindingDescriptor, BindingError, BindingTable, CallingConvention, CharSet,
    ClassEntry, DataType, Dynamic, ITable, InterfaceEntry, MarshalFlags, MethodSignature,
    NativeBinding, NativeError, NativeLinker, PrimitiveKind, SlotError, TypeEntry, TypeHash,
    UnlinkedLinker,
};
#[cfg(feature = "dylib")]
pub use nativeshim_ffi::DylibLinker;

/// Build a shim for `target` with the default linker and binding defaults.
pub fn build(
    target: &TypeEntry,
    bindings: &BindingTable,
    hook: Option<&dyn FilterHook>,
) -> Result<ShimInstance, ShimError> {
    let ty = ShimFactory::new().build_type_with(target, bindings, hook)?;
    Ok(ty.instantiate())
}

/// The linker used when none is configured.
pub fn default_linker() -> Arc<dyn NativeLinker> {
    #[cfg(feature = "dylib")]
    {
        Arc::new(DylibLinker::new())
    }
    #[cfg(not(feature = "dylib"))]
    {
        Arc::new(UnlinkedLinker)
    }
}
