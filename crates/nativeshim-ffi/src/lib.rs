//! Native backend for nativeshim.
//!
//! [`DylibLinker`] implements [`NativeLinker`](nativeshim_core::NativeLinker)
//! by loading shared libraries with `libloading` and calling entry points
//! through `libffi`, marshaling arguments according to each binding's
//! char-set and flag policy (see [`marshal`]).

mod dylib;
pub mod marshal;

pub use dylib::DylibLinker;
