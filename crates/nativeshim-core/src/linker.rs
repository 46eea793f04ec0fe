//! The seam between synthesized shims and the platform loader.

use std::fmt;

use crate::{BindingDescriptor, Dynamic, NativeError};

/// Resolves and calls the foreign function a binding describes.
///
/// Implementations own library loading and symbol lookup. The engine never
/// resolves anything at build time; the first `invoke` of a binding is where a
/// missing library or entry point surfaces.
pub trait NativeLinker: Send + Sync {
    /// Call the function described by `binding` with `args`, positionally.
    fn invoke(&self, binding: &BindingDescriptor, args: &[Dynamic]) -> Result<Dynamic, NativeError>;

    /// OS error code captured by the most recent `invoke` on this thread of a
    /// binding with `set_last_error` enabled.
    ///
    /// `None` when that call reported no error, or when the `invoke` failed
    /// before reaching the native function.
    fn last_error(&self) -> Option<i32> {
        None
    }
}

/// A linker that refuses every call.
///
/// Used when no native backend is compiled in.
#[derive(Default, Clone, Copy)]
pub struct UnlinkedLinker;

impl NativeLinker for UnlinkedLinker {
    fn invoke(&self, binding: &BindingDescriptor, _args: &[Dynamic]) -> Result<Dynamic, NativeError> {
        Err(NativeError::other(format!(
            "no native linker available to call '{}' in '{}'",
            binding.entry_point, binding.library
        )))
    }
}

impl fmt::Debug for UnlinkedLinker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("UnlinkedLinker")
    }
}
