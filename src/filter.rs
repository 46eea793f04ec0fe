//! Caller customization of binding descriptors before synthesis.

use nativeshim_core::BindingDescriptor;

use crate::error::{BoxError, ShimError};

/// Inspects and rewrites a native binding before it is frozen into a shim.
///
/// Any closure `Fn(&mut BindingDescriptor) -> Result<(), BoxError>` is a
/// hook. Returning an error aborts the build.
pub trait FilterHook: Send + Sync {
    fn filter(&self, descriptor: &mut BindingDescriptor) -> Result<(), BoxError>;
}

impl<F> FilterHook for F
where
    F: Fn(&mut BindingDescriptor) -> Result<(), BoxError> + Send + Sync,
{
    fn filter(&self, descriptor: &mut BindingDescriptor) -> Result<(), BoxError> {
        self(descriptor)
    }
}

/// Run `hook` over `descriptors` in order, then validate each one.
///
/// Stops at the first failure.
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn apply_filter(
    hook: Option<&dyn FilterHook>,
    descriptors: &mut [BindingDescriptor],
) -> Result<(), ShimError> {
    for descriptor in descriptors.iter_mut() {
        if let Some(hook) = hook {
            hook.filter(descriptor).map_err(|source| ShimError::Filter {
                method: descriptor.signature().to_string(),
                source,
            })?;
        }
        descriptor.validate()?;
    }
    Ok(())
}
