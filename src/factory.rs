//! Build facade.
//!
//! [`ShimFactory`] runs the whole pipeline for one interface:
//!
//! ```text
//! TypeEntry ──> classify ──> filter ──> synthesize ──> instantiate
//! ```
//!
//! Nothing is cached. Two builds of the same interface produce two unrelated
//! shim types.

use std::fmt;
use std::sync::Arc;

use nativeshim_core::{BindingDefaults, BindingDescriptor, BindingTable, NativeLinker, TypeEntry};
use tracing::debug;

use crate::classify::classify_with_defaults;
use crate::error::{BoxError, ShimError};
use crate::filter::{FilterHook, apply_filter};
use crate::instance::ShimInstance;
use crate::synth::{ShimType, check_interface, synthesize};

/// Configurable shim builder.
///
/// ```
/// use nativeshim::{
///     BindingDefaults, BindingDescriptor, BindingTable, BoxError, CharSet, DataType,
///     InterfaceEntry, MarshalFlags, MethodSignature, NativeBinding, ShimFactory, UnlinkedLinker,
/// };
///
/// let factory = ShimFactory::new()
///     .with_linker(UnlinkedLinker)
///     .with_defaults(BindingDefaults::default().with_char_set(CharSet::Unicode))
///     .with_filter(|d: &mut BindingDescriptor| -> Result<(), BoxError> {
///         d.set_flag(MarshalFlags::SET_LAST_ERROR, true);
///         Ok(())
///     });
///
/// let strlen = MethodSignature::new("Length", vec![DataType::String], DataType::INT64);
/// let text = InterfaceEntry::new("IText").with_method(strlen.clone());
/// let bindings = BindingTable::new().with(&strlen, NativeBinding::new("c").entry_point("strlen"));
///
/// let shim = factory.build_type(&text.into(), &bindings)?;
/// let descriptor = shim.descriptor(&strlen).unwrap();
/// assert_eq!(descriptor.char_set, CharSet::Unicode);
/// assert!(descriptor.set_last_error());
/// # Ok::<(), nativeshim::ShimError>(())
/// ```
pub struct ShimFactory {
    linker: Arc<dyn NativeLinker>,
    filter: Option<Box<dyn FilterHook>>,
    defaults: BindingDefaults,
}

impl ShimFactory {
    /// Create a factory using the default linker and binding defaults.
    pub fn new() -> Self {
        Self {
            linker: crate::default_linker(),
            filter: None,
            defaults: BindingDefaults::default(),
        }
    }

    /// Use `linker` for every native call made by shims from this factory.
    pub fn with_linker(self, linker: impl NativeLinker + 'static) -> Self {
        self.with_shared_linker(Arc::new(linker))
    }

    pub fn with_shared_linker(mut self, linker: Arc<dyn NativeLinker>) -> Self {
        self.linker = linker;
        self
    }

    /// Run `filter` over every native binding before synthesis.
    pub fn with_filter<F>(self, filter: F) -> Self
    where
        F: Fn(&mut BindingDescriptor) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        self.with_filter_hook(filter)
    }

    pub fn with_filter_hook(mut self, hook: impl FilterHook + 'static) -> Self {
        self.filter = Some(Box::new(hook));
        self
    }

    /// Defaults applied to binding fields left unspecified.
    pub fn with_defaults(mut self, defaults: BindingDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn defaults(&self) -> &BindingDefaults {
        &self.defaults
    }

    /// Build a shim for `target` and return a fresh instance of it.
    pub fn build(
        &self,
        target: &TypeEntry,
        bindings: &BindingTable,
    ) -> Result<ShimInstance, ShimError> {
        Ok(self.build_type(target, bindings)?.instantiate())
    }

    /// Build a shim type without instantiating it.
    pub fn build_type(
        &self,
        target: &TypeEntry,
        bindings: &BindingTable,
    ) -> Result<Arc<ShimType>, ShimError> {
        self.build_type_with(target, bindings, self.filter.as_deref())
    }

    #[cfg_attr(feature = "profiling", profiling::function)]
    pub(crate) fn build_type_with(
        &self,
        target: &TypeEntry,
        bindings: &BindingTable,
        hook: Option<&dyn FilterHook>,
    ) -> Result<Arc<ShimType>, ShimError> {
        let Some(interface) = target.as_interface() else {
            return Err(ShimError::InvalidTarget {
                name: target.name().to_string(),
                kind: target.kind_name(),
            });
        };

        debug!(
            interface = %interface.name,
            methods = interface.methods.len(),
            bindings = bindings.len(),
            "building shim"
        );
        check_interface(interface)?;

        let mut classification = classify_with_defaults(interface, bindings, &self.defaults);
        apply_filter(hook, &mut classification.bound)?;
        let (native, unbound) = (classification.bound.len(), classification.unbound.len());
        let ty = synthesize(&interface.name, classification, Arc::clone(&self.linker))?;

        debug!(
            interface = %interface.name,
            id = %ty.id(),
            native,
            unbound,
            "built shim"
        );
        Ok(Arc::new(ty))
    }
}

impl Default for ShimFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ShimFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShimFactory")
            .field("defaults", &self.defaults)
            .field("filter", &self.filter.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nativeshim_core::{
        ClassEntry, DataType, InterfaceEntry, MethodSignature, NativeBinding, PrimitiveKind,
        UnlinkedLinker,
    };
    use tracing_test::traced_test;

    fn factory() -> ShimFactory {
        ShimFactory::new().with_linker(UnlinkedLinker)
    }

    #[test]
    fn rejects_non_interfaces() {
        let targets: [TypeEntry; 3] = [
            ClassEntry::new("Widget").into(),
            ClassEntry::new("Shape").as_abstract().into(),
            PrimitiveKind::Int32.into(),
        ];
        for target in &targets {
            let err = factory().build(target, &BindingTable::new()).unwrap_err();
            assert!(err.is_invalid_target(), "{err}");
        }
    }

    #[test]
    fn invalid_target_skips_the_filter() {
        let factory = factory().with_filter(|_: &mut BindingDescriptor| -> Result<(), BoxError> {
            panic!("filter must not run for invalid targets")
        });
        let shape = ClassEntry::new("Shape")
            .with_method(MethodSignature::new("Area", vec![], DataType::DOUBLE));
        let bindings = BindingTable::new().with(&shape.methods[0], NativeBinding::new("geo"));

        let err = factory.build(&shape.into(), &bindings).unwrap_err();
        assert!(matches!(err, ShimError::InvalidTarget { kind: "class", .. }));
    }

    #[test]
    fn duplicate_methods_skip_the_filter() {
        let factory = factory().with_filter(|_: &mut BindingDescriptor| -> Result<(), BoxError> {
            panic!("filter must not run for a malformed interface")
        });
        let add = MethodSignature::new("Add", vec![DataType::INT32], DataType::INT32);
        let iface = InterfaceEntry::new("IDup")
            .with_method(add.clone())
            .with_method(add.clone());
        let bindings = BindingTable::new().with(&add, NativeBinding::new("math"));

        let err = factory.build(&iface.into(), &bindings).unwrap_err();
        assert!(matches!(err, ShimError::DuplicateMethod { .. }));
    }

    #[test]
    fn builds_are_independent() {
        let iface: TypeEntry = InterfaceEntry::new("IEmpty").into();
        let factory = factory();
        let a = factory.build_type(&iface, &BindingTable::new()).unwrap();
        let b = factory.build_type(&iface, &BindingTable::new()).unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
        assert_ne!(a.id(), b.id());
    }

    #[test]
    #[traced_test]
    fn logs_build_progress() {
        let iface: TypeEntry = InterfaceEntry::new("IEmpty").into();
        factory().build(&iface, &BindingTable::new()).unwrap();
        assert!(logs_contain("building shim"));
        assert!(logs_contain("built shim"));
    }
}
