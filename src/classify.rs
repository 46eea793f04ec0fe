//! Method classification.
//!
//! Splits an interface's methods into native-bound and unbound sets. Every
//! method lands in exactly one set, in declaration order.

use nativeshim_core::{
    BindingDefaults, BindingDescriptor, BindingTable, InterfaceEntry, MethodSignature,
};
use rustc_hash::FxHashSet;
use tracing::{trace, warn};

/// A method with no native counterpart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnboundMethod {
    signature: MethodSignature,
}

impl UnboundMethod {
    pub fn signature(&self) -> &MethodSignature {
        &self.signature
    }
}

/// Result of [`classify`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Classification {
    pub bound: Vec<BindingDescriptor>,
    pub unbound: Vec<UnboundMethod>,
}

impl Classification {
    /// Total number of methods classified.
    pub fn len(&self) -> usize {
        self.bound.len() + self.unbound.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bound.is_empty() && self.unbound.is_empty()
    }
}

/// Classify `interface` against `bindings` using the default binding policy.
pub fn classify(interface: &InterfaceEntry, bindings: &BindingTable) -> Classification {
    classify_with_defaults(interface, bindings, &BindingDefaults::default())
}

/// Classify `interface` against `bindings`.
///
/// A method with an entry in `bindings` becomes a [`BindingDescriptor`] with
/// unspecified fields filled from `defaults`; every other method becomes an
/// [`UnboundMethod`]. Bindings that match no method are ignored.
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn classify_with_defaults(
    interface: &InterfaceEntry,
    bindings: &BindingTable,
    defaults: &BindingDefaults,
) -> Classification {
    let mut out = Classification::default();

    for method in &interface.methods {
        match bindings.get(method) {
            Some(binding) => {
                let descriptor = binding.resolve_for(method, defaults);
                trace!(
                    interface = %interface.name,
                    method = %method,
                    library = %descriptor.library,
                    entry_point = %descriptor.entry_point,
                    "native-bound"
                );
                out.bound.push(descriptor);
            }
            None => {
                trace!(interface = %interface.name, method = %method, "unbound");
                out.unbound.push(UnboundMethod {
                    signature: method.clone(),
                });
            }
        }
    }

    if bindings.len() > out.bound.len() {
        let declared: FxHashSet<_> = interface.methods.iter().map(|m| m.signature_hash()).collect();
        for orphan in bindings.keys().filter(|hash| !declared.contains(hash)) {
            warn!(
                interface = %interface.name,
                signature = %orphan,
                "binding matches no interface method"
            );
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use nativeshim_core::{CharSet, DataType, NativeBinding};
    use tracing_test::traced_test;

    fn calculator() -> InterfaceEntry {
        InterfaceEntry::new("ICalculator")
            .with_method(MethodSignature::new(
                "Add",
                vec![DataType::INT32, DataType::INT32],
                DataType::INT32,
            ))
            .with_method(MethodSignature::new("Unsupported", vec![], DataType::VOID))
            .with_method(MethodSignature::new(
                "Scale",
                vec![DataType::DOUBLE],
                DataType::DOUBLE,
            ))
    }

    #[test]
    fn partitions_every_method_once() {
        let iface = calculator();
        let bindings = BindingTable::new()
            .with(&iface.methods[0], NativeBinding::new("math"))
            .with(&iface.methods[2], NativeBinding::new("math"));

        let c = classify(&iface, &bindings);

        assert_eq!(c.len(), iface.methods.len());
        let bound: Vec<_> = c.bound.iter().map(|d| d.signature().name.as_str()).collect();
        let unbound: Vec<_> = c.unbound.iter().map(|u| u.signature().name.as_str()).collect();
        assert_eq!(bound, ["Add", "Scale"]);
        assert_eq!(unbound, ["Unsupported"]);
    }

    #[test]
    fn entry_point_defaults_to_method_name() {
        let iface = calculator();
        let bindings = BindingTable::new().with(&iface.methods[0], NativeBinding::new("math"));

        let c = classify(&iface, &bindings);

        assert_eq!(c.bound[0].entry_point, "Add");
        assert_eq!(c.bound[0].library, "math");
        assert!(c.bound[0].preserve_signature());
        assert!(!c.bound[0].set_last_error());
    }

    #[test]
    fn defaults_fill_unspecified_fields() {
        let iface = calculator();
        let bindings = BindingTable::new()
            .with(&iface.methods[0], NativeBinding::new("math"))
            .with(&iface.methods[2], NativeBinding::new("math").char_set(CharSet::Ansi));
        let defaults = BindingDefaults::default().with_char_set(CharSet::Unicode);

        let c = classify_with_defaults(&iface, &bindings, &defaults);

        assert_eq!(c.bound[0].char_set, CharSet::Unicode);
        assert_eq!(c.bound[1].char_set, CharSet::Ansi);
    }

    #[test]
    fn overloads_are_classified_independently() {
        let iface = InterfaceEntry::new("IAbs")
            .with_method(MethodSignature::new("Abs", vec![DataType::INT32], DataType::INT32))
            .with_method(MethodSignature::new("Abs", vec![DataType::DOUBLE], DataType::DOUBLE));
        let bindings = BindingTable::new().with(&iface.methods[1], NativeBinding::new("m").entry_point("fabs"));

        let c = classify(&iface, &bindings);

        assert_eq!(c.bound.len(), 1);
        assert_eq!(c.bound[0].entry_point, "fabs");
        assert_eq!(c.unbound[0].signature().params, vec![DataType::INT32]);
    }

    #[test]
    fn empty_interface_is_empty() {
        let c = classify(&InterfaceEntry::new("IEmpty"), &BindingTable::new());
        assert!(c.is_empty());
    }

    #[test]
    fn classification_is_deterministic() {
        let iface = calculator();
        let bindings = BindingTable::new().with(&iface.methods[2], NativeBinding::new("math"));
        assert_eq!(classify(&iface, &bindings), classify(&iface, &bindings));
    }

    #[test]
    #[traced_test]
    fn orphan_bindings_are_reported() {
        let iface = calculator();
        let stray = MethodSignature::new("Subtract", vec![DataType::INT32], DataType::INT32);
        let bindings = BindingTable::new().with(&stray, NativeBinding::new("math"));

        let c = classify(&iface, &bindings);

        assert!(c.bound.is_empty());
        assert!(logs_contain("binding matches no interface method"));
    }
}
