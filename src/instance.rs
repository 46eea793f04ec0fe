//! Shim instances and method dispatch.

use std::sync::{Arc, Mutex};

use nativeshim_core::{Dynamic, MethodSignature, TypeHash};
use tracing::trace;

use crate::error::InvokeError;
use crate::synth::{ShimType, ShimTypeId, Slot};

/// Invocation by method identity.
pub trait Dispatch {
    /// Invoke the method whose signature hash is `method`.
    fn invoke(&self, method: TypeHash, args: &[Dynamic]) -> Result<Dynamic, InvokeError>;
}

/// An object implementing a synthesized interface.
///
/// Native-bound methods forward to their foreign function; every other
/// method returns [`InvokeError::NotImplemented`].
#[derive(Debug)]
pub struct ShimInstance {
    ty: Arc<ShimType>,
    last_error: Mutex<Option<i32>>,
}

impl ShimInstance {
    pub(crate) fn new(ty: Arc<ShimType>) -> Self {
        Self {
            ty,
            last_error: Mutex::new(None),
        }
    }

    pub fn shim_type(&self) -> &Arc<ShimType> {
        &self.ty
    }

    pub fn type_id(&self) -> ShimTypeId {
        self.ty.id()
    }

    pub fn interface_name(&self) -> &str {
        self.ty.interface_name()
    }

    /// Whether `signature` is a method of the implemented interface.
    pub fn implements(&self, signature: &MethodSignature) -> bool {
        self.ty.slot_by_signature(signature.signature_hash()).is_some()
    }

    /// Invoke a method by its full signature.
    pub fn call_signature(
        &self,
        signature: &MethodSignature,
        args: &[Dynamic],
    ) -> Result<Dynamic, InvokeError> {
        self.invoke(signature.signature_hash(), args)
    }

    /// Invoke a method by name, picking the overload whose parameters accept
    /// `args`.
    pub fn call(&self, name: &str, args: &[Dynamic]) -> Result<Dynamic, InvokeError> {
        let itable = self.ty.itable();
        let candidates: Vec<u16> = itable
            .slots_for_name(name)
            .iter()
            .copied()
            .filter(|&index| {
                self.ty.slot(index).is_some_and(|slot| {
                    let params = &slot.signature().params;
                    params.len() == args.len()
                        && params.iter().zip(args).all(|(ty, arg)| arg.fits(*ty))
                })
            })
            .collect();

        match candidates.as_slice() {
            [index] => self.dispatch_slot(*index, args),
            [] => Err(InvokeError::NoSuchMethod {
                interface: self.interface_name().to_string(),
                method: format!("{name}/{}", args.len()),
            }),
            many => Err(InvokeError::AmbiguousOverload {
                method: name.to_string(),
                candidates: many.len(),
            }),
        }
    }

    /// OS error code captured by the most recent native call that had
    /// `set_last_error` enabled.
    ///
    /// Calls that fail before reaching native code leave it unchanged; a call
    /// that reports no error clears it.
    pub fn last_native_error(&self) -> Option<i32> {
        *self.last_error.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn dispatch_slot(&self, index: u16, args: &[Dynamic]) -> Result<Dynamic, InvokeError> {
        let Some(slot) = self.ty.slot(index) else {
            return Err(InvokeError::NoSuchMethod {
                interface: self.interface_name().to_string(),
                method: format!("slot {index}"),
            });
        };

        match slot {
            Slot::Native(call) => {
                let descriptor = call.descriptor();
                trace!(
                    interface = %self.interface_name(),
                    method = %descriptor.signature(),
                    entry_point = %descriptor.entry_point,
                    "native dispatch"
                );
                let linker = self.ty.linker();
                let result = linker.invoke(descriptor, args);
                let called = match &result {
                    Ok(_) => true,
                    Err(err) => err.after_call(),
                };
                if descriptor.set_last_error() && called {
                    *self.last_error.lock().unwrap_or_else(|e| e.into_inner()) =
                        linker.last_error();
                }
                Ok(result?)
            }
            Slot::NotImplemented(signature) => {
                trace!(interface = %self.interface_name(), method = %signature, "unbound dispatch");
                Err(InvokeError::NotImplemented {
                    interface: self.interface_name().to_string(),
                    method: signature.to_string(),
                })
            }
        }
    }
}

impl Dispatch for ShimInstance {
    fn invoke(&self, method: TypeHash, args: &[Dynamic]) -> Result<Dynamic, InvokeError> {
        match self.ty.itable().slot_by_signature(method) {
            Some(index) => self.dispatch_slot(index, args),
            None => Err(InvokeError::NoSuchMethod {
                interface: self.interface_name().to_string(),
                method: method.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::classify;
    use crate::synth::synthesize;
    use nativeshim_core::{
        BindingTable, DataType, InterfaceEntry, NativeBinding, NativeError, UnlinkedLinker,
    };

    fn instance(bind_add: bool) -> ShimInstance {
        let iface = InterfaceEntry::new("ICalculator")
            .with_method(MethodSignature::new(
                "Add",
                vec![DataType::INT32, DataType::INT32],
                DataType::INT32,
            ))
            .with_method(MethodSignature::new("Add", vec![DataType::DOUBLE], DataType::DOUBLE))
            .with_method(MethodSignature::new("Unsupported", vec![], DataType::VOID));
        let mut bindings = BindingTable::new();
        if bind_add {
            bindings.bind(&iface.methods[0], NativeBinding::new("math"));
        }
        let ty = synthesize(&iface.name, classify(&iface, &bindings), Arc::new(UnlinkedLinker)).unwrap();
        Arc::new(ty).instantiate()
    }

    #[test]
    fn unbound_method_is_not_implemented() {
        let shim = instance(false);
        let err = shim.call("Unsupported", &[]).unwrap_err();
        assert_eq!(
            err,
            InvokeError::NotImplemented {
                interface: "ICalculator".to_string(),
                method: "void Unsupported()".to_string(),
            }
        );
        // every time
        assert!(shim.call("Unsupported", &[]).unwrap_err().is_not_implemented());
    }

    #[test]
    fn bound_method_reaches_the_linker() {
        let shim = instance(true);
        let err = shim.call("Add", &[Dynamic::Int(1), Dynamic::Int(2)]).unwrap_err();
        assert!(matches!(err, InvokeError::Native(NativeError::Other { .. })));
    }

    #[test]
    fn overloads_resolve_by_argument_types() {
        let shim = instance(true);
        assert!(shim.call("Add", &[Dynamic::Float(1.5)]).unwrap_err().is_not_implemented());
        assert!(matches!(
            shim.call("Add", &[Dynamic::from("x")]),
            Err(InvokeError::NoSuchMethod { .. })
        ));
    }

    #[test]
    fn unknown_signature_is_no_such_method() {
        let shim = instance(true);
        let missing = MethodSignature::new("Mul", vec![], DataType::INT32);
        assert!(!shim.implements(&missing));
        assert!(matches!(
            shim.invoke(missing.signature_hash(), &[]),
            Err(InvokeError::NoSuchMethod { .. })
        ));
    }

    #[test]
    fn last_error_starts_empty() {
        assert_eq!(instance(true).last_native_error(), None);
    }
}
