//! Shim synthesis.
//!
//! Turns a filtered [`Classification`] into a [`ShimType`]: one dispatch slot
//! per interface method, indexed through an [`ITable`] so overloads resolve
//! independently. A `ShimType` is immutable once built and is the unit of
//! identity; every synthesis mints a fresh [`ShimTypeId`].

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use nativeshim_core::{
    BindingDescriptor, ITable, InterfaceEntry, MethodSignature, NativeLinker, SlotError, TypeHash,
};
use rustc_hash::FxHashSet;

use crate::classify::Classification;
use crate::error::ShimError;
use crate::instance::ShimInstance;

static NEXT_TYPE_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a synthesized shim type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShimTypeId(u64);

impl ShimTypeId {
    fn next() -> Self {
        Self(NEXT_TYPE_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ShimTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "shim#{}", self.0)
    }
}

/// Forwarder to a native function.
///
/// Holds the frozen descriptor; arguments and results pass through the
/// linker untouched.
#[derive(Debug, Clone)]
pub struct NativeCall {
    descriptor: Arc<BindingDescriptor>,
}

impl NativeCall {
    pub fn descriptor(&self) -> &BindingDescriptor {
        &self.descriptor
    }
}

/// What a method does when invoked.
#[derive(Debug, Clone)]
pub enum Slot {
    Native(NativeCall),
    NotImplemented(MethodSignature),
}

impl Slot {
    pub fn signature(&self) -> &MethodSignature {
        match self {
            Slot::Native(call) => call.descriptor.signature(),
            Slot::NotImplemented(sig) => sig,
        }
    }

    pub fn is_native(&self) -> bool {
        matches!(self, Slot::Native(_))
    }
}

/// A synthesized implementation of one interface.
pub struct ShimType {
    id: ShimTypeId,
    interface: String,
    itable: ITable,
    slots: Vec<Slot>,
    linker: Arc<dyn NativeLinker>,
}

impl ShimType {
    pub fn id(&self) -> ShimTypeId {
        self.id
    }

    /// Name of the implemented interface.
    pub fn interface_name(&self) -> &str {
        &self.interface
    }

    pub fn itable(&self) -> &ITable {
        &self.itable
    }

    /// Slots in itable order: native-bound methods first, then unbound ones.
    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub fn slot(&self, index: u16) -> Option<&Slot> {
        self.slots.get(usize::from(index))
    }

    /// Look up a slot by method identity.
    pub fn slot_by_signature(&self, sig_hash: TypeHash) -> Option<&Slot> {
        self.itable
            .slot_by_signature(sig_hash)
            .and_then(|index| self.slot(index))
    }

    /// The frozen binding of a native-bound method.
    pub fn descriptor(&self, signature: &MethodSignature) -> Option<&BindingDescriptor> {
        match self.slot_by_signature(signature.signature_hash())? {
            Slot::Native(call) => Some(call.descriptor()),
            Slot::NotImplemented(_) => None,
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn native_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_native()).count()
    }

    pub(crate) fn linker(&self) -> &Arc<dyn NativeLinker> {
        &self.linker
    }

    /// Create an instance. Instances carry no configuration of their own.
    pub fn instantiate(self: &Arc<Self>) -> ShimInstance {
        ShimInstance::new(Arc::clone(self))
    }
}

impl fmt::Debug for ShimType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShimType")
            .field("id", &self.id)
            .field("interface", &self.interface)
            .field("slots", &self.slots)
            .finish_non_exhaustive()
    }
}

/// Build a shim type for `interface` from its filtered classification.
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn synthesize(
    interface: &str,
    classification: Classification,
    linker: Arc<dyn NativeLinker>,
) -> Result<ShimType, ShimError> {
    let Classification { bound, unbound } = classification;
    let mut itable = ITable::new();
    let (bound_len, unbound_len) = (bound.len(), unbound.len());
    let mut slots = Vec::with_capacity(bound_len + unbound_len);

    let native = bound.into_iter().map(|descriptor| {
        Slot::Native(NativeCall {
            descriptor: Arc::new(descriptor),
        })
    });
    let missing = unbound
        .into_iter()
        .map(|method| Slot::NotImplemented(method.signature().clone()));

    for slot in native.chain(missing) {
        let signature = slot.signature();
        itable
            .add_method(&signature.name, signature.signature_hash())
            .map_err(|err| slot_error(err, interface, signature, bound_len + unbound_len))?;
        slots.push(slot);
    }

    Ok(ShimType {
        id: ShimTypeId::next(),
        interface: interface.to_string(),
        itable,
        slots,
        linker,
    })
}

/// Reject interfaces that cannot be given one slot per method.
///
/// Runs on the declared methods, before any binding is classified or filtered.
pub(crate) fn check_interface(interface: &InterfaceEntry) -> Result<(), ShimError> {
    let count = interface.methods.len();
    if count > ITable::MAX_SLOTS {
        return Err(too_many(&interface.name, count));
    }
    let mut seen = FxHashSet::default();
    for method in &interface.methods {
        if !seen.insert(method.signature_hash()) {
            return Err(duplicate(&interface.name, method));
        }
    }
    Ok(())
}

fn slot_error(err: SlotError, interface: &str, method: &MethodSignature, count: usize) -> ShimError {
    match err {
        SlotError::Duplicate => duplicate(interface, method),
        SlotError::Full => too_many(interface, count),
    }
}

fn duplicate(interface: &str, method: &MethodSignature) -> ShimError {
    ShimError::DuplicateMethod {
        interface: interface.to_string(),
        method: method.to_string(),
    }
}

fn too_many(interface: &str, count: usize) -> ShimError {
    ShimError::TooManyMethods {
        interface: interface.to_string(),
        count,
        max: ITable::MAX_SLOTS,
    }
}
