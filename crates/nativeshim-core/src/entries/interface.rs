//! Interface type entry.
//!
//! This module provides `InterfaceEntry` for interface descriptions and the
//! `ITable` used to dispatch their methods.

use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::{MethodSignature, TypeHash};

/// Why a method could not be given an itable slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SlotError {
    #[error("method identity already has a slot")]
    Duplicate,
    #[error("itable is full ({} slots)", ITable::MAX_SLOTS)]
    Full,
}

/// Interface method table for dispatch.
///
/// Maps signature hashes to slot indices and provides name-based lookup for
/// overload resolution.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ITable {
    index: FxHashMap<TypeHash, u16>,
    /// A single name may have multiple slots (one per overload).
    slots_by_name: FxHashMap<String, Vec<u16>>,
}

impl ITable {
    /// Largest number of methods one itable can address.
    pub const MAX_SLOTS: usize = u16::MAX as usize + 1;

    /// Create an empty itable.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the slot index for a method by its signature hash.
    pub fn slot_by_signature(&self, sig_hash: TypeHash) -> Option<u16> {
        self.index.get(&sig_hash).copied()
    }

    /// Get all slots for methods with a given name (for overload resolution).
    pub fn slots_for_name(&self, name: &str) -> &[u16] {
        self.slots_by_name
            .get(name)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Get the total number of slots.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Add a method to the itable, returning its slot index.
    ///
    /// Slots are assigned in insertion order. Nothing is modified on error.
    pub fn add_method(&mut self, name: &str, sig_hash: TypeHash) -> Result<u16, SlotError> {
        if self.index.contains_key(&sig_hash) {
            return Err(SlotError::Duplicate);
        }
        let slot = u16::try_from(self.index.len()).map_err(|_| SlotError::Full)?;
        self.index.insert(sig_hash, slot);
        self.slots_by_name
            .entry(name.to_string())
            .or_default()
            .push(slot);
        Ok(slot)
    }
}

/// Registry entry for an interface type.
///
/// Interfaces are pure contracts: an ordered list of method signatures with no
/// behavior of their own.
#[derive(Debug, Clone, PartialEq)]
pub struct InterfaceEntry {
    /// Interface name.
    pub name: String,
    /// Type hash for identity.
    pub type_hash: TypeHash,
    /// Method signatures in declaration order.
    pub methods: Vec<MethodSignature>,
}

impl InterfaceEntry {
    /// Create an empty interface.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let type_hash = TypeHash::from_name(&name);
        Self {
            name,
            type_hash,
            methods: Vec::new(),
        }
    }

    /// Add a method signature.
    pub fn with_method(mut self, method: MethodSignature) -> Self {
        self.methods.push(method);
        self
    }
}
