//! Class type entry.

use crate::{MethodSignature, TypeHash};

/// Registry entry for a concrete or abstract class.
///
/// Classes carry their own behavior, so they are never valid shim targets;
/// the entry exists so callers can describe (and be told off for passing)
/// them.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassEntry {
    /// Class name.
    pub name: String,
    /// Type hash for identity.
    pub type_hash: TypeHash,
    /// Declared methods.
    pub methods: Vec<MethodSignature>,
    /// Whether the class is abstract.
    pub is_abstract: bool,
}

impl ClassEntry {
    /// Create a concrete class entry.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let type_hash = TypeHash::from_name(&name);
        Self {
            name,
            type_hash,
            methods: Vec::new(),
            is_abstract: false,
        }
    }

    /// Mark the class as abstract.
    pub fn as_abstract(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    /// Add a method signature.
    pub fn with_method(mut self, method: MethodSignature) -> Self {
        self.methods.push(method);
        self
    }
}
