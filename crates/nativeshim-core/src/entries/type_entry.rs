//! TypeEntry enum for unified type descriptions.
//!
//! A shim build accepts any `TypeEntry` and rejects everything that is not an
//! interface, so the enum is what callers hand to the factory.

use crate::{PrimitiveKind, TypeHash};

use super::{ClassEntry, InterfaceEntry};

/// Unified type description.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeEntry {
    /// Primitive type (int, float, bool, etc.).
    Primitive(PrimitiveKind),
    /// Concrete or abstract class.
    Class(ClassEntry),
    /// Interface type.
    Interface(InterfaceEntry),
}

impl TypeEntry {
    /// Get the type hash for this entry.
    pub fn type_hash(&self) -> TypeHash {
        match self {
            TypeEntry::Primitive(kind) => TypeHash::from_name(kind.name()),
            TypeEntry::Class(e) => e.type_hash,
            TypeEntry::Interface(e) => e.type_hash,
        }
    }

    /// Get the type name.
    pub fn name(&self) -> &str {
        match self {
            TypeEntry::Primitive(kind) => kind.name(),
            TypeEntry::Class(e) => &e.name,
            TypeEntry::Interface(e) => &e.name,
        }
    }

    /// Human-readable kind, used in diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            TypeEntry::Primitive(_) => "primitive",
            TypeEntry::Class(e) if e.is_abstract => "abstract class",
            TypeEntry::Class(_) => "class",
            TypeEntry::Interface(_) => "interface",
        }
    }

    /// Get as an interface entry.
    pub fn as_interface(&self) -> Option<&InterfaceEntry> {
        match self {
            TypeEntry::Interface(e) => Some(e),
            _ => None,
        }
    }
}

impl From<InterfaceEntry> for TypeEntry {
    fn from(entry: InterfaceEntry) -> Self {
        TypeEntry::Interface(entry)
    }
}

impl From<ClassEntry> for TypeEntry {
    fn from(entry: ClassEntry) -> Self {
        TypeEntry::Class(entry)
    }
}

impl From<PrimitiveKind> for TypeEntry {
    fn from(kind: PrimitiveKind) -> Self {
        TypeEntry::Primitive(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_names() {
        let iface: TypeEntry = InterfaceEntry::new("IMath").into();
        let class: TypeEntry = ClassEntry::new("Math").into();
        let abstract_class: TypeEntry = ClassEntry::new("Shape").as_abstract().into();
        let prim: TypeEntry = PrimitiveKind::Int32.into();

        assert_eq!(iface.kind_name(), "interface");
        assert_eq!(class.kind_name(), "class");
        assert_eq!(abstract_class.kind_name(), "abstract class");
        assert_eq!(prim.kind_name(), "primitive");
    }

    #[test]
    fn downcasting() {
        let iface: TypeEntry = InterfaceEntry::new("IMath").into();
        assert_eq!(iface.as_interface().map(|e| e.name.as_str()), Some("IMath"));

        let class: TypeEntry = ClassEntry::new("Math").into();
        assert!(class.as_interface().is_none());
        assert_eq!(class.name(), "Math");
    }

    #[test]
    fn type_hash_matches_entry() {
        let iface = InterfaceEntry::new("IMath");
        let hash = iface.type_hash;
        assert_eq!(TypeEntry::from(iface).type_hash(), hash);
        assert_eq!(
            TypeEntry::from(PrimitiveKind::Bool).type_hash(),
            TypeHash::from_name("bool")
        );
    }
}
