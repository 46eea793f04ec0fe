//! Parameter and return types of interface methods.
//!
//! [`DataType`] is the structural type vocabulary shared by method signatures,
//! the dispatch layer (overload matching) and the native linker (call
//! interface construction).
//!
//! # Example
//!
//! ```
//! use nativeshim_core::{DataType, PrimitiveKind};
//!
//! let int = DataType::INT32;
//! assert_eq!(int, DataType::Primitive(PrimitiveKind::Int32));
//! assert_eq!(int.to_string(), "int");
//! assert!(DataType::VOID.is_void());
//! ```

use std::fmt;

use crate::TypeHash;

/// Primitive type kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Void,
    Bool,
    Int8,
    Int16,
    Int32,
    Int64,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Float,
    Double,
}

impl PrimitiveKind {
    /// Get the name of this primitive type.
    pub const fn name(self) -> &'static str {
        match self {
            PrimitiveKind::Void => "void",
            PrimitiveKind::Bool => "bool",
            PrimitiveKind::Int8 => "int8",
            PrimitiveKind::Int16 => "int16",
            PrimitiveKind::Int32 => "int",
            PrimitiveKind::Int64 => "int64",
            PrimitiveKind::Uint8 => "uint8",
            PrimitiveKind::Uint16 => "uint16",
            PrimitiveKind::Uint32 => "uint",
            PrimitiveKind::Uint64 => "uint64",
            PrimitiveKind::Float => "float",
            PrimitiveKind::Double => "double",
        }
    }

    /// Whether this is one of the integer kinds.
    pub const fn is_integer(self) -> bool {
        matches!(
            self,
            PrimitiveKind::Int8
                | PrimitiveKind::Int16
                | PrimitiveKind::Int32
                | PrimitiveKind::Int64
                | PrimitiveKind::Uint8
                | PrimitiveKind::Uint16
                | PrimitiveKind::Uint32
                | PrimitiveKind::Uint64
        )
    }

    /// Whether this is `float` or `double`.
    pub const fn is_float(self) -> bool {
        matches!(self, PrimitiveKind::Float | PrimitiveKind::Double)
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A parameter or return type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    /// A primitive value passed by value.
    Primitive(PrimitiveKind),
    /// An opaque pointer-sized handle.
    Pointer,
    /// A string, marshaled according to the binding's char set.
    String,
}

impl DataType {
    pub const VOID: DataType = DataType::Primitive(PrimitiveKind::Void);
    pub const BOOL: DataType = DataType::Primitive(PrimitiveKind::Bool);
    pub const INT8: DataType = DataType::Primitive(PrimitiveKind::Int8);
    pub const INT16: DataType = DataType::Primitive(PrimitiveKind::Int16);
    pub const INT32: DataType = DataType::Primitive(PrimitiveKind::Int32);
    pub const INT64: DataType = DataType::Primitive(PrimitiveKind::Int64);
    pub const UINT8: DataType = DataType::Primitive(PrimitiveKind::Uint8);
    pub const UINT16: DataType = DataType::Primitive(PrimitiveKind::Uint16);
    pub const UINT32: DataType = DataType::Primitive(PrimitiveKind::Uint32);
    pub const UINT64: DataType = DataType::Primitive(PrimitiveKind::Uint64);
    pub const FLOAT: DataType = DataType::Primitive(PrimitiveKind::Float);
    pub const DOUBLE: DataType = DataType::Primitive(PrimitiveKind::Double);

    /// Get the type name used in signatures and diagnostics.
    pub const fn name(self) -> &'static str {
        match self {
            DataType::Primitive(kind) => kind.name(),
            DataType::Pointer => "ptr",
            DataType::String => "string",
        }
    }

    /// Get the identity hash of this type.
    pub fn type_hash(self) -> TypeHash {
        TypeHash::from_name(self.name())
    }

    /// Check if this is `void`.
    pub const fn is_void(self) -> bool {
        matches!(self, DataType::Primitive(PrimitiveKind::Void))
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
