//! Runtime value type for shim arguments and return values.

use std::fmt;

use crate::{DataType, PrimitiveKind};

/// A dynamically typed argument or return value.
///
/// All integer widths are carried as `i64` and both float widths as `f64`;
/// the declared [`DataType`] of the parameter decides the native width when
/// the value crosses the foreign-function boundary.
#[derive(Clone, PartialEq)]
pub enum Dynamic {
    /// Void/empty
    Void,
    /// Integer value (every signed and unsigned width)
    Int(i64),
    /// Floating point value (`float` and `double`)
    Float(f64),
    /// Boolean value
    Bool(bool),
    /// String value (owned)
    String(String),
    /// Opaque pointer-sized handle
    Pointer(usize),
}

impl Dynamic {
    /// Get a human-readable name for this value's type.
    pub fn type_name(&self) -> &'static str {
        match self {
            Dynamic::Void => "void",
            Dynamic::Int(_) => "int",
            Dynamic::Float(_) => "float",
            Dynamic::Bool(_) => "bool",
            Dynamic::String(_) => "string",
            Dynamic::Pointer(_) => "ptr",
        }
    }

    /// Check if this value is void.
    pub fn is_void(&self) -> bool {
        matches!(self, Dynamic::Void)
    }

    /// Whether this value can be passed for a parameter of type `ty`.
    pub fn fits(&self, ty: DataType) -> bool {
        match (self, ty) {
            (Dynamic::Void, DataType::Primitive(PrimitiveKind::Void)) => true,
            (Dynamic::Bool(_), DataType::Primitive(PrimitiveKind::Bool)) => true,
            (Dynamic::Int(_), DataType::Primitive(kind)) => kind.is_integer(),
            (Dynamic::Float(_), DataType::Primitive(kind)) => kind.is_float(),
            (Dynamic::String(_), DataType::String) => true,
            (Dynamic::Pointer(_), DataType::Pointer) => true,
            _ => false,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Dynamic::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Dynamic::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Dynamic::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Dynamic::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_pointer(&self) -> Option<usize> {
        match self {
            Dynamic::Pointer(p) => Some(*p),
            _ => None,
        }
    }
}

impl fmt::Debug for Dynamic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dynamic::Void => write!(f, "Void"),
            Dynamic::Int(v) => write!(f, "Int({})", v),
            Dynamic::Float(v) => write!(f, "Float({})", v),
            Dynamic::Bool(v) => write!(f, "Bool({})", v),
            Dynamic::String(s) => write!(f, "String({:?})", s),
            Dynamic::Pointer(p) => write!(f, "Pointer({:#x})", p),
        }
    }
}

macro_rules! impl_from_int {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Dynamic {
                fn from(v: $ty) -> Self {
                    Dynamic::Int(v as i64)
                }
            }
        )*
    };
}

impl_from_int!(i8, i16, i32, i64, u8, u16, u32, u64);

impl From<f32> for Dynamic {
    fn from(v: f32) -> Self {
        Dynamic::Float(v as f64)
    }
}

impl From<f64> for Dynamic {
    fn from(v: f64) -> Self {
        Dynamic::Float(v)
    }
}

impl From<bool> for Dynamic {
    fn from(v: bool) -> Self {
        Dynamic::Bool(v)
    }
}

impl From<&str> for Dynamic {
    fn from(v: &str) -> Self {
        Dynamic::String(v.to_string())
    }
}

impl From<String> for Dynamic {
    fn from(v: String) -> Self {
        Dynamic::String(v)
    }
}

impl From<()> for Dynamic {
    fn from(_: ()) -> Self {
        Dynamic::Void
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fits_matches_declared_types() {
        assert!(Dynamic::Int(1).fits(DataType::INT32));
        assert!(Dynamic::Int(1).fits(DataType::UINT64));
        assert!(!Dynamic::Int(1).fits(DataType::DOUBLE));
        assert!(Dynamic::Float(1.0).fits(DataType::FLOAT));
        assert!(!Dynamic::Bool(true).fits(DataType::INT8));
        assert!(Dynamic::from("x").fits(DataType::String));
        assert!(Dynamic::Pointer(0).fits(DataType::Pointer));
        assert!(!Dynamic::Pointer(0).fits(DataType::String));
    }

    #[test]
    fn conversions() {
        assert_eq!(Dynamic::from(7u8), Dynamic::Int(7));
        assert_eq!(Dynamic::from(1.5f32), Dynamic::Float(1.5));
        assert_eq!(Dynamic::from(()), Dynamic::Void);
        assert_eq!(Dynamic::from("hi").as_str(), Some("hi"));
        assert_eq!(Dynamic::Int(3).as_int(), Some(3));
        assert_eq!(Dynamic::Int(3).as_float(), None);
    }

    #[test]
    fn debug_output() {
        assert_eq!(format!("{:?}", Dynamic::Pointer(255)), "Pointer(0xff)");
        assert_eq!(format!("{:?}", Dynamic::from("a")), "String(\"a\")");
    }
}
