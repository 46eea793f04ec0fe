//! Method signature type for interface method definitions.

use std::fmt;

use crate::{DataType, TypeHash};

/// A method signature for interfaces.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodSignature {
    /// Method name.
    pub name: String,
    /// Parameter types.
    pub params: Vec<DataType>,
    /// Return type.
    pub return_type: DataType,
}

impl MethodSignature {
    /// Create a new method signature.
    pub fn new(name: impl Into<String>, params: Vec<DataType>, return_type: DataType) -> Self {
        Self {
            name: name.into(),
            params,
            return_type,
        }
    }

    /// Compute the method identity used by binding tables and the itable.
    ///
    /// Uses the name and parameter types (not the return type), so each
    /// overload has its own identity.
    pub fn signature_hash(&self) -> TypeHash {
        let param_hashes: Vec<TypeHash> = self.params.iter().map(|p| p.type_hash()).collect();
        TypeHash::from_function(&self.name, &param_hashes)
    }
}

impl fmt::Display for MethodSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}(", self.return_type, self.name)?;
        for (i, param) in self.params.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{param}")?;
        }
        f.write_str(")")
    }
}
