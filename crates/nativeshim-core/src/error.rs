//! Error types shared by the engine and native linkers.
//!
//! ```text
//! BindingError  - malformed binding metadata (unknown names, empty library/entry point)
//! NativeError   - anything a native call surfaces: load, resolve, marshal, status
//! ```

use thiserror::Error;

use crate::{CallingConvention, DataType};

/// Errors in binding metadata.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindingError {
    /// The binding names no library.
    #[error("binding for '{method}' has an empty library name")]
    EmptyLibrary { method: String },

    /// The binding names no entry point.
    #[error("binding for '{method}' has an empty entry point")]
    EmptyEntryPoint { method: String },

    /// A calling convention name was not recognized.
    #[error("unknown calling convention '{0}'; expected platform, cdecl, stdcall, thiscall or fastcall")]
    UnknownConvention(String),

    /// A char set name was not recognized.
    #[error("unknown char set '{0}'; expected platform, ansi or unicode")]
    UnknownCharSet(String),
}

/// Failures surfaced by a native call.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NativeError {
    /// The shared library could not be loaded.
    #[error("failed to load library '{library}': {message}")]
    LibraryLoad { library: String, message: String },

    /// None of the candidate symbols exist in the library.
    #[error("entry point not found in '{library}' (tried {})", .candidates.join(", "))]
    EntryPointNotFound {
        library: String,
        candidates: Vec<String>,
    },

    /// Wrong number of arguments for the native signature.
    #[error("native call '{entry_point}' expects {expected} arguments, got {actual}")]
    ArgumentCount {
        entry_point: String,
        expected: usize,
        actual: usize,
    },

    /// An argument does not match the declared parameter type.
    #[error("argument {index} expects {expected}, got {actual}")]
    ArgumentType {
        index: usize,
        expected: DataType,
        actual: &'static str,
    },

    /// A type cannot cross the boundary in this position.
    #[error("type '{ty}' is not supported as a native {position}")]
    UnsupportedType {
        ty: DataType,
        position: &'static str,
    },

    /// A string contains a character the char set cannot represent.
    #[error("argument {index}: character {ch:?} cannot be mapped to the ANSI char set")]
    UnmappableChar { index: usize, ch: char },

    /// A string contains an interior NUL.
    #[error("argument {index}: string contains an interior NUL")]
    InteriorNul { index: usize },

    /// The calling convention is not available on this target.
    #[error("calling convention '{0}' is not supported on this target")]
    UnsupportedConvention(CallingConvention),

    /// A status-returning function reported failure.
    #[error("native call '{entry_point}' failed with status {code:#010x}")]
    FailureStatus { entry_point: String, code: i32 },

    /// Any other failure.
    #[error("native error: {message}")]
    Other { message: String },
}

impl NativeError {
    /// Create a generic native error.
    pub fn other(message: impl Into<String>) -> Self {
        NativeError::Other {
            message: message.into(),
        }
    }

    /// Whether the native function ran before this error was raised.
    ///
    /// Only a failure status comes back from the call itself; every other
    /// variant is raised while loading, resolving or marshaling.
    pub fn after_call(&self) -> bool {
        matches!(self, NativeError::FailureStatus { .. })
    }
}
