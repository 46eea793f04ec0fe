//! Error types for shim building and dispatch.
//!
//! ```text
//! ShimError   - build time, no instance is produced
//! InvokeError - one call on a built instance
//! ```

use nativeshim_core::{BindingError, NativeError};
use thiserror::Error;

/// Error type returned by filter hooks.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

// ============================================================================
// Build Errors
// ============================================================================

/// Errors that abort a build.
#[derive(Debug, Error)]
pub enum ShimError {
    /// The target type is not an interface.
    #[error("cannot synthesize a shim for {kind} '{name}': only interfaces can be implemented")]
    InvalidTarget { name: String, kind: &'static str },

    /// The filter hook rejected a binding.
    #[error("filter hook failed for '{method}': {source}")]
    Filter {
        method: String,
        #[source]
        source: BoxError,
    },

    /// A binding is unusable after filtering.
    #[error(transparent)]
    InvalidBinding(#[from] BindingError),

    /// The interface declares the same method identity more than once.
    #[error("interface '{interface}' declares '{method}' more than once")]
    DuplicateMethod { interface: String, method: String },

    /// The interface declares more methods than an itable can address.
    #[error("interface '{interface}' declares {count} methods, more than the {max} a shim can hold")]
    TooManyMethods {
        interface: String,
        count: usize,
        max: usize,
    },
}

impl ShimError {
    /// Check if this error was raised before any synthesis work.
    pub fn is_invalid_target(&self) -> bool {
        matches!(self, ShimError::InvalidTarget { .. })
    }
}

// ============================================================================
// Dispatch Errors
// ============================================================================

/// Errors from invoking a method on a shim instance.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvokeError {
    /// The method has no native binding.
    #[error("'{method}' is not implemented by this {interface} shim")]
    NotImplemented { interface: String, method: String },

    /// The foreign call failed.
    #[error(transparent)]
    Native(#[from] NativeError),

    /// No method matches the requested identity or name and arguments.
    #[error("'{interface}' has no method matching '{method}'")]
    NoSuchMethod { interface: String, method: String },

    /// More than one overload accepts the arguments.
    #[error("call to '{method}' matches {candidates} overloads")]
    AmbiguousOverload { method: String, candidates: usize },
}

impl InvokeError {
    pub fn is_not_implemented(&self) -> bool {
        matches!(self, InvokeError::NotImplemented { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_target_names_the_kind() {
        let err = ShimError::InvalidTarget {
            name: "Widget".to_string(),
            kind: "abstract class",
        };
        assert_eq!(
            err.to_string(),
            "cannot synthesize a shim for abstract class 'Widget': only interfaces can be implemented"
        );
        assert!(err.is_invalid_target());
    }

    #[test]
    fn filter_error_keeps_its_source() {
        use std::error::Error as _;

        let err = ShimError::Filter {
            method: "int Add(int, int)".to_string(),
            source: "no such library".into(),
        };
        assert!(err.to_string().contains("int Add(int, int)"));
        assert_eq!(err.source().map(|s| s.to_string()).as_deref(), Some("no such library"));
    }

    #[test]
    fn native_errors_pass_through() {
        let native = NativeError::other("boom");
        let err = InvokeError::from(native.clone());
        assert_eq!(err, InvokeError::Native(native));
        assert_eq!(err.to_string(), "native error: boom");
        assert!(!err.is_not_implemented());
    }
}
