//! Native-binding metadata and binding descriptors.
//!
//! A [`NativeBinding`] is the metadata a caller attaches to one interface
//! method: which library and entry point to call, and how. Fields the caller
//! leaves unset are filled from [`BindingDefaults`] when the method is
//! classified, producing a [`BindingDescriptor`].
//!
//! Metadata is attached through a [`BindingTable`] keyed by method identity
//! (the signature hash), so overloads can be bound independently and the
//! interface description itself never changes.
//!
//! # Example
//!
//! ```
//! use nativeshim_core::{
//!     BindingDefaults, BindingTable, CallingConvention, DataType, MethodSignature, NativeBinding,
//! };
//!
//! let add = MethodSignature::new("Add", vec![DataType::INT32, DataType::INT32], DataType::INT32);
//! let table = BindingTable::new().with(&add, NativeBinding::new("math").entry_point("add_i32"));
//!
//! let binding = table.get(&add).unwrap();
//! let descriptor = binding.resolve_for(&add, &BindingDefaults::default());
//! assert_eq!(descriptor.entry_point, "add_i32");
//! assert_eq!(descriptor.calling_convention, CallingConvention::Platform);
//! assert!(descriptor.preserve_signature());
//! ```

use std::fmt;
use std::str::FromStr;

use bitflags::bitflags;
use rustc_hash::FxHashMap;

use crate::error::BindingError;
use crate::{MethodSignature, TypeHash};

/// Calling convention used to invoke a native entry point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CallingConvention {
    /// Whatever the target platform uses for C functions.
    #[default]
    Platform,
    /// The C calling convention.
    Cdecl,
    /// The Win32 `__stdcall` convention.
    StdCall,
    /// The C++ member-function convention.
    ThisCall,
    /// The `__fastcall` convention.
    FastCall,
}

impl CallingConvention {
    /// Get the canonical lowercase name.
    pub const fn name(self) -> &'static str {
        match self {
            CallingConvention::Platform => "platform",
            CallingConvention::Cdecl => "cdecl",
            CallingConvention::StdCall => "stdcall",
            CallingConvention::ThisCall => "thiscall",
            CallingConvention::FastCall => "fastcall",
        }
    }
}

impl fmt::Display for CallingConvention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CallingConvention {
    type Err = BindingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "platform" | "system" | "winapi" => Ok(CallingConvention::Platform),
            "c" | "cdecl" => Ok(CallingConvention::Cdecl),
            "stdcall" => Ok(CallingConvention::StdCall),
            "thiscall" => Ok(CallingConvention::ThisCall),
            "fastcall" => Ok(CallingConvention::FastCall),
            _ => Err(BindingError::UnknownConvention(s.to_string())),
        }
    }
}

/// Character-set policy for string parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CharSet {
    /// ANSI on Unix-like targets, Unicode on Windows.
    #[default]
    Platform,
    /// Single-byte strings.
    Ansi,
    /// UTF-16 strings.
    Unicode,
}

impl CharSet {
    /// Get the canonical lowercase name.
    pub const fn name(self) -> &'static str {
        match self {
            CharSet::Platform => "platform",
            CharSet::Ansi => "ansi",
            CharSet::Unicode => "unicode",
        }
    }

    /// Resolve `Platform` to the concrete char set of the current target.
    pub const fn effective(self) -> CharSet {
        match self {
            CharSet::Platform if cfg!(windows) => CharSet::Unicode,
            CharSet::Platform => CharSet::Ansi,
            other => other,
        }
    }
}

impl fmt::Display for CharSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CharSet {
    type Err = BindingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "platform" | "auto" => Ok(CharSet::Platform),
            "ansi" => Ok(CharSet::Ansi),
            "unicode" | "utf16" | "utf-16" => Ok(CharSet::Unicode),
            _ => Err(BindingError::UnknownCharSet(s.to_string())),
        }
    }
}

bitflags! {
    /// Auxiliary marshaling flags of a binding.
    ///
    /// The default set is `PRESERVE_SIGNATURE | BEST_FIT_MAPPING`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct MarshalFlags: u8 {
        /// Look up only the entry point as spelled, never `A`/`W` variants.
        const EXACT_SPELLING = 1 << 0;
        /// Return the native result as-is instead of treating it as a status code.
        const PRESERVE_SIGNATURE = 1 << 1;
        /// Capture the OS error code right after the call.
        const SET_LAST_ERROR = 1 << 2;
        /// Replace characters the ANSI char set cannot represent with `?`.
        const BEST_FIT_MAPPING = 1 << 3;
        /// Fail the call on characters the ANSI char set cannot represent.
        const THROW_ON_UNMAPPABLE_CHAR = 1 << 4;
    }
}

impl Default for MarshalFlags {
    fn default() -> Self {
        MarshalFlags::PRESERVE_SIGNATURE | MarshalFlags::BEST_FIT_MAPPING
    }
}

/// Defaults applied to metadata fields a binding leaves unset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BindingDefaults {
    pub calling_convention: CallingConvention,
    pub char_set: CharSet,
    pub flags: MarshalFlags,
}

impl BindingDefaults {
    /// Override the default calling convention.
    pub fn with_calling_convention(mut self, convention: CallingConvention) -> Self {
        self.calling_convention = convention;
        self
    }

    /// Override the default char set.
    pub fn with_char_set(mut self, char_set: CharSet) -> Self {
        self.char_set = char_set;
        self
    }

    /// Override the default flag set.
    pub fn with_flags(mut self, flags: MarshalFlags) -> Self {
        self.flags = flags;
        self
    }
}

/// Native-binding metadata as supplied by the caller.
///
/// Only `library` is required. Unset fields take their value from
/// [`BindingDefaults`] (or the method name, for the entry point) when the
/// binding is resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeBinding {
    pub library: String,
    pub entry_point: Option<String>,
    pub calling_convention: Option<CallingConvention>,
    pub char_set: Option<CharSet>,
    /// Flags explicitly set or cleared; anything not listed here uses the default.
    flags_set: MarshalFlags,
    flags_clear: MarshalFlags,
}

impl NativeBinding {
    /// Bind to a function in `library`.
    pub fn new(library: impl Into<String>) -> Self {
        Self {
            library: library.into(),
            entry_point: None,
            calling_convention: None,
            char_set: None,
            flags_set: MarshalFlags::empty(),
            flags_clear: MarshalFlags::empty(),
        }
    }

    /// Set the entry point name (defaults to the method name).
    pub fn entry_point(mut self, name: impl Into<String>) -> Self {
        self.entry_point = Some(name.into());
        self
    }

    /// Set the calling convention.
    pub fn calling_convention(mut self, convention: CallingConvention) -> Self {
        self.calling_convention = Some(convention);
        self
    }

    /// Set the char set.
    pub fn char_set(mut self, char_set: CharSet) -> Self {
        self.char_set = Some(char_set);
        self
    }

    /// Explicitly set or clear a marshaling flag.
    pub fn flag(mut self, flag: MarshalFlags, value: bool) -> Self {
        if value {
            self.flags_set |= flag;
            self.flags_clear -= flag;
        } else {
            self.flags_clear |= flag;
            self.flags_set -= flag;
        }
        self
    }

    pub fn exact_spelling(self, value: bool) -> Self {
        self.flag(MarshalFlags::EXACT_SPELLING, value)
    }

    pub fn preserve_signature(self, value: bool) -> Self {
        self.flag(MarshalFlags::PRESERVE_SIGNATURE, value)
    }

    pub fn set_last_error(self, value: bool) -> Self {
        self.flag(MarshalFlags::SET_LAST_ERROR, value)
    }

    pub fn best_fit_mapping(self, value: bool) -> Self {
        self.flag(MarshalFlags::BEST_FIT_MAPPING, value)
    }

    pub fn throw_on_unmappable_char(self, value: bool) -> Self {
        self.flag(MarshalFlags::THROW_ON_UNMAPPABLE_CHAR, value)
    }

    /// Resolve this metadata against a method signature and defaults.
    pub fn resolve_for(
        &self,
        signature: &MethodSignature,
        defaults: &BindingDefaults,
    ) -> BindingDescriptor {
        let flags = (defaults.flags | self.flags_set) - self.flags_clear;
        BindingDescriptor {
            signature: signature.clone(),
            library: self.library.clone(),
            entry_point: self
                .entry_point
                .clone()
                .unwrap_or_else(|| signature.name.clone()),
            calling_convention: self
                .calling_convention
                .unwrap_or(defaults.calling_convention),
            char_set: self.char_set.unwrap_or(defaults.char_set),
            flags,
        }
    }
}

/// Resolved binding of one native-bound method.
///
/// The signature is fixed at classification; the binding fields are public so
/// a filter hook can rewrite them before synthesis takes ownership.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingDescriptor {
    signature: MethodSignature,
    pub library: String,
    pub entry_point: String,
    pub calling_convention: CallingConvention,
    pub char_set: CharSet,
    pub flags: MarshalFlags,
}

impl BindingDescriptor {
    /// The interface method this descriptor binds.
    pub fn signature(&self) -> &MethodSignature {
        &self.signature
    }

    /// Method identity of the bound signature.
    pub fn signature_hash(&self) -> TypeHash {
        self.signature.signature_hash()
    }

    pub fn exact_spelling(&self) -> bool {
        self.flags.contains(MarshalFlags::EXACT_SPELLING)
    }

    pub fn preserve_signature(&self) -> bool {
        self.flags.contains(MarshalFlags::PRESERVE_SIGNATURE)
    }

    pub fn set_last_error(&self) -> bool {
        self.flags.contains(MarshalFlags::SET_LAST_ERROR)
    }

    pub fn best_fit_mapping(&self) -> bool {
        self.flags.contains(MarshalFlags::BEST_FIT_MAPPING)
    }

    pub fn throw_on_unmappable_char(&self) -> bool {
        self.flags.contains(MarshalFlags::THROW_ON_UNMAPPABLE_CHAR)
    }

    /// Set or clear a marshaling flag.
    pub fn set_flag(&mut self, flag: MarshalFlags, value: bool) {
        self.flags.set(flag, value);
    }

    /// Symbol names to try, in order, when resolving the entry point.
    ///
    /// Without exact spelling, ANSI bindings fall back to the `A` suffix and
    /// Unicode bindings try the `W` suffix first.
    pub fn symbol_candidates(&self) -> Vec<String> {
        let name = &self.entry_point;
        if self.exact_spelling() {
            return vec![name.clone()];
        }
        match self.char_set.effective() {
            CharSet::Unicode => vec![format!("{name}W"), name.clone()],
            _ => vec![name.clone(), format!("{name}A")],
        }
    }

    /// Check the descriptor still names a library and an entry point.
    pub fn validate(&self) -> Result<(), BindingError> {
        if self.library.trim().is_empty() {
            return Err(BindingError::EmptyLibrary {
                method: self.signature.to_string(),
            });
        }
        if self.entry_point.trim().is_empty() {
            return Err(BindingError::EmptyEntryPoint {
                method: self.signature.to_string(),
            });
        }
        Ok(())
    }
}

/// Method identity -> native-binding metadata.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BindingTable {
    entries: FxHashMap<TypeHash, NativeBinding>,
}

impl BindingTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a binding to a method, replacing any previous one.
    pub fn bind(&mut self, signature: &MethodSignature, binding: NativeBinding) {
        self.entries.insert(signature.signature_hash(), binding);
    }

    /// Builder form of [`bind`](Self::bind).
    pub fn with(mut self, signature: &MethodSignature, binding: NativeBinding) -> Self {
        self.bind(signature, binding);
        self
    }

    /// Get the binding attached to a method.
    pub fn get(&self, signature: &MethodSignature) -> Option<&NativeBinding> {
        self.entries.get(&signature.signature_hash())
    }

    /// Method identities that have a binding.
    pub fn keys(&self) -> impl Iterator<Item = TypeHash> + '_ {
        self.entries.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DataType;

    fn add_sig() -> MethodSignature {
        MethodSignature::new("Add", vec![DataType::INT32, DataType::INT32], DataType::INT32)
    }

    #[test]
    fn defaults_are_applied() {
        let d = NativeBinding::new("math").resolve_for(&add_sig(), &BindingDefaults::default());

        assert_eq!(d.library, "math");
        assert_eq!(d.entry_point, "Add");
        assert_eq!(d.calling_convention, CallingConvention::Platform);
        assert_eq!(d.char_set, CharSet::Platform);
        assert!(!d.exact_spelling());
        assert!(d.preserve_signature());
        assert!(!d.set_last_error());
        assert!(d.best_fit_mapping());
        assert!(!d.throw_on_unmappable_char());
    }

    #[test]
    fn explicit_fields_override_defaults() {
        let binding = NativeBinding::new("math")
            .entry_point("add_i32")
            .calling_convention(CallingConvention::StdCall)
            .char_set(CharSet::Unicode)
            .preserve_signature(false)
            .set_last_error(true);
        let d = binding.resolve_for(&add_sig(), &BindingDefaults::default());

        assert_eq!(d.entry_point, "add_i32");
        assert_eq!(d.calling_convention, CallingConvention::StdCall);
        assert_eq!(d.char_set, CharSet::Unicode);
        assert!(!d.preserve_signature());
        assert!(d.set_last_error());
        assert!(d.best_fit_mapping());
    }

    #[test]
    fn custom_defaults_fill_unset_fields_only() {
        let defaults = BindingDefaults::default()
            .with_calling_convention(CallingConvention::Cdecl)
            .with_flags(MarshalFlags::SET_LAST_ERROR);
        let d = NativeBinding::new("math")
            .best_fit_mapping(true)
            .resolve_for(&add_sig(), &defaults);

        assert_eq!(d.calling_convention, CallingConvention::Cdecl);
        assert!(d.set_last_error());
        assert!(d.best_fit_mapping());
        assert!(!d.preserve_signature());
    }

    #[test]
    fn last_flag_call_wins() {
        let d = NativeBinding::new("math")
            .set_last_error(true)
            .set_last_error(false)
            .resolve_for(&add_sig(), &BindingDefaults::default());
        assert!(!d.set_last_error());
    }

    #[test]
    fn symbol_candidates_follow_char_set() {
        let mut d = NativeBinding::new("user32")
            .entry_point("MessageBox")
            .char_set(CharSet::Unicode)
            .resolve_for(&add_sig(), &BindingDefaults::default());
        assert_eq!(d.symbol_candidates(), ["MessageBoxW", "MessageBox"]);

        d.char_set = CharSet::Ansi;
        assert_eq!(d.symbol_candidates(), ["MessageBox", "MessageBoxA"]);

        d.set_flag(MarshalFlags::EXACT_SPELLING, true);
        assert_eq!(d.symbol_candidates(), ["MessageBox"]);
    }

    #[test]
    fn validate_rejects_empty_names() {
        let mut d = NativeBinding::new("math").resolve_for(&add_sig(), &BindingDefaults::default());
        assert!(d.validate().is_ok());

        d.entry_point.clear();
        assert!(matches!(
            d.validate(),
            Err(BindingError::EmptyEntryPoint { .. })
        ));

        d.library = "  ".to_string();
        assert!(matches!(d.validate(), Err(BindingError::EmptyLibrary { .. })));
    }

    #[test]
    fn parse_conventions_and_char_sets() {
        assert_eq!("C".parse::<CallingConvention>().unwrap(), CallingConvention::Cdecl);
        assert_eq!(
            "StdCall".parse::<CallingConvention>().unwrap(),
            CallingConvention::StdCall
        );
        assert!("pascal".parse::<CallingConvention>().is_err());

        assert_eq!("utf-16".parse::<CharSet>().unwrap(), CharSet::Unicode);
        assert!("ebcdic".parse::<CharSet>().is_err());
    }

    #[test]
    fn table_keys_by_overload() {
        let narrow = MethodSignature::new("Abs", vec![DataType::INT32], DataType::INT32);
        let wide = MethodSignature::new("Abs", vec![DataType::INT64], DataType::INT64);
        let table = BindingTable::new().with(&wide, NativeBinding::new("c").entry_point("labs"));

        assert!(table.get(&narrow).is_none());
        assert_eq!(
            table.get(&wide).and_then(|b| b.entry_point.as_deref()),
            Some("labs")
        );
        assert_eq!(table.len(), 1);
    }
}
