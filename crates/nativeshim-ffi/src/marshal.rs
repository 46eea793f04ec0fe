//! Argument marshaling for native calls.
//!
//! Converts [`Dynamic`] arguments into owned native representations according
//! to the declared parameter types and the binding's char-set policy. The
//! owned buffers must outlive the call, so they are kept together in
//! [`MarshaledArgs`].

use std::ffi::{CString, c_void};

use nativeshim_core::{BindingDescriptor, CharSet, DataType, Dynamic, NativeError, PrimitiveKind};

/// A single argument in its native representation.
#[derive(Debug)]
pub enum NativeArg {
    I8(i8),
    U8(u8),
    I16(i16),
    U16(u16),
    I32(i32),
    U32(u32),
    I64(i64),
    U64(u64),
    F32(f32),
    F64(f64),
    Ptr(*mut c_void),
}

/// Marshaled arguments plus the string buffers their pointers refer to.
#[derive(Debug, Default)]
pub struct MarshaledArgs {
    pub values: Vec<NativeArg>,
    ansi: Vec<CString>,
    wide: Vec<Vec<u16>>,
}

impl MarshaledArgs {
    /// Number of string buffers held alive for the call.
    pub fn buffer_count(&self) -> usize {
        self.ansi.len() + self.wide.len()
    }
}

/// Marshal `args` for a call to `binding`.
pub fn marshal_args(
    binding: &BindingDescriptor,
    args: &[Dynamic],
) -> Result<MarshaledArgs, NativeError> {
    let params = &binding.signature().params;
    if params.len() != args.len() {
        return Err(NativeError::ArgumentCount {
            entry_point: binding.entry_point.clone(),
            expected: params.len(),
            actual: args.len(),
        });
    }

    let mut out = MarshaledArgs::default();
    for (index, (ty, value)) in params.iter().zip(args).enumerate() {
        match (ty, value) {
            (DataType::String, Dynamic::String(s)) => match binding.char_set.effective() {
                CharSet::Unicode => {
                    let buf = encode_wide(s, index)?;
                    out.values.push(NativeArg::Ptr(buf.as_ptr() as *mut c_void));
                    out.wide.push(buf);
                }
                _ => {
                    let buf = encode_ansi(s, index, binding)?;
                    out.values.push(NativeArg::Ptr(buf.as_ptr() as *mut c_void));
                    out.ansi.push(buf);
                }
            },
            (DataType::String | DataType::Pointer, Dynamic::Pointer(p)) => {
                out.values.push(NativeArg::Ptr(*p as *mut c_void));
            }
            (DataType::Primitive(kind), value) => out.values.push(primitive_arg(index, *kind, value)?),
            (expected, actual) => {
                return Err(NativeError::ArgumentType {
                    index,
                    expected: *expected,
                    actual: actual.type_name(),
                });
            }
        }
    }
    Ok(out)
}

fn primitive_arg(index: usize, kind: PrimitiveKind, value: &Dynamic) -> Result<NativeArg, NativeError> {
    let mismatch = || NativeError::ArgumentType {
        index,
        expected: DataType::Primitive(kind),
        actual: value.type_name(),
    };
    let arg = match (kind, value) {
        (PrimitiveKind::Bool, Dynamic::Bool(v)) => NativeArg::U8(u8::from(*v)),
        (PrimitiveKind::Int8, Dynamic::Int(v)) => NativeArg::I8(*v as i8),
        (PrimitiveKind::Uint8, Dynamic::Int(v)) => NativeArg::U8(*v as u8),
        (PrimitiveKind::Int16, Dynamic::Int(v)) => NativeArg::I16(*v as i16),
        (PrimitiveKind::Uint16, Dynamic::Int(v)) => NativeArg::U16(*v as u16),
        (PrimitiveKind::Int32, Dynamic::Int(v)) => NativeArg::I32(*v as i32),
        (PrimitiveKind::Uint32, Dynamic::Int(v)) => NativeArg::U32(*v as u32),
        (PrimitiveKind::Int64, Dynamic::Int(v)) => NativeArg::I64(*v),
        (PrimitiveKind::Uint64, Dynamic::Int(v)) => NativeArg::U64(*v as u64),
        (PrimitiveKind::Float, Dynamic::Float(v)) => NativeArg::F32(*v as f32),
        (PrimitiveKind::Double, Dynamic::Float(v)) => NativeArg::F64(*v),
        (PrimitiveKind::Void, _) => {
            return Err(NativeError::UnsupportedType {
                ty: DataType::VOID,
                position: "parameter",
            });
        }
        _ => return Err(mismatch()),
    };
    Ok(arg)
}

/// Encode `s` as a NUL-terminated single-byte string.
///
/// The portable ANSI code page is 7-bit ASCII. Other characters are
/// best-fit mapped when the binding allows it, rejected when the binding
/// throws on unmappable characters, and replaced with `?` otherwise.
pub fn encode_ansi(s: &str, index: usize, binding: &BindingDescriptor) -> Result<CString, NativeError> {
    let mut bytes = Vec::with_capacity(s.len());
    for ch in s.chars() {
        if ch == '\0' {
            return Err(NativeError::InteriorNul { index });
        }
        if ch.is_ascii() {
            bytes.push(ch as u8);
            continue;
        }
        if binding.best_fit_mapping() {
            if let Some(mapped) = best_fit(ch) {
                bytes.push(mapped);
                continue;
            }
        }
        if binding.throw_on_unmappable_char() {
            return Err(NativeError::UnmappableChar { index, ch });
        }
        bytes.push(b'?');
    }
    CString::new(bytes).map_err(|_| NativeError::InteriorNul { index })
}

/// Encode `s` as a NUL-terminated UTF-16 string.
pub fn encode_wide(s: &str, index: usize) -> Result<Vec<u16>, NativeError> {
    if s.contains('\0') {
        return Err(NativeError::InteriorNul { index });
    }
    Ok(s.encode_utf16().chain(std::iter::once(0)).collect())
}

/// Closest ASCII letter for common accented Latin-1 characters.
fn best_fit(ch: char) -> Option<u8> {
    let mapped = match ch {
        'À'..='Å' => b'A',
        'à'..='å' => b'a',
        'Ç' => b'C',
        'ç' => b'c',
        'È'..='Ë' => b'E',
        'è'..='ë' => b'e',
        'Ì'..='Ï' => b'I',
        'ì'..='ï' => b'i',
        'Ñ' => b'N',
        'ñ' => b'n',
        'Ò'..='Ö' | 'Ø' => b'O',
        'ò'..='ö' | 'ø' => b'o',
        'Ù'..='Ü' => b'U',
        'ù'..='ü' => b'u',
        'Ý' => b'Y',
        'ý' | 'ÿ' => b'y',
        '\u{a0}' => b' ',
        _ => return None,
    };
    Some(mapped)
}
