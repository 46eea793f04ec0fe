//! Dynamic-library linker built on `libloading` and `libffi`.

use std::cell::Cell;
use std::ffi::c_void;
use std::sync::{Arc, Mutex};

use libffi::middle::{Arg, Cif, CodePtr, Type};
use libloading::Library;
use nativeshim_core::{
    BindingDescriptor, CallingConvention, DataType, Dynamic, NativeError, NativeLinker,
    PrimitiveKind,
};
use rustc_hash::FxHashMap;
use tracing::{debug, trace};

use crate::marshal::{NativeArg, marshal_args};

thread_local! {
    static LAST_ERROR: Cell<Option<i32>> = const { Cell::new(None) };
}

/// Linker that loads shared libraries on first use and calls into them
/// through a libffi call interface built from the method signature.
///
/// Loaded libraries and resolved entry points are cached per linker and stay
/// loaded for the linker's lifetime.
#[derive(Debug, Default)]
pub struct DylibLinker {
    libraries: Mutex<FxHashMap<String, Arc<Library>>>,
    symbols: Mutex<FxHashMap<(String, String), Option<usize>>>,
}

impl DylibLinker {
    pub fn new() -> Self {
        Self::default()
    }

    fn library(&self, name: &str) -> Result<Arc<Library>, NativeError> {
        let mut libraries = self
            .libraries
            .lock()
            .map_err(|_| NativeError::other("library cache poisoned"))?;
        if let Some(lib) = libraries.get(name) {
            return Ok(Arc::clone(lib));
        }

        let mut last_err = None;
        for candidate in library_candidates(name) {
            match unsafe { Library::new(&candidate) } {
                Ok(lib) => {
                    debug!(library = name, path = %candidate, "loaded native library");
                    let lib = Arc::new(lib);
                    libraries.insert(name.to_string(), Arc::clone(&lib));
                    return Ok(lib);
                }
                Err(err) => last_err = Some(err),
            }
        }

        Err(NativeError::LibraryLoad {
            library: name.to_string(),
            message: last_err
                .map(|e| e.to_string())
                .unwrap_or_else(|| "no candidate paths".to_string()),
        })
    }

    fn resolve(&self, binding: &BindingDescriptor) -> Result<*const c_void, NativeError> {
        let candidates = binding.symbol_candidates();
        let found = self.lookup_candidates(&binding.library, &candidates, |name| {
            let lib = self.library(&binding.library)?;
            let symbol: Result<libloading::Symbol<'_, *const c_void>, _> =
                unsafe { lib.get(name.as_bytes()) };
            Ok(symbol.ok().map(|symbol| *symbol as usize))
        })?;

        match found {
            Some(addr) => Ok(addr as *const c_void),
            None => Err(NativeError::EntryPointNotFound {
                library: binding.library.clone(),
                candidates,
            }),
        }
    }

    /// Return the address of the first candidate `library` exports.
    ///
    /// Each candidate is cached under its own name, misses included, so the
    /// lookup order of every binding is honored no matter which bindings
    /// resolved before it.
    fn lookup_candidates(
        &self,
        library: &str,
        candidates: &[String],
        mut lookup: impl FnMut(&str) -> Result<Option<usize>, NativeError>,
    ) -> Result<Option<usize>, NativeError> {
        for name in candidates {
            let key = (library.to_string(), name.clone());
            let cached = self
                .symbols
                .lock()
                .map_err(|_| NativeError::other("symbol cache poisoned"))?
                .get(&key)
                .copied();
            let addr = match cached {
                Some(addr) => addr,
                None => {
                    let addr = lookup(name)?;
                    if addr.is_some() {
                        trace!(library, symbol = %name, "resolved entry point");
                    }
                    self.symbols
                        .lock()
                        .map_err(|_| NativeError::other("symbol cache poisoned"))?
                        .insert(key, addr);
                    addr
                }
            };
            if addr.is_some() {
                return Ok(addr);
            }
        }
        Ok(None)
    }
}

impl NativeLinker for DylibLinker {
    fn invoke(&self, binding: &BindingDescriptor, args: &[Dynamic]) -> Result<Dynamic, NativeError> {
        LAST_ERROR.with(|cell| cell.set(None));
        check_convention(binding.calling_convention)?;
        let func = self.resolve(binding)?;
        let sig = binding.signature();

        let marshaled = marshal_args(binding, args)?;
        let arg_types = sig
            .params
            .iter()
            .map(|ty| ffi_type_for_arg(*ty))
            .collect::<Result<Vec<_>, _>>()?;
        let ret_ty = if binding.preserve_signature() {
            sig.return_type
        } else {
            DataType::INT32
        };
        let cif = Cif::new(arg_types, ffi_type_for_return(ret_ty)?);
        let ffi_args: Vec<Arg> = marshaled.values.iter().map(native_arg_ref).collect();
        let code = CodePtr::from_ptr(func as *mut c_void);

        if binding.set_last_error() {
            clear_os_error();
        }
        let result = unsafe { call(&cif, code, ret_ty, &ffi_args) };
        if binding.set_last_error() {
            let code = std::io::Error::last_os_error()
                .raw_os_error()
                .filter(|&code| code != 0);
            LAST_ERROR.with(|cell| cell.set(code));
        }
        drop(marshaled);

        if binding.preserve_signature() {
            return Ok(result);
        }
        let status = result.as_int().unwrap_or_default() as i32;
        if status < 0 {
            return Err(NativeError::FailureStatus {
                entry_point: binding.entry_point.clone(),
                code: status,
            });
        }
        if sig.return_type.is_void() {
            Ok(Dynamic::Void)
        } else {
            Ok(Dynamic::Int(status as i64))
        }
    }

    fn last_error(&self) -> Option<i32> {
        LAST_ERROR.with(|cell| cell.get())
    }
}

/// Reset the calling thread's OS error so a capture after the call only
/// sees what the call itself set.
#[cfg(any(target_os = "linux", target_os = "android", target_os = "emscripten"))]
fn clear_os_error() {
    unsafe { *libc::__errno_location() = 0 };
}

#[cfg(any(target_vendor = "apple", target_os = "freebsd", target_os = "dragonfly"))]
fn clear_os_error() {
    unsafe { *libc::__error() = 0 };
}

#[cfg(any(target_os = "openbsd", target_os = "netbsd"))]
fn clear_os_error() {
    unsafe { *libc::__errno() = 0 };
}

#[cfg(windows)]
fn clear_os_error() {
    unsafe { windows_sys::Win32::Foundation::SetLastError(0) };
}

#[cfg(not(any(
    windows,
    target_os = "linux",
    target_os = "android",
    target_os = "emscripten",
    target_vendor = "apple",
    target_os = "freebsd",
    target_os = "dragonfly",
    target_os = "openbsd",
    target_os = "netbsd"
)))]
fn clear_os_error() {}

/// File names to try for a library name.
///
/// The name as given first (absolute paths, sonames like `libc.so.6`), then
/// the platform-decorated form (`libmath.so`, `math.dll`, `libmath.dylib`).
fn library_candidates(name: &str) -> Vec<String> {
    let mut candidates = vec![name.to_string()];
    let decorated = libloading::library_filename(name)
        .to_string_lossy()
        .into_owned();
    if decorated != name {
        candidates.push(decorated);
    }
    candidates
}

/// Non-default conventions only exist on 32-bit Windows, where libffi would
/// need an explicit ABI; everywhere else they collapse to the C convention.
fn check_convention(convention: CallingConvention) -> Result<(), NativeError> {
    match convention {
        CallingConvention::Platform | CallingConvention::Cdecl => Ok(()),
        other if cfg!(all(windows, target_arch = "x86")) => {
            Err(NativeError::UnsupportedConvention(other))
        }
        _ => Ok(()),
    }
}

fn ffi_type_for_arg(ty: DataType) -> Result<Type, NativeError> {
    match ty {
        DataType::Primitive(PrimitiveKind::Void) => Err(NativeError::UnsupportedType {
            ty,
            position: "parameter",
        }),
        DataType::Primitive(kind) => Ok(primitive_type(kind)),
        DataType::Pointer | DataType::String => Ok(Type::pointer()),
    }
}

fn ffi_type_for_return(ty: DataType) -> Result<Type, NativeError> {
    match ty {
        DataType::Primitive(kind) => Ok(primitive_type(kind)),
        DataType::Pointer => Ok(Type::pointer()),
        DataType::String => Err(NativeError::UnsupportedType {
            ty,
            position: "return type",
        }),
    }
}

fn primitive_type(kind: PrimitiveKind) -> Type {
    match kind {
        PrimitiveKind::Void => Type::void(),
        PrimitiveKind::Bool => Type::u8(),
        PrimitiveKind::Int8 => Type::i8(),
        PrimitiveKind::Int16 => Type::i16(),
        PrimitiveKind::Int32 => Type::i32(),
        PrimitiveKind::Int64 => Type::i64(),
        PrimitiveKind::Uint8 => Type::u8(),
        PrimitiveKind::Uint16 => Type::u16(),
        PrimitiveKind::Uint32 => Type::u32(),
        PrimitiveKind::Uint64 => Type::u64(),
        PrimitiveKind::Float => Type::f32(),
        PrimitiveKind::Double => Type::f64(),
    }
}

fn native_arg_ref(value: &NativeArg) -> Arg {
    match value {
        NativeArg::I8(v) => Arg::new(v),
        NativeArg::U8(v) => Arg::new(v),
        NativeArg::I16(v) => Arg::new(v),
        NativeArg::U16(v) => Arg::new(v),
        NativeArg::I32(v) => Arg::new(v),
        NativeArg::U32(v) => Arg::new(v),
        NativeArg::I64(v) => Arg::new(v),
        NativeArg::U64(v) => Arg::new(v),
        NativeArg::F32(v) => Arg::new(v),
        NativeArg::F64(v) => Arg::new(v),
        NativeArg::Ptr(v) => Arg::new(v),
    }
}

/// Perform the call and convert the return value.
///
/// Integer returns narrower than a register are widened by libffi, so they
/// are read back as a full `u64` slot and truncated.
unsafe fn call(cif: &Cif, code: CodePtr, ret_ty: DataType, args: &[Arg]) -> Dynamic {
    unsafe {
        match ret_ty {
            DataType::Primitive(PrimitiveKind::Void) => {
                let _: () = cif.call(code, args);
                Dynamic::Void
            }
            DataType::Primitive(PrimitiveKind::Bool) => {
                Dynamic::Bool(cif.call::<u64>(code, args) as u8 != 0)
            }
            DataType::Primitive(PrimitiveKind::Int8) => {
                Dynamic::Int(cif.call::<u64>(code, args) as i8 as i64)
            }
            DataType::Primitive(PrimitiveKind::Int16) => {
                Dynamic::Int(cif.call::<u64>(code, args) as i16 as i64)
            }
            DataType::Primitive(PrimitiveKind::Int32) => {
                Dynamic::Int(cif.call::<u64>(code, args) as i32 as i64)
            }
            DataType::Primitive(PrimitiveKind::Int64) => Dynamic::Int(cif.call::<i64>(code, args)),
            DataType::Primitive(PrimitiveKind::Uint8) => {
                Dynamic::Int(cif.call::<u64>(code, args) as u8 as i64)
            }
            DataType::Primitive(PrimitiveKind::Uint16) => {
                Dynamic::Int(cif.call::<u64>(code, args) as u16 as i64)
            }
            DataType::Primitive(PrimitiveKind::Uint32) => {
                Dynamic::Int(cif.call::<u64>(code, args) as u32 as i64)
            }
            DataType::Primitive(PrimitiveKind::Uint64) => {
                Dynamic::Int(cif.call::<u64>(code, args) as i64)
            }
            DataType::Primitive(PrimitiveKind::Float) => {
                Dynamic::Float(cif.call::<f32>(code, args) as f64)
            }
            DataType::Primitive(PrimitiveKind::Double) => {
                Dynamic::Float(cif.call::<f64>(code, args))
            }
            DataType::Pointer | DataType::String => {
                Dynamic::Pointer(cif.call::<*mut c_void>(code, args) as usize)
            }
        }
    }
}
