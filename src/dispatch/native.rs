//! Native bindings - host functions behind `PyCFunction` trampolines

use super::CallingConvention;
use crate::errors::{check_ptr, ErrorKind, PyError, PyResult};
use crate::logging::{log_ffi_error, log_native_entry};
use crate::object::Object;
use crate::views::{Callable, Dict, Tuple};
use pyo3::ffi;
use std::ffi::CString;
use std::os::raw::{c_char, c_void};
use std::panic::{self, AssertUnwindSafe};
use std::ptr;

pub type NoArgsFn = fn(&Object) -> PyResult<Object>;
pub type ArgsFn = fn(&Object, &Tuple) -> PyResult<Object>;
pub type KwArgsFn = fn(&Object, &Tuple, Option<&Dict>) -> PyResult<Object>;

/// Host function plus the convention it is called with.
///
/// Returning a null handle is reported to the caller as a `RuntimeError`.
#[derive(Clone, Copy)]
pub enum NativeFunction {
    NoArgs(NoArgsFn),
    Positional(ArgsFn),
    Keywords(KwArgsFn),
}

impl NativeFunction {
    pub const fn convention(&self) -> CallingConvention {
        match self {
            Self::NoArgs(_) => CallingConvention::NoArgs,
            Self::Positional(_) => CallingConvention::Positional,
            Self::Keywords(_) => CallingConvention::Keywords,
        }
    }

    fn invoke(&self, context: &Object, args: Option<&Tuple>, kwargs: Option<&Dict>) -> PyResult<Object> {
        let empty;
        let args = match args {
            Some(args) => args,
            None => {
                empty = Tuple::empty()?;
                &empty
            }
        };
        match self {
            Self::NoArgs(f) => f(context),
            Self::Positional(f) => f(context, args),
            Self::Keywords(f) => f(context, args, kwargs),
        }
    }
}

impl std::fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "NativeFunction({:?})", self.convention())
    }
}

const BINDING_CAPSULE: &[u8] = b"pyhandle.binding\0";

#[inline]
fn capsule_name() -> *const c_char {
    BINDING_CAPSULE.as_ptr().cast()
}

/// Everything a trampoline needs, pinned in a box owned by a capsule
struct Binding {
    def: ffi::PyMethodDef,
    name: CString,
    function: NativeFunction,
    context: Object,
}

unsafe extern "C" fn destroy_binding(capsule: *mut ffi::PyObject) {
    let raw = ffi::PyCapsule_GetPointer(capsule, capsule_name()) as *mut Binding;
    if raw.is_null() {
        ffi::PyErr_Clear();
        return;
    }
    drop(Box::from_raw(raw));
}

unsafe extern "C" fn call_without_keywords(
    slf: *mut ffi::PyObject,
    args: *mut ffi::PyObject,
) -> *mut ffi::PyObject {
    trampoline(slf, args, ptr::null_mut())
}

unsafe extern "C" fn call_with_keywords(
    slf: *mut ffi::PyObject,
    args: *mut ffi::PyObject,
    kwargs: *mut ffi::PyObject,
) -> *mut ffi::PyObject {
    trampoline(slf, args, kwargs)
}

/// Run the host function; errors and panics become raised exceptions
unsafe fn trampoline(
    slf: *mut ffi::PyObject,
    args: *mut ffi::PyObject,
    kwargs: *mut ffi::PyObject,
) -> *mut ffi::PyObject {
    let raw = ffi::PyCapsule_GetPointer(slf, capsule_name()) as *const Binding;
    if raw.is_null() {
        return ptr::null_mut();
    }
    let binding = &*raw;
    let name = binding.name.to_string_lossy();
    log_native_entry(&name, binding.function.convention());

    let args = (!args.is_null()).then(|| Tuple::from_object_unchecked(Object::from_borrowed_ptr(args)));
    let kwargs = (!kwargs.is_null()).then(|| Dict::from_object_unchecked(Object::from_borrowed_ptr(kwargs)));

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        binding
            .function
            .invoke(&binding.context, args.as_ref(), kwargs.as_ref())
    }));

    let error = match outcome {
        Ok(Ok(result)) if result.is_null() => PyError::new(ErrorKind::NullHandle)
            .with_context("native function returned a null handle"),
        Ok(Ok(result)) => return result.into_ptr(),
        Ok(Err(error)) => error,
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            PyError::new(ErrorKind::Panic(message))
        }
    };

    log_ffi_error(&name, &error.to_string());
    error.restore();
    ptr::null_mut()
}

impl Callable {
    /// Expose `function` as an interpreter callable named `name`.
    ///
    /// `context` is handed to every invocation as its first argument;
    /// `None` passes the `None` singleton.
    pub fn from_native(name: &str, function: NativeFunction, context: Option<&Object>) -> PyResult<Self> {
        let name = CString::new(name)?;
        let convention = function.convention();
        let ml_meth = match convention {
            CallingConvention::NoArgs | CallingConvention::Positional => ffi::PyMethodDefPointer {
                PyCFunction: call_without_keywords,
            },
            CallingConvention::Keywords => ffi::PyMethodDefPointer {
                PyCFunctionWithKeywords: call_with_keywords,
            },
        };

        let binding = Box::new(Binding {
            def: ffi::PyMethodDef {
                ml_name: name.as_ptr(),
                ml_meth,
                ml_flags: convention.flags(),
                ml_doc: ptr::null(),
            },
            name,
            function,
            context: context.cloned().unwrap_or_else(Object::none),
        });

        unsafe {
            let raw = Box::into_raw(binding);
            let capsule = ffi::PyCapsule_New(raw as *mut c_void, capsule_name(), Some(destroy_binding));
            let capsule = match check_ptr(capsule) {
                Ok(capsule) => Object::from_owned_ptr(capsule),
                Err(err) => {
                    drop(Box::from_raw(raw));
                    return Err(err);
                }
            };

            // The function object holds its own reference to the capsule
            let function = ffi::PyCFunction_NewEx(ptr::addr_of_mut!((*raw).def), capsule.as_ptr(), ptr::null_mut());
            Self::from_owned_or_err(function)
        }
    }

    pub fn no_args(name: &str, function: NoArgsFn, context: Option<&Object>) -> PyResult<Self> {
        Self::from_native(name, NativeFunction::NoArgs(function), context)
    }

    pub fn positional(name: &str, function: ArgsFn, context: Option<&Object>) -> PyResult<Self> {
        Self::from_native(name, NativeFunction::Positional(function), context)
    }

    pub fn keywords(name: &str, function: KwArgsFn, context: Option<&Object>) -> PyResult<Self> {
        Self::from_native(name, NativeFunction::Keywords(function), context)
    }
}
