//! Call variants on `Callable`

use super::format::{build_args, FormatArg};
use crate::errors::PyResult;
use crate::logging::{log_ffi_call, log_ffi_return};
use crate::object::Object;
use crate::views::{Callable, Dict, Tuple};
use pyo3::ffi;
use std::ptr;

impl Callable {
    /// `f()`
    pub fn call0(&self) -> PyResult<Object> {
        self.call_object(None)
    }

    /// `f(arg)`
    pub fn call1(&self, arg: &Object) -> PyResult<Object> {
        let args = Tuple::from_items(std::slice::from_ref(arg))?;
        self.call_object(Some(&args))
    }

    /// `f(*args, **kwargs)`; missing args means an empty tuple
    pub fn call(&self, args: Option<&Tuple>, kwargs: Option<&Dict>) -> PyResult<Object> {
        let ptr = self.checked_ptr()?;
        let empty;
        let args = match args {
            Some(args) => args,
            None => {
                empty = Tuple::empty()?;
                &empty
            }
        };
        let kwargs = kwargs.map_or(ptr::null_mut(), |k| k.as_ptr());

        self.trace_call(args.len());
        let result = unsafe { Object::from_owned_or_err(ffi::PyObject_Call(ptr, args.as_ptr(), kwargs)) };
        self.trace_return(&result);
        result
    }

    /// `f(*args)`, or `f()` for `None`
    pub fn call_object(&self, args: Option<&Tuple>) -> PyResult<Object> {
        let ptr = self.checked_ptr()?;
        let args_ptr = args.map_or(ptr::null_mut(), |a| a.as_ptr());

        self.trace_call(args.map_or(0, Tuple::len));
        let result = unsafe { Object::from_owned_or_err(ffi::PyObject_CallObject(ptr, args_ptr)) };
        self.trace_return(&result);
        result
    }

    /// Positional call from an ordered list of handles
    pub fn call_args(&self, args: &[Object]) -> PyResult<Object> {
        if args.is_empty() {
            return self.call_object(None);
        }
        let args = Tuple::from_items(args)?;
        self.call_object(Some(&args))
    }

    /// Positional call with arguments built from a format string.
    ///
    /// A format producing a tuple supplies the whole argument tuple; any
    /// other single value becomes the only argument.
    pub fn call_format(&self, format: &str, args: &[FormatArg<'_>]) -> PyResult<Object> {
        let args = build_args(format, args)?;
        self.call_object(args.as_ref())
    }

    fn trace_call(&self, arg_count: usize) {
        if tracing::enabled!(tracing::Level::DEBUG) {
            log_ffi_call(&self.trace_name(), arg_count);
        }
    }

    fn trace_return(&self, result: &PyResult<Object>) {
        if result.is_ok() && tracing::enabled!(tracing::Level::TRACE) {
            log_ffi_return(&self.trace_name());
        }
    }

    /// Name for call logs. Only plain and native functions are asked for
    /// `__name__` (a fixed slot on those types); anything else could run
    /// user attribute hooks, so it is named by its type.
    pub(super) fn trace_name(&self) -> String {
        let ptr = self.as_ptr();
        let plain_function = !ptr.is_null()
            && unsafe { ffi::PyFunction_Check(ptr) != 0 || ffi::PyCFunction_CheckExact(ptr) != 0 };
        if plain_function {
            if let Some(name) = self.get_attr("__name__").ok().and_then(|n| n.str().ok()) {
                return name;
            }
        }
        self.type_name().unwrap_or_else(|| "<null>".to_string())
    }

    /// `__name__` or `__qualname__`, falling back to the type name.
    ///
    /// Attribute lookups may run user code on arbitrary callables.
    pub fn callable_name(&self) -> String {
        ["__name__", "__qualname__"]
            .iter()
            .find_map(|attr| {
                let value = self.get_attr(*attr).ok()?;
                value.str().ok()
            })
            .or_else(|| self.type_name())
            .unwrap_or_else(|| "<null>".to_string())
    }
}
