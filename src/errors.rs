//! Error types shared by every fallible handle operation
//!
//! Design: one result type for the whole crate
//! - Foreign exceptions are fetched (and cleared) when a C-API call signals failure
//! - Host-side misuse (bad index, wrong type, unfilled slot) gets its own kind
//! - Errors hold only strings, so they can outlive the interpreter lock
//! - `restore` raises an error back into the interpreter at a native boundary

use pyo3::ffi;
use std::ffi::{CStr, CString};
use std::fmt;
use std::os::raw::c_int;
use std::ptr;
use tracing::debug;

pub type PyResult<T> = Result<T, PyError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// Exception raised inside the interpreter
    Foreign { exception: String, message: String },
    /// Operation attempted on a released or never-set handle
    NullHandle,
    OutOfRange { index: usize, len: usize },
    TypeMismatch { expected: String, found: String },
    UninitializedSlot { index: usize, len: usize },
    NulByte { position: usize },
    Encoding { position: usize },
    Format { reason: String, position: usize },
    AlreadyInitialized,
    NotInitialized,
    ExecutionFailed,
    Config(String),
    Panic(String),
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Foreign { exception, message } => {
                if message.is_empty() {
                    write!(f, "{}", exception)
                } else {
                    write!(f, "{}: {}", exception, message)
                }
            }
            Self::NullHandle => write!(f, "Operation on a null handle"),
            Self::OutOfRange { index, len } => {
                write!(f, "Index {} out of range for length {}", index, len)
            }
            Self::TypeMismatch { expected, found } => {
                write!(f, "Type mismatch: expected {}, found {}", expected, found)
            }
            Self::UninitializedSlot { index, len } => {
                write!(f, "Slot {} of {} was never initialized", index, len)
            }
            Self::NulByte { position } => {
                write!(f, "Interior NUL byte at position {}", position)
            }
            Self::Encoding { position } => {
                write!(f, "Locale encoding failed at position {}", position)
            }
            Self::Format { reason, position } => {
                write!(f, "Format error at {}: {}", position, reason)
            }
            Self::AlreadyInitialized => write!(f, "Interpreter already initialized"),
            Self::NotInitialized => write!(f, "Interpreter not initialized"),
            Self::ExecutionFailed => write!(f, "Source execution raised an exception"),
            Self::Config(reason) => write!(f, "Configuration error: {}", reason),
            Self::Panic(message) => write!(f, "Native function panicked: {}", message),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PyError {
    pub kind: ErrorKind,
    pub context: Vec<String>,
}

impl PyError {
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            context: Vec::new(),
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context.push(context.into());
        self
    }

    pub fn foreign(exception: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Foreign {
            exception: exception.into(),
            message: message.into(),
        })
    }

    pub fn type_mismatch(expected: impl Into<String>, found: impl Into<String>) -> Self {
        Self::new(ErrorKind::TypeMismatch {
            expected: expected.into(),
            found: found.into(),
        })
    }

    pub fn out_of_range(index: usize, len: usize) -> Self {
        Self::new(ErrorKind::OutOfRange { index, len })
    }

    pub fn format(reason: impl Into<String>, position: usize) -> Self {
        Self::new(ErrorKind::Format {
            reason: reason.into(),
            position,
        })
    }

    /// Exception class name for foreign errors
    pub fn exception(&self) -> Option<&str> {
        match &self.kind {
            ErrorKind::Foreign { exception, .. } => Some(exception.as_str()),
            _ => None,
        }
    }

    pub fn is_foreign(&self, exception: &str) -> bool {
        self.exception() == Some(exception)
    }

    /// True when the interpreter's error indicator is set.
    ///
    /// Requires the interpreter lock.
    pub fn occurred() -> bool {
        unsafe { !ffi::PyErr_Occurred().is_null() }
    }

    /// Take the pending interpreter exception, clearing the indicator.
    ///
    /// Callers use this right after a C-API call reported failure. If no
    /// exception is pending a `SystemError` is reported instead, matching
    /// what the interpreter itself does for a bare error return.
    pub fn fetch() -> Self {
        unsafe {
            let mut ptype = ptr::null_mut();
            let mut pvalue = ptr::null_mut();
            let mut ptrace = ptr::null_mut();
            ffi::PyErr_Fetch(&mut ptype, &mut pvalue, &mut ptrace);

            if ptype.is_null() {
                return Self::foreign("SystemError", "error return without exception set");
            }

            ffi::PyErr_NormalizeException(&mut ptype, &mut pvalue, &mut ptrace);

            let exception = exception_name(ptype);
            let message = if pvalue.is_null() {
                String::new()
            } else {
                display_string(pvalue)
            };

            ffi::Py_XDECREF(ptype);
            ffi::Py_XDECREF(pvalue);
            ffi::Py_XDECREF(ptrace);

            debug!(
                event = "foreign_exception",
                exception = %exception,
                message = %message,
                "Fetched interpreter exception"
            );

            Self::foreign(exception, message)
        }
    }

    /// Raise this error inside the interpreter.
    ///
    /// Foreign errors are re-raised as the builtin of the same name when
    /// one is known, otherwise as `RuntimeError`.
    pub fn restore(&self) {
        let message = match &self.kind {
            ErrorKind::Foreign { message, .. } => message.clone(),
            other => other.to_string(),
        };
        let message = CString::new(message.replace('\0', "\\0"))
            .unwrap_or_default();

        unsafe {
            ffi::PyErr_SetString(self.exception_type(), message.as_ptr());
        }
    }

    unsafe fn exception_type(&self) -> *mut ffi::PyObject {
        match &self.kind {
            ErrorKind::Foreign { exception, .. } => builtin_exception(exception),
            ErrorKind::OutOfRange { .. } => ffi::PyExc_IndexError,
            ErrorKind::TypeMismatch { .. } => ffi::PyExc_TypeError,
            ErrorKind::NulByte { .. } | ErrorKind::Format { .. } => ffi::PyExc_ValueError,
            ErrorKind::Encoding { .. } => ffi::PyExc_UnicodeError,
            ErrorKind::NullHandle
            | ErrorKind::UninitializedSlot { .. }
            | ErrorKind::AlreadyInitialized
            | ErrorKind::NotInitialized
            | ErrorKind::ExecutionFailed
            | ErrorKind::Config(_)
            | ErrorKind::Panic(_) => ffi::PyExc_RuntimeError,
        }
    }
}

impl fmt::Display for PyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        for context in &self.context {
            write!(f, "\n  while: {}", context)?;
        }
        Ok(())
    }
}

impl std::error::Error for PyError {}

impl From<ErrorKind> for PyError {
    fn from(kind: ErrorKind) -> Self {
        Self::new(kind)
    }
}

impl From<std::ffi::NulError> for PyError {
    fn from(err: std::ffi::NulError) -> Self {
        Self::new(ErrorKind::NulByte {
            position: err.nul_position(),
        })
    }
}

/// Adopt a new reference returned by the C API or fetch the pending error.
#[inline]
pub(crate) fn check_ptr(ptr: *mut ffi::PyObject) -> PyResult<*mut ffi::PyObject> {
    if ptr.is_null() {
        Err(PyError::fetch())
    } else {
        Ok(ptr)
    }
}

/// Map a `0 / -1` status return.
#[inline]
pub(crate) fn check_status(status: c_int) -> PyResult<()> {
    if status < 0 {
        Err(PyError::fetch())
    } else {
        Ok(())
    }
}

/// Map a `1 / 0 / -1` predicate return.
#[inline]
pub(crate) fn check_bool(status: c_int) -> PyResult<bool> {
    if status < 0 {
        Err(PyError::fetch())
    } else {
        Ok(status != 0)
    }
}

/// Read an optional NUL-terminated C string owned by the interpreter.
pub(crate) unsafe fn c_str_lossy(raw: *const std::os::raw::c_char) -> Option<String> {
    if raw.is_null() {
        None
    } else {
        Some(CStr::from_ptr(raw).to_string_lossy().into_owned())
    }
}

unsafe fn exception_name(ptype: *mut ffi::PyObject) -> String {
    let tp = ptype as *mut ffi::PyTypeObject;
    let full = c_str_lossy((*tp).tp_name).unwrap_or_else(|| "Exception".to_string());
    match full.rsplit_once('.') {
        Some((_, short)) => short.to_string(),
        None => full,
    }
}

/// `str(obj)` without raising; any secondary failure is swallowed.
unsafe fn display_string(obj: *mut ffi::PyObject) -> String {
    let text = ffi::PyObject_Str(obj);
    if text.is_null() {
        ffi::PyErr_Clear();
        return String::from("<unprintable>");
    }

    let mut size: ffi::Py_ssize_t = 0;
    let data = ffi::PyUnicode_AsUTF8AndSize(text, &mut size);
    let result = if data.is_null() {
        ffi::PyErr_Clear();
        String::from("<unprintable>")
    } else {
        let bytes = std::slice::from_raw_parts(data as *const u8, size as usize);
        String::from_utf8_lossy(bytes).into_owned()
    };

    ffi::Py_DECREF(text);
    result
}

unsafe fn builtin_exception(name: &str) -> *mut ffi::PyObject {
    match name {
        "TypeError" => ffi::PyExc_TypeError,
        "ValueError" => ffi::PyExc_ValueError,
        "IndexError" => ffi::PyExc_IndexError,
        "KeyError" => ffi::PyExc_KeyError,
        "LookupError" => ffi::PyExc_LookupError,
        "AttributeError" => ffi::PyExc_AttributeError,
        "OverflowError" => ffi::PyExc_OverflowError,
        "ZeroDivisionError" => ffi::PyExc_ZeroDivisionError,
        "ArithmeticError" => ffi::PyExc_ArithmeticError,
        "ImportError" => ffi::PyExc_ImportError,
        "ModuleNotFoundError" => ffi::PyExc_ModuleNotFoundError,
        "NotImplementedError" => ffi::PyExc_NotImplementedError,
        "UnicodeError" => ffi::PyExc_UnicodeError,
        "MemoryError" => ffi::PyExc_MemoryError,
        "StopIteration" => ffi::PyExc_StopIteration,
        "SystemError" => ffi::PyExc_SystemError,
        "OSError" => ffi::PyExc_OSError,
        _ => ffi::PyExc_RuntimeError,
    }
}
