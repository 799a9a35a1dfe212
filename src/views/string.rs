//! Text objects (`str`)

use super::ssize;
use crate::allocator::WideMem;
use crate::encoding::{NarrowStr, WideStr};
use crate::errors::{ErrorKind, PyError, PyResult};
use crate::object::TypeTag;
use libc::wchar_t;
use pyo3::ffi;
use std::ffi::CStr;

typed_view! {
    /// Handle to a `str` object
    Str => TypeTag::Str
}

impl Str {
    pub fn new(text: &str) -> PyResult<Self> {
        unsafe {
            Self::from_owned_or_err(ffi::PyUnicode_FromStringAndSize(
                text.as_ptr().cast(),
                ssize(text.len()),
            ))
        }
    }

    /// Decode NUL-terminated UTF-8
    pub fn from_cstr(text: &CStr) -> PyResult<Self> {
        unsafe { Self::from_owned_or_err(ffi::PyUnicode_FromString(text.as_ptr())) }
    }

    /// Build from native wide units (no terminator needed)
    pub fn from_wide(wide: &[wchar_t]) -> PyResult<Self> {
        unsafe { Self::from_owned_or_err(ffi::PyUnicode_FromWideChar(wide.as_ptr(), ssize(wide.len()))) }
    }

    /// Build from whichever form the facade holds, without re-encoding
    /// wide sources through the locale.
    pub fn from_narrow(text: &NarrowStr<'_>) -> PyResult<Self> {
        if let Some(wide) = text.wide_source() {
            return Self::from_wide(wide);
        }
        match text.as_text() {
            Some(utf8) => Self::new(utf8),
            None => Self::from_cstr(text.as_cstr()?),
        }
    }

    pub fn from_wide_str(text: &WideStr<'_>) -> PyResult<Self> {
        Self::from_wide(text.as_wide()?)
    }

    /// UTF-8 bytes cached inside the object; valid while `self` lives
    pub fn as_bytes(&self) -> PyResult<&[u8]> {
        let ptr = self.checked_ptr()?;
        let mut size: ffi::Py_ssize_t = 0;
        unsafe {
            let data = ffi::PyUnicode_AsUTF8AndSize(ptr, &mut size);
            if data.is_null() {
                return Err(PyError::fetch());
            }
            Ok(std::slice::from_raw_parts(data as *const u8, size as usize))
        }
    }

    pub fn to_str(&self) -> PyResult<&str> {
        let bytes = self.as_bytes()?;
        std::str::from_utf8(bytes).map_err(|e| {
            PyError::new(ErrorKind::Encoding {
                position: e.valid_up_to(),
            })
        })
    }

    /// Owned wide copy (freed with the general allocator)
    pub fn to_wide(&self) -> PyResult<WideMem> {
        let ptr = self.checked_ptr()?;
        let mut size: ffi::Py_ssize_t = 0;
        unsafe {
            let raw = ffi::PyUnicode_AsWideCharString(ptr, &mut size);
            if raw.is_null() {
                return Err(PyError::fetch());
            }
            WideMem::from_raw_parts(raw, size as usize).ok_or_else(PyError::fetch)
        }
    }

    /// Copy into `buf`, returning the number of units written.
    ///
    /// A terminator is written only if it fits.
    pub fn to_wide_into(&self, buf: &mut [wchar_t]) -> PyResult<usize> {
        let ptr = self.checked_ptr()?;
        let written = unsafe { ffi::PyUnicode_AsWideChar(ptr, buf.as_mut_ptr(), ssize(buf.len())) };
        if written < 0 {
            Err(PyError::fetch())
        } else {
            Ok(written as usize)
        }
    }

    /// Length in code points
    pub fn char_len(&self) -> PyResult<usize> {
        let ptr = self.checked_ptr()?;
        let len = unsafe { ffi::PyUnicode_GetLength(ptr) };
        if len < 0 {
            Err(PyError::fetch())
        } else {
            Ok(len as usize)
        }
    }
}
