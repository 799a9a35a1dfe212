//! Locale conversions through the interpreter
//!
//! `Py_EncodeLocale` allocates from the general family and
//! `Py_DecodeLocale` from the raw family; each result keeps its buffer
//! type so it is freed by the matching function.

use crate::allocator::{Mem, RawWideMem};
use crate::errors::{ErrorKind, PyError, PyResult};
use libc::wchar_t;
use pyo3::ffi;
use std::alloc::{handle_alloc_error, Layout};
use std::ffi::CStr;
use std::fmt;

/// Narrow, locale-encoded copy of a wide string
pub struct EncodedString {
    buffer: Mem,
}

impl EncodedString {
    /// Encode a NUL-terminated wide string.
    ///
    /// Requires the interpreter lock.
    pub fn encode(wide: &[wchar_t]) -> PyResult<Self> {
        if wide.last() != Some(&0) {
            return Err(PyError::new(ErrorKind::NulByte { position: wide.len() }));
        }

        let mut error_pos: ffi::Py_ssize_t = 0;
        let raw = unsafe { ffi::Py_EncodeLocale(wide.as_ptr(), &mut error_pos) };
        if raw.is_null() {
            if error_pos < 0 {
                handle_alloc_error(Layout::array::<u8>(wide.len()).unwrap_or(Layout::new::<u8>()));
            }
            return Err(PyError::new(ErrorKind::Encoding {
                position: error_pos as usize,
            }));
        }

        let len = unsafe { CStr::from_ptr(raw).to_bytes_with_nul().len() };
        let buffer = unsafe { Mem::from_raw(raw.cast(), len) }
            .ok_or_else(|| PyError::new(ErrorKind::Encoding { position: 0 }))?;
        Ok(Self { buffer })
    }

    pub fn as_cstr(&self) -> &CStr {
        // Buffer length includes the terminator written by the interpreter
        unsafe { CStr::from_bytes_with_nul_unchecked(self.buffer.as_bytes()) }
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.as_cstr().to_bytes()
    }
}

impl fmt::Debug for EncodedString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("EncodedString").field(&self.as_cstr()).finish()
    }
}

/// Wide copy of a locale-encoded narrow string
pub struct DecodedString {
    buffer: RawWideMem,
}

impl DecodedString {
    /// Decode with the locale encoding (surrogateescape for undecodable bytes)
    pub fn decode(narrow: &CStr) -> PyResult<Self> {
        let mut size: ffi::Py_ssize_t = 0;
        let raw = unsafe { ffi::Py_DecodeLocale(narrow.as_ptr(), &mut size) };
        if raw.is_null() {
            // -1: out of memory, -2: decoding error
            if size == -1 {
                handle_alloc_error(Layout::array::<wchar_t>(narrow.to_bytes().len() + 1).unwrap_or(Layout::new::<wchar_t>()));
            }
            return Err(PyError::new(ErrorKind::Encoding { position: 0 }));
        }

        let buffer = unsafe { RawWideMem::from_raw(raw) }
            .ok_or_else(|| PyError::new(ErrorKind::Encoding { position: 0 }))?;
        Ok(Self { buffer })
    }

    pub fn as_wide(&self) -> &[wchar_t] {
        self.buffer.as_wide()
    }

    pub fn as_wide_with_nul(&self) -> &[wchar_t] {
        self.buffer.as_wide_with_nul()
    }

    pub fn to_string_lossy(&self) -> String {
        self.buffer.to_string_lossy()
    }
}

impl fmt::Debug for DecodedString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("DecodedString").field(&self.to_string_lossy()).finish()
    }
}
