//! Integer objects (`int`, arbitrary precision)

use crate::errors::{PyError, PyResult};
use crate::object::TypeTag;
use num_traits::{NumCast, PrimInt};
use pyo3::ffi;
use std::ffi::CString;
use std::os::raw::{c_int, c_long, c_ulong};
use std::ptr;

typed_view! {
    /// Handle to an `int` object
    Int => TypeTag::Int
}

/// Side of the 64-bit range a non-raising extraction fell off
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Overflow {
    InRange,
    TooLarge,
    TooSmall,
}

/// Fetch the pending error if a sentinel return came with one set
#[inline]
fn check_sentinel<T: PartialEq>(value: T, sentinel: T) -> PyResult<T> {
    if value == sentinel && PyError::occurred() {
        Err(PyError::fetch())
    } else {
        Ok(value)
    }
}

impl Int {
    /// From any primitive integer width, signed or unsigned
    pub fn new<T: PrimInt>(value: T) -> PyResult<Self> {
        if let Some(v) = value.to_i64() {
            return Self::from_i64(v);
        }
        if let Some(v) = value.to_u64() {
            return Self::from_u64(v);
        }
        match value.to_i128() {
            Some(v) => Self::parse(&v.to_string(), 10),
            None => match value.to_u128() {
                Some(v) => Self::parse(&v.to_string(), 10),
                None => Err(PyError::foreign("OverflowError", "integer does not fit 128 bits")),
            },
        }
    }

    pub fn from_i64(value: i64) -> PyResult<Self> {
        unsafe { Self::from_owned_or_err(ffi::PyLong_FromLongLong(value)) }
    }

    pub fn from_u64(value: u64) -> PyResult<Self> {
        unsafe { Self::from_owned_or_err(ffi::PyLong_FromUnsignedLongLong(value)) }
    }

    pub fn from_c_long(value: c_long) -> PyResult<Self> {
        unsafe { Self::from_owned_or_err(ffi::PyLong_FromLong(value)) }
    }

    pub fn from_c_ulong(value: c_ulong) -> PyResult<Self> {
        unsafe { Self::from_owned_or_err(ffi::PyLong_FromUnsignedLong(value)) }
    }

    pub fn from_isize(value: isize) -> PyResult<Self> {
        unsafe { Self::from_owned_or_err(ffi::PyLong_FromSsize_t(value as ffi::Py_ssize_t)) }
    }

    pub fn from_usize(value: usize) -> PyResult<Self> {
        unsafe { Self::from_owned_or_err(ffi::PyLong_FromSize_t(value)) }
    }

    /// Parse `text` in `radix` (2..=36, or 0 to honor a `0x`/`0o`/`0b` prefix)
    pub fn parse(text: &str, radix: u32) -> PyResult<Self> {
        let ctext = CString::new(text)?;
        unsafe {
            Self::from_owned_or_err(ffi::PyLong_FromString(
                ctext.as_ptr(),
                ptr::null_mut(),
                radix as i32,
            ))
        }
    }

    pub fn to_i64(&self) -> PyResult<i64> {
        let ptr = self.checked_ptr()?;
        check_sentinel(unsafe { ffi::PyLong_AsLongLong(ptr) }, -1)
    }

    /// Negative values raise `OverflowError`
    pub fn to_u64(&self) -> PyResult<u64> {
        let ptr = self.checked_ptr()?;
        check_sentinel(unsafe { ffi::PyLong_AsUnsignedLongLong(ptr) }, u64::MAX)
    }

    pub fn to_c_long(&self) -> PyResult<c_long> {
        let ptr = self.checked_ptr()?;
        check_sentinel(unsafe { ffi::PyLong_AsLong(ptr) }, -1)
    }

    pub fn to_c_ulong(&self) -> PyResult<c_ulong> {
        let ptr = self.checked_ptr()?;
        check_sentinel(unsafe { ffi::PyLong_AsUnsignedLong(ptr) }, c_ulong::MAX)
    }

    pub fn to_isize(&self) -> PyResult<isize> {
        let ptr = self.checked_ptr()?;
        check_sentinel(unsafe { ffi::PyLong_AsSsize_t(ptr) }, -1)
    }

    pub fn to_usize(&self) -> PyResult<usize> {
        let ptr = self.checked_ptr()?;
        check_sentinel(unsafe { ffi::PyLong_AsSize_t(ptr) }, usize::MAX)
    }

    /// 64-bit value without raising on overflow; out of range yields `-1`
    /// and the side it overflowed. Only a non-integer is an error.
    pub fn to_i64_checked(&self) -> PyResult<(i64, Overflow)> {
        let ptr = self.checked_ptr()?;
        let mut overflow: c_int = 0;
        let value = check_sentinel(unsafe { ffi::PyLong_AsLongLongAndOverflow(ptr, &mut overflow) }, -1)?;
        let overflow = match overflow {
            0 => Overflow::InRange,
            o if o > 0 => Overflow::TooLarge,
            _ => Overflow::TooSmall,
        };
        Ok((value, overflow))
    }

    /// Extract into any primitive width; out of range is `OverflowError`
    pub fn extract<T: PrimInt>(&self) -> PyResult<T> {
        let signed = T::min_value() < T::zero();
        let value = if T::zero().count_zeros() > 64 {
            self.extract_wide(signed)?
        } else if signed {
            <T as NumCast>::from(self.to_i64()?)
        } else {
            <T as NumCast>::from(self.to_u64()?)
        };
        value.ok_or_else(|| PyError::foreign("OverflowError", "int too large to convert"))
    }

    /// Widths above 64 bits, through a 128-bit little-endian byte image
    fn extract_wide<T: PrimInt>(&self, signed: bool) -> PyResult<Option<T>> {
        let ptr = self.checked_ptr()?;
        let mut bytes = [0u8; 16];
        let status = unsafe {
            ffi::_PyLong_AsByteArray(
                ptr as *mut ffi::PyLongObject,
                bytes.as_mut_ptr(),
                bytes.len(),
                1,
                signed as c_int,
            )
        };
        if status != 0 {
            return Err(PyError::fetch());
        }
        Ok(if signed {
            <T as NumCast>::from(i128::from_le_bytes(bytes))
        } else {
            <T as NumCast>::from(u128::from_le_bytes(bytes))
        })
    }
}
