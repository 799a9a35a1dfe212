//! Reference-counted handle - one strong reference per non-null handle
//!
//! Design: `Object` owns exactly one reference to an interpreter object
//! - Construction either adopts a new reference or borrows (and increments)
//! - `Clone` increments, `Drop` decrements, moves cost nothing
//! - `release` drops the reference early and leaves a null handle
//! - Identity (`==`, `Hash`) is pointer identity; value equality is `rich_eq`

mod tag;

#[cfg(test)]
mod tests;

pub use tag::TypeTag;

use crate::encoding::NarrowStr;
use crate::errors::{c_str_lossy, check_bool, check_ptr, ErrorKind, PyError, PyResult};
use crate::ffi::refcount::{self, note_adopted};
use pyo3::ffi;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ptr;

/// How a constructor treats the reference behind a raw pointer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ownership {
    /// Take over a new reference the caller already owns (no increment)
    Adopt,
    /// Share an existing reference (increment)
    Borrow,
}

/// Owning handle to an interpreter object, or null
#[repr(transparent)]
pub struct Object {
    ptr: *mut ffi::PyObject,
}

impl Object {
    /// Handle holding nothing
    pub const fn null() -> Self {
        Self {
            ptr: ptr::null_mut(),
        }
    }

    /// Wrap `ptr` according to `ownership`; null yields a null handle.
    ///
    /// # Safety
    /// Non-null `ptr` must be a live object. With `Adopt` the caller must
    /// own the reference being handed over.
    pub unsafe fn new(ptr: *mut ffi::PyObject, ownership: Ownership) -> Self {
        match ownership {
            Ownership::Adopt => note_adopted(ptr),
            Ownership::Borrow => refcount::incref(ptr),
        }
        Self { ptr }
    }

    /// # Safety
    /// See [`Object::new`] with [`Ownership::Adopt`].
    #[inline]
    pub unsafe fn from_owned_ptr(ptr: *mut ffi::PyObject) -> Self {
        Self::new(ptr, Ownership::Adopt)
    }

    /// # Safety
    /// See [`Object::new`] with [`Ownership::Borrow`].
    #[inline]
    pub unsafe fn from_borrowed_ptr(ptr: *mut ffi::PyObject) -> Self {
        Self::new(ptr, Ownership::Borrow)
    }

    /// Adopt a new-reference return value, fetching the error on null.
    #[inline]
    pub(crate) unsafe fn from_owned_or_err(ptr: *mut ffi::PyObject) -> PyResult<Self> {
        check_ptr(ptr).map(|p| Self::from_owned_ptr(p))
    }

    /// Borrow a borrowed-reference return value, fetching the error on null.
    #[inline]
    pub(crate) unsafe fn from_borrowed_or_err(ptr: *mut ffi::PyObject) -> PyResult<Self> {
        check_ptr(ptr).map(|p| Self::from_borrowed_ptr(p))
    }

    /// New handle to the `None` singleton
    pub fn none() -> Self {
        unsafe { Self::from_borrowed_ptr(ffi::Py_None()) }
    }

    #[inline]
    pub fn as_ptr(&self) -> *mut ffi::PyObject {
        self.ptr
    }

    /// Hand the reference to a stealing API; no decrement happens here
    #[inline]
    pub fn into_ptr(self) -> *mut ffi::PyObject {
        let ptr = self.ptr;
        std::mem::forget(self);
        ptr
    }

    /// The owned pointer itself, for C-API calls that may replace it
    /// (`_PyTuple_Resize`). Whatever is left there is released on drop.
    #[inline]
    pub(crate) fn raw_slot(&mut self) -> *mut *mut ffi::PyObject {
        &mut self.ptr
    }

    /// Non-null pointer or `NullHandle`
    #[inline]
    pub(crate) fn checked_ptr(&self) -> PyResult<*mut ffi::PyObject> {
        if self.ptr.is_null() {
            Err(PyError::new(ErrorKind::NullHandle))
        } else {
            Ok(self.ptr)
        }
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        self.ptr.is_null()
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        !self.ptr.is_null()
    }

    /// Manual increment; the extra reference is not tracked by this handle
    pub fn add_ref(&self) {
        unsafe { refcount::incref(self.ptr) }
    }

    /// Drop this handle's reference now; repeated calls are no-ops
    pub fn release(&mut self) {
        let ptr = std::mem::replace(&mut self.ptr, ptr::null_mut());
        unsafe { refcount::decref(ptr) }
    }

    /// Current interpreter reference count, `None` for null or once the
    /// interpreter is finalized
    pub fn ref_count(&self) -> Option<usize> {
        unsafe { refcount::refcount(self.ptr) }
    }

    /// Generic size protocol (`len(obj)`)
    pub fn len(&self) -> PyResult<usize> {
        let ptr = self.checked_ptr()?;
        let size = unsafe { ffi::PyObject_Size(ptr) };
        if size < 0 {
            Err(PyError::fetch())
        } else {
            Ok(size as usize)
        }
    }

    pub fn is_empty(&self) -> PyResult<bool> {
        self.len().map(|n| n == 0)
    }

    pub fn get_attr<'n>(&self, name: impl Into<NarrowStr<'n>>) -> PyResult<Object> {
        let ptr = self.checked_ptr()?;
        let name = name.into();
        let cname = name.as_cstr()?;
        unsafe { Object::from_owned_or_err(ffi::PyObject_GetAttrString(ptr, cname.as_ptr())) }
            .map_err(|e| e.with_context(format!("getattr {}", name.to_string_lossy())))
    }

    pub fn get_attr_obj(&self, name: &Object) -> PyResult<Object> {
        let ptr = self.checked_ptr()?;
        let key = name.checked_ptr()?;
        unsafe { Object::from_owned_or_err(ffi::PyObject_GetAttr(ptr, key)) }
    }

    pub fn set_attr<'n>(&self, name: impl Into<NarrowStr<'n>>, value: &Object) -> PyResult<()> {
        let ptr = self.checked_ptr()?;
        let value = value.checked_ptr()?;
        let name = name.into();
        let cname = name.as_cstr()?;
        let status = unsafe { ffi::PyObject_SetAttrString(ptr, cname.as_ptr(), value) };
        crate::errors::check_status(status)
    }

    /// `hasattr`; lookup errors count as absent
    pub fn has_attr<'n>(&self, name: impl Into<NarrowStr<'n>>) -> bool {
        let name = name.into();
        match (self.checked_ptr(), name.as_cstr()) {
            (Ok(ptr), Ok(cname)) => unsafe { ffi::PyObject_HasAttrString(ptr, cname.as_ptr()) != 0 },
            _ => false,
        }
    }

    /// Concrete type name (`tp_name`)
    pub fn type_name(&self) -> Option<String> {
        if self.ptr.is_null() {
            return None;
        }
        unsafe { c_str_lossy((*ffi::Py_TYPE(self.ptr)).tp_name) }
    }

    /// Concrete type docstring (`tp_doc`)
    pub fn type_doc(&self) -> Option<String> {
        if self.ptr.is_null() {
            return None;
        }
        unsafe { c_str_lossy((*ffi::Py_TYPE(self.ptr)).tp_doc) }
    }

    /// `str(obj)`
    pub fn str(&self) -> PyResult<String> {
        let ptr = self.checked_ptr()?;
        let text = unsafe { Object::from_owned_or_err(ffi::PyObject_Str(ptr))? };
        unsafe { utf8_of(text.as_ptr()) }
    }

    /// `repr(obj)`
    pub fn repr(&self) -> PyResult<String> {
        let ptr = self.checked_ptr()?;
        let text = unsafe { Object::from_owned_or_err(ffi::PyObject_Repr(ptr))? };
        unsafe { utf8_of(text.as_ptr()) }
    }

    /// `bool(obj)`
    pub fn is_truthy(&self) -> PyResult<bool> {
        let ptr = self.checked_ptr()?;
        check_bool(unsafe { ffi::PyObject_IsTrue(ptr) })
    }

    /// `self == other` in the interpreter
    pub fn rich_eq(&self, other: &Object) -> PyResult<bool> {
        let a = self.checked_ptr()?;
        let b = other.checked_ptr()?;
        check_bool(unsafe { ffi::PyObject_RichCompareBool(a, b, ffi::Py_EQ) })
    }
}

/// Copy out the UTF-8 form of a `str` object.
pub(crate) unsafe fn utf8_of(ptr: *mut ffi::PyObject) -> PyResult<String> {
    let mut size: ffi::Py_ssize_t = 0;
    let data = ffi::PyUnicode_AsUTF8AndSize(ptr, &mut size);
    if data.is_null() {
        return Err(PyError::fetch());
    }
    let bytes = std::slice::from_raw_parts(data as *const u8, size as usize);
    Ok(String::from_utf8_lossy(bytes).into_owned())
}

impl Clone for Object {
    fn clone(&self) -> Self {
        unsafe { Self::from_borrowed_ptr(self.ptr) }
    }
}

impl Drop for Object {
    fn drop(&mut self) {
        self.release();
    }
}

impl Default for Object {
    fn default() -> Self {
        Self::null()
    }
}

impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        self.ptr == other.ptr
    }
}

impl Eq for Object {}

impl Hash for Object {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.ptr.hash(state);
    }
}

impl fmt::Display for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            return f.write_str("<null>");
        }
        match self.str() {
            Ok(text) => f.write_str(&text),
            Err(_) => write!(f, "<unprintable {}>", self.type_name().unwrap_or_default()),
        }
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Object")
            .field("ptr", &self.ptr)
            .field("type", &self.type_name())
            .field("refcnt", &self.ref_count())
            .finish()
    }
}
