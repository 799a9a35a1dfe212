//! Dictionary objects
//!
//! Lookups distinguish absence (`Ok(None)`) from lookup failure (`Err`),
//! e.g. an unhashable key.

use super::{List, Str};
use crate::errors::{check_bool, check_status, PyError, PyResult};
use crate::ffi::sys;
use crate::object::{Object, TypeTag};
use pyo3::ffi;

typed_view! {
    /// Handle to a `dict` object
    Dict => TypeTag::Dict
}

/// Caller-owned cursor for [`Dict::next`]; starts at the beginning
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DictPosition(ffi::Py_ssize_t);

impl DictPosition {
    pub fn reset(&mut self) {
        self.0 = 0;
    }
}

impl Dict {
    pub fn new() -> PyResult<Self> {
        unsafe { Self::from_owned_or_err(ffi::PyDict_New()) }
    }

    pub fn from_pairs(pairs: &[(Object, Object)]) -> PyResult<Self> {
        let dict = Self::new()?;
        dict.set_items(pairs)?;
        Ok(dict)
    }

    /// Entry count; 0 for a null handle
    pub fn len(&self) -> usize {
        if self.is_null() {
            return 0;
        }
        unsafe { ffi::PyDict_Size(self.as_ptr()).max(0) as usize }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get_item(&self, key: &Object) -> PyResult<Option<Object>> {
        let ptr = self.checked_ptr()?;
        let key = key.checked_ptr()?;
        let found = unsafe { ffi::PyDict_GetItemWithError(ptr, key) };
        if found.is_null() {
            if PyError::occurred() {
                Err(PyError::fetch())
            } else {
                Ok(None)
            }
        } else {
            Ok(Some(unsafe { Object::from_borrowed_ptr(found) }))
        }
    }

    pub fn get_item_str(&self, key: &str) -> PyResult<Option<Object>> {
        self.get_item(Str::new(key)?.as_object())
    }

    pub fn set_item(&self, key: &Object, value: &Object) -> PyResult<()> {
        let ptr = self.checked_ptr()?;
        let key = key.checked_ptr()?;
        let value = value.checked_ptr()?;
        check_status(unsafe { ffi::PyDict_SetItem(ptr, key, value) })
    }

    pub fn set_item_str(&self, key: &str, value: &Object) -> PyResult<()> {
        self.set_item(Str::new(key)?.as_object(), value)
    }

    pub fn set_items(&self, pairs: &[(Object, Object)]) -> PyResult<()> {
        pairs
            .iter()
            .try_for_each(|(key, value)| self.set_item(key, value))
    }

    /// Remove `key`; a missing key raises `KeyError`
    pub fn del_item(&self, key: &Object) -> PyResult<()> {
        let ptr = self.checked_ptr()?;
        let key = key.checked_ptr()?;
        check_status(unsafe { ffi::PyDict_DelItem(ptr, key) })
    }

    /// Value for `key`, inserting `default` first if absent
    pub fn set_default(&self, key: &Object, default: &Object) -> PyResult<Object> {
        let ptr = self.checked_ptr()?;
        let key = key.checked_ptr()?;
        let default = default.checked_ptr()?;
        unsafe { Object::from_borrowed_or_err(sys::PyDict_SetDefault(ptr, key, default)) }
    }

    pub fn contains(&self, key: &Object) -> PyResult<bool> {
        let ptr = self.checked_ptr()?;
        let key = key.checked_ptr()?;
        check_bool(unsafe { ffi::PyDict_Contains(ptr, key) })
    }

    pub fn clear(&self) -> PyResult<()> {
        let ptr = self.checked_ptr()?;
        unsafe { ffi::PyDict_Clear(ptr) };
        Ok(())
    }

    /// Shallow copy
    pub fn copy(&self) -> PyResult<Dict> {
        let ptr = self.checked_ptr()?;
        unsafe { Self::from_owned_or_err(ffi::PyDict_Copy(ptr)) }
    }

    /// Merge `other` into this dict, overwriting existing keys
    pub fn update(&self, other: &Dict) -> PyResult<()> {
        let ptr = self.checked_ptr()?;
        let other = other.checked_ptr()?;
        check_status(unsafe { ffi::PyDict_Update(ptr, other) })
    }

    /// `(key, value)` tuples
    pub fn items(&self) -> PyResult<List> {
        let ptr = self.checked_ptr()?;
        unsafe { List::from_owned_or_err(ffi::PyDict_Items(ptr)) }
    }

    pub fn keys(&self) -> PyResult<List> {
        let ptr = self.checked_ptr()?;
        unsafe { List::from_owned_or_err(ffi::PyDict_Keys(ptr)) }
    }

    pub fn values(&self) -> PyResult<List> {
        let ptr = self.checked_ptr()?;
        unsafe { List::from_owned_or_err(ffi::PyDict_Values(ptr)) }
    }

    /// Advance `pos` and return the next entry, or `None` when exhausted.
    ///
    /// The dict must not change size while a position is in use.
    pub fn next(&self, pos: &mut DictPosition) -> Option<(Object, Object)> {
        if self.is_null() {
            return None;
        }
        let mut key = std::ptr::null_mut();
        let mut value = std::ptr::null_mut();
        let more = unsafe { ffi::PyDict_Next(self.as_ptr(), &mut pos.0, &mut key, &mut value) };
        if more == 0 {
            return None;
        }
        unsafe { Some((Object::from_borrowed_ptr(key), Object::from_borrowed_ptr(value))) }
    }

    pub fn iter(&self) -> DictIter<'_> {
        DictIter {
            dict: self,
            pos: DictPosition::default(),
        }
    }
}

/// Entry iterator built on [`Dict::next`]
pub struct DictIter<'a> {
    dict: &'a Dict,
    pos: DictPosition,
}

impl Iterator for DictIter<'_> {
    type Item = (Object, Object);

    fn next(&mut self) -> Option<Self::Item> {
        self.dict.next(&mut self.pos)
    }
}

impl<'a> IntoIterator for &'a Dict {
    type Item = (Object, Object);
    type IntoIter = DictIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
