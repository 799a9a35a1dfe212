//! List objects - mutable, shared by every holder

use super::iter::{SeqIter, Sequence};
use super::{check_index, ssize, Tuple};
use crate::errors::{check_status, ErrorKind, PyError, PyResult};
use crate::object::{Object, TypeTag};
use bitvec::prelude::*;
use pyo3::ffi;
use std::ptr;

typed_view! {
    /// Handle to a `list` object
    List => TypeTag::List
}

impl List {
    /// Empty list
    pub fn new() -> PyResult<Self> {
        unsafe { Self::from_owned_or_err(ffi::PyList_New(0)) }
    }

    pub fn from_items(items: &[Object]) -> PyResult<Self> {
        let mut builder = ListBuilder::new(items.len())?;
        for (index, item) in items.iter().enumerate() {
            builder.set(index, item.clone())?;
        }
        builder.finish()
    }

    /// Element count; 0 for a null handle
    pub fn len(&self) -> usize {
        if self.is_null() {
            return 0;
        }
        unsafe { ffi::PyList_Size(self.as_ptr()).max(0) as usize }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get_item(&self, index: usize) -> PyResult<Object> {
        let ptr = self.checked_ptr()?;
        check_index(index, self.len())?;
        unsafe { Object::from_borrowed_or_err(ffi::PyList_GetItem(ptr, ssize(index))) }
    }

    /// Replace slot `index`; the old element is released
    pub fn set_item(&self, index: usize, value: Object) -> PyResult<()> {
        let ptr = self.checked_ptr()?;
        check_index(index, self.len())?;
        value.checked_ptr()?;
        check_status(unsafe { ffi::PyList_SetItem(ptr, ssize(index), value.into_ptr()) })
    }

    /// Insert before `index`; indices past the end append
    pub fn insert(&self, index: usize, value: &Object) -> PyResult<()> {
        let ptr = self.checked_ptr()?;
        let value = value.checked_ptr()?;
        check_status(unsafe { ffi::PyList_Insert(ptr, ssize(index), value) })
    }

    pub fn append(&self, value: &Object) -> PyResult<()> {
        let ptr = self.checked_ptr()?;
        let value = value.checked_ptr()?;
        check_status(unsafe { ffi::PyList_Append(ptr, value) })
    }

    /// In-place ascending sort; comparison errors propagate
    pub fn sort(&self) -> PyResult<()> {
        let ptr = self.checked_ptr()?;
        check_status(unsafe { ffi::PyList_Sort(ptr) })
    }

    pub fn reverse(&self) -> PyResult<()> {
        let ptr = self.checked_ptr()?;
        check_status(unsafe { ffi::PyList_Reverse(ptr) })
    }

    /// New list with elements `[low, high)`, clamped like slicing
    pub fn get_slice(&self, low: usize, high: usize) -> PyResult<List> {
        let ptr = self.checked_ptr()?;
        unsafe { Self::from_owned_or_err(ffi::PyList_GetSlice(ptr, ssize(low), ssize(high))) }
    }

    /// Replace `[low, high)` with the contents of `items`, or delete it for `None`
    pub fn set_slice(&self, low: usize, high: usize, items: Option<&List>) -> PyResult<()> {
        let ptr = self.checked_ptr()?;
        let items = items.map_or(ptr::null_mut(), |l| l.as_ptr());
        check_status(unsafe { ffi::PyList_SetSlice(ptr, ssize(low), ssize(high), items) })
    }

    pub fn to_tuple(&self) -> PyResult<Tuple> {
        let ptr = self.checked_ptr()?;
        unsafe { Tuple::from_owned_or_err(ffi::PyList_AsTuple(ptr)) }
    }

    pub fn iter(&self) -> SeqIter<'_, Self> {
        SeqIter::new(self)
    }

    pub fn to_vec(&self) -> PyResult<Vec<Object>> {
        (0..self.len()).map(|i| self.get_item(i)).collect()
    }
}

impl Sequence for List {
    fn seq_len(&self) -> usize {
        self.len()
    }

    fn seq_item(&self, index: usize) -> PyResult<Object> {
        self.get_item(index)
    }
}

impl<'a> IntoIterator for &'a List {
    type Item = Object;
    type IntoIter = SeqIter<'a, List>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Fixed-size list under construction; slots start empty
pub struct ListBuilder {
    list: Object,
    filled: BitVec,
}

impl ListBuilder {
    pub fn new(len: usize) -> PyResult<Self> {
        let list = unsafe { Object::from_owned_or_err(ffi::PyList_New(ssize(len)))? };
        Ok(Self {
            list,
            filled: bitvec![0; len],
        })
    }

    pub fn len(&self) -> usize {
        self.filled.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filled.is_empty()
    }

    pub fn remaining(&self) -> usize {
        self.filled.count_zeros()
    }

    pub fn set(&mut self, index: usize, value: Object) -> PyResult<()> {
        check_index(index, self.len())?;
        value.checked_ptr()?;
        check_status(unsafe {
            ffi::PyList_SetItem(self.list.as_ptr(), ssize(index), value.into_ptr())
        })?;
        self.filled.set(index, true);
        Ok(())
    }

    pub fn with(mut self, index: usize, value: Object) -> PyResult<Self> {
        self.set(index, value)?;
        Ok(self)
    }

    pub fn finish(self) -> PyResult<List> {
        if let Some(index) = self.filled.first_zero() {
            return Err(PyError::new(ErrorKind::UninitializedSlot {
                index,
                len: self.len(),
            }));
        }
        Ok(List(self.list))
    }
}
