//! Tuple objects and their builder
//!
//! Design: a tuple is only handed out once every slot holds a value
//! - `TupleBuilder` owns the fresh tuple and a fill bitmap
//! - `finish` refuses to release a tuple with empty slots
//! - `Tuple::set_item` is only legal while the caller is the sole owner

use super::iter::{SeqIter, Sequence};
use super::{check_index, ssize};
use crate::errors::{check_status, ErrorKind, PyError, PyResult};
use crate::ffi::sys;
use crate::object::{Object, TypeTag};
use bitvec::prelude::*;
use pyo3::ffi;

typed_view! {
    /// Handle to a `tuple` object
    Tuple => TypeTag::Tuple
}

impl Tuple {
    pub fn empty() -> PyResult<Self> {
        unsafe { Self::from_owned_or_err(ffi::PyTuple_New(0)) }
    }

    pub fn from_items(items: &[Object]) -> PyResult<Self> {
        let mut builder = TupleBuilder::new(items.len())?;
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
        unsafe { ffi::PyTuple_Size(self.as_ptr()).max(0) as usize }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get_item(&self, index: usize) -> PyResult<Object> {
        let ptr = self.checked_ptr()?;
        check_index(index, self.len())?;
        unsafe { Object::from_borrowed_or_err(ffi::PyTuple_GetItem(ptr, ssize(index))) }
    }

    /// Replace a slot. The interpreter rejects this (`SystemError`) unless
    /// this handle holds the only reference.
    pub fn set_item(&self, index: usize, value: Object) -> PyResult<()> {
        let ptr = self.checked_ptr()?;
        check_index(index, self.len())?;
        value.checked_ptr()?;
        check_status(unsafe { ffi::PyTuple_SetItem(ptr, ssize(index), value.into_ptr()) })
    }

    /// New tuple with elements `[low, high)`, clamped like slicing
    pub fn get_slice(&self, low: usize, high: usize) -> PyResult<Tuple> {
        let ptr = self.checked_ptr()?;
        unsafe { Self::from_owned_or_err(ffi::PyTuple_GetSlice(ptr, ssize(low), ssize(high))) }
    }

    pub fn iter(&self) -> SeqIter<'_, Self> {
        SeqIter::new(self)
    }

    pub fn to_vec(&self) -> PyResult<Vec<Object>> {
        (0..self.len()).map(|i| self.get_item(i)).collect()
    }
}

impl Sequence for Tuple {
    fn seq_len(&self) -> usize {
        self.len()
    }

    fn seq_item(&self, index: usize) -> PyResult<Object> {
        self.get_item(index)
    }
}

impl<'a> IntoIterator for &'a Tuple {
    type Item = Object;
    type IntoIter = SeqIter<'a, Tuple>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Fixed-size tuple under construction
pub struct TupleBuilder {
    tuple: Object,
    filled: BitVec,
}

impl TupleBuilder {
    pub fn new(len: usize) -> PyResult<Self> {
        let tuple = unsafe { Object::from_owned_or_err(ffi::PyTuple_New(ssize(len)))? };
        Ok(Self {
            tuple,
            filled: bitvec![0; len],
        })
    }

    pub fn len(&self) -> usize {
        self.filled.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filled.is_empty()
    }

    /// Number of slots still empty
    pub fn remaining(&self) -> usize {
        self.filled.count_zeros()
    }

    /// Store `value` in slot `index`; a previous value is released
    pub fn set(&mut self, index: usize, value: Object) -> PyResult<()> {
        let tuple = self.tuple.checked_ptr()?;
        check_index(index, self.len())?;
        value.checked_ptr()?;
        check_status(unsafe { ffi::PyTuple_SetItem(tuple, ssize(index), value.into_ptr()) })?;
        self.filled.set(index, true);
        Ok(())
    }

    /// Grow or shrink to `len` slots in place. Dropped slots release their
    /// values; new slots start empty.
    ///
    /// On failure the partial tuple is gone and the builder only reports
    /// `NullHandle` afterwards.
    pub fn resize(&mut self, len: usize) -> PyResult<()> {
        self.tuple.checked_ptr()?;
        let status = unsafe { sys::_PyTuple_Resize(self.tuple.raw_slot(), ssize(len)) };
        if status != 0 {
            self.filled.clear();
            return Err(PyError::fetch());
        }
        self.filled.resize(len, false);
        Ok(())
    }

    /// Chainable `set`
    pub fn with(mut self, index: usize, value: Object) -> PyResult<Self> {
        self.set(index, value)?;
        Ok(self)
    }

    pub fn finish(self) -> PyResult<Tuple> {
        self.tuple.checked_ptr()?;
        if let Some(index) = self.filled.first_zero() {
            return Err(PyError::new(ErrorKind::UninitializedSlot {
                index,
                len: self.len(),
            }));
        }
        Ok(Tuple(self.tuple))
    }
}
