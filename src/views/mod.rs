//! Typed views - handles narrowed to one interpreter type
//!
//! Design: each view is a transparent newtype over `Object`
//! - Checked entry through `TryFrom<Object>` (subtypes accepted)
//! - `Deref` to `Object` keeps the generic handle API available
//! - Containers are built through builders, never left half-initialized

use crate::errors::{PyError, PyResult};
use crate::object::{Object, TypeTag};

macro_rules! typed_view {
    ($(#[$meta:meta])* $name:ident => $tag:expr) => {
        $(#[$meta])*
        #[derive(Clone, Default, PartialEq, Eq, Hash)]
        #[repr(transparent)]
        pub struct $name($crate::object::Object);

        impl $name {
            pub const TAG: $crate::object::TypeTag = $tag;

            /// Wrap without checking the type.
            ///
            /// # Safety
            /// `obj` must be null or satisfy `obj.is(Self::TAG)`.
            #[inline]
            pub unsafe fn from_object_unchecked(obj: $crate::object::Object) -> Self {
                Self(obj)
            }

            #[inline]
            pub fn into_object(self) -> $crate::object::Object {
                self.0
            }

            #[inline]
            pub fn as_object(&self) -> &$crate::object::Object {
                &self.0
            }

            #[inline]
            #[allow(dead_code)]
            pub(crate) unsafe fn from_owned_or_err(
                ptr: *mut pyo3::ffi::PyObject,
            ) -> $crate::errors::PyResult<Self> {
                $crate::object::Object::from_owned_or_err(ptr).map(Self)
            }
        }

        impl std::ops::Deref for $name {
            type Target = $crate::object::Object;

            #[inline]
            fn deref(&self) -> &$crate::object::Object {
                &self.0
            }
        }

        impl TryFrom<$crate::object::Object> for $name {
            type Error = $crate::errors::PyError;

            fn try_from(obj: $crate::object::Object) -> $crate::errors::PyResult<Self> {
                $crate::views::expect_tag(&obj, Self::TAG)?;
                Ok(Self(obj))
            }
        }

        impl From<$name> for $crate::object::Object {
            #[inline]
            fn from(view: $name) -> $crate::object::Object {
                view.0
            }
        }

        impl std::fmt::Debug for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.debug_tuple(stringify!($name)).field(&self.0).finish()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                std::fmt::Display::fmt(&self.0, f)
            }
        }
    };
}

mod callable;
mod dict;
mod float;
mod int;
mod iter;
mod list;
mod module;
mod string;
mod tuple;


pub use callable::Callable;
pub use dict::{Dict, DictIter, DictPosition};
pub use float::Float;
pub use int::{Int, Overflow};
pub use iter::{SeqIter, Sequence};
pub use list::{List, ListBuilder};
pub use module::Module;
pub use string::Str;
pub use tuple::{Tuple, TupleBuilder};

/// `TypeMismatch` unless `obj.is(tag)`
pub(crate) fn expect_tag(obj: &Object, tag: TypeTag) -> PyResult<()> {
    if obj.is(tag) {
        Ok(())
    } else {
        Err(PyError::type_mismatch(
            tag.name(),
            obj.type_name().unwrap_or_else(|| "null".to_string()),
        ))
    }
}

/// Bounds check shared by the ordered containers
#[inline]
pub(crate) fn check_index(index: usize, len: usize) -> PyResult<()> {
    if index < len {
        Ok(())
    } else {
        Err(PyError::out_of_range(index, len))
    }
}

/// Clamp to `Py_ssize_t`
#[inline]
pub(crate) fn ssize(n: usize) -> pyo3::ffi::Py_ssize_t {
    n.min(pyo3::ffi::PY_SSIZE_T_MAX as usize) as pyo3::ffi::Py_ssize_t
}
