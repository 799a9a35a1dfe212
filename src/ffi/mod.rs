//! FFI surface - raw C-API access used by the handle layer
//!
//! Design: `pyo3::ffi` covers nearly everything; the few symbols it does not
//! expose are declared in `sys`. Reference-count primitives live in
//! `refcount` so every increment/decrement funnels through one place.

pub mod refcount;

pub use refcount::{decref, incref, refcount, thread_stats, RefStats};

/// Declarations missing from `pyo3::ffi`
pub mod sys {
    use pyo3::ffi::{PyObject, PyTypeObject, Py_ssize_t};
    use std::os::raw::c_int;

    extern "C" {
        pub static mut PyMethod_Type: PyTypeObject;
        pub static mut PyCell_Type: PyTypeObject;

        /// Reallocates a sole-owner tuple; on failure `*p` is released and nulled
        pub fn _PyTuple_Resize(p: *mut *mut PyObject, newsize: Py_ssize_t) -> c_int;

        /// Returns a borrowed reference, or null with an exception set
        pub fn PyDict_SetDefault(
            mp: *mut PyObject,
            key: *mut PyObject,
            default: *mut PyObject,
        ) -> *mut PyObject;
    }
}
