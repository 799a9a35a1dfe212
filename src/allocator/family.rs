//! Allocator families

use pyo3::ffi;
use std::os::raw::c_void;

/// One matched malloc/realloc/free triple
///
/// # Safety
/// Implementations must return blocks that `free` accepts, and `free` must
/// only be handed blocks from the same family.
pub unsafe trait AllocatorFamily {
    const NAME: &'static str;

    unsafe fn malloc(size: usize) -> *mut c_void;
    unsafe fn realloc(ptr: *mut c_void, size: usize) -> *mut c_void;
    unsafe fn free(ptr: *mut c_void);
}

/// `PyMem_Malloc` family; requires the interpreter lock
#[derive(Debug)]
pub enum General {}

/// `PyMem_RawMalloc` family; thread-safe, no lock required
#[derive(Debug)]
pub enum Raw {}

unsafe impl AllocatorFamily for General {
    const NAME: &'static str = "general";

    #[inline]
    unsafe fn malloc(size: usize) -> *mut c_void {
        ffi::PyMem_Malloc(size)
    }

    #[inline]
    unsafe fn realloc(ptr: *mut c_void, size: usize) -> *mut c_void {
        ffi::PyMem_Realloc(ptr, size)
    }

    #[inline]
    unsafe fn free(ptr: *mut c_void) {
        ffi::PyMem_Free(ptr)
    }
}

unsafe impl AllocatorFamily for Raw {
    const NAME: &'static str = "raw";

    #[inline]
    unsafe fn malloc(size: usize) -> *mut c_void {
        ffi::PyMem_RawMalloc(size)
    }

    #[inline]
    unsafe fn realloc(ptr: *mut c_void, size: usize) -> *mut c_void {
        ffi::PyMem_RawRealloc(ptr, size)
    }

    #[inline]
    unsafe fn free(ptr: *mut c_void) {
        ffi::PyMem_RawFree(ptr)
    }
}
