//! Reference counting - the only place handles touch `ob_refcnt`
//!
//! Null-safe wrappers over the interpreter's increment/decrement, plus
//! per-thread counters so tests and benchmarks can audit handle traffic.

use pyo3::ffi;
use std::cell::Cell;
use tracing::{trace, warn};

thread_local! {
    static STATS: Cell<RefStats> = const { Cell::new(RefStats::new()) };
}

/// Counts of reference operations issued by this thread
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefStats {
    pub increments: u64,
    pub decrements: u64,
    pub adoptions: u64,
    /// Increments or decrements dropped because the interpreter was down
    pub skipped: u64,
}

impl RefStats {
    pub const fn new() -> Self {
        Self {
            increments: 0,
            decrements: 0,
            adoptions: 0,
            skipped: 0,
        }
    }

    /// Increments minus decrements, counting adoptions as increments
    pub fn balance(&self) -> i64 {
        (self.increments + self.adoptions) as i64 - self.decrements as i64
    }
}

/// Snapshot of this thread's counters
pub fn thread_stats() -> RefStats {
    STATS.with(|s| s.get())
}

#[inline]
fn bump(f: impl FnOnce(&mut RefStats)) {
    STATS.with(|s| {
        let mut stats = s.get();
        f(&mut stats);
        s.set(stats);
    });
}

/// True, and counted as skipped, once the interpreter is finalized
#[inline]
fn interpreter_down(event: &'static str, obj: *mut ffi::PyObject) -> bool {
    if unsafe { ffi::Py_IsInitialized() } != 0 {
        return false;
    }
    bump(|s| s.skipped += 1);
    warn!(event, address = ?obj, "Handle outlived the interpreter; reference left untouched");
    true
}

/// Increment reference count
///
/// # Safety
/// - Null-safe (no-op for null pointers)
/// - No-op after finalization
/// - Non-null pointers must be live objects; interpreter lock held
#[inline]
pub unsafe fn incref(obj: *mut ffi::PyObject) {
    if obj.is_null() || interpreter_down("incref", obj) {
        return;
    }
    ffi::Py_INCREF(obj);
    bump(|s| s.increments += 1);
    trace!(event = "incref", address = ?obj);
}

/// Decrement reference count; the interpreter deallocates at zero
///
/// # Safety
/// - Null-safe (no-op for null pointers)
/// - No-op after finalization
/// - Caller must own the reference being dropped; interpreter lock held
#[inline]
pub unsafe fn decref(obj: *mut ffi::PyObject) {
    if obj.is_null() || interpreter_down("decref", obj) {
        return;
    }
    trace!(event = "decref", address = ?obj);
    bump(|s| s.decrements += 1);
    ffi::Py_DECREF(obj);
}

/// Record that a new reference was taken over without an increment
#[inline]
pub(crate) fn note_adopted(obj: *mut ffi::PyObject) {
    if !obj.is_null() {
        bump(|s| s.adoptions += 1);
        trace!(event = "adopt", address = ?obj);
    }
}

/// Current reference count, `None` for null or after finalization
///
/// # Safety
/// Non-null pointers must be live objects
#[inline]
pub unsafe fn refcount(obj: *mut ffi::PyObject) -> Option<usize> {
    if obj.is_null() || ffi::Py_IsInitialized() == 0 {
        None
    } else {
        Some(ffi::Py_REFCNT(obj) as usize)
    }
}
