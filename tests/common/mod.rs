//! Shared interpreter for integration tests

#![allow(dead_code)]

use once_cell::sync::OnceCell;
use pyhandle::{Runtime, RuntimeConfig};
use pyo3::ffi;

static STARTED: OnceCell<()> = OnceCell::new();

struct LockGuard(ffi::PyGILState_STATE);

impl Drop for LockGuard {
    fn drop(&mut self) {
        unsafe { ffi::PyGILState_Release(self.0) };
    }
}

/// Run `f` with the interpreter started once per test binary and its lock held
pub fn with_python<R>(f: impl FnOnce() -> R) -> R {
    STARTED.get_or_init(|| {
        let config = RuntimeConfig {
            install_signal_handlers: false,
            ..RuntimeConfig::default()
        };
        let runtime = Runtime::initialize(&config).expect("interpreter start-up");
        std::mem::forget(runtime);
        unsafe { ffi::PyEval_SaveThread() };
    });
    let _guard = LockGuard(unsafe { ffi::PyGILState_Ensure() });
    f()
}
