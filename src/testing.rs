//! Shared interpreter for unit tests
//!
//! The harness runs tests on several threads, so the interpreter is started
//! once, the start-up thread lets go of the interpreter lock, and every test
//! takes the lock for the duration of its closure.

use crate::config::RuntimeConfig;
use crate::runtime::Runtime;
use once_cell::sync::OnceCell;
use pyo3::ffi;

static STARTED: OnceCell<()> = OnceCell::new();

struct LockGuard(ffi::PyGILState_STATE);

impl Drop for LockGuard {
    fn drop(&mut self) {
        unsafe { ffi::PyGILState_Release(self.0) };
    }
}

fn start() {
    STARTED.get_or_init(|| {
        let config = RuntimeConfig {
            install_signal_handlers: false,
            ..RuntimeConfig::default()
        };
        let runtime = Runtime::initialize(&config).expect("interpreter start-up");
        // Runs until the test process exits
        std::mem::forget(runtime);
        unsafe { ffi::PyEval_SaveThread() };
    });
}

/// Run `f` with the interpreter started and its lock held
pub fn with_python<R>(f: impl FnOnce() -> R) -> R {
    start();
    let _guard = LockGuard(unsafe { ffi::PyGILState_Ensure() });
    f()
}
