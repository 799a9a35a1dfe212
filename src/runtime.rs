//! Process bootstrap - interpreter start-up, shutdown and global queries
//!
//! Design: the interpreter is process-wide state, so its lifecycle is a
//! single state machine behind a lock:
//! - `Uninitialized -> Running` via `Runtime::initialize`
//! - `Running -> Finalized` via `Runtime::finalize` or dropping the token
//! - `Finalized -> Running` is allowed again (several sessions per process)
//!
//! The `Runtime` token is tied to the thread that started the interpreter
//! (it is neither `Send` nor `Sync`); that thread holds the interpreter lock
//! after start-up.

use crate::config::RuntimeConfig;
use crate::encoding::{wide_to_string_lossy, WideString};
use crate::errors::{c_str_lossy, ErrorKind, PyError, PyResult};
use crate::logging::{log_execute, log_runtime_init, log_runtime_shutdown, perf};
use crate::views::Module;
use libc::wchar_t;
use parking_lot::{const_mutex, Mutex};
use pyo3::ffi;
use std::ffi::CString;
use std::marker::PhantomData;
use std::os::raw::c_int;
use std::ptr;
use tracing::{debug, warn};

/// Interpreter lifecycle as seen by this crate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Uninitialized,
    Running,
    Finalized,
}

static LIFECYCLE: Mutex<Lifecycle> = const_mutex(Lifecycle::Uninitialized);

/// Token proving the interpreter is running on this thread
#[derive(Debug)]
pub struct Runtime {
    /// Finalize on drop; false for tokens attached to a foreign start-up
    owns_interpreter: bool,
    _thread_bound: PhantomData<*const ()>,
}

impl Runtime {
    /// Start the interpreter.
    ///
    /// The configured search path is applied before start-up and the
    /// preload modules are imported afterwards. A failing preload shuts the
    /// interpreter down again.
    pub fn initialize(config: &RuntimeConfig) -> PyResult<Self> {
        let mut state = LIFECYCLE.lock();
        if *state == Lifecycle::Running || unsafe { ffi::Py_IsInitialized() } != 0 {
            return Err(PyError::new(ErrorKind::AlreadyInitialized));
        }

        if let Some(path) = config.joined_search_path() {
            apply_path(&path)?;
        }

        log_runtime_init(config.install_signal_handlers);
        unsafe { ffi::Py_InitializeEx(config.install_signal_handlers as c_int) };
        if unsafe { ffi::Py_IsInitialized() } == 0 {
            return Err(PyError::new(ErrorKind::NotInitialized).with_context("starting the interpreter"));
        }
        *state = Lifecycle::Running;
        drop(state);

        let runtime = Self {
            owns_interpreter: true,
            _thread_bound: PhantomData,
        };
        for module in &config.preload {
            runtime
                .import(module.as_str())
                .map_err(|e| e.with_context(format!("preloading '{}'", module)))?;
        }
        Ok(runtime)
    }

    /// Token for an interpreter started elsewhere (by the host or another
    /// library). Dropping it leaves the interpreter running.
    ///
    /// The caller must hold the interpreter lock while using the token.
    pub fn attach() -> PyResult<Self> {
        if !Self::is_initialized() {
            return Err(PyError::new(ErrorKind::NotInitialized));
        }
        Ok(Self {
            owns_interpreter: false,
            _thread_bound: PhantomData,
        })
    }

    /// Shut the interpreter down. Requires the interpreter lock.
    ///
    /// Handles must not be used past this point. Cloning or dropping one
    /// that is still alive leaves the reference untouched (with a warning)
    /// and `ref_count` reports `None`; every other operation is undefined.
    /// A handle from a previous session must never reach a later one.
    pub fn finalize(mut self) -> PyResult<()> {
        let result = self.shutdown();
        self.owns_interpreter = false;
        result
    }

    fn shutdown(&mut self) -> PyResult<()> {
        if !self.owns_interpreter {
            return Ok(());
        }
        let mut state = LIFECYCLE.lock();
        if *state != Lifecycle::Running {
            return Ok(());
        }

        log_runtime_shutdown();
        let status = unsafe { ffi::Py_FinalizeEx() };
        *state = Lifecycle::Finalized;
        if status < 0 {
            return Err(PyError::new(ErrorKind::ExecutionFailed).with_context("flushing buffered output at shutdown"));
        }
        Ok(())
    }

    pub fn lifecycle() -> Lifecycle {
        *LIFECYCLE.lock()
    }

    pub fn is_initialized() -> bool {
        unsafe { ffi::Py_IsInitialized() != 0 }
    }

    /// Set the module search path. Only valid before start-up.
    pub fn set_path(path: &str) -> PyResult<()> {
        let _state = LIFECYCLE.lock();
        apply_path(path)
    }

    /// Run top-level source in `__main__`.
    ///
    /// The interpreter prints the traceback itself; the error only reports
    /// that execution failed.
    pub fn execute(&self, source: &str) -> PyResult<()> {
        let _perf = perf::track("execute");
        log_execute(source.len());

        let source = CString::new(source)?;
        let status = unsafe { ffi::PyRun_SimpleStringFlags(source.as_ptr(), ptr::null_mut()) };
        if status != 0 {
            return Err(PyError::new(ErrorKind::ExecutionFailed));
        }
        Ok(())
    }

    pub fn import(&self, name: &str) -> PyResult<Module> {
        Module::import(name)
    }

    /// Interpreter version string, e.g. `3.11.7 (main, ...) [GCC ...]`
    pub fn version() -> String {
        unsafe { c_str_lossy(ffi::Py_GetVersion()) }.unwrap_or_default()
    }

    pub fn platform() -> String {
        unsafe { c_str_lossy(ffi::Py_GetPlatform()) }.unwrap_or_default()
    }

    #[allow(deprecated)]
    pub fn program_name(&self) -> String {
        unsafe { wide_query(ffi::Py_GetProgramName()) }
    }

    #[allow(deprecated)]
    pub fn program_full_path(&self) -> String {
        unsafe { wide_query(ffi::Py_GetProgramFullPath()) }
    }

    #[allow(deprecated)]
    pub fn prefix(&self) -> String {
        unsafe { wide_query(ffi::Py_GetPrefix()) }
    }

    #[allow(deprecated)]
    pub fn exec_prefix(&self) -> String {
        unsafe { wide_query(ffi::Py_GetExecPrefix()) }
    }

    /// Module search path as configured at start-up
    #[allow(deprecated)]
    pub fn path(&self) -> String {
        unsafe { wide_query(ffi::Py_GetPath()) }
    }
}

impl Drop for Runtime {
    fn drop(&mut self) {
        if let Err(err) = self.shutdown() {
            warn!(error = %err, "Interpreter shutdown reported an error");
        }
    }
}

#[allow(deprecated)]
fn apply_path(path: &str) -> PyResult<()> {
    if Runtime::is_initialized() {
        return Err(PyError::new(ErrorKind::AlreadyInitialized).with_context("setting the module search path"));
    }
    let wide = WideString::new(path)?;
    debug!(event = "set_path", path = path, "Module search path set");
    // The interpreter copies the string
    unsafe { ffi::Py_SetPath(wide.as_ptr()) };
    Ok(())
}

unsafe fn wide_query(raw: *const wchar_t) -> String {
    if raw.is_null() {
        return String::new();
    }
    let chars = libc::wcslen(raw);
    wide_to_string_lossy(std::slice::from_raw_parts(raw, chars))
}
