//! pyhandle - typed, reference-counted handles over the CPython object API
//!
//! Every handle owns one strong reference and gives it back on drop, so
//! reference counts stay balanced without manual bookkeeping. Typed views
//! (`Int`, `Str`, `List`, `Dict`, ...) narrow a handle to one interpreter
//! type, and host functions can be exposed as interpreter callables.
//!
//! Apart from `Runtime::initialize`, `WideString` and the raw allocator
//! family, every operation requires a running interpreter and the calling
//! thread must hold the interpreter lock.

pub mod allocator;
pub mod config;
pub mod dispatch;
pub mod encoding;
pub mod errors;
pub mod ffi;
pub mod logging;
pub mod object;
pub mod runtime;
pub mod views;

#[cfg(test)]
mod testing;

// Re-export commonly used items
pub use allocator::{Mem, RawMem, RawWideMem, WideMem};
pub use config::RuntimeConfig;
pub use dispatch::{build_value, CallingConvention, FormatArg, NativeFunction};
pub use encoding::{NarrowStr, WideStr, WideString};
pub use errors::{ErrorKind, PyError, PyResult};
pub use object::{Object, Ownership, TypeTag};
pub use runtime::{Lifecycle, Runtime};
pub use views::{
    Callable, Dict, DictPosition, Float, Int, List, ListBuilder, Overflow, Module, Str, Tuple, TupleBuilder,
};
