//! Callable dispatch - host functions exposed as interpreter callables
//!
//! Design: three calling conventions behind one calling surface:
//! - NoArgs: `fn(context)`
//! - Positional: `fn(context, args)`
//! - Keywords: `fn(context, args, kwargs)`
//!
//! The convention is fixed when the callable is built. Its descriptor is
//! owned by a capsule that the callable keeps alive, so the descriptor
//! lives exactly as long as the callable does.

mod call;
pub mod format;
mod native;

#[cfg(test)]
mod tests;

pub use format::{build_value, FormatArg};
pub use native::{ArgsFn, KwArgsFn, NativeFunction, NoArgsFn};

use pyo3::ffi;
use std::os::raw::c_int;

/// Calling convention of a native callable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum CallingConvention {
    /// No arguments accepted
    NoArgs,
    /// Positional argument tuple
    Positional,
    /// Positional tuple plus optional keyword dict
    Keywords,
}

impl CallingConvention {
    /// `ml_flags` for the method definition
    #[inline]
    pub const fn flags(self) -> c_int {
        match self {
            Self::NoArgs => ffi::METH_NOARGS,
            Self::Positional => ffi::METH_VARARGS,
            Self::Keywords => ffi::METH_VARARGS | ffi::METH_KEYWORDS,
        }
    }

    #[inline]
    pub const fn accepts_positional(self) -> bool {
        matches!(self, Self::Positional | Self::Keywords)
    }

    #[inline]
    pub const fn accepts_keywords(self) -> bool {
        matches!(self, Self::Keywords)
    }
}
