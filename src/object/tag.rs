//! Dynamic type tags and the predicates over them

use super::Object;
use crate::ffi::sys;
use pyo3::ffi;
use std::fmt;
use std::ptr::addr_of_mut;

/// Closed set of interpreter types the handle layer distinguishes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TypeTag {
    None,
    Bool,
    Int,
    Float,
    Complex,
    Str,
    Bytes,
    ByteArray,
    List,
    Tuple,
    Dict,
    Set,
    FrozenSet,
    Module,
    Function,
    Method,
    Capsule,
    Code,
    Cell,
    Coroutine,
    Context,
    ContextVar,
    ContextToken,
    CallIterator,
    /// Any object with a call slot (protocol, never exact)
    Callable,
    /// Not covered by the tags above
    Other,
}

impl TypeTag {
    /// Concrete tags in classification order; `Bool` precedes `Int`
    pub const CONCRETE: [TypeTag; 24] = [
        TypeTag::None,
        TypeTag::Bool,
        TypeTag::Int,
        TypeTag::Float,
        TypeTag::Complex,
        TypeTag::Str,
        TypeTag::Bytes,
        TypeTag::ByteArray,
        TypeTag::List,
        TypeTag::Tuple,
        TypeTag::Dict,
        TypeTag::Set,
        TypeTag::FrozenSet,
        TypeTag::Module,
        TypeTag::Function,
        TypeTag::Method,
        TypeTag::Capsule,
        TypeTag::Code,
        TypeTag::Cell,
        TypeTag::Coroutine,
        TypeTag::Context,
        TypeTag::ContextVar,
        TypeTag::ContextToken,
        TypeTag::CallIterator,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Self::None => "NoneType",
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Float => "float",
            Self::Complex => "complex",
            Self::Str => "str",
            Self::Bytes => "bytes",
            Self::ByteArray => "bytearray",
            Self::List => "list",
            Self::Tuple => "tuple",
            Self::Dict => "dict",
            Self::Set => "set",
            Self::FrozenSet => "frozenset",
            Self::Module => "module",
            Self::Function => "function",
            Self::Method => "method",
            Self::Capsule => "PyCapsule",
            Self::Code => "code",
            Self::Cell => "cell",
            Self::Coroutine => "coroutine",
            Self::Context => "Context",
            Self::ContextVar => "ContextVar",
            Self::ContextToken => "Token",
            Self::CallIterator => "callable_iterator",
            Self::Callable => "callable",
            Self::Other => "object",
        }
    }

    /// Interpreter type object, `None` for protocol tags
    pub fn type_object(self) -> Option<*mut ffi::PyTypeObject> {
        unsafe {
            let tp = match self {
                Self::None => ffi::Py_TYPE(ffi::Py_None()),
                Self::Bool => addr_of_mut!(ffi::PyBool_Type),
                Self::Int => addr_of_mut!(ffi::PyLong_Type),
                Self::Float => addr_of_mut!(ffi::PyFloat_Type),
                Self::Complex => addr_of_mut!(ffi::PyComplex_Type),
                Self::Str => addr_of_mut!(ffi::PyUnicode_Type),
                Self::Bytes => addr_of_mut!(ffi::PyBytes_Type),
                Self::ByteArray => addr_of_mut!(ffi::PyByteArray_Type),
                Self::List => addr_of_mut!(ffi::PyList_Type),
                Self::Tuple => addr_of_mut!(ffi::PyTuple_Type),
                Self::Dict => addr_of_mut!(ffi::PyDict_Type),
                Self::Set => addr_of_mut!(ffi::PySet_Type),
                Self::FrozenSet => addr_of_mut!(ffi::PyFrozenSet_Type),
                Self::Module => addr_of_mut!(ffi::PyModule_Type),
                Self::Function => addr_of_mut!(ffi::PyFunction_Type),
                Self::Method => addr_of_mut!(sys::PyMethod_Type),
                Self::Capsule => addr_of_mut!(ffi::PyCapsule_Type),
                Self::Code => addr_of_mut!(ffi::PyCode_Type),
                Self::Cell => addr_of_mut!(sys::PyCell_Type),
                Self::Coroutine => addr_of_mut!(ffi::PyCoro_Type),
                Self::Context => addr_of_mut!(ffi::PyContext_Type),
                Self::ContextVar => addr_of_mut!(ffi::PyContextVar_Type),
                Self::ContextToken => addr_of_mut!(ffi::PyContextToken_Type),
                Self::CallIterator => addr_of_mut!(ffi::PyCallIter_Type),
                Self::Callable | Self::Other => return None,
            };
            Some(tp)
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Object {
    /// Type test accepting subtypes; false on null.
    ///
    /// `Other` matches objects no concrete tag or the callable protocol
    /// claims.
    pub fn is(&self, tag: TypeTag) -> bool {
        let ptr = self.as_ptr();
        if ptr.is_null() {
            return false;
        }
        match tag {
            TypeTag::None => unsafe { ptr == ffi::Py_None() },
            TypeTag::Callable => unsafe { ffi::PyCallable_Check(ptr) != 0 },
            TypeTag::Other => self.type_tag() == Some(TypeTag::Other),
            concrete => match concrete.type_object() {
                Some(tp) => unsafe { ffi::PyObject_TypeCheck(ptr, tp) != 0 },
                None => false,
            },
        }
    }

    /// Type test on the concrete type only; false on null and for protocols
    pub fn is_exact(&self, tag: TypeTag) -> bool {
        let ptr = self.as_ptr();
        if ptr.is_null() {
            return false;
        }
        match tag.type_object() {
            Some(tp) => unsafe { ffi::Py_TYPE(ptr) == tp },
            None => false,
        }
    }

    /// Most specific tag for this object, `None` for null
    pub fn type_tag(&self) -> Option<TypeTag> {
        if self.is_null() {
            return None;
        }
        let concrete = TypeTag::CONCRETE.iter().copied().find(|&tag| self.is(tag));
        Some(match concrete {
            Some(tag) => tag,
            None if self.is(TypeTag::Callable) => TypeTag::Callable,
            None => TypeTag::Other,
        })
    }

    pub fn is_none(&self) -> bool {
        self.is(TypeTag::None)
    }

    pub fn is_callable(&self) -> bool {
        self.is(TypeTag::Callable)
    }

    /// Numeric protocol (`__index__`, `__int__` or `__float__`)
    pub fn is_number(&self) -> bool {
        !self.is_null() && unsafe { ffi::PyNumber_Check(self.as_ptr()) != 0 }
    }

    /// `set`, `frozenset` or a subtype of either
    pub fn is_any_set(&self) -> bool {
        self.is(TypeTag::Set) || self.is(TypeTag::FrozenSet)
    }
}
