//! Format-driven value building (`Py_BuildValue` grammar)
//!
//! Design: the format string selects a conversion per argument; arguments
//! arrive as an explicit slice instead of C varargs.
//! - Scalars: `s z U y C c b B h H i I l k L K n d f O S N`
//! - Nesting: `(...)` tuple, `[...]` list, `{k:v, ...}` dict
//! - Space, tab, `,` and `:` are separators and ignored
//! - Integers are truncated to the code's C width, as a C caller would

use crate::errors::{PyError, PyResult};
use crate::object::{Object, TypeTag};
use crate::views::{Dict, Float, Int, List, Str, Tuple};
use pyo3::ffi;
use smallvec::SmallVec;
use std::os::raw::{c_int, c_long, c_uint, c_ulong};

/// One argument consumed by a format code
#[derive(Debug, Clone, Copy)]
pub enum FormatArg<'a> {
    Str(&'a str),
    /// `None` builds the `None` object (`s`, `z`, `U` and `y`)
    OptStr(Option<&'a str>),
    Bytes(&'a [u8]),
    Char(char),
    Int(i64),
    UInt(u64),
    Float(f64),
    Object(&'a Object),
}

impl<'a> From<&'a str> for FormatArg<'a> {
    fn from(v: &'a str) -> Self {
        Self::Str(v)
    }
}

impl<'a> From<Option<&'a str>> for FormatArg<'a> {
    fn from(v: Option<&'a str>) -> Self {
        Self::OptStr(v)
    }
}

impl<'a> From<&'a [u8]> for FormatArg<'a> {
    fn from(v: &'a [u8]) -> Self {
        Self::Bytes(v)
    }
}

impl From<char> for FormatArg<'_> {
    fn from(v: char) -> Self {
        Self::Char(v)
    }
}

impl From<bool> for FormatArg<'_> {
    fn from(v: bool) -> Self {
        Self::Int(v as i64)
    }
}

impl From<f64> for FormatArg<'_> {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<f32> for FormatArg<'_> {
    fn from(v: f32) -> Self {
        Self::Float(v as f64)
    }
}

impl<'a> From<&'a Object> for FormatArg<'a> {
    fn from(v: &'a Object) -> Self {
        Self::Object(v)
    }
}

macro_rules! signed_arg {
    ($($t:ty),*) => {$(
        impl From<$t> for FormatArg<'_> {
            fn from(v: $t) -> Self {
                Self::Int(v as i64)
            }
        }
    )*};
}

macro_rules! unsigned_arg {
    ($($t:ty),*) => {$(
        impl From<$t> for FormatArg<'_> {
            fn from(v: $t) -> Self {
                Self::UInt(v as u64)
            }
        }
    )*};
}

signed_arg!(i8, i16, i32, i64, isize);
unsigned_arg!(u8, u16, u32, u64, usize);

type Items = SmallVec<[Object; 8]>;

struct Builder<'f, 'a> {
    format: &'f [u8],
    pos: usize,
    args: &'a [FormatArg<'a>],
    next_arg: usize,
}

impl<'f, 'a> Builder<'f, 'a> {
    fn new(format: &'f str, args: &'a [FormatArg<'a>]) -> Self {
        Self {
            format: format.as_bytes(),
            pos: 0,
            args,
            next_arg: 0,
        }
    }

    fn skip_separators(&mut self) {
        while let Some(b' ' | b'\t' | b',' | b':') = self.format.get(self.pos) {
            self.pos += 1;
        }
    }

    fn take_arg(&mut self, code: u8) -> PyResult<FormatArg<'a>> {
        let arg = self.args.get(self.next_arg).copied().ok_or_else(|| {
            PyError::format(format!("missing argument for '{}'", code as char), self.pos - 1)
        })?;
        self.next_arg += 1;
        Ok(arg)
    }

    fn mismatch(&self, code: u8, arg: &FormatArg<'_>) -> PyError {
        PyError::format(
            format!("argument {:?} does not fit code '{}'", arg, code as char),
            self.pos - 1,
        )
    }

    /// Items up to `close` (consumed) or end of input when `close` is `None`
    fn items(&mut self, close: Option<u8>) -> PyResult<Items> {
        let mut items = Items::new();
        loop {
            self.skip_separators();
            match self.format.get(self.pos).copied() {
                None if close.is_none() => return Ok(items),
                None => {
                    return Err(PyError::format(
                        format!("unterminated group, expected '{}'", close.map_or('?', char::from)),
                        self.pos,
                    ))
                }
                Some(c) if Some(c) == close => {
                    self.pos += 1;
                    return Ok(items);
                }
                Some(c @ (b')' | b']' | b'}')) => {
                    return Err(PyError::format(format!("unmatched '{}'", c as char), self.pos));
                }
                Some(_) => items.push(self.value()?),
            }
        }
    }

    fn value(&mut self) -> PyResult<Object> {
        let code = self.format[self.pos];
        self.pos += 1;

        match code {
            b'(' => Ok(Tuple::from_items(&self.items(Some(b')'))?)?.into()),
            b'[' => Ok(List::from_items(&self.items(Some(b']'))?)?.into()),
            b'{' => {
                let start = self.pos - 1;
                let items = self.items(Some(b'}'))?;
                if items.len() % 2 != 0 {
                    return Err(PyError::format("dict needs key/value pairs", start));
                }
                let dict = Dict::new()?;
                for pair in items.chunks(2) {
                    dict.set_item(&pair[0], &pair[1])?;
                }
                Ok(dict.into())
            }
            b's' | b'z' | b'U' => match self.take_arg(code)? {
                FormatArg::Str(text) | FormatArg::OptStr(Some(text)) => Ok(Str::new(text)?.into()),
                FormatArg::OptStr(None) => Ok(Object::none()),
                other => Err(self.mismatch(code, &other)),
            },
            b'y' => match self.take_arg(code)? {
                FormatArg::Bytes(bytes) => bytes_object(bytes),
                FormatArg::Str(text) | FormatArg::OptStr(Some(text)) => bytes_object(text.as_bytes()),
                FormatArg::OptStr(None) => Ok(Object::none()),
                other => Err(self.mismatch(code, &other)),
            },
            b'C' => match self.take_arg(code)? {
                FormatArg::Char(c) => unsafe {
                    Object::from_owned_or_err(ffi::PyUnicode_FromOrdinal(c as u32 as c_int))
                },
                other => Err(self.mismatch(code, &other)),
            },
            b'c' => {
                let arg = self.take_arg(code)?;
                let byte = match arg {
                    FormatArg::Char(c) if c.is_ascii() => c as u8,
                    FormatArg::Int(_) | FormatArg::UInt(_) => int_bits(&arg).unwrap_or(0) as u8,
                    other => return Err(self.mismatch(code, &other)),
                };
                bytes_object(&[byte])
            }
            b'b' | b'B' | b'h' | b'H' | b'i' | b'I' | b'l' | b'k' | b'L' | b'K' | b'n' => {
                let arg = self.take_arg(code)?;
                let Some(bits) = int_bits(&arg) else {
                    return Err(self.mismatch(code, &arg));
                };
                truncated_int(code, bits)
            }
            b'd' | b'f' => match self.take_arg(code)? {
                FormatArg::Float(v) => Ok(Float::new(v)?.into()),
                FormatArg::Int(v) => Ok(Float::new(v as f64)?.into()),
                FormatArg::UInt(v) => Ok(Float::new(v as f64)?.into()),
                other => Err(self.mismatch(code, &other)),
            },
            b'O' | b'S' | b'N' => match self.take_arg(code)? {
                FormatArg::Object(obj) if obj.is_valid() => Ok(obj.clone()),
                FormatArg::Object(_) => Err(PyError::format("null object argument", self.pos - 1)),
                other => Err(self.mismatch(code, &other)),
            },
            other => Err(PyError::format(
                format!("unknown format code '{}'", other as char),
                self.pos - 1,
            )),
        }
    }
}

fn int_bits(arg: &FormatArg<'_>) -> Option<i128> {
    match *arg {
        FormatArg::Int(v) => Some(v as i128),
        FormatArg::UInt(v) => Some(v as i128),
        FormatArg::Char(c) => Some(c as u32 as i128),
        _ => None,
    }
}

fn truncated_int(code: u8, bits: i128) -> PyResult<Object> {
    let int = match code {
        b'b' => Int::from_c_long(bits as i8 as c_long),
        b'B' => Int::from_c_long(bits as u8 as c_long),
        b'h' => Int::from_c_long(bits as i16 as c_long),
        b'H' => Int::from_c_long(bits as u16 as c_long),
        b'i' => Int::from_c_long(bits as c_int as c_long),
        b'I' => Int::from_c_ulong(bits as c_uint as c_ulong),
        b'l' => Int::from_c_long(bits as c_long),
        b'k' => Int::from_c_ulong(bits as c_ulong),
        b'L' => Int::from_i64(bits as i64),
        b'K' => Int::from_u64(bits as u64),
        _ => Int::from_isize(bits as isize),
    };
    int.map(Into::into)
}

fn bytes_object(bytes: &[u8]) -> PyResult<Object> {
    unsafe {
        Object::from_owned_or_err(ffi::PyBytes_FromStringAndSize(
            bytes.as_ptr().cast(),
            crate::views::ssize(bytes.len()),
        ))
    }
}

/// Build a value: no items gives `None`, one item gives that item,
/// several give a tuple.
pub fn build_value(format: &str, args: &[FormatArg<'_>]) -> PyResult<Option<Object>> {
    let mut builder = Builder::new(format, args);
    let mut items = builder.items(None)?;
    if builder.next_arg != args.len() {
        return Err(PyError::format(
            format!("{} unused argument(s)", args.len() - builder.next_arg),
            format.len(),
        ));
    }
    match items.len() {
        0 => Ok(None),
        1 => Ok(items.pop()),
        _ => Tuple::from_items(&items).map(|t| Some(t.into())),
    }
}

/// Argument tuple for a format call: `None` means call without arguments
pub(crate) fn build_args(format: &str, args: &[FormatArg<'_>]) -> PyResult<Option<Tuple>> {
    match build_value(format, args)? {
        None => Ok(None),
        Some(value) if value.is(TypeTag::Tuple) => Ok(Some(unsafe { Tuple::from_object_unchecked(value) })),
        Some(value) => Tuple::from_items(std::slice::from_ref(&value)).map(Some),
    }
}
