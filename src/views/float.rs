//! Floating point objects (`float`)

use super::Str;
use crate::errors::{PyError, PyResult};
use crate::object::TypeTag;
use pyo3::ffi;

typed_view! {
    /// Handle to a `float` object
    Float => TypeTag::Float
}

impl Float {
    pub fn new(value: f64) -> PyResult<Self> {
        unsafe { Self::from_owned_or_err(ffi::PyFloat_FromDouble(value)) }
    }

    /// Parse with the interpreter's `float()` rules
    pub fn parse(text: &str) -> PyResult<Self> {
        let text = Str::new(text)?;
        unsafe { Self::from_owned_or_err(ffi::PyFloat_FromString(text.as_ptr())) }
    }

    pub fn to_f64(&self) -> PyResult<f64> {
        let ptr = self.checked_ptr()?;
        let value = unsafe { ffi::PyFloat_AsDouble(ptr) };
        if value == -1.0 && PyError::occurred() {
            Err(PyError::fetch())
        } else {
            Ok(value)
        }
    }

    /// Narrowed with a native `as` cast
    pub fn to_f32(&self) -> PyResult<f32> {
        self.to_f64().map(|v| v as f32)
    }
}
