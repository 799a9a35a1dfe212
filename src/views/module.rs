//! Module objects and import

use super::{Dict, Str};
use crate::encoding::NarrowStr;
use crate::errors::PyResult;
use crate::logging::{log_module_import, perf};
use crate::object::{Object, TypeTag};
use pyo3::ffi;
use std::os::raw::c_int;
use std::ptr;

typed_view! {
    /// Handle to a `module` object
    Module => TypeTag::Module
}

#[inline]
fn ptr_or_null(obj: Option<&Object>) -> *mut ffi::PyObject {
    obj.map_or(ptr::null_mut(), |o| o.as_ptr())
}

impl Module {
    /// `import name`; runs module code on first import
    pub fn import<'n>(name: impl Into<NarrowStr<'n>>) -> PyResult<Self> {
        let name = name.into();
        let cname = name.as_cstr()?;
        let _guard = perf::track("module_import");
        log_module_import(&name.to_string_lossy());
        let module = unsafe { Object::from_owned_or_err(ffi::PyImport_ImportModule(cname.as_ptr())) }
            .map_err(|e| e.with_context(format!("import {}", name.to_string_lossy())))?;
        Self::try_from(module)
    }

    /// `__import__(name, globals, locals, fromlist, level)`.
    ///
    /// Without a `fromlist` a dotted name yields the top-level package.
    pub fn import_level(
        name: &Str,
        globals: Option<&Dict>,
        locals: Option<&Dict>,
        fromlist: Option<&Object>,
        level: i32,
    ) -> PyResult<Self> {
        let name_ptr = name.checked_ptr()?;
        log_module_import(&name.to_string());
        let module = unsafe {
            Object::from_owned_or_err(ffi::PyImport_ImportModuleLevelObject(
                name_ptr,
                ptr_or_null(globals.map(|g| g.as_object())),
                ptr_or_null(locals.map(|l| l.as_object())),
                ptr_or_null(fromlist),
                level as c_int,
            ))?
        };
        Self::try_from(module)
    }

    /// `__file__`; builtin modules have none and raise `SystemError`
    pub fn file_name(&self) -> PyResult<String> {
        let ptr = self.checked_ptr()?;
        let path = unsafe { Str::from_owned_or_err(ffi::PyModule_GetFilenameObject(ptr))? };
        path.to_str().map(str::to_owned)
    }

    /// `__name__`
    pub fn name(&self) -> PyResult<String> {
        let ptr = self.checked_ptr()?;
        let name = unsafe { Str::from_owned_or_err(ffi::PyModule_GetNameObject(ptr))? };
        name.to_str().map(str::to_owned)
    }

    /// Module namespace (shared, not a copy)
    pub fn dict(&self) -> PyResult<Dict> {
        let ptr = self.checked_ptr()?;
        let dict = unsafe { Object::from_borrowed_or_err(ffi::PyModule_GetDict(ptr))? };
        Dict::try_from(dict)
    }
}
