//! Narrow/wide facades accepted wherever the API takes text
//!
//! Each facade keeps its source and converts on first use only; the
//! converted buffer lives as long as the facade.

use super::locale::{DecodedString, EncodedString};
use super::wide::{wide_to_string_lossy, WideString};
use crate::errors::PyResult;
use libc::wchar_t;
use once_cell::unsync::OnceCell;
use std::borrow::Cow;
use std::ffi::{CStr, CString};
use std::fmt;

enum NarrowSource<'a> {
    Text(Cow<'a, str>),
    CStr(Cow<'a, CStr>),
    Wide(&'a [wchar_t]),
}

enum NarrowBuffer {
    Terminated(CString),
    Encoded(EncodedString),
}

/// Text usable as a NUL-terminated narrow string
pub struct NarrowStr<'a> {
    source: NarrowSource<'a>,
    converted: OnceCell<NarrowBuffer>,
}

impl<'a> NarrowStr<'a> {
    fn with_source(source: NarrowSource<'a>) -> Self {
        Self {
            source,
            converted: OnceCell::new(),
        }
    }

    /// Narrow form; wide sources are locale-encoded (interpreter lock required)
    pub fn as_cstr(&self) -> PyResult<&CStr> {
        match &self.source {
            NarrowSource::CStr(c) => Ok(&**c),
            NarrowSource::Text(text) => {
                let buffer = self
                    .converted
                    .get_or_try_init(|| CString::new(text.as_bytes()).map(NarrowBuffer::Terminated))?;
                Ok(buffer.as_cstr())
            }
            NarrowSource::Wide(wide) => {
                let buffer = self.converted.get_or_try_init(|| {
                    let owned;
                    let terminated = if wide.last() == Some(&0) {
                        *wide
                    } else {
                        owned = WideString::from_wide(wide);
                        owned.as_wide_with_nul()
                    };
                    EncodedString::encode(terminated).map(NarrowBuffer::Encoded)
                })?;
                Ok(buffer.as_cstr())
            }
        }
    }

    /// UTF-8 view when the source is already Rust text
    pub fn as_text(&self) -> Option<&str> {
        match &self.source {
            NarrowSource::Text(text) => Some(&**text),
            NarrowSource::CStr(c) => c.to_str().ok(),
            NarrowSource::Wide(_) => None,
        }
    }

    /// Original wide units, without terminator, when built from wide text
    pub fn wide_source(&self) -> Option<&[wchar_t]> {
        match &self.source {
            NarrowSource::Wide(wide) => {
                let end = wide.iter().position(|&c| c == 0).unwrap_or(wide.len());
                Some(&wide[..end])
            }
            _ => None,
        }
    }

    /// Best-effort rendering for logs and errors
    pub fn to_string_lossy(&self) -> String {
        match &self.source {
            NarrowSource::Text(text) => text.to_string(),
            NarrowSource::CStr(c) => c.to_string_lossy().into_owned(),
            NarrowSource::Wide(_) => wide_to_string_lossy(self.wide_source().unwrap_or_default()),
        }
    }

    /// True once a conversion buffer has been produced
    pub fn is_converted(&self) -> bool {
        self.converted.get().is_some()
    }
}

impl NarrowBuffer {
    fn as_cstr(&self) -> &CStr {
        match self {
            Self::Terminated(c) => c.as_c_str(),
            Self::Encoded(e) => e.as_cstr(),
        }
    }
}

impl<'a> From<&'a str> for NarrowStr<'a> {
    fn from(text: &'a str) -> Self {
        Self::with_source(NarrowSource::Text(Cow::Borrowed(text)))
    }
}

impl<'a> From<&'a String> for NarrowStr<'a> {
    fn from(text: &'a String) -> Self {
        Self::with_source(NarrowSource::Text(Cow::Borrowed(text.as_str())))
    }
}

impl From<String> for NarrowStr<'static> {
    fn from(text: String) -> Self {
        Self::with_source(NarrowSource::Text(Cow::Owned(text)))
    }
}

impl<'a> From<&'a CStr> for NarrowStr<'a> {
    fn from(text: &'a CStr) -> Self {
        Self::with_source(NarrowSource::CStr(Cow::Borrowed(text)))
    }
}

impl From<CString> for NarrowStr<'static> {
    fn from(text: CString) -> Self {
        Self::with_source(NarrowSource::CStr(Cow::Owned(text)))
    }
}

impl<'a> From<&'a WideString> for NarrowStr<'a> {
    fn from(wide: &'a WideString) -> Self {
        Self::with_source(NarrowSource::Wide(wide.as_wide_with_nul()))
    }
}

impl<'a> From<&'a [wchar_t]> for NarrowStr<'a> {
    fn from(wide: &'a [wchar_t]) -> Self {
        Self::with_source(NarrowSource::Wide(wide))
    }
}

impl fmt::Debug for NarrowStr<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NarrowStr")
            .field("text", &self.to_string_lossy())
            .field("converted", &self.is_converted())
            .finish()
    }
}

enum WideSource<'a> {
    Wide(&'a [wchar_t]),
    Text(Cow<'a, str>),
    CStr(&'a CStr),
}

enum WideBuffer {
    Owned(WideString),
    Decoded(DecodedString),
}

impl WideBuffer {
    fn as_wide_with_nul(&self) -> &[wchar_t] {
        match self {
            Self::Owned(w) => w.as_wide_with_nul(),
            Self::Decoded(d) => d.as_wide_with_nul(),
        }
    }
}

/// Text usable as a NUL-terminated wide string
pub struct WideStr<'a> {
    source: WideSource<'a>,
    converted: OnceCell<WideBuffer>,
}

impl<'a> WideStr<'a> {
    fn with_source(source: WideSource<'a>) -> Self {
        Self {
            source,
            converted: OnceCell::new(),
        }
    }

    /// Wide form including the terminator.
    ///
    /// Rust text is encoded directly; narrow C strings are locale-decoded.
    pub fn as_wide_with_nul(&self) -> PyResult<&[wchar_t]> {
        match &self.source {
            WideSource::Wide(wide) if wide.last() == Some(&0) => Ok(*wide),
            WideSource::Wide(wide) => Ok(self
                .converted
                .get_or_init(|| WideBuffer::Owned(WideString::from_wide(wide)))
                .as_wide_with_nul()),
            WideSource::Text(text) => {
                let buffer = self
                    .converted
                    .get_or_try_init(|| WideString::new(text).map(WideBuffer::Owned))?;
                Ok(buffer.as_wide_with_nul())
            }
            WideSource::CStr(c) => {
                let buffer = self
                    .converted
                    .get_or_try_init(|| DecodedString::decode(c).map(WideBuffer::Decoded))?;
                Ok(buffer.as_wide_with_nul())
            }
        }
    }

    /// Wide form without the terminator
    pub fn as_wide(&self) -> PyResult<&[wchar_t]> {
        let wide = self.as_wide_with_nul()?;
        let end = wide.iter().position(|&c| c == 0).unwrap_or(wide.len());
        Ok(&wide[..end])
    }

    pub fn to_string_lossy(&self) -> String {
        match &self.source {
            WideSource::Text(text) => text.to_string(),
            WideSource::CStr(c) => c.to_string_lossy().into_owned(),
            WideSource::Wide(wide) => {
                let end = wide.iter().position(|&c| c == 0).unwrap_or(wide.len());
                wide_to_string_lossy(&wide[..end])
            }
        }
    }

    pub fn is_converted(&self) -> bool {
        self.converted.get().is_some()
    }
}

impl<'a> From<&'a [wchar_t]> for WideStr<'a> {
    fn from(wide: &'a [wchar_t]) -> Self {
        Self::with_source(WideSource::Wide(wide))
    }
}

impl<'a> From<&'a WideString> for WideStr<'a> {
    fn from(wide: &'a WideString) -> Self {
        Self::with_source(WideSource::Wide(wide.as_wide_with_nul()))
    }
}

impl<'a> From<&'a str> for WideStr<'a> {
    fn from(text: &'a str) -> Self {
        Self::with_source(WideSource::Text(Cow::Borrowed(text)))
    }
}

impl From<String> for WideStr<'static> {
    fn from(text: String) -> Self {
        Self::with_source(WideSource::Text(Cow::Owned(text)))
    }
}

impl<'a> From<&'a CStr> for WideStr<'a> {
    fn from(text: &'a CStr) -> Self {
        Self::with_source(WideSource::CStr(text))
    }
}

impl<'a> From<&'a NarrowStr<'a>> for WideStr<'a> {
    fn from(narrow: &'a NarrowStr<'a>) -> Self {
        match &narrow.source {
            NarrowSource::Text(text) => Self::with_source(WideSource::Text(Cow::Borrowed(&**text))),
            NarrowSource::CStr(c) => Self::with_source(WideSource::CStr(&**c)),
            NarrowSource::Wide(wide) => Self::with_source(WideSource::Wide(*wide)),
        }
    }
}

impl fmt::Debug for WideStr<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WideStr")
            .field("text", &self.to_string_lossy())
            .field("converted", &self.is_converted())
            .finish()
    }
}
