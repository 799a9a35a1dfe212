//! Native wide strings (`wchar_t`: UTF-32 on Unix, UTF-16 on Windows)

use crate::errors::{ErrorKind, PyError, PyResult};
use libc::wchar_t;
use smallvec::SmallVec;
use std::fmt;

/// Owned, NUL-terminated wide string built without the interpreter
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct WideString {
    // Always ends with a single 0
    units: SmallVec<[wchar_t; 32]>,
}

impl WideString {
    /// Encode `text`; interior NULs are rejected
    pub fn new(text: &str) -> PyResult<Self> {
        if let Some(position) = text.find('\0') {
            return Err(PyError::new(ErrorKind::NulByte { position }));
        }
        let mut units: SmallVec<[wchar_t; 32]> = encode_units(text).collect();
        units.push(0);
        Ok(Self { units })
    }

    /// Copy wide units, stopping at the first NUL if present
    pub fn from_wide(wide: &[wchar_t]) -> Self {
        let end = wide.iter().position(|&c| c == 0).unwrap_or(wide.len());
        let mut units = SmallVec::with_capacity(end + 1);
        units.extend_from_slice(&wide[..end]);
        units.push(0);
        Self { units }
    }

    /// Units excluding the terminator
    pub fn as_wide(&self) -> &[wchar_t] {
        &self.units[..self.units.len() - 1]
    }

    pub fn as_wide_with_nul(&self) -> &[wchar_t] {
        &self.units
    }

    pub fn as_ptr(&self) -> *const wchar_t {
        self.units.as_ptr()
    }

    pub fn len(&self) -> usize {
        self.units.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn to_string_lossy(&self) -> String {
        wide_to_string_lossy(self.as_wide())
    }
}

impl fmt::Debug for WideString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WideString({:?})", self.to_string_lossy())
    }
}

impl fmt::Display for WideString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_string_lossy())
    }
}

#[cfg(not(windows))]
fn encode_units(text: &str) -> impl Iterator<Item = wchar_t> + '_ {
    text.chars().map(|c| c as u32 as wchar_t)
}

#[cfg(windows)]
fn encode_units(text: &str) -> impl Iterator<Item = wchar_t> + '_ {
    text.encode_utf16().map(|u| u as wchar_t)
}

/// Decode wide units, replacing invalid scalars with U+FFFD
#[cfg(not(windows))]
pub fn wide_to_string_lossy(wide: &[wchar_t]) -> String {
    wide.iter()
        .map(|&c| char::from_u32(c as u32).unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect()
}

/// Decode wide units, replacing unpaired surrogates with U+FFFD
#[cfg(windows)]
pub fn wide_to_string_lossy(wide: &[wchar_t]) -> String {
    char::decode_utf16(wide.iter().map(|&u| u as u16))
        .map(|r| r.unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_appends_terminator() {
        let wide = WideString::new("abc").unwrap();
        assert_eq!(wide.len(), 3);
        assert_eq!(wide.as_wide_with_nul().last(), Some(&0));
        assert_eq!(wide.to_string(), "abc");
    }

    #[test]
    fn interior_nul_is_rejected() {
        let err = WideString::new("a\0b").unwrap_err();
        assert_eq!(err.kind, ErrorKind::NulByte { position: 1 });
    }

    #[test]
    fn from_wide_stops_at_nul() {
        let source = WideString::new("xy").unwrap();
        let mut units = source.as_wide_with_nul().to_vec();
        units.extend_from_slice(&[b'z' as wchar_t, 0]);
        assert_eq!(WideString::from_wide(&units), source);
    }

    #[test]
    fn non_ascii_round_trips() {
        let text = "naïve ☃ 𝄞";
        assert_eq!(WideString::new(text).unwrap().to_string_lossy(), text);
    }
}
