//! Encoding bridge tests
//!
//! - Locale: encode/decode through the interpreter
//! - Facades: lazy, single conversion and source passthrough

#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::errors::ErrorKind;
    use crate::testing::with_python;
    use std::ffi::{CStr, CString};

    // ===== Locale Tests =====

    #[test]
    fn encode_then_decode_ascii() {
        with_python(|| {
            let wide = WideString::new("hello locale").unwrap();
            let encoded = EncodedString::encode(wide.as_wide_with_nul()).unwrap();
            assert_eq!(encoded.as_bytes(), b"hello locale");

            let decoded = DecodedString::decode(encoded.as_cstr()).unwrap();
            assert_eq!(decoded.as_wide(), wide.as_wide());
            assert_eq!(decoded.to_string_lossy(), "hello locale");
        });
    }

    #[test]
    fn encode_requires_terminator() {
        with_python(|| {
            let wide = WideString::new("abc").unwrap();
            let err = EncodedString::encode(wide.as_wide()).unwrap_err();
            assert_eq!(err.kind, ErrorKind::NulByte { position: 3 });
        });
    }

    // ===== Narrow Facade Tests =====

    #[test]
    fn narrow_from_cstr_needs_no_conversion() {
        let source = CString::new("module").unwrap();
        let narrow = NarrowStr::from(source.as_c_str());
        assert_eq!(narrow.as_cstr().unwrap(), source.as_c_str());
        assert!(!narrow.is_converted());
    }

    #[test]
    fn narrow_from_text_converts_once() {
        let narrow = NarrowStr::from("attr");
        let first = narrow.as_cstr().unwrap().as_ptr();
        assert!(narrow.is_converted());
        let second = narrow.as_cstr().unwrap().as_ptr();
        assert_eq!(first, second);
        assert_eq!(narrow.as_text(), Some("attr"));
    }

    #[test]
    fn narrow_from_text_rejects_interior_nul() {
        let narrow = NarrowStr::from("a\0b");
        let err = narrow.as_cstr().unwrap_err();
        assert_eq!(err.kind, ErrorKind::NulByte { position: 1 });
    }

    #[test]
    fn narrow_from_wide_encodes_with_locale() {
        with_python(|| {
            let wide = WideString::new("wide text").unwrap();
            let narrow = NarrowStr::from(&wide);
            assert_eq!(narrow.wide_source(), Some(wide.as_wide()));
            assert_eq!(narrow.as_cstr().unwrap().to_bytes(), b"wide text");
            assert_eq!(narrow.to_string_lossy(), "wide text");
        });
    }

    // ===== Wide Facade Tests =====

    #[test]
    fn wide_from_terminated_slice_is_borrowed() {
        let owned = WideString::new("xyz").unwrap();
        let wide = WideStr::from(&owned);
        assert_eq!(wide.as_wide_with_nul().unwrap().as_ptr(), owned.as_ptr());
        assert!(!wide.is_converted());
    }

    #[test]
    fn wide_from_unterminated_slice_copies() {
        let owned = WideString::new("xyz").unwrap();
        let wide = WideStr::from(owned.as_wide());
        assert_eq!(wide.as_wide().unwrap(), owned.as_wide());
        assert!(wide.is_converted());
    }

    #[test]
    fn wide_from_text_encodes_directly() {
        let wide = WideStr::from("ünï");
        assert_eq!(wide_to_string_lossy(wide.as_wide().unwrap()), "ünï");
    }

    #[test]
    fn wide_from_cstr_decodes_with_locale() {
        with_python(|| {
            let source: &CStr = CStr::from_bytes_with_nul(b"plain\0").unwrap();
            let wide = WideStr::from(source);
            assert_eq!(wide_to_string_lossy(wide.as_wide().unwrap()), "plain");
            assert!(wide.is_converted());
        });
    }

    #[test]
    fn wide_from_narrow_facade_keeps_source() {
        let narrow = NarrowStr::from("shared");
        let wide = WideStr::from(&narrow);
        assert_eq!(wide.to_string_lossy(), "shared");
        assert_eq!(wide.as_wide().unwrap().len(), 6);
    }
}
