//! Handle tests
//!
//! Test suite organized by component:
//! - Ownership: adopt/borrow, clone/drop, release
//! - Protocols: attributes, text conversion, truthiness, equality
//! - Type tags: classification and predicates

#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::errors::ErrorKind;
    use crate::testing::with_python;
    use crate::views::{Dict, Float, Int, List, Module, Str, Tuple};

    fn fresh() -> Object {
        List::new().unwrap().into()
    }

    // ===== Ownership Tests =====

    #[test]
    fn clone_adds_one_reference() {
        with_python(|| {
            let obj = fresh();
            let base = obj.ref_count().unwrap();

            let copy = obj.clone();
            assert_eq!(obj.ref_count(), Some(base + 1));
            assert_eq!(copy, obj);

            drop(copy);
            assert_eq!(obj.ref_count(), Some(base));
        });
    }

    #[test]
    fn borrow_increments_adopt_does_not() {
        with_python(|| {
            let obj = fresh();
            let base = obj.ref_count().unwrap();

            let borrowed = unsafe { Object::new(obj.as_ptr(), Ownership::Borrow) };
            assert_eq!(obj.ref_count(), Some(base + 1));

            // Hand the borrowed reference back through `into_ptr` and adopt it
            let adopted = unsafe { Object::new(borrowed.into_ptr(), Ownership::Adopt) };
            assert_eq!(obj.ref_count(), Some(base + 1));

            drop(adopted);
            assert_eq!(obj.ref_count(), Some(base));
        });
    }

    #[test]
    fn release_is_idempotent() {
        with_python(|| {
            let obj = fresh();
            let mut copy = obj.clone();
            let base = obj.ref_count().unwrap();

            copy.release();
            assert!(copy.is_null());
            assert_eq!(copy.ref_count(), None);
            assert_eq!(obj.ref_count(), Some(base - 1));

            copy.release();
            assert_eq!(obj.ref_count(), Some(base - 1));
        });
    }

    #[test]
    fn add_ref_is_untracked() {
        with_python(|| {
            let obj = fresh();
            let base = obj.ref_count().unwrap();
            obj.add_ref();
            assert_eq!(obj.ref_count(), Some(base + 1));
            unsafe { crate::ffi::decref(obj.as_ptr()) };
            assert_eq!(obj.ref_count(), Some(base));
        });
    }

    #[test]
    fn null_handle_reports_null() {
        let obj = Object::null();
        assert!(obj.is_null());
        assert!(!obj.is_valid());
        assert_eq!(obj.ref_count(), None);
        assert_eq!(obj.type_name(), None);
        assert_eq!(obj.to_string(), "<null>");
        assert_eq!(Object::default(), Object::null());
    }

    #[test]
    fn null_handle_operations_fail() {
        with_python(|| {
            let obj = Object::null();
            assert_eq!(obj.len().unwrap_err().kind, ErrorKind::NullHandle);
            assert_eq!(obj.get_attr("x").unwrap_err().kind, ErrorKind::NullHandle);
            assert!(!obj.has_attr("x"));
        });
    }

    // ===== Protocol Tests =====

    #[test]
    fn attributes_round_trip() {
        with_python(|| {
            let module = Module::import("types").unwrap();
            let namespace = module
                .get_attr("SimpleNamespace")
                .and_then(crate::views::Callable::try_from)
                .unwrap()
                .call0()
                .unwrap();

            let value: Object = Int::new(7).unwrap().into();
            namespace.set_attr("answer", &value).unwrap();
            assert!(namespace.has_attr("answer"));
            assert_eq!(namespace.get_attr("answer").unwrap(), value);

            let err = namespace.get_attr("missing").unwrap_err();
            assert!(err.is_foreign("AttributeError"));
            assert!(err.to_string().contains("getattr missing"));
            assert!(!PyError::occurred());
        });
    }

    #[test]
    fn text_conversions() {
        with_python(|| {
            let text: Object = Str::new("hi").unwrap().into();
            assert_eq!(text.str().unwrap(), "hi");
            assert_eq!(text.repr().unwrap(), "'hi'");
            assert_eq!(text.type_name().as_deref(), Some("str"));
            assert!(text.type_doc().is_some());
            assert_eq!(format!("{}", text), "hi");
        });
    }

    #[test]
    fn len_and_truthiness() {
        with_python(|| {
            let empty = fresh();
            assert_eq!(empty.len().unwrap(), 0);
            assert!(empty.is_empty().unwrap());
            assert!(!empty.is_truthy().unwrap());

            let err = Float::new(1.5).unwrap().len().unwrap_err();
            assert!(err.is_foreign("TypeError"));
        });
    }

    #[test]
    fn rich_eq_compares_values() {
        with_python(|| {
            let a: Object = Int::new(1000).unwrap().into();
            let b: Object = Int::parse("1000", 10).unwrap().into();
            assert!(a.rich_eq(&b).unwrap());
            assert!(!a.rich_eq(&Object::none()).unwrap());
        });
    }

    // ===== Type Tag Tests =====

    #[test]
    fn bool_is_int_but_tagged_bool() {
        with_python(|| {
            let truth = crate::views::Int::from_i64(1).unwrap();
            let flag = unsafe { Object::from_owned_ptr(pyo3::ffi::PyBool_FromLong(1)) };

            assert!(flag.is(TypeTag::Int));
            assert!(flag.is_exact(TypeTag::Bool));
            assert!(!flag.is_exact(TypeTag::Int));
            assert_eq!(flag.type_tag(), Some(TypeTag::Bool));
            assert_eq!(truth.type_tag(), Some(TypeTag::Int));
        });
    }

    #[test]
    fn containers_are_tagged() {
        with_python(|| {
            assert_eq!(fresh().type_tag(), Some(TypeTag::List));
            assert_eq!(Tuple::empty().unwrap().type_tag(), Some(TypeTag::Tuple));
            assert_eq!(Dict::new().unwrap().type_tag(), Some(TypeTag::Dict));
            assert_eq!(Object::none().type_tag(), Some(TypeTag::None));
            assert!(Object::none().is_none());
        });
    }

    #[test]
    fn protocol_predicates() {
        with_python(|| {
            let builtins = Module::import("builtins").unwrap();
            let len = builtins.get_attr("len").unwrap();
            assert!(len.is_callable());
            assert!(len.is(TypeTag::Callable));
            assert!(!len.is_exact(TypeTag::Callable));

            assert!(Float::new(2.0).unwrap().is_number());
            assert!(!fresh().is_number());

            let frozen = builtins.get_attr("frozenset").unwrap();
            let frozen = crate::views::Callable::try_from(frozen).unwrap().call0().unwrap();
            assert!(frozen.is_any_set());
            assert!(frozen.is(TypeTag::FrozenSet));
        });
    }

    #[test]
    fn null_has_no_tag() {
        let obj = Object::null();
        assert_eq!(obj.type_tag(), None);
        assert!(!obj.is(TypeTag::Other));
        assert!(!obj.is_none());
    }

    #[test]
    fn tag_names() {
        assert_eq!(TypeTag::Bool.name(), "bool");
        assert_eq!(TypeTag::ContextToken.to_string(), "Token");
        assert_eq!(TypeTag::Callable.type_object(), None);
    }
}
