//! Dispatch tests
//!
//! Test suite organized by component:
//! - Conventions: flag mapping
//! - Native callables: argument passing, errors, panics, context
//! - Calls: the call variants on `Callable`
//! - Format building: scalars, nesting, truncation, misuse

#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::errors::{ErrorKind, PyError, PyResult};
    use crate::object::{Object, TypeTag};
    use crate::testing::with_python;
    use crate::views::{Callable, Dict, Float, Int, List, Module, Str, Tuple};

    fn text(obj: &Object) -> String {
        Str::try_from(obj.clone()).unwrap().to_str().unwrap().to_owned()
    }

    fn int_of(obj: Object) -> i64 {
        Int::try_from(obj).unwrap().to_i64().unwrap()
    }

    fn builtin(name: &str) -> Callable {
        let builtins = Module::import("builtins").unwrap();
        Callable::try_from(builtins.get_attr(name).unwrap()).unwrap()
    }

    // Host functions

    fn answer(_ctx: &Object) -> PyResult<Object> {
        Int::new(42).map(Into::into)
    }

    fn count_args(_ctx: &Object, args: &Tuple) -> PyResult<Object> {
        Int::from_usize(args.len()).map(Into::into)
    }

    fn echo_context(ctx: &Object, _args: &Tuple) -> PyResult<Object> {
        Ok(ctx.clone())
    }

    fn greet(_ctx: &Object, args: &Tuple, kwargs: Option<&Dict>) -> PyResult<Object> {
        let mut out = text(&args.get_item(0)?);
        if let Some(kwargs) = kwargs {
            if let Some(suffix) = kwargs.get_item_str("suffix")? {
                out.push_str(&text(&suffix));
            }
        }
        Str::new(&out).map(Into::into)
    }

    fn reject(_ctx: &Object, _args: &Tuple) -> PyResult<Object> {
        Err(PyError::out_of_range(3, 2))
    }

    fn reraise(_ctx: &Object, args: &Tuple) -> PyResult<Object> {
        let int = builtin("int");
        int.call1(&args.get_item(0)?)
    }

    fn explode(_ctx: &Object) -> PyResult<Object> {
        panic!("host bug");
    }

    fn nothing(_ctx: &Object) -> PyResult<Object> {
        Ok(Object::null())
    }

    // ===== Convention Tests =====

    #[test]
    fn convention_flags() {
        assert_eq!(CallingConvention::NoArgs.flags(), pyo3::ffi::METH_NOARGS);
        assert_eq!(CallingConvention::Positional.flags(), pyo3::ffi::METH_VARARGS);
        assert_ne!(CallingConvention::Keywords.flags() & pyo3::ffi::METH_KEYWORDS, 0);

        assert!(!CallingConvention::NoArgs.accepts_positional());
        assert!(CallingConvention::Positional.accepts_positional());
        assert!(!CallingConvention::Positional.accepts_keywords());
        assert!(CallingConvention::Keywords.accepts_keywords());
        assert_eq!(
            NativeFunction::Keywords(greet).convention(),
            CallingConvention::Keywords
        );
    }

    // ===== Native Callable Tests =====

    #[test]
    fn no_args_callable() {
        with_python(|| {
            let f = Callable::no_args("answer", answer, None).unwrap();
            assert!(f.is(TypeTag::Callable));
            assert_eq!(int_of(f.call0().unwrap()), 42);
            assert_eq!(f.callable_name(), "answer");
        });
    }

    #[test]
    fn no_args_callable_rejects_arguments() {
        with_python(|| {
            let f = Callable::no_args("answer", answer, None).unwrap();
            let err = f.call_args(&[Int::new(1).unwrap().into()]).unwrap_err();
            assert!(err.is_foreign("TypeError"));
            assert!(!PyError::occurred());
        });
    }

    #[test]
    fn positional_callable_counts_args() {
        with_python(|| {
            let f = Callable::positional("count", count_args, None).unwrap();
            assert_eq!(int_of(f.call0().unwrap()), 0);

            let args: Vec<Object> = (0..3).map(|i| Int::new(i).unwrap().into()).collect();
            assert_eq!(int_of(f.call_args(&args).unwrap()), 3);
        });
    }

    #[test]
    fn positional_callable_rejects_keywords() {
        with_python(|| {
            let f = Callable::positional("count", count_args, None).unwrap();
            let kwargs = Dict::new().unwrap();
            kwargs.set_item_str("x", &Object::none()).unwrap();
            let err = f.call(None, Some(&kwargs)).unwrap_err();
            assert!(err.is_foreign("TypeError"));
        });
    }

    #[test]
    fn keywords_callable_sees_kwargs() {
        with_python(|| {
            let f = Callable::keywords("greet", greet, None).unwrap();
            let args = Tuple::from_items(&[Str::new("hello").unwrap().into()]).unwrap();
            let kwargs = Dict::new().unwrap();
            kwargs
                .set_item_str("suffix", &Str::new(" world!").unwrap())
                .unwrap();

            assert_eq!(text(&f.call(Some(&args), Some(&kwargs)).unwrap()), "hello world!");
            assert_eq!(text(&f.call(Some(&args), None).unwrap()), "hello");
        });
    }

    #[test]
    fn context_defaults_to_none() {
        with_python(|| {
            let f = Callable::positional("ctx", echo_context, None).unwrap();
            assert!(f.call0().unwrap().is_none());

            let marker = List::new().unwrap().into_object();
            let g = Callable::positional("ctx", echo_context, Some(&marker)).unwrap();
            assert_eq!(g.call0().unwrap(), marker);
        });
    }

    #[test]
    fn context_lives_as_long_as_callable() {
        with_python(|| {
            let marker = List::new().unwrap().into_object();
            let base = marker.ref_count().unwrap();

            let f = Callable::positional("ctx", echo_context, Some(&marker)).unwrap();
            assert_eq!(marker.ref_count(), Some(base + 1));

            drop(f);
            assert_eq!(marker.ref_count(), Some(base));
        });
    }

    #[test]
    fn host_errors_raise_mapped_exceptions() {
        with_python(|| {
            let f = Callable::positional("reject", reject, None).unwrap();
            let err = f.call0().unwrap_err();
            assert!(err.is_foreign("IndexError"));
            assert!(err.to_string().contains("out of range"));
        });
    }

    #[test]
    fn foreign_errors_pass_through() {
        with_python(|| {
            let f = Callable::positional("reraise", reraise, None).unwrap();
            let err = f.call_args(&[Str::new("nope").unwrap().into()]).unwrap_err();
            assert!(err.is_foreign("ValueError"));
            assert!(err.to_string().contains("nope"));
        });
    }

    #[test]
    fn panics_become_runtime_errors() {
        with_python(|| {
            let f = Callable::no_args("explode", explode, None).unwrap();
            let err = f.call0().unwrap_err();
            assert!(err.is_foreign("RuntimeError"));
            assert!(err.to_string().contains("host bug"));
        });
    }

    #[test]
    fn null_result_raises() {
        with_python(|| {
            let f = Callable::no_args("nothing", nothing, None).unwrap();
            let err = f.call0().unwrap_err();
            assert!(err.is_foreign("RuntimeError"));
            assert!(err.to_string().contains("null handle"));
            assert!(!PyError::occurred());
        });
    }

    #[test]
    fn interior_nul_in_name_rejected() {
        with_python(|| {
            let err = Callable::no_args("bad\0name", answer, None).unwrap_err();
            assert_eq!(err.kind, ErrorKind::NulByte { position: 3 });
        });
    }

    // ===== Call Tests =====

    #[test]
    fn call_variants() {
        with_python(|| {
            let abs = builtin("abs");
            assert_eq!(int_of(abs.call1(&Int::new(-4).unwrap()).unwrap()), 4);

            let args = Tuple::from_items(&[Int::new(-2).unwrap().into()]).unwrap();
            assert_eq!(int_of(abs.call_object(Some(&args)).unwrap()), 2);
            assert_eq!(int_of(abs.call(Some(&args), None).unwrap()), 2);

            let list = builtin("list");
            assert_eq!(list.call0().unwrap().len().unwrap(), 0);
            assert_eq!(abs.callable_name(), "abs");
        });
    }

    #[test]
    fn trace_name_skips_user_attribute_hooks() {
        with_python(|| {
            let runtime = crate::runtime::Runtime::attach().unwrap();
            runtime
                .execute(
                    "class DispatchRecorder:\n\
                     \x20   lookups = 0\n\
                     \x20   def __call__(self):\n\
                     \x20       return 1\n\
                     \x20   def __getattribute__(self, name):\n\
                     \x20       DispatchRecorder.lookups += 1\n\
                     \x20       return object.__getattribute__(self, name)\n\
                     dispatch_recorder = DispatchRecorder()\n",
                )
                .unwrap();
            let main = Module::import("__main__").unwrap();
            let recorder = Callable::try_from(main.get_attr("dispatch_recorder").unwrap()).unwrap();
            let lookups = || int_of(main.get_attr("DispatchRecorder").unwrap().get_attr("lookups").unwrap());

            assert_eq!(recorder.trace_name(), "DispatchRecorder");
            assert_eq!(int_of(recorder.call0().unwrap()), 1);
            assert_eq!(lookups(), 0);

            assert_eq!(builtin("abs").trace_name(), "abs");
            let f = Callable::no_args("answer", answer, None).unwrap();
            assert_eq!(f.trace_name(), "answer");
        });
    }

    #[test]
    fn call_null_callable() {
        with_python(|| {
            let f = Callable::default();
            assert_eq!(f.call0().unwrap_err().kind, ErrorKind::NullHandle);
        });
    }

    #[test]
    fn call_format_single_value_is_one_argument() {
        with_python(|| {
            let abs = builtin("abs");
            assert_eq!(int_of(abs.call_format("i", &[(-9).into()]).unwrap()), 9);

            let max = builtin("max");
            let result = max.call_format("(iii)", &[3.into(), 7.into(), 5.into()]).unwrap();
            assert_eq!(int_of(result), 7);

            let list = builtin("list");
            assert_eq!(list.call_format("", &[]).unwrap().len().unwrap(), 0);
        });
    }

    // ===== Format Building Tests =====

    #[test]
    fn build_value_shapes() {
        with_python(|| {
            assert!(build_value("", &[]).unwrap().is_none());

            let single = build_value("i", &[5.into()]).unwrap().unwrap();
            assert_eq!(int_of(single), 5);

            let pair = build_value("is", &[1.into(), "two".into()]).unwrap().unwrap();
            assert!(pair.is_exact(TypeTag::Tuple));
            assert_eq!(pair.len().unwrap(), 2);
        });
    }

    #[test]
    fn build_value_nesting() {
        with_python(|| {
            let value = build_value(
                "{s:[i,i], s:(d)}",
                &["ints".into(), 1.into(), 2.into(), "float".into(), 0.5.into()],
            )
            .unwrap()
            .unwrap();
            let dict = Dict::try_from(value).unwrap();

            let ints = dict.get_item_str("ints").unwrap().unwrap();
            assert!(ints.is_exact(TypeTag::List));
            assert_eq!(ints.len().unwrap(), 2);

            let floats = Tuple::try_from(dict.get_item_str("float").unwrap().unwrap()).unwrap();
            let half = Float::try_from(floats.get_item(0).unwrap()).unwrap();
            assert_eq!(half.to_f64().unwrap(), 0.5);
        });
    }

    #[test]
    fn build_value_strings_and_bytes() {
        with_python(|| {
            let none = build_value("z", &[Option::<&str>::None.into()]).unwrap().unwrap();
            assert!(none.is_none());

            let bytes = build_value("y", &[b"raw".as_slice().into()]).unwrap().unwrap();
            assert!(bytes.is_exact(TypeTag::Bytes));

            let ch = build_value("C", &['é'.into()]).unwrap().unwrap();
            assert_eq!(text(&ch), "é");

            let byte = build_value("c", &['A'.into()]).unwrap().unwrap();
            assert_eq!(byte.repr().unwrap(), "b'A'");
        });
    }

    #[test]
    fn build_value_truncates_to_c_width() {
        with_python(|| {
            let value = build_value("b", &[300.into()]).unwrap().unwrap();
            assert_eq!(int_of(value), 44);

            let value = build_value("B", &[(-1).into()]).unwrap().unwrap();
            assert_eq!(int_of(value), 255);

            let value = build_value("H", &[70000.into()]).unwrap().unwrap();
            assert_eq!(int_of(value), 70000 - 65536);

            let value = build_value("K", &[u64::MAX.into()]).unwrap().unwrap();
            assert_eq!(Int::try_from(value).unwrap().to_u64().unwrap(), u64::MAX);
        });
    }

    #[test]
    fn build_value_object_codes() {
        with_python(|| {
            let list = List::new().unwrap().into_object();
            let value = build_value("O", &[(&list).into()]).unwrap().unwrap();
            assert_eq!(value, list);

            let null = Object::null();
            let err = build_value("N", &[(&null).into()]).unwrap_err();
            assert!(matches!(err.kind, ErrorKind::Format { .. }));
        });
    }

    #[test]
    fn build_value_misuse() {
        with_python(|| {
            let cases: &[(&str, Vec<FormatArg<'_>>)] = &[
                ("i", vec![]),
                ("i", vec![1.into(), 2.into()]),
                ("(i", vec![1.into()]),
                ("i)", vec![1.into()]),
                ("{i}", vec![1.into()]),
                ("q", vec![1.into()]),
                ("i", vec!["text".into()]),
            ];
            for (format, args) in cases {
                let err = build_value(format, args).unwrap_err();
                assert!(
                    matches!(err.kind, ErrorKind::Format { .. }),
                    "{:?} gave {:?}",
                    format,
                    err
                );
            }
        });
    }
}
