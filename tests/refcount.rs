mod common;

use common::with_python;
use pyhandle::ffi::thread_stats;
use pyhandle::{Dict, Int, List, Object, Str, Tuple};

fn fresh() -> Object {
    Dict::new().unwrap().into()
}

#[test]
fn test_clone_then_drop_restores_count() {
    with_python(|| {
        let obj = fresh();
        let before = obj.ref_count().unwrap();
        {
            let a = obj.clone();
            let b = a.clone();
            assert_eq!(obj.ref_count(), Some(before + 2));
            drop(b);
            assert_eq!(a.ref_count(), Some(before + 1));
        }
        assert_eq!(obj.ref_count(), Some(before));
    });
}

#[test]
fn test_move_does_not_touch_count() {
    with_python(|| {
        let obj = fresh();
        let before = obj.ref_count().unwrap();
        let moved = obj;
        assert_eq!(moved.ref_count(), Some(before));
    });
}

#[test]
fn test_double_release() {
    with_python(|| {
        let keep = fresh();
        let mut handle = keep.clone();
        let before = keep.ref_count().unwrap();

        handle.release();
        handle.release();

        assert_eq!(handle.ref_count(), None);
        assert!(handle.is_null());
        assert_eq!(keep.ref_count(), Some(before - 1));
    });
}

#[test]
fn test_containers_hold_their_own_references() {
    with_python(|| {
        let item = fresh();
        let before = item.ref_count().unwrap();

        let list = List::from_items(&[item.clone(), item.clone()]).unwrap();
        assert_eq!(item.ref_count(), Some(before + 2));

        let tuple = Tuple::from_items(&[item.clone()]).unwrap();
        assert_eq!(item.ref_count(), Some(before + 3));

        drop(list);
        drop(tuple);
        assert_eq!(item.ref_count(), Some(before));
    });
}

#[test]
fn test_view_conversion_keeps_one_reference() {
    with_python(|| {
        let text: Object = Str::new("shared text for refcount").unwrap().into();
        let before = text.ref_count().unwrap();

        let view = Str::try_from(text.clone()).unwrap();
        assert_eq!(text.ref_count(), Some(before + 1));

        let back: Object = view.into();
        assert_eq!(text.ref_count(), Some(before + 1));
        drop(back);
        assert_eq!(text.ref_count(), Some(before));
    });
}

#[test]
fn test_thread_stats_balance() {
    with_python(|| {
        let start = thread_stats();
        {
            let value: Object = Int::new(123_456).unwrap().into();
            let copies: Vec<Object> = (0..10).map(|_| value.clone()).collect();
            drop(copies);
        }
        let end = thread_stats();
        assert_eq!(end.increments - start.increments, 10);
        assert_eq!(end.balance() - start.balance(), 0);
    });
}
