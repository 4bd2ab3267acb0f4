use serde_json::json;

use crate::value::{is_dangerous_key, is_truthy, is_truthy_opt, lookup_path, to_display_string};

#[test]
fn falsy_values() {
    for value in [json!(null), json!(false), json!(0), json!(0.0), json!("")] {
        assert!(!is_truthy(&value), "expected falsy: {value}");
    }
    assert!(!is_truthy_opt(None));
}

#[test]
fn truthy_values() {
    for value in [
        json!(42),
        json!(-1),
        json!("x"),
        json!(true),
        json!([]),
        json!({}),
        json!([0]),
        json!(0.5),
    ] {
        assert!(is_truthy(&value), "expected truthy: {value}");
    }
}

#[test]
fn lookup_navigates_objects_and_arrays() {
    let root = json!({"items": [{"name": "first"}, {"name": "second"}]});

    let path = ["items".to_owned(), "1".to_owned(), "name".to_owned()];
    assert_eq!(lookup_path(&root, &path), Some(&json!("second")));
}

#[test]
fn lookup_misses_resolve_to_undefined() {
    let root = json!({"a": {"b": 1}});

    assert_eq!(lookup_path(&root, &["a".into(), "missing".into()]), None);
    assert_eq!(lookup_path(&root, &["a".into(), "b".into(), "c".into()]), None);
    assert_eq!(lookup_path(&root, &["0".into()]), None);
}

#[test]
fn dangerous_keys_are_never_traversed() {
    let root = json!({"__proto__": {"polluted": true}, "constructor": 1});

    assert!(is_dangerous_key("__proto__"));
    assert_eq!(lookup_path(&root, &["__proto__".into(), "polluted".into()]), None);
    assert_eq!(lookup_path(&root, &["constructor".into()]), None);
    assert_eq!(lookup_path(&root, &["prototype".into()]), None);
}

#[test]
fn display_rendering() {
    assert_eq!(to_display_string(None), "");
    assert_eq!(to_display_string(Some(&json!(null))), "");
    assert_eq!(to_display_string(Some(&json!("abc"))), "abc");
    assert_eq!(to_display_string(Some(&json!(7))), "7");
    assert_eq!(to_display_string(Some(&json!(true))), "true");
    assert_eq!(to_display_string(Some(&json!([1, 2]))), "[1,2]");
}
