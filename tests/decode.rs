use std::collections::HashMap;

use serde::Deserialize;
use serde_yaml11::{from_str, Value};

fn value(y: &str) -> Value {
    from_str(y).expect("valid YAML")
}

fn map1(key: &str, v: Value) -> Value {
    Value::Mapping(vec![(Value::from(key), v)])
}

#[derive(Debug, Deserialize, PartialEq)]
struct Empty {}

#[test]
fn empty_and_trivial_documents() {
    assert_eq!(from_str::<Empty>("").unwrap(), Empty {});
    assert_eq!(from_str::<Empty>("{}").unwrap(), Empty {});
    assert_eq!(value(""), Value::Null);
}

#[test]
fn strings_keep_raw_text() {
    let m: HashMap<String, String> = from_str("v: hi").unwrap();
    assert_eq!(m["v"], "hi");
    assert_eq!(value("v: hi"), map1("v", Value::from("hi")));

    // A string target takes the raw text even when the scalar resolves to a
    // boolean.
    let m: HashMap<String, String> = from_str("v: true").unwrap();
    assert_eq!(m["v"], "true");
    assert_eq!(value("v: true"), map1("v", Value::Bool(true)));
}

#[test]
fn integers_without_type_hints() {
    assert_eq!(value("v: 10"), map1("v", Value::Int(10)));
    assert_eq!(value("v: 0b10"), map1("v", Value::Int(2)));
    assert_eq!(value("v: 0xA"), map1("v", Value::Int(10)));
    assert_eq!(value("v: 4294967296"), map1("v", Value::Int(4294967296)));
    assert_eq!(value("v: -10"), map1("v", Value::Int(-10)));

    let m: HashMap<String, i64> = from_str("v: 4294967296").unwrap();
    assert_eq!(m["v"], 4294967296);
}

#[test]
fn floats_without_type_hints() {
    assert_eq!(value("v: 0.1"), map1("v", Value::Float(0.1)));
    assert_eq!(value("v: .1"), map1("v", Value::Float(0.1)));
    assert_eq!(value("v: -.1"), map1("v", Value::Float(-0.1)));
    assert_eq!(value("v: .Inf"), map1("v", Value::Float(f64::INFINITY)));
    assert_eq!(value("v: -.Inf"), map1("v", Value::Float(f64::NEG_INFINITY)));
    assert_eq!(value("neginf: -.inf"), map1("neginf", Value::Float(f64::NEG_INFINITY)));
    assert!(value("notanum: .NaN")
        .get("notanum")
        .and_then(Value::as_f64)
        .unwrap()
        .is_nan());
}

#[test]
fn top_level_scalar() {
    let n: i64 = from_str("123").unwrap();
    assert_eq!(n, 123);
}

#[test]
fn floats_from_the_yaml_spec() {
    assert_eq!(value("canonical: 6.8523e+5"), map1("canonical", Value::Float(6.8523e+5)));
    assert_eq!(value("expo: 685.230_15e+03"), map1("expo", Value::Float(685.23015e+03)));
    assert_eq!(value("fixed: 685_230.15"), map1("fixed", Value::Float(685230.15)));

    let m: HashMap<String, f64> = from_str("fixed: 685_230.15").unwrap();
    assert_eq!(m["fixed"], 685230.15);
}

#[test]
fn bools_from_the_yaml_spec() {
    assert_eq!(value("canonical: y"), map1("canonical", Value::Bool(true)));
    assert_eq!(value("answer: NO"), map1("answer", Value::Bool(false)));
    assert_eq!(value("logical: True"), map1("logical", Value::Bool(true)));
    assert_eq!(value("option: on"), map1("option", Value::Bool(true)));

    let m: HashMap<String, bool> = from_str("option: on").unwrap();
    assert!(m["option"]);
}

#[test]
fn ints_from_the_yaml_spec() {
    assert_eq!(value("canonical: 685230"), map1("canonical", Value::Int(685230)));
    assert_eq!(value("decimal: +685_230"), map1("decimal", Value::Int(685230)));
    assert_eq!(value("octal: 02472256"), map1("octal", Value::Int(685230)));
    assert_eq!(value("hexa: 0x_0A_74_AE"), map1("hexa", Value::Int(685230)));
    assert_eq!(
        value("bin: 0b1010_0111_0100_1010_1110"),
        map1("bin", Value::Int(685230))
    );
    assert_eq!(value("bin: -0b101010"), map1("bin", Value::Int(-42)));

    let m: HashMap<String, i64> = from_str("decimal: +685_230").unwrap();
    assert_eq!(m["decimal"], 685230);
}

#[test]
fn nulls_from_the_yaml_spec() {
    assert_eq!(value("empty:"), map1("empty", Value::Null));
    assert_eq!(value("canonical: ~"), map1("canonical", Value::Null));
    assert_eq!(value("english: null"), map1("english", Value::Null));
    assert_eq!(
        value("~: null key"),
        Value::Mapping(vec![(Value::Null, Value::from("null key"))])
    );

    let m: HashMap<String, Option<bool>> = from_str("empty:").unwrap();
    assert_eq!(m["empty"], None);
}

#[test]
fn sequences() {
    assert_eq!(
        value("seq: [A,B]"),
        map1("seq", Value::Sequence(vec![Value::from("A"), Value::from("B")]))
    );

    let m: HashMap<String, Vec<String>> = from_str("seq: [A,B,C]").unwrap();
    assert_eq!(m["seq"], ["A", "B", "C"]);

    // Raw text again: integers in a string sequence keep their spelling.
    let m: HashMap<String, Vec<String>> = from_str("seq: [A,1,C]").unwrap();
    assert_eq!(m["seq"], ["A", "1", "C"]);

    assert_eq!(
        value("seq: [A,1,C]"),
        map1(
            "seq",
            Value::Sequence(vec![Value::from("A"), Value::Int(1), Value::from("C")])
        )
    );
}

#[test]
fn mismatching_sequence_elements_are_dropped() {
    let m: HashMap<String, Vec<i64>> = from_str("seq: [A,1,C]").unwrap();
    assert_eq!(m["seq"], [1]);
}

#[test]
fn untyped_nested_mapping() {
    assert_eq!(
        value("a: {b: c}"),
        map1("a", map1("b", Value::from("c")))
    );
}

#[derive(Debug, Deserialize, PartialEq, Default)]
#[serde(default)]
struct Inner {
    b: String,
}

#[test]
fn structs_and_type_conversions() {
    #[derive(Debug, Deserialize, PartialEq)]
    struct Hello {
        hello: String,
    }
    assert_eq!(
        from_str::<Hello>("hello: world").unwrap(),
        Hello { hello: "world".into() }
    );

    #[derive(Debug, Deserialize, PartialEq)]
    struct Nested {
        a: Inner,
    }
    assert_eq!(
        from_str::<Nested>("a: {b: c}").unwrap(),
        Nested { a: Inner { b: "c".into() } }
    );

    #[derive(Debug, Deserialize, PartialEq)]
    struct NestedOpt {
        a: Option<Inner>,
    }
    assert_eq!(
        from_str::<NestedOpt>("a: {b: c}").unwrap(),
        NestedOpt { a: Some(Inner { b: "c".into() }) }
    );

    #[derive(Debug, Deserialize, PartialEq)]
    struct WithMap {
        a: HashMap<String, String>,
    }
    let decoded: WithMap = from_str("a: {b: c}").unwrap();
    assert_eq!(decoded.a["b"], "c");

    // A missing value decodes the map to its empty shape.
    let decoded: WithMap = from_str("a:").unwrap();
    assert!(decoded.a.is_empty());

    #[derive(Debug, Deserialize, PartialEq)]
    struct AnInt {
        a: i64,
    }
    assert_eq!(from_str::<AnInt>("a: 1").unwrap(), AnInt { a: 1 });

    #[derive(Debug, Deserialize, PartialEq)]
    struct Ints {
        a: Vec<i64>,
    }
    assert_eq!(from_str::<Ints>("a: [1, 2]").unwrap(), Ints { a: vec![1, 2] });

    #[derive(Debug, Deserialize, PartialEq)]
    struct ABool {
        a: bool,
    }
    assert_eq!(from_str::<ABool>("a: y").unwrap(), ABool { a: true });
}

#[test]
fn unknown_keys_are_ignored_and_absent_fields_default() {
    #[derive(Debug, Deserialize, PartialEq, Default)]
    #[serde(default)]
    struct OnlyB {
        b: i64,
    }
    assert_eq!(from_str::<OnlyB>("a: 1").unwrap(), OnlyB { b: 0 });
}

#[test]
fn field_rename() {
    #[derive(Debug, Deserialize, PartialEq)]
    struct Renamed {
        #[serde(rename = "a")]
        b: i64,
    }
    assert_eq!(from_str::<Renamed>("a: 1").unwrap(), Renamed { b: 1 });
}

#[test]
fn unsigned_targets() {
    let m: HashMap<String, u32> = from_str("v: 42").unwrap();
    assert_eq!(m["v"], 42);

    let m: HashMap<String, u64> = from_str("v: 4294967296").unwrap();
    assert_eq!(m["v"], 4294967296);

    // Negative values do not fit and the entry is dropped.
    let m: HashMap<String, u32> = from_str("v: -42").unwrap();
    assert!(m.is_empty());

    let m: HashMap<String, u64> = from_str("v: -4294967296").unwrap();
    assert!(m.is_empty());
}

#[test]
fn overflowing_entries_are_dropped() {
    let m: HashMap<String, i32> = from_str("v: 4294967297").unwrap();
    assert!(m.is_empty());

    let m: HashMap<String, i8> = from_str("v: 128").unwrap();
    assert!(m.is_empty());
}

#[test]
fn integers_are_not_promoted_to_floats() {
    let m: HashMap<String, f64> = from_str("v: 1").unwrap();
    assert!(m.is_empty());

    let m: HashMap<String, f64> = from_str("v: 1.0").unwrap();
    assert_eq!(m["v"], 1.0);
}

#[test]
fn quoted_scalars() {
    assert_eq!(
        value("'1': '\"2\"'"),
        Value::Mapping(vec![(Value::from("1"), Value::from("\"2\""))])
    );
}

#[test]
fn explicit_tags() {
    assert_eq!(value("v: !!float '1.1'"), map1("v", Value::Float(1.1)));
    assert_eq!(value("v: !!null ''"), map1("v", Value::Null));
    assert_eq!(
        value("%TAG !y! tag:yaml.org,2002:\n---\nv: !y!int '1'"),
        map1("v", Value::Int(1))
    );
}

#[test]
fn underscores_never_change_the_value() {
    assert_eq!(value("v: 685_230"), value("v: 685230"));
    assert_eq!(value("v: 685.230_15e+03"), value("v: 685.23015e+03"));
}

#[test]
fn integer_bases_are_equivalent() {
    assert_eq!(value("v: 0b10"), value("v: 0x2"));
    assert_eq!(value("v: 0x2"), value("v: 2"));
}

#[test]
fn null_literals_are_equivalent() {
    for y in ["v: ~", "v: null", "v:", "v: NULL"] {
        assert_eq!(value(y), map1("v", Value::Null), "{y:?}");
    }
}

#[test]
fn leading_zero_with_non_octal_digits_stays_a_string() {
    assert_eq!(value("v: 0888"), map1("v", Value::from("0888")));
}

#[test]
fn binary_scalars() {
    let m: HashMap<String, String> = from_str("v: !!binary 'aGVsbG8='").unwrap();
    assert_eq!(m["v"], "hello");

    #[derive(Debug, Deserialize, PartialEq)]
    struct Bytes {
        v: Vec<u8>,
    }
    assert_eq!(
        from_str::<Bytes>("v: !!binary 'aGVsbG8='").unwrap(),
        Bytes { v: b"hello".to_vec() }
    );
    assert_eq!(
        from_str::<Bytes>("v: [104, 105]").unwrap(),
        Bytes { v: b"hi".to_vec() }
    );
}

#[test]
fn externally_tagged_enums() {
    #[derive(Debug, Deserialize, PartialEq)]
    enum Shape {
        Point,
        Circle { radius: i64 },
        Pair(i64, i64),
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Holder {
        shape: Shape,
    }

    assert_eq!(
        from_str::<Holder>("shape: Point").unwrap(),
        Holder { shape: Shape::Point }
    );
    assert_eq!(
        from_str::<Holder>("shape: {Circle: {radius: 3}}").unwrap(),
        Holder { shape: Shape::Circle { radius: 3 } }
    );
    assert_eq!(
        from_str::<Holder>("shape: {Pair: [1, 2]}").unwrap(),
        Holder { shape: Shape::Pair(1, 2) }
    );
}

#[test]
fn duplicate_keys_last_wins_by_default() {
    let m: HashMap<String, i64> = from_str("a: 1\na: 2\n").unwrap();
    assert_eq!(m["a"], 2);

    #[derive(Debug, Deserialize, PartialEq)]
    struct A {
        a: i64,
    }
    assert_eq!(from_str::<A>("a: 1\na: 2\n").unwrap(), A { a: 2 });
}

#[test]
fn fail_silent_keeps_only_matching_entries() {
    let m: HashMap<String, u8> = from_str("a: 1\nb: oops\nc: 3\nd: 999\n").unwrap();
    assert_eq!(m.len(), 2);
    assert_eq!(m["a"], 1);
    assert_eq!(m["c"], 3);
}
