use std::collections::HashMap;

use serde::Deserialize;
use serde_yaml11::{from_str, Hooked, Setter, Tagged, Value};

/// Records what the decoder handed to the hook; refuses configured ints.
#[derive(Debug, PartialEq)]
struct Recorder {
    tag: String,
    value: Value,
}

impl Default for Recorder {
    fn default() -> Self {
        Recorder {
            tag: String::new(),
            value: Value::Null,
        }
    }
}

impl Setter for Recorder {
    fn set_yaml(&mut self, tag: &str, value: Value) -> bool {
        self.tag = tag.to_string();
        if let Value::Int(i) = &value {
            if matches!(*i, 2 | 4) {
                return false;
            }
        }
        self.value = value;
        true
    }
}

#[derive(Debug, Deserialize)]
struct WithHookedField {
    #[serde(rename = "_")]
    field: Hooked<Recorder>,
}

#[test]
fn hook_sees_every_node_kind() {
    let cases: Vec<(&str, &str, Value)> = vec![
        (
            "_: {hi: there}",
            "!!map",
            Value::Mapping(vec![(Value::from("hi"), Value::from("there"))]),
        ),
        (
            "_: [1,A]",
            "!!seq",
            Value::Sequence(vec![Value::Int(1), Value::from("A")]),
        ),
        ("_: 10", "!!int", Value::Int(10)),
        ("_: null", "!!null", Value::Null),
        ("_: !!foo 'BAR!'", "!!foo", Value::from("BAR!")),
    ];

    for (input, tag, value) in cases {
        let decoded: WithHookedField = from_str(input).unwrap();
        assert_eq!(decoded.field.0.tag, tag, "{input:?}");
        assert_eq!(decoded.field.0.value, value, "{input:?}");
    }
}

#[test]
fn hook_on_the_whole_document() {
    let decoded: Hooked<Recorder> = from_str("_: {hi: there}").unwrap();
    assert_eq!(decoded.0.tag, "!!map");
    assert_eq!(
        decoded.0.value.get("_"),
        Some(&Value::Mapping(vec![(
            Value::from("hi"),
            Value::from("there")
        )]))
    );
}

#[test]
fn refused_values_drop_their_mapping_entries() {
    let m: HashMap<String, Hooked<Recorder>> =
        from_str("{abc: 1, def: 2, ghi: 3, jkl: 4}").unwrap();

    assert_eq!(m.len(), 2);
    assert_eq!(m["abc"].0.value, Value::Int(1));
    assert_eq!(m["ghi"].0.value, Value::Int(3));
    assert!(!m.contains_key("def"));
    assert!(!m.contains_key("jkl"));
}

#[test]
fn refused_values_drop_their_sequence_elements() {
    let seq: Vec<Hooked<Recorder>> = from_str("[1, 2, 3]").unwrap();
    let values: Vec<&Value> = seq.iter().map(|h| &h.0.value).collect();
    assert_eq!(values, [&Value::Int(1), &Value::Int(3)]);
}

#[test]
fn tagged_exposes_the_canonical_tag() {
    let t: Tagged = from_str("10").unwrap();
    assert_eq!(t.tag, "!!int");
    assert_eq!(t.value, Value::Int(10));

    let t: Tagged = from_str("'10'").unwrap();
    assert_eq!(t.tag, "!!str");
    assert_eq!(t.value, Value::from("10"));

    let t: Tagged = from_str("[1]").unwrap();
    assert_eq!(t.tag, "!!seq");

    let t: Tagged = from_str("a: 1").unwrap();
    assert_eq!(t.tag, "!!map");

    // An aliased node reports the tag of its anchored definition.
    #[derive(Debug, Deserialize)]
    struct Aliased {
        b: Tagged,
    }
    let decoded: Aliased = from_str("a: &x 7\nb: *x\n").unwrap();
    assert_eq!(decoded.b.tag, "!!int");
    assert_eq!(decoded.b.value, Value::Int(7));
}
