//! End-to-end vectors through the public model API

use crate::{
    BigInt, BitString, CodecConfig, DermodelError, ErrorKind, Fields, Model, Node,
    ObjectIdentifier, SchemaRef, Timestamp, Value,
};

fn hex(s: &str) -> Vec<u8> {
    (0..s.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&s[i..i + 2], 16).unwrap())
        .collect()
}

fn model(node: Node) -> Model {
    Model::from_node("Test", node).unwrap()
}

fn map(pairs: Vec<(&str, Value)>) -> Value {
    Value::Map(pairs.into_iter().collect::<Fields>())
}

fn round_trip(node: Node, value: Value, expected: &str) {
    let model = model(node);
    let bytes = hex(expected);
    assert_eq!(model.encode(&value).unwrap(), bytes, "encoding {value}");
    assert_eq!(model.decode(&bytes).unwrap(), value, "decoding {expected}");
}

#[test]
fn test_integers() {
    round_trip(Node::int(), Value::from(128i64), "02020080");
    round_trip(Node::int(), Value::from(30000000000000i64), "02061b48eb57e000");
    round_trip(Node::int(), Value::from(0x8011i64), "0203008011");
    round_trip(Node::int(), Value::from(-129i64), "0202ff7f");
}

#[test]
fn test_integer_is_twos_complement() {
    let value = model(Node::int()).decode(&hex("0203989680")).unwrap();
    assert_eq!(value, Value::Int(BigInt::from(-6777216)));
}

#[test]
fn test_integer_range() {
    let node = Node::int().range(10, 90);
    let err = model(node).decode(&hex("020400989680")).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::ValueOutOfRange { .. }));
}

#[test]
fn test_bool_and_null() {
    round_trip(Node::bool(), Value::Bool(true), "0101ff");
    round_trip(Node::bool(), Value::Bool(false), "010100");
    round_trip(Node::null(), Value::Null, "0500");
}

#[test]
fn test_real() {
    round_trip(Node::real(), Value::Real(1.2), "090703312e32452b30");
    round_trip(Node::real(), Value::Real(0.0), "0900");
    round_trip(Node::real(), Value::Real(f64::INFINITY), "090140");
    round_trip(Node::real(), Value::Real(f64::NEG_INFINITY), "090141");
}

#[test]
fn test_real_accepts_nr1() {
    let real = model(Node::real());
    assert_eq!(real.decode(&hex("09020131")).unwrap(), Value::Real(1.0));
    assert_eq!(real.encode(&Value::Real(1.0)).unwrap(), hex("090603312e452b30"));
}

#[test]
fn test_object_identifier() {
    let oid = ObjectIdentifier::from_dotted("1.2.398.3.10.1.1.1.2.2").unwrap();
    round_trip(Node::objid(), Value::Oid(oid), "060a2a830e030a0101010202");

    let from_text = model(Node::objid())
        .encode(&Value::from("1.2.398.3.10.1.1.1.2.2"))
        .unwrap();
    assert_eq!(from_text, hex("060a2a830e030a0101010202"));
}

#[test]
fn test_object_identifier_labels() {
    let node = Node::objid().labels([("1.2.840.113549.1.1.1", "rsaEncryption")]);
    round_trip(node, Value::from("rsaEncryption"), "06092a864886f70d010101");

    let node = Node::objid().labels([("1.2.840.113549.1.1.1", "rsaEncryption")]);
    let unmapped = model(node).decode(&hex("06022a03")).unwrap();
    assert_eq!(unmapped, Value::from("1.2.3"));
}

#[test]
fn test_enumerated_labels() {
    let node = Node::enumerated().labels([("0", "good"), ("1", "bad")]);
    round_trip(node, Value::from("bad"), "0a0101");
}

#[test]
fn test_bit_string() {
    let bits = BitString::from_unused_bits(vec![0xA0], 5).unwrap();
    round_trip(Node::bitstr(), Value::BitString(bits), "030205a0");
}

#[test]
fn test_strings() {
    round_trip(Node::ia5str(), Value::from("hello"), "160568656c6c6f");
    round_trip(Node::printstr(), Value::from("hello"), "130568656c6c6f");
    round_trip(Node::t61str(), Value::from("hello"), "140568656c6c6f");
    round_trip(Node::iso646str(), Value::from("hello"), "1a0568656c6c6f");
    round_trip(Node::utf8str(), Value::from("Привет"), "0c0cd09fd180d0b8d0b2d0b5d182");
    round_trip(Node::bmpstr(), Value::from("Привет"), "1e0c041f04400438043204350442");
}

#[test]
fn test_bmp_certificate_template() {
    let text = "CertificateTemplate";
    let mut expected = vec![0x1E, (text.len() * 2) as u8];
    for c in text.bytes() {
        expected.extend_from_slice(&[0x00, c]);
    }
    let bmp = model(Node::bmpstr());
    assert_eq!(bmp.encode(&Value::from(text)).unwrap(), expected);
    assert_eq!(bmp.decode(&expected).unwrap(), Value::from(text));
}

#[test]
fn test_tagging() {
    round_trip(Node::octstr().explicit(2), Value::Bytes(b"X".to_vec()), "a203040158");
    round_trip(
        Node::seqof(Node::int()).implicit(0),
        Value::Seq(vec![Value::from(1i64)]),
        "a003020101",
    );
    round_trip(
        Node::seqof(Node::int()).explicit(0),
        Value::Seq(vec![Value::from(1i64)]),
        "a0053003020101",
    );
}

#[test]
fn test_implicit_propagates_through_reference() {
    let key = SchemaRef::new("Key", Node::octstr().explicit(1));
    let node = Node::seq([("pub", Node::reference(key).implicit(0))]);
    round_trip(node, map(vec![("pub", Value::Bytes(b"123".to_vec()))]), "3007a0050403313233");
}

#[test]
fn test_utc_time() {
    let time = Timestamp::from_epoch_millis(1475298000000);
    round_trip(Node::utctime(), Value::Time(time), "170d3136313030313035303030305a");

    let from_text = model(Node::utctime())
        .encode(&Value::from("2016-10-01 05:00:00 UTC"))
        .unwrap();
    assert_eq!(from_text, hex("170d3136313030313035303030305a"));
}

#[test]
fn test_generalized_time_fraction() {
    let time = Timestamp::from_epoch_millis(1475298000120);
    round_trip(
        Node::gentime(),
        Value::Time(time),
        "181232303136313030313035303030302e31325a",
    );
}

#[test]
fn test_time_range_model() {
    let range = model(Node::seq([
        ("start_time", Node::utctime()),
        ("end_time", Node::utctime()),
    ]));
    let time = Value::Time(Timestamp::from_epoch_millis(1286712000000));
    let value = map(vec![("start_time", time.clone()), ("end_time", time.clone())]);
    let bytes = hex(
        "301e170d3130313031303132303030305a170d3130313031303132303030305a",
    );
    assert_eq!(range.decode(&bytes).unwrap(), value);
    assert_eq!(range.encode(&value).unwrap(), bytes);

    let err = range
        .encode(&map(vec![("start_time", time)]))
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::MissingField("end_time".to_string()));
}

#[test]
fn test_empty_date() {
    let err = model(Node::utctime()).decode(&hex("1700")).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::InvalidDate(_)));
    let err = model(Node::utctime()).encode(&Value::from("")).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::InvalidDate(_)));
}

#[test]
fn test_optional_and_indefinite() {
    let node = || Node::seq([("key", Node::bool()), ("opt", Node::bool().optional())]);
    let value = map(vec![("key", Value::Bool(true))]);
    round_trip(node(), value.clone(), "30030101ff");
    assert_eq!(model(node()).decode(&hex("30800101ff0000")).unwrap(), value);
}

#[test]
fn test_indefinite_nested() {
    let node = Node::seq([("items", Node::seqof(Node::int()))]);
    let value = model(node)
        .decode(&hex("3080308002010102010200000000"))
        .unwrap();
    assert_eq!(
        value,
        map(vec![(
            "items",
            Value::Seq(vec![Value::from(1i64), Value::from(2i64)])
        )])
    );
}

#[test]
fn test_choice() {
    let node = Node::choice([("number", Node::int()), ("apple", Node::bool())]);
    round_trip(node, Value::choice("apple", true), "0101ff");
}

#[test]
fn test_optional_sequence_of() {
    let entry = || Node::seqof(Node::seq([("x", Node::int())]));
    let node = || Node::seq([("a", entry()), ("b", entry().optional())]);
    let item = |x: i64| map(vec![("x", Value::from(x))]);

    round_trip(
        node(),
        map(vec![
            ("a", Value::Seq(vec![item(1), item(2)])),
            ("b", Value::Seq(vec![item(3), item(4)])),
        ]),
        "3018300A30030201013003020102300A30030201033003020104",
    );
    round_trip(
        node(),
        map(vec![("a", Value::Seq(vec![item(1), item(2)]))]),
        "300C300A30030201013003020102",
    );
}

#[test]
fn test_default_omitted_and_restored() {
    let node = Node::seq([("a", Node::int()), ("b", Node::int().default(3i64))]);
    let value = map(vec![("a", Value::from(1i64)), ("b", Value::from(3i64))]);
    round_trip(node, value, "3003020101");
}

#[test]
fn test_set_in_declared_order() {
    let node = Node::set([("a", Node::bool()), ("b", Node::int())]);
    round_trip(
        node,
        map(vec![("a", Value::Bool(false)), ("b", Value::from(5i64))]),
        "3106010100020105",
    );
}

#[test]
fn test_contained_sequence() {
    let nested = SchemaRef::new("Nested", Node::seq([("nested", Node::int())]));
    round_trip(
        Node::octstr().contains(nested),
        map(vec![("nested", Value::from(5i64))]),
        "04053003020105",
    );
}

#[test]
fn test_contained_any() {
    let nested = SchemaRef::new("Flag", Node::bool());
    let node = Node::seq([("body", Node::any().contains(nested)), ("n", Node::int())]);
    round_trip(
        node,
        map(vec![("body", Value::Bool(true)), ("n", Value::from(1i64))]),
        "30060101ff020101",
    );
}

#[test]
fn test_switch_on_sibling() {
    let node = || {
        Node::seq([
            ("type", Node::objid()),
            (
                "value",
                Node::switch(
                    "type",
                    [
                        ("1.2.3", SchemaRef::new("Count", Node::int())),
                        ("1.2.4", SchemaRef::new("Name", Node::utf8str())),
                    ],
                ),
            ),
        ])
    };
    let oid = |s: &str| Value::Oid(ObjectIdentifier::from_dotted(s).unwrap());

    round_trip(
        node(),
        map(vec![("type", oid("1.2.3")), ("value", Value::from(7i64))]),
        "300706022a03020107",
    );
    round_trip(
        node(),
        map(vec![("type", oid("1.2.4")), ("value", Value::from("ab"))]),
        "300806022a040c026162",
    );

    let err = model(node()).decode(&hex("300706022a05020107")).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::UnresolvedReference(_)));
}

#[test]
fn test_dynamic_submodel() {
    let sub = Model::from_node("SubModel", Node::seq([("x", Node::octstr())])).unwrap();
    let schema = SchemaRef::from(&sub);
    let node = Node::seq([
        ("a", Node::int()),
        (
            "sub",
            Node::dynamic(move |fields| {
                (fields.get("a") == Some(&Value::from(1i64))).then(|| schema.clone())
            }),
        ),
    ]);

    round_trip(
        node,
        map(vec![
            ("a", Value::from(1i64)),
            ("sub", map(vec![("x", Value::Bytes(b"123".to_vec()))])),
        ]),
        "300a02010130050403313233",
    );
}

#[test]
fn test_dynamic_recursive_submodel() {
    let recursive = Model::define("RecursiveModel", |this| {
        let this = this.clone();
        let plain = SchemaRef::new("PlainSubModel", Node::int());
        Node::seq([
            ("plain", Node::bool()),
            (
                "content",
                Node::dynamic(move |fields| match fields.get("plain") {
                    Some(Value::Bool(true)) => Some(plain.clone()),
                    Some(Value::Bool(false)) => Some(this.clone()),
                    _ => None,
                }),
            ),
        ])
    })
    .unwrap();

    let value = map(vec![
        ("plain", Value::Bool(false)),
        (
            "content",
            map(vec![("plain", Value::Bool(true)), ("content", Value::from(1i64))]),
        ),
    ]);
    let bytes = hex("300b01010030060101ff020101");
    assert_eq!(recursive.encode(&value).unwrap(), bytes);
    assert_eq!(recursive.decode(&bytes).unwrap(), value);
}

#[test]
fn test_recursive_depth_limit() {
    let list = Model::define("List", |this| {
        Node::seq([("next", Node::reference(this.clone()).optional())])
    })
    .unwrap();
    let input = hex("3006300430023000");
    assert!(list.decode(&input).is_ok());

    let shallow = CodecConfig::default().with_max_depth(4);
    let err = list.decode_with(&input, &shallow).unwrap_err();
    assert_eq!(err.kind, ErrorKind::DepthExceeded { limit: 4 });
}

#[test]
fn test_framing_errors() {
    let node = || Node::seq([("key", Node::bool())]);
    let err = model(node()).decode(&hex("30050101ff")).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::Truncated { .. }));

    let err = model(node()).decode(&hex("30050101ff0500")).unwrap_err();
    assert_eq!(err.kind, ErrorKind::TrailingData { remaining: 2 });

    let err = model(node()).decode(&hex("3081030101ff")).unwrap_err();
    assert_eq!(err.kind, ErrorKind::NonMinimalLength);
    let value = model(node())
        .decode_with(&hex("3081030101ff"), &CodecConfig::ber())
        .unwrap();
    assert_eq!(value, map(vec![("key", Value::Bool(true))]));
}

#[test]
fn test_decoded_value_renders_as_json() {
    let node = Node::seq([
        ("id", Node::int()),
        ("name", Node::utf8str()),
        ("flag", Node::choice([("on", Node::bool())])),
    ]);
    let value = model(node).decode(&hex("300b0201010c036162630101ff")).unwrap();
    let json = serde_json::to_string(&value).unwrap();
    let back: Value = serde_json::from_str(&json).unwrap();
    assert_eq!(back, value);
}

#[test]
fn test_json_rejects_invalid_leaves() {
    assert!(serde_json::from_str::<Value>(r#"{"Oid":{"arcs":[]}}"#).is_err());
    assert!(serde_json::from_str::<Value>(r#"{"BitString":{"bytes":[1],"num_bits":64}}"#).is_err());
    assert!(serde_json::from_str::<Value>(r#"{"Oid":{"arcs":[1,2,840]}}"#).is_ok());
}

#[test]
fn test_umbrella_error() {
    let err: DermodelError = model(Node::bool()).decode(&hex("0500")).unwrap_err().into();
    assert!(matches!(err, DermodelError::Decode(_)));
}
