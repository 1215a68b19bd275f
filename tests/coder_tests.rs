use std::sync::OnceLock;
use std::thread;

use jiminy_coder::prelude::*;
use jiminy_coder::{digest, header_payload};

const MARKET_SCHEMA: &str = r#"{
    "accounts": [
        { "name": "market", "type": { "kind": "struct", "fields": [
            { "name": "authority", "type": "publicKey" },
            { "name": "baseLots", "type": "u64" },
            { "name": "quoteLots", "type": "i64" },
            { "name": "side", "type": { "defined": "Side" } }
        ] } },
        { "name": "userProfile", "type": { "kind": "struct", "fields": [
            { "name": "name", "type": "string" },
            { "name": "orders", "type": { "vec": { "defined": "Order" } } },
            { "name": "referrer", "type": { "option": "publicKey" } }
        ] } }
    ],
    "types": [
        { "name": "Side", "type": { "kind": "enum", "variants": [
            { "name": "Bid" }, { "name": "Ask" }
        ] } },
        { "name": "Order", "type": { "kind": "struct", "fields": [
            { "name": "id", "type": "u128" },
            { "name": "price", "type": "f64" }
        ] } }
    ]
}"#;

fn market_schema() -> Schema {
    Schema::from_json(MARKET_SCHEMA).unwrap()
}

fn market() -> Value {
    Value::record([
        ("authority", Value::PublicKey([7u8; 32])),
        ("baseLots", Value::U64(1_000)),
        ("quoteLots", Value::I64(-250)),
        ("side", Value::unit_variant("Ask")),
    ])
}

fn profile() -> Value {
    Value::record([
        ("name", Value::String("alice".into())),
        (
            "orders",
            Value::Vec(vec![
                Value::record([("id", Value::U128(1)), ("price", Value::F64(1.5))]),
                Value::record([("id", Value::U128(u128::MAX)), ("price", Value::F64(-0.25))]),
            ]),
        ),
        ("referrer", Value::none()),
    ])
}

#[test]
fn round_trip_every_type_in_both_formats() {
    for schema in [market_schema(), market_schema().with_layout_version(0)] {
        let coder = AccountsCoder::new(&schema).unwrap();
        for (name, value) in [("market", market()), ("userProfile", profile())] {
            let data = coder.encode(name, &value).unwrap();
            assert_eq!(&data[..8], &coder.header().encode_header(name, None));
            assert_eq!(coder.decode(name, &data).unwrap(), value);
        }
    }
}

#[test]
fn encoded_length_is_header_plus_body() {
    let coder = AccountsCoder::new(&market_schema()).unwrap();
    let data = coder.encode("market", &market()).unwrap();
    // 32 + 8 + 8 + 1
    assert_eq!(data.len(), HEADER_LEN + 49);
    assert_eq!(coder.size_of("market").unwrap(), Some(HEADER_LEN + 49));

    let data = coder.encode("userProfile", &profile()).unwrap();
    // (4 + 5) + (4 + 2 * 24) + 1
    assert_eq!(data.len(), HEADER_LEN + 62);
    assert_eq!(coder.size_of("userProfile").unwrap(), None);
}

#[test]
fn versioned_discriminator_width_and_offset() {
    let legacy = AccountsCoder::new(&market_schema()).unwrap();
    let versioned = AccountsCoder::new(&market_schema().with_layout_version(0)).unwrap();

    let full = digest("account", "Market");
    assert_eq!(legacy.discriminator("market").unwrap(), full[..8].to_vec());
    assert_eq!(versioned.discriminator("market").unwrap(), full[..4].to_vec());

    let data = versioned.encode("market", &market()).unwrap();
    assert_eq!(&data[..2], &[0, 0]);
    assert_eq!(&data[2..6], &full[..4]);
    assert_eq!(&data[6..8], &[0, 0]);
    assert_eq!(versioned.header().parse_discriminator(&data).unwrap(), &full[..4]);
}

#[test]
fn wrong_type_is_a_mismatch() {
    let coder = AccountsCoder::new(&market_schema()).unwrap();
    let data = coder.encode("market", &market()).unwrap();
    match coder.decode("userProfile", &data) {
        Err(CoderError::DiscriminatorMismatch {
            type_name,
            expected,
            actual,
        }) => {
            assert_eq!(type_name, "userProfile");
            assert_eq!(expected, coder.discriminator("userProfile").unwrap());
            assert_eq!(actual, coder.discriminator("market").unwrap());
        }
        other => panic!("expected mismatch, got {other:?}"),
    }
}

#[test]
fn unchecked_decode_skips_the_tag() {
    let coder = AccountsCoder::new(&market_schema()).unwrap();
    let mut data = coder.encode("market", &market()).unwrap();
    // Corrupt the tag; the body is untouched.
    data[..8].fill(0xEE);
    assert!(coder.decode("market", &data).is_err());
    assert_eq!(coder.decode_unchecked("market", &data).unwrap(), market());

    // Another type's bytes: no tag error, the body just does not fit.
    let data = coder.encode("market", &market()).unwrap();
    match coder.decode_unchecked("userProfile", &data) {
        Err(CoderError::DiscriminatorMismatch { .. }) => panic!("no tag check expected"),
        Err(_) | Ok(_) => {}
    }
}

#[test]
fn decode_any_identifies_type() {
    let coder = AccountsCoder::new(&market_schema().with_layout_version(0)).unwrap();
    for (name, value) in [("market", market()), ("userProfile", profile())] {
        let data = coder.encode(name, &value).unwrap();
        let (found, decoded) = coder.decode_any(&data).unwrap();
        assert_eq!(found, name);
        assert_eq!(decoded, value);
    }
    let err = coder.decode_any(&[9u8; 16]).unwrap_err();
    assert!(matches!(err, CoderError::UnknownDiscriminator(d) if d == vec![9u8; 4]));
}

#[test]
fn case_variants_produce_identical_headers() {
    let header = HeaderCodec::default();
    assert_eq!(
        header.encode_header("myAccount", None),
        header.encode_header("MyAccount", None)
    );
    assert_ne!(
        header.encode_header("myAccount", None),
        header.encode_header("myaccount2", None)
    );
}

#[test]
fn fresh_coders_agree() {
    let a = AccountsCoder::new(&market_schema()).unwrap();
    let b = AccountsCoder::new(&market_schema()).unwrap();
    assert_eq!(a.discriminator("market").unwrap(), b.discriminator("market").unwrap());
    assert_eq!(
        a.encode("market", &market()).unwrap(),
        b.encode("market", &market()).unwrap()
    );
}

#[test]
fn broken_schema_fails_construction() {
    let schema = Schema::from_json(
        r#"{ "accounts": [{ "name": "a", "type": { "kind": "struct", "fields": [
            { "name": "x", "type": { "defined": "Ghost" } }
        ] } }] }"#,
    )
    .unwrap();
    assert!(matches!(
        AccountsCoder::new(&schema),
        Err(CoderError::LayoutResolution(_))
    ));
}

#[test]
fn zero_sized_vec_items_fail_construction() {
    let schema = Schema::from_json(
        r#"{
            "accounts": [{ "name": "bag", "type": { "kind": "struct", "fields": [
                { "name": "items", "type": { "vec": { "defined": "Empty" } } }
            ] } }],
            "types": [{ "name": "Empty", "type": { "kind": "struct", "fields": [] } }]
        }"#,
    )
    .unwrap();
    assert!(matches!(
        AccountsCoder::new(&schema),
        Err(CoderError::LayoutResolution(_))
    ));
}

#[test]
fn oversized_length_prefix_is_malformed() {
    let coder = AccountsCoder::new(&market_schema()).unwrap();
    let mut data = coder.header().encode_header("userProfile", None).to_vec();
    data.extend_from_slice(&0u32.to_le_bytes());
    data.extend_from_slice(&0x0100_0000u32.to_le_bytes());
    assert!(matches!(
        coder.decode("userProfile", &data),
        Err(CoderError::MalformedInput { .. })
    ));
}

#[test]
fn empty_schema_is_valid_but_knows_nothing() {
    let coder = AccountsCoder::new(&Schema::new()).unwrap();
    assert!(coder.registry().is_empty());
    assert!(matches!(
        coder.decode("x", &[0u8; 8]),
        Err(CoderError::UnknownType(_))
    ));
}

/// Hand-written layout: a single little-endian u32, registered next to the
/// schema ones.
#[derive(Debug)]
struct Tick;

impl Layout for Tick {
    fn encoded_len(&self, _value: &Value) -> CoderResult<usize> {
        Ok(4)
    }

    fn encode(&self, value: &Value, out: &mut DataWriter<'_>) -> CoderResult<usize> {
        match value {
            Value::U32(v) => out.write_u32(*v).map(|_| 4),
            other => Err(CoderError::invalid(format!("tick is a u32, got {}", other.kind()))),
        }
    }

    fn decode(&self, cur: &mut SliceCursor<'_>) -> CoderResult<Value> {
        Ok(Value::U32(cur.read_u32()?))
    }

    fn max_size(&self) -> Option<usize> {
        Some(4)
    }
}

#[test]
fn custom_layouts_plug_into_the_coder() {
    let registry = LayoutRegistry::build(&market_schema())
        .unwrap()
        .with_layout("tick", Box::new(Tick));
    let header = HeaderCodec::new(HeaderFormat::Versioned, "account");
    let coder = AccountsCoder::from_parts(registry, header);

    let data = coder.encode("tick", &Value::U32(99)).unwrap();
    assert_eq!(header_payload(&data), &99u32.to_le_bytes());
    assert_eq!(coder.decode("tick", &data).unwrap(), Value::U32(99));
    assert_eq!(coder.decode_any(&data).unwrap().0, "tick");
    assert_eq!(coder.size_of("tick").unwrap(), Some(12));
}

#[test]
fn shared_across_threads() {
    static CODER: OnceLock<AccountsCoder> = OnceLock::new();
    let coder = CODER.get_or_init(|| AccountsCoder::new(&market_schema()).unwrap());
    let expected = coder.encode("market", &market()).unwrap();

    thread::scope(|s| {
        for _ in 0..4 {
            s.spawn(|| {
                let coder = CODER.get().unwrap();
                for _ in 0..100 {
                    let data = coder.encode("market", &market()).unwrap();
                    assert_eq!(data, expected);
                    assert_eq!(coder.decode("market", &data).unwrap(), market());
                }
            });
        }
    });
}
