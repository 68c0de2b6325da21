//! Detailed-schema JSON encoding of Plutus structured data.
//!
//! Every node is an object tagged by its kind: `constructor`/`fields`, `map`
//! (a list of `k`/`v` objects), `list`, `int` or `bytes` (hex). Keys are
//! emitted in lexicographic order and integers keep arbitrary precision, so
//! equal values always produce the same bytes.

use std::str::FromStr;

use num_bigint::BigInt;
use pallas::codec::utils::{KeyValuePairs, MaybeIndefArray};
use pallas::ledger::primitives::{Constr, PlutusData};
use serde_json::{json, Value};

use bpi_core::plutus::{constructor_index, constructor_tag, from_bigint, to_bigint};
use crate::prelude::*;

pub fn data_to_json(data: &PlutusData) -> Result<Value, Error> {
    let out = match data {
        PlutusData::Constr(constr) => {
            let index = constructor_index(constr.tag, constr.any_constructor).ok_or_else(|| {
                Error::encoding(format!(
                    "constructor tag {} has no plutus index",
                    constr.tag
                ))
            })?;

            let fields = constr
                .fields
                .iter()
                .map(data_to_json)
                .collect::<Result<Vec<_>, _>>()?;

            json!({ "constructor": index, "fields": fields })
        }
        PlutusData::Map(kvs) => {
            let entries = kvs
                .iter()
                .map(|(k, v)| Ok(json!({ "k": data_to_json(k)?, "v": data_to_json(v)? })))
                .collect::<Result<Vec<_>, Error>>()?;

            json!({ "map": entries })
        }
        PlutusData::BigInt(int) => json!({ "int": int_to_json(&to_bigint(int))? }),
        PlutusData::BoundedBytes(bytes) => {
            let raw: Vec<u8> = bytes.clone().into();
            json!({ "bytes": hex::encode(raw) })
        }
        PlutusData::Array(items) => {
            let items = items
                .iter()
                .map(data_to_json)
                .collect::<Result<Vec<_>, _>>()?;

            json!({ "list": items })
        }
    };

    Ok(out)
}

/// Compact serialization of [`data_to_json`], as written to datum and
/// redeemer files.
pub fn data_to_json_bytes(data: &PlutusData) -> Result<Vec<u8>, Error> {
    let value = data_to_json(data)?;
    serde_json::to_vec(&value).map_err(Error::encoding)
}

fn int_to_json(value: &BigInt) -> Result<Value, Error> {
    if let Ok(x) = i64::try_from(value) {
        return Ok(Value::from(x));
    }

    if let Ok(x) = u64::try_from(value) {
        return Ok(Value::from(x));
    }

    // relies on serde_json's arbitrary precision numbers
    serde_json::from_str(&value.to_string()).map_err(Error::encoding)
}

fn single_key(value: &Value) -> Result<(&str, &Value), Error> {
    let object = value
        .as_object()
        .ok_or_else(|| Error::encoding(format!("expected an object, found {value}")))?;

    if let Some(fields) = object.get("fields") {
        return Ok(("fields", fields));
    }

    match object.iter().next() {
        Some((key, inner)) if object.len() == 1 => Ok((key.as_str(), inner)),
        _ => Err(Error::encoding(format!("unexpected object shape {value}"))),
    }
}

fn as_list<'a>(value: &'a Value, key: &str) -> Result<&'a Vec<Value>, Error> {
    value
        .as_array()
        .ok_or_else(|| Error::encoding(format!("`{key}` must hold a list")))
}

/// Parses the detailed schema back into structured data.
pub fn data_from_json(value: &Value) -> Result<PlutusData, Error> {
    let (key, inner) = single_key(value)?;

    let out = match key {
        "fields" => {
            let index = value
                .get("constructor")
                .and_then(Value::as_u64)
                .ok_or_else(|| Error::encoding("constructor index must be an unsigned int"))?;

            let fields = as_list(inner, "fields")?
                .iter()
                .map(data_from_json)
                .collect::<Result<Vec<_>, _>>()?;

            let (tag, any_constructor) = constructor_tag(index);

            PlutusData::Constr(Constr {
                tag,
                any_constructor,
                fields: MaybeIndefArray::Def(fields),
            })
        }
        "map" => {
            let entries = as_list(inner, "map")?
                .iter()
                .map(|entry| {
                    let k = entry
                        .get("k")
                        .ok_or_else(|| Error::encoding("map entry without `k`"))?;
                    let v = entry
                        .get("v")
                        .ok_or_else(|| Error::encoding("map entry without `v`"))?;

                    Ok((data_from_json(k)?, data_from_json(v)?))
                })
                .collect::<Result<Vec<_>, Error>>()?;

            PlutusData::Map(KeyValuePairs::Def(entries))
        }
        "list" => {
            let items = as_list(inner, "list")?
                .iter()
                .map(data_from_json)
                .collect::<Result<Vec<_>, _>>()?;

            PlutusData::Array(MaybeIndefArray::Def(items))
        }
        "int" => {
            let number = inner
                .as_number()
                .ok_or_else(|| Error::encoding("`int` must hold a number"))?;

            let int = BigInt::from_str(&number.to_string()).map_err(Error::encoding)?;

            PlutusData::BigInt(from_bigint(&int))
        }
        "bytes" => {
            let text = inner
                .as_str()
                .ok_or_else(|| Error::encoding("`bytes` must hold a hex string"))?;

            let raw = hex::decode(text).map_err(Error::encoding)?;

            PlutusData::BoundedBytes(raw.into())
        }
        other => return Err(Error::encoding(format!("unknown data kind `{other}`"))),
    };

    Ok(out)
}

#[cfg(test)]
mod tests {
    use bpi_testing::data::*;

    use super::*;

    #[test]
    fn encodes_each_kind() {
        let data = constr(
            1,
            vec![
                int(-5),
                bytes(&[0xde, 0xad]),
                list(vec![int(1)]),
                map(vec![(bytes(b"k"), int(2))]),
            ],
        );

        let json = data_to_json(&data).unwrap();

        assert_eq!(
            json,
            json!({
                "constructor": 1,
                "fields": [
                    { "int": -5 },
                    { "bytes": "dead" },
                    { "list": [{ "int": 1 }] },
                    { "map": [{ "k": { "bytes": "6b" }, "v": { "int": 2 } }] },
                ]
            })
        );
    }

    #[test]
    fn compact_bytes_are_stable() {
        let data = constr(0, vec![int(42)]);
        let bytes = data_to_json_bytes(&data).unwrap();

        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            r#"{"constructor":0,"fields":[{"int":42}]}"#
        );
    }

    #[test]
    fn large_constructor_indexes() {
        let data = constr(500, vec![]);
        let json = data_to_json(&data).unwrap();

        assert_eq!(json, json!({ "constructor": 500, "fields": [] }));
        assert_eq!(data_from_json(&json).unwrap(), data);
    }

    #[test]
    fn rejects_foreign_constructor_tags() {
        let err = data_to_json(&invalid_constr()).unwrap_err();
        assert!(matches!(err, Error::Encoding(_)));
    }

    #[test]
    fn big_integers_keep_every_digit() {
        let big = BigInt::from_str("340282366920938463463374607431768211457").unwrap();
        let data = PlutusData::BigInt(from_bigint(&big));

        let text = String::from_utf8(data_to_json_bytes(&data).unwrap()).unwrap();
        assert_eq!(text, r#"{"int":340282366920938463463374607431768211457}"#);

        let parsed: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(data_from_json(&parsed).unwrap(), data);
    }

    #[test]
    fn round_trip_reconstructs_structure() {
        let data = constr(
            3,
            vec![
                map(vec![
                    (int(1), list(vec![bytes(b"a"), bytes(b"")])),
                    (bytes(b"nested"), constr(9, vec![int(i64::MIN)])),
                ]),
                int(u32::MAX as i64),
            ],
        );

        let bytes = data_to_json_bytes(&data).unwrap();
        let parsed: Value = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(data_from_json(&parsed).unwrap(), data);
    }

    #[test]
    fn malformed_json_is_an_encoding_error() {
        for bad in [
            json!({ "int": "12" }),
            json!({ "bytes": "zz" }),
            json!({ "list": 1 }),
            json!({ "unknown": [] }),
            json!({ "constructor": -1, "fields": [] }),
            json!({ "map": [{ "k": { "int": 1 } }] }),
        ] {
            assert!(matches!(data_from_json(&bad), Err(Error::Encoding(_))), "{bad}");
        }
    }

    mod properties {
        use proptest::prelude::*;
        use proptest::proptest;

        use super::*;

        fn any_data() -> impl Strategy<Value = PlutusData> {
            let leaf = prop_oneof![
                any::<i64>().prop_map(int),
                proptest::collection::vec(any::<u8>(), 0..64).prop_map(|x| bytes(&x)),
            ];

            leaf.prop_recursive(4, 32, 4, |inner| {
                prop_oneof![
                    proptest::collection::vec(inner.clone(), 0..4).prop_map(list),
                    proptest::collection::vec((inner.clone(), inner.clone()), 0..4).prop_map(map),
                    (0u64..2000, proptest::collection::vec(inner, 0..4))
                        .prop_map(|(index, fields)| constr(index, fields)),
                ]
            })
        }

        proptest! {
            #[test]
            fn json_round_trip(data in any_data()) {
                let bytes = data_to_json_bytes(&data).unwrap();
                let parsed: Value = serde_json::from_slice(&bytes).unwrap();

                prop_assert_eq!(data_from_json(&parsed).unwrap(), data);
            }

            #[test]
            fn encoding_is_deterministic(data in any_data()) {
                prop_assert_eq!(
                    data_to_json_bytes(&data).unwrap(),
                    data_to_json_bytes(&data.clone()).unwrap()
                );
            }
        }
    }
}
