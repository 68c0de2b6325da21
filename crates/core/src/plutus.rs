//! Helpers over Plutus structured data.
//!
//! The same Plutus value admits several CBOR encodings (definite or
//! indefinite arrays, compact or general constructor tags, small or byte
//! integers). [`canonical`] picks one of them so identities are computed over
//! the value and not over however it happened to be built.

use num_bigint::{BigInt, Sign};
use pallas::codec::utils::{Int, KeyValuePairs, MaybeIndefArray};
use pallas::ledger::primitives::{BigInt as LedgerBigInt, Constr, PlutusData};

/// Resolves the constructor index encoded by a CBOR tag.
///
/// Indexes 0..=6 use tags 121..=127, indexes 7..=127 use tags 1280..=1400 and
/// anything else goes through tag 102 with an explicit index.
pub fn constructor_index(tag: u64, any_constructor: Option<u64>) -> Option<u64> {
    match tag {
        121..=127 => Some(tag - 121),
        1280..=1400 => Some(tag - 1280 + 7),
        102 => any_constructor,
        _ => None,
    }
}

/// Inverse of [`constructor_index`].
pub fn constructor_tag(index: u64) -> (u64, Option<u64>) {
    match index {
        0..=6 => (121 + index, None),
        7..=127 => (1280 + index - 7, None),
        _ => (102, Some(index)),
    }
}

pub fn to_bigint(value: &LedgerBigInt) -> BigInt {
    match value {
        LedgerBigInt::Int(x) => BigInt::from(i128::from(*x)),
        LedgerBigInt::BigUInt(bytes) => {
            let raw: Vec<u8> = bytes.clone().into();
            BigInt::from_bytes_be(Sign::Plus, &raw)
        }
        LedgerBigInt::BigNInt(bytes) => {
            let raw: Vec<u8> = bytes.clone().into();
            -BigInt::from_bytes_be(Sign::Plus, &raw) - BigInt::from(1u8)
        }
    }
}

/// Picks the smallest ledger representation able to hold the value.
pub fn from_bigint(value: &BigInt) -> LedgerBigInt {
    if let Some(int) = i128::try_from(value)
        .ok()
        .and_then(|x| Int::try_from(x).ok())
    {
        return LedgerBigInt::Int(int);
    }

    match value.sign() {
        Sign::Minus => {
            // negative big ints store `-1 - n`
            let magnitude = -value - BigInt::from(1u8);
            let (_, raw) = magnitude.to_bytes_be();
            LedgerBigInt::BigNInt(raw.into())
        }
        _ => {
            let (_, raw) = value.to_bytes_be();
            LedgerBigInt::BigUInt(raw.into())
        }
    }
}

fn canonical_items(items: &[PlutusData]) -> MaybeIndefArray<PlutusData> {
    let items: Vec<_> = items.iter().map(canonical).collect();

    if items.is_empty() {
        MaybeIndefArray::Def(items)
    } else {
        MaybeIndefArray::Indef(items)
    }
}

/// Rebuilds the data using a single encoding per value.
///
/// Constructors use their compact tag, integers their smallest form, maps are
/// definite and lists are indefinite unless empty. Tags with no Plutus index
/// are kept as they are.
pub fn canonical(data: &PlutusData) -> PlutusData {
    match data {
        PlutusData::Constr(constr) => {
            let (tag, any_constructor) = constructor_index(constr.tag, constr.any_constructor)
                .map(constructor_tag)
                .unwrap_or((constr.tag, constr.any_constructor));

            PlutusData::Constr(Constr {
                tag,
                any_constructor,
                fields: canonical_items(&constr.fields),
            })
        }
        PlutusData::Map(kvs) => PlutusData::Map(KeyValuePairs::Def(
            kvs.iter()
                .map(|(k, v)| (canonical(k), canonical(v)))
                .collect(),
        )),
        PlutusData::BigInt(int) => PlutusData::BigInt(from_bigint(&to_bigint(int))),
        PlutusData::BoundedBytes(x) => PlutusData::BoundedBytes(x.clone()),
        PlutusData::Array(items) => PlutusData::Array(canonical_items(items)),
    }
}
