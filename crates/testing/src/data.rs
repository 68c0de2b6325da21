use pallas::codec::utils::{KeyValuePairs, MaybeIndefArray};
use pallas::ledger::primitives::{BigInt, Constr, PlutusData};

use bpi_core::*;

pub fn int(value: i64) -> PlutusData {
    PlutusData::BigInt(BigInt::Int(value.into()))
}

pub fn bytes(value: &[u8]) -> PlutusData {
    PlutusData::BoundedBytes(value.to_vec().into())
}

pub fn list(items: Vec<PlutusData>) -> PlutusData {
    PlutusData::Array(MaybeIndefArray::Def(items))
}

pub fn map(entries: Vec<(PlutusData, PlutusData)>) -> PlutusData {
    PlutusData::Map(KeyValuePairs::Def(entries))
}

/// Builds a constructor using the compact tag ranges, falling back to the
/// general form for large indexes.
pub fn constr(index: u64, fields: Vec<PlutusData>) -> PlutusData {
    let (tag, any_constructor) = match index {
        0..=6 => (121 + index, None),
        7..=127 => (1280 + index - 7, None),
        _ => (102, Some(index)),
    };

    PlutusData::Constr(Constr {
        tag,
        any_constructor,
        fields: MaybeIndefArray::Def(fields),
    })
}

/// A constructor whose tag is outside every Plutus encoding range.
pub fn invalid_constr() -> PlutusData {
    PlutusData::Constr(Constr {
        tag: 99,
        any_constructor: None,
        fields: MaybeIndefArray::Def(vec![]),
    })
}

/// Deterministic pseudo-script bytes; the content only matters for hashing.
pub fn script(seed: u8, language: PlutusVersion) -> Script {
    let mut bytes = vec![0x4d, 0x01, 0x00, 0x00, 0x33, 0x22, 0x22, 0x20, 0x05, 0x12];
    bytes.push(seed);

    Script::new(language, bytes)
}

pub fn output_ref(sequence: u64, index: u32) -> OutputRef {
    OutputRef::new(crate::tx_sequence_to_hash(sequence), index)
}

/// The parts of [`single_script_tx`].
pub struct ScriptTxParts {
    pub validator: Script,
    pub policy: Script,
    pub datum: Datum,
    pub redeemer: Redeemer,
}

/// A tx with one script input (validator, redeemer and datum) and one
/// minting policy.
pub fn single_script_tx() -> (Transaction, ScriptTxParts) {
    let parts = ScriptTxParts {
        validator: script(1, PlutusVersion::V2),
        policy: script(2, PlutusVersion::V2),
        datum: Datum(constr(0, vec![int(42), bytes(b"owner")])),
        redeemer: Redeemer(constr(1, vec![])),
    };

    let tx = Transaction {
        inputs: vec![
            TxInput::pubkey(output_ref(0, 0)),
            TxInput::scripted(
                output_ref(1, 0),
                ScriptWitness {
                    validator: parts.validator.clone(),
                    redeemer: parts.redeemer.clone(),
                    datum: Some(parts.datum.clone()),
                },
            ),
        ],
        minting_policies: vec![parts.policy.clone()],
        ..Default::default()
    };

    (tx, parts)
}
