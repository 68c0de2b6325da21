//! Transaction-side data model.
//!
//! These values are built upstream and treated as read-only snapshots. Every
//! artifact carries a content identity that is stable across runs, so the same
//! script, datum or redeemer always maps to the same file.

use std::collections::BTreeMap;

use pallas::codec::minicbor::{self, Encode, Encoder};
use pallas::codec::utils::Bytes;
use pallas::crypto::hash::Hasher;
use pallas::ledger::primitives::PlutusData;

use crate::plutus::canonical;
use crate::{DatumHash, OutputRef, RedeemerHash, ScriptHash, TxHash};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Encode)]
#[cbor(index_only)]
pub enum PlutusVersion {
    #[n(1)]
    V1,
    #[n(2)]
    V2,
    #[n(3)]
    V3,
}

impl PlutusVersion {
    /// Prefix byte the ledger prepends before hashing a script.
    pub fn hash_tag(&self) -> u8 {
        match self {
            PlutusVersion::V1 => 1,
            PlutusVersion::V2 => 2,
            PlutusVersion::V3 => 3,
        }
    }

    /// Name used in the `type` field of a script text envelope.
    pub fn envelope_type(&self) -> &'static str {
        match self {
            PlutusVersion::V1 => "PlutusScriptV1",
            PlutusVersion::V2 => "PlutusScriptV2",
            PlutusVersion::V3 => "PlutusScriptV3",
        }
    }
}

/// Compiled Plutus code, either a validator or a minting policy.
#[derive(Debug, Clone, PartialEq, Eq, Encode)]
pub struct Script {
    #[n(0)]
    pub language: PlutusVersion,

    /// Serialized script, exactly as it would appear in a witness set.
    #[n(1)]
    pub bytes: Bytes,
}

impl Script {
    pub fn new(language: PlutusVersion, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            language,
            bytes: Bytes::from(bytes.into()),
        }
    }

    /// Ledger script hash. For a minting policy this is its currency symbol.
    pub fn hash(&self) -> ScriptHash {
        Hasher::<224>::hash_tagged(&self.bytes, self.language.hash_tag())
    }
}

macro_rules! data_newtype {
    ($name:ident, $hash:ty) => {
        #[derive(Debug, Clone, PartialEq)]
        pub struct $name(pub PlutusData);

        impl $name {
            /// Hash of the value, independent of how its CBOR happened to
            /// be encoded.
            pub fn hash(&self) -> $hash {
                Hasher::<256>::hash_cbor(&canonical(&self.0))
            }
        }

        impl From<PlutusData> for $name {
            fn from(value: PlutusData) -> Self {
                Self(value)
            }
        }

        impl AsRef<PlutusData> for $name {
            fn as_ref(&self) -> &PlutusData {
                &self.0
            }
        }

        impl<C> minicbor::Encode<C> for $name {
            fn encode<W: minicbor::encode::Write>(
                &self,
                e: &mut Encoder<W>,
                ctx: &mut C,
            ) -> Result<(), minicbor::encode::Error<W::Error>> {
                canonical(&self.0).encode(e, ctx)
            }
        }
    };
}

data_newtype!(Datum, DatumHash);
data_newtype!(Redeemer, RedeemerHash);

/// Everything needed to spend a script-locked input.
#[derive(Debug, Clone, PartialEq, Encode)]
pub struct ScriptWitness {
    #[n(0)]
    pub validator: Script,

    #[n(1)]
    pub redeemer: Redeemer,

    #[n(2)]
    pub datum: Option<Datum>,
}

#[derive(Debug, Clone, PartialEq, Encode)]
pub struct TxInput {
    #[n(0)]
    pub output_ref: OutputRef,

    #[n(1)]
    pub witness: Option<ScriptWitness>,
}

impl TxInput {
    pub fn pubkey(output_ref: OutputRef) -> Self {
        Self {
            output_ref,
            witness: None,
        }
    }

    pub fn scripted(output_ref: OutputRef, witness: ScriptWitness) -> Self {
        Self {
            output_ref,
            witness: Some(witness),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Encode)]
pub struct Transaction {
    #[n(0)]
    pub inputs: Vec<TxInput>,

    #[n(1)]
    pub minting_policies: Vec<Script>,

    #[n(2)]
    pub datums: BTreeMap<DatumHash, Datum>,

    #[n(3)]
    pub redeemers: BTreeMap<RedeemerHash, Redeemer>,
}

impl Transaction {
    /// Content hash of the whole snapshot.
    pub fn id(&self) -> TxHash {
        Hasher::<256>::hash_cbor(self)
    }

    pub fn witnesses(&self) -> impl Iterator<Item = &ScriptWitness> {
        self.inputs.iter().filter_map(|x| x.witness.as_ref())
    }

    /// Adds a datum to the lookup map, keyed by its own hash.
    pub fn with_datum(mut self, datum: Datum) -> Self {
        self.datums.insert(datum.hash(), datum);
        self
    }

    /// Adds a redeemer to the lookup map, keyed by its own hash.
    pub fn with_redeemer(mut self, redeemer: Redeemer) -> Self {
        self.redeemers.insert(redeemer.hash(), redeemer);
        self
    }
}

#[cfg(test)]
mod tests {
    use pallas::codec::utils::MaybeIndefArray;
    use pallas::ledger::primitives::{BigInt, Constr};

    use super::*;

    fn unit() -> PlutusData {
        PlutusData::Constr(Constr {
            tag: 121,
            any_constructor: None,
            fields: MaybeIndefArray::Def(vec![]),
        })
    }

    fn int(value: i64) -> PlutusData {
        PlutusData::BigInt(BigInt::Int(value.into()))
    }

    #[test]
    fn script_hash_depends_on_language() {
        let v1 = Script::new(PlutusVersion::V1, vec![0x4e, 0x4d, 0x01, 0x00]);
        let v2 = Script::new(PlutusVersion::V2, vec![0x4e, 0x4d, 0x01, 0x00]);

        assert_eq!(v1.hash(), v1.clone().hash());
        assert_ne!(v1.hash(), v2.hash());
    }

    #[test]
    fn equal_data_hash_identically() {
        assert_eq!(Datum(unit()).hash(), Datum(unit()).hash());
        assert_ne!(Datum(int(1)).hash(), Datum(int(2)).hash());
    }

    #[test]
    fn encoding_variants_hash_identically() {
        let def = PlutusData::Array(MaybeIndefArray::Def(vec![int(1)]));
        let indef = PlutusData::Array(MaybeIndefArray::Indef(vec![int(1)]));
        assert_eq!(Datum(def).hash(), Datum(indef).hash());

        let compact = PlutusData::Constr(Constr {
            tag: 124,
            any_constructor: None,
            fields: MaybeIndefArray::Def(vec![]),
        });
        let general = PlutusData::Constr(Constr {
            tag: 102,
            any_constructor: Some(3),
            fields: MaybeIndefArray::Def(vec![]),
        });
        assert_eq!(Redeemer(compact).hash(), Redeemer(general).hash());

        let wide = PlutusData::BigInt(BigInt::BigUInt(vec![0x01].into()));
        assert_eq!(Datum(int(1)).hash(), Datum(wide).hash());
    }

    #[test]
    fn tx_id_ignores_datum_encoding() {
        let def = Datum(PlutusData::Array(MaybeIndefArray::Def(vec![int(1)])));
        let indef = Datum(PlutusData::Array(MaybeIndefArray::Indef(vec![int(1)])));

        assert_eq!(
            Transaction::default().with_datum(def).id(),
            Transaction::default().with_datum(indef).id()
        );
    }

    #[test]
    fn datum_and_redeemer_share_hashing() {
        assert_eq!(Datum(int(7)).hash(), Redeemer(int(7)).hash());
    }

    #[test]
    fn tx_id_tracks_content() {
        let empty = Transaction::default();
        let with_datum = Transaction::default().with_datum(Datum(int(1)));

        assert_eq!(empty.id(), Transaction::default().id());
        assert_ne!(empty.id(), with_datum.id());
    }
}
