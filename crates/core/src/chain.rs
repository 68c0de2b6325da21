//! Chain-side data model: outputs as the rest of the system sees them.
//!
//! These types are intentionally network-agnostic and decoupled from the
//! node's wire representation. Translation between both lives next to the
//! query service.

use std::collections::{BTreeMap, HashMap};
use std::fmt::Display;

use pallas::codec::minicbor::{self, Encode};
use pallas::crypto::hash::Hash;
use pallas::ledger::primitives::PlutusData;

use crate::{DatumHash, PolicyId, TxHash, TxoIdx};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Encode)]
pub struct OutputRef {
    #[n(0)]
    pub tx_id: TxHash,

    #[n(1)]
    pub index: TxoIdx,
}

impl OutputRef {
    pub fn new(tx_id: TxHash, index: TxoIdx) -> Self {
        Self { tx_id, index }
    }
}

impl Display for OutputRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}", self.tx_id, self.index)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Credential {
    PubKey(Hash<28>),
    Script(Hash<28>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StakingCredential {
    Hash(Credential),
    Pointer {
        slot: u64,
        tx_index: u64,
        cert_index: u64,
    },
}

/// An address without network discrimination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChainAddress {
    pub payment: Credential,
    pub staking: Option<StakingCredential>,
}

impl ChainAddress {
    pub fn pubkey(hash: Hash<28>) -> Self {
        Self {
            payment: Credential::PubKey(hash),
            staking: None,
        }
    }

    pub fn script(hash: Hash<28>) -> Self {
        Self {
            payment: Credential::Script(hash),
            staking: None,
        }
    }

    pub fn with_staking(self, staking: StakingCredential) -> Self {
        Self {
            staking: Some(staking),
            ..self
        }
    }
}

pub type AssetName = Vec<u8>;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Value {
    pub lovelace: u64,
    pub assets: BTreeMap<PolicyId, BTreeMap<AssetName, u64>>,
}

impl Value {
    pub fn lovelace(amount: u64) -> Self {
        Self {
            lovelace: amount,
            assets: Default::default(),
        }
    }

    pub fn asset_amount(&self, policy: &PolicyId, name: &[u8]) -> u64 {
        self.assets
            .get(policy)
            .and_then(|x| x.get(name))
            .copied()
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum OutputDatum {
    #[default]
    None,
    Hash(DatumHash),
    Inline(PlutusData),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChainOutput {
    pub address: ChainAddress,
    pub value: Value,
    pub datum: OutputDatum,

    /// Whether the output carries a reference script. The script body is not
    /// translated.
    pub reference_script: bool,
}

pub type UtxoSet = HashMap<OutputRef, ChainOutput>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_ref_display() {
        let tx_id: TxHash = "a3c5b3a8fcb2b4a5b9e3d0e6f4f1c2b3a4d5e6f7a8b9c0d1e2f3a4b5c6d7e8f9"
            .parse()
            .unwrap();

        let display = OutputRef::new(tx_id, 3).to_string();

        assert_eq!(
            display,
            "a3c5b3a8fcb2b4a5b9e3d0e6f4f1c2b3a4d5e6f7a8b9c0d1e2f3a4b5c6d7e8f9#3"
        );
    }

    #[test]
    fn missing_asset_is_zero() {
        let value = Value::lovelace(2_000_000);
        let policy = PolicyId::from([7u8; 28]);

        assert_eq!(value.asset_amount(&policy, b"token"), 0);
    }
}
