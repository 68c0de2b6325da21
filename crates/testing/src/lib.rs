use std::str::FromStr;

use pallas::{
    codec::utils::{AnyUInt, Bytes, CborWrap, MaybeIndefArray, NonEmptyKeyValuePairs},
    crypto::hash::{Hash, Hasher},
    ledger::addresses::Address,
    network::miniprotocols::localstate::queries_v16 as q16,
};

use bpi_core::*;

pub mod data;
pub mod fs;
pub mod keys;
pub mod node;

pub use fs::MemoryStore;
pub use node::FakeNode;

#[derive(Clone, Debug)]
pub enum TestAddress {
    Alice,
    Bob,
    StakeOnly,
    ScriptLocked,
    Byron,
}

pub const ADDRESS_TEST_VECTORS: [&str; 5] = [
    // a Shelley address with both payment and stake parts
    "addr1q9dhugez3ka82k2kgh7r2lg0j7aztr8uell46kydfwu3vk6n8w2cdu8mn2ha278q6q25a9rc6gmpfeekavuargcd32vsvxhl7e",
    // a Shelley address with only payment part
    "addr1vx2fxv2umyhttkxyxp8x0dlpdt3k6cwng5pxj3jhsydzers66hrl8",
    // a Shelley stake address
    "stake178phkx6acpnf78fuvxn0mkew3l0fd058hzquvz7w36x4gtcccycj5",
    // a Shelley script address
    "addr1w9jx45flh83z6wuqypyash54mszwmdj8r64fydafxtfc6jgrw4rm3",
    // a Byron address
    "37btjrVyb4KDXBNC4haBVPCrro8AQPHwvCMp3RFhhSVWwfFmZ6wwzSK6JK1hY6wHNmtrpTf1kdbva8TCneM2YsiXT7mrzT21EacHnPpz5YyUdj64na",
];

/// Network id of every address in [`ADDRESS_TEST_VECTORS`].
pub const TEST_NETWORK_ID: u8 = 1;

impl TestAddress {
    pub fn ordinal(&self) -> usize {
        match self {
            TestAddress::Alice => 0,
            TestAddress::Bob => 1,
            TestAddress::StakeOnly => 2,
            TestAddress::ScriptLocked => 3,
            TestAddress::Byron => 4,
        }
    }

    pub fn as_str(&self) -> &str {
        ADDRESS_TEST_VECTORS[self.ordinal()]
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        Address::from_str(self.as_str()).unwrap().to_vec()
    }
}

pub enum TestAsset {
    Hosky,
    Snek,
}

impl TestAsset {
    pub fn policy_hex(&self) -> &str {
        match self {
            TestAsset::Hosky => "a0028f350aaabe0545fdcb56b039bfb08e4bb4d8c4d7c3c7d481c235",
            TestAsset::Snek => "279c909f348e533da5808898f87f9a14bb2c3dfbbacccd631d927a3f",
        }
    }

    pub fn ticker(&self) -> &str {
        match self {
            TestAsset::Hosky => "HOSKY",
            TestAsset::Snek => "SNEK",
        }
    }

    pub fn policy(&self) -> PolicyId {
        Hash::from_str(self.policy_hex()).unwrap()
    }
}

pub fn tx_sequence_to_hash(sequence: u64) -> TxHash {
    let mut hasher = Hasher::<256>::new();
    hasher.input(&sequence.to_le_bytes());
    hasher.finalize()
}

pub fn wire_ref(sequence: u64, index: u32) -> q16::UTxO {
    q16::UTxO {
        transaction_id: tx_sequence_to_hash(sequence),
        index: AnyUInt::U32(index),
    }
}

pub fn wire_coin(lovelace: u64) -> q16::Value {
    q16::Value::Coin(AnyUInt::U64(lovelace))
}

pub fn wire_multiasset(lovelace: u64, asset: TestAsset, amount: u64) -> q16::Value {
    let names: Vec<(Bytes, AnyUInt)> = vec![(
        asset.ticker().as_bytes().to_vec().into(),
        AnyUInt::U64(amount),
    )];

    q16::Value::Multiasset(
        AnyUInt::U64(lovelace),
        NonEmptyKeyValuePairs::Def(vec![(asset.policy(), NonEmptyKeyValuePairs::Def(names))]),
    )
}

pub fn wire_output(address: &TestAddress, amount: q16::Value) -> q16::TransactionOutput {
    q16::TransactionOutput::Current(q16::PostAlonsoTransactionOutput {
        address: address.to_bytes().into(),
        amount,
        inline_datum: None,
        script_ref: None,
    })
}

pub fn wire_output_with_datum(
    address: &TestAddress,
    amount: q16::Value,
    datum: q16::DatumOption,
) -> q16::TransactionOutput {
    q16::TransactionOutput::Current(q16::PostAlonsoTransactionOutput {
        address: address.to_bytes().into(),
        amount,
        inline_datum: Some(datum),
        script_ref: None,
    })
}

pub fn legacy_wire_output(
    address: &TestAddress,
    lovelace: u64,
    datum_hash: Option<DatumHash>,
) -> q16::TransactionOutput {
    q16::TransactionOutput::Legacy(q16::LegacyTransactionOutput {
        address: address.to_bytes().into(),
        amount: wire_coin(lovelace),
        datum_hash,
    })
}

/// An inline datum holding a single `42` field under the given constructor tag.
pub fn wire_inline_datum(tag: u64, any_constructor: Option<u64>) -> q16::DatumOption {
    let fields = vec![q16::PlutusData::BigInt(q16::BigInt::Int(42i64.into()))];

    q16::DatumOption::Data(CborWrap(q16::PlutusData::Constr(q16::Constr {
        tag,
        any_constructor,
        fields: MaybeIndefArray::Indef(fields),
    })))
}

/// A wire UTxO set of `count` plain outputs sitting at `address`.
pub fn wire_utxos_at(address: &TestAddress, count: u64) -> Vec<WireUtxo> {
    (0..count)
        .map(|i| {
            (
                wire_ref(i, 0),
                wire_output(address, wire_coin(1_000_000 * (i + 1))),
            )
        })
        .collect()
}
