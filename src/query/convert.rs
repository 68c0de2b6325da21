//! Translation between the node's wire types and the chain model.
//!
//! Every conversion from the wire is fallible and a single failure discards
//! the whole response.

use std::collections::BTreeMap;

use pallas::codec::utils::{AnyUInt, KeyValuePairs, MaybeIndefArray};
use pallas::ledger::addresses::{
    Address, Network, Pointer, ShelleyAddress, ShelleyDelegationPart, ShelleyPaymentPart,
};
use pallas::ledger::primitives::{BigInt as LedgerBigInt, Constr, PlutusData};
use pallas::network::miniprotocols::localstate::queries_v16 as q16;

use bpi_core::plutus::{canonical, constructor_index};
use crate::prelude::*;

/// Highest network id that fits in the low nibble of an address header.
pub const MAX_NETWORK_ID: u8 = 0x0f;

fn check_network(network: Network) -> Result<(), QueryError> {
    match network {
        Network::Other(x) if x > MAX_NETWORK_ID => Err(QueryError::address(format!(
            "network id {x} can't be encoded in an address header"
        ))),
        _ => Ok(()),
    }
}

fn payment_part(credential: &Credential) -> ShelleyPaymentPart {
    match credential {
        Credential::PubKey(x) => ShelleyPaymentPart::Key(*x),
        Credential::Script(x) => ShelleyPaymentPart::Script(*x),
    }
}

fn delegation_part(staking: Option<&StakingCredential>) -> ShelleyDelegationPart {
    match staking {
        None => ShelleyDelegationPart::Null,
        Some(StakingCredential::Hash(Credential::PubKey(x))) => ShelleyDelegationPart::Key(*x),
        Some(StakingCredential::Hash(Credential::Script(x))) => ShelleyDelegationPart::Script(*x),
        Some(StakingCredential::Pointer {
            slot,
            tx_index,
            cert_index,
        }) => ShelleyDelegationPart::Pointer(Pointer::new(*slot, *tx_index, *cert_index)),
    }
}

/// Builds the node's view of an address for the given network.
pub fn address_to_wire(
    address: &ChainAddress,
    network: Network,
) -> Result<WireAddress, QueryError> {
    check_network(network)?;

    let shelley = ShelleyAddress::new(
        network,
        payment_part(&address.payment),
        delegation_part(address.staking.as_ref()),
    );

    Ok(shelley.to_vec().into())
}

fn shelley_to_chain(address: &ShelleyAddress) -> ChainAddress {
    let payment = match address.payment() {
        ShelleyPaymentPart::Key(x) => Credential::PubKey(*x),
        ShelleyPaymentPart::Script(x) => Credential::Script(*x),
    };

    let staking = match address.delegation() {
        ShelleyDelegationPart::Key(x) => Some(StakingCredential::Hash(Credential::PubKey(*x))),
        ShelleyDelegationPart::Script(x) => Some(StakingCredential::Hash(Credential::Script(*x))),
        ShelleyDelegationPart::Pointer(x) => Some(StakingCredential::Pointer {
            slot: x.slot(),
            tx_index: x.tx_idx(),
            cert_index: x.cert_idx(),
        }),
        ShelleyDelegationPart::Null => None,
    };

    ChainAddress { payment, staking }
}

/// Drops the network of an address able to hold outputs, after checking it
/// matches the expected one.
fn address_to_chain(address: &Address, network: Network) -> Result<ChainAddress, String> {
    match address {
        Address::Shelley(x) if x.network() == network => Ok(shelley_to_chain(x)),
        Address::Shelley(x) => Err(format!(
            "address belongs to network {:?}, expected {network:?}",
            x.network()
        )),
        Address::Byron(_) => Err("byron addresses are not supported".into()),
        Address::Stake(_) => Err("stake addresses can't hold outputs".into()),
    }
}

pub fn address_from_wire(raw: &[u8], network: Network) -> Result<ChainAddress, QueryError> {
    let address = Address::from_bytes(raw).map_err(QueryError::output)?;

    address_to_chain(&address, network).map_err(QueryError::output)
}

/// Parses a user supplied bech32 address.
pub fn parse_address(text: &str, network: Network) -> Result<ChainAddress, QueryError> {
    let address = Address::from_bech32(text).map_err(QueryError::address)?;

    address_to_chain(&address, network).map_err(QueryError::address)
}

fn any_uint(value: &AnyUInt) -> u64 {
    match value {
        AnyUInt::MajorByte(x) => *x as u64,
        AnyUInt::U8(x) => *x as u64,
        AnyUInt::U16(x) => *x as u64,
        AnyUInt::U32(x) => *x as u64,
        AnyUInt::U64(x) => *x,
    }
}

pub fn output_ref_from_wire(utxo: &q16::UTxO) -> Result<OutputRef, QueryError> {
    let index = any_uint(&utxo.index);
    let index = TxoIdx::try_from(index)
        .map_err(|_| QueryError::output(format!("output index {index} out of range")))?;

    Ok(OutputRef::new(utxo.transaction_id, index))
}

/// Repeated asset entries are summed, failing if the total overflows.
pub fn value_from_wire(value: &q16::Value) -> Result<Value, QueryError> {
    match value {
        q16::Value::Coin(coin) => Ok(Value::lovelace(any_uint(coin))),
        q16::Value::Multiasset(coin, policies) => {
            let mut assets: BTreeMap<PolicyId, BTreeMap<AssetName, u64>> = BTreeMap::new();

            for (policy, names) in policies.iter() {
                let entry = assets.entry(*policy).or_default();

                for (name, amount) in names.iter() {
                    let total = entry.entry(name.to_vec()).or_default();

                    *total = total.checked_add(any_uint(amount)).ok_or_else(|| {
                        QueryError::output(format!("asset amount overflow under policy {policy}"))
                    })?;
                }
            }

            Ok(Value {
                lovelace: any_uint(coin),
                assets,
            })
        }
    }
}

fn data_from_wire(data: &q16::PlutusData) -> Result<PlutusData, QueryError> {
    let out = match data {
        q16::PlutusData::Constr(constr) => {
            if constructor_index(constr.tag, constr.any_constructor).is_none() {
                return Err(QueryError::output(format!(
                    "invalid constructor tag {} in inline datum",
                    constr.tag
                )));
            }

            let fields = constr
                .fields
                .iter()
                .map(data_from_wire)
                .collect::<Result<Vec<_>, _>>()?;

            PlutusData::Constr(Constr {
                tag: constr.tag,
                any_constructor: constr.any_constructor,
                fields: MaybeIndefArray::Def(fields),
            })
        }
        q16::PlutusData::Map(kvs) => {
            let entries = kvs
                .iter()
                .map(|(k, v)| Ok((data_from_wire(k)?, data_from_wire(v)?)))
                .collect::<Result<Vec<_>, QueryError>>()?;

            PlutusData::Map(KeyValuePairs::Def(entries))
        }
        q16::PlutusData::BigInt(int) => PlutusData::BigInt(match int {
            q16::BigInt::Int(x) => LedgerBigInt::Int(*x),
            q16::BigInt::BigUInt(x) => LedgerBigInt::BigUInt(x.to_vec().into()),
            q16::BigInt::BigNInt(x) => LedgerBigInt::BigNInt(x.to_vec().into()),
        }),
        q16::PlutusData::BoundedBytes(x) => PlutusData::BoundedBytes(x.to_vec().into()),
        q16::PlutusData::Array(items) => {
            let items = items
                .iter()
                .map(data_from_wire)
                .collect::<Result<Vec<_>, _>>()?;

            PlutusData::Array(MaybeIndefArray::Def(items))
        }
    };

    Ok(out)
}

/// Rebuilds ledger data from the query's copy of it, rejecting constructor
/// tags with no Plutus meaning. The result is in canonical form.
pub fn plutus_data_from_wire(data: &q16::PlutusData) -> Result<PlutusData, QueryError> {
    let data = data_from_wire(data)?;

    Ok(canonical(&data))
}

pub fn datum_from_wire(datum: Option<&q16::DatumOption>) -> Result<OutputDatum, QueryError> {
    match datum {
        None => Ok(OutputDatum::None),
        Some(q16::DatumOption::Hash(x)) => Ok(OutputDatum::Hash(*x)),
        Some(q16::DatumOption::Data(x)) => Ok(OutputDatum::Inline(plutus_data_from_wire(&x.0)?)),
    }
}

pub fn output_from_wire(
    output: &q16::TransactionOutput,
    network: Network,
) -> Result<ChainOutput, QueryError> {
    match output {
        q16::TransactionOutput::Current(x) => Ok(ChainOutput {
            address: address_from_wire(&x.address, network)?,
            value: value_from_wire(&x.amount)?,
            datum: datum_from_wire(x.inline_datum.as_ref())?,
            reference_script: x.script_ref.is_some(),
        }),
        q16::TransactionOutput::Legacy(x) => Ok(ChainOutput {
            address: address_from_wire(&x.address, network)?,
            value: value_from_wire(&x.amount)?,
            datum: x.datum_hash.map(OutputDatum::Hash).unwrap_or_default(),
            reference_script: false,
        }),
    }
}

/// Translates a whole query response. The first entry that fails to
/// translate fails the response.
pub fn utxos_from_wire(utxos: Vec<WireUtxo>, network: Network) -> Result<UtxoSet, QueryError> {
    let mut out = UtxoSet::with_capacity(utxos.len());

    for (utxo, output) in utxos.iter() {
        let key = output_ref_from_wire(utxo)?;
        let output = output_from_wire(output, network)?;

        if out.insert(key, output).is_some() {
            return Err(QueryError::output(format!("duplicate output reference {key}")));
        }
    }

    Ok(out)
}
