use pallas::codec::{minicbor, utils::Bytes};
use serde::{Deserialize, Serialize};
use serde_json::ser::PrettyFormatter;

use crate::prelude::*;

/// The JSON wrapper used by node tooling for keys and compiled scripts.
///
/// The payload is stored as the hex of a CBOR byte string.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct TextEnvelope {
    #[serde(rename = "type")]
    pub kind: String,

    #[serde(default)]
    pub description: String,

    #[serde(rename = "cborHex")]
    pub cbor_hex: String,
}

impl TextEnvelope {
    pub fn wrap(kind: impl Into<String>, payload: &[u8]) -> Result<Self, Error> {
        let cbor = minicbor::to_vec(Bytes::from(payload.to_vec())).map_err(Error::encoding)?;

        Ok(Self {
            kind: kind.into(),
            description: String::new(),
            cbor_hex: hex::encode(cbor),
        })
    }

    /// Decodes the CBOR byte string held by the envelope.
    pub fn payload(&self) -> Result<Vec<u8>, String> {
        let cbor = hex::decode(&self.cbor_hex).map_err(|e| format!("invalid cborHex: {e}"))?;
        let bytes: Bytes = minicbor::decode(&cbor).map_err(|e| format!("invalid cbor: {e}"))?;

        Ok(bytes.into())
    }

    pub fn from_json(raw: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(raw)
    }

    /// Pretty JSON with four-space indentation, matching `cardano-cli` output.
    pub fn to_json(&self) -> Result<Vec<u8>, Error> {
        let mut out = Vec::new();
        let mut ser =
            serde_json::Serializer::with_formatter(&mut out, PrettyFormatter::with_indent(b"    "));

        self.serialize(&mut ser).map_err(Error::encoding)?;

        Ok(out)
    }
}
