//! Loading of payment signing keys from a key directory.

use std::{
    collections::BTreeMap,
    fmt::Debug,
    path::{Path, PathBuf},
};

use pallas::crypto::{hash::Hasher, key::ed25519::SecretKey};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::files::TextEnvelope;
use crate::prelude::*;

pub const SKEY_EXTENSION: &str = "skey";

const NORMAL_KEY_TYPE: &str = "PaymentSigningKeyShelley_ed25519";
const EXTENDED_KEY_TYPE: &str = "PaymentExtendedSigningKeyShelley_ed25519_bip32";

#[derive(Debug, Error)]
pub enum KeyError {
    #[error("malformed envelope: {0}")]
    Envelope(String),

    #[error("unsupported key type {0}")]
    UnsupportedType(String),

    #[error("expected {expected} bytes of key material, found {found}")]
    Length { expected: usize, found: usize },
}

/// A 32-byte ed25519 secret laid out as if it were a 96-byte extended key.
///
/// WARNING: this is NOT an extended private key. The layout is the original
/// secret, followed by 32 zero bytes, followed by a fake chain code of 32
/// `0x01` bytes. Nothing about it is derived, so the extended half and the
/// chain code carry no cryptographic meaning. The only thing it can be
/// trusted for is the public key (and its hash) computed from the original
/// secret. Signing with it as an extended key produces garbage.
///
/// The exact byte layout is kept stable because keys in this form already
/// exist on disk and in downstream tools.
#[derive(Clone, PartialEq, Eq)]
pub struct PaddedKey {
    bytes: [u8; 96],
    public: [u8; 32],
}

impl PaddedKey {
    pub const SIZE: usize = 96;

    /// Secret, zero padding and fake chain code, in that order.
    pub fn as_bytes(&self) -> &[u8; 96] {
        &self.bytes
    }

    pub fn chain_code(&self) -> &[u8] {
        &self.bytes[64..]
    }
}

/// A genuine extended key, as found in `_bip32` key files.
#[derive(Clone, PartialEq, Eq)]
pub struct ExtendedKey {
    secret: [u8; 64],
    public: [u8; 32],
    chain_code: [u8; 32],
}

impl ExtendedKey {
    pub const SIZE: usize = 128;

    pub fn secret(&self) -> &[u8; 64] {
        &self.secret
    }

    pub fn chain_code(&self) -> &[u8; 32] {
        &self.chain_code
    }
}

#[derive(Clone, PartialEq, Eq)]
pub enum PrivateKey {
    Padded(PaddedKey),
    Extended(ExtendedKey),
}

impl PrivateKey {
    pub fn public_key(&self) -> &[u8; 32] {
        match self {
            PrivateKey::Padded(x) => &x.public,
            PrivateKey::Extended(x) => &x.public,
        }
    }

    pub fn pub_key_hash(&self) -> PubKeyHash {
        Hasher::<224>::hash(self.public_key())
    }

    /// Whether the key went through [`convert_key`] and is only good for
    /// identifying its owner.
    pub fn is_padded(&self) -> bool {
        matches!(self, PrivateKey::Padded(_))
    }
}

impl Debug for PrivateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = if self.is_padded() { "padded" } else { "extended" };

        f.debug_struct("PrivateKey")
            .field("kind", &kind)
            .field("pkh", &self.pub_key_hash())
            .finish_non_exhaustive()
    }
}

/// Bridges a plain 32-byte signing key into the extended layout.
///
/// See [`PaddedKey`] for why the result must not be used for signing.
pub fn convert_key(secret: &[u8]) -> Result<PrivateKey, KeyError> {
    let secret: [u8; 32] = secret.try_into().map_err(|_| KeyError::Length {
        expected: 32,
        found: secret.len(),
    })?;

    let public = SecretKey::from(secret).public_key();
    let public: &[u8] = public.as_ref();
    let public: [u8; 32] = public.try_into().map_err(|_| KeyError::Length {
        expected: 32,
        found: public.len(),
    })?;

    let mut bytes = [0u8; PaddedKey::SIZE];
    bytes[..32].copy_from_slice(&secret);
    bytes[64..].fill(0x01);

    Ok(PrivateKey::Padded(PaddedKey { bytes, public }))
}

fn extended_key(raw: &[u8]) -> Result<PrivateKey, KeyError> {
    if raw.len() != ExtendedKey::SIZE {
        return Err(KeyError::Length {
            expected: ExtendedKey::SIZE,
            found: raw.len(),
        });
    }

    let mut key = ExtendedKey {
        secret: [0u8; 64],
        public: [0u8; 32],
        chain_code: [0u8; 32],
    };

    key.secret.copy_from_slice(&raw[..64]);
    key.public.copy_from_slice(&raw[64..96]);
    key.chain_code.copy_from_slice(&raw[96..]);

    Ok(PrivateKey::Extended(key))
}

pub fn parse_signing_key(raw: &[u8]) -> Result<PrivateKey, KeyError> {
    let envelope = TextEnvelope::from_json(raw).map_err(|e| KeyError::Envelope(e.to_string()))?;
    let payload = envelope.payload().map_err(KeyError::Envelope)?;

    match envelope.kind.as_str() {
        NORMAL_KEY_TYPE => convert_key(&payload),
        EXTENDED_KEY_TYPE => extended_key(&payload),
        other => Err(KeyError::UnsupportedType(other.to_owned())),
    }
}

pub fn read_signing_key<F: FileStore>(store: &F, path: &Path) -> Result<PrivateKey, Error> {
    let raw = store.read_file(path)?;

    parse_signing_key(&raw).map_err(|e| Error::key_parse(path, e))
}

fn is_key_file(path: &Path) -> bool {
    path.extension().is_some_and(|x| x == SKEY_EXTENSION)
}

/// Loads every `.skey` file of the signing key directory, keyed by the hash
/// of its public key.
///
/// Any unreadable or malformed key aborts the whole load. Files are visited
/// in path order and, if two files resolve to the same hash, the later one
/// replaces the earlier one.
#[instrument(skip_all, fields(dir = %paths.signing_key_dir.display()))]
pub fn load_all<F: FileStore>(
    store: &F,
    paths: &PathsConfig,
) -> Result<BTreeMap<PubKeyHash, PrivateKey>, Error> {
    let mut files: Vec<PathBuf> = store
        .list_dir(&paths.signing_key_dir)?
        .into_iter()
        .filter(|x| is_key_file(x))
        .collect();

    files.sort();

    let mut keys = BTreeMap::new();

    for path in files {
        let key = read_signing_key(store, &path)?;
        let pkh = key.pub_key_hash();

        debug!(path = %path.display(), %pkh, padded = key.is_padded(), "signing key loaded");

        if keys.insert(pkh, key).is_some() {
            warn!(path = %path.display(), %pkh, "duplicate signing key, keeping the latest file");
        }
    }

    info!(count = keys.len(), "signing keys loaded");

    Ok(keys)
}
