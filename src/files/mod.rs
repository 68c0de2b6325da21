//! Content-addressed materialization of transaction artifacts.
//!
//! Every script, datum and redeemer is written to a file whose name is
//! derived from its hash, so writing the same artifact twice lands on the same
//! path with the same bytes. External tooling (signers, submitters) picks the
//! files up from the configured directories.

use std::path::PathBuf;

use itertools::Itertools;
use tracing::{debug, info, instrument};

use crate::prelude::*;

pub mod envelope;
pub mod json;

pub use envelope::TextEnvelope;

/// Identity of a file-backed artifact.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ArtifactId {
    Policy(ScriptHash),
    Validator(ScriptHash),
    Datum(DatumHash),
    Redeemer(RedeemerHash),
    SigningKey(PubKeyHash),
    /// A transaction id plus a caller-chosen extension (e.g. `raw`, `signed`).
    Transaction(TxHash, String),
}

impl ArtifactId {
    fn prefix(&self) -> &'static str {
        match self {
            ArtifactId::Policy(_) => "policy",
            ArtifactId::Validator(_) => "validator",
            ArtifactId::Datum(_) => "datum",
            ArtifactId::Redeemer(_) => "redeemer",
            ArtifactId::SigningKey(_) => "signing-key",
            ArtifactId::Transaction(..) => "tx",
        }
    }

    fn extension(&self) -> &str {
        match self {
            ArtifactId::Policy(_) | ArtifactId::Validator(_) => "plutus",
            ArtifactId::Datum(_) | ArtifactId::Redeemer(_) => "json",
            ArtifactId::SigningKey(_) => "skey",
            ArtifactId::Transaction(_, ext) => ext,
        }
    }

    fn hash_hex(&self) -> String {
        match self {
            ArtifactId::Policy(x) | ArtifactId::Validator(x) | ArtifactId::SigningKey(x) => {
                hex::encode(x)
            }
            ArtifactId::Datum(x) | ArtifactId::Redeemer(x) | ArtifactId::Transaction(x, _) => {
                hex::encode(x)
            }
        }
    }

    pub fn file_name(&self) -> String {
        format!("{}-{}.{}", self.prefix(), self.hash_hex(), self.extension())
    }
}

/// Maps an artifact identity to its location. Pure and repeatable.
pub fn derive_path(paths: &PathsConfig, id: &ArtifactId) -> PathBuf {
    let dir = match id {
        ArtifactId::Policy(_)
        | ArtifactId::Validator(_)
        | ArtifactId::Datum(_)
        | ArtifactId::Redeemer(_) => &paths.script_dir,
        ArtifactId::SigningKey(_) => &paths.signing_key_dir,
        ArtifactId::Transaction(..) => &paths.tx_dir,
    };

    dir.join(id.file_name())
}

pub fn transaction_path(paths: &PathsConfig, tx: &Transaction, extension: &str) -> PathBuf {
    derive_path(paths, &ArtifactId::Transaction(tx.id(), extension.to_owned()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptRole {
    Policy,
    Validator,
}

impl ScriptRole {
    pub fn artifact_id(&self, script: &Script) -> ArtifactId {
        match self {
            ScriptRole::Policy => ArtifactId::Policy(script.hash()),
            ScriptRole::Validator => ArtifactId::Validator(script.hash()),
        }
    }
}

enum Artifact<'a> {
    Script(ScriptRole, &'a Script),
    Datum(&'a Datum),
    Redeemer(&'a Redeemer),
}

impl Artifact<'_> {
    fn id(&self) -> ArtifactId {
        match self {
            Artifact::Script(role, script) => role.artifact_id(script),
            Artifact::Datum(x) => ArtifactId::Datum(x.hash()),
            Artifact::Redeemer(x) => ArtifactId::Redeemer(x.hash()),
        }
    }
}

/// Every artifact a tx needs on disk, in write order: policies, validators,
/// datums and then redeemers. Entries attached to inputs come before the ones
/// only present in the lookup maps.
fn plan<'a>(tx: &'a Transaction, extra_policies: &'a [Script]) -> Vec<Artifact<'a>> {
    let policies = tx
        .minting_policies
        .iter()
        .chain(extra_policies)
        .map(|x| Artifact::Script(ScriptRole::Policy, x));

    let validators = tx
        .witnesses()
        .map(|x| Artifact::Script(ScriptRole::Validator, &x.validator));

    let datums = tx
        .witnesses()
        .filter_map(|x| x.datum.as_ref())
        .chain(tx.datums.values())
        .map(Artifact::Datum);

    let redeemers = tx
        .witnesses()
        .map(|x| &x.redeemer)
        .chain(tx.redeemers.values())
        .map(Artifact::Redeemer);

    policies
        .chain(validators)
        .chain(datums)
        .chain(redeemers)
        .unique_by(|x| x.id())
        .collect()
}

pub struct Materializer<'a, F> {
    store: F,
    paths: &'a PathsConfig,
}

impl<'a, F: FileStore> Materializer<'a, F> {
    pub fn new(store: F, paths: &'a PathsConfig) -> Self {
        Self { store, paths }
    }

    fn write(&self, id: &ArtifactId, contents: &[u8]) -> Result<PathBuf, Error> {
        let path = derive_path(self.paths, id);

        self.store.write_file(&path, contents)?;

        debug!(path = %path.display(), bytes = contents.len(), "artifact written");

        Ok(path)
    }

    /// Writes the script as a text envelope for its plutus version.
    pub fn write_script(&self, role: ScriptRole, script: &Script) -> Result<PathBuf, Error> {
        let envelope = TextEnvelope::wrap(script.language.envelope_type(), &script.bytes)?;

        self.write(&role.artifact_id(script), &envelope.to_json()?)
    }

    pub fn write_datum(&self, datum: &Datum) -> Result<PathBuf, Error> {
        let contents = json::data_to_json_bytes(&datum.0)?;

        self.write(&ArtifactId::Datum(datum.hash()), &contents)
    }

    pub fn write_redeemer(&self, redeemer: &Redeemer) -> Result<PathBuf, Error> {
        let contents = json::data_to_json_bytes(&redeemer.0)?;

        self.write(&ArtifactId::Redeemer(redeemer.hash()), &contents)
    }

    /// Writes every script, datum and redeemer referenced by the tx, plus the
    /// extra minting policies.
    ///
    /// Stops at the first failure, which may leave some of the artifacts
    /// already written. Calling it again is safe since every path is derived
    /// from content.
    #[instrument(skip_all, fields(tx = %tx.id()))]
    pub fn materialize_all(
        &self,
        tx: &Transaction,
        extra_policies: &[Script],
    ) -> Result<Vec<PathBuf>, Error> {
        self.store.create_dir_all(&self.paths.script_dir)?;

        let written = plan(tx, extra_policies)
            .into_iter()
            .map(|artifact| match artifact {
                Artifact::Script(role, x) => self.write_script(role, x),
                Artifact::Datum(x) => self.write_datum(x),
                Artifact::Redeemer(x) => self.write_redeemer(x),
            })
            .collect::<Result<Vec<_>, _>>()?;

        info!(count = written.len(), "tx artifacts materialized");

        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use bpi_testing::{data::*, MemoryStore};

    use super::*;

    fn paths() -> PathsConfig {
        PathsConfig {
            script_dir: "/work/scripts".into(),
            signing_key_dir: "/work/keys".into(),
            tx_dir: "/work/txs".into(),
        }
    }

    #[test]
    fn path_layout() {
        let paths = paths();
        let hash = script(1, PlutusVersion::V1).hash();
        let hex = hex::encode(hash);

        assert_eq!(
            derive_path(&paths, &ArtifactId::Policy(hash)),
            PathBuf::from(format!("/work/scripts/policy-{hex}.plutus"))
        );

        assert_eq!(
            derive_path(&paths, &ArtifactId::Validator(hash)),
            PathBuf::from(format!("/work/scripts/validator-{hex}.plutus"))
        );

        assert_eq!(
            derive_path(&paths, &ArtifactId::SigningKey(hash)),
            PathBuf::from(format!("/work/keys/signing-key-{hex}.skey"))
        );

        let datum = Datum(int(1)).hash();
        let hex = hex::encode(datum);

        assert_eq!(
            derive_path(&paths, &ArtifactId::Datum(datum)),
            PathBuf::from(format!("/work/scripts/datum-{hex}.json"))
        );

        assert_eq!(
            derive_path(&paths, &ArtifactId::Redeemer(datum)),
            PathBuf::from(format!("/work/scripts/redeemer-{hex}.json"))
        );
    }

    #[test]
    fn tx_path_uses_caller_extension() {
        let paths = paths();
        let tx = Transaction::default();

        let raw = transaction_path(&paths, &tx, "raw");
        let signed = transaction_path(&paths, &tx, "signed");

        assert_eq!(raw.parent(), Some(Path::new("/work/txs")));
        assert_eq!(
            raw.file_name().unwrap().to_str().unwrap(),
            format!("tx-{}.raw", tx.id())
        );
        assert_ne!(raw, signed);
        assert_eq!(signed.extension().unwrap(), "signed");
    }

    #[test]
    fn script_file_is_a_text_envelope() {
        let store = MemoryStore::new().with_dir("/work/scripts");
        let paths = paths();
        let materializer = Materializer::new(&store, &paths);

        let validator = script(3, PlutusVersion::V2);
        let path = materializer
            .write_script(ScriptRole::Validator, &validator)
            .unwrap();

        let envelope = TextEnvelope::from_json(&store.contents(&path).unwrap()).unwrap();

        assert_eq!(envelope.kind, "PlutusScriptV2");
        assert_eq!(envelope.payload().unwrap(), validator.bytes.to_vec());
    }

    #[test]
    fn datum_write_is_idempotent() {
        let store = MemoryStore::new().with_dir("/work/scripts");
        let paths = paths();
        let materializer = Materializer::new(&store, &paths);
        let datum = Datum(constr(0, vec![int(7), bytes(b"abc")]));

        let first = materializer.write_datum(&datum).unwrap();
        let first_bytes = store.contents(&first).unwrap();

        let second = materializer.write_datum(&datum).unwrap();
        let second_bytes = store.contents(&second).unwrap();

        assert_eq!(first, second);
        assert_eq!(first_bytes, second_bytes);
        assert_eq!(store.file_count(), 1);
    }

    #[test]
    fn reread_datum_keeps_its_file_hash() {
        use pallas::codec::utils::MaybeIndefArray;
        use pallas::ledger::primitives::{Constr, PlutusData};

        let store = MemoryStore::new().with_dir("/work/scripts");
        let paths = paths();
        let materializer = Materializer::new(&store, &paths);

        let datum = Datum(PlutusData::Constr(Constr {
            tag: 102,
            any_constructor: Some(3),
            fields: MaybeIndefArray::Indef(vec![int(1), list(vec![bytes(b"x")])]),
        }));

        let path = materializer.write_datum(&datum).unwrap();

        let value: serde_json::Value =
            serde_json::from_slice(&store.contents(&path).unwrap()).unwrap();
        let reread = Datum(json::data_from_json(&value).unwrap());

        assert_eq!(reread.hash(), datum.hash());
        assert_eq!(path, derive_path(&paths, &ArtifactId::Datum(reread.hash())));
    }

    #[test]
    fn single_script_tx_writes_four_files() {
        let store = MemoryStore::new();
        let paths = paths();
        let materializer = Materializer::new(&store, &paths);
        let (tx, parts) = single_script_tx();

        let written = materializer.materialize_all(&tx, &[]).unwrap();

        assert!(store.has_dir(Path::new("/work/scripts")));

        let expected = vec![
            derive_path(&paths, &ArtifactId::Policy(parts.policy.hash())),
            derive_path(&paths, &ArtifactId::Validator(parts.validator.hash())),
            derive_path(&paths, &ArtifactId::Datum(parts.datum.hash())),
            derive_path(&paths, &ArtifactId::Redeemer(parts.redeemer.hash())),
        ];

        assert_eq!(written, expected);
        assert_eq!(store.file_count(), 4);
    }

    #[test]
    fn materialize_twice_yields_same_paths() {
        let store = MemoryStore::new();
        let paths = paths();
        let materializer = Materializer::new(&store, &paths);
        let (tx, _) = single_script_tx();

        let first = materializer.materialize_all(&tx, &[]).unwrap();
        let snapshot: Vec<_> = first.iter().map(|x| store.contents(x)).collect();

        let second = materializer.materialize_all(&tx, &[]).unwrap();
        let again: Vec<_> = second.iter().map(|x| store.contents(x)).collect();

        assert_eq!(first, second);
        assert_eq!(snapshot, again);
    }

    #[test]
    fn extra_policies_and_lookup_maps_are_included() {
        let store = MemoryStore::new();
        let paths = paths();
        let materializer = Materializer::new(&store, &paths);

        let (tx, parts) = single_script_tx();
        let loose_datum = Datum(int(99));
        let loose_redeemer = Redeemer(list(vec![]));

        let tx = tx
            .with_datum(loose_datum.clone())
            // already attached to the input, must not be written twice
            .with_datum(parts.datum.clone())
            .with_redeemer(loose_redeemer.clone());

        let extra = script(9, PlutusVersion::V1);

        let written = materializer.materialize_all(&tx, &[extra.clone()]).unwrap();

        assert_eq!(written.len(), 7);
        assert_eq!(
            written[1],
            derive_path(&paths, &ArtifactId::Policy(extra.hash()))
        );
        assert!(written.contains(&derive_path(&paths, &ArtifactId::Datum(loose_datum.hash()))));
        assert!(written.contains(&derive_path(
            &paths,
            &ArtifactId::Redeemer(loose_redeemer.hash())
        )));
        assert_eq!(written.iter().unique().count(), written.len());
    }

    #[test]
    fn stops_at_first_bad_redeemer() {
        let store = MemoryStore::new();
        let paths = paths();
        let materializer = Materializer::new(&store, &paths);

        let tx = Transaction::default()
            .with_redeemer(Redeemer(int(1)))
            .with_redeemer(Redeemer(invalid_constr()))
            .with_redeemer(Redeemer(int(2)));

        let err = materializer.materialize_all(&tx, &[]).unwrap_err();

        assert!(matches!(err, Error::Encoding(_)));
        assert!(store.file_count() < 3);
    }

    #[test]
    fn write_failure_is_reported_with_path() {
        let store = MemoryStore::new();
        let paths = paths();
        let materializer = Materializer::new(&store, &paths);
        let (tx, parts) = single_script_tx();

        let broken = derive_path(&paths, &ArtifactId::Datum(parts.datum.hash()));
        store.break_path(&broken);

        let err = materializer.materialize_all(&tx, &[]).unwrap_err();

        match err {
            Error::File(file) => assert_eq!(file.path(), broken.as_path()),
            other => panic!("unexpected error {other:?}"),
        }

        // policy and validator were already written, redeemer never was
        assert_eq!(store.file_count(), 2);
    }

    mod properties {
        use pallas::crypto::hash::Hash;
        use proptest::prelude::*;
        use proptest::proptest;

        use super::*;

        prop_compose! {
          fn any_id()
            (short in any::<[u8; 28]>(), long in any::<[u8; 32]>(), kind in 0..5u8)
            -> ArtifactId {
                match kind {
                    0 => ArtifactId::Policy(Hash::new(short)),
                    1 => ArtifactId::Validator(Hash::new(short)),
                    2 => ArtifactId::Datum(Hash::new(long)),
                    3 => ArtifactId::Redeemer(Hash::new(long)),
                    _ => ArtifactId::SigningKey(Hash::new(short)),
                }
            }
        }

        proptest! {
            #[test]
            fn paths_are_a_function_of_identity(a in any_id(), b in any_id()) {
                let paths = paths();

                prop_assert_eq!(derive_path(&paths, &a), derive_path(&paths, &a.clone()));
                prop_assert_eq!(a == b, derive_path(&paths, &a) == derive_path(&paths, &b));
            }
        }
    }
}
