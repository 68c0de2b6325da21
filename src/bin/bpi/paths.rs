use std::str::FromStr;

use miette::{Context, IntoDiagnostic};
use pallas::crypto::hash::Hash;

use bpi::files::{derive_path, ArtifactId};
use bpi::prelude::*;

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum Kind {
    Policy,
    Validator,
    Datum,
    Redeemer,
    SigningKey,
    Tx,
}

#[derive(Debug, clap::Args)]
pub struct Args {
    #[arg(value_enum)]
    kind: Kind,

    /// hex encoded hash of the artifact
    hash: String,

    /// file extension, only used for transactions
    #[arg(long, default_value = "raw")]
    ext: String,
}

fn hash<const N: usize>(text: &str) -> miette::Result<Hash<N>> {
    Hash::<N>::from_str(text)
        .into_diagnostic()
        .with_context(|| format!("expected a {N}-byte hex hash"))
}

pub fn run(config: &RootConfig, args: &Args) -> miette::Result<()> {
    let id = match args.kind {
        Kind::Policy => ArtifactId::Policy(hash(&args.hash)?),
        Kind::Validator => ArtifactId::Validator(hash(&args.hash)?),
        Kind::Datum => ArtifactId::Datum(hash(&args.hash)?),
        Kind::Redeemer => ArtifactId::Redeemer(hash(&args.hash)?),
        Kind::SigningKey => ArtifactId::SigningKey(hash(&args.hash)?),
        Kind::Tx => ArtifactId::Transaction(hash(&args.hash)?, args.ext.clone()),
    };

    println!("{}", derive_path(&config.paths, &id).display());

    Ok(())
}
