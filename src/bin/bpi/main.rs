use std::path::PathBuf;

use bpi::prelude::RootConfig;
use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};

mod common;
mod keys;
mod paths;
mod utxos;

#[derive(Debug, Subcommand)]
enum Command {
    /// Load every signing key of the key directory
    Keys(keys::Args),

    /// Query the node for the outputs sitting at an address
    Utxos(utxos::Args),

    /// Print where an artifact is stored
    Paths(paths::Args),
}

#[derive(Debug, Parser)]
#[clap(name = "bpi")]
#[clap(bin_name = "bpi")]
#[clap(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

fn load_config(explicit_file: &Option<PathBuf>) -> Result<RootConfig, config::ConfigError> {
    let mut s = config::Config::builder();

    // our base config will always be in /etc/bpi
    s = s.add_source(config::File::with_name("/etc/bpi/bpi.toml").required(false));

    // but we can override it by having a file in the working dir
    s = s.add_source(config::File::with_name("bpi.toml").required(false));

    // if an explicit file was passed, then we load it as mandatory
    if let Some(explicit) = explicit_file.as_ref().and_then(|x| x.to_str()) {
        s = s.add_source(config::File::with_name(explicit).required(true));
    }

    // finally, we use env vars to make some last-step overrides
    s = s.add_source(config::Environment::with_prefix("BPI").separator("_"));

    s.build()?.try_deserialize()
}

fn main() -> Result<()> {
    let args = Cli::parse();
    let config = load_config(&args.config).into_diagnostic()?;

    common::setup_tracing(&config.logging)?;

    match args.command {
        Command::Keys(x) => keys::run(&config, &x)?,
        Command::Utxos(x) => utxos::run(&config, &x)?,
        Command::Paths(x) => paths::run(&config, &x)?,
    };

    Ok(())
}
