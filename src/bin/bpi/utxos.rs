use itertools::Itertools;
use miette::Context;

use bpi::prelude::*;
use bpi::query::{parse_address, ConnectionParams};

#[derive(Debug, clap::Args)]
pub struct Args {
    /// bech32 address to look up
    address: String,
}

fn describe(output: &ChainOutput) -> String {
    let assets = output
        .value
        .assets
        .iter()
        .flat_map(|(policy, names)| {
            names
                .iter()
                .map(move |(name, amount)| format!("{amount} {policy}.{}", hex::encode(name)))
        })
        .join(" + ");

    let datum = match &output.datum {
        OutputDatum::None => "no datum".to_string(),
        OutputDatum::Hash(x) => format!("datum hash {x}"),
        OutputDatum::Inline(_) => "inline datum".to_string(),
    };

    if assets.is_empty() {
        format!("{} lovelace, {datum}", output.value.lovelace)
    } else {
        format!("{} lovelace + {assets}, {datum}", output.value.lovelace)
    }
}

#[tokio::main]
pub async fn run(config: &RootConfig, args: &Args) -> miette::Result<()> {
    let node = crate::common::node_config(config)?;
    let params = ConnectionParams::from_config(node)?;

    let address = parse_address(&args.address, params.network).map_err(Error::from)?;

    let service = params
        .connect()
        .await
        .map_err(Error::from)
        .context("connecting to node")?;

    let utxos = service.utxos_at(&address).await.map_err(Error::from)?;

    for (utxo, output) in utxos.iter().sorted_by_key(|(x, _)| **x) {
        println!("{utxo} {}", describe(output));
    }

    Ok(())
}
