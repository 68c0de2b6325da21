use bpi::{adapters::LocalStore, prelude::*};

#[derive(Debug, clap::Args)]
pub struct Args {}

pub fn run(config: &RootConfig, _args: &Args) -> miette::Result<()> {
    let keys = bpi::keys::load_all(&LocalStore, &config.paths)?;

    for (pkh, key) in keys.iter() {
        let kind = if key.is_padded() { "padded" } else { "extended" };
        println!("{pkh} {kind}");
    }

    Ok(())
}
