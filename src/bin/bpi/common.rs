use bpi::prelude::*;
use miette::{Context as _, IntoDiagnostic};
use tracing_subscriber::{filter::Targets, prelude::*};

pub fn setup_tracing(config: &LoggingConfig) -> miette::Result<()> {
    let level = config.max_level;

    let mut filter = Targets::new().with_target("bpi", level);

    if config.include_pallas {
        filter = filter.with_target("pallas", level);
    }

    tracing_subscriber::FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish()
        .with(filter)
        .try_init()
        .into_diagnostic()
        .context("installing tracing subscriber")?;

    Ok(())
}

pub fn node_config(config: &RootConfig) -> miette::Result<&NodeConfig> {
    let node = config
        .node
        .as_ref()
        .ok_or_else(|| Error::config("missing [node] section"))?;

    Ok(node)
}
