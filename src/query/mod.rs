//! UTxO lookups against a node.
//!
//! [`QueryService`] turns a chain address into the node's representation,
//! asks the node for the outputs sitting there and translates the response
//! back. Translation is all-or-nothing.

use std::path::PathBuf;
use std::time::Duration;

use pallas::ledger::addresses::Network;
use tracing::{debug, info, instrument};

use crate::adapters::NodeClientQuery;
use crate::prelude::*;

pub mod convert;

pub use convert::parse_address;

/// Everything needed to reach a node, already validated.
#[derive(Debug, Clone)]
pub struct ConnectionParams {
    pub socket_path: PathBuf,
    pub network_magic: u64,
    pub network: Network,
    pub timeout: Option<Duration>,
}

impl ConnectionParams {
    pub fn from_config(config: &NodeConfig) -> Result<Self, Error> {
        if config.socket_path.as_os_str().is_empty() {
            return Err(Error::config("node socket path can't be empty"));
        }

        if config.network_id > convert::MAX_NETWORK_ID {
            return Err(Error::config(format!(
                "network id {} doesn't fit in an address header",
                config.network_id
            )));
        }

        Ok(Self {
            socket_path: config.socket_path.clone(),
            network_magic: config.network_magic,
            network: Network::from(config.network_id),
            timeout: config.query_timeout(),
        })
    }

    /// Opens a connection to the node's local socket.
    pub async fn connect(self) -> Result<QueryService<NodeClientQuery>, QueryError> {
        let node = NodeClientQuery::connect(&self.socket_path, self.network_magic).await?;

        info!(socket = %self.socket_path.display(), "connected to node");

        Ok(self.attach(node))
    }

    /// Builds a service over an already established node capability.
    pub fn attach<N: NodeQuery>(self, node: N) -> QueryService<N> {
        QueryService {
            node,
            network: self.network,
            timeout: self.timeout,
        }
    }
}

pub struct QueryService<N> {
    node: N,
    network: Network,
    timeout: Option<Duration>,
}

impl<N: NodeQuery> QueryService<N> {
    async fn fetch(&self, address: WireAddress) -> Result<Vec<WireUtxo>, QueryError> {
        let Some(timeout) = self.timeout else {
            return self.node.utxos_by_address(address).await;
        };

        tokio::time::timeout(timeout, self.node.utxos_by_address(address))
            .await
            .map_err(|_| QueryError::connection(format!("no answer after {timeout:?}")))?
    }

    /// Every output currently sitting at the address.
    ///
    /// Fails without contacting the node if the address can't be encoded,
    /// and fails as a whole if any returned output can't be translated.
    #[instrument(skip_all, fields(network = ?self.network))]
    pub async fn utxos_at(&self, address: &ChainAddress) -> Result<UtxoSet, QueryError> {
        let wire = convert::address_to_wire(address, self.network)?;

        debug!(address = %hex::encode(wire.as_slice()), "querying utxos by address");

        let response = self.fetch(wire).await?;
        let utxos = convert::utxos_from_wire(response, self.network)?;

        debug!(count = utxos.len(), "utxos translated");

        Ok(utxos)
    }
}
