use std::{
    collections::HashMap,
    sync::atomic::{AtomicUsize, Ordering},
};

use bpi_core::{NodeQuery, QueryError, WireAddress, WireUtxo};

/// A node that answers from a canned UTxO set.
#[derive(Default)]
pub struct FakeNode {
    utxos: HashMap<Vec<u8>, Vec<WireUtxo>>,
    failure: Option<String>,
    calls: AtomicUsize,
}

impl FakeNode {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_utxos(mut self, address: impl Into<Vec<u8>>, utxos: Vec<WireUtxo>) -> Self {
        self.utxos.entry(address.into()).or_default().extend(utxos);
        self
    }

    /// Simulates a transport failure on every query.
    pub fn unreachable(reason: impl Into<String>) -> Self {
        Self {
            failure: Some(reason.into()),
            ..Default::default()
        }
    }

    /// Number of queries that reached the node.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl NodeQuery for FakeNode {
    async fn utxos_by_address(&self, address: WireAddress) -> Result<Vec<WireUtxo>, QueryError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(reason) = &self.failure {
            return Err(QueryError::connection(reason));
        }

        let key: &[u8] = address.as_ref();

        Ok(self.utxos.get(key).cloned().unwrap_or_default())
    }
}
