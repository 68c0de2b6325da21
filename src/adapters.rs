use std::io::Write;
use std::path::{Path, PathBuf};

use pallas::network::facades::NodeClient;
use pallas::network::miniprotocols::localstate::queries_v16 as q16;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::prelude::*;

/// The local file system.
///
/// Files are written to a temporary sibling first and then renamed over the
/// destination, so an interrupted write never leaves a truncated artifact.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalStore;

impl LocalStore {
    fn write_atomic(path: &Path, contents: &[u8]) -> std::io::Result<()> {
        let parent = match path.parent() {
            Some(x) if !x.as_os_str().is_empty() => x,
            _ => Path::new("."),
        };

        let mut tmp = tempfile::NamedTempFile::new_in(parent)?;
        tmp.write_all(contents)?;
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| e.error)?;

        Ok(())
    }
}

impl FileStore for LocalStore {
    fn create_dir_all(&self, path: &Path) -> Result<(), FileError> {
        std::fs::create_dir_all(path).map_err(|source| FileError::CreateDir {
            path: path.to_path_buf(),
            source,
        })
    }

    fn write_file(&self, path: &Path, contents: &[u8]) -> Result<(), FileError> {
        Self::write_atomic(path, contents).map_err(|source| FileError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    fn read_file(&self, path: &Path) -> Result<Vec<u8>, FileError> {
        std::fs::read(path).map_err(|source| FileError::Read {
            path: path.to_path_buf(),
            source,
        })
    }

    fn list_dir(&self, path: &Path) -> Result<Vec<PathBuf>, FileError> {
        let list_err = |source| FileError::List {
            path: path.to_path_buf(),
            source,
        };

        let mut out = vec![];

        for entry in std::fs::read_dir(path).map_err(list_err)? {
            let entry = entry.map_err(list_err)?;

            if entry.file_type().map_err(list_err)?.is_file() {
                out.push(entry.path());
            }
        }

        Ok(out)
    }
}

/// A node reached through its node-to-client socket.
///
/// The local state query protocol is sequential, so concurrent callers are
/// serialized on the connection.
pub struct NodeClientQuery {
    client: Mutex<NodeClient>,
}

impl NodeClientQuery {
    pub async fn connect(socket: &Path, magic: u64) -> Result<Self, QueryError> {
        let client = NodeClient::connect(socket, magic)
            .await
            .map_err(QueryError::connection)?;

        Ok(Self {
            client: Mutex::new(client),
        })
    }
}

impl NodeQuery for NodeClientQuery {
    async fn utxos_by_address(&self, address: WireAddress) -> Result<Vec<WireUtxo>, QueryError> {
        let mut client = self.client.lock().await;
        let statequery = client.statequery();

        statequery
            .acquire(None)
            .await
            .map_err(QueryError::connection)?;

        let era = q16::get_current_era(statequery).await;

        let response = match era {
            Ok(era) => {
                debug!(era, "querying utxos by address");
                q16::get_utxo_by_address(statequery, era, vec![address]).await
            }
            Err(e) => Err(e),
        };

        // the acquired state is released even when the query failed
        if let Err(e) = statequery.send_release().await {
            warn!(error = %e, "failed to release node state");
        }

        let response = response.map_err(QueryError::connection)?;

        Ok(response.utxo.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_store_round_trip() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("nested/scripts");

        LocalStore.create_dir_all(&dir).unwrap();

        let file = dir.join("datum.json");
        LocalStore.write_file(&file, b"first").unwrap();
        LocalStore.write_file(&file, b"second").unwrap();

        assert_eq!(LocalStore.read_file(&file).unwrap(), b"second");
        assert_eq!(LocalStore.list_dir(&dir).unwrap(), vec![file]);
    }

    #[test]
    fn list_skips_directories() {
        let tmp = tempfile::tempdir().unwrap();

        LocalStore.create_dir_all(&tmp.path().join("inner")).unwrap();
        LocalStore
            .write_file(&tmp.path().join("a.skey"), b"{}")
            .unwrap();

        let listed = LocalStore.list_dir(tmp.path()).unwrap();

        assert_eq!(listed, vec![tmp.path().join("a.skey")]);
    }

    #[test]
    fn errors_carry_the_path() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = tmp.path().join("missing");

        let err = LocalStore.read_file(&missing).unwrap_err();
        assert!(matches!(err, FileError::Read { .. }));
        assert_eq!(err.path(), missing);

        let err = LocalStore
            .write_file(&missing.join("file.json"), b"")
            .unwrap_err();
        assert!(matches!(err, FileError::Write { .. }));
        assert_eq!(err.kind(), std::io::ErrorKind::NotFound);

        let err = LocalStore.list_dir(&missing).unwrap_err();
        assert!(matches!(err, FileError::List { .. }));
    }
}
