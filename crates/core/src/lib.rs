use std::{
    fmt::Display,
    path::{Path, PathBuf},
};

use pallas::{
    codec::utils::Bytes, crypto::hash::Hash,
    network::miniprotocols::localstate::queries_v16 as q16,
};
use thiserror::Error;

pub mod chain;
pub mod config;
pub mod model;
pub mod plutus;

pub use chain::*;
pub use config::*;
pub use model::*;

/// The index of an output in a tx
pub type TxoIdx = u32;

pub type TxHash = Hash<32>;
pub type ScriptHash = Hash<28>;
pub type PolicyId = Hash<28>;
pub type DatumHash = Hash<32>;
pub type RedeemerHash = Hash<32>;
pub type PubKeyHash = Hash<28>;

/// Address bytes as the node expects them, header included.
pub type WireAddress = Bytes;

/// A single entry of a node's UTxO query response.
pub type WireUtxo = (q16::UTxO, q16::TransactionOutput);

#[derive(Debug, Error)]
pub enum FileError {
    #[error("failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to list directory {path}: {source}")]
    List {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl FileError {
    /// The file or directory the failed operation was acting on.
    pub fn path(&self) -> &Path {
        match self {
            FileError::CreateDir { path, .. }
            | FileError::Write { path, .. }
            | FileError::Read { path, .. }
            | FileError::List { path, .. } => path,
        }
    }

    pub fn kind(&self) -> std::io::ErrorKind {
        match self {
            FileError::CreateDir { source, .. }
            | FileError::Write { source, .. }
            | FileError::Read { source, .. }
            | FileError::List { source, .. } => source.kind(),
        }
    }
}

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("address translation failed: {0}")]
    AddressTranslation(String),

    #[error("output translation failed: {0}")]
    OutputTranslation(String),

    #[error("node connection error: {0}")]
    Connection(String),
}

impl QueryError {
    pub fn address(error: impl Display) -> Self {
        Self::AddressTranslation(error.to_string())
    }

    pub fn output(error: impl Display) -> Self {
        Self::OutputTranslation(error.to_string())
    }

    pub fn connection(error: impl Display) -> Self {
        Self::Connection(error.to_string())
    }

    pub fn is_translation(&self) -> bool {
        matches!(
            self,
            Self::AddressTranslation(_) | Self::OutputTranslation(_)
        )
    }

    pub fn is_connection(&self) -> bool {
        matches!(self, Self::Connection(_))
    }
}

/// File-system capability used by the materializer and the key loader.
///
/// Writes are expected to be atomic per file: a reader never observes a
/// partially written artifact.
pub trait FileStore {
    fn create_dir_all(&self, path: &Path) -> Result<(), FileError>;

    /// Writes the whole content, replacing any existing file.
    fn write_file(&self, path: &Path, contents: &[u8]) -> Result<(), FileError>;

    fn read_file(&self, path: &Path) -> Result<Vec<u8>, FileError>;

    /// Lists the regular files of a directory, without recursion.
    fn list_dir(&self, path: &Path) -> Result<Vec<PathBuf>, FileError>;
}

impl<T: FileStore + ?Sized> FileStore for &T {
    fn create_dir_all(&self, path: &Path) -> Result<(), FileError> {
        (**self).create_dir_all(path)
    }

    fn write_file(&self, path: &Path, contents: &[u8]) -> Result<(), FileError> {
        (**self).write_file(path, contents)
    }

    fn read_file(&self, path: &Path) -> Result<Vec<u8>, FileError> {
        (**self).read_file(path)
    }

    fn list_dir(&self, path: &Path) -> Result<Vec<PathBuf>, FileError> {
        (**self).list_dir(path)
    }
}

/// Node capability: a point-in-time UTxO lookup by address.
///
/// Implementations issue the query against the node's current era. A lost
/// connection is reported as [`QueryError::Connection`], never retried.
#[trait_variant::make(Send)]
pub trait NodeQuery: Send + Sync {
    async fn utxos_by_address(&self, address: WireAddress) -> Result<Vec<WireUtxo>, QueryError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_error_classes() {
        assert!(QueryError::address("bad network").is_translation());
        assert!(QueryError::output("byron").is_translation());
        assert!(QueryError::connection("refused").is_connection());
        assert!(!QueryError::connection("refused").is_translation());
    }

    #[test]
    fn file_error_keeps_path() {
        let error = FileError::Write {
            path: PathBuf::from("/tmp/scripts/datum-00.json"),
            source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        };

        assert_eq!(error.path(), Path::new("/tmp/scripts/datum-00.json"));
        assert_eq!(error.kind(), std::io::ErrorKind::PermissionDenied);
        assert!(error.to_string().contains("datum-00.json"));
    }
}
