pub use bpi_core::*;

use miette::Diagnostic;
use std::{fmt::Display, path::PathBuf};
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    #[error(transparent)]
    File(#[from] FileError),

    #[error("invalid signing key {path}: {reason}")]
    KeyParse { path: PathBuf, reason: String },

    #[error("encoding error: {0}")]
    Encoding(String),

    #[error(transparent)]
    Query(#[from] QueryError),

    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    pub fn config(text: impl Display) -> Error {
        Error::Config(text.to_string())
    }

    pub fn encoding(error: impl Display) -> Error {
        Error::Encoding(error.to_string())
    }

    pub fn key_parse(path: impl Into<PathBuf>, reason: impl Display) -> Error {
        Error::KeyParse {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}
