use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum XmlError {
    #[error("malformed descriptor at byte {position}: {message}")]
    Malformed { position: usize, message: String },

    #[error("invalid element path '{input}': {message}")]
    InvalidElementPath { input: String, message: String },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("edit error: {0}")]
    Edit(#[from] crate::edit::EditError),
}
