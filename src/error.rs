//! Error types for the scanner and the terminal front end

use std::{io, path::PathBuf};
use thiserror::Error;

/// Errors surfaced by the scanning core and the binary
#[derive(Error, Debug)]
pub enum Error {
    /// Listing a directory failed (permission denied, vanished, not a directory)
    #[error("failed to read directory '{}': {source}", path.display())]
    ReadDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Removing a file or directory from disk failed
    #[error("failed to delete '{}': {source}", path.display())]
    Delete {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Synthetic small-file groups have nothing on disk to delete
    #[error("'{name}' is a group of small files and cannot be deleted")]
    VirtualEntry { name: String },

    /// A scan worker thread could not be started
    #[error("failed to spawn scan worker: {source}")]
    Spawn {
        #[source]
        source: io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
