//! Error types for loading configuration and cue sheets.
//!
//! The timeline itself never fails; only the file-facing edges do.

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{}: {source}", .path.display())]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("cue {index}: {reason}")]
    InvalidCue { index: usize, reason: String },
}
