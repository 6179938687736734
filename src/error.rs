use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failures of one uploader run.
///
/// `NoPaths` and `Caption` are precondition failures raised before any
/// request is made. Everything the media client reports while logging in,
/// uploading or logging out is folded into `Operational`.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("No paths provided")]
    NoPaths,

    #[error("Failed to read caption file {}", path.display())]
    Caption {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{0}")]
    Operational(String),
}

impl UploadError {
    /// Collapse a client error into the operational kind, keeping its full
    /// context chain as the message.
    pub fn operational(err: anyhow::Error) -> Self {
        UploadError::Operational(format!("{:#}", err))
    }
}
