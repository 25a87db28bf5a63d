//! Error types for the upload pipeline.

use thiserror::Error;

use permaupload_core::{FsError, ManifestError};

/// Errors reported by payment and storage collaborators.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The collaborator could not be reached.
    #[error("Network error: {message}")]
    Network { message: String },

    /// A balance string that is not a non-negative integer.
    #[error("Invalid balance: {value:?}")]
    InvalidBalance { value: String },

    /// A staged file could not be read for upload.
    #[error("Failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: FsError,
    },

    /// The collaborator refused the request.
    #[error("{message}")]
    Rejected { message: String },
}

impl ProviderError {
    /// Create a rejection with a free-form message.
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected {
            message: message.into(),
        }
    }
}

/// Errors that abort an upload.
#[derive(Debug, Error)]
pub enum UploadError {
    /// The tree could not be collected.
    #[error("Failed to collect files: {0}")]
    Collect(#[source] FsError),

    /// The price quote failed.
    #[error("Failed to get price: {0}")]
    Quote(#[source] ProviderError),

    /// Funding or balance checks failed.
    #[error("Failed to fund upload: {0}")]
    Funding(#[source] ProviderError),

    /// The balance never reached the quoted price.
    #[error("Failed to confirm funding after multiple attempts. Please try again.")]
    FundingNotConfirmed { attempts: u32 },

    /// Funding confirmation was cancelled between attempts.
    #[error("Funding confirmation cancelled")]
    Cancelled,

    /// The storage collaborator failed.
    #[error("{0}")]
    Upload(#[source] ProviderError),

    /// The storage collaborator answered without an identifier.
    #[error("Upload response carried no identifier")]
    MissingId,

    /// The returned manifest could not be written back.
    #[error("Failed to save manifest: {0}")]
    Persist(#[source] ManifestError),

    /// Funding arithmetic overflowed.
    #[error("Funding amount overflow")]
    Overflow,
}
