//! Seams to the payment and storage networks.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use permaupload_core::{ManifestData, StagedFile};

use crate::error::ProviderError;

/// Smallest-unit token amount.
pub type Amount = u128;

/// Pays for storage.
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Price of storing `bytes` bytes.
    async fn get_price(&self, bytes: u64) -> Result<Amount, ProviderError>;

    /// Request funding. Returns the funding transaction id.
    ///
    /// Funds may land later: callers confirm with [`PaymentProvider::refetch_balance`].
    async fn fund(&self, amount: Amount) -> Result<String, ProviderError>;

    /// Fresh balance from the network, as a decimal string.
    async fn refetch_balance(&self) -> Result<String, ProviderError>;

    /// Last known balance.
    async fn balance(&self) -> Result<Amount, ProviderError>;
}

/// Stores files.
#[async_trait]
pub trait StorageProvider: Send + Sync {
    /// Upload every staged file under its relative path.
    async fn upload_folder(&self, files: &[StagedFile]) -> Result<UploadReceipt, ProviderError>;
}

/// What the storage network returns for a folder upload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadReceipt {
    /// Transaction id of the upload. Empty when the network returned none.
    pub id: String,
    /// Path table of the upload.
    pub manifest: ManifestData,
    /// Top-level id the manifest is reachable under.
    pub manifest_id: String,
}

/// Parse a decimal balance string.
pub fn parse_balance(value: &str) -> Result<Amount, ProviderError> {
    value
        .trim()
        .parse::<Amount>()
        .map_err(|_| ProviderError::InvalidBalance {
            value: value.to_string(),
        })
}
