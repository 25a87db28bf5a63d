//! Offline stand-in for the payment and storage networks.
//!
//! Content ids are derived from the bytes exactly like a content-addressed
//! network would: the same file always gets the same id.

use std::sync::Mutex;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use tracing::debug;

use permaupload_core::{ManifestData, StagedFile};

use crate::error::ProviderError;
use crate::provider::{Amount, PaymentProvider, StorageProvider, UploadReceipt};

/// Unpadded base64url BLAKE3 digest, 43 characters.
pub fn content_id(bytes: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(blake3::hash(bytes).as_bytes())
}

/// In-process network that charges per byte and stores nothing.
#[derive(Debug)]
pub struct DryRunNetwork {
    price_per_byte: Amount,
    balance: Mutex<Amount>,
}

impl DryRunNetwork {
    /// Create a network with a per-byte price and a starting balance.
    pub fn new(price_per_byte: Amount, initial_balance: Amount) -> Self {
        Self {
            price_per_byte,
            balance: Mutex::new(initial_balance),
        }
    }

    fn lock_balance(&self) -> Result<std::sync::MutexGuard<'_, Amount>, ProviderError> {
        self.balance.lock().map_err(|_| ProviderError::Network {
            message: "balance lock poisoned".to_string(),
        })
    }

    fn price(&self, bytes: u64) -> Result<Amount, ProviderError> {
        Amount::from(bytes)
            .checked_mul(self.price_per_byte)
            .ok_or_else(|| ProviderError::rejected("price overflow"))
    }
}

#[async_trait]
impl PaymentProvider for DryRunNetwork {
    async fn get_price(&self, bytes: u64) -> Result<Amount, ProviderError> {
        self.price(bytes)
    }

    async fn fund(&self, amount: Amount) -> Result<String, ProviderError> {
        let mut balance = self.lock_balance()?;
        *balance = balance
            .checked_add(amount)
            .ok_or_else(|| ProviderError::rejected("balance overflow"))?;
        debug!(%amount, balance = %*balance, "funded");
        Ok(content_id(&amount.to_le_bytes()))
    }

    async fn refetch_balance(&self) -> Result<String, ProviderError> {
        Ok(self.lock_balance()?.to_string())
    }

    async fn balance(&self) -> Result<Amount, ProviderError> {
        Ok(*self.lock_balance()?)
    }
}

#[async_trait]
impl StorageProvider for DryRunNetwork {
    async fn upload_folder(&self, files: &[StagedFile]) -> Result<UploadReceipt, ProviderError> {
        let mut paths = Vec::with_capacity(files.len());
        let mut bytes = 0u64;
        for file in files {
            let content = file.read().await.map_err(|source| ProviderError::Read {
                path: file.path.clone(),
                source,
            })?;
            bytes += content.len() as u64;
            paths.push((file.path.clone(), content_id(&content)));
        }

        let price = self.price(bytes)?;
        {
            let mut balance = self.lock_balance()?;
            if *balance < price {
                return Err(ProviderError::rejected(format!(
                    "Insufficient balance: {} < {price}",
                    *balance
                )));
            }
            *balance -= price;
        }

        let manifest = ManifestData::from_paths(paths);
        let serialized = serde_json::to_vec(&manifest).map_err(|e| ProviderError::Network {
            message: e.to_string(),
        })?;
        let manifest_id = content_id(&serialized);
        debug!(files = files.len(), bytes, %price, manifest_id = %manifest_id, "uploaded");

        Ok(UploadReceipt {
            id: manifest_id.clone(),
            manifest,
            manifest_id,
        })
    }
}
