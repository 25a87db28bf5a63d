//! The upload pipeline: collect, quote, fund, upload, record.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use permaupload_core::{CollectConfig, ManifestData};
use permaupload_fs::{Browser, DirectoryCursor, collect, write_manifest};

use crate::error::UploadError;
use crate::funding::FundingPolicy;
use crate::provider::{Amount, PaymentProvider, StorageProvider};

/// Fallback shown when a failure carries no message of its own.
const GENERIC_FAILURE: &str = "Upload failed";

/// Lifecycle of one upload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadStatus {
    #[default]
    Idle,
    Pending,
    Success,
    Error,
}

impl std::fmt::Display for UploadStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Pending => write!(f, "pending"),
            Self::Success => write!(f, "success"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Observable state of the most recent upload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionState {
    pub status: UploadStatus,
    /// Manifest id of the last successful upload.
    pub hash: Option<String>,
    pub error: Option<String>,
    pub is_loading: bool,
}

/// Result of a successful upload.
#[derive(Debug, Clone)]
pub struct UploadOutcome {
    /// Transaction id returned by the storage network.
    pub id: String,
    /// Top-level manifest id.
    pub manifest_id: String,
    /// Manifest as written to disk.
    pub manifest: ManifestData,
    pub file_count: usize,
    pub total_size: u64,
    pub price: Amount,
    /// Amount requested from the payment network, if any.
    pub funded: Option<Amount>,
}

type CompletionHook = Box<dyn Fn(&str) + Send + Sync>;

/// Sequences an upload of the cursor's working directory.
///
/// One pipeline serves one session. Runs must not overlap: the cursor is
/// moved during collection.
pub struct UploadPipeline {
    payment: Arc<dyn PaymentProvider>,
    storage: Arc<dyn StorageProvider>,
    policy: FundingPolicy,
    /// Token of the current or next run. Replaced once a run ends cancelled.
    cancel: Mutex<CancellationToken>,
    state: watch::Sender<TransactionState>,
    on_complete: Option<CompletionHook>,
}

impl std::fmt::Debug for UploadPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadPipeline")
            .field("policy", &self.policy)
            .field("state", &*self.state.borrow())
            .finish_non_exhaustive()
    }
}

impl UploadPipeline {
    /// Create a pipeline over a payment and a storage collaborator.
    pub fn new(payment: Arc<dyn PaymentProvider>, storage: Arc<dyn StorageProvider>) -> Self {
        let (state, _) = watch::channel(TransactionState::default());
        Self {
            payment,
            storage,
            policy: FundingPolicy::default(),
            cancel: Mutex::new(CancellationToken::new()),
            state,
            on_complete: None,
        }
    }

    /// Use a different funding policy.
    pub fn with_policy(mut self, policy: FundingPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Call `hook` with the new manifest id after every successful upload.
    pub fn with_completion_hook(mut self, hook: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.on_complete = Some(Box::new(hook));
        self
    }

    /// Token that aborts funding confirmation of the current or next run.
    ///
    /// Cancelling affects a single run: once that run has ended, later runs
    /// get a fresh token.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel_slot().clone()
    }

    /// Current transaction state.
    pub fn state(&self) -> TransactionState {
        self.state.borrow().clone()
    }

    /// Watch the transaction state.
    pub fn subscribe(&self) -> watch::Receiver<TransactionState> {
        self.state.subscribe()
    }

    /// Upload the browser's working directory and refresh its listing.
    ///
    /// Does nothing without a browser. Failures are published as the error
    /// state and returned.
    pub async fn run(&self, browser: Option<&mut Browser>) -> Result<Option<UploadOutcome>, UploadError> {
        let Some(browser) = browser else {
            return Ok(None);
        };

        self.state.send_modify(|state| {
            state.status = UploadStatus::Pending;
            state.error = None;
            state.is_loading = true;
        });

        let cancel = self.cancel_token();
        let result = self.upload(browser.cursor_mut(), &cancel).await;
        if cancel.is_cancelled() {
            *self.cancel_slot() = CancellationToken::new();
        }

        let outcome = match result {
            Ok(outcome) => outcome,
            Err(err) => {
                self.fail(&err);
                return Err(err);
            }
        };

        if let Err(err) = browser.refresh().await {
            let err = UploadError::Collect(err);
            self.fail(&err);
            return Err(err);
        }

        if let Some(hook) = &self.on_complete {
            hook(&outcome.manifest_id);
        }

        Ok(Some(outcome))
    }

    async fn upload(
        &self,
        cursor: &mut DirectoryCursor,
        cancel: &CancellationToken,
    ) -> Result<UploadOutcome, UploadError> {
        let files = collect(cursor, &CollectConfig::default())
            .await
            .map_err(UploadError::Collect)?;

        let price = self
            .payment
            .get_price(files.total_size)
            .await
            .map_err(UploadError::Quote)?;
        let balance = self
            .payment
            .balance()
            .await
            .map_err(UploadError::Funding)?;

        info!(
            files = files.file_count(),
            bytes = files.total_size,
            %price,
            %balance,
            "quoted upload"
        );

        let funded = self.policy.required_funding(price, balance)?;
        if let Some(amount) = funded {
            info!(%amount, "funding required");
            let tx = self.payment.fund(amount).await.map_err(UploadError::Funding)?;
            info!(tx = %tx, "funding submitted");
            self.policy
                .await_balance(self.payment.as_ref(), price, cancel)
                .await?;
        }

        let receipt = self
            .storage
            .upload_folder(&files.files)
            .await
            .map_err(UploadError::Upload)?;
        if receipt.id.is_empty() {
            return Err(UploadError::MissingId);
        }

        self.state.send_modify(|state| {
            state.status = UploadStatus::Success;
            state.hash = Some(receipt.manifest_id.clone());
            state.is_loading = false;
        });
        info!(id = %receipt.id, manifest_id = %receipt.manifest_id, "upload complete");

        let manifest = receipt.manifest.with_manifest_id(receipt.manifest_id.clone());
        write_manifest(cursor, &manifest, None)
            .await
            .map_err(UploadError::Persist)?;

        Ok(UploadOutcome {
            id: receipt.id,
            manifest_id: receipt.manifest_id,
            manifest,
            file_count: files.files.len(),
            total_size: files.total_size,
            price,
            funded,
        })
    }

    fn cancel_slot(&self) -> MutexGuard<'_, CancellationToken> {
        self.cancel.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn fail(&self, err: &UploadError) {
        error!(error = %err, "upload failed");
        let message = err.to_string();
        let message = if message.is_empty() {
            GENERIC_FAILURE.to_string()
        } else {
            message
        };
        self.state.send_modify(|state| {
            state.status = UploadStatus::Error;
            state.error = Some(message);
            state.is_loading = false;
        });
    }
}
