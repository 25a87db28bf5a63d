//! Funding and upload pipeline for permaupload.
//!
//! The payment and storage networks are reached through
//! [`PaymentProvider`] and [`StorageProvider`]. [`UploadPipeline`] drives
//! them: it collects the working directory, tops up the balance when the
//! quote exceeds it, uploads, and writes the returned manifest next to the
//! uploaded files. [`DryRunNetwork`] implements both sides offline.

mod dryrun;
mod error;
mod funding;
mod pipeline;
mod provider;

pub use dryrun::{DryRunNetwork, content_id};
pub use error::{ProviderError, UploadError};
pub use funding::{DEFAULT_BUFFER_PERCENT, DEFAULT_MAX_ATTEMPTS, DEFAULT_RETRY_INTERVAL, FundingPolicy};
pub use pipeline::{TransactionState, UploadOutcome, UploadPipeline, UploadStatus};
pub use provider::{Amount, PaymentProvider, StorageProvider, UploadReceipt, parse_balance};
