//! Integration tests for the upload pipeline.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use permaupload_core::{MANIFEST_FILE_NAME, ManifestData, StagedFile};
use permaupload_fs::{Browser, MemoryDirectory, read_manifest};
use permaupload_upload::{
    Amount, DryRunNetwork, FundingPolicy, PaymentProvider, ProviderError, StorageProvider,
    UploadError, UploadPipeline, UploadReceipt, UploadStatus,
};

/// Payment side with a fixed price whose balance only moves on a schedule.
struct ScriptedPayment {
    price: Amount,
    balance: Amount,
    /// Balance reported by each refetch; the last value repeats.
    polls: Vec<Amount>,
    poll_count: AtomicUsize,
    funded: Mutex<Vec<Amount>>,
}

impl ScriptedPayment {
    fn new(price: Amount, balance: Amount, polls: Vec<Amount>) -> Self {
        Self {
            price,
            balance,
            polls,
            poll_count: AtomicUsize::new(0),
            funded: Mutex::new(Vec::new()),
        }
    }

    fn poll_count(&self) -> usize {
        self.poll_count.load(Ordering::SeqCst)
    }

    fn funded(&self) -> Vec<Amount> {
        self.funded.lock().unwrap().clone()
    }
}

#[async_trait]
impl PaymentProvider for ScriptedPayment {
    async fn get_price(&self, _bytes: u64) -> Result<Amount, ProviderError> {
        Ok(self.price)
    }

    async fn fund(&self, amount: Amount) -> Result<String, ProviderError> {
        self.funded.lock().unwrap().push(amount);
        Ok("fund-tx".to_string())
    }

    async fn refetch_balance(&self) -> Result<String, ProviderError> {
        let n = self.poll_count.fetch_add(1, Ordering::SeqCst);
        let value = self.polls.get(n).or(self.polls.last()).copied().unwrap_or(0);
        Ok(value.to_string())
    }

    async fn balance(&self) -> Result<Amount, ProviderError> {
        Ok(self.balance)
    }
}

/// Storage side that records calls and answers with fixed ids.
#[derive(Default)]
struct RecordingStorage {
    calls: AtomicUsize,
    uploaded: Mutex<Vec<String>>,
    fail_with: Option<String>,
}

#[async_trait]
impl StorageProvider for RecordingStorage {
    async fn upload_folder(&self, files: &[StagedFile]) -> Result<UploadReceipt, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = &self.fail_with {
            return Err(ProviderError::rejected(message.clone()));
        }
        let paths: Vec<String> = files.iter().map(|f| f.path.clone()).collect();
        self.uploaded.lock().unwrap().extend(paths.iter().cloned());
        Ok(UploadReceipt {
            id: "bundle-tx".to_string(),
            manifest: ManifestData::from_paths(paths.iter().map(|p| (p.clone(), format!("id-{p}")))),
            manifest_id: "manifest-tx".to_string(),
        })
    }
}

async fn site() -> Browser {
    let root = MemoryDirectory::new("site");
    root.write_path("index.html", "<html/>").await;
    root.write_path("img/logo.png", "png").await;
    root.write_path("node_modules/dep.js", "skip me").await;
    Browser::open(root).await.unwrap()
}

#[tokio::test(start_paused = true)]
async fn test_funding_confirmed_on_third_poll() {
    let payment = Arc::new(ScriptedPayment::new(100, 0, vec![0, 50, 100]));
    let storage = Arc::new(RecordingStorage::default());
    let pipeline = UploadPipeline::new(payment.clone(), storage.clone());
    let mut browser = site().await;

    let start = tokio::time::Instant::now();
    let outcome = pipeline.run(Some(&mut browser)).await.unwrap().unwrap();
    let elapsed = start.elapsed();

    assert_eq!(payment.poll_count(), 3);
    assert!(elapsed >= Duration::from_secs(10));
    assert!(elapsed < Duration::from_secs(15));
    assert_eq!(payment.funded(), vec![105]);
    assert_eq!(outcome.funded, Some(105));
    assert_eq!(storage.calls.load(Ordering::SeqCst), 1);

    let state = pipeline.state();
    assert_eq!(state.status, UploadStatus::Success);
    assert_eq!(state.hash.as_deref(), Some("manifest-tx"));
    assert!(!state.is_loading);
}

#[tokio::test(start_paused = true)]
async fn test_funding_never_confirmed() {
    let payment = Arc::new(ScriptedPayment::new(100, 0, vec![0, 40, 99]));
    let storage = Arc::new(RecordingStorage::default());
    let pipeline = UploadPipeline::new(payment.clone(), storage.clone());
    let mut browser = site().await;

    let err = pipeline.run(Some(&mut browser)).await.unwrap_err();

    assert!(matches!(err, UploadError::FundingNotConfirmed { attempts: 3 }));
    assert_eq!(payment.poll_count(), 3);
    assert_eq!(storage.calls.load(Ordering::SeqCst), 0);

    let state = pipeline.state();
    assert_eq!(state.status, UploadStatus::Error);
    assert_eq!(
        state.error.as_deref(),
        Some("Failed to confirm funding after multiple attempts. Please try again.")
    );
    assert!(read_manifest(browser.cursor()).await.is_none());
}

#[tokio::test]
async fn test_no_funding_when_balance_covers_price() {
    let payment = Arc::new(ScriptedPayment::new(100, 100, vec![]));
    let storage = Arc::new(RecordingStorage::default());
    let pipeline = UploadPipeline::new(payment.clone(), storage.clone());
    let mut browser = site().await;

    let outcome = pipeline.run(Some(&mut browser)).await.unwrap().unwrap();

    assert_eq!(outcome.funded, None);
    assert!(payment.funded().is_empty());
    assert_eq!(payment.poll_count(), 0);

    let mut uploaded = storage.uploaded.lock().unwrap().clone();
    uploaded.sort();
    assert_eq!(uploaded, vec!["img/logo.png", "index.html"]);
}

#[tokio::test]
async fn test_manifest_written_and_listing_refreshed() {
    let payment = Arc::new(ScriptedPayment::new(0, 0, vec![]));
    let storage = Arc::new(RecordingStorage::default());
    let completed = Arc::new(Mutex::new(None::<String>));
    let hook_target = completed.clone();
    let pipeline = UploadPipeline::new(payment, storage).with_completion_hook(move |id| {
        *hook_target.lock().unwrap() = Some(id.to_string());
    });
    let mut browser = site().await;
    let before = browser.refresh_count();

    pipeline.run(Some(&mut browser)).await.unwrap();

    assert_eq!(completed.lock().unwrap().as_deref(), Some("manifest-tx"));
    assert!(browser.refresh_count() > before);
    assert!(browser.entries().iter().any(|e| e.name() == MANIFEST_FILE_NAME));
    assert_eq!(browser.manifest_id(), Some("manifest-tx"));
    assert_eq!(
        browser.manifest_info()["index.html"].url,
        "https://arweave.net/manifest-tx/index.html"
    );

    let manifest = read_manifest(browser.cursor()).await.unwrap();
    assert_eq!(manifest.manifest_id.as_deref(), Some("manifest-tx"));
    assert_eq!(manifest.paths["img/logo.png"].id, "id-img/logo.png");
}

#[tokio::test]
async fn test_upload_from_subdirectory_writes_there() {
    let storage = Arc::new(RecordingStorage::default());
    let pipeline = UploadPipeline::new(Arc::new(ScriptedPayment::new(0, 0, vec![])), storage.clone());
    let mut browser = site().await;
    let dir = browser.directory("img").unwrap();
    browser.navigate_to_directory(&dir).await.unwrap();

    pipeline.run(Some(&mut browser)).await.unwrap();

    assert_eq!(*storage.uploaded.lock().unwrap(), vec!["logo.png"]);
    assert_eq!(browser.current_path(), "img");
    assert_eq!(
        browser.manifest_info()["logo.png"].url,
        "https://arweave.net/manifest-tx/logo.png"
    );
}

#[tokio::test]
async fn test_upload_error_is_verbatim() {
    let storage = Arc::new(RecordingStorage {
        fail_with: Some("gateway timeout".to_string()),
        ..Default::default()
    });
    let pipeline = UploadPipeline::new(Arc::new(ScriptedPayment::new(0, 0, vec![])), storage);
    let mut browser = site().await;

    let err = pipeline.run(Some(&mut browser)).await.unwrap_err();

    assert!(matches!(err, UploadError::Upload(_)));
    assert_eq!(pipeline.state().error.as_deref(), Some("gateway timeout"));
    assert!(read_manifest(browser.cursor()).await.is_none());
}

#[tokio::test]
async fn test_no_browser_is_a_no_op() {
    let storage = Arc::new(RecordingStorage::default());
    let pipeline = UploadPipeline::new(Arc::new(ScriptedPayment::new(0, 0, vec![])), storage.clone());

    assert!(pipeline.run(None).await.unwrap().is_none());
    assert_eq!(pipeline.state().status, UploadStatus::Idle);
    assert_eq!(storage.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_between_polls() {
    let payment = Arc::new(ScriptedPayment::new(100, 0, vec![0]));
    let pipeline = UploadPipeline::new(payment.clone(), Arc::new(RecordingStorage::default()));
    let token = pipeline.cancel_token();
    let mut browser = site().await;

    let canceller = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(1)).await;
        token.cancel();
    });

    let err = pipeline.run(Some(&mut browser)).await.unwrap_err();
    canceller.await.unwrap();

    assert!(matches!(err, UploadError::Cancelled));
    assert_eq!(payment.poll_count(), 1);
}

#[tokio::test]
async fn test_dry_run_end_to_end() {
    let network = Arc::new(DryRunNetwork::new(1, 0));
    let pipeline = UploadPipeline::new(network.clone(), network.clone())
        .with_policy(FundingPolicy::default().with_interval(Duration::from_millis(1)));
    let mut browser = site().await;

    let outcome = pipeline.run(Some(&mut browser)).await.unwrap().unwrap();

    // 7 + 3 bytes at one unit each; the buffer truncates back to 10
    assert_eq!(outcome.total_size, 10);
    assert_eq!(outcome.price, 10);
    assert_eq!(outcome.funded, Some(10));
    assert_eq!(network.balance().await.unwrap(), 0);
    assert_eq!(outcome.manifest_id.len(), 43);
    assert_eq!(browser.manifest_id(), Some(outcome.manifest_id.as_str()));
}

#[tokio::test(start_paused = true)]
async fn test_cancelling_one_run_leaves_the_next_alone() {
    // Run 1 polls once then is cancelled; run 2 sees 100 on its second poll.
    let payment = Arc::new(ScriptedPayment::new(100, 0, vec![0, 0, 100]));
    let storage = Arc::new(RecordingStorage::default());
    let pipeline = UploadPipeline::new(payment.clone(), storage.clone());
    let mut browser = site().await;

    let token = pipeline.cancel_token();
    let canceller = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(1)).await;
        token.cancel();
    });
    let err = pipeline.run(Some(&mut browser)).await.unwrap_err();
    canceller.await.unwrap();
    assert!(matches!(err, UploadError::Cancelled));
    assert!(!pipeline.cancel_token().is_cancelled());

    let outcome = pipeline.run(Some(&mut browser)).await.unwrap().unwrap();

    assert_eq!(outcome.manifest_id, "manifest-tx");
    assert_eq!(payment.poll_count(), 3);
    assert_eq!(storage.calls.load(Ordering::SeqCst), 1);
    assert_eq!(pipeline.state().status, UploadStatus::Success);
}

#[tokio::test]
async fn test_failure_on_empty_tree_is_published() {
    let storage = Arc::new(RecordingStorage {
        fail_with: Some("nothing to store".to_string()),
        ..Default::default()
    });
    let pipeline = UploadPipeline::new(Arc::new(ScriptedPayment::new(0, 0, vec![])), storage);
    let mut rx = pipeline.subscribe();
    let mut browser = Browser::open(MemoryDirectory::new("empty")).await.unwrap();

    assert!(pipeline.run(Some(&mut browser)).await.is_err());

    assert!(rx.has_changed().unwrap());
    let state = rx.borrow_and_update().clone();
    assert_eq!(state.status, UploadStatus::Error);
    assert_eq!(state.error.as_deref(), Some("nothing to store"));
    assert!(!state.is_loading);
}
