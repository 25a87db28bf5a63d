//! Funding arithmetic and balance confirmation.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::error::UploadError;
use crate::provider::{Amount, PaymentProvider, parse_balance};

/// Default buffer applied to a shortfall, in percent.
pub const DEFAULT_BUFFER_PERCENT: Amount = 105;

/// Default number of balance checks after funding.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default spacing between balance checks.
pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_secs(5);

/// How a shortfall is funded and confirmed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FundingPolicy {
    /// Shortfall multiplier in percent (105 = 5% buffer).
    pub buffer_percent: Amount,
    /// Balance checks before giving up.
    pub max_attempts: u32,
    /// Wait between two balance checks.
    pub interval: Duration,
}

impl Default for FundingPolicy {
    fn default() -> Self {
        Self {
            buffer_percent: DEFAULT_BUFFER_PERCENT,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            interval: DEFAULT_RETRY_INTERVAL,
        }
    }
}

impl FundingPolicy {
    /// Set the buffer percentage.
    pub fn with_buffer_percent(mut self, buffer_percent: Amount) -> Self {
        self.buffer_percent = buffer_percent;
        self
    }

    /// Set the number of balance checks.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Set the wait between balance checks.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Amount to fund so that `balance` covers `price`, or `None` if it
    /// already does. The shortfall is scaled by the buffer and truncated.
    pub fn required_funding(&self, price: Amount, balance: Amount) -> Result<Option<Amount>, UploadError> {
        if price <= balance {
            return Ok(None);
        }
        let shortfall = price - balance;
        let buffered = shortfall
            .checked_mul(self.buffer_percent)
            .ok_or(UploadError::Overflow)?;
        Ok(Some(buffered / 100))
    }

    /// Poll the balance until it reaches `target`.
    ///
    /// Checks at most `max_attempts` times with `interval` between checks
    /// and no wait before the first or after the last. Cancellation is
    /// honoured while waiting.
    pub async fn await_balance(
        &self,
        payment: &dyn PaymentProvider,
        target: Amount,
        cancel: &CancellationToken,
    ) -> Result<Amount, UploadError> {
        for attempt in 1..=self.max_attempts {
            let raw = payment
                .refetch_balance()
                .await
                .map_err(UploadError::Funding)?;
            let balance = parse_balance(&raw).map_err(UploadError::Funding)?;
            info!(attempt, %balance, %target, "checked balance");

            if balance >= target {
                return Ok(balance);
            }

            if attempt < self.max_attempts {
                info!(
                    wait_secs = self.interval.as_secs_f64(),
                    "balance not sufficient yet"
                );
                tokio::select! {
                    _ = cancel.cancelled() => return Err(UploadError::Cancelled),
                    _ = tokio::time::sleep(self.interval) => {}
                }
            }
        }

        Err(UploadError::FundingNotConfirmed {
            attempts: self.max_attempts,
        })
    }
}
