//! Payment rail seam used to execute approved payouts.

use async_trait::async_trait;
use thiserror::Error;

#[cfg(test)]
use mockall::automock;

use crate::payout::PayoutRequest;

/// Synchronous rejection by the payment rail.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Payment rail error: {0}")]
pub struct RailError(pub String);

/// Executes payouts. The final outcome arrives later through webhooks.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait PaymentRail: Send + Sync {
    /// Submits an approved payout.
    async fn submit(&self, payout: &PayoutRequest) -> Result<(), RailError>;
}

/// Rail that only logs submissions, for development and tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingRail;

#[async_trait]
impl PaymentRail for LoggingRail {
    async fn submit(&self, payout: &PayoutRequest) -> Result<(), RailError> {
        tracing::info!(
            payout_id = %payout.id,
            teacher_id = %payout.teacher_id,
            amount = %payout.amount,
            method = %payout.method,
            "Payout submitted to payment rail"
        );
        Ok(())
    }
}
