//! Payout orchestration: requests, admin decisions and rail callbacks.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tutora_shared::types::{Money, PageRequest, PageResponse, PayoutRequestId, TeacherId};

use crate::notify::{Notification, Notifier};
use crate::payout::{
    PayoutAllocation, PayoutDraft, PayoutError, PayoutRequest, PayoutService, PayoutStatus,
    PayoutTransition,
};
use crate::rail::PaymentRail;
use crate::repository::PayoutStore;

/// Failure reason recorded when the rail rejects a payout without one.
const RAIL_REJECTED: &str = "payment rail rejected the payout";

/// A payout with the allocations funding it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PayoutDetails {
    /// The request.
    #[serde(flatten)]
    pub request: PayoutRequest,
    /// Its allocations.
    pub allocations: Vec<PayoutAllocation>,
}

/// Coordinates the payout store and the payment rail.
#[derive(Clone)]
pub struct PayoutEngine {
    payouts: Arc<dyn PayoutStore>,
    rail: Arc<dyn PaymentRail>,
    notifier: Arc<dyn Notifier>,
    minimum: Money,
}

impl PayoutEngine {
    /// Creates the engine.
    pub fn new(
        payouts: Arc<dyn PayoutStore>,
        rail: Arc<dyn PaymentRail>,
        notifier: Arc<dyn Notifier>,
        minimum: Money,
    ) -> Self {
        Self {
            payouts,
            rail,
            notifier,
            minimum,
        }
    }

    /// Smallest payout amount accepted.
    pub fn minimum(&self) -> Money {
        self.minimum
    }

    /// Creates a pending payout funded from the available balance.
    pub async fn request_payout(
        &self,
        draft: PayoutDraft,
        now: DateTime<Utc>,
    ) -> Result<PayoutDetails, PayoutError> {
        PayoutService::validate_draft(&draft, self.minimum)?;

        let (request, allocations) = self.payouts.create_payout(draft, self.minimum, now).await?;

        tracing::info!(
            payout_id = %request.id,
            teacher_id = %request.teacher_id,
            amount = %request.amount,
            method = %request.method,
            allocations = allocations.len(),
            "Payout requested"
        );
        Ok(PayoutDetails {
            request,
            allocations,
        })
    }

    /// Approves a pending payout and submits it to the rail.
    ///
    /// A synchronous rail error fails the payout with the rail's reason; the
    /// failed payout is returned rather than an error.
    pub async fn approve(
        &self,
        id: PayoutRequestId,
        now: DateTime<Utc>,
    ) -> Result<PayoutRequest, PayoutError> {
        let current = self.find(id).await?;
        let transition = PayoutService::approve(current.status, now)?;
        let approved = self.apply(&current, &transition).await?;

        match self.rail.submit(&approved).await {
            Ok(()) => Ok(approved),
            Err(err) => {
                let reason = if err.0.trim().is_empty() {
                    RAIL_REJECTED.to_string()
                } else {
                    err.0
                };
                tracing::warn!(payout_id = %id, reason = %reason, "Payment rail rejected payout");
                let transition = PayoutService::mark_failed(approved.status, &reason, now)?;
                self.apply(&approved, &transition).await
            }
        }
    }

    /// Rejects a pending payout, releasing its funds.
    pub async fn reject(
        &self,
        id: PayoutRequestId,
        reason: &str,
        now: DateTime<Utc>,
    ) -> Result<PayoutRequest, PayoutError> {
        let current = self.find(id).await?;
        let transition = PayoutService::reject(current.status, reason, now)?;
        self.apply(&current, &transition).await
    }

    /// Rail confirmation of a payment. Repeated deliveries are no-ops.
    pub async fn on_paid(
        &self,
        id: PayoutRequestId,
        now: DateTime<Utc>,
    ) -> Result<PayoutRequest, PayoutError> {
        let current = self.find(id).await?;
        if current.status == PayoutStatus::Paid {
            tracing::debug!(payout_id = %id, "Duplicate paid callback ignored");
            return Ok(current);
        }
        let transition = PayoutService::mark_paid(current.status, now)?;
        self.apply(&current, &transition).await
    }

    /// Rail report of a failed payment. Repeated deliveries are no-ops.
    pub async fn on_failed(
        &self,
        id: PayoutRequestId,
        reason: &str,
        now: DateTime<Utc>,
    ) -> Result<PayoutRequest, PayoutError> {
        let current = self.find(id).await?;
        if current.status == PayoutStatus::Failed {
            tracing::debug!(payout_id = %id, "Duplicate failed callback ignored");
            return Ok(current);
        }
        let transition = PayoutService::mark_failed(current.status, reason, now)?;
        self.apply(&current, &transition).await
    }

    /// A payout with its allocations.
    pub async fn get(&self, id: PayoutRequestId) -> Result<PayoutDetails, PayoutError> {
        let request = self.find(id).await?;
        let allocations = self.payouts.allocations(id).await?;
        Ok(PayoutDetails {
            request,
            allocations,
        })
    }

    /// A page of a teacher's payouts.
    pub async fn list(
        &self,
        teacher_id: TeacherId,
        page: PageRequest,
    ) -> Result<PageResponse<PayoutRequest>, PayoutError> {
        let page = page.normalized();
        let (payouts, total) = self.payouts.payouts_for_teacher(teacher_id, page).await?;
        Ok(PageResponse::new(payouts, page, total))
    }

    async fn find(&self, id: PayoutRequestId) -> Result<PayoutRequest, PayoutError> {
        self.payouts
            .find_payout(id)
            .await?
            .ok_or(PayoutError::NotFound(id))
    }

    async fn apply(
        &self,
        current: &PayoutRequest,
        transition: &PayoutTransition,
    ) -> Result<PayoutRequest, PayoutError> {
        let next = transition.apply(current);
        let stored = self.payouts.update_payout(&next, current.status).await?;

        tracing::info!(
            payout_id = %stored.id,
            teacher_id = %stored.teacher_id,
            from = %current.status,
            to = %stored.status,
            "Payout status changed"
        );
        self.notifier.notify(Notification::PayoutUpdated {
            payout_id: stored.id,
            teacher_id: stored.teacher_id,
            status: stored.status,
        });
        Ok(stored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::MockNotifier;
    use crate::payout::PayoutMethod;
    use crate::rail::{MockPaymentRail, RailError};
    use crate::repository::MockPayoutStore;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 10, 8, 0, 0).unwrap()
    }

    fn payout(status: PayoutStatus) -> PayoutRequest {
        PayoutRequest {
            id: PayoutRequestId::new(),
            teacher_id: TeacherId::new(),
            amount: Money::from_minor(300_000),
            method: PayoutMethod::BankTransfer,
            status,
            account_ref: "BCA-1234567".to_string(),
            requested_at: t0(),
            processed_at: None,
            failure_reason: None,
        }
    }

    fn store_with(current: PayoutRequest) -> MockPayoutStore {
        let mut store = MockPayoutStore::new();
        store
            .expect_find_payout()
            .returning(move |_| Ok(Some(current.clone())));
        store
            .expect_update_payout()
            .returning(|next, _| Ok(next.clone()));
        store
    }

    fn quiet_notifier() -> MockNotifier {
        let mut notifier = MockNotifier::new();
        notifier.expect_notify().return_const(());
        notifier
    }

    fn engine(store: MockPayoutStore, rail: MockPaymentRail, notifier: MockNotifier) -> PayoutEngine {
        PayoutEngine::new(
            Arc::new(store),
            Arc::new(rail),
            Arc::new(notifier),
            Money::from_minor(50_000),
        )
    }

    #[tokio::test]
    async fn test_below_minimum_never_reaches_store() {
        let mut store = MockPayoutStore::new();
        store.expect_create_payout().never();

        let result = engine(store, MockPaymentRail::new(), MockNotifier::new())
            .request_payout(
                PayoutDraft {
                    teacher_id: TeacherId::new(),
                    amount: Money::from_minor(5_000),
                    method: PayoutMethod::BankTransfer,
                    account_ref: "BCA-1234567".to_string(),
                },
                t0(),
            )
            .await;

        assert_eq!(
            result,
            Err(PayoutError::BelowMinimumPayout {
                amount: Money::from_minor(5_000),
                minimum: Money::from_minor(50_000),
            })
        );
    }

    #[tokio::test]
    async fn test_approve_submits_to_rail() {
        let mut rail = MockPaymentRail::new();
        rail.expect_submit()
            .withf(|p| p.status == PayoutStatus::Approved)
            .times(1)
            .returning(|_| Ok(()));

        let approved = engine(store_with(payout(PayoutStatus::Pending)), rail, quiet_notifier())
            .approve(PayoutRequestId::new(), t0())
            .await
            .unwrap();

        assert_eq!(approved.status, PayoutStatus::Approved);
        assert_eq!(approved.processed_at, Some(t0()));
    }

    #[tokio::test]
    async fn test_rail_error_fails_payout_with_reason() {
        let mut rail = MockPaymentRail::new();
        rail.expect_submit()
            .returning(|_| Err(RailError("account closed".to_string())));

        let failed = engine(store_with(payout(PayoutStatus::Pending)), rail, quiet_notifier())
            .approve(PayoutRequestId::new(), t0())
            .await
            .unwrap();

        assert_eq!(failed.status, PayoutStatus::Failed);
        assert_eq!(failed.failure_reason.as_deref(), Some("account closed"));
    }

    #[tokio::test]
    async fn test_blank_rail_error_gets_default_reason() {
        let mut rail = MockPaymentRail::new();
        rail.expect_submit()
            .returning(|_| Err(RailError(String::new())));

        let failed = engine(store_with(payout(PayoutStatus::Pending)), rail, quiet_notifier())
            .approve(PayoutRequestId::new(), t0())
            .await
            .unwrap();

        assert_eq!(failed.failure_reason.as_deref(), Some(RAIL_REJECTED));
    }

    #[tokio::test]
    async fn test_duplicate_paid_callback_is_noop() {
        let mut store = MockPayoutStore::new();
        let current = payout(PayoutStatus::Paid);
        let expected = current.clone();
        store
            .expect_find_payout()
            .returning(move |_| Ok(Some(current.clone())));
        store.expect_update_payout().never();
        let mut notifier = MockNotifier::new();
        notifier.expect_notify().never();

        let paid = engine(store, MockPaymentRail::new(), notifier)
            .on_paid(expected.id, t0())
            .await
            .unwrap();
        assert_eq!(paid, expected);
    }

    #[tokio::test]
    async fn test_paid_requires_approval() {
        let result = engine(
            store_with(payout(PayoutStatus::Pending)),
            MockPaymentRail::new(),
            MockNotifier::new(),
        )
        .on_paid(PayoutRequestId::new(), t0())
        .await;

        assert_eq!(
            result,
            Err(PayoutError::InvalidTransition {
                from: PayoutStatus::Pending,
                to: PayoutStatus::Paid,
            })
        );
    }

    #[tokio::test]
    async fn test_reject_notifies_teacher() {
        let current = payout(PayoutStatus::Pending);
        let teacher_id = current.teacher_id;
        let mut notifier = MockNotifier::new();
        notifier
            .expect_notify()
            .withf(move |n| {
                matches!(
                    n,
                    Notification::PayoutUpdated { teacher_id: t, status: PayoutStatus::Rejected, .. }
                        if *t == teacher_id
                )
            })
            .times(1)
            .return_const(());

        let rejected = engine(store_with(current), MockPaymentRail::new(), notifier)
            .reject(PayoutRequestId::new(), "  duplicate account  ", t0())
            .await
            .unwrap();

        assert_eq!(rejected.status, PayoutStatus::Rejected);
        assert_eq!(rejected.failure_reason.as_deref(), Some("duplicate account"));
    }

    #[tokio::test]
    async fn test_unknown_payout() {
        let mut store = MockPayoutStore::new();
        store.expect_find_payout().returning(|_| Ok(None));
        let id = PayoutRequestId::new();

        let result = engine(store, MockPaymentRail::new(), MockNotifier::new())
            .get(id)
            .await;
        assert_eq!(result, Err(PayoutError::NotFound(id)));
    }
}
