//! Engines orchestrate the pure domain services over the repository traits.
//!
//! Handlers and jobs call engines; engines call stores, the notifier and the
//! payment rail. Nothing here knows about HTTP or SQL.

pub mod availability;
pub mod booking;
pub mod payout;
pub mod settlement;
pub mod wallet;

use std::sync::Arc;

use chrono::Duration;
use tutora_shared::config::AppConfig;
use tutora_shared::types::Money;

pub use availability::AvailabilityEngine;
pub use booking::{BookingEngine, CreateBooking, SettledBookings};
pub use payout::{PayoutDetails, PayoutEngine};
pub use settlement::{SettlementJob, SettlementReport};
pub use wallet::{SweepReport, WalletEngine};

use crate::notify::Notifier;
use crate::rail::PaymentRail;
use crate::repository::{AvailabilityStore, BookingStore, CatalogStore, PayoutStore, WalletStore};
use crate::scheduling::{SlotGenerator, SlotPolicy};
use crate::wallet::{CommissionSchedule, WalletError};

/// Storage backends, one handle per repository trait.
#[derive(Clone)]
pub struct Stores {
    /// Teacher profiles and offerings.
    pub catalog: Arc<dyn CatalogStore>,
    /// Availability rules.
    pub availability: Arc<dyn AvailabilityStore>,
    /// Bookings.
    pub bookings: Arc<dyn BookingStore>,
    /// Wallet entries.
    pub wallet: Arc<dyn WalletStore>,
    /// Payout requests and allocations.
    pub payouts: Arc<dyn PayoutStore>,
}

impl Stores {
    /// Uses one backend for every trait.
    pub fn shared<S>(store: Arc<S>) -> Self
    where
        S: CatalogStore + AvailabilityStore + BookingStore + WalletStore + PayoutStore + 'static,
    {
        Self {
            catalog: store.clone(),
            availability: store.clone(),
            bookings: store.clone(),
            wallet: store.clone(),
            payouts: store,
        }
    }
}

/// All engines, wired from one configuration.
#[derive(Clone)]
pub struct Engines {
    /// Availability rule management.
    pub availability: Arc<AvailabilityEngine>,
    /// Slots and bookings.
    pub bookings: Arc<BookingEngine>,
    /// Earnings and balances.
    pub wallet: Arc<WalletEngine>,
    /// Payout requests.
    pub payouts: Arc<PayoutEngine>,
    /// Periodic settlement.
    pub settlement: Arc<SettlementJob>,
}

impl Engines {
    /// Wires the engines. Fails if a configured commission rate is outside
    /// `[0, 1]`.
    pub fn new(
        stores: Stores,
        notifier: Arc<dyn Notifier>,
        rail: Arc<dyn PaymentRail>,
        config: &AppConfig,
    ) -> Result<Self, WalletError> {
        let commission = CommissionSchedule::from_config(&config.wallet.commission)?;
        let hold_period = Duration::hours(i64::from(config.wallet.hold_period_hours));

        let availability = Arc::new(AvailabilityEngine::new(
            stores.availability.clone(),
            stores.catalog.clone(),
        ));
        let bookings = Arc::new(BookingEngine::new(
            stores.catalog,
            stores.availability,
            stores.bookings.clone(),
            notifier.clone(),
            SlotGenerator::new(SlotPolicy::from(&config.scheduling)),
        ));
        let wallet = Arc::new(WalletEngine::new(
            stores.wallet,
            stores.bookings,
            notifier.clone(),
            commission,
            hold_period,
        ));
        let payouts = Arc::new(PayoutEngine::new(
            stores.payouts,
            rail,
            notifier,
            Money::from_minor(config.payout.min_amount),
        ));
        let settlement = Arc::new(SettlementJob::new(bookings.clone(), wallet.clone()));

        Ok(Self {
            availability,
            bookings,
            wallet,
            payouts,
            settlement,
        })
    }
}
