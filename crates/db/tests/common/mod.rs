//! Shared fixtures for store integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveTime, TimeZone, Utc, Weekday};
use chrono_tz::Asia::Jakarta;
use tutora_core::availability::{AvailabilityRule, RecurringRule, TimeWindow};
use tutora_core::booking::{Booking, BookingType};
use tutora_core::catalog::{SubjectOffering, TeacherProfile};
use tutora_core::engine::{CreateBooking, Engines, Stores};
use tutora_core::notify::TracingNotifier;
use tutora_core::payout::PayoutRequest;
use tutora_core::rail::{LoggingRail, PaymentRail, RailError};
use tutora_core::repository::AvailabilityStore;
use tutora_db::MemoryStore;
use tutora_shared::config::{
    AppConfig, AuthConfig, DatabaseConfig, JobsConfig, PayoutConfig, SchedulingConfig,
    ServerConfig, StorageConfig, WalletConfig, WebhookConfig,
};
use tutora_shared::types::{AvailabilityRuleId, Money, StudentId, SubjectOfferingId, TeacherId};

/// Sunday 2026-03-01 00:00 UTC.
pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap()
}

/// Monday 2026-03-02 at `hour` Jakarta time, in UTC.
pub fn monday_jakarta(hour: u32, minute: u32) -> DateTime<Utc> {
    Jakarta
        .with_ymd_and_hms(2026, 3, 2, hour, minute, 0)
        .unwrap()
        .with_timezone(&Utc)
}

pub fn test_config() -> AppConfig {
    AppConfig {
        server: ServerConfig::default(),
        database: DatabaseConfig::default(),
        storage: StorageConfig::default(),
        auth: AuthConfig {
            jwt_secret: "test-secret".to_string(),
        },
        scheduling: SchedulingConfig::default(),
        wallet: WalletConfig::default(),
        payout: PayoutConfig::default(),
        webhook: WebhookConfig {
            secret: "hook-secret".to_string(),
        },
        jobs: JobsConfig::default(),
    }
}

/// Rail that rejects every submission.
pub struct RejectingRail;

#[async_trait]
impl PaymentRail for RejectingRail {
    async fn submit(&self, _payout: &PayoutRequest) -> Result<(), RailError> {
        Err(RailError("account closed".to_string()))
    }
}

/// A memory store with one teacher available Mondays 09:00-12:00 Jakarta.
pub struct Marketplace {
    pub store: Arc<MemoryStore>,
    pub engines: Engines,
    pub teacher_id: TeacherId,
    pub offering_id: SubjectOfferingId,
}

impl Marketplace {
    pub async fn new() -> Self {
        Self::with_rail(Arc::new(LoggingRail)).await
    }

    pub async fn with_rail(rail: Arc<dyn PaymentRail>) -> Self {
        let store = Arc::new(MemoryStore::new());
        let teacher_id = TeacherId::new();
        let offering_id = SubjectOfferingId::new();

        store.upsert_teacher(TeacherProfile {
            teacher_id,
            timezone: Jakarta,
            allowed_durations: vec![30, 60],
            instant_confirmation: false,
        });
        store.upsert_offering(SubjectOffering {
            id: offering_id,
            teacher_id,
            subject: "Mathematics".to_string(),
            price_per_hour: Money::from_minor(50_000),
            trial_price: None,
            active: true,
        });
        store
            .save_rule(&AvailabilityRule::Recurring(RecurringRule {
                id: AvailabilityRuleId::new(),
                teacher_id,
                weekday: Weekday::Mon,
                window: TimeWindow::new(
                    NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
                    NaiveTime::from_hms_opt(12, 0, 0).unwrap(),
                )
                .unwrap(),
                timezone: Jakarta,
                valid_from: None,
                valid_until: None,
            }))
            .await
            .unwrap();

        let engines = Engines::new(
            Stores::shared(store.clone()),
            Arc::new(TracingNotifier),
            rail,
            &test_config(),
        )
        .unwrap();

        Self {
            store,
            engines,
            teacher_id,
            offering_id,
        }
    }

    pub fn request(&self, start_at: DateTime<Utc>, minutes: i64) -> CreateBooking {
        CreateBooking {
            teacher_id: self.teacher_id,
            student_id: StudentId::new(),
            subject_offering_id: self.offering_id,
            start_at,
            end_at: start_at + Duration::minutes(minutes),
            booking_type: BookingType::Single,
        }
    }

    /// Books, confirms and settles a lesson; returns the completed booking.
    pub async fn complete_lesson(&self, start_at: DateTime<Utc>, minutes: i64) -> Booking {
        let booking = self
            .engines
            .bookings
            .create_booking(self.request(start_at, minutes), t0())
            .await
            .unwrap();
        self.engines
            .bookings
            .confirm_booking(booking.id, t0())
            .await
            .unwrap();

        let settled_at = booking.end_at;
        self.engines.settlement.run(settled_at).await;

        self.engines.bookings.get_booking(booking.id).await.unwrap()
    }
}
