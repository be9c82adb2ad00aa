//! Booking orchestration: slot lookup, reservation and status changes.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tutora_shared::types::{
    BookingId, PageRequest, PageResponse, StudentId, SubjectOfferingId, TeacherId,
};

use crate::booking::{
    Booking, BookingError, BookingService, BookingStatus, BookingTransition, BookingType,
    ConflictResolver, LessonPricing, Party,
};
use crate::catalog::{SubjectOffering, TeacherProfile};
use crate::notify::{Notification, Notifier};
use crate::repository::{AvailabilityStore, BookingStore, CatalogStore};
use crate::scheduling::{Interval, SchedulingError, SlotGenerator, SlotQuery, SlotSchedule};

/// Bookings settled per settlement run.
const SETTLEMENT_BATCH: u64 = 500;

/// Input for a new booking.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreateBooking {
    /// Teacher to book.
    pub teacher_id: TeacherId,
    /// Booking student.
    pub student_id: StudentId,
    /// Offering the lesson is for.
    pub subject_offering_id: SubjectOfferingId,
    /// Lesson start.
    pub start_at: DateTime<Utc>,
    /// Lesson end.
    pub end_at: DateTime<Utc>,
    /// Kind of lesson.
    pub booking_type: BookingType,
}

/// Result of one settlement pass over due bookings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettledBookings {
    /// Bookings moved to `Completed` in this pass.
    pub completed: Vec<Booking>,
    /// Number of pending bookings cancelled because their start passed.
    pub expired: usize,
    /// Number of bookings another writer changed first.
    pub skipped: usize,
}

/// Coordinates catalog, availability and booking stores.
#[derive(Clone)]
pub struct BookingEngine {
    catalog: Arc<dyn CatalogStore>,
    availability: Arc<dyn AvailabilityStore>,
    bookings: Arc<dyn BookingStore>,
    notifier: Arc<dyn Notifier>,
    generator: SlotGenerator,
}

impl BookingEngine {
    /// Creates the engine.
    pub fn new(
        catalog: Arc<dyn CatalogStore>,
        availability: Arc<dyn AvailabilityStore>,
        bookings: Arc<dyn BookingStore>,
        notifier: Arc<dyn Notifier>,
        generator: SlotGenerator,
    ) -> Self {
        Self {
            catalog,
            availability,
            bookings,
            notifier,
            generator,
        }
    }

    /// Bookable slots for `query`, priced from `subject_offering_id`.
    pub async fn available_slots(
        &self,
        query: &SlotQuery,
        subject_offering_id: SubjectOfferingId,
        booking_type: BookingType,
        now: DateTime<Utc>,
    ) -> Result<SlotSchedule, BookingError> {
        let profile = self.profile(query.teacher_id).await?;
        let offering = self.offering(subject_offering_id, query.teacher_id).await?;

        let window = self
            .generator
            .validate_query(query, &profile.allowed_durations)?;
        let rules = self.availability.rules_for_teacher(query.teacher_id).await?;
        let active = self.bookings.active_bookings(query.teacher_id, window).await?;
        let price = LessonPricing::price(&offering, booking_type, query.duration_minutes)?;

        let schedule = self.generator.generate(
            query,
            &rules,
            &ConflictResolver::busy_intervals(&active),
            &profile.allowed_durations,
            price,
            now,
        )?;

        tracing::debug!(
            teacher_id = %query.teacher_id,
            free_intervals = schedule.free_intervals().len(),
            "Slots generated"
        );
        Ok(schedule)
    }

    /// Books a lesson after re-validating it against the current calendar.
    pub async fn create_booking(
        &self,
        request: CreateBooking,
        now: DateTime<Utc>,
    ) -> Result<Booking, BookingError> {
        let interval = Interval::new(request.start_at, request.end_at)
            .ok_or(BookingError::Scheduling(SchedulingError::EmptyInterval))?;

        let profile = self.profile(request.teacher_id).await?;
        let offering = self
            .offering(request.subject_offering_id, request.teacher_id)
            .await?;

        let rules = self
            .availability
            .rules_for_teacher(request.teacher_id)
            .await?;
        self.generator
            .check_candidate(&rules, &interval, &profile.allowed_durations, now)?;

        let minutes = u32::try_from(interval.duration().num_minutes())
            .map_err(|_| BookingError::Validation("lesson is too long".to_string()))?;
        let price = LessonPricing::price(&offering, request.booking_type, minutes)?;

        let booking = Booking {
            id: BookingId::new(),
            teacher_id: request.teacher_id,
            student_id: request.student_id,
            subject_offering_id: request.subject_offering_id,
            start_at: request.start_at,
            end_at: request.end_at,
            status: BookingService::initial_status(profile.instant_confirmation),
            booking_type: request.booking_type,
            price,
            cancellation_reason: None,
            cancelled_by: None,
            created_at: now,
            updated_at: now,
            completed_at: None,
        };

        let booking = self.bookings.reserve(booking).await?;

        tracing::info!(
            booking_id = %booking.id,
            teacher_id = %booking.teacher_id,
            status = %booking.status,
            price = %booking.price,
            "Booking created"
        );

        self.notifier.notify(match booking.status {
            BookingStatus::Confirmed => Notification::BookingConfirmed {
                booking_id: booking.id,
                teacher_id: booking.teacher_id,
                student_id: booking.student_id,
            },
            _ => Notification::BookingRequested {
                booking_id: booking.id,
                teacher_id: booking.teacher_id,
                student_id: booking.student_id,
            },
        });

        Ok(booking)
    }

    /// A booking by id.
    pub async fn get_booking(&self, id: BookingId) -> Result<Booking, BookingError> {
        self.bookings
            .find_booking(id)
            .await?
            .ok_or(BookingError::NotFound(id))
    }

    /// Confirms a pending booking.
    pub async fn confirm_booking(
        &self,
        id: BookingId,
        now: DateTime<Utc>,
    ) -> Result<Booking, BookingError> {
        let current = self.get_booking(id).await?;
        let transition = BookingService::confirm(current.status, now)?;
        let booking = self.apply(&current, &transition).await?;

        self.notifier.notify(Notification::BookingConfirmed {
            booking_id: booking.id,
            teacher_id: booking.teacher_id,
            student_id: booking.student_id,
        });
        Ok(booking)
    }

    /// Cancels a pending or confirmed booking.
    pub async fn cancel_booking(
        &self,
        id: BookingId,
        reason: &str,
        cancelled_by: Party,
        now: DateTime<Utc>,
    ) -> Result<Booking, BookingError> {
        let current = self.get_booking(id).await?;
        let transition = BookingService::cancel(current.status, reason, cancelled_by, now)?;
        let booking = self.apply(&current, &transition).await?;

        self.notifier.notify(Notification::BookingCancelled {
            booking_id: booking.id,
            teacher_id: booking.teacher_id,
            student_id: booking.student_id,
            cancelled_by,
        });
        Ok(booking)
    }

    /// A page of a teacher's bookings.
    pub async fn list_bookings(
        &self,
        teacher_id: TeacherId,
        page: PageRequest,
    ) -> Result<PageResponse<Booking>, BookingError> {
        let page = page.normalized();
        let (bookings, total) = self.bookings.bookings_for_teacher(teacher_id, page).await?;
        Ok(PageResponse::new(bookings, page, total))
    }

    /// Completes ended lessons and expires unconfirmed ones.
    ///
    /// Bookings changed concurrently are skipped and picked up next time if
    /// still due.
    pub async fn settle_due(&self, now: DateTime<Utc>) -> Result<SettledBookings, BookingError> {
        let due = self.bookings.due_for_settlement(now, SETTLEMENT_BATCH).await?;
        let mut settled = SettledBookings::default();

        for booking in due {
            let Some(transition) = BookingService::settle(&booking, now) else {
                continue;
            };

            match self.apply(&booking, &transition).await {
                Ok(updated) if updated.status == BookingStatus::Completed => {
                    settled.completed.push(updated);
                }
                Ok(updated) => {
                    settled.expired += 1;
                    self.notifier.notify(Notification::BookingCancelled {
                        booking_id: updated.id,
                        teacher_id: updated.teacher_id,
                        student_id: updated.student_id,
                        cancelled_by: Party::System,
                    });
                }
                Err(err @ (BookingError::InvalidTransition { .. } | BookingError::ConcurrentModification)) => {
                    tracing::debug!(booking_id = %booking.id, error = %err, "Booking changed during settlement");
                    settled.skipped += 1;
                }
                Err(err) => return Err(err),
            }
        }

        Ok(settled)
    }

    async fn apply(
        &self,
        current: &Booking,
        transition: &BookingTransition,
    ) -> Result<Booking, BookingError> {
        let next = transition.apply(current);
        let stored = self.bookings.update_booking(&next, current.status).await?;
        tracing::info!(
            booking_id = %stored.id,
            from = %current.status,
            to = %stored.status,
            "Booking status changed"
        );
        Ok(stored)
    }

    async fn profile(&self, teacher_id: TeacherId) -> Result<TeacherProfile, BookingError> {
        self.catalog
            .teacher_profile(teacher_id)
            .await?
            .ok_or(BookingError::TeacherNotFound(teacher_id))
    }

    async fn offering(
        &self,
        id: SubjectOfferingId,
        teacher_id: TeacherId,
    ) -> Result<SubjectOffering, BookingError> {
        let offering = self
            .catalog
            .subject_offering(id)
            .await?
            .ok_or(BookingError::OfferingNotFound(id))?;
        if offering.teacher_id != teacher_id || !offering.active {
            return Err(BookingError::OfferingUnavailable(id));
        }
        Ok(offering)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::availability::{AvailabilityRule, RecurringRule, TimeWindow};
    use crate::notify::MockNotifier;
    use crate::repository::{MockAvailabilityStore, MockBookingStore, MockCatalogStore};
    use crate::scheduling::SlotPolicy;
    use chrono::{Duration, NaiveDate, NaiveTime, TimeZone, Weekday};
    use chrono_tz::Asia::Jakarta;
    use tutora_shared::types::{AvailabilityRuleId, Money};

    fn utc(d: u32, hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, d, hour, minute, 0).unwrap()
    }

    struct Fixture {
        teacher_id: TeacherId,
        offering_id: SubjectOfferingId,
        catalog: MockCatalogStore,
        availability: MockAvailabilityStore,
        bookings: MockBookingStore,
        notifier: MockNotifier,
    }

    impl Fixture {
        /// Teacher available Mondays 09:00-12:00 Jakarta (02:00-05:00 UTC).
        fn new(instant_confirmation: bool) -> Self {
            let teacher_id = TeacherId::new();
            let offering_id = SubjectOfferingId::new();

            let mut catalog = MockCatalogStore::new();
            catalog.expect_teacher_profile().returning(move |id| {
                Ok(Some(TeacherProfile {
                    teacher_id: id,
                    timezone: Jakarta,
                    allowed_durations: vec![30, 60],
                    instant_confirmation,
                }))
            });
            catalog.expect_subject_offering().returning(move |id| {
                Ok(Some(SubjectOffering {
                    id,
                    teacher_id,
                    subject: "Physics".to_string(),
                    price_per_hour: Money::from_minor(50_000),
                    trial_price: Some(Money::from_minor(20_000)),
                    active: true,
                }))
            });

            let mut availability = MockAvailabilityStore::new();
            availability.expect_rules_for_teacher().returning(move |_| {
                Ok(vec![AvailabilityRule::Recurring(RecurringRule {
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
                })])
            });

            Self {
                teacher_id,
                offering_id,
                catalog,
                availability,
                bookings: MockBookingStore::new(),
                notifier: MockNotifier::new(),
            }
        }

        fn request(&self, start: DateTime<Utc>, minutes: i64) -> CreateBooking {
            CreateBooking {
                teacher_id: self.teacher_id,
                student_id: StudentId::new(),
                subject_offering_id: self.offering_id,
                start_at: start,
                end_at: start + Duration::minutes(minutes),
                booking_type: BookingType::Single,
            }
        }

        fn engine(self) -> BookingEngine {
            BookingEngine::new(
                Arc::new(self.catalog),
                Arc::new(self.availability),
                Arc::new(self.bookings),
                Arc::new(self.notifier),
                SlotGenerator::new(SlotPolicy::default()),
            )
        }
    }

    #[tokio::test]
    async fn test_create_booking_snapshots_price() {
        let mut fixture = Fixture::new(false);
        fixture.bookings.expect_reserve().times(1).returning(Ok);
        fixture
            .notifier
            .expect_notify()
            .withf(|n| matches!(n, Notification::BookingRequested { .. }))
            .times(1)
            .return_const(());

        let request = fixture.request(utc(2, 3, 0), 60);
        let booking = fixture
            .engine()
            .create_booking(request, utc(1, 0, 0))
            .await
            .unwrap();

        assert_eq!(booking.status, BookingStatus::Pending);
        assert_eq!(booking.price, Money::from_minor(50_000));
        assert_eq!(booking.created_at, utc(1, 0, 0));
    }

    #[tokio::test]
    async fn test_instant_confirmation() {
        let mut fixture = Fixture::new(true);
        fixture.bookings.expect_reserve().returning(Ok);
        fixture
            .notifier
            .expect_notify()
            .withf(|n| matches!(n, Notification::BookingConfirmed { .. }))
            .times(1)
            .return_const(());

        let request = fixture.request(utc(2, 2, 0), 30);
        let booking = fixture
            .engine()
            .create_booking(request, utc(1, 0, 0))
            .await
            .unwrap();

        assert_eq!(booking.status, BookingStatus::Confirmed);
        assert_eq!(booking.price, Money::from_minor(25_000));
    }

    #[tokio::test]
    async fn test_outside_availability_never_reaches_store() {
        let mut fixture = Fixture::new(false);
        fixture.bookings.expect_reserve().never();
        fixture.notifier.expect_notify().never();

        let request = fixture.request(utc(2, 4, 30), 60);
        let result = fixture.engine().create_booking(request, utc(1, 0, 0)).await;

        assert_eq!(
            result,
            Err(BookingError::Scheduling(SchedulingError::OutsideAvailability))
        );
    }

    #[tokio::test]
    async fn test_slot_taken_is_not_retried() {
        let mut fixture = Fixture::new(false);
        fixture.bookings.expect_reserve().times(1).returning(|booking| {
            Err(BookingError::SlotTaken {
                teacher_id: booking.teacher_id,
                start_at: booking.start_at,
                end_at: booking.end_at,
            })
        });
        fixture.notifier.expect_notify().never();

        let request = fixture.request(utc(2, 3, 0), 60);
        let err = fixture
            .engine()
            .create_booking(request, utc(1, 0, 0))
            .await
            .unwrap_err();

        assert_eq!(err.error_code(), "SLOT_TAKEN");
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn test_offering_of_other_teacher_rejected() {
        let mut fixture = Fixture::new(false);
        fixture.catalog.checkpoint();
        fixture.catalog.expect_teacher_profile().returning(|id| {
            Ok(Some(TeacherProfile {
                teacher_id: id,
                timezone: Jakarta,
                allowed_durations: vec![60],
                instant_confirmation: false,
            }))
        });
        fixture.catalog.expect_subject_offering().returning(|id| {
            Ok(Some(SubjectOffering {
                id,
                teacher_id: TeacherId::new(),
                subject: "Chemistry".to_string(),
                price_per_hour: Money::from_minor(40_000),
                trial_price: None,
                active: true,
            }))
        });
        fixture.bookings.expect_reserve().never();

        let request = fixture.request(utc(2, 3, 0), 60);
        let offering_id = request.subject_offering_id;
        let result = fixture.engine().create_booking(request, utc(1, 0, 0)).await;

        assert_eq!(result, Err(BookingError::OfferingUnavailable(offering_id)));
    }

    #[tokio::test]
    async fn test_available_slots_skip_active_bookings() {
        let mut fixture = Fixture::new(false);
        let teacher_id = fixture.teacher_id;
        fixture.bookings.expect_active_bookings().returning(move |_, _| {
            Ok(vec![Booking {
                id: BookingId::new(),
                teacher_id,
                student_id: StudentId::new(),
                subject_offering_id: SubjectOfferingId::new(),
                start_at: utc(2, 3, 0),
                end_at: utc(2, 4, 0),
                status: BookingStatus::Confirmed,
                booking_type: BookingType::Single,
                price: Money::from_minor(50_000),
                cancellation_reason: None,
                cancelled_by: None,
                created_at: utc(1, 0, 0),
                updated_at: utc(1, 0, 0),
                completed_at: None,
            }])
        });

        let query = SlotQuery {
            teacher_id,
            from: NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
            to: NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
            duration_minutes: 60,
            timezone: Jakarta,
        };
        let offering_id = fixture.offering_id;
        let schedule = fixture
            .engine()
            .available_slots(&query, offering_id, BookingType::Trial, utc(1, 0, 0))
            .await
            .unwrap();

        let slots: Vec<_> = schedule.iter().collect();
        assert_eq!(slots.len(), 2);
        assert_eq!(slots[0].start_at, utc(2, 2, 0));
        assert_eq!(slots[1].start_at, utc(2, 4, 0));
        assert!(slots.iter().all(|slot| slot.price == Money::from_minor(20_000)));
    }

    #[tokio::test]
    async fn test_settle_due_completes_and_expires() {
        let mut fixture = Fixture::new(false);
        let teacher_id = fixture.teacher_id;
        let lesson = |status: BookingStatus, start: DateTime<Utc>| Booking {
            id: BookingId::new(),
            teacher_id,
            student_id: StudentId::new(),
            subject_offering_id: SubjectOfferingId::new(),
            start_at: start,
            end_at: start + Duration::hours(1),
            status,
            booking_type: BookingType::Single,
            price: Money::from_minor(50_000),
            cancellation_reason: None,
            cancelled_by: None,
            created_at: utc(1, 0, 0),
            updated_at: utc(1, 0, 0),
            completed_at: None,
        };
        let due = vec![
            lesson(BookingStatus::Confirmed, utc(2, 2, 0)),
            lesson(BookingStatus::Pending, utc(2, 4, 0)),
        ];
        fixture
            .bookings
            .expect_due_for_settlement()
            .returning(move |_, _| Ok(due.clone()));
        fixture
            .bookings
            .expect_update_booking()
            .times(2)
            .returning(|booking, _| Ok(booking.clone()));
        fixture
            .notifier
            .expect_notify()
            .withf(|n| matches!(n, Notification::BookingCancelled { cancelled_by: Party::System, .. }))
            .times(1)
            .return_const(());

        let settled = fixture.engine().settle_due(utc(2, 4, 30)).await.unwrap();

        assert_eq!(settled.completed.len(), 1);
        assert_eq!(settled.completed[0].completed_at, Some(utc(2, 4, 30)));
        assert_eq!(settled.expired, 1);
        assert_eq!(settled.skipped, 0);
    }
}
