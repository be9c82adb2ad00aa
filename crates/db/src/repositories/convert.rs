//! Conversions between `SeaORM` models and core domain types.

use chrono::{DateTime, FixedOffset, Utc};
use chrono_tz::Tz;
use sea_orm::DbErr;
use tutora_core::availability::AvailabilityRule;
use tutora_core::booking::{Booking, BookingStatus, BookingType, Party};
use tutora_core::catalog::{SubjectOffering, TeacherProfile};
use tutora_core::payout::{PayoutAllocation, PayoutMethod, PayoutRequest, PayoutStatus};
use tutora_core::repository::StoreError;
use tutora_core::wallet::{WalletEntry, WalletEntryKind, WalletEntryStatus};
use tutora_shared::types::Money;

use crate::entities::{
    availability_rules, bookings, payout_allocations, payout_requests, sea_orm_active_enums as db,
    subject_offerings, teacher_profiles, wallet_entries,
};

/// Maps a driver error into the store error every trait understands.
pub(crate) fn db_err(err: DbErr) -> StoreError {
    StoreError::Database(err.to_string())
}

pub(crate) fn utc(at: DateTimeWithTz) -> DateTime<Utc> {
    at.with_timezone(&Utc)
}

pub(crate) fn stamp(at: DateTime<Utc>) -> DateTimeWithTz {
    at.into()
}

type DateTimeWithTz = DateTime<FixedOffset>;

macro_rules! enum_mapping {
    ($db:ident => $core:ident { $($variant:ident),+ $(,)? }) => {
        impl From<db::$db> for $core {
            fn from(value: db::$db) -> Self {
                match value {
                    $(db::$db::$variant => Self::$variant,)+
                }
            }
        }

        impl From<$core> for db::$db {
            fn from(value: $core) -> Self {
                match value {
                    $($core::$variant => Self::$variant,)+
                }
            }
        }
    };
}

enum_mapping!(BookingStatus => BookingStatus { Pending, Confirmed, Completed, Cancelled });
enum_mapping!(BookingType => BookingType { Trial, Single, Package });
enum_mapping!(BookingParty => Party { Student, Teacher, System });
enum_mapping!(WalletEntryKind => WalletEntryKind { Earning, Reversal });
enum_mapping!(WalletEntryStatus => WalletEntryStatus { Pending, Available, Paid });
enum_mapping!(PayoutStatus => PayoutStatus { Pending, Approved, Paid, Rejected, Failed });
enum_mapping!(PayoutMethod => PayoutMethod { BankTransfer, EWallet });

pub(crate) fn teacher_profile(model: teacher_profiles::Model) -> Result<TeacherProfile, StoreError> {
    let timezone: Tz = model.timezone.parse().map_err(|_| {
        StoreError::Database(format!(
            "teacher {} has unknown timezone {}",
            model.teacher_id, model.timezone
        ))
    })?;
    let allowed_durations: Vec<u32> = serde_json::from_value(model.allowed_durations)
        .map_err(|err| StoreError::Database(format!("invalid allowed_durations: {err}")))?;

    Ok(TeacherProfile {
        teacher_id: model.teacher_id.into(),
        timezone,
        allowed_durations,
        instant_confirmation: model.instant_confirmation,
    })
}

pub(crate) fn subject_offering(model: subject_offerings::Model) -> SubjectOffering {
    SubjectOffering {
        id: model.id.into(),
        teacher_id: model.teacher_id.into(),
        subject: model.subject,
        price_per_hour: Money::from_minor(model.price_per_hour),
        trial_price: model.trial_price.map(Money::from_minor),
        active: model.active,
    }
}

pub(crate) fn availability_rule(
    model: availability_rules::Model,
) -> Result<AvailabilityRule, StoreError> {
    serde_json::from_value(model.definition).map_err(|err| {
        StoreError::Database(format!("availability rule {} is corrupt: {err}", model.id))
    })
}

pub(crate) fn rule_definition(rule: &AvailabilityRule) -> Result<serde_json::Value, StoreError> {
    serde_json::to_value(rule)
        .map_err(|err| StoreError::Database(format!("cannot encode availability rule: {err}")))
}

pub(crate) fn rule_type(rule: &AvailabilityRule) -> db::AvailabilityRuleType {
    match rule {
        AvailabilityRule::Recurring(_) => db::AvailabilityRuleType::Recurring,
        AvailabilityRule::Exception(_) => db::AvailabilityRuleType::Exception,
    }
}

pub(crate) fn booking(model: bookings::Model) -> Booking {
    Booking {
        id: model.id.into(),
        teacher_id: model.teacher_id.into(),
        student_id: model.student_id.into(),
        subject_offering_id: model.subject_offering_id.into(),
        start_at: utc(model.start_at),
        end_at: utc(model.end_at),
        status: model.status.into(),
        booking_type: model.booking_type.into(),
        price: Money::from_minor(model.price),
        cancellation_reason: model.cancellation_reason,
        cancelled_by: model.cancelled_by.map(Into::into),
        created_at: utc(model.created_at),
        updated_at: utc(model.updated_at),
        completed_at: model.completed_at.map(utc),
    }
}

pub(crate) fn wallet_entry(model: wallet_entries::Model) -> WalletEntry {
    WalletEntry {
        id: model.id.into(),
        teacher_id: model.teacher_id.into(),
        booking_id: model.booking_id.into(),
        kind: model.kind.into(),
        amount: Money::from_minor(model.amount),
        commission: Money::from_minor(model.commission),
        status: model.status.into(),
        available_at: utc(model.available_at),
        created_at: utc(model.created_at),
        reverses: model.reverses.map(Into::into),
    }
}

pub(crate) fn payout_request(model: payout_requests::Model) -> PayoutRequest {
    PayoutRequest {
        id: model.id.into(),
        teacher_id: model.teacher_id.into(),
        amount: Money::from_minor(model.amount),
        method: model.method.into(),
        status: model.status.into(),
        account_ref: model.account_ref,
        requested_at: utc(model.requested_at),
        processed_at: model.processed_at.map(utc),
        failure_reason: model.failure_reason,
    }
}

pub(crate) fn payout_allocation(model: payout_allocations::Model) -> PayoutAllocation {
    PayoutAllocation {
        payout_request_id: model.payout_request_id.into(),
        wallet_entry_id: model.wallet_entry_id.into(),
        amount: Money::from_minor(model.amount),
    }
}
