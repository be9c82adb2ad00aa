//! `SeaORM` entity definitions.

pub mod availability_rules;
pub mod bookings;
pub mod payout_allocations;
pub mod payout_requests;
pub mod sea_orm_active_enums;
pub mod subject_offerings;
pub mod teacher_profiles;
pub mod wallet_entries;
