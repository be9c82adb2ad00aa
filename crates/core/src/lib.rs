//! Core business logic for Tutora.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! Storage, notification delivery and the payment rail are reached through
//! traits so every rule here can be tested in isolation.
//!
//! # Modules
//!
//! - `scheduling` - Intervals and bookable slot generation
//! - `availability` - Recurring and exception rules and their expansion
//! - `catalog` - Read-only teacher profiles and subject offerings
//! - `booking` - Booking state machine, pricing and conflict checks
//! - `wallet` - Commission, earnings, reversals and balances
//! - `payout` - Payout state machine and FIFO allocation
//! - `repository` - Storage traits
//! - `engine` - Orchestration over the storage traits

pub mod availability;
pub mod booking;
pub mod catalog;
pub mod engine;
pub mod notify;
pub mod payout;
pub mod rail;
pub mod repository;
pub mod scheduling;
pub mod wallet;
