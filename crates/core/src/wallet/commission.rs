//! Commission rates per booking type.

use rust_decimal::Decimal;
use tutora_shared::config::CommissionConfig;
use tutora_shared::types::Money;

use super::error::WalletError;
use crate::booking::BookingType;

/// Platform commission rates, with optional per-type overrides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommissionSchedule {
    default_rate: Decimal,
    trial_rate: Option<Decimal>,
    single_rate: Option<Decimal>,
    package_rate: Option<Decimal>,
}

impl CommissionSchedule {
    /// One rate for every booking type.
    pub fn flat(rate: Decimal) -> Result<Self, WalletError> {
        Ok(Self {
            default_rate: check_rate(rate)?,
            trial_rate: None,
            single_rate: None,
            package_rate: None,
        })
    }

    /// Builds the schedule from configuration, validating every rate.
    pub fn from_config(config: &CommissionConfig) -> Result<Self, WalletError> {
        Ok(Self {
            default_rate: check_rate(config.default_rate)?,
            trial_rate: config.trial_rate.map(check_rate).transpose()?,
            single_rate: config.single_rate.map(check_rate).transpose()?,
            package_rate: config.package_rate.map(check_rate).transpose()?,
        })
    }

    /// Rate applied to bookings of `booking_type`.
    #[must_use]
    pub fn rate_for(&self, booking_type: BookingType) -> Decimal {
        let specific = match booking_type {
            BookingType::Trial => self.trial_rate,
            BookingType::Single => self.single_rate,
            BookingType::Package => self.package_rate,
        };
        specific.unwrap_or(self.default_rate)
    }

    /// Commission on `price`, rounded half away from zero.
    pub fn commission(&self, price: Money, booking_type: BookingType) -> Result<Money, WalletError> {
        price
            .scale(self.rate_for(booking_type))
            .ok_or_else(|| WalletError::Validation("commission is out of range".to_string()))
    }
}

fn check_rate(rate: Decimal) -> Result<Decimal, WalletError> {
    if rate < Decimal::ZERO || rate > Decimal::ONE {
        return Err(WalletError::InvalidCommissionRate(rate));
    }
    Ok(rate)
}
