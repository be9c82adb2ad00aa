//! Lesson pricing.

use tutora_shared::types::Money;

use super::error::BookingError;
use super::types::BookingType;
use crate::catalog::SubjectOffering;

/// Computes lesson prices from an offering's hourly rates.
pub struct LessonPricing;

impl LessonPricing {
    /// Hourly rate charged for `booking_type`.
    #[must_use]
    pub fn hourly_rate(offering: &SubjectOffering, booking_type: BookingType) -> Money {
        match booking_type {
            BookingType::Trial => offering.trial_price.unwrap_or(offering.price_per_hour),
            BookingType::Single | BookingType::Package => offering.price_per_hour,
        }
    }

    /// Price of a lesson of `minutes`, rounded half away from zero.
    pub fn price(
        offering: &SubjectOffering,
        booking_type: BookingType,
        minutes: u32,
    ) -> Result<Money, BookingError> {
        Self::hourly_rate(offering, booking_type)
            .prorate_hourly(minutes)
            .ok_or_else(|| BookingError::Validation("lesson price is out of range".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use tutora_shared::types::{SubjectOfferingId, TeacherId};

    fn offering(trial_price: Option<i64>) -> SubjectOffering {
        SubjectOffering {
            id: SubjectOfferingId::new(),
            teacher_id: TeacherId::new(),
            subject: "Mathematics".to_string(),
            price_per_hour: Money::from_minor(50_000),
            trial_price: trial_price.map(Money::from_minor),
            active: true,
        }
    }

    #[rstest]
    #[case(BookingType::Single, 60, 50_000)]
    #[case(BookingType::Single, 30, 25_000)]
    #[case(BookingType::Package, 90, 75_000)]
    #[case(BookingType::Single, 45, 37_500)]
    #[case(BookingType::Trial, 60, 20_000)]
    #[case(BookingType::Trial, 30, 10_000)]
    fn test_price(#[case] booking_type: BookingType, #[case] minutes: u32, #[case] expected: i64) {
        let price = LessonPricing::price(&offering(Some(20_000)), booking_type, minutes).unwrap();
        assert_eq!(price, Money::from_minor(expected));
    }

    #[test]
    fn test_rounds_half_away_from_zero() {
        let mut odd = offering(None);
        // 25 min of 333 per hour = 138.75 -> 139
        odd.price_per_hour = Money::from_minor(333);
        assert_eq!(
            LessonPricing::price(&odd, BookingType::Single, 25).unwrap(),
            Money::from_minor(139)
        );
        // 30 min of 333 per hour = 166.5 -> 167
        assert_eq!(
            LessonPricing::price(&odd, BookingType::Single, 30).unwrap(),
            Money::from_minor(167)
        );
    }

    #[test]
    fn test_trial_without_trial_price_uses_regular_rate() {
        assert_eq!(
            LessonPricing::hourly_rate(&offering(None), BookingType::Trial),
            Money::from_minor(50_000)
        );
    }
}
