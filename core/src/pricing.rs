//! Stay pricing: nightly rate × number of nights.

use crate::availability::StayDates;
use crate::error::DomainError;
use crate::types::{Money, Property};

/// Total price of `stay` at `property`'s nightly rate.
///
/// Exact integer-cent arithmetic; no rounding or currency conversion.
///
/// # Errors
///
/// Returns [`DomainError::PriceOverflow`] if the total does not fit in [`Money`].
pub fn calculate_total_price(property: &Property, stay: &StayDates) -> Result<Money, DomainError> {
    price_stay(property.price, stay)
}

/// Total price of `stay` at `nightly` per night.
///
/// # Errors
///
/// Returns [`DomainError::PriceOverflow`] if the total does not fit in [`Money`].
pub fn price_stay(nightly: Money, stay: &StayDates) -> Result<Money, DomainError> {
    nightly
        .checked_mul(u64::from(stay.nights()))
        .ok_or(DomainError::PriceOverflow)
}
