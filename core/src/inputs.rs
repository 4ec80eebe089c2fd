//! Typed, validated inputs for every write operation.
//!
//! Single-field constraints are declared with `validator` derives; the
//! cross-field and clock-dependent rules (check-out after check-in, check-in
//! not in the past, positive price) are added as field-level errors by the
//! `validate_*` methods so clients always get one `{field: [messages]}` map.

use crate::availability::StayDates;
use crate::types::{Money, PropertyId, PropertyStatus, ReservationStatus};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use validator::{Validate, ValidationError, ValidationErrors};

/// Build a field error with a human-readable message.
fn field_error(code: &'static str, message: &'static str) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(Cow::Borrowed(message));
    error
}

/// Run derive validation and return the (possibly empty) error set.
fn derived_errors<T: Validate>(input: &T) -> ValidationErrors {
    input.validate().err().unwrap_or_default()
}

fn finish(errors: ValidationErrors) -> Result<(), ValidationErrors> {
    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

/// Check-in not before `today`, check-out strictly after check-in.
fn validate_stay(
    errors: &mut ValidationErrors,
    check_in: NaiveDate,
    check_out: NaiveDate,
    today: NaiveDate,
) -> Option<StayDates> {
    if check_in < today {
        errors.add(
            "check_in_date",
            field_error("after_or_equal_today", "The check in date must be today or later"),
        );
    }
    let stay = StayDates::new(check_in, check_out);
    if stay.is_none() {
        errors.add(
            "check_out_date",
            field_error("after_check_in", "The check out date must be after the check in date"),
        );
    }
    stay
}

// ============================================================================
// Reservations
// ============================================================================

/// Body of `POST /reservations`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct CreateReservationInput {
    /// Property to reserve
    pub property_id: PropertyId,
    /// First night
    pub check_in_date: NaiveDate,
    /// Departure day
    pub check_out_date: NaiveDate,
    /// Number of guests
    #[validate(range(min = 1, max = 20, message = "Guests must be between 1 and 20"))]
    pub guests: u32,
    /// Optional notes for the owner
    #[validate(length(max = 1000, message = "Special requests may not exceed 1000 characters"))]
    pub special_requests: Option<String>,
}

impl CreateReservationInput {
    /// Validate against `today` and return the requested stay.
    ///
    /// # Errors
    ///
    /// Returns every field-level failure at once.
    pub fn validate_at(&self, today: NaiveDate) -> Result<StayDates, ValidationErrors> {
        let mut errors = derived_errors(self);
        match validate_stay(&mut errors, self.check_in_date, self.check_out_date, today) {
            Some(stay) if errors.is_empty() => Ok(stay),
            _ => Err(errors),
        }
    }
}

/// Body of `PUT /reservations/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct UpdateReservationInput {
    /// New first night
    pub check_in_date: NaiveDate,
    /// New departure day
    pub check_out_date: NaiveDate,
    /// New guest count (unchanged if absent)
    #[validate(range(min = 1, max = 20, message = "Guests must be between 1 and 20"))]
    pub guests: Option<u32>,
    /// New notes (unchanged if absent)
    #[validate(length(max = 1000, message = "Special requests may not exceed 1000 characters"))]
    pub special_requests: Option<String>,
}

impl UpdateReservationInput {
    /// Validate against `today` and return the requested stay.
    ///
    /// # Errors
    ///
    /// Returns every field-level failure at once.
    pub fn validate_at(&self, today: NaiveDate) -> Result<StayDates, ValidationErrors> {
        let mut errors = derived_errors(self);
        match validate_stay(&mut errors, self.check_in_date, self.check_out_date, today) {
            Some(stay) if errors.is_empty() => Ok(stay),
            _ => Err(errors),
        }
    }
}

/// Body of `PATCH /reservations/{id}/status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeStatusInput {
    /// Target status
    pub status: ReservationStatus,
}

// ============================================================================
// Properties
// ============================================================================

fn require_positive_price(errors: &mut ValidationErrors, price: Money) {
    if price.is_zero() {
        errors.add("price", field_error("positive", "The price must be greater than zero"));
    }
}

/// Body of `POST /properties`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct CreatePropertyInput {
    /// Listing title
    #[validate(length(min = 1, max = 255, message = "Title must be between 1 and 255 characters"))]
    pub title: String,
    /// Free-text description
    #[serde(default)]
    #[validate(length(max = 5000, message = "Description may not exceed 5000 characters"))]
    pub description: String,
    /// Street address
    #[validate(length(min = 1, max = 255, message = "Address must be between 1 and 255 characters"))]
    pub address: String,
    /// City
    #[validate(length(min = 1, max = 100, message = "City must be between 1 and 100 characters"))]
    pub city: String,
    /// Nightly price
    pub price: Money,
    /// Number of bedrooms
    #[validate(range(max = 100, message = "Bedrooms may not exceed 100"))]
    pub bedrooms: u32,
    /// Number of bathrooms
    #[validate(range(max = 100, message = "Bathrooms may not exceed 100"))]
    pub bathrooms: u32,
    /// Floor area in square metres
    #[validate(range(max = 1_000_000, message = "Area is out of range"))]
    pub area: u32,
    /// Initial status (defaults to available)
    #[serde(default)]
    pub status: PropertyStatus,
}

impl CreatePropertyInput {
    /// Run all validation rules.
    ///
    /// # Errors
    ///
    /// Returns every field-level failure at once.
    pub fn validate_all(&self) -> Result<(), ValidationErrors> {
        let mut errors = derived_errors(self);
        require_positive_price(&mut errors, self.price);
        finish(errors)
    }
}

/// Body of `PUT /properties/{id}`; absent fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct UpdatePropertyInput {
    /// Listing title
    #[validate(length(min = 1, max = 255, message = "Title must be between 1 and 255 characters"))]
    pub title: Option<String>,
    /// Free-text description
    #[validate(length(max = 5000, message = "Description may not exceed 5000 characters"))]
    pub description: Option<String>,
    /// Street address
    #[validate(length(min = 1, max = 255, message = "Address must be between 1 and 255 characters"))]
    pub address: Option<String>,
    /// City
    #[validate(length(min = 1, max = 100, message = "City must be between 1 and 100 characters"))]
    pub city: Option<String>,
    /// Nightly price
    pub price: Option<Money>,
    /// Number of bedrooms
    #[validate(range(max = 100, message = "Bedrooms may not exceed 100"))]
    pub bedrooms: Option<u32>,
    /// Number of bathrooms
    #[validate(range(max = 100, message = "Bathrooms may not exceed 100"))]
    pub bathrooms: Option<u32>,
    /// Floor area in square metres
    #[validate(range(max = 1_000_000, message = "Area is out of range"))]
    pub area: Option<u32>,
    /// Market status
    pub status: Option<PropertyStatus>,
}

impl UpdatePropertyInput {
    /// Run all validation rules.
    ///
    /// # Errors
    ///
    /// Returns every field-level failure at once.
    pub fn validate_all(&self) -> Result<(), ValidationErrors> {
        let mut errors = derived_errors(self);
        if let Some(price) = self.price {
            require_positive_price(&mut errors, price);
        }
        finish(errors)
    }
}

// ============================================================================
// Reviews
// ============================================================================

/// Body of `POST /properties/{id}/reviews`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct CreateReviewInput {
    /// Rating from 1 to 5
    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
    pub rating: u8,
    /// Review text
    #[validate(length(min = 1, max = 2000, message = "Comment must be between 1 and 2000 characters"))]
    pub comment: String,
}

/// Body of `PUT /reviews/{id}`; absent fields are left unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct UpdateReviewInput {
    /// Rating from 1 to 5
    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
    pub rating: Option<u8>,
    /// Review text
    #[validate(length(min = 1, max = 2000, message = "Comment must be between 1 and 2000 characters"))]
    pub comment: Option<String>,
}

// ============================================================================
// Users
// ============================================================================

/// Body of `PUT /users/me`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct UpdateProfileInput {
    /// New display name
    #[validate(length(min = 1, max = 255, message = "Name must be between 1 and 255 characters"))]
    pub name: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn create_input(check_in: NaiveDate, check_out: NaiveDate, guests: u32) -> CreateReservationInput {
        CreateReservationInput {
            property_id: PropertyId::new(),
            check_in_date: check_in,
            check_out_date: check_out,
            guests,
            special_requests: None,
        }
    }

    #[test]
    fn test_valid_reservation_input_yields_stay() {
        let input = create_input(date(2024, 6, 1), date(2024, 6, 4), 2);
        let stay = input.validate_at(date(2024, 5, 1)).unwrap();
        assert_eq!(stay.nights(), 3);
    }

    #[test]
    fn test_same_day_check_out_rejected_on_check_out_field() {
        let input = create_input(date(2024, 6, 1), date(2024, 6, 1), 2);
        let errors = input.validate_at(date(2024, 5, 1)).unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("check_out_date"));
        assert!(!fields.contains_key("check_in_date"));
    }

    #[test]
    fn test_past_check_in_and_zero_guests_reported_together() {
        let input = create_input(date(2024, 4, 1), date(2024, 4, 3), 0);
        let errors = input.validate_at(date(2024, 5, 1)).unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("check_in_date"));
        assert!(fields.contains_key("guests"));
    }

    #[test]
    fn test_long_special_requests_rejected() {
        let mut input = create_input(date(2024, 6, 1), date(2024, 6, 4), 2);
        input.special_requests = Some("x".repeat(1001));
        let errors = input.validate_at(date(2024, 5, 1)).unwrap_err();
        assert!(errors.field_errors().contains_key("special_requests"));
    }

    #[test]
    fn test_property_price_must_be_positive() {
        let input = CreatePropertyInput {
            title: "Flat".to_string(),
            description: String::new(),
            address: "2 Side St".to_string(),
            city: "Porto".to_string(),
            price: Money::ZERO,
            bedrooms: 2,
            bathrooms: 1,
            area: 70,
            status: PropertyStatus::Available,
        };
        let errors = input.validate_all().unwrap_err();
        assert!(errors.field_errors().contains_key("price"));
    }

    #[test]
    fn test_review_rating_bounds() {
        let review = CreateReviewInput {
            rating: 6,
            comment: "Great".to_string(),
        };
        assert!(review.validate().is_err());

        let review = CreateReviewInput {
            rating: 5,
            comment: "Great".to_string(),
        };
        assert!(review.validate().is_ok());
    }
}
