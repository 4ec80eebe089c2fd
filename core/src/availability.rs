//! Availability checking over half-open date intervals.
//!
//! A stay occupies the nights `[check_in, check_out)`: the check-out day is
//! free for the next guest. Two stays overlap iff `a.check_in < b.check_out`
//! and `b.check_in < a.check_out`. Both comparisons are strict, so a stay
//! ending on 2024-06-10 and one starting on 2024-06-10 do not conflict.

use crate::types::{Reservation, ReservationId};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A validated stay: `check_out` is strictly after `check_in`.
///
/// Deserialization goes through [`StayDates::new`], so a reversed or empty
/// interval is rejected there too.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "UncheckedStay")]
pub struct StayDates {
    check_in: NaiveDate,
    check_out: NaiveDate,
}

#[derive(Deserialize)]
struct UncheckedStay {
    check_in: NaiveDate,
    check_out: NaiveDate,
}

impl TryFrom<UncheckedStay> for StayDates {
    type Error = &'static str;

    fn try_from(stay: UncheckedStay) -> Result<Self, Self::Error> {
        Self::new(stay.check_in, stay.check_out).ok_or("check_out must be after check_in")
    }
}

impl StayDates {
    /// Build a stay, `None` unless `check_out > check_in`.
    #[must_use]
    pub fn new(check_in: NaiveDate, check_out: NaiveDate) -> Option<Self> {
        (check_out > check_in).then_some(Self {
            check_in,
            check_out,
        })
    }

    /// First night of the stay
    #[must_use]
    pub const fn check_in(&self) -> NaiveDate {
        self.check_in
    }

    /// Departure day
    #[must_use]
    pub const fn check_out(&self) -> NaiveDate {
        self.check_out
    }

    /// Number of nights (whole days between check-in and check-out)
    #[must_use]
    pub fn nights(&self) -> u32 {
        let days = (self.check_out - self.check_in).num_days();
        // check_out > check_in, and NaiveDate spans fit in u32 days
        u32::try_from(days).unwrap_or(u32::MAX)
    }

    /// Whether this stay shares at least one night with `other`
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        overlaps(self.check_in, self.check_out, other.check_in, other.check_out)
    }

    /// Whether `self` lies entirely within `other`
    #[must_use]
    pub fn is_within(&self, other: &Self) -> bool {
        other.check_in <= self.check_in && self.check_out <= other.check_out
    }
}

impl From<&Reservation> for StayDates {
    fn from(reservation: &Reservation) -> Self {
        Self {
            check_in: reservation.check_in,
            check_out: reservation.check_out,
        }
    }
}

/// Half-open interval overlap: `[a_start, a_end)` ∩ `[b_start, b_end)` ≠ ∅.
#[must_use]
pub fn overlaps(a_start: NaiveDate, a_end: NaiveDate, b_start: NaiveDate, b_end: NaiveDate) -> bool {
    a_start < b_end && b_start < a_end
}

/// First live reservation that conflicts with `stay`, skipping `exclude`.
///
/// Cancelled and soft-deleted reservations never conflict.
pub fn find_conflict<'a, I>(
    reservations: I,
    stay: &StayDates,
    exclude: Option<ReservationId>,
) -> Option<&'a Reservation>
where
    I: IntoIterator<Item = &'a Reservation>,
{
    reservations.into_iter().find(|r| {
        r.is_live()
            && Some(r.id) != exclude
            && overlaps(r.check_in, r.check_out, stay.check_in, stay.check_out)
    })
}

/// Whether `stay` is free given the property's existing reservations.
///
/// The caller passes the reservations of a single property.
pub fn is_available<'a, I>(reservations: I, stay: &StayDates, exclude: Option<ReservationId>) -> bool
where
    I: IntoIterator<Item = &'a Reservation>,
{
    find_conflict(reservations, stay, exclude).is_none()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::{Money, PropertyId, ReservationStatus, UserId};
    use chrono::Utc;
    use proptest::prelude::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn stay(from: NaiveDate, to: NaiveDate) -> StayDates {
        StayDates::new(from, to).unwrap()
    }

    fn reservation(from: NaiveDate, to: NaiveDate, status: ReservationStatus) -> Reservation {
        Reservation {
            id: ReservationId::new(),
            property_id: PropertyId::new(),
            user_id: UserId::new(),
            check_in: from,
            check_out: to,
            guests: 2,
            special_requests: None,
            status,
            total_price: Money::ZERO,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            deleted_at: None,
        }
    }

    #[test]
    fn test_stay_requires_check_out_after_check_in() {
        assert!(StayDates::new(date(2024, 6, 1), date(2024, 6, 1)).is_none());
        assert!(StayDates::new(date(2024, 6, 2), date(2024, 6, 1)).is_none());
        assert!(StayDates::new(date(2024, 6, 1), date(2024, 6, 2)).is_some());
    }

    #[test]
    fn test_deserialize_rejects_reversed_stays() {
        let stay: StayDates =
            serde_json::from_str(r#"{"check_in":"2024-06-10","check_out":"2024-06-12"}"#).unwrap();
        assert_eq!(stay.nights(), 2);

        for json in [
            r#"{"check_in":"2024-06-12","check_out":"2024-06-10"}"#,
            r#"{"check_in":"2024-06-10","check_out":"2024-06-10"}"#,
        ] {
            assert!(serde_json::from_str::<StayDates>(json).is_err(), "{json}");
        }
    }

    #[test]
    fn test_nights() {
        assert_eq!(stay(date(2024, 6, 1), date(2024, 6, 4)).nights(), 3);
        // Across a leap day
        assert_eq!(stay(date(2024, 2, 28), date(2024, 3, 1)).nights(), 2);
    }

    #[test]
    fn test_back_to_back_stays_do_not_overlap() {
        let first = reservation(date(2024, 6, 5), date(2024, 6, 10), ReservationStatus::Confirmed);
        let next = stay(date(2024, 6, 10), date(2024, 6, 12));
        assert!(!StayDates::from(&first).overlaps(&next));
        assert!(is_available([&first], &next, None));

        let before = stay(date(2024, 6, 1), date(2024, 6, 5));
        assert!(is_available([&first], &before, None));
    }

    #[test]
    fn test_overlap_shapes() {
        let existing = reservation(date(2024, 6, 5), date(2024, 6, 10), ReservationStatus::Pending);
        let cases = [
            (date(2024, 6, 4), date(2024, 6, 6)),  // straddles start
            (date(2024, 6, 9), date(2024, 6, 11)), // straddles end
            (date(2024, 6, 6), date(2024, 6, 8)),  // inside
            (date(2024, 6, 1), date(2024, 6, 20)), // contains
            (date(2024, 6, 5), date(2024, 6, 10)), // identical
        ];
        for (from, to) in cases {
            assert!(
                !is_available([&existing], &stay(from, to), None),
                "{from}..{to} should conflict"
            );
        }
    }

    #[test]
    fn test_cancelled_and_deleted_reservations_are_ignored() {
        let cancelled = reservation(date(2024, 6, 5), date(2024, 6, 10), ReservationStatus::Cancelled);
        let mut deleted = reservation(date(2024, 6, 5), date(2024, 6, 10), ReservationStatus::Pending);
        deleted.deleted_at = Some(Utc::now());

        let wanted = stay(date(2024, 6, 6), date(2024, 6, 8));
        assert!(is_available([&cancelled, &deleted], &wanted, None));
    }

    #[test]
    fn test_excluded_reservation_does_not_conflict_with_itself() {
        let own = reservation(date(2024, 6, 5), date(2024, 6, 10), ReservationStatus::Pending);
        let shrunk = stay(date(2024, 6, 6), date(2024, 6, 9));

        assert!(!is_available([&own], &shrunk, None));
        assert!(is_available([&own], &shrunk, Some(own.id)));
    }

    #[test]
    fn test_find_conflict_returns_blocking_reservation() {
        let a = reservation(date(2024, 6, 1), date(2024, 6, 3), ReservationStatus::Confirmed);
        let b = reservation(date(2024, 6, 3), date(2024, 6, 6), ReservationStatus::Pending);
        let wanted = stay(date(2024, 6, 4), date(2024, 6, 5));
        assert_eq!(find_conflict([&a, &b], &wanted, None).map(|r| r.id), Some(b.id));
    }

    fn arb_stay() -> impl Strategy<Value = StayDates> {
        (0i64..120, 1i64..30).prop_map(|(offset, len)| {
            let start = date(2024, 1, 1) + chrono::Duration::days(offset);
            stay(start, start + chrono::Duration::days(len))
        })
    }

    proptest! {
        #[test]
        fn prop_overlap_is_symmetric(a in arb_stay(), b in arb_stay()) {
            prop_assert_eq!(a.overlaps(&b), b.overlaps(&a));
        }

        #[test]
        fn prop_overlap_matches_shared_night(a in arb_stay(), b in arb_stay()) {
            let shared = a
                .check_in()
                .iter_days()
                .take_while(|d| *d < a.check_out())
                .any(|d| b.check_in() <= d && d < b.check_out());
            prop_assert_eq!(a.overlaps(&b), shared);
        }

        #[test]
        fn prop_stay_always_overlaps_itself(a in arb_stay()) {
            prop_assert!(a.overlaps(&a));
        }
    }
}
