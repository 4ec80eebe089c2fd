//! Reservation lifecycle.
//!
//! # State Machine
//!
//! ```text
//! Pending ──→ Confirmed ──→ Completed
//!    │            │
//!    ↓            ↓
//! Cancelled    Cancelled
//! ```
//!
//! `Completed` and `Cancelled` are terminal. Dates may only change while
//! `Pending`. Cancelling a `Confirmed` stay is subject to a lead time before
//! check-in.
//!
//! [`ReservationReducer`] applies a [`ReservationAction`] to a reservation
//! in memory; the service persists the result with a compare-and-set on the
//! status it started from.

use crate::environment::Clock;
use crate::error::DomainError;
use crate::inputs::UpdateReservationInput;
use crate::pricing::price_stay;
use crate::reducer::Reducer;
use crate::types::{Money, Reservation, ReservationStatus};
use chrono::{DateTime, Duration, NaiveTime, Utc};
use std::sync::Arc;

// ============================================================================
// Actions
// ============================================================================

/// Things that can happen to an existing reservation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReservationAction {
    /// Owner accepts a pending booking
    Confirm,
    /// Guest, owner or admin calls the stay off
    Cancel,
    /// The stay took place
    Complete,
    /// Guest moves a pending booking; the total is re-priced at `nightly_price`
    EditDates {
        /// Requested dates, guests and notes
        input: UpdateReservationInput,
        /// Current nightly rate of the property
        nightly_price: Money,
    },
}

impl ReservationAction {
    /// Action that moves a reservation to `status`, `None` for `Pending`.
    #[must_use]
    pub const fn for_status(status: ReservationStatus) -> Option<Self> {
        match status {
            ReservationStatus::Confirmed => Some(Self::Confirm),
            ReservationStatus::Cancelled => Some(Self::Cancel),
            ReservationStatus::Completed => Some(Self::Complete),
            ReservationStatus::Pending => None,
        }
    }
}

// ============================================================================
// Environment
// ============================================================================

/// Dependencies of [`ReservationReducer`].
#[derive(Clone)]
pub struct ReservationEnvironment {
    /// Timestamps and "today" for date validation
    pub clock: Arc<dyn Clock>,
    /// Lead time for cancelling confirmed stays
    pub policy: CancellationPolicy,
}

impl ReservationEnvironment {
    /// Creates a new `ReservationEnvironment`
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>, policy: CancellationPolicy) -> Self {
        Self { clock, policy }
    }
}

// ============================================================================
// Reducer
// ============================================================================

/// Reducer for a single reservation.
#[derive(Clone, Copy, Debug, Default)]
pub struct ReservationReducer;

impl ReservationReducer {
    /// Creates a new `ReservationReducer`
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn transition(
        state: &mut Reservation,
        to: ReservationStatus,
        now: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        ensure_transition(state.status, to)?;
        state.status = to;
        state.updated_at = now;
        Ok(())
    }

    fn edit_dates(
        state: &mut Reservation,
        input: UpdateReservationInput,
        nightly_price: Money,
        now: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        ensure_editable(state)?;
        let stay = input.validate_at(now.date_naive())?;
        let total_price = price_stay(nightly_price, &stay)?;

        state.check_in = stay.check_in();
        state.check_out = stay.check_out();
        state.total_price = total_price;
        if let Some(guests) = input.guests {
            state.guests = guests;
        }
        if input.special_requests.is_some() {
            state.special_requests = input.special_requests;
        }
        state.updated_at = now;
        Ok(())
    }
}

impl Reducer for ReservationReducer {
    type State = Reservation;
    type Action = ReservationAction;
    type Environment = ReservationEnvironment;
    type Error = DomainError;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> Result<(), Self::Error> {
        let now = env.clock.now();
        match action {
            ReservationAction::Confirm => Self::transition(state, ReservationStatus::Confirmed, now),
            ReservationAction::Complete => Self::transition(state, ReservationStatus::Completed, now),
            ReservationAction::Cancel => {
                env.policy.check(state, now)?;
                Self::transition(state, ReservationStatus::Cancelled, now)
            }
            ReservationAction::EditDates { input, nightly_price } => {
                Self::edit_dates(state, input, nightly_price, now)
            }
        }
    }
}

// ============================================================================
// Rules
// ============================================================================

/// Whether the lifecycle allows moving from `from` to `to`.
#[must_use]
pub const fn can_transition(from: ReservationStatus, to: ReservationStatus) -> bool {
    use crate::types::ReservationStatus::{Cancelled, Completed, Confirmed, Pending};
    matches!(
        (from, to),
        (Pending, Confirmed | Cancelled) | (Confirmed, Completed | Cancelled)
    )
}

/// Validate a status transition.
///
/// # Errors
///
/// Returns [`DomainError::InvalidTransition`] for transitions outside the
/// state machine.
pub fn ensure_transition(
    from: ReservationStatus,
    to: ReservationStatus,
) -> Result<(), DomainError> {
    if can_transition(from, to) {
        Ok(())
    } else {
        Err(DomainError::InvalidTransition { from, to })
    }
}

/// Validate that a reservation's dates and details may still be edited.
///
/// # Errors
///
/// Returns [`DomainError::NotEditable`] unless the reservation is pending.
pub fn ensure_editable(reservation: &Reservation) -> Result<(), DomainError> {
    match reservation.status {
        ReservationStatus::Pending => Ok(()),
        status => Err(DomainError::NotEditable { status }),
    }
}

/// Instant a stay starts: midnight UTC on the check-in date.
#[must_use]
pub fn check_in_instant(reservation: &Reservation) -> DateTime<Utc> {
    reservation.check_in.and_time(NaiveTime::MIN).and_utc()
}

/// Cancellation rules for reservations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CancellationPolicy {
    /// Minimum time between "now" and check-in for cancelling a confirmed stay
    pub lead_time: Duration,
}

impl Default for CancellationPolicy {
    fn default() -> Self {
        Self {
            lead_time: Duration::hours(24),
        }
    }
}

impl CancellationPolicy {
    /// Policy with a lead time given in hours.
    #[must_use]
    pub fn with_lead_time_hours(hours: i64) -> Self {
        Self {
            lead_time: Duration::hours(hours),
        }
    }

    /// Decide whether `reservation` may be cancelled at `now`.
    ///
    /// - `Pending`: always.
    /// - `Confirmed`: only while check-in is strictly more than the lead time away.
    /// - `Completed` / `Cancelled`: never.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidTransition`] for terminal reservations and
    /// [`DomainError::CancellationWindowClosed`] inside the lead time.
    pub fn check(&self, reservation: &Reservation, now: DateTime<Utc>) -> Result<(), DomainError> {
        ensure_transition(reservation.status, ReservationStatus::Cancelled)?;

        if reservation.status == ReservationStatus::Confirmed
            && check_in_instant(reservation) - now <= self.lead_time
        {
            return Err(DomainError::CancellationWindowClosed {
                lead_time_hours: self.lead_time.num_hours(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::{Money, PropertyId, ReservationId, UserId};
    use chrono::{NaiveDate, TimeZone};
    use crate::types::ReservationStatus::{Cancelled, Completed, Confirmed, Pending};

    struct StoppedClock(DateTime<Utc>);

    impl Clock for StoppedClock {
        fn now(&self) -> DateTime<Utc> {
            self.0
        }
    }

    fn env_at(now: DateTime<Utc>) -> ReservationEnvironment {
        ReservationEnvironment::new(Arc::new(StoppedClock(now)), CancellationPolicy::default())
    }

    fn may_first() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap()
    }

    fn edit(check_in: NaiveDate, check_out: NaiveDate) -> ReservationAction {
        ReservationAction::EditDates {
            input: UpdateReservationInput {
                check_in_date: check_in,
                check_out_date: check_out,
                guests: Some(4),
                special_requests: None,
            },
            nightly_price: Money::from_cents(10_000),
        }
    }

    fn reservation(status: ReservationStatus, check_in: NaiveDate) -> Reservation {
        Reservation {
            id: ReservationId::new(),
            property_id: PropertyId::new(),
            user_id: UserId::new(),
            check_in,
            check_out: check_in + Duration::days(3),
            guests: 1,
            special_requests: None,
            status,
            total_price: Money::from_cents(30_000),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            deleted_at: None,
        }
    }

    fn june(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, day).unwrap()
    }

    #[test]
    fn test_transition_table() {
        let all = [Pending, Confirmed, Cancelled, Completed];
        let allowed = [
            (Pending, Confirmed),
            (Pending, Cancelled),
            (Confirmed, Completed),
            (Confirmed, Cancelled),
        ];
        for from in all {
            for to in all {
                assert_eq!(
                    can_transition(from, to),
                    allowed.contains(&(from, to)),
                    "{from} -> {to}"
                );
            }
        }
    }

    #[test]
    fn test_only_pending_is_editable() {
        assert!(ensure_editable(&reservation(Pending, june(10))).is_ok());
        for status in [Confirmed, Cancelled, Completed] {
            assert_eq!(
                ensure_editable(&reservation(status, june(10))),
                Err(DomainError::NotEditable { status })
            );
        }
    }

    #[test]
    fn test_pending_cancels_even_on_check_in_day() {
        let now = Utc.with_ymd_and_hms(2024, 6, 10, 12, 0, 0).unwrap();
        let policy = CancellationPolicy::default();
        assert!(policy.check(&reservation(Pending, june(10)), now).is_ok());
    }

    #[test]
    fn test_confirmed_respects_lead_time() {
        let policy = CancellationPolicy::default();
        let booking = reservation(Confirmed, june(10));

        let two_days_before = Utc.with_ymd_and_hms(2024, 6, 8, 0, 0, 0).unwrap();
        assert!(policy.check(&booking, two_days_before).is_ok());

        let exactly_24h_before = Utc.with_ymd_and_hms(2024, 6, 9, 0, 0, 0).unwrap();
        assert_eq!(
            policy.check(&booking, exactly_24h_before),
            Err(DomainError::CancellationWindowClosed { lead_time_hours: 24 })
        );

        let evening_before = Utc.with_ymd_and_hms(2024, 6, 9, 20, 0, 0).unwrap();
        assert!(policy.check(&booking, evening_before).is_err());
    }

    #[test]
    fn test_terminal_reservations_never_cancel() {
        let long_before = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let policy = CancellationPolicy::default();
        assert_eq!(
            policy.check(&reservation(Completed, june(10)), long_before),
            Err(DomainError::InvalidTransition {
                from: Completed,
                to: Cancelled
            })
        );
        assert!(policy.check(&reservation(Cancelled, june(10)), long_before).is_err());
    }

    #[test]
    fn test_custom_lead_time() {
        let policy = CancellationPolicy::with_lead_time_hours(72);
        let booking = reservation(Confirmed, june(10));
        let two_days_before = Utc.with_ymd_and_hms(2024, 6, 8, 0, 0, 0).unwrap();
        assert!(policy.check(&booking, two_days_before).is_err());
    }

    #[test]
    fn test_confirm_then_complete() {
        let env = env_at(may_first());
        let mut booking = reservation(Pending, june(10));

        ReservationReducer::new()
            .reduce(&mut booking, ReservationAction::Confirm, &env)
            .unwrap();
        assert_eq!(booking.status, Confirmed);
        assert_eq!(booking.updated_at, may_first());

        ReservationReducer::new()
            .reduce(&mut booking, ReservationAction::Complete, &env)
            .unwrap();
        assert_eq!(booking.status, Completed);
    }

    #[test]
    fn test_rejected_action_leaves_state_alone() {
        let env = env_at(may_first());
        let booking = reservation(Pending, june(10));
        let mut state = booking.clone();

        let result = ReservationReducer::new().reduce(&mut state, ReservationAction::Complete, &env);

        assert_eq!(
            result,
            Err(DomainError::InvalidTransition {
                from: Pending,
                to: Completed
            })
        );
        assert_eq!(state, booking);
    }

    #[test]
    fn test_cancel_applies_policy() {
        let evening_before = Utc.with_ymd_and_hms(2024, 6, 9, 20, 0, 0).unwrap();
        let mut confirmed = reservation(Confirmed, june(10));
        let result = ReservationReducer::new().reduce(
            &mut confirmed,
            ReservationAction::Cancel,
            &env_at(evening_before),
        );
        assert!(matches!(result, Err(DomainError::CancellationWindowClosed { .. })));
        assert_eq!(confirmed.status, Confirmed);

        let mut pending = reservation(Pending, june(10));
        ReservationReducer::new()
            .reduce(&mut pending, ReservationAction::Cancel, &env_at(evening_before))
            .unwrap();
        assert_eq!(pending.status, Cancelled);
    }

    #[test]
    fn test_edit_dates_reprices_pending_only() {
        let env = env_at(may_first());

        let mut pending = reservation(Pending, june(10));
        ReservationReducer::new()
            .reduce(&mut pending, edit(june(1), june(4)), &env)
            .unwrap();
        assert_eq!((pending.check_in, pending.check_out), (june(1), june(4)));
        assert_eq!(pending.total_price, Money::from_cents(30_000));
        assert_eq!(pending.guests, 4);
        assert_eq!(pending.status, Pending);

        let mut confirmed = reservation(Confirmed, june(10));
        assert_eq!(
            ReservationReducer::new().reduce(&mut confirmed, edit(june(1), june(4)), &env),
            Err(DomainError::NotEditable { status: Confirmed })
        );
        assert_eq!(confirmed.check_in, june(10));
    }

    #[test]
    fn test_edit_dates_validates_against_today() {
        let env = env_at(Utc.with_ymd_and_hms(2024, 6, 5, 9, 0, 0).unwrap());
        let mut pending = reservation(Pending, june(10));

        let result = ReservationReducer::new().reduce(&mut pending, edit(june(1), june(4)), &env);

        assert!(matches!(result, Err(DomainError::Validation(_))));
        assert_eq!(pending.check_in, june(10));
    }

    #[test]
    fn test_action_for_status() {
        assert_eq!(ReservationAction::for_status(Confirmed), Some(ReservationAction::Confirm));
        assert_eq!(ReservationAction::for_status(Cancelled), Some(ReservationAction::Cancel));
        assert_eq!(ReservationAction::for_status(Completed), Some(ReservationAction::Complete));
        assert_eq!(ReservationAction::for_status(Pending), None);
    }
}
