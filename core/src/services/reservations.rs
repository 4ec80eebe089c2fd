//! Reservation booking, editing and lifecycle.

use super::StoreResultExt;
use crate::actor::Actor;
use crate::availability::{StayDates, is_available};
use crate::environment::Clock;
use crate::error::{DomainError, Result, StoreError};
use crate::inputs::{ChangeStatusInput, CreateReservationInput, UpdateReservationInput};
use crate::lifecycle::{
    CancellationPolicy, ReservationAction, ReservationEnvironment, ReservationReducer,
    ensure_editable,
};
use crate::pricing::calculate_total_price;
use crate::reducer::Reducer;
use crate::store::{PropertyStore, ReservationStore};
use crate::types::{Money, PropertyId, Reservation, ReservationId, ReservationStatus};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::{ValidationError, ValidationErrors};

/// Answer to "can I book these dates, and for how much?".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityQuote {
    /// No live reservation overlaps the dates
    pub available: bool,
    /// Nights in the stay
    pub nights: u32,
    /// Price of the stay at the current nightly rate
    pub total_price: Money,
}

/// Reservation operations.
#[derive(Clone)]
pub struct ReservationService {
    reservations: Arc<dyn ReservationStore>,
    properties: Arc<dyn PropertyStore>,
    env: ReservationEnvironment,
    reducer: ReservationReducer,
}

impl ReservationService {
    /// Create the service.
    #[must_use]
    pub fn new(
        reservations: Arc<dyn ReservationStore>,
        properties: Arc<dyn PropertyStore>,
        clock: Arc<dyn Clock>,
        policy: CancellationPolicy,
    ) -> Self {
        Self {
            reservations,
            properties,
            env: ReservationEnvironment::new(clock, policy),
            reducer: ReservationReducer::new(),
        }
    }

    /// Check whether `property_id` is free for the stay and price it.
    ///
    /// # Errors
    ///
    /// - [`DomainError::Validation`] if `check_out` is not after `check_in`
    /// - [`DomainError::NotFound`] if the property does not exist
    pub async fn quote(
        &self,
        property_id: PropertyId,
        check_in: NaiveDate,
        check_out: NaiveDate,
    ) -> Result<AvailabilityQuote> {
        let Some(stay) = StayDates::new(check_in, check_out) else {
            let mut errors = ValidationErrors::new();
            let mut error = ValidationError::new("after_check_in");
            error.message = Some("The check out date must be after the check in date".into());
            errors.add("check_out_date", error);
            return Err(DomainError::Validation(errors));
        };

        let property = self.properties.get(property_id).await.or_not_found("Property", property_id)?;
        let existing = self.reservations.overlapping(property_id, &stay).await?;

        Ok(AvailabilityQuote {
            available: property.accepts_reservations() && is_available(&existing, &stay, None),
            nights: stay.nights(),
            total_price: calculate_total_price(&property, &stay)?,
        })
    }

    /// Book a stay. The reservation starts `pending`.
    ///
    /// # Errors
    ///
    /// - [`DomainError::Validation`] for bad input
    /// - [`DomainError::NotFound`] if the property does not exist
    /// - [`DomainError::PropertyNotBookable`] if it is not available for booking
    /// - [`DomainError::Unavailable`] if the dates overlap a live reservation
    #[tracing::instrument(skip(self, input), fields(actor = %actor, property_id = %input.property_id))]
    pub async fn create(&self, actor: &Actor, input: CreateReservationInput) -> Result<Reservation> {
        let now = self.env.clock.now();
        let stay = input.validate_at(now.date_naive())?;

        let property = self
            .properties
            .get(input.property_id)
            .await
            .or_not_found("Property", input.property_id)?;
        if !property.accepts_reservations() {
            return Err(DomainError::PropertyNotBookable);
        }

        let reservation = Reservation {
            id: ReservationId::new(),
            property_id: property.id,
            user_id: actor.user_id,
            check_in: stay.check_in(),
            check_out: stay.check_out(),
            guests: input.guests,
            special_requests: input.special_requests,
            status: ReservationStatus::Pending,
            total_price: calculate_total_price(&property, &stay)?,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };

        match self.reservations.insert_if_available(&reservation).await {
            Ok(()) => {
                metrics::counter!("reservations.created").increment(1);
                tracing::info!(
                    reservation_id = %reservation.id,
                    nights = stay.nights(),
                    total_price = %reservation.total_price,
                    "Reservation created"
                );
                Ok(reservation)
            }
            Err(StoreError::Conflict) => {
                metrics::counter!("reservations.conflicts").increment(1);
                tracing::info!("Requested dates are taken");
                Err(DomainError::Unavailable)
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Get a reservation visible to `actor` (guest, property owner or admin).
    ///
    /// # Errors
    ///
    /// [`DomainError::NotFound`] or [`DomainError::Forbidden`].
    pub async fn get(&self, actor: &Actor, id: ReservationId) -> Result<Reservation> {
        let reservation = self.load(id).await?;
        self.require_participant(actor, &reservation).await?;
        Ok(reservation)
    }

    /// Reservations made by `actor`.
    ///
    /// # Errors
    ///
    /// [`DomainError::Storage`] on store failure.
    pub async fn list_mine(&self, actor: &Actor) -> Result<Vec<Reservation>> {
        Ok(self.reservations.list_for_user(actor.user_id).await?)
    }

    /// Reservations on a property; owner or admin only.
    ///
    /// # Errors
    ///
    /// [`DomainError::NotFound`] or [`DomainError::Forbidden`].
    pub async fn list_for_property(
        &self,
        actor: &Actor,
        property_id: PropertyId,
    ) -> Result<Vec<Reservation>> {
        let property = self.properties.get(property_id).await.or_not_found("Property", property_id)?;
        actor.require_property_owner(&property)?;
        Ok(self.reservations.list_for_property(property_id).await?)
    }

    /// Change the dates (and optionally guests/notes) of a pending reservation.
    ///
    /// Availability is re-checked excluding the reservation itself and the
    /// price is recomputed at the current nightly rate.
    ///
    /// # Errors
    ///
    /// - [`DomainError::Forbidden`] unless the guest or an admin
    /// - [`DomainError::NotEditable`] unless pending
    /// - [`DomainError::Validation`] for bad input
    /// - [`DomainError::Unavailable`] if the new dates overlap another live reservation
    #[tracing::instrument(skip(self, input), fields(actor = %actor, reservation_id = %id))]
    pub async fn update(
        &self,
        actor: &Actor,
        id: ReservationId,
        input: UpdateReservationInput,
    ) -> Result<Reservation> {
        let mut reservation = self.load(id).await?;
        actor.require_guest(&reservation)?;
        ensure_editable(&reservation)?;

        let property = self
            .properties
            .get(reservation.property_id)
            .await
            .or_not_found("Property", reservation.property_id)?;
        self.reducer.reduce(
            &mut reservation,
            ReservationAction::EditDates {
                input,
                nightly_price: property.price,
            },
            &self.env,
        )?;

        match self.reservations.update_if_available(&reservation).await {
            Ok(()) => {
                tracing::info!(total_price = %reservation.total_price, "Reservation updated");
                Ok(reservation)
            }
            Err(StoreError::Conflict) => {
                metrics::counter!("reservations.conflicts").increment(1);
                Err(DomainError::Unavailable)
            }
            Err(StoreError::NotPending { status }) => {
                tracing::info!(%status, "Reservation changed status before the edit was written");
                Err(DomainError::NotEditable { status })
            }
            Err(StoreError::NotFound) => Err(DomainError::not_found("Reservation", id)),
            Err(err) => Err(err.into()),
        }
    }

    /// Cancel a reservation (guest, property owner or admin), subject to the
    /// cancellation policy.
    ///
    /// # Errors
    ///
    /// - [`DomainError::Forbidden`] for other users
    /// - [`DomainError::InvalidTransition`] if already terminal
    /// - [`DomainError::CancellationWindowClosed`] inside the lead time
    #[tracing::instrument(skip(self), fields(actor = %actor, reservation_id = %id))]
    pub async fn cancel(&self, actor: &Actor, id: ReservationId) -> Result<Reservation> {
        let reservation = self.load(id).await?;
        self.require_participant(actor, &reservation).await?;

        let from = reservation.status;
        let cancelled = self.apply(reservation, ReservationAction::Cancel).await?;

        metrics::counter!("reservations.cancelled").increment(1);
        tracing::info!(%from, "Reservation cancelled");
        Ok(cancelled)
    }

    /// Move a reservation along its lifecycle.
    ///
    /// Cancellation follows [`cancel`](Self::cancel); confirming and
    /// completing are reserved to the property owner or an admin.
    ///
    /// # Errors
    ///
    /// - [`DomainError::Forbidden`] for other users
    /// - [`DomainError::InvalidTransition`] outside the state machine
    #[tracing::instrument(skip(self), fields(actor = %actor, reservation_id = %id, to = %input.status))]
    pub async fn change_status(
        &self,
        actor: &Actor,
        id: ReservationId,
        input: ChangeStatusInput,
    ) -> Result<Reservation> {
        if input.status == ReservationStatus::Cancelled {
            return self.cancel(actor, id).await;
        }

        let reservation = self.load(id).await?;
        self.require_owner(actor, &reservation).await?;

        let from = reservation.status;
        let action = ReservationAction::for_status(input.status).ok_or(
            DomainError::InvalidTransition {
                from,
                to: input.status,
            },
        )?;
        let updated = self.apply(reservation, action).await?;

        tracing::info!(%from, "Reservation status changed");
        Ok(updated)
    }

    /// Soft-delete a pending reservation (guest or admin). Its dates become
    /// free immediately.
    ///
    /// # Errors
    ///
    /// - [`DomainError::Forbidden`] unless the guest or an admin
    /// - [`DomainError::NotEditable`] unless pending
    #[tracing::instrument(skip(self), fields(actor = %actor, reservation_id = %id))]
    pub async fn delete(&self, actor: &Actor, id: ReservationId) -> Result<()> {
        let reservation = self.load(id).await?;
        actor.require_guest(&reservation)?;
        ensure_editable(&reservation)?;

        self.reservations
            .soft_delete(id, self.env.clock.now())
            .await
            .or_not_found("Reservation", id)?;
        tracing::info!("Reservation deleted");
        Ok(())
    }

    /// Mark confirmed stays whose check-out day has arrived as completed.
    ///
    /// # Errors
    ///
    /// [`DomainError::Storage`] on store failure.
    pub async fn complete_past_stays(&self) -> Result<u64> {
        let now = self.env.clock.now();
        let completed = self.reservations.complete_elapsed(now.date_naive(), now).await?;
        if completed > 0 {
            tracing::info!(completed, "Completed elapsed reservations");
        }
        Ok(completed)
    }

    /// Run `action` through the reducer and persist the new status, provided
    /// nobody changed it since `reservation` was loaded.
    async fn apply(&self, mut reservation: Reservation, action: ReservationAction) -> Result<Reservation> {
        let from = reservation.status;
        self.reducer.reduce(&mut reservation, action, &self.env)?;
        self.reservations
            .set_status(reservation.id, from, reservation.status, reservation.updated_at)
            .await
            .or_not_found("Reservation", reservation.id)
    }

    async fn load(&self, id: ReservationId) -> Result<Reservation> {
        self.reservations.get(id).await.or_not_found("Reservation", id)
    }

    /// Guest, property owner or admin.
    async fn require_participant(&self, actor: &Actor, reservation: &Reservation) -> Result<()> {
        if actor.owns_or_admin(reservation.user_id) {
            return Ok(());
        }
        self.require_owner(actor, reservation).await
    }

    /// Owner of the reserved property or admin.
    async fn require_owner(&self, actor: &Actor, reservation: &Reservation) -> Result<()> {
        if actor.is_admin() {
            return Ok(());
        }
        match self.properties.get(reservation.property_id).await {
            Ok(property) => actor.require_property_owner(&property),
            Err(StoreError::NotFound) => Err(DomainError::forbidden(
                "Only the property owner or an admin can do this",
            )),
            Err(err) => Err(err.into()),
        }
    }
}
