use std::sync::Arc;

use uuid::Uuid;

use rihla_core::identity::{authorize_office, OperatorIdentity};
use rihla_core::CoreError;
use rihla_transit::repository::{ReleaseOutcome, TripRepository};

use crate::models::{Booking, BookingStatus};
use crate::repository::{BookingRepository, TransitionOutcome};

#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    #[error("booking not found: {0}")]
    NotFound(Uuid),

    #[error("invalid status transition from {from:?} to {to:?}")]
    InvalidTransition {
        from: BookingStatus,
        to: BookingStatus,
    },

    #[error("not authorized")]
    Unauthorized,

    #[error("store error: {0}")]
    Store(String),
}

impl From<CoreError> for LifecycleError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Unauthorized => LifecycleError::Unauthorized,
            other => LifecycleError::Store(other.to_string()),
        }
    }
}

/// Governs booking progression after allocation. All transitions are
/// office-authorized against an explicit caller identity, validated against
/// the transition table inside the store's write lock, and never no-op
/// silently.
pub struct LifecycleManager {
    bookings: Arc<dyn BookingRepository>,
    trips: Arc<dyn TripRepository>,
}

impl LifecycleManager {
    pub fn new(bookings: Arc<dyn BookingRepository>, trips: Arc<dyn TripRepository>) -> Self {
        Self { bookings, trips }
    }

    /// Pending -> Confirmed. Seats are already Booked from allocation.
    pub async fn confirm(
        &self,
        booking_id: Uuid,
        operator: &OperatorIdentity,
    ) -> Result<Booking, LifecycleError> {
        self.transition(booking_id, operator, BookingStatus::Confirmed)
            .await
    }

    /// Pending/Confirmed -> Cancelled. Releases the booking's seats and
    /// returns their count to the trip's availability counter.
    pub async fn cancel(
        &self,
        booking_id: Uuid,
        operator: &OperatorIdentity,
    ) -> Result<Booking, LifecycleError> {
        let booking = self
            .transition(booking_id, operator, BookingStatus::Cancelled)
            .await?;

        match self
            .trips
            .release_seats(booking.trip_id, booking.id)
            .await
            .map_err(|e| LifecycleError::Store(e.to_string()))?
        {
            ReleaseOutcome::Released(count) => {
                tracing::info!(
                    booking_id = %booking.id,
                    trip_id = %booking.trip_id,
                    released = count,
                    "booking cancelled, seats released"
                );
            }
            ReleaseOutcome::TripNotFound => {
                // Booking without its trip means the store lost an aggregate.
                tracing::error!(booking_id = %booking.id, "trip missing during seat release");
            }
        }

        Ok(booking)
    }

    /// Confirmed -> Completed. Seats stay allocated as a historical record.
    pub async fn complete(
        &self,
        booking_id: Uuid,
        operator: &OperatorIdentity,
    ) -> Result<Booking, LifecycleError> {
        self.transition(booking_id, operator, BookingStatus::Completed)
            .await
    }

    /// Confirmed -> NoShow.
    pub async fn mark_no_show(
        &self,
        booking_id: Uuid,
        operator: &OperatorIdentity,
    ) -> Result<Booking, LifecycleError> {
        self.transition(booking_id, operator, BookingStatus::NoShow)
            .await
    }

    pub async fn transition(
        &self,
        booking_id: Uuid,
        operator: &OperatorIdentity,
        target: BookingStatus,
    ) -> Result<Booking, LifecycleError> {
        let booking = self
            .bookings
            .get_booking(booking_id)
            .await
            .map_err(|e| LifecycleError::Store(e.to_string()))?
            .ok_or(LifecycleError::NotFound(booking_id))?;

        authorize_office(operator, booking.office_id)?;

        match self
            .bookings
            .transition_status(booking_id, target)
            .await
            .map_err(|e| LifecycleError::Store(e.to_string()))?
        {
            TransitionOutcome::Done(updated) => Ok(updated),
            TransitionOutcome::NotFound => Err(LifecycleError::NotFound(booking_id)),
            TransitionOutcome::Invalid { from } => {
                Err(LifecycleError::InvalidTransition { from, to: target })
            }
        }
    }
}
