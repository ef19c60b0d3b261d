use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::{Booking, BookingStatus, Payment};

pub type RepoError = Box<dyn std::error::Error + Send + Sync>;

/// Result of the atomic booking write: the seat claim (Available -> Booked),
/// the availability-counter decrement and the booking row insert succeed or
/// fail as one unit inside the store's critical section.
#[derive(Debug)]
pub enum CreateBookingOutcome {
    /// Carries the stored booking: the store may have regenerated the
    /// reference on collision.
    Created(Booking),
    TripNotFound,
    /// Trip was cancelled or departed between the caller's read and the
    /// write.
    TripClosed,
    /// Seat numbers that do not exist on this trip.
    UnknownSeats(Vec<String>),
    /// Seats that were no longer Available; nothing was written.
    Unavailable(Vec<String>),
}

/// Result of a conditional booking status transition. The store validates
/// the transition table under its write lock so two racing transitions
/// serialize and the loser is told what it lost to.
#[derive(Debug)]
pub enum TransitionOutcome {
    Done(Booking),
    NotFound,
    Invalid { from: BookingStatus },
}

/// Result of the conditional payment insert: refused when the booking
/// already holds a Paid row.
#[derive(Debug)]
pub enum CreatePaymentOutcome {
    Created,
    AlreadyPaid,
}

#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Claim `booking.seat_numbers` on `booking.trip_id` and insert the
    /// booking row in one atomic step; a rejected claim writes nothing.
    async fn create_booking(&self, booking: &Booking) -> Result<CreateBookingOutcome, RepoError>;

    async fn get_booking(&self, id: Uuid) -> Result<Option<Booking>, RepoError>;

    /// Conditional transition guarded by `BookingStatus::can_transition_to`.
    /// Moving to Confirmed stamps `confirmed_at`.
    async fn transition_status(
        &self,
        id: Uuid,
        target: BookingStatus,
    ) -> Result<TransitionOutcome, RepoError>;

    async fn list_office_bookings(&self, office_id: Uuid) -> Result<Vec<Booking>, RepoError>;

    /// Pending bookings created before `cutoff`, for the expiry sweep.
    async fn list_pending_older_than(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<Booking>, RepoError>;
}

#[async_trait]
pub trait PaymentRepository: Send + Sync {
    /// Insert a payment row unless the booking already has a Paid payment.
    /// The check and the insert share one critical section, so two racing
    /// instant-settle attempts cannot both persist a Paid row.
    async fn create_payment_unless_paid(
        &self,
        payment: &Payment,
    ) -> Result<CreatePaymentOutcome, RepoError>;

    async fn get_payment(&self, id: Uuid) -> Result<Option<Payment>, RepoError>;

    async fn list_booking_payments(&self, booking_id: Uuid) -> Result<Vec<Payment>, RepoError>;

    /// Mark a payment Paid with its transaction id and paid timestamp.
    async fn settle_payment(
        &self,
        id: Uuid,
        transaction_id: &str,
    ) -> Result<Option<Payment>, RepoError>;

    /// Mark a payment Failed (superseded or rejected attempts).
    async fn fail_payment(&self, id: Uuid) -> Result<(), RepoError>;
}
