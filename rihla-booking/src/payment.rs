use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use rihla_core::identity::{authorize_office, OperatorIdentity};
use rihla_core::CoreError;

use crate::lifecycle::{LifecycleError, LifecycleManager};
use crate::models::{
    generate_transaction_id, Booking, BookingStatus, Payment, PaymentMethod, PaymentStatus,
};
use crate::repository::{BookingRepository, CreatePaymentOutcome, PaymentRepository};

#[derive(Debug, thiserror::Error)]
pub enum PaymentError {
    #[error("booking not found: {0}")]
    BookingNotFound(Uuid),

    #[error("payment not found: {0}")]
    PaymentNotFound(Uuid),

    #[error("booking already has a paid payment")]
    AlreadyPaid,

    #[error("booking is {0:?} and can no longer take payment")]
    BookingClosed(BookingStatus),

    #[error("invalid payment request: {0}")]
    Validation(String),

    #[error("not authorized")]
    Unauthorized,

    #[error("store error: {0}")]
    Store(String),
}

impl From<CoreError> for PaymentError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Unauthorized => PaymentError::Unauthorized,
            other => PaymentError::Store(other.to_string()),
        }
    }
}

/// Records payment attempts against bookings and reconciles booking status
/// when a payment settles. There is no real gateway: MobileMoney and
/// CreditCard settle on record, cash and bank transfer wait for an operator
/// to settle them offline.
pub struct PaymentProcessor {
    bookings: Arc<dyn BookingRepository>,
    payments: Arc<dyn PaymentRepository>,
    lifecycle: Arc<LifecycleManager>,
}

impl PaymentProcessor {
    pub fn new(
        bookings: Arc<dyn BookingRepository>,
        payments: Arc<dyn PaymentRepository>,
        lifecycle: Arc<LifecycleManager>,
    ) -> Self {
        Self {
            bookings,
            payments,
            lifecycle,
        }
    }

    pub async fn record_payment(
        &self,
        booking_id: Uuid,
        method: PaymentMethod,
        mobile_money_number: Option<String>,
    ) -> Result<Payment, PaymentError> {
        let booking = self.fetch_open_booking(booking_id).await?;

        if method == PaymentMethod::MobileMoney
            && mobile_money_number
                .as_deref()
                .map(str::trim)
                .unwrap_or("")
                .is_empty()
        {
            return Err(PaymentError::Validation(
                "mobile money number is required for this method".to_string(),
            ));
        }

        // Payment is 1:N with its booking: a Paid row blocks new attempts,
        // a stale Pending (offline) row is superseded by the new attempt.
        for existing in self
            .payments
            .list_booking_payments(booking_id)
            .await
            .map_err(|e| PaymentError::Store(e.to_string()))?
        {
            match existing.status {
                PaymentStatus::Paid => return Err(PaymentError::AlreadyPaid),
                PaymentStatus::Pending => {
                    tracing::info!(
                        payment_id = %existing.id,
                        booking_id = %booking_id,
                        "superseding pending payment attempt"
                    );
                    self.payments
                        .fail_payment(existing.id)
                        .await
                        .map_err(|e| PaymentError::Store(e.to_string()))?;
                }
                PaymentStatus::Failed => {}
            }
        }

        let settles_now = method.settles_immediately();
        let payment = Payment {
            id: Uuid::new_v4(),
            booking_id,
            // Amount is never caller-supplied: always the booking total.
            amount: booking.total_amount,
            method,
            status: if settles_now {
                PaymentStatus::Paid
            } else {
                PaymentStatus::Pending
            },
            mobile_money_number,
            transaction_id: settles_now.then(generate_transaction_id),
            paid_at: settles_now.then(Utc::now),
            created_at: Utc::now(),
        };

        // The store re-checks Paid-exclusivity inside its own critical
        // section: the scan above is only a fast path and two racing
        // instant-settle attempts are serialized here.
        match self
            .payments
            .create_payment_unless_paid(&payment)
            .await
            .map_err(|e| PaymentError::Store(e.to_string()))?
        {
            CreatePaymentOutcome::Created => {}
            CreatePaymentOutcome::AlreadyPaid => return Err(PaymentError::AlreadyPaid),
        }

        if settles_now {
            self.confirm_booking(&booking).await?;
        }

        Ok(payment)
    }

    /// Operator confirmation of an offline (cash / bank transfer) payment.
    pub async fn settle_payment(
        &self,
        payment_id: Uuid,
        operator: &OperatorIdentity,
    ) -> Result<Payment, PaymentError> {
        let payment = self
            .payments
            .get_payment(payment_id)
            .await
            .map_err(|e| PaymentError::Store(e.to_string()))?
            .ok_or(PaymentError::PaymentNotFound(payment_id))?;

        let booking = self.fetch_open_booking(payment.booking_id).await?;
        authorize_office(operator, booking.office_id)?;

        match payment.status {
            PaymentStatus::Paid => return Err(PaymentError::AlreadyPaid),
            PaymentStatus::Failed => {
                return Err(PaymentError::Validation(
                    "a failed payment cannot be settled; record a new attempt".to_string(),
                ))
            }
            PaymentStatus::Pending => {}
        }

        let settled = self
            .payments
            .settle_payment(payment_id, &generate_transaction_id())
            .await
            .map_err(|e| PaymentError::Store(e.to_string()))?
            .ok_or(PaymentError::PaymentNotFound(payment_id))?;

        self.confirm_booking(&booking).await?;

        Ok(settled)
    }

    async fn fetch_open_booking(&self, booking_id: Uuid) -> Result<Booking, PaymentError> {
        let booking = self
            .bookings
            .get_booking(booking_id)
            .await
            .map_err(|e| PaymentError::Store(e.to_string()))?
            .ok_or(PaymentError::BookingNotFound(booking_id))?;

        if booking.status.is_terminal() {
            return Err(PaymentError::BookingClosed(booking.status));
        }

        Ok(booking)
    }

    /// Payment-triggered confirmation goes through the same transition rules
    /// as a manual operator confirm; a booking that is already Confirmed
    /// (manual confirm raced or preceded payment) is left as-is.
    async fn confirm_booking(&self, booking: &Booking) -> Result<(), PaymentError> {
        if booking.status != BookingStatus::Pending {
            return Ok(());
        }

        match self
            .lifecycle
            .transition(booking.id, &OperatorIdentity::system(), BookingStatus::Confirmed)
            .await
        {
            Ok(_) => Ok(()),
            // Lost a race against another confirm; the booking ended up
            // Confirmed anyway.
            Err(LifecycleError::InvalidTransition {
                from: BookingStatus::Confirmed,
                ..
            }) => Ok(()),
            Err(e) => Err(PaymentError::Store(e.to_string())),
        }
    }
}
