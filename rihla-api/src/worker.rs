use std::sync::Arc;
use std::time::Duration;

use rihla_booking::expiry::ExpirySweeper;
use rihla_shared::models::events::BookingEvent;

use crate::state::AppState;

/// Periodic expiry sweep: cancels stale Pending bookings and audits the
/// availability counters. Runs for the lifetime of the process.
pub fn start_expiry_worker(state: AppState, ttl_seconds: u64, interval_seconds: u64) {
    let sweeper = Arc::new(ExpirySweeper::new(
        state.bookings.clone(),
        state.trips.clone(),
        state.lifecycle.clone(),
        state.events.clone(),
        ttl_seconds,
    ));

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(interval_seconds));
        loop {
            ticker.tick().await;
            let expired = sweeper.sweep().await;
            if expired > 0 {
                tracing::info!(expired, "expiry sweep released stale bookings");
            }
            let drift = sweeper.verify_counters().await;
            if drift > 0 {
                tracing::warn!(drift, "availability counters out of sync");
            }
        }
    });
}

/// Drains the in-process event channel into the log. Stands in for a real
/// downstream consumer (notifications, analytics).
pub fn start_event_logger(state: AppState) {
    let mut receiver = state.events.subscribe();
    tokio::spawn(async move {
        loop {
            match receiver.recv().await {
                Ok(BookingEvent::Created(event)) => {
                    tracing::info!(
                        booking_id = %event.booking_id,
                        reference = %event.reference,
                        seats = event.seat_numbers.len(),
                        total = event.total_amount,
                        "event: booking created"
                    );
                }
                Ok(BookingEvent::Cancelled(event)) => {
                    tracing::info!(
                        booking_id = %event.booking_id,
                        released = event.released_seats,
                        by = %event.cancelled_by,
                        "event: booking cancelled"
                    );
                }
                Ok(BookingEvent::PaymentRecorded(event)) => {
                    tracing::info!(
                        payment_id = %event.payment_id,
                        booking_id = %event.booking_id,
                        amount = event.amount,
                        status = %event.status,
                        "event: payment recorded"
                    );
                }
                Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "event logger lagged, events dropped");
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    });
}
