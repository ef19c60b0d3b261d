use std::sync::Arc;

use chrono::{Duration, Utc};
use tokio::sync::broadcast;

use rihla_core::identity::OperatorIdentity;
use rihla_shared::models::events::{BookingCancelledEvent, BookingEvent, CANCELLED_BY_EXPIRY};
use rihla_transit::repository::TripRepository;

use crate::lifecycle::{LifecycleError, LifecycleManager};
use crate::repository::BookingRepository;

/// Cancels Pending bookings that never received a payment within the
/// configured window, releasing their seats so abandoned carts cannot hold
/// inventory indefinitely. Each expiry is announced on the event channel the
/// same way an operator cancellation is.
pub struct ExpirySweeper {
    bookings: Arc<dyn BookingRepository>,
    trips: Arc<dyn TripRepository>,
    lifecycle: Arc<LifecycleManager>,
    events: broadcast::Sender<BookingEvent>,
    ttl: Duration,
}

impl ExpirySweeper {
    pub fn new(
        bookings: Arc<dyn BookingRepository>,
        trips: Arc<dyn TripRepository>,
        lifecycle: Arc<LifecycleManager>,
        events: broadcast::Sender<BookingEvent>,
        ttl_seconds: u64,
    ) -> Self {
        Self {
            bookings,
            trips,
            lifecycle,
            events,
            ttl: Duration::seconds(ttl_seconds as i64),
        }
    }

    /// Cancel every Pending booking older than the TTL. Returns how many
    /// bookings were expired. Uses the same cancel transition and seat
    /// release path as an operator cancellation, under the System identity.
    pub async fn sweep(&self) -> usize {
        let cutoff = Utc::now() - self.ttl;
        let stale = match self.bookings.list_pending_older_than(cutoff).await {
            Ok(list) => list,
            Err(e) => {
                tracing::error!("expiry sweep could not list stale bookings: {}", e);
                return 0;
            }
        };

        let system = OperatorIdentity::system();
        let mut expired = 0;
        for booking in stale {
            match self.lifecycle.cancel(booking.id, &system).await {
                Ok(cancelled) => {
                    tracing::info!(
                        booking_id = %cancelled.id,
                        reference = %cancelled.reference,
                        "expired pending booking"
                    );
                    let _ = self
                        .events
                        .send(BookingEvent::Cancelled(BookingCancelledEvent {
                            booking_id: cancelled.id,
                            trip_id: cancelled.trip_id,
                            released_seats: cancelled.seat_numbers.len(),
                            cancelled_by: CANCELLED_BY_EXPIRY.to_string(),
                            timestamp: Utc::now().timestamp(),
                        }));
                    expired += 1;
                }
                // A payment or confirm slipped in between the listing and
                // the cancel; the booking is no longer stale.
                Err(LifecycleError::InvalidTransition { .. }) => {}
                Err(e) => {
                    tracing::error!(booking_id = %booking.id, "expiry cancel failed: {}", e);
                }
            }
        }

        expired
    }

    /// Recount seat availability for every trip and log drift between the
    /// cached counter and the seat rows. Returns the number of mismatches.
    pub async fn verify_counters(&self) -> usize {
        let trips = match self.trips.list_trips().await {
            Ok(list) => list,
            Err(e) => {
                tracing::error!("counter check could not list trips: {}", e);
                return 0;
            }
        };

        let mut mismatches = 0;
        for trip in trips {
            match self.trips.recount_available(trip.id).await {
                Ok(Some((cached, counted))) if cached != counted => {
                    tracing::warn!(
                        trip_id = %trip.id,
                        cached,
                        counted,
                        "availability counter drift detected"
                    );
                    mismatches += 1;
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::error!(trip_id = %trip.id, "recount failed: {}", e);
                }
            }
        }

        mismatches
    }
}
