use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use rihla_transit::repository::TripRepository;

use crate::models::{generate_reference, Booking, BookingStatus, MAX_SEATS_PER_BOOKING};
use crate::repository::{BookingRepository, CreateBookingOutcome};

#[derive(Debug, Clone)]
pub struct AllocationRequest {
    pub trip_id: Uuid,
    pub seat_numbers: Vec<String>,
    pub passenger_name: String,
    pub passenger_phone: String,
    pub passenger_email: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum AllocationError {
    #[error("trip not found: {0}")]
    TripNotFound(Uuid),

    #[error("unknown seats on this trip: {0:?}")]
    SeatNotFound(Vec<String>),

    /// The race loser's error: the caller should re-fetch seat state and let
    /// the passenger pick again.
    #[error("seats no longer available: {0:?}")]
    SeatUnavailable(Vec<String>),

    #[error("a booking must cover 1 to {MAX_SEATS_PER_BOOKING} seats, got {0}")]
    InvalidSeatCount(usize),

    #[error("trip is cancelled or already departed")]
    TripClosed,

    #[error("invalid passenger details: {0}")]
    Validation(String),

    #[error("store error: {0}")]
    Store(String),
}

/// The central state-transition operation: validates a seat-selection request
/// and hands the store a Pending booking whose seat claim, counter decrement
/// and row insert land in one atomic write.
pub struct BookingAllocator {
    trips: Arc<dyn TripRepository>,
    bookings: Arc<dyn BookingRepository>,
}

impl BookingAllocator {
    pub fn new(trips: Arc<dyn TripRepository>, bookings: Arc<dyn BookingRepository>) -> Self {
        Self { trips, bookings }
    }

    pub async fn allocate(&self, request: AllocationRequest) -> Result<Booking, AllocationError> {
        let seat_count = request.seat_numbers.len();
        if seat_count == 0 || seat_count > MAX_SEATS_PER_BOOKING {
            return Err(AllocationError::InvalidSeatCount(seat_count));
        }

        let distinct: HashSet<&str> = request.seat_numbers.iter().map(String::as_str).collect();
        if distinct.len() != seat_count {
            return Err(AllocationError::Validation(
                "duplicate seat numbers in request".to_string(),
            ));
        }

        if request.passenger_name.trim().is_empty() {
            return Err(AllocationError::Validation(
                "passenger name is required".to_string(),
            ));
        }
        if request.passenger_phone.trim().is_empty() {
            return Err(AllocationError::Validation(
                "passenger phone is required".to_string(),
            ));
        }

        let trip = self
            .trips
            .get_trip(request.trip_id)
            .await
            .map_err(|e| AllocationError::Store(e.to_string()))?
            .ok_or(AllocationError::TripNotFound(request.trip_id))?;

        if !trip.is_open(Utc::now().naive_utc()) {
            return Err(AllocationError::TripClosed);
        }

        let now = Utc::now();
        let booking = Booking {
            id: Uuid::new_v4(),
            trip_id: request.trip_id,
            office_id: trip.office_id,
            reference: generate_reference(),
            passenger_name: request.passenger_name.trim().to_string(),
            passenger_phone: request.passenger_phone.trim().to_string(),
            passenger_email: request.passenger_email,
            seat_numbers: request.seat_numbers.clone(),
            total_amount: trip.price * seat_count as i32,
            status: BookingStatus::Pending,
            created_at: now,
            confirmed_at: None,
            updated_at: now,
        };

        // The write is the atomic check-and-set: seat flips, counter
        // decrement and booking row land together, so a concurrent request
        // for an overlapping seat gets Unavailable rather than a partial
        // booking, and no seat ever points at a booking that does not exist.
        let booking = match self
            .bookings
            .create_booking(&booking)
            .await
            .map_err(|e| AllocationError::Store(e.to_string()))?
        {
            CreateBookingOutcome::Created(stored) => stored,
            CreateBookingOutcome::TripNotFound => {
                return Err(AllocationError::TripNotFound(request.trip_id))
            }
            CreateBookingOutcome::TripClosed => return Err(AllocationError::TripClosed),
            CreateBookingOutcome::UnknownSeats(seats) => {
                return Err(AllocationError::SeatNotFound(seats))
            }
            CreateBookingOutcome::Unavailable(seats) => {
                tracing::info!(trip_id = %request.trip_id, ?seats, "seat claim conflict");
                return Err(AllocationError::SeatUnavailable(seats));
            }
        };

        tracing::info!(
            booking_id = %booking.id,
            reference = %booking.reference,
            trip_id = %booking.trip_id,
            seats = seat_count,
            "booking allocated"
        );

        Ok(booking)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
    use rihla_transit::models::{AssemblyPoint, Bus, Route, Trip};
    use rihla_transit::repository::{
        CancelTripOutcome, CreateTripOutcome, NewTrip, ReleaseOutcome, RepoError, TripDetails,
    };
    use rihla_transit::SeatInventory;
    use std::sync::Mutex;

    struct StubTrips {
        trip: Option<Trip>,
    }

    #[async_trait]
    impl TripRepository for StubTrips {
        async fn create_assembly_point(&self, _point: &AssemblyPoint) -> Result<(), RepoError> {
            unimplemented!()
        }
        async fn create_bus(&self, _bus: &Bus) -> Result<(), RepoError> {
            unimplemented!()
        }
        async fn create_route(&self, _route: &Route) -> Result<(), RepoError> {
            unimplemented!()
        }
        async fn get_route(&self, _id: Uuid) -> Result<Option<Route>, RepoError> {
            unimplemented!()
        }
        async fn create_trip(&self, _new: NewTrip) -> Result<CreateTripOutcome, RepoError> {
            unimplemented!()
        }
        async fn get_trip(&self, _id: Uuid) -> Result<Option<Trip>, RepoError> {
            Ok(self.trip.clone())
        }
        async fn get_trip_details(&self, _id: Uuid) -> Result<Option<TripDetails>, RepoError> {
            unimplemented!()
        }
        async fn list_trips(&self) -> Result<Vec<Trip>, RepoError> {
            Ok(self.trip.clone().into_iter().collect())
        }
        async fn cancel_trip(&self, _id: Uuid) -> Result<CancelTripOutcome, RepoError> {
            unimplemented!()
        }
        async fn release_seats(
            &self,
            _trip_id: Uuid,
            _booking_id: Uuid,
        ) -> Result<ReleaseOutcome, RepoError> {
            unimplemented!()
        }
        async fn recount_available(
            &self,
            _trip_id: Uuid,
        ) -> Result<Option<(i32, i32)>, RepoError> {
            unimplemented!()
        }
    }

    struct StubBookings {
        created: Mutex<Vec<Booking>>,
        reject: Mutex<Option<CreateBookingOutcome>>,
        fail_create: bool,
    }

    #[async_trait]
    impl BookingRepository for StubBookings {
        async fn create_booking(&self, booking: &Booking) -> Result<CreateBookingOutcome, RepoError> {
            if self.fail_create {
                return Err("write failed".into());
            }
            if let Some(outcome) = self.reject.lock().unwrap().take() {
                return Ok(outcome);
            }
            self.created.lock().unwrap().push(booking.clone());
            Ok(CreateBookingOutcome::Created(booking.clone()))
        }
        async fn get_booking(&self, _id: Uuid) -> Result<Option<Booking>, RepoError> {
            Ok(None)
        }
        async fn transition_status(
            &self,
            _id: Uuid,
            _target: BookingStatus,
        ) -> Result<crate::repository::TransitionOutcome, RepoError> {
            unimplemented!()
        }
        async fn list_office_bookings(&self, _office_id: Uuid) -> Result<Vec<Booking>, RepoError> {
            Ok(vec![])
        }
        async fn list_pending_older_than(
            &self,
            _cutoff: DateTime<Utc>,
        ) -> Result<Vec<Booking>, RepoError> {
            Ok(vec![])
        }
    }

    fn open_trip() -> Trip {
        let departure = (Utc::now() + Duration::days(2)).date_naive();
        Trip {
            id: Uuid::new_v4(),
            office_id: Uuid::new_v4(),
            route_id: Uuid::new_v4(),
            bus_id: Uuid::new_v4(),
            departure_date: departure,
            departure_time: NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
            arrival_time: NaiveTime::from_hms_opt(14, 0, 0).unwrap(),
            price: 4000,
            inventory: SeatInventory::new(45),
            cancelled: false,
            created_at: Utc::now(),
        }
    }

    fn request(trip_id: Uuid, seats: &[&str]) -> AllocationRequest {
        AllocationRequest {
            trip_id,
            seat_numbers: seats.iter().map(|s| s.to_string()).collect(),
            passenger_name: "Mohammed Ali".to_string(),
            passenger_phone: "0912345678".to_string(),
            passenger_email: None,
        }
    }

    fn allocator(
        trip: Option<Trip>,
        reject: Option<CreateBookingOutcome>,
        fail_create: bool,
    ) -> (BookingAllocator, Arc<StubBookings>) {
        let trips = Arc::new(StubTrips { trip });
        let bookings = Arc::new(StubBookings {
            created: Mutex::new(vec![]),
            reject: Mutex::new(reject),
            fail_create,
        });
        (BookingAllocator::new(trips, bookings.clone()), bookings)
    }

    #[tokio::test]
    async fn test_rejects_zero_and_six_seats() {
        let trip = open_trip();
        let (alloc, _) = allocator(Some(trip.clone()), None, false);

        let err = alloc.allocate(request(trip.id, &[])).await.unwrap_err();
        assert!(matches!(err, AllocationError::InvalidSeatCount(0)));

        let err = alloc
            .allocate(request(trip.id, &["A1", "A2", "A3", "A4", "B1", "B2"]))
            .await
            .unwrap_err();
        assert!(matches!(err, AllocationError::InvalidSeatCount(6)));
    }

    #[tokio::test]
    async fn test_rejects_duplicate_seats_and_blank_passenger() {
        let trip = open_trip();
        let (alloc, _) = allocator(Some(trip.clone()), None, false);

        let err = alloc
            .allocate(request(trip.id, &["A1", "A1"]))
            .await
            .unwrap_err();
        assert!(matches!(err, AllocationError::Validation(_)));

        let mut req = request(trip.id, &["A1"]);
        req.passenger_name = "   ".to_string();
        let err = alloc.allocate(req).await.unwrap_err();
        assert!(matches!(err, AllocationError::Validation(_)));
    }

    #[tokio::test]
    async fn test_closed_trip_rejected_before_claim() {
        let mut trip = open_trip();
        trip.cancelled = true;
        let (alloc, _) = allocator(Some(trip.clone()), None, false);

        let err = alloc.allocate(request(trip.id, &["A1"])).await.unwrap_err();
        assert!(matches!(err, AllocationError::TripClosed));
    }

    #[tokio::test]
    async fn test_successful_allocation_prices_booking() {
        let trip = open_trip();
        let (alloc, bookings) = allocator(Some(trip.clone()), None, false);

        let booking = alloc
            .allocate(request(trip.id, &["A1", "A2"]))
            .await
            .unwrap();

        assert_eq!(booking.total_amount, 8000);
        assert_eq!(booking.status, BookingStatus::Pending);
        assert!(booking.reference.starts_with("RHL-"));
        assert_eq!(bookings.created.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_claim_conflict_maps_to_seat_unavailable() {
        let trip = open_trip();
        let (alloc, bookings) = allocator(
            Some(trip.clone()),
            Some(CreateBookingOutcome::Unavailable(vec!["A2".to_string()])),
            false,
        );

        let err = alloc
            .allocate(request(trip.id, &["A1", "A2"]))
            .await
            .unwrap_err();
        assert!(matches!(err, AllocationError::SeatUnavailable(seats) if seats == ["A2"]));
        assert!(bookings.created.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_store_write_failure_surfaces_as_store_error() {
        let trip = open_trip();
        let (alloc, bookings) = allocator(Some(trip.clone()), None, true);

        let err = alloc.allocate(request(trip.id, &["A1"])).await.unwrap_err();
        assert!(matches!(err, AllocationError::Store(_)));
        assert!(bookings.created.lock().unwrap().is_empty());
    }
}
