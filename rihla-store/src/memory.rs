use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use rihla_booking::models::{generate_reference, Booking, BookingStatus, Payment, PaymentStatus};
use rihla_booking::repository::{
    BookingRepository, CreateBookingOutcome, CreatePaymentOutcome, PaymentRepository,
    TransitionOutcome,
};
use rihla_transit::models::{AssemblyPoint, Bus, Route, Seat, SeatStatus, Trip};
use rihla_transit::repository::{
    CancelTripOutcome, CreateTripOutcome, NewTrip, ReleaseOutcome, RepoError, TripDetails,
    TripRepository,
};
use rihla_transit::seatmap::generate_seat_layout;
use rihla_transit::SeatInventory;

/// One trip together with its own seat-state copy. Seats are keyed by label
/// for O(log n) lookup and stable iteration order.
struct TripRecord {
    trip: Trip,
    seats: BTreeMap<String, Seat>,
}

#[derive(Default)]
struct StoreInner {
    assembly_points: HashMap<Uuid, AssemblyPoint>,
    buses: HashMap<Uuid, Bus>,
    routes: HashMap<Uuid, Route>,
    trips: HashMap<Uuid, TripRecord>,
    bookings: HashMap<Uuid, Booking>,
    payments: HashMap<Uuid, Payment>,
}

/// In-memory persistence collaborator. One lock guards all aggregates, so the
/// seat compare-and-swap, the availability counter and booking status
/// transitions each happen in a single critical section; partial updates are
/// impossible.
pub struct MemoryStore {
    inner: RwLock<StoreInner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(StoreInner::default()),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TripRepository for MemoryStore {
    async fn create_assembly_point(&self, point: &AssemblyPoint) -> Result<(), RepoError> {
        let mut inner = self.inner.write().await;
        inner.assembly_points.insert(point.id, point.clone());
        Ok(())
    }

    async fn create_bus(&self, bus: &Bus) -> Result<(), RepoError> {
        let mut inner = self.inner.write().await;
        inner.buses.insert(bus.id, bus.clone());
        Ok(())
    }

    async fn create_route(&self, route: &Route) -> Result<(), RepoError> {
        let mut inner = self.inner.write().await;
        if !inner.assembly_points.contains_key(&route.origin_id)
            || !inner.assembly_points.contains_key(&route.destination_id)
        {
            return Err("route references unknown assembly points".into());
        }
        inner.routes.insert(route.id, route.clone());
        Ok(())
    }

    async fn get_route(&self, id: Uuid) -> Result<Option<Route>, RepoError> {
        let inner = self.inner.read().await;
        Ok(inner.routes.get(&id).cloned())
    }

    async fn create_trip(&self, new: NewTrip) -> Result<CreateTripOutcome, RepoError> {
        let mut inner = self.inner.write().await;

        let Some(route) = inner.routes.get(&new.route_id).cloned() else {
            return Ok(CreateTripOutcome::RouteNotFound);
        };
        let Some(bus) = inner.buses.get(&new.bus_id).cloned() else {
            return Ok(CreateTripOutcome::BusNotFound);
        };
        if !bus.active {
            return Ok(CreateTripOutcome::BusInactive);
        }
        if route.office_id != new.office_id || bus.office_id != new.office_id {
            return Ok(CreateTripOutcome::ForeignOffice);
        }

        // Materialize the trip's own seat copy from the bus layout.
        let layout = generate_seat_layout(bus.capacity as i64)?;
        let mut seats = BTreeMap::new();
        for (row, col, label) in layout.positions() {
            seats.insert(label.to_string(), Seat::new(label, row, col));
        }

        let trip = Trip {
            id: Uuid::new_v4(),
            office_id: new.office_id,
            route_id: new.route_id,
            bus_id: new.bus_id,
            departure_date: new.departure_date,
            departure_time: new.departure_time,
            arrival_time: Trip::arrival_for(new.departure_time, route.duration_minutes),
            price: new.price.unwrap_or(route.base_price),
            inventory: SeatInventory::new(seats.len() as i32),
            cancelled: false,
            created_at: Utc::now(),
        };

        inner.trips.insert(
            trip.id,
            TripRecord {
                trip: trip.clone(),
                seats,
            },
        );

        tracing::info!(trip_id = %trip.id, seats = trip.inventory.total(), "trip created");
        Ok(CreateTripOutcome::Created(trip))
    }

    async fn get_trip(&self, id: Uuid) -> Result<Option<Trip>, RepoError> {
        let inner = self.inner.read().await;
        Ok(inner.trips.get(&id).map(|record| record.trip.clone()))
    }

    async fn get_trip_details(&self, id: Uuid) -> Result<Option<TripDetails>, RepoError> {
        let inner = self.inner.read().await;
        let Some(record) = inner.trips.get(&id) else {
            return Ok(None);
        };

        let route = inner
            .routes
            .get(&record.trip.route_id)
            .cloned()
            .ok_or("trip references unknown route")?;
        let origin = inner
            .assembly_points
            .get(&route.origin_id)
            .cloned()
            .ok_or("route references unknown origin")?;
        let destination = inner
            .assembly_points
            .get(&route.destination_id)
            .cloned()
            .ok_or("route references unknown destination")?;
        let bus = inner
            .buses
            .get(&record.trip.bus_id)
            .cloned()
            .ok_or("trip references unknown bus")?;

        Ok(Some(TripDetails {
            trip: record.trip.clone(),
            route,
            origin,
            destination,
            bus,
            seats: record.seats.values().cloned().collect(),
        }))
    }

    async fn list_trips(&self) -> Result<Vec<Trip>, RepoError> {
        let inner = self.inner.read().await;
        let mut trips: Vec<Trip> = inner
            .trips
            .values()
            .map(|record| record.trip.clone())
            .collect();
        trips.sort_by_key(|t| (t.departure_date, t.departure_time));
        Ok(trips)
    }

    async fn cancel_trip(&self, id: Uuid) -> Result<CancelTripOutcome, RepoError> {
        let mut inner = self.inner.write().await;
        let Some(record) = inner.trips.get_mut(&id) else {
            return Ok(CancelTripOutcome::NotFound);
        };
        if record.trip.has_departed(Utc::now().naive_utc()) {
            return Ok(CancelTripOutcome::Departed);
        }
        record.trip.cancelled = true;
        Ok(CancelTripOutcome::Cancelled(record.trip.clone()))
    }

    async fn release_seats(
        &self,
        trip_id: Uuid,
        booking_id: Uuid,
    ) -> Result<ReleaseOutcome, RepoError> {
        let mut inner = self.inner.write().await;
        let Some(record) = inner.trips.get_mut(&trip_id) else {
            return Ok(ReleaseOutcome::TripNotFound);
        };

        let mut released = 0;
        for seat in record.seats.values_mut() {
            if seat.booking_id == Some(booking_id) {
                seat.status = SeatStatus::Available;
                seat.booking_id = None;
                released += 1;
            }
        }
        if released > 0 {
            record.trip.inventory.release(released as i32)?;
        }

        Ok(ReleaseOutcome::Released(released))
    }

    async fn recount_available(&self, trip_id: Uuid) -> Result<Option<(i32, i32)>, RepoError> {
        let inner = self.inner.read().await;
        Ok(inner.trips.get(&trip_id).map(|record| {
            let counted = record.seats.values().filter(|s| s.is_available()).count() as i32;
            (record.trip.inventory.available(), counted)
        }))
    }
}

#[async_trait]
impl BookingRepository for MemoryStore {
    async fn create_booking(&self, booking: &Booking) -> Result<CreateBookingOutcome, RepoError> {
        let mut inner = self.inner.write().await;
        let Some(record) = inner.trips.get_mut(&booking.trip_id) else {
            return Ok(CreateBookingOutcome::TripNotFound);
        };

        // Re-validated under the lock: the caller's earlier read is stale by
        // definition.
        if !record.trip.is_open(Utc::now().naive_utc()) {
            return Ok(CreateBookingOutcome::TripClosed);
        }

        let unknown: Vec<String> = booking
            .seat_numbers
            .iter()
            .filter(|n| !record.seats.contains_key(*n))
            .cloned()
            .collect();
        if !unknown.is_empty() {
            return Ok(CreateBookingOutcome::UnknownSeats(unknown));
        }

        let taken: Vec<String> = booking
            .seat_numbers
            .iter()
            .filter(|n| !record.seats[*n].is_available())
            .cloned()
            .collect();
        if !taken.is_empty() {
            return Ok(CreateBookingOutcome::Unavailable(taken));
        }

        // All requested seats are Available, so the counter must cover them.
        // Seat flips, counter decrement and the row insert share this one
        // critical section; no reader can observe a seat pointing at a
        // booking that does not exist yet.
        record.trip.inventory.allocate(booking.seat_numbers.len() as i32)?;
        for number in &booking.seat_numbers {
            let seat = record.seats.get_mut(number).ok_or("seat vanished")?;
            seat.status = SeatStatus::Booked;
            seat.booking_id = Some(booking.id);
        }

        let mut booking = booking.clone();
        while inner.bookings.values().any(|b| b.reference == booking.reference) {
            booking.reference = generate_reference();
        }
        inner.bookings.insert(booking.id, booking.clone());
        Ok(CreateBookingOutcome::Created(booking))
    }

    async fn get_booking(&self, id: Uuid) -> Result<Option<Booking>, RepoError> {
        let inner = self.inner.read().await;
        Ok(inner.bookings.get(&id).cloned())
    }

    async fn transition_status(
        &self,
        id: Uuid,
        target: BookingStatus,
    ) -> Result<TransitionOutcome, RepoError> {
        let mut inner = self.inner.write().await;
        let Some(booking) = inner.bookings.get_mut(&id) else {
            return Ok(TransitionOutcome::NotFound);
        };

        if !booking.status.can_transition_to(target) {
            return Ok(TransitionOutcome::Invalid {
                from: booking.status,
            });
        }

        booking.status = target;
        booking.updated_at = Utc::now();
        if target == BookingStatus::Confirmed && booking.confirmed_at.is_none() {
            booking.confirmed_at = Some(Utc::now());
        }

        Ok(TransitionOutcome::Done(booking.clone()))
    }

    async fn list_office_bookings(&self, office_id: Uuid) -> Result<Vec<Booking>, RepoError> {
        let inner = self.inner.read().await;
        let mut bookings: Vec<Booking> = inner
            .bookings
            .values()
            .filter(|b| b.office_id == office_id)
            .cloned()
            .collect();
        bookings.sort_by_key(|b| std::cmp::Reverse(b.created_at));
        Ok(bookings)
    }

    async fn list_pending_older_than(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<Booking>, RepoError> {
        let inner = self.inner.read().await;
        Ok(inner
            .bookings
            .values()
            .filter(|b| b.status == BookingStatus::Pending && b.created_at <= cutoff)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl PaymentRepository for MemoryStore {
    async fn create_payment_unless_paid(
        &self,
        payment: &Payment,
    ) -> Result<CreatePaymentOutcome, RepoError> {
        let mut inner = self.inner.write().await;
        // Paid-exclusivity is checked in the same critical section as the
        // insert, so two racing instant-settle attempts serialize here and
        // the loser cannot write a second Paid row.
        let already_paid = inner
            .payments
            .values()
            .any(|p| p.booking_id == payment.booking_id && p.status == PaymentStatus::Paid);
        if already_paid {
            return Ok(CreatePaymentOutcome::AlreadyPaid);
        }
        inner.payments.insert(payment.id, payment.clone());
        Ok(CreatePaymentOutcome::Created)
    }

    async fn get_payment(&self, id: Uuid) -> Result<Option<Payment>, RepoError> {
        let inner = self.inner.read().await;
        Ok(inner.payments.get(&id).cloned())
    }

    async fn list_booking_payments(&self, booking_id: Uuid) -> Result<Vec<Payment>, RepoError> {
        let inner = self.inner.read().await;
        let mut payments: Vec<Payment> = inner
            .payments
            .values()
            .filter(|p| p.booking_id == booking_id)
            .cloned()
            .collect();
        payments.sort_by_key(|p| p.created_at);
        Ok(payments)
    }

    async fn settle_payment(
        &self,
        id: Uuid,
        transaction_id: &str,
    ) -> Result<Option<Payment>, RepoError> {
        let mut inner = self.inner.write().await;
        let Some(payment) = inner.payments.get_mut(&id) else {
            return Ok(None);
        };
        payment.status = PaymentStatus::Paid;
        payment.transaction_id = Some(transaction_id.to_string());
        payment.paid_at = Some(Utc::now());
        Ok(Some(payment.clone()))
    }

    async fn fail_payment(&self, id: Uuid) -> Result<(), RepoError> {
        let mut inner = self.inner.write().await;
        if let Some(payment) = inner.payments.get_mut(&id) {
            payment.status = PaymentStatus::Failed;
        }
        Ok(())
    }
}
