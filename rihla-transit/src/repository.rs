use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use uuid::Uuid;

use crate::models::{AssemblyPoint, Bus, Route, Seat, Trip};

pub type RepoError = Box<dyn std::error::Error + Send + Sync>;

/// Input for trip creation. Arrival time and the seat map are derived by the
/// store from the referenced route and bus.
#[derive(Debug, Clone)]
pub struct NewTrip {
    pub office_id: Uuid,
    pub route_id: Uuid,
    pub bus_id: Uuid,
    pub departure_date: NaiveDate,
    pub departure_time: NaiveTime,
    /// Per-trip price; falls back to the route's base price when None.
    pub price: Option<i32>,
}

#[derive(Debug)]
pub enum CreateTripOutcome {
    Created(Trip),
    RouteNotFound,
    BusNotFound,
    BusInactive,
    /// Route or bus belongs to a different office than the trip.
    ForeignOffice,
}

#[derive(Debug)]
pub enum CancelTripOutcome {
    Cancelled(Trip),
    NotFound,
    /// Trips can only be cancelled up until departure.
    Departed,
}

#[derive(Debug)]
pub enum ReleaseOutcome {
    /// Number of seats returned to Available.
    Released(usize),
    TripNotFound,
}

/// Trip detail view: the trip plus its collaborators, as one read.
#[derive(Debug, Clone, serde::Serialize)]
pub struct TripDetails {
    pub trip: Trip,
    pub route: Route,
    pub origin: AssemblyPoint,
    pub destination: AssemblyPoint,
    pub bus: Bus,
    pub seats: Vec<Seat>,
}

#[async_trait]
pub trait TripRepository: Send + Sync {
    async fn create_assembly_point(&self, point: &AssemblyPoint) -> Result<(), RepoError>;

    async fn create_bus(&self, bus: &Bus) -> Result<(), RepoError>;

    async fn create_route(&self, route: &Route) -> Result<(), RepoError>;

    async fn get_route(&self, id: Uuid) -> Result<Option<Route>, RepoError>;

    async fn create_trip(&self, new: NewTrip) -> Result<CreateTripOutcome, RepoError>;

    async fn get_trip(&self, id: Uuid) -> Result<Option<Trip>, RepoError>;

    async fn get_trip_details(&self, id: Uuid) -> Result<Option<TripDetails>, RepoError>;

    async fn list_trips(&self) -> Result<Vec<Trip>, RepoError>;

    /// Soft-cancel: the trip keeps its seats and bookings but stops
    /// accepting new allocations.
    async fn cancel_trip(&self, id: Uuid) -> Result<CancelTripOutcome, RepoError>;

    /// Revert every seat held by `booking_id` to Available and give the
    /// count back to the availability counter (clamped at the trip total).
    async fn release_seats(
        &self,
        trip_id: Uuid,
        booking_id: Uuid,
    ) -> Result<ReleaseOutcome, RepoError>;

    /// Recount seats with status Available for a trip. Returns
    /// (cached counter, recounted) for consistency checks.
    async fn recount_available(&self, trip_id: Uuid) -> Result<Option<(i32, i32)>, RepoError>;
}
