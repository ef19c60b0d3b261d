use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use rihla_core::identity::authorize_office;
use rihla_transit::models::Trip;
use rihla_transit::repository::{CancelTripOutcome, CreateTripOutcome, NewTrip, TripDetails};
use rihla_transit::seatmap::{generate_seat_layout, SeatLayout};

use crate::error::AppError;
use crate::middleware::auth::OperatorClaims;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SeatLayoutQuery {
    pub capacity: i64,
}

#[derive(Debug, Deserialize)]
pub struct CreateTripRequest {
    pub route_id: Uuid,
    pub bus_id: Uuid,
    pub departure_date: NaiveDate,
    pub departure_time: NaiveTime,
    /// Per-trip override; route base price applies when omitted.
    pub price: Option<i32>,
}

#[derive(Debug, Serialize)]
pub struct TripSummary {
    pub id: Uuid,
    pub route_id: Uuid,
    pub bus_id: Uuid,
    pub departure_date: NaiveDate,
    pub departure_time: NaiveTime,
    pub arrival_time: NaiveTime,
    pub price: i32,
    pub available_seats: i32,
    pub total_seats: i32,
    pub cancelled: bool,
}

impl From<Trip> for TripSummary {
    fn from(trip: Trip) -> Self {
        Self {
            id: trip.id,
            route_id: trip.route_id,
            bus_id: trip.bus_id,
            departure_date: trip.departure_date,
            departure_time: trip.departure_time,
            arrival_time: trip.arrival_time,
            price: trip.price,
            // The cached counter is the authoritative read-path value;
            // listings never recount seat rows.
            available_seats: trip.inventory.available(),
            total_seats: trip.inventory.total(),
            cancelled: trip.cancelled,
        }
    }
}

/// GET /v1/seat-layout?capacity=45
/// Preview the deterministic seat grid for a capacity.
pub async fn seat_layout(
    Query(query): Query<SeatLayoutQuery>,
) -> Result<Json<SeatLayout>, AppError> {
    let layout =
        generate_seat_layout(query.capacity).map_err(|e| AppError::BadRequest(e.to_string()))?;
    Ok(Json(layout))
}

/// POST /v1/trips
/// Schedule a departure; seats are materialized from the bus layout.
pub async fn create_trip(
    State(state): State<AppState>,
    Extension(claims): Extension<OperatorClaims>,
    Json(req): Json<CreateTripRequest>,
) -> Result<Json<TripSummary>, AppError> {
    if let Some(price) = req.price {
        if price <= 0 {
            return Err(AppError::BadRequest("price must be positive".to_string()));
        }
    }

    let outcome = state
        .trips
        .create_trip(NewTrip {
            office_id: claims.office_id,
            route_id: req.route_id,
            bus_id: req.bus_id,
            departure_date: req.departure_date,
            departure_time: req.departure_time,
            price: req.price,
        })
        .await
        .map_err(AppError::internal)?;

    match outcome {
        CreateTripOutcome::Created(trip) => Ok(Json(trip.into())),
        CreateTripOutcome::RouteNotFound => {
            Err(AppError::NotFound("route not found".to_string()))
        }
        CreateTripOutcome::BusNotFound => Err(AppError::NotFound("bus not found".to_string())),
        CreateTripOutcome::BusInactive => {
            Err(AppError::BadRequest("bus is deactivated".to_string()))
        }
        CreateTripOutcome::ForeignOffice => Err(AppError::Forbidden),
    }
}

/// GET /v1/trips
pub async fn list_trips(
    State(state): State<AppState>,
) -> Result<Json<Vec<TripSummary>>, AppError> {
    let trips = state.trips.list_trips().await.map_err(AppError::internal)?;
    Ok(Json(trips.into_iter().map(TripSummary::from).collect()))
}

/// GET /v1/trips/:id
/// Trip with its route, assembly points, bus and full seat state.
pub async fn get_trip(
    State(state): State<AppState>,
    Path(trip_id): Path<Uuid>,
) -> Result<Json<TripDetails>, AppError> {
    let details = state
        .trips
        .get_trip_details(trip_id)
        .await
        .map_err(AppError::internal)?
        .ok_or_else(|| AppError::NotFound(format!("trip not found: {}", trip_id)))?;
    Ok(Json(details))
}

/// POST /v1/trips/:id/cancel
/// Soft-cancel a trip; existing bookings keep their seats.
pub async fn cancel_trip(
    State(state): State<AppState>,
    Extension(claims): Extension<OperatorClaims>,
    Path(trip_id): Path<Uuid>,
) -> Result<Json<TripSummary>, AppError> {
    let trip = state
        .trips
        .get_trip(trip_id)
        .await
        .map_err(AppError::internal)?
        .ok_or_else(|| AppError::NotFound(format!("trip not found: {}", trip_id)))?;

    authorize_office(&claims.identity(), trip.office_id)?;

    match state
        .trips
        .cancel_trip(trip_id)
        .await
        .map_err(AppError::internal)?
    {
        CancelTripOutcome::Cancelled(trip) => Ok(Json(trip.into())),
        CancelTripOutcome::NotFound => {
            Err(AppError::NotFound(format!("trip not found: {}", trip_id)))
        }
        CancelTripOutcome::Departed => Err(AppError::Gone(
            "trip has already departed".to_string(),
        )),
    }
}
