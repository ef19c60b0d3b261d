use axum::{
    extract::{Path, State},
    Extension, Json,
};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use rihla_booking::allocator::AllocationRequest;
use rihla_booking::models::{Booking, BookingStatus};
use rihla_core::identity::authorize_office;
use rihla_shared::models::events::{
    BookingCancelledEvent, BookingCreatedEvent, BookingEvent, CANCELLED_BY_OPERATOR,
};
use rihla_shared::pii::Masked;

use crate::error::AppError;
use crate::middleware::auth::OperatorClaims;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateBookingRequest {
    pub trip_id: Uuid,
    pub seat_numbers: Vec<String>,
    pub passenger_name: String,
    pub passenger_phone: Masked<String>,
    pub passenger_email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StatusChangeRequest {
    pub status: BookingStatus,
}

/// POST /v1/bookings
/// Public seat-selection endpoint: validates, claims the requested seats
/// atomically and creates a Pending booking.
pub async fn create_booking(
    State(state): State<AppState>,
    Json(req): Json<CreateBookingRequest>,
) -> Result<Json<Booking>, AppError> {
    tracing::info!(trip_id = %req.trip_id, seats = ?req.seat_numbers, "booking request");

    let booking = state
        .allocator
        .allocate(AllocationRequest {
            trip_id: req.trip_id,
            seat_numbers: req.seat_numbers,
            passenger_name: req.passenger_name,
            passenger_phone: req.passenger_phone.into_inner(),
            passenger_email: req.passenger_email,
        })
        .await?;

    // Listener loss is fine; the channel is observability fan-out, not a
    // durability mechanism.
    let _ = state.events.send(BookingEvent::Created(BookingCreatedEvent {
        booking_id: booking.id,
        trip_id: booking.trip_id,
        office_id: booking.office_id,
        reference: booking.reference.clone(),
        seat_numbers: booking.seat_numbers.clone(),
        total_amount: booking.total_amount,
        timestamp: Utc::now().timestamp(),
    }));

    Ok(Json(booking))
}

/// GET /v1/bookings/:id
pub async fn get_booking(
    State(state): State<AppState>,
    Path(booking_id): Path<Uuid>,
) -> Result<Json<Booking>, AppError> {
    let booking = state
        .bookings
        .get_booking(booking_id)
        .await
        .map_err(AppError::internal)?
        .ok_or_else(|| AppError::NotFound(format!("booking not found: {}", booking_id)))?;
    Ok(Json(booking))
}

/// POST /v1/bookings/:id/status
/// Operator-driven lifecycle transition. The target status selects the
/// lifecycle operation; Pending is never a valid target.
pub async fn change_status(
    State(state): State<AppState>,
    Extension(claims): Extension<OperatorClaims>,
    Path(booking_id): Path<Uuid>,
    Json(req): Json<StatusChangeRequest>,
) -> Result<Json<Booking>, AppError> {
    let operator = claims.identity();

    let booking = match req.status {
        BookingStatus::Confirmed => state.lifecycle.confirm(booking_id, &operator).await?,
        BookingStatus::Cancelled => {
            let booking = state.lifecycle.cancel(booking_id, &operator).await?;
            let _ = state
                .events
                .send(BookingEvent::Cancelled(BookingCancelledEvent {
                    booking_id: booking.id,
                    trip_id: booking.trip_id,
                    released_seats: booking.seat_numbers.len(),
                    cancelled_by: CANCELLED_BY_OPERATOR.to_string(),
                    timestamp: Utc::now().timestamp(),
                }));
            booking
        }
        BookingStatus::Completed => state.lifecycle.complete(booking_id, &operator).await?,
        BookingStatus::NoShow => state.lifecycle.mark_no_show(booking_id, &operator).await?,
        BookingStatus::Pending => {
            return Err(AppError::BadRequest(
                "PENDING is not a valid transition target".to_string(),
            ))
        }
    };

    Ok(Json(booking))
}

/// GET /v1/offices/:id/bookings
/// Office-scoped booking list; operators only see their own office.
pub async fn list_office_bookings(
    State(state): State<AppState>,
    Extension(claims): Extension<OperatorClaims>,
    Path(office_id): Path<Uuid>,
) -> Result<Json<Vec<Booking>>, AppError> {
    authorize_office(&claims.identity(), office_id)?;

    let bookings = state
        .bookings
        .list_office_bookings(office_id)
        .await
        .map_err(AppError::internal)?;
    Ok(Json(bookings))
}
