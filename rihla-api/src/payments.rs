use axum::{
    extract::{Path, State},
    Extension, Json,
};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use rihla_booking::models::{Payment, PaymentMethod};
use rihla_shared::models::events::{BookingEvent, PaymentRecordedEvent};
use rihla_shared::pii::Masked;

use crate::error::AppError;
use crate::middleware::auth::OperatorClaims;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RecordPaymentRequest {
    pub method: PaymentMethod,
    pub mobile_money_number: Option<Masked<String>>,
}

/// POST /v1/bookings/:id/payments
/// Public: record a payment attempt. MobileMoney and CreditCard settle on
/// record and confirm the booking; cash and bank transfer stay Pending until
/// an operator settles them.
pub async fn record_payment(
    State(state): State<AppState>,
    Path(booking_id): Path<Uuid>,
    Json(req): Json<RecordPaymentRequest>,
) -> Result<Json<Payment>, AppError> {
    let payment = state
        .payment_processor
        .record_payment(
            booking_id,
            req.method,
            req.mobile_money_number.map(Masked::into_inner),
        )
        .await?;

    publish_recorded(&state, &payment);

    Ok(Json(payment))
}

/// POST /v1/payments/:id/settle
/// Operator confirmation of an offline payment; confirms the booking.
pub async fn settle_payment(
    State(state): State<AppState>,
    Extension(claims): Extension<OperatorClaims>,
    Path(payment_id): Path<Uuid>,
) -> Result<Json<Payment>, AppError> {
    let payment = state
        .payment_processor
        .settle_payment(payment_id, &claims.identity())
        .await?;

    publish_recorded(&state, &payment);

    Ok(Json(payment))
}

fn publish_recorded(state: &AppState, payment: &Payment) {
    let _ = state
        .events
        .send(BookingEvent::PaymentRecorded(PaymentRecordedEvent {
            payment_id: payment.id,
            booking_id: payment.booking_id,
            amount: payment.amount,
            method: format!("{:?}", payment.method),
            status: format!("{:?}", payment.status),
            timestamp: Utc::now().timestamp(),
        }));
}
