use uuid::Uuid;

/// `cancelled_by` value for operator-driven cancellations.
pub const CANCELLED_BY_OPERATOR: &str = "OPERATOR";
/// `cancelled_by` value for cancellations made by the expiry sweep.
pub const CANCELLED_BY_EXPIRY: &str = "EXPIRY_SWEEP";

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct BookingCreatedEvent {
    pub booking_id: Uuid,
    pub trip_id: Uuid,
    pub office_id: Uuid,
    pub reference: String,
    pub seat_numbers: Vec<String>,
    pub total_amount: i32,
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct BookingCancelledEvent {
    pub booking_id: Uuid,
    pub trip_id: Uuid,
    pub released_seats: usize,
    /// [`CANCELLED_BY_OPERATOR`] or [`CANCELLED_BY_EXPIRY`]
    pub cancelled_by: String,
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct PaymentRecordedEvent {
    pub payment_id: Uuid,
    pub booking_id: Uuid,
    pub amount: i32,
    pub method: String,
    pub status: String,
    pub timestamp: i64,
}

/// Envelope fanned out on the in-process broadcast channel.
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingEvent {
    Created(BookingCreatedEvent),
    Cancelled(BookingCancelledEvent),
    PaymentRecorded(PaymentRecordedEvent),
}
