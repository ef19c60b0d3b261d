use chrono::{DateTime, Utc};
use rand::{distributions::Alphanumeric, Rng};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Booking status in the lifecycle.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
    NoShow,
}

impl BookingStatus {
    /// The full transition table. Completed, NoShow and Cancelled are
    /// terminal: nothing leaves them.
    pub fn can_transition_to(self, target: BookingStatus) -> bool {
        use BookingStatus::*;
        matches!(
            (self, target),
            (Pending, Confirmed) | (Pending, Cancelled) | (Confirmed, Completed)
                | (Confirmed, NoShow)
                | (Confirmed, Cancelled)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            BookingStatus::Cancelled | BookingStatus::Completed | BookingStatus::NoShow
        )
    }
}

/// A passenger's reservation of 1..=5 seats on one trip.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub trip_id: Uuid,
    /// Denormalized from the trip so office-scoped queries and authorization
    /// need no join.
    pub office_id: Uuid,
    pub reference: String,
    pub passenger_name: String,
    pub passenger_phone: String,
    pub passenger_email: Option<String>,
    pub seat_numbers: Vec<String>,
    pub total_amount: i32,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

/// Business rule: a single booking covers at most this many seats.
pub const MAX_SEATS_PER_BOOKING: usize = 5;

/// Human-readable booking reference, e.g. "RHL-7K2M9Q".
pub fn generate_reference() -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(6)
        .map(|c| (c as char).to_ascii_uppercase())
        .collect();
    format!("RHL-{}", suffix)
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    MobileMoney,
    CreditCard,
    BankTransfer,
    CashOnArrival,
}

impl PaymentMethod {
    /// MobileMoney and CreditCard are treated as settled on record since
    /// there is no real gateway behind them; cash and bank transfer wait for
    /// offline confirmation.
    pub fn settles_immediately(self) -> bool {
        matches!(self, PaymentMethod::MobileMoney | PaymentMethod::CreditCard)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
}

/// One payment attempt against a booking. Amount always equals the booking's
/// total; retries append new rows rather than editing old ones.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub amount: i32,
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    pub mobile_money_number: Option<String>,
    pub transaction_id: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

pub fn generate_transaction_id() -> String {
    format!("TXN-{}", Uuid::new_v4().simple())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transition_table() {
        use BookingStatus::*;
        assert!(Pending.can_transition_to(Confirmed));
        assert!(Pending.can_transition_to(Cancelled));
        assert!(!Pending.can_transition_to(Completed));
        assert!(!Pending.can_transition_to(NoShow));

        assert!(Confirmed.can_transition_to(Completed));
        assert!(Confirmed.can_transition_to(NoShow));
        assert!(Confirmed.can_transition_to(Cancelled));
        assert!(!Confirmed.can_transition_to(Pending));
    }

    #[test]
    fn test_terminal_states_have_no_exits() {
        use BookingStatus::*;
        let all = [Pending, Confirmed, Cancelled, Completed, NoShow];
        for terminal in [Cancelled, Completed, NoShow] {
            assert!(terminal.is_terminal());
            for target in all {
                assert!(!terminal.can_transition_to(target));
            }
        }
    }

    #[test]
    fn test_reference_shape() {
        let reference = generate_reference();
        assert!(reference.starts_with("RHL-"));
        assert_eq!(reference.len(), 10);
        assert!(reference[4..]
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
    }
}
