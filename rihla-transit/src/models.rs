use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::availability::SeatInventory;
use crate::seatmap::SEAT_COLUMNS;

/// A named station/stop used as a route endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssemblyPoint {
    pub id: Uuid,
    pub name: String,
    pub city: String,
}

/// A physical vehicle owned by a transport office. Immutable once trips
/// reference it, apart from the `active` flag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bus {
    pub id: Uuid,
    pub office_id: Uuid,
    pub plate_number: String,
    pub capacity: i32,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

/// Directed origin -> destination pair with base price and duration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Route {
    pub id: Uuid,
    pub office_id: Uuid,
    pub origin_id: Uuid,
    pub destination_id: Uuid,
    pub base_price: i32,
    pub duration_minutes: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SeatStatus {
    Available,
    Reserved,
    Booked,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SeatType {
    Window,
    Aisle,
}

impl SeatType {
    /// Outer columns sit at the windows, inner columns at the aisle.
    pub fn from_column(column: u32) -> Self {
        if column == 0 || column == SEAT_COLUMNS - 1 {
            SeatType::Window
        } else {
            SeatType::Aisle
        }
    }
}

/// One bookable seat slot on a specific trip. Each trip owns its own copy of
/// the bus layout; seat state never lives on the bus itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Seat {
    pub number: String,
    pub row: u32,
    pub column: u32,
    pub seat_type: SeatType,
    pub status: SeatStatus,
    pub booking_id: Option<Uuid>,
}

impl Seat {
    pub fn new(number: &str, row: u32, column: u32) -> Self {
        Self {
            number: number.to_string(),
            row,
            column,
            seat_type: SeatType::from_column(column),
            status: SeatStatus::Available,
            booking_id: None,
        }
    }

    /// Invariant: status is Available iff booking_id is None.
    pub fn is_available(&self) -> bool {
        self.status == SeatStatus::Available && self.booking_id.is_none()
    }
}

/// One scheduled departure of a route operated by a specific bus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trip {
    pub id: Uuid,
    pub office_id: Uuid,
    pub route_id: Uuid,
    pub bus_id: Uuid,
    pub departure_date: NaiveDate,
    pub departure_time: NaiveTime,
    pub arrival_time: NaiveTime,
    pub price: i32,
    pub inventory: SeatInventory,
    pub cancelled: bool,
    pub created_at: DateTime<Utc>,
}

impl Trip {
    /// Arrival = departure + route duration, wrapping past midnight.
    pub fn arrival_for(departure_time: NaiveTime, duration_minutes: i64) -> NaiveTime {
        departure_time
            .overflowing_add_signed(Duration::minutes(duration_minutes))
            .0
    }

    pub fn departure(&self) -> NaiveDateTime {
        self.departure_date.and_time(self.departure_time)
    }

    pub fn has_departed(&self, now: NaiveDateTime) -> bool {
        now >= self.departure()
    }

    /// A trip accepts bookings until it is cancelled or its departure passes.
    pub fn is_open(&self, now: NaiveDateTime) -> bool {
        !self.cancelled && !self.has_departed(now)
    }
}
