pub mod availability;
pub mod models;
pub mod repository;
pub mod seatmap;

pub use availability::SeatInventory;
pub use models::{AssemblyPoint, Bus, Route, Seat, SeatStatus, SeatType, Trip};
pub use seatmap::{generate_seat_layout, SeatLayout};
