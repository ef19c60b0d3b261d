pub mod allocator;
pub mod expiry;
pub mod lifecycle;
pub mod models;
pub mod payment;
pub mod repository;

pub use models::{Booking, BookingStatus, Payment, PaymentMethod, PaymentStatus};
