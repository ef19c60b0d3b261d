use serde::{Deserialize, Serialize};

/// Cached available-seat counter for one trip.
///
/// This is the read-path value listing/search views display instead of
/// counting seat rows. It is only ever mutated from the seat claim and seat
/// release paths, inside the same store critical section that flips the seat
/// statuses, so it stays equal to `count(seats where status = Available)`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SeatInventory {
    available: i32,
    total: i32,
}

#[derive(Debug, thiserror::Error)]
pub enum AvailabilityError {
    #[error("insufficient seats: requested {requested}, available {available}")]
    Insufficient { requested: i32, available: i32 },

    #[error("seat count must be positive, got {0}")]
    NonPositive(i32),
}

impl SeatInventory {
    /// A fresh trip starts with every seat available.
    pub fn new(total: i32) -> Self {
        Self {
            available: total,
            total,
        }
    }

    pub fn available(&self) -> i32 {
        self.available
    }

    pub fn total(&self) -> i32 {
        self.total
    }

    /// Take `count` seats out of availability (successful allocation).
    pub fn allocate(&mut self, count: i32) -> Result<(), AvailabilityError> {
        if count <= 0 {
            return Err(AvailabilityError::NonPositive(count));
        }
        if self.available < count {
            return Err(AvailabilityError::Insufficient {
                requested: count,
                available: self.available,
            });
        }
        self.available -= count;
        Ok(())
    }

    /// Return `count` seats to availability (cancellation / expiry), clamped
    /// so the counter can never exceed the trip's seat total.
    pub fn release(&mut self, count: i32) -> Result<(), AvailabilityError> {
        if count <= 0 {
            return Err(AvailabilityError::NonPositive(count));
        }
        self.available = (self.available + count).min(self.total);
        Ok(())
    }

    /// Consistency check against a recount of the underlying seat rows.
    pub fn matches_count(&self, counted: i32) -> bool {
        self.available == counted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocate_and_release() {
        let mut inventory = SeatInventory::new(45);
        assert_eq!(inventory.available(), 45);

        inventory.allocate(3).unwrap();
        assert_eq!(inventory.available(), 42);

        inventory.release(3).unwrap();
        assert_eq!(inventory.available(), 45);
    }

    #[test]
    fn test_allocate_rejects_overdraw() {
        let mut inventory = SeatInventory::new(2);
        let err = inventory.allocate(5).unwrap_err();
        assert!(matches!(
            err,
            AvailabilityError::Insufficient {
                requested: 5,
                available: 2
            }
        ));
        // Counter untouched on failure.
        assert_eq!(inventory.available(), 2);
    }

    #[test]
    fn test_release_is_clamped_at_total() {
        let mut inventory = SeatInventory::new(10);
        inventory.allocate(2).unwrap();
        inventory.release(5).unwrap();
        assert_eq!(inventory.available(), 10);
    }

    #[test]
    fn test_rejects_non_positive_counts() {
        let mut inventory = SeatInventory::new(10);
        assert!(inventory.allocate(0).is_err());
        assert!(inventory.release(-1).is_err());
    }
}
