use serde::{Deserialize, Serialize};

/// Fixed column count for intercity coaches (2+2 across the aisle).
pub const SEAT_COLUMNS: u32 = 4;

/// Row letters run 'A'..'Z', which caps a bus at 26 * 4 = 104 seats.
pub const MAX_CAPACITY: u32 = 26 * SEAT_COLUMNS;

/// Deterministic seat grid for a bus, used to materialize per-trip seat rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeatLayout {
    pub rows: u32,
    pub columns: u32,
    /// Row-major seat labels ("A1".."A4", "B1"..). The last row is truncated
    /// when capacity is not a multiple of the column count: those slots do
    /// not exist at all, they are not empty seats.
    pub grid: Vec<Vec<String>>,
}

impl SeatLayout {
    /// Total number of seats in the layout.
    pub fn seat_count(&self) -> usize {
        self.grid.iter().map(|row| row.len()).sum()
    }

    /// Iterate (row, column, label) in row-major order.
    pub fn positions(&self) -> impl Iterator<Item = (u32, u32, &str)> {
        self.grid.iter().enumerate().flat_map(|(row, labels)| {
            labels
                .iter()
                .enumerate()
                .map(move |(col, label)| (row as u32, col as u32, label.as_str()))
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SeatMapError {
    #[error("capacity must be positive, got {0}")]
    InvalidCapacity(i64),

    #[error("capacity {0} exceeds the {MAX_CAPACITY}-seat layout limit")]
    CapacityTooLarge(u32),
}

/// Lay out `capacity` seats into a lettered grid.
///
/// Rows get letters starting at 'A'; seats within a row are numbered
/// 1..=SEAT_COLUMNS. Pure and idempotent: the same capacity always yields
/// byte-identical output.
pub fn generate_seat_layout(capacity: i64) -> Result<SeatLayout, SeatMapError> {
    if capacity <= 0 {
        return Err(SeatMapError::InvalidCapacity(capacity));
    }
    let capacity = capacity as u32;
    if capacity > MAX_CAPACITY {
        return Err(SeatMapError::CapacityTooLarge(capacity));
    }

    let rows = capacity.div_ceil(SEAT_COLUMNS);
    let mut grid = Vec::with_capacity(rows as usize);
    let mut placed = 0u32;

    for row in 0..rows {
        let letter = (b'A' + row as u8) as char;
        let mut labels = Vec::with_capacity(SEAT_COLUMNS as usize);
        for col in 0..SEAT_COLUMNS {
            if placed == capacity {
                break;
            }
            labels.push(format!("{}{}", letter, col + 1));
            placed += 1;
        }
        grid.push(labels);
    }

    Ok(SeatLayout {
        rows,
        columns: SEAT_COLUMNS,
        grid,
    })
}
