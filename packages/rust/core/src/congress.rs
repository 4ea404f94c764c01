//! Congress-number arithmetic and the resume rule for hearing sweeps.

use legisharvest_shared::{HarvestError, Result};

/// Year the numbering is anchored to.
const FIRST_CONGRESS_YEAR: i32 = 1787;

/// Congress number in session during `year`.
///
/// `(year - 1787) / 2`, so 2025 and 2026 both map to 119. Years before the
/// anchor map to 0.
pub fn congress_number_from_year(year: i32) -> u32 {
    if year <= FIRST_CONGRESS_YEAR {
        return 0;
    }
    ((year - FIRST_CONGRESS_YEAR) / 2) as u32
}

/// Congress numbers to attempt this run, in processing (descending) order.
///
/// Numbers above `checkpoint` were finished by earlier runs of the current
/// sweep and are skipped. A checkpoint above `ceiling` is stale (written in an
/// earlier calendar year or set by hand) and is clamped to `ceiling`. `floor`
/// is inclusive; a checkpoint below it yields nothing.
pub fn next_range(checkpoint: u32, ceiling: u32, floor: u32) -> Vec<u32> {
    let start = checkpoint.min(ceiling);
    if start < floor {
        return Vec::new();
    }
    (floor..=start).rev().collect()
}

/// Interpret the stored cursor. A never-written cursor starts a fresh sweep.
pub fn resolve_checkpoint(stored: Option<i64>, ceiling: u32) -> Result<u32> {
    match stored {
        None => Ok(ceiling),
        Some(value) => u32::try_from(value).map_err(|_| {
            HarvestError::validation(format!("stored congress number {value} is out of range"))
        }),
    }
}
