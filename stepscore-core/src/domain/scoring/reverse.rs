// stepscore-core/src/domain/scoring/reverse.rs

use crate::domain::error::DomainError;
use crate::domain::table::NormalizedCell;

/// Inverts the polarity of one item: `(scale_max + 1) - value`.
///
/// Values outside `[1, scale_max]` are rejected rather than mirrored into
/// nonsense.
pub fn correct(value: f64, scale_max: u32) -> Result<f64, DomainError> {
    let max = f64::from(scale_max);
    if !(1.0..=max).contains(&value) {
        return Err(DomainError::InvalidScore { value, scale_max });
    }
    Ok((max + 1.0) - value)
}

/// [`correct`] lifted over a normalized cell.
///
/// `Missing` stays `Missing`. An out-of-range value also becomes `Missing`;
/// the error is handed back so the caller can log and count it.
pub fn correct_cell(
    cell: NormalizedCell,
    scale_max: u32,
) -> (NormalizedCell, Option<DomainError>) {
    match cell {
        NormalizedCell::Missing => (NormalizedCell::Missing, None),
        NormalizedCell::Value(v) => match correct(v, scale_max) {
            Ok(corrected) => (NormalizedCell::Value(corrected), None),
            Err(e) => (NormalizedCell::Missing, Some(e)),
        },
    }
}
