// stepscore-core/src/domain/scoring/aggregate.rs

use crate::domain::table::NormalizedCell;

/// Composite score of one respondent on one scale.
///
/// Mean of the items that are present. A respondent who skipped some items
/// still gets a score over the answered ones; only an all-missing (or empty)
/// item set yields `Missing`. This keeps partial responses in the data set at
/// the cost of composites built on fewer items.
pub fn aggregate(items: &[NormalizedCell]) -> NormalizedCell {
    let (sum, count) = items
        .iter()
        .filter_map(|c| c.value())
        .fold((0.0_f64, 0_usize), |(sum, n), v| (sum + v, n + 1));

    if count == 0 {
        NormalizedCell::Missing
    } else {
        NormalizedCell::from_f64(sum / count as f64)
    }
}
