use crate::HistoryEntry;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MagnitudeStats {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
}

/// Min, max and arithmetic mean of the magnitude field, `None` when empty.
pub fn magnitude_stats<'a, T, I>(entries: I) -> Option<MagnitudeStats>
where
    T: HistoryEntry + 'a,
    I: IntoIterator<Item = &'a T>,
{
    let mut count = 0usize;
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    let mut sum = 0.0;
    for entry in entries {
        let value = entry.magnitude();
        min = min.min(value);
        max = max.max(value);
        sum += value;
        count += 1;
    }
    if count == 0 {
        return None;
    }
    Some(MagnitudeStats {
        min,
        max,
        mean: sum / count as f64,
    })
}

/// Elapsed seconds between the first and the last entry.
///
/// `None` with fewer than two entries, when either boundary timestamp is not
/// positive, or when the last timestamp is not strictly after the first.
pub fn window_seconds<'a, T, I>(entries: I) -> Option<f64>
where
    T: HistoryEntry + 'a,
    I: IntoIterator<Item = &'a T>,
{
    let mut iter = entries.into_iter();
    let first = iter.next()?.timestamp_ms();
    let last = iter.last()?.timestamp_ms();
    if !(first > 0.0) || !(last > 0.0) || last <= first {
        return None;
    }
    Some((last - first) / 1000.0)
}
