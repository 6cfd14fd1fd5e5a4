//! Collapses back-to-back slots into display ranges.
//!
//! Two ranges join only when one ends exactly where the next starts. Slots are
//! cells of a fixed grid, so overlapping-but-misaligned ranges are kept apart
//! rather than unioned.

use crate::models::TimeRange;

pub fn merge_contiguous<I>(ranges: I) -> Vec<TimeRange>
where
    I: IntoIterator<Item = TimeRange>,
{
    let mut sorted: Vec<TimeRange> = ranges.into_iter().collect();
    sorted.sort();
    sorted.dedup();

    let mut iter = sorted.into_iter();
    let Some(mut current) = iter.next() else {
        return Vec::new();
    };

    let mut merged = Vec::new();
    for next in iter {
        if next.start() == current.end() {
            current.extend_to(next.end());
        } else {
            merged.push(current);
            current = next;
        }
    }
    merged.push(current);

    merged
}
