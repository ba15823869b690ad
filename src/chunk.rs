//! Chunk planning for the fast reader.
//!
//! Turns requested logical-record ranges into contiguous byte spans, each a
//! whole number of records and no larger than the byte budget. Every interval
//! is planned on its own, in the order given: overlapping intervals read the
//! shared records twice. Intervals are clipped to the records the file
//! holds, so the plan never reaches past end of file however large the
//! requested indices are.

use log::debug;

use crate::range_set::RangeSet;

/// Upper bound on the default fast-mode buffer.
pub const DEFAULT_BUFFER_LIMIT: u64 = 100_000_000;

/// A contiguous byte span read in one bulk I/O operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk {
    pub offset: u64,
    pub len: u64,
}

/// Largest multiple of `record_width` not exceeding [`DEFAULT_BUFFER_LIMIT`],
/// and never less than one record.
pub fn default_budget(record_width: u64) -> u64 {
    normalize_budget(DEFAULT_BUFFER_LIMIT, record_width)
}

/// Round `budget` down to a whole number of records, with a floor of one record.
pub fn normalize_budget(budget: u64, record_width: u64) -> u64 {
    if record_width == 0 {
        return budget;
    }
    let whole = budget - budget % record_width;
    whole.max(record_width)
}

/// Plan the chunks covering every index in `ranges` that is at most
/// `record_count`.
///
/// Index `i` (1-based) lives at byte `(i - 1) * record_width`. A run of
/// consecutive indices is closed into a chunk when it reaches `budget` bytes
/// or when its interval ends. An empty range set or a zero record width
/// plans nothing.
pub fn plan_chunks(
    ranges: &RangeSet,
    record_width: u64,
    record_count: u64,
    budget: u64,
) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    if record_width == 0 {
        return chunks;
    }
    let per_chunk = normalize_budget(budget, record_width) / record_width;

    for range in ranges.ranges() {
        let (lo, hi) = (*range.start(), (*range.end()).min(record_count));
        let mut first = lo;
        while first <= hi {
            let taken = (hi - first + 1).min(per_chunk);
            let span = (first - 1)
                .checked_mul(record_width)
                .zip(taken.checked_mul(record_width));
            let Some((offset, len)) = span else {
                debug!("Record {first} lies beyond addressable bytes, interval dropped");
                break;
            };
            chunks.push(Chunk { offset, len });
            match first.checked_add(taken) {
                Some(next) => first = next,
                None => break,
            }
        }
    }

    debug!(
        "Planned {} chunk(s) for {} range(s), record width {}, budget {}",
        chunks.len(),
        ranges.ranges().len(),
        record_width,
        budget
    );
    chunks
}
