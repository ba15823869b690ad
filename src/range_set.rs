//! Inclusive intervals over 1-based logical record indices.

use std::ops::RangeInclusive;

use crate::error::{FlrError, Result};

/// A collection of inclusive intervals, kept in the order supplied.
///
/// Overlapping intervals are neither merged nor de-duplicated; the chunk
/// planner reads an index once per interval that names it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RangeSet {
    ranges: Vec<RangeInclusive<u64>>,
}

impl RangeSet {
    /// Build from intervals. Rejects reversed intervals and index 0, neither
    /// of which names any 1-based record.
    pub fn new(ranges: Vec<RangeInclusive<u64>>) -> Result<Self> {
        for r in &ranges {
            if r.start() > r.end() {
                return Err(FlrError::InvalidRangeArgument(format!(
                    "{}..{} is reversed; use (a..b) with a <= b",
                    r.start(),
                    r.end()
                )));
            }
            if *r.start() == 0 {
                return Err(FlrError::InvalidRangeArgument(format!(
                    "{}..{} starts at 0; record indices are 1-based",
                    r.start(),
                    r.end()
                )));
            }
        }
        Ok(Self { ranges })
    }

    /// Parse a comma separated list such as `1..5,9,12-20`.
    pub fn parse(text: &str) -> Result<Self> {
        let mut ranges = Vec::new();
        for part in text.split(',') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }
            let (lo, hi) = if let Some((a, b)) = part.split_once("..") {
                (a, b.trim_start_matches('='))
            } else if let Some((a, b)) = part.split_once('-') {
                (a, b)
            } else {
                (part, part)
            };
            let lo = parse_index(lo, part)?;
            let hi = parse_index(hi, part)?;
            ranges.push(lo..=hi);
        }
        if ranges.is_empty() {
            return Err(FlrError::InvalidRangeArgument(format!(
                "'{}' contains no ranges",
                text
            )));
        }
        Self::new(ranges)
    }

    /// True if `index` falls inside at least one interval. An empty set
    /// accepts every index.
    pub fn contains(&self, index: u64) -> bool {
        self.ranges.is_empty() || self.ranges.iter().any(|r| r.contains(&index))
    }

    pub fn ranges(&self) -> &[RangeInclusive<u64>] {
        &self.ranges
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }
}

fn parse_index(s: &str, part: &str) -> Result<u64> {
    s.trim().parse().map_err(|_| {
        FlrError::InvalidRangeArgument(format!(
            "You specified '{}' instead of a range in the list of ranges. Use a..b to specify a range.",
            part
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_accepts_everything() {
        let set = RangeSet::default();
        assert!(set.contains(1));
        assert!(set.contains(u64::MAX));
    }

    #[test]
    fn test_membership() {
        let set = RangeSet::new(vec![2..=4, 10..=10]).unwrap();
        assert!(!set.contains(1));
        assert!(set.contains(2));
        assert!(set.contains(4));
        assert!(!set.contains(5));
        assert!(set.contains(10));
        // Order of queries does not matter
        assert!(set.contains(3));
        assert!(!set.contains(11));
    }

    #[test]
    fn test_parse_forms() {
        let set = RangeSet::parse("1..5, 9, 12-20, 30..=31").unwrap();
        assert_eq!(set.ranges(), &[1..=5, 9..=9, 12..=20, 30..=31]);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(
            RangeSet::parse("abc"),
            Err(FlrError::InvalidRangeArgument(_))
        ));
        assert!(matches!(
            RangeSet::parse("1..x"),
            Err(FlrError::InvalidRangeArgument(_))
        ));
        assert!(matches!(
            RangeSet::parse(" , "),
            Err(FlrError::InvalidRangeArgument(_))
        ));
    }

    #[test]
    fn test_rejects_reversed_and_zero() {
        assert!(matches!(
            RangeSet::new(vec![5..=1]),
            Err(FlrError::InvalidRangeArgument(_))
        ));
        assert!(matches!(
            RangeSet::parse("0..3"),
            Err(FlrError::InvalidRangeArgument(_))
        ));
    }
}
