//! Work partitioning.
//!
//! Splits an ordered sequence into contiguous partitions for parallel
//! execution. Interiors never overlap; each index belongs to exactly one
//! partition's interior. A partition may additionally read a bounded number
//! of entries before its interior (its lookback), which it never emits.

use std::ops::Range;

/// A contiguous unit of parallel work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition {
    /// Indices whose results this partition owns.
    pub interior: Range<usize>,
    /// Number of read-only entries before the interior.
    pub lookback: usize,
}

impl Partition {
    /// Full range the partition reads: lookback plus interior.
    #[inline]
    pub fn span(&self) -> Range<usize> {
        (self.interior.start - self.lookback)..self.interior.end
    }

    /// Number of owned entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.interior.len()
    }

    /// Whether the partition owns nothing.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.interior.is_empty()
    }
}

/// Split `len` entries into at most `count` equal-sized index chunks.
///
/// Each chunk reads up to `lookback` entries before its start.
pub fn partition_by_index(len: usize, count: usize, lookback: usize) -> Vec<Partition> {
    if len == 0 {
        return Vec::new();
    }
    let count = count.clamp(1, len);
    let chunk = len.div_ceil(count);

    (0..len)
        .step_by(chunk)
        .map(|start| Partition {
            interior: start..(start + chunk).min(len),
            lookback: lookback.min(start),
        })
        .collect()
}

/// Pack whole groups into at most `count` partitions balanced by size.
///
/// `groups` must be the contiguous, ascending group ranges of the sequence.
/// No group is ever split, so partitions need no lookback.
pub fn partition_by_groups(groups: &[Range<usize>], count: usize) -> Vec<Partition> {
    let (Some(first), Some(last)) = (groups.first(), groups.last()) else {
        return Vec::new();
    };
    let total = last.end - first.start;
    let target = total.div_ceil(count.max(1)).max(1);

    let mut partitions = Vec::new();
    let mut start = first.start;
    for group in groups {
        if group.end - start >= target {
            partitions.push(Partition {
                interior: start..group.end,
                lookback: 0,
            });
            start = group.end;
        }
    }
    if start < last.end {
        partitions.push(Partition {
            interior: start..last.end,
            lookback: 0,
        });
    }
    partitions
}
