//! Accumulators fed with every overlap written to a file
//!
//! The store builder combines these across shards to plan its layout. The
//! file layer only needs the feed, so any [`OverlapAccumulator`] can be
//! plugged into an [`OverlapFile`](crate::OverlapFile).

use auto_impl::auto_impl;

use crate::overlap::Overlap;

/// Receives one overlap at a time
#[auto_impl(&mut, Box)]
pub trait OverlapAccumulator {
    fn add_overlap(&mut self, overlap: &Overlap);
}

/// Default accumulator: overlaps per first read
///
/// Per-read counts saturate at `u32::MAX`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OverlapHistogram {
    total: u64,
    /// Overlaps per `a_iid`, grown as new ids appear
    per_read: Vec<u32>,
}
impl OverlapHistogram {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of overlaps seen
    #[must_use]
    pub fn num_overlaps(&self) -> u64 {
        self.total
    }

    /// Number of overlaps seen with `read_id` as first read
    #[must_use]
    pub fn overlaps_for(&self, read_id: u32) -> u32 {
        self.per_read.get(read_id as usize).copied().unwrap_or(0)
    }

    /// Largest first read id seen, if any
    #[must_use]
    pub fn max_read(&self) -> Option<u32> {
        self.per_read
            .iter()
            .rposition(|&n| n > 0)
            .map(|idx| idx as u32)
    }

    /// Adds the counts of another histogram into this one
    pub fn merge(&mut self, other: &Self) {
        self.total += other.total;
        if self.per_read.len() < other.per_read.len() {
            self.per_read.resize(other.per_read.len(), 0);
        }
        self.per_read
            .iter_mut()
            .zip(&other.per_read)
            .for_each(|(a, b)| *a = a.saturating_add(*b));
    }
}

impl OverlapAccumulator for OverlapHistogram {
    fn add_overlap(&mut self, overlap: &Overlap) {
        let idx = overlap.a_iid as usize;
        if idx >= self.per_read.len() {
            self.per_read.resize(idx + 1, 0);
        }
        self.per_read[idx] = self.per_read[idx].saturating_add(1);
        self.total += 1;
    }
}
