//! Per-month sequence allocation
//!
//! Case numbers carry a sequence that restarts at 1 every (year, month).
//! The counter itself lives in the [`CaseStore`]; this module only defines
//! the bucket and delegates the atomic increment.

use chrono::{DateTime, Datelike, FixedOffset, Utc};
use serde::{Deserialize, Serialize};

use crate::core::store::{CaseStore, StoreError};

/// The (year, month) scope within which sequences are unique
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Bucket {
    pub year: i32,
    pub month: u32,
}

impl Bucket {
    pub fn new(year: i32, month: u32) -> Self {
        Self { year, month }
    }

    /// Bucket containing `instant` as seen from the given UTC offset
    pub fn containing(instant: DateTime<Utc>, offset: FixedOffset) -> Self {
        let local = instant.with_timezone(&offset);
        Self {
            year: local.year(),
            month: local.month(),
        }
    }
}

impl std::fmt::Display for Bucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Issues strictly increasing sequence numbers per bucket
pub struct SequenceAllocator<'a, S: ?Sized> {
    store: &'a S,
}

impl<'a, S: CaseStore + ?Sized> SequenceAllocator<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Allocate the next sequence for `bucket`
    ///
    /// A value handed out here is never handed out again for the same bucket,
    /// even if the caller later fails to use it.
    pub fn allocate(&self, bucket: Bucket) -> Result<u32, StoreError> {
        match self.store.next_sequence(bucket) {
            Ok(sequence) => {
                tracing::debug!(%bucket, sequence, "allocated case sequence");
                Ok(sequence)
            }
            Err(e) => {
                tracing::warn!(%bucket, error = %e, "sequence allocation failed");
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::store::MemoryStore;
    use chrono::TimeZone;
    use std::collections::HashSet;

    #[test]
    fn test_sequences_start_at_one_and_increase() {
        let store = MemoryStore::new();
        let allocator = SequenceAllocator::new(&store);
        let bucket = Bucket::new(2024, 3);

        assert_eq!(allocator.allocate(bucket).unwrap(), 1);
        assert_eq!(allocator.allocate(bucket).unwrap(), 2);
        assert_eq!(allocator.allocate(bucket).unwrap(), 3);
    }

    #[test]
    fn test_buckets_are_independent() {
        let store = MemoryStore::new();
        let allocator = SequenceAllocator::new(&store);

        assert_eq!(allocator.allocate(Bucket::new(2024, 3)).unwrap(), 1);
        assert_eq!(allocator.allocate(Bucket::new(2024, 3)).unwrap(), 2);
        assert_eq!(allocator.allocate(Bucket::new(2024, 4)).unwrap(), 1);
        assert_eq!(allocator.allocate(Bucket::new(2025, 3)).unwrap(), 1);
    }

    #[test]
    fn test_parallel_allocation_has_no_duplicates() {
        let store = MemoryStore::new();
        let bucket = Bucket::new(2024, 5);
        let n = 64;

        let mut seen: Vec<u32> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..n)
                .map(|_| scope.spawn(|| SequenceAllocator::new(&store).allocate(bucket).unwrap()))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        let unique: HashSet<u32> = seen.iter().copied().collect();
        assert_eq!(unique.len(), n);
        seen.sort_unstable();
        assert_eq!(seen, (1..=n as u32).collect::<Vec<_>>());
    }

    #[test]
    fn test_unavailable_store_fails_allocation() {
        let store = MemoryStore::new();
        store.set_available(false);
        let err = SequenceAllocator::new(&store)
            .allocate(Bucket::new(2024, 1))
            .unwrap_err();
        assert!(err.is_unavailable());
    }

    #[test]
    fn test_bucket_respects_offset_at_month_boundary() {
        // 2024-02-01 03:00 UTC is still January in UTC-5
        let instant = Utc.with_ymd_and_hms(2024, 2, 1, 3, 0, 0).unwrap();
        let utc = FixedOffset::east_opt(0).unwrap();
        let ecuador = FixedOffset::west_opt(5 * 3600).unwrap();

        assert_eq!(Bucket::containing(instant, utc), Bucket::new(2024, 2));
        assert_eq!(Bucket::containing(instant, ecuador), Bucket::new(2024, 1));
        assert_eq!(Bucket::new(2024, 2).to_string(), "2024-02");
    }
}
