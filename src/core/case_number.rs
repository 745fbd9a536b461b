//! Case numbers - `JC-YYYY-MM-XXXX`
//!
//! The external identifier of a case. The sequence part comes from the
//! [`SequenceAllocator`] for the filing month and is rendered with four
//! digits; a month that runs past 9999 filings is reported rather than
//! wrapped or widened.

use chrono::{DateTime, FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::sequence::{Bucket, SequenceAllocator};
use crate::core::store::{CaseStore, StoreError};

/// Fixed prefix of every case number
pub const CASE_NUMBER_PREFIX: &str = "JC";

/// Largest sequence that fits the four-digit field
pub const MAX_SEQUENCE: u32 = 9999;

/// Errors raised while minting or parsing case numbers
#[derive(Debug, Error)]
pub enum CaseNumberError {
    #[error("Case sequence exhausted for {bucket}: {sequence} exceeds {max}")]
    SequenceExhausted {
        bucket: Bucket,
        sequence: u32,
        max: u32,
    },

    #[error("Invalid case number '{input}': {reason}")]
    Malformed { input: String, reason: String },

    #[error(transparent)]
    Storage(#[from] StoreError),
}

/// Immutable case number value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CaseNumber {
    year: i32,
    month: u32,
    sequence: u32,
}

impl CaseNumber {
    /// Compose a case number, rejecting sequences outside 1..=9999
    pub fn new(bucket: Bucket, sequence: u32) -> Result<Self, CaseNumberError> {
        if sequence > MAX_SEQUENCE {
            return Err(CaseNumberError::SequenceExhausted {
                bucket,
                sequence,
                max: MAX_SEQUENCE,
            });
        }
        let number = Self {
            year: bucket.year,
            month: bucket.month,
            sequence,
        };
        if sequence == 0 {
            return Err(CaseNumberError::Malformed {
                input: number.to_string(),
                reason: "sequence starts at 1".to_string(),
            });
        }
        if !(1..=12).contains(&bucket.month) || !(0..=9999).contains(&bucket.year) {
            return Err(CaseNumberError::Malformed {
                input: number.to_string(),
                reason: format!("bucket {} is out of range", bucket),
            });
        }
        Ok(number)
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn sequence(&self) -> u32 {
        self.sequence
    }

    pub fn bucket(&self) -> Bucket {
        Bucket::new(self.year, self.month)
    }
}

impl std::fmt::Display for CaseNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}-{:04}-{:02}-{:04}",
            CASE_NUMBER_PREFIX, self.year, self.month, self.sequence
        )
    }
}

impl std::str::FromStr for CaseNumber {
    type Err = CaseNumberError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = |reason: &str| CaseNumberError::Malformed {
            input: s.to_string(),
            reason: reason.to_string(),
        };

        let parts: Vec<&str> = s.trim().split('-').collect();
        let [prefix, year, month, sequence] = parts.as_slice() else {
            return Err(malformed("expected JC-YYYY-MM-XXXX"));
        };
        if !prefix.eq_ignore_ascii_case(CASE_NUMBER_PREFIX) {
            return Err(malformed("missing JC prefix"));
        }
        if year.len() != 4 || month.len() != 2 || sequence.len() != 4 {
            return Err(malformed("expected JC-YYYY-MM-XXXX"));
        }

        let year: i32 = year.parse().map_err(|_| malformed("year is not numeric"))?;
        let month: u32 = month.parse().map_err(|_| malformed("month is not numeric"))?;
        let sequence: u32 = sequence
            .parse()
            .map_err(|_| malformed("sequence is not numeric"))?;

        CaseNumber::new(Bucket::new(year, month), sequence)
    }
}

impl Serialize for CaseNumber {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CaseNumber {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Mints case numbers for filing instants
#[derive(Debug, Clone, Copy)]
pub struct CaseNumberGenerator {
    offset: FixedOffset,
}

impl Default for CaseNumberGenerator {
    fn default() -> Self {
        Self::utc()
    }
}

impl CaseNumberGenerator {
    /// Buckets are derived from the filing instant seen at `offset`
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }

    pub fn utc() -> Self {
        Self { offset: Utc.fix() }
    }

    pub fn bucket_for(&self, filed_at: DateTime<Utc>) -> Bucket {
        Bucket::containing(filed_at, self.offset)
    }

    /// Allocate the next number in the bucket of `filed_at`
    pub fn generate<S: CaseStore + ?Sized>(
        &self,
        store: &S,
        filed_at: DateTime<Utc>,
    ) -> Result<CaseNumber, CaseNumberError> {
        let bucket = self.bucket_for(filed_at);
        let sequence = SequenceAllocator::new(store).allocate(bucket)?;
        CaseNumber::new(bucket, sequence)
    }
}
