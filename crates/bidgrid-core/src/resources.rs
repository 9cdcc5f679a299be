//! Componentwise resource accounting.
//!
//! A rep's capacity is a triple of memory, disk, and container slots.
//! Arithmetic is componentwise. Values are signed so that an over-committed
//! ledger is representable and detectable, but every capacity handed to the
//! core must be non-negative.

use std::ops::{Add, AddAssign, Sub, SubAssign};

use serde::{Deserialize, Serialize};

/// Resource triple for a rep or a single instance footprint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Resources {
    #[serde(rename = "MemoryMB")]
    pub memory_mb: i64,
    #[serde(rename = "DiskMB")]
    pub disk_mb: i64,
    pub containers: i64,
}

impl Resources {
    pub fn new(memory_mb: i64, disk_mb: i64, containers: i64) -> Self {
        Self {
            memory_mb,
            disk_mb,
            containers,
        }
    }

    /// Whether an instance needing `memory_mb`/`disk_mb` and one container
    /// slot fits in these (remaining) resources.
    pub fn has_room_for(&self, memory_mb: i64, disk_mb: i64) -> bool {
        self.memory_mb >= memory_mb && self.disk_mb >= disk_mb && self.containers > 0
    }

    /// True when every component is non-negative.
    pub fn is_non_negative(&self) -> bool {
        self.memory_mb >= 0 && self.disk_mb >= 0 && self.containers >= 0
    }

    /// True when every component is strictly positive.
    ///
    /// Reps with a zero capacity on any axis cannot be scored (the bid
    /// formula divides by each total) and are rejected at construction.
    pub fn is_strictly_positive(&self) -> bool {
        self.memory_mb > 0 && self.disk_mb > 0 && self.containers > 0
    }
}

impl Add for Resources {
    type Output = Resources;

    fn add(self, rhs: Resources) -> Resources {
        Resources {
            memory_mb: self.memory_mb + rhs.memory_mb,
            disk_mb: self.disk_mb + rhs.disk_mb,
            containers: self.containers + rhs.containers,
        }
    }
}

impl AddAssign for Resources {
    fn add_assign(&mut self, rhs: Resources) {
        *self = *self + rhs;
    }
}

impl Sub for Resources {
    type Output = Resources;

    fn sub(self, rhs: Resources) -> Resources {
        Resources {
            memory_mb: self.memory_mb - rhs.memory_mb,
            disk_mb: self.disk_mb - rhs.disk_mb,
            containers: self.containers - rhs.containers,
        }
    }
}

impl SubAssign for Resources {
    fn sub_assign(&mut self, rhs: Resources) {
        *self = *self - rhs;
    }
}
