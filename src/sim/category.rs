//! Collision category masks
//!
//! Every fixture carries a category (what it is) and a mask (what it may
//! touch). The classifier routes contacts by the unordered pair of categories.

use serde::{Deserialize, Serialize};

bitflags::bitflags! {
    /// Role of a fixture for filtering and classification
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
    pub struct Category: u16 {
        /// Static level geometry
        const WALL = 0x0001;
        /// Player-launched objects
        const PROJECTILE = 0x0002;
        /// Objects the player scores by destroying
        const TARGET = 0x0004;
        /// Trigger volumes that report contacts but never push back
        const SENSOR = 0x0008;
    }
}

impl Category {
    /// True when the mask declares at least one role this crate knows about
    pub fn is_recognized(&self) -> bool {
        !self.is_empty() && Category::all().contains(*self)
    }
}

/// Unordered pair of categories used as the routing key
///
/// `PairKey::new(a, b) == PairKey::new(b, a)` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PairKey {
    low: Category,
    high: Category,
}

impl PairKey {
    pub fn new(a: Category, b: Category) -> Self {
        if a <= b {
            Self { low: a, high: b }
        } else {
            Self { low: b, high: a }
        }
    }

    /// True when `(a, b)` is already in key order
    pub fn is_ordered(a: Category, b: Category) -> bool {
        a <= b
    }

    pub fn low(&self) -> Category {
        self.low
    }

    pub fn high(&self) -> Category {
        self.high
    }
}
