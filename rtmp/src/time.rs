//! Stream timestamps are carried on the wire as milliseconds in an unsigned 32 bit
//! field, so a long-lived stream will eventually wrap back through zero.  `RtmpTimestamp`
//! wraps the raw value and gives it arithmetic and ordering that stay correct across
//! that rollover.
//!
//! Ordering treats the u32 range as a circle: two values are compared along the shorter
//! arc between them, so a value that has just wrapped past zero still sorts after one
//! from shortly before the wrap.  Values exactly half the range apart have no meaningful
//! order, and such gaps never occur between timestamps of a live stream.
//!
//! ```
//! use freshet_rtmp::time::RtmpTimestamp;
//!
//! let before_wrap = RtmpTimestamp::new(u32::max_value() - 500);
//! let after_wrap = before_wrap + 1000;
//!
//! assert_eq!(after_wrap.value, 499);
//! assert!(after_wrap > before_wrap);
//! assert_eq!(after_wrap - before_wrap, RtmpTimestamp::new(1000));
//! ```

use std::cmp::Ordering;
use std::ops::{Add, Sub};

const HALF_RANGE: u32 = 1 << 31;

/// A wire timestamp in milliseconds, with rollover-aware arithmetic and ordering.
#[derive(Eq, PartialEq, Debug, Copy, Clone)]
pub struct RtmpTimestamp {
    /// The raw millisecond value as it appears on the wire
    pub value: u32,
}

impl RtmpTimestamp {
    pub fn new(value: u32) -> Self {
        RtmpTimestamp { value }
    }

    /// Replaces the current value, for headers that carry an absolute time rather
    /// than a delta
    pub fn set(&mut self, new_value: u32) {
        self.value = new_value;
    }
}

impl Add<u32> for RtmpTimestamp {
    type Output = RtmpTimestamp;

    fn add(self, delta: u32) -> Self {
        RtmpTimestamp {
            value: self.value.wrapping_add(delta),
        }
    }
}

impl Sub for RtmpTimestamp {
    type Output = RtmpTimestamp;

    fn sub(self, other: RtmpTimestamp) -> Self {
        RtmpTimestamp {
            value: self.value.wrapping_sub(other.value),
        }
    }
}

impl Ord for RtmpTimestamp {
    fn cmp(&self, other: &Self) -> Ordering {
        if self.value == other.value {
            return Ordering::Equal;
        }

        // Shorter-arc rule: a forward distance under half the range means self is
        // behind other, anything larger means self has lapped past it
        match other.value.wrapping_sub(self.value) < HALF_RANGE {
            true => Ordering::Less,
            false => Ordering::Greater,
        }
    }
}

impl PartialEq<u32> for RtmpTimestamp {
    fn eq(&self, other: &u32) -> bool {
        self.value == *other
    }
}

impl PartialOrd for RtmpTimestamp {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
