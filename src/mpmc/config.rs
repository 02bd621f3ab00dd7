// Construction parameters for `RingQueue` and the capacity rounding rule.

use crate::error::CapacityError;
use std::time::Duration;

pub const DEFAULT_CAPACITY: u64 = 1024;

/// Capacity and back-off of a ring.
///
/// `capacity` is a request: the ring rounds it up to the next power of two.
/// `backoff` is how long a put (get) sleeps after observing the ring full
/// (empty) before reporting failure. `Duration::ZERO` disables the sleep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueConfig {
   pub capacity: u64,
   pub backoff: Duration,
}

impl Default for QueueConfig {
   fn default() -> Self {
      QueueConfig {
         capacity: DEFAULT_CAPACITY,
         backoff: Duration::ZERO,
      }
   }
}

impl QueueConfig {
   pub const fn new(capacity: u64, backoff: Duration) -> Self {
      QueueConfig { capacity, backoff }
   }

   pub const fn with_capacity(mut self, capacity: u64) -> Self {
      self.capacity = capacity;
      self
   }

   pub const fn with_backoff(mut self, backoff: Duration) -> Self {
      self.backoff = backoff;
      self
   }

   /// Number of slots a ring built from this config will have.
   pub fn slots(&self) -> Result<u64, CapacityError> {
      round_capacity(self.capacity)
   }
}

/// Round `requested` up to the next power of two: 2 → 2, 4 → 4, 7 → 8, 9 → 16.
///
/// Zero is rejected, as is anything whose rounding overflows `u64` or does
/// not fit a `usize` slot index on this target.
pub fn round_capacity(requested: u64) -> Result<u64, CapacityError> {
   if requested == 0 {
      return Err(CapacityError::Zero);
   }
   let rounded = requested
      .checked_next_power_of_two()
      .ok_or(CapacityError::TooLarge { requested })?;
   usize::try_from(rounded).map_err(|_| CapacityError::TooLarge { requested })?;
   Ok(rounded)
}
