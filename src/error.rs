//! Outcomes of queue operations that did not go through.
//!
//! None of these signal corruption: the ring is consistent afterwards and
//! the caller decides whether to retry, poll or give up. Every variant
//! carries the occupancy snapshot the operation acted on.

use std::fmt;
use thiserror::Error;

/// Rejected construction parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CapacityError {
   /// A ring needs at least one slot.
   #[error("capacity must be at least 1")]
   Zero,
   /// Rounding up to a power of two does not fit the address space.
   #[error("capacity {requested} cannot be rounded up to an addressable power of two")]
   TooLarge { requested: u64 },
}

/// A single put that did not happen. The value is handed back.
#[derive(Clone, PartialEq, Eq, Error)]
pub enum PutError<T> {
   /// The ring was observed full.
   #[error("queue is full ({occupied} occupied)")]
   Full { value: T, occupied: u64 },
   /// Another producer claimed the ticket first.
   #[error("lost the put ticket to another producer ({occupied} occupied)")]
   Contended { value: T, occupied: u64 },
}

impl<T> PutError<T> {
   /// Take back the value that was not enqueued.
   pub fn into_inner(self) -> T {
      match self {
         PutError::Full { value, .. } | PutError::Contended { value, .. } => value,
      }
   }

   /// Occupancy observed by the failed put.
   pub fn occupied(&self) -> u64 {
      match self {
         PutError::Full { occupied, .. } | PutError::Contended { occupied, .. } => *occupied,
      }
   }

   pub fn is_full(&self) -> bool {
      matches!(self, PutError::Full { .. })
   }

   pub fn is_contended(&self) -> bool {
      matches!(self, PutError::Contended { .. })
   }
}

// Values are often not `Debug`; keep the error printable regardless.
impl<T> fmt::Debug for PutError<T> {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      let name = match self {
         PutError::Full { .. } => "Full",
         PutError::Contended { .. } => "Contended",
      };
      f.debug_struct(name)
         .field("occupied", &self.occupied())
         .finish_non_exhaustive()
   }
}

/// A single get that did not happen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GetError {
   /// The ring was observed empty.
   #[error("queue is empty ({occupied} occupied)")]
   Empty { occupied: u64 },
   /// Another consumer claimed the ticket first.
   #[error("lost the get ticket to another consumer ({occupied} occupied)")]
   Contended { occupied: u64 },
}

impl GetError {
   pub fn occupied(&self) -> u64 {
      match *self {
         GetError::Empty { occupied } | GetError::Contended { occupied } => occupied,
      }
   }

   pub fn is_empty(&self) -> bool {
      matches!(self, GetError::Empty { .. })
   }

   pub fn is_contended(&self) -> bool {
      matches!(self, GetError::Contended { .. })
   }
}

/// A batch put or get that moved nothing.
///
/// Once a batch has reserved its tickets it always completes, so there is
/// no partial-failure variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BatchError {
   #[error("queue is full ({occupied} occupied)")]
   Full { occupied: u64 },
   #[error("queue is empty ({occupied} occupied)")]
   Empty { occupied: u64 },
   #[error("lost the ticket range to a concurrent batch ({occupied} occupied)")]
   Contended { occupied: u64 },
}

impl BatchError {
   pub fn occupied(&self) -> u64 {
      match *self {
         BatchError::Full { occupied }
         | BatchError::Empty { occupied }
         | BatchError::Contended { occupied } => occupied,
      }
   }
}
