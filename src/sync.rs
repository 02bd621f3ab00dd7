// Synchronisation primitives used by the rings.
//
// Under `--cfg loom` everything comes from loom so the slot protocol can be
// model-checked; otherwise std atomics and crossbeam's back-off are used.
// The std `UnsafeCell` is wrapped to expose loom's closure-based API.

use std::time::Duration;

#[cfg(loom)]
pub(crate) use loom::sync::atomic::{AtomicU64, Ordering};
#[cfg(not(loom))]
pub(crate) use std::sync::atomic::{AtomicU64, Ordering};

#[cfg(loom)]
pub(crate) use loom::thread::yield_now;
#[cfg(not(loom))]
pub(crate) use std::thread::yield_now;

#[cfg(loom)]
pub(crate) use loom::cell::UnsafeCell;

#[cfg(not(loom))]
#[derive(Debug)]
pub(crate) struct UnsafeCell<T>(std::cell::UnsafeCell<T>);

#[cfg(not(loom))]
impl<T> UnsafeCell<T> {
   #[inline]
   pub(crate) const fn new(data: T) -> Self {
      UnsafeCell(std::cell::UnsafeCell::new(data))
   }

   #[inline]
   pub(crate) fn with_mut<R>(&self, f: impl FnOnce(*mut T) -> R) -> R {
      f(self.0.get())
   }
}

/// Busy-wait helper for the per-slot handoff: spins a little, then yields
/// the time slice on every further round. Never parks.
pub(crate) struct SpinWait {
   #[cfg(not(loom))]
   backoff: crossbeam::utils::Backoff,
}

impl SpinWait {
   #[inline]
   pub(crate) fn new() -> Self {
      SpinWait {
         #[cfg(not(loom))]
         backoff: crossbeam::utils::Backoff::new(),
      }
   }

   #[inline]
   pub(crate) fn snooze(&self) {
      #[cfg(loom)]
      loom::thread::yield_now();
      #[cfg(not(loom))]
      self.backoff.snooze();
   }
}

/// Sleep used when a ring is observed full or empty.
#[inline]
pub(crate) fn pause(backoff: Duration) {
   if backoff.is_zero() {
      return;
   }
   #[cfg(loom)]
   loom::thread::yield_now();
   #[cfg(not(loom))]
   std::thread::sleep(backoff);
}
