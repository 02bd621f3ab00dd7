// Bounded lock-free multi-producer / multi-consumer ring queue.
//
// Producers and consumers claim *tickets* by CAS on two never-wrapping
// position counters. A ticket `t` owns slot `t & mask` for one generation;
// each slot carries a pair of sequence numbers telling which ticket may
// touch it next, so holders of tickets `t` and `t + capacity` never meet in
// the same slot. Nothing ever blocks: a full/empty ring or a lost CAS is
// reported back to the caller.

use crate::error::{BatchError, CapacityError, GetError, PutError};
use crate::mpmc::config::{round_capacity, QueueConfig};
use crate::sync::{pause, yield_now, AtomicU64, Ordering, SpinWait, UnsafeCell};
use crate::trace::{debug, trace};
use crate::MpmcQueue;
use crossbeam::utils::CachePadded;
use std::{fmt, time::Duration};

/*──────────────────────────────────────────────────────────────────────────*/
/*  Slot                                                                    */
/*──────────────────────────────────────────────────────────────────────────*/

// Writable by ticket `t` when `put_seq == get_seq == t`.
// Readable by ticket `t` when `get_seq == t` and `put_seq == t + capacity`.
struct Slot<T> {
   put_seq: AtomicU64,
   get_seq: AtomicU64,
   value: UnsafeCell<Option<T>>,
}

impl<T> Slot<T> {
   fn new(seq: u64) -> Self {
      Slot {
         put_seq: AtomicU64::new(seq),
         get_seq: AtomicU64::new(seq),
         value: UnsafeCell::new(None),
      }
   }
}

/*──────────────────────────────────────────────────────────────────────────*/
/*  Ring header                                                             */
/*──────────────────────────────────────────────────────────────────────────*/

/// Fixed-capacity lock-free MPMC queue.
///
/// Share it between threads behind an `Arc`. All operations take `&self`
/// and either complete or report why they could not; see [`PutError`],
/// [`GetError`] and [`BatchError`].
///
/// Values come out in the order their put tickets were issued, whichever
/// threads performed the operations.
pub struct RingQueue<T> {
   capacity: u64,
   mask: u64,                      // capacity − 1
   put_pos: CachePadded<AtomicU64>, // last issued put ticket
   get_pos: CachePadded<AtomicU64>, // last issued get ticket
   slots: Box<[Slot<T>]>,
   backoff: Duration,
}

unsafe impl<T: Send> Send for RingQueue<T> {}
unsafe impl<T: Send> Sync for RingQueue<T> {}

/// Result of a batch operation that went through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Batch {
   /// Values moved into (or out of) the ring.
   pub transferred: usize,
   /// Occupancy after the batch, relative to the snapshot it acted on.
   pub occupied: u64,
}

/*────────────────────────────  construction  ──────────────────────────────*/

impl<T> RingQueue<T> {
   /// Build a ring with room for `capacity` values, rounded up to the next
   /// power of two. `backoff` is slept when the ring is observed full
   /// (on put) or empty (on get).
   pub fn new(capacity: u64, backoff: Duration) -> Result<Self, CapacityError> {
      let cap = round_capacity(capacity)?;

      // Ticket 0 is never issued, so slot 0 is first reached by ticket `cap`.
      let slots = (0..cap)
         .map(|i| Slot::new(if i == 0 { cap } else { i }))
         .collect::<Vec<_>>()
         .into_boxed_slice();

      debug!(requested = capacity, capacity = cap, ?backoff, "ring queue created");

      Ok(RingQueue {
         capacity: cap,
         mask: cap - 1,
         put_pos: CachePadded::new(AtomicU64::new(0)),
         get_pos: CachePadded::new(AtomicU64::new(0)),
         slots,
         backoff,
      })
   }

   pub fn with_config(config: QueueConfig) -> Result<Self, CapacityError> {
      Self::new(config.capacity, config.backoff)
   }

   #[inline]
   fn slot(&self, ticket: u64) -> &Slot<T> {
      &self.slots[(ticket & self.mask) as usize]
   }
}

/*──────────────────────────  slot handoff  ────────────────────────────────*/

impl<T> RingQueue<T> {
   // Wait for the previous generation's reader to vacate the slot, then
   // publish `value` for the reader holding the same ticket.
   #[inline]
   fn write_slot(&self, ticket: u64, value: T) {
      let slot = self.slot(ticket);
      let wait = SpinWait::new();
      loop {
         let get_seq = slot.get_seq.load(Ordering::Acquire);
         let put_seq = slot.put_seq.load(Ordering::Acquire);
         if put_seq == ticket && get_seq == ticket {
            break;
         }
         wait.snooze();
      }

      // SAFETY: the sequence pair matches our ticket and only one ticket
      // holder per generation gets here, so nobody else touches the cell
      // until `put_seq` moves.
      slot.value.with_mut(|cell| unsafe { *cell = Some(value) });
      slot.put_seq.fetch_add(self.capacity, Ordering::Release);
   }

   // Wait for the writer holding `ticket` to publish, then move the value
   // out and free the slot for ticket `ticket + capacity`.
   #[inline]
   fn read_slot(&self, ticket: u64) -> T {
      let slot = self.slot(ticket);
      let wait = SpinWait::new();
      loop {
         let get_seq = slot.get_seq.load(Ordering::Acquire);
         let put_seq = slot.put_seq.load(Ordering::Acquire);
         if get_seq == ticket && put_seq == get_seq.wrapping_add(self.capacity) {
            break;
         }
         wait.snooze();
      }

      // SAFETY: the writer released `put_seq` after storing the value and
      // we acquired it above; we are the only reader for this generation.
      let value = slot.value.with_mut(|cell| unsafe { (*cell).take() });
      slot.get_seq.fetch_add(self.capacity, Ordering::Release);

      value.expect("readable slot holds a value")
   }
}

/*─────────────────────────── queue operations ─────────────────────────────*/

impl<T> RingQueue<T> {
   /// Try to enqueue one value.
   ///
   /// On success returns the occupancy including this value. If the ring is
   /// observed full the call sleeps for the back-off first; if another
   /// producer wins the ticket it yields once. Either way the value comes
   /// back inside the error.
   pub fn put(&self, value: T) -> Result<u64, PutError<T>> {
      let get_pos = self.get_pos.load(Ordering::Acquire);
      let put_pos = self.put_pos.load(Ordering::Acquire);
      let occupied = put_pos.saturating_sub(get_pos);

      if occupied >= self.capacity {
         trace!(occupied, "put: full");
         pause(self.backoff);
         return Err(PutError::Full { value, occupied });
      }

      let ticket = put_pos + 1;
      if self
         .put_pos
         .compare_exchange(put_pos, ticket, Ordering::AcqRel, Ordering::Relaxed)
         .is_err()
      {
         trace!(occupied, "put: contended");
         yield_now();
         return Err(PutError::Contended { value, occupied });
      }

      self.write_slot(ticket, value);
      Ok(occupied + 1)
   }

   /// Try to dequeue one value.
   ///
   /// On success returns the value and the occupancy left behind it.
   pub fn get(&self) -> Result<(T, u64), GetError> {
      let put_pos = self.put_pos.load(Ordering::Acquire);
      let get_pos = self.get_pos.load(Ordering::Acquire);
      let occupied = put_pos.saturating_sub(get_pos);

      if occupied < 1 {
         trace!(occupied, "get: empty");
         pause(self.backoff);
         return Err(GetError::Empty { occupied });
      }

      let ticket = get_pos + 1;
      if self
         .get_pos
         .compare_exchange(get_pos, ticket, Ordering::AcqRel, Ordering::Relaxed)
         .is_err()
      {
         trace!(occupied, "get: contended");
         yield_now();
         return Err(GetError::Contended { occupied });
      }

      let value = self.read_slot(ticket);
      Ok((value, occupied - 1))
   }

   /// Enqueue as many values from the front of `values` as currently fit,
   /// reserving all of their tickets with a single CAS.
   ///
   /// Moved values are drained from `values` in order; whatever did not
   /// fit stays there. Nothing is moved when an error is returned.
   pub fn puts(&self, values: &mut Vec<T>) -> Result<Batch, BatchError> {
      let get_pos = self.get_pos.load(Ordering::Acquire);
      let put_pos = self.put_pos.load(Ordering::Acquire);
      let occupied = put_pos.saturating_sub(get_pos);

      if values.is_empty() {
         return Ok(Batch { transferred: 0, occupied });
      }
      if occupied >= self.capacity {
         trace!(occupied, "puts: full");
         pause(self.backoff);
         return Err(BatchError::Full { occupied });
      }

      let count = (values.len() as u64).min(self.capacity - occupied);
      if self
         .put_pos
         .compare_exchange(put_pos, put_pos + count, Ordering::AcqRel, Ordering::Relaxed)
         .is_err()
      {
         trace!(occupied, count, "puts: contended");
         yield_now();
         return Err(BatchError::Contended { occupied });
      }

      for (ticket, value) in (put_pos + 1..).zip(values.drain(..count as usize)) {
         self.write_slot(ticket, value);
      }
      Ok(Batch {
         transferred: count as usize,
         occupied: occupied + count,
      })
   }

   /// Dequeue up to `max` values, appending them to `out` in FIFO order,
   /// reserving all of their tickets with a single CAS.
   pub fn gets(&self, out: &mut Vec<T>, max: usize) -> Result<Batch, BatchError> {
      let put_pos = self.put_pos.load(Ordering::Acquire);
      let get_pos = self.get_pos.load(Ordering::Acquire);
      let occupied = put_pos.saturating_sub(get_pos);

      if max == 0 {
         return Ok(Batch { transferred: 0, occupied });
      }
      if occupied < 1 {
         trace!(occupied, "gets: empty");
         pause(self.backoff);
         return Err(BatchError::Empty { occupied });
      }

      let count = occupied.min(max as u64);
      if self
         .get_pos
         .compare_exchange(get_pos, get_pos + count, Ordering::AcqRel, Ordering::Relaxed)
         .is_err()
      {
         trace!(occupied, count, "gets: contended");
         yield_now();
         return Err(BatchError::Contended { occupied });
      }

      out.reserve(count as usize);
      for ticket in get_pos + 1..=get_pos + count {
         out.push(self.read_slot(ticket));
      }
      Ok(Batch {
         transferred: count as usize,
         occupied: occupied - count,
      })
   }
}

/*──────────────────────────── introspection ───────────────────────────────*/

impl<T> RingQueue<T> {
   #[inline]
   pub fn capacity(&self) -> u64 {
      self.capacity
   }

   #[inline]
   pub fn backoff(&self) -> Duration {
      self.backoff
   }

   /// Number of values currently queued.
   ///
   /// Taken from two independent loads, so under concurrent use this is an
   /// estimate, never more than [`capacity`](Self::capacity).
   pub fn quantity(&self) -> u64 {
      let get_pos = self.get_pos.load(Ordering::Acquire);
      let put_pos = self.put_pos.load(Ordering::Acquire);
      put_pos.saturating_sub(get_pos).min(self.capacity)
   }

   #[inline]
   pub fn is_empty(&self) -> bool {
      self.quantity() == 0
   }

   #[inline]
   pub fn is_full(&self) -> bool {
      self.quantity() >= self.capacity
   }
}

// The two positions are loaded independently and may disagree under load.
impl<T> fmt::Display for RingQueue<T> {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      let get_pos = self.get_pos.load(Ordering::Acquire);
      let put_pos = self.put_pos.load(Ordering::Acquire);
      write!(
         f,
         "RingQueue{{capacity: {}, mask: {}, putPos: {}, getPos: {}}}",
         self.capacity, self.mask, put_pos, get_pos
      )
   }
}

impl<T> fmt::Debug for RingQueue<T> {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      f.debug_struct("RingQueue")
         .field("capacity", &self.capacity)
         .field("put_pos", &self.put_pos.load(Ordering::Relaxed))
         .field("get_pos", &self.get_pos.load(Ordering::Relaxed))
         .field("backoff", &self.backoff)
         .finish()
   }
}

/*────────────────────────────  common trait  ──────────────────────────────*/

impl<T: Send + 'static> MpmcQueue<T> for RingQueue<T> {
   type PushError = PutError<T>;
   type PopError = GetError;

   #[inline]
   fn push(&self, item: T) -> Result<(), Self::PushError> {
      self.put(item).map(|_| ())
   }

   #[inline]
   fn pop(&self) -> Result<T, Self::PopError> {
      self.get().map(|(value, _)| value)
   }

   #[inline]
   fn available(&self) -> bool {
      !self.is_full()
   }

   #[inline]
   fn empty(&self) -> bool {
      self.is_empty()
   }
}
