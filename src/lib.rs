//! Bounded lock-free multi-producer / multi-consumer queues.
//!
//! [`RingQueue`] is a fixed-capacity ring driven only by atomic counters and
//! compare-and-swap. It never parks a thread: a put into a full ring, a get
//! from an empty one, or a lost race for a ticket comes back as an error and
//! the caller decides whether to retry.

pub mod error;
pub mod mpmc;
pub mod trace;

mod sync;

pub use error::{BatchError, CapacityError, GetError, PutError};
pub use mpmc::{Batch, QueueConfig, RingQueue};

/// Common interface for all queues.
pub trait MpmcQueue<T: Send>: Send + Sync + 'static {
    /// Error on push when the queue is full or contended.
    type PushError;
    /// Error on pop when the queue is empty or contended.
    type PopError;

    fn push(&self, item: T) -> Result<(), Self::PushError>;
    fn pop(&self) -> Result<T, Self::PopError>;

    /// True when a subsequent `push` *may* succeed without blocking.
    fn available(&self) -> bool;
    /// True when a subsequent `pop` will *likely* fail.
    fn empty(&self) -> bool;
}
