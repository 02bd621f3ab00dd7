mod config;
mod ring;

pub use config::{round_capacity, QueueConfig, DEFAULT_CAPACITY};
pub use ring::{Batch, RingQueue};
