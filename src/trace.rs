//! Optional tracing for the queues.
//!
//! Enable with `--features tracing`. Without the feature every trace macro
//! expands to nothing, so the put/get paths carry no logging cost.

/// Install a `tracing` fmt subscriber filtered by `RUST_LOG`
/// (default `mpmc_queues=trace`).
///
/// Meant for tests and benches. Calling it more than once is harmless.
/// Does nothing if the `tracing` feature is not enabled.
#[cfg(feature = "tracing")]
pub fn init_tracing() {
   use tracing_subscriber::{fmt, prelude::*, EnvFilter};

   let filter = EnvFilter::try_from_default_env()
      .unwrap_or_else(|_| EnvFilter::new("mpmc_queues=trace"));

   let _ = tracing_subscriber::registry()
      .with(
         fmt::layer()
            .with_target(true)
            .with_thread_ids(true)
            .with_thread_names(true)
            .with_timer(fmt::time::uptime()),
      )
      .with(filter)
      .try_init();
}

#[cfg(not(feature = "tracing"))]
pub const fn init_tracing() {}

#[cfg(feature = "tracing")]
pub(crate) use tracing::{debug, trace};

#[cfg(not(feature = "tracing"))]
macro_rules! trace_noop {
   ($($arg:tt)*) => {};
}

#[cfg(not(feature = "tracing"))]
macro_rules! debug_noop {
   ($($arg:tt)*) => {};
}

#[cfg(not(feature = "tracing"))]
pub(crate) use debug_noop as debug;
#[cfg(not(feature = "tracing"))]
pub(crate) use trace_noop as trace;
