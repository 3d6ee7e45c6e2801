//! In-process threading core: two-lane pipes, single-resolution futures,
//! and FIFO actors over native OS threads.
//!
//! Everything queue-shaped here is the same hybrid ring-buffer discipline:
//! free-running u32 counters compared with wrapping arithmetic for the
//! lock-free fast path, one mutex + condvar per transport for parking when
//! a lane runs empty or full.
//!
//! ## Modules
//!
//! - `ring` - SPSC ring lane and the park/wake gate
//! - `pipe` - two-lane request/reply transport for a cooperating pair
//! - `future` - single-resolution promise/future pair
//! - `thread` - native thread wrapper with exit values
//! - `actor` - object + worker thread + FIFO invocation queue
//! - `metrics` - atomic dispatch counters

#![deny(unsafe_op_in_unsafe_fn)]

pub mod actor;
pub mod future;
pub mod metrics;
pub mod pipe;
pub mod ring;
pub mod thread;

/// Prelude for convenient imports of primary API types.
pub mod prelude {
    pub use crate::actor::Actor;
    pub use crate::future::{Future, Promise, TaskError};
    pub use crate::metrics::MetricsSnapshot;
    pub use crate::pipe::Pipe;
    pub use crate::thread::{Thread, ThreadError};
}

// Re-export primary types at crate root for convenience.
pub use actor::Actor;
pub use future::{Future, Promise, TaskError};
pub use metrics::MetricsSnapshot;
pub use pipe::Pipe;
pub use ring::{Gate, Ring};
pub use thread::{Thread, ThreadError};
