//! Logical timers for a single-threaded host loop.
//!
//! Nothing here sleeps: the host advances the clock and the scheduler hands
//! back whichever timers came due, in due order.

pub mod debounce;
pub mod timers;

pub use debounce::{Debouncer, PeriodicTask};
pub use timers::{Scheduler, TimerId};
