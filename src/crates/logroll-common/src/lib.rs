//! Common types shared across the logroll crates.
//!
//! Currently this is the clock abstraction: every component that needs the
//! current time receives an `Arc<dyn Clock>` so tests can drive rotation and
//! retention with simulated time instead of real delays.

pub mod clock;

pub use clock::{Clock, ManualClock, SystemClock};
