//! Watch sysfs GPIO input lines for changes from a single thread.
//!
//! A [`Watcher`] owns one background thread which waits for edges on every
//! registered pin at once (`select(2)` by default, `poll(2)` with the `poll`
//! feature) and hands each change out as a [`Notification`]. Pins are added
//! and removed from any thread through cheap [`WatcherHandle`]s.
//!
//! ```no_run
//! use gpiowatch::{EdgeType, LogicLevel, Pin, Watcher};
//!
//! # fn main() -> gpiowatch::errors::Result<()> {
//! let watcher = Watcher::new()?;
//! watcher.add_pin(Pin(22), EdgeType::Rising | EdgeType::Falling, LogicLevel::ActiveHigh)?;
//! watcher.add_pin(Pin(27), EdgeType::Rising, LogicLevel::ActiveLow)?;
//!
//! loop {
//!     let change = watcher.watch()?;
//!     println!("{} is now {}", change.pin, change.value);
//! }
//! # }
//! ```
//!
//! Notifications are delivered through a bounded queue. When consumers fall
//! behind, new notifications are dropped rather than stalling the loop, and
//! toggles faster than the loop can re-read a pin may be missed entirely.
//! Debouncing is left to the caller.

/// Common Platform API Binding Interface
pub mod binding;

/// Errors produced by this crate
pub mod errors;

/// `select(2)` readiness multiplexer
pub mod select;

/// `poll(2)` readiness multiplexer
pub mod poll;

/// The sysfs gpio class
pub mod sysfs;

/// Descriptor max-heap
pub mod heap;

// To Re-Export
mod builder;
mod events;
mod futures;
mod handle;

pub use binding::{Interest, Multiplexer, PinHandle, ReadySet};
pub use builder::*;
pub use events::*;
pub use futures::*;
pub use handle::*;
pub use sysfs::{InputPin, OutputPin, Sysfs, SysfsPin};

cfg_if::cfg_if! {
    if #[cfg(feature = "poll")] {
        /// Default Platform Bindings which will be used.
        pub type Platform = poll::PollMultiplexer;
    } else {
        /// Default Platform Bindings which will be used.
        pub type Platform = select::SelectMultiplexer;
    }
}

// Internals

/// Types used to communicate between the loop thread and user-facing
/// types.
mod bridge;

/// Logging facade
mod log;

/// Registry for keeping track of watched pins.
mod registry;

/// State which is shared between the loop and handles.
mod shared;

/// Resource state reporting.
mod stats;

/// Loop implementation
mod task;

#[cfg(test)]
mod testing;
