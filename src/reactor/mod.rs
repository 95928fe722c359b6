//! Reactor core: watchers, the readiness poll cycle, and its OS seams.
//!
//! The poll cycle carries all of the edge-case logic in this crate.
//! Everything around it is deliberately thin:
//! - [`watcher`] holds the caller-owned registrations,
//! - [`multiplex`] is the blocking primitive seam (`poll(2)` in production),
//! - [`clock`] supplies monotonic readings,
//! - [`poller`] runs the cycle and dispatches ready watchers.
//!
//! The owning reactor decides when to poll and with what budget; this
//! module never drives itself.

pub(crate) mod clock;
pub(crate) mod event;
pub(crate) mod multiplex;
pub(crate) mod poller;
pub(crate) mod watcher;
