//! # Vigilis
//!
//! **Vigilis** is the readiness-polling core of an event-driven I/O
//! reactor: the one piece of an event loop where OS blocking semantics,
//! monotonic time accounting, and interrupted-syscall retries meet.
//!
//! Given a set of descriptors with registered interest, a [`Poller`] blocks
//! for readiness up to a bounded time budget, keeps the budget honest when
//! a signal interrupts the wait, and dispatches every ready watcher's
//! callback exactly once per cycle. It does not own the watcher registry,
//! decide when to poll, or interpret what a callback does; that is the
//! surrounding reactor's business.
//!
//! - A **watcher** ties a descriptor to an interest mask ([`Events`]) and a
//!   dispatch callback, registered in a caller-owned [`WatcherSet`]
//! - **One cycle** snapshots the set, blocks on `poll(2)`, and dispatches
//!   the ready batch in snapshot order
//! - **Signal interruption** is retried with the remaining budget, never
//!   surfaced to the caller
//! - **Trait seams** ([`Multiplex`], [`MonotonicClock`]) let a harness
//!   inject timeouts, interruptions, and fatal outcomes deterministically
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::time::Duration;
//! use vigilis::{Events, Poller, Watcher, WatcherSet};
//!
//! let mut set = WatcherSet::new();
//! set.register(Watcher::new(fd, Events::READABLE, |_set, watcher, observed| {
//!     println!("fd {} is ready: {observed:?}", watcher.fd());
//! }));
//!
//! let mut poller = Poller::new();
//! poller.poll_once(&mut set, Some(Duration::from_millis(500)));
//! ```
//!
//! ## Modules
//!
//! - [`os`] — host and process queries (uptime, memory, interfaces, title)
//!
//! Vigilis targets the `poll(2)` platform family; it is single-threaded by
//! construction and its core types are intentionally not `Send`.

mod reactor;

pub mod os;

pub use reactor::clock::{MonotonicClock, SysClock};
pub use reactor::event::Events;
pub use reactor::multiplex::{Multiplex, PollRequest, SysPoll, WaitStatus};
pub use reactor::poller::Poller;
pub use reactor::watcher::{Dispatch, Watcher, WatcherSet};
