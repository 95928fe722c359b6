//! The readiness poll cycle.
//!
//! This is the platform-facing step of the reactor: it converts the active
//! watcher set into a flat poll request, blocks on the multiplexer up to a
//! bounded time budget, and keeps the budget honest when a signal cuts the
//! wait short.
//!
//! Responsibilities:
//! - Snapshot the active set into a per-cycle request buffer
//! - Block for readiness with the remaining budget
//! - Recompute the budget and retry after signal interruption
//! - Dispatch ready watchers in snapshot order
//!
//! Everything recoverable is handled inside the cycle; the caller only
//! observes that the cycle returned and which callbacks ran.

use std::time::Duration;

use log::{error, trace};

use crate::reactor::clock::{MonotonicClock, NANOS_PER_MILLI, SysClock};
use crate::reactor::multiplex::{Multiplex, PollRequest, SysPoll, WaitStatus};
use crate::reactor::watcher::WatcherSet;

/// The readiness poller.
///
/// Owns the monotonic clock base, the blocking multiplexer, and a reusable
/// request buffer. One `Poller` belongs to one reactor thread; the type is
/// deliberately not `Send`, matching the single-threaded cycle discipline.
pub struct Poller<M = SysPoll, C = SysClock> {
    multiplexer: M,
    clock: C,

    /// Last-known monotonic time, milliseconds. Updated after every return
    /// from the multiplexer, whatever the outcome.
    time: u64,

    /// Per-cycle request buffer, rebuilt from the active set at the top of
    /// every cycle. Reused only for its allocation.
    requests: Vec<PollRequest>,
}

impl Poller {
    /// Creates a poller backed by `poll(2)` and `CLOCK_MONOTONIC`.
    pub fn new() -> Self {
        Self::with_parts(SysPoll::new(), SysClock)
    }
}

impl Default for Poller {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: Multiplex, C: MonotonicClock> Poller<M, C> {
    /// Creates a poller from an explicit multiplexer and clock.
    ///
    /// Production code wants [`Poller::new`]; this constructor is the
    /// injection point for harness-controlled primitives.
    pub fn with_parts(multiplexer: M, clock: C) -> Self {
        let mut poller = Self {
            multiplexer,
            clock,
            time: 0,
            requests: Vec::new(),
        };
        poller.update_time();

        poller
    }

    /// Last-known monotonic time in milliseconds.
    pub fn time(&self) -> u64 {
        self.time
    }

    /// Runs one poll cycle over the active set.
    ///
    /// Blocks until a watched descriptor becomes ready or `timeout`
    /// elapses; a `None` timeout blocks indefinitely until readiness.
    /// Ready watchers are dispatched in snapshot order before the call
    /// returns. An empty set returns immediately whatever the timeout.
    ///
    /// Signal interruption is retried with the remaining budget; it is
    /// never visible to the caller.
    pub fn poll_once(&mut self, set: &mut WatcherSet, timeout: Option<Duration>) {
        if set.is_empty() {
            assert!(
                set.entries().next().is_none(),
                "active counter disagrees with the watcher table"
            );
            return;
        }

        self.requests.clear();
        for watcher in set.entries() {
            assert!(
                !watcher.interest().is_empty(),
                "active watcher with an empty interest mask"
            );
            assert!(watcher.fd() >= 0, "active watcher with a negative descriptor");
            assert!(
                (watcher.fd() as usize) < set.capacity(),
                "active watcher outside the table range"
            );

            self.requests.push(PollRequest::new(watcher.fd(), watcher.interest()));
        }
        assert_eq!(
            self.requests.len(),
            set.len(),
            "active counter disagrees with the watcher table"
        );

        // The cycle's budget is measured from its own start, not from
        // whenever the previous cycle last touched the clock.
        self.update_time();
        let base = self.time;
        let budget = timeout_ms(timeout);
        let mut timeout = budget;

        loop {
            trace!(
                "waiting on {} descriptors, timeout {} ms",
                self.requests.len(),
                timeout
            );

            let status = self.multiplexer.wait(&mut self.requests, timeout);

            // The OS may have held the process inside the blocking call for
            // longer than the requested budget, even a zero one; that time
            // must be attributed before the outcome is interpreted.
            self.update_time();

            match status {
                WaitStatus::TimedOut => {
                    assert!(timeout != -1, "indefinite wait reported a timeout");
                    return;
                }

                WaitStatus::Interrupted => {
                    if timeout == -1 {
                        continue;
                    }
                    if timeout == 0 {
                        return;
                    }

                    let elapsed = self.time - base;
                    if elapsed >= budget as u64 {
                        return;
                    }

                    timeout = budget - elapsed as i32;
                    trace!("interrupted, {timeout} ms of budget left");
                }

                WaitStatus::Ready(count) => {
                    trace!("{count} descriptors ready");
                    self.dispatch(set);
                    return;
                }

                WaitStatus::Fatal(err) => {
                    error!("readiness wait failed: {err}");
                    std::process::abort();
                }
            }
        }
    }

    /// Dispatches every request entry with a non-empty observed mask, in
    /// snapshot order.
    ///
    /// The live table is consulted per entry: a watcher deactivated by an
    /// earlier callback in the same batch is skipped, and a watcher
    /// registered in its place receives the dispatch instead.
    fn dispatch(&self, set: &mut WatcherSet) {
        for request in &self.requests {
            if request.observed.is_empty() {
                continue;
            }

            let Some(watcher) = set.get(request.fd) else {
                continue;
            };

            watcher.invoke(set, request.observed);
        }
    }

    fn update_time(&mut self) {
        self.time = self.clock.now() / NANOS_PER_MILLI;
    }
}

/// Converts the public timeout into the millisecond budget the retry loop
/// works in: `-1` for indefinite, `0` for a non-blocking probe.
///
/// A non-zero budget below one millisecond rounds up so a short finite wait
/// never degrades into a probe.
fn timeout_ms(timeout: Option<Duration>) -> i32 {
    match timeout {
        None => -1,
        Some(d) if d.is_zero() => 0,
        Some(d) => d.as_millis().clamp(1, i32::MAX as u128) as i32,
    }
}
