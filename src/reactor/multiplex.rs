//! Blocking multiplex primitive.
//!
//! This module is the seam between the poll cycle and the OS: a trait that
//! blocks on a batch of descriptor requests and reports one of four
//! outcomes, plus the `poll(2)` implementation used in production.
//!
//! The trait exists so a harness can drive the cycle through interruption,
//! timeout, and fatal outcomes deterministically; the cycle itself never
//! touches the OS directly.

use std::io;
use std::os::fd::RawFd;

use crate::reactor::event::Events;

/// One entry of a per-cycle poll request.
///
/// Pairs a descriptor with its requested mask and, after the blocking call,
/// the mask the multiplexer observed. Entries live for a single cycle and
/// are never persisted.
#[derive(Debug, Clone, Copy)]
pub struct PollRequest {
    /// The descriptor to wait on.
    pub fd: RawFd,

    /// Event kinds the watcher asked for.
    pub interest: Events,

    /// Event kinds observed by the last wait; empty until then.
    pub observed: Events,
}

impl PollRequest {
    /// Creates a request entry with an empty observed mask.
    pub fn new(fd: RawFd, interest: Events) -> Self {
        Self {
            fd,
            interest,
            observed: Events::empty(),
        }
    }
}

/// Outcome of one blocking wait.
pub enum WaitStatus {
    /// At least one descriptor observed events; the count is the number of
    /// entries with a non-empty observed mask.
    Ready(usize),

    /// The time budget elapsed with no descriptor ready.
    TimedOut,

    /// The wait was aborted by asynchronous signal delivery. This is the
    /// only retryable outcome.
    Interrupted,

    /// Any other failure of the primitive. Not recoverable; the cycle
    /// aborts the process.
    Fatal(io::Error),
}

/// A blocking readiness multiplexer.
pub trait Multiplex {
    /// Blocks until a requested descriptor is ready, the budget elapses, or
    /// a signal interrupts the wait.
    ///
    /// `timeout_ms` is a millisecond budget; `0` probes without blocking
    /// and `-1` blocks indefinitely. On [`WaitStatus::Ready`] the observed
    /// masks are written into `requests`.
    fn wait(&mut self, requests: &mut [PollRequest], timeout_ms: i32) -> WaitStatus;
}

/// `poll(2)`-backed multiplexer.
///
/// Owns a reusable `pollfd` buffer that is rebuilt from the request slice
/// on every wait.
pub struct SysPoll {
    fds: Vec<libc::pollfd>,
}

impl SysPoll {
    /// Creates a multiplexer with an empty descriptor buffer.
    pub fn new() -> Self {
        Self { fds: Vec::new() }
    }
}

impl Default for SysPoll {
    fn default() -> Self {
        Self::new()
    }
}

impl Multiplex for SysPoll {
    fn wait(&mut self, requests: &mut [PollRequest], timeout_ms: i32) -> WaitStatus {
        self.fds.clear();
        self.fds.extend(requests.iter().map(|request| libc::pollfd {
            fd: request.fd,
            events: poll_events(request.interest),
            revents: 0,
        }));

        let rc = unsafe {
            libc::poll(
                self.fds.as_mut_ptr(),
                self.fds.len() as libc::nfds_t,
                timeout_ms,
            )
        };

        if rc < 0 {
            let err = io::Error::last_os_error();
            if err.kind() == io::ErrorKind::Interrupted {
                return WaitStatus::Interrupted;
            }
            return WaitStatus::Fatal(err);
        }

        if rc == 0 {
            return WaitStatus::TimedOut;
        }

        for (request, pfd) in requests.iter_mut().zip(self.fds.iter()) {
            request.observed = observed_events(pfd.revents);
        }

        WaitStatus::Ready(rc as usize)
    }
}

/// Translates an interest mask into `poll(2)` request flags.
///
/// `POLLERR` and `POLLHUP` are accepted in the interest mask but are always
/// reported by the kernel regardless of the request.
fn poll_events(interest: Events) -> i16 {
    let mut events = 0;

    if interest.contains(Events::READABLE) {
        events |= libc::POLLIN;
    }
    if interest.contains(Events::WRITABLE) {
        events |= libc::POLLOUT;
    }
    if interest.contains(Events::ERROR) {
        events |= libc::POLLERR;
    }
    if interest.contains(Events::HANGUP) {
        events |= libc::POLLHUP;
    }

    events
}

/// Translates `poll(2)` `revents` into an observed mask.
///
/// Only the four dispatchable kinds are carried over; `POLLNVAL` and
/// friends leave the mask empty and the entry undispatched.
fn observed_events(revents: i16) -> Events {
    let mut observed = Events::empty();

    if revents & libc::POLLIN != 0 {
        observed |= Events::READABLE;
    }
    if revents & libc::POLLOUT != 0 {
        observed |= Events::WRITABLE;
    }
    if revents & libc::POLLERR != 0 {
        observed |= Events::ERROR;
    }
    if revents & libc::POLLHUP != 0 {
        observed |= Events::HANGUP;
    }

    observed
}
