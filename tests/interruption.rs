//! Budget arithmetic and retry scenarios, driven through the trait seams.
//!
//! The OS never delivers signals on cue, so these scenarios script the
//! multiplexer and the clock: each step advances simulated time and reports
//! one outcome, and the recorded timeouts show what budget the cycle asked
//! for on every wait.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::os::fd::RawFd;
use std::rc::Rc;
use std::time::Duration;

use vigilis::{
    Events, MonotonicClock, Multiplex, PollRequest, Poller, WaitStatus, Watcher, WatcherSet,
};

const MS: u64 = 1_000_000;

/// A clock that only moves when the script advances it.
struct ScriptClock(Rc<Cell<u64>>);

impl MonotonicClock for ScriptClock {
    fn now(&self) -> u64 {
        self.0.get()
    }
}

/// One scripted wait outcome; `advance_ms` is how long the "wait" took.
enum Step {
    Interrupted { advance_ms: u64 },
    TimedOut { advance_ms: u64 },
    Ready { advance_ms: u64, observed: Vec<(RawFd, Events)> },
}

/// A multiplexer that replays a script and records the budget it was
/// handed on each wait.
struct ScriptMux {
    now: Rc<Cell<u64>>,
    steps: VecDeque<Step>,
    timeouts: Rc<RefCell<Vec<i32>>>,
}

impl Multiplex for ScriptMux {
    fn wait(&mut self, requests: &mut [PollRequest], timeout_ms: i32) -> WaitStatus {
        self.timeouts.borrow_mut().push(timeout_ms);

        let step = self
            .steps
            .pop_front()
            .expect("the cycle waited more times than the script allows");

        match step {
            Step::Interrupted { advance_ms } => {
                self.now.set(self.now.get() + advance_ms * MS);
                WaitStatus::Interrupted
            }

            Step::TimedOut { advance_ms } => {
                self.now.set(self.now.get() + advance_ms * MS);
                WaitStatus::TimedOut
            }

            Step::Ready { advance_ms, observed } => {
                self.now.set(self.now.get() + advance_ms * MS);

                let mut count = 0;
                for request in requests.iter_mut() {
                    if let Some((_, events)) = observed.iter().find(|(fd, _)| *fd == request.fd) {
                        request.observed = *events;
                        count += 1;
                    }
                }

                WaitStatus::Ready(count)
            }
        }
    }
}

struct Harness {
    poller: Poller<ScriptMux, ScriptClock>,
    timeouts: Rc<RefCell<Vec<i32>>>,
}

fn harness(steps: Vec<Step>) -> Harness {
    let now = Rc::new(Cell::new(0));
    let timeouts = Rc::new(RefCell::new(Vec::new()));

    let mux = ScriptMux {
        now: now.clone(),
        steps: steps.into(),
        timeouts: timeouts.clone(),
    };

    Harness {
        poller: Poller::with_parts(mux, ScriptClock(now)),
        timeouts,
    }
}

/// A registered set with one readable-interest watcher on `fd`, plus a log
/// of its dispatches.
fn watched_set(fd: RawFd) -> (WatcherSet, Rc<RefCell<Vec<Events>>>) {
    let log = Rc::new(RefCell::new(Vec::new()));
    let mut set = WatcherSet::new();

    let dispatch_log = log.clone();
    set.register(Watcher::new(fd, Events::READABLE, move |_, _, observed| {
        dispatch_log.borrow_mut().push(observed);
    }));

    (set, log)
}

#[test]
fn an_interruption_retries_with_the_remaining_budget() {
    let mut h = harness(vec![
        Step::Interrupted { advance_ms: 30 },
        Step::TimedOut { advance_ms: 170 },
    ]);
    let (mut set, log) = watched_set(5);

    h.poller.poll_once(&mut set, Some(Duration::from_millis(200)));

    assert_eq!(
        *h.timeouts.borrow(),
        [200, 170],
        "the retry must carry exactly the unspent budget"
    );
    assert!(log.borrow().is_empty());
}

#[test]
fn repeated_interruptions_never_double_count_elapsed_time() {
    let mut h = harness(vec![
        Step::Interrupted { advance_ms: 30 },
        Step::Interrupted { advance_ms: 50 },
        Step::TimedOut { advance_ms: 120 },
    ]);
    let (mut set, _) = watched_set(5);

    h.poller.poll_once(&mut set, Some(Duration::from_millis(200)));

    assert_eq!(*h.timeouts.borrow(), [200, 170, 120]);
}

#[test]
fn an_interruption_past_the_budget_returns_immediately() {
    let mut h = harness(vec![Step::Interrupted { advance_ms: 250 }]);
    let (mut set, log) = watched_set(5);

    h.poller.poll_once(&mut set, Some(Duration::from_millis(200)));

    assert_eq!(*h.timeouts.borrow(), [200], "no budget means no retry");
    assert!(log.borrow().is_empty());
}

#[test]
fn an_interruption_exactly_at_the_budget_returns_immediately() {
    let mut h = harness(vec![Step::Interrupted { advance_ms: 200 }]);
    let (mut set, _) = watched_set(5);

    h.poller.poll_once(&mut set, Some(Duration::from_millis(200)));

    assert_eq!(*h.timeouts.borrow(), [200]);
}

#[test]
fn an_interrupted_probe_does_not_retry() {
    let mut h = harness(vec![Step::Interrupted { advance_ms: 5 }]);
    let (mut set, log) = watched_set(5);

    h.poller.poll_once(&mut set, Some(Duration::ZERO));

    assert_eq!(*h.timeouts.borrow(), [0]);
    assert!(log.borrow().is_empty());
}

#[test]
fn an_indefinite_wait_retries_interruptions_forever() {
    let mut h = harness(vec![
        Step::Interrupted { advance_ms: 10 },
        Step::Interrupted { advance_ms: 10 },
        Step::Ready { advance_ms: 10, observed: vec![(5, Events::READABLE)] },
    ]);
    let (mut set, log) = watched_set(5);

    h.poller.poll_once(&mut set, None);

    assert_eq!(
        *h.timeouts.borrow(),
        [-1, -1, -1],
        "an indefinite wait retries with the same indefinite budget"
    );
    assert_eq!(*log.borrow(), [Events::READABLE]);
}

#[test]
fn readiness_dispatches_the_observed_mask() {
    let mut h = harness(vec![Step::Ready {
        advance_ms: 40,
        observed: vec![(5, Events::READABLE | Events::HANGUP)],
    }]);
    let (mut set, log) = watched_set(5);

    h.poller.poll_once(&mut set, Some(Duration::from_millis(200)));

    assert_eq!(*log.borrow(), [Events::READABLE | Events::HANGUP]);
}

#[test]
fn a_batch_member_deregistered_mid_batch_is_skipped() {
    let mut h = harness(vec![Step::Ready {
        advance_ms: 0,
        observed: vec![(3, Events::READABLE), (5, Events::READABLE)],
    }]);

    let dispatched = Rc::new(RefCell::new(Vec::new()));
    let mut set = WatcherSet::new();

    let log = dispatched.clone();
    set.register(Watcher::new(3, Events::READABLE, move |set, watcher, _| {
        log.borrow_mut().push(watcher.fd());
        set.deregister(5).expect("descriptor 5 is still registered");
    }));

    let log = dispatched.clone();
    set.register(Watcher::new(5, Events::READABLE, move |_, watcher, _| {
        log.borrow_mut().push(watcher.fd());
    }));

    h.poller.poll_once(&mut set, Some(Duration::from_millis(100)));

    assert_eq!(
        *dispatched.borrow(),
        [3],
        "a watcher deactivated earlier in the batch must not be invoked"
    );
}

#[test]
fn the_clock_base_is_updated_on_every_outcome() {
    let mut h = harness(vec![Step::TimedOut { advance_ms: 200 }]);
    let (mut set, _) = watched_set(5);

    assert_eq!(h.poller.time(), 0);
    h.poller.poll_once(&mut set, Some(Duration::from_millis(200)));

    assert_eq!(
        h.poller.time(),
        200,
        "a pure timeout must still refresh the clock base"
    );
}

#[test]
fn an_empty_set_never_consults_the_multiplexer() {
    let mut h = harness(Vec::new());
    let mut set = WatcherSet::new();

    h.poller.poll_once(&mut set, None);
    h.poller.poll_once(&mut set, Some(Duration::ZERO));

    assert!(h.timeouts.borrow().is_empty());
}
