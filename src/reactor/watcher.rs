//! Watcher records and the active watcher set.
//!
//! A [`Watcher`] ties a descriptor to a requested-interest mask and a
//! dispatch callback. The [`WatcherSet`] is the caller-owned registry the
//! poll cycle snapshots at the start of every cycle; the cycle itself never
//! registers or deregisters anything.

use std::cell::RefCell;
use std::os::fd::RawFd;
use std::rc::Rc;

use crate::reactor::event::Events;

/// Callback invoked when a watcher's descriptor reports readiness.
///
/// The callback receives the active set (so it may register or deregister
/// watchers), the watcher that fired, and the observed event mask.
pub type Dispatch = Box<dyn FnMut(&mut WatcherSet, &Watcher, Events)>;

/// A per-descriptor registration record.
///
/// Owned by the caller through the [`WatcherSet`]; the poll cycle only reads
/// it. The interest mask must be non-empty for as long as the watcher is
/// registered.
pub struct Watcher {
    fd: RawFd,
    interest: Events,
    dispatch: RefCell<Dispatch>,
}

impl Watcher {
    /// Creates a watcher for `fd` with the given interest mask.
    pub fn new<F>(fd: RawFd, interest: Events, dispatch: F) -> Self
    where
        F: FnMut(&mut WatcherSet, &Watcher, Events) + 'static,
    {
        Self {
            fd,
            interest,
            dispatch: RefCell::new(Box::new(dispatch)),
        }
    }

    /// The watched descriptor.
    pub fn fd(&self) -> RawFd {
        self.fd
    }

    /// The requested event kinds.
    pub fn interest(&self) -> Events {
        self.interest
    }

    /// Runs the dispatch callback with the observed event mask.
    ///
    /// Re-entrant dispatch of the same watcher is a programming error and
    /// panics.
    pub(crate) fn invoke(&self, set: &mut WatcherSet, observed: Events) {
        (self.dispatch.borrow_mut())(set, self, observed);
    }
}

/// The caller-owned collection of watchers currently requesting events.
///
/// Watchers are addressed by descriptor: the set is a descriptor-indexed
/// table plus an active counter, and the two must always agree. The poll
/// cycle snapshots the set at the start of a cycle and consults the live
/// table again during dispatch, so a callback may deregister a later batch
/// member and suppress its dispatch.
pub struct WatcherSet {
    /// Descriptor-indexed table; a slot is occupied while its watcher is
    /// registered.
    table: Vec<Option<Rc<Watcher>>>,

    /// Number of occupied slots.
    active: usize,
}

impl WatcherSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates an empty set with table room for descriptors `< capacity`.
    ///
    /// The table grows on demand, so the capacity is a starting size, not a
    /// limit.
    pub fn with_capacity(capacity: usize) -> Self {
        let mut table = Vec::new();
        table.resize_with(capacity, || None);

        Self { table, active: 0 }
    }

    /// Registers a watcher and returns a shared handle to it.
    ///
    /// # Panics
    ///
    /// Panics if the descriptor is negative, the interest mask is empty, or
    /// the descriptor is already registered.
    pub fn register(&mut self, watcher: Watcher) -> Rc<Watcher> {
        assert!(watcher.fd >= 0, "watcher descriptor must be non-negative");
        assert!(
            !watcher.interest.is_empty(),
            "watcher interest mask must be non-empty"
        );

        let index = watcher.fd as usize;
        if index >= self.table.len() {
            let mut new_len = self.table.len().max(4);
            while new_len <= index {
                new_len *= 2;
            }
            self.table.resize_with(new_len, || None);
        }

        assert!(
            self.table[index].is_none(),
            "descriptor {index} is already registered"
        );

        let watcher = Rc::new(watcher);
        self.table[index] = Some(watcher.clone());
        self.active += 1;

        watcher
    }

    /// Removes the watcher registered at `fd`, if any.
    pub fn deregister(&mut self, fd: RawFd) -> Option<Rc<Watcher>> {
        let index = usize::try_from(fd).ok()?;
        let taken = self.table.get_mut(index)?.take()?;

        self.active -= 1;

        Some(taken)
    }

    /// Returns a handle to the watcher currently registered at `fd`.
    pub fn get(&self, fd: RawFd) -> Option<Rc<Watcher>> {
        let index = usize::try_from(fd).ok()?;
        self.table.get(index)?.clone()
    }

    /// Number of active watchers.
    pub fn len(&self) -> usize {
        self.active
    }

    /// Whether the set has no active watchers.
    pub fn is_empty(&self) -> bool {
        self.active == 0
    }

    /// Current table size; every registered descriptor is `< capacity()`.
    pub fn capacity(&self) -> usize {
        self.table.len()
    }

    /// Iterates the active watchers in descriptor order.
    pub(crate) fn entries(&self) -> impl Iterator<Item = &Rc<Watcher>> {
        self.table.iter().filter_map(|slot| slot.as_ref())
    }
}

impl Default for WatcherSet {
    fn default() -> Self {
        Self::new()
    }
}
