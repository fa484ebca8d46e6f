//! This module defines the list of consumers parked on a queue.
//!
//! Each parked consumer is represented by a slot in an arena owned by the
//! queue. Parked slots are threaded into a doubly-linked list by index, oldest
//! first, so appending a new waiter, granting an item to the oldest one, and
//! abandoning a wait from the middle of the list are all O(1).
//!
//! Every slot owns its own condition variable. The consumer that parked on a
//! slot holds a second handle to it (an `Arc`) so it can wait on it while the
//! queue lock is released. Slots are only ever released by the consumer that
//! parked on them, which is what keeps a [`WaiterId`] valid for the whole
//! duration of a blocking call. Released slots keep their condition variable
//! and go onto a free list, so parking does not allocate in the steady state.
//!
//! None of this is synchronized internally: the list is always accessed
//! through the queue's mutex.

use alloc::vec::Vec;
use core::mem;

use crate::platform::*;

// -----------------------------------------------------------------------------
// Waiter handles

/// Identifies a waiter slot within a [`WaitList`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WaiterId(usize);

// -----------------------------------------------------------------------------
// Slot states

/// The state of a single waiter slot.
enum State<T> {
    /// The slot is unused and sits on the free list.
    Free { next: Option<WaiterId> },
    /// A consumer is parked on this slot and it is linked into the wait list.
    Parked {
        prev: Option<WaiterId>,
        next: Option<WaiterId>,
    },
    /// A producer unlinked this slot and handed it an item. The owning consumer
    /// has been notified but has not collected the item yet.
    Granted(T),
}

struct Slot<T> {
    /// The private wake primitive for whichever consumer parks on this slot.
    wake: Arc<Condvar>,
    state: State<T>,
}

// -----------------------------------------------------------------------------
// Wait list

/// A FIFO list of parked consumers, each with a private condition variable.
pub struct WaitList<T> {
    slots: Vec<Slot<T>>,
    /// The oldest parked waiter.
    head: Option<WaiterId>,
    /// The most recently parked waiter.
    tail: Option<WaiterId>,
    /// The first released slot available for reuse.
    free: Option<WaiterId>,
    /// The number of parked (linked) waiters.
    len: usize,
}

impl<T> WaitList<T> {
    /// Creates an empty wait list.
    pub const fn new() -> WaitList<T> {
        WaitList {
            slots: Vec::new(),
            head: None,
            tail: None,
            free: None,
            len: 0,
        }
    }

    /// Returns the number of parked waiters. Waiters that have been granted an
    /// item but have not yet collected it are not counted.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if no waiter is parked.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Links a new waiter at the tail of the list. Returns the id of the
    /// waiter, and the condition variable it should block on.
    pub fn park(&mut self) -> (WaiterId, Arc<Condvar>) {
        let id = match self.free {
            Some(id) => {
                let State::Free { next } = self.slots[id.0].state else {
                    unreachable!("waiter {id:?} on the free list is in use");
                };
                self.free = next;
                id
            }
            None => {
                self.slots.push(Slot {
                    wake: Arc::new(Condvar::new()),
                    state: State::Free { next: None },
                });
                WaiterId(self.slots.len() - 1)
            }
        };

        let prev = self.tail;
        self.slots[id.0].state = State::Parked { prev, next: None };
        match prev {
            Some(prev) => *self.next_mut(prev) = Some(id),
            None => self.head = Some(id),
        }
        self.tail = Some(id);
        self.len += 1;

        (id, self.slots[id.0].wake.clone())
    }

    /// Hands `item` to the oldest parked waiter and wakes it. The waiter is
    /// unlinked, so it no longer counts towards [`WaitList::len`].
    ///
    /// If nobody is parked, the item is given back as an error.
    pub fn grant(&mut self, item: T) -> Result<WaiterId, T> {
        let Some(id) = self.head else {
            return Err(item);
        };

        self.unlink(id);
        let slot = &mut self.slots[id.0];
        slot.state = State::Granted(item);
        slot.wake.notify_one();

        Ok(id)
    }

    /// Collects the item granted to a waiter, releasing its slot. Returns
    /// `None`, and leaves the slot untouched, if the waiter is still parked.
    ///
    /// # Panics
    ///
    /// Panics if the slot has already been released.
    pub fn reclaim(&mut self, id: WaiterId) -> Option<T> {
        let slot = &mut self.slots[id.0];
        match mem::replace(&mut slot.state, State::Free { next: self.free }) {
            State::Granted(item) => {
                self.free = Some(id);
                Some(item)
            }
            state @ State::Parked { .. } => {
                slot.state = state;
                None
            }
            State::Free { .. } => unreachable!("waiter {id:?} reclaimed after release"),
        }
    }

    /// Abandons a wait, releasing the slot. If the waiter is still parked it is
    /// unlinked and `None` is returned. If a producer got to it first, the item
    /// it was granted is returned instead, so that it is never lost.
    ///
    /// # Panics
    ///
    /// Panics if the slot has already been released.
    pub fn cancel(&mut self, id: WaiterId) -> Option<T> {
        if matches!(self.slots[id.0].state, State::Parked { .. }) {
            self.unlink(id);
            self.slots[id.0].state = State::Free { next: self.free };
            self.free = Some(id);
            return None;
        }
        self.reclaim(id)
    }

    /// Removes a parked waiter from the list, patching up its neighbours. The
    /// slot state itself is left for the caller to overwrite.
    fn unlink(&mut self, id: WaiterId) {
        let State::Parked { prev, next } = self.slots[id.0].state else {
            unreachable!("waiter {id:?} unlinked while not parked");
        };

        match prev {
            Some(prev) => *self.next_mut(prev) = next,
            None => self.head = next,
        }
        match next {
            Some(next) => *self.prev_mut(next) = prev,
            None => self.tail = prev,
        }
        self.len -= 1;
    }

    fn next_mut(&mut self, id: WaiterId) -> &mut Option<WaiterId> {
        match &mut self.slots[id.0].state {
            State::Parked { next, .. } => next,
            _ => unreachable!("waiter {id:?} is linked but not parked"),
        }
    }

    fn prev_mut(&mut self, id: WaiterId) -> &mut Option<WaiterId> {
        match &mut self.slots[id.0].state {
            State::Parked { prev, .. } => prev,
            _ => unreachable!("waiter {id:?} is linked but not parked"),
        }
    }
}

// -----------------------------------------------------------------------------
// Tests
