//! This module contains the api and locking logic for the blocking queue.

use alloc::collections::VecDeque;
use alloc::vec::Vec;
use core::fmt;
use core::time::Duration;
use std::sync::PoisonError;
use std::time::Instant;

use tracing::debug;
use tracing::trace;

use crate::platform::*;
use crate::waiter::WaitList;
use crate::waiter::WaiterId;

// -----------------------------------------------------------------------------
// Queue types

/// An unbounded, multi-producer multi-consumer FIFO queue with blocking and
/// non-blocking removal.
///
/// # Fairness
///
/// Consumers blocked in [`BlockingQueue::dequeue`] are served in the order
/// they started waiting. When an item is enqueued while consumers are parked,
/// it is handed directly to the consumer that has waited the longest, and only
/// that consumer is woken. A thread that arrives later cannot take the item,
/// even if it manages to acquire the lock before the woken consumer does.
///
/// Non-blocking callers ([`BlockingQueue::try_dequeue`]) never join the line.
/// They only ever see items that were enqueued while no consumer was parked.
///
/// # Sharing
///
/// The queue is `Sync` whenever `T` is `Send`, and has no global state, so any
/// number of queues can coexist. Share one between threads by reference (for
/// example with [`std::thread::scope`]) or through an `Arc`. Queues can also be
/// placed in a `static`:
///
/// ```
/// use waitline::BlockingQueue;
///
/// static JOBS: BlockingQueue<u32> = BlockingQueue::new();
///
/// JOBS.enqueue(7);
/// assert_eq!(JOBS.try_dequeue(), Some(7));
/// ```
///
/// # Teardown
///
/// Dropping the queue drops any items still in it. Because dropping requires
/// exclusive ownership, a queue can never be torn down while another thread is
/// enqueueing, dequeueing, or parked on it.
pub struct BlockingQueue<T> {
    state: Mutex<QueueState<T>>,
}

/// Everything guarded by the queue lock.
struct QueueState<T> {
    /// Items that found no parked consumer when they were enqueued.
    items: VecDeque<T>,
    /// Consumers parked in a blocking dequeue, oldest first.
    waiters: WaitList<T>,
    /// The number of items ever removed from the queue.
    visited: u64,
}

/// A consistent snapshot of a queue's counters, returned by
/// [`BlockingQueue::stats`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Stats {
    /// The number of items currently in the queue.
    pub size: usize,
    /// The number of consumers currently parked waiting for an item.
    pub waiting: usize,
    /// The total number of items removed from the queue since it was created.
    pub visited: u64,
}

// -----------------------------------------------------------------------------
// Locked state

impl<T> QueueState<T> {
    /// Gives an item to the oldest parked consumer, or queues it if there is
    /// none. Returns the consumer the item went to.
    fn push(&mut self, item: T) -> Option<WaiterId> {
        match self.waiters.grant(item) {
            Ok(id) => Some(id),
            Err(item) => {
                // Items only build up while nobody is parked.
                debug_assert!(self.waiters.is_empty());
                self.items.push_back(item);
                None
            }
        }
    }

    /// Removes the item at the head of the queue.
    fn pop(&mut self) -> Option<T> {
        let item = self.items.pop_front()?;
        self.visited += 1;
        Some(item)
    }

    /// Joins the line of parked consumers.
    fn park(&mut self) -> (WaiterId, Arc<Condvar>) {
        debug_assert!(self.items.is_empty());
        self.waiters.park()
    }

    /// Collects the item granted to a parked consumer, if there is one yet.
    fn reclaim(&mut self, id: WaiterId) -> Option<T> {
        let item = self.waiters.reclaim(id)?;
        self.visited += 1;
        Some(item)
    }

    /// Leaves the line of parked consumers. Returns the granted item if a
    /// producer reached this consumer before it could leave.
    fn cancel(&mut self, id: WaiterId) -> Option<T> {
        let item = self.waiters.cancel(id)?;
        self.visited += 1;
        Some(item)
    }

    fn stats(&self) -> Stats {
        Stats {
            size: self.items.len(),
            waiting: self.waiters.len(),
            visited: self.visited,
        }
    }
}

// -----------------------------------------------------------------------------
// Queue creation

impl<T> BlockingQueue<T> {
    /// Creates a new, empty queue.
    #[cfg(not(any(loom, feature = "shuttle")))]
    pub const fn new() -> BlockingQueue<T> {
        BlockingQueue {
            state: Mutex::new(QueueState {
                items: VecDeque::new(),
                waiters: WaitList::new(),
                visited: 0,
            }),
        }
    }

    /// Non-const constructor variant for loom and shuttle.
    #[cfg(any(loom, feature = "shuttle"))]
    pub fn new() -> BlockingQueue<T> {
        BlockingQueue::with_capacity(0)
    }

    /// Creates a new, empty queue with room for at least `capacity` items
    /// before it has to reallocate.
    pub fn with_capacity(capacity: usize) -> BlockingQueue<T> {
        BlockingQueue {
            state: Mutex::new(QueueState {
                items: VecDeque::with_capacity(capacity),
                waiters: WaitList::new(),
                visited: 0,
            }),
        }
    }

    /// Acquires the queue lock.
    ///
    /// Nothing but this module runs while the lock is held. Items are never
    /// dropped under it, and log events are only emitted once the guard is
    /// gone, so a panicking subscriber cannot poison it either. A poisoned
    /// lock therefore means a bug in this crate, and is treated as fatal.
    #[inline]
    fn lock(&self) -> MutexGuard<'_, QueueState<T>> {
        self.state.lock().unwrap()
    }
}

impl<T> Default for BlockingQueue<T> {
    fn default() -> BlockingQueue<T> {
        BlockingQueue::new()
    }
}

// -----------------------------------------------------------------------------
// Producer api

impl<T> BlockingQueue<T> {
    /// Adds an item to the back of the queue.
    ///
    /// If any consumers are parked in [`BlockingQueue::dequeue`], the item goes
    /// straight to the one that has been waiting the longest, and that
    /// consumer (and only that consumer) is woken up.
    ///
    /// This never blocks, other than to briefly acquire the queue lock.
    pub fn enqueue(&self, item: T) {
        let granted = self.lock().push(item);
        if let Some(id) = granted {
            trace!("granted item to waiter {:?}", id);
        }
    }

    /// Adds several items to the back of the queue, in iteration order, under a
    /// single acquisition of the queue lock.
    ///
    /// Items are handed out to parked consumers (oldest first) until there are
    /// none left, and the rest are queued. The iterator is fully consumed
    /// before the lock is taken.
    pub fn enqueue_batch<I>(&self, items: I)
    where
        I: IntoIterator<Item = T>,
    {
        let items: Vec<T> = items.into_iter().collect();
        if items.is_empty() {
            return;
        }

        let count = items.len();
        let mut granted = 0;
        {
            let mut state = self.lock();
            let overflow = count.saturating_sub(state.waiters.len());
            state.items.reserve(overflow);
            for item in items {
                if state.push(item).is_some() {
                    granted += 1;
                }
            }
        }
        trace!("enqueued batch of {} items, {} granted to waiters", count, granted);
    }
}

// -----------------------------------------------------------------------------
// Consumer api

impl<T> BlockingQueue<T> {
    /// Removes the item at the front of the queue, blocking the current thread
    /// until one is available.
    ///
    /// Threads blocked here are served in the order in which they started
    /// waiting. This has no timeout; see [`BlockingQueue::dequeue_timeout`] for
    /// a bounded variant.
    pub fn dequeue(&self) -> T {
        let mut state = self.lock();
        if let Some(item) = state.pop() {
            return item;
        }

        let ahead = state.waiters.len();
        let (id, wake) = state.park();
        loop {
            // Releases the lock while asleep, and re-acquires it on wake.
            state = wake.wait(state).unwrap();
            if let Some(item) = state.reclaim(id) {
                drop(state);
                trace!("waiter {:?} woke with an item after parking behind {} others", id, ahead);
                return item;
            }
        }
    }

    /// Removes the item at the front of the queue, blocking the current thread
    /// for at most `timeout` until one is available.
    ///
    /// Returns `None` if the timeout elapses first. A timeout of zero never
    /// blocks. A timeout too large to represent waits forever, exactly like
    /// [`BlockingQueue::dequeue`].
    pub fn dequeue_timeout(&self, timeout: Duration) -> Option<T> {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => self.dequeue_deadline(deadline),
            None => Some(self.dequeue()),
        }
    }

    /// Removes the item at the front of the queue, blocking the current thread
    /// until one is available or `deadline` passes.
    ///
    /// Returns `None` if the deadline passes first, in which case the thread
    /// has already given up its place in line. If an item is handed to this
    /// thread at the same moment the deadline passes, the item is returned
    /// rather than dropped.
    pub fn dequeue_deadline(&self, deadline: Instant) -> Option<T> {
        let mut state = self.lock();
        if let Some(item) = state.pop() {
            return Some(item);
        }
        if Instant::now() >= deadline {
            return None;
        }

        let (id, wake) = state.park();
        loop {
            let now = Instant::now();
            if now >= deadline {
                let item = state.cancel(id);
                drop(state);
                if item.is_none() {
                    trace!("waiter {:?} timed out", id);
                }
                return item;
            }

            let timeout = deadline.saturating_duration_since(now);
            let (guard, _) = wake.wait_timeout(state, timeout).unwrap();
            state = guard;
            if let Some(item) = state.reclaim(id) {
                drop(state);
                trace!("waiter {:?} woke with an item", id);
                return Some(item);
            }
        }
    }

    /// Removes the item at the front of the queue if there is one, without
    /// blocking.
    ///
    /// An empty queue is not an error; this just returns `None`, and the call
    /// has no other effect. Callers polling in a loop should yield or back off
    /// between attempts.
    pub fn try_dequeue(&self) -> Option<T> {
        self.lock().pop()
    }

    /// Returns an iterator that removes items from the front of the queue
    /// without blocking, ending the first time it finds the queue empty.
    pub fn try_iter(&self) -> TryIter<'_, T> {
        TryIter { queue: self }
    }
}

/// An iterator over the items in a queue, which never blocks.
///
/// Returned by [`BlockingQueue::try_iter`].
pub struct TryIter<'a, T> {
    queue: &'a BlockingQueue<T>,
}

impl<T> Iterator for TryIter<'_, T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.queue.try_dequeue()
    }
}

// -----------------------------------------------------------------------------
// Introspection

impl<T> BlockingQueue<T> {
    /// Returns the number of items currently in the queue.
    ///
    /// This is a snapshot; other threads may change it as soon as this
    /// returns. Items handed to a parked consumer are not counted, since they
    /// already belong to that consumer.
    pub fn size(&self) -> usize {
        self.lock().items.len()
    }

    /// Returns true if the queue currently holds no items.
    pub fn is_empty(&self) -> bool {
        self.lock().items.is_empty()
    }

    /// Returns the number of threads currently parked waiting for an item.
    ///
    /// This is a snapshot, like [`BlockingQueue::size`].
    pub fn waiting(&self) -> usize {
        self.lock().waiters.len()
    }

    /// Returns the total number of items that have been removed from the
    /// queue, by any kind of dequeue, since it was created.
    ///
    /// This never decreases, so a snapshot is always a lower bound on the
    /// current value.
    pub fn visited(&self) -> u64 {
        self.lock().visited
    }

    /// Returns all three counters, read under a single acquisition of the
    /// queue lock so that they are consistent with each other.
    pub fn stats(&self) -> Stats {
        self.lock().stats()
    }
}

impl<T> fmt::Debug for BlockingQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stats = self.stats();
        f.debug_struct("BlockingQueue")
            .field("size", &stats.size)
            .field("waiting", &stats.waiting)
            .field("visited", &stats.visited)
            .finish()
    }
}

// -----------------------------------------------------------------------------
// Teardown

impl<T> Drop for BlockingQueue<T> {
    fn drop(&mut self) {
        // Nobody can hold a reference to the queue here, so nobody can be
        // parked on it either.
        let state = self.state.get_mut().unwrap_or_else(PoisonError::into_inner);
        debug_assert!(state.waiters.is_empty());
        debug!(
            "dropping queue with {} unclaimed items after {} dequeued",
            state.items.len(),
            state.visited
        );
    }
}
