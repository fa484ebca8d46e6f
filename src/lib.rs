//! An unbounded blocking queue that serves consumers in the order they arrive.
//!
//! Waitline provides [`BlockingQueue`], a multi-producer multi-consumer FIFO
//! queue for OS threads. Producers never block. Consumers either poll with
//! [`BlockingQueue::try_dequeue`] or park with [`BlockingQueue::dequeue`] until
//! an item shows up.
//!
//! The interesting part is what happens when several consumers are parked at
//! once. Most `Mutex` + `Condvar` queues share a single condition variable
//! between all consumers, so an enqueue wakes *some* consumer, and whichever
//! thread reaches the lock first gets the item. Waitline instead gives every
//! parked consumer its own condition variable and keeps them in a list, oldest
//! first. An enqueue hands the item directly to the oldest parked consumer and
//! wakes only that thread. Consumers are therefore served strictly in the order
//! they started waiting, and no thread ever wakes just to find the item gone.
//!
//! ```
//! use std::thread;
//! use waitline::BlockingQueue;
//!
//! let queue = BlockingQueue::new();
//!
//! thread::scope(|s| {
//!     s.spawn(|| {
//!         for i in 0..3 {
//!             assert_eq!(queue.dequeue(), i);
//!         }
//!     });
//!     for i in 0..3 {
//!         queue.enqueue(i);
//!     }
//! });
//!
//! assert_eq!(queue.visited(), 3);
//! assert_eq!(queue.size(), 0);
//! ```
//!
//! The queue also tracks a few live statistics: the number of queued items
//! ([`BlockingQueue::size`]), the number of parked consumers
//! ([`BlockingQueue::waiting`]), and the number of items ever removed
//! ([`BlockingQueue::visited`]).

#![no_std]

// -----------------------------------------------------------------------------
// Boilerplate for building without the standard library

extern crate alloc;
extern crate std;

// -----------------------------------------------------------------------------
// Modules

mod compile_fail;
mod queue;
mod waiter;

// -----------------------------------------------------------------------------
// Top-level exports

pub use queue::BlockingQueue;
pub use queue::Stats;
pub use queue::TryIter;

// -----------------------------------------------------------------------------
// Platform Support

// This crate is tested with both `loom` and `shuttle`, which requires mocking
// the threading primitives the queue is built on (`Mutex` and `Condvar`).
//
// To make things a bit simpler, we re-export all the important types in the
// `platform` module.

#[cfg(not(any(loom, feature = "shuttle")))]
mod platform {

    // Core exports

    pub use alloc::sync::Arc;
    pub use std::sync::Condvar;
    pub use std::sync::Mutex;
    pub use std::sync::MutexGuard;
}

#[cfg(loom)]
mod platform {

    // Core exports

    pub use loom::sync::Arc;
    pub use loom::sync::Condvar;
    pub use loom::sync::Mutex;
    pub use loom::sync::MutexGuard;
}

#[cfg(all(not(loom), feature = "shuttle"))]
mod platform {

    // Core exports

    pub use shuttle::sync::Arc;
    pub use shuttle::sync::Condvar;
    pub use shuttle::sync::Mutex;
    pub use shuttle::sync::MutexGuard;
}
