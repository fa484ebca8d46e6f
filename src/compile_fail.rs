//! Contains a set of compile failure doctests.

// -----------------------------------------------------------------------------
// Ensures a queue of non-send items cannot be shared between threads.

/** ```compile_fail,E0277

use std::rc::Rc;
use std::thread;
use waitline::BlockingQueue;

let queue = BlockingQueue::new();
queue.enqueue(Rc::new(22));

thread::scope(|s| {
    s.spawn(|| queue.dequeue()); //~ ERROR
});

``` */
mod nonsend_items {}

// -----------------------------------------------------------------------------
// Ensures a queue cannot be placed in a static unless its items are `Send`.

/** ```compile_fail,E0277

use std::cell::Cell;
use std::rc::Rc;
use waitline::BlockingQueue;

static QUEUE: BlockingQueue<Rc<Cell<u32>>> = BlockingQueue::new(); //~ ERROR

``` */
mod nonsend_static {}

// -----------------------------------------------------------------------------
// Ensures a queue cannot be dropped while another thread may be parked on it.

/** ```compile_fail,E0505

use std::thread;
use waitline::BlockingQueue;

let queue = BlockingQueue::<u32>::new();
let consumer = &queue;

drop(queue); //~ ERROR cannot move out of `queue` because it is borrowed

thread::scope(|s| {
    s.spawn(|| consumer.dequeue());
});

``` */
mod drop_while_borrowed {}

// -----------------------------------------------------------------------------
// Ensures a non-blocking iterator keeps its queue alive.

/** ```compile_fail,E0505

use waitline::BlockingQueue;

let queue = BlockingQueue::new();
queue.enqueue(String::from("owned"));

let iter = queue.try_iter();
drop(queue); //~ ERROR cannot move out of `queue` because it is borrowed
iter.count();

``` */
mod iter_borrows_queue {}
