//! Throughput benchmarks for multi-producer multi-consumer workloads.
//!
//! The baseline is the usual `Mutex<VecDeque>` + single shared `Condvar`
//! queue, which makes no fairness guarantee. Comparing against it shows what
//! the per-waiter hand-off costs.

extern crate alloc;

use alloc::collections::VecDeque;
use std::sync::Condvar;
use std::sync::Mutex;
use std::thread;

use divan::Bencher;
use divan::black_box;
use waitline::BlockingQueue;

// -----------------------------------------------------------------------------
// Workload

const ITEMS: usize = 10_000;

/// (producers, consumers)
const SHAPES: &[(usize, usize)] = &[(1, 1), (1, 4), (4, 1), (4, 4), (8, 8)];

/// The operations a queue needs to support to run the workload.
trait Channel: Sync {
    fn new() -> Self;
    fn send(&self, value: usize);
    fn recv(&self) -> usize;
}

/// Pushes `ITEMS` values through the queue using the given number of threads.
fn run<C: Channel>(shape: (usize, usize)) {
    let (producers, consumers) = shape;
    let queue = C::new();
    thread::scope(|s| {
        for _ in 0..producers {
            s.spawn(|| {
                for i in 0..ITEMS / producers {
                    queue.send(black_box(i));
                }
            });
        }
        for _ in 0..consumers {
            s.spawn(|| {
                for _ in 0..ITEMS / consumers {
                    black_box(queue.recv());
                }
            });
        }
    });
}

// -----------------------------------------------------------------------------
// Queues

impl Channel for BlockingQueue<usize> {
    fn new() -> Self {
        BlockingQueue::with_capacity(ITEMS)
    }

    fn send(&self, value: usize) {
        self.enqueue(value);
    }

    fn recv(&self) -> usize {
        self.dequeue()
    }
}

/// A queue where every consumer waits on the same condition variable.
struct SharedCondvarQueue {
    items: Mutex<VecDeque<usize>>,
    not_empty: Condvar,
}

impl Channel for SharedCondvarQueue {
    fn new() -> Self {
        SharedCondvarQueue {
            items: Mutex::new(VecDeque::with_capacity(ITEMS)),
            not_empty: Condvar::new(),
        }
    }

    fn send(&self, value: usize) {
        self.items.lock().unwrap().push_back(value);
        self.not_empty.notify_one();
    }

    fn recv(&self) -> usize {
        let mut items = self.items.lock().unwrap();
        loop {
            if let Some(value) = items.pop_front() {
                return value;
            }
            items = self.not_empty.wait(items).unwrap();
        }
    }
}

// -----------------------------------------------------------------------------
// Benchmark

// Producer and consumer counts must divide `ITEMS` evenly, or the consumers
// would wait forever.
fn shapes() -> impl Iterator<Item = (usize, usize)> {
    SHAPES
        .iter()
        .copied()
        .filter(|&(p, c)| ITEMS % p == 0 && ITEMS % c == 0)
}

#[divan::bench(args = shapes(), threads = false)]
fn shared_condvar(bencher: Bencher, shape: (usize, usize)) {
    bencher.bench_local(|| run::<SharedCondvarQueue>(shape));
}

#[divan::bench(args = shapes(), threads = false)]
fn fair_handoff(bencher: Bencher, shape: (usize, usize)) {
    bencher.bench_local(|| run::<BlockingQueue<usize>>(shape));
}

fn main() {
    divan::main();
}
