//! Tests using the Shuttle testing framework.

#![cfg(feature = "shuttle")]

use core::time::Duration;

use shuttle::sync::Arc;
use shuttle::thread;
use tracing::Level;
use tracing_subscriber::fmt::Subscriber;
use waitline::BlockingQueue;

// -----------------------------------------------------------------------------
// Infrastructure

fn trace<F>(f: F)
where
    F: Fn() + Send + Sync + 'static,
{
    let subscriber = Subscriber::builder()
        .compact()
        .with_max_level(Level::TRACE)
        .with_test_writer()
        .without_time()
        .with_thread_names(false)
        .finish();

    tracing::subscriber::with_default(subscriber, f);
}

const PRODUCERS: usize = 3;
const CONSUMERS: usize = 3;
const ITEMS: usize = 4;

/// Runs several producers and consumers against one queue. Half of the
/// consumers block, the other half poll.
fn producers_and_consumers() {
    let queue = Arc::new(BlockingQueue::new());

    let producers: Vec<_> = (0..PRODUCERS)
        .map(|producer| {
            let queue = queue.clone();
            thread::spawn(move || {
                for i in 0..ITEMS {
                    queue.enqueue((producer, i));
                }
            })
        })
        .collect();

    let consumers: Vec<_> = (0..CONSUMERS)
        .map(|consumer| {
            let queue = queue.clone();
            thread::spawn(move || {
                let mut received = Vec::with_capacity(ITEMS);
                while received.len() < ITEMS {
                    if consumer % 2 == 0 {
                        received.push(queue.dequeue());
                    } else if let Some(item) = queue.try_dequeue() {
                        received.push(item);
                    } else {
                        thread::yield_now();
                    }
                }
                received
            })
        })
        .collect();

    for producer in producers {
        producer.join().unwrap();
    }

    let mut received: Vec<_> = consumers
        .into_iter()
        .flat_map(|consumer| consumer.join().unwrap())
        .collect();
    received.sort_unstable();
    received.dedup();

    assert_eq!(received.len(), PRODUCERS * ITEMS);
    assert_eq!(queue.visited(), (PRODUCERS * ITEMS) as u64);
    assert_eq!(queue.size(), 0);
    assert_eq!(queue.waiting(), 0);
}

// -----------------------------------------------------------------------------
// Core API

/// Tests for lost or duplicated items with mixed blocking and polling
/// consumers.
#[test]
pub fn mixed_consumers() {
    shuttle::check_random(producers_and_consumers, 500);
}

/// Same as `mixed_consumers`, but with the PCT scheduler, which is better at
/// finding ordering bugs that need a few specific preemptions.
#[test]
pub fn mixed_consumers_pct() {
    shuttle::check_pct(producers_and_consumers, 500, 3);
}

/// Tests that a waiter which gives up never takes an item with it.
#[test]
pub fn timeout_races_enqueue() {
    trace(|| {
        shuttle::check_random(
            || {
                let queue = Arc::new(BlockingQueue::new());

                let consumer = {
                    let queue = queue.clone();
                    thread::spawn(move || queue.dequeue_timeout(Duration::from_millis(1)))
                };

                queue.enqueue(1);
                let received = consumer.join().unwrap();

                // The item went either to the consumer, or stayed in the queue.
                match received {
                    Some(item) => {
                        assert_eq!(item, 1);
                        assert_eq!(queue.size(), 0);
                        assert_eq!(queue.visited(), 1);
                    }
                    None => {
                        assert_eq!(queue.size(), 1);
                        assert_eq!(queue.visited(), 0);
                    }
                }
                assert_eq!(queue.waiting(), 0);
            },
            200,
        );
    });
}
