//! In-process event transport between pipeline stages.
//!
//! `EventQueue` is an unbounded multi-producer/multi-consumer FIFO:
//! - `publish` never blocks and never fails
//! - `try_receive` is a non-blocking poll
//! - Events from one producer are received in publish order
//!
//! End of stream is signalled explicitly with `close()` once every producer
//! has finished. Consumers see `Poll::Drained` only after the queue is both
//! closed and empty, so no event published before `close()` is lost.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::{unbounded, Receiver, Sender};
use tokio_util::sync::CancellationToken;
use triarb_core::PipelineEvent;

/// Sleep between polls of an empty queue.
pub const IDLE_BACKOFF: Duration = Duration::from_millis(1);

/// Result of a non-blocking poll.
#[derive(Debug, PartialEq)]
pub enum Poll<T> {
    /// An event was dequeued.
    Ready(T),
    /// Nothing queued right now; producers may still publish.
    Empty,
    /// Closed and empty; nothing more will arrive.
    Drained,
}

/// Shared event queue. Cloning yields another handle to the same queue.
#[derive(Debug)]
pub struct EventQueue<T = PipelineEvent> {
    name: &'static str,
    tx: Sender<T>,
    rx: Receiver<T>,
    closed: Arc<AtomicBool>,
}

impl<T> Clone for EventQueue<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            tx: self.tx.clone(),
            rx: self.rx.clone(),
            closed: Arc::clone(&self.closed),
        }
    }
}

impl<T> EventQueue<T> {
    /// Create a new, open queue.
    pub fn new(name: &'static str) -> Self {
        let (tx, rx) = unbounded();
        Self {
            name,
            tx,
            rx,
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Queue name, for logging.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Enqueue an event without blocking.
    pub fn publish(&self, event: impl Into<T>) {
        // Every handle owns a receiver, so the channel cannot be disconnected.
        let _ = self.tx.send(event.into());
    }

    /// Dequeue the oldest event, if any.
    pub fn try_receive(&self) -> Option<T> {
        self.rx.try_recv().ok()
    }

    /// Dequeue the oldest event, distinguishing "empty for now" from "drained".
    pub fn poll(&self) -> Poll<T> {
        if let Ok(event) = self.rx.try_recv() {
            return Poll::Ready(event);
        }
        if !self.closed.load(Ordering::Acquire) {
            return Poll::Empty;
        }
        // Closed after the last publish: one more look catches events that
        // landed between the first try and the close flag.
        match self.rx.try_recv() {
            Ok(event) => Poll::Ready(event),
            Err(_) => Poll::Drained,
        }
    }

    /// Wait for the next event, sleeping `IDLE_BACKOFF` while empty.
    ///
    /// Returns `None` once the queue is drained or `shutdown` is cancelled.
    pub async fn next(&self, shutdown: &CancellationToken) -> Option<T> {
        loop {
            if shutdown.is_cancelled() {
                return None;
            }
            match self.poll() {
                Poll::Ready(event) => return Some(event),
                Poll::Drained => return None,
                Poll::Empty => tokio::time::sleep(IDLE_BACKOFF).await,
            }
        }
    }

    /// Mark the end of the stream. Call once all producers are done.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Number of queued events.
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_fifo_single_producer() {
        let queue: EventQueue<u32> = EventQueue::new("test");
        for i in 0..5u32 {
            queue.publish(i);
        }
        let received: Vec<u32> = std::iter::from_fn(|| queue.try_receive()).collect();
        assert_eq!(received, vec![0, 1, 2, 3, 4]);
        assert!(queue.try_receive().is_none());
    }

    #[test]
    fn test_poll_empty_then_drained() {
        let queue: EventQueue<u32> = EventQueue::new("test");
        assert_eq!(queue.poll(), Poll::Empty);

        queue.publish(7u32);
        queue.close();
        assert_eq!(queue.poll(), Poll::Ready(7));
        assert_eq!(queue.poll(), Poll::Drained);
    }

    #[test]
    fn test_per_producer_order_with_concurrent_producers() {
        let queue: EventQueue<(u8, u32)> = EventQueue::new("test");
        let producers: Vec<_> = (0..4u8)
            .map(|id| {
                let q = queue.clone();
                thread::spawn(move || {
                    for seq in 0..1000u32 {
                        q.publish((id, seq));
                    }
                })
            })
            .collect();
        for p in producers {
            p.join().unwrap();
        }

        let mut last_seen = [None::<u32>; 4];
        let mut total = 0;
        while let Some((id, seq)) = queue.try_receive() {
            if let Some(prev) = last_seen[id as usize] {
                assert!(seq > prev, "producer {id} reordered: {seq} after {prev}");
            }
            last_seen[id as usize] = Some(seq);
            total += 1;
        }
        assert_eq!(total, 4000);
    }

    #[test]
    fn test_multiple_consumers_receive_each_event_once() {
        let queue: EventQueue<u32> = EventQueue::new("test");
        for i in 0..2000u32 {
            queue.publish(i);
        }
        queue.close();

        let consumers: Vec<_> = (0..3)
            .map(|_| {
                let q = queue.clone();
                thread::spawn(move || {
                    let mut got = Vec::new();
                    loop {
                        match q.poll() {
                            Poll::Ready(v) => got.push(v),
                            Poll::Empty => thread::yield_now(),
                            Poll::Drained => break,
                        }
                    }
                    got
                })
            })
            .collect();

        let mut all: Vec<u32> = consumers
            .into_iter()
            .flat_map(|c| c.join().unwrap())
            .collect();
        all.sort_unstable();
        assert_eq!(all, (0..2000).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_next_stops_on_cancel() {
        let queue: EventQueue<u32> = EventQueue::new("test");
        let shutdown = CancellationToken::new();
        shutdown.cancel();
        assert_eq!(queue.next(&shutdown).await, None);
    }

    #[tokio::test]
    async fn test_next_waits_for_late_event() {
        let queue: EventQueue<u32> = EventQueue::new("test");
        let shutdown = CancellationToken::new();

        let producer = queue.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            producer.publish(42u32);
            producer.close();
        });

        assert_eq!(queue.next(&shutdown).await, Some(42));
        assert_eq!(queue.next(&shutdown).await, None);
    }
}
