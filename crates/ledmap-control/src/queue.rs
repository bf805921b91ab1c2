//! Bounded single-producer / single-consumer hand-off between threads
//!
//! Both ends are non-blocking. A full queue drops the newest item and counts
//! it, so the producer (the network thread) never stalls. Neither end is
//! `Clone`, which keeps each queue single-producer and single-consumer.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};

/// Counters shared by both ends of a queue
#[derive(Debug, Default)]
pub struct QueueStats {
    pushed: AtomicU64,
    dropped: AtomicU64,
}

impl QueueStats {
    /// Items accepted by the queue
    pub fn pushed(&self) -> u64 {
        self.pushed.load(Ordering::Relaxed)
    }

    /// Items dropped because the queue was full
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

/// Create a queue holding at most `capacity` items (at least 1)
pub fn frame_queue<T>(capacity: usize) -> (Producer<T>, Consumer<T>) {
    let (tx, rx) = bounded(capacity.max(1));
    let stats = Arc::new(QueueStats::default());
    (
        Producer {
            tx,
            stats: Arc::clone(&stats),
        },
        Consumer { rx, stats },
    )
}

/// Sending end
#[derive(Debug)]
pub struct Producer<T> {
    tx: Sender<T>,
    stats: Arc<QueueStats>,
}

impl<T> Producer<T> {
    /// Push without blocking.
    ///
    /// On a full (or disconnected) queue the item is handed back and counted
    /// as dropped.
    pub fn try_push(&self, item: T) -> Result<(), T> {
        match self.tx.try_send(item) {
            Ok(()) => {
                self.stats.pushed.fetch_add(1, Ordering::Relaxed);
                Ok(())
            }
            Err(TrySendError::Full(item)) | Err(TrySendError::Disconnected(item)) => {
                self.stats.dropped.fetch_add(1, Ordering::Relaxed);
                Err(item)
            }
        }
    }

    /// Shared counters
    pub fn stats(&self) -> &QueueStats {
        &self.stats
    }
}

/// Receiving end
#[derive(Debug)]
pub struct Consumer<T> {
    rx: Receiver<T>,
    stats: Arc<QueueStats>,
}

impl<T> Consumer<T> {
    /// Pop without blocking
    pub fn try_pop(&self) -> Option<T> {
        self.rx.try_recv().ok()
    }

    /// Pop up to `max` items without blocking
    pub fn drain(&self, max: usize) -> impl Iterator<Item = T> + '_ {
        self.rx.try_iter().take(max)
    }

    /// Discard everything but the most recent item.
    ///
    /// Used for configuration queues where only the newest value matters.
    pub fn latest(&self) -> Option<T> {
        self.rx.try_iter().last()
    }

    /// Items currently queued
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    /// Check if nothing is queued
    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }

    /// Shared counters
    pub fn stats(&self) -> &QueueStats {
        &self.stats
    }
}
