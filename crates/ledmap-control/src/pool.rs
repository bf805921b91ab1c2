//! Pre-allocated datagram buffers
//!
//! LM datagrams are copied into pooled buffers on the network thread and
//! handed to the render loop. Dropping a [`PooledBuffer`] returns its
//! storage to the pool, so the hot path never allocates.

use crossbeam_channel::{bounded, Receiver, Sender};
use tracing::info;

/// Pool of fixed capacity byte buffers
#[derive(Debug, Clone)]
pub struct BufferPool {
    free_tx: Sender<Vec<u8>>,
    free_rx: Receiver<Vec<u8>>,
    buffer_capacity: usize,
    pool_size: usize,
}

impl BufferPool {
    /// Pre-allocate `pool_size` buffers of `buffer_capacity` bytes
    pub fn new(pool_size: usize, buffer_capacity: usize) -> Self {
        let pool_size = pool_size.max(1);
        let (free_tx, free_rx) = bounded(pool_size);
        for _ in 0..pool_size {
            // Cannot fail: the channel holds exactly pool_size buffers
            let _ = free_tx.try_send(vec![0u8; buffer_capacity]);
        }

        info!(pool_size, buffer_capacity, "BufferPool created");

        Self {
            free_tx,
            free_rx,
            buffer_capacity,
            pool_size,
        }
    }

    /// Take a buffer without blocking, `None` when exhausted
    pub fn try_acquire(&self) -> Option<PooledBuffer> {
        let buffer = self.free_rx.try_recv().ok()?;
        Some(PooledBuffer {
            buffer: Some(buffer),
            len: 0,
            home: self.free_tx.clone(),
        })
    }

    /// Take a buffer and fill it with `data`.
    ///
    /// `data` longer than the buffer capacity is truncated.
    pub fn try_acquire_copy(&self, data: &[u8]) -> Option<PooledBuffer> {
        let mut buffer = self.try_acquire()?;
        buffer.copy_from(data);
        Some(buffer)
    }

    /// Buffers currently free
    pub fn available(&self) -> usize {
        self.free_rx.len()
    }

    /// Total buffers
    pub fn pool_size(&self) -> usize {
        self.pool_size
    }

    /// Capacity of each buffer
    pub fn buffer_capacity(&self) -> usize {
        self.buffer_capacity
    }
}

/// A buffer on loan from a [`BufferPool`]
#[derive(Debug)]
pub struct PooledBuffer {
    buffer: Option<Vec<u8>>,
    len: usize,
    home: Sender<Vec<u8>>,
}

impl PooledBuffer {
    /// Overwrite the contents
    pub fn copy_from(&mut self, data: &[u8]) {
        if let Some(buffer) = self.buffer.as_mut() {
            let len = data.len().min(buffer.len());
            buffer[..len].copy_from_slice(&data[..len]);
            self.len = len;
        }
    }

    /// Valid bytes
    pub fn as_slice(&self) -> &[u8] {
        match &self.buffer {
            Some(buffer) => &buffer[..self.len],
            None => &[],
        }
    }

    /// Number of valid bytes
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check if no bytes are valid
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl AsRef<[u8]> for PooledBuffer {
    fn as_ref(&self) -> &[u8] {
        self.as_slice()
    }
}

impl Drop for PooledBuffer {
    fn drop(&mut self) {
        if let Some(buffer) = self.buffer.take() {
            // The pool may already be gone during shutdown
            let _ = self.home.try_send(buffer);
        }
    }
}
