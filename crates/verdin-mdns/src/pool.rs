//! Shared byte-buffer pool.
//!
//! Outgoing datagrams and multicast receives churn through identically
//! sized buffers; recycling them keeps allocation out of the hot path.
//! Buffers return to the pool when the guard drops, so every exit path
//! pays the debt automatically.

use bytes::BytesMut;
use parking_lot::Mutex;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

/// A pool of fixed-size byte buffers.
pub struct BufferPool {
    /// Size of each buffer handed out.
    buffer_size: usize,
    /// Buffers waiting for reuse.
    free: Mutex<Vec<BytesMut>>,
}

impl BufferPool {
    /// Creates a pool handing out buffers of `buffer_size` bytes.
    pub fn new(buffer_size: usize) -> Arc<Self> {
        Arc::new(Self {
            buffer_size,
            free: Mutex::new(Vec::new()),
        })
    }

    /// Acquires a cleared buffer; it returns to the pool on drop.
    pub fn acquire(self: &Arc<Self>) -> PooledBuffer {
        let buf = self
            .free
            .lock()
            .pop()
            .unwrap_or_else(|| BytesMut::with_capacity(self.buffer_size));

        PooledBuffer {
            buf: Some(buf),
            pool: Arc::clone(self),
        }
    }

    /// Returns the number of idle buffers.
    pub fn idle(&self) -> usize {
        self.free.lock().len()
    }

    fn give_back(&self, mut buf: BytesMut) {
        buf.clear();
        self.free.lock().push(buf);
    }
}

/// A buffer checked out of a [`BufferPool`].
pub struct PooledBuffer {
    buf: Option<BytesMut>,
    pool: Arc<BufferPool>,
}

impl Deref for PooledBuffer {
    type Target = BytesMut;

    fn deref(&self) -> &BytesMut {
        self.buf.as_ref().expect("buffer present until drop")
    }
}

impl DerefMut for PooledBuffer {
    fn deref_mut(&mut self) -> &mut BytesMut {
        self.buf.as_mut().expect("buffer present until drop")
    }
}

impl Drop for PooledBuffer {
    fn drop(&mut self) {
        if let Some(buf) = self.buf.take() {
            self.pool.give_back(buf);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acquire_and_return() {
        let pool = BufferPool::new(4096);
        assert_eq!(pool.idle(), 0);

        {
            let mut buf = pool.acquire();
            buf.extend_from_slice(b"hello");
            assert_eq!(&buf[..], b"hello");
        }

        // Returned and cleared
        assert_eq!(pool.idle(), 1);
        let buf = pool.acquire();
        assert!(buf.is_empty());
        assert_eq!(pool.idle(), 0);
    }

    #[test]
    fn test_multiple_checkouts() {
        let pool = BufferPool::new(512);
        let a = pool.acquire();
        let b = pool.acquire();
        drop(a);
        drop(b);
        assert_eq!(pool.idle(), 2);
    }
}
