//! Fixed-capacity blocking FIFO shared between producer and consumer threads.
//!
//! One `Mutex` guards the queue and its counters. Two `Condvar`s carry the
//! "not full" and "not empty" signals, so a put only ever wakes a getter and
//! a get only ever wakes a putter. The lock is released while a caller waits.

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use tracing::{debug, trace};

use crate::error::{Error, Result};

// =============================================================================
// State snapshots
// =============================================================================

/// Fill level of a buffer. `closed` is tracked separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BufferState {
    Empty,
    Partial,
    Full,
}

impl BufferState {
    fn of(len: usize, capacity: usize) -> Self {
        if len == 0 {
            BufferState::Empty
        } else if len >= capacity {
            BufferState::Full
        } else {
            BufferState::Partial
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BufferStats {
    pub capacity: usize,
    pub len: usize,
    pub enqueued: usize,
    pub dequeued: usize,
    pub closed: bool,
}

/// Rejected non-blocking put. Ownership of the item goes back to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TryPutError<T> {
    Full(T),
    Closed(T),
}

impl<T> TryPutError<T> {
    pub fn into_inner(self) -> T {
        match self {
            TryPutError::Full(item) | TryPutError::Closed(item) => item,
        }
    }
}

// =============================================================================
// BoundedBuffer
// =============================================================================

struct Inner<T> {
    queue: VecDeque<T>,
    enqueued: usize,
    dequeued: usize,
    closed: bool,
}

pub struct BoundedBuffer<T> {
    inner: Mutex<Inner<T>>,
    not_empty: Condvar,
    not_full: Condvar,
    capacity: usize,
}

impl<T> BoundedBuffer<T> {
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(Error::InvalidCapacity(capacity));
        }
        Ok(Self {
            inner: Mutex::new(Inner {
                queue: VecDeque::with_capacity(capacity),
                enqueued: 0,
                dequeued: 0,
                closed: false,
            }),
            not_empty: Condvar::new(),
            not_full: Condvar::new(),
            capacity,
        })
    }

    // Queue mutations never panic halfway, so a poisoned lock still guards
    // consistent state.
    fn lock(&self) -> MutexGuard<'_, Inner<T>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn wait<'a>(&self, cond: &Condvar, guard: MutexGuard<'a, Inner<T>>) -> MutexGuard<'a, Inner<T>> {
        cond.wait(guard).unwrap_or_else(PoisonError::into_inner)
    }

    fn push_locked(&self, inner: &mut Inner<T>, item: T) {
        inner.queue.push_back(item);
        inner.enqueued += 1;
        trace!(len = inner.queue.len(), enqueued = inner.enqueued, "put");
        self.not_empty.notify_one();
    }

    fn pop_locked(&self, inner: &mut Inner<T>) -> Option<T> {
        let item = inner.queue.pop_front()?;
        inner.dequeued += 1;
        trace!(len = inner.queue.len(), dequeued = inner.dequeued, "get");
        self.not_full.notify_one();
        Some(item)
    }

    /// Appends `item`, waiting while the buffer is full.
    ///
    /// Fails with [`Error::Closed`] once the buffer has been closed; the item
    /// is dropped in that case and never becomes visible to consumers.
    pub fn put(&self, item: T) -> Result<()> {
        let mut inner = self.lock();
        while inner.queue.len() >= self.capacity && !inner.closed {
            inner = self.wait(&self.not_full, inner);
        }
        if inner.closed {
            return Err(Error::Closed);
        }
        self.push_locked(&mut inner, item);
        Ok(())
    }

    /// Removes the oldest item, waiting while the buffer is empty.
    ///
    /// Returns `None` only after [`close`](Self::close) and once every queued
    /// item has been handed out.
    pub fn get(&self) -> Option<T> {
        let mut inner = self.lock();
        loop {
            if let Some(item) = self.pop_locked(&mut inner) {
                return Some(item);
            }
            if inner.closed {
                return None;
            }
            inner = self.wait(&self.not_empty, inner);
        }
    }

    pub fn try_put(&self, item: T) -> std::result::Result<(), TryPutError<T>> {
        let mut inner = self.lock();
        if inner.closed {
            return Err(TryPutError::Closed(item));
        }
        if inner.queue.len() >= self.capacity {
            return Err(TryPutError::Full(item));
        }
        self.push_locked(&mut inner, item);
        Ok(())
    }

    pub fn try_get(&self) -> Option<T> {
        let mut inner = self.lock();
        self.pop_locked(&mut inner)
    }

    /// Ends the stream and wakes every waiter. Idempotent.
    pub fn close(&self) {
        let mut inner = self.lock();
        if !inner.closed {
            inner.closed = true;
            debug!(pending = inner.queue.len(), "buffer closed");
        }
        drop(inner);
        self.not_empty.notify_all();
        self.not_full.notify_all();
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.lock().queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().queue.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.lock().queue.len() >= self.capacity
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    pub fn state(&self) -> BufferState {
        BufferState::of(self.lock().queue.len(), self.capacity)
    }

    pub fn stats(&self) -> BufferStats {
        let inner = self.lock();
        BufferStats {
            capacity: self.capacity,
            len: inner.queue.len(),
            enqueued: inner.enqueued,
            dequeued: inner.dequeued,
            closed: inner.closed,
        }
    }
}
