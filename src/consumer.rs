use tracing::{debug, warn};

use crate::buffer::BoundedBuffer;
use crate::error::{Error, Result};
use crate::producer::{Role, TaskReport};

/// Pulls items out of a buffer and keeps them in receipt order.
pub struct Consumer<T> {
    label: String,
    target: Option<usize>,
    received: Vec<T>,
}

impl<T> Consumer<T> {
    /// Consumes exactly `target` items.
    pub fn new(label: impl Into<String>, target: usize) -> Self {
        Self {
            label: label.into(),
            target: Some(target),
            received: Vec::new(),
        }
    }

    /// Consumes until the buffer is closed and empty.
    pub fn draining(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            target: None,
            received: Vec::new(),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn target(&self) -> Option<usize> {
        self.target
    }

    pub fn consumed(&self) -> usize {
        self.received.len()
    }

    pub fn received(&self) -> &[T] {
        &self.received
    }

    pub fn into_received(self) -> Vec<T> {
        self.received
    }

    pub fn run(&mut self, buffer: &BoundedBuffer<T>) -> Result<TaskReport> {
        self.run_with(buffer, |_| {})
    }

    /// Like [`run`](Self::run), calling `inspect` on each item as it arrives.
    pub fn run_with<F>(&mut self, buffer: &BoundedBuffer<T>, mut inspect: F) -> Result<TaskReport>
    where
        F: FnMut(&T),
    {
        debug!(label = %self.label, target = ?self.target, "consumer started");

        while self.target.map_or(true, |target| self.received.len() < target) {
            match buffer.get() {
                Some(item) => {
                    inspect(&item);
                    self.received.push(item);
                }
                None => break,
            }
        }

        if let Some(expected) = self.target {
            if self.received.len() < expected {
                warn!(label = %self.label, expected, received = self.received.len(), "buffer closed under consumer");
                return Err(Error::Underfed {
                    label: self.label.clone(),
                    expected,
                    received: self.received.len(),
                });
            }
        }

        debug!(label = %self.label, consumed = self.received.len(), "consumer finished");
        Ok(TaskReport {
            label: self.label.clone(),
            role: Role::Consumer,
            count: self.received.len(),
        })
    }
}
