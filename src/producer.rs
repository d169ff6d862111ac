use std::thread;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, warn};

use crate::buffer::BoundedBuffer;
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Producer,
    Consumer,
}

/// Final tally of one task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskReport {
    pub label: String,
    pub role: Role,
    pub count: usize,
}

/// Emits `target` items built by `generator(0..target)` into a buffer.
pub struct Producer<G> {
    label: String,
    target: usize,
    generator: G,
    pace: Option<Duration>,
    produced: usize,
}

impl<G> Producer<G> {
    pub fn new<T>(label: impl Into<String>, target: usize, generator: G) -> Self
    where
        G: Fn(usize) -> anyhow::Result<T>,
    {
        Self {
            label: label.into(),
            target,
            generator,
            pace: None,
            produced: 0,
        }
    }

    /// Sleep between puts. A zero duration disables pacing.
    pub fn with_pace(mut self, pace: Duration) -> Self {
        self.pace = (!pace.is_zero()).then_some(pace);
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn target(&self) -> usize {
        self.target
    }

    pub fn produced(&self) -> usize {
        self.produced
    }

    pub fn run<T>(&mut self, buffer: &BoundedBuffer<T>) -> Result<TaskReport>
    where
        G: Fn(usize) -> anyhow::Result<T>,
    {
        debug!(label = %self.label, target = self.target, "producer started");

        for index in self.produced..self.target {
            let item = (self.generator)(index).map_err(|source| {
                warn!(label = %self.label, index, "generator failed");
                Error::Generator {
                    label: self.label.clone(),
                    index,
                    source,
                }
            })?;

            if let Err(err) = buffer.put(item) {
                warn!(label = %self.label, produced = self.produced, "buffer closed under producer");
                return Err(err);
            }
            self.produced += 1;

            if let Some(pace) = self.pace {
                thread::sleep(pace);
            }
        }

        debug!(label = %self.label, produced = self.produced, "producer finished");
        Ok(TaskReport {
            label: self.label.clone(),
            role: Role::Producer,
            count: self.produced,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::bail;

    #[test]
    fn test_produces_target_items_in_order() {
        let buf = BoundedBuffer::new(10).unwrap();
        let mut producer = Producer::new("p", 5, |i| Ok(i * 2));
        let report = producer.run(&buf).unwrap();

        assert_eq!(report.count, 5);
        assert_eq!(report.role, Role::Producer);
        assert_eq!(producer.produced(), 5);
        let drained: Vec<_> = std::iter::from_fn(|| buf.try_get()).collect();
        assert_eq!(drained, vec![0, 2, 4, 6, 8]);
    }

    #[test]
    fn test_zero_target_is_a_noop() {
        let buf = BoundedBuffer::<usize>::new(1).unwrap();
        let mut producer = Producer::new("idle", 0, |i| Ok(i));
        assert_eq!(producer.run(&buf).unwrap().count, 0);
        assert!(buf.is_empty());
    }

    #[test]
    fn test_generator_failure_stops_producer() {
        let buf = BoundedBuffer::new(10).unwrap();
        let mut producer = Producer::new("flaky", 5, |i| {
            if i == 3 {
                bail!("no item {}", i);
            }
            Ok(i)
        });

        let err = producer.run(&buf).unwrap_err();
        assert!(matches!(err, Error::Generator { index: 3, .. }));
        assert_eq!(producer.produced(), 3);
        assert_eq!(buf.len(), 3);
    }

    #[test]
    fn test_closed_buffer_rejects_producer() {
        let buf = BoundedBuffer::new(2).unwrap();
        buf.close();
        let mut producer = Producer::new("late", 2, |i| Ok(i));
        assert!(matches!(producer.run(&buf), Err(Error::Closed)));
        assert_eq!(producer.produced(), 0);
    }

    #[test]
    fn test_pacing() {
        let buf = BoundedBuffer::new(4).unwrap();
        let mut producer =
            Producer::new("slow", 3, |i| Ok(i)).with_pace(Duration::from_millis(10));
        let start = std::time::Instant::now();
        producer.run(&buf).unwrap();
        assert!(start.elapsed() >= Duration::from_millis(30));
    }
}
