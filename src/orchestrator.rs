//! Runs a set of producers and consumers against one shared buffer.
//!
//! Every task gets its own named scoped thread. Producers are joined first,
//! then the buffer is closed so draining consumers see end-of-stream, then
//! consumers are joined. A task that fails or panics closes the buffer on its
//! way out, which wakes every peer blocked in `put` or `get`.

use std::collections::{BTreeMap, HashSet};
use std::thread::{self, ScopedJoinHandle};
use std::time::Duration;

use serde::Serialize;
use tracing::{info, warn};

use crate::buffer::{BoundedBuffer, BufferStats};
use crate::consumer::Consumer;
use crate::error::{Error, Result};
use crate::producer::{Producer, Role, TaskReport};

pub type Generator<T> = Box<dyn Fn(usize) -> anyhow::Result<T> + Send + Sync>;

// =============================================================================
// Run configuration
// =============================================================================

pub struct ProducerSpec<T> {
    pub label: String,
    pub count: usize,
    pub generator: Generator<T>,
    pub pace: Option<Duration>,
}

impl<T> ProducerSpec<T> {
    pub fn new<F>(label: impl Into<String>, count: usize, generator: F) -> Self
    where
        F: Fn(usize) -> anyhow::Result<T> + Send + Sync + 'static,
    {
        Self {
            label: label.into(),
            count,
            generator: Box::new(generator),
            pace: None,
        }
    }

    pub fn with_pace(mut self, pace: Duration) -> Self {
        self.pace = Some(pace);
        self
    }
}

pub type Inspector<T> = Box<dyn Fn(&T) + Send + Sync>;

pub struct ConsumerSpec<T> {
    pub label: String,
    /// `None` drains until the buffer is closed.
    pub count: Option<usize>,
    /// Called on every received item before it is recorded.
    pub inspect: Option<Inspector<T>>,
}

impl<T> ConsumerSpec<T> {
    pub fn counted(label: impl Into<String>, count: usize) -> Self {
        Self {
            label: label.into(),
            count: Some(count),
            inspect: None,
        }
    }

    pub fn draining(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            count: None,
            inspect: None,
        }
    }

    pub fn with_inspect<F>(mut self, inspect: F) -> Self
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.inspect = Some(Box::new(inspect));
        self
    }
}

pub struct RunConfig<T> {
    pub buffer_capacity: usize,
    pub producers: Vec<ProducerSpec<T>>,
    pub consumers: Vec<ConsumerSpec<T>>,
}

fn checked_total(counts: impl IntoIterator<Item = usize>, role: &'static str) -> Result<usize> {
    counts
        .into_iter()
        .try_fold(0usize, |total, count| total.checked_add(count))
        .ok_or(Error::CountOverflow(role))
}

impl<T> RunConfig<T> {
    pub fn new(buffer_capacity: usize) -> Self {
        Self {
            buffer_capacity,
            producers: Vec::new(),
            consumers: Vec::new(),
        }
    }

    pub fn producer(mut self, spec: ProducerSpec<T>) -> Self {
        self.producers.push(spec);
        self
    }

    pub fn consumer(mut self, spec: ConsumerSpec<T>) -> Self {
        self.consumers.push(spec);
        self
    }

    pub fn total_to_produce(&self) -> Result<usize> {
        checked_total(self.producers.iter().map(|p| p.count), "producer")
    }

    pub fn validate(&self) -> Result<()> {
        if self.buffer_capacity == 0 {
            return Err(Error::InvalidCapacity(self.buffer_capacity));
        }
        if self.producers.is_empty() {
            return Err(Error::NoProducers);
        }
        if self.consumers.is_empty() {
            return Err(Error::NoConsumers);
        }

        let mut labels = HashSet::new();
        let all_labels = self
            .producers
            .iter()
            .map(|p| &p.label)
            .chain(self.consumers.iter().map(|c| &c.label));
        for label in all_labels {
            if !labels.insert(label) {
                return Err(Error::DuplicateLabel(label.clone()));
            }
        }

        // A draining consumer can take items a counted peer is waiting for.
        let draining = self.consumers.iter().filter(|c| c.count.is_none()).count();
        if draining > 0 && draining < self.consumers.len() {
            return Err(Error::MixedConsumers);
        }

        let produced = self.total_to_produce()?;
        if draining == 0 {
            let expected = checked_total(self.consumers.iter().filter_map(|c| c.count), "consumer")?;
            if produced != expected {
                return Err(Error::Unbalanced { produced, expected });
            }
        }
        Ok(())
    }
}

// =============================================================================
// Run report
// =============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct RunReport<T> {
    pub tasks: BTreeMap<String, TaskReport>,
    pub total_produced: usize,
    pub total_consumed: usize,
    pub buffer: BufferStats,
    /// Items per consumer, in the order that consumer received them.
    #[serde(skip_serializing)]
    pub received: BTreeMap<String, Vec<T>>,
}

impl<T> RunReport<T> {
    pub fn count_for(&self, label: &str) -> Option<usize> {
        self.tasks.get(label).map(|t| t.count)
    }

    pub fn received_by(&self, label: &str) -> Option<&[T]> {
        self.received.get(label).map(Vec::as_slice)
    }

    /// All consumed items, consumer by consumer.
    pub fn all_received(&self) -> impl Iterator<Item = &T> {
        self.received.values().flatten()
    }

    fn total_for(tasks: &BTreeMap<String, TaskReport>, role: Role) -> usize {
        tasks.values().filter(|t| t.role == role).map(|t| t.count).sum()
    }
}

// =============================================================================
// Orchestrator
// =============================================================================

/// Closes the buffer when dropped unless disarmed, so a failing or panicking
/// task never leaves its peers blocked.
struct AbortGuard<'a, T> {
    buffer: &'a BoundedBuffer<T>,
    label: &'a str,
    armed: bool,
}

impl<'a, T> AbortGuard<'a, T> {
    fn new(buffer: &'a BoundedBuffer<T>, label: &'a str) -> Self {
        Self {
            buffer,
            label,
            armed: true,
        }
    }

    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl<T> Drop for AbortGuard<'_, T> {
    fn drop(&mut self) {
        if self.armed {
            warn!(label = self.label, "task aborted, closing buffer");
            self.buffer.close();
        }
    }
}

type ProducerHandle<'scope> = (String, ScopedJoinHandle<'scope, Result<TaskReport>>);
type ConsumerHandle<'scope, T> = (String, ScopedJoinHandle<'scope, Result<(TaskReport, Vec<T>)>>);

pub struct Orchestrator;

impl Orchestrator {
    pub fn run<T: Send>(config: RunConfig<T>) -> Result<RunReport<T>> {
        config.validate()?;
        let buffer = BoundedBuffer::new(config.buffer_capacity)?;
        info!(
            capacity = config.buffer_capacity,
            producers = config.producers.len(),
            consumers = config.consumers.len(),
            "starting run"
        );

        let mut tasks = BTreeMap::new();
        let mut received = BTreeMap::new();
        let mut errors = Vec::new();

        thread::scope(|s| {
            let buffer = &buffer;

            let mut producers: Vec<ProducerHandle<'_>> = Vec::new();
            for spec in config.producers {
                let label = spec.label.clone();
                let spawned = thread::Builder::new().name(label.clone()).spawn_scoped(s, move || {
                    let mut guard = AbortGuard::new(buffer, &spec.label);
                    let mut producer = Producer::new(spec.label.as_str(), spec.count, spec.generator);
                    if let Some(pace) = spec.pace {
                        producer = producer.with_pace(pace);
                    }
                    let result = producer.run(buffer);
                    if result.is_ok() {
                        guard.disarm();
                    }
                    result
                });
                match spawned {
                    Ok(handle) => producers.push((label, handle)),
                    Err(source) => {
                        buffer.close();
                        errors.push(Error::Spawn { label, source });
                    }
                }
            }

            let mut consumers: Vec<ConsumerHandle<'_, T>> = Vec::new();
            for spec in config.consumers {
                let label = spec.label.clone();
                let spawned = thread::Builder::new().name(label.clone()).spawn_scoped(s, move || {
                    let mut guard = AbortGuard::new(buffer, &spec.label);
                    let mut consumer = match spec.count {
                        Some(count) => Consumer::new(spec.label.as_str(), count),
                        None => Consumer::draining(spec.label.as_str()),
                    };
                    let report = match &spec.inspect {
                        Some(inspect) => consumer.run_with(buffer, |item| inspect(item))?,
                        None => consumer.run(buffer)?,
                    };
                    guard.disarm();
                    Ok((report, consumer.into_received()))
                });
                match spawned {
                    Ok(handle) => consumers.push((label, handle)),
                    Err(source) => {
                        buffer.close();
                        errors.push(Error::Spawn { label, source });
                    }
                }
            }

            for (label, handle) in producers {
                match handle.join() {
                    Ok(Ok(report)) => {
                        tasks.insert(label, report);
                    }
                    Ok(Err(err)) => errors.push(err),
                    Err(_) => errors.push(Error::TaskPanicked { label }),
                }
            }

            // End of stream: draining consumers stop once the queue is empty,
            // and an undercounted consumer fails instead of blocking forever.
            buffer.close();

            for (label, handle) in consumers {
                match handle.join() {
                    Ok(Ok((report, items))) => {
                        tasks.insert(label.clone(), report);
                        received.insert(label, items);
                    }
                    Ok(Err(err)) => errors.push(err),
                    Err(_) => errors.push(Error::TaskPanicked { label }),
                }
            }
        });

        if let Some(err) = Self::root_cause(errors) {
            warn!(error = %err, "run failed");
            return Err(err);
        }

        let stats = buffer.stats();
        let total_produced = RunReport::<T>::total_for(&tasks, Role::Producer);
        let total_consumed = RunReport::<T>::total_for(&tasks, Role::Consumer);
        if total_produced != total_consumed
            || stats.enqueued != total_produced
            || stats.dequeued != total_consumed
        {
            return Err(Error::Conservation {
                produced: total_produced,
                consumed: total_consumed,
            });
        }

        info!(total_produced, total_consumed, "run complete");
        Ok(RunReport {
            tasks,
            total_produced,
            total_consumed,
            buffer: stats,
            received,
        })
    }

    /// The first error that is not merely a consequence of another task aborting.
    fn root_cause(errors: Vec<Error>) -> Option<Error> {
        let position = errors
            .iter()
            .position(|e| !e.is_secondary())
            .unwrap_or(0);
        errors.into_iter().nth(position)
    }
}
