//! The fixed demo: one scenario per item shape, then several producers
//! feeding one buffer.

use std::fmt;
use std::time::Duration;

use serde::Serialize;
use tracing::info;

use crate::config::{DemoConfig, MultiProducerConfig};
use crate::error::Result;
use crate::item::{Item, ItemShape};
use crate::orchestrator::{ConsumerSpec, Orchestrator, ProducerSpec, RunConfig};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScenarioReport {
    pub name: String,
    pub shape: ItemShape,
    pub produced: usize,
    pub consumed: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MultiProducerReport {
    pub producers: usize,
    pub consumers: usize,
    pub total_produced: usize,
    pub total_consumed: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DemoReport {
    pub scenarios: Vec<ScenarioReport>,
    pub multi_producer: MultiProducerReport,
}

impl fmt::Display for DemoReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Fast Producer-Consumer Demo ===")?;
        for s in &self.scenarios {
            writeln!(f, "{}: produced={}, consumed={}", s.name, s.produced, s.consumed)?;
        }
        writeln!(f)?;
        writeln!(f, "--- Multi-Producer Test ---")?;
        write!(
            f,
            "Total produced: {}, consumed: {}",
            self.multi_producer.total_produced, self.multi_producer.total_consumed
        )
    }
}

/// One producer emitting `count` items of `shape` to one draining consumer.
pub fn run_scenario(shape: ItemShape, count: usize, capacity: usize) -> Result<ScenarioReport> {
    let config = RunConfig::<Item>::new(capacity)
        .producer(ProducerSpec::new("producer", count, move |i| Ok(shape.generate(i))))
        .consumer(ConsumerSpec::draining("consumer"));
    let report = Orchestrator::run(config)?;

    info!(scenario = shape.title(), produced = report.total_produced, "scenario done");
    Ok(ScenarioReport {
        name: shape.title().to_string(),
        shape,
        produced: report.total_produced,
        consumed: report.total_consumed,
    })
}

/// Producer `p` emits the integers `p * n .. (p + 1) * n`.
pub fn run_multi_producer(config: &MultiProducerConfig) -> Result<MultiProducerReport> {
    let per = config.items_per_producer;
    let pace = Duration::from_millis(config.pace_ms);

    let mut run = RunConfig::<usize>::new(config.capacity);
    for p in 0..config.producers {
        let base = p * per;
        run = run.producer(
            ProducerSpec::new(format!("producer-{}", p), per, move |i| Ok(base + i)).with_pace(pace),
        );
    }
    for c in 0..config.consumers {
        run = run.consumer(ConsumerSpec::draining(format!("consumer-{}", c)));
    }

    let report = Orchestrator::run(run)?;
    Ok(MultiProducerReport {
        producers: config.producers,
        consumers: config.consumers,
        total_produced: report.total_produced,
        total_consumed: report.total_consumed,
    })
}

pub fn run_demo(config: &DemoConfig) -> Result<DemoReport> {
    config.validate()?;
    let s = &config.scenarios;
    let counts = [
        (ItemShape::Record, s.records),
        (ItemShape::Pair, s.pairs),
        (ItemShape::Order, s.orders),
        (ItemShape::Nested, s.nested),
    ];

    let scenarios = counts
        .into_iter()
        .map(|(shape, count)| run_scenario(shape, count, s.capacity))
        .collect::<Result<Vec<_>>>()?;
    let multi_producer = run_multi_producer(&config.multi_producer)?;

    Ok(DemoReport {
        scenarios,
        multi_producer,
    })
}
