//! # prodcons
//!
//! Producer/consumer pipelines over a bounded, blocking FIFO buffer.
//!
//! ```no_run
//! use prodcons::{ConsumerSpec, Orchestrator, ProducerSpec, RunConfig};
//!
//! let config = RunConfig::new(5)
//!     .producer(ProducerSpec::new("producer", 20, |i| Ok(i)))
//!     .consumer(ConsumerSpec::counted("consumer", 20));
//! let report = Orchestrator::run(config)?;
//! assert_eq!(report.total_produced, report.total_consumed);
//! # Ok::<(), prodcons::Error>(())
//! ```
//!
//! ## Modules
//!
//! - [`buffer`] - `BoundedBuffer`, the mutex + condvar queue
//! - [`producer`] / [`consumer`] - counted units of work on one buffer
//! - [`orchestrator`] - spawns, joins and checks a whole run
//! - [`item`] - the demo payload shapes
//! - [`config`] / [`demo`] - the configurable demo driven by the binary

pub mod buffer;
pub mod config;
pub mod consumer;
pub mod demo;
pub mod error;
pub mod item;
pub mod orchestrator;
pub mod producer;

pub use buffer::{BoundedBuffer, BufferState, BufferStats, TryPutError};
pub use config::DemoConfig;
pub use consumer::Consumer;
pub use error::{Error, Result};
pub use item::{Item, ItemShape, Order};
pub use orchestrator::{ConsumerSpec, Orchestrator, ProducerSpec, RunConfig, RunReport};
pub use producer::{Producer, Role, TaskReport};
