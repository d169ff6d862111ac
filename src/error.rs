use std::path::PathBuf;

use thiserror::Error;

/// Everything that can go wrong while building or running a pipeline.
#[derive(Error, Debug)]
pub enum Error {
    #[error("buffer capacity must be at least 1, got {0}")]
    InvalidCapacity(usize),

    #[error("buffer is closed")]
    Closed,

    #[error("producer '{label}' failed to generate item {index}: {source}")]
    Generator {
        label: String,
        index: usize,
        #[source]
        source: anyhow::Error,
    },

    #[error("consumer '{label}' expected {expected} items but the buffer closed after {received}")]
    Underfed {
        label: String,
        expected: usize,
        received: usize,
    },

    #[error("failed to spawn thread for task '{label}': {source}")]
    Spawn {
        label: String,
        #[source]
        source: std::io::Error,
    },

    #[error("task '{label}' panicked")]
    TaskPanicked { label: String },

    #[error("unbalanced run: producers emit {produced} items but consumers expect {expected}")]
    Unbalanced { produced: usize, expected: usize },

    #[error("counted and draining consumers cannot share a run")]
    MixedConsumers,

    #[error("total {0} item count overflows usize")]
    CountOverflow(&'static str),

    #[error("task label '{0}' is used more than once")]
    DuplicateLabel(String),

    #[error("a run needs at least one producer")]
    NoProducers,

    #[error("a run needs at least one consumer")]
    NoConsumers,

    #[error("conservation violated: produced {produced}, consumed {consumed}")]
    Conservation { produced: usize, consumed: usize },

    #[error("failed to read config file {path}: {source}")]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("invalid value for '{field}': {reason}")]
    InvalidConfig { field: String, reason: String },
}

impl Error {
    pub fn invalid_config(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// True for errors a task reports only because a peer already aborted the run.
    pub fn is_secondary(&self) -> bool {
        matches!(self, Error::Closed | Error::Underfed { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        assert_eq!(
            Error::InvalidCapacity(0).to_string(),
            "buffer capacity must be at least 1, got 0"
        );
        let err = Error::Conservation {
            produced: 3,
            consumed: 2,
        };
        assert_eq!(err.to_string(), "conservation violated: produced 3, consumed 2");
    }

    #[test]
    fn test_secondary_classification() {
        assert!(Error::Closed.is_secondary());
        assert!(Error::Underfed {
            label: "c".into(),
            expected: 2,
            received: 1
        }
        .is_secondary());
        assert!(!Error::TaskPanicked { label: "p".into() }.is_secondary());
        assert!(!Error::Generator {
            label: "p".into(),
            index: 0,
            source: anyhow::anyhow!("boom"),
        }
        .is_secondary());
    }
}
