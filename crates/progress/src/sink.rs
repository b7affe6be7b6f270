//! Progress sinks - where percentage updates go.

use std::sync::{Arc, Mutex};

/// Handle identifying one task's row in a sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SinkHandle(pub u64);

impl std::fmt::Display for SinkHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Errors a sink may report. The manager logs and drops them.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    /// The sink's internal state lock was poisoned
    #[error("sink state poisoned")]
    Poisoned,

    /// The handle was never registered with this sink
    #[error("unknown sink handle: {0}")]
    UnknownHandle(SinkHandle),

    /// I/O error while rendering
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// A rendering collaborator that accepts progress updates.
///
/// Updates are keyed by handle and idempotent; rows for different tasks may
/// interleave freely.
pub trait ProgressSink: Send + Sync {
    /// Create a row for a task, not yet started.
    fn register(&self, handle: SinkHandle, description: &str, total: f64) -> Result<(), SinkError>;

    /// Mark the row as started.
    fn start(&self, handle: SinkHandle) -> Result<(), SinkError>;

    /// Set the completed amount (out of the registered total).
    fn update(&self, handle: SinkHandle, completed: f64) -> Result<(), SinkError>;
}

/// Discards every update.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl ProgressSink for NullSink {
    fn register(&self, _handle: SinkHandle, _description: &str, _total: f64) -> Result<(), SinkError> {
        Ok(())
    }

    fn start(&self, _handle: SinkHandle) -> Result<(), SinkError> {
        Ok(())
    }

    fn update(&self, _handle: SinkHandle, _completed: f64) -> Result<(), SinkError> {
        Ok(())
    }
}

/// An update received by a [`RecordingSink`].
#[derive(Debug, Clone, PartialEq)]
pub enum SinkEvent {
    /// A row was created
    Registered {
        /// Row handle
        handle: SinkHandle,
        /// Row label
        description: String,
        /// Row total
        total: f64,
    },
    /// A row was started
    Started(SinkHandle),
    /// A row's completed amount changed
    Updated(SinkHandle, f64),
}

/// Captures every update in order. Clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    events: Arc<Mutex<Vec<SinkEvent>>>,
}

impl RecordingSink {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything recorded so far.
    pub fn events(&self) -> Vec<SinkEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    /// Most recent completed amount pushed for `handle`.
    pub fn last_update(&self, handle: SinkHandle) -> Option<f64> {
        self.events().into_iter().rev().find_map(|event| match event {
            SinkEvent::Updated(h, completed) if h == handle => Some(completed),
            _ => None,
        })
    }

    fn push(&self, event: SinkEvent) -> Result<(), SinkError> {
        self.events
            .lock()
            .map_err(|_| SinkError::Poisoned)?
            .push(event);
        Ok(())
    }
}

impl ProgressSink for RecordingSink {
    fn register(&self, handle: SinkHandle, description: &str, total: f64) -> Result<(), SinkError> {
        self.push(SinkEvent::Registered {
            handle,
            description: description.to_string(),
            total,
        })
    }

    fn start(&self, handle: SinkHandle) -> Result<(), SinkError> {
        self.push(SinkEvent::Started(handle))
    }

    fn update(&self, handle: SinkHandle, completed: f64) -> Result<(), SinkError> {
        self.push(SinkEvent::Updated(handle, completed))
    }
}
