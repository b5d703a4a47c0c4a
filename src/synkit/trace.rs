//! Tracing
//!
//!     Sessions and the tree builder report what they do as [`TraceEvent`]s to an injected
//!     [`Tracer`]. There is no global logger: a run without a tracer uses [`NoopTracer`],
//!     and tools that want a log pass a [`RecordingTracer`] (or their own implementation)
//!     via `with_tracer`.
//!
//!     Event construction is skipped entirely when [`Tracer::enabled`] returns false.

use crate::synkit::building::BuildAnomaly;
use std::fmt;
use std::sync::{Arc, Mutex};

/// Something a session or the tree builder did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraceEvent {
    MarkerOpened {
        id: usize,
        token_index: usize,
    },
    MarkerCompleted {
        id: usize,
        kind: String,
        start: usize,
        end: usize,
        precedes: Option<usize>,
    },
    MarkerDropped {
        id: usize,
    },
    RolledBack {
        id: usize,
        token_index: usize,
        markers_discarded: usize,
        errors_retracted: usize,
    },
    ErrorReported {
        token_index: usize,
        message: String,
    },
    Anomaly(BuildAnomaly),
    ConstructorRejected {
        marker_id: usize,
        message: String,
    },
}

impl fmt::Display for TraceEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TraceEvent::MarkerOpened { id, token_index } => {
                write!(f, "open #{} at {}", id, token_index)
            }
            TraceEvent::MarkerCompleted {
                id,
                kind,
                start,
                end,
                precedes,
            } => {
                write!(f, "done #{} {} [{}, {})", id, kind, start, end)?;
                if let Some(inner) = precedes {
                    write!(f, " precedes #{}", inner)?;
                }
                Ok(())
            }
            TraceEvent::MarkerDropped { id } => write!(f, "drop #{}", id),
            TraceEvent::RolledBack {
                id,
                token_index,
                markers_discarded,
                errors_retracted,
            } => write!(
                f,
                "rollback #{} to {} ({} markers discarded, {} errors retracted)",
                id, token_index, markers_discarded, errors_retracted
            ),
            TraceEvent::ErrorReported {
                token_index,
                message,
            } => write!(f, "error at {}: {}", token_index, message),
            TraceEvent::Anomaly(anomaly) => write!(f, "anomaly: {}", anomaly),
            TraceEvent::ConstructorRejected { marker_id, message } => {
                write!(f, "constructor rejected #{}: {}", marker_id, message)
            }
        }
    }
}

/// Receives trace events
pub trait Tracer: Send {
    fn enabled(&self) -> bool {
        true
    }

    fn event(&mut self, event: TraceEvent);
}

/// Discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTracer;

impl Tracer for NoopTracer {
    fn enabled(&self) -> bool {
        false
    }

    fn event(&mut self, _event: TraceEvent) {}
}

/// Collects events in memory.
///
/// Clones share the same buffer, so keep one clone and hand the other to a session:
///
/// ```rust,ignore
/// let tracer = RecordingTracer::new();
/// let session = ParserSession::new(tokens).with_tracer(Box::new(tracer.clone()));
/// // ... parse ...
/// for event in tracer.events() {
///     println!("{}", event);
/// }
/// ```
#[derive(Debug, Default, Clone)]
pub struct RecordingTracer {
    events: Arc<Mutex<Vec<TraceEvent>>>,
}

impl RecordingTracer {
    pub fn new() -> Self {
        Self::default()
    }

    /// A snapshot of the events recorded so far
    pub fn events(&self) -> Vec<TraceEvent> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn clear(&self) {
        match self.events.lock() {
            Ok(mut events) => events.clear(),
            Err(poisoned) => poisoned.into_inner().clear(),
        }
    }
}

impl Tracer for RecordingTracer {
    fn event(&mut self, event: TraceEvent) {
        match self.events.lock() {
            Ok(mut events) => events.push(event),
            Err(poisoned) => poisoned.into_inner().push(event),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_tracer_shares_buffer() {
        let tracer = RecordingTracer::new();
        let mut handle = tracer.clone();
        handle.event(TraceEvent::MarkerDropped { id: 3 });
        assert_eq!(tracer.events(), vec![TraceEvent::MarkerDropped { id: 3 }]);

        tracer.clear();
        assert!(tracer.events().is_empty());
    }

    #[test]
    fn test_event_display() {
        let event = TraceEvent::MarkerCompleted {
            id: 2,
            kind: "Add".to_string(),
            start: 0,
            end: 5,
            precedes: Some(0),
        };
        assert_eq!(event.to_string(), "done #2 Add [0, 5) precedes #0");
    }
}
