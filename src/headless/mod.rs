//! Headless mode - NDJSON in, NDJSON out
//!
//! Interactions are read from stdin as [`HeadlessCommand`]s, one JSON object
//! per line. Engine notifications and view snapshots are written to stdout,
//! one event per line. Each event has an "event" field indicating its type.
//!
//! # Example Output
//!
//! ```json
//! {"event":"list_reset","filter":{...},"generation":1,"timestamp":1704700001000}
//! {"event":"list_appended","added":100,"total":100,"exhausted":false,"timestamp":1704700001050}
//! {"event":"selection_changed","flow_id":1234,"search":null,"timestamp":1704700002000}
//! ```

pub mod command;
pub mod runner;

use chrono::Utc;
use serde::Serialize;
use shovel_app::{ControllerView, EngineEvent};
use shovel_core::prelude::*;
use shovel_core::{FilterState, FlowDetail, FlowId, Timestamp};
use std::io::{self, Write};

pub use command::HeadlessCommand;

/// Events emitted in headless mode
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum HeadlessEvent {
    SelectionChanged {
        flow_id: Option<FlowId>,
        search: Option<String>,
        timestamp: i64,
    },

    FlowDetail {
        flow_id: FlowId,
        detail: Box<FlowDetail>,
        timestamp: i64,
    },

    FlowNotFound {
        flow_id: FlowId,
        timestamp: i64,
    },

    ListReset {
        filter: FilterState,
        generation: u64,
        timestamp: i64,
    },

    ListAppended {
        added: usize,
        total: usize,
        exhausted: bool,
        timestamp: i64,
    },

    LocationChanged {
        url: String,
        timestamp: i64,
    },

    OfflineChanged {
        offline: bool,
        timestamp: i64,
    },

    BoundsChanged {
        min: Timestamp,
        max: Timestamp,
        timestamp: i64,
    },

    /// Full view snapshot, on request
    View {
        view: Box<ControllerView>,
        timestamp: i64,
    },

    /// Error occurred
    Error {
        message: String,
        fatal: bool,
        timestamp: i64,
    },

    Shutdown {
        timestamp: i64,
    },
}

impl HeadlessEvent {
    /// Emit this event to stdout as JSON
    pub fn emit(&self) {
        let json = match serde_json::to_string(self) {
            Ok(json) => json,
            Err(e) => {
                error!("Failed to serialize headless event: {}", e);
                return;
            }
        };

        let mut stdout = io::stdout().lock();
        if let Err(e) = writeln!(stdout, "{}", json) {
            error!("Failed to write headless event to stdout: {}", e);
            return;
        }

        if let Err(e) = stdout.flush() {
            error!("Failed to flush headless stdout: {}", e);
        }
    }

    /// Get current timestamp in milliseconds
    fn now() -> i64 {
        Utc::now().timestamp_millis()
    }

    pub fn view(view: ControllerView) -> Self {
        Self::View {
            view: Box::new(view),
            timestamp: Self::now(),
        }
    }

    pub fn error(message: impl Into<String>, fatal: bool) -> Self {
        Self::Error {
            message: message.into(),
            fatal,
            timestamp: Self::now(),
        }
    }
}

impl From<EngineEvent> for HeadlessEvent {
    fn from(event: EngineEvent) -> Self {
        let timestamp = Self::now();
        match event {
            EngineEvent::SelectionChanged { flow_id, search } => Self::SelectionChanged {
                flow_id,
                search,
                timestamp,
            },
            EngineEvent::FlowDetailLoaded { flow_id, detail } => Self::FlowDetail {
                flow_id,
                detail,
                timestamp,
            },
            EngineEvent::FlowNotFound { flow_id } => Self::FlowNotFound { flow_id, timestamp },
            EngineEvent::ListReset { filter, generation } => Self::ListReset {
                filter,
                generation,
                timestamp,
            },
            EngineEvent::ListAppended {
                added,
                total,
                exhausted,
            } => Self::ListAppended {
                added,
                total,
                exhausted,
                timestamp,
            },
            EngineEvent::LocationChanged { url } => Self::LocationChanged {
                url: url.to_string(),
                timestamp,
            },
            EngineEvent::OfflineChanged { offline } => Self::OfflineChanged { offline, timestamp },
            EngineEvent::BoundsChanged { bounds } => Self::BoundsChanged {
                min: bounds.min,
                max: bounds.max,
                timestamp,
            },
            EngineEvent::Shutdown => Self::Shutdown { timestamp },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serializes_with_tag() {
        let event = HeadlessEvent::from(EngineEvent::FlowNotFound {
            flow_id: FlowId(42),
        });
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "flow_not_found");
        assert_eq!(json["flow_id"], 42);
        assert!(json["timestamp"].is_i64());
    }

    #[test]
    fn test_error_event() {
        let json = serde_json::to_value(HeadlessEvent::error("bad line", false)).unwrap();
        assert_eq!(json["event"], "error");
        assert_eq!(json["message"], "bad line");
        assert_eq!(json["fatal"], false);
    }
}
