//! Domain events emitted by the Engine for external consumers
//!
//! The flow-detail renderer and the headless runner subscribe to these via
//! `Engine::subscribe()`. Events are broadcast after each message processing
//! cycle, derived from what changed in the state.

use shovel_core::{FilterState, FlowDetail, FlowId, TimestampBounds};
use url::Url;

#[derive(Debug, Clone)]
pub enum EngineEvent {
    // ─────────────────────────────────────────────────────────
    // Selection
    // ─────────────────────────────────────────────────────────
    /// Selected flow or search term changed; the detail view refreshes
    SelectionChanged {
        flow_id: Option<FlowId>,
        search: Option<String>,
    },

    /// Detail of the selected flow arrived
    FlowDetailLoaded {
        flow_id: FlowId,
        detail: Box<FlowDetail>,
    },

    /// Selected flow is unknown or its detail could not be fetched
    FlowNotFound { flow_id: FlowId },

    // ─────────────────────────────────────────────────────────
    // Flow List
    // ─────────────────────────────────────────────────────────
    /// List cleared for a fresh load
    ListReset { filter: FilterState, generation: u64 },

    /// Page merged into the list
    ListAppended {
        added: usize,
        total: usize,
        exhausted: bool,
    },

    // ─────────────────────────────────────────────────────────
    // Location & Connectivity
    // ─────────────────────────────────────────────────────────
    /// Navigable location changed
    LocationChanged { url: Url },

    /// Offline indicator changed
    OfflineChanged { offline: bool },

    /// Timeline bounds pushed by the server changed
    BoundsChanged { bounds: TimestampBounds },

    // ─────────────────────────────────────────────────────────
    // Engine Lifecycle
    // ─────────────────────────────────────────────────────────
    /// Engine is shutting down
    Shutdown,
}

impl EngineEvent {
    /// Returns a short string label for this event type (for logging/debugging).
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::SelectionChanged { .. } => "selection_changed",
            Self::FlowDetailLoaded { .. } => "flow_detail_loaded",
            Self::FlowNotFound { .. } => "flow_not_found",
            Self::ListReset { .. } => "list_reset",
            Self::ListAppended { .. } => "list_appended",
            Self::LocationChanged { .. } => "location_changed",
            Self::OfflineChanged { .. } => "offline_changed",
            Self::BoundsChanged { .. } => "bounds_changed",
            Self::Shutdown => "shutdown",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_event_type_labels() {
        assert_eq!(EngineEvent::Shutdown.event_type(), "shutdown");
        assert_eq!(
            EngineEvent::FlowNotFound { flow_id: FlowId(1) }.event_type(),
            "flow_not_found"
        );
        assert_eq!(
            EngineEvent::ListAppended {
                added: 3,
                total: 3,
                exhausted: true
            }
            .event_type(),
            "list_appended"
        );
    }

    #[test]
    fn test_engine_event_all_variants_have_labels() {
        let url = Url::parse("http://shovel.local/").unwrap();
        let events = vec![
            EngineEvent::SelectionChanged {
                flow_id: None,
                search: None,
            },
            EngineEvent::FlowDetailLoaded {
                flow_id: FlowId(1),
                detail: Box::new(FlowDetail {
                    flow: serde_json::json!({"id": 1}),
                    events: Default::default(),
                }),
            },
            EngineEvent::FlowNotFound { flow_id: FlowId(1) },
            EngineEvent::ListReset {
                filter: FilterState::default(),
                generation: 1,
            },
            EngineEvent::ListAppended {
                added: 0,
                total: 0,
                exhausted: false,
            },
            EngineEvent::LocationChanged { url },
            EngineEvent::OfflineChanged { offline: true },
            EngineEvent::BoundsChanged {
                bounds: TimestampBounds::new(1, 2),
            },
            EngineEvent::Shutdown,
        ];

        for event in events {
            let label = event.event_type();
            assert!(!label.is_empty());
            assert_eq!(label, label.to_lowercase());
            assert!(!label.contains(' '));
        }
    }
}
