//! Message types for the application (TEA pattern)

use shovel_client::LiveEvent;
use shovel_core::{FilterState, FlowDetail, FlowId, FlowPage, Timestamp};
use url::Url;

use crate::input_key::KeyEvent;
use crate::pager::Direction;

/// A page fetch, tagged with what it was issued for.
///
/// A response is only applied while both the filter and the generation
/// still match the controller's.
#[derive(Debug, Clone, PartialEq)]
pub struct PageRequest {
    pub filter: FilterState,
    pub cursor: Option<Timestamp>,
    /// Fresh-load counter at issue time
    pub generation: u64,
}

impl PageRequest {
    pub fn is_append(&self) -> bool {
        self.cursor.is_some()
    }
}

/// All possible messages/events in the application
#[derive(Debug, Clone)]
pub enum Message {
    /// Initial load of the flow list for the starting location
    Init,

    /// Keyboard event
    Key(KeyEvent),

    // ─────────────────────────────────────────────────────────
    // Navigation
    // ─────────────────────────────────────────────────────────
    /// Browser back button
    HistoryBack,
    /// Browser forward button
    HistoryForward,
    /// Open a location (pasted or shared link)
    Navigate(Url),

    // ─────────────────────────────────────────────────────────
    // Filter Interactions
    // ─────────────────────────────────────────────────────────
    /// Service select changed; comma-joined endpoints, `!` for unknown
    SetServiceFilter(String),
    /// Until-tick control changed; `None` clears the time filter.
    ///
    /// Tick 0 is a real choice and sets `to` to the end of the first tick.
    SetUntilTick(Option<i64>),
    /// Protocol select changed; empty for all
    SetProtocolFilter(String),
    /// Search submitted; empty clears it
    SubmitSearch(String),
    /// Text currently selected in the page, used by Ctrl+Shift+F
    SetTextSelection(Option<String>),
    /// Tag clicked in the tag filter
    ToggleTag { tag: String, shift: bool },
    /// Timeline clicked at a fraction of its height
    TimelineClick { fraction: f64 },
    /// Use the selected flow's start as the time filter
    ApplyFlowTick,

    // ─────────────────────────────────────────────────────────
    // Flow List
    // ─────────────────────────────────────────────────────────
    /// Loading sentinel became visible (infinite scroll)
    ScrollReachedEnd,
    /// Flows at positions `first..=last` are in the viewport
    ViewportChanged { first: usize, last: usize },
    /// Page fetch completed
    FlowPageLoaded { request: PageRequest, page: FlowPage },
    /// Page fetch failed
    FlowPageFailed { request: PageRequest, error: String },

    // ─────────────────────────────────────────────────────────
    // Selection
    // ─────────────────────────────────────────────────────────
    /// Flow clicked
    SelectFlow(FlowId),
    /// Select the flow next to the current one
    SelectAdjacent(Direction),
    /// Deselect the current flow
    ClearSelection,
    /// Fetch the selected flow's detail, if enabled
    FetchSelectedDetail,
    /// Detail fetch completed; `None` when the flow is unknown or the
    /// fetch failed
    FlowDetailLoaded {
        id: FlowId,
        detail: Option<Box<FlowDetail>>,
    },

    // ─────────────────────────────────────────────────────────
    // Push Channel
    // ─────────────────────────────────────────────────────────
    /// The push subscription was started
    LiveSubscriptionStarted,
    /// Event received on the push channel
    Live(LiveEvent),
}
