//! Application state (Model in TEA pattern)

use serde::Serialize;
use shovel_core::{selected_flow, FilterState, FlowDetail, FlowId, Timestamp};
use url::Url;

use crate::config::Settings;
use crate::live_channel::LiveConfigChannel;
use crate::location::Location;
use crate::pager::FlowListPager;
use crate::timeline::TickClock;

/// Flow list load state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadState {
    /// Nothing requested yet
    #[default]
    Idle,
    /// Fresh load in flight; the list is empty
    Loading,
    /// First page applied; further pages append
    Loaded,
}

/// Detail of the selected flow.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum DetailState {
    #[default]
    None,
    Pending(FlowId),
    Loaded(FlowId, Box<FlowDetail>),
    NotFound(FlowId),
}

impl DetailState {
    pub fn flow_id(&self) -> Option<FlowId> {
        match self {
            DetailState::None => None,
            DetailState::Pending(id) | DetailState::Loaded(id, _) | DetailState::NotFound(id) => {
                Some(*id)
            }
        }
    }
}

/// Complete controller state
#[derive(Debug)]
pub struct AppState {
    pub settings: Settings,

    /// Navigable location, the only store of the filter
    pub location: Location,

    pub load_state: LoadState,

    pub pager: FlowListPager,

    pub live: LiveConfigChannel,

    /// Tick arithmetic for the current session config
    pub clock: TickClock,

    pub selected_flow: Option<FlowId>,

    pub detail: DetailState,

    /// Incremented on every fresh load
    pub generation: u64,

    /// A page fetch for the current generation is outstanding
    pub page_in_flight: bool,

    /// Push channel reported offline
    pub push_offline: bool,

    /// Last page fetch failed
    pub fetch_failed: bool,

    /// Flow positions in the viewport, `(first, last)`
    pub viewport: Option<(usize, usize)>,

    /// Text selected in the page
    pub text_selection: Option<String>,
}

impl AppState {
    pub fn new(url: Url, settings: Settings) -> Self {
        Self {
            selected_flow: selected_flow(&url),
            location: Location::new(url),
            settings,
            load_state: LoadState::default(),
            pager: FlowListPager::new(),
            live: LiveConfigChannel::new(),
            clock: TickClock::default(),
            detail: DetailState::default(),
            generation: 0,
            page_in_flight: false,
            push_offline: false,
            fetch_failed: false,
            viewport: None,
            text_selection: None,
        }
    }

    /// Filter in effect, read from the location.
    pub fn filter(&self) -> FilterState {
        FilterState::parse(self.location.current())
    }

    pub fn is_offline(&self) -> bool {
        self.push_offline || self.fetch_failed
    }

    /// The loading sentinel shows while loading and while more pages may
    /// follow.
    pub fn loading_indicator_visible(&self) -> bool {
        match self.load_state {
            LoadState::Idle => false,
            LoadState::Loading => true,
            LoadState::Loaded => !self.pager.is_exhausted(),
        }
    }

    /// Start timestamp of the selected flow, from the list or its detail.
    pub fn selected_flow_start(&self) -> Option<Timestamp> {
        let id = self.selected_flow?;
        if let Some(flow) = self.pager.flow(id) {
            return Some(flow.ts_start);
        }
        match &self.detail {
            DetailState::Loaded(detail_id, detail) if *detail_id == id => {
                detail.flow.get("ts_start").and_then(|v| v.as_i64())
            }
            _ => None,
        }
    }
}
