//! Filter interactions and history navigation
//!
//! Every interaction re-reads the filter from the location, changes it,
//! pushes the serialized location and starts a fresh load.

use shovel_core::prelude::*;
use shovel_core::{selected_flow, FilterState};
use url::Url;

use crate::message::Message;
use crate::state::{AppState, DetailState};
use crate::tags::{is_known_tag, toggle_tag};
use crate::timeline::timestamp_at;

use super::list::fresh_load;
use super::UpdateResult;

/// Push the location for `filter` and reload the list.
fn apply_filter(state: &mut AppState, filter: FilterState) -> UpdateResult {
    let url = filter.serialize(state.location.current());
    debug!("Navigating to {}", url);
    state.location.push(url);
    fresh_load(state)
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

pub fn handle_service_filter(state: &mut AppState, value: &str) -> UpdateResult {
    let mut filter = state.filter();
    filter.services = value
        .split(',')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    apply_filter(state, filter)
}

pub fn handle_until_tick(state: &mut AppState, tick: Option<i64>) -> UpdateResult {
    let mut filter = state.filter();
    filter.to_ts = tick.map(|t| state.clock.until_tick_bound(t));
    apply_filter(state, filter)
}

pub fn handle_protocol_filter(state: &mut AppState, value: &str) -> UpdateResult {
    let mut filter = state.filter();
    filter.app_proto = non_empty(value);
    apply_filter(state, filter)
}

pub fn handle_search(state: &mut AppState, search: &str) -> UpdateResult {
    let mut filter = state.filter();
    filter.search = non_empty(search);
    apply_filter(state, filter)
}

pub fn handle_toggle_tag(state: &mut AppState, tag: &str, shift: bool) -> UpdateResult {
    let mut filter = state.filter();
    if !is_known_tag(state.live.tags(), &filter, tag) {
        debug!("Ignoring toggle of unknown tag '{}'", tag);
        return UpdateResult::none();
    }
    let next = toggle_tag(&mut filter, tag, shift);
    debug!("Tag '{}' is now {:?}", tag, next);
    apply_filter(state, filter)
}

pub fn handle_timeline_click(state: &mut AppState, fraction: f64) -> UpdateResult {
    let Some(bounds) = state.live.bounds() else {
        debug!("Timeline click without timestamp bounds");
        return UpdateResult::none();
    };
    let mut filter = state.filter();
    filter.to_ts = Some(timestamp_at(bounds, fraction));
    apply_filter(state, filter)
}

pub fn handle_apply_flow_tick(state: &mut AppState) -> UpdateResult {
    if !state.clock.ticks_enabled() {
        return UpdateResult::none();
    }
    let Some(ts) = state.selected_flow_start() else {
        return UpdateResult::none();
    };
    let mut filter = state.filter();
    filter.to_ts = Some(ts);
    apply_filter(state, filter)
}

// ─────────────────────────────────────────────────────────
// History
// ─────────────────────────────────────────────────────────

pub fn handle_history_back(state: &mut AppState) -> UpdateResult {
    if !state.location.back() {
        return UpdateResult::none();
    }
    on_location_restored(state)
}

pub fn handle_history_forward(state: &mut AppState) -> UpdateResult {
    if !state.location.forward() {
        return UpdateResult::none();
    }
    on_location_restored(state)
}

pub fn handle_navigate(state: &mut AppState, url: Url) -> UpdateResult {
    state.location.push(url);
    on_location_restored(state)
}

/// The location changed outside the filter controls: re-read the selected
/// flow, then reload the list.
fn on_location_restored(state: &mut AppState) -> UpdateResult {
    let restored = selected_flow(state.location.current());
    let follow_up = if restored != state.selected_flow {
        debug!("Selection restored from history: {:?}", restored);
        state.selected_flow = restored;
        state.detail = DetailState::None;
        restored.map(|_| Message::FetchSelectedDetail)
    } else {
        None
    };
    fresh_load(state).then(follow_up)
}
