//! Flow list loading: fresh loads, infinite scroll and page responses

use shovel_core::prelude::*;
use shovel_core::FlowPage;

use crate::message::{Message, PageRequest};
use crate::state::{AppState, LoadState};

use super::{UpdateAction, UpdateResult};

/// Initial load for the starting location.
pub fn handle_init(state: &mut AppState) -> UpdateResult {
    let follow_up = state.selected_flow.map(|_| Message::FetchSelectedDetail);
    fresh_load(state).then(follow_up)
}

/// Clear the list and fetch the first page for the current filter.
///
/// Any response to an earlier request becomes stale.
pub(crate) fn fresh_load(state: &mut AppState) -> UpdateResult {
    state.generation += 1;
    state.pager.reset();
    state.load_state = LoadState::Loading;
    state.page_in_flight = true;

    let request = PageRequest {
        filter: state.filter(),
        cursor: None,
        generation: state.generation,
    };
    debug!(
        "Fresh load (generation {}): {:?}",
        request.generation, request.filter
    );
    UpdateResult::action(UpdateAction::FetchPage(request))
}

/// Loading sentinel visible: fetch the page after the last listed flow.
pub fn handle_scroll_reached_end(state: &mut AppState) -> UpdateResult {
    if state.load_state != LoadState::Loaded || state.page_in_flight || state.pager.is_exhausted()
    {
        return UpdateResult::none();
    }
    let Some(cursor) = state.pager.cursor() else {
        return UpdateResult::none();
    };

    state.page_in_flight = true;
    let request = PageRequest {
        filter: state.filter(),
        cursor: Some(cursor),
        generation: state.generation,
    };
    debug!("Fetching next page before {}", cursor);
    UpdateResult::action(UpdateAction::FetchPage(request))
}

/// Whether a response to `request` may still be applied.
fn is_current(state: &AppState, request: &PageRequest) -> bool {
    request.generation == state.generation && request.filter == state.filter()
}

pub fn handle_page_loaded(
    state: &mut AppState,
    request: PageRequest,
    page: FlowPage,
) -> UpdateResult {
    if !is_current(state, &request) {
        debug!(
            "Discarding stale page (generation {}, current {})",
            request.generation, state.generation
        );
        return UpdateResult::none();
    }

    state.page_in_flight = false;
    state.fetch_failed = false;

    if let Some(tags) = page.tags {
        state.live.apply(shovel_client::LiveEvent::TagList(tags));
    }

    let received = page.flows.len();
    let added = state.pager.merge(page.flows, &state.clock);
    state.load_state = LoadState::Loaded;
    debug!(
        "Merged {} of {} flows from {} page ({} listed, exhausted: {})",
        added,
        received,
        if request.is_append() { "next" } else { "first" },
        state.pager.len(),
        state.pager.is_exhausted()
    );
    UpdateResult::none()
}

pub fn handle_page_failed(state: &mut AppState, request: PageRequest, error: &str) -> UpdateResult {
    if !is_current(state, &request) {
        debug!("Ignoring failure of stale page request: {}", error);
        return UpdateResult::none();
    }

    let kind = if request.is_append() { "next page" } else { "flow list" };
    warn!("Failed to fetch {}: {}", kind, error);
    state.page_in_flight = false;
    state.fetch_failed = true;
    if state.load_state == LoadState::Loading {
        state.load_state = LoadState::Loaded;
    }
    UpdateResult::none()
}
