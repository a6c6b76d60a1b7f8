//! Main update function - handles state transitions (TEA pattern)

use crate::message::Message;
use crate::state::AppState;

use super::{filter, keys::handle_key, list, live, selection, UpdateResult};

/// Process a message and update state
/// Returns optional follow-up message and/or action
pub fn update(state: &mut AppState, message: Message) -> UpdateResult {
    match message {
        Message::Init => list::handle_init(state),

        Message::Key(key) => match handle_key(state, key) {
            Some(msg) => UpdateResult::message(msg),
            None => UpdateResult::none(),
        },

        // ─────────────────────────────────────────────────────────
        // Navigation
        // ─────────────────────────────────────────────────────────
        Message::HistoryBack => filter::handle_history_back(state),
        Message::HistoryForward => filter::handle_history_forward(state),
        Message::Navigate(url) => filter::handle_navigate(state, url),

        // ─────────────────────────────────────────────────────────
        // Filter Interactions
        // ─────────────────────────────────────────────────────────
        Message::SetServiceFilter(value) => filter::handle_service_filter(state, &value),
        Message::SetUntilTick(tick) => filter::handle_until_tick(state, tick),
        Message::SetProtocolFilter(value) => filter::handle_protocol_filter(state, &value),
        Message::SubmitSearch(search) => filter::handle_search(state, &search),
        Message::SetTextSelection(selection) => {
            state.text_selection = selection.filter(|s| !s.is_empty());
            UpdateResult::none()
        }
        Message::ToggleTag { tag, shift } => filter::handle_toggle_tag(state, &tag, shift),
        Message::TimelineClick { fraction } => filter::handle_timeline_click(state, fraction),
        Message::ApplyFlowTick => filter::handle_apply_flow_tick(state),

        // ─────────────────────────────────────────────────────────
        // Flow List
        // ─────────────────────────────────────────────────────────
        Message::ScrollReachedEnd => list::handle_scroll_reached_end(state),
        Message::ViewportChanged { first, last } => {
            state.viewport = Some((first, last));
            UpdateResult::none()
        }
        Message::FlowPageLoaded { request, page } => list::handle_page_loaded(state, request, page),
        Message::FlowPageFailed { request, error } => {
            list::handle_page_failed(state, request, &error)
        }

        // ─────────────────────────────────────────────────────────
        // Selection
        // ─────────────────────────────────────────────────────────
        Message::SelectFlow(id) => selection::handle_select_flow(state, id),
        Message::SelectAdjacent(direction) => selection::handle_select_adjacent(state, direction),
        Message::ClearSelection => selection::handle_clear_selection(state),
        Message::FetchSelectedDetail => selection::handle_fetch_selected_detail(state),
        Message::FlowDetailLoaded { id, detail } => {
            selection::handle_detail_loaded(state, id, detail)
        }

        // ─────────────────────────────────────────────────────────
        // Push Channel
        // ─────────────────────────────────────────────────────────
        Message::LiveSubscriptionStarted => {
            state.live.connecting();
            UpdateResult::none()
        }
        Message::Live(event) => live::handle_live_event(state, event),
    }
}
