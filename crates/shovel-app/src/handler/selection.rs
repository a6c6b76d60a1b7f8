//! Selected flow and its detail
//!
//! Selecting a flow never reloads the list. The selection is mirrored into
//! the `flow` parameter of the location.

use shovel_core::prelude::*;
use shovel_core::{with_selected_flow, FlowDetail, FlowId};

use crate::message::Message;
use crate::pager::Direction;
use crate::state::{AppState, DetailState};

use super::{UpdateAction, UpdateResult};

pub fn handle_select_flow(state: &mut AppState, id: FlowId) -> UpdateResult {
    if state.selected_flow == Some(id) {
        return UpdateResult::none();
    }

    debug!("Selecting flow {}", id);
    state.selected_flow = Some(id);
    state.detail = DetailState::None;
    let url = with_selected_flow(state.location.current(), Some(id));
    state.location.push(url);
    UpdateResult::message(Message::FetchSelectedDetail)
}

pub fn handle_select_adjacent(state: &mut AppState, direction: Direction) -> UpdateResult {
    match state.pager.adjacent(state.selected_flow, direction) {
        Some(id) => UpdateResult::message(Message::SelectFlow(id)),
        None => UpdateResult::none(),
    }
}

pub fn handle_clear_selection(state: &mut AppState) -> UpdateResult {
    let Some(id) = state.selected_flow.take() else {
        return UpdateResult::none();
    };

    debug!("Clearing selection of flow {}", id);
    state.detail = DetailState::None;
    let url = with_selected_flow(state.location.current(), None);
    state.location.push(url);
    UpdateResult::none()
}

pub fn handle_fetch_selected_detail(state: &mut AppState) -> UpdateResult {
    if !state.settings.detail.fetch_on_select {
        return UpdateResult::none();
    }
    let Some(id) = state.selected_flow else {
        return UpdateResult::none();
    };

    state.detail = DetailState::Pending(id);
    UpdateResult::action(UpdateAction::FetchFlowDetail { id })
}

pub fn handle_detail_loaded(
    state: &mut AppState,
    id: FlowId,
    detail: Option<Box<FlowDetail>>,
) -> UpdateResult {
    if state.selected_flow != Some(id) {
        debug!("Discarding detail of flow {}, no longer selected", id);
        return UpdateResult::none();
    }

    state.detail = match detail {
        Some(detail) => DetailState::Loaded(id, detail),
        None => {
            warn!("Flow {} not found", id);
            DetailState::NotFound(id)
        }
    };
    UpdateResult::none()
}
