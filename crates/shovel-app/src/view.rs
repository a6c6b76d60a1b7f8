//! View model: everything a frontend renders, composed from the state
//!
//! [`ControllerView::from_state`] is a pure function of [`AppState`]; the
//! filter is re-derived from the location on every call.

use serde::Serialize;
use shovel_core::{
    format_duration_us, format_flow_time, FilterState, FlowId, FlowSummary, ServiceMap, Tag,
    UNKNOWN_SERVICES,
};

use crate::live_channel::ConnectionState;
use crate::pager::ListRow;
use crate::state::{AppState, LoadState};
use crate::tags::{flow_badges, Badge, TagSections};
use crate::timeline::TimelineView;

/// One entry of a select control.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
    /// Option group (service name) the entry is listed under
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
}

impl SelectOption {
    fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
            group: None,
        }
    }

    fn in_group(mut self, group: &str) -> Self {
        self.group = Some(group.to_string());
        self
    }
}

/// Service select: all, unknown services, then per service an "All" entry
/// (when it has several endpoints) followed by each endpoint.
pub fn service_options(services: &ServiceMap) -> Vec<SelectOption> {
    let mut options = vec![
        SelectOption::new("", "All flows"),
        SelectOption::new(UNKNOWN_SERVICES, "Flows from unknown services"),
    ];
    for (name, endpoints) in services.iter() {
        if endpoints.len() > 1 {
            options.push(
                SelectOption::new(endpoints.join(","), format!("All ({name})")).in_group(name),
            );
        }
        for endpoint in endpoints {
            options.push(
                SelectOption::new(endpoint.as_str(), format!("{endpoint} ({name})")).in_group(name),
            );
        }
    }
    options
}

/// Protocol select: all, raw, then every protocol the server reported.
pub fn protocol_options(app_protos: &[String]) -> Vec<SelectOption> {
    let mut options = vec![SelectOption::new("", "All"), SelectOption::new("raw", "Raw")];
    options.extend(
        app_protos
            .iter()
            .map(|p| SelectOption::new(p.as_str(), p.to_uppercase())),
    );
    options
}

/// A rendered flow row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlowRow {
    pub id: FlowId,
    pub service: String,
    pub time: String,
    pub duration: String,
    pub badges: Vec<Badge>,
    pub selected: bool,
}

impl FlowRow {
    pub fn new(flow: &FlowSummary, services: &ServiceMap, tags: &[Tag], selected: bool) -> Self {
        Self {
            id: flow.id,
            service: services.describe(&flow.dest_ip, flow.dest_port),
            time: format_flow_time(flow.ts_start),
            duration: format_duration_us(flow.duration_us()),
            badges: flow_badges(flow, tags),
            selected,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RowView {
    Tick { tick: i64 },
    Flow(FlowRow),
}

/// Snapshot of everything a frontend renders.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ControllerView {
    pub location: String,
    pub can_go_back: bool,
    pub can_go_forward: bool,
    pub filter: FilterState,
    /// Any constraint beyond the service selection is set
    pub filter_active: bool,
    pub load_state: LoadState,
    /// Loading sentinel shown at the end of the list
    pub loading: bool,
    pub offline: bool,
    pub connection: ConnectionState,
    pub selected_flow: Option<FlowId>,
    pub rows: Vec<RowView>,
    pub service_options: Vec<SelectOption>,
    pub protocol_options: Vec<SelectOption>,
    pub tags: TagSections,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeline: Option<TimelineView>,
    /// Tick shown in the until-tick control
    #[serde(skip_serializing_if = "Option::is_none")]
    pub until_tick: Option<f64>,
    /// Fractional tick of the selected flow, three decimals
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flow_tick: Option<String>,
}

impl ControllerView {
    pub fn from_state(state: &AppState) -> Self {
        let filter = state.filter();
        let services = state
            .live
            .config()
            .map(|c| c.services.clone())
            .unwrap_or_default();
        let tags = state.live.tags();

        let rows = state
            .pager
            .rows()
            .iter()
            .map(|row| match row {
                ListRow::Tick(tick) => RowView::Tick { tick: *tick },
                ListRow::Flow(flow) => RowView::Flow(FlowRow::new(
                    flow,
                    &services,
                    tags,
                    state.selected_flow == Some(flow.id),
                )),
            })
            .collect();

        let timeline = state.live.bounds().map(|bounds| {
            let visible = state
                .viewport
                .and_then(|(first, last)| state.pager.visible_span(first, last));
            let session_start = state.live.config().and_then(|c| c.session_start());
            TimelineView::new(bounds, visible, session_start)
        });

        let flow_tick = state
            .selected_flow_start()
            .and_then(|ts| state.clock.fractional_tick(ts))
            .map(|tick| format!("{tick:.3}"));
        let tag_sections = TagSections::new(tags, &filter);

        Self {
            location: state.location.current().to_string(),
            can_go_back: state.location.can_go_back(),
            can_go_forward: state.location.can_go_forward(),
            filter_active: filter.is_active(),
            until_tick: filter.to_ts.map(|to| state.clock.tick_for_bound(to)),
            filter,
            load_state: state.load_state,
            loading: state.loading_indicator_visible(),
            offline: state.is_offline(),
            connection: state.live.state(),
            selected_flow: state.selected_flow,
            rows,
            service_options: service_options(&services),
            protocol_options: protocol_options(state.live.app_protos()),
            tags: tag_sections,
            timeline,
            flow_tick,
        }
    }
}
