//! Test utilities for flow API consumers
//!
//! Provides flow/tag builders and [`MockFlowApi`], an in-memory backend that
//! applies the list filters the way the real one does and records every
//! query it receives.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use shovel_core::prelude::*;
use shovel_core::{FlowDetail, FlowId, FlowPage, FlowSummary, Tag, Timestamp};

use crate::api::{FlowApi, ListFlowsQuery, PAGE_SIZE};

/// Creates a test flow starting at `ts_start` and lasting 250 ms.
pub fn test_flow(id: i64, ts_start: Timestamp) -> FlowSummary {
    FlowSummary {
        id: FlowId(id),
        ts_start,
        ts_end: ts_start + 250_000,
        dest_ip: "10.0.0.1".to_string(),
        dest_port: Some(80),
        app_proto: Some("http".to_string()),
        tags: None,
        flowints: Default::default(),
    }
}

/// Creates a test flow carrying the given comma-separated tags.
pub fn test_flow_tagged(id: i64, ts_start: Timestamp, tags: &str) -> FlowSummary {
    FlowSummary {
        tags: Some(tags.to_string()),
        ..test_flow(id, ts_start)
    }
}

/// Creates a test tag with a fixed color.
pub fn test_tag(name: &str) -> Tag {
    Tag::new(name, "#dc3545")
}

#[derive(Debug, Default)]
struct MockState {
    flows: Vec<FlowSummary>,
    tags: Option<Vec<Tag>>,
    details: HashMap<FlowId, FlowDetail>,
    queries: Vec<ListFlowsQuery>,
    detail_requests: Vec<FlowId>,
    fail_list: bool,
}

/// In-memory [`FlowApi`].
///
/// Cloning shares the underlying store, so a test can keep a handle while
/// the engine owns another.
#[derive(Debug, Clone, Default)]
pub struct MockFlowApi {
    state: Arc<Mutex<MockState>>,
}

impl MockFlowApi {
    pub fn new(flows: Vec<FlowSummary>) -> Self {
        let api = Self::default();
        api.lock().flows = flows;
        api
    }

    /// Mock with `count` flows, ids `1..=count`, one second apart, newest
    /// starting at `newest`.
    pub fn with_sequential_flows(count: i64, newest: Timestamp) -> Self {
        Self::new(
            (0..count)
                .map(|i| test_flow(count - i, newest - i * 1_000_000))
                .collect(),
        )
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Tag set piggy-backed on every list response.
    pub fn set_tags(&self, tags: Vec<Tag>) {
        self.lock().tags = Some(tags);
    }

    pub fn insert_detail(&self, id: FlowId, detail: FlowDetail) {
        self.lock().details.insert(id, detail);
    }

    /// Make subsequent `list_flows` calls fail with a transport error.
    pub fn set_fail_list(&self, fail: bool) {
        self.lock().fail_list = fail;
    }

    /// Every `list_flows` query received so far.
    pub fn queries(&self) -> Vec<ListFlowsQuery> {
        self.lock().queries.clone()
    }

    pub fn detail_requests(&self) -> Vec<FlowId> {
        self.lock().detail_requests.clone()
    }

    fn matches(query: &ListFlowsQuery, flow: &FlowSummary) -> bool {
        if query.from_ts.is_some_and(|from| flow.ts_start < from) {
            return false;
        }
        if query.to_ts.is_some_and(|to| flow.ts_start > to) {
            return false;
        }
        if !query.services.is_empty() && !query.services.contains(&flow.endpoint()) {
            return false;
        }
        match query.app_proto.as_deref() {
            Some("raw") if flow.app_proto.is_some() => return false,
            Some(proto) if proto != "raw" && flow.app_proto.as_deref() != Some(proto) => {
                return false
            }
            _ => {}
        }
        query.tags_require.iter().all(|t| flow.has_tag(t))
            && !query.tags_deny.iter().any(|t| flow.has_tag(t))
    }
}

impl FlowApi for MockFlowApi {
    async fn list_flows(&self, query: &ListFlowsQuery) -> Result<FlowPage> {
        let mut state = self.lock();
        state.queries.push(query.clone());
        if state.fail_list {
            return Err(Error::transport("mock backend offline"));
        }

        let mut flows: Vec<FlowSummary> = state
            .flows
            .iter()
            .filter(|f| Self::matches(query, f))
            .cloned()
            .collect();
        flows.sort_by(|a, b| b.ts_start.cmp(&a.ts_start));
        flows.truncate(PAGE_SIZE);

        Ok(FlowPage {
            flows,
            tags: state.tags.clone(),
        })
    }

    async fn get_flow(&self, id: FlowId) -> Result<Option<FlowDetail>> {
        let mut state = self.lock();
        state.detail_requests.push(id);
        Ok(state.details.get(&id).cloned())
    }
}
