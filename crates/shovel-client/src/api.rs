//! Flow API contract
//!
//! The controller only depends on [`FlowApi`]; the HTTP implementation lives
//! in [`crate::http`] and an in-memory one in `test_utils`.

use shovel_core::prelude::*;
use shovel_core::{param, FilterState, FlowDetail, FlowId, FlowPage, Timestamp};

/// Maximum number of flows the backend returns per `listFlows` call.
pub const PAGE_SIZE: usize = 100;

/// A page with fewer flows than this is the last one.
pub const TERMINAL_PAGE_THRESHOLD: usize = 99;

/// Whether a page of `len` flows ends the list.
pub fn is_terminal_page(len: usize) -> bool {
    len < TERMINAL_PAGE_THRESHOLD
}

/// Arguments of one `listFlows` call.
///
/// Built from the filter in effect plus an optional cursor; the cursor
/// replaces the `to` bound so that the next page starts at the last flow
/// already fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListFlowsQuery {
    pub from_ts: Option<Timestamp>,
    pub to_ts: Option<Timestamp>,
    pub services: Vec<String>,
    pub app_proto: Option<String>,
    pub search: Option<String>,
    pub tags_require: Vec<String>,
    pub tags_deny: Vec<String>,
}

impl ListFlowsQuery {
    pub fn new(filter: &FilterState, cursor: Option<Timestamp>) -> Self {
        Self {
            from_ts: filter.from_ts,
            to_ts: cursor.or(filter.to_ts),
            services: filter.services.clone(),
            app_proto: filter.app_proto.clone(),
            search: filter.search.clone(),
            tags_require: filter.tags_require.clone(),
            tags_deny: filter.tags_deny.clone(),
        }
    }

    /// Query-string pairs, in the order the backend documents them.
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(from) = self.from_ts {
            pairs.push((param::FROM, from.to_string()));
        }
        if let Some(to) = self.to_ts {
            pairs.push((param::TO, to.to_string()));
        }
        pairs.extend(self.services.iter().map(|s| (param::SERVICE, s.clone())));
        if let Some(proto) = &self.app_proto {
            pairs.push((param::APP_PROTO, proto.clone()));
        }
        if let Some(search) = &self.search {
            pairs.push((param::SEARCH, search.clone()));
        }
        pairs.extend(self.tags_require.iter().map(|t| (param::TAG_REQUIRE, t.clone())));
        pairs.extend(self.tags_deny.iter().map(|t| (param::TAG_DENY, t.clone())));
        pairs
    }
}

/// Flow storage backend as seen by the controller
#[trait_variant::make(FlowApi: Send)]
pub trait LocalFlowApi {
    /// At most [`PAGE_SIZE`] flows matching `query`, newest first.
    ///
    /// `search` is a glob matched against payloads; `tags_require` must all
    /// be present and none of `tags_deny` may be.
    async fn list_flows(&self, query: &ListFlowsQuery) -> Result<FlowPage>;

    /// Full record of one flow, `None` when the backend does not know it.
    async fn get_flow(&self, id: FlowId) -> Result<Option<FlowDetail>>;
}
