//! Flow filter state and its URL codec
//!
//! The navigable location is the only place a [`FilterState`] is stored.
//! [`FilterState::parse`] and [`FilterState::serialize`] are the only readers
//! and writers of the filter query parameters; everything else re-derives the
//! filter from the current URL.
//!
//! Parsing is total: missing, empty or malformed parameters mean "no
//! constraint". Serialization rewrites only the filter parameters, keeps every
//! other parameter (e.g. `flow`) in place, and never writes empty values.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::flow::{FlowId, Timestamp};

/// Query parameter names of the navigable location.
pub mod param {
    pub const FLOW: &str = "flow";
    pub const FROM: &str = "from";
    pub const TO: &str = "to";
    pub const SERVICE: &str = "service";
    pub const APP_PROTO: &str = "app_proto";
    pub const SEARCH: &str = "search";
    pub const TAG_REQUIRE: &str = "tag_require";
    pub const TAG_DENY: &str = "tag_deny";

    /// Parameters owned by the filter codec.
    pub const FILTER_PARAMS: &[&str] =
        &[FROM, TO, SERVICE, APP_PROTO, SEARCH, TAG_REQUIRE, TAG_DENY];
}

/// Service filter value selecting flows that belong to no configured service.
pub const UNKNOWN_SERVICES: &str = "!";

/// Every URL-encoded flow filter.
///
/// Invariant: a tag is never in both `tags_require` and `tags_deny`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterState {
    pub from_ts: Option<Timestamp>,
    pub to_ts: Option<Timestamp>,
    pub services: Vec<String>,
    pub app_proto: Option<String>,
    pub search: Option<String>,
    pub tags_require: Vec<String>,
    pub tags_deny: Vec<String>,
}

impl FilterState {
    /// Read the filter from a location.
    pub fn parse(url: &Url) -> Self {
        let mut state = FilterState::default();
        for (key, value) in url.query_pairs() {
            // Single-valued parameters keep their first usable occurrence.
            match &*key {
                param::FROM => state.from_ts = state.from_ts.or_else(|| parse_timestamp(&value)),
                param::TO => state.to_ts = state.to_ts.or_else(|| parse_timestamp(&value)),
                param::SERVICE => push_unique(&mut state.services, &value),
                param::APP_PROTO => {
                    state.app_proto = state.app_proto.take().or_else(|| non_empty(&value))
                }
                param::SEARCH => state.search = state.search.take().or_else(|| non_empty(&value)),
                param::TAG_REQUIRE => push_unique(&mut state.tags_require, &value),
                param::TAG_DENY => push_unique(&mut state.tags_deny, &value),
                _ => {}
            }
        }
        // A tag listed on both sides keeps its "required" state.
        let required = state.tags_require.clone();
        state.tags_deny.retain(|t| !required.contains(t));
        state
    }

    /// Write this filter into `url`, returning the new location.
    ///
    /// Non-filter parameters keep their relative order; filter parameters are
    /// appended after them in a canonical order.
    pub fn serialize(&self, url: &Url) -> Url {
        let kept: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(k, _)| {
                let key: &str = k;
                !param::FILTER_PARAMS.contains(&key)
            })
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        let mut pairs = kept;
        if let Some(from) = self.from_ts {
            pairs.push((param::FROM.to_string(), from.to_string()));
        }
        if let Some(to) = self.to_ts {
            pairs.push((param::TO.to_string(), to.to_string()));
        }
        for service in self.services.iter().filter(|s| !s.is_empty()) {
            pairs.push((param::SERVICE.to_string(), service.clone()));
        }
        if let Some(proto) = self.app_proto.as_ref().filter(|p| !p.is_empty()) {
            pairs.push((param::APP_PROTO.to_string(), proto.clone()));
        }
        if let Some(search) = self.search.as_ref().filter(|s| !s.is_empty()) {
            pairs.push((param::SEARCH.to_string(), search.clone()));
        }
        for tag in self.tags_require.iter().filter(|t| !t.is_empty()) {
            pairs.push((param::TAG_REQUIRE.to_string(), tag.clone()));
        }
        for tag in self
            .tags_deny
            .iter()
            .filter(|t| !t.is_empty() && !self.tags_require.contains(*t))
        {
            pairs.push((param::TAG_DENY.to_string(), tag.clone()));
        }

        with_query_pairs(url, &pairs)
    }

    /// Whether a constraint beyond the service selection is active.
    ///
    /// Drives the "filters active" indicator on the filter dropdown.
    pub fn is_active(&self) -> bool {
        self.to_ts.is_some()
            || self.app_proto.is_some()
            || self.search.is_some()
            || !self.tags_require.is_empty()
            || !self.tags_deny.is_empty()
    }
}

/// Flow selected in `url`, if the `flow` parameter holds a valid id.
pub fn selected_flow(url: &Url) -> Option<FlowId> {
    url.query_pairs()
        .find(|(k, _)| k == param::FLOW)
        .and_then(|(_, v)| v.parse().ok())
}

/// Return `url` with the `flow` parameter set to `flow`, or removed.
pub fn with_selected_flow(url: &Url, flow: Option<FlowId>) -> Url {
    let mut pairs: Vec<(String, String)> = Vec::new();
    let mut written = false;
    for (k, v) in url.query_pairs() {
        if k == param::FLOW {
            if let (Some(id), false) = (flow, written) {
                pairs.push((k.into_owned(), id.to_string()));
                written = true;
            }
            continue;
        }
        pairs.push((k.into_owned(), v.into_owned()));
    }
    if let (Some(id), false) = (flow, written) {
        pairs.push((param::FLOW.to_string(), id.to_string()));
    }
    with_query_pairs(url, &pairs)
}

fn with_query_pairs(url: &Url, pairs: &[(String, String)]) -> Url {
    let mut next = url.clone();
    if pairs.is_empty() {
        next.set_query(None);
    } else {
        next.query_pairs_mut().clear().extend_pairs(pairs);
    }
    next
}

fn parse_timestamp(raw: &str) -> Option<Timestamp> {
    raw.trim().parse().ok()
}

fn non_empty(raw: &str) -> Option<String> {
    if raw.is_empty() {
        None
    } else {
        Some(raw.to_string())
    }
}

fn push_unique(list: &mut Vec<String>, value: &str) {
    if !value.is_empty() && !list.iter().any(|v| v == value) {
        list.push(value.to_string());
    }
}
