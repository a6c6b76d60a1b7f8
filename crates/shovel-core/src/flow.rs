//! # Flow Domain Types
//!
//! The shared vocabulary between the flow API client (`shovel-client`), the
//! controller (`shovel-app`) and presentation consumers.
//!
//! ## Protocol Assumptions
//!
//! - **Timestamps are microseconds** since the Unix epoch (`i64`).
//! - **Flow tags are comma-joined** in a single string, as produced by the
//!   backend's `GROUP_CONCAT`.
//! - **Per-tag counters** live in `flowints`, keyed `tag_<name>` with every
//!   non-alphanumeric character of the name replaced by `_`.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use chrono::{DateTime, NaiveDateTime};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Microseconds since the Unix epoch.
pub type Timestamp = i64;

/// Microseconds per second.
pub const MICROS_PER_SECOND: i64 = 1_000_000;

static TAG_ID_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9]").expect("Invalid tag id regex"));

// ── FlowId ────────────────────────────────────────────────────────────────────

/// Backend flow identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FlowId(pub i64);

impl fmt::Display for FlowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for FlowId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(FlowId)
    }
}

// ── FlowSummary ───────────────────────────────────────────────────────────────

/// One row of the flow list, as returned by `listFlows`.
///
/// Immutable once fetched; identity is `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowSummary {
    pub id: FlowId,
    pub ts_start: Timestamp,
    pub ts_end: Timestamp,
    pub dest_ip: String,
    #[serde(default)]
    pub dest_port: Option<u16>,
    #[serde(default)]
    pub app_proto: Option<String>,
    /// Comma-joined tag names (absent when the flow raised no alert).
    #[serde(default)]
    pub tags: Option<String>,
    #[serde(default)]
    pub flowints: BTreeMap<String, i64>,
}

impl FlowSummary {
    /// Tag names attached to this flow, in backend order.
    pub fn tag_names(&self) -> impl Iterator<Item = &str> {
        self.tags
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .filter(|t| !t.is_empty())
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tag_names().any(|t| t == tag)
    }

    /// Counter attached to `tag` for this flow, if the backend recorded one.
    pub fn tag_count(&self, tag: &str) -> Option<i64> {
        self.flowints.get(&tag_counter_key(tag)).copied()
    }

    /// Application protocol label; failed detection and unknown are `RAW`.
    pub fn app_proto_label(&self) -> String {
        let proto = match self.app_proto.as_deref() {
            None | Some("failed") => "raw",
            Some(p) => p,
        };
        proto.to_uppercase()
    }

    pub fn duration_us(&self) -> i64 {
        self.ts_end.saturating_sub(self.ts_start)
    }

    /// `ip:port`, or bare ip when the flow has no port (ICMP and friends).
    pub fn endpoint(&self) -> String {
        format_endpoint(&self.dest_ip, self.dest_port)
    }
}

/// Key under which the backend stores the per-flow counter for `tag`.
pub fn tag_counter_key(tag: &str) -> String {
    format!("tag_{}", TAG_ID_REGEX.replace_all(tag, "_"))
}

pub fn format_endpoint(ip: &str, port: Option<u16>) -> String {
    match port {
        Some(port) if port != 0 => format!("{ip}:{port}"),
        _ => ip.to_string(),
    }
}

// ── Tag ───────────────────────────────────────────────────────────────────────

/// A server-known tag with its display color.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    #[serde(rename = "tag")]
    pub name: String,
    #[serde(default)]
    pub color: Option<String>,
}

impl Tag {
    pub fn new(name: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            color: Some(color.into()),
        }
    }
}

// ── ServiceMap ────────────────────────────────────────────────────────────────

/// Service name to `ip:port` endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServiceMap(pub BTreeMap<String, Vec<String>>);

impl ServiceMap {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Vec<String>)> {
        self.0.iter()
    }

    /// Name of the service that owns `endpoint`, if any.
    pub fn service_for(&self, endpoint: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(_, endpoints)| endpoints.iter().any(|e| e == endpoint))
            .map(|(name, _)| name.as_str())
    }

    /// Pretty-print a destination: `name (:port)` for known services.
    pub fn describe(&self, dest_ip: &str, dest_port: Option<u16>) -> String {
        let endpoint = format_endpoint(dest_ip, dest_port);
        match self.service_for(&endpoint) {
            Some(name) => format!("{} (:{})", name, dest_port.unwrap_or_default()),
            None => endpoint,
        }
    }
}

// ── TimestampBounds ───────────────────────────────────────────────────────────

/// Earliest and latest flow start known to the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimestampBounds {
    pub min: Timestamp,
    pub max: Timestamp,
}

impl TimestampBounds {
    pub fn new(min: Timestamp, max: Timestamp) -> Self {
        Self { min, max }
    }

    pub fn span(&self) -> i64 {
        self.max.saturating_sub(self.min)
    }

    pub fn is_degenerate(&self) -> bool {
        self.max <= self.min
    }

    /// Strictly inside `(min, max)`.
    pub fn strictly_contains(&self, ts: Timestamp) -> bool {
        ts > self.min && ts < self.max
    }
}

// ── SessionConfig ─────────────────────────────────────────────────────────────

/// Capture session configuration pushed on every (re)connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Session start as an ISO-8601 date, e.g. `2024-11-30T09:00+01:00`.
    pub start_date: String,
    /// Tick length in seconds; `0` disables ticks.
    #[serde(default)]
    pub tick_length: u64,
    #[serde(default)]
    pub services: ServiceMap,
}

impl SessionConfig {
    /// Session start in microseconds, truncated to the second.
    ///
    /// Returns `None` when `start_date` cannot be parsed.
    pub fn session_start(&self) -> Option<Timestamp> {
        parse_start_date(&self.start_date).map(|secs| secs * MICROS_PER_SECOND)
    }

    pub fn ticks_enabled(&self) -> bool {
        self.tick_length > 0
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            start_date: "1970-01-01T00:00+00:00".to_string(),
            tick_length: 0,
            services: ServiceMap::default(),
        }
    }
}

/// Parse a start date into Unix seconds.
///
/// Accepts RFC 3339 as well as the minute-precision form the backend ships
/// by default (`1970-01-01T00:00+00:00`). Offset-less dates are read as UTC.
fn parse_start_date(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.timestamp());
    }
    if let Ok(dt) = DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M%:z") {
        return Some(dt.timestamp());
    }
    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|dt| dt.and_utc().timestamp())
}

// ── FlowPage / FlowDetail ─────────────────────────────────────────────────────

/// Response of `listFlows`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlowPage {
    pub flows: Vec<FlowSummary>,
    /// Tag set piggy-backed on the list response by some backends.
    #[serde(default)]
    pub tags: Option<Vec<Tag>>,
}

/// Response of `getFlow`; rendered by the detail collaborator, opaque here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowDetail {
    pub flow: serde_json::Value,
    #[serde(flatten)]
    pub events: BTreeMap<String, serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flow_json() -> &'static str {
        r#"{
            "id": 1234, "ts_start": 1700000000000000, "ts_end": 1700000000250000,
            "dest_ip": "10.0.0.2", "dest_port": 8080, "app_proto": "http",
            "tags": "flag_out,malware", "flowints": {"tag_flag_out": 3},
            "src_ip": "10.0.0.9", "extra_unknown": true
        }"#
    }

    #[test]
    fn test_flow_summary_parses_backend_row() {
        let flow: FlowSummary = serde_json::from_str(flow_json()).unwrap();
        assert_eq!(flow.id, FlowId(1234));
        assert_eq!(flow.dest_port, Some(8080));
        assert_eq!(flow.tag_names().collect::<Vec<_>>(), ["flag_out", "malware"]);
        assert!(flow.has_tag("malware"));
        assert!(!flow.has_tag("mal"));
        assert_eq!(flow.tag_count("flag_out"), Some(3));
        assert_eq!(flow.tag_count("malware"), None);
        assert_eq!(flow.duration_us(), 250_000);
    }

    #[test]
    fn test_flow_without_tags_has_no_tag_names() {
        let flow: FlowSummary = serde_json::from_str(
            r#"{"id": 1, "ts_start": 10, "ts_end": 20, "dest_ip": "10.0.0.1"}"#,
        )
        .unwrap();
        assert_eq!(flow.tag_names().count(), 0);
        assert_eq!(flow.app_proto_label(), "RAW");
        assert_eq!(flow.endpoint(), "10.0.0.1");
    }

    #[test]
    fn test_failed_app_proto_is_raw() {
        let mut flow: FlowSummary = serde_json::from_str(flow_json()).unwrap();
        assert_eq!(flow.app_proto_label(), "HTTP");
        flow.app_proto = Some("failed".to_string());
        assert_eq!(flow.app_proto_label(), "RAW");
    }

    #[test]
    fn test_tag_counter_key_sanitizes_name() {
        assert_eq!(tag_counter_key("flag-in"), "tag_flag_in");
        assert_eq!(tag_counter_key("a b.c"), "tag_a_b_c");
        assert_eq!(tag_counter_key("plain"), "tag_plain");
    }

    #[test]
    fn test_tag_uses_backend_field_name() {
        let tag: Tag = serde_json::from_str(r#"{"tag": "malware", "color": "danger"}"#).unwrap();
        assert_eq!(tag, Tag::new("malware", "danger"));
    }

    #[test]
    fn test_service_map_describe() {
        let services: ServiceMap = serde_json::from_str(
            r#"{"notes": ["10.0.0.2:8080", "10.0.0.3:8080"], "vault": ["10.0.0.4:1337"]}"#,
        )
        .unwrap();
        assert_eq!(services.describe("10.0.0.3", Some(8080)), "notes (:8080)");
        assert_eq!(services.describe("10.0.0.4", Some(1337)), "vault (:1337)");
        assert_eq!(services.describe("10.0.0.5", Some(22)), "10.0.0.5:22");
        assert_eq!(services.service_for("10.0.0.4:1337"), Some("vault"));
    }

    #[test]
    fn test_session_config_start_date_formats() {
        let mut config = SessionConfig::default();
        assert_eq!(config.session_start(), Some(0));

        config.start_date = "2024-01-01T10:00:00Z".to_string();
        assert_eq!(config.session_start(), Some(1_704_103_200 * MICROS_PER_SECOND));

        config.start_date = "2024-01-01T11:00+01:00".to_string();
        assert_eq!(config.session_start(), Some(1_704_103_200 * MICROS_PER_SECOND));

        config.start_date = "2024-01-01T10:00".to_string();
        assert_eq!(config.session_start(), Some(1_704_103_200 * MICROS_PER_SECOND));

        config.start_date = "yesterday".to_string();
        assert_eq!(config.session_start(), None);
    }

    #[test]
    fn test_session_config_parses_push_payload() {
        let config: SessionConfig = serde_json::from_str(
            r#"{"start_date": "2024-01-01T10:00+00:00", "tick_length": 120,
                "services": {"notes": ["10.0.0.2:8080"]}}"#,
        )
        .unwrap();
        assert!(config.ticks_enabled());
        assert_eq!(config.services.service_for("10.0.0.2:8080"), Some("notes"));
    }

    #[test]
    fn test_bounds_helpers() {
        let bounds = TimestampBounds::new(100, 200);
        assert_eq!(bounds.span(), 100);
        assert!(!bounds.is_degenerate());
        assert!(bounds.strictly_contains(150));
        assert!(!bounds.strictly_contains(100));
        assert!(!bounds.strictly_contains(200));
        assert!(TimestampBounds::new(5, 5).is_degenerate());
    }

    #[test]
    fn test_flow_detail_keeps_event_sections() {
        let detail: FlowDetail = serde_json::from_str(
            r#"{"flow": {"id": 1}, "http": [{"url": "/"}], "alert": []}"#,
        )
        .unwrap();
        assert_eq!(detail.flow["id"], 1);
        assert!(detail.events.contains_key("http"));
        assert!(detail.events.contains_key("alert"));
    }
}
