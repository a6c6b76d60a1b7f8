//! Tri-state tag filter and tag badges
//!
//! Every tag is in exactly one of three states relative to the filter:
//! available (unconstrained), required (`tag_require`) or denied
//! (`tag_deny`). [`toggle_tag`] moves a tag between states and keeps the two
//! lists disjoint.

use serde::Serialize;
use shovel_core::{FilterState, FlowSummary, Tag};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TagState {
    Available,
    Required,
    Denied,
}

/// State of `tag` in `filter`.
pub fn tag_state(filter: &FilterState, tag: &str) -> TagState {
    if filter.tags_require.iter().any(|t| t == tag) {
        TagState::Required
    } else if filter.tags_deny.iter().any(|t| t == tag) {
        TagState::Denied
    } else {
        TagState::Available
    }
}

/// Toggle `tag` and return its new state.
///
/// | from      | no shift  | shift    |
/// |-----------|-----------|----------|
/// | available | required  | denied   |
/// | required  | available | denied   |
/// | denied    | available | required |
///
/// Tags entering a list are appended at its end.
pub fn toggle_tag(filter: &mut FilterState, tag: &str, shift: bool) -> TagState {
    let next = match (tag_state(filter, tag), shift) {
        (TagState::Available, false) => TagState::Required,
        (TagState::Available, true) => TagState::Denied,
        (TagState::Required, false) | (TagState::Denied, false) => TagState::Available,
        (TagState::Required, true) => TagState::Denied,
        (TagState::Denied, true) => TagState::Required,
    };

    filter.tags_require.retain(|t| t != tag);
    filter.tags_deny.retain(|t| t != tag);
    match next {
        TagState::Required => filter.tags_require.push(tag.to_string()),
        TagState::Denied => filter.tags_deny.push(tag.to_string()),
        TagState::Available => {}
    }
    next
}

/// Whether `tag` may be toggled: known to the server or already filtered on.
pub fn is_known_tag(tags: &[Tag], filter: &FilterState, tag: &str) -> bool {
    tags.iter().any(|t| t.name == tag) || tag_state(filter, tag) != TagState::Available
}

/// Server tags grouped by filter state, each in server order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TagSections {
    pub available: Vec<Tag>,
    pub required: Vec<Tag>,
    pub denied: Vec<Tag>,
}

impl TagSections {
    pub fn new(tags: &[Tag], filter: &FilterState) -> Self {
        let mut sections = Self::default();
        for tag in tags {
            let section = match tag_state(filter, &tag.name) {
                TagState::Available => &mut sections.available,
                TagState::Required => &mut sections.required,
                TagState::Denied => &mut sections.denied,
            };
            section.push(tag.clone());
        }
        sections
    }
}

/// One badge on a flow row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Badge {
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<i64>,
}

/// Badges of `flow`: the application protocol, then each server tag the flow
/// carries, in server tag order, with its counter.
pub fn flow_badges(flow: &FlowSummary, tags: &[Tag]) -> Vec<Badge> {
    let mut badges = vec![Badge {
        label: flow.app_proto_label(),
        color: None,
        count: None,
    }];
    badges.extend(tags.iter().filter(|t| flow.has_tag(&t.name)).map(|t| Badge {
        label: t.name.clone(),
        color: t.color.clone(),
        count: flow.tag_count(&t.name),
    }));
    badges
}

#[cfg(test)]
mod tests {
    use super::*;
    use shovel_client::test_utils::{test_flow, test_tag};

    fn lists(filter: &FilterState) -> (Vec<&str>, Vec<&str>) {
        (
            filter.tags_require.iter().map(String::as_str).collect(),
            filter.tags_deny.iter().map(String::as_str).collect(),
        )
    }

    #[test]
    fn test_malware_scenario() {
        let mut filter = FilterState::default();
        assert_eq!(tag_state(&filter, "malware"), TagState::Available);

        assert_eq!(toggle_tag(&mut filter, "malware", false), TagState::Required);
        assert_eq!(lists(&filter), (vec!["malware"], vec![]));

        assert_eq!(toggle_tag(&mut filter, "malware", true), TagState::Denied);
        assert_eq!(lists(&filter), (vec![], vec!["malware"]));
    }

    #[test]
    fn test_transition_table() {
        let cases = [
            (TagState::Available, false, TagState::Required),
            (TagState::Available, true, TagState::Denied),
            (TagState::Required, false, TagState::Available),
            (TagState::Required, true, TagState::Denied),
            (TagState::Denied, false, TagState::Available),
            (TagState::Denied, true, TagState::Required),
        ];
        for (from, shift, to) in cases {
            let mut filter = FilterState::default();
            match from {
                TagState::Required => filter.tags_require.push("t".to_string()),
                TagState::Denied => filter.tags_deny.push("t".to_string()),
                TagState::Available => {}
            }
            assert_eq!(toggle_tag(&mut filter, "t", shift), to, "{from:?} shift={shift}");
            assert_eq!(tag_state(&filter, "t"), to);
        }
    }

    #[test]
    fn test_toggle_keeps_other_tags_in_order() {
        let mut filter = FilterState {
            tags_require: vec!["a".into(), "b".into(), "c".into()],
            tags_deny: vec!["x".into()],
            ..Default::default()
        };
        toggle_tag(&mut filter, "b", true);
        assert_eq!(lists(&filter), (vec!["a", "c"], vec!["x", "b"]));
    }

    #[test]
    fn test_tri_state_totality_over_sequences() {
        // Walk every sequence of 6 toggles over two tags.
        let tags = ["p", "q"];
        for seq in 0u32..(1 << 12) {
            let mut filter = FilterState::default();
            for step in 0..6 {
                let bits = (seq >> (step * 2)) & 0b11;
                let tag = tags[(bits & 1) as usize];
                toggle_tag(&mut filter, tag, bits & 2 != 0);
                for t in tags {
                    let required = filter.tags_require.iter().filter(|x| *x == t).count();
                    let denied = filter.tags_deny.iter().filter(|x| *x == t).count();
                    assert!(required + denied <= 1, "seq {seq:#x} tag {t}");
                }
            }
        }
    }

    #[test]
    fn test_known_tags() {
        let tags = vec![test_tag("malware")];
        let filter = FilterState {
            tags_deny: vec!["legacy".into()],
            ..Default::default()
        };
        assert!(is_known_tag(&tags, &filter, "malware"));
        assert!(is_known_tag(&tags, &filter, "legacy"));
        assert!(!is_known_tag(&tags, &filter, "nope"));
    }

    #[test]
    fn test_sections_follow_server_order() {
        let tags = vec![test_tag("a"), test_tag("b"), test_tag("c"), test_tag("d")];
        let filter = FilterState {
            tags_require: vec!["c".into(), "a".into()],
            tags_deny: vec!["d".into()],
            ..Default::default()
        };
        let sections = TagSections::new(&tags, &filter);
        let names = |v: &[Tag]| v.iter().map(|t| t.name.clone()).collect::<Vec<_>>();
        assert_eq!(names(&sections.available), ["b"]);
        assert_eq!(names(&sections.required), ["a", "c"]);
        assert_eq!(names(&sections.denied), ["d"]);
    }

    #[test]
    fn test_flow_badges() {
        let mut flow = test_flow(1, 0);
        flow.app_proto = Some("failed".to_string());
        flow.tags = Some("flag-out,malware".to_string());
        flow.flowints.insert("tag_flag_out".to_string(), 4);

        let tags = vec![test_tag("malware"), test_tag("flag-out"), test_tag("unused")];
        let badges = flow_badges(&flow, &tags);
        let labels: Vec<&str> = badges.iter().map(|b| b.label.as_str()).collect();
        assert_eq!(labels, ["RAW", "malware", "flag-out"]);
        assert_eq!(badges[1].count, None);
        assert_eq!(badges[2].count, Some(4));
        assert_eq!(badges[2].color.as_deref(), Some("#dc3545"));
    }
}
