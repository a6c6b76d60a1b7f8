//! Last-applied push-channel values
//!
//! [`LiveConfigChannel::apply`] folds a [`LiveEvent`] into the channel and
//! reports whether anything changed. Payloads structurally equal to the last
//! applied value are no-ops, so reconnections replaying the same config do
//! not trigger recomputation.

use serde::Serialize;
use shovel_client::LiveEvent;
use shovel_core::{SessionConfig, Tag, TimestampBounds};

/// Connection state of the push channel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

/// What an applied event changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiveChange {
    /// Connectivity changed; carries the new offline flag.
    Offline(bool),
    Config,
    TimestampBounds,
    AppProtoList,
    TagList,
}

#[derive(Debug, Clone, Default)]
pub struct LiveConfigChannel {
    state: ConnectionState,
    offline: Option<bool>,
    config: Option<SessionConfig>,
    bounds: Option<TimestampBounds>,
    app_protos: Option<Vec<String>>,
    tags: Option<Vec<Tag>>,
}

impl LiveConfigChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// The subscription was (re)started.
    pub fn connecting(&mut self) {
        if self.state == ConnectionState::Disconnected {
            self.state = ConnectionState::Connecting;
        }
    }

    /// Last connectivity reported by the channel, `None` before any.
    pub fn offline(&self) -> Option<bool> {
        self.offline
    }

    pub fn config(&self) -> Option<&SessionConfig> {
        self.config.as_ref()
    }

    pub fn bounds(&self) -> Option<TimestampBounds> {
        self.bounds
    }

    pub fn app_protos(&self) -> &[String] {
        self.app_protos.as_deref().unwrap_or_default()
    }

    pub fn tags(&self) -> &[Tag] {
        self.tags.as_deref().unwrap_or_default()
    }

    /// Fold `event` in; `None` when it changed nothing.
    pub fn apply(&mut self, event: LiveEvent) -> Option<LiveChange> {
        match event {
            LiveEvent::Offline(offline) => {
                self.state = if offline {
                    ConnectionState::Disconnected
                } else {
                    ConnectionState::Connected
                };
                replace_if_changed(&mut self.offline, offline)
                    .then_some(LiveChange::Offline(offline))
            }
            LiveEvent::Config(config) => {
                self.state = ConnectionState::Connected;
                replace_if_changed(&mut self.config, config).then_some(LiveChange::Config)
            }
            LiveEvent::TimestampBounds(bounds) => {
                replace_if_changed(&mut self.bounds, bounds).then_some(LiveChange::TimestampBounds)
            }
            LiveEvent::AppProtoList(protos) => {
                replace_if_changed(&mut self.app_protos, protos).then_some(LiveChange::AppProtoList)
            }
            LiveEvent::TagList(tags) => {
                replace_if_changed(&mut self.tags, tags).then_some(LiveChange::TagList)
            }
        }
    }
}

fn replace_if_changed<T: PartialEq>(slot: &mut Option<T>, value: T) -> bool {
    if slot.as_ref() == Some(&value) {
        return false;
    }
    *slot = Some(value);
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_state_machine() {
        let mut channel = LiveConfigChannel::new();
        assert_eq!(channel.state(), ConnectionState::Disconnected);

        channel.connecting();
        assert_eq!(channel.state(), ConnectionState::Connecting);

        assert_eq!(
            channel.apply(LiveEvent::Offline(false)),
            Some(LiveChange::Offline(false))
        );
        assert_eq!(channel.state(), ConnectionState::Connected);

        assert_eq!(
            channel.apply(LiveEvent::Offline(true)),
            Some(LiveChange::Offline(true))
        );
        assert_eq!(channel.state(), ConnectionState::Disconnected);
    }

    #[test]
    fn test_repeated_offline_is_noop() {
        let mut channel = LiveConfigChannel::new();
        channel.connecting();
        assert!(channel.apply(LiveEvent::Offline(true)).is_some());
        assert_eq!(channel.apply(LiveEvent::Offline(true)), None);
        assert_eq!(channel.offline(), Some(true));
    }

    #[test]
    fn test_config_implies_connected() {
        let mut channel = LiveConfigChannel::new();
        channel.connecting();
        assert_eq!(
            channel.apply(LiveEvent::Config(SessionConfig::default())),
            Some(LiveChange::Config)
        );
        assert_eq!(channel.state(), ConnectionState::Connected);
    }

    #[test]
    fn test_identical_payloads_are_noops() {
        let mut channel = LiveConfigChannel::new();
        let bounds = TimestampBounds::new(1, 2);
        assert_eq!(
            channel.apply(LiveEvent::TimestampBounds(bounds)),
            Some(LiveChange::TimestampBounds)
        );
        assert_eq!(channel.apply(LiveEvent::TimestampBounds(bounds)), None);

        let config = SessionConfig::default();
        assert!(channel.apply(LiveEvent::Config(config.clone())).is_some());
        assert_eq!(channel.apply(LiveEvent::Config(config)), None);

        let tags = vec![Tag::new("a", "red")];
        assert!(channel.apply(LiveEvent::TagList(tags.clone())).is_some());
        assert_eq!(channel.apply(LiveEvent::TagList(tags)), None);
        assert_eq!(channel.tags().len(), 1);
    }

    #[test]
    fn test_empty_list_first_time_is_a_change() {
        let mut channel = LiveConfigChannel::new();
        assert_eq!(
            channel.apply(LiveEvent::AppProtoList(vec![])),
            Some(LiveChange::AppProtoList)
        );
        assert_eq!(channel.apply(LiveEvent::AppProtoList(vec![])), None);
        assert!(channel.app_protos().is_empty());
    }

    #[test]
    fn test_changed_payload_replaces_value() {
        let mut channel = LiveConfigChannel::new();
        channel.apply(LiveEvent::AppProtoList(vec!["http".into()]));
        assert_eq!(
            channel.apply(LiveEvent::AppProtoList(vec!["http".into(), "tls".into()])),
            Some(LiveChange::AppProtoList)
        );
        assert_eq!(channel.app_protos(), ["http", "tls"]);
    }
}
