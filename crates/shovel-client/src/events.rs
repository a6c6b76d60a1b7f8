//! Server-sent event decoding for the push channel
//!
//! [`EventStreamDecoder`] turns raw `text/event-stream` chunks into
//! [`SseFrame`]s; [`LiveEvent::from_frame`] turns frames into typed events.

use serde::Deserialize;
use shovel_core::prelude::*;
use shovel_core::{SessionConfig, Tag, Timestamp, TimestampBounds};

/// Event names published on `api/events`.
pub mod event_name {
    pub const CONFIG: &str = "config";
    pub const TIMESTAMP_MIN_MAX: &str = "timestampMinMax";
    pub const APP_PROTO: &str = "appProto";
    pub const TAGS: &str = "tags";
}

/// One dispatched server-sent event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseFrame {
    /// Event name, `"message"` when the stream did not set one.
    pub event: String,
    /// Data lines joined with `\n`.
    pub data: String,
}

/// Incremental `text/event-stream` parser.
///
/// Chunks may split lines and events anywhere; incomplete input stays
/// buffered until the next [`feed`](Self::feed).
#[derive(Debug, Default)]
pub struct EventStreamDecoder {
    buffer: String,
    event: Option<String>,
    data: Vec<String>,
}

impl EventStreamDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume a chunk and return every event it completed, in order.
    pub fn feed(&mut self, chunk: &str) -> Vec<SseFrame> {
        self.buffer.push_str(chunk);
        let mut frames = Vec::new();

        while let Some(pos) = self.buffer.find('\n') {
            let mut line: String = self.buffer.drain(..=pos).collect();
            line.pop();
            if line.ends_with('\r') {
                line.pop();
            }
            if let Some(frame) = self.process_line(&line) {
                frames.push(frame);
            }
        }
        frames
    }

    fn process_line(&mut self, line: &str) -> Option<SseFrame> {
        if line.is_empty() {
            return self.dispatch();
        }
        if line.starts_with(':') {
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };
        match field {
            "event" => self.event = Some(value.to_string()),
            "data" => self.data.push(value.to_string()),
            // id and retry only matter to browser reconnection
            _ => {}
        }
        None
    }

    fn dispatch(&mut self) -> Option<SseFrame> {
        let event = self.event.take();
        if self.data.is_empty() {
            return None;
        }
        let data = std::mem::take(&mut self.data).join("\n");
        Some(SseFrame {
            event: event
                .filter(|e| !e.is_empty())
                .unwrap_or_else(|| "message".to_string()),
            data,
        })
    }
}

/// Typed push-channel event.
#[derive(Debug, Clone, PartialEq)]
pub enum LiveEvent {
    /// Connectivity of the push channel changed.
    Offline(bool),
    Config(SessionConfig),
    TimestampBounds(TimestampBounds),
    AppProtoList(Vec<String>),
    TagList(Vec<Tag>),
}

impl LiveEvent {
    /// Short label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            LiveEvent::Offline(_) => "offline",
            LiveEvent::Config(_) => "config",
            LiveEvent::TimestampBounds(_) => "timestamp_bounds",
            LiveEvent::AppProtoList(_) => "app_proto_list",
            LiveEvent::TagList(_) => "tag_list",
        }
    }

    /// Decode a frame.
    ///
    /// Returns `Ok(None)` for events this client does not consume and for
    /// null timestamp bounds (empty capture).
    pub fn from_frame(frame: &SseFrame) -> Result<Option<Self>> {
        let event = match frame.event.as_str() {
            event_name::CONFIG => Some(LiveEvent::Config(decode(frame)?)),
            event_name::TIMESTAMP_MIN_MAX => decode::<Option<RawBounds>>(frame)?
                .and_then(RawBounds::into_bounds)
                .map(LiveEvent::TimestampBounds),
            event_name::APP_PROTO => Some(LiveEvent::AppProtoList(decode(frame)?)),
            event_name::TAGS => Some(LiveEvent::TagList(decode(frame)?)),
            other => {
                trace!("Ignoring push event '{}'", other);
                None
            }
        };
        Ok(event)
    }
}

fn decode<T: for<'de> Deserialize<'de>>(frame: &SseFrame) -> Result<T> {
    serde_json::from_str(&frame.data)
        .map_err(|e| Error::protocol(format!("Malformed '{}' event: {e}", frame.event)))
}

/// Accepted encodings of the `timestampMinMax` payload.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawBounds {
    Pair(Option<Timestamp>, Option<Timestamp>),
    Object {
        min: Option<Timestamp>,
        max: Option<Timestamp>,
    },
}

impl RawBounds {
    fn into_bounds(self) -> Option<TimestampBounds> {
        let (min, max) = match self {
            RawBounds::Pair(min, max) => (min, max),
            RawBounds::Object { min, max } => (min, max),
        };
        Some(TimestampBounds::new(min?, max?))
    }
}

/// Order the events decoded from one received chunk.
///
/// Configuration events go last so subscribers see bounds, protocols and
/// tags of the same batch first, and each one is preceded by
/// `Offline(false)`.
pub fn arrange_batch(events: Vec<LiveEvent>) -> Vec<LiveEvent> {
    let (configs, mut ordered): (Vec<_>, Vec<_>) = events
        .into_iter()
        .partition(|e| matches!(e, LiveEvent::Config(_)));
    for config in configs {
        ordered.push(LiveEvent::Offline(false));
        ordered.push(config);
    }
    ordered
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(event: &str, data: &str) -> SseFrame {
        SseFrame {
            event: event.to_string(),
            data: data.to_string(),
        }
    }

    #[test]
    fn test_decoder_single_event() {
        let mut decoder = EventStreamDecoder::new();
        let frames = decoder.feed("event: appProto\ndata: [\"http\"]\n\n");
        assert_eq!(frames, vec![frame("appProto", "[\"http\"]")]);
    }

    #[test]
    fn test_decoder_split_across_chunks() {
        let mut decoder = EventStreamDecoder::new();
        assert!(decoder.feed("event: ta").is_empty());
        assert!(decoder.feed("gs\r\ndata: []").is_empty());
        assert!(decoder.feed("\r\n").is_empty());
        assert_eq!(decoder.feed("\r\n"), vec![frame("tags", "[]")]);
    }

    #[test]
    fn test_decoder_multiline_data_and_comments() {
        let mut decoder = EventStreamDecoder::new();
        let frames = decoder.feed(": keep-alive\n\ndata:a\ndata: b\nid: 4\n\n");
        assert_eq!(frames, vec![frame("message", "a\nb")]);
    }

    #[test]
    fn test_decoder_event_without_data_is_dropped() {
        let mut decoder = EventStreamDecoder::new();
        assert!(decoder.feed("event: config\n\n").is_empty());
        // The name does not leak into the next event
        assert_eq!(decoder.feed("data: 1\n\n"), vec![frame("message", "1")]);
    }

    #[test]
    fn test_from_frame_config() {
        let event = LiveEvent::from_frame(&frame(
            "config",
            r#"{"start_date":"2024-05-01T10:00+02:00","tick_length":60,"services":{"web":["10.0.0.1:80"]}}"#,
        ))
        .unwrap()
        .unwrap();
        match event {
            LiveEvent::Config(config) => {
                assert_eq!(config.tick_length, 60);
                assert_eq!(config.services.service_for("10.0.0.1:80"), Some("web"));
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn test_from_frame_bounds_encodings() {
        let expected = Some(LiveEvent::TimestampBounds(TimestampBounds::new(100, 200)));
        assert_eq!(
            LiveEvent::from_frame(&frame("timestampMinMax", "[100,200]")).unwrap(),
            expected
        );
        assert_eq!(
            LiveEvent::from_frame(&frame("timestampMinMax", r#"{"min":100,"max":200}"#)).unwrap(),
            expected
        );
    }

    #[test]
    fn test_from_frame_null_bounds_ignored() {
        assert_eq!(
            LiveEvent::from_frame(&frame("timestampMinMax", "null")).unwrap(),
            None
        );
        assert_eq!(
            LiveEvent::from_frame(&frame("timestampMinMax", "[null,null]")).unwrap(),
            None
        );
    }

    #[test]
    fn test_from_frame_tags_and_protocols() {
        let tags = LiveEvent::from_frame(&frame(
            "tags",
            r##"[{"tag":"malware","color":"#f00"},{"tag":"flag-out"}]"##,
        ))
        .unwrap();
        assert_eq!(
            tags,
            Some(LiveEvent::TagList(vec![
                Tag::new("malware", "#f00"),
                Tag {
                    name: "flag-out".to_string(),
                    color: None
                },
            ]))
        );

        let protos = LiveEvent::from_frame(&frame("appProto", r#"["http","tls"]"#)).unwrap();
        assert_eq!(
            protos,
            Some(LiveEvent::AppProtoList(vec![
                "http".to_string(),
                "tls".to_string()
            ]))
        );
    }

    #[test]
    fn test_from_frame_unknown_event_ignored() {
        assert_eq!(
            LiveEvent::from_frame(&frame("message", "{}")).unwrap(),
            None
        );
    }

    #[test]
    fn test_from_frame_malformed_payload() {
        let err = LiveEvent::from_frame(&frame("appProto", "{not json")).unwrap_err();
        assert!(matches!(err, Error::Protocol { .. }));
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_arrange_batch_puts_config_last() {
        let config = LiveEvent::Config(SessionConfig::default());
        let bounds = LiveEvent::TimestampBounds(TimestampBounds::new(1, 2));
        let tags = LiveEvent::TagList(vec![]);

        let arranged = arrange_batch(vec![config.clone(), bounds.clone(), tags.clone()]);
        assert_eq!(
            arranged,
            vec![bounds, tags, LiveEvent::Offline(false), config]
        );
    }
}
