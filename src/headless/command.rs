//! Headless commands - one JSON object per stdin line
//!
//! ```json
//! {"cmd":"toggle_tag","tag":"malware","shift":true}
//! {"cmd":"search","value":"GET /flag"}
//! {"cmd":"key","key":"left"}
//! {"cmd":"view"}
//! ```

use serde::Deserialize;
use shovel_app::{Direction, InputKey, KeyEvent, Message, Modifiers};
use shovel_core::prelude::*;
use shovel_core::FlowId;
use url::Url;

/// A user interaction read from stdin.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum HeadlessCommand {
    // ─────────────────────────────────────────────────────────
    // Navigation
    // ─────────────────────────────────────────────────────────
    Back,
    Forward,
    Navigate {
        url: String,
    },

    // ─────────────────────────────────────────────────────────
    // Filters
    // ─────────────────────────────────────────────────────────
    Service {
        #[serde(default)]
        value: String,
    },
    UntilTick {
        #[serde(default)]
        tick: Option<i64>,
    },
    Protocol {
        #[serde(default)]
        value: String,
    },
    Search {
        #[serde(default)]
        value: String,
    },
    SelectText {
        #[serde(default)]
        text: Option<String>,
    },
    ToggleTag {
        tag: String,
        #[serde(default)]
        shift: bool,
    },
    TimelineClick {
        fraction: f64,
    },
    ApplyFlowTick,

    // ─────────────────────────────────────────────────────────
    // List & Selection
    // ─────────────────────────────────────────────────────────
    ScrollEnd,
    Viewport {
        first: usize,
        last: usize,
    },
    Select {
        id: i64,
    },
    Next,
    Previous,
    ClearSelection,
    Key {
        key: InputKey,
        #[serde(default)]
        modifiers: Modifiers,
        #[serde(default)]
        in_text_input: bool,
    },

    // ─────────────────────────────────────────────────────────
    // Runner
    // ─────────────────────────────────────────────────────────
    /// Print a view snapshot
    View,
    Quit,
}

impl HeadlessCommand {
    /// Parse one input line.
    pub fn parse(line: &str) -> Result<Self> {
        Ok(serde_json::from_str(line)?)
    }

    /// Controller message for this command; `None` for runner commands.
    pub fn into_message(self) -> Result<Option<Message>> {
        let msg = match self {
            Self::Back => Message::HistoryBack,
            Self::Forward => Message::HistoryForward,
            Self::Navigate { url } => Message::Navigate(Url::parse(&url)?),
            Self::Service { value } => Message::SetServiceFilter(value),
            Self::UntilTick { tick } => Message::SetUntilTick(tick),
            Self::Protocol { value } => Message::SetProtocolFilter(value),
            Self::Search { value } => Message::SubmitSearch(value),
            Self::SelectText { text } => Message::SetTextSelection(text),
            Self::ToggleTag { tag, shift } => Message::ToggleTag { tag, shift },
            Self::TimelineClick { fraction } => Message::TimelineClick { fraction },
            Self::ApplyFlowTick => Message::ApplyFlowTick,
            Self::ScrollEnd => Message::ScrollReachedEnd,
            Self::Viewport { first, last } => Message::ViewportChanged { first, last },
            Self::Select { id } => Message::SelectFlow(FlowId(id)),
            Self::Next => Message::SelectAdjacent(Direction::Next),
            Self::Previous => Message::SelectAdjacent(Direction::Previous),
            Self::ClearSelection => Message::ClearSelection,
            Self::Key {
                key,
                modifiers,
                in_text_input,
            } => Message::Key(KeyEvent {
                key,
                modifiers,
                in_text_input,
            }),
            Self::View | Self::Quit => return Ok(None),
        };
        Ok(Some(msg))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_toggle_tag() {
        let cmd = HeadlessCommand::parse(r#"{"cmd":"toggle_tag","tag":"malware","shift":true}"#)
            .unwrap();
        assert_eq!(
            cmd,
            HeadlessCommand::ToggleTag {
                tag: "malware".into(),
                shift: true
            }
        );
    }

    #[test]
    fn test_shift_defaults_to_false() {
        let cmd = HeadlessCommand::parse(r#"{"cmd":"toggle_tag","tag":"x"}"#).unwrap();
        assert!(matches!(
            cmd.into_message().unwrap(),
            Some(Message::ToggleTag { shift: false, .. })
        ));
    }

    #[test]
    fn test_unknown_command_is_error() {
        assert!(HeadlessCommand::parse(r#"{"cmd":"reboot"}"#).is_err());
        assert!(HeadlessCommand::parse("not json").is_err());
    }

    #[test]
    fn test_invalid_navigate_url_is_error() {
        let cmd = HeadlessCommand::Navigate {
            url: "::".into(),
        };
        assert!(cmd.into_message().is_err());
    }
}
