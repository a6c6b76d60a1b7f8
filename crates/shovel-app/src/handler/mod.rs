//! Handler module - TEA update function and event handlers
//!
//! Organized into submodules:
//! - `update`: Main update() function and message dispatch
//! - `filter`: Filter interactions and history navigation
//! - `list`: Fresh loads, infinite scroll and page responses
//! - `selection`: Selected flow and its detail
//! - `live`: Push channel events
//! - `keys`: Keyboard rules

pub(crate) mod filter;
pub(crate) mod keys;
pub(crate) mod list;
pub(crate) mod live;
pub(crate) mod selection;
pub(crate) mod update;


use shovel_core::FlowId;

use crate::message::{Message, PageRequest};

// Re-export main entry point
pub use update::update;

/// Actions that the event loop should perform after update
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateAction {
    /// Fetch one page of flows
    FetchPage(PageRequest),

    /// Fetch the full record of a flow
    FetchFlowDetail { id: FlowId },
}

/// Result of processing a message
#[derive(Debug, Default)]
pub struct UpdateResult {
    /// Optional follow-up message to process
    pub message: Option<Message>,
    /// Optional action for the event loop to perform
    pub action: Option<UpdateAction>,
}

impl UpdateResult {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn message(msg: Message) -> Self {
        Self {
            message: Some(msg),
            action: None,
        }
    }

    pub fn action(action: UpdateAction) -> Self {
        Self {
            message: None,
            action: Some(action),
        }
    }

    /// Attach a follow-up message.
    pub fn then(mut self, msg: Option<Message>) -> Self {
        self.message = msg;
        self
    }
}
