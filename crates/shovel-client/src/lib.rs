//! # shovel-client - Flow API and Push Transport
//!
//! The backend collaborators of the Shovel controller: the paginated flow
//! API and the server-sent-event push channel.
//!
//! Depends on [`shovel_core`] for domain types and error handling.
//!
//! ## Public API
//!
//! ### Flow API
//! - [`FlowApi`] - `list_flows` / `get_flow` contract (`LocalFlowApi` for `!Send` futures)
//! - [`ListFlowsQuery`] - Filter plus pagination cursor
//! - [`HttpFlowApi`] - Implementation over HTTP
//!
//! ### Push Channel
//! - [`EventStreamDecoder`] - Incremental `text/event-stream` parser
//! - [`LiveEvent`] - Typed push event
//! - [`subscribe_events()`] - Reconnecting subscription task

pub mod api;
pub mod events;
pub mod http;
pub mod subscription;
#[cfg(any(test, feature = "test-helpers"))]
pub mod test_utils;

pub use api::{is_terminal_page, FlowApi, ListFlowsQuery, LocalFlowApi, PAGE_SIZE};
pub use events::{arrange_batch, EventStreamDecoder, LiveEvent, SseFrame};
pub use http::HttpFlowApi;
pub use subscription::{decode_chunk, subscribe_events, ReconnectPolicy, EVENT_CHANNEL_CAPACITY};
