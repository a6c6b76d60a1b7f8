//! shovel-app - Flow filter and timeline synchronization for Shovel
//!
//! This crate implements the TEA (The Elm Architecture) pattern for the flow
//! list controller: the tri-state tag filter, timeline geometry, the paginated
//! flow list, the push-channel state, the browser history model and the
//! Engine that ties them to the flow API.

pub mod actions;
pub mod config;
pub mod engine;
pub mod engine_event;
pub mod handler;
pub mod input_key;
pub mod live_channel;
pub mod location;
pub mod message;
pub mod pager;
pub mod process;
pub mod state;
pub mod tags;
pub mod timeline;
pub mod view;

// Re-export primary types
pub use config::{load_settings, Settings, CONFIG_FILENAME};
pub use engine::Engine;
pub use engine_event::EngineEvent;
pub use handler::{UpdateAction, UpdateResult};
pub use input_key::{InputKey, KeyEvent, Modifiers};
pub use message::{Message, PageRequest};
pub use pager::Direction;
pub use state::AppState;
pub use view::ControllerView;
