//! # shovel-core - Core Domain Types
//!
//! Foundation crate for the Shovel flow viewer. Provides flow domain types,
//! the filter URL codec, display formatting, error handling and logging.
//!
//! This crate has **zero internal dependencies** -- it only depends on external
//! crates (serde, chrono, thiserror, regex, url, tracing).
//!
//! ## Public API
//!
//! ### Flow Types (`flow`)
//! - [`FlowSummary`] - One row of the flow list
//! - [`FlowDetail`] - Full flow record, opaque to the controller
//! - [`Tag`], [`ServiceMap`], [`TimestampBounds`], [`SessionConfig`] - Push-channel payloads
//!
//! ### Filter Codec (`filter`)
//! - [`FilterState`] - Every URL-encoded filter, with `parse` / `serialize`
//! - [`selected_flow()`], [`with_selected_flow()`] - The `flow` parameter
//!
//! ### Error Handling (`error`)
//! - [`Error`] - Custom error enum with `fatal` vs `recoverable` classification
//! - [`Result`] - Type alias for `std::result::Result<T, Error>`
//! - [`ResultExt`] - Extension trait for adding error context
//!
//! ## Prelude
//!
//! Import commonly used types with:
//! ```rust
//! use shovel_core::prelude::*;
//! ```

pub mod error;
pub mod filter;
pub mod flow;
pub mod format;
pub mod logging;

/// Prelude for common imports used throughout all Shovel crates
pub mod prelude {
    pub use super::error::{Error, Result, ResultExt};
    pub use tracing::{debug, error, info, trace, warn};
}

// Re-export commonly used types at crate root for convenience
pub use error::{Error, Result, ResultExt};
pub use filter::{param, selected_flow, with_selected_flow, FilterState, UNKNOWN_SERVICES};
pub use flow::{
    format_endpoint, tag_counter_key, FlowDetail, FlowId, FlowPage, FlowSummary, ServiceMap,
    SessionConfig, Tag, Timestamp, TimestampBounds, MICROS_PER_SECOND,
};
pub use format::{format_duration_us, format_flow_time};
