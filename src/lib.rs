//! Shovel Library
//!
//! Headless front end of the Shovel flow-list controller.

pub mod headless;

// Re-export main entry points
pub use headless::runner::run_headless;
