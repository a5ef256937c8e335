//! Utility functions and helpers
//!
//! ## Modules
//!
//! - [`retry`] - Retry logic for resilient storage operations
//! - [`util`] - Stage timing and path helpers

pub mod retry;
pub mod util;
