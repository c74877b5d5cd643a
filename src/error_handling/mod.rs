//! Error handling.
//!
//! Errors are categorized into:
//! - **Transport failures**: abort a probe and are recorded on the probe result
//! - **Parse failures**: the body claimed JSON but was not
//! - **Publish failures**: the finished message could not be queued
//!
//! Structural problems inside a capability statement are never errors; the
//! validation rules turn them into failed rules.

mod types;

// Re-export public API
pub use types::{FetchError, InitializationError, ParseError, ProbeError, PublishError};
