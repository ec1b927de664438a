//! Core types and error definitions for the Flotilla coordination framework.
//!
//! This crate provides the foundation shared across all Flotilla crates:
//! the unified error enum, the server/lock data model, and the broadcast
//! event bus used for failure and completion signaling.
//!
//! # Main types
//!
//! - [`FlotillaError`] — Unified error enum for all Flotilla subsystems.
//! - [`FlotillaResult`] — Convenience alias for `Result<T, FlotillaError>`.
//! - [`Server`] — A capability-tagged backend endpoint with load and health.
//! - [`LockMode`] — Shareable vs exclusive resource lock semantics.
//! - [`EventBus`] — Subscription interface for named coordination events.

/// Broadcast event bus for coordination signaling.
pub mod events;
/// Shared data model: servers, lock modes, criticality.
pub mod types;

pub use events::{Event, EventBus};
pub use types::{Criticality, LockMode, Server, ServerStatus};

/// Top-level error type for the Flotilla framework.
///
/// Routine absences (no eligible server, lock currently held) are signaled
/// through `Option`/`bool` return values, not through this enum; only caller
/// defects and genuinely exceptional conditions surface here.
#[derive(Debug, thiserror::Error)]
pub enum FlotillaError {
    /// An operation referenced a server or resource that does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A resource arbitration conflict that cannot be expressed as a
    /// boolean rejection (e.g. inconsistent lock table state).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Structurally malformed workflow or project input — a caller defect,
    /// not a transient condition.
    #[error("Validation error: {0}")]
    Validation(String),

    /// An error in configuration parsing or defaults.
    #[error("Config error: {0}")]
    Config(String),

    /// A JSON serialization or deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A convenience `Result` alias using [`FlotillaError`].
pub type FlotillaResult<T> = Result<T, FlotillaError>;
