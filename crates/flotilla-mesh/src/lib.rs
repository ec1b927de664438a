//! Server mesh management: registry, load-biased routing, and resource
//! arbitration for capability-tagged backend servers.
//!
//! Callers register servers and submit assignment/lock requests directly to
//! this crate; the planner crate consumes it for agent-to-server pairing.
//! Absence of an eligible server and lock contention are routine outcomes
//! signaled through `Option`/`bool`, never errors.
//!
//! # Main types
//!
//! - [`ServerRegistry`] — Known servers, their capabilities, load, and health.
//! - [`LoadBalancer`] — Capability-filtered, load-biased selection with failover.
//! - [`ConflictResolver`] — Shareable/exclusive locks over named resources.
//! - [`AssignmentScorer`] — Capability/performance scoring for agent↔server pairing.

/// Load-biased server selection.
pub mod balancer;
/// Named resource locks with shareable/exclusive semantics.
pub mod locks;
/// Server registration, health, and capability listings.
pub mod registry;
/// Capability/performance match scoring.
pub mod scorer;

pub use balancer::LoadBalancer;
pub use locks::{ConflictResolver, LockStats};
pub use registry::ServerRegistry;
pub use scorer::{Assignment, AssignmentScorer, ServerCandidate};
