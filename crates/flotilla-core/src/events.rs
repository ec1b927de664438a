use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// A named coordination event published by the mesh and planner components.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Event {
    /// A server transitioned to failed status.
    ServerFailed { server_id: String },
    /// An agent released a resource lock (the lock itself may still be held
    /// by other shareable holders).
    LockReleased { resource_id: String, agent_id: String },
    /// An orchestration plan was produced.
    PlanCompleted { plan_id: Uuid },
}

impl Event {
    /// The event kind name, matching the serialized `kind` tag.
    pub fn kind(&self) -> &'static str {
        match self {
            Event::ServerFailed { .. } => "server_failed",
            Event::LockReleased { .. } => "lock_released",
            Event::PlanCompleted { .. } => "plan_completed",
        }
    }
}

/// Broadcast-based subscription interface for [`Event`]s.
///
/// Callers subscribe explicitly and receive every event published after the
/// subscription; publishing never blocks and succeeds regardless of whether
/// any subscriber is listening.
#[derive(Debug)]
pub struct EventBus {
    tx: broadcast::Sender<Event>,
}

impl EventBus {
    /// Create a bus retaining up to `capacity` in-flight events per subscriber.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Subscribe to all subsequently published events.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }

    /// Publish an event to all current subscribers.
    pub fn publish(&self, event: Event) {
        // A send error only means there are no subscribers right now.
        let _ = self.tx.send(event);
    }

    /// Number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
