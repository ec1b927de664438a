use flotilla_core::{Event, EventBus, LockMode};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

/// A named resource lock and its current holders.
struct LockState {
    mode: LockMode,
    holders: HashSet<String>,
    /// Set when the holder set empties and the entry is removed from the
    /// table; a racing acquirer that still holds the old `Arc` must retry
    /// against the fresh entry instead of reviving this one.
    retired: bool,
}

/// Counts of active locks and holders, for the presentation layer.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct LockStats {
    pub active_locks: usize,
    pub total_holders: usize,
}

/// Arbitrates contention over named shared resources.
///
/// Locks are created on first acquisition and destroyed when the holder set
/// empties. Each lock entry is guarded independently; acquisition is a single
/// atomic read-modify-write against the targeted entry and either fully
/// applies or leaves no trace.
pub struct ConflictResolver {
    locks: RwLock<HashMap<String, Arc<Mutex<LockState>>>>,
    events: Arc<EventBus>,
}

impl ConflictResolver {
    pub fn new(events: Arc<EventBus>) -> Self {
        Self {
            locks: RwLock::new(HashMap::new()),
            events,
        }
    }

    /// Try to acquire `resource_id` for `agent_id` in the requested mode.
    ///
    /// Returns `false` when the lock is exclusively held, or when exclusive
    /// access is requested while any other agent holds it — no state changes
    /// on rejection, enabling caller-side retry/backoff. A holder re-acquires
    /// in the current mode successfully; a sole holder may also switch the
    /// lock's mode, but a mode change is rejected while other holders remain.
    pub async fn acquire_resource(
        &self,
        agent_id: &str,
        resource_id: &str,
        mode: LockMode,
    ) -> bool {
        loop {
            let entry = {
                let locks = self.locks.read().await;
                locks.get(resource_id).cloned()
            };

            let entry = match entry {
                Some(entry) => entry,
                None => {
                    let mut locks = self.locks.write().await;
                    locks
                        .entry(resource_id.to_string())
                        .or_insert_with(|| {
                            Arc::new(Mutex::new(LockState {
                                mode,
                                holders: HashSet::new(),
                                retired: false,
                            }))
                        })
                        .clone()
                }
            };

            let mut state = entry.lock().await;
            if state.retired {
                // Lost a race with the final release; the table entry is
                // gone, so retry against whatever replaces it.
                continue;
            }

            let granted = if state.holders.contains(agent_id) {
                if state.mode == mode {
                    true
                } else if state.holders.len() == 1 {
                    // A sole holder may upgrade or downgrade its own lock.
                    state.mode = mode;
                    true
                } else {
                    false
                }
            } else if state.holders.is_empty() {
                state.mode = mode;
                state.holders.insert(agent_id.to_string());
                true
            } else if state.mode == LockMode::Shareable && mode == LockMode::Shareable {
                state.holders.insert(agent_id.to_string());
                true
            } else {
                false
            };

            debug!(
                agent = %agent_id,
                resource = %resource_id,
                mode = ?mode,
                granted,
                "Resource acquisition"
            );
            return granted;
        }
    }

    /// Release `resource_id` for `agent_id`. Deletes the lock when the
    /// holder set empties; a no-op for non-holders and unknown resources.
    pub async fn release_resource(&self, agent_id: &str, resource_id: &str) {
        let entry = {
            let locks = self.locks.read().await;
            locks.get(resource_id).cloned()
        };
        let Some(entry) = entry else {
            return;
        };

        let emptied = {
            let mut state = entry.lock().await;
            if !state.holders.remove(agent_id) {
                return;
            }
            if state.holders.is_empty() {
                state.retired = true;
                true
            } else {
                false
            }
        };

        if emptied {
            let mut locks = self.locks.write().await;
            if let Some(current) = locks.get(resource_id) {
                if Arc::ptr_eq(current, &entry) {
                    locks.remove(resource_id);
                }
            }
        }

        debug!(agent = %agent_id, resource = %resource_id, "Resource released");
        self.events.publish(Event::LockReleased {
            resource_id: resource_id.to_string(),
            agent_id: agent_id.to_string(),
        });
    }

    /// Counts of currently active locks and holders.
    pub async fn lock_stats(&self) -> LockStats {
        let entries: Vec<Arc<Mutex<LockState>>> = {
            let locks = self.locks.read().await;
            locks.values().cloned().collect()
        };

        let mut stats = LockStats {
            active_locks: 0,
            total_holders: 0,
        };
        for entry in entries {
            let state = entry.lock().await;
            if !state.retired {
                stats.active_locks += 1;
                stats.total_holders += state.holders.len();
            }
        }
        stats
    }
}
