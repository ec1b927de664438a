use flotilla_core::{Event, EventBus, FlotillaError, FlotillaResult, Server, ServerStatus};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

/// Registry of known backend servers, their capabilities, load, and health.
///
/// Each server is guarded by its own lock so that unrelated servers never
/// contend with each other; the outer map lock is held only long enough to
/// look up or insert an entry. Status transitions are immediately visible to
/// all concurrent callers.
pub struct ServerRegistry {
    servers: RwLock<HashMap<String, Arc<RwLock<Server>>>>,
    events: Arc<EventBus>,
}

impl ServerRegistry {
    pub fn new(events: Arc<EventBus>) -> Self {
        Self {
            servers: RwLock::new(HashMap::new()),
            events,
        }
    }

    /// Register a server, replacing any previous entry with the same id.
    ///
    /// Re-registering a failed server is the explicit recovery path: the new
    /// entry is healthy regardless of the prior status.
    pub async fn register(&self, mut server: Server) {
        server.status = ServerStatus::Healthy;
        server.load = server.load.clamp(0.0, 1.0);

        info!(
            server = %server.id,
            capabilities = ?server.capabilities,
            load = server.load,
            "Server registered"
        );

        let mut servers = self.servers.write().await;
        servers.insert(server.id.clone(), Arc::new(RwLock::new(server)));
    }

    /// Mark a server as failed. Terminal until a future [`register`](Self::register)
    /// re-adds it; the server never appears in subsequent listings.
    pub async fn mark_failed(&self, id: &str) -> FlotillaResult<()> {
        let entry = {
            let servers = self.servers.read().await;
            servers
                .get(id)
                .cloned()
                .ok_or_else(|| FlotillaError::NotFound(format!("server '{id}'")))?
        };

        {
            let mut server = entry.write().await;
            server.status = ServerStatus::Failed;
        }

        warn!(server = %id, "Server marked failed");
        self.events.publish(Event::ServerFailed {
            server_id: id.to_string(),
        });
        Ok(())
    }

    /// Get a snapshot of a server by id.
    pub async fn get(&self, id: &str) -> Option<Server> {
        let entry = {
            let servers = self.servers.read().await;
            servers.get(id).cloned()
        }?;
        let server = entry.read().await;
        Some(server.clone())
    }

    /// List snapshots of all healthy servers advertising the given capability.
    pub async fn list_healthy_with_capability(&self, capability: &str) -> Vec<Server> {
        let entries: Vec<Arc<RwLock<Server>>> = {
            let servers = self.servers.read().await;
            servers.values().cloned().collect()
        };

        let mut matching = Vec::new();
        for entry in entries {
            let server = entry.read().await;
            if server.serves(capability) {
                matching.push(server.clone());
            }
        }
        matching
    }

    /// Adjust a server's load by `delta`, clamped to `[0, 1]`.
    pub async fn adjust_load(&self, id: &str, delta: f64) -> FlotillaResult<()> {
        let entry = {
            let servers = self.servers.read().await;
            servers
                .get(id)
                .cloned()
                .ok_or_else(|| FlotillaError::NotFound(format!("server '{id}'")))?
        };
        let mut server = entry.write().await;
        server.load = (server.load + delta).clamp(0.0, 1.0);
        Ok(())
    }

    /// Set a server's load factor, clamped to `[0, 1]`.
    pub async fn set_load(&self, id: &str, load: f64) -> FlotillaResult<()> {
        let entry = {
            let servers = self.servers.read().await;
            servers
                .get(id)
                .cloned()
                .ok_or_else(|| FlotillaError::NotFound(format!("server '{id}'")))?
        };
        let mut server = entry.write().await;
        server.load = load.clamp(0.0, 1.0);
        Ok(())
    }

    /// Read-only snapshot of every registered server, for the presentation layer.
    pub async fn snapshot(&self) -> Vec<Server> {
        let entries: Vec<Arc<RwLock<Server>>> = {
            let servers = self.servers.read().await;
            servers.values().cloned().collect()
        };

        let mut all = Vec::with_capacity(entries.len());
        for entry in entries {
            all.push(entry.read().await.clone());
        }
        all.sort_by(|a, b| a.id.cmp(&b.id));
        all
    }

    /// Number of registered servers, failed ones included.
    pub async fn len(&self) -> usize {
        self.servers.read().await.len()
    }

    /// Whether the registry holds no servers.
    pub async fn is_empty(&self) -> bool {
        self.servers.read().await.is_empty()
    }
}
