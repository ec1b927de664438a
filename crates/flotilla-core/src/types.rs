use serde::{Deserialize, Serialize};

/// Health status of a backend server.
///
/// A failed server is terminal until it is explicitly re-registered; it must
/// never appear in capability listings or receive assignments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServerStatus {
    Healthy,
    Failed,
}

impl std::fmt::Display for ServerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServerStatus::Healthy => write!(f, "healthy"),
            ServerStatus::Failed => write!(f, "failed"),
        }
    }
}

/// A backend endpoint advertising named capabilities, a load factor in
/// `[0, 1]`, and health status. Owned exclusively by the server registry;
/// callers only ever see cloned snapshots.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Server {
    pub id: String,
    pub name: String,
    pub capabilities: Vec<String>,
    /// Current load factor, `0.0` idle .. `1.0` saturated.
    pub load: f64,
    pub status: ServerStatus,
    /// Optional observed performance score in `[0, 1]`.
    #[serde(default)]
    pub performance: Option<f64>,
}

impl Server {
    /// Create a healthy server with the given id, name, capabilities, and load.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        capabilities: Vec<String>,
        load: f64,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            capabilities,
            load: load.clamp(0.0, 1.0),
            status: ServerStatus::Healthy,
            performance: None,
        }
    }

    /// Attach an observed performance score.
    pub fn with_performance(mut self, performance: f64) -> Self {
        self.performance = Some(performance.clamp(0.0, 1.0));
        self
    }

    /// Whether this server is healthy and advertises the given capability.
    pub fn serves(&self, capability: &str) -> bool {
        self.status == ServerStatus::Healthy
            && self.capabilities.iter().any(|c| c == capability)
    }
}

/// Sharing semantics of a named resource lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LockMode {
    /// Multiple agents may hold the lock simultaneously.
    Shareable,
    /// At most one agent may hold the lock.
    Exclusive,
}

/// Criticality of an agent within a plan, used for risk weighting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Criticality {
    Low,
    Medium,
    High,
    Critical,
}

impl Criticality {
    /// Relative weight applied to an agent's failure probability.
    pub fn weight(self) -> f64 {
        match self {
            Criticality::Low => 0.25,
            Criticality::Medium => 0.5,
            Criticality::High => 0.75,
            Criticality::Critical => 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_serves_capability() {
        let server = Server::new("s1", "filesystem", vec!["Read".into(), "Write".into()], 0.3);
        assert!(server.serves("Read"));
        assert!(!server.serves("Query"));
    }

    #[test]
    fn test_failed_server_serves_nothing() {
        let mut server = Server::new("s1", "filesystem", vec!["Read".into()], 0.3);
        server.status = ServerStatus::Failed;
        assert!(!server.serves("Read"));
    }

    #[test]
    fn test_load_clamped() {
        let server = Server::new("s1", "fs", vec![], 1.7);
        assert_eq!(server.load, 1.0);
        let server = Server::new("s2", "fs", vec![], -0.2);
        assert_eq!(server.load, 0.0);
    }

    #[test]
    fn test_criticality_weights_ordered() {
        assert!(Criticality::Low.weight() < Criticality::Medium.weight());
        assert!(Criticality::Medium.weight() < Criticality::High.weight());
        assert!(Criticality::High.weight() < Criticality::Critical.weight());
        assert_eq!(Criticality::Critical.weight(), 1.0);
    }

    #[test]
    fn test_lock_mode_serialization() {
        let json = serde_json::to_string(&LockMode::Shareable).unwrap();
        assert_eq!(json, "\"shareable\"");
        let parsed: LockMode = serde_json::from_str("\"exclusive\"").unwrap();
        assert_eq!(parsed, LockMode::Exclusive);
    }

    #[test]
    fn test_server_serialization_roundtrip() {
        let server = Server::new("mcp1", "github", vec!["Git".into(), "PR".into()], 0.7)
            .with_performance(0.9);
        let json = serde_json::to_string(&server).unwrap();
        let parsed: Server = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.id, "mcp1");
        assert_eq!(parsed.performance, Some(0.9));
        assert_eq!(parsed.status, ServerStatus::Healthy);
    }
}
