use crate::registry::ServerRegistry;
use flotilla_core::{FlotillaResult, Server};
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Load added to a server for each assignment it receives, released again by
/// [`LoadBalancer::release_server`].
const ASSIGNMENT_LOAD: f64 = 0.05;

/// Floor applied to selection weights so a fully loaded server can still be
/// drawn when it is the only candidate left.
const MIN_WEIGHT: f64 = 0.01;

/// Capability-filtered, load-biased server selection with failover.
///
/// Selection draws from the eligible candidates with probability
/// proportional to `1 - load`, so repeated calls under identical loads
/// distribute assignments roughly inversely to load rather than all landing
/// on one server. Candidates are ordered by ascending load before the draw,
/// which also makes a zero draw select the least-loaded server.
pub struct LoadBalancer {
    registry: Arc<ServerRegistry>,
    rng: Mutex<Box<dyn RngCore + Send>>,
}

impl LoadBalancer {
    pub fn new(registry: Arc<ServerRegistry>) -> Self {
        Self::with_rng(registry, Box::new(StdRng::from_entropy()))
    }

    /// Create a balancer with an injected RNG (deterministic in tests).
    pub fn with_rng(registry: Arc<ServerRegistry>, rng: Box<dyn RngCore + Send>) -> Self {
        Self {
            registry,
            rng: Mutex::new(rng),
        }
    }

    /// The registry this balancer selects from.
    pub fn registry(&self) -> &Arc<ServerRegistry> {
        &self.registry
    }

    /// Select a healthy server advertising `capability` for the given agent.
    ///
    /// Returns `None` when no eligible server exists — a routine outcome the
    /// caller must handle, not an error. The chosen server's load is bumped
    /// by a small assignment increment; call
    /// [`release_server`](Self::release_server) when the agent finishes.
    pub async fn assign_server_to_agent(
        &self,
        agent_id: &str,
        capability: &str,
    ) -> Option<Server> {
        let mut candidates = self.registry.list_healthy_with_capability(capability).await;
        if candidates.is_empty() {
            debug!(agent = %agent_id, capability = %capability, "No eligible server");
            return None;
        }

        candidates.sort_by(|a, b| {
            a.load
                .partial_cmp(&b.load)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.id.cmp(&b.id))
        });

        let chosen = self.weighted_draw(&candidates).await?;

        // Best effort: the server may have been failed or replaced since the
        // listing; the assignment itself is still valid.
        let _ = self.registry.adjust_load(&chosen.id, ASSIGNMENT_LOAD).await;

        info!(
            agent = %agent_id,
            server = %chosen.id,
            capability = %capability,
            load = chosen.load,
            "Server assigned"
        );
        Some(chosen)
    }

    /// Release one assignment's worth of load from a server.
    pub async fn release_server(&self, server_id: &str) -> FlotillaResult<()> {
        self.registry.adjust_load(server_id, -ASSIGNMENT_LOAD).await
    }

    /// Mark a server failed. Effective before the next
    /// [`assign_server_to_agent`](Self::assign_server_to_agent) call returns.
    pub async fn mark_server_failed(&self, server_id: &str) -> FlotillaResult<()> {
        self.registry.mark_failed(server_id).await
    }

    async fn weighted_draw(&self, candidates: &[Server]) -> Option<Server> {
        let weights: Vec<f64> = candidates
            .iter()
            .map(|s| (1.0 - s.load).max(MIN_WEIGHT))
            .collect();
        let total: f64 = weights.iter().sum();

        let mut rng = self.rng.lock().await;
        let mut point: f64 = rng.gen::<f64>() * total;

        // The last candidate owns whatever interval remains after floating
        // point drift at the end of the walk.
        let mut chosen = candidates.last();
        for (server, weight) in candidates.iter().zip(&weights) {
            if point < *weight {
                chosen = Some(server);
                break;
            }
            point -= weight;
        }
        chosen.cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flotilla_core::EventBus;
    use rand::rngs::mock::StepRng;

    async fn mesh_with(servers: Vec<Server>) -> Arc<ServerRegistry> {
        let registry = Arc::new(ServerRegistry::new(Arc::new(EventBus::default())));
        for server in servers {
            registry.register(server).await;
        }
        registry
    }

    /// A zero draw always lands on the least-loaded candidate.
    fn deterministic(registry: Arc<ServerRegistry>) -> LoadBalancer {
        LoadBalancer::with_rng(registry, Box::new(StepRng::new(0, 0)))
    }

    #[tokio::test]
    async fn test_no_eligible_server_returns_none() {
        let registry = mesh_with(vec![Server::new("s1", "fs", vec!["Read".into()], 0.2)]).await;
        let balancer = LoadBalancer::new(registry);
        assert!(balancer.assign_server_to_agent("a1", "Query").await.is_none());
    }

    #[tokio::test]
    async fn test_capability_filter() {
        let registry = mesh_with(vec![
            Server::new("fs", "fs", vec!["Read".into(), "Write".into()], 0.9),
            Server::new("db", "db", vec!["Query".into()], 0.1),
        ])
        .await;
        let balancer = LoadBalancer::new(registry);

        let assigned = balancer.assign_server_to_agent("a1", "Write").await.unwrap();
        assert_eq!(assigned.id, "fs");
    }

    #[tokio::test]
    async fn test_failover_primary_to_backup() {
        let registry = mesh_with(vec![
            Server::new("primary", "main-server", vec!["Read".into()], 0.2),
            Server::new("backup", "backup-server", vec!["Read".into()], 0.3),
        ])
        .await;
        let balancer = deterministic(registry);

        let initial = balancer.assign_server_to_agent("agent1", "Read").await.unwrap();
        assert_eq!(initial.id, "primary");

        balancer.mark_server_failed("primary").await.unwrap();

        let after = balancer.assign_server_to_agent("agent2", "Read").await.unwrap();
        assert_eq!(after.id, "backup");
    }

    #[tokio::test]
    async fn test_failed_server_never_assigned() {
        let registry = mesh_with(vec![
            Server::new("s1", "one", vec!["Read".into()], 0.1),
            Server::new("s2", "two", vec!["Read".into()], 0.1),
        ])
        .await;
        let balancer = LoadBalancer::new(registry);

        balancer.mark_server_failed("s1").await.unwrap();
        for i in 0..50 {
            let assigned = balancer
                .assign_server_to_agent(&format!("agent-{i}"), "Read")
                .await
                .unwrap();
            assert_ne!(assigned.id, "s1");
            balancer.release_server(&assigned.id).await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_low_load_server_receives_plurality() {
        let registry = mesh_with(vec![
            Server::new("a", "a", vec!["Read".into()], 0.3),
            Server::new("b", "b", vec!["Read".into()], 0.7),
            Server::new("c", "c", vec!["Read".into()], 0.5),
        ])
        .await;
        let balancer = LoadBalancer::new(registry);

        let mut counts = std::collections::HashMap::new();
        for i in 0..1000 {
            let assigned = balancer
                .assign_server_to_agent(&format!("agent-{i}"), "Read")
                .await
                .unwrap();
            *counts.entry(assigned.id.clone()).or_insert(0usize) += 1;
            // Undo the assignment increment so the loads stay fixed.
            balancer.release_server(&assigned.id).await.unwrap();
        }

        // Expected shares: a ≈ 0.47, c ≈ 0.33, b ≈ 0.20.
        let a = counts.get("a").copied().unwrap_or(0);
        let b = counts.get("b").copied().unwrap_or(0);
        let c = counts.get("c").copied().unwrap_or(0);
        assert!(a > c, "a={a} c={c}");
        assert!(c > b, "c={c} b={b}");
        assert!(a >= 350, "a received only {a} of 1000 draws");
    }

    #[tokio::test]
    async fn test_assignment_bumps_load() {
        let registry =
            mesh_with(vec![Server::new("s1", "one", vec!["Read".into()], 0.2)]).await;
        let balancer = deterministic(registry.clone());

        balancer.assign_server_to_agent("a1", "Read").await.unwrap();
        let load = registry.get("s1").await.unwrap().load;
        assert!((load - 0.25).abs() < 1e-9);

        balancer.release_server("s1").await.unwrap();
        let load = registry.get("s1").await.unwrap().load;
        assert!((load - 0.2).abs() < 1e-9);
    }
}
