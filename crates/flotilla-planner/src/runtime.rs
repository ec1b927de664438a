use crate::types::{ExecutionState, Recommendation, RecommendationKind};
use tracing::debug;

/// A phase is considered behind schedule when its actual duration exceeds its
/// estimate by this factor.
const OVERRUN_FACTOR: f64 = 1.2;

/// Spread between the busiest and idlest agent of a phase above which
/// reallocation is recommended.
const USAGE_IMBALANCE: f64 = 0.3;

/// Advisory analysis of in-flight execution telemetry.
///
/// Pure: recommendations are derived solely from the submitted state and
/// never mutate the plan.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuntimeOptimizer;

impl RuntimeOptimizer {
    pub fn new() -> Self {
        Self
    }

    /// Inspect completed-phase telemetry and emit advisory recommendations.
    ///
    /// A phase running past [`OVERRUN_FACTOR`] times its estimate yields a
    /// parallel-execution recommendation. A phase whose busiest and idlest
    /// agents differ in resource usage by more than [`USAGE_IMBALANCE`]
    /// yields a reallocation recommendation. At most one of each kind per
    /// call; an empty report list yields no recommendations.
    pub fn optimize_runtime(&self, state: &ExecutionState) -> Vec<Recommendation> {
        let mut recommendations = Vec::new();

        if let Some(report) = state
            .phase_reports
            .iter()
            .find(|r| r.actual_duration_ms > r.estimated_duration_ms * OVERRUN_FACTOR)
        {
            recommendations.push(Recommendation {
                kind: RecommendationKind::ParallelExecution,
                rationale: format!(
                    "phase '{}' ran {:.0}ms against a {:.0}ms estimate; split remaining work \
                     across more concurrent agents",
                    report.phase_id, report.actual_duration_ms, report.estimated_duration_ms
                ),
            });
        }

        if let Some((report, spread)) = state.phase_reports.iter().find_map(|r| {
            let usages: Vec<f64> = r.agent_resource_usage.iter().map(|(_, u)| *u).collect();
            let max = usages.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            let min = usages.iter().copied().fold(f64::INFINITY, f64::min);
            (usages.len() >= 2 && max - min > USAGE_IMBALANCE).then_some((r, max - min))
        }) {
            recommendations.push(Recommendation {
                kind: RecommendationKind::ResourceReallocation,
                rationale: format!(
                    "phase '{}' shows a {:.2} resource-usage spread between agents; rebalance \
                     load toward idle agents",
                    report.phase_id, spread
                ),
            });
        }

        debug!(
            plan_id = %state.plan_id,
            current_phase = state.current_phase,
            recommendations = recommendations.len(),
            "Runtime telemetry analyzed"
        );

        recommendations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PhaseReport;
    use uuid::Uuid;

    fn report(phase_id: &str, estimated: f64, actual: f64) -> PhaseReport {
        PhaseReport {
            phase_id: phase_id.to_string(),
            estimated_duration_ms: estimated,
            actual_duration_ms: actual,
            agent_resource_usage: vec![],
            success: true,
        }
    }

    fn state(reports: Vec<PhaseReport>) -> ExecutionState {
        ExecutionState {
            plan_id: Uuid::new_v4(),
            current_phase: reports.len(),
            phase_reports: reports,
        }
    }

    #[test]
    fn test_no_reports_no_recommendations() {
        let recs = RuntimeOptimizer::new().optimize_runtime(&state(vec![]));
        assert!(recs.is_empty());
    }

    #[test]
    fn test_on_schedule_phase_is_quiet() {
        let recs = RuntimeOptimizer::new()
            .optimize_runtime(&state(vec![report("phase-1", 1_000.0, 1_100.0)]));
        assert!(recs.is_empty());
    }

    #[test]
    fn test_overrun_recommends_parallel_execution() {
        let recs = RuntimeOptimizer::new()
            .optimize_runtime(&state(vec![report("phase-1", 1_000.0, 1_500.0)]));
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].kind, RecommendationKind::ParallelExecution);
        assert!(recs[0].rationale.contains("phase-1"));
    }

    #[test]
    fn test_usage_imbalance_recommends_reallocation() {
        let mut r = report("phase-1", 1_000.0, 1_000.0);
        r.agent_resource_usage = vec![
            ("a1".to_string(), 0.9),
            ("a2".to_string(), 0.4),
            ("a3".to_string(), 0.5),
        ];
        let recs = RuntimeOptimizer::new().optimize_runtime(&state(vec![r]));
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].kind, RecommendationKind::ResourceReallocation);
    }

    #[test]
    fn test_balanced_usage_is_quiet() {
        let mut r = report("phase-1", 1_000.0, 1_000.0);
        r.agent_resource_usage = vec![("a1".to_string(), 0.6), ("a2".to_string(), 0.5)];
        let recs = RuntimeOptimizer::new().optimize_runtime(&state(vec![r]));
        assert!(recs.is_empty());
    }

    #[test]
    fn test_single_agent_usage_never_imbalanced() {
        let mut r = report("phase-1", 1_000.0, 1_000.0);
        r.agent_resource_usage = vec![("a1".to_string(), 0.95)];
        let recs = RuntimeOptimizer::new().optimize_runtime(&state(vec![r]));
        assert!(recs.is_empty());
    }

    #[test]
    fn test_both_kinds_can_fire_together() {
        let mut r = report("phase-1", 1_000.0, 2_000.0);
        r.agent_resource_usage = vec![("a1".to_string(), 0.9), ("a2".to_string(), 0.1)];
        let recs = RuntimeOptimizer::new().optimize_runtime(&state(vec![r]));
        assert_eq!(recs.len(), 2);
        assert!(recs
            .iter()
            .any(|r| r.kind == RecommendationKind::ParallelExecution));
        assert!(recs
            .iter()
            .any(|r| r.kind == RecommendationKind::ResourceReallocation));
    }
}
