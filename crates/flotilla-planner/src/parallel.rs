use crate::types::{Phase, Plan, Stage, Workflow};
use flotilla_core::{FlotillaError, FlotillaResult};
use std::collections::HashSet;
use tracing::debug;
use uuid::Uuid;

/// Dependency-aware grouping of workflow stages into concurrent batches.
///
/// Both operations are pure: they never touch shared state, so an abandoned
/// call has no side effects.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParallelPlanner;

impl ParallelPlanner {
    pub fn new() -> Self {
        Self
    }

    /// Group the workflow's stages into dependency levels and emit one phase
    /// per level, every agent task in the level running concurrently.
    ///
    /// Fails fast with [`FlotillaError::Validation`] on a stage referencing a
    /// nonexistent dependency or on a dependency cycle — both are caller
    /// defects, not transient conditions.
    pub fn optimize_parallel_execution(&self, workflow: &Workflow) -> FlotillaResult<Plan> {
        let known: HashSet<&str> = workflow.stages.iter().map(|s| s.id.as_str()).collect();
        if known.len() != workflow.stages.len() {
            return Err(FlotillaError::Validation(format!(
                "workflow '{}' contains duplicate stage ids",
                workflow.id
            )));
        }
        for stage in &workflow.stages {
            for dep in &stage.dependencies {
                if !known.contains(dep.as_str()) {
                    return Err(FlotillaError::Validation(format!(
                        "stage '{}' references nonexistent dependency '{}'",
                        stage.id, dep
                    )));
                }
            }
        }

        // Repeated ready-set extraction: each pass collects every stage whose
        // dependencies are already placed, forming one concurrent level.
        let mut placed: HashSet<&str> = HashSet::new();
        let mut phases: Vec<Phase> = Vec::new();

        while placed.len() < workflow.stages.len() {
            let ready: Vec<&Stage> = workflow
                .stages
                .iter()
                .filter(|s| !placed.contains(s.id.as_str()))
                .filter(|s| s.dependencies.iter().all(|d| placed.contains(d.as_str())))
                .collect();

            if ready.is_empty() {
                return Err(FlotillaError::Validation(format!(
                    "dependency cycle detected in workflow '{}'",
                    workflow.id
                )));
            }

            let mut agents = Vec::new();
            let mut names = Vec::new();
            for stage in &ready {
                agents.extend(stage.agents.iter().cloned());
                names.push(stage.name.clone());
            }
            // Phase duration under full parallelism is the longest task.
            let duration = agents
                .iter()
                .map(|t| t.duration_estimate())
                .fold(0.0_f64, f64::max);

            phases.push(Phase {
                id: format!("phase-{}", phases.len() + 1),
                name: names.join(" + "),
                agents,
                parallel: true,
                estimated_duration_ms: duration,
            });

            for stage in ready {
                placed.insert(stage.id.as_str());
            }
        }

        let estimated_duration_ms = phases.iter().map(|p| p.estimated_duration_ms).sum();
        debug!(
            workflow = %workflow.id,
            phases = phases.len(),
            estimated_duration_ms,
            "Workflow grouped into concurrent batches"
        );

        Ok(Plan {
            id: Uuid::new_v4(),
            phases,
            estimated_duration_ms,
            risk: None,
        })
    }

    /// Parallel efficiency of a plan: total task work divided by the
    /// critical-path duration times the number of concurrently used
    /// execution slots. Approaches 1.0 as per-batch overhead shrinks;
    /// 0.0 for a plan with no work.
    pub fn calculate_parallel_efficiency(&self, plan: &Plan) -> f64 {
        let total_work: f64 = plan
            .phases
            .iter()
            .flat_map(|p| p.agents.iter())
            .map(|t| t.duration_estimate())
            .sum();

        let critical_path: f64 = plan
            .phases
            .iter()
            .map(|p| {
                if p.parallel {
                    p.agents
                        .iter()
                        .map(|t| t.duration_estimate())
                        .fold(0.0_f64, f64::max)
                } else {
                    p.agents.iter().map(|t| t.duration_estimate()).sum()
                }
            })
            .sum();

        let slots = plan
            .phases
            .iter()
            .filter(|p| p.parallel)
            .map(|p| p.agents.len())
            .max()
            .unwrap_or(1)
            .max(1);

        if total_work <= 0.0 || critical_path <= 0.0 {
            return 0.0;
        }
        (total_work / (critical_path * slots as f64)).clamp(0.0, 1.0)
    }
}
