use crate::parallel::ParallelPlanner;
use crate::predictor::PerformancePredictor;
use crate::risk::RiskAssessor;
use crate::types::{AgentRisk, AgentTask, Phase, Plan, Project, Stage, Workflow};
use flotilla_core::{Event, EventBus, FlotillaResult};
use std::sync::Arc;
use tracing::info;

/// Top-level planner: turns a [`Project`] into a phased, risk-annotated
/// [`Plan`] with history-informed duration estimates.
pub struct OrchestrationPlanner {
    parallel: ParallelPlanner,
    predictor: Arc<PerformancePredictor>,
    risk: RiskAssessor,
    events: Arc<EventBus>,
}

impl OrchestrationPlanner {
    pub fn new(predictor: Arc<PerformancePredictor>, events: Arc<EventBus>) -> Self {
        Self {
            parallel: ParallelPlanner::new(),
            predictor,
            risk: RiskAssessor::new(),
            events,
        }
    }

    /// Produce a complete plan for a project.
    ///
    /// Stages are grouped into concurrent batches, every batch's duration is
    /// re-estimated from execution history, agent risks are aggregated, and a
    /// completion event is published. Returned plans always contain at least
    /// one phase, so downstream consumers never special-case emptiness.
    pub async fn create_orchestration_plan(&self, project: &Project) -> FlotillaResult<Plan> {
        let workflow = self.workflow_from_project(project);
        let mut plan = self.parallel.optimize_parallel_execution(&workflow)?;

        for phase in &mut plan.phases {
            phase.estimated_duration_ms = self.estimate_phase(phase).await;
        }
        plan.estimated_duration_ms = plan.phases.iter().map(|p| p.estimated_duration_ms).sum();

        if plan.phases.is_empty() {
            plan.phases.push(Phase {
                id: "phase-1".to_string(),
                name: project.name.clone(),
                agents: Vec::new(),
                parallel: true,
                estimated_duration_ms: 0.0,
            });
        }

        let risks: Vec<AgentRisk> = project
            .agents
            .iter()
            .map(|a| AgentRisk {
                agent_id: a.id.clone(),
                criticality: a.criticality,
                failure_probability: a.failure_probability,
            })
            .collect();
        plan.risk = Some(self.risk.assess_risks(&risks));

        info!(
            project = %project.id,
            plan_id = %plan.id,
            phases = plan.phases.len(),
            estimated_duration_ms = plan.estimated_duration_ms,
            "Orchestration plan created"
        );
        self.events.publish(Event::PlanCompleted { plan_id: plan.id });

        Ok(plan)
    }

    /// A project with explicit stages keeps them; otherwise every agent runs
    /// in a single all-parallel stage, its task keyed on the agent type.
    fn workflow_from_project(&self, project: &Project) -> Workflow {
        let stages = match &project.stages {
            Some(stages) => stages.clone(),
            None => {
                let agents = project
                    .agents
                    .iter()
                    .map(|a| AgentTask::new(a.id.clone(), a.agent_type.clone(), a.agent_type.clone()))
                    .collect();
                vec![Stage::new("stage-1", project.name.clone(), agents)]
            }
        };
        Workflow {
            id: project.id.clone(),
            stages,
        }
    }

    /// Duration of a concurrent batch is the longest history-informed task
    /// estimate within it; an explicit per-task estimate wins over history.
    async fn estimate_phase(&self, phase: &Phase) -> f64 {
        let mut longest = 0.0_f64;
        for task in &phase.agents {
            let estimate = match task.estimated_duration_ms {
                Some(explicit) => explicit.max(1.0),
                None => {
                    self.predictor
                        .predict_performance(&task.agent_type, &task.task)
                        .await
                        .estimated_duration_ms
                }
            };
            longest = longest.max(estimate);
        }
        longest
    }
}
