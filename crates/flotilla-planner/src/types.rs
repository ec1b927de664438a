use chrono::{DateTime, Utc};
use flotilla_core::Criticality;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Fallback per-task duration when neither the task nor the execution
/// history provides an estimate.
pub const DEFAULT_TASK_DURATION_MS: f64 = 60_000.0;

/// A single agent task within a workflow stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentTask {
    pub agent_id: String,
    pub agent_type: String,
    /// Task type descriptor, also the key for performance history.
    pub task: String,
    /// Caller-supplied duration estimate; the planner falls back to
    /// [`DEFAULT_TASK_DURATION_MS`] when absent.
    #[serde(default)]
    pub estimated_duration_ms: Option<f64>,
}

impl AgentTask {
    pub fn new(
        agent_id: impl Into<String>,
        agent_type: impl Into<String>,
        task: impl Into<String>,
    ) -> Self {
        Self {
            agent_id: agent_id.into(),
            agent_type: agent_type.into(),
            task: task.into(),
            estimated_duration_ms: None,
        }
    }

    pub fn with_estimated_duration(mut self, duration_ms: f64) -> Self {
        self.estimated_duration_ms = Some(duration_ms);
        self
    }

    /// The task's duration estimate, defaulted when unset.
    pub fn duration_estimate(&self) -> f64 {
        self.estimated_duration_ms
            .unwrap_or(DEFAULT_TASK_DURATION_MS)
            .max(1.0)
    }
}

/// A set of agent tasks within a workflow, possibly dependent on other stages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stage {
    pub id: String,
    pub name: String,
    pub agents: Vec<AgentTask>,
    /// Ids of stages that must complete before this one starts.
    #[serde(default)]
    pub dependencies: Vec<String>,
}

impl Stage {
    pub fn new(id: impl Into<String>, name: impl Into<String>, agents: Vec<AgentTask>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            agents,
            dependencies: Vec::new(),
        }
    }

    pub fn with_dependencies(mut self, dependencies: Vec<String>) -> Self {
        self.dependencies = dependencies;
        self
    }
}

/// An ordered sequence of stages submitted for parallel planning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workflow {
    pub id: String,
    pub stages: Vec<Stage>,
}

/// One completed execution, appended to the bounded per-key history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionRecord {
    pub agent_type: String,
    pub task_type: String,
    pub duration_ms: f64,
    /// Normalized resource usage in `[0, 1]`.
    pub resource_usage: f64,
    pub success: bool,
    pub recorded_at: DateTime<Utc>,
}

impl ExecutionRecord {
    pub fn new(
        agent_type: impl Into<String>,
        task_type: impl Into<String>,
        duration_ms: f64,
        resource_usage: f64,
        success: bool,
    ) -> Self {
        Self {
            agent_type: agent_type.into(),
            task_type: task_type.into(),
            duration_ms,
            resource_usage,
            success,
            recorded_at: Utc::now(),
        }
    }
}

/// A duration prediction with its confidence.
///
/// `estimated_duration_ms` is always positive; `confidence` lies in `(0, 1]`,
/// rising with sample count and falling with observed variance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub estimated_duration_ms: f64,
    pub confidence: f64,
}

/// A top-level scheduling unit within a plan: a concurrent batch of agent
/// tasks drawn from one dependency level of the workflow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Phase {
    pub id: String,
    pub name: String,
    pub agents: Vec<AgentTask>,
    /// Whether the agents in this phase run concurrently.
    pub parallel: bool,
    pub estimated_duration_ms: f64,
}

/// An orchestration plan: ordered phases plus an overall duration estimate.
/// Immutable once returned to the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plan {
    pub id: Uuid,
    pub phases: Vec<Phase>,
    pub estimated_duration_ms: f64,
    #[serde(default)]
    pub risk: Option<RiskAssessment>,
}

/// Risk declaration for one agent in a plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentRisk {
    pub agent_id: String,
    pub criticality: Criticality,
    /// Probability in `[0, 1]` that this agent's task fails.
    pub failure_probability: f64,
}

/// The action a mitigation recommends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MitigationAction {
    AddRedundancy,
    IncreaseMonitoring,
    ReassignServer,
}

/// A single mitigation recommendation within a risk assessment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mitigation {
    /// The agent this mitigation targets, when specific to one.
    #[serde(default)]
    pub agent_id: Option<String>,
    pub action: MitigationAction,
    pub rationale: String,
}

/// Aggregated plan risk with mitigation strategies.
///
/// `overall_risk` lies in `[0, 1]`; `mitigations` is never empty when
/// `overall_risk > 0`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub overall_risk: f64,
    pub mitigations: Vec<Mitigation>,
}

/// Kind tag of a runtime recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationKind {
    ParallelExecution,
    ResourceReallocation,
}

/// An advisory recommendation emitted mid-execution; the caller decides
/// whether to act.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    pub kind: RecommendationKind,
    pub rationale: String,
}

/// Telemetry for one completed phase of an in-flight execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseReport {
    pub phase_id: String,
    pub estimated_duration_ms: f64,
    pub actual_duration_ms: f64,
    /// Per-agent normalized resource usage, `(agent_id, usage)`.
    #[serde(default)]
    pub agent_resource_usage: Vec<(String, f64)>,
    pub success: bool,
}

/// In-flight execution telemetry submitted to the runtime optimizer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionState {
    pub plan_id: Uuid,
    pub current_phase: usize,
    pub phase_reports: Vec<PhaseReport>,
}

/// An agent participating in a project, with its risk declaration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSpec {
    pub id: String,
    pub agent_type: String,
    #[serde(default = "default_criticality")]
    pub criticality: Criticality,
    #[serde(default)]
    pub failure_probability: f64,
}

fn default_criticality() -> Criticality {
    Criticality::Medium
}

impl AgentSpec {
    pub fn new(id: impl Into<String>, agent_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            agent_type: agent_type.into(),
            criticality: Criticality::Medium,
            failure_probability: 0.0,
        }
    }

    pub fn with_risk(mut self, criticality: Criticality, failure_probability: f64) -> Self {
        self.criticality = criticality;
        self.failure_probability = failure_probability.clamp(0.0, 1.0);
        self
    }
}

/// A project description submitted to the orchestration planner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
    pub agents: Vec<AgentSpec>,
    /// Explicit workflow stages; when absent every agent runs in a single
    /// all-parallel stage.
    #[serde(default)]
    pub stages: Option<Vec<Stage>>,
    /// Caller-side duration target. Informational only: the planner never
    /// rejects a plan for exceeding it.
    #[serde(default)]
    pub max_duration_ms: Option<f64>,
}

impl Project {
    pub fn new(id: impl Into<String>, name: impl Into<String>, agents: Vec<AgentSpec>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            agents,
            stages: None,
            max_duration_ms: None,
        }
    }

    pub fn with_stages(mut self, stages: Vec<Stage>) -> Self {
        self.stages = Some(stages);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agent_task_duration_defaults() {
        let task = AgentTask::new("a1", "backend-engineer", "api-development");
        assert_eq!(task.duration_estimate(), DEFAULT_TASK_DURATION_MS);

        let task = task.with_estimated_duration(2_500.0);
        assert_eq!(task.duration_estimate(), 2_500.0);
    }

    #[test]
    fn test_agent_task_duration_floored() {
        let task = AgentTask::new("a1", "t", "x").with_estimated_duration(-10.0);
        assert_eq!(task.duration_estimate(), 1.0);
    }

    #[test]
    fn test_recommendation_kind_serialization() {
        let json = serde_json::to_string(&RecommendationKind::ParallelExecution).unwrap();
        assert_eq!(json, "\"parallel_execution\"");
        let json = serde_json::to_string(&RecommendationKind::ResourceReallocation).unwrap();
        assert_eq!(json, "\"resource_reallocation\"");
    }

    #[test]
    fn test_agent_spec_risk_clamped() {
        let spec = AgentSpec::new("a1", "tester").with_risk(Criticality::High, 1.4);
        assert_eq!(spec.failure_probability, 1.0);
    }

    #[test]
    fn test_plan_serialization_roundtrip() {
        let plan = Plan {
            id: Uuid::new_v4(),
            phases: vec![Phase {
                id: "phase-1".to_string(),
                name: "Development".to_string(),
                agents: vec![AgentTask::new("a1", "backend", "api")],
                parallel: true,
                estimated_duration_ms: 3_000.0,
            }],
            estimated_duration_ms: 3_000.0,
            risk: None,
        };
        let json = serde_json::to_string(&plan).unwrap();
        let parsed: Plan = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.id, plan.id);
        assert_eq!(parsed.phases.len(), 1);
        assert!(parsed.risk.is_none());
    }

    #[test]
    fn test_stage_deserialization_defaults() {
        let stage: Stage = serde_json::from_str(
            r#"{"id":"s1","name":"Analysis","agents":[{"agent_id":"a1","agent_type":"analyst","task":"scan"}]}"#,
        )
        .unwrap();
        assert!(stage.dependencies.is_empty());
        assert!(stage.agents[0].estimated_duration_ms.is_none());
    }
}
