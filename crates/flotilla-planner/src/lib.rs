//! Flotilla Planner: orchestration planning for multi-agent fleets.
//!
//! Turns project descriptions into phased execution plans: stages are grouped
//! into concurrent batches by dependency level, durations are estimated from
//! bounded execution history, plan-level risk is aggregated from per-agent
//! declarations, and in-flight telemetry yields advisory recommendations.
//!
//! # Main types
//!
//! - [`OrchestrationPlanner`]: project in, risk-annotated [`Plan`] out
//! - [`ParallelPlanner`]: dependency-level batching and efficiency scoring
//! - [`PerformancePredictor`]: history-backed duration prediction
//! - [`RiskAssessor`]: criticality-weighted risk aggregation
//! - [`RuntimeOptimizer`]: advisory recommendations from execution telemetry

pub mod orchestrator;
pub mod parallel;
pub mod predictor;
pub mod risk;
pub mod runtime;
pub mod types;

pub use orchestrator::OrchestrationPlanner;
pub use parallel::ParallelPlanner;
pub use predictor::PerformancePredictor;
pub use risk::RiskAssessor;
pub use runtime::RuntimeOptimizer;
pub use types::{
    AgentRisk, AgentSpec, AgentTask, ExecutionRecord, ExecutionState, Mitigation,
    MitigationAction, Phase, PhaseReport, Plan, Prediction, Project, Recommendation,
    RecommendationKind, RiskAssessment, Stage, Workflow,
};
