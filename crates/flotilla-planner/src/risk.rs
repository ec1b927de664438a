use crate::types::{AgentRisk, Mitigation, MitigationAction, RiskAssessment};
use tracing::debug;

/// Effective risk above which an agent receives a targeted mitigation.
const MITIGATION_THRESHOLD: f64 = 0.1;

/// Effective risk above which the targeted mitigation is redundancy rather
/// than monitoring.
const REDUNDANCY_THRESHOLD: f64 = 0.25;

/// Criticality-weighted failure-risk aggregation over a plan's agents.
///
/// Pure and stateless: assessments depend only on the supplied risks.
#[derive(Debug, Clone, Copy, Default)]
pub struct RiskAssessor;

impl RiskAssessor {
    pub fn new() -> Self {
        Self
    }

    /// Aggregate agent risks into an overall plan risk with mitigations.
    ///
    /// Each agent's effective risk is its failure probability scaled by its
    /// criticality weight. The overall risk is the probability that at least
    /// one agent fails: `1 - Π(1 - effective_i)`. Agents above
    /// [`MITIGATION_THRESHOLD`] get a targeted mitigation; any nonzero
    /// overall risk additionally gets a blanket reassignment fallback.
    pub fn assess_risks(&self, risks: &[AgentRisk]) -> RiskAssessment {
        let mut survival = 1.0_f64;
        let mut mitigations = Vec::new();

        for risk in risks {
            let effective = (risk.failure_probability.clamp(0.0, 1.0)
                * risk.criticality.weight())
            .clamp(0.0, 1.0);
            survival *= 1.0 - effective;

            if effective > MITIGATION_THRESHOLD {
                let action = if effective >= REDUNDANCY_THRESHOLD {
                    MitigationAction::AddRedundancy
                } else {
                    MitigationAction::IncreaseMonitoring
                };
                mitigations.push(Mitigation {
                    agent_id: Some(risk.agent_id.clone()),
                    action,
                    rationale: format!(
                        "agent '{}' carries effective risk {:.2} ({:?} criticality)",
                        risk.agent_id, effective, risk.criticality
                    ),
                });
            }
        }

        let overall_risk = (1.0 - survival).clamp(0.0, 1.0);
        if overall_risk > 0.0 {
            mitigations.push(Mitigation {
                agent_id: None,
                action: MitigationAction::ReassignServer,
                rationale: format!(
                    "overall plan risk {overall_risk:.2}; reassign failed agents to healthy servers"
                ),
            });
        }

        debug!(
            agents = risks.len(),
            overall_risk,
            mitigations = mitigations.len(),
            "Plan risk assessed"
        );

        RiskAssessment {
            overall_risk,
            mitigations,
        }
    }
}
