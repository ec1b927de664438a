use serde::{Deserialize, Serialize};
use tracing::debug;

/// A candidate server presented to the scorer: the subset of server state
/// relevant to capability/performance matching.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerCandidate {
    pub id: String,
    pub capabilities: Vec<String>,
    /// Observed performance score in `[0, 1]`.
    pub performance: f64,
}

/// The scorer's verdict: the winning server and its score in `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub server_id: String,
    pub score: f64,
}

/// Capability/performance match scoring for agent-to-server pairing.
///
/// The score is an even split between capability relevance and observed
/// performance: `0.5 * match_fraction + 0.5 * performance`. The match
/// fraction is the share of the task-relevant capability pool the candidate
/// exposes, where the pool is every capability (across all candidates) that
/// matches a task keyword — capabilities beyond the task's needs are not
/// penalized. A candidate exposing the whole pool with performance 0.9
/// therefore scores 0.95, comfortably above partial matches.
#[derive(Debug, Clone, Copy)]
pub struct AssignmentScorer {
    match_weight: f64,
    performance_weight: f64,
}

impl AssignmentScorer {
    pub fn new() -> Self {
        Self {
            match_weight: 0.5,
            performance_weight: 0.5,
        }
    }

    /// Score each candidate and return the best match, earlier candidates
    /// winning ties. `None` for an empty candidate list.
    pub fn assign_agent_to_server(
        &self,
        agent_type: &str,
        task_type: &str,
        candidates: &[ServerCandidate],
    ) -> Option<Assignment> {
        let keywords = task_keywords(agent_type, task_type);
        let relevant = relevant_capabilities(candidates, &keywords);

        let mut best: Option<Assignment> = None;
        for candidate in candidates {
            let score = self.score(candidate, &relevant);
            debug!(
                server = %candidate.id,
                agent_type = %agent_type,
                task_type = %task_type,
                score,
                "Candidate scored"
            );
            match &best {
                Some(current) if score <= current.score => {}
                _ => {
                    best = Some(Assignment {
                        server_id: candidate.id.clone(),
                        score,
                    });
                }
            }
        }
        best
    }

    fn score(&self, candidate: &ServerCandidate, relevant: &[String]) -> f64 {
        self.match_weight * match_fraction(&candidate.capabilities, relevant)
            + self.performance_weight * candidate.performance.clamp(0.0, 1.0)
    }
}

impl Default for AssignmentScorer {
    fn default() -> Self {
        Self::new()
    }
}

/// Lowercased alphanumeric tokens drawn from the agent and task types.
fn task_keywords(agent_type: &str, task_type: &str) -> Vec<String> {
    let mut keywords: Vec<String> = Vec::new();
    for source in [agent_type, task_type] {
        for token in source
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let token = token.to_lowercase();
            if !keywords.contains(&token) {
                keywords.push(token);
            }
        }
    }
    keywords
}

/// The task-relevant capability pool: every capability advertised by any
/// candidate that matches a task keyword, where a match is a
/// case-insensitive substring relation in either direction ("Search"
/// matches keyword "search", "fs" matches "filesystem"). Lowercased and
/// deduplicated.
fn relevant_capabilities(candidates: &[ServerCandidate], keywords: &[String]) -> Vec<String> {
    let mut relevant: Vec<String> = Vec::new();
    for candidate in candidates {
        for cap in &candidate.capabilities {
            let cap = cap.to_lowercase();
            let matches = keywords
                .iter()
                .any(|kw| cap.contains(kw.as_str()) || kw.contains(cap.as_str()));
            if matches && !relevant.contains(&cap) {
                relevant.push(cap);
            }
        }
    }
    relevant
}

/// Share of the relevant pool the candidate exposes; 0.0 for an empty pool.
fn match_fraction(capabilities: &[String], relevant: &[String]) -> f64 {
    if relevant.is_empty() {
        return 0.0;
    }
    let exposed = relevant
        .iter()
        .filter(|rc| capabilities.iter().any(|cap| cap.to_lowercase() == **rc))
        .count();
    exposed as f64 / relevant.len() as f64
}
