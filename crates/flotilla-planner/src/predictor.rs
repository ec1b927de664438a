use crate::types::{ExecutionRecord, Prediction, DEFAULT_TASK_DURATION_MS};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

/// Maximum retained execution records per `(agent_type, task_type)` key.
/// Older records are evicted first.
const HISTORY_LIMIT: usize = 100;

/// Confidence reported when no history exists for a key.
const BASELINE_CONFIDENCE: f64 = 0.1;

/// History bucket key: `(agent_type, task_type)`.
pub type HistoryKey = (String, String);

/// Duration predictor backed by a bounded per-key execution history.
///
/// Keys are `(agent_type, task_type)` pairs. Each key's history is a sliding
/// window of the last [`HISTORY_LIMIT`] records, guarded by its own lock so
/// recordings against unrelated keys never contend; the outer map lock is
/// held only for bucket lookup or insertion.
#[derive(Debug, Default)]
pub struct PerformancePredictor {
    history: RwLock<HashMap<HistoryKey, Arc<Mutex<VecDeque<ExecutionRecord>>>>>,
}

impl PerformancePredictor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an execution record to its key's history, evicting the oldest
    /// record once the window is full.
    pub async fn record_execution(&self, record: ExecutionRecord) {
        let key = (record.agent_type.clone(), record.task_type.clone());
        let bucket = {
            let history = self.history.read().await;
            history.get(&key).cloned()
        };
        let bucket = match bucket {
            Some(bucket) => bucket,
            None => {
                let mut history = self.history.write().await;
                history.entry(key).or_default().clone()
            }
        };

        let mut entries = bucket.lock().await;
        if entries.len() >= HISTORY_LIMIT {
            entries.pop_front();
        }
        entries.push_back(record);
    }

    /// Predict the duration of a task from its key's history.
    ///
    /// The estimate is the mean of recorded durations. Confidence grows with
    /// sample count as `n / (n + 1)` and shrinks with relative variance as
    /// `1 / (1 + cv)`, where `cv` is the coefficient of variation. With no
    /// history the default duration is returned at baseline confidence.
    pub async fn predict_performance(&self, agent_type: &str, task_type: &str) -> Prediction {
        let bucket = {
            let history = self.history.read().await;
            history
                .get(&(agent_type.to_string(), task_type.to_string()))
                .cloned()
        };
        let Some(bucket) = bucket else {
            return Prediction {
                estimated_duration_ms: DEFAULT_TASK_DURATION_MS,
                confidence: BASELINE_CONFIDENCE,
            };
        };

        let entries = bucket.lock().await;
        if entries.is_empty() {
            return Prediction {
                estimated_duration_ms: DEFAULT_TASK_DURATION_MS,
                confidence: BASELINE_CONFIDENCE,
            };
        }

        let n = entries.len() as f64;
        let mean = entries.iter().map(|r| r.duration_ms).sum::<f64>() / n;
        let variance = entries
            .iter()
            .map(|r| (r.duration_ms - mean).powi(2))
            .sum::<f64>()
            / n;
        let cv = if mean > 0.0 { variance.sqrt() / mean } else { 0.0 };
        let confidence = ((n / (n + 1.0)) / (1.0 + cv)).clamp(0.0, 1.0);

        debug!(
            agent_type,
            task_type,
            samples = entries.len(),
            estimated_duration_ms = mean,
            confidence,
            "Duration predicted from history"
        );

        Prediction {
            estimated_duration_ms: mean.max(1.0),
            confidence,
        }
    }

    /// Number of retained records for a key.
    pub async fn history_len(&self, agent_type: &str, task_type: &str) -> usize {
        let bucket = {
            let history = self.history.read().await;
            history
                .get(&(agent_type.to_string(), task_type.to_string()))
                .cloned()
        };
        match bucket {
            Some(bucket) => bucket.lock().await.len(),
            None => 0,
        }
    }

    /// Per-key record counts, for the presentation layer.
    pub async fn snapshot(&self) -> Vec<(HistoryKey, usize)> {
        let buckets: Vec<(HistoryKey, Arc<Mutex<VecDeque<ExecutionRecord>>>)> = {
            let history = self.history.read().await;
            history
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect()
        };

        let mut counts = Vec::with_capacity(buckets.len());
        for (key, bucket) in buckets {
            let len = bucket.lock().await.len();
            counts.push((key, len));
        }
        counts.sort_by(|a, b| a.0.cmp(&b.0));
        counts
    }
}
