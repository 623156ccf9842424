//! Search configuration.

use crate::metric::DistanceMetric;
use serde::{Deserialize, Serialize};

/// What to do when more neighbors are requested than other movies exist
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CandidatePolicy {
    /// Return every other movie
    #[default]
    Clamp,
    /// Fail with `InsufficientCandidates`
    Strict,
}

/// Defaults applied by [`crate::NeighborIndex::nearest`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SearchConfig {
    pub metric: DistanceMetric,
    pub candidate_policy: CandidatePolicy,
}

impl SearchConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure the default metric (default: cosine)
    pub fn with_metric(mut self, metric: DistanceMetric) -> Self {
        self.metric = metric;
        self
    }

    /// Configure the k policy (default: clamp)
    pub fn with_candidate_policy(mut self, policy: CandidatePolicy) -> Self {
        self.candidate_policy = policy;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let config = SearchConfig::new()
            .with_metric(DistanceMetric::Manhattan)
            .with_candidate_policy(CandidatePolicy::Strict);

        assert_eq!(config.metric, DistanceMetric::Manhattan);
        assert_eq!(config.candidate_policy, CandidatePolicy::Strict);
        assert_eq!(SearchConfig::default().candidate_policy, CandidatePolicy::Clamp);
    }
}
