use common::AttributeVector;
use serde::{Deserialize, Serialize};

use super::recommendation::RecommendationReason;

/// Where a preference vector came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreferenceSource {
    /// Explicitly set (or bootstrapped) baseline.
    Baseline,
    /// Derived from favorable reviews.
    Inferred,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PreferenceVector {
    pub values: AttributeVector,
    pub source: PreferenceSource,
}

impl PreferenceVector {
    pub fn reason(&self) -> RecommendationReason {
        match self.source {
            PreferenceSource::Baseline => RecommendationReason::BaselineMatch,
            PreferenceSource::Inferred => RecommendationReason::Personalized,
        }
    }
}
