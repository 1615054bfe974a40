use serde::{Deserialize, Serialize};

use crate::entity::item;

/// Why an item was recommended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationReason {
    /// No preference vector; ranked by overall score.
    TopRated,
    /// Ranked against the user's explicit baseline.
    BaselineMatch,
    /// Ranked against a vector inferred from the user's favorable reviews.
    Personalized,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub item_id: i32,
    pub name: String,
    pub overall_score: f64,
    pub review_count: i32,
    /// Similarity to the preference vector (0-100). `None` for `top_rated`.
    pub match_score: Option<f64>,
    pub reason: RecommendationReason,
}

impl Recommendation {
    pub fn new(item: &item::Model, match_score: Option<f64>, reason: RecommendationReason) -> Self {
        Self {
            item_id: item.id,
            name: item.name.clone(),
            overall_score: item.overall_score,
            review_count: item.review_count,
            match_score,
            reason,
        }
    }
}
