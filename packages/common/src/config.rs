use serde::Deserialize;

use crate::rating::ReviewRating;

/// Tunable constants for vote weighting, credibility, aggregation and
/// preference inference. Every field has a default, so a partial `[scoring]`
/// table (or none at all) is valid configuration.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ScoringConfig {
    /// Contribution of one agree vote to a review's net vote score. Default: 1.0.
    #[serde(default = "default_agree_weight")]
    pub agree_weight: f64,
    /// Contribution of one disagree vote to a review's net vote score. Default: -0.6.
    #[serde(default = "default_disagree_weight")]
    pub disagree_weight: f64,
    /// Net vote score is divided by this before being added to the neutral 1.0. Default: 10.
    #[serde(default = "default_vote_score_divisor")]
    pub vote_score_divisor: f64,
    /// Lower bound of a review's weighted score. Default: 0.4.
    #[serde(default = "default_weighted_score_min")]
    pub weighted_score_min: f64,
    /// Upper bound of a review's weighted score. Default: 1.5.
    #[serde(default = "default_weighted_score_max")]
    pub weighted_score_max: f64,

    /// Multiplier applied to net votes per review. Default: 0.5.
    #[serde(default = "default_credibility_scale")]
    pub credibility_scale: f64,
    /// Lower bound of a reviewer's credibility. Default: 0.5.
    #[serde(default = "default_credibility_min")]
    pub credibility_min: f64,
    /// Upper bound of a reviewer's credibility. Default: 1.5.
    #[serde(default = "default_credibility_max")]
    pub credibility_max: f64,

    /// Maximum share of community data in an aggregated attribute. Default: 0.7.
    #[serde(default = "default_user_weight_cap")]
    pub user_weight_cap: f64,
    /// Number of reviews at which the community share reaches its cap. Default: 5.
    #[serde(default = "default_confidence_review_count")]
    pub confidence_review_count: u32,
    /// Share of the categorical rating in the overall score; attributes take the rest. Default: 0.4.
    #[serde(default = "default_rating_share")]
    pub rating_share: f64,
    /// Overall score of an item nobody has reviewed. Default: 5.0.
    #[serde(default = "default_neutral_score")]
    pub neutral_score: f64,

    /// Weight of a favorited item's review when inferring preferences. Default: 1.5.
    #[serde(default = "default_favorite_weight")]
    pub favorite_weight: f64,
    /// How far a `love_it` review pulls an existing baseline. Default: 0.4.
    #[serde(default = "default_love_it_nudge")]
    pub love_it_nudge: f64,
    /// How far a `like_it` review pulls an existing baseline. Default: 0.3.
    #[serde(default = "default_like_it_nudge")]
    pub like_it_nudge: f64,
}

fn default_agree_weight() -> f64 {
    1.0
}
fn default_disagree_weight() -> f64 {
    -0.6
}
fn default_vote_score_divisor() -> f64 {
    10.0
}
fn default_weighted_score_min() -> f64 {
    0.4
}
fn default_weighted_score_max() -> f64 {
    1.5
}
fn default_credibility_scale() -> f64 {
    0.5
}
fn default_credibility_min() -> f64 {
    0.5
}
fn default_credibility_max() -> f64 {
    1.5
}
fn default_user_weight_cap() -> f64 {
    0.7
}
fn default_confidence_review_count() -> u32 {
    5
}
fn default_rating_share() -> f64 {
    0.4
}
fn default_neutral_score() -> f64 {
    5.0
}
fn default_favorite_weight() -> f64 {
    1.5
}
fn default_love_it_nudge() -> f64 {
    0.4
}
fn default_like_it_nudge() -> f64 {
    0.3
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            agree_weight: default_agree_weight(),
            disagree_weight: default_disagree_weight(),
            vote_score_divisor: default_vote_score_divisor(),
            weighted_score_min: default_weighted_score_min(),
            weighted_score_max: default_weighted_score_max(),
            credibility_scale: default_credibility_scale(),
            credibility_min: default_credibility_min(),
            credibility_max: default_credibility_max(),
            user_weight_cap: default_user_weight_cap(),
            confidence_review_count: default_confidence_review_count(),
            rating_share: default_rating_share(),
            neutral_score: default_neutral_score(),
            favorite_weight: default_favorite_weight(),
            love_it_nudge: default_love_it_nudge(),
            like_it_nudge: default_like_it_nudge(),
        }
    }
}

impl ScoringConfig {
    /// Baseline nudge weight for a rating, or `None` when the rating is not favorable.
    pub fn baseline_nudge_weight(&self, rating: ReviewRating) -> Option<f64> {
        match rating {
            ReviewRating::LoveIt => Some(self.love_it_nudge),
            ReviewRating::LikeIt => Some(self.like_it_nudge),
            ReviewRating::Meh | ReviewRating::HateIt => None,
        }
    }
}
