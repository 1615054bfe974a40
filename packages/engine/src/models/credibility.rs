use common::CredibilityBadge;
use serde::Serialize;

use crate::entity::user;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CredibilitySummary {
    pub score: f64,
    pub total_agrees: i32,
    pub total_disagrees: i32,
    pub review_count: i32,
    pub badge: CredibilityBadge,
}

impl From<&user::Model> for CredibilitySummary {
    fn from(user: &user::Model) -> Self {
        Self {
            score: user.credibility_score,
            total_agrees: user.total_agrees,
            total_disagrees: user.total_disagrees,
            review_count: user.review_count,
            badge: CredibilityBadge::from_score(user.credibility_score),
        }
    }
}
