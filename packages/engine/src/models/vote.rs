use serde::Serialize;

/// What a vote mutation did to the stored state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteChange {
    Created,
    Flipped,
    Removed,
    /// Same polarity as the stored vote.
    Unchanged,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct VoteOutcome {
    pub change: VoteChange,
    pub review_id: i32,
    /// Item the review belongs to; its rating is stale after any change.
    pub item_id: i32,
    pub review_owner_id: Option<i32>,
    pub weighted_score: f64,
}
