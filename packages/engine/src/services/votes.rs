use std::collections::HashMap;

use chrono::Utc;
use common::{ScoringConfig, scoring};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set,
    TransactionSession, TransactionTrait,
};
use tracing::{debug, info, instrument};

use super::{find_review_for_update, find_user, find_user_for_update, is_unique_violation};
use crate::entity::{review, user, vote};
use crate::error::{EngineError, EngineResult};
use crate::models::credibility::CredibilitySummary;
use crate::models::vote::{VoteChange, VoteOutcome};

/// Signed change to the agree/disagree buckets of a review and its owner.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct CounterDelta {
    agree: i32,
    disagree: i32,
}

impl CounterDelta {
    fn added(is_agree: bool) -> Self {
        if is_agree {
            Self {
                agree: 1,
                disagree: 0,
            }
        } else {
            Self {
                agree: 0,
                disagree: 1,
            }
        }
    }

    fn removed(was_agree: bool) -> Self {
        let added = Self::added(was_agree);
        Self {
            agree: -added.agree,
            disagree: -added.disagree,
        }
    }

    fn flipped(to_agree: bool) -> Self {
        let added = Self::added(to_agree);
        let removed = Self::removed(!to_agree);
        Self {
            agree: added.agree + removed.agree,
            disagree: added.disagree + removed.disagree,
        }
    }
}

fn apply(count: i32, delta: i32) -> i32 {
    count.saturating_add(delta).max(0)
}

/// Agree/disagree votes on reviews and the credibility they feed.
pub struct VoteLedger<'a, C> {
    conn: &'a C,
    scoring: &'a ScoringConfig,
}

impl<'a, C: ConnectionTrait + TransactionTrait> VoteLedger<'a, C> {
    pub fn new(conn: &'a C, scoring: &'a ScoringConfig) -> Self {
        Self { conn, scoring }
    }

    /// Record or flip a vote. Casting the stored polarity again is a no-op.
    #[instrument(skip(self))]
    pub async fn cast_vote(
        &self,
        voter_id: i32,
        review_id: i32,
        is_agree: bool,
    ) -> EngineResult<VoteOutcome> {
        // A concurrent first vote by the same voter wins the unique key; the retry then sees it.
        for _ in 0..2 {
            if let Some(outcome) = self.try_cast_vote(voter_id, review_id, is_agree).await? {
                info!(
                    voter_id,
                    review_id,
                    is_agree,
                    change = ?outcome.change,
                    weighted_score = outcome.weighted_score,
                    "Vote recorded"
                );
                return Ok(outcome);
            }
            debug!(voter_id, review_id, "Vote inserted concurrently, retrying");
        }
        Err(EngineError::VoteConflict {
            voter_id,
            review_id,
        })
    }

    /// One attempt at `cast_vote`. `None` means the insert lost a race on the
    /// (voter, review) key and nothing was written.
    async fn try_cast_vote(
        &self,
        voter_id: i32,
        review_id: i32,
        is_agree: bool,
    ) -> EngineResult<Option<VoteOutcome>> {
        let txn = self.conn.begin().await?;
        let review = find_review_for_update(&txn, review_id).await?;
        if review.user_id == Some(voter_id) {
            return Err(EngineError::SelfVoteRejected);
        }
        find_user(&txn, voter_id).await?;

        let existing = find_vote(&txn, voter_id, review_id).await?;
        let now = Utc::now();

        let (change, delta) = match existing {
            Some(vote) if vote.is_agree == is_agree => {
                txn.rollback().await?;
                return Ok(Some(VoteOutcome {
                    change: VoteChange::Unchanged,
                    review_id,
                    item_id: review.item_id,
                    review_owner_id: review.user_id,
                    weighted_score: review.weighted_score,
                }));
            }
            Some(vote) => {
                let mut active: vote::ActiveModel = vote.into();
                active.is_agree = Set(is_agree);
                active.updated_at = Set(now);
                active.update(&txn).await?;
                (VoteChange::Flipped, CounterDelta::flipped(is_agree))
            }
            None => {
                let inserted = vote::ActiveModel {
                    voter_id: Set(voter_id),
                    review_id: Set(review_id),
                    is_agree: Set(is_agree),
                    created_at: Set(now),
                    updated_at: Set(now),
                    ..Default::default()
                }
                .insert(&txn)
                .await;
                match inserted {
                    Ok(_) => {}
                    Err(e) if is_unique_violation(&e) => {
                        txn.rollback().await?;
                        return Ok(None);
                    }
                    Err(e) => return Err(e.into()),
                }
                (VoteChange::Created, CounterDelta::added(is_agree))
            }
        };

        let outcome = apply_vote_delta(&txn, self.scoring, review, change, delta).await?;
        txn.commit().await?;
        Ok(Some(outcome))
    }

    /// Withdraw a vote and roll back the counters it contributed.
    #[instrument(skip(self))]
    pub async fn remove_vote(&self, voter_id: i32, review_id: i32) -> EngineResult<VoteOutcome> {
        let txn = self.conn.begin().await?;
        let review = find_review_for_update(&txn, review_id).await?;
        let existing = find_vote(&txn, voter_id, review_id)
            .await?
            .ok_or(EngineError::VoteNotFound {
                voter_id,
                review_id,
            })?;

        vote::Entity::delete_by_id(existing.id).exec(&txn).await?;
        let outcome = apply_vote_delta(
            &txn,
            self.scoring,
            review,
            VoteChange::Removed,
            CounterDelta::removed(existing.is_agree),
        )
        .await?;
        txn.commit().await?;

        info!(
            voter_id,
            review_id,
            weighted_score = outcome.weighted_score,
            "Vote removed"
        );
        Ok(outcome)
    }

    pub async fn recalculate_review_score(&self, review_id: i32) -> EngineResult<f64> {
        recalculate_review_score(self.conn, self.scoring, review_id).await
    }

    pub async fn recalculate_user_credibility(&self, user_id: i32) -> EngineResult<f64> {
        recalculate_user_credibility(self.conn, self.scoring, user_id).await
    }

    /// The caller's vote on each review: `Some(is_agree)`, or `None` when not voted.
    pub async fn votes_for_reviews(
        &self,
        user_id: i32,
        review_ids: &[i32],
    ) -> EngineResult<HashMap<i32, Option<bool>>> {
        let mut result: HashMap<i32, Option<bool>> =
            review_ids.iter().map(|&id| (id, None)).collect();
        if review_ids.is_empty() {
            return Ok(result);
        }

        let votes = vote::Entity::find()
            .filter(vote::Column::VoterId.eq(user_id))
            .filter(vote::Column::ReviewId.is_in(review_ids.iter().copied()))
            .all(self.conn)
            .await?;
        for vote in votes {
            result.insert(vote.review_id, Some(vote.is_agree));
        }
        Ok(result)
    }

    pub async fn credibility(&self, user_id: i32) -> EngineResult<CredibilitySummary> {
        let user = find_user(self.conn, user_id).await?;
        Ok(CredibilitySummary::from(&user))
    }
}

async fn find_vote<C: ConnectionTrait>(
    conn: &C,
    voter_id: i32,
    review_id: i32,
) -> EngineResult<Option<vote::Model>> {
    Ok(vote::Entity::find()
        .filter(vote::Column::VoterId.eq(voter_id))
        .filter(vote::Column::ReviewId.eq(review_id))
        .one(conn)
        .await?)
}

/// Apply `delta` to the review's and its owner's counters, then re-derive
/// the review's weight and the owner's credibility. Runs inside the caller's transaction.
async fn apply_vote_delta<C: ConnectionTrait>(
    conn: &C,
    scoring: &ScoringConfig,
    review: review::Model,
    change: VoteChange,
    delta: CounterDelta,
) -> EngineResult<VoteOutcome> {
    let review_id = review.id;
    let item_id = review.item_id;
    let owner_id = review.user_id;

    let agree_count = apply(review.agree_count, delta.agree);
    let disagree_count = apply(review.disagree_count, delta.disagree);
    let mut active: review::ActiveModel = review.into();
    active.agree_count = Set(agree_count);
    active.disagree_count = Set(disagree_count);
    active.update(conn).await?;

    if let Some(owner_id) = owner_id {
        let owner = find_user_for_update(conn, owner_id).await?;
        let total_agrees = apply(owner.total_agrees, delta.agree);
        let total_disagrees = apply(owner.total_disagrees, delta.disagree);
        let mut active: user::ActiveModel = owner.into();
        active.total_agrees = Set(total_agrees);
        active.total_disagrees = Set(total_disagrees);
        active.update(conn).await?;
    }

    let weighted_score = recalculate_review_score(conn, scoring, review_id).await?;
    if let Some(owner_id) = owner_id {
        recalculate_user_credibility(conn, scoring, owner_id).await?;
    }

    Ok(VoteOutcome {
        change,
        review_id,
        item_id,
        review_owner_id: owner_id,
        weighted_score,
    })
}

/// Re-derive a review's net vote score and weighted score from its counters.
pub async fn recalculate_review_score<C: ConnectionTrait>(
    conn: &C,
    scoring: &ScoringConfig,
    review_id: i32,
) -> EngineResult<f64> {
    let review = review::Entity::find_by_id(review_id)
        .one(conn)
        .await?
        .ok_or(EngineError::ReviewNotFound(review_id))?;

    let net = scoring::net_vote_score(scoring, review.agree_count, review.disagree_count);
    let weighted = scoring::weighted_score(scoring, net);

    let mut active: review::ActiveModel = review.into();
    active.net_vote_score = Set(net);
    active.weighted_score = Set(weighted);
    active.update(conn).await?;

    Ok(weighted)
}

/// Re-derive a user's credibility from lifetime votes received and review count.
pub async fn recalculate_user_credibility<C: ConnectionTrait>(
    conn: &C,
    scoring: &ScoringConfig,
    user_id: i32,
) -> EngineResult<f64> {
    let user = find_user(conn, user_id).await?;
    let credibility = scoring::credibility_score(
        scoring,
        user.total_agrees,
        user.total_disagrees,
        user.review_count,
    );

    let mut active: user::ActiveModel = user.into();
    active.credibility_score = Set(credibility);
    active.update(conn).await?;

    Ok(credibility)
}
