use chrono::Utc;
use common::{PartialAttributes, ScoringConfig, scoring};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set,
    TransactionSession, TransactionTrait,
};
use tracing::{debug, info, instrument};

use super::{find_item, find_review_for_update, find_user_for_update, is_unique_violation};
use crate::entity::{review, user, vote};
use crate::error::{EngineError, EngineResult};
use crate::models::review::{NewReview, ReviewEdit, ReviewUpdate};

/// Transactional review writes. Follow-up recomputes are the caller's job.
pub struct ReviewService<'a, C> {
    conn: &'a C,
    scoring: &'a ScoringConfig,
}

impl<'a, C: ConnectionTrait + TransactionTrait> ReviewService<'a, C> {
    pub fn new(conn: &'a C, scoring: &'a ScoringConfig) -> Self {
        Self { conn, scoring }
    }

    /// Insert a review with neutral vote state and bump the author's review count.
    #[instrument(skip(self, new_review), fields(item_id = new_review.item_id, user_id = ?new_review.user_id))]
    pub async fn submit_review(&self, new_review: NewReview) -> EngineResult<review::Model> {
        new_review.attributes.validate()?;

        let txn = self.conn.begin().await?;
        find_item(&txn, new_review.item_id).await?;

        if let Some(user_id) = new_review.user_id {
            let author = find_user_for_update(&txn, user_id).await?;
            let duplicate = review::Entity::find()
                .filter(review::Column::UserId.eq(user_id))
                .filter(review::Column::ItemId.eq(new_review.item_id))
                .one(&txn)
                .await?;
            if duplicate.is_some() {
                return Err(EngineError::DuplicateReview {
                    user_id,
                    item_id: new_review.item_id,
                });
            }
            adjust_review_count(&txn, author, 1).await?;
        }

        let now = Utc::now();
        let mut active = review::ActiveModel {
            item_id: Set(new_review.item_id),
            user_id: Set(new_review.user_id),
            rating: Set(new_review.rating),
            notes: Set(new_review.notes),
            agree_count: Set(0),
            disagree_count: Set(0),
            net_vote_score: Set(0.0),
            weighted_score: Set(scoring::weighted_score(self.scoring, 0.0)),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };
        set_attributes(&mut active, &new_review.attributes, true);
        let model = active.insert(&txn).await.map_err(|e| match new_review.user_id {
            Some(user_id) if is_unique_violation(&e) => {
                debug!(user_id, "Duplicate review caught on insert");
                EngineError::DuplicateReview {
                    user_id,
                    item_id: new_review.item_id,
                }
            }
            _ => EngineError::from(e),
        })?;

        txn.commit().await?;

        info!(review_id = model.id, rating = %model.rating, "Review submitted");
        Ok(model)
    }

    /// Owner edit of rating, attributes or notes.
    #[instrument(skip(self, update))]
    pub async fn update_review(
        &self,
        review_id: i32,
        editor_id: i32,
        update: ReviewUpdate,
    ) -> EngineResult<ReviewEdit> {
        update.attributes.validate()?;

        let txn = self.conn.begin().await?;
        let existing = find_review_for_update(&txn, review_id).await?;
        require_owner(&existing, editor_id)?;

        let previous = existing.attributes();
        let changed_attributes = PartialAttributes::from_fn(|a| {
            update
                .attributes
                .get(a)
                .filter(|&value| previous.get(a) != Some(value))
        });
        let rating_changed = update.rating.is_some_and(|r| r != existing.rating);

        let mut active: review::ActiveModel = existing.into();
        if let Some(rating) = update.rating {
            active.rating = Set(rating);
        }
        set_attributes(&mut active, &update.attributes, false);
        if let Some(notes) = update.notes {
            active.notes = Set(notes);
        }
        active.updated_at = Set(Utc::now());

        let model = active.update(&txn).await?;
        txn.commit().await?;

        info!(review_id, rating_changed, "Review updated");
        Ok(ReviewEdit {
            review: model,
            changed_attributes,
            rating_changed,
        })
    }

    /// Delete a review with its votes. Lifetime vote counters of the author are kept.
    #[instrument(skip(self))]
    pub async fn delete_review(&self, review_id: i32, editor_id: i32) -> EngineResult<review::Model> {
        let txn = self.conn.begin().await?;
        let existing = find_review_for_update(&txn, review_id).await?;
        require_owner(&existing, editor_id)?;

        vote::Entity::delete_many()
            .filter(vote::Column::ReviewId.eq(review_id))
            .exec(&txn)
            .await?;
        review::Entity::delete_by_id(review_id).exec(&txn).await?;

        let author = find_user_for_update(&txn, editor_id).await?;
        adjust_review_count(&txn, author, -1).await?;

        txn.commit().await?;

        info!(review_id, item_id = existing.item_id, "Review deleted");
        Ok(existing)
    }
}

fn require_owner(review: &review::Model, editor_id: i32) -> EngineResult<()> {
    if review.user_id == Some(editor_id) {
        Ok(())
    } else {
        Err(EngineError::NotReviewOwner {
            editor_id,
            review_id: review.id,
        })
    }
}

/// Write review attributes. With `overwrite_missing`, absent attributes are stored as NULL;
/// otherwise they are left untouched.
fn set_attributes(
    active: &mut review::ActiveModel,
    attributes: &PartialAttributes,
    overwrite_missing: bool,
) {
    let fields = [
        (&mut active.size, attributes.size),
        (&mut active.body, attributes.body),
        (&mut active.sweet_brininess, attributes.sweet_brininess),
        (&mut active.flavorfulness, attributes.flavorfulness),
        (&mut active.creaminess, attributes.creaminess),
    ];
    for (field, value) in fields {
        if value.is_some() || overwrite_missing {
            *field = Set(value);
        }
    }
}

/// Shift a user's review count by `delta`, never below zero.
pub(crate) async fn adjust_review_count<C: ConnectionTrait>(
    conn: &C,
    user: user::Model,
    delta: i32,
) -> EngineResult<user::Model> {
    let review_count = user.review_count.saturating_add(delta).max(0);
    let mut active: user::ActiveModel = user.into();
    active.review_count = Set(review_count);
    active.updated_at = Set(Utc::now());
    Ok(active.update(conn).await?)
}
