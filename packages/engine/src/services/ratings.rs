use std::collections::{BTreeSet, HashMap};

use chrono::Utc;
use common::scoring::{self, ItemAggregate, ReviewSample};
use common::ScoringConfig;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionSession, TransactionTrait,
};
use tracing::{info, instrument, warn};

use super::find_item_for_update;
use crate::entity::{item, review, user};
use crate::error::{EngineError, EngineResult};

/// Re-derives each item's canonical score from its seed data and reviews.
pub struct RatingAggregator<'a, C> {
    conn: &'a C,
    scoring: &'a ScoringConfig,
}

impl<'a, C: ConnectionTrait + TransactionTrait> RatingAggregator<'a, C> {
    pub fn new(conn: &'a C, scoring: &'a ScoringConfig) -> Self {
        Self { conn, scoring }
    }

    /// Full recompute of one item's aggregates. Idempotent.
    #[instrument(skip(self))]
    pub async fn recalculate_item_rating(&self, item_id: i32) -> EngineResult<ItemAggregate> {
        let txn = self.conn.begin().await?;
        let item = find_item_for_update(&txn, item_id).await?;

        let reviews = review::Entity::find()
            .filter(review::Column::ItemId.eq(item_id))
            .order_by_asc(review::Column::Id)
            .all(&txn)
            .await?;
        let credibility = author_credibility(&txn, &reviews).await?;

        let samples: Vec<ReviewSample> = reviews
            .iter()
            .map(|r| ReviewSample {
                rating: r.rating,
                attributes: r.attributes(),
                weighted_score: r.weighted_score,
                credibility: r
                    .user_id
                    .and_then(|id| credibility.get(&id).copied())
                    .unwrap_or(1.0),
            })
            .collect();

        let aggregate = scoring::aggregate_item(self.scoring, &item.seed_attributes(), &samples);

        let mut active: item::ActiveModel = item.into();
        active.review_count = Set(i32::try_from(aggregate.review_count).unwrap_or(i32::MAX));
        item::set_aggregated(&mut active, &aggregate.attributes);
        active.avg_rating = Set(aggregate.avg_rating);
        active.overall_score = Set(aggregate.overall_score);
        active.updated_at = Set(Utc::now());
        active.update(&txn).await?;

        txn.commit().await?;

        info!(
            item_id,
            review_count = aggregate.review_count,
            overall_score = aggregate.overall_score,
            "Item rating recalculated"
        );
        Ok(aggregate)
    }

    /// Recompute every item, in id order. Returns the number of items processed.
    #[instrument(skip(self))]
    pub async fn recalculate_all_ratings(&self) -> EngineResult<usize> {
        let ids: Vec<i32> = item::Entity::find()
            .select_only()
            .column(item::Column::Id)
            .order_by_asc(item::Column::Id)
            .into_tuple()
            .all(self.conn)
            .await?;

        let mut processed = 0;
        for id in ids {
            match self.recalculate_item_rating(id).await {
                Ok(_) => processed += 1,
                // Removed since the id list was read
                Err(EngineError::ItemNotFound(_)) => {
                    warn!(item_id = id, "Item disappeared during backfill, skipping");
                }
                Err(e) => return Err(e),
            }
        }

        info!(items = processed, "Recalculated all item ratings");
        Ok(processed)
    }
}

/// Credibility of every author among `reviews`, keyed by user id.
async fn author_credibility<C: ConnectionTrait>(
    conn: &C,
    reviews: &[review::Model],
) -> EngineResult<HashMap<i32, f64>> {
    let author_ids: BTreeSet<i32> = reviews.iter().filter_map(|r| r.user_id).collect();
    if author_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let rows: Vec<(i32, f64)> = user::Entity::find()
        .filter(user::Column::Id.is_in(author_ids))
        .select_only()
        .column(user::Column::Id)
        .column(user::Column::CredibilityScore)
        .into_tuple()
        .all(conn)
        .await?;

    Ok(rows.into_iter().collect())
}
