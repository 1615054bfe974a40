use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::Utc;
use common::{AttributeVector, PartialAttributes, ReviewRating, ScoringConfig, scoring};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use tracing::{debug, info, instrument};

use super::find_user;
use crate::cache::RecommendationCache;
use crate::entity::{favorite, item, review, user};
use crate::error::EngineResult;
use crate::models::preference::{PreferenceSource, PreferenceVector};
use crate::models::recommendation::{Recommendation, RecommendationReason};

/// Similarity (0-100) of an item's effective attributes to a preference vector.
pub fn item_similarity(item: &item::Model, preference: &AttributeVector) -> f64 {
    scoring::similarity(&item.effective_attributes(), preference)
}

/// Per-user taste profiles and the recommendations ranked from them.
pub struct PreferenceEngine<'a, C> {
    conn: &'a C,
    scoring: &'a ScoringConfig,
    cache: &'a dyn RecommendationCache,
}

impl<'a, C: ConnectionTrait> PreferenceEngine<'a, C> {
    pub fn new(
        conn: &'a C,
        scoring: &'a ScoringConfig,
        cache: &'a dyn RecommendationCache,
    ) -> Self {
        Self {
            conn,
            scoring,
            cache,
        }
    }

    /// Explicit baseline if complete, else a vector inferred from favorable
    /// reviews, else `None`.
    #[instrument(skip(self))]
    pub async fn preference_vector(&self, user_id: i32) -> EngineResult<Option<PreferenceVector>> {
        let user = find_user(self.conn, user_id).await?;
        if let Some(values) = user.baseline() {
            return Ok(Some(PreferenceVector {
                values,
                source: PreferenceSource::Baseline,
            }));
        }

        Ok(self
            .infer_from_reviews(user_id)
            .await?
            .map(|values| PreferenceVector {
                values,
                source: PreferenceSource::Inferred,
            }))
    }

    async fn infer_from_reviews(&self, user_id: i32) -> EngineResult<Option<AttributeVector>> {
        let reviews: Vec<review::Model> = review::Entity::find()
            .filter(review::Column::UserId.eq(user_id))
            .order_by_asc(review::Column::Id)
            .all(self.conn)
            .await?
            .into_iter()
            .filter(|r| r.rating.is_favorable())
            .collect();
        if reviews.is_empty() {
            return Ok(None);
        }

        let item_ids: Vec<i32> = reviews.iter().map(|r| r.item_id).collect();
        let items: HashMap<i32, item::Model> = item::Entity::find()
            .filter(item::Column::Id.is_in(item_ids))
            .all(self.conn)
            .await?
            .into_iter()
            .map(|i| (i.id, i))
            .collect();
        let favorites = self.favorite_item_ids(user_id).await?;

        Ok(scoring::weighted_centroid(reviews.iter().filter_map(|r| {
            let item = items.get(&r.item_id)?;
            let values = r
                .attributes()
                .or(item.aggregated_attributes())
                .resolve(&item.seed_attributes());
            let weight = if favorites.contains(&r.item_id) {
                self.scoring.favorite_weight
            } else {
                1.0
            };
            Some((values, weight))
        })))
    }

    async fn favorite_item_ids(&self, user_id: i32) -> EngineResult<HashSet<i32>> {
        let ids: Vec<i32> = favorite::Entity::find()
            .filter(favorite::Column::UserId.eq(user_id))
            .select_only()
            .column(favorite::Column::ItemId)
            .into_tuple()
            .all(self.conn)
            .await?;
        Ok(ids.into_iter().collect())
    }

    /// Ranked recommendations, served from the cache when a fresh entry covers `limit`.
    #[instrument(skip(self))]
    pub async fn recommend(&self, user_id: i32, limit: usize) -> EngineResult<Vec<Recommendation>> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        if let Some(cached) = self.cache.get(user_id, limit) {
            debug!(user_id, limit, "Recommendation cache hit");
            return Ok(cached.as_ref().clone());
        }
        debug!(user_id, limit, "Recommendation cache miss");

        let ranked = match self.preference_vector(user_id).await? {
            None => self.top_rated(limit).await?,
            Some(preference) => self.rank_by_similarity(user_id, &preference, limit).await?,
        };

        self.cache.set(user_id, limit, Arc::new(ranked.clone()));
        Ok(ranked)
    }

    async fn top_rated(&self, limit: usize) -> EngineResult<Vec<Recommendation>> {
        let items = item::Entity::find()
            .filter(item::Column::ReviewCount.gte(1))
            .order_by_desc(item::Column::OverallScore)
            .order_by_asc(item::Column::Id)
            .limit(limit as u64)
            .all(self.conn)
            .await?;

        Ok(items
            .iter()
            .map(|i| Recommendation::new(i, None, RecommendationReason::TopRated))
            .collect())
    }

    async fn rank_by_similarity(
        &self,
        user_id: i32,
        preference: &PreferenceVector,
        limit: usize,
    ) -> EngineResult<Vec<Recommendation>> {
        let reviewed: HashSet<i32> = review::Entity::find()
            .filter(review::Column::UserId.eq(user_id))
            .select_only()
            .column(review::Column::ItemId)
            .into_tuple::<i32>()
            .all(self.conn)
            .await?
            .into_iter()
            .collect();

        let mut scored: Vec<(f64, item::Model)> = item::Entity::find()
            .order_by_asc(item::Column::Id)
            .all(self.conn)
            .await?
            .into_iter()
            .filter(|i| !reviewed.contains(&i.id))
            .map(|i| (item_similarity(&i, &preference.values), i))
            .collect();

        scored.sort_by(|(a, a_item), (b, b_item)| b.total_cmp(a).then(a_item.id.cmp(&b_item.id)));

        let reason = preference.reason();
        Ok(scored
            .iter()
            .take(limit)
            .map(|(score, i)| Recommendation::new(i, Some(*score), reason))
            .collect())
    }

    /// Overwrite all five baseline fields.
    #[instrument(skip(self))]
    pub async fn set_baseline(&self, user_id: i32, baseline: AttributeVector) -> EngineResult<()> {
        baseline.validate()?;
        let user = find_user(self.conn, user_id).await?;
        self.write_baseline(user, &baseline).await?;

        info!(user_id, "Baseline preferences set");
        Ok(())
    }

    /// Seed or nudge the baseline from a favorable review. Returns whether the
    /// baseline changed.
    #[instrument(skip(self, attributes))]
    pub async fn apply_review_to_baseline(
        &self,
        user_id: i32,
        rating: ReviewRating,
        attributes: &PartialAttributes,
    ) -> EngineResult<bool> {
        let Some(weight) = self.scoring.baseline_nudge_weight(rating) else {
            return Ok(false);
        };
        attributes.validate()?;

        let user = find_user(self.conn, user_id).await?;
        let next = match user.baseline() {
            Some(current) if attributes.is_empty() => {
                debug!(user_id, ?current, "Review carries no attributes, baseline kept");
                return Ok(false);
            }
            Some(current) => scoring::nudge_toward(&current, attributes, weight),
            None => match attributes.complete() {
                Some(seeded) => seeded,
                None => return Ok(false),
            },
        };

        self.write_baseline(user, &next).await?;
        info!(user_id, %rating, "Baseline updated from review");
        Ok(true)
    }

    async fn write_baseline(&self, user: user::Model, baseline: &AttributeVector) -> EngineResult<()> {
        let user_id = user.id;
        let mut active: user::ActiveModel = user.into();
        user::set_baseline(&mut active, baseline);
        active.updated_at = Set(Utc::now());
        active.update(self.conn).await?;

        self.invalidate_cache(user_id);
        Ok(())
    }

    pub fn invalidate_cache(&self, user_id: i32) {
        self.cache.invalidate(user_id);
        debug!(user_id, "Recommendation cache invalidated");
    }
}
