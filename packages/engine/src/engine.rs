use std::collections::HashMap;
use std::sync::Arc;

use common::scoring::ItemAggregate;
use common::{AttributeVector, PartialAttributes, ReviewRating, ScoringConfig};
use sea_orm::DatabaseConnection;
use tracing::{info, instrument};

use crate::cache::{InMemoryRecommendationCache, RecommendationCache};
use crate::config::AppConfig;
use crate::entity::{review, user};
use crate::error::EngineResult;
use crate::models::catalog::{CatalogEntry, ImportSummary};
use crate::models::credibility::CredibilitySummary;
use crate::models::preference::PreferenceVector;
use crate::models::recommendation::Recommendation;
use crate::models::review::{NewReview, ReviewUpdate};
use crate::models::vote::{VoteChange, VoteOutcome};
use crate::services::catalog;
use crate::services::preferences::PreferenceEngine;
use crate::services::ratings::RatingAggregator;
use crate::services::reviews::ReviewService;
use crate::services::users;
use crate::services::votes::{self, VoteLedger};

/// Entry point for every rating and recommendation operation.
///
/// Each mutation commits its own transaction and then runs the follow-up
/// recomputes in order: review weight and author credibility, item rating,
/// then cache invalidation.
#[derive(Clone)]
pub struct Engine {
    db: DatabaseConnection,
    scoring: ScoringConfig,
    cache: Arc<dyn RecommendationCache>,
}

impl Engine {
    pub fn new(
        db: DatabaseConnection,
        scoring: ScoringConfig,
        cache: Arc<dyn RecommendationCache>,
    ) -> Self {
        Self { db, scoring, cache }
    }

    /// Engine with the in-memory cache sized from `config`.
    pub fn from_config(db: DatabaseConnection, config: &AppConfig) -> Self {
        let cache = Arc::new(InMemoryRecommendationCache::new(config.cache.ttl()));
        Self::new(db, config.scoring.clone(), cache)
    }

    pub fn votes(&self) -> VoteLedger<'_, DatabaseConnection> {
        VoteLedger::new(&self.db, &self.scoring)
    }

    pub fn ratings(&self) -> RatingAggregator<'_, DatabaseConnection> {
        RatingAggregator::new(&self.db, &self.scoring)
    }

    pub fn preferences(&self) -> PreferenceEngine<'_, DatabaseConnection> {
        PreferenceEngine::new(&self.db, &self.scoring, self.cache.as_ref())
    }

    pub fn reviews(&self) -> ReviewService<'_, DatabaseConnection> {
        ReviewService::new(&self.db, &self.scoring)
    }

    // Votes

    /// Vote-driven score changes leave cached recommendations in place.
    pub async fn cast_vote(
        &self,
        voter_id: i32,
        review_id: i32,
        is_agree: bool,
    ) -> EngineResult<VoteOutcome> {
        let outcome = self.votes().cast_vote(voter_id, review_id, is_agree).await?;
        if outcome.change != VoteChange::Unchanged {
            self.recalculate_item_rating(outcome.item_id).await?;
        }
        Ok(outcome)
    }

    pub async fn remove_vote(&self, voter_id: i32, review_id: i32) -> EngineResult<VoteOutcome> {
        let outcome = self.votes().remove_vote(voter_id, review_id).await?;
        self.recalculate_item_rating(outcome.item_id).await?;
        Ok(outcome)
    }

    pub async fn votes_for_reviews(
        &self,
        user_id: i32,
        review_ids: &[i32],
    ) -> EngineResult<HashMap<i32, Option<bool>>> {
        self.votes().votes_for_reviews(user_id, review_ids).await
    }

    pub async fn credibility(&self, user_id: i32) -> EngineResult<CredibilitySummary> {
        self.votes().credibility(user_id).await
    }

    // Ratings

    pub async fn recalculate_item_rating(&self, item_id: i32) -> EngineResult<ItemAggregate> {
        self.ratings().recalculate_item_rating(item_id).await
    }

    pub async fn recalculate_all_ratings(&self) -> EngineResult<usize> {
        self.ratings().recalculate_all_ratings().await
    }

    // Preferences

    pub async fn preference_vector(&self, user_id: i32) -> EngineResult<Option<PreferenceVector>> {
        self.preferences().preference_vector(user_id).await
    }

    pub async fn set_baseline(&self, user_id: i32, baseline: AttributeVector) -> EngineResult<()> {
        self.preferences().set_baseline(user_id, baseline).await
    }

    pub async fn apply_review_to_baseline(
        &self,
        user_id: i32,
        rating: ReviewRating,
        attributes: &PartialAttributes,
    ) -> EngineResult<bool> {
        self.preferences()
            .apply_review_to_baseline(user_id, rating, attributes)
            .await
    }

    pub async fn recommend(&self, user_id: i32, limit: usize) -> EngineResult<Vec<Recommendation>> {
        self.preferences().recommend(user_id, limit).await
    }

    pub fn invalidate_cache(&self, user_id: i32) {
        self.preferences().invalidate_cache(user_id);
    }

    // Reviews

    pub async fn submit_review(&self, new_review: NewReview) -> EngineResult<review::Model> {
        let model = self.reviews().submit_review(new_review).await?;
        let signal = model.attributes();
        self.after_review_write(&model, Some(&signal)).await?;
        Ok(model)
    }

    /// A changed tier re-applies the whole review at the new tier's weight;
    /// otherwise only attributes whose value changed feed the baseline.
    pub async fn update_review(
        &self,
        review_id: i32,
        editor_id: i32,
        update: ReviewUpdate,
    ) -> EngineResult<review::Model> {
        let edit = self
            .reviews()
            .update_review(review_id, editor_id, update)
            .await?;

        let signal = if edit.rating_changed {
            Some(edit.review.attributes())
        } else if !edit.changed_attributes.is_empty() {
            Some(edit.changed_attributes)
        } else {
            None
        };
        self.after_review_write(&edit.review, signal.as_ref()).await?;
        Ok(edit.review)
    }

    pub async fn delete_review(&self, review_id: i32, editor_id: i32) -> EngineResult<review::Model> {
        let model = self.reviews().delete_review(review_id, editor_id).await?;
        votes::recalculate_user_credibility(&self.db, &self.scoring, editor_id).await?;
        self.recalculate_item_rating(model.item_id).await?;
        self.invalidate_cache(editor_id);
        Ok(model)
    }

    async fn after_review_write(
        &self,
        review: &review::Model,
        baseline_signal: Option<&PartialAttributes>,
    ) -> EngineResult<()> {
        if let Some(author_id) = review.user_id {
            votes::recalculate_user_credibility(&self.db, &self.scoring, author_id).await?;
        }
        self.recalculate_item_rating(review.item_id).await?;

        if let Some(author_id) = review.user_id {
            if let Some(attributes) = baseline_signal {
                self.apply_review_to_baseline(author_id, review.rating, attributes)
                    .await?;
            }
            self.invalidate_cache(author_id);
        }
        Ok(())
    }

    // Users and favorites

    pub async fn create_user(&self, username: &str) -> EngineResult<user::Model> {
        users::create_user(&self.db, username).await
    }

    pub async fn add_favorite(&self, user_id: i32, item_id: i32) -> EngineResult<bool> {
        let added = users::add_favorite(&self.db, user_id, item_id).await?;
        self.invalidate_cache(user_id);
        Ok(added)
    }

    pub async fn remove_favorite(&self, user_id: i32, item_id: i32) -> EngineResult<bool> {
        let removed = users::remove_favorite(&self.db, user_id, item_id).await?;
        self.invalidate_cache(user_id);
        Ok(removed)
    }

    // Catalog

    #[instrument(skip_all)]
    pub async fn import_catalog(&self, entries: &[CatalogEntry]) -> EngineResult<ImportSummary> {
        let summary = catalog::import_catalog(&self.db, &self.scoring, entries).await?;
        for &item_id in &summary.updated_ids {
            self.recalculate_item_rating(item_id).await?;
        }
        if summary.inserted > 0 || !summary.updated_ids.is_empty() {
            self.cache.clear();
            info!("Recommendation cache cleared after catalog import");
        }
        Ok(summary)
    }

    pub async fn remove_item(&self, item_id: i32) -> EngineResult<Vec<i32>> {
        let authors = catalog::remove_item(&self.db, &self.scoring, item_id).await?;
        self.cache.clear();
        Ok(authors)
    }
}
