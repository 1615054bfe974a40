use std::collections::BTreeMap;

use chrono::Utc;
use common::ScoringConfig;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set,
    TransactionSession, TransactionTrait,
};
use tracing::{info, instrument};

use super::reviews::adjust_review_count;
use super::votes::recalculate_user_credibility;
use super::{find_item_for_update, find_user_for_update};
use crate::entity::{favorite, item, review, vote};
use crate::error::EngineResult;
use crate::models::catalog::{CatalogEntry, ImportSummary};

/// Upsert catalog items by name. Every entry is validated before anything is written.
///
/// Existing items get their descriptive fields and seed attributes replaced;
/// their aggregates are left for the caller to recompute (see
/// [`ImportSummary::updated_ids`]).
#[instrument(skip_all, fields(entries = entries.len()))]
pub async fn import_catalog<C: ConnectionTrait + TransactionTrait>(
    conn: &C,
    scoring: &ScoringConfig,
    entries: &[CatalogEntry],
) -> EngineResult<ImportSummary> {
    for entry in entries {
        entry.seed.validate()?;
    }

    let txn = conn.begin().await?;
    let mut summary = ImportSummary::default();
    let now = Utc::now();

    for entry in entries {
        let existing = item::Entity::find()
            .filter(item::Column::Name.eq(entry.name.as_str()))
            .one(&txn)
            .await?;

        match existing {
            Some(model) => {
                let id = model.id;
                let mut active: item::ActiveModel = model.into();
                active.species = Set(entry.species.clone());
                active.origin = Set(entry.origin.clone());
                item::set_seed(&mut active, &entry.seed);
                active.updated_at = Set(now);
                active.update(&txn).await?;
                summary.updated_ids.push(id);
            }
            None => {
                let mut active = item::ActiveModel {
                    name: Set(entry.name.clone()),
                    species: Set(entry.species.clone()),
                    origin: Set(entry.origin.clone()),
                    avg_size: Set(None),
                    avg_body: Set(None),
                    avg_sweet_brininess: Set(None),
                    avg_flavorfulness: Set(None),
                    avg_creaminess: Set(None),
                    avg_rating: Set(0.0),
                    overall_score: Set(scoring.neutral_score),
                    review_count: Set(0),
                    created_at: Set(now),
                    updated_at: Set(now),
                    ..Default::default()
                };
                item::set_seed(&mut active, &entry.seed);
                active.insert(&txn).await?;
                summary.inserted += 1;
            }
        }
    }

    txn.commit().await?;

    info!(
        inserted = summary.inserted,
        updated = summary.updated_ids.len(),
        "Catalog imported"
    );
    Ok(summary)
}

/// Delete an item together with its reviews, their votes and its favorites.
///
/// Authors lose one review each from their count and have credibility
/// re-derived in the same transaction. Returns the affected author ids.
#[instrument(skip(conn, scoring))]
pub async fn remove_item<C: ConnectionTrait + TransactionTrait>(
    conn: &C,
    scoring: &ScoringConfig,
    item_id: i32,
) -> EngineResult<Vec<i32>> {
    let txn = conn.begin().await?;
    find_item_for_update(&txn, item_id).await?;

    let reviews = review::Entity::find()
        .filter(review::Column::ItemId.eq(item_id))
        .all(&txn)
        .await?;
    let review_ids: Vec<i32> = reviews.iter().map(|r| r.id).collect();

    let mut removed_per_author: BTreeMap<i32, i32> = BTreeMap::new();
    for author_id in reviews.iter().filter_map(|r| r.user_id) {
        *removed_per_author.entry(author_id).or_default() += 1;
    }

    if !review_ids.is_empty() {
        vote::Entity::delete_many()
            .filter(vote::Column::ReviewId.is_in(review_ids.iter().copied()))
            .exec(&txn)
            .await?;
    }
    review::Entity::delete_many()
        .filter(review::Column::ItemId.eq(item_id))
        .exec(&txn)
        .await?;
    favorite::Entity::delete_many()
        .filter(favorite::Column::ItemId.eq(item_id))
        .exec(&txn)
        .await?;
    item::Entity::delete_by_id(item_id).exec(&txn).await?;

    for (&author_id, &removed) in &removed_per_author {
        let author = find_user_for_update(&txn, author_id).await?;
        adjust_review_count(&txn, author, -removed).await?;
        recalculate_user_credibility(&txn, scoring, author_id).await?;
    }

    txn.commit().await?;

    info!(
        item_id,
        reviews = review_ids.len(),
        authors = removed_per_author.len(),
        "Item removed"
    );
    Ok(removed_per_author.into_keys().collect())
}
