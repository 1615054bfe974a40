use common::AttributeVector;
use sea_orm::Set;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub username: String,

    /// Reputation multiplier within [0.5, 1.5].
    pub credibility_score: f64,
    /// Lifetime counters of votes received on this user's reviews.
    #[sea_orm(default_value = 0)]
    pub total_agrees: i32,
    #[sea_orm(default_value = 0)]
    pub total_disagrees: i32,
    #[sea_orm(default_value = 0)]
    pub review_count: i32,

    // Either all five are set or none are.
    pub baseline_size: Option<f64>,
    pub baseline_body: Option<f64>,
    pub baseline_sweet_brininess: Option<f64>,
    pub baseline_flavorfulness: Option<f64>,
    pub baseline_creaminess: Option<f64>,

    #[sea_orm(has_many)]
    pub reviews: HasMany<super::review::Entity>,

    #[sea_orm(has_many, via = "favorite")]
    pub favorites: HasMany<super::item::Entity>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// The explicit baseline, only if all five fields are set.
    pub fn baseline(&self) -> Option<AttributeVector> {
        Some(AttributeVector {
            size: self.baseline_size?,
            body: self.baseline_body?,
            sweet_brininess: self.baseline_sweet_brininess?,
            flavorfulness: self.baseline_flavorfulness?,
            creaminess: self.baseline_creaminess?,
        })
    }
}

/// Write all five baseline fields of `active` at once.
pub fn set_baseline(active: &mut ActiveModel, baseline: &AttributeVector) {
    active.baseline_size = Set(Some(baseline.size));
    active.baseline_body = Set(Some(baseline.body));
    active.baseline_sweet_brininess = Set(Some(baseline.sweet_brininess));
    active.baseline_flavorfulness = Set(Some(baseline.flavorfulness));
    active.baseline_creaminess = Set(Some(baseline.creaminess));
}
