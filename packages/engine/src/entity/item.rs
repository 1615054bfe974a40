use common::{AttributeVector, PartialAttributes};
use sea_orm::Set;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "item")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub name: String,
    pub species: Option<String>,
    pub origin: Option<String>,

    // Curated catalog traits, 1-10.
    pub seed_size: f64,
    pub seed_body: f64,
    pub seed_sweet_brininess: f64,
    pub seed_flavorfulness: f64,
    pub seed_creaminess: f64,

    /// NULL until the first rating recompute.
    pub avg_size: Option<f64>,
    pub avg_body: Option<f64>,
    pub avg_sweet_brininess: Option<f64>,
    pub avg_flavorfulness: Option<f64>,
    pub avg_creaminess: Option<f64>,

    /// Trust-weighted mean of review tiers (1-4), 0 with no reviews.
    pub avg_rating: f64,
    #[sea_orm(indexed)]
    pub overall_score: f64,
    pub review_count: i32,

    #[sea_orm(has_many)]
    pub reviews: HasMany<super::review::Entity>,

    #[sea_orm(has_many, via = "favorite")]
    pub favorited_by: HasMany<super::user::Entity>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn seed_attributes(&self) -> AttributeVector {
        AttributeVector {
            size: self.seed_size,
            body: self.seed_body,
            sweet_brininess: self.seed_sweet_brininess,
            flavorfulness: self.seed_flavorfulness,
            creaminess: self.seed_creaminess,
        }
    }

    pub fn aggregated_attributes(&self) -> PartialAttributes {
        PartialAttributes {
            size: self.avg_size,
            body: self.avg_body,
            sweet_brininess: self.avg_sweet_brininess,
            flavorfulness: self.avg_flavorfulness,
            creaminess: self.avg_creaminess,
        }
    }

    /// Aggregated attributes where present, seed attributes otherwise.
    pub fn effective_attributes(&self) -> AttributeVector {
        self.aggregated_attributes().resolve(&self.seed_attributes())
    }
}

/// Write all five seed fields of `active`.
pub fn set_seed(active: &mut ActiveModel, seed: &AttributeVector) {
    active.seed_size = Set(seed.size);
    active.seed_body = Set(seed.body);
    active.seed_sweet_brininess = Set(seed.sweet_brininess);
    active.seed_flavorfulness = Set(seed.flavorfulness);
    active.seed_creaminess = Set(seed.creaminess);
}

/// Write all five aggregated fields of `active`.
pub fn set_aggregated(active: &mut ActiveModel, aggregated: &AttributeVector) {
    active.avg_size = Set(Some(aggregated.size));
    active.avg_body = Set(Some(aggregated.body));
    active.avg_sweet_brininess = Set(Some(aggregated.sweet_brininess));
    active.avg_flavorfulness = Set(Some(aggregated.flavorfulness));
    active.avg_creaminess = Set(Some(aggregated.creaminess));
}
