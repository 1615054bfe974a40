use common::{PartialAttributes, ReviewRating};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "review")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique_key = "user_item")]
    pub item_id: i32,
    #[sea_orm(belongs_to, from = "item_id", to = "id")]
    pub item: HasOne<super::item::Entity>,

    /// NULL for anonymous reviews.
    #[sea_orm(unique_key = "user_item")]
    pub user_id: Option<i32>,
    #[sea_orm(belongs_to, from = "user_id", to = "id")]
    pub user: Option<super::user::Entity>,

    pub rating: ReviewRating,

    pub size: Option<f64>,
    pub body: Option<f64>,
    pub sweet_brininess: Option<f64>,
    pub flavorfulness: Option<f64>,
    pub creaminess: Option<f64>,

    #[sea_orm(column_type = "Text", nullable)]
    pub notes: Option<String>,

    #[sea_orm(default_value = 0)]
    pub agree_count: i32,
    #[sea_orm(default_value = 0)]
    pub disagree_count: i32,
    pub net_vote_score: f64,
    /// Vote-derived influence multiplier, within [0.4, 1.5].
    pub weighted_score: f64,

    #[sea_orm(has_many)]
    pub votes: HasMany<super::vote::Entity>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn attributes(&self) -> PartialAttributes {
        PartialAttributes {
            size: self.size,
            body: self.body,
            sweet_brininess: self.sweet_brininess,
            flavorfulness: self.flavorfulness,
            creaminess: self.creaminess,
        }
    }
}
