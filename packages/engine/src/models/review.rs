use common::{PartialAttributes, ReviewRating};
use serde::Deserialize;

use crate::entity::review;

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct NewReview {
    pub item_id: i32,
    /// `None` for an anonymous review.
    pub user_id: Option<i32>,
    pub rating: ReviewRating,
    #[serde(default)]
    pub attributes: PartialAttributes,
    pub notes: Option<String>,
}

/// Owner edit. Absent fields are left unchanged.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct ReviewUpdate {
    pub rating: Option<ReviewRating>,
    /// Attributes present here replace the stored values; absent ones are kept.
    #[serde(default)]
    pub attributes: PartialAttributes,
    #[serde(default, deserialize_with = "double_option")]
    pub notes: Option<Option<String>>,
}

/// Result of an owner edit.
#[derive(Clone, Debug, PartialEq)]
pub struct ReviewEdit {
    pub review: review::Model,
    /// Attributes whose stored value differs from before the edit.
    pub changed_attributes: PartialAttributes,
    pub rating_changed: bool,
}

/// Serde helper for PATCH semantics on nullable fields.
///
/// * field absent  => `None`          (don't update)
/// * field = null  => `Some(None)`    (set to NULL)
/// * field = value => `Some(Some(v))` (set to value)
fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Some(Option::deserialize(deserializer)?))
}
