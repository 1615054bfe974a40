pub mod catalog;
pub mod preferences;
pub mod ratings;
pub mod reviews;
pub mod users;
pub mod votes;

use sea_orm::sea_query::LockType;
use sea_orm::{ConnectionTrait, DbErr, EntityTrait, QuerySelect, SqlErr};

use crate::entity::{item, review, user};
use crate::error::{EngineError, EngineResult};

/// True when `err` is a unique-key violation, e.g. an insert that lost a race
/// with a concurrent writer of the same key.
pub fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

/// Look up an item by ID.
pub async fn find_item<C: ConnectionTrait>(conn: &C, id: i32) -> EngineResult<item::Model> {
    item::Entity::find_by_id(id)
        .one(conn)
        .await?
        .ok_or(EngineError::ItemNotFound(id))
}

/// Look up an item by ID with a FOR UPDATE lock.
pub async fn find_item_for_update<C: ConnectionTrait>(
    conn: &C,
    id: i32,
) -> EngineResult<item::Model> {
    item::Entity::find_by_id(id)
        .lock(LockType::Update)
        .one(conn)
        .await?
        .ok_or(EngineError::ItemNotFound(id))
}

/// Look up a review by ID with a FOR UPDATE lock.
pub async fn find_review_for_update<C: ConnectionTrait>(
    conn: &C,
    id: i32,
) -> EngineResult<review::Model> {
    review::Entity::find_by_id(id)
        .lock(LockType::Update)
        .one(conn)
        .await?
        .ok_or(EngineError::ReviewNotFound(id))
}

/// Look up a user by ID.
pub async fn find_user<C: ConnectionTrait>(conn: &C, id: i32) -> EngineResult<user::Model> {
    user::Entity::find_by_id(id)
        .one(conn)
        .await?
        .ok_or(EngineError::UserNotFound(id))
}

/// Look up a user by ID with a FOR UPDATE lock.
pub async fn find_user_for_update<C: ConnectionTrait>(
    conn: &C,
    id: i32,
) -> EngineResult<user::Model> {
    user::Entity::find_by_id(id)
        .lock(LockType::Update)
        .one(conn)
        .await?
        .ok_or(EngineError::UserNotFound(id))
}
