use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, Set,
};
use tracing::{debug, info, instrument};

use super::{find_item, find_user, is_unique_violation};
use crate::entity::{favorite, user};
use crate::error::{EngineError, EngineResult};

/// Register a reviewer with neutral credibility and no baseline.
#[instrument(skip(conn))]
pub async fn create_user<C: ConnectionTrait>(conn: &C, username: &str) -> EngineResult<user::Model> {
    let taken = user::Entity::find()
        .filter(user::Column::Username.eq(username))
        .one(conn)
        .await?;
    if taken.is_some() {
        return Err(EngineError::UsernameTaken(username.to_string()));
    }

    let now = Utc::now();
    let model = user::ActiveModel {
        username: Set(username.to_string()),
        credibility_score: Set(1.0),
        total_agrees: Set(0),
        total_disagrees: Set(0),
        review_count: Set(0),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(conn)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            debug!(username, "Username claimed concurrently, unique key caught on insert");
            EngineError::UsernameTaken(username.to_string())
        } else {
            EngineError::from(e)
        }
    })?;

    info!(user_id = model.id, "User created");
    Ok(model)
}

/// Mark an item as a favorite. Returns `false` if it already was one.
#[instrument(skip(conn))]
pub async fn add_favorite<C: ConnectionTrait>(
    conn: &C,
    user_id: i32,
    item_id: i32,
) -> EngineResult<bool> {
    find_user(conn, user_id).await?;
    find_item(conn, item_id).await?;

    let result = favorite::Entity::insert(favorite::ActiveModel {
        user_id: Set(user_id),
        item_id: Set(item_id),
        created_at: Set(Utc::now()),
    })
    .on_conflict(
        OnConflict::columns([favorite::Column::UserId, favorite::Column::ItemId])
            .do_nothing()
            .to_owned(),
    )
    .exec_without_returning(conn)
    .await;

    match result {
        Ok(0) | Err(DbErr::RecordNotInserted) => Ok(false),
        Ok(_) => {
            info!(user_id, item_id, "Favorite added");
            Ok(true)
        }
        Err(e) => Err(e.into()),
    }
}

/// Returns `false` if the item was not a favorite.
#[instrument(skip(conn))]
pub async fn remove_favorite<C: ConnectionTrait>(
    conn: &C,
    user_id: i32,
    item_id: i32,
) -> EngineResult<bool> {
    let result = favorite::Entity::delete_many()
        .filter(favorite::Column::UserId.eq(user_id))
        .filter(favorite::Column::ItemId.eq(item_id))
        .exec(conn)
        .await?;

    Ok(result.rows_affected > 0)
}
