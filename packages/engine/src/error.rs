use common::AttributeError;
use sea_orm::DbErr;
use thiserror::Error;

/// Errors surfaced by the rating engine.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Item {0} not found")]
    ItemNotFound(i32),

    #[error("Review {0} not found")]
    ReviewNotFound(i32),

    #[error("User {0} not found")]
    UserNotFound(i32),

    #[error("User {voter_id} has no vote on review {review_id}")]
    VoteNotFound { voter_id: i32, review_id: i32 },

    /// The vote kept changing under concurrent writers of the same key.
    #[error("Vote by user {voter_id} on review {review_id} conflicted with a concurrent write")]
    VoteConflict { voter_id: i32, review_id: i32 },

    /// The voter owns the review. A rejected request, not an internal fault.
    #[error("Users cannot vote on their own reviews")]
    SelfVoteRejected,

    /// Raised before any write.
    #[error("Invalid attribute range: {0}")]
    InvalidAttributeRange(#[from] AttributeError),

    #[error("User {user_id} has already reviewed item {item_id}")]
    DuplicateReview { user_id: i32, item_id: i32 },

    #[error("User {editor_id} does not own review {review_id}")]
    NotReviewOwner { editor_id: i32, review_id: i32 },

    #[error("Username '{0}' is already taken")]
    UsernameTaken(String),

    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl EngineError {
    /// True for any of the missing-entity variants.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::ItemNotFound(_)
                | Self::ReviewNotFound(_)
                | Self::UserNotFound(_)
                | Self::VoteNotFound { .. }
        )
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
