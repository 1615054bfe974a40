use common::{CredibilityBadge, PartialAttributes, ReviewRating};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, Set};

use oyster_engine::EngineError;
use oyster_engine::entity::{review, user, vote};
use oyster_engine::models::vote::VoteChange;
use oyster_engine::services::is_unique_violation;

use crate::common::{TestApp, assert_close, uniform};

/// An item with one review by `author`, plus a separate voter.
async fn reviewed_item(app: &TestApp) -> (i32, i32, i32) {
    let author = app.create_user("author").await;
    let voter = app.create_user("voter").await;
    let item = app.create_item("Kumamoto", uniform(5.0)).await;
    let review = app
        .submit_review(
            Some(author),
            item,
            ReviewRating::LikeIt,
            PartialAttributes::default(),
        )
        .await;
    (author, voter, review.id)
}

mod casting {
    use super::*;

    #[tokio::test]
    async fn first_vote_increments_review_and_owner_counters() {
        let app = TestApp::spawn().await;
        let (author, voter, review_id) = reviewed_item(&app).await;

        let outcome = app.engine.cast_vote(voter, review_id, true).await.unwrap();
        assert_eq!(outcome.change, VoteChange::Created);
        assert_eq!(outcome.review_owner_id, Some(author));
        assert_close(outcome.weighted_score, 1.1);

        let review = app.review(review_id).await;
        assert_eq!((review.agree_count, review.disagree_count), (1, 0));
        assert_close(review.net_vote_score, 1.0);

        let owner = app.user(author).await;
        assert_eq!((owner.total_agrees, owner.total_disagrees), (1, 0));
        assert_close(owner.credibility_score, 1.5);
    }

    #[tokio::test]
    async fn same_vote_twice_is_idempotent() {
        let app = TestApp::spawn().await;
        let (author, voter, review_id) = reviewed_item(&app).await;

        app.engine.cast_vote(voter, review_id, false).await.unwrap();
        let review_before = app.review(review_id).await;
        let owner_before = app.user(author).await;

        let outcome = app.engine.cast_vote(voter, review_id, false).await.unwrap();
        assert_eq!(outcome.change, VoteChange::Unchanged);
        assert_eq!(app.review(review_id).await, review_before);
        assert_eq!(app.user(author).await, owner_before);
    }

    #[tokio::test]
    async fn concurrent_first_vote_hits_unique_key() {
        let app = TestApp::spawn().await;
        let (author, voter, review_id) = reviewed_item(&app).await;
        app.engine.cast_vote(voter, review_id, true).await.unwrap();

        // The row a racing writer would try to add
        let now = Utc::now();
        let err = vote::ActiveModel {
            voter_id: Set(voter),
            review_id: Set(review_id),
            is_agree: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&app.db)
        .await
        .unwrap_err();
        assert!(is_unique_violation(&err));

        // The loser's retry finds the stored vote and changes nothing
        let outcome = app.engine.cast_vote(voter, review_id, true).await.unwrap();
        assert_eq!(outcome.change, VoteChange::Unchanged);
        assert_eq!(app.review(review_id).await.agree_count, 1);
        assert_eq!(app.user(author).await.total_agrees, 1);
    }

    #[tokio::test]
    async fn flip_and_flip_back_restores_counters() {
        let app = TestApp::spawn().await;
        let (author, voter, review_id) = reviewed_item(&app).await;

        app.engine.cast_vote(voter, review_id, true).await.unwrap();
        let review_before = app.review(review_id).await;

        let flipped = app.engine.cast_vote(voter, review_id, false).await.unwrap();
        assert_eq!(flipped.change, VoteChange::Flipped);
        let review = app.review(review_id).await;
        assert_eq!((review.agree_count, review.disagree_count), (0, 1));
        assert_close(review.net_vote_score, -0.6);

        app.engine.cast_vote(voter, review_id, true).await.unwrap();
        let review = app.review(review_id).await;
        assert_eq!(review.agree_count, review_before.agree_count);
        assert_eq!(review.disagree_count, review_before.disagree_count);
        assert_close(review.weighted_score, review_before.weighted_score);

        let owner = app.user(author).await;
        assert_eq!((owner.total_agrees, owner.total_disagrees), (1, 0));
    }

    #[tokio::test]
    async fn self_vote_is_rejected_without_state_change() {
        let app = TestApp::spawn().await;
        let (author, _, review_id) = reviewed_item(&app).await;
        let review_before = app.review(review_id).await;
        let owner_before = app.user(author).await;

        for is_agree in [true, false] {
            let result = app.engine.cast_vote(author, review_id, is_agree).await;
            assert!(matches!(result, Err(EngineError::SelfVoteRejected)));
        }

        assert_eq!(app.review(review_id).await, review_before);
        assert_eq!(app.user(author).await, owner_before);
        let votes = vote::Entity::find().count(&app.db).await.unwrap();
        assert_eq!(votes, 0);
    }

    #[tokio::test]
    async fn unknown_review_or_voter_is_not_found() {
        let app = TestApp::spawn().await;
        let (_, voter, review_id) = reviewed_item(&app).await;

        let err = app.engine.cast_vote(voter, 9999, true).await.unwrap_err();
        assert!(matches!(err, EngineError::ReviewNotFound(9999)));
        assert!(err.is_not_found());

        let err = app.engine.cast_vote(9999, review_id, true).await.unwrap_err();
        assert!(matches!(err, EngineError::UserNotFound(9999)));
    }

    #[tokio::test]
    async fn heavy_disagreement_clamps_weight_and_credibility() {
        let app = TestApp::spawn().await;
        let (author, _, review_id) = reviewed_item(&app).await;

        for i in 0..50 {
            let voter = app.create_user(&format!("critic-{i}")).await;
            app.engine.cast_vote(voter, review_id, false).await.unwrap();
        }

        let review = app.review(review_id).await;
        assert_eq!(review.disagree_count, 50);
        assert_close(review.net_vote_score, -30.0);
        assert_close(review.weighted_score, 0.4);

        let owner = app.user(author).await;
        assert_close(owner.credibility_score, 0.5);
    }
}

mod recalculation {
    use super::*;

    #[tokio::test]
    async fn scores_are_rederived_from_stored_counters() {
        let app = TestApp::spawn().await;
        let (author, _, review_id) = reviewed_item(&app).await;

        let mut edited: review::ActiveModel = app.review(review_id).await.into();
        edited.agree_count = Set(2);
        edited.disagree_count = Set(1);
        edited.update(&app.db).await.unwrap();

        let mut edited: user::ActiveModel = app.user(author).await.into();
        edited.total_agrees = Set(3);
        edited.total_disagrees = Set(2);
        edited.review_count = Set(2);
        edited.update(&app.db).await.unwrap();

        let ledger = app.engine.votes();
        // 2 * 1.0 + 1 * -0.6
        let weighted = ledger.recalculate_review_score(review_id).await.unwrap();
        assert_close(weighted, 1.14);
        let review = app.review(review_id).await;
        assert_close(review.net_vote_score, 1.4);
        assert_close(review.weighted_score, 1.14);

        // 1 + (3 - 2) / 2 * 0.5
        let credibility = ledger.recalculate_user_credibility(author).await.unwrap();
        assert_close(credibility, 1.25);
        assert_close(app.user(author).await.credibility_score, 1.25);
    }

    #[tokio::test]
    async fn missing_targets_are_not_found() {
        let app = TestApp::spawn().await;
        let ledger = app.engine.votes();

        let err = ledger.recalculate_review_score(404).await.unwrap_err();
        assert!(matches!(err, EngineError::ReviewNotFound(404)));
        let err = ledger.recalculate_user_credibility(404).await.unwrap_err();
        assert!(matches!(err, EngineError::UserNotFound(404)));
    }
}

mod removal {
    use super::*;

    #[tokio::test]
    async fn removing_a_vote_rolls_back_its_counters() {
        let app = TestApp::spawn().await;
        let (author, voter, review_id) = reviewed_item(&app).await;

        app.engine.cast_vote(voter, review_id, false).await.unwrap();
        let outcome = app.engine.remove_vote(voter, review_id).await.unwrap();
        assert_eq!(outcome.change, VoteChange::Removed);
        assert_close(outcome.weighted_score, 1.0);

        let review = app.review(review_id).await;
        assert_eq!((review.agree_count, review.disagree_count), (0, 0));
        let owner = app.user(author).await;
        assert_eq!(owner.total_disagrees, 0);
        assert_close(owner.credibility_score, 1.0);

        let remaining = vote::Entity::find()
            .filter(vote::Column::ReviewId.eq(review_id))
            .count(&app.db)
            .await
            .unwrap();
        assert_eq!(remaining, 0);
    }

    #[tokio::test]
    async fn removing_a_missing_vote_fails() {
        let app = TestApp::spawn().await;
        let (_, voter, review_id) = reviewed_item(&app).await;

        let err = app.engine.remove_vote(voter, review_id).await.unwrap_err();
        assert!(matches!(
            err,
            EngineError::VoteNotFound { voter_id, review_id: r } if voter_id == voter && r == review_id
        ));
    }
}

mod queries {
    use super::*;

    #[tokio::test]
    async fn votes_for_reviews_reports_every_requested_id() {
        let app = TestApp::spawn().await;
        let (_, voter, review_id) = reviewed_item(&app).await;
        let other_author = app.create_user("other").await;
        let other_item = app.create_item("Shigoku", uniform(6.0)).await;
        let other_review = app
            .submit_review(
                Some(other_author),
                other_item,
                ReviewRating::Meh,
                PartialAttributes::default(),
            )
            .await;

        app.engine.cast_vote(voter, other_review.id, false).await.unwrap();

        let votes = app
            .engine
            .votes_for_reviews(voter, &[review_id, other_review.id])
            .await
            .unwrap();
        assert_eq!(votes.len(), 2);
        assert_eq!(votes[&review_id], None);
        assert_eq!(votes[&other_review.id], Some(false));

        assert!(app.engine.votes_for_reviews(voter, &[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn credibility_summary_carries_badge() {
        let app = TestApp::spawn().await;
        let (author, voter, review_id) = reviewed_item(&app).await;

        let summary = app.engine.credibility(author).await.unwrap();
        assert_close(summary.score, 1.0);
        assert_eq!(summary.review_count, 1);
        assert_eq!(summary.badge, CredibilityBadge::Standard);

        app.engine.cast_vote(voter, review_id, true).await.unwrap();
        let summary = app.engine.credibility(author).await.unwrap();
        assert_eq!(summary.total_agrees, 1);
        assert_eq!(summary.badge, CredibilityBadge::Expert);
    }
}
