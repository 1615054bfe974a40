use common::{AttributeVector, PartialAttributes, ReviewRating};

use oyster_engine::EngineError;
use oyster_engine::models::preference::PreferenceSource;
use oyster_engine::models::recommendation::{Recommendation, RecommendationReason};
use oyster_engine::models::review::ReviewUpdate;

use crate::common::{TestApp, all, assert_close, uniform};

fn ids(recommendations: &[Recommendation]) -> Vec<i32> {
    recommendations.iter().map(|r| r.item_id).collect()
}

fn only_size(value: f64) -> PartialAttributes {
    PartialAttributes {
        size: Some(value),
        ..Default::default()
    }
}

mod top_rated {
    use super::*;

    #[tokio::test]
    async fn users_without_preferences_get_reviewed_items_by_score() {
        let app = TestApp::spawn().await;
        let critic = app.create_user("critic").await;
        let newcomer = app.create_user("newcomer").await;
        let loved = app.create_item("Kumamoto", uniform(5.0)).await;
        let hated = app.create_item("Gulf", uniform(5.0)).await;
        app.create_item("Unreviewed", uniform(9.0)).await;

        app.submit_review(Some(critic), hated, ReviewRating::HateIt, all(2.0))
            .await;
        app.submit_review(Some(critic), loved, ReviewRating::LoveIt, all(9.0))
            .await;

        assert!(app.engine.preference_vector(newcomer).await.unwrap().is_none());

        let recommendations = app.engine.recommend(newcomer, 10).await.unwrap();
        assert_eq!(ids(&recommendations), vec![loved, hated]);
        for r in &recommendations {
            assert_eq!(r.reason, RecommendationReason::TopRated);
            assert_eq!(r.match_score, None);
            assert!(r.review_count >= 1);
        }
        assert!(recommendations[0].overall_score > recommendations[1].overall_score);
    }

    #[tokio::test]
    async fn zero_limit_is_empty() {
        let app = TestApp::spawn().await;
        let user = app.create_user("user").await;
        assert!(app.engine.recommend(user, 0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_user_is_not_found() {
        let app = TestApp::spawn().await;
        let err = app.engine.recommend(77, 5).await.unwrap_err();
        assert!(matches!(err, EngineError::UserNotFound(77)));
    }
}

mod personalized {
    use super::*;

    #[tokio::test]
    async fn explicit_baseline_ranks_by_similarity() {
        let app = TestApp::spawn().await;
        let user = app.create_user("user").await;
        let far = app.create_item("Far", uniform(2.0)).await;
        let exact = app.create_item("Exact", uniform(8.0)).await;
        let middle = app.create_item("Middle", uniform(5.0)).await;

        app.engine.set_baseline(user, uniform(8.0)).await.unwrap();

        let preference = app.engine.preference_vector(user).await.unwrap().unwrap();
        assert_eq!(preference.source, PreferenceSource::Baseline);
        assert_eq!(preference.values, uniform(8.0));

        let recommendations = app.engine.recommend(user, 10).await.unwrap();
        assert_eq!(ids(&recommendations), vec![exact, middle, far]);
        assert_eq!(recommendations[0].reason, RecommendationReason::BaselineMatch);
        assert_close(recommendations[0].match_score.unwrap(), 100.0);
        assert_close(recommendations[1].match_score.unwrap(), 70.0);
        assert_close(recommendations[2].match_score.unwrap(), 40.0);
    }

    #[tokio::test]
    async fn ties_break_by_item_id() {
        let app = TestApp::spawn().await;
        let user = app.create_user("user").await;
        let first = app.create_item("Twin A", uniform(6.0)).await;
        let second = app.create_item("Twin B", uniform(6.0)).await;

        app.engine.set_baseline(user, uniform(6.0)).await.unwrap();

        let recommendations = app.engine.recommend(user, 10).await.unwrap();
        assert_eq!(ids(&recommendations), vec![first, second]);
    }

    #[tokio::test]
    async fn inferred_vector_excludes_reviewed_items() {
        let app = TestApp::spawn().await;
        let user = app.create_user("user").await;
        let reviewed = app.create_item("Reviewed", uniform(3.0)).await;
        let close = app.create_item("Close", uniform(3.0)).await;
        let distant = app.create_item("Distant", uniform(9.0)).await;

        // A partial review cannot seed a baseline, so the vector is inferred
        app.submit_review(Some(user), reviewed, ReviewRating::LoveIt, only_size(2.0))
            .await;

        let preference = app.engine.preference_vector(user).await.unwrap().unwrap();
        assert_eq!(preference.source, PreferenceSource::Inferred);
        assert_close(preference.values.size, 2.0);
        assert_close(preference.values.creaminess, 3.0);

        let recommendations = app.engine.recommend(user, 10).await.unwrap();
        assert_eq!(ids(&recommendations), vec![close, distant]);
        assert_eq!(recommendations[0].reason, RecommendationReason::Personalized);
        assert_close(recommendations[0].match_score.unwrap(), 98.0);
        assert_close(recommendations[1].match_score.unwrap(), 38.0);
    }

    #[tokio::test]
    async fn unfavorable_reviews_do_not_shape_preferences() {
        let app = TestApp::spawn().await;
        let user = app.create_user("user").await;
        let item = app.create_item("Meh", uniform(4.0)).await;

        app.submit_review(Some(user), item, ReviewRating::Meh, all(4.0))
            .await;

        assert!(app.engine.preference_vector(user).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn favorites_weigh_more_in_inferred_vector() {
        let app = TestApp::spawn().await;
        let user = app.create_user("user").await;
        let small = app.create_item("Small", uniform(2.0)).await;
        let large = app.create_item("Large", uniform(8.0)).await;

        app.submit_review(Some(user), small, ReviewRating::LoveIt, only_size(2.0))
            .await;
        app.submit_review(Some(user), large, ReviewRating::LikeIt, only_size(8.0))
            .await;
        assert!(app.engine.add_favorite(user, large).await.unwrap());

        let preference = app.engine.preference_vector(user).await.unwrap().unwrap();
        // (2 * 1.0 + 8 * 1.5) / 2.5
        let expected = AttributeVector::uniform(5.6);
        for (attribute, value) in expected.iter() {
            assert_close(preference.values.get(attribute), value);
        }
    }
}

mod caching {
    use super::*;

    #[tokio::test]
    async fn cached_list_is_served_until_invalidated() {
        let app = TestApp::spawn().await;
        let critic = app.create_user("critic").await;
        let other = app.create_user("other").await;
        let reader = app.create_user("reader").await;
        let first = app.create_item("First", uniform(5.0)).await;
        let second = app.create_item("Second", uniform(5.0)).await;

        app.submit_review(Some(critic), first, ReviewRating::LikeIt, all(7.0))
            .await;
        let before = app.engine.recommend(reader, 10).await.unwrap();
        assert_eq!(ids(&before), vec![first]);

        // Another user's activity leaves the reader's entry in place
        let review = app
            .submit_review(Some(other), second, ReviewRating::LoveIt, all(9.0))
            .await;
        app.engine.cast_vote(critic, review.id, true).await.unwrap();
        assert_eq!(app.engine.recommend(reader, 10).await.unwrap(), before);

        app.engine.invalidate_cache(reader);
        let after = app.engine.recommend(reader, 10).await.unwrap();
        assert_eq!(ids(&after), vec![second, first]);
    }

    fn with_size(size: f64) -> AttributeVector {
        AttributeVector {
            size,
            ..uniform(5.0)
        }
    }

    #[tokio::test]
    async fn own_review_drops_the_item_from_cached_list() {
        let app = TestApp::spawn().await;
        let user = app.create_user("user").await;
        let first = app.create_item("First", uniform(5.0)).await;
        let second = app.create_item("Second", uniform(6.0)).await;
        app.engine.set_baseline(user, uniform(5.0)).await.unwrap();

        let before = app.engine.recommend(user, 10).await.unwrap();
        assert_eq!(ids(&before), vec![first, second]);

        app.submit_review(
            Some(user),
            first,
            ReviewRating::Meh,
            PartialAttributes::default(),
        )
        .await;
        let after = app.engine.recommend(user, 10).await.unwrap();
        assert_eq!(ids(&after), vec![second]);
    }

    #[tokio::test]
    async fn own_review_edit_reranks() {
        let app = TestApp::spawn().await;
        let user = app.create_user("user").await;
        let reviewed = app.create_item("Reviewed", uniform(5.0)).await;
        let small = app.create_item("Small", with_size(2.0)).await;
        let large = app.create_item("Large", with_size(8.0)).await;

        let review = app
            .submit_review(Some(user), reviewed, ReviewRating::LoveIt, only_size(3.0))
            .await;
        let before = app.engine.recommend(user, 10).await.unwrap();
        assert_eq!(ids(&before), vec![small, large]);

        let update = ReviewUpdate {
            attributes: only_size(7.0),
            ..Default::default()
        };
        app.engine
            .update_review(review.id, user, update)
            .await
            .unwrap();
        let after = app.engine.recommend(user, 10).await.unwrap();
        assert_eq!(ids(&after), vec![large, small]);
        assert_close(after[0].match_score.unwrap(), 98.0);
    }

    #[tokio::test]
    async fn favorite_toggle_reranks() {
        let app = TestApp::spawn().await;
        let user = app.create_user("user").await;
        let small_reviewed = app.create_item("Small reviewed", with_size(2.0)).await;
        let large_reviewed = app.create_item("Large reviewed", with_size(8.0)).await;
        let lower = app.create_item("Lower", with_size(4.0)).await;
        let higher = app.create_item("Higher", with_size(7.0)).await;

        app.submit_review(Some(user), small_reviewed, ReviewRating::LikeIt, only_size(2.0))
            .await;
        app.submit_review(Some(user), large_reviewed, ReviewRating::LikeIt, only_size(8.0))
            .await;

        // Inferred size 5.0
        let even = app.engine.recommend(user, 10).await.unwrap();
        assert_eq!(ids(&even), vec![lower, higher]);

        // (2 * 1.0 + 8 * 1.5) / 2.5 = 5.6
        assert!(app.engine.add_favorite(user, large_reviewed).await.unwrap());
        let favored = app.engine.recommend(user, 10).await.unwrap();
        assert_eq!(ids(&favored), vec![higher, lower]);
        assert_close(favored[0].match_score.unwrap(), 97.2);

        assert!(app.engine.remove_favorite(user, large_reviewed).await.unwrap());
        assert_eq!(app.engine.recommend(user, 10).await.unwrap(), even);
    }

    #[tokio::test]
    async fn larger_limit_recomputes() {
        let app = TestApp::spawn().await;
        let user = app.create_user("user").await;
        for name in ["A", "B", "C"] {
            app.create_item(name, uniform(5.0)).await;
        }
        app.engine.set_baseline(user, uniform(5.0)).await.unwrap();

        assert_eq!(app.engine.recommend(user, 1).await.unwrap().len(), 1);
        assert_eq!(app.engine.recommend(user, 3).await.unwrap().len(), 3);
        assert_eq!(app.engine.recommend(user, 2).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn setting_a_baseline_invalidates() {
        let app = TestApp::spawn().await;
        let critic = app.create_user("critic").await;
        let user = app.create_user("user").await;
        let item = app.create_item("Only", uniform(5.0)).await;
        app.submit_review(Some(critic), item, ReviewRating::LikeIt, all(5.0))
            .await;

        let before = app.engine.recommend(user, 5).await.unwrap();
        assert_eq!(before[0].reason, RecommendationReason::TopRated);

        app.engine.set_baseline(user, uniform(5.0)).await.unwrap();
        let after = app.engine.recommend(user, 5).await.unwrap();
        assert_eq!(after[0].reason, RecommendationReason::BaselineMatch);
    }

    #[tokio::test]
    async fn invalid_baseline_is_rejected() {
        let app = TestApp::spawn().await;
        let user = app.create_user("user").await;

        let baseline = AttributeVector {
            creaminess: 11.0,
            ..uniform(5.0)
        };
        let err = app.engine.set_baseline(user, baseline).await.unwrap_err();
        assert!(matches!(err, EngineError::InvalidAttributeRange(_)));
        assert_eq!(app.user(user).await.baseline(), None);
    }
}
