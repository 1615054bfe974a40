//! Total numeric functions behind review weighting, reviewer credibility,
//! item aggregation and preference similarity.
//!
//! Nothing here returns an error: out-of-range inputs saturate at the
//! configured bounds, and `NaN` collapses to the lower bound.

use crate::attributes::{Attribute, AttributeVector, PartialAttributes};
use crate::config::ScoringConfig;
use crate::rating::ReviewRating;

/// Bound `value` to `[min, max]`. Never panics, even on inverted bounds.
pub fn saturate(value: f64, min: f64, max: f64) -> f64 {
    value.max(min).min(max)
}

/// `agree * agree_weight + disagree * disagree_weight`.
pub fn net_vote_score(config: &ScoringConfig, agree_count: i32, disagree_count: i32) -> f64 {
    f64::from(agree_count) * config.agree_weight + f64::from(disagree_count) * config.disagree_weight
}

/// Influence multiplier of a single review, centred on 1.0.
pub fn weighted_score(config: &ScoringConfig, net_vote_score: f64) -> f64 {
    saturate(
        1.0 + net_vote_score / config.vote_score_divisor,
        config.weighted_score_min,
        config.weighted_score_max,
    )
}

/// Reviewer credibility from lifetime votes received, normalised by review count.
pub fn credibility_score(
    config: &ScoringConfig,
    total_agrees: i32,
    total_disagrees: i32,
    review_count: i32,
) -> f64 {
    if review_count <= 0 {
        return 1.0;
    }
    let net_votes = (i64::from(total_agrees) - i64::from(total_disagrees)) as f64;
    saturate(
        1.0 + (net_votes / f64::from(review_count)) * config.credibility_scale,
        config.credibility_min,
        config.credibility_max,
    )
}

/// Share of community data in an aggregate: ramps linearly to the cap, then plateaus.
pub fn user_weight(config: &ScoringConfig, review_count: usize) -> f64 {
    let ramp = f64::from(config.confidence_review_count.max(1));
    let count = review_count as f64;
    if count >= ramp {
        config.user_weight_cap
    } else {
        (count / ramp) * config.user_weight_cap
    }
}

/// Linear blend of a seed value with the community average.
pub fn blend(seed: f64, user_avg: f64, user_weight: f64) -> f64 {
    (1.0 - user_weight) * seed + user_weight * user_avg
}

/// Running weighted arithmetic mean.
#[derive(Debug, Default, Clone, Copy)]
pub struct WeightedMean {
    sum: f64,
    weight: f64,
}

impl WeightedMean {
    pub fn push(&mut self, value: f64, weight: f64) {
        self.sum += value * weight;
        self.weight += weight;
    }

    /// `None` until some positive weight has been pushed.
    pub fn value(&self) -> Option<f64> {
        (self.weight > 0.0).then(|| self.sum / self.weight)
    }
}

/// One review as seen by the aggregator.
#[derive(Debug, Clone, Copy)]
pub struct ReviewSample {
    pub rating: ReviewRating,
    pub attributes: PartialAttributes,
    pub weighted_score: f64,
    /// Author credibility; 1.0 for anonymous reviews.
    pub credibility: f64,
}

impl ReviewSample {
    pub fn weight(&self) -> f64 {
        self.weighted_score * self.credibility
    }
}

/// Fully re-derived aggregate state of one item.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ItemAggregate {
    pub review_count: usize,
    pub attributes: AttributeVector,
    pub avg_rating: f64,
    pub overall_score: f64,
}

/// Blend seed attributes with trust-weighted review data.
pub fn aggregate_item(
    config: &ScoringConfig,
    seed: &AttributeVector,
    samples: &[ReviewSample],
) -> ItemAggregate {
    let weight = user_weight(config, samples.len());

    let attributes = AttributeVector::from_fn(|attribute| {
        let mut mean = WeightedMean::default();
        for sample in samples {
            if let Some(value) = sample.attributes.get(attribute) {
                mean.push(value, sample.weight());
            }
        }
        let seed_value = seed.get(attribute);
        blend(seed_value, mean.value().unwrap_or(seed_value), weight)
    });

    let mut rating = WeightedMean::default();
    for sample in samples {
        rating.push(sample.rating.score(), sample.weight());
    }
    let avg_rating = rating.value().unwrap_or(0.0);

    ItemAggregate {
        review_count: samples.len(),
        attributes,
        avg_rating,
        overall_score: overall_score(config, samples.len(), avg_rating, &attributes),
    }
}

/// Canonical 0-10 quality score.
pub fn overall_score(
    config: &ScoringConfig,
    review_count: usize,
    avg_rating: f64,
    attributes: &AttributeVector,
) -> f64 {
    if review_count == 0 {
        return config.neutral_score;
    }
    let rating_component = avg_rating / 4.0 * 10.0;
    saturate(
        config.rating_share * rating_component + (1.0 - config.rating_share) * attributes.mean(),
        0.0,
        10.0,
    )
}

/// Match percentage (0-100) between an item's effective attributes and a preference vector.
pub fn similarity(item: &AttributeVector, preference: &AttributeVector) -> f64 {
    let closeness = Attribute::ALL
        .iter()
        .map(|&a| 1.0 - (item.get(a) - preference.get(a)).abs() / 10.0)
        .sum::<f64>()
        / Attribute::ALL.len() as f64;
    saturate(closeness * 100.0, 0.0, 100.0)
}

/// Move `baseline` toward the attributes a review supplies, by `weight`.
pub fn nudge_toward(
    baseline: &AttributeVector,
    review: &PartialAttributes,
    weight: f64,
) -> AttributeVector {
    AttributeVector::from_fn(|a| match review.get(a) {
        Some(value) => baseline.get(a) * (1.0 - weight) + value * weight,
        None => baseline.get(a),
    })
}

/// Weighted per-attribute mean of complete vectors. `None` for an empty or zero-weight input.
pub fn weighted_centroid(
    samples: impl IntoIterator<Item = (AttributeVector, f64)>,
) -> Option<AttributeVector> {
    let mut means = [WeightedMean::default(); 5];
    for (vector, weight) in samples {
        for (mean, attribute) in means.iter_mut().zip(Attribute::ALL) {
            mean.push(vector.get(attribute), weight);
        }
    }
    let [size, body, sweet_brininess, flavorfulness, creaminess] = means;
    Some(AttributeVector {
        size: size.value()?,
        body: body.value()?,
        sweet_brininess: sweet_brininess.value()?,
        flavorfulness: flavorfulness.value()?,
        creaminess: creaminess.value()?,
    })
}
