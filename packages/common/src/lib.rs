pub mod attributes;
pub mod config;
pub mod credibility;
pub mod rating;
pub mod scoring;

pub use attributes::{Attribute, AttributeError, AttributeVector, PartialAttributes};
pub use config::ScoringConfig;
pub use credibility::CredibilityBadge;
pub use rating::ReviewRating;
