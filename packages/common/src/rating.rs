#[cfg(feature = "sea-orm")]
use sea_orm::prelude::StringLen;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The coarse four-tier verdict a reviewer gives an oyster, best first.
///
/// When the `sea-orm` feature is enabled, this enum can be used directly in SeaORM entities.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::None)")
)]
#[serde(rename_all = "snake_case")]
pub enum ReviewRating {
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "love_it"))]
    LoveIt,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "like_it"))]
    LikeIt,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "meh"))]
    Meh,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "hate_it"))]
    HateIt,
}

impl ReviewRating {
    /// All tiers, best to worst.
    pub const ALL: &'static [ReviewRating] = &[Self::LoveIt, Self::LikeIt, Self::Meh, Self::HateIt];

    /// Numeric value used when averaging ratings: 4 for the best tier down to 1.
    pub fn score(&self) -> f64 {
        match self {
            Self::LoveIt => 4.0,
            Self::LikeIt => 3.0,
            Self::Meh => 2.0,
            Self::HateIt => 1.0,
        }
    }

    /// The top two tiers count as a positive signal for preference inference.
    pub fn is_favorable(&self) -> bool {
        matches!(self, Self::LoveIt | Self::LikeIt)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LoveIt => "love_it",
            Self::LikeIt => "like_it",
            Self::Meh => "meh",
            Self::HateIt => "hate_it",
        }
    }
}

impl fmt::Display for ReviewRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error when parsing an invalid rating string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseRatingError {
    invalid: String,
}

impl fmt::Display for ParseRatingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Invalid rating '{}'. Valid values: {}",
            self.invalid,
            ReviewRating::ALL
                .iter()
                .map(|r| r.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        )
    }
}

impl std::error::Error for ParseRatingError {}

impl FromStr for ReviewRating {
    type Err = ParseRatingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "love_it" => Ok(Self::LoveIt),
            "like_it" => Ok(Self::LikeIt),
            "meh" => Ok(Self::Meh),
            "hate_it" => Ok(Self::HateIt),
            _ => Err(ParseRatingError {
                invalid: s.to_string(),
            }),
        }
    }
}
