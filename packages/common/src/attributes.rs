use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Lowest value an attribute may take.
pub const ATTRIBUTE_MIN: f64 = 1.0;
/// Highest value an attribute may take.
pub const ATTRIBUTE_MAX: f64 = 10.0;

/// One of the five tasting traits scored for every oyster.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Attribute {
    Size,
    Body,
    SweetBrininess,
    Flavorfulness,
    Creaminess,
}

impl Attribute {
    /// All attributes in canonical order.
    pub const ALL: [Attribute; 5] = [
        Self::Size,
        Self::Body,
        Self::SweetBrininess,
        Self::Flavorfulness,
        Self::Creaminess,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Size => "size",
            Self::Body => "body",
            Self::SweetBrininess => "sweet_brininess",
            Self::Flavorfulness => "flavorfulness",
            Self::Creaminess => "creaminess",
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An attribute value outside `[ATTRIBUTE_MIN, ATTRIBUTE_MAX]` (or not a number).
#[derive(Debug, Clone, Copy, PartialEq, Error)]
#[error("{attribute} must be between 1 and 10, got {value}")]
pub struct AttributeError {
    pub attribute: Attribute,
    pub value: f64,
}

/// Check a single attribute value against the 1-10 scale.
pub fn validate_attribute(attribute: Attribute, value: f64) -> Result<(), AttributeError> {
    if (ATTRIBUTE_MIN..=ATTRIBUTE_MAX).contains(&value) {
        Ok(())
    } else {
        Err(AttributeError { attribute, value })
    }
}

/// A complete five-attribute profile: seed data, aggregates, or a preference vector.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AttributeVector {
    pub size: f64,
    pub body: f64,
    pub sweet_brininess: f64,
    pub flavorfulness: f64,
    pub creaminess: f64,
}

impl AttributeVector {
    pub const fn uniform(value: f64) -> Self {
        Self {
            size: value,
            body: value,
            sweet_brininess: value,
            flavorfulness: value,
            creaminess: value,
        }
    }

    /// Build a vector by evaluating `f` once per attribute, in canonical order.
    pub fn from_fn(mut f: impl FnMut(Attribute) -> f64) -> Self {
        Self {
            size: f(Attribute::Size),
            body: f(Attribute::Body),
            sweet_brininess: f(Attribute::SweetBrininess),
            flavorfulness: f(Attribute::Flavorfulness),
            creaminess: f(Attribute::Creaminess),
        }
    }

    pub fn get(&self, attribute: Attribute) -> f64 {
        match attribute {
            Attribute::Size => self.size,
            Attribute::Body => self.body,
            Attribute::SweetBrininess => self.sweet_brininess,
            Attribute::Flavorfulness => self.flavorfulness,
            Attribute::Creaminess => self.creaminess,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Attribute, f64)> + '_ {
        Attribute::ALL.into_iter().map(|a| (a, self.get(a)))
    }

    pub fn mean(&self) -> f64 {
        self.iter().map(|(_, v)| v).sum::<f64>() / Attribute::ALL.len() as f64
    }

    pub fn validate(&self) -> Result<(), AttributeError> {
        self.iter().try_for_each(|(a, v)| validate_attribute(a, v))
    }
}

/// A possibly incomplete attribute set, as supplied by a review or a nullable aggregate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PartialAttributes {
    #[serde(default)]
    pub size: Option<f64>,
    #[serde(default)]
    pub body: Option<f64>,
    #[serde(default)]
    pub sweet_brininess: Option<f64>,
    #[serde(default)]
    pub flavorfulness: Option<f64>,
    #[serde(default)]
    pub creaminess: Option<f64>,
}

impl PartialAttributes {
    pub fn from_fn(mut f: impl FnMut(Attribute) -> Option<f64>) -> Self {
        Self {
            size: f(Attribute::Size),
            body: f(Attribute::Body),
            sweet_brininess: f(Attribute::SweetBrininess),
            flavorfulness: f(Attribute::Flavorfulness),
            creaminess: f(Attribute::Creaminess),
        }
    }

    pub fn get(&self, attribute: Attribute) -> Option<f64> {
        match attribute {
            Attribute::Size => self.size,
            Attribute::Body => self.body,
            Attribute::SweetBrininess => self.sweet_brininess,
            Attribute::Flavorfulness => self.flavorfulness,
            Attribute::Creaminess => self.creaminess,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Attribute, Option<f64>)> + '_ {
        Attribute::ALL.into_iter().map(|a| (a, self.get(a)))
    }

    pub fn is_empty(&self) -> bool {
        self.iter().all(|(_, v)| v.is_none())
    }

    /// The full vector, if every attribute is present.
    pub fn complete(&self) -> Option<AttributeVector> {
        Some(AttributeVector {
            size: self.size?,
            body: self.body?,
            sweet_brininess: self.sweet_brininess?,
            flavorfulness: self.flavorfulness?,
            creaminess: self.creaminess?,
        })
    }

    /// Per attribute, keep `self` when present, otherwise take `fallback`.
    pub fn or(self, fallback: PartialAttributes) -> PartialAttributes {
        Self::from_fn(|a| self.get(a).or(fallback.get(a)))
    }

    /// Fill every missing attribute from a complete `fallback`.
    pub fn resolve(&self, fallback: &AttributeVector) -> AttributeVector {
        AttributeVector::from_fn(|a| self.get(a).unwrap_or(fallback.get(a)))
    }

    /// Validate only the attributes that are present.
    pub fn validate(&self) -> Result<(), AttributeError> {
        self.iter()
            .filter_map(|(a, v)| v.map(|v| (a, v)))
            .try_for_each(|(a, v)| validate_attribute(a, v))
    }
}

impl From<AttributeVector> for PartialAttributes {
    fn from(v: AttributeVector) -> Self {
        Self::from_fn(|a| Some(v.get(a)))
    }
}
