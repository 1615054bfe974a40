use serde::{Deserialize, Serialize};
use std::fmt;

/// Display tier derived from a reviewer's credibility score.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CredibilityBadge {
    New,
    Standard,
    Trusted,
    Expert,
}

impl CredibilityBadge {
    /// Tier lookup; each threshold is inclusive.
    pub fn from_score(score: f64) -> Self {
        if score >= 1.3 {
            Self::Expert
        } else if score >= 1.15 {
            Self::Trusted
        } else if score >= 0.85 {
            Self::Standard
        } else {
            Self::New
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "New",
            Self::Standard => "Standard",
            Self::Trusted => "Trusted",
            Self::Expert => "Expert",
        }
    }
}

impl fmt::Display for CredibilityBadge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
