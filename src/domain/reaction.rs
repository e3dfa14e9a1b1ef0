//! Item reaction kinds.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::MarketError;

/// Kind of reaction a user can leave on an item.
///
/// Likes feed the cached `like_count` on the item row; watches are counted
/// live by every item query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ReactionType {
    /// Explicit interest, weighted heavily in ranking.
    Like,
    /// Bookmark for later.
    Watch,
}

impl ReactionType {
    /// Storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Like => "like",
            Self::Watch => "watch",
        }
    }
}

impl fmt::Display for ReactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReactionType {
    type Err = MarketError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "like" => Ok(Self::Like),
            "watch" => Ok(Self::Watch),
            other => Err(MarketError::InvalidReactionType(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_kinds() {
        assert_eq!("like".parse::<ReactionType>().ok(), Some(ReactionType::Like));
        assert_eq!("watch".parse::<ReactionType>().ok(), Some(ReactionType::Watch));
    }

    #[test]
    fn rejects_unknown_kind() {
        let err = "love".parse::<ReactionType>();
        assert!(matches!(err, Err(MarketError::InvalidReactionType(k)) if k == "love"));
    }

    #[test]
    fn is_case_sensitive() {
        assert!("Like".parse::<ReactionType>().is_err());
    }
}
