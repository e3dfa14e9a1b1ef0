//! Immutable filter/sort configuration for item listing queries.
//!
//! An [`ItemFilter`] is built once per request from validated input and
//! handed to the query builder in
//! [`crate::persistence::item_query`]. The priority score used for the
//! default sort is also exposed here as a pure function so the weighting
//! can be reasoned about and tested without a database.

use std::str::FromStr;

use crate::error::MarketError;

/// Rating assumed for sellers without any review.
pub const DEFAULT_SELLER_RATING: f64 = 3.0;
/// Weight of the seller's average rating.
pub const RATING_WEIGHT: f64 = 20.0;
/// Weight of each follower of the seller.
pub const FOLLOWER_WEIGHT: f64 = 2.0;
/// Weight of each active listing of the seller.
pub const LISTING_WEIGHT: f64 = 1.5;
/// Weight of each like on the item.
pub const LIKE_WEIGHT: f64 = 10.0;
/// Weight of each view of the item.
pub const VIEW_WEIGHT: f64 = 0.5;

/// Result ordering for item listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// Cheapest first, ties by id ascending.
    PriceAsc,
    /// Most expensive first, ties by id ascending.
    PriceDesc,
    /// Most recently created first (id descending).
    Newest,
    /// Highest priority score first, ties by id ascending.
    #[default]
    Priority,
}

impl SortOrder {
    /// Maps the `sortBy` query value. Unknown values fall back to
    /// [`SortOrder::Priority`].
    #[must_use]
    pub fn from_param(value: Option<&str>) -> Self {
        match value {
            Some("price_asc") => Self::PriceAsc,
            Some("price_desc") => Self::PriceDesc,
            Some("newest") => Self::Newest,
            _ => Self::Priority,
        }
    }
}

/// Which listing kinds an item query returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListingKind {
    /// No restriction.
    #[default]
    Any,
    /// Investment items only.
    InvestOnly,
    /// Ordinary items only.
    NormalOnly,
}

impl ListingKind {
    /// Resolves the two request flags. `investOnly` wins when both are set.
    #[must_use]
    pub const fn from_flags(invest_only: bool, normal_only: bool) -> Self {
        if invest_only {
            Self::InvestOnly
        } else if normal_only {
            Self::NormalOnly
        } else {
            Self::Any
        }
    }
}

/// Validated filter for [`crate::persistence::item_query::list_items`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemFilter {
    keywords: Vec<String>,
    category_code: Option<String>,
    min_price: Option<i64>,
    max_price: Option<i64>,
    kind: ListingKind,
    sort: SortOrder,
}

impl ItemFilter {
    /// Empty filter: every unsold item, priority order.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the free-text query; it is split on whitespace into keywords.
    #[must_use]
    pub fn with_query(mut self, query: &str) -> Self {
        self.keywords = query
            .split_whitespace()
            .map(str::to_lowercase)
            .collect();
        self
    }

    /// Restricts to one exact category code. Blank codes are ignored.
    #[must_use]
    pub fn with_category(mut self, code: &str) -> Self {
        self.category_code = Some(code.trim())
            .filter(|c| !c.is_empty())
            .map(ToString::to_string);
        self
    }

    /// Sets the inclusive price bounds.
    #[must_use]
    pub const fn with_price_range(mut self, min: Option<i64>, max: Option<i64>) -> Self {
        self.min_price = min;
        self.max_price = max;
        self
    }

    /// Sets the listing kind restriction.
    #[must_use]
    pub const fn with_kind(mut self, kind: ListingKind) -> Self {
        self.kind = kind;
        self
    }

    /// Sets the sort order.
    #[must_use]
    pub const fn with_sort(mut self, sort: SortOrder) -> Self {
        self.sort = sort;
        self
    }

    /// Lower-cased search keywords, matched with OR semantics.
    #[must_use]
    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    /// Exact category code, if any.
    #[must_use]
    pub fn category_code(&self) -> Option<&str> {
        self.category_code.as_deref()
    }

    /// Inclusive minimum price.
    #[must_use]
    pub const fn min_price(&self) -> Option<i64> {
        self.min_price
    }

    /// Inclusive maximum price.
    #[must_use]
    pub const fn max_price(&self) -> Option<i64> {
        self.max_price
    }

    /// Listing kind restriction.
    #[must_use]
    pub const fn kind(&self) -> ListingKind {
        self.kind
    }

    /// Sort order.
    #[must_use]
    pub const fn sort(&self) -> SortOrder {
        self.sort
    }
}

/// Parses an optional price bound. Blank input means "no bound".
///
/// # Errors
///
/// Returns [`MarketError::InvalidRequest`] when the value is not an integer.
pub fn parse_price_bound(name: &str, raw: Option<&str>) -> Result<Option<i64>, MarketError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(value) => i64::from_str(value).map(Some).map_err(|_| {
            MarketError::InvalidRequest(format!("{name} must be an integer, got '{value}'"))
        }),
    }
}

/// Weighted ranking score for the default item order.
///
/// Missing seller statistics (no seller row, no reviews) are coalesced to
/// [`DEFAULT_SELLER_RATING`] and zero counts. The SQL used by the query
/// engine computes exactly the same sum.
#[must_use]
pub fn priority_score(
    seller_rating: Option<f64>,
    seller_followers: Option<i64>,
    seller_listings: Option<i64>,
    likes: Option<i64>,
    views: Option<i64>,
) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    let count = |v: Option<i64>| v.unwrap_or(0) as f64;
    seller_rating.unwrap_or(DEFAULT_SELLER_RATING) * RATING_WEIGHT
        + count(seller_followers) * FOLLOWER_WEIGHT
        + count(seller_listings) * LISTING_WEIGHT
        + count(likes) * LIKE_WEIGHT
        + count(views) * VIEW_WEIGHT
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn score_matches_reference_scenario() {
        let a = priority_score(Some(4.5), Some(10), Some(3), Some(5), Some(100));
        let b = priority_score(None, None, None, Some(0), Some(0));
        assert!((a - 214.5).abs() < f64::EPSILON);
        assert!((b - 60.0).abs() < f64::EPSILON);
        assert!(a > b);
    }

    #[test]
    fn query_splits_on_whitespace_and_lowercases() {
        let filter = ItemFilter::new().with_query("  Red\tXL  ");
        assert_eq!(filter.keywords(), ["red".to_string(), "xl".to_string()]);
    }

    #[test]
    fn blank_query_has_no_keywords() {
        assert!(ItemFilter::new().with_query("   ").keywords().is_empty());
    }

    #[test]
    fn invest_only_takes_precedence() {
        assert_eq!(ListingKind::from_flags(true, true), ListingKind::InvestOnly);
        assert_eq!(ListingKind::from_flags(false, true), ListingKind::NormalOnly);
        assert_eq!(ListingKind::from_flags(false, false), ListingKind::Any);
    }

    #[test]
    fn unknown_sort_falls_back_to_priority() {
        assert_eq!(SortOrder::from_param(Some("cheapest")), SortOrder::Priority);
        assert_eq!(SortOrder::from_param(None), SortOrder::Priority);
        assert_eq!(SortOrder::from_param(Some("newest")), SortOrder::Newest);
    }

    #[test]
    fn price_bounds_reject_non_numeric() {
        assert!(matches!(
            parse_price_bound("minPrice", Some("12abc")),
            Err(MarketError::InvalidRequest(_))
        ));
        assert_eq!(parse_price_bound("minPrice", Some(" 300 ")).ok(), Some(Some(300)));
        assert_eq!(parse_price_bound("minPrice", Some("")).ok(), Some(None));
        assert_eq!(parse_price_bound("minPrice", None).ok(), Some(None));
    }

    #[test]
    fn blank_category_is_ignored() {
        assert_eq!(ItemFilter::new().with_category("  ").category_code(), None);
        assert_eq!(ItemFilter::new().with_category("010").category_code(), Some("010"));
    }
}
