//! Listing, investment and warehouse DTOs.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::item_filter::parse_price_bound;
use crate::domain::{ItemFilter, ListingKind, SortOrder};
use crate::error::MarketError;
use crate::service::items::{NewInvestmentAsset, NewListing};

/// Query string of `GET /api/items`.
///
/// Price bounds arrive as raw strings so a non-numeric value can be
/// rejected with a validation error instead of a generic extractor failure.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ItemQuery {
    /// Free text; whitespace-separated keywords matched with OR.
    #[serde(alias = "q")]
    pub query: Option<String>,
    /// Exact category code.
    #[serde(alias = "category")]
    pub category_code: Option<String>,
    /// Inclusive minimum price.
    pub min_price: Option<String>,
    /// Inclusive maximum price.
    pub max_price: Option<String>,
    /// Investment items only. Wins over `normalOnly`.
    #[serde(default)]
    pub invest_only: bool,
    /// Ordinary items only.
    #[serde(default)]
    pub normal_only: bool,
    /// `price_asc`, `price_desc`, `newest`; anything else ranks by priority.
    pub sort_by: Option<String>,
}

impl ItemQuery {
    /// Validates the query into an [`ItemFilter`].
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::InvalidRequest`] for a non-integer price bound.
    pub fn into_filter(self) -> Result<ItemFilter, MarketError> {
        let min = parse_price_bound("minPrice", self.min_price.as_deref())?;
        let max = parse_price_bound("maxPrice", self.max_price.as_deref())?;
        Ok(ItemFilter::new()
            .with_query(self.query.as_deref().unwrap_or_default())
            .with_category(self.category_code.as_deref().unwrap_or_default())
            .with_price_range(min, max)
            .with_kind(ListingKind::from_flags(self.invest_only, self.normal_only))
            .with_sort(SortOrder::from_param(self.sort_by.as_deref())))
    }
}

/// Request body for `POST /api/items`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateListingRequest {
    /// Title.
    pub title: String,
    /// Description.
    pub description: String,
    /// Price, 300 to 9,999,999.
    pub price: i64,
    /// Category code.
    pub category_id: String,
    /// Condition label.
    pub condition: String,
    /// One to ten image URLs.
    pub image_urls: Vec<String>,
    /// Seller user ID.
    pub seller_id: String,
    /// Investment listing flag.
    #[serde(default)]
    pub is_investment: bool,
}

impl From<CreateListingRequest> for NewListing {
    fn from(req: CreateListingRequest) -> Self {
        Self {
            title: req.title,
            description: req.description,
            price: req.price,
            category: req.category_id,
            condition: req.condition,
            image_urls: req.image_urls,
            seller_id: req.seller_id,
            is_investment: req.is_investment,
        }
    }
}

/// Request body for `POST /api/investment-assets`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateInvestmentAssetRequest {
    /// Item the data belongs to.
    pub item_id: String,
    /// Grading company.
    #[serde(default)]
    pub grader: String,
    /// Numeric grade.
    pub grade: Option<f64>,
    /// Certificate number.
    pub cert_number: Option<String>,
    /// Purchase date.
    pub purchase_date: Option<String>,
    /// Original purchase price.
    pub original_price: Option<i64>,
    /// Current estimated value.
    pub estimated_value: Option<i64>,
}

impl From<CreateInvestmentAssetRequest> for NewInvestmentAsset {
    fn from(req: CreateInvestmentAssetRequest) -> Self {
        Self {
            item_id: req.item_id,
            grader: req.grader,
            grade: req.grade,
            cert_number: req.cert_number,
            purchase_date: req.purchase_date,
            original_price: req.original_price,
            estimated_value: req.estimated_value,
        }
    }
}

/// Response body for `POST /api/investment-assets`.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InvestmentAssetCreated {
    /// `investment_assets` row ID.
    pub asset_id: String,
    /// `grading_info` row ID.
    pub grading_id: String,
}

/// Request body for `POST /api/warehouse-storage`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateWarehouseStorageRequest {
    /// Stored item.
    pub item_id: String,
    /// Warehouse identifier.
    pub warehouse_id: String,
    /// Estimated value at intake.
    pub estimated_value: i64,
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn non_numeric_bound_is_rejected() {
        let query = ItemQuery {
            min_price: Some("cheap".to_string()),
            ..ItemQuery::default()
        };
        assert!(matches!(query.into_filter(), Err(MarketError::InvalidRequest(_))));
    }

    #[test]
    fn query_maps_onto_filter() {
        let query = ItemQuery {
            query: Some("Pokemon Card".to_string()),
            max_price: Some(" 5000 ".to_string()),
            invest_only: true,
            normal_only: true,
            sort_by: Some("newest".to_string()),
            ..ItemQuery::default()
        };
        let Ok(filter) = query.into_filter() else {
            panic!("valid query should build a filter");
        };
        assert_eq!(filter.keywords(), ["pokemon", "card"]);
        assert_eq!(filter.max_price(), Some(5000));
        assert_eq!(filter.kind(), ListingKind::InvestOnly);
        assert_eq!(filter.sort(), SortOrder::Newest);
    }

    #[test]
    fn documented_and_short_parameter_names_both_filter() {
        for uri in [
            "/api/items?query=desk&categoryCode=010",
            "/api/items?q=desk&category=010",
        ] {
            let Ok(uri) = uri.parse::<axum::http::Uri>() else {
                panic!("uri should parse");
            };
            let Ok(axum::extract::Query(query)) = axum::extract::Query::<ItemQuery>::try_from_uri(&uri)
            else {
                panic!("query string should deserialize");
            };
            let Ok(filter) = query.into_filter() else {
                panic!("valid query should build a filter");
            };
            assert_eq!(filter.keywords(), ["desk"]);
            assert_eq!(filter.category_code(), Some("010"));
        }
    }
}
