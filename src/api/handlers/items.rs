//! Item handlers: search/list, details, views, listing creation,
//! investment data, warehouse storage and price history.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::dto::{
    CreateInvestmentAssetRequest, CreateListingRequest, CreateWarehouseStorageRequest,
    CreatedResponse, InvestmentAssetCreated, ItemQuery,
};
use crate::app_state::AppState;
use crate::error::{ErrorResponse, MarketError};
use crate::persistence::models::{
    InvestmentAssetRow, ItemRow, PriceHistoryRow, WarehouseStorageRow,
};

/// `GET /api/items` — Filtered, ranked item list.
///
/// # Errors
///
/// Returns [`MarketError::InvalidRequest`] for a non-numeric price bound.
#[utoipa::path(
    get,
    path = "/api/items",
    tag = "Items",
    summary = "List items",
    description = "Returns unsold items matching the keyword, category, price and kind filters. Without `sortBy` the list is ordered by priority score.",
    params(ItemQuery),
    responses(
        (status = 200, description = "Matching items", body = Vec<ItemRow>),
        (status = 400, description = "Invalid price bound", body = ErrorResponse),
    )
)]
pub async fn list_items(
    State(state): State<AppState>,
    Query(query): Query<ItemQuery>,
) -> Result<impl IntoResponse, MarketError> {
    let filter = query.into_filter()?;
    Ok(Json(state.items.list_items(&filter).await?))
}

/// `GET /api/items/{id}` — One item with live counters.
///
/// # Errors
///
/// Returns [`MarketError::NotFound`] if the item does not exist.
#[utoipa::path(
    get,
    path = "/api/items/{id}",
    tag = "Items",
    summary = "Get item",
    params(("id" = String, Path, description = "Item ID")),
    responses(
        (status = 200, description = "Item details", body = ItemRow),
        (status = 404, description = "Item not found", body = ErrorResponse),
    )
)]
pub async fn get_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, MarketError> {
    Ok(Json(state.items.get_item(&id).await?))
}

/// `POST /api/items/{id}/increment-view` — Count one view.
///
/// # Errors
///
/// Returns [`MarketError::NotFound`] if the item does not exist.
#[utoipa::path(
    post,
    path = "/api/items/{id}/increment-view",
    tag = "Items",
    summary = "Increment view count",
    params(("id" = String, Path, description = "Item ID")),
    responses(
        (status = 200, description = "Updated item", body = ItemRow),
        (status = 404, description = "Item not found", body = ErrorResponse),
    )
)]
pub async fn increment_view(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, MarketError> {
    Ok(Json(state.items.increment_view(&id).await?))
}

/// `POST /api/items` — Create a listing.
///
/// # Errors
///
/// Returns [`MarketError::InvalidRequest`] on validation failure and
/// [`MarketError::NotFound`] for an unknown seller.
#[utoipa::path(
    post,
    path = "/api/items",
    tag = "Items",
    summary = "Create listing",
    description = "Inserts the item and increments the seller's listing count in one transaction.",
    request_body = CreateListingRequest,
    responses(
        (status = 201, description = "Listing created", body = ItemRow),
        (status = 400, description = "Validation failed", body = ErrorResponse),
        (status = 404, description = "Seller not found", body = ErrorResponse),
    )
)]
pub async fn create_listing(
    State(state): State<AppState>,
    Json(req): Json<CreateListingRequest>,
) -> Result<impl IntoResponse, MarketError> {
    let item = state.items.create_listing(req.into()).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

/// `POST /api/investment-assets` — Attach grading and valuation data.
///
/// # Errors
///
/// Returns [`MarketError::NotFound`] for an unknown item.
#[utoipa::path(
    post,
    path = "/api/investment-assets",
    tag = "Items",
    summary = "Register investment asset",
    request_body = CreateInvestmentAssetRequest,
    responses(
        (status = 201, description = "Asset registered", body = InvestmentAssetCreated),
        (status = 404, description = "Item not found", body = ErrorResponse),
    )
)]
pub async fn create_investment_asset(
    State(state): State<AppState>,
    Json(req): Json<CreateInvestmentAssetRequest>,
) -> Result<impl IntoResponse, MarketError> {
    let ids = state.items.create_investment_asset(req.into()).await?;
    Ok((
        StatusCode::CREATED,
        Json(InvestmentAssetCreated {
            asset_id: ids.asset_id.into_string(),
            grading_id: ids.grading_id.into_string(),
        }),
    ))
}

/// `GET /api/investment-assets/{itemId}` — Grading and valuation data.
///
/// # Errors
///
/// Returns [`MarketError::NotFound`] when the item has none.
#[utoipa::path(
    get,
    path = "/api/investment-assets/{itemId}",
    tag = "Items",
    summary = "Get investment asset",
    params(("itemId" = String, Path, description = "Item ID")),
    responses(
        (status = 200, description = "Asset data", body = InvestmentAssetRow),
        (status = 404, description = "No asset data", body = ErrorResponse),
    )
)]
pub async fn get_investment_asset(
    State(state): State<AppState>,
    Path(item_id): Path<String>,
) -> Result<impl IntoResponse, MarketError> {
    Ok(Json(state.items.investment_asset(&item_id).await?))
}

/// `POST /api/warehouse-storage` — Record warehouse intake.
///
/// # Errors
///
/// Returns [`MarketError::NotFound`] for an unknown item.
#[utoipa::path(
    post,
    path = "/api/warehouse-storage",
    tag = "Items",
    summary = "Register warehouse storage",
    request_body = CreateWarehouseStorageRequest,
    responses(
        (status = 201, description = "Storage recorded", body = CreatedResponse),
        (status = 400, description = "Validation failed", body = ErrorResponse),
        (status = 404, description = "Item not found", body = ErrorResponse),
    )
)]
pub async fn create_warehouse_storage(
    State(state): State<AppState>,
    Json(req): Json<CreateWarehouseStorageRequest>,
) -> Result<impl IntoResponse, MarketError> {
    let id = state
        .items
        .create_warehouse_storage(&req.item_id, &req.warehouse_id, req.estimated_value)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(CreatedResponse {
            id: id.into_string(),
            message: "warehouse storage registered".to_string(),
        }),
    ))
}

/// `GET /api/warehouse-storage/{itemId}` — Warehouse record of an item.
///
/// # Errors
///
/// Returns [`MarketError::NotFound`] when the item is not stored.
#[utoipa::path(
    get,
    path = "/api/warehouse-storage/{itemId}",
    tag = "Items",
    summary = "Get warehouse storage",
    params(("itemId" = String, Path, description = "Item ID")),
    responses(
        (status = 200, description = "Storage record", body = WarehouseStorageRow),
        (status = 404, description = "Not stored", body = ErrorResponse),
    )
)]
pub async fn get_warehouse_storage(
    State(state): State<AppState>,
    Path(item_id): Path<String>,
) -> Result<impl IntoResponse, MarketError> {
    Ok(Json(state.items.warehouse_storage(&item_id).await?))
}

/// `GET /api/price-history/{itemId}` — Trade prices over time. Unknown
/// items yield an empty list.
///
/// # Errors
///
/// Returns [`MarketError::Storage`] on database failure.
#[utoipa::path(
    get,
    path = "/api/price-history/{itemId}",
    tag = "Items",
    summary = "Price history",
    description = "Completed trades of the item, or of its whole product group, oldest first. Falls back to recorded price points when nothing traded yet.",
    params(("itemId" = String, Path, description = "Item ID")),
    responses(
        (status = 200, description = "Price points", body = Vec<PriceHistoryRow>),
    )
)]
pub async fn price_history(
    State(state): State<AppState>,
    Path(item_id): Path<String>,
) -> Result<impl IntoResponse, MarketError> {
    Ok(Json(state.items.price_history(&item_id).await?))
}

/// Item routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/items", get(list_items).post(create_listing))
        .route("/items/{id}", get(get_item))
        .route("/items/{id}/increment-view", post(increment_view))
        .route("/investment-assets", post(create_investment_asset))
        .route("/investment-assets/{itemId}", get(get_investment_asset))
        .route("/warehouse-storage", post(create_warehouse_storage))
        .route("/warehouse-storage/{itemId}", get(get_warehouse_storage))
        .route("/price-history/{itemId}", get(price_history))
}
