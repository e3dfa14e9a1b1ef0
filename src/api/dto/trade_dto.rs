//! Transaction and review DTOs.

use serde::Deserialize;
use utoipa::ToSchema;

use crate::service::trades::NewTrade;

/// Request body for `POST /api/transactions/complete`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CompletePurchaseRequest {
    /// Purchased item.
    pub item_id: String,
    /// Buyer.
    pub buyer_id: String,
    /// Seller.
    pub seller_id: String,
    /// Price paid.
    pub price: i64,
    /// Send the item to warehouse storage instead of shipping it.
    #[serde(default)]
    pub warehouse: bool,
}

impl From<CompletePurchaseRequest> for NewTrade {
    fn from(req: CompletePurchaseRequest) -> Self {
        Self::purchase(&req.item_id, &req.buyer_id, &req.seller_id, req.price, req.warehouse)
    }
}

/// Request body for `POST /api/transactions`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateTransactionRequest {
    /// Traded item.
    pub item_id: String,
    /// Buyer.
    pub buyer_id: String,
    /// Seller.
    pub seller_id: String,
    /// Price paid.
    pub price: i64,
    /// Quantity; 0 or missing means 1.
    #[serde(default)]
    pub quantity: i64,
    /// `purchase`, `invest`, ...
    pub transaction_type: String,
    /// Warehouse storage flag.
    #[serde(default)]
    pub warehouse: bool,
}

impl From<CreateTransactionRequest> for NewTrade {
    fn from(req: CreateTransactionRequest) -> Self {
        Self {
            item_id: req.item_id,
            buyer_id: req.buyer_id,
            seller_id: req.seller_id,
            price: req.price,
            quantity: if req.quantity == 0 { 1 } else { req.quantity },
            transaction_type: req.transaction_type,
            warehouse: req.warehouse,
        }
    }
}

/// Request body for `POST /api/reviews`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateReviewRequest {
    /// Reviewing buyer.
    pub reviewer_id: String,
    /// Reviewed seller.
    pub reviewee_id: String,
    /// Rating from 1 to 5.
    pub rating: f64,
    /// Free-text comment.
    pub comment: Option<String>,
}
