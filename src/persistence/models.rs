//! Database row models.
//!
//! Rows are decoded with `sqlx::FromRow` and serialized in camelCase, so
//! handlers can return them as response bodies unchanged.

use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;

/// A `users` row.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserRow {
    /// User ID.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Avatar image URL.
    pub avatar_url: Option<String>,
    /// Free-text profile.
    pub bio: Option<String>,
    /// Average received review rating; `None` until the first review.
    pub rating: Option<f64>,
    /// Number of unsold items listed by the user.
    pub listings_count: i64,
    /// Number of transactions the user took part in.
    pub transaction_count: i64,
    /// Number of followers.
    pub follower_count: i64,
    /// Number of received reviews.
    pub review_count: i64,
    /// Administrator flag.
    pub is_admin: bool,
}

/// An item row joined with its seller's ranking statistics.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ItemRow {
    /// Item ID.
    pub id: String,
    /// Title.
    pub title: String,
    /// Price in whole currency units.
    pub price: i64,
    /// Description.
    pub description: Option<String>,
    /// Condition label.
    pub condition: Option<String>,
    /// Category code.
    pub category: Option<String>,
    /// Primary image URL.
    pub image_url: String,
    /// Whether the item has been purchased.
    pub is_sold_out: bool,
    /// Seller user ID.
    pub seller_id: Option<String>,
    /// Investment listing flag.
    pub is_invest_item: bool,
    /// Detail page views.
    pub view_count: i64,
    /// Number of `like` reactions.
    pub like_count: i64,
    /// Number of `watch` reactions.
    pub watch_count: i64,
    /// Pooling key for price history of identical products.
    pub product_group: Option<String>,
    /// Seller's average rating.
    pub seller_rating: Option<f64>,
    /// Ranking score used by the default sort.
    pub priority_score: f64,
}

/// An `item_reactions` row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReactionRow {
    /// Reaction ID.
    pub id: String,
    /// Item reacted to.
    pub item_id: String,
    /// Reacting user.
    pub user_id: String,
    /// `like` or `watch`.
    pub reaction_type: String,
    /// Creation timestamp.
    pub created_at: String,
}

/// A `user_follows` row joined with the counterpart's profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FollowRow {
    /// Follow relation ID.
    pub id: String,
    /// Following user.
    pub follower_id: String,
    /// Followed user.
    pub followee_id: String,
    /// Display name of the listed counterpart.
    pub user_name: Option<String>,
    /// Avatar of the listed counterpart.
    pub user_avatar_url: Option<String>,
    /// Creation timestamp.
    pub created_at: String,
}

/// A `user_reviews` row.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReviewRow {
    /// Review ID.
    pub id: String,
    /// Author.
    pub reviewer_id: String,
    /// Reviewed user.
    pub reviewee_id: String,
    /// Rating in `1..=5`.
    pub rating: f64,
    /// Optional comment.
    pub comment: Option<String>,
    /// Creation timestamp.
    pub created_at: String,
}

/// A `transactions` row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRow {
    /// Transaction ID.
    pub id: String,
    /// Purchased item.
    pub item_id: String,
    /// Buyer.
    pub buyer_id: String,
    /// Seller.
    pub seller_id: String,
    /// Price paid.
    pub price: i64,
    /// Quantity.
    pub quantity: i64,
    /// `purchase` or `invest`.
    pub transaction_type: String,
    /// Whether the item went into warehouse storage.
    pub warehouse: bool,
    /// Status, `completed` unless set otherwise.
    pub status: String,
    /// Creation timestamp.
    pub created_at: String,
}

/// A transaction joined with its item, for per-user history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserTransactionRow {
    /// Transaction columns.
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub transaction: TransactionRow,
    /// Item title.
    pub item_title: Option<String>,
    /// Item image.
    pub item_image_url: Option<String>,
}

/// A transaction joined with both parties' names, for the admin list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdminTransactionRow {
    /// Transaction columns.
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub transaction: TransactionRow,
    /// Item title.
    pub item_title: Option<String>,
    /// Buyer display name.
    pub buyer_name: Option<String>,
    /// Seller display name.
    pub seller_name: Option<String>,
}

/// A `price_history` row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PriceHistoryRow {
    /// Source row ID (transaction or recorded point).
    pub id: String,
    /// Item the price belongs to.
    pub item_id: String,
    /// Recorded price.
    pub price: i64,
    /// When the price was recorded.
    pub recorded_at: String,
}

/// Grading info of an investment item joined with its asset record.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InvestmentAssetRow {
    /// Item the asset describes.
    pub item_id: String,
    /// Grading company.
    pub grader: String,
    /// Numeric grade.
    pub grade: Option<f64>,
    /// Grading certificate number.
    pub cert_number: Option<String>,
    /// Purchase date as supplied by the client.
    pub purchase_date: Option<String>,
    /// Original purchase price.
    pub original_price: Option<i64>,
    /// Current estimated value.
    pub estimated_value: Option<i64>,
}

/// A `warehouse_storage` row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WarehouseStorageRow {
    /// Storage record ID.
    pub id: String,
    /// Stored item.
    pub item_id: String,
    /// Warehouse identifier.
    pub warehouse_id: String,
    /// Estimated value.
    pub estimated_value: Option<i64>,
    /// When the item entered storage.
    pub storage_date: String,
}

/// A `conversations` row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConversationRow {
    /// Conversation ID.
    pub id: String,
    /// Item the conversation is about.
    pub item_id: String,
    /// Buyer.
    pub buyer_id: String,
    /// Seller.
    pub seller_id: String,
    /// Creation timestamp.
    pub created_at: String,
    /// Timestamp of the latest message.
    pub updated_at: String,
}

/// A `messages` row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MessageRow {
    /// Message ID.
    pub id: String,
    /// Owning conversation.
    pub conversation_id: String,
    /// Author.
    pub sender_id: String,
    /// Text content.
    pub content: String,
    /// Creation timestamp.
    pub created_at: String,
}

/// A `user_reports` row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReportRow {
    /// Report ID.
    pub id: String,
    /// Reporting user.
    pub reporter_id: String,
    /// Reported user.
    pub reported_user_id: String,
    /// Short reason.
    pub reason: String,
    /// Free-text description.
    pub description: Option<String>,
    /// `pending` until handled.
    pub status: String,
    /// Creation timestamp.
    pub created_at: String,
}

/// A user row with the number of reports filed against the user.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdminUserRow {
    /// User columns.
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub user: UserRow,
    /// Reports against this user.
    pub report_count: i64,
}
