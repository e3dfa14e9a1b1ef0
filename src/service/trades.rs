//! Purchase completion, transaction records and reviews.
//!
//! A purchase flips the item to sold out, moves the seller's listing count
//! and both parties' transaction counts, and writes the transaction row.
//! All of it happens in one database transaction; any failure leaves the
//! database untouched.

use sqlx::{SqliteConnection, SqlitePool};

use crate::domain::EntityId;
use crate::error::MarketError;
use crate::persistence::counters;
use crate::persistence::models::{
    AdminTransactionRow, ReviewRow, TransactionRow, UserTransactionRow,
};
use crate::service::ensure_exists;

/// Transaction type that triggers the purchase side effects.
pub const PURCHASE: &str = "purchase";

const TRANSACTION_COLUMNS: &str = "SELECT id, item_id, buyer_id, seller_id, price, quantity,
    transaction_type, warehouse, status, created_at FROM transactions WHERE id = ?";

/// A trade to record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTrade {
    /// Traded item.
    pub item_id: String,
    /// Buyer.
    pub buyer_id: String,
    /// Seller.
    pub seller_id: String,
    /// Price paid.
    pub price: i64,
    /// Quantity, at least 1.
    pub quantity: i64,
    /// `purchase`, `invest`, ...
    pub transaction_type: String,
    /// Whether the item goes to warehouse storage.
    pub warehouse: bool,
}

impl NewTrade {
    /// A single-unit purchase, as produced by the checkout flow.
    #[must_use]
    pub fn purchase(item_id: &str, buyer_id: &str, seller_id: &str, price: i64, warehouse: bool) -> Self {
        Self {
            item_id: item_id.to_string(),
            buyer_id: buyer_id.to_string(),
            seller_id: seller_id.to_string(),
            price,
            quantity: 1,
            transaction_type: PURCHASE.to_string(),
            warehouse,
        }
    }

    fn validate(&self) -> Result<(), MarketError> {
        for (name, value) in [
            ("itemId", &self.item_id),
            ("buyerId", &self.buyer_id),
            ("sellerId", &self.seller_id),
            ("transactionType", &self.transaction_type),
        ] {
            if value.trim().is_empty() {
                return Err(MarketError::InvalidRequest(format!("{name} is required")));
            }
        }
        if self.buyer_id == self.seller_id {
            return Err(MarketError::InvalidRequest("cannot buy your own item".to_string()));
        }
        if self.price < 0 {
            return Err(MarketError::InvalidRequest("price must not be negative".to_string()));
        }
        if self.quantity < 1 {
            return Err(MarketError::InvalidRequest("quantity must be at least 1".to_string()));
        }
        Ok(())
    }

    fn is_purchase(&self) -> bool {
        self.transaction_type == PURCHASE
    }
}

/// Transactions and reviews.
#[derive(Debug, Clone)]
pub struct TradeService {
    pool: SqlitePool,
}

impl TradeService {
    /// Creates a new `TradeService`.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Completes a purchase atomically.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::NotFound`] for an unknown item, buyer or seller,
    /// [`MarketError::InvalidRequest`] if the item is already sold out, is
    /// listed by someone other than `seller_id`, or is bought by its own
    /// seller, and
    /// [`MarketError::Storage`] if any step fails (nothing is applied).
    pub async fn complete_purchase(&self, trade: NewTrade) -> Result<TransactionRow, MarketError> {
        let trade = NewTrade {
            transaction_type: PURCHASE.to_string(),
            ..trade
        };
        self.record(trade).await
    }

    /// Records a trade of any type. Purchases get the same side effects as
    /// [`TradeService::complete_purchase`]; trades of investment items also
    /// append a price-history point.
    ///
    /// # Errors
    ///
    /// See [`TradeService::complete_purchase`].
    pub async fn create_transaction(&self, trade: NewTrade) -> Result<TransactionRow, MarketError> {
        self.record(trade).await
    }

    async fn record(&self, trade: NewTrade) -> Result<TransactionRow, MarketError> {
        trade.validate()?;
        let mut tx = self.pool.begin().await?;

        let state: Option<(Option<String>, bool, bool)> = sqlx::query_as(
            "SELECT seller_id, is_sold_out, is_invest_item FROM items WHERE id = ?",
        )
        .bind(&trade.item_id)
        .fetch_optional(&mut *tx)
        .await?;
        let Some((listed_by, sold_out, invest_item)) = state else {
            return Err(MarketError::not_found("item", trade.item_id));
        };
        if listed_by.as_deref() != Some(trade.seller_id.as_str()) {
            return Err(MarketError::InvalidRequest(format!(
                "{} is not the seller of item {}",
                trade.seller_id, trade.item_id
            )));
        }
        ensure_exists(&mut *tx, "users", "user", &trade.buyer_id).await?;
        ensure_exists(&mut *tx, "users", "user", &trade.seller_id).await?;

        if trade.is_purchase() {
            if sold_out {
                return Err(MarketError::InvalidRequest(format!(
                    "item {} is already sold out",
                    trade.item_id
                )));
            }
            apply_purchase_effects(&mut *tx, &trade).await?;
        }

        let id = EntityId::generate();
        sqlx::query(
            "INSERT INTO transactions (id, item_id, buyer_id, seller_id, price, quantity,
                transaction_type, warehouse, status)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, 'completed')",
        )
        .bind(id.as_str())
        .bind(&trade.item_id)
        .bind(&trade.buyer_id)
        .bind(&trade.seller_id)
        .bind(trade.price)
        .bind(trade.quantity)
        .bind(&trade.transaction_type)
        .bind(trade.warehouse)
        .execute(&mut *tx)
        .await?;

        if invest_item {
            sqlx::query("INSERT INTO price_history (id, item_id, price) VALUES (?, ?, ?)")
                .bind(EntityId::generate().as_str())
                .bind(&trade.item_id)
                .bind(trade.price)
                .execute(&mut *tx)
                .await?;
        }

        let row = sqlx::query_as::<_, TransactionRow>(TRANSACTION_COLUMNS)
            .bind(id.as_str())
            .fetch_one(&mut *tx)
            .await?;
        tx.commit().await?;

        tracing::info!(
            transaction_id = %id,
            item_id = %trade.item_id,
            kind = %trade.transaction_type,
            price = trade.price,
            "transaction recorded"
        );
        Ok(row)
    }

    /// Transactions where the user is buyer or seller, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::Storage`] on database failure.
    pub async fn user_transactions(&self, user_id: &str) -> Result<Vec<UserTransactionRow>, MarketError> {
        Ok(sqlx::query_as::<_, UserTransactionRow>(
            "SELECT t.id, t.item_id, t.buyer_id, t.seller_id, t.price, t.quantity,
                    t.transaction_type, t.warehouse, t.status, t.created_at,
                    i.title AS item_title, i.image_url AS item_image_url
             FROM transactions t LEFT JOIN items i ON i.id = t.item_id
             WHERE t.buyer_id = ?1 OR t.seller_id = ?1
             ORDER BY t.created_at DESC, t.id DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?)
    }

    /// Every transaction with party names, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::Storage`] on database failure.
    pub async fn all_transactions(&self) -> Result<Vec<AdminTransactionRow>, MarketError> {
        Ok(sqlx::query_as::<_, AdminTransactionRow>(
            "SELECT t.id, t.item_id, t.buyer_id, t.seller_id, t.price, t.quantity,
                    t.transaction_type, t.warehouse, t.status, t.created_at,
                    i.title AS item_title, b.name AS buyer_name, s.name AS seller_name
             FROM transactions t
             LEFT JOIN items i ON i.id = t.item_id
             LEFT JOIN users b ON b.id = t.buyer_id
             LEFT JOIN users s ON s.id = t.seller_id
             ORDER BY t.created_at DESC, t.id DESC",
        )
        .fetch_all(&self.pool)
        .await?)
    }

    /// Writes a review and refreshes the reviewee's rating.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::InvalidRequest`] for a self-review or a rating
    /// outside `1..=5`, and [`MarketError::Forbidden`] when the reviewer
    /// never completed a purchase from the reviewee.
    pub async fn create_review(
        &self,
        reviewer_id: &str,
        reviewee_id: &str,
        rating: f64,
        comment: Option<&str>,
    ) -> Result<ReviewRow, MarketError> {
        if reviewer_id == reviewee_id {
            return Err(MarketError::InvalidRequest("cannot review yourself".to_string()));
        }
        if !(1.0..=5.0).contains(&rating) {
            return Err(MarketError::InvalidRequest(
                "rating must be between 1 and 5".to_string(),
            ));
        }

        let mut tx = self.pool.begin().await?;
        let purchases: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM transactions
             WHERE buyer_id = ? AND seller_id = ? AND status = 'completed'",
        )
        .bind(reviewer_id)
        .bind(reviewee_id)
        .fetch_one(&mut *tx)
        .await?;
        if purchases == 0 {
            return Err(MarketError::Forbidden(
                "reviews require a completed purchase from this seller".to_string(),
            ));
        }

        let id = EntityId::generate();
        sqlx::query(
            "INSERT INTO user_reviews (id, reviewer_id, reviewee_id, rating, comment) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(id.as_str())
        .bind(reviewer_id)
        .bind(reviewee_id)
        .bind(rating)
        .bind(comment)
        .execute(&mut *tx)
        .await?;
        counters::recompute_rating(&mut *tx, reviewee_id).await?;

        let row = sqlx::query_as::<_, ReviewRow>(
            "SELECT id, reviewer_id, reviewee_id, rating, comment, created_at FROM user_reviews WHERE id = ?",
        )
        .bind(id.as_str())
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;

        tracing::info!(reviewer_id, reviewee_id, rating, "review created");
        Ok(row)
    }

    /// Reviews received by a user, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::Storage`] on database failure.
    pub async fn user_reviews(&self, user_id: &str) -> Result<Vec<ReviewRow>, MarketError> {
        Ok(sqlx::query_as::<_, ReviewRow>(
            "SELECT id, reviewer_id, reviewee_id, rating, comment, created_at FROM user_reviews
             WHERE reviewee_id = ? ORDER BY created_at DESC, id DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?)
    }
}

async fn apply_purchase_effects(conn: &mut SqliteConnection, trade: &NewTrade) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE items SET is_sold_out = 1 WHERE id = ?")
        .bind(&trade.item_id)
        .execute(&mut *conn)
        .await?;
    sqlx::query("UPDATE users SET listings_count = MAX(0, listings_count - 1) WHERE id = ?")
        .bind(&trade.seller_id)
        .execute(&mut *conn)
        .await?;
    sqlx::query("UPDATE users SET transaction_count = transaction_count + 1 WHERE id IN (?, ?)")
        .bind(&trade.seller_id)
        .bind(&trade.buyer_id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}
