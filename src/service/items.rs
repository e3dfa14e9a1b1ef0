//! Item service: listing reads, listing creation, investment metadata,
//! warehouse storage and price history.

use sqlx::SqlitePool;

use crate::domain::{EntityId, ItemFilter};
use crate::error::MarketError;
use crate::persistence::item_query;
use crate::persistence::models::{
    InvestmentAssetRow, ItemRow, PriceHistoryRow, WarehouseStorageRow,
};

/// Smallest accepted listing price.
pub const MIN_LISTING_PRICE: i64 = 300;
/// Largest accepted listing price.
pub const MAX_LISTING_PRICE: i64 = 9_999_999;
/// Maximum number of images per listing.
pub const MAX_LISTING_IMAGES: usize = 10;

/// Validated input for [`ItemService::create_listing`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewListing {
    /// Title.
    pub title: String,
    /// Description.
    pub description: String,
    /// Price in whole currency units.
    pub price: i64,
    /// Category code.
    pub category: String,
    /// Condition label.
    pub condition: String,
    /// Image URLs; the first becomes the primary image.
    pub image_urls: Vec<String>,
    /// Seller user ID.
    pub seller_id: String,
    /// Investment listing flag.
    pub is_investment: bool,
}

impl NewListing {
    fn validate(&self) -> Result<(), MarketError> {
        for (name, value) in [
            ("title", &self.title),
            ("description", &self.description),
            ("categoryId", &self.category),
            ("condition", &self.condition),
            ("sellerId", &self.seller_id),
        ] {
            if value.trim().is_empty() {
                return Err(MarketError::InvalidRequest(format!("{name} is required")));
            }
        }
        if !(MIN_LISTING_PRICE..=MAX_LISTING_PRICE).contains(&self.price) {
            return Err(MarketError::InvalidRequest(format!(
                "price must be between {MIN_LISTING_PRICE} and {MAX_LISTING_PRICE}"
            )));
        }
        if self.image_urls.is_empty() || self.image_urls.len() > MAX_LISTING_IMAGES {
            return Err(MarketError::InvalidRequest(format!(
                "imageUrls must contain 1 to {MAX_LISTING_IMAGES} entries"
            )));
        }
        Ok(())
    }
}

/// Grading and valuation data attached to an investment item.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewInvestmentAsset {
    /// Item the data belongs to.
    pub item_id: String,
    /// Grading company.
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

/// IDs of the two rows written by [`ItemService::create_investment_asset`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvestmentAssetIds {
    /// `investment_assets` row.
    pub asset_id: EntityId,
    /// `grading_info` row.
    pub grading_id: EntityId,
}

/// Item reads and writes.
#[derive(Debug, Clone)]
pub struct ItemService {
    pool: SqlitePool,
}

impl ItemService {
    /// Creates a new `ItemService`.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Lists unsold items matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::Storage`] on database failure.
    pub async fn list_items(&self, filter: &ItemFilter) -> Result<Vec<ItemRow>, MarketError> {
        Ok(item_query::list_items(&self.pool, filter).await?)
    }

    /// Loads one item with its seller rating and live watch count.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::NotFound`] if the item does not exist.
    pub async fn get_item(&self, id: &str) -> Result<ItemRow, MarketError> {
        item_query::get_item(&self.pool, id)
            .await?
            .ok_or_else(|| MarketError::not_found("item", id))
    }

    /// Adds one view and returns the updated item.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::NotFound`] if the item does not exist.
    pub async fn increment_view(&self, id: &str) -> Result<ItemRow, MarketError> {
        let done = sqlx::query("UPDATE items SET view_count = view_count + 1 WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if done.rows_affected() == 0 {
            return Err(MarketError::not_found("item", id));
        }
        self.get_item(id).await
    }

    /// Inserts a listing and bumps the seller's `listings_count` in one
    /// transaction.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::InvalidRequest`] for invalid input,
    /// [`MarketError::NotFound`] for an unknown seller, and
    /// [`MarketError::Storage`] if either write fails (nothing is kept).
    pub async fn create_listing(&self, listing: NewListing) -> Result<ItemRow, MarketError> {
        listing.validate()?;
        let item_id = EntityId::generate();
        let primary_image = listing.image_urls.first().cloned().unwrap_or_default();

        let mut tx = self.pool.begin().await?;
        let seller_known: Option<i64> = sqlx::query_scalar("SELECT 1 FROM users WHERE id = ?")
            .bind(&listing.seller_id)
            .fetch_optional(&mut *tx)
            .await?;
        if seller_known.is_none() {
            return Err(MarketError::not_found("user", listing.seller_id));
        }

        sqlx::query(
            "INSERT INTO items (id, title, price, description, condition, category, image_url,
                is_sold_out, seller_id, is_invest_item)
             VALUES (?, ?, ?, ?, ?, ?, ?, 0, ?, ?)",
        )
        .bind(item_id.as_str())
        .bind(&listing.title)
        .bind(listing.price)
        .bind(&listing.description)
        .bind(&listing.condition)
        .bind(&listing.category)
        .bind(&primary_image)
        .bind(&listing.seller_id)
        .bind(listing.is_investment)
        .execute(&mut *tx)
        .await?;

        sqlx::query("UPDATE users SET listings_count = listings_count + 1 WHERE id = ?")
            .bind(&listing.seller_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        tracing::info!(item_id = %item_id, seller_id = %listing.seller_id, "listing created");
        self.get_item(item_id.as_str()).await
    }

    /// Stores grading info and the investment asset record of an item.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::NotFound`] for an unknown item and
    /// [`MarketError::Storage`] if either insert fails (nothing is kept).
    pub async fn create_investment_asset(
        &self,
        asset: NewInvestmentAsset,
    ) -> Result<InvestmentAssetIds, MarketError> {
        self.ensure_item_exists(&asset.item_id).await?;
        let ids = InvestmentAssetIds {
            asset_id: EntityId::generate(),
            grading_id: EntityId::generate(),
        };

        let mut tx = self.pool.begin().await?;
        sqlx::query(
            "INSERT INTO grading_info (id, item_id, grader, grade, cert_number) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(ids.grading_id.as_str())
        .bind(&asset.item_id)
        .bind(&asset.grader)
        .bind(asset.grade)
        .bind(&asset.cert_number)
        .execute(&mut *tx)
        .await?;
        sqlx::query(
            "INSERT INTO investment_assets (id, item_id, purchase_date, original_price, estimated_value)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(ids.asset_id.as_str())
        .bind(&asset.item_id)
        .bind(&asset.purchase_date)
        .bind(asset.original_price)
        .bind(asset.estimated_value)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;

        Ok(ids)
    }

    /// Loads the investment data of an item.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::NotFound`] if no grading info exists.
    pub async fn investment_asset(&self, item_id: &str) -> Result<InvestmentAssetRow, MarketError> {
        sqlx::query_as::<_, InvestmentAssetRow>(
            "SELECT g.item_id, g.grader, g.grade, g.cert_number,
                    a.purchase_date, a.original_price, a.estimated_value
             FROM grading_info g
             LEFT JOIN investment_assets a ON a.item_id = g.item_id
             WHERE g.item_id = ?",
        )
        .bind(item_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| MarketError::not_found("investment asset", item_id))
    }

    /// Records that an item is held in a warehouse.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::NotFound`] for an unknown item.
    pub async fn create_warehouse_storage(
        &self,
        item_id: &str,
        warehouse_id: &str,
        estimated_value: i64,
    ) -> Result<EntityId, MarketError> {
        if warehouse_id.trim().is_empty() {
            return Err(MarketError::InvalidRequest("warehouseId is required".to_string()));
        }
        self.ensure_item_exists(item_id).await?;
        let id = EntityId::generate();
        sqlx::query(
            "INSERT INTO warehouse_storage (id, item_id, warehouse_id, estimated_value) VALUES (?, ?, ?, ?)",
        )
        .bind(id.as_str())
        .bind(item_id)
        .bind(warehouse_id)
        .bind(estimated_value)
        .execute(&self.pool)
        .await?;
        Ok(id)
    }

    /// Loads the warehouse record of an item.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::NotFound`] if the item is not stored.
    pub async fn warehouse_storage(&self, item_id: &str) -> Result<WarehouseStorageRow, MarketError> {
        sqlx::query_as::<_, WarehouseStorageRow>(
            "SELECT id, item_id, warehouse_id, estimated_value, storage_date
             FROM warehouse_storage WHERE item_id = ?",
        )
        .bind(item_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| MarketError::not_found("warehouse storage", item_id))
    }

    /// Price history of an item, oldest first.
    ///
    /// Items sharing a `product_group` pool their history. Completed
    /// transactions are preferred; recorded `price_history` points are
    /// returned only when there are none. Unknown items yield an empty list.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::Storage`] on database failure.
    pub async fn price_history(&self, item_id: &str) -> Result<Vec<PriceHistoryRow>, MarketError> {
        let group: Option<Option<String>> =
            sqlx::query_scalar("SELECT product_group FROM items WHERE id = ?")
                .bind(item_id)
                .fetch_optional(&self.pool)
                .await?;
        let group = group.flatten().filter(|g| !g.is_empty());

        let (trades, recorded) = match &group {
            Some(_) => (
                "SELECT t.id, t.item_id, t.price, t.created_at AS recorded_at
                 FROM transactions t JOIN items i ON i.id = t.item_id
                 WHERE i.product_group = ? AND t.status = 'completed'
                 ORDER BY t.created_at ASC, t.id ASC",
                "SELECT ph.id, ph.item_id, ph.price, ph.recorded_at
                 FROM price_history ph JOIN items i ON i.id = ph.item_id
                 WHERE i.product_group = ?
                 ORDER BY ph.recorded_at ASC, ph.id ASC",
            ),
            None => (
                "SELECT id, item_id, price, created_at AS recorded_at
                 FROM transactions
                 WHERE item_id = ? AND status = 'completed'
                 ORDER BY created_at ASC, id ASC",
                "SELECT id, item_id, price, recorded_at
                 FROM price_history WHERE item_id = ?
                 ORDER BY recorded_at ASC, id ASC",
            ),
        };
        let key = group.as_deref().unwrap_or(item_id);

        let history = sqlx::query_as::<_, PriceHistoryRow>(trades)
            .bind(key)
            .fetch_all(&self.pool)
            .await?;
        if !history.is_empty() {
            return Ok(history);
        }
        Ok(sqlx::query_as::<_, PriceHistoryRow>(recorded)
            .bind(key)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn ensure_item_exists(&self, item_id: &str) -> Result<(), MarketError> {
        let found: Option<i64> = sqlx::query_scalar("SELECT 1 FROM items WHERE id = ?")
            .bind(item_id)
            .fetch_optional(&self.pool)
            .await?;
        found
            .map(|_| ())
            .ok_or_else(|| MarketError::not_found("item", item_id))
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::persistence::connect_in_memory;

    async fn service() -> (ItemService, SqlitePool) {
        let Ok(pool) = connect_in_memory().await else {
            panic!("in-memory database unavailable");
        };
        let seed = sqlx::query("INSERT INTO users (id, name, listings_count) VALUES ('s1', 'Seller', 0)")
            .execute(&pool)
            .await;
        assert!(seed.is_ok());
        (ItemService::new(pool.clone()), pool)
    }

    fn listing() -> NewListing {
        NewListing {
            title: "Vintage camera".to_string(),
            description: "Works fine, minor scratches".to_string(),
            price: 12_000,
            category: "120".to_string(),
            condition: "good".to_string(),
            image_urls: vec!["https://img/1.png".to_string(), "https://img/2.png".to_string()],
            seller_id: "s1".to_string(),
            is_investment: false,
        }
    }

    async fn listings_count(pool: &SqlitePool) -> i64 {
        sqlx::query_scalar("SELECT listings_count FROM users WHERE id = 's1'")
            .fetch_one(pool)
            .await
            .unwrap_or(-1)
    }

    #[tokio::test]
    async fn create_listing_inserts_item_and_bumps_count() {
        let (svc, pool) = service().await;
        let Ok(item) = svc.create_listing(listing()).await else {
            panic!("create_listing failed");
        };
        assert_eq!(item.image_url, "https://img/1.png");
        assert!(!item.is_sold_out);
        assert_eq!(listings_count(&pool).await, 1);
    }

    #[tokio::test]
    async fn create_listing_validates_price_and_images() {
        let (svc, pool) = service().await;
        let cheap = NewListing { price: 299, ..listing() };
        assert!(matches!(svc.create_listing(cheap).await, Err(MarketError::InvalidRequest(_))));

        let too_many = NewListing {
            image_urls: vec!["x".to_string(); 11],
            ..listing()
        };
        assert!(matches!(svc.create_listing(too_many).await, Err(MarketError::InvalidRequest(_))));

        let boundary = NewListing { price: MAX_LISTING_PRICE, ..listing() };
        assert!(svc.create_listing(boundary).await.is_ok());
        assert_eq!(listings_count(&pool).await, 1);
    }

    #[tokio::test]
    async fn create_listing_rejects_unknown_seller() {
        let (svc, _pool) = service().await;
        let orphan = NewListing { seller_id: "ghost".to_string(), ..listing() };
        assert!(matches!(svc.create_listing(orphan).await, Err(MarketError::NotFound { .. })));
    }

    #[tokio::test]
    async fn increment_view_updates_or_reports_missing() {
        let (svc, _pool) = service().await;
        let Ok(item) = svc.create_listing(listing()).await else {
            panic!("create_listing failed");
        };
        let Ok(viewed) = svc.increment_view(&item.id).await else {
            panic!("increment_view failed");
        };
        assert_eq!(viewed.view_count, 1);
        assert!(matches!(svc.increment_view("nope").await, Err(MarketError::NotFound { .. })));
    }

    #[tokio::test]
    async fn price_history_prefers_trades_then_recorded_points() {
        let (svc, pool) = service().await;
        let seed = [
            "INSERT INTO users (id, name) VALUES ('b1', 'Buyer')",
            "INSERT INTO items (id, title, price, image_url, seller_id, product_group) VALUES
             ('g1', 'Card A', 1000, 'x', 's1', 'card'), ('g2', 'Card B', 1000, 'x', 's1', 'card'),
             ('solo', 'Solo', 500, 'x', 's1', NULL)",
            "INSERT INTO price_history (id, item_id, price, recorded_at) VALUES
             ('p1', 'solo', 400, '2024-01-01 00:00:00'), ('p2', 'solo', 450, '2024-02-01 00:00:00')",
            "INSERT INTO transactions (id, item_id, buyer_id, seller_id, price, transaction_type, created_at) VALUES
             ('t2', 'g2', 'b1', 's1', 1200, 'purchase', '2024-03-01 00:00:00'),
             ('t1', 'g1', 'b1', 's1', 1100, 'purchase', '2024-02-01 00:00:00')",
        ];
        for sql in seed {
            if let Err(e) = sqlx::query(sql).execute(&pool).await {
                panic!("seed failed: {e}");
            }
        }

        let Ok(pooled) = svc.price_history("g1").await else {
            panic!("price_history failed");
        };
        let prices: Vec<i64> = pooled.iter().map(|p| p.price).collect();
        assert_eq!(prices, [1100, 1200]);

        let Ok(recorded) = svc.price_history("solo").await else {
            panic!("price_history failed");
        };
        let prices: Vec<i64> = recorded.iter().map(|p| p.price).collect();
        assert_eq!(prices, [400, 450]);

        assert!(matches!(svc.price_history("unknown").await, Ok(h) if h.is_empty()));
    }

    #[tokio::test]
    async fn investment_and_warehouse_records_round_trip() {
        let (svc, _pool) = service().await;
        let Ok(item) = svc.create_listing(NewListing { is_investment: true, ..listing() }).await
        else {
            panic!("create_listing failed");
        };

        let asset = NewInvestmentAsset {
            item_id: item.id.clone(),
            grader: "PSA".to_string(),
            grade: Some(9.5),
            estimated_value: Some(20_000),
            ..NewInvestmentAsset::default()
        };
        assert!(svc.create_investment_asset(asset).await.is_ok());
        let Ok(stored) = svc.investment_asset(&item.id).await else {
            panic!("investment_asset failed");
        };
        assert_eq!(stored.grader, "PSA");
        assert_eq!(stored.estimated_value, Some(20_000));

        assert!(svc.create_warehouse_storage(&item.id, "tokyo-1", 20_000).await.is_ok());
        let Ok(storage) = svc.warehouse_storage(&item.id).await else {
            panic!("warehouse_storage failed");
        };
        assert_eq!(storage.warehouse_id, "tokyo-1");
        assert!(matches!(svc.warehouse_storage("none").await, Err(MarketError::NotFound { .. })));
    }
}
