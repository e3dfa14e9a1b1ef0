//! User profiles and the combined user/item search.

use serde::Serialize;
use sqlx::{FromRow, QueryBuilder, Sqlite, SqlitePool};
use utoipa::ToSchema;

use crate::error::MarketError;
use crate::persistence::models::UserRow;

/// Maximum rows per entity returned by [`UserService::search`].
pub const SEARCH_LIMIT: i64 = 20;

const USER_COLUMNS: &str = "SELECT id, name, avatar_url, bio, rating,
    COALESCE(listings_count, 0) AS listings_count,
    COALESCE(transaction_count, 0) AS transaction_count,
    COALESCE(follower_count, 0) AS follower_count,
    COALESCE(review_count, 0) AS review_count,
    COALESCE(is_admin, 0) AS is_admin
    FROM users";

/// Editable profile fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileUpdate {
    /// Display name.
    pub name: String,
    /// Avatar URL.
    pub avatar_url: Option<String>,
    /// Free-text profile.
    pub bio: Option<String>,
}

/// A user hit of [`UserService::search`].
#[derive(Debug, Clone, PartialEq, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserHit {
    /// User ID.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Avatar URL.
    pub avatar_url: Option<String>,
    /// Average rating.
    pub rating: Option<f64>,
}

/// An item hit of [`UserService::search`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ItemHit {
    /// Item ID.
    pub id: String,
    /// Title.
    pub title: String,
    /// Price.
    pub price: i64,
    /// Primary image.
    pub image_url: String,
    /// Seller.
    pub seller_id: Option<String>,
}

/// Result of [`UserService::search`].
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct SearchResults {
    /// Users whose name matches.
    pub users: Vec<UserHit>,
    /// Items whose title or description matches.
    pub items: Vec<ItemHit>,
}

/// User reads and profile writes.
#[derive(Debug, Clone)]
pub struct UserService {
    pool: SqlitePool,
}

impl UserService {
    /// Creates a new `UserService`.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// All users.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::Storage`] on database failure.
    pub async fn list_users(&self) -> Result<Vec<UserRow>, MarketError> {
        Ok(sqlx::query_as::<_, UserRow>(&format!("{USER_COLUMNS} ORDER BY id"))
            .fetch_all(&self.pool)
            .await?)
    }

    /// One user.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::NotFound`] if the user does not exist.
    pub async fn get_user(&self, id: &str) -> Result<UserRow, MarketError> {
        self.find_user(id)
            .await?
            .ok_or_else(|| MarketError::not_found("user", id))
    }

    /// One user, if present.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::Storage`] on database failure.
    pub async fn find_user(&self, id: &str) -> Result<Option<UserRow>, MarketError> {
        Ok(sqlx::query_as::<_, UserRow>(&format!("{USER_COLUMNS} WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    /// Creates the user or updates its profile fields. Counters and the
    /// admin flag are never touched.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::InvalidRequest`] when the name is blank.
    pub async fn upsert_user(&self, id: &str, profile: ProfileUpdate) -> Result<UserRow, MarketError> {
        if profile.name.trim().is_empty() {
            return Err(MarketError::InvalidRequest("name is required".to_string()));
        }
        sqlx::query(
            "INSERT INTO users (id, name, avatar_url, bio) VALUES (?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                avatar_url = excluded.avatar_url,
                bio = excluded.bio",
        )
        .bind(id)
        .bind(profile.name.trim())
        .bind(&profile.avatar_url)
        .bind(&profile.bio)
        .execute(&self.pool)
        .await?;
        tracing::info!(user_id = id, "profile upserted");
        self.get_user(id).await
    }

    /// Whether `id` names an existing administrator.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::Storage`] on database failure.
    pub async fn is_admin(&self, id: &str) -> Result<bool, MarketError> {
        let flag: Option<bool> =
            sqlx::query_scalar("SELECT COALESCE(is_admin, 0) FROM users WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(flag.unwrap_or(false))
    }

    /// Users by name and items by title or description, up to
    /// [`SEARCH_LIMIT`] each.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::InvalidRequest`] for a blank query.
    pub async fn search(&self, query: &str, category: Option<&str>) -> Result<SearchResults, MarketError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(MarketError::InvalidRequest("query parameter 'q' is required".to_string()));
        }
        let pattern = format!("%{query}%");

        let users = sqlx::query_as::<_, UserHit>(
            "SELECT id, name, avatar_url, rating FROM users WHERE name LIKE ? ORDER BY id LIMIT ?",
        )
        .bind(&pattern)
        .bind(SEARCH_LIMIT)
        .fetch_all(&self.pool)
        .await?;

        let mut qb = QueryBuilder::<Sqlite>::new(
            "SELECT id, title, price, image_url, seller_id FROM items WHERE (title LIKE ",
        );
        qb.push_bind(pattern.clone())
            .push(" OR description LIKE ")
            .push_bind(pattern)
            .push(")");
        if let Some(code) = category.map(str::trim).filter(|c| !c.is_empty()) {
            qb.push(" AND category = ").push_bind(code.to_string());
        }
        qb.push(" ORDER BY id LIMIT ").push_bind(SEARCH_LIMIT);
        let items = qb.build_query_as::<ItemHit>().fetch_all(&self.pool).await?;

        Ok(SearchResults { users, items })
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::persistence::connect_in_memory;

    async fn service() -> UserService {
        let Ok(pool) = connect_in_memory().await else {
            panic!("in-memory database unavailable");
        };
        let seed = [
            "INSERT INTO users (id, name, is_admin) VALUES ('u1', 'Alice Smith', 1), ('u2', 'Bob', 0)",
            "INSERT INTO items (id, title, description, price, category, image_url, seller_id) VALUES
             ('i1', 'Smith chair', 'oak', 3000, '120', 'x', 'u1'),
             ('i2', 'Table', 'by a smith', 5000, '110', 'x', 'u1')",
        ];
        for sql in seed {
            if let Err(e) = sqlx::query(sql).execute(&pool).await {
                panic!("seed failed: {e}");
            }
        }
        UserService::new(pool)
    }

    #[tokio::test]
    async fn upsert_creates_then_updates_profile() {
        let svc = service().await;
        let created = svc
            .upsert_user("u3", ProfileUpdate { name: "Cara".to_string(), ..ProfileUpdate::default() })
            .await;
        let Ok(created) = created else {
            panic!("upsert failed");
        };
        assert_eq!(created.rating, None);
        assert!(!created.is_admin);

        let update = ProfileUpdate {
            name: "Cara B".to_string(),
            bio: Some("collector".to_string()),
            avatar_url: None,
        };
        let Ok(updated) = svc.upsert_user("u3", update).await else {
            panic!("upsert failed");
        };
        assert_eq!(updated.name, "Cara B");
        assert_eq!(updated.bio.as_deref(), Some("collector"));
    }

    #[tokio::test]
    async fn upsert_keeps_admin_flag() {
        let svc = service().await;
        let update = ProfileUpdate { name: "Alice".to_string(), ..ProfileUpdate::default() };
        assert!(svc.upsert_user("u1", update).await.is_ok());
        assert!(matches!(svc.is_admin("u1").await, Ok(true)));
        assert!(matches!(svc.is_admin("u2").await, Ok(false)));
        assert!(matches!(svc.is_admin("nobody").await, Ok(false)));
    }

    #[tokio::test]
    async fn get_user_reports_missing() {
        let svc = service().await;
        assert!(matches!(svc.get_user("zzz").await, Err(MarketError::NotFound { .. })));
        assert!(matches!(svc.list_users().await, Ok(users) if users.len() == 2));
    }

    #[tokio::test]
    async fn search_matches_users_and_items() {
        let svc = service().await;
        let Ok(found) = svc.search("smith", None).await else {
            panic!("search failed");
        };
        assert_eq!(found.users.len(), 1);
        assert_eq!(found.items.len(), 2);

        let Ok(filtered) = svc.search("smith", Some("110")).await else {
            panic!("search failed");
        };
        assert_eq!(filtered.items.first().map(|i| i.id.as_str()), Some("i2"));
        assert!(matches!(svc.search("  ", None).await, Err(MarketError::InvalidRequest(_))));
    }
}
