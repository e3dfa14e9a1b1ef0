//! Reaction and follow ledger.
//!
//! Writes are idempotent on their unique keys. The counters shown right
//! after a write (`like_count`, `follower_count`) are recomputed from the
//! live rows in the same transaction as the write.

use sqlx::SqlitePool;

use crate::domain::{EntityId, ReactionType};
use crate::error::MarketError;
use crate::persistence::counters;
use crate::persistence::models::{FollowRow, ReactionRow};
use crate::service::ensure_exists;

/// Default page size for reaction and follow lists.
pub const DEFAULT_PAGE_SIZE: i64 = 50;

/// Limit/offset pair for list endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    /// Maximum rows returned.
    pub limit: i64,
    /// Rows skipped.
    pub offset: i64,
}

impl Page {
    /// Builds a page, falling back to defaults for missing or negative values.
    #[must_use]
    pub fn new(limit: Option<i64>, offset: Option<i64>) -> Self {
        Self {
            limit: limit.filter(|l| *l > 0).unwrap_or(DEFAULT_PAGE_SIZE),
            offset: offset.filter(|o| *o >= 0).unwrap_or(0),
        }
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// Reactions on items and follows between users.
#[derive(Debug, Clone)]
pub struct SocialService {
    pool: SqlitePool,
}

impl SocialService {
    /// Creates a new `SocialService`.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Records a reaction, replacing an identical one. Likes refresh the
    /// item's `like_count` before returning.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::NotFound`] when the item or user is unknown.
    pub async fn add_reaction(
        &self,
        item_id: &str,
        user_id: &str,
        reaction: ReactionType,
    ) -> Result<ReactionRow, MarketError> {
        let mut tx = self.pool.begin().await?;
        ensure_exists(&mut *tx, "items", "item", item_id).await?;
        ensure_exists(&mut *tx, "users", "user", user_id).await?;

        let id = EntityId::generate();
        sqlx::query(
            "INSERT OR REPLACE INTO item_reactions (id, item_id, user_id, reaction_type)
             VALUES (?, ?, ?, ?)",
        )
        .bind(id.as_str())
        .bind(item_id)
        .bind(user_id)
        .bind(reaction.as_str())
        .execute(&mut *tx)
        .await?;

        if reaction == ReactionType::Like {
            counters::recompute_like_count(&mut *tx, item_id).await?;
        }

        let row = sqlx::query_as::<_, ReactionRow>(
            "SELECT id, item_id, user_id, reaction_type, created_at FROM item_reactions
             WHERE item_id = ? AND user_id = ? AND reaction_type = ?",
        )
        .bind(item_id)
        .bind(user_id)
        .bind(reaction.as_str())
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;

        tracing::debug!(item_id, user_id, reaction = %reaction, "reaction recorded");
        Ok(row)
    }

    /// Deletes a reaction. Removing a like refreshes `like_count`.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::NotFound`] when no such reaction exists.
    pub async fn remove_reaction(
        &self,
        item_id: &str,
        user_id: &str,
        reaction: ReactionType,
    ) -> Result<(), MarketError> {
        let mut tx = self.pool.begin().await?;
        let done = sqlx::query(
            "DELETE FROM item_reactions WHERE item_id = ? AND user_id = ? AND reaction_type = ?",
        )
        .bind(item_id)
        .bind(user_id)
        .bind(reaction.as_str())
        .execute(&mut *tx)
        .await?;
        if done.rows_affected() == 0 {
            return Err(MarketError::not_found(
                "reaction",
                format!("{item_id}/{user_id}/{reaction}"),
            ));
        }
        if reaction == ReactionType::Like {
            counters::recompute_like_count(&mut *tx, item_id).await?;
        }
        tx.commit().await?;
        Ok(())
    }

    /// All reactions on an item.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::Storage`] on database failure.
    pub async fn item_reactions(&self, item_id: &str) -> Result<Vec<ReactionRow>, MarketError> {
        Ok(sqlx::query_as::<_, ReactionRow>(
            "SELECT id, item_id, user_id, reaction_type, created_at FROM item_reactions
             WHERE item_id = ? ORDER BY created_at DESC, id DESC",
        )
        .bind(item_id)
        .fetch_all(&self.pool)
        .await?)
    }

    /// A user's reactions, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::Storage`] on database failure.
    pub async fn user_reactions(
        &self,
        user_id: &str,
        page: Page,
    ) -> Result<Vec<ReactionRow>, MarketError> {
        Ok(sqlx::query_as::<_, ReactionRow>(
            "SELECT id, item_id, user_id, reaction_type, created_at FROM item_reactions
             WHERE user_id = ? ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?",
        )
        .bind(user_id)
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(&self.pool)
        .await?)
    }

    /// Follows `followee_id`. Following twice keeps one row.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::InvalidRequest`] for a self-follow and
    /// [`MarketError::NotFound`] when either user is unknown.
    pub async fn follow_user(
        &self,
        follower_id: &str,
        followee_id: &str,
    ) -> Result<FollowRow, MarketError> {
        if follower_id == followee_id {
            return Err(MarketError::InvalidRequest("cannot follow yourself".to_string()));
        }
        let mut tx = self.pool.begin().await?;
        ensure_exists(&mut *tx, "users", "user", follower_id).await?;
        ensure_exists(&mut *tx, "users", "user", followee_id).await?;

        sqlx::query(
            "INSERT OR IGNORE INTO user_follows (id, follower_id, followee_id) VALUES (?, ?, ?)",
        )
        .bind(EntityId::generate().as_str())
        .bind(follower_id)
        .bind(followee_id)
        .execute(&mut *tx)
        .await?;
        counters::recompute_follower_count(&mut *tx, followee_id).await?;

        let row = sqlx::query_as::<_, FollowRow>(
            "SELECT f.id, f.follower_id, f.followee_id, u.name AS user_name,
                    u.avatar_url AS user_avatar_url, f.created_at
             FROM user_follows f LEFT JOIN users u ON u.id = f.followee_id
             WHERE f.follower_id = ? AND f.followee_id = ?",
        )
        .bind(follower_id)
        .bind(followee_id)
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;

        tracing::debug!(follower_id, followee_id, "follow recorded");
        Ok(row)
    }

    /// Removes a follow relation.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::NotFound`] when the relation does not exist.
    pub async fn unfollow_user(&self, follower_id: &str, followee_id: &str) -> Result<(), MarketError> {
        let mut tx = self.pool.begin().await?;
        let done = sqlx::query("DELETE FROM user_follows WHERE follower_id = ? AND followee_id = ?")
            .bind(follower_id)
            .bind(followee_id)
            .execute(&mut *tx)
            .await?;
        if done.rows_affected() == 0 {
            return Err(MarketError::not_found(
                "follow",
                format!("{follower_id}->{followee_id}"),
            ));
        }
        counters::recompute_follower_count(&mut *tx, followee_id).await?;
        tx.commit().await?;
        Ok(())
    }

    /// Users following `user_id`, newest first, with their profiles.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::Storage`] on database failure.
    pub async fn followers(&self, user_id: &str, page: Page) -> Result<Vec<FollowRow>, MarketError> {
        Ok(sqlx::query_as::<_, FollowRow>(
            "SELECT f.id, f.follower_id, f.followee_id, u.name AS user_name,
                    u.avatar_url AS user_avatar_url, f.created_at
             FROM user_follows f LEFT JOIN users u ON u.id = f.follower_id
             WHERE f.followee_id = ?
             ORDER BY f.created_at DESC, f.id DESC LIMIT ? OFFSET ?",
        )
        .bind(user_id)
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(&self.pool)
        .await?)
    }

    /// Users `user_id` follows, newest first, with their profiles.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::Storage`] on database failure.
    pub async fn following(&self, user_id: &str, page: Page) -> Result<Vec<FollowRow>, MarketError> {
        Ok(sqlx::query_as::<_, FollowRow>(
            "SELECT f.id, f.follower_id, f.followee_id, u.name AS user_name,
                    u.avatar_url AS user_avatar_url, f.created_at
             FROM user_follows f LEFT JOIN users u ON u.id = f.followee_id
             WHERE f.follower_id = ?
             ORDER BY f.created_at DESC, f.id DESC LIMIT ? OFFSET ?",
        )
        .bind(user_id)
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(&self.pool)
        .await?)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::persistence::connect_in_memory;

    async fn service() -> (SocialService, SqlitePool) {
        let Ok(pool) = connect_in_memory().await else {
            panic!("in-memory database unavailable");
        };
        let seed = [
            "INSERT INTO users (id, name) VALUES ('u1', 'Ann'), ('u2', 'Ben'), ('u3', 'Cid')",
            "INSERT INTO items (id, title, price, image_url, seller_id) VALUES ('i1', 'Lamp', 900, 'x', 'u1')",
        ];
        for sql in seed {
            if let Err(e) = sqlx::query(sql).execute(&pool).await {
                panic!("seed failed: {e}");
            }
        }
        (SocialService::new(pool.clone()), pool)
    }

    async fn scalar(pool: &SqlitePool, sql: &str) -> i64 {
        sqlx::query_scalar(sql).fetch_one(pool).await.unwrap_or(-1)
    }

    #[tokio::test]
    async fn repeated_like_keeps_single_row_and_count() {
        let (svc, pool) = service().await;
        for _ in 0..2 {
            let res = svc.add_reaction("i1", "u2", ReactionType::Like).await;
            assert!(res.is_ok());
        }
        assert_eq!(scalar(&pool, "SELECT COUNT(*) FROM item_reactions").await, 1);
        assert_eq!(scalar(&pool, "SELECT like_count FROM items WHERE id = 'i1'").await, 1);
    }

    #[tokio::test]
    async fn watch_does_not_touch_like_count() {
        let (svc, pool) = service().await;
        assert!(svc.add_reaction("i1", "u2", ReactionType::Watch).await.is_ok());
        assert_eq!(scalar(&pool, "SELECT like_count FROM items WHERE id = 'i1'").await, 0);
    }

    #[tokio::test]
    async fn removing_like_refreshes_count_and_missing_is_not_found() {
        let (svc, pool) = service().await;
        assert!(svc.add_reaction("i1", "u2", ReactionType::Like).await.is_ok());
        assert!(svc.add_reaction("i1", "u3", ReactionType::Like).await.is_ok());
        assert!(svc.remove_reaction("i1", "u2", ReactionType::Like).await.is_ok());
        assert_eq!(scalar(&pool, "SELECT like_count FROM items WHERE id = 'i1'").await, 1);

        let again = svc.remove_reaction("i1", "u2", ReactionType::Like).await;
        assert!(matches!(again, Err(MarketError::NotFound { .. })));
    }

    #[tokio::test]
    async fn reaction_on_unknown_item_is_not_found() {
        let (svc, _pool) = service().await;
        let res = svc.add_reaction("missing", "u2", ReactionType::Like).await;
        assert!(matches!(res, Err(MarketError::NotFound { entity: "item", .. })));
    }

    #[tokio::test]
    async fn follow_is_idempotent_and_counts_followers() {
        let (svc, pool) = service().await;
        assert!(svc.follow_user("u2", "u1").await.is_ok());
        assert!(svc.follow_user("u2", "u1").await.is_ok());
        assert!(svc.follow_user("u3", "u1").await.is_ok());
        assert_eq!(scalar(&pool, "SELECT follower_count FROM users WHERE id = 'u1'").await, 2);

        let Ok(followers) = svc.followers("u1", Page::default()).await else {
            panic!("followers failed");
        };
        assert_eq!(followers.len(), 2);

        let Ok(following) = svc.following("u2", Page::default()).await else {
            panic!("following failed");
        };
        assert_eq!(following.len(), 1);
        assert_eq!(following.first().and_then(|f| f.user_name.as_deref()), Some("Ann"));
    }

    #[tokio::test]
    async fn self_follow_is_rejected() {
        let (svc, _pool) = service().await;
        assert!(matches!(
            svc.follow_user("u1", "u1").await,
            Err(MarketError::InvalidRequest(_))
        ));
    }

    #[tokio::test]
    async fn unfollow_recomputes_and_reports_missing() {
        let (svc, pool) = service().await;
        assert!(svc.follow_user("u2", "u1").await.is_ok());
        assert!(svc.unfollow_user("u2", "u1").await.is_ok());
        assert_eq!(scalar(&pool, "SELECT follower_count FROM users WHERE id = 'u1'").await, 0);
        assert!(matches!(
            svc.unfollow_user("u2", "u1").await,
            Err(MarketError::NotFound { .. })
        ));
    }

    #[test]
    fn page_defaults_replace_invalid_values() {
        assert_eq!(Page::new(Some(-1), Some(-5)), Page { limit: 50, offset: 0 });
        assert_eq!(Page::new(Some(10), Some(20)), Page { limit: 10, offset: 20 });
    }
}
