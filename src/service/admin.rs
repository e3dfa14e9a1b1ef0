//! Moderation: user reports, admin user views, admin flag and on-demand
//! counter resync.

use serde::Serialize;
use sqlx::{FromRow, SqlitePool};
use utoipa::ToSchema;

use crate::domain::EntityId;
use crate::error::MarketError;
use crate::persistence::counters::{self, SyncReport};
use crate::persistence::models::{AdminUserRow, ReportRow, UserRow};
use crate::service::ensure_exists;

/// A trade in [`UserDetail`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TradeSummary {
    /// Transaction ID.
    pub id: String,
    /// Item traded.
    pub item_id: String,
    /// Price.
    pub price: i64,
    /// Buyer.
    pub buyer_id: String,
    /// Seller.
    pub seller_id: String,
    /// Creation timestamp.
    pub created_at: String,
}

/// Everything an admin sees about one user.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct UserDetail {
    /// Profile and counters.
    pub user: UserRow,
    /// Reports filed against the user, newest first.
    pub reports: Vec<ReportRow>,
    /// Trades the user took part in, newest first.
    pub trades: Vec<TradeSummary>,
}

/// Admin-facing operations.
#[derive(Debug, Clone)]
pub struct AdminService {
    pool: SqlitePool,
}

impl AdminService {
    /// Creates a new `AdminService`.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Files a `pending` report.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::InvalidRequest`] for a blank reason or a
    /// self-report, and [`MarketError::NotFound`] when either user is
    /// unknown.
    pub async fn report_user(
        &self,
        reporter_id: &str,
        reported_user_id: &str,
        reason: &str,
        description: Option<&str>,
    ) -> Result<EntityId, MarketError> {
        if reason.trim().is_empty() || reported_user_id.trim().is_empty() {
            return Err(MarketError::InvalidRequest(
                "reportedUserId and reason are required".to_string(),
            ));
        }
        if reporter_id == reported_user_id {
            return Err(MarketError::InvalidRequest("cannot report yourself".to_string()));
        }
        let mut tx = self.pool.begin().await?;
        ensure_exists(&mut *tx, "users", "user", reporter_id).await?;
        ensure_exists(&mut *tx, "users", "user", reported_user_id).await?;

        let id = EntityId::generate();
        sqlx::query(
            "INSERT INTO user_reports (id, reporter_id, reported_user_id, reason, description, status)
             VALUES (?, ?, ?, ?, ?, 'pending')",
        )
        .bind(id.as_str())
        .bind(reporter_id)
        .bind(reported_user_id)
        .bind(reason)
        .bind(description)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        tracing::info!(report_id = %id, reported_user_id, "user reported");
        Ok(id)
    }

    /// All reports, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::Storage`] on database failure.
    pub async fn reports(&self) -> Result<Vec<ReportRow>, MarketError> {
        Ok(sqlx::query_as::<_, ReportRow>(
            "SELECT id, reporter_id, reported_user_id, reason, description, status, created_at
             FROM user_reports ORDER BY created_at DESC, id DESC",
        )
        .fetch_all(&self.pool)
        .await?)
    }

    /// Users with their pending report counts. `reported_only` keeps users
    /// with at least one pending report.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::Storage`] on database failure.
    pub async fn users(&self, reported_only: bool) -> Result<Vec<AdminUserRow>, MarketError> {
        let having = if reported_only { " HAVING COUNT(r.id) > 0" } else { "" };
        let sql = format!(
            "SELECT u.id, u.name, u.avatar_url, u.bio, u.rating,
                    COALESCE(u.listings_count, 0) AS listings_count,
                    COALESCE(u.transaction_count, 0) AS transaction_count,
                    COALESCE(u.follower_count, 0) AS follower_count,
                    COALESCE(u.review_count, 0) AS review_count,
                    COALESCE(u.is_admin, 0) AS is_admin,
                    COUNT(r.id) AS report_count
             FROM users u
             LEFT JOIN user_reports r ON r.reported_user_id = u.id AND r.status = 'pending'
             GROUP BY u.id{having}
             ORDER BY u.id DESC"
        );
        Ok(sqlx::query_as::<_, AdminUserRow>(&sql).fetch_all(&self.pool).await?)
    }

    /// Profile, reports and trades of one user.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::NotFound`] if the user does not exist.
    pub async fn user_detail(&self, user_id: &str) -> Result<UserDetail, MarketError> {
        let user = sqlx::query_as::<_, UserRow>(
            "SELECT id, name, avatar_url, bio, rating,
                    COALESCE(listings_count, 0) AS listings_count,
                    COALESCE(transaction_count, 0) AS transaction_count,
                    COALESCE(follower_count, 0) AS follower_count,
                    COALESCE(review_count, 0) AS review_count,
                    COALESCE(is_admin, 0) AS is_admin
             FROM users WHERE id = ?",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| MarketError::not_found("user", user_id))?;

        let reports = sqlx::query_as::<_, ReportRow>(
            "SELECT id, reporter_id, reported_user_id, reason, description, status, created_at
             FROM user_reports WHERE reported_user_id = ? ORDER BY created_at DESC, id DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let trades = sqlx::query_as::<_, TradeSummary>(
            "SELECT id, item_id, price, buyer_id, seller_id, created_at FROM transactions
             WHERE seller_id = ?1 OR buyer_id = ?1 ORDER BY created_at DESC, id DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(UserDetail { user, reports, trades })
    }

    /// Sets or clears the admin flag.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::NotFound`] if the user does not exist.
    pub async fn set_admin(&self, user_id: &str, is_admin: bool) -> Result<(), MarketError> {
        let done = sqlx::query("UPDATE users SET is_admin = ? WHERE id = ?")
            .bind(is_admin)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        if done.rows_affected() == 0 {
            return Err(MarketError::not_found("user", user_id));
        }
        tracing::info!(user_id, is_admin, "admin flag changed");
        Ok(())
    }

    /// Runs every counter resync pass.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::Storage`] if a pass fails.
    pub async fn sync_counters(&self) -> Result<SyncReport, MarketError> {
        Ok(counters::sync_all(&self.pool).await?)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::persistence::connect_in_memory;

    async fn service() -> (AdminService, SqlitePool) {
        let Ok(pool) = connect_in_memory().await else {
            panic!("in-memory database unavailable");
        };
        let seed = sqlx::query(
            "INSERT INTO users (id, name, follower_count) VALUES ('a', 'Ann', 7), ('b', 'Ben', 0), ('c', 'Cy', 0)",
        )
        .execute(&pool)
        .await;
        assert!(seed.is_ok());
        (AdminService::new(pool.clone()), pool)
    }

    #[tokio::test]
    async fn reported_filter_keeps_users_with_pending_reports() {
        let (svc, _pool) = service().await;
        assert!(svc.report_user("a", "b", "spam", Some("many listings")).await.is_ok());
        assert!(svc.report_user("c", "b", "rude", None).await.is_ok());

        let Ok(reported) = svc.users(true).await else {
            panic!("users failed");
        };
        assert_eq!(reported.len(), 1);
        assert_eq!(reported.first().map(|u| u.report_count), Some(2));

        assert!(matches!(svc.users(false).await, Ok(all) if all.len() == 3));
        assert!(matches!(svc.reports().await, Ok(r) if r.len() == 2));
    }

    #[tokio::test]
    async fn self_report_is_rejected() {
        let (svc, _pool) = service().await;
        assert!(matches!(
            svc.report_user("a", "a", "spam", None).await,
            Err(MarketError::InvalidRequest(_))
        ));
    }

    #[tokio::test]
    async fn report_on_unknown_user_is_not_found() {
        let (svc, pool) = service().await;
        assert!(matches!(
            svc.report_user("a", "ghost", "spam", None).await,
            Err(MarketError::NotFound { entity: "user", .. })
        ));
        assert!(matches!(
            svc.report_user("ghost", "b", "spam", None).await,
            Err(MarketError::NotFound { entity: "user", .. })
        ));
        let filed: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM user_reports")
            .fetch_one(&pool)
            .await
            .unwrap_or(-1);
        assert_eq!(filed, 0);
    }

    #[tokio::test]
    async fn user_detail_collects_reports_and_trades() {
        let (svc, _pool) = service().await;
        assert!(svc.report_user("a", "b", "spam", None).await.is_ok());
        let Ok(detail) = svc.user_detail("b").await else {
            panic!("user_detail failed");
        };
        assert_eq!(detail.user.name, "Ben");
        assert_eq!(detail.reports.len(), 1);
        assert!(detail.trades.is_empty());
        assert!(matches!(svc.user_detail("zz").await, Err(MarketError::NotFound { .. })));
    }

    #[tokio::test]
    async fn set_admin_and_sync() {
        let (svc, pool) = service().await;
        assert!(svc.set_admin("b", true).await.is_ok());
        assert!(matches!(svc.set_admin("ghost", true).await, Err(MarketError::NotFound { .. })));

        assert!(matches!(svc.sync_counters().await, Ok(report) if report.followers == 3));
        let followers: i64 = sqlx::query_scalar("SELECT follower_count FROM users WHERE id = 'a'")
            .fetch_one(&pool)
            .await
            .unwrap_or(-1);
        assert_eq!(followers, 0);
    }
}
