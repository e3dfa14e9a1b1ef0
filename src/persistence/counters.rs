//! Counter synchronizer.
//!
//! Denormalized user and item counters are a cache over the source tables.
//! The `sync_*` passes recompute them for every row and are idempotent;
//! the `recompute_*` helpers refresh a single entity right after a write
//! and accept any executor so they can run inside a transaction.

use serde::Serialize;
use sqlx::{SqliteExecutor, SqlitePool};
use utoipa::ToSchema;

/// Rows touched by each pass of [`sync_all`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    /// Users whose listings count was rewritten.
    pub listings: u64,
    /// Users whose transaction count was rewritten.
    pub transactions: u64,
    /// Users whose rating and review count were rewritten.
    pub ratings: u64,
    /// Users whose follower count was rewritten.
    pub followers: u64,
}

/// Sets every user's `listings_count` to the number of unsold items they sell.
///
/// # Errors
///
/// Returns the driver error if the update fails.
pub async fn sync_listings_count(pool: &SqlitePool) -> Result<u64, sqlx::Error> {
    let done = sqlx::query(
        "UPDATE users SET listings_count = (
            SELECT COUNT(*) FROM items
            WHERE items.seller_id = users.id AND items.is_sold_out = 0
        )",
    )
    .execute(pool)
    .await?;
    Ok(done.rows_affected())
}

/// Sets every user's `transaction_count` to the transactions they are a
/// party to, as buyer or seller.
///
/// # Errors
///
/// Returns the driver error if the update fails.
pub async fn sync_transaction_count(pool: &SqlitePool) -> Result<u64, sqlx::Error> {
    let done = sqlx::query(
        "UPDATE users SET transaction_count = (
            SELECT COUNT(*) FROM transactions t
            WHERE t.buyer_id = users.id OR t.seller_id = users.id
        )",
    )
    .execute(pool)
    .await?;
    Ok(done.rows_affected())
}

/// Clears ratings, then sets rating and review count for every reviewed user.
///
/// Users without reviews end with `rating = NULL`, never `0`.
///
/// # Errors
///
/// Returns the driver error if either statement fails. Both run in one
/// transaction so readers never see the cleared state.
pub async fn sync_user_ratings(pool: &SqlitePool) -> Result<u64, sqlx::Error> {
    let mut tx = pool.begin().await?;
    sqlx::query("UPDATE users SET rating = NULL, review_count = 0")
        .execute(&mut *tx)
        .await?;
    let done = sqlx::query(
        "UPDATE users SET
            rating = (SELECT AVG(r.rating) FROM user_reviews r WHERE r.reviewee_id = users.id),
            review_count = (SELECT COUNT(*) FROM user_reviews r WHERE r.reviewee_id = users.id)
        WHERE EXISTS (SELECT 1 FROM user_reviews r WHERE r.reviewee_id = users.id)",
    )
    .execute(&mut *tx)
    .await?;
    tx.commit().await?;
    Ok(done.rows_affected())
}

/// Sets every user's `follower_count` to the number of follow rows naming
/// them as followee.
///
/// # Errors
///
/// Returns the driver error if the update fails.
pub async fn sync_follower_count(pool: &SqlitePool) -> Result<u64, sqlx::Error> {
    let done = sqlx::query(
        "UPDATE users SET follower_count = (
            SELECT COUNT(*) FROM user_follows f WHERE f.followee_id = users.id
        )",
    )
    .execute(pool)
    .await?;
    Ok(done.rows_affected())
}

/// Runs all four passes in order.
///
/// # Errors
///
/// Returns the first driver error; earlier passes stay applied.
pub async fn sync_all(pool: &SqlitePool) -> Result<SyncReport, sqlx::Error> {
    let report = SyncReport {
        listings: sync_listings_count(pool).await?,
        transactions: sync_transaction_count(pool).await?,
        ratings: sync_user_ratings(pool).await?,
        followers: sync_follower_count(pool).await?,
    };
    tracing::info!(
        listings = report.listings,
        transactions = report.transactions,
        ratings = report.ratings,
        followers = report.followers,
        "counters synchronized"
    );
    Ok(report)
}

/// Refreshes one item's `like_count` from its live `like` reactions.
///
/// # Errors
///
/// Returns the driver error if the update fails.
pub async fn recompute_like_count<'e, E>(exec: E, item_id: &str) -> Result<(), sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query(
        "UPDATE items SET like_count = (
            SELECT COUNT(*) FROM item_reactions
            WHERE item_id = ?1 AND reaction_type = 'like'
        ) WHERE id = ?1",
    )
    .bind(item_id)
    .execute(exec)
    .await?;
    Ok(())
}

/// Refreshes one user's `follower_count`.
///
/// # Errors
///
/// Returns the driver error if the update fails.
pub async fn recompute_follower_count<'e, E>(exec: E, user_id: &str) -> Result<(), sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query(
        "UPDATE users SET follower_count = (
            SELECT COUNT(*) FROM user_follows WHERE followee_id = ?1
        ) WHERE id = ?1",
    )
    .bind(user_id)
    .execute(exec)
    .await?;
    Ok(())
}

/// Refreshes one user's `rating` and `review_count`. A user without
/// reviews gets `rating = NULL`.
///
/// # Errors
///
/// Returns the driver error if the update fails.
pub async fn recompute_rating<'e, E>(exec: E, user_id: &str) -> Result<(), sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query(
        "UPDATE users SET
            rating = (SELECT AVG(rating) FROM user_reviews WHERE reviewee_id = ?1),
            review_count = (SELECT COUNT(*) FROM user_reviews WHERE reviewee_id = ?1)
        WHERE id = ?1",
    )
    .bind(user_id)
    .execute(exec)
    .await?;
    Ok(())
}
