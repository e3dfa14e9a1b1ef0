//! Schema manager.
//!
//! [`ensure_schema`] is a fail-fast startup step: it creates every table
//! that is missing and then backfills columns that legacy databases lack.
//! Migration is additive only; nothing is ever dropped or renamed.

use sqlx::SqlitePool;

/// `CREATE TABLE IF NOT EXISTS` statements, in dependency order.
const TABLES: [&str; 13] = [
    "CREATE TABLE IF NOT EXISTS users (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        avatar_url TEXT,
        bio TEXT,
        rating REAL,
        listings_count INTEGER NOT NULL DEFAULT 0,
        transaction_count INTEGER NOT NULL DEFAULT 0,
        follower_count INTEGER NOT NULL DEFAULT 0,
        review_count INTEGER NOT NULL DEFAULT 0,
        is_admin INTEGER NOT NULL DEFAULT 0
    )",
    "CREATE TABLE IF NOT EXISTS items (
        id TEXT PRIMARY KEY,
        title TEXT NOT NULL,
        price INTEGER NOT NULL,
        description TEXT,
        condition TEXT,
        category TEXT,
        image_url TEXT NOT NULL,
        is_sold_out INTEGER NOT NULL DEFAULT 0,
        seller_id TEXT REFERENCES users(id),
        is_invest_item INTEGER NOT NULL DEFAULT 0,
        view_count INTEGER NOT NULL DEFAULT 0,
        like_count INTEGER NOT NULL DEFAULT 0,
        product_group TEXT
    )",
    "CREATE TABLE IF NOT EXISTS conversations (
        id TEXT PRIMARY KEY,
        item_id TEXT NOT NULL REFERENCES items(id),
        buyer_id TEXT NOT NULL REFERENCES users(id),
        seller_id TEXT NOT NULL REFERENCES users(id),
        created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
        updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
    )",
    "CREATE TABLE IF NOT EXISTS messages (
        id TEXT PRIMARY KEY,
        conversation_id TEXT NOT NULL REFERENCES conversations(id),
        sender_id TEXT NOT NULL REFERENCES users(id),
        content TEXT NOT NULL,
        created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
    )",
    "CREATE TABLE IF NOT EXISTS item_reactions (
        id TEXT PRIMARY KEY,
        item_id TEXT NOT NULL REFERENCES items(id),
        user_id TEXT NOT NULL REFERENCES users(id),
        reaction_type TEXT NOT NULL,
        created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
        UNIQUE(item_id, user_id, reaction_type)
    )",
    "CREATE TABLE IF NOT EXISTS user_follows (
        id TEXT PRIMARY KEY,
        follower_id TEXT NOT NULL REFERENCES users(id),
        followee_id TEXT NOT NULL REFERENCES users(id),
        created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
        UNIQUE(follower_id, followee_id)
    )",
    "CREATE TABLE IF NOT EXISTS user_reviews (
        id TEXT PRIMARY KEY,
        reviewer_id TEXT NOT NULL REFERENCES users(id),
        reviewee_id TEXT NOT NULL REFERENCES users(id),
        rating REAL NOT NULL CHECK(rating >= 1 AND rating <= 5),
        comment TEXT,
        created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
    )",
    "CREATE TABLE IF NOT EXISTS grading_info (
        id TEXT PRIMARY KEY,
        item_id TEXT NOT NULL UNIQUE REFERENCES items(id),
        grader TEXT NOT NULL,
        grade REAL,
        cert_number TEXT,
        created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
    )",
    "CREATE TABLE IF NOT EXISTS investment_assets (
        id TEXT PRIMARY KEY,
        item_id TEXT NOT NULL UNIQUE REFERENCES items(id),
        purchase_date TEXT,
        original_price INTEGER,
        estimated_value INTEGER,
        created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
    )",
    "CREATE TABLE IF NOT EXISTS warehouse_storage (
        id TEXT PRIMARY KEY,
        item_id TEXT NOT NULL UNIQUE REFERENCES items(id),
        warehouse_id TEXT NOT NULL,
        estimated_value INTEGER,
        storage_date TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
        created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
    )",
    "CREATE TABLE IF NOT EXISTS user_reports (
        id TEXT PRIMARY KEY,
        reporter_id TEXT NOT NULL REFERENCES users(id),
        reported_user_id TEXT NOT NULL REFERENCES users(id),
        reason TEXT NOT NULL,
        description TEXT,
        status TEXT NOT NULL DEFAULT 'pending',
        created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
        updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
    )",
    "CREATE TABLE IF NOT EXISTS transactions (
        id TEXT PRIMARY KEY,
        item_id TEXT NOT NULL REFERENCES items(id),
        buyer_id TEXT NOT NULL REFERENCES users(id),
        seller_id TEXT NOT NULL REFERENCES users(id),
        price INTEGER NOT NULL,
        quantity INTEGER NOT NULL DEFAULT 1,
        transaction_type TEXT NOT NULL,
        warehouse INTEGER NOT NULL DEFAULT 0,
        status TEXT NOT NULL DEFAULT 'completed',
        created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
    )",
    "CREATE TABLE IF NOT EXISTS price_history (
        id TEXT PRIMARY KEY,
        item_id TEXT NOT NULL REFERENCES items(id),
        price INTEGER NOT NULL,
        recorded_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
    )",
];

/// Columns added to pre-existing tables: `(table, column, definition)`.
const BACKFILL_COLUMNS: [(&str, &str, &str); 12] = [
    ("users", "listings_count", "INTEGER NOT NULL DEFAULT 0"),
    ("users", "follower_count", "INTEGER NOT NULL DEFAULT 0"),
    ("users", "review_count", "INTEGER NOT NULL DEFAULT 0"),
    ("users", "transaction_count", "INTEGER NOT NULL DEFAULT 0"),
    ("users", "is_admin", "INTEGER NOT NULL DEFAULT 0"),
    ("items", "product_group", "TEXT"),
    ("items", "description", "TEXT"),
    ("items", "condition", "TEXT"),
    ("items", "category", "TEXT"),
    ("items", "view_count", "INTEGER NOT NULL DEFAULT 0"),
    ("items", "like_count", "INTEGER NOT NULL DEFAULT 0"),
    ("transactions", "warehouse", "INTEGER NOT NULL DEFAULT 0"),
];

/// Creates missing tables and backfills missing columns.
///
/// Safe to call on every startup.
///
/// # Errors
///
/// Returns the first driver error encountered.
pub async fn ensure_schema(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    for ddl in TABLES {
        sqlx::query(ddl).execute(pool).await?;
    }

    let mut added = 0_usize;
    for (table, column, definition) in BACKFILL_COLUMNS {
        if add_column_if_missing(pool, table, column, definition).await? {
            tracing::info!(table, column, "backfilled missing column");
            added += 1;
        }
    }

    tracing::debug!(tables = TABLES.len(), columns_added = added, "schema ensured");
    Ok(())
}

/// Adds `column` to `table` unless it already exists. Returns whether the
/// column was added.
///
/// `table`, `column` and `definition` come from the constant list above,
/// never from user input.
async fn add_column_if_missing(
    pool: &SqlitePool,
    table: &str,
    column: &str,
    definition: &str,
) -> Result<bool, sqlx::Error> {
    let present: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM pragma_table_info(?) WHERE name = ?")
            .bind(table)
            .bind(column)
            .fetch_one(pool)
            .await?;
    if present > 0 {
        return Ok(false);
    }

    sqlx::query(&format!("ALTER TABLE {table} ADD COLUMN {column} {definition}"))
        .execute(pool)
        .await?;
    Ok(true)
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::persistence::connect;

    async fn column_names(pool: &SqlitePool, table: &str) -> Vec<String> {
        let Ok(names) = sqlx::query_scalar::<_, String>("SELECT name FROM pragma_table_info(?)")
            .bind(table)
            .fetch_all(pool)
            .await
        else {
            panic!("pragma_table_info failed");
        };
        names
    }

    #[tokio::test]
    async fn ensure_schema_is_idempotent() {
        let Ok(pool) = connect("sqlite::memory:", 1, 5).await else {
            panic!("connect failed");
        };
        assert!(ensure_schema(&pool).await.is_ok());
        assert!(ensure_schema(&pool).await.is_ok());

        let tables: Vec<String> = sqlx::query_scalar(
            "SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name",
        )
        .fetch_all(&pool)
        .await
        .unwrap_or_default();
        assert_eq!(tables.len(), TABLES.len());
    }

    #[tokio::test]
    async fn backfills_columns_on_legacy_tables() {
        let Ok(pool) = connect("sqlite::memory:", 1, 5).await else {
            panic!("connect failed");
        };
        let legacy = sqlx::query("CREATE TABLE users (id TEXT PRIMARY KEY, name TEXT NOT NULL, rating REAL)")
            .execute(&pool)
            .await;
        assert!(legacy.is_ok());
        let _ = sqlx::query("INSERT INTO users (id, name) VALUES ('u1', 'legacy')")
            .execute(&pool)
            .await;

        assert!(ensure_schema(&pool).await.is_ok());

        let columns = column_names(&pool, "users").await;
        for expected in ["listings_count", "follower_count", "review_count", "is_admin"] {
            assert!(columns.iter().any(|c| c == expected), "missing {expected}");
        }

        let count: i64 = sqlx::query_scalar("SELECT follower_count FROM users WHERE id = 'u1'")
            .fetch_one(&pool)
            .await
            .unwrap_or(-1);
        assert_eq!(count, 0);
    }
}
