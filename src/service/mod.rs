//! Service layer: business logic on top of the SQLite pool.
//!
//! Each service owns a cheap clone of the pool and is shared behind an
//! `Arc` in [`crate::app_state::AppState`]. Multi-statement writes run in
//! one transaction per call.

pub mod admin;
pub mod assistant;
pub mod chat;
pub mod items;
pub mod social;
pub mod trades;
pub mod users;

pub use admin::AdminService;
pub use assistant::AssistantService;
pub use chat::ChatService;
pub use items::ItemService;
pub use social::SocialService;
pub use trades::TradeService;
pub use users::UserService;

use crate::error::MarketError;

/// Fails with `NotFound` unless `id` exists in `table`. `table` is a
/// compile-time constant.
pub(crate) async fn ensure_exists(
    conn: &mut sqlx::SqliteConnection,
    table: &'static str,
    entity: &'static str,
    id: &str,
) -> Result<(), MarketError> {
    let found: Option<i64> = sqlx::query_scalar(&format!("SELECT 1 FROM {table} WHERE id = ?"))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    found
        .map(|_| ())
        .ok_or_else(|| MarketError::not_found(entity, id))
}
