//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use sqlx::SqlitePool;

use crate::ai::TextGenerator;
use crate::domain::{CategoryMaster, RateLimiter};
use crate::service::{
    AdminService, AssistantService, ChatService, ItemService, SocialService, TradeService,
    UserService,
};

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Profiles and search.
    pub users: Arc<UserService>,
    /// Listings, investment data and price history.
    pub items: Arc<ItemService>,
    /// Reactions and follows.
    pub social: Arc<SocialService>,
    /// Transactions and reviews.
    pub trades: Arc<TradeService>,
    /// Conversations and messages.
    pub chat: Arc<ChatService>,
    /// Moderation.
    pub admin: Arc<AdminService>,
    /// AI listing assistant.
    pub assistant: Arc<AssistantService>,
    /// Category tree.
    pub categories: Arc<CategoryMaster>,
    /// Per-IP request limiter.
    pub rate_limiter: Arc<RateLimiter>,
}

impl AppState {
    /// Wires every service onto `pool`.
    #[must_use]
    pub fn new(
        pool: &SqlitePool,
        generator: Option<Arc<dyn TextGenerator>>,
        ai_models: Vec<String>,
        rate_limiter: RateLimiter,
    ) -> Self {
        Self {
            users: Arc::new(UserService::new(pool.clone())),
            items: Arc::new(ItemService::new(pool.clone())),
            social: Arc::new(SocialService::new(pool.clone())),
            trades: Arc::new(TradeService::new(pool.clone())),
            chat: Arc::new(ChatService::new(pool.clone())),
            admin: Arc::new(AdminService::new(pool.clone())),
            assistant: Arc::new(AssistantService::new(generator, ai_models)),
            categories: Arc::new(CategoryMaster::default()),
            rate_limiter: Arc::new(rate_limiter),
        }
    }
}
