//! REST API layer: route handlers, DTOs, request guards and router
//! composition.
//!
//! Resource endpoints are mounted under `/api` behind the per-IP rate
//! limiter; `/health` and the category master sit beside them.

pub mod dto;
pub mod handlers;
pub mod middleware;

use axum::Router;
use utoipa::OpenApi;

use crate::app_state::AppState;

/// OpenAPI description of every endpoint.
#[derive(Debug, OpenApi)]
#[openapi(
    info(
        title = "market-gateway",
        description = "Marketplace backend: listings, ranking, reactions, follows, purchases, reviews, chat, moderation and AI listing checks."
    ),
    paths(
        handlers::system::health_handler,
        handlers::system::get_categories,
        handlers::system::put_categories,
        handlers::items::list_items,
        handlers::items::get_item,
        handlers::items::increment_view,
        handlers::items::create_listing,
        handlers::items::create_investment_asset,
        handlers::items::get_investment_asset,
        handlers::items::create_warehouse_storage,
        handlers::items::get_warehouse_storage,
        handlers::items::price_history,
        handlers::social::add_reaction,
        handlers::social::remove_reaction,
        handlers::social::item_reactions,
        handlers::social::user_reactions,
        handlers::social::follow_user,
        handlers::social::unfollow_user,
        handlers::social::followers,
        handlers::social::following,
        handlers::trades::complete_purchase,
        handlers::trades::create_transaction,
        handlers::trades::user_transactions,
        handlers::trades::all_transactions,
        handlers::trades::create_review,
        handlers::trades::user_reviews,
        handlers::users::list_users,
        handlers::users::get_user,
        handlers::users::me,
        handlers::users::save_me,
        handlers::users::search,
        handlers::chat::open_conversation,
        handlers::chat::get_conversation,
        handlers::chat::list_conversations,
        handlers::chat::send_message,
        handlers::chat::list_messages,
        handlers::admin::report_user,
        handlers::admin::list_reports,
        handlers::admin::list_users,
        handlers::admin::user_detail,
        handlers::admin::set_admin,
        handlers::admin::sync_counters,
        handlers::ai::risk_assessment,
        handlers::ai::suggest_price,
        handlers::ai::suggest_description,
        handlers::ai::analyze_image,
    ),
    tags(
        (name = "System", description = "Health and category master"),
        (name = "Items", description = "Listings, investment data and price history"),
        (name = "Reactions", description = "Likes and watches"),
        (name = "Follows", description = "User follow graph"),
        (name = "Transactions", description = "Purchases and trades"),
        (name = "Reviews", description = "Seller reviews"),
        (name = "Users", description = "Profiles and search"),
        (name = "Chat", description = "Buyer/seller conversations"),
        (name = "Moderation", description = "Reports and admin tools"),
        (name = "AI", description = "Listing assistant"),
    )
)]
pub struct ApiDoc;

/// Builds the complete application router bound to `state`.
pub fn build_router(state: AppState) -> Router {
    let limited = Router::new()
        .nest("/api", handlers::routes())
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::rate_limit,
        ));

    let router = Router::new()
        .merge(limited)
        .merge(handlers::system::routes());

    #[cfg(feature = "swagger-ui")]
    let router = router.merge(
        utoipa_swagger_ui::SwaggerUi::new("/swagger-ui")
            .url("/api-docs/openapi.json", ApiDoc::openapi()),
    );

    router.with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_lists_every_resource() {
        let doc = ApiDoc::openapi();
        for path in [
            "/health",
            "/api/items",
            "/api/transactions/complete",
            "/api/follows",
            "/api/admin/sync-counters",
            "/api/ai/risk-assessment",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }
}
