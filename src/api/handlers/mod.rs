//! REST endpoint handlers organized by resource.

pub mod admin;
pub mod ai;
pub mod chat;
pub mod items;
pub mod social;
pub mod system;
pub mod trades;
pub mod users;

use axum::Router;

use crate::app_state::AppState;

/// Composes all resource routes under `/api`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(items::routes())
        .merge(social::routes())
        .merge(trades::routes())
        .merge(users::routes())
        .merge(chat::routes())
        .merge(admin::routes())
        .merge(ai::routes())
}
