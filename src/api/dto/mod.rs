//! Data Transfer Objects for REST request/response serialization.
//!
//! JSON field names are camelCase. Row types from
//! [`crate::persistence::models`] double as response bodies, so most
//! modules here only hold request shapes.

pub mod admin_dto;
pub mod ai_dto;
pub mod chat_dto;
pub mod common_dto;
pub mod item_dto;
pub mod social_dto;
pub mod trade_dto;
pub mod user_dto;

pub use admin_dto::*;
pub use ai_dto::*;
pub use chat_dto::*;
pub use common_dto::*;
pub use item_dto::*;
pub use social_dto::*;
pub use trade_dto::*;
pub use user_dto::*;
