//! # market-gateway
//!
//! REST backend for a consumer marketplace: listings with a weighted
//! search ranking, likes and watches, follows, atomic purchase completion,
//! seller reviews, buyer/seller chat, moderation and an AI listing
//! assistant.
//!
//! Denormalized counters (listings, transactions, ratings, followers,
//! likes) are kept in step synchronously by the write paths and can be
//! rebuilt from ground truth at any time.
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP)
//!     │
//!     ├── Rate limiter, identity guards (api/middleware)
//!     ├── REST Handlers (api/)
//!     │
//!     ├── Services (service/)
//!     ├── TextGenerator ── GeminiClient (ai/)
//!     │
//!     ├── Query builder, counters, schema (persistence/)
//!     └── SQLite
//! ```

pub mod ai;
pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod persistence;
pub mod service;
