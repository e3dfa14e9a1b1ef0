//! Domain layer: identifiers, filter values, reaction kinds, category
//! master and the request rate limiter.
//!
//! Nothing in here touches the database; the persistence layer consumes
//! these types.

pub mod category;
pub mod entity_id;
pub mod item_filter;
pub mod rate_limiter;
pub mod reaction;

pub use category::{CategoryMaster, CategoryNode};
pub use entity_id::EntityId;
pub use item_filter::{ItemFilter, ListingKind, SortOrder};
pub use rate_limiter::RateLimiter;
pub use reaction::ReactionType;
