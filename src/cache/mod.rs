//! Client-side cache for server state.
//!
//! This module provides a backend-agnostic caching mechanism that:
//! - Keeps one list entry and one entry per id for each entity type
//! - Shares a single in-flight request between concurrent queries
//! - Serves fresh data from memory and refetches once it goes stale
//! - Keeps the last good data visible when a refetch fails
//! - Applies each write's effect (invalidate or splice) per entity policy

mod entry;
mod resource;
mod store;
mod traits;

pub use entry::{Entry, Status};
pub use resource::Resource;
pub use store::{EntityCache, WriteTicket};
pub use traits::{Cacheable, QueryKey, Scope, WriteEffect, WritePolicy};
