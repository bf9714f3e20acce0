//! Core traits and types for the caching system.

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::fmt;

/// Trait for entities that can be cached.
///
/// Implementors provide the backend-assigned id and the collection name,
/// which doubles as the REST endpoint (`/products`, `/orders`, ...).
pub trait Cacheable: Clone + Send + Sync + Serialize + DeserializeOwned + 'static {
  /// Payload sent on creation, i.e. the entity without its id
  type Draft: Serialize + Send + Sync;

  /// Backend-assigned identifier
  fn id(&self) -> u64;

  /// Collection name, e.g. "products"
  fn entity_type() -> &'static str;

  /// Singular, capitalised name for messages, e.g. "Product"
  fn display_name() -> &'static str;
}

/// Which entry of an entity cache a query refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
  List,
  Item(u64),
}

/// Composite cache key: entity type plus list or id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QueryKey {
  pub entity_type: &'static str,
  pub scope: Scope,
}

impl QueryKey {
  pub fn list<T: Cacheable>() -> Self {
    Self {
      entity_type: T::entity_type(),
      scope: Scope::List,
    }
  }

  pub fn item<T: Cacheable>(id: u64) -> Self {
    Self {
      entity_type: T::entity_type(),
      scope: Scope::Item(id),
    }
  }
}

impl fmt::Display for QueryKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self.scope {
      Scope::List => write!(f, "{}:list", self.entity_type),
      Scope::Item(id) => write!(f, "{}:{}", self.entity_type, id),
    }
  }
}

/// What a successful write does to the cached data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteEffect {
  /// Mark affected entries stale so the next query refetches them
  Invalidate,
  /// Prepend the server's response to the cached list
  SpliceToFront,
  /// Move the server's response to the head of the cached list, dropping
  /// any other copy with the same id
  ReplaceInPlace,
}

/// Per-entity choice of write effects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WritePolicy {
  pub on_create: WriteEffect,
  pub on_update: WriteEffect,
  pub on_delete: WriteEffect,
}

impl WritePolicy {
  /// Always refetch after writes
  pub const fn invalidate() -> Self {
    Self {
      on_create: WriteEffect::Invalidate,
      on_update: WriteEffect::Invalidate,
      on_delete: WriteEffect::Invalidate,
    }
  }

  /// Splice creates and updates into the cached list, refetch after deletes
  pub const fn optimistic() -> Self {
    Self {
      on_create: WriteEffect::SpliceToFront,
      on_update: WriteEffect::ReplaceInPlace,
      on_delete: WriteEffect::Invalidate,
    }
  }
}

impl Default for WritePolicy {
  fn default() -> Self {
    Self::invalidate()
  }
}
