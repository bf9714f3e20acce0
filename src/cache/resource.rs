//! Binds an entity cache to its REST endpoint and write policy.

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::info;

use super::entry::Entry;
use super::store::EntityCache;
use super::traits::{Cacheable, WritePolicy};
use crate::api::{ApiError, RemoteClient, Request};

/// Queries and mutations for one entity type at `/{entity_type}`.
///
/// Queries never fail: errors end up in the returned entry. Mutations hand
/// their error back so callers can decide what to show.
pub struct Resource<T> {
  client: Arc<dyn RemoteClient>,
  cache: EntityCache<T>,
  policy: WritePolicy,
  pending: Arc<PendingWrites>,
}

impl<T> Clone for Resource<T> {
  fn clone(&self) -> Self {
    Self {
      client: Arc::clone(&self.client),
      cache: self.cache.clone(),
      policy: self.policy,
      pending: Arc::clone(&self.pending),
    }
  }
}

/// Writes in flight, per kind
#[derive(Default)]
struct PendingWrites {
  creating: AtomicUsize,
  updating: AtomicUsize,
  deleting: AtomicUsize,
}

/// Counts one write for as long as it lives, including when the caller
/// drops the future midway.
struct PendingGuard<'a>(&'a AtomicUsize);

impl<'a> PendingGuard<'a> {
  fn enter(counter: &'a AtomicUsize) -> Self {
    counter.fetch_add(1, Ordering::SeqCst);
    Self(counter)
  }
}

impl Drop for PendingGuard<'_> {
  fn drop(&mut self) {
    self.0.fetch_sub(1, Ordering::SeqCst);
  }
}

impl<T: Cacheable> Resource<T> {
  pub fn new(client: Arc<dyn RemoteClient>, cache: EntityCache<T>, policy: WritePolicy) -> Self {
    Self {
      client,
      cache,
      policy,
      pending: Arc::default(),
    }
  }

  pub fn cache(&self) -> &EntityCache<T> {
    &self.cache
  }

  pub fn policy(&self) -> WritePolicy {
    self.policy
  }

  pub fn is_creating(&self) -> bool {
    self.pending.creating.load(Ordering::SeqCst) > 0
  }

  pub fn is_updating(&self) -> bool {
    self.pending.updating.load(Ordering::SeqCst) > 0
  }

  pub fn is_deleting(&self) -> bool {
    self.pending.deleting.load(Ordering::SeqCst) > 0
  }

  fn collection_path() -> String {
    format!("/{}", T::entity_type())
  }

  fn item_path(id: u64) -> String {
    format!("/{}/{}", T::entity_type(), id)
  }

  /// GET `/T`, served from cache while fresh
  pub async fn list(&self) -> Entry<Vec<T>> {
    let client = Arc::clone(&self.client);
    self
      .cache
      .query_list(move || {
        let client = Arc::clone(&client);
        async move { fetch(&*client, Request::get(Self::collection_path())).await }
      })
      .await
  }

  /// GET `/T/{id}`, disabled when `id` is missing or zero
  pub async fn item(&self, id: Option<u64>) -> Entry<T> {
    let client = Arc::clone(&self.client);
    self
      .cache
      .query_item(id, move |id| {
        let client = Arc::clone(&client);
        async move { fetch(&*client, Request::get(Self::item_path(id))).await }
      })
      .await
  }

  /// POST `/T`
  pub async fn create(&self, draft: &T::Draft) -> Result<T, ApiError> {
    let _pending = PendingGuard::enter(&self.pending.creating);
    let ticket = self.cache.begin_write();
    let body = serde_json::to_value(draft)?;
    let created: T = fetch(&*self.client, Request::post(Self::collection_path(), body)).await?;

    info!(entity = T::entity_type(), id = created.id(), "created");
    self
      .cache
      .apply_created(ticket, self.policy.on_create, &created);
    Ok(created)
  }

  /// PUT `/T/{id}`
  pub async fn update(&self, entity: &T) -> Result<T, ApiError> {
    let _pending = PendingGuard::enter(&self.pending.updating);
    let ticket = self.cache.begin_write();
    let body = serde_json::to_value(entity)?;
    let updated: T = fetch(&*self.client, Request::put(Self::item_path(entity.id()), body)).await?;

    info!(entity = T::entity_type(), id = updated.id(), "updated");
    self
      .cache
      .apply_updated(ticket, self.policy.on_update, &updated);
    Ok(updated)
  }

  /// DELETE `/T/{id}`
  pub async fn delete(&self, id: u64) -> Result<(), ApiError> {
    let _pending = PendingGuard::enter(&self.pending.deleting);
    let ticket = self.cache.begin_write();
    self.client.send(Request::delete(Self::item_path(id))).await?;

    info!(entity = T::entity_type(), id, "deleted");
    self.cache.apply_deleted(ticket, self.policy.on_delete, id);
    Ok(())
  }
}

async fn fetch<V: DeserializeOwned>(client: &dyn RemoteClient, request: Request) -> Result<V, ApiError> {
  let value: Value = client.send(request).await?;
  Ok(serde_json::from_value(value)?)
}
