//! Inventory client with transparent caching, one resource per entity type.

use color_eyre::{eyre::eyre, Result};
use std::sync::Arc;

use crate::cache::{Cacheable, EntityCache, Resource, WritePolicy};
use crate::config::{CacheConfig, Config};

use super::client::{HttpClient, RemoteClient};
use super::types::{Company, Order, Product};

/// Cached access to companies, orders and products.
///
/// Each resource carries its entity's write policy: by default products
/// splice writes into the cached list, orders and companies refetch.
#[derive(Clone)]
pub struct Inventory {
  companies: Resource<Company>,
  orders: Resource<Order>,
  products: Resource<Product>,
}

impl Inventory {
  /// Create a cached inventory client talking HTTP to the configured backend.
  pub fn connect(config: &Config) -> Result<Self> {
    let client = HttpClient::new(&config.api.url)
      .map_err(|e| eyre!("Failed to create API client: {}", e))?;

    Ok(Self::new(Arc::new(client), &config.cache))
  }

  pub fn new(client: Arc<dyn RemoteClient>, cache: &CacheConfig) -> Self {
    Self {
      companies: resource(&client, cache, cache.companies),
      orders: resource(&client, cache, cache.orders),
      products: resource(&client, cache, cache.products),
    }
  }

  pub fn companies(&self) -> &Resource<Company> {
    &self.companies
  }

  pub fn orders(&self) -> &Resource<Order> {
    &self.orders
  }

  pub fn products(&self) -> &Resource<Product> {
    &self.products
  }
}

fn resource<T: Cacheable>(
  client: &Arc<dyn RemoteClient>,
  cache: &CacheConfig,
  policy: WritePolicy,
) -> Resource<T> {
  let entities = EntityCache::new().with_stale_time(cache.stale_time());
  Resource::new(Arc::clone(client), entities, policy)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::api::testing::FakeClient;
  use crate::api::Method;
  use serde_json::json;

  #[tokio::test]
  async fn test_resources_use_their_own_endpoints() {
    let fake = Arc::new(FakeClient::new());
    fake.respond(Method::Get, "/companies", json!([{"id": 1, "name": "Acme"}]));
    fake.respond(Method::Get, "/orders", json!([]));
    fake.respond(Method::Get, "/products", json!([]));
    let inventory = Inventory::new(fake.clone(), &CacheConfig::default());

    let companies = inventory.companies().list().await;
    inventory.orders().list().await;
    inventory.products().list().await;

    assert_eq!(companies.data().unwrap()[0].name, "Acme");
    let paths: Vec<String> = fake.requests().into_iter().map(|r| r.path).collect();
    assert_eq!(paths, vec!["/companies", "/orders", "/products"]);
  }

  #[test]
  fn test_default_policies() {
    let inventory = Inventory::new(Arc::new(FakeClient::new()), &CacheConfig::default());
    assert_eq!(inventory.products().policy(), WritePolicy::optimistic());
    assert_eq!(inventory.orders().policy(), WritePolicy::invalidate());
    assert_eq!(inventory.companies().policy(), WritePolicy::invalidate());
  }

  #[tokio::test]
  async fn test_zero_stale_time_always_refetches() {
    let fake = Arc::new(FakeClient::new());
    fake.respond(Method::Get, "/products", json!([]));
    let cache = CacheConfig {
      stale_time_secs: 0,
      ..CacheConfig::default()
    };
    let inventory = Inventory::new(fake.clone(), &cache);

    inventory.products().list().await;
    inventory.products().list().await;
    assert_eq!(fake.count(Method::Get, "/products"), 2);
  }
}
