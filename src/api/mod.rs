//! Inventory backend: REST client, entity types and per-entity resources.

pub mod cache;
pub mod client;
pub mod error;
pub mod inventory;
pub mod types;

#[cfg(test)]
pub mod testing;

pub use client::{HttpClient, Method, RemoteClient, Request};
pub use error::ApiError;
pub use inventory::Inventory;
