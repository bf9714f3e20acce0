//! Caching implementations for inventory types.

use crate::cache::Cacheable;

use super::types::{Company, NewCompany, NewOrder, NewProduct, Order, Product};

impl Cacheable for Product {
  type Draft = NewProduct;

  fn id(&self) -> u64 {
    self.id
  }

  fn entity_type() -> &'static str {
    "products"
  }

  fn display_name() -> &'static str {
    "Product"
  }
}

impl Cacheable for Order {
  type Draft = NewOrder;

  fn id(&self) -> u64 {
    self.id
  }

  fn entity_type() -> &'static str {
    "orders"
  }

  fn display_name() -> &'static str {
    "Order"
  }
}

impl Cacheable for Company {
  type Draft = NewCompany;

  fn id(&self) -> u64 {
    self.id
  }

  fn entity_type() -> &'static str {
    "companies"
  }

  fn display_name() -> &'static str {
    "Company"
  }
}
