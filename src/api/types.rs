use serde::{Deserialize, Serialize};

/// A company that can act as customer or supplier on an order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
  pub id: u64,
  pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCompany {
  pub name: String,
}

/// A product in the catalogue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
  pub id: u64,
  pub name: String,
  pub price: f64,
}

/// Product payload for creation (the backend assigns the id)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewProduct {
  pub name: String,
  pub price: f64,
}

/// An order between two companies
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
  pub id: u64,
  pub customer_id: u64,
  pub supplier_id: u64,
  /// Product ids on the order
  #[serde(default)]
  pub products: Vec<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrder {
  pub customer_id: u64,
  pub supplier_id: u64,
  #[serde(default)]
  pub products: Vec<u64>,
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_order_uses_camel_case() {
    let order: Order = serde_json::from_value(json!({
      "id": 4,
      "customerId": 1,
      "supplierId": 2,
      "products": [7, 9]
    }))
    .unwrap();
    assert_eq!(order.customer_id, 1);
    assert_eq!(order.products, vec![7, 9]);

    let draft = serde_json::to_value(NewOrder {
      customer_id: 1,
      supplier_id: 2,
      products: vec![],
    })
    .unwrap();
    assert_eq!(draft, json!({"customerId": 1, "supplierId": 2, "products": []}));
  }

  #[test]
  fn test_new_product_has_no_id() {
    let draft = serde_json::to_value(NewProduct {
      name: "Widget".into(),
      price: 9.5,
    })
    .unwrap();
    assert!(draft.get("id").is_none());
  }
}
