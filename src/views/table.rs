use crate::api::types::{Company, Order, Product};
use crate::cache::Cacheable;

/// Widest a single cell may get before it is truncated
const MAX_CELL: usize = 32;

/// Entities that can be shown as rows of a plain-text table
pub trait Listed: Cacheable {
  fn columns() -> &'static [&'static str];

  fn cells(&self) -> Vec<String>;

  /// How the entity is named in prompts, e.g. the product's name
  fn label(&self) -> String;
}

impl Listed for Product {
  fn columns() -> &'static [&'static str] {
    &["ID", "Name", "Price"]
  }

  fn cells(&self) -> Vec<String> {
    vec![
      self.id.to_string(),
      self.name.clone(),
      format!("{:.2}", self.price),
    ]
  }

  fn label(&self) -> String {
    self.name.clone()
  }
}

impl Listed for Order {
  fn columns() -> &'static [&'static str] {
    &["ID", "Customer", "Supplier", "Products"]
  }

  fn cells(&self) -> Vec<String> {
    let products = self
      .products
      .iter()
      .map(u64::to_string)
      .collect::<Vec<_>>()
      .join(",");
    vec![
      self.id.to_string(),
      self.customer_id.to_string(),
      self.supplier_id.to_string(),
      products,
    ]
  }

  fn label(&self) -> String {
    format!("order #{}", self.id)
  }
}

impl Listed for Company {
  fn columns() -> &'static [&'static str] {
    &["ID", "Name"]
  }

  fn cells(&self) -> Vec<String> {
    vec![self.id.to_string(), self.name.clone()]
  }

  fn label(&self) -> String {
    self.name.clone()
  }
}

/// Truncate a string to a maximum length, adding "..." if truncated
pub fn truncate(s: &str, max_len: usize) -> String {
  if s.chars().count() <= max_len {
    s.to_string()
  } else {
    let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
    format!("{}...", kept)
  }
}

/// Lay rows out in aligned columns. The row whose id matches `selected`
/// gets a `>` marker.
pub fn render_table<T: Listed>(rows: &[T], selected: Option<u64>) -> Vec<String> {
  let header: Vec<String> = T::columns().iter().map(|c| c.to_string()).collect();
  let body: Vec<Vec<String>> = rows
    .iter()
    .map(|r| r.cells().iter().map(|c| truncate(c, MAX_CELL)).collect())
    .collect();

  let mut widths: Vec<usize> = header.iter().map(|h| h.chars().count()).collect();
  for row in &body {
    for (width, cell) in widths.iter_mut().zip(row) {
      *width = (*width).max(cell.chars().count());
    }
  }

  let line = |marker: &str, cells: &[String]| {
    let padded: Vec<String> = cells
      .iter()
      .zip(&widths)
      .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
      .collect();
    format!("{} {}", marker, padded.join("  ")).trim_end().to_string()
  };

  let mut lines = vec![line(" ", &header)];
  for (entity, cells) in rows.iter().zip(&body) {
    let marker = if Some(entity.id()) == selected { ">" } else { " " };
    lines.push(line(marker, cells));
  }
  lines
}

#[cfg(test)]
mod tests {
  use super::*;

  fn product(id: u64, name: &str, price: f64) -> Product {
    Product {
      id,
      name: name.to_string(),
      price,
    }
  }

  #[test]
  fn test_truncate_short_string() {
    assert_eq!(truncate("hello", 10), "hello");
  }

  #[test]
  fn test_truncate_exact_length() {
    assert_eq!(truncate("hello", 5), "hello");
  }

  #[test]
  fn test_truncate_long_string() {
    assert_eq!(truncate("hello world", 8), "hello...");
  }

  #[test]
  fn test_truncate_multibyte() {
    assert_eq!(truncate("äöüäöüäöü", 6), "äöü...");
  }

  #[test]
  fn test_table_alignment_and_marker() {
    let rows = vec![product(1, "Bolt", 0.5), product(12, "Hex nut", 19.99)];
    let lines = render_table(&rows, Some(12));

    assert_eq!(
      lines,
      vec![
        "  ID  Name     Price",
        "  1   Bolt     0.50",
        "> 12  Hex nut  19.99",
      ]
    );
  }

  #[test]
  fn test_order_cells() {
    let order = Order {
      id: 3,
      customer_id: 1,
      supplier_id: 2,
      products: vec![4, 5],
    };
    assert_eq!(order.cells(), vec!["3", "1", "2", "4,5"]);
    assert_eq!(order.label(), "order #3");
  }
}
