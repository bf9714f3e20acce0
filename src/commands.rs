//! Shell commands, autocomplete and parsing.

use thiserror::Error;

use crate::api::types::{NewOrder, NewProduct, Order, Product};
use crate::notify::NotificationId;

#[derive(Debug, Clone)]
pub struct Command {
  pub name: &'static str,
  pub aliases: &'static [&'static str],
  pub usage: &'static str,
  pub description: &'static str,
}

/// All available commands
pub const COMMANDS: &[Command] = &[
  Command {
    name: "products",
    aliases: &["p", "product"],
    usage: "products [id]",
    description: "List products, or show one",
  },
  Command {
    name: "orders",
    aliases: &["o", "order"],
    usage: "orders [id]",
    description: "List orders, or show one",
  },
  Command {
    name: "companies",
    aliases: &["c", "company"],
    usage: "companies",
    description: "List companies",
  },
  Command {
    name: "new",
    aliases: &["n", "create", "add"],
    usage: "new product <name> <price> | new order <customer> <supplier> [product ids...]",
    description: "Create a product or order",
  },
  Command {
    name: "edit",
    aliases: &["e", "update"],
    usage: "edit product <id> <name> <price> | edit order <id> <customer> <supplier> [product ids...]",
    description: "Update a product or order",
  },
  Command {
    name: "select",
    aliases: &["s", "sel"],
    usage: "select <id>",
    description: "Select a row in the current list",
  },
  Command {
    name: "delete",
    aliases: &["d", "rm", "del"],
    usage: "delete",
    description: "Delete the selected row (asks first)",
  },
  Command {
    name: "refresh",
    aliases: &["r", "reload"],
    usage: "refresh",
    description: "Refetch the current list",
  },
  Command {
    name: "notifications",
    aliases: &["notes", "messages"],
    usage: "notifications",
    description: "Show visible notifications",
  },
  Command {
    name: "dismiss",
    aliases: &["x"],
    usage: "dismiss <id>",
    description: "Dismiss a notification",
  },
  Command {
    name: "help",
    aliases: &["h", "?"],
    usage: "help",
    description: "Show this help",
  },
  Command {
    name: "quit",
    aliases: &["q", "exit"],
    usage: "quit",
    description: "Exit stockroom",
  },
];

/// Get autocomplete suggestions for a given input
pub fn get_suggestions(input: &str) -> Vec<&'static Command> {
  let input_lower = input.to_lowercase();

  if input_lower.is_empty() {
    return COMMANDS.iter().collect();
  }

  let mut matches: Vec<(&Command, u32)> = Vec::new();

  for cmd in COMMANDS {
    // Exact match on name
    if cmd.name == input_lower {
      matches.push((cmd, 0)); // Highest priority
      continue;
    }

    // Exact match on alias
    if cmd.aliases.contains(&input_lower.as_str()) {
      matches.push((cmd, 1));
      continue;
    }

    // Prefix match on name
    if cmd.name.starts_with(&input_lower) {
      matches.push((cmd, 2));
      continue;
    }

    // Prefix match on alias
    if cmd.aliases.iter().any(|a| a.starts_with(&input_lower)) {
      matches.push((cmd, 3));
      continue;
    }

    // Fuzzy match (contains)
    if cmd.name.contains(&input_lower) {
      matches.push((cmd, 4));
      continue;
    }

    // Fuzzy match on alias
    if cmd.aliases.iter().any(|a| a.contains(&input_lower)) {
      matches.push((cmd, 5));
    }
  }

  // Sort by priority
  matches.sort_by_key(|(_, priority)| *priority);

  matches.into_iter().map(|(cmd, _)| cmd).collect()
}

/// Which collection a command talks about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
  Products,
  Orders,
  Companies,
}

impl EntityKind {
  fn parse(word: &str) -> Option<Self> {
    match word.to_lowercase().as_str() {
      "p" | "product" | "products" => Some(EntityKind::Products),
      "o" | "order" | "orders" => Some(EntityKind::Orders),
      "c" | "company" | "companies" => Some(EntityKind::Companies),
      _ => None,
    }
  }
}

/// A parsed shell command
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
  List(EntityKind),
  Show(EntityKind, u64),
  CreateProduct(NewProduct),
  CreateOrder(NewOrder),
  UpdateProduct(Product),
  UpdateOrder(Order),
  Select(u64),
  Delete,
  Refresh,
  Notifications,
  Dismiss(NotificationId),
  Help,
  Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
  #[error("Unknown command: {0}")]
  Unknown(String),
  #[error("Usage: {0}")]
  Usage(&'static str),
  #[error("Not a number: {0}")]
  NotANumber(String),
}

fn number<T: std::str::FromStr>(word: &str) -> Result<T, CommandError> {
  word
    .parse()
    .map_err(|_| CommandError::NotANumber(word.to_string()))
}

/// A price must be a finite number; JSON has no NaN or infinity.
pub fn parse_price(word: &str) -> Result<f64, CommandError> {
  let price: f64 = number(word)?;
  if price.is_finite() {
    Ok(price)
  } else {
    Err(CommandError::NotANumber(word.to_string()))
  }
}

/// Parse one line of shell input. Blank lines give `Ok(None)`.
pub fn parse(line: &str) -> Result<Option<Action>, CommandError> {
  let words: Vec<&str> = line.split_whitespace().collect();
  let Some((first, args)) = words.split_first() else {
    return Ok(None);
  };

  let cmd = get_suggestions(first)
    .into_iter()
    .next()
    .ok_or_else(|| CommandError::Unknown(first.to_string()))?;

  let action = match (cmd.name, args) {
    ("products", []) => Action::List(EntityKind::Products),
    ("products", [id]) => Action::Show(EntityKind::Products, number(id)?),
    ("orders", []) => Action::List(EntityKind::Orders),
    ("orders", [id]) => Action::Show(EntityKind::Orders, number(id)?),
    ("companies", []) => Action::List(EntityKind::Companies),
    ("new", [kind, rest @ ..]) => match EntityKind::parse(kind) {
      Some(EntityKind::Products) => {
        let (name, price) = name_and_price(rest).ok_or(CommandError::Usage(cmd.usage))?;
        Action::CreateProduct(NewProduct {
          name,
          price: parse_price(price)?,
        })
      }
      Some(EntityKind::Orders) => {
        let (customer_id, supplier_id, products) = order_fields(rest, cmd.usage)?;
        Action::CreateOrder(NewOrder {
          customer_id,
          supplier_id,
          products,
        })
      }
      _ => return Err(CommandError::Usage(cmd.usage)),
    },
    ("edit", [kind, id, rest @ ..]) => {
      let id = number(id)?;
      match EntityKind::parse(kind) {
        Some(EntityKind::Products) => {
          let (name, price) = name_and_price(rest).ok_or(CommandError::Usage(cmd.usage))?;
          Action::UpdateProduct(Product {
            id,
            name,
            price: parse_price(price)?,
          })
        }
        Some(EntityKind::Orders) => {
          let (customer_id, supplier_id, products) = order_fields(rest, cmd.usage)?;
          Action::UpdateOrder(Order {
            id,
            customer_id,
            supplier_id,
            products,
          })
        }
        _ => return Err(CommandError::Usage(cmd.usage)),
      }
    }
    ("select", [id]) => Action::Select(number(id)?),
    ("delete", []) => Action::Delete,
    ("refresh", []) => Action::Refresh,
    ("notifications", []) => Action::Notifications,
    ("dismiss", [id]) => Action::Dismiss(number(id)?),
    ("help", _) => Action::Help,
    ("quit", _) => Action::Quit,
    _ => return Err(CommandError::Usage(cmd.usage)),
  };

  Ok(Some(action))
}

/// Everything but the last word is the name; the last word is the price.
fn name_and_price<'a>(words: &[&'a str]) -> Option<(String, &'a str)> {
  let (price, name) = words.split_last()?;
  if name.is_empty() {
    return None;
  }
  Some((name.join(" "), *price))
}

fn order_fields(words: &[&str], usage: &'static str) -> Result<(u64, u64, Vec<u64>), CommandError> {
  let [customer, supplier, products @ ..] = words else {
    return Err(CommandError::Usage(usage));
  };
  let products = products
    .iter()
    .flat_map(|w| w.split(','))
    .filter(|w| !w.is_empty())
    .map(number)
    .collect::<Result<Vec<u64>, _>>()?;
  Ok((number(customer)?, number(supplier)?, products))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_empty_input_returns_all() {
    let suggestions = get_suggestions("");
    assert_eq!(suggestions.len(), COMMANDS.len());
  }

  #[test]
  fn test_exact_match() {
    let suggestions = get_suggestions("products");
    assert_eq!(suggestions[0].name, "products");
  }

  #[test]
  fn test_alias_match() {
    let suggestions = get_suggestions("o");
    assert_eq!(suggestions[0].name, "orders");
  }

  #[test]
  fn test_prefix_match() {
    let suggestions = get_suggestions("comp");
    assert_eq!(suggestions[0].name, "companies");
  }

  #[test]
  fn test_fuzzy_match() {
    let suggestions = get_suggestions("ifica");
    assert!(!suggestions.is_empty());
    assert_eq!(suggestions[0].name, "notifications");
  }

  #[test]
  fn test_blank_line() {
    assert_eq!(parse("   "), Ok(None));
  }

  #[test]
  fn test_parse_lists_and_show() {
    assert_eq!(parse("p"), Ok(Some(Action::List(EntityKind::Products))));
    assert_eq!(
      parse("orders 12"),
      Ok(Some(Action::Show(EntityKind::Orders, 12)))
    );
    assert_eq!(
      parse("companies"),
      Ok(Some(Action::List(EntityKind::Companies)))
    );
  }

  #[test]
  fn test_parse_new_product_with_spaces_in_name() {
    assert_eq!(
      parse("new product Hex nut M8 0.25"),
      Ok(Some(Action::CreateProduct(NewProduct {
        name: "Hex nut M8".into(),
        price: 0.25,
      })))
    );
  }

  #[test]
  fn test_parse_new_order() {
    assert_eq!(
      parse("new order 1 2 3,4 5"),
      Ok(Some(Action::CreateOrder(NewOrder {
        customer_id: 1,
        supplier_id: 2,
        products: vec![3, 4, 5],
      })))
    );
  }

  #[test]
  fn test_parse_edit() {
    assert_eq!(
      parse("edit product 2 Widget 10"),
      Ok(Some(Action::UpdateProduct(Product {
        id: 2,
        name: "Widget".into(),
        price: 10.0,
      })))
    );
    assert_eq!(
      parse("update order 5 1 3"),
      Ok(Some(Action::UpdateOrder(Order {
        id: 5,
        customer_id: 1,
        supplier_id: 3,
        products: vec![],
      })))
    );
  }

  #[test]
  fn test_parse_errors() {
    assert_eq!(parse("zzz"), Err(CommandError::Unknown("zzz".into())));
    assert!(matches!(parse("new product 9.99"), Err(CommandError::Usage(_))));
    assert!(matches!(parse("new company Acme"), Err(CommandError::Usage(_))));
    assert_eq!(
      parse("select abc"),
      Err(CommandError::NotANumber("abc".into()))
    );
  }

  #[test]
  fn test_rejects_non_finite_price() {
    assert_eq!(
      parse("new product Widget NaN"),
      Err(CommandError::NotANumber("NaN".into()))
    );
    assert_eq!(
      parse("edit product 1 Widget inf"),
      Err(CommandError::NotANumber("inf".into()))
    );
    assert_eq!(parse_price("-infinity"), Err(CommandError::NotANumber("-infinity".into())));
    assert_eq!(parse_price("2.5"), Ok(2.5));
  }

  #[test]
  fn test_parse_dismiss() {
    assert_eq!(
      parse("dismiss 3"),
      Ok(Some(Action::Dismiss("3".parse().unwrap())))
    );
  }
}
