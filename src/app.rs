use crate::api::types::{Company, Order, Product};
use crate::api::Inventory;
use crate::cache::Resource;
use crate::commands::{self, Action, EntityKind, COMMANDS};
use crate::event::{Event, EventHandler};
use crate::notify::{NotificationId, NotificationStore};
use crate::views::{render_table, DeleteOutcome, ListView, Listed};
use color_eyre::Result;
use std::io::{self, Write};
use tracing::debug;

/// Input mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
  Normal,
  /// Waiting for a yes/no answer to a delete prompt
  Confirm,
}

/// Main application state
pub struct App<W> {
  inventory: Inventory,

  notifications: NotificationStore,

  products: ListView<Product>,
  orders: ListView<Order>,
  companies: ListView<Company>,

  /// The list commands like `select` and `delete` act on
  current: EntityKind,

  /// Current input mode
  mode: Mode,

  /// Newest notification already printed
  last_seen: Option<NotificationId>,

  out: W,

  /// Whether to quit
  should_quit: bool,
}

impl<W: Write> App<W> {
  pub fn new(inventory: Inventory, notifications: NotificationStore, out: W) -> Self {
    Self {
      products: ListView::new(inventory.products().clone(), notifications.clone()),
      orders: ListView::new(inventory.orders().clone(), notifications.clone()),
      companies: ListView::new(inventory.companies().clone(), notifications.clone()),
      inventory,
      notifications,
      current: EntityKind::Products,
      mode: Mode::Normal,
      last_seen: None,
      out,
      should_quit: false,
    }
  }

  pub fn mode(&self) -> Mode {
    self.mode
  }

  pub fn should_quit(&self) -> bool {
    self.should_quit
  }

  /// Interactive loop: read commands until `quit` or end of input.
  pub async fn run(&mut self, mut events: EventHandler) -> Result<()> {
    writeln!(self.out, "stockroom: type `help` for commands")?;
    self.prompt()?;

    while !self.should_quit {
      match events.next().await {
        Some(Event::Line(line)) => {
          self.handle_line(&line).await?;
          if !self.should_quit {
            self.prompt()?;
          }
        }
        Some(Event::Notifications(_)) => self.flush_notifications()?,
        Some(Event::Eof) | None => break,
      }
    }

    Ok(())
  }

  fn prompt(&mut self) -> io::Result<()> {
    match self.mode {
      Mode::Confirm => write!(self.out, "[y/N] ")?,
      Mode::Normal => write!(self.out, "{}> ", kind_name(self.current))?,
    }
    self.out.flush()
  }

  /// Handle one line of input in the current mode.
  pub async fn handle_line(&mut self, line: &str) -> Result<()> {
    match self.mode {
      Mode::Confirm => {
        let answer = line.trim().to_lowercase();
        let yes = answer == "y" || answer == "yes";
        self.mode = Mode::Normal;
        self.confirm_delete(yes).await?;
      }
      Mode::Normal => match commands::parse(line) {
        Ok(Some(action)) => self.execute(action).await?,
        Ok(None) => {}
        Err(e) => writeln!(self.out, "{}", e)?,
      },
    }
    self.flush_notifications()?;
    Ok(())
  }

  pub async fn execute(&mut self, action: Action) -> Result<()> {
    debug!(?action, "execute");
    match action {
      Action::List(kind) => {
        self.current = kind;
        self.show_current().await?;
      }
      Action::Show(kind, id) => match kind {
        EntityKind::Products => show_item(self.inventory.products(), id, &mut self.out).await?,
        EntityKind::Orders => show_item(self.inventory.orders(), id, &mut self.out).await?,
        EntityKind::Companies => writeln!(self.out, "Companies can only be listed")?,
      },
      Action::CreateProduct(draft) => {
        match self.inventory.products().create(&draft).await {
          Ok(_) => self.notifications.success("Product created successfully"),
          Err(e) => self.notifications.error(format!("Failed to create product: {}", e)),
        };
        self.current = EntityKind::Products;
        self.show_current().await?;
      }
      Action::CreateOrder(draft) => {
        match self.inventory.orders().create(&draft).await {
          Ok(_) => self.notifications.success("Order created successfully"),
          Err(e) => self.notifications.error(format!("Failed to create order: {}", e)),
        };
        self.current = EntityKind::Orders;
        self.show_current().await?;
      }
      Action::UpdateProduct(product) => {
        match self.inventory.products().update(&product).await {
          Ok(_) => self.notifications.success("Product updated successfully"),
          Err(e) => self.notifications.error(format!("Failed to update product: {}", e)),
        };
        self.current = EntityKind::Products;
        self.show_current().await?;
      }
      Action::UpdateOrder(order) => {
        match self.inventory.orders().update(&order).await {
          Ok(_) => self.notifications.success("Order updated successfully"),
          Err(e) => self.notifications.error(format!("Failed to update order: {}", e)),
        };
        self.current = EntityKind::Orders;
        self.show_current().await?;
      }
      Action::Select(id) => {
        let found = match self.current {
          EntityKind::Products => select(&mut self.products, id),
          EntityKind::Orders => select(&mut self.orders, id),
          EntityKind::Companies => select(&mut self.companies, id),
        };
        match found {
          Some(label) => writeln!(self.out, "Selected {}", label)?,
          None => writeln!(
            self.out,
            "No {} with id {} in the list. Run `{}` first.",
            singular(self.current),
            id,
            kind_name(self.current)
          )?,
        }
      }
      Action::Delete => {
        let prompt = match self.current {
          EntityKind::Products => self.products.delete_prompt(),
          EntityKind::Orders => self.orders.delete_prompt(),
          EntityKind::Companies => None,
        };
        match prompt {
          Some(prompt) => {
            writeln!(self.out, "{}", prompt)?;
            self.mode = Mode::Confirm;
          }
          None if self.current == EntityKind::Companies => {
            writeln!(self.out, "Companies cannot be deleted")?
          }
          None => writeln!(self.out, "Nothing selected. Use `select <id>` first.")?,
        }
      }
      Action::Refresh => {
        match self.current {
          EntityKind::Products => self.products.resource().cache().invalidate_list(),
          EntityKind::Orders => self.orders.resource().cache().invalidate_list(),
          EntityKind::Companies => self.companies.resource().cache().invalidate_list(),
        }
        self.show_current().await?;
      }
      Action::Notifications => {
        let visible = self.notifications.notifications();
        if visible.is_empty() {
          writeln!(self.out, "No notifications")?;
        }
        for n in visible {
          writeln!(self.out, "[{}] {}: {}", n.id, n.kind, n.message)?;
        }
      }
      Action::Dismiss(id) => {
        if !self.notifications.remove(id) {
          writeln!(self.out, "No notification {}", id)?;
        }
      }
      Action::Help => {
        for cmd in COMMANDS {
          writeln!(self.out, "  {:<14} {}", cmd.name, cmd.description)?;
          writeln!(self.out, "  {:<14} {}", "", cmd.usage)?;
        }
      }
      Action::Quit => self.should_quit = true,
    }
    Ok(())
  }

  /// Delete entity `id` of `kind` outright, asking `confirm` first.
  pub async fn delete_id<F>(&mut self, kind: EntityKind, id: u64, confirm: F) -> Result<DeleteOutcome>
  where
    F: FnOnce(&str) -> bool,
  {
    let outcome = match kind {
      EntityKind::Products => delete_one(&mut self.products, id, confirm).await,
      EntityKind::Orders => delete_one(&mut self.orders, id, confirm).await,
      EntityKind::Companies => {
        writeln!(self.out, "Companies cannot be deleted")?;
        return Ok(DeleteOutcome::NothingSelected);
      }
    };
    match &outcome {
      DeleteOutcome::NothingSelected => {
        writeln!(self.out, "No {} with id {}", singular(kind), id)?
      }
      DeleteOutcome::Declined => writeln!(self.out, "Cancelled")?,
      DeleteOutcome::Deleted(_) | DeleteOutcome::Failed(_) => {}
    }
    self.flush_notifications()?;
    Ok(outcome)
  }

  async fn confirm_delete(&mut self, yes: bool) -> Result<()> {
    let outcome = match self.current {
      EntityKind::Products => self.products.delete_selected(|_| yes).await,
      EntityKind::Orders => self.orders.delete_selected(|_| yes).await,
      EntityKind::Companies => DeleteOutcome::NothingSelected,
    };
    match outcome {
      DeleteOutcome::Declined => writeln!(self.out, "Cancelled")?,
      DeleteOutcome::Deleted(_) => self.show_current().await?,
      DeleteOutcome::NothingSelected | DeleteOutcome::Failed(_) => {}
    }
    Ok(())
  }

  async fn show_current(&mut self) -> io::Result<()> {
    match self.current {
      EntityKind::Products => show_list(&self.products, &mut self.out).await,
      EntityKind::Orders => show_list(&self.orders, &mut self.out).await,
      EntityKind::Companies => show_list(&self.companies, &mut self.out).await,
    }
  }

  /// Print notifications posted since the last call.
  pub fn flush_notifications(&mut self) -> io::Result<()> {
    for n in self.notifications.notifications() {
      if self.last_seen.is_some_and(|seen| n.id <= seen) {
        continue;
      }
      writeln!(self.out, "[{}] {}: {}", n.id, n.kind, n.message)?;
      self.last_seen = Some(n.id);
    }
    Ok(())
  }
}

fn kind_name(kind: EntityKind) -> &'static str {
  match kind {
    EntityKind::Products => "products",
    EntityKind::Orders => "orders",
    EntityKind::Companies => "companies",
  }
}

fn singular(kind: EntityKind) -> &'static str {
  match kind {
    EntityKind::Products => "product",
    EntityKind::Orders => "order",
    EntityKind::Companies => "company",
  }
}

async fn show_list<T: Listed, W: Write>(view: &ListView<T>, out: &mut W) -> io::Result<()> {
  let status = view.load().await;
  for line in status.render(view.selected_id()) {
    writeln!(out, "{}", line)?;
  }
  Ok(())
}

async fn show_item<T: Listed, W: Write>(
  resource: &Resource<T>,
  id: u64,
  out: &mut W,
) -> io::Result<()> {
  let entry = resource.item(Some(id)).await;
  let name = T::display_name().to_lowercase();
  if let Some(error) = entry.error().filter(|_| entry.is_error()) {
    return writeln!(out, "Error loading {}: {}", name, error);
  }
  match entry.data() {
    Some(entity) => {
      for line in render_table(std::slice::from_ref(entity), None) {
        writeln!(out, "{}", line)?;
      }
      Ok(())
    }
    None => writeln!(out, "No {} with id {}", name, id),
  }
}

fn select<T: Listed>(view: &mut ListView<T>, id: u64) -> Option<String> {
  if view.select_id(id) {
    view.selected().map(|e| e.label())
  } else {
    None
  }
}

/// Select `id` from the cached list, or fetch it when the list does not have
/// it, then run the delete flow.
async fn delete_one<T, F>(view: &mut ListView<T>, id: u64, confirm: F) -> DeleteOutcome
where
  T: Listed,
  F: FnOnce(&str) -> bool,
{
  if !view.select_id(id) {
    let entry = view.resource().item(Some(id)).await;
    match entry.into_data() {
      Some(entity) => view.select(entity),
      None => return DeleteOutcome::NothingSelected,
    }
  }
  view.delete_selected(confirm).await
}
