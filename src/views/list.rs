use tracing::info;

use super::table::{render_table, Listed};
use crate::api::ApiError;
use crate::cache::{Entry, Resource};
use crate::notify::NotificationStore;

/// What a list view should show
#[derive(Debug, Clone, PartialEq)]
pub enum ListStatus<T> {
  /// First load, nothing to show yet
  Loading,
  /// The last fetch failed
  Error(String),
  Empty,
  Ready(Vec<T>),
}

impl<T: Listed> ListStatus<T> {
  pub fn from_entry(entry: Entry<Vec<T>>) -> Self {
    if let Some(error) = entry.error().filter(|_| entry.is_error()) {
      return ListStatus::Error(error.to_string());
    }
    let loading = entry.is_loading() || entry.is_idle();
    match entry.into_data() {
      None if loading => ListStatus::Loading,
      None => ListStatus::Empty,
      Some(list) if list.is_empty() => ListStatus::Empty,
      Some(list) => ListStatus::Ready(list),
    }
  }

  pub fn render(&self, selected: Option<u64>) -> Vec<String> {
    let plural = T::entity_type();
    match self {
      ListStatus::Loading => vec![format!("Loading {}...", plural)],
      ListStatus::Error(e) => vec![format!("Error loading {}: {}", plural, e)],
      ListStatus::Empty => vec![format!(
        "No {} found. Create one with `new {}`.",
        plural,
        T::display_name().to_lowercase()
      )],
      ListStatus::Ready(rows) => render_table(rows, selected),
    }
  }
}

/// Result of asking a view to delete its selection
#[derive(Debug, Clone, PartialEq)]
pub enum DeleteOutcome {
  NothingSelected,
  /// The user said no; nothing was sent
  Declined,
  Deleted(u64),
  Failed(ApiError),
}

/// A list of one entity type plus the user's current selection.
pub struct ListView<T> {
  resource: Resource<T>,
  notifications: NotificationStore,
  selected: Option<T>,
}

impl<T: Listed> ListView<T> {
  pub fn new(resource: Resource<T>, notifications: NotificationStore) -> Self {
    Self {
      resource,
      notifications,
      selected: None,
    }
  }

  pub fn resource(&self) -> &Resource<T> {
    &self.resource
  }

  /// Query the list (fetching if needed) and report what to show.
  pub async fn load(&self) -> ListStatus<T> {
    ListStatus::from_entry(self.resource.list().await)
  }

  /// What to show right now, without fetching.
  pub fn status(&self) -> ListStatus<T> {
    ListStatus::from_entry(self.resource.cache().list_entry())
  }

  pub fn render(&self) -> Vec<String> {
    let mut lines = self.status().render(self.selected_id());
    if self.is_deleting() {
      lines.push("Deleting...".to_string());
    }
    lines
  }

  /// True while a delete of this entity type is in flight.
  pub fn is_deleting(&self) -> bool {
    self.resource.is_deleting()
  }

  pub fn select(&mut self, entity: T) {
    self.selected = Some(entity);
  }

  /// Select the cached entity with this id; false if it is not in the list.
  pub fn select_id(&mut self, id: u64) -> bool {
    let found = self
      .resource
      .cache()
      .list_entry()
      .into_data()
      .and_then(|list| list.into_iter().find(|e| e.id() == id));
    match found {
      Some(entity) => {
        self.selected = Some(entity);
        true
      }
      None => false,
    }
  }

  pub fn selected(&self) -> Option<&T> {
    self.selected.as_ref()
  }

  pub fn selected_id(&self) -> Option<u64> {
    self.selected.as_ref().map(|e| e.id())
  }

  pub fn clear_selection(&mut self) {
    self.selected = None;
  }

  /// Confirmation question for deleting the selection.
  pub fn delete_prompt(&self) -> Option<String> {
    self
      .selected
      .as_ref()
      .map(|e| format!("Are you sure you want to delete {}?", e.label()))
  }

  /// Delete the selection after `confirm` agrees to the prompt. Success
  /// clears the selection; either way the outcome is posted as a
  /// notification.
  pub async fn delete_selected<F>(&mut self, confirm: F) -> DeleteOutcome
  where
    F: FnOnce(&str) -> bool,
  {
    let (Some(id), Some(prompt)) = (self.selected_id(), self.delete_prompt()) else {
      return DeleteOutcome::NothingSelected;
    };
    if !confirm(&prompt) {
      return DeleteOutcome::Declined;
    }

    match self.resource.delete(id).await {
      Ok(()) => {
        info!(entity = T::entity_type(), id, "deleted selection");
        self.selected = None;
        self
          .notifications
          .success(format!("{} deleted successfully", T::display_name()));
        DeleteOutcome::Deleted(id)
      }
      Err(e) => {
        self.notifications.error(format!(
          "Failed to delete {}: {}",
          T::display_name().to_lowercase(),
          e
        ));
        DeleteOutcome::Failed(e)
      }
    }
  }
}
