//! Cache entries and their status.

use chrono::{DateTime, Utc};

/// The status of a cache entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Status {
  /// Never fetched, or fetching is disabled for this key
  #[default]
  Idle,
  /// A fetch is in flight
  Loading,
  /// The last fetch (or write) succeeded
  Success,
  /// The last fetch failed
  Error,
}

/// Snapshot of a cache entry.
///
/// `data` holds the last value the server confirmed and survives later
/// `Loading` and `Error` states, so views can keep showing it.
#[derive(Debug, Clone)]
pub struct Entry<V> {
  status: Status,
  data: Option<V>,
  error: Option<String>,
  last_updated: Option<DateTime<Utc>>,
}

impl<V> Default for Entry<V> {
  fn default() -> Self {
    Self {
      status: Status::Idle,
      data: None,
      error: None,
      last_updated: None,
    }
  }
}

impl<V> Entry<V> {
  pub fn status(&self) -> Status {
    self.status
  }

  pub fn is_idle(&self) -> bool {
    self.status == Status::Idle
  }

  pub fn is_loading(&self) -> bool {
    self.status == Status::Loading
  }

  pub fn is_success(&self) -> bool {
    self.status == Status::Success
  }

  pub fn is_error(&self) -> bool {
    self.status == Status::Error
  }

  pub fn data(&self) -> Option<&V> {
    self.data.as_ref()
  }

  pub fn into_data(self) -> Option<V> {
    self.data
  }

  pub fn error(&self) -> Option<&str> {
    self.error.as_deref()
  }

  pub fn last_updated(&self) -> Option<DateTime<Utc>> {
    self.last_updated
  }

  pub(crate) fn begin_loading(&mut self) {
    self.status = Status::Loading;
  }

  pub(crate) fn succeed(&mut self, data: V) {
    self.status = Status::Success;
    self.data = Some(data);
    self.error = None;
    self.last_updated = Some(Utc::now());
  }

  pub(crate) fn fail(&mut self, error: String) {
    self.status = Status::Error;
    self.error = Some(error);
  }

  /// Leave `Loading` after the fetch that caused it was abandoned.
  pub(crate) fn settle(&mut self) {
    if self.status == Status::Loading {
      self.status = if self.data.is_some() {
        Status::Success
      } else {
        Status::Idle
      };
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_starts_idle_and_empty() {
    let entry: Entry<Vec<u32>> = Entry::default();
    assert!(entry.is_idle());
    assert!(entry.data().is_none());
    assert!(entry.last_updated().is_none());
  }

  #[test]
  fn test_error_keeps_previous_data() {
    let mut entry = Entry::default();
    entry.succeed(vec![1, 2]);
    entry.begin_loading();
    assert_eq!(entry.data(), Some(&vec![1, 2]));

    entry.fail("boom".into());
    assert!(entry.is_error());
    assert_eq!(entry.error(), Some("boom"));
    assert_eq!(entry.data(), Some(&vec![1, 2]));

    entry.succeed(vec![3]);
    assert!(entry.is_success());
    assert_eq!(entry.error(), None);
  }

  #[test]
  fn test_settle_only_leaves_loading() {
    let mut entry: Entry<u32> = Entry::default();
    entry.begin_loading();
    entry.settle();
    assert!(entry.is_idle());

    entry.succeed(7);
    entry.begin_loading();
    entry.settle();
    assert!(entry.is_success());

    entry.fail("x".into());
    entry.settle();
    assert!(entry.is_error());
  }
}
