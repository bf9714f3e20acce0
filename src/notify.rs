//! Transient user-facing notifications with timed expiry.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::debug;

/// How long a notification stays up unless dismissed
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(5000);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NotificationId(u64);

impl fmt::Display for NotificationId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}

impl FromStr for NotificationId {
  type Err = std::num::ParseIntError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    s.trim().parse().map(NotificationId)
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
  Success,
  Error,
  Info,
}

impl fmt::Display for NotificationKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let label = match self {
      NotificationKind::Success => "success",
      NotificationKind::Error => "error",
      NotificationKind::Info => "info",
    };
    f.write_str(label)
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
  pub id: NotificationId,
  pub kind: NotificationKind,
  pub message: String,
}

struct Inner {
  list: watch::Sender<Vec<Notification>>,
  next_id: AtomicU64,
  timeout: Duration,
}

impl Inner {
  fn remove(&self, id: NotificationId) -> bool {
    self.list.send_if_modified(|list| {
      let Some(index) = list.iter().position(|n| n.id == id) else {
        return false;
      };
      list.remove(index);
      true
    })
  }
}

/// Ordered list of visible notifications, oldest first.
///
/// Each notification removes itself after the store's timeout unless it was
/// dismissed first. Clones share the same list. Expiry timers only hold a
/// weak reference, so dropping every clone stops them from touching anything.
#[derive(Clone)]
pub struct NotificationStore {
  inner: Arc<Inner>,
}

impl Default for NotificationStore {
  fn default() -> Self {
    Self::new(DEFAULT_TIMEOUT)
  }
}

impl NotificationStore {
  pub fn new(timeout: Duration) -> Self {
    let (list, _) = watch::channel(Vec::new());
    Self {
      inner: Arc::new(Inner {
        list,
        next_id: AtomicU64::new(0),
        timeout,
      }),
    }
  }

  /// Append a notification and schedule its removal. Returns at once.
  ///
  /// Must be called from within a tokio runtime.
  pub fn notify(&self, kind: NotificationKind, message: impl Into<String>) -> NotificationId {
    let id = NotificationId(self.inner.next_id.fetch_add(1, Ordering::Relaxed) + 1);
    let notification = Notification {
      id,
      kind,
      message: message.into(),
    };
    debug!(%id, %kind, message = %notification.message, "notify");
    self.inner.list.send_modify(|list| list.push(notification));

    let deadline = Instant::now() + self.inner.timeout;
    let store: Weak<Inner> = Arc::downgrade(&self.inner);
    tokio::spawn(async move {
      tokio::time::sleep_until(deadline).await;
      if let Some(inner) = store.upgrade() {
        inner.remove(id);
      }
    });

    id
  }

  pub fn success(&self, message: impl Into<String>) -> NotificationId {
    self.notify(NotificationKind::Success, message)
  }

  pub fn error(&self, message: impl Into<String>) -> NotificationId {
    self.notify(NotificationKind::Error, message)
  }

  pub fn info(&self, message: impl Into<String>) -> NotificationId {
    self.notify(NotificationKind::Info, message)
  }

  /// Dismiss a notification. Unknown ids are ignored; returns whether
  /// anything was removed.
  pub fn remove(&self, id: NotificationId) -> bool {
    self.inner.remove(id)
  }

  pub fn notifications(&self) -> Vec<Notification> {
    self.inner.list.borrow().clone()
  }

  pub fn len(&self) -> usize {
    self.inner.list.borrow().len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// Watch the list; the receiver sees every addition and removal.
  pub fn subscribe(&self) -> watch::Receiver<Vec<Notification>> {
    self.inner.list.subscribe()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  async fn advance(ms: u64) {
    tokio::time::advance(Duration::from_millis(ms)).await;
    tokio::task::yield_now().await;
  }

  #[tokio::test(flavor = "current_thread", start_paused = true)]
  async fn test_starts_empty() {
    let store = NotificationStore::default();
    assert!(store.is_empty());
    assert_eq!(store.notifications(), vec![]);
  }

  #[tokio::test(flavor = "current_thread", start_paused = true)]
  async fn test_notify_appends() {
    let store = NotificationStore::default();
    let id = store.notify(NotificationKind::Success, "Test notification");

    assert_eq!(store.len(), 1);
    assert_eq!(
      store.notifications()[0],
      Notification {
        id,
        kind: NotificationKind::Success,
        message: "Test notification".to_string(),
      }
    );
  }

  #[tokio::test(flavor = "current_thread", start_paused = true)]
  async fn test_keeps_insertion_order() {
    let store = NotificationStore::default();
    store.info("first");
    store.error("second");

    let messages: Vec<String> = store
      .notifications()
      .into_iter()
      .map(|n| n.message)
      .collect();
    assert_eq!(messages, vec!["first", "second"]);
  }

  #[tokio::test(flavor = "current_thread", start_paused = true)]
  async fn test_rapid_ids_never_collide() {
    let store = NotificationStore::default();
    let a = store.info("a");
    let b = store.info("b");
    let c = store.info("c");

    assert!(a != b && b != c && a != c);
    assert!(store.remove(b));
    assert_eq!(store.len(), 2);
  }

  #[tokio::test(flavor = "current_thread", start_paused = true)]
  async fn test_remove() {
    let store = NotificationStore::default();
    let id = store.info("Will be removed");

    assert!(store.remove(id));
    assert!(store.is_empty());
  }

  #[tokio::test(flavor = "current_thread", start_paused = true)]
  async fn test_remove_unknown_is_noop() {
    let store = NotificationStore::default();
    store.success("Test notification");

    assert!(!store.remove("999".parse().unwrap()));
    assert_eq!(store.len(), 1);
  }

  #[tokio::test(flavor = "current_thread", start_paused = true)]
  async fn test_expires_after_five_seconds() {
    let store = NotificationStore::default();
    store.success("Auto-remove test");

    advance(4999).await;
    assert_eq!(store.len(), 1);

    advance(1).await;
    assert_eq!(store.len(), 0);
  }

  #[tokio::test(flavor = "current_thread", start_paused = true)]
  async fn test_separate_timers() {
    let store = NotificationStore::default();

    store.success("First notification");
    advance(3000).await;

    store.error("Second notification");
    advance(2000).await;

    // t=5000: the first is gone, the second keeps its own deadline
    assert_eq!(store.len(), 1);
    assert_eq!(store.notifications()[0].kind, NotificationKind::Error);

    advance(2999).await;
    assert_eq!(store.len(), 1);

    advance(1).await;
    assert!(store.is_empty());
  }

  #[tokio::test(flavor = "current_thread", start_paused = true)]
  async fn test_manual_dismiss_then_timer_is_harmless() {
    let store = NotificationStore::default();
    let first = store.info("first");
    advance(1000).await;
    let second = store.info("second");

    store.remove(first);
    advance(4000).await;

    // The first timer fires on an already removed id and leaves the second alone
    assert_eq!(store.notifications().len(), 1);
    assert_eq!(store.notifications()[0].id, second);
  }

  #[tokio::test(flavor = "current_thread", start_paused = true)]
  async fn test_subscribers_see_changes() {
    let store = NotificationStore::new(Duration::from_millis(100));
    let mut rx = store.subscribe();

    store.info("hello");
    assert!(rx.has_changed().unwrap());
    assert_eq!(rx.borrow_and_update().len(), 1);

    advance(100).await;
    assert!(rx.has_changed().unwrap());
    assert!(rx.borrow_and_update().is_empty());
  }
}
