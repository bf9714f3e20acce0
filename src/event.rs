use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::{mpsc, watch};

use crate::notify::Notification;

/// Shell events
#[derive(Debug)]
pub enum Event {
  /// A line of user input, without the trailing newline
  Line(String),
  /// The visible notifications changed
  Notifications(Vec<Notification>),
  /// Input closed
  Eof,
}

/// Event handler merging user input with notification changes
pub struct EventHandler {
  rx: mpsc::UnboundedReceiver<Event>,
}

impl EventHandler {
  /// Read lines from `input` and watch `notifications` on background tasks
  pub fn new<R>(input: R, mut notifications: watch::Receiver<Vec<Notification>>) -> Self
  where
    R: AsyncRead + Unpin + Send + 'static,
  {
    let (tx, rx) = mpsc::unbounded_channel();

    // Spawn input reader
    let input_tx = tx.clone();
    tokio::spawn(async move {
      let mut lines = BufReader::new(input).lines();
      loop {
        let event = match lines.next_line().await {
          Ok(Some(line)) => Event::Line(line),
          Ok(None) | Err(_) => Event::Eof,
        };
        let eof = matches!(event, Event::Eof);
        if input_tx.send(event).is_err() || eof {
          break;
        }
      }
    });

    // Spawn notification watcher
    tokio::spawn(async move {
      while notifications.changed().await.is_ok() {
        let current = notifications.borrow_and_update().clone();
        if tx.send(Event::Notifications(current)).is_err() {
          break;
        }
      }
    });

    Self { rx }
  }

  /// Receive the next event
  pub async fn next(&mut self) -> Option<Event> {
    self.rx.recv().await
  }
}
