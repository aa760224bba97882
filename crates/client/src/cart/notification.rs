//! Transient cart notifications ("Tee added to cart!").
//!
//! One message at a time. Showing a message replaces whatever is visible and
//! restarts the auto-clear delay; there is no queue.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

/// How long a notification stays visible.
pub const NOTIFICATION_DURATION: Duration = Duration::from_millis(3000);

/// A visible notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Increases with every `show`; lets a stale timer recognise it lost.
    pub seq: u64,
    pub message: String,
}

/// Owns the current notification and the task that will clear it.
///
/// Dropping the timer cancels any pending auto-clear.
#[derive(Debug)]
pub struct NotificationTimer {
    delay: Duration,
    seq: u64,
    current: Arc<watch::Sender<Option<Notification>>>,
    pending: Option<JoinHandle<()>>,
}

impl NotificationTimer {
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        let (tx, _rx) = watch::channel(None);
        Self {
            delay,
            seq: 0,
            current: Arc::new(tx),
            pending: None,
        }
    }

    /// Show `message`, replacing the current one, and schedule it to clear.
    ///
    /// Outside a tokio runtime the message is shown but never auto-cleared.
    pub fn show(&mut self, message: impl Into<String>) {
        self.cancel();
        self.seq += 1;
        let seq = self.seq;
        self.current.send_replace(Some(Notification {
            seq,
            message: message.into(),
        }));

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            debug!("no tokio runtime, notification will not auto-clear");
            return;
        };

        let current = Arc::clone(&self.current);
        let delay = self.delay;
        self.pending = Some(runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            current.send_if_modified(|shown| {
                if shown.as_ref().is_some_and(|n| n.seq == seq) {
                    *shown = None;
                    true
                } else {
                    false
                }
            });
        }));
    }

    /// Hide the current notification now.
    pub fn dismiss(&mut self) {
        self.cancel();
        self.current.send_replace(None);
    }

    /// The visible notification, if any.
    #[must_use]
    pub fn current(&self) -> Option<Notification> {
        self.current.borrow().clone()
    }

    /// Receive every change of the visible notification.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Option<Notification>> {
        self.current.subscribe()
    }

    fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }
}

impl Default for NotificationTimer {
    fn default() -> Self {
        Self::new(NOTIFICATION_DURATION)
    }
}

impl Drop for NotificationTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}
