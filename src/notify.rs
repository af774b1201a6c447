//! Transient user notifications.
//!
//! A [`Notifier`] holds at most one visible [`Notification`]. Each one lives
//! for a fixed time-to-live and is then cleared, unless a newer notification
//! has replaced it first. Hosts either poll [`Notifier::current`] or
//! [`Notifier::subscribe`] to a `tokio::sync::watch` channel that also
//! receives the clear.
//!
//! Expiry is checked on read as well, so a notification shown outside a
//! tokio runtime still disappears on time for pollers; only the active
//! push of the clear to subscribers needs a runtime.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;

/// Success or error styling of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Success,
    Error,
}

/// A message shown to the user for a limited time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    text: String,
    severity: Severity,
    id: u64,
    expires_at: Option<Instant>,
}

impl Notification {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    /// When this notification stops being visible. `None` when the TTL
    /// reaches past what the clock can represent.
    pub fn expires_at(&self) -> Option<Instant> {
        self.expires_at
    }

    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |at| now < at)
    }
}

/// Single-slot notification holder with automatic expiry.
pub struct Notifier {
    ttl: Duration,
    next_id: AtomicU64,
    tx: Arc<watch::Sender<Option<Notification>>>,
}

impl Notifier {
    pub fn new(ttl: Duration) -> Self {
        let (tx, _rx) = watch::channel(None);
        Self {
            ttl,
            next_id: AtomicU64::new(1),
            tx: Arc::new(tx),
        }
    }

    /// Show a success notification.
    pub fn success(&self, text: impl Into<String>) {
        self.show(text, Severity::Success);
    }

    /// Show an error notification.
    pub fn error(&self, text: impl Into<String>) {
        self.show(text, Severity::Error);
    }

    /// Replace whatever is visible with a new notification.
    pub fn show(&self, text: impl Into<String>, severity: Severity) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let expires_at = Instant::now().checked_add(self.ttl);
        self.tx.send_replace(Some(Notification {
            text: text.into(),
            severity,
            id,
            expires_at,
        }));

        let Some(expires_at) = expires_at else {
            return;
        };
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            let tx = Arc::clone(&self.tx);
            handle.spawn(async move {
                tokio::time::sleep_until(expires_at).await;
                // A newer notification owns the slot now; leave it alone.
                tx.send_if_modified(|slot| match slot {
                    Some(n) if n.id == id => {
                        *slot = None;
                        true
                    }
                    _ => false,
                });
            });
        }
    }

    /// The visible notification, if any.
    pub fn current(&self) -> Option<Notification> {
        let now = Instant::now();
        self.tx.borrow().as_ref().filter(|n| n.is_live(now)).cloned()
    }

    /// Remove the visible notification immediately.
    pub fn clear(&self) {
        self.tx.send_if_modified(|slot| slot.take().is_some());
    }

    /// Watch notifications as they are shown and cleared.
    pub fn subscribe(&self) -> watch::Receiver<Option<Notification>> {
        self.tx.subscribe()
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

impl std::fmt::Debug for Notifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Notifier")
            .field("ttl", &self.ttl)
            .field("current", &self.current())
            .finish()
    }
}
