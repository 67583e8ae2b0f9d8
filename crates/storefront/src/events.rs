//! Session lifecycle notifications.
//!
//! The session store and the HTTP wrapper publish here when the session ends;
//! the cart and order stores subscribe and reset themselves, so no caller has
//! to remember to sequence a cart reset after logout.

use tokio::sync::broadcast;

/// Buffered events per subscriber before the slowest one starts lagging.
const CHANNEL_CAPACITY: usize = 16;

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// The user logged out explicitly.
    LoggedOut,
    /// The API answered 401; stored credentials were already evicted and the
    /// user should be sent back to the login view.
    Unauthorized,
}

/// Broadcast channel for [`SessionEvent`]s.
#[derive(Debug, Clone)]
pub struct SessionEvents {
    tx: broadcast::Sender<SessionEvent>,
}

impl SessionEvents {
    /// Create a channel with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { tx }
    }

    /// Publish an event to every current subscriber.
    ///
    /// Having no subscribers is fine; the event is simply dropped.
    pub fn publish(&self, event: SessionEvent) {
        match self.tx.send(event) {
            Ok(receivers) => tracing::debug!(?event, receivers, "Session event published"),
            Err(_) => tracing::debug!(?event, "Session event published with no subscribers"),
        }
    }

    /// Subscribe to events published from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.tx.subscribe()
    }
}

impl Default for SessionEvents {
    fn default() -> Self {
        Self::new()
    }
}

/// Run `handler` for every event until the channel closes.
///
/// Lagged receivers skip the missed events; every handler here is an
/// idempotent reset, so only the latest matters.
pub(crate) async fn drive(
    mut rx: broadcast::Receiver<SessionEvent>,
    mut handler: impl FnMut(SessionEvent) + Send,
) {
    loop {
        match rx.recv().await {
            Ok(event) => handler(event),
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "Session event subscriber lagged");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}
