//! Process-wide session change notifications.
//!
//! Auth routes publish when someone signs in, signs out, or has their role
//! metadata rewritten. Subscribers hold a [`SessionSubscription`]; dropping it
//! unsubscribes.

use tokio::sync::broadcast;

use kindred_core::UserId;

const CHANNEL_CAPACITY: usize = 256;

/// A change to one user's session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    SignedIn(UserId),
    SignedOut(UserId),
    MetadataUpdated(UserId),
}

impl SessionEvent {
    /// The user whose session changed.
    #[must_use]
    pub const fn user_id(self) -> UserId {
        match self {
            Self::SignedIn(id) | Self::SignedOut(id) | Self::MetadataUpdated(id) => id,
        }
    }
}

/// Session change emitter. Cheap to clone.
#[derive(Debug, Clone)]
pub struct SessionEvents {
    sender: broadcast::Sender<SessionEvent>,
}

impl Default for SessionEvents {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionEvents {
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    /// Publish an event. Having no subscribers is not an error.
    pub fn emit(&self, event: SessionEvent) {
        let delivered = self.sender.send(event).unwrap_or(0);
        tracing::debug!(?event, delivered, "session event");
    }

    /// Start receiving events published from now on.
    #[must_use]
    pub fn subscribe(&self) -> SessionSubscription {
        SessionSubscription {
            receiver: self.sender.subscribe(),
        }
    }

    /// Number of live subscriptions.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

/// What a subscriber sees next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Received {
    Event(SessionEvent),
    /// Events were dropped because the subscriber fell behind.
    Lagged(u64),
}

/// A scoped subscription to [`SessionEvents`].
#[derive(Debug)]
pub struct SessionSubscription {
    receiver: broadcast::Receiver<SessionEvent>,
}

impl SessionSubscription {
    /// Wait for the next event. Returns `None` once every emitter is gone.
    pub async fn recv(&mut self) -> Option<Received> {
        match self.receiver.recv().await {
            Ok(event) => Some(Received::Event(event)),
            Err(broadcast::error::RecvError::Lagged(skipped)) => Some(Received::Lagged(skipped)),
            Err(broadcast::error::RecvError::Closed) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscriber_receives_events_in_order() {
        let events = SessionEvents::new();
        let mut sub = events.subscribe();

        events.emit(SessionEvent::SignedIn(UserId::new(1)));
        events.emit(SessionEvent::SignedOut(UserId::new(1)));

        assert_eq!(
            sub.recv().await,
            Some(Received::Event(SessionEvent::SignedIn(UserId::new(1))))
        );
        assert_eq!(
            sub.recv().await,
            Some(Received::Event(SessionEvent::SignedOut(UserId::new(1))))
        );
    }

    #[test]
    fn test_dropping_subscription_unsubscribes() {
        let events = SessionEvents::new();
        let sub = events.subscribe();
        assert_eq!(events.subscriber_count(), 1);
        drop(sub);
        assert_eq!(events.subscriber_count(), 0);
        events.emit(SessionEvent::MetadataUpdated(UserId::new(3)));
    }

    #[tokio::test]
    async fn test_slow_subscriber_sees_lag() {
        let events = SessionEvents::new();
        let mut sub = events.subscribe();
        for i in 0..=i32::try_from(CHANNEL_CAPACITY).unwrap_or(i32::MAX) {
            events.emit(SessionEvent::SignedIn(UserId::new(i)));
        }
        assert!(matches!(sub.recv().await, Some(Received::Lagged(_))));
    }

    #[tokio::test]
    async fn test_closed_when_emitters_dropped() {
        let events = SessionEvents::new();
        let mut sub = events.subscribe();
        drop(events);
        assert_eq!(sub.recv().await, None);
    }

    #[test]
    fn test_event_user_id() {
        assert_eq!(
            SessionEvent::MetadataUpdated(UserId::new(9)).user_id(),
            UserId::new(9)
        );
    }
}
