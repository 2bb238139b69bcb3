use std::collections::VecDeque;

use collab_types::WireMessage;
use uuid::Uuid;

/// Maximum number of events retained; the oldest entry is evicted first.
pub const EVENT_LOG_CAPACITY: usize = 100;

/// An immutable, stamped record of one domain action.
#[derive(Debug, Clone, PartialEq)]
pub struct CollabEvent {
    pub id: Uuid,
    pub timestamp: String, // ISO 8601 string
    pub message: WireMessage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Subscriber = Box<dyn FnMut(&CollabEvent) + Send>;

/// Bounded, append-only, insertion-ordered event history.
///
/// Subscribers are notified synchronously on every append, so no event is
/// ever missed while a subscription is active.
pub struct EventLog {
    events: VecDeque<CollabEvent>,
    subscribers: Vec<(SubscriptionId, Subscriber)>,
    next_subscription: u64,
}

impl EventLog {
    pub fn new() -> Self {
        Self {
            events: VecDeque::with_capacity(EVENT_LOG_CAPACITY),
            subscribers: Vec::new(),
            next_subscription: 0,
        }
    }

    /// Stamp and append an event, evicting from the front past capacity,
    /// then notify every subscriber.
    pub fn append(&mut self, message: WireMessage) -> CollabEvent {
        let event = CollabEvent {
            id: Uuid::new_v4(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            message,
        };

        self.events.push_back(event.clone());
        while self.events.len() > EVENT_LOG_CAPACITY {
            self.events.pop_front();
        }

        tracing::debug!(kind = event.message.kind(), id = %event.id, "event emitted");

        for (_, subscriber) in &mut self.subscribers {
            subscriber(&event);
        }

        event
    }

    /// Register a synchronous observer. The returned id is the cancellation
    /// handle for `unsubscribe`.
    pub fn subscribe<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: FnMut(&CollabEvent) + Send + 'static,
    {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.subscribers.push((id, Box::new(callback)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sub_id, _)| *sub_id != id);
        self.subscribers.len() != before
    }

    pub fn latest(&self) -> Option<&CollabEvent> {
        self.events.back()
    }

    pub fn events(&self) -> impl Iterator<Item = &CollabEvent> {
        self.events.iter()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new()
    }
}
