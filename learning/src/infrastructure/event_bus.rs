// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Event Bus Implementation - Pub/Sub for Learning Events
//
// In-memory event streaming over a tokio broadcast channel. Observers (CLI
// watchers, metrics exporters, tests) subscribe to see tracker, selector and
// sharing activity. Events are lost on restart.

use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::domain::events::LearningEvent;

/// Event bus for publishing and subscribing to learning events
#[derive(Clone)]
pub struct EventBus {
    sender: Arc<broadcast::Sender<LearningEvent>>,
}

impl EventBus {
    /// Create a new event bus with specified channel capacity
    /// Capacity determines how many events can be buffered before dropping old ones
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Create event bus with default capacity (1000)
    pub fn with_default_capacity() -> Self {
        Self::new(1000)
    }

    /// Publish an event to all subscribers. Never fails; with nobody
    /// listening the event is simply dropped.
    pub fn publish(&self, event: LearningEvent) {
        debug!(event_type = event.event_type(), "Publishing learning event");

        let receiver_count = self.sender.send(event).unwrap_or(0);
        if receiver_count == 0 {
            debug!("No subscribers listening to event");
        }
    }

    /// Subscribe to all learning events
    pub fn subscribe(&self) -> EventReceiver {
        EventReceiver {
            receiver: self.sender.subscribe(),
        }
    }

    /// Get the number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::with_default_capacity()
    }
}

/// Receiver for learning events
pub struct EventReceiver {
    receiver: broadcast::Receiver<LearningEvent>,
}

impl EventReceiver {
    /// Receive the next event (waits until one is available)
    pub async fn recv(&mut self) -> Result<LearningEvent, EventBusError> {
        self.receiver.recv().await.map_err(|e| match e {
            broadcast::error::RecvError::Closed => EventBusError::Closed,
            broadcast::error::RecvError::Lagged(n) => {
                warn!("Event receiver lagged by {} events", n);
                EventBusError::Lagged(n)
            }
        })
    }

    /// Try to receive an event without blocking
    pub fn try_recv(&mut self) -> Result<LearningEvent, EventBusError> {
        self.receiver.try_recv().map_err(|e| match e {
            broadcast::error::TryRecvError::Empty => EventBusError::Empty,
            broadcast::error::TryRecvError::Closed => EventBusError::Closed,
            broadcast::error::TryRecvError::Lagged(n) => {
                warn!("Event receiver lagged by {} events", n);
                EventBusError::Lagged(n)
            }
        })
    }

    /// Drain everything currently buffered, skipping over lag gaps
    pub fn drain(&mut self) -> Vec<LearningEvent> {
        let mut events = Vec::new();
        loop {
            match self.try_recv() {
                Ok(event) => events.push(event),
                Err(EventBusError::Lagged(_)) => continue,
                Err(_) => break,
            }
        }
        events
    }
}

/// Errors that can occur when receiving events
#[derive(Debug, thiserror::Error)]
pub enum EventBusError {
    #[error("Event bus is closed")]
    Closed,

    #[error("No events available")]
    Empty,

    #[error("Receiver lagged by {0} events (events were dropped)")]
    Lagged(u64),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::agent::AgentId;
    use chrono::Utc;

    fn cleared(agent: AgentId) -> LearningEvent {
        LearningEvent::LearningDataCleared {
            agent_id: agent,
            timestamp: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_event_bus_publish_subscribe() {
        let event_bus = EventBus::new(10);
        let mut receiver = event_bus.subscribe();

        event_bus.publish(cleared(AgentId::Zen));

        match receiver.recv().await.unwrap() {
            LearningEvent::LearningDataCleared { agent_id, .. } => assert_eq!(agent_id, AgentId::Zen),
            other => panic!("Wrong event type received: {}", other.event_type()),
        }
    }

    #[tokio::test]
    async fn test_multiple_subscribers() {
        let event_bus = EventBus::new(10);
        let mut receiver1 = event_bus.subscribe();
        let mut receiver2 = event_bus.subscribe();

        assert_eq!(event_bus.subscriber_count(), 2);

        event_bus.publish(cleared(AgentId::Tan));

        // Both receivers should get the event
        let _ = receiver1.recv().await.unwrap();
        let _ = receiver2.recv().await.unwrap();
    }

    #[test]
    fn test_publish_without_subscribers_is_silent() {
        let event_bus = EventBus::default();
        event_bus.publish(cleared(AgentId::Aj));
        assert_eq!(event_bus.subscriber_count(), 0);
    }

    #[test]
    fn test_lagging_receiver_reports_gap() {
        let event_bus = EventBus::new(2);
        let mut receiver = event_bus.subscribe();

        for _ in 0..5 {
            event_bus.publish(cleared(AgentId::Ino));
        }

        assert!(matches!(receiver.try_recv(), Err(EventBusError::Lagged(3))));
        assert_eq!(receiver.drain().len(), 2);
        assert!(matches!(receiver.try_recv(), Err(EventBusError::Empty)));
    }
}
