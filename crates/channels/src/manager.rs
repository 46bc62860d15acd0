use lumora_core::EngineEvent;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Fans engine events out to any number of listening surfaces. Delivery is
/// never guaranteed: a subscriber whose receiver is gone (popup closed) is
/// dropped silently, matching the fire-and-forget contract.
pub struct EventDispatcher {
    subscribers: Vec<mpsc::Sender<EngineEvent>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self {
            subscribers: Vec::new(),
        }
    }

    pub fn subscribe(&mut self, buffer_size: usize) -> mpsc::Receiver<EngineEvent> {
        let (tx, rx) = mpsc::channel(buffer_size);
        self.subscribers.push(tx);
        rx
    }

    /// Deliver one event to every live subscriber. Returns how many
    /// subscribers actually received it.
    pub fn dispatch(&mut self, event: &EngineEvent) -> usize {
        let mut delivered = 0;
        self.subscribers.retain(|tx| match tx.try_send(event.clone()) {
            Ok(()) => {
                delivered += 1;
                true
            }
            Err(mpsc::error::TrySendError::Full(_)) => {
                // Slow subscriber: the event is dropped for it, but the
                // subscription stays.
                debug!("Subscriber queue full, dropping event");
                true
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                debug!("Subscriber gone, removing");
                false
            }
        });
        delivered
    }

    /// Drain the engine's event lane until it closes, forwarding each
    /// event to subscribers.
    pub async fn run(mut self, mut event_rx: mpsc::Receiver<EngineEvent>) {
        info!("Event dispatcher started");
        while let Some(event) = event_rx.recv().await {
            self.dispatch(&event);
        }
        info!("Event dispatcher stopped");
    }
}

impl Default for EventDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn updated() -> EngineEvent {
        EngineEvent::HighlightsUpdated {
            page_url: "https://example.com/".to_string(),
            highlights: vec![],
        }
    }

    #[tokio::test]
    async fn test_dispatch_to_live_subscriber() {
        let mut dispatcher = EventDispatcher::new();
        let mut rx = dispatcher.subscribe(4);
        assert_eq!(dispatcher.dispatch(&updated()), 1);
        assert!(rx.recv().await.is_some());
    }

    #[tokio::test]
    async fn test_dropped_receiver_is_swallowed() {
        let mut dispatcher = EventDispatcher::new();
        let rx = dispatcher.subscribe(4);
        drop(rx);
        // no receiver left; delivery failure must be silent, not an error
        assert_eq!(dispatcher.dispatch(&updated()), 0);
        // the dead subscriber was pruned
        assert_eq!(dispatcher.dispatch(&updated()), 0);
    }

    #[tokio::test]
    async fn test_dispatch_with_no_subscribers() {
        let mut dispatcher = EventDispatcher::new();
        assert_eq!(dispatcher.dispatch(&updated()), 0);
    }
}
