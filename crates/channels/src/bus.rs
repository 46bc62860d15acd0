use lumora_core::{EngineEvent, EngineRequest};
use tokio::sync::mpsc;

/// The two message lanes between trigger surfaces and the engine's host
/// context: requests inbound, "highlights changed" events outbound.
pub struct MessageBus {
    pub request_tx: mpsc::Sender<EngineRequest>,
    pub request_rx: mpsc::Receiver<EngineRequest>,
    pub event_tx: mpsc::Sender<EngineEvent>,
    pub event_rx: mpsc::Receiver<EngineEvent>,
}

impl MessageBus {
    pub fn new(buffer_size: usize) -> Self {
        let (request_tx, request_rx) = mpsc::channel(buffer_size);
        let (event_tx, event_rx) = mpsc::channel(buffer_size);
        Self {
            request_tx,
            request_rx,
            event_tx,
            event_rx,
        }
    }

    pub fn split(
        self,
    ) -> (
        (mpsc::Sender<EngineRequest>, mpsc::Receiver<EngineRequest>),
        (mpsc::Sender<EngineEvent>, mpsc::Receiver<EngineEvent>),
    ) {
        (
            (self.request_tx, self.request_rx),
            (self.event_tx, self.event_rx),
        )
    }
}
