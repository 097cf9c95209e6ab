//! Event sinks for mapping notifications.

use std::sync::Mutex;

use tanzeem_protocol::DomainEvent;

/// Receives domain events after the write that produced them committed.
///
/// Delivery guarantees beyond call order are the sink's concern.
pub trait EventSink: Send + Sync {
    fn publish(&self, event: &DomainEvent);
}

/// Sink that writes each event to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn publish(&self, event: &DomainEvent) {
        match event {
            DomainEvent::JamaatMapped {
                jamaat_id,
                muqam_id,
                ..
            } => {
                tracing::info!(event = event.name(), jamaat = %jamaat_id, muqam = %muqam_id, "Domain event");
            }
            DomainEvent::JamaatUnmapped {
                jamaat_id,
                previous_muqam_id,
                ..
            } => {
                tracing::info!(
                    event = event.name(),
                    jamaat = %jamaat_id,
                    previous_muqam = %previous_muqam_id,
                    "Domain event"
                );
            }
        }
    }
}

/// Sink that keeps every event in memory, in publish order.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<DomainEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// All events received so far.
    pub fn events(&self) -> Vec<DomainEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    /// Remove and return all events received so far.
    pub fn drain(&self) -> Vec<DomainEvent> {
        self.events
            .lock()
            .map(|mut events| std::mem::take(&mut *events))
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.events.lock().map(|events| events.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl EventSink for RecordingSink {
    fn publish(&self, event: &DomainEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}
