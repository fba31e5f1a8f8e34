use crate::error::EventBusError;
use crate::model::{ControlCommand, ParkingStatus, ProximityReading, Zone};
use serde::{Deserialize, Serialize};
use std::time::SystemTime;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

/// Events that can occur in the parkspot client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ParkspotEvent {
    /// The user picked a zone and the detail view opened
    ZoneSelected { zone: Zone, timestamp: SystemTime },
    /// The detail view was closed and the selection cleared
    DetailClosed { timestamp: SystemTime },
    /// The user asked to flip the reservation of the selected zone
    ToggleRequested { timestamp: SystemTime },
    /// A poll succeeded; `changed` is false when it repeated the stored reading
    ProximityUpdated {
        reading: ProximityReading,
        changed: bool,
        timestamp: SystemTime,
    },
    /// A poll cycle failed and the previous reading was kept
    PollFailed { error: String },
    /// A toggle request succeeded and the local status changed
    ReservationChanged {
        zone: Zone,
        command: ControlCommand,
        status: ParkingStatus,
        confirmed: bool,
    },
    /// System shutdown requested
    ShutdownRequested {
        timestamp: SystemTime,
        reason: String,
    },
}

impl ParkspotEvent {
    /// Get a human-readable description of the event
    pub fn description(&self) -> String {
        match self {
            ParkspotEvent::ZoneSelected { zone, .. } => format!("{} selected", zone),
            ParkspotEvent::DetailClosed { .. } => "Detail view closed".to_string(),
            ParkspotEvent::ToggleRequested { .. } => "Reservation toggle requested".to_string(),
            ParkspotEvent::ProximityUpdated {
                reading, changed, ..
            } => {
                if *changed {
                    format!("Proximity reading: {}", reading)
                } else {
                    format!("Proximity reading unchanged: {}", reading)
                }
            }
            ParkspotEvent::PollFailed { error } => format!("Poll failed: {}", error),
            ParkspotEvent::ReservationChanged {
                zone,
                command,
                status,
                confirmed,
            } => format!(
                "{} {} -> {} ({})",
                zone,
                command,
                status,
                if *confirmed { "confirmed" } else { "inferred" }
            ),
            ParkspotEvent::ShutdownRequested { reason, .. } => {
                format!("Shutdown requested: {}", reason)
            }
        }
    }

    /// Get the event type as a string for filtering
    pub fn event_type(&self) -> &'static str {
        match self {
            ParkspotEvent::ZoneSelected { .. } => "zone_selected",
            ParkspotEvent::DetailClosed { .. } => "detail_closed",
            ParkspotEvent::ToggleRequested { .. } => "toggle_requested",
            ParkspotEvent::ProximityUpdated { .. } => "proximity_updated",
            ParkspotEvent::PollFailed { .. } => "poll_failed",
            ParkspotEvent::ReservationChanged { .. } => "reservation_changed",
            ParkspotEvent::ShutdownRequested { .. } => "shutdown_requested",
        }
    }

    /// True for events after which the view should be redrawn.
    ///
    /// Every successful poll counts, so the last-update time stays current
    /// while the reading is stable.
    pub fn changes_view(&self) -> bool {
        matches!(
            self,
            ParkspotEvent::ZoneSelected { .. }
                | ParkspotEvent::DetailClosed { .. }
                | ParkspotEvent::ProximityUpdated { .. }
                | ParkspotEvent::ReservationChanged { .. }
        )
    }
}

/// Async event bus for component coordination using broadcast channels
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<ParkspotEvent>,
}

impl EventBus {
    /// Create a new event bus with the specified channel capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribe to events and get a receiver
    pub fn subscribe(&self) -> broadcast::Receiver<ParkspotEvent> {
        self.sender.subscribe()
    }

    /// Subscribe with a filter
    pub fn subscribe_filtered(&self, filter: EventFilter, name: &str) -> EventReceiver {
        EventReceiver {
            receiver: self.sender.subscribe(),
            filter,
            name: name.to_string(),
        }
    }

    /// Publish an event to all subscribers
    pub async fn publish(&self, event: ParkspotEvent) -> Result<usize, EventBusError> {
        match &event {
            ParkspotEvent::ReservationChanged { .. } => {
                info!("{}", event.description());
            }
            ParkspotEvent::PollFailed { error } => {
                warn!("Poll failed: {}", error);
            }
            ParkspotEvent::ShutdownRequested { reason, .. } => {
                info!("Shutdown requested: {}", reason);
            }
            _ => {
                debug!("Event: {}", event.description());
            }
        }

        self.sender
            .send(event)
            .map_err(|e| EventBusError::PublishFailed {
                details: e.to_string(),
            })
    }

    /// Check if there are any active subscribers
    pub fn has_subscribers(&self) -> bool {
        self.sender.receiver_count() > 0
    }
}

/// Event filter for selective event handling
#[derive(Debug, Clone)]
pub enum EventFilter {
    /// Accept all events
    All,
    /// Accept only specific event types
    EventTypes(Vec<&'static str>),
    /// Custom filter function
    Custom(fn(&ParkspotEvent) -> bool),
}

impl EventFilter {
    /// Check if an event passes this filter
    pub fn matches(&self, event: &ParkspotEvent) -> bool {
        match self {
            EventFilter::All => true,
            EventFilter::EventTypes(types) => types.contains(&event.event_type()),
            EventFilter::Custom(filter_fn) => filter_fn(event),
        }
    }
}

/// Event receiver with filtering
pub struct EventReceiver {
    receiver: broadcast::Receiver<ParkspotEvent>,
    filter: EventFilter,
    name: String,
}

impl EventReceiver {
    /// Receive the next filtered event
    pub async fn recv(&mut self) -> Result<ParkspotEvent, EventBusError> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => {
                    if self.filter.matches(&event) {
                        debug!(
                            "Receiver '{}' received event: {}",
                            self.name,
                            event.description()
                        );
                        return Ok(event);
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!("Receiver '{}' lagged behind by {} events", self.name, n);
                    return Err(EventBusError::Lagged { skipped: n });
                }
                Err(broadcast::error::RecvError::Closed) => {
                    debug!("Event bus closed for receiver '{}'", self.name);
                    return Err(EventBusError::ChannelClosed);
                }
            }
        }
    }
}
