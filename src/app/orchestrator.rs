use super::types::{ComponentState, RunMode, ShutdownReason};
use crate::client::{HttpParkingEndpoint, ParkingEndpoint};
use crate::config::ParkspotConfig;
use crate::error::Result;
use crate::events::EventBus;
use crate::keyboard_input::KeyboardInputHandler;
use crate::model::Zone;
use crate::poller::{PollOutcome, StatusPoller};
use crate::state::ParkingState;
use crate::stats::{PollStatsSnapshot, ToggleStatsSnapshot};
use crate::toggler::ReservationToggler;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{oneshot, Mutex};

/// Owns the client components and wires them to the event bus
pub struct ParkspotApp {
    pub(super) config: ParkspotConfig,
    pub(super) mode: RunMode,
    pub(super) event_bus: Arc<EventBus>,
    pub(super) state: Arc<ParkingState>,

    // Components
    pub(super) poller: StatusPoller,
    pub(super) toggler: Arc<ReservationToggler>,
    pub(super) keyboard_handler: Option<KeyboardInputHandler>,
    pub(super) initial_zone: Option<Zone>,

    // Lifecycle management
    pub(super) component_states: Arc<Mutex<HashMap<String, ComponentState>>>,
    pub(super) shutdown_sender: Option<oneshot::Sender<ShutdownReason>>,
    pub(super) shutdown_receiver: Option<oneshot::Receiver<ShutdownReason>>,
}

impl ParkspotApp {
    /// Create an app talking to the configured HTTP endpoint
    pub fn new(config: ParkspotConfig, mode: RunMode) -> Result<Self> {
        let endpoint =
            HttpParkingEndpoint::new(&config.endpoint, &config.poll, &config.toggle)?;
        Ok(Self::with_endpoint(config, mode, Arc::new(endpoint)))
    }

    /// Create an app over any endpoint implementation
    pub fn with_endpoint(
        config: ParkspotConfig,
        mode: RunMode,
        endpoint: Arc<dyn ParkingEndpoint>,
    ) -> Self {
        let event_bus = Arc::new(EventBus::new(config.system.event_bus_capacity));
        let state = Arc::new(ParkingState::new());
        let (shutdown_sender, shutdown_receiver) = oneshot::channel();

        let poller = StatusPoller::new(
            Arc::clone(&endpoint),
            Arc::clone(&state),
            Arc::clone(&event_bus),
            config.poll.interval(),
        );

        let toggler = Arc::new(ReservationToggler::new(
            endpoint,
            Arc::clone(&state),
            Arc::clone(&event_bus),
        ));

        let keyboard_handler = match mode {
            RunMode::Interactive => Some(KeyboardInputHandler::new(Arc::clone(&event_bus))),
            RunMode::Headless => None,
        };

        Self {
            config,
            mode,
            event_bus,
            state,
            poller,
            toggler,
            keyboard_handler,
            initial_zone: None,
            component_states: Arc::new(Mutex::new(HashMap::new())),
            shutdown_sender: Some(shutdown_sender),
            shutdown_receiver: Some(shutdown_receiver),
        }
    }

    /// Open the detail view for this zone once started
    pub fn set_initial_zone(&mut self, zone: Option<Zone>) {
        self.initial_zone = zone;
    }

    pub fn state(&self) -> Arc<ParkingState> {
        Arc::clone(&self.state)
    }

    pub fn event_bus(&self) -> Arc<EventBus> {
        Arc::clone(&self.event_bus)
    }

    pub fn config(&self) -> &ParkspotConfig {
        &self.config
    }

    pub fn poll_stats(&self) -> PollStatsSnapshot {
        self.poller.stats()
    }

    pub fn toggle_stats(&self) -> ToggleStatsSnapshot {
        self.toggler.stats()
    }

    /// Single poll cycle without starting any component
    pub async fn poll_once(&self) -> PollOutcome {
        self.poller.poll_once().await
    }
}
