use super::{ComponentState, ParkspotApp};
use crate::error::Result;
use tracing::{error, info};

impl ParkspotApp {
    /// Register all components as stopped
    pub async fn initialize(&mut self) -> Result<()> {
        info!("Initializing parkspot components");

        let mut states = self.component_states.lock().await;
        states.insert("poller".to_string(), ComponentState::Stopped);

        // Only register keyboard component in interactive mode
        if self.keyboard_handler.is_some() {
            states.insert("keyboard".to_string(), ComponentState::Stopped);
        }

        drop(states);

        info!("All components initialized successfully");
        Ok(())
    }

    /// Start all components
    pub async fn start(&mut self) -> Result<()> {
        info!("Starting parkspot client against {}", self.config.endpoint.url);

        if let Some(zone) = self.initial_zone {
            self.state.select_zone(zone);
        }

        self.set_component_state("poller", ComponentState::Starting)
            .await;
        if let Err(e) = self.poller.start() {
            error!("Failed to start status poller: {}", e);
            self.set_component_state("poller", ComponentState::Failed)
                .await;
            return Err(e);
        }
        self.set_component_state("poller", ComponentState::Running)
            .await;

        if let Some(keyboard_handler) = &self.keyboard_handler {
            self.set_component_state("keyboard", ComponentState::Starting)
                .await;

            keyboard_handler.start().await.map_err(|e| {
                error!("Failed to start keyboard handler: {}", e);
                e
            })?;

            self.set_component_state("keyboard", ComponentState::Running)
                .await;
            info!("Keyboard input started - 1-3 select, r toggles, c closes, q quits");
        }

        info!("All components started");
        Ok(())
    }
}
