use super::{ComponentState, ParkspotApp};
use crate::error::{ParkspotError, Result};
use std::time::Duration;
use tokio::time::timeout;
use tracing::{error, info};

impl ParkspotApp {
    /// Perform graceful shutdown of all components
    pub async fn shutdown(&mut self) -> Result<i32> {
        info!("Beginning graceful shutdown");

        let mut exit_code = 0;

        // Keyboard first so raw mode is released before anything else logs
        if self.keyboard_handler.is_some() {
            if let Err(e) = self.stop_component("keyboard").await {
                error!("Error stopping keyboard: {}", e);
                exit_code = 1;
            }
        }

        if let Err(e) = self.stop_component("poller").await {
            error!("Error stopping poller: {}", e);
            exit_code = 1;
        }

        let poll = self.poll_stats();
        let toggle = self.toggle_stats();
        info!(
            "Session totals: {} polls ({:.0}% ok), {} toggles ({} applied, {} failed, {} rejected)",
            poll.attempts,
            poll.success_rate() * 100.0,
            toggle.requests,
            toggle.applied,
            toggle.failed,
            toggle.rejected_busy
        );

        info!("Graceful shutdown completed with exit code: {}", exit_code);
        Ok(exit_code)
    }

    /// Stop a specific component
    async fn stop_component(&mut self, component: &str) -> Result<()> {
        info!("Stopping {} component", component);
        self.set_component_state(component, ComponentState::Stopping)
            .await;

        let result = match component {
            "poller" => timeout(Duration::from_secs(5), self.poller.stop()).await,
            "keyboard" => match &self.keyboard_handler {
                Some(keyboard_handler) => {
                    timeout(Duration::from_secs(2), keyboard_handler.stop()).await
                }
                None => Ok(Ok(())),
            },
            other => Ok(Err(ParkspotError::system(format!(
                "Unknown component '{}'",
                other
            )))),
        };

        match result {
            Ok(Ok(())) => {
                self.set_component_state(component, ComponentState::Stopped)
                    .await;
                info!("{} component stopped", component);
                Ok(())
            }
            Ok(Err(e)) => {
                self.set_component_state(component, ComponentState::Failed)
                    .await;
                error!("Error stopping {} component: {}", component, e);
                Err(e)
            }
            Err(_) => {
                self.set_component_state(component, ComponentState::Failed)
                    .await;
                error!("{} component stop timeout", component);
                Err(ParkspotError::system(format!(
                    "{} component stop timeout",
                    component
                )))
            }
        }
    }
}
