use crate::client::ParkingEndpoint;
use crate::events::{EventBus, ParkspotEvent};
use crate::inflight::InFlightGuard;
use crate::model::{ControlCommand, ParkingStatus, Zone};
use crate::state::ParkingState;
use crate::stats::{ToggleStats, ToggleStatsSnapshot};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Result of a toggle request
#[derive(Debug, Clone, PartialEq)]
pub enum ToggleOutcome {
    /// The endpoint accepted the command and the local status was updated
    Applied {
        zone: Zone,
        command: ControlCommand,
        status: ParkingStatus,
        /// True when the status came from the response body rather than being inferred
        confirmed: bool,
    },
    /// The request failed; the local status is unchanged
    Failed {
        zone: Zone,
        command: ControlCommand,
        error: String,
    },
    /// A previous toggle has not resolved yet; nothing was sent
    Busy,
    /// No zone is selected; nothing was sent
    NoZoneSelected,
}

impl ToggleOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, ToggleOutcome::Applied { .. })
    }
}

/// Flips the reservation flag of a zone on the remote endpoint.
///
/// Errors are logged and reported through [`ToggleOutcome`]; they never
/// propagate further and never touch the local status.
pub struct ReservationToggler {
    endpoint: Arc<dyn ParkingEndpoint>,
    state: Arc<ParkingState>,
    event_bus: Arc<EventBus>,
    stats: ToggleStats,
    in_flight: AtomicBool,
}

impl ReservationToggler {
    pub fn new(
        endpoint: Arc<dyn ParkingEndpoint>,
        state: Arc<ParkingState>,
        event_bus: Arc<EventBus>,
    ) -> Self {
        Self {
            endpoint,
            state,
            event_bus,
            stats: ToggleStats::default(),
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn stats(&self) -> ToggleStatsSnapshot {
        self.stats.snapshot()
    }

    /// Toggle the reservation of the currently selected zone
    pub async fn toggle_selected(&self) -> ToggleOutcome {
        match self.state.selected_zone() {
            Some(zone) => self.toggle(zone).await,
            None => {
                debug!("Toggle requested with no zone selected");
                ToggleOutcome::NoZoneSelected
            }
        }
    }

    /// Send the command that inverts the current status for `zone`
    pub async fn toggle(&self, zone: Zone) -> ToggleOutcome {
        let Some(_guard) = InFlightGuard::acquire(&self.in_flight) else {
            warn!("Toggle for {} ignored, previous request still pending", zone);
            self.stats.record_busy();
            return ToggleOutcome::Busy;
        };

        let current = self.state.status();
        let command = current.toggle_command();
        self.stats.record_request();

        info!("Requesting {} for {}", command, zone);

        let response = match self.endpoint.send_command(command, zone).await {
            Ok(response) => response,
            Err(e) => {
                error!("Reservation {} for {} failed: {}", command, zone, e);
                self.stats.record_failed();
                return ToggleOutcome::Failed {
                    zone,
                    command,
                    error: e.to_string(),
                };
            }
        };

        let (status, confirmed) = match response.confirmed_status {
            Some(status) => {
                if status != command.target_status() {
                    warn!(
                        "Endpoint reported {} for {} after {}",
                        status, zone, command
                    );
                }
                (status, true)
            }
            None => (command.target_status(), false),
        };

        self.state.set_status(status);
        self.stats.record_applied();

        match command {
            ControlCommand::Reserve => info!("Parking in {} has been reserved", zone),
            ControlCommand::Release => info!("Parking in {} has been released", zone),
        }

        let event = ParkspotEvent::ReservationChanged {
            zone,
            command,
            status,
            confirmed,
        };
        if let Err(e) = self.event_bus.publish(event).await {
            debug!("Reservation event not delivered: {}", e);
        }

        ToggleOutcome::Applied {
            zone,
            command,
            status,
            confirmed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{CommandReply, FakeEndpoint};
    use std::time::Duration;
    use tokio::time::sleep;

    fn create_toggler(endpoint: Arc<FakeEndpoint>) -> (ReservationToggler, Arc<ParkingState>) {
        let state = Arc::new(ParkingState::new());
        let toggler =
            ReservationToggler::new(endpoint, Arc::clone(&state), Arc::new(EventBus::new(16)));
        (toggler, state)
    }

    #[tokio::test]
    async fn test_reserve_on_success() {
        let endpoint = Arc::new(FakeEndpoint::new());
        let (toggler, state) = create_toggler(Arc::clone(&endpoint));

        let outcome = toggler.toggle(Zone::A).await;

        assert_eq!(
            outcome,
            ToggleOutcome::Applied {
                zone: Zone::A,
                command: ControlCommand::Reserve,
                status: ParkingStatus::Apartado,
                confirmed: false,
            }
        );
        assert_eq!(state.status(), ParkingStatus::Apartado);
        assert_eq!(
            endpoint.commands(),
            vec![(ControlCommand::Reserve, Zone::A)]
        );
    }

    #[tokio::test]
    async fn test_failure_keeps_reserved_status() {
        let endpoint = Arc::new(FakeEndpoint::new());
        let (toggler, state) = create_toggler(Arc::clone(&endpoint));
        state.set_status(ParkingStatus::Apartado);

        endpoint.set_command_reply(CommandReply::Status(500));
        let outcome = toggler.toggle(Zone::B).await;

        assert!(matches!(
            outcome,
            ToggleOutcome::Failed {
                command: ControlCommand::Release,
                ..
            }
        ));
        assert_eq!(state.status(), ParkingStatus::Apartado);
        assert_eq!(toggler.stats().failed, 1);
    }

    #[tokio::test]
    async fn test_network_error_keeps_status() {
        let endpoint = Arc::new(FakeEndpoint::new());
        let (toggler, state) = create_toggler(Arc::clone(&endpoint));
        endpoint.set_command_reply(CommandReply::Transport);

        let outcome = toggler.toggle(Zone::A).await;
        assert!(matches!(
            outcome,
            ToggleOutcome::Failed {
                zone: Zone::A,
                command: ControlCommand::Reserve,
                ..
            }
        ));
        assert_eq!(state.status(), ParkingStatus::Disponible);

        state.set_status(ParkingStatus::Apartado);
        let outcome = toggler.toggle(Zone::A).await;
        assert!(matches!(
            outcome,
            ToggleOutcome::Failed {
                command: ControlCommand::Release,
                ..
            }
        ));
        assert_eq!(state.status(), ParkingStatus::Apartado);

        let stats = toggler.stats();
        assert_eq!(stats.failed, 2);
        assert_eq!(stats.applied, 0);
    }

    #[tokio::test]
    async fn test_success_flips_exactly_once() {
        let endpoint = Arc::new(FakeEndpoint::new());
        let (toggler, state) = create_toggler(Arc::clone(&endpoint));

        for _ in 0..4 {
            let before = state.status();
            assert!(toggler.toggle(Zone::C).await.is_applied());
            assert_eq!(state.status(), before.toggled());
        }

        assert_eq!(
            endpoint.commands(),
            vec![
                (ControlCommand::Reserve, Zone::C),
                (ControlCommand::Release, Zone::C),
                (ControlCommand::Reserve, Zone::C),
                (ControlCommand::Release, Zone::C),
            ]
        );
    }

    #[tokio::test]
    async fn test_confirmed_status_wins_over_inferred() {
        let endpoint = Arc::new(FakeEndpoint::new());
        let (toggler, state) = create_toggler(Arc::clone(&endpoint));

        endpoint.set_command_reply(CommandReply::Confirmed(ParkingStatus::Disponible));
        let outcome = toggler.toggle(Zone::A).await;

        assert_eq!(
            outcome,
            ToggleOutcome::Applied {
                zone: Zone::A,
                command: ControlCommand::Reserve,
                status: ParkingStatus::Disponible,
                confirmed: true,
            }
        );
        assert_eq!(state.status(), ParkingStatus::Disponible);
    }

    #[tokio::test]
    async fn test_overlapping_toggle_is_rejected() {
        let endpoint = Arc::new(FakeEndpoint::new());
        endpoint.set_delay(Duration::from_millis(100));
        let (toggler, state) = create_toggler(Arc::clone(&endpoint));

        let (first, second) = tokio::join!(toggler.toggle(Zone::A), async {
            sleep(Duration::from_millis(20)).await;
            toggler.toggle(Zone::A).await
        });

        assert!(first.is_applied());
        assert_eq!(second, ToggleOutcome::Busy);
        assert_eq!(endpoint.commands().len(), 1);
        assert_eq!(state.status(), ParkingStatus::Apartado);
        assert_eq!(toggler.stats().rejected_busy, 1);
    }

    #[tokio::test]
    async fn test_toggle_selected_requires_zone() {
        let endpoint = Arc::new(FakeEndpoint::new());
        let (toggler, state) = create_toggler(Arc::clone(&endpoint));

        assert_eq!(toggler.toggle_selected().await, ToggleOutcome::NoZoneSelected);
        assert!(endpoint.commands().is_empty());

        state.select_zone(Zone::B);
        assert!(toggler.toggle_selected().await.is_applied());
        assert_eq!(
            endpoint.commands(),
            vec![(ControlCommand::Reserve, Zone::B)]
        );
    }
}
