use super::{ParkspotApp, RunMode, ShutdownReason};
use crate::error::{EventBusError, ParkspotError, Result};
use crate::events::{EventFilter, ParkspotEvent};
use crate::terminal::TerminalRenderer;
use crate::toggler::ToggleOutcome;
use crate::view::{build_screen, live_tile};
use std::io::Stdout;
use std::sync::Arc;
use tokio::signal;
use tokio::sync::{oneshot, Mutex};
use tracing::{debug, info, trace, warn};

/// Events the main loop acts on; poll failures are only logged
fn loop_relevant(event: &ParkspotEvent) -> bool {
    !matches!(event, ParkspotEvent::PollFailed { .. })
}

impl ParkspotApp {
    /// Run the main event loop until a shutdown is requested
    pub async fn run(&mut self) -> Result<i32> {
        info!("Parkspot client is running");

        let shutdown_sender = self
            .shutdown_sender
            .take()
            .ok_or_else(|| ParkspotError::system("Shutdown sender already taken"))?;

        let mut shutdown_receiver = self
            .shutdown_receiver
            .take()
            .ok_or_else(|| ParkspotError::system("Shutdown receiver already taken"))?;

        self.setup_signal_handlers(shutdown_sender);

        let mut events = self
            .event_bus
            .subscribe_filtered(EventFilter::Custom(loop_relevant), "app");
        let mut renderer = match self.mode {
            RunMode::Interactive => Some(TerminalRenderer::stdout()),
            RunMode::Headless => None,
        };
        self.redraw(&mut renderer);

        let shutdown_reason = loop {
            tokio::select! {
                reason = &mut shutdown_receiver => {
                    break reason.map_err(|_| {
                        ParkspotError::system("Shutdown channel closed unexpectedly")
                    })?;
                }
                received = events.recv() => match received {
                    Ok(event) => {
                        if let Some(reason) = self.handle_event(&event) {
                            break reason;
                        }
                        if event.changes_view() {
                            self.redraw(&mut renderer);
                        }
                    }
                    Err(EventBusError::Lagged { .. }) => {
                        self.redraw(&mut renderer);
                    }
                    Err(EventBusError::ChannelClosed | EventBusError::PublishFailed { .. }) => {
                        break ShutdownReason::Error("event bus closed".to_string());
                    }
                },
            }
        };

        info!("Shutdown initiated: {:?}", shutdown_reason);

        let exit_code = match self.shutdown().await? {
            0 if matches!(shutdown_reason, ShutdownReason::Error(_)) => 1,
            code => code,
        };

        info!("Parkspot client shutdown complete");
        Ok(exit_code)
    }

    /// Apply one event; returns a reason when the loop should stop
    pub(super) fn handle_event(&self, event: &ParkspotEvent) -> Option<ShutdownReason> {
        match event {
            ParkspotEvent::ZoneSelected { zone, .. } => {
                self.state.select_zone(*zone);
            }
            ParkspotEvent::DetailClosed { .. } => {
                self.state.close_detail();
            }
            ParkspotEvent::ToggleRequested { .. } => {
                let toggler = Arc::clone(&self.toggler);
                tokio::spawn(async move {
                    match toggler.toggle_selected().await {
                        ToggleOutcome::NoZoneSelected => {
                            debug!("Toggle ignored, select a zone first");
                        }
                        outcome => debug!("Toggle outcome: {:?}", outcome),
                    }
                });
            }
            ParkspotEvent::ProximityUpdated {
                reading,
                changed: false,
                ..
            } => {
                trace!("Proximity reading still {}", reading);
            }
            ParkspotEvent::ProximityUpdated { reading, .. } => {
                if self.mode == RunMode::Headless {
                    let tile = live_tile(&self.state.snapshot());
                    info!(
                        "Proximity reading {} - space {} ({})",
                        reading, tile.label, tile.color
                    );
                }
            }
            ParkspotEvent::ShutdownRequested { .. } => {
                return Some(ShutdownReason::UserRequest);
            }
            ParkspotEvent::ReservationChanged { .. } | ParkspotEvent::PollFailed { .. } => {}
        }

        None
    }

    fn redraw(&self, renderer: &mut Option<TerminalRenderer<Stdout>>) {
        let Some(renderer) = renderer else {
            return;
        };

        let snapshot = self.state.snapshot();
        let screen = build_screen(&snapshot, &self.config.display);
        if let Err(e) = renderer.draw(&screen, &snapshot) {
            warn!("Failed to draw terminal view: {}", e);
        }
    }

    /// Set up signal handlers for graceful shutdown
    fn setup_signal_handlers(&self, shutdown_sender: oneshot::Sender<ShutdownReason>) {
        let shutdown_sender = Arc::new(Mutex::new(Some(shutdown_sender)));

        // Handle SIGTERM - Unix only
        #[cfg(unix)]
        {
            match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    let shutdown_sender_sigterm = Arc::clone(&shutdown_sender);
                    tokio::spawn(async move {
                        if sigterm.recv().await.is_some() {
                            info!("Received SIGTERM signal");
                            if let Some(sender) = shutdown_sender_sigterm.lock().await.take() {
                                let _ = sender.send(ShutdownReason::Signal("SIGTERM".to_string()));
                            }
                        }
                    });
                }
                Err(e) => warn!("Failed to register SIGTERM handler: {}", e),
            }
        }

        // Handle SIGINT (Ctrl+C) - Cross-platform
        let shutdown_sender_sigint = Arc::clone(&shutdown_sender);
        tokio::spawn(async move {
            if let Ok(()) = signal::ctrl_c().await {
                info!("Received SIGINT signal (Ctrl+C)");
                if let Some(sender) = shutdown_sender_sigint.lock().await.take() {
                    let _ = sender.send(ShutdownReason::Signal("SIGINT".to_string()));
                }
            }
        });
    }
}
