use crate::error::Result;
use crate::events::{EventBus, ParkspotEvent};
use crate::model::Zone;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::runtime::Handle;
use tokio::task;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// What a key press asks the client to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    SelectZone(Zone),
    Toggle,
    CloseDetail,
    Quit,
}

impl KeyAction {
    pub fn from_key(code: KeyCode, modifiers: KeyModifiers) -> Option<Self> {
        match code {
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => Some(KeyAction::Quit),
            KeyCode::Char(c @ '1'..='9') => c
                .to_digit(10)
                .and_then(|digit| Zone::from_index(digit as usize))
                .map(KeyAction::SelectZone),
            KeyCode::Char(' ') | KeyCode::Char('r') | KeyCode::Enter => Some(KeyAction::Toggle),
            KeyCode::Char('c') | KeyCode::Esc | KeyCode::Backspace => Some(KeyAction::CloseDetail),
            KeyCode::Char('q') => Some(KeyAction::Quit),
            _ => None,
        }
    }

    fn into_event(self) -> ParkspotEvent {
        let timestamp = SystemTime::now();
        match self {
            KeyAction::SelectZone(zone) => ParkspotEvent::ZoneSelected { zone, timestamp },
            KeyAction::Toggle => ParkspotEvent::ToggleRequested { timestamp },
            KeyAction::CloseDetail => ParkspotEvent::DetailClosed { timestamp },
            KeyAction::Quit => ParkspotEvent::ShutdownRequested {
                timestamp,
                reason: "User requested via keyboard".to_string(),
            },
        }
    }
}

/// Publish from the blocking reader thread, one key at a time, so events
/// reach the bus in the order the keys were pressed
fn publish_action(runtime_handle: &Handle, event_bus: &EventBus, action: KeyAction) {
    if let Err(e) = runtime_handle.block_on(event_bus.publish(action.into_event())) {
        warn!("Failed to publish keyboard event: {}", e);
    }
}

/// Keyboard input handler driving zone selection and reservation toggles
pub struct KeyboardInputHandler {
    event_bus: Arc<EventBus>,
    cancellation_token: CancellationToken,
}

impl KeyboardInputHandler {
    /// Create a new keyboard input handler
    pub fn new(event_bus: Arc<EventBus>) -> Self {
        Self {
            event_bus,
            cancellation_token: CancellationToken::new(),
        }
    }

    /// Start listening for keyboard input
    pub async fn start(&self) -> Result<()> {
        info!("Starting keyboard input handler");

        let event_bus = Arc::clone(&self.event_bus);
        let cancellation_token = self.cancellation_token.clone();
        let runtime_handle = Handle::current();

        // crossterm reads block, so the loop lives on the blocking pool
        task::spawn_blocking(move || {
            if let Err(e) = enable_raw_mode() {
                error!("Failed to enable raw mode for keyboard input: {}", e);
                return;
            }

            debug!("Raw mode enabled - keyboard handler active");

            loop {
                if cancellation_token.is_cancelled() {
                    debug!("Keyboard input handler stopping");
                    break;
                }

                match event::poll(Duration::from_millis(100)) {
                    Ok(true) => {
                        let Ok(Event::Key(key_event)) = event::read() else {
                            continue;
                        };
                        if key_event.kind != KeyEventKind::Press {
                            continue;
                        }

                        let Some(action) = KeyAction::from_key(key_event.code, key_event.modifiers)
                        else {
                            debug!("Key pressed: {:?}", key_event.code);
                            continue;
                        };

                        debug!("Key action: {:?}", action);

                        publish_action(&runtime_handle, &event_bus, action);

                        if action == KeyAction::Quit {
                            break;
                        }
                    }
                    Ok(false) => {}
                    Err(e) => {
                        warn!("Error polling for keyboard events: {}", e);
                    }
                }
            }

            if let Err(e) = disable_raw_mode() {
                error!("Failed to disable raw mode: {}", e);
            } else {
                debug!("Raw mode disabled");
            }

            debug!("Keyboard input handler task exited");
        });

        Ok(())
    }

    /// Stop the keyboard input handler
    pub async fn stop(&self) -> Result<()> {
        info!("Stopping keyboard input handler");
        self.cancellation_token.cancel();

        // Give the task a moment to clean up and disable raw mode
        tokio::time::sleep(Duration::from_millis(200)).await;

        // Ensure raw mode is disabled even if the task didn't clean up properly
        let _ = disable_raw_mode();

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_mapping() {
        let none = KeyModifiers::NONE;

        assert_eq!(
            KeyAction::from_key(KeyCode::Char('1'), none),
            Some(KeyAction::SelectZone(Zone::A))
        );
        assert_eq!(
            KeyAction::from_key(KeyCode::Char('3'), none),
            Some(KeyAction::SelectZone(Zone::C))
        );
        assert_eq!(KeyAction::from_key(KeyCode::Char('4'), none), None);
        assert_eq!(
            KeyAction::from_key(KeyCode::Char(' '), none),
            Some(KeyAction::Toggle)
        );
        assert_eq!(
            KeyAction::from_key(KeyCode::Esc, none),
            Some(KeyAction::CloseDetail)
        );
        assert_eq!(
            KeyAction::from_key(KeyCode::Char('c'), KeyModifiers::CONTROL),
            Some(KeyAction::Quit)
        );
        assert_eq!(KeyAction::from_key(KeyCode::Char('x'), none), None);
    }

    #[test]
    fn test_actions_become_events() {
        assert_eq!(
            KeyAction::SelectZone(Zone::B).into_event().event_type(),
            "zone_selected"
        );
        assert_eq!(
            KeyAction::Quit.into_event().event_type(),
            "shutdown_requested"
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_key_events_keep_press_order() {
        let event_bus = Arc::new(EventBus::new(1024));
        let mut receiver = event_bus.subscribe();

        let bus = Arc::clone(&event_bus);
        let handle = Handle::current();
        task::spawn_blocking(move || {
            for _ in 0..100 {
                publish_action(&handle, &bus, KeyAction::SelectZone(Zone::A));
                publish_action(&handle, &bus, KeyAction::Toggle);
            }
        })
        .await
        .unwrap();

        for _ in 0..100 {
            assert_eq!(receiver.recv().await.unwrap().event_type(), "zone_selected");
            assert_eq!(
                receiver.recv().await.unwrap().event_type(),
                "toggle_requested"
            );
        }
    }

    #[tokio::test]
    async fn test_keyboard_handler_stop() {
        let event_bus = Arc::new(EventBus::new(100));
        let handler = KeyboardInputHandler::new(event_bus);

        assert!(!handler.cancellation_token.is_cancelled());
        handler.stop().await.unwrap();
        assert!(handler.cancellation_token.is_cancelled());
    }
}
