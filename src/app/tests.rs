use super::*;
use crate::config::ParkspotConfig;
use crate::events::ParkspotEvent;
use crate::model::{ControlCommand, ParkingStatus, Zone};
use crate::test_support::{CommandReply, FakeEndpoint, PollReply};
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::time::{sleep, timeout};

fn create_test_config() -> ParkspotConfig {
    let mut config = ParkspotConfig::default();
    config.endpoint.url = "http://127.0.0.1:9/index.php".to_string();
    config.poll.interval_ms = 20;
    config
}

fn create_headless_app(endpoint: Arc<FakeEndpoint>) -> ParkspotApp {
    ParkspotApp::with_endpoint(create_test_config(), RunMode::Headless, endpoint)
}

async fn publish(app_bus: &crate::events::EventBus, event: ParkspotEvent) {
    app_bus.publish(event).await.unwrap();
    // Let the event loop pick it up
    sleep(Duration::from_millis(30)).await;
}

#[tokio::test]
async fn test_app_creation_over_http_endpoint() {
    let app = ParkspotApp::new(create_test_config(), RunMode::Headless).unwrap();

    let states = app.get_all_component_states().await;
    assert!(states.is_empty());
    assert_eq!(app.config().poll.interval_ms, 20);
}

#[tokio::test]
async fn test_component_state_management() {
    let mut app = create_headless_app(Arc::new(FakeEndpoint::new()));
    app.initialize().await.unwrap();

    assert_eq!(
        app.get_component_state("poller").await,
        Some(ComponentState::Stopped)
    );
    // No keyboard in headless mode
    assert_eq!(app.get_component_state("keyboard").await, None);

    app.start().await.unwrap();
    assert_eq!(
        app.get_component_state("poller").await,
        Some(ComponentState::Running)
    );

    assert_eq!(app.shutdown().await.unwrap(), 0);
    assert_eq!(
        app.get_component_state("poller").await,
        Some(ComponentState::Stopped)
    );
}

#[tokio::test]
async fn test_poll_once_without_start() {
    let endpoint = Arc::new(FakeEndpoint::new());
    endpoint.set_poll_reply(PollReply::Reading("1"));
    let app = create_headless_app(Arc::clone(&endpoint));

    let outcome = app.poll_once().await;

    assert!(matches!(outcome, crate::poller::PollOutcome::Updated(_)));
    assert_eq!(app.state().reading().unwrap().as_str(), "1");
    assert_eq!(app.poll_stats().attempts, 1);
}

#[tokio::test]
async fn test_event_loop_selects_toggles_and_quits() {
    let endpoint = Arc::new(FakeEndpoint::new());
    let mut app = create_headless_app(Arc::clone(&endpoint));
    let state = app.state();
    let bus = app.event_bus();

    app.initialize().await.unwrap();
    app.start().await.unwrap();
    let handle = tokio::spawn(async move { app.run().await });
    sleep(Duration::from_millis(30)).await;

    publish(
        &bus,
        ParkspotEvent::ZoneSelected {
            zone: Zone::B,
            timestamp: SystemTime::now(),
        },
    )
    .await;
    assert_eq!(state.selected_zone(), Some(Zone::B));

    publish(
        &bus,
        ParkspotEvent::ToggleRequested {
            timestamp: SystemTime::now(),
        },
    )
    .await;
    assert_eq!(state.status(), ParkingStatus::Apartado);
    assert_eq!(endpoint.commands(), vec![(ControlCommand::Reserve, Zone::B)]);

    // A failing release leaves the reservation in place
    endpoint.set_command_reply(CommandReply::Status(500));
    publish(
        &bus,
        ParkspotEvent::ToggleRequested {
            timestamp: SystemTime::now(),
        },
    )
    .await;
    assert_eq!(state.status(), ParkingStatus::Apartado);

    publish(
        &bus,
        ParkspotEvent::DetailClosed {
            timestamp: SystemTime::now(),
        },
    )
    .await;
    assert_eq!(state.selected_zone(), None);
    assert!(state.snapshot().space_free());

    bus.publish(ParkspotEvent::ShutdownRequested {
        timestamp: SystemTime::now(),
        reason: "test".to_string(),
    })
    .await
    .unwrap();

    let exit_code = timeout(Duration::from_secs(5), handle)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert_eq!(exit_code, 0);
}

#[tokio::test]
async fn test_initial_zone_is_selected_on_start() {
    let mut app = create_headless_app(Arc::new(FakeEndpoint::new()));
    app.set_initial_zone(Some(Zone::C));

    app.initialize().await.unwrap();
    app.start().await.unwrap();
    assert_eq!(app.state().selected_zone(), Some(Zone::C));

    app.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_run_twice_fails() {
    let mut app = create_headless_app(Arc::new(FakeEndpoint::new()));
    app.shutdown_receiver.take();

    assert!(app.run().await.is_err());
}
