//! Local stand-in for the parking service endpoint.
//!
//! Accepts the same two form-encoded request shapes as the real service and
//! keeps a per-zone reservation set. Tests drive it through
//! [`MockEndpointState`] to force failures, delays or confirmation bodies.

use crate::config::ToggleConfig;
use crate::error::{ParkspotError, Result};
use crate::model::{ControlCommand, ParkingStatus, Zone};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Form, Json, Router,
};
use parking_lot::Mutex;
use serde_json::json;
use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// A control request as received by the mock
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCommand {
    pub literal: String,
    pub zone: String,
}

#[derive(Debug)]
struct MockInner {
    proximity_value: serde_json::Value,
    reserved: HashSet<Zone>,
    fail_status: Option<u16>,
    confirm_status: bool,
    response_delay: Duration,
    poll_requests: u64,
    commands: Vec<RecordedCommand>,
}

/// Shared, test-controllable state behind the mock endpoint
#[derive(Clone)]
pub struct MockEndpointState {
    inner: Arc<Mutex<MockInner>>,
    toggle: ToggleConfig,
}

impl MockEndpointState {
    pub fn new(toggle: ToggleConfig) -> Self {
        Self {
            inner: Arc::new(Mutex::new(MockInner {
                proximity_value: json!("0"),
                reserved: HashSet::new(),
                fail_status: None,
                confirm_status: false,
                response_delay: Duration::ZERO,
                poll_requests: 0,
                commands: Vec::new(),
            })),
            toggle,
        }
    }

    /// Value returned as `proximity_value`; any JSON value is allowed
    pub fn set_proximity(&self, value: serde_json::Value) {
        self.inner.lock().proximity_value = value;
    }

    /// Answer every request with this status until cleared
    pub fn set_fail_status(&self, status: Option<u16>) {
        self.inner.lock().fail_status = status;
    }

    /// Include `parking_status` in control responses
    pub fn set_confirm_status(&self, confirm: bool) {
        self.inner.lock().confirm_status = confirm;
    }

    pub fn set_response_delay(&self, delay: Duration) {
        self.inner.lock().response_delay = delay;
    }

    pub fn is_reserved(&self, zone: Zone) -> bool {
        self.inner.lock().reserved.contains(&zone)
    }

    pub fn poll_requests(&self) -> u64 {
        self.inner.lock().poll_requests
    }

    pub fn commands(&self) -> Vec<RecordedCommand> {
        self.inner.lock().commands.clone()
    }

    fn delay_and_failure(&self) -> (Duration, Option<u16>) {
        let inner = self.inner.lock();
        (inner.response_delay, inner.fail_status)
    }
}

/// Build the router serving the endpoint at `/` and `/index.php`
pub fn router(state: MockEndpointState) -> Router {
    Router::new()
        .route("/", post(endpoint_handler))
        .route("/index.php", post(endpoint_handler))
        .with_state(state)
}

async fn endpoint_handler(
    State(state): State<MockEndpointState>,
    Form(params): Form<HashMap<String, String>>,
) -> Response {
    let (delay, fail_status) = state.delay_and_failure();

    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }

    if let Some(literal) = params.get("control_command") {
        let zone = params.get("zone").cloned().unwrap_or_default();
        state.inner.lock().commands.push(RecordedCommand {
            literal: literal.clone(),
            zone: zone.clone(),
        });

        if let Some(status) = fail_status {
            return failure_response(status);
        }

        return control_response(&state, literal, &zone);
    }

    if params.contains_key("led_status") {
        let proximity_value = {
            let mut inner = state.inner.lock();
            inner.poll_requests += 1;
            inner.proximity_value.clone()
        };

        if let Some(status) = fail_status {
            return failure_response(status);
        }

        return Json(json!({ "proximity_value": proximity_value })).into_response();
    }

    warn!("Mock endpoint received unrecognized request: {:?}", params);
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "error": "unrecognized request" })),
    )
        .into_response()
}

fn control_response(state: &MockEndpointState, literal: &str, zone_label: &str) -> Response {
    let Some(command) = state.toggle.command_for(literal) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": format!("unknown control_command '{}'", literal) })),
        )
            .into_response();
    };

    let Some(zone) = Zone::parse(zone_label) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": format!("unknown zone '{}'", zone_label) })),
        )
            .into_response();
    };

    let (status, confirm) = {
        let mut inner = state.inner.lock();
        match command {
            ControlCommand::Reserve => inner.reserved.insert(zone),
            ControlCommand::Release => inner.reserved.remove(&zone),
        };
        let status = if inner.reserved.contains(&zone) {
            ParkingStatus::Apartado
        } else {
            ParkingStatus::Disponible
        };
        (status, inner.confirm_status)
    };

    debug!("Mock endpoint applied {} to {} -> {}", command, zone, status);

    if confirm {
        Json(json!({ "status": "ok", "parking_status": status.label() })).into_response()
    } else {
        (StatusCode::OK, "OK").into_response()
    }
}

fn failure_response(status: u16) -> Response {
    let code = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (code, Json(json!({ "error": "forced failure" }))).into_response()
}

/// Running mock endpoint bound to a local address
pub struct MockEndpointServer {
    addr: SocketAddr,
    state: MockEndpointState,
    handle: JoinHandle<()>,
}

impl MockEndpointServer {
    /// Bind and serve in a background task
    pub async fn spawn(bind: &str, state: MockEndpointState) -> Result<Self> {
        let listener = TcpListener::bind(bind).await?;
        let addr = listener.local_addr()?;
        let app = router(state.clone());

        info!("Mock parking endpoint listening on {}", addr);

        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                warn!("Mock endpoint server error: {}", e);
            }
        });

        Ok(Self {
            addr,
            state,
            handle,
        })
    }

    /// Serve on the current task until the server stops
    pub async fn run(bind: &str, state: MockEndpointState) -> Result<()> {
        let listener = TcpListener::bind(bind).await?;
        info!("Mock parking endpoint listening on {}", listener.local_addr()?);

        axum::serve(listener, router(state))
            .await
            .map_err(|e| ParkspotError::component("mock_server".to_string(), e.to_string()))
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn url(&self) -> String {
        format!("http://{}/index.php", self.addr)
    }

    pub fn state(&self) -> &MockEndpointState {
        &self.state
    }
}

impl Drop for MockEndpointServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
