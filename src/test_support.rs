//! In-memory endpoint used by poller, toggler and app tests.

use crate::client::{CommandResponse, ParkingEndpoint};
use crate::error::{ParkspotError, Result};
use crate::model::{ControlCommand, ParkingStatus, ProximityReading, Zone};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

#[derive(Debug, Clone)]
pub enum PollReply {
    Reading(&'static str),
    MissingField,
    Status(u16),
    /// No HTTP response at all
    Transport,
}

#[derive(Debug, Clone)]
pub enum CommandReply {
    Ok,
    Confirmed(ParkingStatus),
    Status(u16),
    /// No HTTP response at all
    Transport,
}

/// A genuine `reqwest::Error`. reqwest has no public constructor for its
/// errors, so this builds a request with an unparsable URL.
pub fn transport_error() -> ParkspotError {
    match reqwest::Client::new().post("http://[::1").build() {
        Err(e) => ParkspotError::Http(e),
        Ok(_) => ParkspotError::system("request with an invalid url was built"),
    }
}

pub struct FakeEndpoint {
    poll_reply: Mutex<PollReply>,
    command_reply: Mutex<CommandReply>,
    delay: Mutex<Duration>,
    commands: Mutex<Vec<(ControlCommand, Zone)>>,
    poll_calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl FakeEndpoint {
    pub fn new() -> Self {
        Self {
            poll_reply: Mutex::new(PollReply::Reading("0")),
            command_reply: Mutex::new(CommandReply::Ok),
            delay: Mutex::new(Duration::ZERO),
            commands: Mutex::new(Vec::new()),
            poll_calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn set_poll_reply(&self, reply: PollReply) {
        *self.poll_reply.lock() = reply;
    }

    pub fn set_command_reply(&self, reply: CommandReply) {
        *self.command_reply.lock() = reply;
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock() = delay;
    }

    pub fn commands(&self) -> Vec<(ControlCommand, Zone)> {
        self.commands.lock().clone()
    }

    pub fn poll_calls(&self) -> usize {
        self.poll_calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    async fn simulate_latency(&self) {
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        let delay = *self.delay.lock();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl ParkingEndpoint for FakeEndpoint {
    async fn read_proximity(&self) -> Result<ProximityReading> {
        self.poll_calls.fetch_add(1, Ordering::SeqCst);
        self.simulate_latency().await;

        let reply = self.poll_reply.lock().clone();
        match reply {
            PollReply::Reading(raw) => Ok(ProximityReading::new(raw)),
            PollReply::MissingField => Err(ParkspotError::MissingField {
                field: crate::client::PROXIMITY_FIELD,
            }),
            PollReply::Status(status) => Err(ParkspotError::Status { status }),
            PollReply::Transport => Err(transport_error()),
        }
    }

    async fn send_command(&self, command: ControlCommand, zone: Zone) -> Result<CommandResponse> {
        self.commands.lock().push((command, zone));
        self.simulate_latency().await;

        let reply = self.command_reply.lock().clone();
        match reply {
            CommandReply::Ok => Ok(CommandResponse {
                http_status: 200,
                confirmed_status: None,
            }),
            CommandReply::Confirmed(status) => Ok(CommandResponse {
                http_status: 200,
                confirmed_status: Some(status),
            }),
            CommandReply::Status(status) => Err(ParkspotError::Status { status }),
            CommandReply::Transport => Err(transport_error()),
        }
    }
}

#[test]
fn test_transport_error_is_transport() {
    assert!(transport_error().is_transport());
}
