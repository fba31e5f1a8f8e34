pub mod app;
pub mod client;
pub mod config;
pub mod error;
pub mod events;
pub mod keyboard_input;
pub mod model;
pub mod poller;
pub mod state;
pub mod stats;
pub mod terminal;
pub mod toggler;
pub mod view;

mod inflight;

#[cfg(feature = "mock-server")]
pub mod mock_server;

#[cfg(test)]
mod test_support;

pub use app::{ComponentState, ParkspotApp, RunMode, ShutdownReason};
pub use client::{CommandResponse, HttpParkingEndpoint, ParkingEndpoint};
pub use config::ParkspotConfig;
pub use error::{EventBusError, ParkspotError, Result};
pub use events::{EventBus, EventFilter, EventReceiver, ParkspotEvent};
pub use model::{ControlCommand, ParkingStatus, ProximityReading, Zone};
pub use poller::{PollOutcome, StatusPoller};
pub use state::{ParkingState, StateSnapshot};
pub use toggler::{ReservationToggler, ToggleOutcome};

#[cfg(feature = "mock-server")]
pub use mock_server::{MockEndpointServer, MockEndpointState};
