use crate::model::ControlCommand;
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ParkspotConfig {
    pub endpoint: EndpointConfig,
    pub poll: PollConfig,
    pub toggle: ToggleConfig,
    pub display: DisplayConfig,
    pub system: SystemConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct EndpointConfig {
    /// URL of the parking service endpoint (poll and toggle share it)
    #[serde(default = "default_endpoint_url")]
    pub url: String,

    /// Per-request timeout in milliseconds
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PollConfig {
    /// Interval between proximity polls in milliseconds
    #[serde(default = "default_poll_interval_ms")]
    pub interval_ms: u64,

    /// Value sent as `led_status` on every poll
    #[serde(default = "default_led_status")]
    pub led_status: String,

    /// Value sent as `distance_data` on every poll
    #[serde(default = "default_distance_data")]
    pub distance_data: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ToggleConfig {
    /// Wire literal for the reserve command
    #[serde(default = "default_reserve_command")]
    pub reserve_command: String,

    /// Wire literal for the release command
    #[serde(default = "default_release_command")]
    pub release_command: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DisplayConfig {
    /// Show the fixed "Disponible" tiles next to the live one
    #[serde(default = "default_placeholder_tiles")]
    pub placeholder_tiles: bool,

    /// Total number of tiles in the detail view, live tile included
    #[serde(default = "default_tile_count")]
    pub tile_count: usize,

    /// Index of the live tile within the detail view
    #[serde(default = "default_live_tile_index")]
    pub live_tile_index: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SystemConfig {
    /// Event bus capacity
    #[serde(default = "default_event_bus_capacity")]
    pub event_bus_capacity: usize,
}

impl EndpointConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl PollConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

impl ToggleConfig {
    /// Wire literal for a command
    pub fn literal(&self, command: ControlCommand) -> &str {
        match command {
            ControlCommand::Reserve => &self.reserve_command,
            ControlCommand::Release => &self.release_command,
        }
    }

    /// Reverse lookup used by the mock endpoint
    pub fn command_for(&self, literal: &str) -> Option<ControlCommand> {
        if literal == self.reserve_command {
            Some(ControlCommand::Reserve)
        } else if literal == self.release_command {
            Some(ControlCommand::Release)
        } else {
            None
        }
    }
}

impl ParkspotConfig {
    /// Load configuration from default sources (file + environment variables)
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_file("parkspot.toml")
    }

    /// Load configuration from a specific file path
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_str = path.as_ref().to_string_lossy();
        debug!("Loading configuration from: {}", path_str);

        let settings = Config::builder()
            .set_default("endpoint.url", default_endpoint_url())?
            .set_default(
                "endpoint.request_timeout_ms",
                default_request_timeout_ms() as i64,
            )?
            .set_default("poll.interval_ms", default_poll_interval_ms() as i64)?
            .set_default("poll.led_status", default_led_status())?
            .set_default("poll.distance_data", default_distance_data())?
            .set_default("toggle.reserve_command", default_reserve_command())?
            .set_default("toggle.release_command", default_release_command())?
            .set_default("display.placeholder_tiles", default_placeholder_tiles())?
            .set_default("display.tile_count", default_tile_count() as i64)?
            .set_default("display.live_tile_index", default_live_tile_index() as i64)?
            .set_default(
                "system.event_bus_capacity",
                default_event_bus_capacity() as i64,
            )?
            // Add configuration file (optional)
            .add_source(File::with_name(&path_str).required(false))
            // PARKSPOT_POLL__INTERVAL_MS style overrides; field names contain underscores
            .add_source(
                Environment::with_prefix("PARKSPOT")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        let config: ParkspotConfig = settings.try_deserialize()?;

        info!("Configuration loaded successfully");
        debug!("Final configuration: {:#?}", config);

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = reqwest::Url::parse(&self.endpoint.url).map_err(|e| {
            ConfigError::Message(format!(
                "Endpoint url '{}' is invalid: {}",
                self.endpoint.url, e
            ))
        })?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::Message(format!(
                "Endpoint url must use http or https, got '{}'",
                url.scheme()
            )));
        }

        if self.endpoint.request_timeout_ms == 0 {
            return Err(ConfigError::Message(
                "Endpoint request_timeout_ms must be greater than 0".to_string(),
            ));
        }

        if self.poll.interval_ms == 0 {
            return Err(ConfigError::Message(
                "Poll interval_ms must be greater than 0".to_string(),
            ));
        }

        if self.toggle.reserve_command.is_empty() || self.toggle.release_command.is_empty() {
            return Err(ConfigError::Message(
                "Toggle command literals must not be empty".to_string(),
            ));
        }

        if self.toggle.reserve_command == self.toggle.release_command {
            return Err(ConfigError::Message(
                "Reserve and release commands must differ".to_string(),
            ));
        }

        if self.display.tile_count == 0 {
            return Err(ConfigError::Message(
                "Display tile_count must be greater than 0".to_string(),
            ));
        }

        if self.display.live_tile_index >= self.display.tile_count {
            return Err(ConfigError::Message(format!(
                "Display live_tile_index {} is outside tile_count {}",
                self.display.live_tile_index, self.display.tile_count
            )));
        }

        if self.system.event_bus_capacity == 0 {
            return Err(ConfigError::Message(
                "Event bus capacity must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

impl Default for ParkspotConfig {
    fn default() -> Self {
        Self {
            endpoint: EndpointConfig {
                url: default_endpoint_url(),
                request_timeout_ms: default_request_timeout_ms(),
            },
            poll: PollConfig {
                interval_ms: default_poll_interval_ms(),
                led_status: default_led_status(),
                distance_data: default_distance_data(),
            },
            toggle: ToggleConfig {
                reserve_command: default_reserve_command(),
                release_command: default_release_command(),
            },
            display: DisplayConfig {
                placeholder_tiles: default_placeholder_tiles(),
                tile_count: default_tile_count(),
                live_tile_index: default_live_tile_index(),
            },
            system: SystemConfig {
                event_bus_capacity: default_event_bus_capacity(),
            },
        }
    }
}

// Default value functions
fn default_endpoint_url() -> String {
    "https://estacionaithua.000webhostapp.com/index.php".to_string()
}
fn default_request_timeout_ms() -> u64 {
    5000
}

fn default_poll_interval_ms() -> u64 {
    1000
}
fn default_led_status() -> String {
    "1".to_string()
}
fn default_distance_data() -> String {
    "0".to_string()
}

fn default_reserve_command() -> String {
    "reserve".to_string()
}
// The deployed endpoint expects this exact text for releases
fn default_release_command() -> String {
    "no reserve".to_string()
}

fn default_placeholder_tiles() -> bool {
    true
}
fn default_tile_count() -> usize {
    4
}
fn default_live_tile_index() -> usize {
    1
}

fn default_event_bus_capacity() -> usize {
    100
}
