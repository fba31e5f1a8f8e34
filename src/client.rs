use crate::config::{EndpointConfig, PollConfig, ToggleConfig};
use crate::error::{ParkspotError, Result};
use crate::model::{ControlCommand, ParkingStatus, ProximityReading, Zone};
use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::de::Error as _;
use serde_json::Value;
use tracing::{debug, trace};

pub const PROXIMITY_FIELD: &str = "proximity_value";
pub const CONFIRMED_STATUS_FIELD: &str = "parking_status";

/// Outcome of a successful control request
#[derive(Debug, Clone, PartialEq)]
pub struct CommandResponse {
    pub http_status: u16,
    /// Status reported by the endpoint, when the body carries one
    pub confirmed_status: Option<ParkingStatus>,
}

/// Remote parking service as seen by the poller and the toggler
#[async_trait]
pub trait ParkingEndpoint: Send + Sync {
    /// Fetch the current proximity reading
    async fn read_proximity(&self) -> Result<ProximityReading>;

    /// Send a reservation command for a zone. Non-success HTTP statuses are errors.
    async fn send_command(&self, command: ControlCommand, zone: Zone) -> Result<CommandResponse>;
}

/// Form-encoded HTTP client for the parking endpoint
pub struct HttpParkingEndpoint {
    client: Client,
    url: Url,
    led_status: String,
    distance_data: String,
    toggle: ToggleConfig,
}

impl HttpParkingEndpoint {
    pub fn new(endpoint: &EndpointConfig, poll: &PollConfig, toggle: &ToggleConfig) -> Result<Self> {
        let url = Url::parse(&endpoint.url).map_err(|e| {
            ParkspotError::component("http_client".to_string(), format!("invalid url: {}", e))
        })?;

        let client = Client::builder()
            .timeout(endpoint.request_timeout())
            .build()?;

        Ok(Self {
            client,
            url,
            led_status: poll.led_status.clone(),
            distance_data: poll.distance_data.clone(),
            toggle: toggle.clone(),
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

#[async_trait]
impl ParkingEndpoint for HttpParkingEndpoint {
    async fn read_proximity(&self) -> Result<ProximityReading> {
        let params = [
            ("led_status", self.led_status.as_str()),
            ("distance_data", self.distance_data.as_str()),
        ];

        let response = self
            .client
            .post(self.url.clone())
            .form(&params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ParkspotError::Status {
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await?;
        trace!("Poll response body: {}", String::from_utf8_lossy(&body));

        parse_proximity(&body)
    }

    async fn send_command(&self, command: ControlCommand, zone: Zone) -> Result<CommandResponse> {
        let literal = self.toggle.literal(command);
        debug!("POST control_command={} zone={}", literal, zone);

        let params = [("control_command", literal), ("zone", zone.label())];

        let response = self
            .client
            .post(self.url.clone())
            .form(&params)
            .send()
            .await?;

        let status = response.status();
        debug!("Control response status: {}", status);

        if !status.is_success() {
            return Err(ParkspotError::Status {
                status: status.as_u16(),
            });
        }

        // The body is informational; an unreadable body does not undo a 2xx
        let confirmed_status = match response.text().await {
            Ok(body) => parse_confirmation(&body),
            Err(e) => {
                debug!("Could not read control response body: {}", e);
                None
            }
        };

        Ok(CommandResponse {
            http_status: status.as_u16(),
            confirmed_status,
        })
    }
}

/// Extract `proximity_value` from a poll response body.
///
/// Strings are taken as-is and numbers are converted to their decimal text.
pub fn parse_proximity(body: &[u8]) -> Result<ProximityReading> {
    let value: Value = serde_json::from_slice(body)?;

    match value.get(PROXIMITY_FIELD) {
        None | Some(Value::Null) => Err(ParkspotError::MissingField {
            field: PROXIMITY_FIELD,
        }),
        Some(Value::String(raw)) => Ok(ProximityReading::new(raw.as_str())),
        Some(Value::Number(number)) => Ok(ProximityReading::new(number.to_string())),
        Some(other) => Err(ParkspotError::Decode(serde_json::Error::custom(format!(
            "unexpected {} value: {}",
            PROXIMITY_FIELD, other
        )))),
    }
}

/// Status confirmed by a control response body, if it carries one
pub fn parse_confirmation(body: &str) -> Option<ParkingStatus> {
    let value: Value = serde_json::from_str(body).ok()?;
    value
        .get(CONFIRMED_STATUS_FIELD)
        .and_then(Value::as_str)
        .and_then(ParkingStatus::from_label)
}
