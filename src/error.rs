use thiserror::Error;

#[derive(Error, Debug)]
pub enum ParkspotError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Endpoint returned HTTP {status}")]
    Status { status: u16 },

    #[error("Response decode error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Response is missing field '{field}'")]
    MissingField { field: &'static str },

    #[error("System error: {message}")]
    System { message: String },

    #[error("Component error in {component}: {message}")]
    Component { component: String, message: String },
}

impl ParkspotError {
    pub fn system<S: Into<String>>(message: S) -> Self {
        Self::System {
            message: message.into(),
        }
    }

    pub fn component<S: Into<String>>(component: S, message: S) -> Self {
        Self::Component {
            component: component.into(),
            message: message.into(),
        }
    }

    /// True for failures that happened before any HTTP response arrived
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Http(_))
    }
}

#[derive(Error, Debug)]
pub enum EventBusError {
    #[error("Failed to publish event: {details}")]
    PublishFailed { details: String },

    #[error("Receiver lagged behind by {skipped} events")]
    Lagged { skipped: u64 },

    #[error("Event channel closed")]
    ChannelClosed,
}

pub type Result<T> = std::result::Result<T, ParkspotError>;
