//! Domain types shared by the poller, the toggler and the view.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Raw proximity value reported by the remote sensor endpoint.
///
/// The value is opaque; the only meaning the client attaches to it is that the
/// literal `"0"` marks the monitored space as free.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProximityReading(String);

impl ProximityReading {
    pub const FREE: &'static str = "0";

    pub fn new<S: Into<String>>(raw: S) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_free(&self) -> bool {
        self.0 == Self::FREE
    }
}

impl fmt::Display for ProximityReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Local reservation status of the monitored space
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ParkingStatus {
    #[default]
    Disponible,
    Apartado,
}

impl ParkingStatus {
    pub fn label(&self) -> &'static str {
        match self {
            ParkingStatus::Disponible => "Disponible",
            ParkingStatus::Apartado => "Apartado",
        }
    }

    pub fn toggled(&self) -> Self {
        match self {
            ParkingStatus::Disponible => ParkingStatus::Apartado,
            ParkingStatus::Apartado => ParkingStatus::Disponible,
        }
    }

    /// Command that moves the space out of this status
    pub fn toggle_command(&self) -> ControlCommand {
        match self {
            ParkingStatus::Disponible => ControlCommand::Reserve,
            ParkingStatus::Apartado => ControlCommand::Release,
        }
    }

    /// Parse a status label as reported by the endpoint
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim() {
            "Disponible" => Some(ParkingStatus::Disponible),
            "Apartado" => Some(ParkingStatus::Apartado),
            _ => None,
        }
    }
}

impl fmt::Display for ParkingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Parking zones offered by the service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Zone {
    A,
    B,
    C,
}

impl Zone {
    pub const ALL: [Zone; 3] = [Zone::A, Zone::B, Zone::C];

    /// Label sent as the `zone` request parameter
    pub fn label(&self) -> &'static str {
        match self {
            Zone::A => "Zona A",
            Zone::B => "Zona B",
            Zone::C => "Zona C",
        }
    }

    /// Zone for a 1-based list position
    pub fn from_index(index: usize) -> Option<Self> {
        index
            .checked_sub(1)
            .and_then(|i| Self::ALL.get(i))
            .copied()
    }

    /// Accepts `A`, `zona a`, `Zona A` and similar spellings
    pub fn parse(input: &str) -> Option<Self> {
        let normalized = input.trim().to_ascii_lowercase();
        let letter = normalized
            .strip_prefix("zona")
            .map(str::trim)
            .unwrap_or(&normalized);

        match letter {
            "a" => Some(Zone::A),
            "b" => Some(Zone::B),
            "c" => Some(Zone::C),
            _ => None,
        }
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Two-valued reservation command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ControlCommand {
    Reserve,
    Release,
}

impl ControlCommand {
    /// Status the space is expected to have once the command succeeds
    pub fn target_status(&self) -> ParkingStatus {
        match self {
            ControlCommand::Reserve => ParkingStatus::Apartado,
            ControlCommand::Release => ParkingStatus::Disponible,
        }
    }
}

impl fmt::Display for ControlCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControlCommand::Reserve => f.write_str("reserve"),
            ControlCommand::Release => f.write_str("release"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reading_free_only_for_zero_literal() {
        assert!(ProximityReading::new("0").is_free());
        assert!(!ProximityReading::new("1").is_free());
        assert!(!ProximityReading::new(" 0").is_free());
        assert!(!ProximityReading::new("").is_free());
    }

    #[test]
    fn test_status_toggle_and_command() {
        assert_eq!(ParkingStatus::Disponible.toggled(), ParkingStatus::Apartado);
        assert_eq!(ParkingStatus::Apartado.toggled(), ParkingStatus::Disponible);
        assert_eq!(
            ParkingStatus::Disponible.toggle_command(),
            ControlCommand::Reserve
        );
        assert_eq!(
            ParkingStatus::Apartado.toggle_command(),
            ControlCommand::Release
        );

        for status in [ParkingStatus::Disponible, ParkingStatus::Apartado] {
            assert_eq!(status.toggle_command().target_status(), status.toggled());
        }
    }

    #[test]
    fn test_status_from_label() {
        assert_eq!(
            ParkingStatus::from_label("Apartado"),
            Some(ParkingStatus::Apartado)
        );
        assert_eq!(
            ParkingStatus::from_label(" Disponible "),
            Some(ParkingStatus::Disponible)
        );
        assert_eq!(ParkingStatus::from_label("Ocupado"), None);
    }

    #[test]
    fn test_zone_parsing() {
        assert_eq!(Zone::parse("A"), Some(Zone::A));
        assert_eq!(Zone::parse("zona b"), Some(Zone::B));
        assert_eq!(Zone::parse("Zona C"), Some(Zone::C));
        assert_eq!(Zone::parse("Zona D"), None);

        assert_eq!(Zone::from_index(1), Some(Zone::A));
        assert_eq!(Zone::from_index(3), Some(Zone::C));
        assert_eq!(Zone::from_index(0), None);
        assert_eq!(Zone::from_index(4), None);
    }
}
