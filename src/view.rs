//! Presentation model for the zone list and the detail view.
//!
//! Everything here is derived from a [`StateSnapshot`]; nothing is stored.

use crate::config::DisplayConfig;
use crate::model::{ParkingStatus, Zone};
use crate::state::StateSnapshot;
use std::fmt;

pub const ZONE_LIST_HEADER: &str = "Selecciona tu lugar de Estacionamiento:";
pub const DETAIL_HEADER: &str = "Mapa de Estacionamiento";
pub const CLOSE_LABEL: &str = "Cerrar Mapa";
pub const OCCUPIED_LABEL: &str = "Ocupado";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileColor {
    Green,
    Red,
}

impl fmt::Display for TileColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TileColor::Green => f.write_str("green"),
            TileColor::Red => f.write_str("red"),
        }
    }
}

/// Where a tile's content comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileSource {
    /// Driven by the polled reading and the reservation status
    Live,
    /// Fixed content, not backed by any sensor
    Placeholder,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tile {
    pub label: &'static str,
    pub color: TileColor,
    pub source: TileSource,
}

impl Tile {
    fn placeholder() -> Self {
        Self {
            label: ParkingStatus::Disponible.label(),
            color: TileColor::Green,
            source: TileSource::Placeholder,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DetailView {
    pub zone: Zone,
    pub header: String,
    pub tiles: Vec<Tile>,
    pub action_label: &'static str,
}

impl DetailView {
    pub fn live_tile(&self) -> Option<&Tile> {
        self.tiles.iter().find(|tile| tile.source == TileSource::Live)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Screen {
    ZoneList { zones: Vec<Zone> },
    Detail(DetailView),
}

/// Tile backed by the live reading.
///
/// Color follows the reading alone. The label follows the reading while the
/// space is not reserved, and shows the reservation otherwise, so the two
/// sources can disagree (e.g. green "Apartado").
pub fn live_tile(snapshot: &StateSnapshot) -> Tile {
    let free = snapshot.space_free();
    let color = if free { TileColor::Green } else { TileColor::Red };

    let label = match snapshot.status {
        ParkingStatus::Disponible if free => ParkingStatus::Disponible.label(),
        ParkingStatus::Disponible => OCCUPIED_LABEL,
        ParkingStatus::Apartado => ParkingStatus::Apartado.label(),
    };

    Tile {
        label,
        color,
        source: TileSource::Live,
    }
}

/// Label of the reserve/release button.
///
/// Follows the proximity reading, like the tile color. The command the button
/// sends follows the reservation status instead, so an occupied but unreserved
/// space reads "Liberar" while a press still sends a reserve.
pub fn action_label(snapshot: &StateSnapshot) -> &'static str {
    if snapshot.space_free() {
        "Apartar"
    } else {
        "Liberar"
    }
}

pub fn build_screen(snapshot: &StateSnapshot, display: &DisplayConfig) -> Screen {
    let Some(zone) = snapshot.selected_zone else {
        return Screen::ZoneList {
            zones: Zone::ALL.to_vec(),
        };
    };

    let live = live_tile(snapshot);
    let tiles = if display.placeholder_tiles {
        (0..display.tile_count)
            .map(|i| {
                if i == display.live_tile_index {
                    live
                } else {
                    Tile::placeholder()
                }
            })
            .collect()
    } else {
        vec![live]
    };

    Screen::Detail(DetailView {
        zone,
        header: format!("{} - {}", DETAIL_HEADER, zone),
        tiles,
        action_label: action_label(snapshot),
    })
}

impl Screen {
    /// Plain-text rendering, one entry per line
    pub fn text_lines(&self) -> Vec<String> {
        match self {
            Screen::ZoneList { zones } => {
                let mut lines = vec![ZONE_LIST_HEADER.to_string()];
                lines.extend(
                    zones
                        .iter()
                        .enumerate()
                        .map(|(i, zone)| format!("  [{}] {}", i + 1, zone)),
                );
                lines
            }
            Screen::Detail(detail) => {
                let tiles = detail
                    .tiles
                    .iter()
                    .map(|tile| format!("[{} ({})]", tile.label, tile.color))
                    .collect::<Vec<_>>()
                    .join(" ");

                vec![
                    detail.header.clone(),
                    tiles,
                    format!("  [r] {}   [c] {}", detail.action_label, CLOSE_LABEL),
                ]
            }
        }
    }
}
