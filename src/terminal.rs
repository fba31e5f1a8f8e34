use crate::state::StateSnapshot;
use crate::view::{Screen, TileColor, TileSource, CLOSE_LABEL, ZONE_LIST_HEADER};
use crossterm::cursor::MoveTo;
use crossterm::style::{Color, Print, Stylize};
use crossterm::terminal::{Clear, ClearType};
use crossterm::QueueableCommand;
use std::io::{self, Write};

/// Draws the current screen to a terminal in raw mode
pub struct TerminalRenderer<W: Write> {
    out: W,
}

impl TerminalRenderer<io::Stdout> {
    pub fn stdout() -> Self {
        Self { out: io::stdout() }
    }
}

impl<W: Write> TerminalRenderer<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    pub fn draw(&mut self, screen: &Screen, snapshot: &StateSnapshot) -> io::Result<()> {
        self.out.queue(Clear(ClearType::All))?.queue(MoveTo(0, 0))?;

        match screen {
            Screen::ZoneList { zones } => {
                self.line(ZONE_LIST_HEADER.bold().to_string())?;
                for (i, zone) in zones.iter().enumerate() {
                    self.line(format!("  [{}] {}", i + 1, zone))?;
                }
                self.line(String::new())?;
                self.line("  [1-3] select zone   [q] quit".dim().to_string())?;
            }
            Screen::Detail(detail) => {
                self.line(detail.header.clone().bold().to_string())?;
                self.line(String::new())?;

                let mut row = String::from("  ");
                for tile in &detail.tiles {
                    let color = match tile.color {
                        TileColor::Green => Color::Green,
                        TileColor::Red => Color::Red,
                    };
                    let text = format!("[ {} ]", tile.label).with(color);
                    let text = match tile.source {
                        TileSource::Live => text.bold(),
                        TileSource::Placeholder => text,
                    };
                    row.push_str(&text.to_string());
                    row.push(' ');
                }
                self.line(row)?;
                self.line(String::new())?;
                self.line(format!(
                    "  [r] {}   [c] {}   [q] quit",
                    detail.action_label, CLOSE_LABEL
                ))?;
            }
        }

        let reading = snapshot
            .reading
            .as_ref()
            .map(|r| r.as_str().to_string())
            .unwrap_or_else(|| "-".to_string());
        let updated = snapshot
            .last_reading_at
            .map(|t| t.format("%H:%M:%S").to_string())
            .unwrap_or_else(|| "never".to_string());

        self.line(String::new())?;
        self.line(
            format!(
                "  proximity={} status={} updated={}",
                reading, snapshot.status, updated
            )
            .dim()
            .to_string(),
        )?;

        self.out.flush()
    }

    // Raw mode needs an explicit carriage return
    fn line(&mut self, text: String) -> io::Result<()> {
        self.out.queue(Print(text))?.queue(Print("\r\n"))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ParkspotConfig;
    use crate::model::{ParkingStatus, ProximityReading, Zone};
    use crate::view::build_screen;

    #[test]
    fn test_draw_detail_view() {
        let config = ParkspotConfig::default();
        let snapshot = StateSnapshot {
            selected_zone: Some(Zone::B),
            reading: Some(ProximityReading::new("0")),
            status: ParkingStatus::Disponible,
            ..Default::default()
        };
        let screen = build_screen(&snapshot, &config.display);

        let mut renderer = TerminalRenderer::new(Vec::new());
        renderer.draw(&screen, &snapshot).unwrap();
        let output = String::from_utf8(renderer.into_inner()).unwrap();

        assert!(output.contains("Mapa de Estacionamiento - Zona B"));
        assert!(output.contains("Apartar"));
        assert!(output.contains("proximity=0"));
        assert!(output.contains("\r\n"));
    }

    #[test]
    fn test_draw_zone_list_before_first_poll() {
        let config = ParkspotConfig::default();
        let snapshot = StateSnapshot::default();
        let screen = build_screen(&snapshot, &config.display);

        let mut renderer = TerminalRenderer::new(Vec::new());
        renderer.draw(&screen, &snapshot).unwrap();
        let output = String::from_utf8(renderer.into_inner()).unwrap();

        assert!(output.contains("[3] Zona C"));
        assert!(output.contains("updated=never"));
    }
}
