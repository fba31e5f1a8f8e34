use crate::model::{ParkingStatus, ProximityReading, Zone};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tracing::{debug, trace};

/// Read-only copy of the client state
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StateSnapshot {
    pub selected_zone: Option<Zone>,
    pub reading: Option<ProximityReading>,
    pub status: ParkingStatus,
    pub last_reading_at: Option<DateTime<Utc>>,
    pub last_status_change_at: Option<DateTime<Utc>>,
}

impl StateSnapshot {
    /// Detail view is open whenever a zone is selected
    pub fn detail_open(&self) -> bool {
        self.selected_zone.is_some()
    }

    /// False until a poll succeeds
    pub fn space_free(&self) -> bool {
        self.reading.as_ref().is_some_and(ProximityReading::is_free)
    }
}

/// Shared parking state.
///
/// The poller only writes the reading and the toggler only writes the status,
/// so neither can clobber the other's field. Readers take snapshots; no lock is
/// ever held across an await point.
#[derive(Debug, Default)]
pub struct ParkingState {
    inner: RwLock<StateSnapshot>,
}

impl ParkingState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> StateSnapshot {
        self.inner.read().clone()
    }

    pub fn status(&self) -> ParkingStatus {
        self.inner.read().status
    }

    pub fn reading(&self) -> Option<ProximityReading> {
        self.inner.read().reading.clone()
    }

    pub fn selected_zone(&self) -> Option<Zone> {
        self.inner.read().selected_zone
    }

    pub fn select_zone(&self, zone: Zone) {
        let mut state = self.inner.write();
        state.selected_zone = Some(zone);
        debug!("Selected {}", zone);
    }

    /// Close the detail view; returns the zone that was selected
    pub fn close_detail(&self) -> Option<Zone> {
        let mut state = self.inner.write();
        let previous = state.selected_zone.take();
        debug!("Detail view closed (was {:?})", previous);
        previous
    }

    /// Store a new reading; returns true if it differs from the previous one
    pub fn apply_reading(&self, reading: ProximityReading) -> bool {
        let mut state = self.inner.write();
        state.last_reading_at = Some(Utc::now());

        if state.reading.as_ref() == Some(&reading) {
            trace!("Proximity reading unchanged: {}", reading);
            return false;
        }

        debug!(
            "Proximity reading {:?} -> {}",
            state.reading.as_ref().map(ProximityReading::as_str),
            reading
        );
        state.reading = Some(reading);
        true
    }

    /// Set the reservation status; returns the previous status
    pub fn set_status(&self, status: ParkingStatus) -> ParkingStatus {
        let mut state = self.inner.write();
        let previous = std::mem::replace(&mut state.status, status);
        if previous != status {
            state.last_status_change_at = Some(Utc::now());
            debug!("Parking status {} -> {}", previous, status);
        }
        previous
    }
}
