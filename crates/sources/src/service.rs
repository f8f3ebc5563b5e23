//! Latest-snapshot cache with lookups by legacy sensor id
//!
//! Pollers publish each decoded state here; any number of readers fetch the
//! current snapshot without locking. Lookups use the legacy textual sensor id
//! (`sensor_id * 100 + instance`) that panel configs store.

use anyhow::{anyhow, Result};
use arc_swap::ArcSwapOption;
use hwsens_core::{
    ReadingRecord, SegmentProvider, SegmentState, SensorRecord, Snapshot, SnapshotError,
    SnapshotReader,
};
use serde::Serialize;
use std::sync::Arc;

/// What a new state did to the cache
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// A snapshot with a new poll time was stored
    Updated,
    /// Stored, but the producer has not refreshed since the previous one
    Stale,
    /// The segment is inactive; the cache was cleared
    Inactive,
}

/// Sensor entry for pickers and listings
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SensorSummary {
    pub id: String,
    pub name: String,
    pub reading_count: usize,
}

/// Holds the most recent snapshot
#[derive(Default)]
pub struct SensorService {
    latest: ArcSwapOption<Snapshot>,
}

impl SensorService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a decoded state
    pub fn apply(&self, state: SegmentState) -> RefreshOutcome {
        match state {
            SegmentState::Active(snapshot) => {
                let current = Arc::new(snapshot);
                let previous = self.latest.swap(Some(Arc::clone(&current)));
                if previous.is_some_and(|prev| current.is_stale_since(&prev)) {
                    RefreshOutcome::Stale
                } else {
                    RefreshOutcome::Updated
                }
            }
            SegmentState::Inactive { .. } => {
                self.latest.store(None);
                RefreshOutcome::Inactive
            }
        }
    }

    /// Take a snapshot with `reader` and store it
    pub fn refresh<P: SegmentProvider>(
        &self,
        reader: &SnapshotReader<P>,
    ) -> Result<RefreshOutcome, SnapshotError> {
        let state = reader.read()?;
        Ok(self.apply(state))
    }

    pub fn snapshot(&self) -> Option<Arc<Snapshot>> {
        self.latest.load_full()
    }

    fn require(&self) -> Result<Arc<Snapshot>> {
        self.snapshot()
            .ok_or_else(|| anyhow!("No sensor data available (segment not read or inactive)"))
    }

    pub fn poll_time(&self) -> Result<i64> {
        Ok(self.require()?.poll_time())
    }

    /// Legacy ids in sensor table order
    pub fn sensor_ids(&self) -> Result<Vec<String>> {
        Ok(self.require()?.sensors.iter().map(SensorRecord::legacy_id).collect())
    }

    pub fn sensors(&self) -> Result<Vec<SensorSummary>> {
        let snapshot = self.require()?;
        Ok(snapshot
            .sensors
            .iter()
            .enumerate()
            .map(|(pos, sensor)| SensorSummary {
                id: sensor.legacy_id(),
                name: sensor.display_name().to_string(),
                reading_count: snapshot.groups.get(pos).map_or(0, Vec::len),
            })
            .collect())
    }

    /// Readings of the sensor with the given legacy id, in table order
    pub fn readings_for_sensor_id(&self, id: &str) -> Result<Vec<ReadingRecord>> {
        let snapshot = self.require()?;
        let pos = snapshot
            .position_of_legacy(id)
            .ok_or_else(|| anyhow!("Readings for sensor id {} do not exist", id))?;
        Ok(snapshot.readings_for(pos).cloned().collect())
    }

    /// One reading of one sensor, with its sensor
    pub fn reading(&self, sensor_id: &str, reading_id: u32) -> Result<(SensorRecord, ReadingRecord)> {
        let snapshot = self.require()?;
        let pos = snapshot
            .position_of_legacy(sensor_id)
            .ok_or_else(|| anyhow!("Sensor id {} does not exist", sensor_id))?;
        let reading = snapshot
            .readings_for(pos)
            .find(|r| r.reading_id == reading_id)
            .ok_or_else(|| anyhow!("Reading {} not found on sensor {}", reading_id, sensor_id))?;
        Ok((snapshot.sensors[pos].clone(), reading.clone()))
    }
}
