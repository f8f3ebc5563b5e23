//! Rendering of snapshots for the debugger

use crate::config::OutputFormat;
use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use hwsens_core::{ReadingRecord, SensorRecord, Snapshot};
use hwsens_types::SensorKey;
use serde::Serialize;
use std::fmt::Write;

/// What to print and how
#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    pub format: OutputFormat,
    pub user_labels: bool,
    /// Only this legacy sensor id
    pub sensor: Option<String>,
}

#[derive(Serialize)]
struct SnapshotView<'a> {
    version: u32,
    revision: u32,
    poll_time: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    polled_at: Option<DateTime<Utc>>,
    stale: bool,
    sensors: Vec<SensorView<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    orphaned_readings: Vec<ReadingView<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    diagnostics: Vec<String>,
}

#[derive(Serialize)]
struct SensorView<'a> {
    id: String,
    sensor_id: u32,
    instance: u32,
    name: &'a str,
    readings: Vec<ReadingView<'a>>,
}

#[derive(Serialize)]
struct ReadingView<'a> {
    id: u32,
    #[serde(rename = "type")]
    reading_type: &'static str,
    label: &'a str,
    unit: &'a str,
    value: f64,
    min: f64,
    max: f64,
    avg: f64,
}

fn sensor_name<'a>(sensor: &'a SensorRecord, user_labels: bool) -> &'a str {
    if user_labels {
        sensor.display_name()
    } else {
        &sensor.name_orig
    }
}

fn reading_view(reading: &ReadingRecord, user_labels: bool) -> ReadingView<'_> {
    ReadingView {
        id: reading.reading_id,
        reading_type: reading.reading_type.as_str(),
        label: if user_labels {
            reading.display_label()
        } else {
            &reading.label_orig
        },
        unit: &reading.unit,
        value: reading.value,
        min: reading.min,
        max: reading.max,
        avg: reading.avg,
    }
}

fn view<'a>(snapshot: &'a Snapshot, stale: bool, options: &RenderOptions) -> Result<SnapshotView<'a>> {
    let positions: Vec<usize> = match &options.sensor {
        Some(id) => vec![snapshot
            .position_of_legacy(id)
            .ok_or_else(|| anyhow!("Sensor id {} does not exist", id))?],
        None => (0..snapshot.sensors.len()).collect(),
    };

    let sensors = positions
        .into_iter()
        .map(|pos| {
            let sensor = &snapshot.sensors[pos];
            SensorView {
                id: sensor.legacy_id(),
                sensor_id: sensor.sensor_id,
                instance: sensor.instance,
                name: sensor_name(sensor, options.user_labels),
                readings: snapshot
                    .readings_for(pos)
                    .map(|r| reading_view(r, options.user_labels))
                    .collect(),
            }
        })
        .collect();

    // Orphans belong to no sensor, so a sensor filter hides them
    let orphaned_readings = if options.sensor.is_none() {
        snapshot
            .orphaned_readings()
            .map(|r| reading_view(r, options.user_labels))
            .collect()
    } else {
        Vec::new()
    };

    Ok(SnapshotView {
        version: snapshot.header.version,
        revision: snapshot.header.revision,
        poll_time: snapshot.poll_time(),
        polled_at: snapshot.header.poll_timestamp(),
        stale,
        sensors,
        orphaned_readings,
        diagnostics: snapshot.diagnostics.iter().map(ToString::to_string).collect(),
    })
}

fn write_reading(out: &mut String, reading: &ReadingView<'_>) {
    let _ = writeln!(
        out,
        "    #{:<6} {:<5} {:<32} {:>12.3} {:<6} (min {:.3}, max {:.3}, avg {:.3})",
        reading.id,
        reading.reading_type,
        reading.label,
        reading.value,
        reading.unit,
        reading.min,
        reading.max,
        reading.avg
    );
}

fn render_text(view: &SnapshotView<'_>) -> String {
    let mut out = String::new();
    let polled_at = view
        .polled_at
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| view.poll_time.to_string());
    let _ = writeln!(
        out,
        "HWiNFO shared memory v{}.{}, polled {}{}",
        view.version,
        view.revision,
        polled_at,
        if view.stale { " (stale)" } else { "" }
    );

    for sensor in &view.sensors {
        let _ = writeln!(
            out,
            "[{}] {} ({}, {} readings)",
            sensor.id,
            sensor.name,
            SensorKey::new(sensor.sensor_id, sensor.instance),
            sensor.readings.len()
        );
        for reading in &sensor.readings {
            write_reading(&mut out, reading);
        }
    }

    if !view.orphaned_readings.is_empty() {
        let _ = writeln!(out, "[orphaned] ({} readings)", view.orphaned_readings.len());
        for reading in &view.orphaned_readings {
            write_reading(&mut out, reading);
        }
    }

    for diagnostic in &view.diagnostics {
        let _ = writeln!(out, "warning: {}", diagnostic);
    }
    out
}

/// Render a snapshot in the configured format
pub fn render_snapshot(snapshot: &Snapshot, stale: bool, options: &RenderOptions) -> Result<String> {
    let view = view(snapshot, stale, options)?;
    match options.format {
        OutputFormat::Text => Ok(render_text(&view)),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&view)?),
    }
}

/// Render an inactive segment
pub fn render_inactive(signature: [u8; 4], format: OutputFormat) -> Result<String> {
    let signature = String::from_utf8_lossy(&signature).into_owned();
    match format {
        OutputFormat::Text => Ok(format!(
            "HWiNFO shared memory inactive (signature {:?})\n",
            signature
        )),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&serde_json::json!({
            "active": false,
            "signature": signature,
        }))?),
    }
}
