//! CSV export and import of captures.
//!
//! The format is a metadata block of `# key: value` comment lines followed
//! by a column header and one row per frequency bin. Floats are written
//! with Rust's shortest round-trip formatting, so an exported capture
//! imports back equal to the original in every field.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use chrono::{DateTime, Utc};

use medida_core::FrequencyResponse;

use crate::capture::{Capture, OutputChannel, SignalType};
use crate::{Error, Result};

/// Column header of the data section.
const CSV_HEADER: &str = "frequency_hz,raw_db,smoothed_db,raw_phase_deg,smoothed_phase_deg";

/// Write a capture as CSV.
pub fn write_csv<W: Write>(capture: &Capture, mut out: W) -> Result<()> {
    writeln!(out, "# medida capture export")?;
    writeln!(out, "# id: {}", capture.id)?;
    writeln!(out, "# name: {}", capture.name)?;
    writeln!(out, "# timestamp: {}", capture.timestamp.to_rfc3339())?;
    writeln!(out, "# device: {}", capture.device_name)?;
    writeln!(out, "# signal: {}", capture.signal_type.as_str())?;
    writeln!(out, "# duration_s: {}", capture.duration_seconds)?;
    writeln!(out, "# sample_rate: {}", capture.sample_rate)?;
    writeln!(out, "# output_channel: {}", capture.output_channel.as_str())?;
    writeln!(out, "# smoothing: 1/{}", capture.smoothing_octave_fraction)?;
    writeln!(out, "{CSV_HEADER}")?;

    for i in 0..capture.raw.len() {
        let raw_phase = capture
            .raw
            .phases
            .get(i)
            .map(|p| p.to_string())
            .unwrap_or_default();
        let smoothed_phase = capture
            .smoothed
            .phases
            .get(i)
            .map(|p| p.to_string())
            .unwrap_or_default();
        writeln!(
            out,
            "{},{},{},{},{}",
            capture.raw.frequencies[i],
            capture.raw.magnitudes[i],
            capture.smoothed.magnitudes[i],
            raw_phase,
            smoothed_phase
        )?;
    }
    Ok(())
}

/// Read a capture back from its CSV form.
pub fn read_csv<R: BufRead>(reader: R) -> Result<Capture> {
    let mut metadata: HashMap<String, String> = HashMap::new();
    let mut frequencies = Vec::new();
    let mut raw_magnitudes = Vec::new();
    let mut smoothed_magnitudes = Vec::new();
    let mut raw_phases: Vec<f32> = Vec::new();
    let mut smoothed_phases: Vec<f32> = Vec::new();
    let mut phase_present = false;

    for line in reader.lines() {
        let line = line?;
        let line = line.trim_end();

        if let Some(comment) = line.strip_prefix('#') {
            // Metadata comments are "key: value"; the banner line has no
            // colon and is skipped.
            if let Some((key, value)) = comment.split_once(':') {
                metadata.insert(key.trim().to_string(), value.trim().to_string());
            }
            continue;
        }
        if line.is_empty() || line == CSV_HEADER {
            continue;
        }

        let cells: Vec<&str> = line.split(',').collect();
        if cells.len() != 5 {
            return Err(Error::Export(format!(
                "expected 5 columns, got {}: '{}'",
                cells.len(),
                line
            )));
        }

        frequencies.push(parse_float(cells[0])?);
        raw_magnitudes.push(parse_float(cells[1])?);
        smoothed_magnitudes.push(parse_float(cells[2])?);
        if !cells[3].is_empty() || !cells[4].is_empty() {
            phase_present = true;
            raw_phases.push(parse_float(cells[3])?);
            smoothed_phases.push(parse_float(cells[4])?);
        } else if phase_present {
            return Err(Error::Export(
                "phase columns present on some rows but not all".to_string(),
            ));
        }
    }

    if frequencies.is_empty() {
        return Err(Error::Export("no data rows".to_string()));
    }
    if phase_present && raw_phases.len() != frequencies.len() {
        return Err(Error::Export(
            "phase columns present on some rows but not all".to_string(),
        ));
    }

    let timestamp: DateTime<Utc> = DateTime::parse_from_rfc3339(meta(&metadata, "timestamp")?)
        .map_err(|e| Error::Export(format!("bad timestamp: {e}")))?
        .with_timezone(&Utc);
    let signal_type = SignalType::parse(meta(&metadata, "signal")?)
        .ok_or_else(|| Error::Export("unknown signal type".to_string()))?;
    let output_channel = OutputChannel::parse(meta(&metadata, "output_channel")?)
        .ok_or_else(|| Error::Export("unknown output channel".to_string()))?;
    let smoothing_octave_fraction = meta(&metadata, "smoothing")?
        .strip_prefix("1/")
        .and_then(|n| n.parse().ok())
        .ok_or_else(|| Error::Export("bad smoothing fraction".to_string()))?;
    let duration_seconds = parse_meta_int(&metadata, "duration_s")?;
    let sample_rate = parse_meta_int(&metadata, "sample_rate")?;

    let raw = FrequencyResponse::new(
        frequencies.clone(),
        raw_magnitudes,
        if phase_present { raw_phases } else { Vec::new() },
    )?;
    let smoothed = FrequencyResponse::new(
        frequencies,
        smoothed_magnitudes,
        if phase_present {
            smoothed_phases
        } else {
            Vec::new()
        },
    )?;

    Ok(Capture {
        id: meta(&metadata, "id")?.to_string(),
        name: meta(&metadata, "name")?.to_string(),
        timestamp,
        device_name: meta(&metadata, "device")?.to_string(),
        signal_type,
        duration_seconds,
        sample_rate,
        output_channel,
        raw,
        smoothed,
        smoothing_octave_fraction,
        // The per-channel breakdown is not part of the CSV schema.
        channel_data: None,
    })
}

/// Export a capture to a CSV file.
pub fn export_csv_file(capture: &Capture, path: impl AsRef<Path>) -> Result<()> {
    let file = File::create(path)?;
    write_csv(capture, BufWriter::new(file))
}

/// Import a capture from a CSV file.
pub fn import_csv_file(path: impl AsRef<Path>) -> Result<Capture> {
    let file = File::open(path)?;
    read_csv(BufReader::new(file))
}

fn parse_float(cell: &str) -> Result<f32> {
    cell.parse()
        .map_err(|_| Error::Export(format!("bad float: '{cell}'")))
}

fn meta<'a>(metadata: &'a HashMap<String, String>, key: &str) -> Result<&'a str> {
    metadata
        .get(key)
        .map(String::as_str)
        .ok_or_else(|| Error::Export(format!("missing metadata: {key}")))
}

fn parse_meta_int(metadata: &HashMap<String, String>, key: &str) -> Result<u32> {
    meta(metadata, key)?
        .parse()
        .map_err(|_| Error::Export(format!("bad integer metadata: {key}")))
}
