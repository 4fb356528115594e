//! Calibration file parsing and the session's active-curve store.

use crate::response::FrequencyResponse;
use crate::{Error, Result};

/// Parse a free-form calibration text file into a magnitude-only response.
///
/// Accepted layout, per line:
/// - blank lines and `#` / `//` comments are skipped
/// - the first data-position line containing "frequency" or "freq"
///   (case-insensitive) is treated as a column header and discarded
/// - remaining lines are split on any run of commas, tabs, or spaces; the
///   first two tokens are frequency (Hz) and correction magnitude (dB)
/// - rows where either token fails to parse, or frequency is not positive,
///   are dropped silently
///
/// Fails with [`Error::EmptyCalibration`] when no usable rows remain.
pub fn parse_calibration(text: &str) -> Result<FrequencyResponse> {
    let mut frequencies = Vec::new();
    let mut magnitudes = Vec::new();
    let mut seen_data_line = false;

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with("//") {
            continue;
        }

        // A leading "Frequency,Magnitude" style header is discarded rather
        // than parsed as a (failing) data row.
        if !seen_data_line {
            seen_data_line = true;
            if line.to_lowercase().contains("freq") {
                continue;
            }
        }

        let mut tokens = line
            .split([',', '\t', ' '])
            .filter(|token| !token.is_empty());
        let (Some(freq_token), Some(mag_token)) = (tokens.next(), tokens.next()) else {
            continue;
        };

        if let (Ok(freq), Ok(mag)) = (freq_token.parse::<f32>(), mag_token.parse::<f32>())
            && freq.is_finite()
            && mag.is_finite()
            && freq > 0.0
        {
            frequencies.push(freq);
            magnitudes.push(mag);
        }
    }

    if frequencies.is_empty() {
        return Err(Error::EmptyCalibration);
    }
    if magnitudes.len() != frequencies.len() {
        // The loop pushes in lockstep; this guards future edits.
        return Err(Error::LengthMismatch {
            expected: frequencies.len(),
            actual: magnitudes.len(),
        });
    }

    tracing::debug!(points = frequencies.len(), "parsed calibration curve");

    Ok(FrequencyResponse {
        frequencies,
        magnitudes,
        phases: Vec::new(),
    })
}

/// Holds the session's active calibration curve.
///
/// At most one curve is active at a time: loading a new curve replaces the
/// previous one and clearing removes it. Interpolating the correction onto
/// a response grid and subtracting it is the renderer's job; the store only
/// owns the curve and exposes a revision counter so dependents can tell
/// when a re-render with or without calibration is due.
#[derive(Debug, Default)]
pub struct CalibrationStore {
    active: Option<FrequencyResponse>,
    revision: u64,
}

impl CalibrationStore {
    /// Create an empty store with no active curve.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the active curve.
    pub fn load(&mut self, curve: FrequencyResponse) {
        tracing::info!(points = curve.len(), "calibration curve loaded");
        self.active = Some(curve);
        self.revision += 1;
    }

    /// Parse `text` and make the result the active curve.
    ///
    /// On a parse failure the previously active curve is kept.
    pub fn load_from_text(&mut self, text: &str) -> Result<()> {
        let curve = parse_calibration(text)?;
        self.load(curve);
        Ok(())
    }

    /// Drop the active curve, if any.
    pub fn clear(&mut self) {
        if self.active.take().is_some() {
            tracing::info!("calibration curve cleared");
            self.revision += 1;
        }
    }

    /// The currently active curve.
    pub fn active(&self) -> Option<&FrequencyResponse> {
        self.active.as_ref()
    }

    /// Whether a curve is loaded.
    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Monotonic counter bumped on every load and every effective clear.
    pub fn revision(&self) -> u64 {
        self.revision
    }
}
