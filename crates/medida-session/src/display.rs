//! Display-mode resolution: mapping a requested view to concrete curves.
//!
//! The session and repository hold a small set of persisted raw curves;
//! every view the UI can ask for is derived from them here. Overlaying and
//! calibration subtraction are the renderer's job; this module only decides
//! *which* curves a mode shows.

use medida_core::{FrequencyResponse, average_complex};

use crate::capture::{Capture, CaptureId, ChannelCurves, ChannelData, OutputChannel};
use crate::repository::CaptureStore;
use crate::session::CaptureSession;
use crate::{Error, Result};

/// A requested view of session and repository data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayMode {
    /// The session's combined current capture.
    Current,
    /// The current capture's derived average channel.
    Average,
    /// The current capture's left channel.
    Left,
    /// The current capture's right channel.
    Right,
    /// Combined plus every per-channel curve, overlaid.
    All,
    /// Complex average of the latest stored left and right captures.
    LrSum,
    /// Overlay of the selected (or all) stored captures.
    CombinedAll,
    /// One stored capture by id.
    Capture(CaptureId),
}

impl DisplayMode {
    /// Parse a mode string ("current", "lr_sum", "capture_cap-3", ...).
    ///
    /// Unknown strings log a warning and yield `None` so the caller leaves
    /// the display unchanged instead of failing.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "current" => Some(DisplayMode::Current),
            "average" => Some(DisplayMode::Average),
            "left" => Some(DisplayMode::Left),
            "right" => Some(DisplayMode::Right),
            "all" => Some(DisplayMode::All),
            "lr_sum" => Some(DisplayMode::LrSum),
            "combined_all" => Some(DisplayMode::CombinedAll),
            other => match other.strip_prefix("capture_") {
                Some(id) if !id.is_empty() => Some(DisplayMode::Capture(id.to_string())),
                _ => {
                    tracing::warn!(mode = other, "unknown display mode, display unchanged");
                    None
                }
            },
        }
    }
}

/// One labeled curve pair ready for rendering.
#[derive(Debug, Clone)]
pub struct DisplayCurve {
    /// Legend label.
    pub label: String,
    /// Unsmoothed curve.
    pub raw: FrequencyResponse,
    /// Smoothed curve (equal to `raw` for views without a raw/smoothed
    /// distinction, such as the L+R average).
    pub smoothed: FrequencyResponse,
}

/// Resolve a display mode to the concrete curve set it shows.
///
/// Session-derived views (`Current`, `Average`, `Left`, `Right`, `All`)
/// resolve to an empty set when the session holds no matching data; the
/// renderer shows its placeholder. `LrSum` fails with
/// [`Error::InsufficientData`] when either the left or the right stored
/// capture is missing, and `Capture` with [`Error::UnknownCapture`] for an
/// id the store does not hold.
pub fn resolve_display(
    mode: &DisplayMode,
    session: &CaptureSession,
    store: &dyn CaptureStore,
) -> Result<Vec<DisplayCurve>> {
    match mode {
        DisplayMode::Current => Ok(current_curve(session).into_iter().collect()),
        DisplayMode::Average => {
            Ok(channel_curve(session, "Average", |d| &d.average)
                .into_iter()
                .collect())
        }
        DisplayMode::Left => Ok(channel_curve(session, "Left", |d| &d.left)
            .into_iter()
            .collect()),
        DisplayMode::Right => Ok(channel_curve(session, "Right", |d| &d.right)
            .into_iter()
            .collect()),
        DisplayMode::All => {
            let mut curves: Vec<DisplayCurve> = current_curve(session).into_iter().collect();
            curves.extend(channel_curve(session, "Left", |d| &d.left));
            curves.extend(channel_curve(session, "Right", |d| &d.right));
            curves.extend(channel_curve(session, "Average", |d| &d.average));
            Ok(curves)
        }
        DisplayMode::LrSum => lr_sum(store),
        DisplayMode::CombinedAll => {
            let captures: Vec<&Capture> = if session.selection().is_empty() {
                store.get_all()
            } else {
                // Ids deleted since selection are skipped, not errors.
                session
                    .selection()
                    .iter()
                    .filter_map(|id| store.get(id))
                    .collect()
            };
            Ok(captures.into_iter().map(capture_curve).collect())
        }
        DisplayMode::Capture(id) => {
            let capture = store
                .get(id)
                .ok_or_else(|| Error::UnknownCapture(id.clone()))?;
            Ok(vec![capture_curve(capture)])
        }
    }
}

/// The session's combined current capture, labeled by output channel.
fn current_curve(session: &CaptureSession) -> Option<DisplayCurve> {
    let current = session.current()?;
    Some(DisplayCurve {
        label: format!("Current{}", channel_suffix(current.output_channel)),
        raw: current.raw.clone(),
        smoothed: current.smoothed.clone(),
    })
}

/// One per-channel curve of the current capture, when the session captured
/// multiple channels.
fn channel_curve(
    session: &CaptureSession,
    label: &str,
    pick: impl Fn(&ChannelData) -> &ChannelCurves,
) -> Option<DisplayCurve> {
    let current = session.current()?;
    let curves = pick(current.channel_data.as_ref()?);
    let frequencies = current.raw.frequencies.clone();

    Some(DisplayCurve {
        label: label.to_string(),
        raw: FrequencyResponse {
            frequencies: frequencies.clone(),
            magnitudes: curves.raw_magnitudes.clone(),
            phases: curves.raw_phases.clone(),
        },
        smoothed: FrequencyResponse {
            frequencies,
            magnitudes: curves.smoothed_magnitudes.clone(),
            phases: curves.smoothed_phases.clone(),
        },
    })
}

/// Complex average of the most recent left-channel and right-channel
/// captures.
fn lr_sum(store: &dyn CaptureStore) -> Result<Vec<DisplayCurve>> {
    let by_channel = store.by_channel();
    let left = by_channel
        .get(&OutputChannel::Left)
        .and_then(|captures| captures.first().copied())
        .ok_or_else(|| Error::InsufficientData("no left-channel capture".to_string()))?;
    let right = by_channel
        .get(&OutputChannel::Right)
        .and_then(|captures| captures.first().copied())
        .ok_or_else(|| Error::InsufficientData("no right-channel capture".to_string()))?;

    let averaged = average_complex(&left.smoothed, &right.smoothed)?;
    Ok(vec![DisplayCurve {
        label: "L+R Average".to_string(),
        raw: averaged.clone(),
        smoothed: averaged,
    }])
}

/// A stored capture's curves, labeled with its name.
fn capture_curve(capture: &Capture) -> DisplayCurve {
    DisplayCurve {
        label: capture.name.clone(),
        raw: capture.raw.clone(),
        smoothed: capture.smoothed.clone(),
    }
}

/// Display suffix for the output channel a capture was taken on.
fn channel_suffix(channel: OutputChannel) -> &'static str {
    match channel {
        OutputChannel::Left => " (Left)",
        OutputChannel::Right => " (Right)",
        OutputChannel::Both => " (Stereo)",
        OutputChannel::Default => "",
    }
}
