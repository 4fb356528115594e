//! Persisted capture records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use medida_core::FrequencyResponse;

/// Identifier of a persisted capture, assigned by the store at save time.
pub type CaptureId = String;

/// Which output channel(s) played the stimulus during a capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputChannel {
    /// Left channel only.
    Left,
    /// Right channel only.
    Right,
    /// Both channels simultaneously.
    Both,
    /// Whatever the output device routes by default.
    Default,
}

impl OutputChannel {
    /// Lowercase wire/display form.
    pub fn as_str(self) -> &'static str {
        match self {
            OutputChannel::Left => "left",
            OutputChannel::Right => "right",
            OutputChannel::Both => "both",
            OutputChannel::Default => "default",
        }
    }

    /// Parse the lowercase wire form.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "left" => Some(OutputChannel::Left),
            "right" => Some(OutputChannel::Right),
            "both" => Some(OutputChannel::Both),
            "default" => Some(OutputChannel::Default),
            _ => None,
        }
    }
}

/// Stimulus signal used for a measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalType {
    /// Logarithmic sine sweep.
    Sweep,
    /// White noise.
    White,
    /// Pink noise.
    Pink,
}

impl SignalType {
    /// Lowercase wire/display form.
    pub fn as_str(self) -> &'static str {
        match self {
            SignalType::Sweep => "sweep",
            SignalType::White => "white",
            SignalType::Pink => "pink",
        }
    }

    /// Parse the lowercase wire form.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "sweep" => Some(SignalType::Sweep),
            "white" => Some(SignalType::White),
            "pink" => Some(SignalType::Pink),
            _ => None,
        }
    }
}

/// Raw and smoothed curves for one channel of a multi-channel capture.
///
/// All vectors are indexed by the owning capture's frequency grid; the
/// phase vectors are empty when the channel carries no phase data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelCurves {
    /// Measured magnitudes in dB; immutable once captured.
    pub raw_magnitudes: Vec<f32>,
    /// Smoothed magnitudes, re-derivable from `raw_magnitudes`.
    pub smoothed_magnitudes: Vec<f32>,
    /// Measured phase in degrees, or empty.
    #[serde(default)]
    pub raw_phases: Vec<f32>,
    /// Smoothed phase, or empty.
    #[serde(default)]
    pub smoothed_phases: Vec<f32>,
}

/// Per-channel breakdown of a stereo capture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelData {
    /// Left channel curves.
    pub left: ChannelCurves,
    /// Right channel curves.
    pub right: ChannelCurves,
    /// Derived average of left and right.
    pub average: ChannelCurves,
}

/// One persisted measurement: raw and derived curves plus the parameters
/// that produced them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Capture {
    /// Unique id, assigned by the store.
    pub id: CaptureId,
    /// User-editable display name.
    pub name: String,
    /// When the measurement completed.
    pub timestamp: DateTime<Utc>,
    /// Input device the response was recorded on.
    pub device_name: String,
    /// Stimulus signal type.
    pub signal_type: SignalType,
    /// Stimulus duration in seconds.
    pub duration_seconds: u32,
    /// Capture sample rate in Hz.
    pub sample_rate: u32,
    /// Output channel the stimulus was played on.
    pub output_channel: OutputChannel,
    /// Measured response; immutable once captured.
    pub raw: FrequencyResponse,
    /// Smoothed view, re-derivable from `raw` at any octave fraction.
    pub smoothed: FrequencyResponse,
    /// Octave fraction `N` (as in 1/N octave) used to produce `smoothed`.
    pub smoothing_octave_fraction: u32,
    /// Per-channel breakdown for stereo captures.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_data: Option<ChannelData>,
}

/// A capture ready to be committed; the store assigns id and name.
#[derive(Debug, Clone)]
pub struct NewCapture {
    /// When the measurement completed.
    pub timestamp: DateTime<Utc>,
    /// Input device the response was recorded on.
    pub device_name: String,
    /// Stimulus signal type.
    pub signal_type: SignalType,
    /// Stimulus duration in seconds.
    pub duration_seconds: u32,
    /// Capture sample rate in Hz.
    pub sample_rate: u32,
    /// Output channel the stimulus was played on.
    pub output_channel: OutputChannel,
    /// Measured response.
    pub raw: FrequencyResponse,
    /// Smoothed view at `smoothing_octave_fraction`.
    pub smoothed: FrequencyResponse,
    /// Octave fraction used to produce `smoothed`.
    pub smoothing_octave_fraction: u32,
    /// Per-channel breakdown for stereo captures.
    pub channel_data: Option<ChannelData>,
}
