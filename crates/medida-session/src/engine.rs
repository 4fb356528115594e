//! Consumed capture-engine contract.

use crate::capture::{OutputChannel, SignalType};
use crate::Result;

/// Raw curves for one channel of a stereo measurement, on the same
/// frequency grid as the combined response.
#[derive(Debug, Clone, Default)]
pub struct MeasuredChannel {
    /// Magnitudes in dB.
    pub magnitudes: Vec<f32>,
    /// Phase in degrees, or empty when unmeasured.
    pub phases: Vec<f32>,
}

/// Per-channel raw data reported alongside a stereo measurement.
#[derive(Debug, Clone)]
pub struct MeasuredChannels {
    /// Left channel.
    pub left: MeasuredChannel,
    /// Right channel.
    pub right: MeasuredChannel,
}

/// A completed measurement as returned by the capture engine.
#[derive(Debug, Clone)]
pub struct MeasuredResponse {
    /// Frequency bins in Hz, strictly increasing.
    pub frequencies: Vec<f32>,
    /// Combined magnitudes in dB.
    pub magnitudes: Vec<f32>,
    /// Combined phase in degrees, or empty when unmeasured.
    pub phases: Vec<f32>,
    /// Per-channel raw data when the source captured multiple channels.
    pub channels: Option<MeasuredChannels>,
}

/// Actionable category of a capture failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureFailureKind {
    /// The platform denied microphone access.
    PermissionDenied,
    /// No usable input device exists.
    NoDevice,
    /// The device is held by another application.
    DeviceBusy,
    /// The environment cannot capture at all.
    Unsupported,
    /// The engine reported success but produced no data points.
    Empty,
    /// Anything else; the message carries the detail.
    Other,
}

impl CaptureFailureKind {
    /// Classify an engine-reported message into an actionable category.
    pub fn classify(message: &str) -> Self {
        let lower = message.to_lowercase();
        if lower.contains("permission denied") || lower.contains("not allowed") {
            CaptureFailureKind::PermissionDenied
        } else if lower.contains("no microphone") || lower.contains("no device") {
            CaptureFailureKind::NoDevice
        } else if lower.contains("already in use") || lower.contains("busy") {
            CaptureFailureKind::DeviceBusy
        } else if lower.contains("not supported") {
            CaptureFailureKind::Unsupported
        } else {
            CaptureFailureKind::Other
        }
    }

    /// Short display form used in error messages.
    pub fn as_str(self) -> &'static str {
        match self {
            CaptureFailureKind::PermissionDenied => "permission denied",
            CaptureFailureKind::NoDevice => "no device",
            CaptureFailureKind::DeviceBusy => "device busy",
            CaptureFailureKind::Unsupported => "unsupported environment",
            CaptureFailureKind::Empty => "empty result",
            CaptureFailureKind::Other => "error",
        }
    }
}

impl std::fmt::Display for CaptureFailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Measurement engine playing a stimulus and recording the response.
///
/// The engine owns transient audio resources (streams, contexts) and must
/// release them when dropped. Setters take effect for the next
/// `start_capture` call; failures are returned as
/// [`crate::Error::CaptureFailed`] with the engine's message preserved
/// verbatim.
pub trait CaptureEngine {
    /// Stimulus length in seconds.
    fn set_sweep_duration(&mut self, seconds: u32);

    /// Output channel(s) the stimulus plays on.
    fn set_output_channel(&mut self, channel: OutputChannel);

    /// Capture sample rate in Hz.
    fn set_sample_rate(&mut self, hz: u32);

    /// Stimulus signal type.
    fn set_signal_type(&mut self, signal: SignalType);

    /// Capture (input) volume, 0-100.
    fn set_capture_volume(&mut self, percent: u8);

    /// Playback volume, 0-100.
    fn set_output_volume(&mut self, percent: u8);

    /// Output device the stimulus plays through.
    fn set_output_device(&mut self, device_id: &str);

    /// Play the stimulus and record the response on `device_id`.
    /// Blocks for the stimulus duration.
    fn start_capture(&mut self, device_id: &str) -> Result<MeasuredResponse>;
}
