//! Capture session state machine and derived-view computation.
//!
//! The session owns the in-memory "current capture" (raw plus every
//! re-derivable view), the capture settings mirrored onto the engine, the
//! active calibration, and the selection set used for multi-capture
//! comparison. Raw data is immutable once captured; smoothed views are
//! recomputed in place whenever the smoothing parameter changes, so a
//! display change never requires re-measuring.

use std::collections::BTreeSet;

use chrono::Utc;

use medida_core::{CalibrationStore, FrequencyResponse, average_complex};

use crate::capture::{CaptureId, ChannelCurves, ChannelData, NewCapture, OutputChannel, SignalType};
use crate::engine::{CaptureEngine, CaptureFailureKind, MeasuredChannels, MeasuredResponse};
use crate::repository::CaptureStore;
use crate::smoothing::Smoother;
use crate::{Error, Result};

/// Default smoothing: 1/3 octave.
const DEFAULT_OCTAVE_FRACTION: u32 = 3;

/// Session lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No measurement running and no pending result.
    Idle,
    /// A measurement is in progress; starting another is rejected.
    Capturing,
    /// A measurement completed and its data is held in the session.
    Captured,
}

/// Capture parameters mirrored onto the engine before a measurement.
#[derive(Debug, Clone)]
pub struct CaptureSettings {
    /// Stimulus signal type.
    pub signal_type: SignalType,
    /// Stimulus duration in seconds.
    pub duration_seconds: u32,
    /// Capture sample rate in Hz.
    pub sample_rate: u32,
    /// Output channel the stimulus plays on.
    pub output_channel: OutputChannel,
    /// Capture (input) volume, 0-100.
    pub capture_volume: u8,
    /// Playback volume, 0-100.
    pub output_volume: u8,
    /// Output device id, when not the system default.
    pub output_device: Option<String>,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            signal_type: SignalType::Sweep,
            duration_seconds: 5,
            sample_rate: 48000,
            output_channel: OutputChannel::Default,
            capture_volume: 50,
            output_volume: 50,
            output_device: None,
        }
    }
}

/// The in-memory data of the most recent measurement.
#[derive(Debug, Clone)]
pub struct CurrentCapture {
    /// Input device the response was recorded on.
    pub device_name: String,
    /// Output channel the stimulus was played on.
    pub output_channel: OutputChannel,
    /// Measured response; never mutated after capture.
    pub raw: FrequencyResponse,
    /// Smoothed view at the session's octave fraction.
    pub smoothed: FrequencyResponse,
    /// Per-channel breakdown when the engine reported channels.
    pub channel_data: Option<ChannelData>,
}

/// One measurement session.
///
/// Display parameters (smoothing factor, calibration, selection) live here
/// as explicit fields rather than ambient globals, so resolvers receive
/// everything they read through the session.
pub struct CaptureSession {
    state: SessionState,
    current: Option<CurrentCapture>,
    settings: CaptureSettings,
    smoothing_octave_fraction: u32,
    calibration: CalibrationStore,
    selection: BTreeSet<CaptureId>,
}

impl CaptureSession {
    /// Create an idle session with default settings and 1/3-octave
    /// smoothing.
    pub fn new() -> Self {
        Self {
            state: SessionState::Idle,
            current: None,
            settings: CaptureSettings::default(),
            smoothing_octave_fraction: DEFAULT_OCTAVE_FRACTION,
            calibration: CalibrationStore::new(),
            selection: BTreeSet::new(),
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// The most recent measurement's data, if any.
    pub fn current(&self) -> Option<&CurrentCapture> {
        self.current.as_ref()
    }

    /// Capture settings mirrored onto the engine.
    pub fn settings(&self) -> &CaptureSettings {
        &self.settings
    }

    /// Mutable capture settings.
    pub fn settings_mut(&mut self) -> &mut CaptureSettings {
        &mut self.settings
    }

    /// Octave fraction `N` (as in 1/N octave) for smoothed views.
    pub fn smoothing_octave_fraction(&self) -> u32 {
        self.smoothing_octave_fraction
    }

    /// The session's calibration store.
    pub fn calibration(&self) -> &CalibrationStore {
        &self.calibration
    }

    /// Mutable calibration store (load/clear the active curve).
    pub fn calibration_mut(&mut self) -> &mut CalibrationStore {
        &mut self.calibration
    }

    /// Ids currently selected for multi-capture comparison.
    pub fn selection(&self) -> &BTreeSet<CaptureId> {
        &self.selection
    }

    /// Add or remove an id from the comparison selection.
    pub fn toggle_selection(&mut self, id: &str, selected: bool) {
        if selected {
            self.selection.insert(id.to_string());
        } else {
            self.selection.remove(id);
        }
    }

    /// Empty the comparison selection.
    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// Push the session's settings onto a capture engine.
    pub fn configure_engine(&self, engine: &mut dyn CaptureEngine) {
        engine.set_signal_type(self.settings.signal_type);
        engine.set_sweep_duration(self.settings.duration_seconds);
        engine.set_sample_rate(self.settings.sample_rate);
        engine.set_output_channel(self.settings.output_channel);
        engine.set_capture_volume(self.settings.capture_volume.min(100));
        engine.set_output_volume(self.settings.output_volume.min(100));
        if let Some(device) = &self.settings.output_device {
            engine.set_output_device(device);
        }
    }

    /// Enter the capturing state.
    ///
    /// Rejected with [`Error::CaptureInProgress`] while a measurement is
    /// already running; captures are strictly serialized.
    pub fn begin_capture(&mut self) -> Result<()> {
        if self.state == SessionState::Capturing {
            return Err(Error::CaptureInProgress);
        }
        self.state = SessionState::Capturing;
        Ok(())
    }

    /// Abort the running measurement, keeping whatever data the session
    /// held before it started.
    pub fn stop_capture(&mut self) {
        if self.state == SessionState::Capturing {
            self.state = self.prior_state();
        }
    }

    /// Record an engine failure, keeping prior session data.
    pub fn fail_capture(&mut self) {
        if self.state == SessionState::Capturing {
            self.state = self.prior_state();
        }
    }

    /// Accept a completed measurement and derive its smoothed views.
    ///
    /// An empty response counts as a failure: the session returns to its
    /// prior state and nothing from the measurement is retained.
    pub fn complete_capture(
        &mut self,
        device_name: &str,
        measured: MeasuredResponse,
        smoother: &dyn Smoother,
    ) -> Result<()> {
        if self.state != SessionState::Capturing {
            return Err(Error::NotCapturing);
        }

        if measured.frequencies.is_empty() {
            self.state = self.prior_state();
            return Err(Error::CaptureFailed {
                kind: CaptureFailureKind::Empty,
                message: "capture produced no frequency points".to_string(),
            });
        }

        let MeasuredResponse {
            frequencies,
            magnitudes,
            phases,
            channels,
        } = measured;
        let fraction = self.smoothing_octave_fraction;

        let derived: Result<_> = (|| {
            let raw = FrequencyResponse::new(frequencies, magnitudes, phases)?;
            let smoothed = smooth_response(&raw, fraction, smoother);
            let channel_data = channels
                .as_ref()
                .map(|ch| derive_channel_data(&raw.frequencies, ch, fraction, smoother))
                .transpose()?;
            Ok((raw, smoothed, channel_data))
        })();

        // Invalid engine data is a failed capture: prior session data stays.
        let (raw, smoothed, channel_data) = match derived {
            Ok(parts) => parts,
            Err(e) => {
                self.state = self.prior_state();
                return Err(e);
            }
        };

        tracing::info!(
            device = device_name,
            points = raw.len(),
            phase = raw.has_phase(),
            stereo = channel_data.is_some(),
            "capture completed"
        );

        self.current = Some(CurrentCapture {
            device_name: device_name.to_string(),
            output_channel: self.settings.output_channel,
            raw,
            smoothed,
            channel_data,
        });
        self.state = SessionState::Captured;
        Ok(())
    }

    /// Run one full measurement: configure the engine, capture, and accept
    /// the result.
    pub fn run_capture(
        &mut self,
        engine: &mut dyn CaptureEngine,
        device_id: &str,
        smoother: &dyn Smoother,
    ) -> Result<()> {
        self.begin_capture()?;
        self.configure_engine(engine);

        match engine.start_capture(device_id) {
            Ok(measured) => self.complete_capture(device_id, measured, smoother),
            Err(e) => {
                self.fail_capture();
                Err(e)
            }
        }
    }

    /// Re-derive every smoothed view at a new octave fraction.
    ///
    /// Pure recomputation from the immutable raw data: no engine involved,
    /// idempotent, and `raw` is never touched. A no-op on the data when the
    /// session holds none (the fraction is still stored for the next
    /// capture).
    pub fn reprocess(&mut self, octave_fraction: u32, smoother: &dyn Smoother) {
        self.smoothing_octave_fraction = octave_fraction.max(1);
        let fraction = self.smoothing_octave_fraction;

        let Some(current) = self.current.as_mut() else {
            return;
        };

        current.smoothed = smooth_response(&current.raw, fraction, smoother);

        if let Some(channels) = current.channel_data.as_mut() {
            for curves in [
                &mut channels.left,
                &mut channels.right,
                &mut channels.average,
            ] {
                resmooth_curves(&current.raw.frequencies, curves, fraction, smoother);
            }
        }

        tracing::debug!(octave_fraction = fraction, "session reprocessed");
    }

    /// Drop the session's measurement data and return to idle.
    pub fn clear(&mut self) {
        self.current = None;
        self.state = SessionState::Idle;
    }

    /// Commit the current measurement to a store as an immutable capture.
    ///
    /// The store owns its own copy; the session keeps its data for further
    /// display work.
    pub fn save_capture(&mut self, store: &mut dyn CaptureStore) -> Result<CaptureId> {
        let current = self.current.as_ref().ok_or(Error::NoCaptureData)?;

        let id = store.save(NewCapture {
            timestamp: Utc::now(),
            device_name: current.device_name.clone(),
            signal_type: self.settings.signal_type,
            duration_seconds: self.settings.duration_seconds,
            sample_rate: self.settings.sample_rate,
            output_channel: current.output_channel,
            raw: current.raw.clone(),
            smoothed: current.smoothed.clone(),
            smoothing_octave_fraction: self.smoothing_octave_fraction,
            channel_data: current.channel_data.clone(),
        });
        Ok(id)
    }

    /// Delete one capture from the store and from the comparison selection.
    ///
    /// The selection entry is removed even when the store no longer holds
    /// the id, so no dangling selection reference survives.
    pub fn delete_capture(&mut self, store: &mut dyn CaptureStore, id: &str) -> bool {
        let deleted = store.delete(id);
        self.selection.remove(id);
        deleted
    }

    /// Delete several captures, each independently.
    ///
    /// Not atomic by design: a failure on one id leaves the others deleted.
    /// Returns each id with whether its deletion succeeded.
    pub fn delete_captures(
        &mut self,
        store: &mut dyn CaptureStore,
        ids: &[CaptureId],
    ) -> Vec<(CaptureId, bool)> {
        ids.iter()
            .map(|id| {
                let deleted = self.delete_capture(store, id);
                (id.clone(), deleted)
            })
            .collect()
    }

    /// State to fall back to when a running capture stops or fails.
    fn prior_state(&self) -> SessionState {
        if self.current.is_some() {
            SessionState::Captured
        } else {
            SessionState::Idle
        }
    }
}

impl Default for CaptureSession {
    fn default() -> Self {
        Self::new()
    }
}

/// Smooth a response's magnitude (and phase, when present) at the given
/// octave fraction, keeping the frequency grid.
fn smooth_response(
    raw: &FrequencyResponse,
    fraction: u32,
    smoother: &dyn Smoother,
) -> FrequencyResponse {
    let magnitudes = smoother.smooth_magnitudes(&raw.frequencies, &raw.magnitudes, fraction);
    let phases = if raw.has_phase() {
        smoother.smooth_phases(&raw.frequencies, &raw.phases, fraction)
    } else {
        Vec::new()
    };
    FrequencyResponse {
        frequencies: raw.frequencies.clone(),
        magnitudes,
        phases,
    }
}

/// Build the per-channel breakdown from engine-reported channel data.
fn derive_channel_data(
    frequencies: &[f32],
    channels: &MeasuredChannels,
    fraction: u32,
    smoother: &dyn Smoother,
) -> Result<ChannelData> {
    let left_raw = FrequencyResponse::new(
        frequencies.to_vec(),
        channels.left.magnitudes.clone(),
        channels.left.phases.clone(),
    )?;
    let right_raw = FrequencyResponse::new(
        frequencies.to_vec(),
        channels.right.magnitudes.clone(),
        channels.right.phases.clone(),
    )?;

    let average_raw = if left_raw.has_phase() && right_raw.has_phase() {
        average_complex(&left_raw, &right_raw)?
    } else {
        // Without phase the channels cannot interfere; the magnitude mean
        // is the only meaningful average.
        let magnitudes = left_raw
            .magnitudes
            .iter()
            .zip(&right_raw.magnitudes)
            .map(|(l, r)| (l + r) / 2.0)
            .collect();
        FrequencyResponse {
            frequencies: frequencies.to_vec(),
            magnitudes,
            phases: Vec::new(),
        }
    };

    Ok(ChannelData {
        left: channel_curves(&left_raw, fraction, smoother),
        right: channel_curves(&right_raw, fraction, smoother),
        average: channel_curves(&average_raw, fraction, smoother),
    })
}

/// Raw plus freshly smoothed curves for one channel.
fn channel_curves(raw: &FrequencyResponse, fraction: u32, smoother: &dyn Smoother) -> ChannelCurves {
    let smoothed = smooth_response(raw, fraction, smoother);
    ChannelCurves {
        raw_magnitudes: raw.magnitudes.clone(),
        smoothed_magnitudes: smoothed.magnitudes,
        raw_phases: raw.phases.clone(),
        smoothed_phases: smoothed.phases,
    }
}

/// Recompute a channel's smoothed curves in place from its raw curves.
fn resmooth_curves(
    frequencies: &[f32],
    curves: &mut ChannelCurves,
    fraction: u32,
    smoother: &dyn Smoother,
) {
    curves.smoothed_magnitudes =
        smoother.smooth_magnitudes(frequencies, &curves.raw_magnitudes, fraction);
    curves.smoothed_phases = if curves.raw_phases.is_empty() {
        Vec::new()
    } else {
        smoother.smooth_phases(frequencies, &curves.raw_phases, fraction)
    };
}
