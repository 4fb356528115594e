//! Integration tests for the capture session workflow.
//!
//! Drives the session against a mock capture engine and a simple smoother,
//! covering the measure / save / compare / delete cycle and display-mode
//! resolution.

use medida_session::{
    CaptureEngine, CaptureRepository, CaptureSession, CaptureStore, DisplayMode, Error,
    MeasuredChannel, MeasuredChannels, MeasuredResponse, OutputChannel, PassthroughSmoother,
    SessionState, SignalType, Smoother, resolve_display,
};

// ---------------------------------------------------------------------------
// Test doubles
// ---------------------------------------------------------------------------

/// Engine that replays a canned response and records its configuration.
struct MockEngine {
    response: Option<MeasuredResponse>,
    error: Option<String>,
    configured_duration: u32,
    configured_channel: Option<OutputChannel>,
    configured_signal: Option<SignalType>,
    captured_device: Option<String>,
}

impl MockEngine {
    fn succeeding(response: MeasuredResponse) -> Self {
        Self {
            response: Some(response),
            error: None,
            configured_duration: 0,
            configured_channel: None,
            configured_signal: None,
            captured_device: None,
        }
    }

    fn failing(message: &str) -> Self {
        Self {
            response: None,
            error: Some(message.to_string()),
            configured_duration: 0,
            configured_channel: None,
            configured_signal: None,
            captured_device: None,
        }
    }
}

impl CaptureEngine for MockEngine {
    fn set_sweep_duration(&mut self, seconds: u32) {
        self.configured_duration = seconds;
    }
    fn set_output_channel(&mut self, channel: OutputChannel) {
        self.configured_channel = Some(channel);
    }
    fn set_sample_rate(&mut self, _hz: u32) {}
    fn set_signal_type(&mut self, signal: SignalType) {
        self.configured_signal = Some(signal);
    }
    fn set_capture_volume(&mut self, _percent: u8) {}
    fn set_output_volume(&mut self, _percent: u8) {}
    fn set_output_device(&mut self, _device_id: &str) {}

    fn start_capture(&mut self, device_id: &str) -> medida_session::Result<MeasuredResponse> {
        self.captured_device = Some(device_id.to_string());
        match (&self.response, &self.error) {
            (Some(response), _) => Ok(response.clone()),
            (None, Some(message)) => Err(Error::CaptureFailed {
                kind: medida_session::CaptureFailureKind::classify(message),
                message: message.clone(),
            }),
            (None, None) => unreachable!("mock engine configured with neither result nor error"),
        }
    }
}

/// Three-point moving average, a stand-in with visibly different output
/// per input so derived-view updates are observable.
struct BoxcarSmoother;

impl Smoother for BoxcarSmoother {
    fn smooth_magnitudes(&self, _f: &[f32], magnitudes: &[f32], _fraction: u32) -> Vec<f32> {
        boxcar(magnitudes)
    }
    fn smooth_phases(&self, _f: &[f32], phases: &[f32], _fraction: u32) -> Vec<f32> {
        boxcar(phases)
    }
}

fn boxcar(values: &[f32]) -> Vec<f32> {
    (0..values.len())
        .map(|i| {
            let lo = i.saturating_sub(1);
            let hi = (i + 1).min(values.len() - 1);
            values[lo..=hi].iter().sum::<f32>() / (hi - lo + 1) as f32
        })
        .collect()
}

fn sweep_response(points: usize) -> MeasuredResponse {
    MeasuredResponse {
        frequencies: (0..points).map(|i| 20.0 * 1.5f32.powi(i as i32)).collect(),
        magnitudes: (0..points).map(|i| i as f32).collect(),
        phases: (0..points).map(|i| -(i as f32) * 10.0).collect(),
        channels: None,
    }
}

/// Capture a measurement on `channel` and save it, returning the id.
fn capture_and_save(
    session: &mut CaptureSession,
    repo: &mut CaptureRepository,
    channel: OutputChannel,
) -> String {
    session.settings_mut().output_channel = channel;
    let mut engine = MockEngine::succeeding(sweep_response(8));
    session
        .run_capture(&mut engine, "native_input_USB_Mic", &PassthroughSmoother)
        .unwrap();
    session.save_capture(repo).unwrap()
}

// ===========================================================================
// Capture workflow
// ===========================================================================

#[test]
fn run_capture_configures_engine_and_stores_result() {
    let mut session = CaptureSession::new();
    session.settings_mut().signal_type = SignalType::Pink;
    session.settings_mut().duration_seconds = 10;
    session.settings_mut().output_channel = OutputChannel::Left;

    let mut engine = MockEngine::succeeding(sweep_response(16));
    session
        .run_capture(&mut engine, "native_input_USB_Mic", &BoxcarSmoother)
        .unwrap();

    assert_eq!(engine.configured_duration, 10);
    assert_eq!(engine.configured_signal, Some(SignalType::Pink));
    assert_eq!(engine.configured_channel, Some(OutputChannel::Left));
    assert_eq!(engine.captured_device.as_deref(), Some("native_input_USB_Mic"));

    assert_eq!(session.state(), SessionState::Captured);
    let current = session.current().unwrap();
    assert_eq!(current.raw.len(), 16);
    assert_eq!(current.output_channel, OutputChannel::Left);
    // The smoothed view differs from raw under a real smoother.
    assert_ne!(current.smoothed.magnitudes, current.raw.magnitudes);
}

#[test]
fn engine_failure_returns_session_to_prior_state() {
    let mut session = CaptureSession::new();
    let mut engine = MockEngine::failing("No microphone found");

    let err = session
        .run_capture(&mut engine, "native_input_Ghost", &PassthroughSmoother)
        .unwrap_err();
    assert!(matches!(
        err,
        Error::CaptureFailed {
            kind: medida_session::CaptureFailureKind::NoDevice,
            ..
        }
    ));
    assert_eq!(session.state(), SessionState::Idle);
    assert!(session.current().is_none());
}

#[test]
fn reprocess_changes_derived_views_without_engine() {
    let mut session = CaptureSession::new();
    let mut engine = MockEngine::succeeding(sweep_response(8));
    session
        .run_capture(&mut engine, "mic", &PassthroughSmoother)
        .unwrap();

    let raw_before = session.current().unwrap().raw.clone();
    let smoothed_before = session.current().unwrap().smoothed.clone();

    session.reprocess(6, &BoxcarSmoother);
    let current = session.current().unwrap();
    assert_eq!(current.raw, raw_before, "raw is immutable");
    assert_ne!(current.smoothed.magnitudes, smoothed_before.magnitudes);
}

// ===========================================================================
// Repository interaction and referential cleanup
// ===========================================================================

#[test]
fn save_then_delete_cleans_every_index_and_selection() {
    let mut session = CaptureSession::new();
    let mut repo = CaptureRepository::new();

    let id = capture_and_save(&mut session, &mut repo, OutputChannel::Left);
    session.toggle_selection(&id, true);
    assert!(session.selection().contains(&id));

    assert!(session.delete_capture(&mut repo, &id));
    assert!(repo.get(&id).is_none());
    assert!(repo.get_all().is_empty());
    assert!(!repo.by_channel().contains_key(&OutputChannel::Left));
    assert!(
        !session.selection().contains(&id),
        "no dangling selection reference survives a delete"
    );
}

#[test]
fn bulk_delete_is_per_id_independent() {
    let mut session = CaptureSession::new();
    let mut repo = CaptureRepository::new();

    let first = capture_and_save(&mut session, &mut repo, OutputChannel::Left);
    let second = capture_and_save(&mut session, &mut repo, OutputChannel::Right);
    session.toggle_selection(&first, true);
    session.toggle_selection(&second, true);

    let ids = vec![
        first.clone(),
        "cap-does-not-exist".to_string(),
        second.clone(),
    ];
    let outcomes = session.delete_captures(&mut repo, &ids);

    assert_eq!(outcomes[0], (first, true));
    assert_eq!(outcomes[1], ("cap-does-not-exist".to_string(), false));
    assert_eq!(outcomes[2], (second, true));
    assert!(repo.is_empty());
    assert!(session.selection().is_empty());
}

// ===========================================================================
// Display resolution
// ===========================================================================

#[test]
fn current_mode_shows_session_data() {
    let mut session = CaptureSession::new();
    let repo = CaptureRepository::new();

    // No data yet: empty set, renderer shows its placeholder.
    let curves = resolve_display(&DisplayMode::Current, &session, &repo).unwrap();
    assert!(curves.is_empty());

    session.settings_mut().output_channel = OutputChannel::Both;
    let mut engine = MockEngine::succeeding(sweep_response(8));
    session
        .run_capture(&mut engine, "mic", &PassthroughSmoother)
        .unwrap();

    let curves = resolve_display(&DisplayMode::Current, &session, &repo).unwrap();
    assert_eq!(curves.len(), 1);
    assert_eq!(curves[0].label, "Current (Stereo)");
    assert_eq!(curves[0].raw.len(), 8);
}

#[test]
fn channel_modes_resolve_only_for_stereo_captures() {
    let mut session = CaptureSession::new();
    let repo = CaptureRepository::new();

    // Mono capture: no channel data, channel views resolve to "no data".
    let mut engine = MockEngine::succeeding(sweep_response(4));
    session
        .run_capture(&mut engine, "mic", &PassthroughSmoother)
        .unwrap();
    assert!(
        resolve_display(&DisplayMode::Left, &session, &repo)
            .unwrap()
            .is_empty()
    );

    // Stereo capture: left/right/average all resolve.
    let mut response = sweep_response(4);
    response.channels = Some(MeasuredChannels {
        left: MeasuredChannel {
            magnitudes: vec![1.0; 4],
            phases: vec![0.0; 4],
        },
        right: MeasuredChannel {
            magnitudes: vec![-1.0; 4],
            phases: vec![0.0; 4],
        },
    });
    let mut engine = MockEngine::succeeding(response);
    session
        .run_capture(&mut engine, "mic", &PassthroughSmoother)
        .unwrap();

    let left = resolve_display(&DisplayMode::Left, &session, &repo).unwrap();
    assert_eq!(left.len(), 1);
    assert_eq!(left[0].raw.magnitudes, vec![1.0; 4]);

    let average = resolve_display(&DisplayMode::Average, &session, &repo).unwrap();
    assert_eq!(average.len(), 1);

    let all = resolve_display(&DisplayMode::All, &session, &repo).unwrap();
    assert_eq!(all.len(), 4, "combined plus three channel curves");
}

#[test]
fn lr_sum_requires_both_channels() {
    let mut session = CaptureSession::new();
    let mut repo = CaptureRepository::new();

    // Only a left capture exists.
    capture_and_save(&mut session, &mut repo, OutputChannel::Left);
    let err = resolve_display(&DisplayMode::LrSum, &session, &repo).unwrap_err();
    assert!(matches!(err, Error::InsufficientData(_)));

    // With a right capture the complex average resolves.
    capture_and_save(&mut session, &mut repo, OutputChannel::Right);
    let curves = resolve_display(&DisplayMode::LrSum, &session, &repo).unwrap();
    assert_eq!(curves.len(), 1);
    assert_eq!(curves[0].label, "L+R Average");
    assert!(curves[0].raw.has_phase());
}

#[test]
fn lr_sum_uses_most_recent_capture_per_channel() {
    let mut session = CaptureSession::new();
    let mut repo = CaptureRepository::new();

    capture_and_save(&mut session, &mut repo, OutputChannel::Left);
    let newer_left = capture_and_save(&mut session, &mut repo, OutputChannel::Left);
    capture_and_save(&mut session, &mut repo, OutputChannel::Right);

    assert_eq!(
        repo.latest_for_channel(OutputChannel::Left).unwrap().id,
        newer_left
    );
    assert!(repo.has_left_and_right());
    assert!(resolve_display(&DisplayMode::LrSum, &session, &repo).is_ok());
}

#[test]
fn combined_all_prefers_selection_else_all() {
    let mut session = CaptureSession::new();
    let mut repo = CaptureRepository::new();

    let first = capture_and_save(&mut session, &mut repo, OutputChannel::Left);
    capture_and_save(&mut session, &mut repo, OutputChannel::Right);
    capture_and_save(&mut session, &mut repo, OutputChannel::Both);

    // Empty selection: every stored capture overlays.
    let curves = resolve_display(&DisplayMode::CombinedAll, &session, &repo).unwrap();
    assert_eq!(curves.len(), 3);

    // Non-empty selection: only the selected ids, deleted ones skipped.
    session.toggle_selection(&first, true);
    session.toggle_selection("cap-gone", true);
    let curves = resolve_display(&DisplayMode::CombinedAll, &session, &repo).unwrap();
    assert_eq!(curves.len(), 1);
}

#[test]
fn single_capture_mode_and_unknown_id() {
    let mut session = CaptureSession::new();
    let mut repo = CaptureRepository::new();
    let id = capture_and_save(&mut session, &mut repo, OutputChannel::Default);

    let mode = DisplayMode::parse(&format!("capture_{id}")).unwrap();
    let curves = resolve_display(&mode, &session, &repo).unwrap();
    assert_eq!(curves.len(), 1);
    assert_eq!(curves[0].label, repo.get(&id).unwrap().name);

    let err =
        resolve_display(&DisplayMode::Capture("cap-404".to_string()), &session, &repo).unwrap_err();
    assert!(matches!(err, Error::UnknownCapture(_)));
}

// ===========================================================================
// Persistence fidelity
// ===========================================================================

#[test]
fn saved_capture_roundtrips_through_json_and_csv() {
    let mut session = CaptureSession::new();
    let mut repo = CaptureRepository::new();
    let id = capture_and_save(&mut session, &mut repo, OutputChannel::Left);
    let capture = repo.get(&id).unwrap();

    let json = serde_json::to_string(capture).unwrap();
    let from_json: medida_session::Capture = serde_json::from_str(&json).unwrap();
    assert_eq!(&from_json, capture);

    let mut csv = Vec::new();
    medida_session::write_csv(capture, &mut csv).unwrap();
    let from_csv = medida_session::read_csv(csv.as_slice()).unwrap();
    assert_eq!(&from_csv, capture);
}

#[test]
fn calibration_lives_on_the_session() {
    let mut session = CaptureSession::new();
    session
        .calibration_mut()
        .load_from_text("100,1.5\n1000,-0.5\n")
        .unwrap();

    assert!(session.calibration().is_active());
    let revision = session.calibration().revision();

    session.calibration_mut().clear();
    assert!(!session.calibration().is_active());
    assert!(session.calibration().revision() > revision);
}
