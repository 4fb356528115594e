//! Integration tests for medida-core.
//!
//! Exercises the public response/averaging/calibration API end to end with
//! synthetic measurement data.

use medida_core::{CalibrationStore, FrequencyResponse, average_complex, parse_calibration};

/// Logarithmically spaced frequency grid, the shape real measurements use.
fn log_grid(points: usize) -> Vec<f32> {
    let start = 20.0f32.ln();
    let end = 20000.0f32.ln();
    (0..points)
        .map(|i| (start + (end - start) * i as f32 / (points - 1) as f32).exp())
        .collect()
}

#[test]
fn stereo_notch_survives_complex_average_only() {
    // A left and a right channel, magnitude-identical, but with the right
    // channel phase-inverted over the top half of the band. The combined
    // acoustic response collapses there; an arithmetic magnitude mean would
    // show a flat 0 dB line and hide the problem entirely.
    let frequencies = log_grid(64);
    let magnitudes = vec![0.0f32; 64];
    let left_phase = vec![0.0f32; 64];
    let right_phase: Vec<f32> = (0..64).map(|i| if i < 32 { 0.0 } else { 180.0 }).collect();

    let left =
        FrequencyResponse::new(frequencies.clone(), magnitudes.clone(), left_phase).unwrap();
    let right = FrequencyResponse::new(frequencies, magnitudes, right_phase).unwrap();

    let combined = average_complex(&left, &right).unwrap();

    for i in 0..32 {
        assert!(
            combined.magnitudes[i].abs() < 0.01,
            "in-phase bin {} should stay at 0 dB, got {}",
            i,
            combined.magnitudes[i]
        );
    }
    for i in 32..64 {
        assert!(
            combined.magnitudes[i] < -100.0,
            "out-of-phase bin {} should cancel, got {}",
            i,
            combined.magnitudes[i]
        );
    }
}

#[test]
fn averaging_preserves_the_frequency_grid() {
    let frequencies = log_grid(16);
    let a = FrequencyResponse::new(frequencies.clone(), vec![1.0; 16], vec![10.0; 16]).unwrap();
    let b = FrequencyResponse::new(frequencies.clone(), vec![-1.0; 16], vec![-10.0; 16]).unwrap();

    let avg = average_complex(&a, &b).unwrap();
    assert_eq!(avg.frequencies, frequencies);
    assert_eq!(avg.len(), 16);
    assert!(avg.has_phase());
}

#[test]
fn calibration_file_lifecycle() {
    let text = "\
# Measurement microphone correction
Frequency (Hz)\tGain (dB)
20\t-2.1
1000\t0.0
20000\t4.75
";
    let mut store = CalibrationStore::new();
    store.load_from_text(text).unwrap();

    let curve = store.active().unwrap();
    assert_eq!(curve.frequencies, vec![20.0, 1000.0, 20000.0]);
    assert_eq!(curve.magnitudes, vec![-2.1, 0.0, 4.75]);

    let first_revision = store.revision();
    store.clear();
    assert!(store.active().is_none());
    assert!(store.revision() > first_revision);
}

#[test]
fn parse_calibration_spec_example() {
    let curve = parse_calibration("# comment\nFrequency,Magnitude\n100,0.5\n200,-0.3\nabc,xyz\n")
        .unwrap();
    assert_eq!(curve.len(), 2);
    assert_eq!(
        (curve.frequencies[0], curve.magnitudes[0]),
        (100.0, 0.5)
    );
    assert_eq!(
        (curve.frequencies[1], curve.magnitudes[1]),
        (200.0, -0.3)
    );
}
