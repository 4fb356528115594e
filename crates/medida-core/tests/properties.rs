//! Property-based tests for the complex-averaging math.
//!
//! Uses proptest to verify the averaging identities over randomized
//! responses instead of a handful of hand-picked bins.

use proptest::prelude::*;

use medida_core::{FrequencyResponse, average_complex};

/// Build a valid response from per-bin (magnitude, phase) pairs on a fixed
/// ascending grid.
fn response_from_bins(bins: &[(f32, f32)]) -> FrequencyResponse {
    let frequencies = (0..bins.len()).map(|i| 50.0 * (i + 1) as f32).collect();
    let magnitudes = bins.iter().map(|&(m, _)| m).collect();
    let phases = bins.iter().map(|&(_, p)| p).collect();
    FrequencyResponse::new(frequencies, magnitudes, phases).unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// Averaging a response with itself returns it unchanged, for any
    /// magnitude in a realistic measurement range and any principal-value
    /// phase.
    #[test]
    fn self_average_is_identity(
        bins in prop::collection::vec((-60.0f32..20.0, -179.0f32..179.0), 1..48),
    ) {
        let a = response_from_bins(&bins);
        let avg = average_complex(&a, &a).unwrap();

        for i in 0..a.len() {
            prop_assert!(
                (avg.magnitudes[i] - a.magnitudes[i]).abs() < 1e-2,
                "magnitude bin {} drifted: {} vs {}",
                i, avg.magnitudes[i], a.magnitudes[i]
            );
            prop_assert!(
                (avg.phases[i] - a.phases[i]).abs() < 1e-2,
                "phase bin {} drifted: {} vs {}",
                i, avg.phases[i], a.phases[i]
            );
        }
    }

    /// The complex average is commutative.
    #[test]
    fn average_is_commutative(
        bins_a in prop::collection::vec((-60.0f32..20.0, -179.0f32..179.0), 8),
        bins_b in prop::collection::vec((-60.0f32..20.0, -179.0f32..179.0), 8),
    ) {
        let a = response_from_bins(&bins_a);
        let b = response_from_bins(&bins_b);

        let ab = average_complex(&a, &b).unwrap();
        let ba = average_complex(&b, &a).unwrap();

        for i in 0..ab.len() {
            prop_assert!((ab.magnitudes[i] - ba.magnitudes[i]).abs() < 1e-3);
            prop_assert!((ab.phases[i] - ba.phases[i]).abs() < 1e-3);
        }
    }

    /// The averaged magnitude never exceeds the louder input by more than
    /// rounding error: complex averaging can cancel, never amplify.
    #[test]
    fn average_never_amplifies(
        bins_a in prop::collection::vec((-60.0f32..20.0, -179.0f32..179.0), 8),
        bins_b in prop::collection::vec((-60.0f32..20.0, -179.0f32..179.0), 8),
    ) {
        let a = response_from_bins(&bins_a);
        let b = response_from_bins(&bins_b);

        let avg = average_complex(&a, &b).unwrap();
        for i in 0..avg.len() {
            let louder = a.magnitudes[i].max(b.magnitudes[i]);
            prop_assert!(
                avg.magnitudes[i] <= louder + 1e-3,
                "bin {}: average {} louder than inputs ({}, {})",
                i, avg.magnitudes[i], a.magnitudes[i], b.magnitudes[i]
            );
        }
    }
}
