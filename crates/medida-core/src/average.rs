//! Complex-domain averaging of frequency responses.

use rustfft::num_complex::Complex;

use crate::response::FrequencyResponse;
use crate::{Error, Result};

/// Floor for the averaged linear magnitude before conversion back to dB.
/// Full cancellation maps to about -240 dB instead of negative infinity.
const MAGNITUDE_FLOOR: f32 = 1e-12;

/// Average two frequency responses in the complex domain.
///
/// Each bin is converted from `(magnitude_dB, phase_deg)` to a complex
/// value, the two values are averaged, and the result is converted back.
/// Unlike an arithmetic mean of dB magnitudes this reproduces interference:
/// bins of equal magnitude but opposite phase cancel into a deep notch.
///
/// Both responses must share the same frequency grid and carry phase data,
/// otherwise [`Error::IncompatibleResponses`] is returned.
pub fn average_complex(a: &FrequencyResponse, b: &FrequencyResponse) -> Result<FrequencyResponse> {
    if !a.has_phase() || !b.has_phase() {
        return Err(Error::IncompatibleResponses(
            "complex averaging requires phase data on both responses".to_string(),
        ));
    }
    if !a.grid_matches(b) {
        return Err(Error::IncompatibleResponses(
            "responses use different frequency grids".to_string(),
        ));
    }

    let len = a.len();
    let mut magnitudes = Vec::with_capacity(len);
    let mut phases = Vec::with_capacity(len);

    for i in 0..len {
        let za = to_complex(a.magnitudes[i], a.phases[i]);
        let zb = to_complex(b.magnitudes[i], b.phases[i]);
        let avg = (za + zb) * 0.5;

        magnitudes.push(20.0 * avg.norm().max(MAGNITUDE_FLOOR).log10());
        phases.push(avg.im.atan2(avg.re).to_degrees());
    }

    FrequencyResponse::new(a.frequencies.clone(), magnitudes, phases)
}

/// Convert a `(magnitude_dB, phase_deg)` bin to its complex representation.
fn to_complex(magnitude_db: f32, phase_deg: f32) -> Complex<f32> {
    let amplitude = 10f32.powf(magnitude_db / 20.0);
    let phase = phase_deg.to_radians();
    Complex::new(amplitude * phase.cos(), amplitude * phase.sin())
}
