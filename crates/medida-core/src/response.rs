//! Frequency-response container and grid helpers.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Relative tolerance for comparing frequency grids bin by bin.
const GRID_TOLERANCE: f32 = 1e-6;

/// A measured or derived frequency response.
///
/// Magnitudes are in dB and phases in degrees. Phase is optional: an empty
/// `phases` vector means the response is magnitude-only. When phase is
/// present it carries one entry per frequency bin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrequencyResponse {
    /// Frequency bins in Hz, strictly increasing.
    pub frequencies: Vec<f32>,
    /// Magnitude per bin in dB.
    pub magnitudes: Vec<f32>,
    /// Phase per bin in degrees, or empty when unmeasured.
    #[serde(default)]
    pub phases: Vec<f32>,
}

impl FrequencyResponse {
    /// Create a response, validating the container invariants.
    pub fn new(frequencies: Vec<f32>, magnitudes: Vec<f32>, phases: Vec<f32>) -> Result<Self> {
        if magnitudes.len() != frequencies.len() {
            return Err(Error::LengthMismatch {
                expected: frequencies.len(),
                actual: magnitudes.len(),
            });
        }
        if !phases.is_empty() && phases.len() != frequencies.len() {
            return Err(Error::LengthMismatch {
                expected: frequencies.len(),
                actual: phases.len(),
            });
        }
        if let Some(index) = first_unordered(&frequencies) {
            return Err(Error::NonMonotonicFrequencies { index });
        }
        Ok(Self {
            frequencies,
            magnitudes,
            phases,
        })
    }

    /// Create a response without phase data.
    pub fn magnitude_only(frequencies: Vec<f32>, magnitudes: Vec<f32>) -> Result<Self> {
        Self::new(frequencies, magnitudes, Vec::new())
    }

    /// Number of frequency bins.
    pub fn len(&self) -> usize {
        self.frequencies.len()
    }

    /// Whether the response holds no bins at all.
    pub fn is_empty(&self) -> bool {
        self.frequencies.is_empty()
    }

    /// Whether phase data is present.
    pub fn has_phase(&self) -> bool {
        !self.phases.is_empty()
    }

    /// Compare frequency grids bin by bin within a relative tolerance.
    pub fn grid_matches(&self, other: &Self) -> bool {
        self.frequencies.len() == other.frequencies.len()
            && self
                .frequencies
                .iter()
                .zip(other.frequencies.iter())
                .all(|(&a, &b)| (a - b).abs() <= a.abs().max(1.0) * GRID_TOLERANCE)
    }
}

/// Index of the first bin that breaks strict ascending order, if any.
fn first_unordered(frequencies: &[f32]) -> Option<usize> {
    frequencies
        .windows(2)
        .position(|pair| pair[1] <= pair[0])
        .map(|i| i + 1)
}
