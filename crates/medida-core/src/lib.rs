//! Medida Core - frequency-response data model and response math
//!
//! This crate provides the data types shared by the measurement pipeline:
//!
//! - [`FrequencyResponse`] - validated frequency/magnitude/phase container
//! - [`average_complex`] - complex-domain averaging of two responses
//! - [`CalibrationStore`] - parsing and holding a calibration correction curve
//!
//! ## Complex-Domain Averaging
//!
//! Averaging two measured channels is only physically meaningful on complex
//! values. An arithmetic mean of dB magnitudes cannot reproduce destructive
//! interference between channels; [`average_complex`] converts each bin to a
//! complex number, averages, and converts back, so opposite-phase bins
//! cancel into a notch the way the combined acoustic signal would.
//!
//! ## Example
//!
//! ```rust,ignore
//! use medida_core::{FrequencyResponse, average_complex, parse_calibration};
//!
//! let left = FrequencyResponse::new(freqs.clone(), left_db, left_deg)?;
//! let right = FrequencyResponse::new(freqs, right_db, right_deg)?;
//! let combined = average_complex(&left, &right)?;
//!
//! let correction = parse_calibration(&std::fs::read_to_string("mic.cal")?)?;
//! ```

pub mod average;
pub mod calibration;
pub mod response;

pub use average::average_complex;
pub use calibration::{CalibrationStore, parse_calibration};
pub use response::FrequencyResponse;

/// Error types for response-model operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Two responses cannot be combined (grid mismatch or missing phase).
    #[error("incompatible responses: {0}")]
    IncompatibleResponses(String),

    /// A calibration file contained no usable data rows.
    #[error("calibration file contains no valid data points")]
    EmptyCalibration,

    /// Parallel arrays disagree in length.
    #[error("length mismatch: expected {expected} values, got {actual}")]
    LengthMismatch {
        /// Expected number of values (the frequency grid length).
        expected: usize,
        /// Number of values actually supplied.
        actual: usize,
    },

    /// Frequency bins are not strictly increasing.
    #[error("frequencies must be strictly increasing (violation at index {index})")]
    NonMonotonicFrequencies {
        /// Index of the first out-of-order bin.
        index: usize,
    },
}

/// Convenience result type for response-model operations.
pub type Result<T> = std::result::Result<T, Error>;
