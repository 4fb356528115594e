//! Medida Session - capture lifecycle, repository, and display resolution
//!
//! This crate owns the measurement workflow around a capture:
//!
//! - [`CaptureSession`] - the in-memory current capture, its re-derivable
//!   smoothed views, the active calibration, and the comparison selection
//! - [`CaptureRepository`] - persisted captures, most-recent-first, with a
//!   by-output-channel grouping
//! - [`DisplayMode`] / [`resolve_display`] - mapping a requested view to the
//!   concrete curve set it shows
//! - [`write_csv`] / [`read_csv`] - capture export with exact round-trip
//!
//! The heavy lifting the session does **not** implement is consumed through
//! traits: a [`CaptureEngine`] plays the stimulus and records the response,
//! a [`Smoother`] provides the fractional-octave smoothing math, and a
//! [`CaptureStore`] persists captures ([`CaptureRepository`] is the default
//! in-memory implementation).
//!
//! ## Workflow
//!
//! ```rust,ignore
//! use medida_session::{CaptureRepository, CaptureSession, DisplayMode, resolve_display};
//!
//! let mut session = CaptureSession::new();
//! let mut repo = CaptureRepository::new();
//!
//! session.run_capture(&mut engine, "native_input_USB_Mic", &smoother)?;
//! let id = session.save_capture(&mut repo)?;
//!
//! // Changing a display parameter never re-measures:
//! session.reprocess(6, &smoother);
//! let curves = resolve_display(&DisplayMode::Current, &session, &repo)?;
//! ```

pub mod capture;
pub mod display;
pub mod engine;
pub mod export;
pub mod repository;
pub mod session;
pub mod smoothing;

pub use capture::{
    Capture, CaptureId, ChannelCurves, ChannelData, NewCapture, OutputChannel, SignalType,
};
pub use display::{DisplayCurve, DisplayMode, resolve_display};
pub use engine::{
    CaptureEngine, CaptureFailureKind, MeasuredChannel, MeasuredChannels, MeasuredResponse,
};
pub use export::{export_csv_file, import_csv_file, read_csv, write_csv};
pub use repository::{CaptureRepository, CaptureStore};
pub use session::{CaptureSession, CaptureSettings, CurrentCapture, SessionState};
pub use smoothing::{PassthroughSmoother, Smoother};

/// Error types for session and repository operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The engine reported a failure or produced an empty result.
    #[error("capture failed ({kind}): {message}")]
    CaptureFailed {
        /// Actionable failure category.
        kind: CaptureFailureKind,
        /// The engine's message, verbatim.
        message: String,
    },

    /// A measurement was started while another is in progress.
    #[error("a capture is already in progress")]
    CaptureInProgress,

    /// A completion or save was requested without a capture in progress.
    #[error("no capture in progress")]
    NotCapturing,

    /// The session holds no capture data for the requested operation.
    #[error("no capture data in session")]
    NoCaptureData,

    /// A derived view requires captures that do not exist.
    #[error("insufficient data: {0}")]
    InsufficientData(String),

    /// Lookup of an unknown capture id.
    #[error("unknown capture: {0}")]
    UnknownCapture(String),

    /// Invalid response data propagated from the core model.
    #[error(transparent)]
    Response(#[from] medida_core::Error),

    /// Malformed capture export data.
    #[error("invalid capture export: {0}")]
    Export(String),

    /// I/O failure while exporting or importing.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type for session operations.
pub type Result<T> = std::result::Result<T, Error>;
