//! Unified audio device catalog for medida.
//!
//! Audio devices reach the application through two independent enumeration
//! sources that overlap but disagree in naming and identity: a native
//! backend (cpal by default) with full capability reports, and a
//! browser-style backend whose devices expose only opaque ids and labels
//! until probed. This crate reconciles them:
//!
//! - [`bridge`] - the narrow [`NativeBridge`] / [`BrowserBackend`] traits and
//!   the [`IdentityResolver`] strategy for cross-source device matching
//! - [`cpal_bridge`] - the default native bridge over cpal
//! - [`catalog`] - the [`DeviceCatalog`]: merge, dedup, scoring-based
//!   best-match selection, and configuration resolution
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use medida_devices::{CpalBridge, DeviceCatalog, DeviceKind, MatchCriteria};
//!
//! let mut catalog = DeviceCatalog::new(Box::new(CpalBridge::new()), Box::new(browser));
//! let devices = catalog.enumerate();
//!
//! let mic = catalog.find_best(DeviceKind::Input, &MatchCriteria {
//!     preferred_channels: Some(2),
//!     preferred_sample_rate: Some(48000),
//!     prefer_default: false,
//! });
//! ```
//!
//! Enumeration never fails outright: each source is tried independently and
//! a failing backend degrades to the other with a logged warning.

pub mod bridge;
pub mod catalog;
pub mod cpal_bridge;

pub use bridge::{
    BrowserBackend, BrowserDevice, DeviceConfig, DeviceConfigRequest, DeviceKind, DeviceOrigin,
    IdentityResolver, NameMatch, NativeBridge, NativeDevice, NativeDeviceMap, ProbeInfo,
    SupportedConfig,
};
pub use catalog::{
    DeviceCatalog, DeviceListing, DeviceMap, DeviceProperties, MatchCriteria, SelectedDevice,
    UnifiedDevice,
};
pub use cpal_bridge::CpalBridge;

/// Error types for device operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A backend failed to enumerate or configure. Non-fatal during
    /// enumeration: the catalog degrades to the other source.
    #[error("audio backend error: {0}")]
    Backend(String),

    /// Lookup by unknown device id or name.
    #[error("device not found: {0}")]
    DeviceNotFound(String),

    /// A capability probe failed; the catalog falls back to defaults.
    #[error("device probe failed: {0}")]
    Probe(String),
}

/// Convenience result type for device operations.
pub type Result<T> = std::result::Result<T, Error>;
