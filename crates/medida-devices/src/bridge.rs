//! Pluggable device-source abstractions.
//!
//! The catalog unifies two independent enumeration sources: the native
//! per-OS backend reached through the narrow [`NativeBridge`] (the default
//! implementation wraps cpal), and a browser-style [`BrowserBackend`] whose
//! devices carry only an opaque id and a label until probed. Both traits
//! are object-safe so sources can be swapped at runtime, including
//! deterministic mock implementations for tests.

use crate::Result;

/// Which direction a device moves audio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceKind {
    /// Capture device (microphone, line-in).
    Input,
    /// Playback device (speakers, headphones).
    Output,
}

impl DeviceKind {
    /// Lowercase label used in catalog ids and log output.
    pub fn as_str(self) -> &'static str {
        match self {
            DeviceKind::Input => "input",
            DeviceKind::Output => "output",
        }
    }
}

/// Which enumeration source produced a unified device entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceOrigin {
    /// Reported by the native backend.
    Native,
    /// Reported by the browser-style backend.
    Browser,
}

/// One supported stream configuration reported by the native backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupportedConfig {
    /// Channel count of this configuration.
    pub channels: u16,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Sample format name ("f32", "i16", ...).
    pub sample_format: String,
}

/// A device as reported by the native backend.
#[derive(Debug, Clone)]
pub struct NativeDevice {
    /// Backend-reported device name.
    pub name: String,
    /// Whether this is the system default for its direction.
    pub is_default: bool,
    /// Every stream configuration the device supports.
    pub supported_configs: Vec<SupportedConfig>,
    /// The backend's preferred configuration, if it reports one.
    pub default_config: Option<SupportedConfig>,
}

/// Native devices grouped by direction.
#[derive(Debug, Clone, Default)]
pub struct NativeDeviceMap {
    /// Capture devices.
    pub input: Vec<NativeDevice>,
    /// Playback devices.
    pub output: Vec<NativeDevice>,
}

/// A device as reported by the browser-style backend.
#[derive(Debug, Clone)]
pub struct BrowserDevice {
    /// Opaque backend-specific id.
    pub id: String,
    /// Human-readable label; may be empty before permissions are granted.
    pub label: String,
    /// Direction of the device.
    pub kind: DeviceKind,
    /// Whether the backend marks this device as the default.
    pub is_default: bool,
}

/// Capabilities measured by probing a browser device.
#[derive(Debug, Clone, Copy)]
pub struct ProbeInfo {
    /// Measured channel count.
    pub channels: u16,
    /// Representative sample rate in Hz.
    pub sample_rate: u32,
}

/// Requested stream configuration for device selection.
///
/// Unset fields are resolved from the device's own defaults.
#[derive(Debug, Clone, Default)]
pub struct DeviceConfigRequest {
    /// Requested sample rate in Hz.
    pub sample_rate: Option<u32>,
    /// Requested channel count.
    pub channels: Option<u16>,
    /// Requested buffer size in frames.
    pub buffer_size: Option<u32>,
    /// Requested sample format name.
    pub sample_format: Option<String>,
}

/// Fully resolved stream configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceConfig {
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Channel count, clamped to what the device offers.
    pub channels: u16,
    /// Buffer size in frames, when the caller requested one.
    pub buffer_size: Option<u32>,
    /// Sample format name.
    pub sample_format: String,
}

/// Narrow bridge to the native per-OS audio backend.
///
/// This is the only surface through which the catalog touches platform
/// audio. The default implementation is [`crate::CpalBridge`]; tests use
/// deterministic mocks.
pub trait NativeBridge {
    /// Backend name for logging ("cpal", "mock", ...).
    fn name(&self) -> &str;

    /// Enumerate native devices of both directions.
    fn list_devices(&self) -> Result<NativeDeviceMap>;

    /// Push a resolved configuration for the named device to the backend.
    fn set_device(&self, name: &str, is_input: bool, config: &DeviceConfig) -> Result<()>;

    /// Detailed properties for one named device.
    fn device_properties(&self, name: &str, is_input: bool) -> Result<NativeDevice>;
}

/// Browser-style enumeration source.
pub trait BrowserBackend {
    /// List devices known to the browser layer.
    fn enumerate(&self) -> Result<Vec<BrowserDevice>>;

    /// Measure a device's channel count and representative sample rate.
    ///
    /// Probing opens a transient input stream. Implementations must release
    /// the stream and close any audio context on every exit path, including
    /// failure.
    fn probe(&self, device_id: &str) -> Result<ProbeInfo>;
}

/// Strategy deciding whether a browser device and a catalog entry describe
/// the same physical device.
///
/// There is no stable cross-backend device id, so the default [`NameMatch`]
/// compares `(label, kind)`. That is a heuristic: two distinct physical
/// devices sharing a label will merge. A stronger strategy (hardware
/// serial, backend hint) can be substituted without touching catalog code.
pub trait IdentityResolver {
    /// Whether `browser` refers to the device already cataloged under
    /// `name`/`kind`.
    fn same_device(&self, browser: &BrowserDevice, name: &str, kind: DeviceKind) -> bool;
}

/// Default label-based identity: equal `(name, kind)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NameMatch;

impl IdentityResolver for NameMatch {
    fn same_device(&self, browser: &BrowserDevice, name: &str, kind: DeviceKind) -> bool {
        browser.kind == kind && browser.label == name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_kind_labels() {
        assert_eq!(DeviceKind::Input.as_str(), "input");
        assert_eq!(DeviceKind::Output.as_str(), "output");
    }

    #[test]
    fn name_match_requires_label_and_kind() {
        let browser = BrowserDevice {
            id: "web-1".to_string(),
            label: "USB Mic".to_string(),
            kind: DeviceKind::Input,
            is_default: false,
        };

        let resolver = NameMatch;
        assert!(resolver.same_device(&browser, "USB Mic", DeviceKind::Input));
        assert!(!resolver.same_device(&browser, "USB Mic", DeviceKind::Output));
        assert!(!resolver.same_device(&browser, "Other Mic", DeviceKind::Input));
    }
}
