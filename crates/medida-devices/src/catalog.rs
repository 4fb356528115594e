//! Unified audio device catalog.
//!
//! Merges the native and browser enumeration sources into one addressable
//! device list. The native backend is authoritative: when both sources
//! report a device with the same identity, the native entry is kept and the
//! browser entry is attached as supplementary metadata rather than
//! duplicated.

use crate::bridge::{
    BrowserBackend, BrowserDevice, DeviceConfig, DeviceConfigRequest, DeviceKind, DeviceOrigin,
    IdentityResolver, NameMatch, NativeBridge, NativeDevice, ProbeInfo,
};
use crate::{Error, Result};

/// Sample rate assumed when neither the device nor the caller supplies one.
const DEFAULT_SAMPLE_RATE: u32 = 48000;

/// Fallback capabilities when probing a browser device fails.
const PROBE_FALLBACK: ProbeInfo = ProbeInfo {
    channels: 2,
    sample_rate: DEFAULT_SAMPLE_RATE,
};

/// One logical audio device merged from up to two enumeration sources.
#[derive(Debug, Clone)]
pub struct UnifiedDevice {
    /// Opaque catalog id, stable within one enumeration pass.
    pub id: String,
    /// Human-readable device name.
    pub name: String,
    /// Direction of the device.
    pub kind: DeviceKind,
    /// Whether the source marks this device as the system default.
    pub is_default: bool,
    /// Maximum channel count the device offers, at least 1.
    pub channel_count: u16,
    /// Supported sample rates in Hz, ascending and deduplicated.
    pub sample_rates: Vec<u32>,
    /// The device's preferred sample rate, if known.
    pub default_sample_rate: Option<u32>,
    /// Supported sample format names, in reported order.
    pub formats: Vec<String>,
    /// Which source produced this entry.
    pub origin: DeviceOrigin,
    /// Browser-side id attached when a browser report merged into this
    /// native entry; used by capture paths that address the browser layer.
    pub browser_id: Option<String>,
}

/// Unified devices grouped by direction, in enumeration order.
#[derive(Debug, Clone, Default)]
pub struct DeviceMap {
    /// Capture devices.
    pub input: Vec<UnifiedDevice>,
    /// Playback devices.
    pub output: Vec<UnifiedDevice>,
}

/// Criteria for scoring-based device selection.
#[derive(Debug, Clone, Copy, Default)]
pub struct MatchCriteria {
    /// Minimum channel count worth a scoring bonus.
    pub preferred_channels: Option<u16>,
    /// Sample rate worth a scoring bonus when natively supported.
    pub preferred_sample_rate: Option<u32>,
    /// Short-circuit to the system default device when one exists.
    pub prefer_default: bool,
}

/// Entry of the UI-facing device list projection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceListing {
    /// Catalog id to select the device with.
    pub value: String,
    /// Display name.
    pub label: String,
    /// Short capability summary ("2ch 48kHz (Default)").
    pub info: String,
}

/// A selected device together with its fully resolved configuration.
#[derive(Debug, Clone)]
pub struct SelectedDevice {
    /// The chosen device.
    pub device: UnifiedDevice,
    /// The configuration the device was (or will be) set up with.
    pub config: DeviceConfig,
}

/// Detailed device properties, refreshed from the native bridge when the
/// device is native-origin.
#[derive(Debug, Clone)]
pub struct DeviceProperties {
    /// Device name.
    pub name: String,
    /// Direction of the device.
    pub kind: DeviceKind,
    /// Maximum channel count.
    pub channel_count: u16,
    /// Supported sample rates in Hz.
    pub sample_rates: Vec<u32>,
    /// Supported sample format names.
    pub formats: Vec<String>,
    /// Which source the properties come from.
    pub origin: DeviceOrigin,
}

/// Unified device catalog over a native bridge and a browser backend.
pub struct DeviceCatalog {
    native: Box<dyn NativeBridge>,
    browser: Box<dyn BrowserBackend>,
    identity: Box<dyn IdentityResolver>,
    devices: Vec<UnifiedDevice>,
    prefer_native: bool,
}

impl DeviceCatalog {
    /// Create a catalog over the given sources with name-based identity and
    /// native preference enabled.
    pub fn new(native: Box<dyn NativeBridge>, browser: Box<dyn BrowserBackend>) -> Self {
        Self {
            native,
            browser,
            identity: Box::new(NameMatch),
            devices: Vec::new(),
            prefer_native: true,
        }
    }

    /// Substitute the device-identity strategy (default: [`NameMatch`]).
    pub fn with_identity_resolver(mut self, identity: Box<dyn IdentityResolver>) -> Self {
        self.identity = identity;
        self
    }

    /// Disable native preference: browser reports matching a native entry
    /// become separate entries instead of supplementary metadata.
    pub fn with_native_preference(mut self, prefer_native: bool) -> Self {
        self.prefer_native = prefer_native;
        self
    }

    /// Enumerate both sources and rebuild the unified list.
    ///
    /// Neither source is fatal: a failing backend is logged and skipped,
    /// and the result carries whatever the other source produced. Only the
    /// total absence of devices of a kind yields an empty list.
    pub fn enumerate(&mut self) -> DeviceMap {
        self.devices.clear();

        match self.native.list_devices() {
            Ok(map) => {
                tracing::debug!(
                    backend = self.native.name(),
                    inputs = map.input.len(),
                    outputs = map.output.len(),
                    "native devices enumerated"
                );
                for device in &map.input {
                    self.devices.push(unify_native(device, DeviceKind::Input));
                }
                for device in &map.output {
                    self.devices.push(unify_native(device, DeviceKind::Output));
                }
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    "native backend unavailable, continuing with browser devices only"
                );
            }
        }

        match self.browser.enumerate() {
            Ok(devices) => {
                for device in devices {
                    self.absorb_browser_device(device);
                }
            }
            Err(e) => tracing::warn!(error = %e, "browser enumeration failed"),
        }

        tracing::debug!(total = self.devices.len(), "unified catalog rebuilt");
        self.snapshot()
    }

    /// Merge one browser report into the catalog: attach to an existing
    /// entry when identity matches, otherwise create a new unified entry.
    fn absorb_browser_device(&mut self, device: BrowserDevice) {
        if self.prefer_native {
            let identity = &*self.identity;
            if let Some(existing) = self
                .devices
                .iter_mut()
                .find(|d| identity.same_device(&device, &d.name, d.kind))
            {
                // Same physical device seen from both sources: keep the
                // native entry, remember the browser id for capture-time use.
                existing.browser_id = Some(device.id);
                return;
            }
        }

        // Probe inputs once for real capabilities; outputs cannot be probed
        // through a capture stream and take the fallback directly.
        let probed = if device.kind == DeviceKind::Input {
            match self.browser.probe(&device.id) {
                Ok(info) => info,
                Err(e) => {
                    tracing::warn!(
                        device = %device.label,
                        error = %e,
                        "probe failed, using fallback capabilities"
                    );
                    PROBE_FALLBACK
                }
            }
        } else {
            PROBE_FALLBACK
        };

        self.devices.push(unify_browser(device, probed));
    }

    /// All unified devices in enumeration order.
    pub fn devices(&self) -> &[UnifiedDevice] {
        &self.devices
    }

    /// Look up a device by catalog id.
    pub fn get(&self, id: &str) -> Option<&UnifiedDevice> {
        self.devices.iter().find(|d| d.id == id)
    }

    /// Select a device and resolve its configuration.
    ///
    /// Defaults: sample rate from the device (or 48000), channels
    /// `min(requested or 2, device channel count)`, format from the device
    /// (or "f32"). Native devices push the configuration through the
    /// bridge, surfacing backend errors as-is; browser devices accept the
    /// configuration without a round-trip and are configured on first use.
    pub fn select_device(&self, id: &str, request: &DeviceConfigRequest) -> Result<SelectedDevice> {
        let device = self
            .get(id)
            .ok_or_else(|| Error::DeviceNotFound(id.to_string()))?;

        let config = DeviceConfig {
            sample_rate: request
                .sample_rate
                .or(device.default_sample_rate)
                .unwrap_or(DEFAULT_SAMPLE_RATE),
            channels: request.channels.unwrap_or(2).min(device.channel_count),
            buffer_size: request.buffer_size,
            sample_format: request
                .sample_format
                .clone()
                .or_else(|| device.formats.first().cloned())
                .unwrap_or_else(|| "f32".to_string()),
        };

        if device.origin == DeviceOrigin::Native {
            self.native
                .set_device(&device.name, device.kind == DeviceKind::Input, &config)?;
        }

        tracing::info!(
            device = %device.name,
            sample_rate = config.sample_rate,
            channels = config.channels,
            "device selected"
        );

        Ok(SelectedDevice {
            device: device.clone(),
            config,
        })
    }

    /// Find the best device of a kind for the given criteria.
    ///
    /// Deterministic: with `prefer_default` a default device of the kind
    /// wins immediately; otherwise every candidate is scored and the
    /// highest score wins, ties keeping the first-enumerated device.
    pub fn find_best(&self, kind: DeviceKind, criteria: &MatchCriteria) -> Option<&UnifiedDevice> {
        let candidates: Vec<&UnifiedDevice> =
            self.devices.iter().filter(|d| d.kind == kind).collect();
        let (&first, rest) = candidates.split_first()?;

        if criteria.prefer_default
            && let Some(&default) = candidates.iter().find(|d| d.is_default)
        {
            return Some(default);
        }

        let mut best = first;
        let mut best_score = score(best, criteria);
        for &device in rest {
            let candidate_score = score(device, criteria);
            // Strict comparison keeps the first-enumerated device on ties.
            if candidate_score > best_score {
                best = device;
                best_score = candidate_score;
            }
        }
        Some(best)
    }

    /// Project devices of a kind into UI dropdown entries. Pure; no side
    /// effects on the catalog or the backends.
    pub fn list_for_display(&self, kind: DeviceKind) -> Vec<DeviceListing> {
        self.devices
            .iter()
            .filter(|d| d.kind == kind)
            .map(|device| {
                let rate = device
                    .default_sample_rate
                    .map(|r| format!(" {}kHz", (r + 500) / 1000))
                    .unwrap_or_default();
                let default_tag = if device.is_default { " (Default)" } else { "" };
                DeviceListing {
                    value: device.id.clone(),
                    label: device.name.clone(),
                    info: format!("{}ch{}{}", device.channel_count, rate, default_tag),
                }
            })
            .collect()
    }

    /// Detailed properties for a cataloged device.
    ///
    /// Native devices are re-queried through the bridge; browser devices
    /// answer from catalog data.
    pub fn device_properties(&self, id: &str) -> Result<DeviceProperties> {
        let device = self
            .get(id)
            .ok_or_else(|| Error::DeviceNotFound(id.to_string()))?;

        match device.origin {
            DeviceOrigin::Native => {
                let native = self
                    .native
                    .device_properties(&device.name, device.kind == DeviceKind::Input)?;
                let unified = unify_native(&native, device.kind);
                Ok(DeviceProperties {
                    name: unified.name,
                    kind: device.kind,
                    channel_count: unified.channel_count,
                    sample_rates: unified.sample_rates,
                    formats: unified.formats,
                    origin: DeviceOrigin::Native,
                })
            }
            DeviceOrigin::Browser => Ok(DeviceProperties {
                name: device.name.clone(),
                kind: device.kind,
                channel_count: device.channel_count,
                sample_rates: device.sample_rates.clone(),
                formats: device.formats.clone(),
                origin: DeviceOrigin::Browser,
            }),
        }
    }

    /// Clone the current device list grouped by direction.
    fn snapshot(&self) -> DeviceMap {
        let mut map = DeviceMap::default();
        for device in &self.devices {
            match device.kind {
                DeviceKind::Input => map.input.push(device.clone()),
                DeviceKind::Output => map.output.push(device.clone()),
            }
        }
        map
    }
}

/// Score one candidate against the selection criteria.
fn score(device: &UnifiedDevice, criteria: &MatchCriteria) -> u32 {
    let mut score = 0u32;

    if device.origin == DeviceOrigin::Native {
        score += 10;
    }
    if let Some(channels) = criteria.preferred_channels
        && device.channel_count >= channels
    {
        score += 5;
    }
    if let Some(rate) = criteria.preferred_sample_rate
        && device.sample_rates.contains(&rate)
    {
        score += 5;
    }

    // Richer devices win between otherwise equal candidates.
    score + device.sample_rates.len() as u32 + u32::from(device.channel_count)
}

/// Convert a native device report into a unified entry.
fn unify_native(device: &NativeDevice, kind: DeviceKind) -> UnifiedDevice {
    let mut sample_rates: Vec<u32> = device
        .supported_configs
        .iter()
        .map(|c| c.sample_rate)
        .chain(device.default_config.as_ref().map(|c| c.sample_rate))
        .collect();
    sample_rates.sort_unstable();
    sample_rates.dedup();

    let channel_count = device
        .supported_configs
        .iter()
        .map(|c| c.channels)
        .chain(device.default_config.as_ref().map(|c| c.channels))
        .max()
        .unwrap_or(2)
        .max(1);

    let mut formats: Vec<String> = Vec::new();
    for config in &device.supported_configs {
        if !formats.contains(&config.sample_format) {
            formats.push(config.sample_format.clone());
        }
    }

    let slug = device.name.split_whitespace().collect::<Vec<_>>().join("_");

    UnifiedDevice {
        id: format!("native_{}_{}", kind.as_str(), slug),
        name: device.name.clone(),
        kind,
        is_default: device.is_default,
        channel_count,
        sample_rates,
        default_sample_rate: device.default_config.as_ref().map(|c| c.sample_rate),
        formats,
        origin: DeviceOrigin::Native,
        browser_id: None,
    }
}

/// Convert a browser device report plus probed capabilities into a unified
/// entry.
fn unify_browser(device: BrowserDevice, probed: ProbeInfo) -> UnifiedDevice {
    let name = if device.label.is_empty() {
        // Unlabeled devices (permissions not yet granted) still need a
        // recognizable entry.
        let prefix: String = device.id.chars().take(8).collect();
        match device.kind {
            DeviceKind::Input => format!("Microphone {prefix}"),
            DeviceKind::Output => format!("Speaker {prefix}"),
        }
    } else {
        device.label.clone()
    };

    UnifiedDevice {
        id: device.id,
        name,
        kind: device.kind,
        is_default: device.is_default,
        channel_count: probed.channels.max(1),
        sample_rates: vec![probed.sample_rate],
        default_sample_rate: Some(probed.sample_rate),
        formats: vec!["f32".to_string()],
        origin: DeviceOrigin::Browser,
        browser_id: None,
    }
}
