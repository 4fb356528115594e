//! cpal-based native bridge implementation.
//!
//! [`CpalBridge`] is the default [`NativeBridge`], wrapping
//! [cpal](https://crates.io/crates/cpal) for cross-platform device access:
//! ALSA (Linux), CoreAudio (macOS), WASAPI (Windows).

use cpal::Host;
use cpal::traits::{DeviceTrait, HostTrait};

use crate::bridge::{DeviceConfig, NativeBridge, NativeDevice, NativeDeviceMap, SupportedConfig};
use crate::{Error, Result};

/// Extract device name via `description()` (cpal 0.17+).
fn device_name(device: &cpal::Device) -> std::result::Result<String, cpal::DeviceNameError> {
    device.description().map(|d| d.name().to_string())
}

/// Native bridge over cpal's default host.
pub struct CpalBridge {
    host: Host,
}

impl CpalBridge {
    /// Create a bridge using the platform's default audio host.
    ///
    /// On Linux this is ALSA, on macOS CoreAudio, on Windows WASAPI.
    pub fn new() -> Self {
        tracing::info!(
            host = cpal::default_host().id().name(),
            "cpal bridge initialized"
        );
        Self {
            host: cpal::default_host(),
        }
    }

    /// Find a cpal device by exact name, falling back to a case-insensitive
    /// partial match.
    fn find_device(&self, name: &str, is_input: bool) -> Result<cpal::Device> {
        let devices: Vec<cpal::Device> = if is_input {
            self.host
                .input_devices()
                .map_err(|e| Error::Backend(e.to_string()))?
                .collect()
        } else {
            self.host
                .output_devices()
                .map_err(|e| Error::Backend(e.to_string()))?
                .collect()
        };

        let search_lower = name.to_lowercase();
        for device in devices {
            if let Ok(dev_name) = device_name(&device)
                && (dev_name == name || dev_name.to_lowercase().contains(&search_lower))
            {
                return Ok(device);
            }
        }
        Err(Error::DeviceNotFound(format!(
            "no {} device matching '{}'",
            if is_input { "input" } else { "output" },
            name
        )))
    }
}

impl Default for CpalBridge {
    fn default() -> Self {
        Self::new()
    }
}

impl NativeBridge for CpalBridge {
    fn name(&self) -> &'static str {
        "cpal"
    }

    fn list_devices(&self) -> Result<NativeDeviceMap> {
        let mut map = NativeDeviceMap::default();

        let default_input = self
            .host
            .default_input_device()
            .and_then(|d| device_name(&d).ok());
        let default_output = self
            .host
            .default_output_device()
            .and_then(|d| device_name(&d).ok());

        if let Ok(inputs) = self.host.input_devices() {
            for device in inputs {
                if let Some(native) = describe_device(&device, true, default_input.as_deref()) {
                    map.input.push(native);
                }
            }
        }

        if let Ok(outputs) = self.host.output_devices() {
            for device in outputs {
                if let Some(native) = describe_device(&device, false, default_output.as_deref()) {
                    map.output.push(native);
                }
            }
        }

        tracing::debug!(
            inputs = map.input.len(),
            outputs = map.output.len(),
            "native device enumeration complete"
        );
        Ok(map)
    }

    fn set_device(&self, name: &str, is_input: bool, config: &DeviceConfig) -> Result<()> {
        let device = self.find_device(name, is_input)?;

        // cpal applies configuration per stream, so pushing a config means
        // validating it against the device now and surfacing selection
        // errors before capture time.
        let default_ok = if is_input {
            device.default_input_config().ok()
        } else {
            device.default_output_config().ok()
        }
        .is_some_and(|c| c.channels() >= config.channels);
        let supports_channels = default_ok
            || supported_ranges(&device, is_input)
                .iter()
                .any(|c| c.channels >= config.channels);
        if !supports_channels {
            return Err(Error::Backend(format!(
                "device '{}' does not support {} channels",
                name, config.channels
            )));
        }

        tracing::info!(
            device = name,
            sample_rate = config.sample_rate,
            channels = config.channels,
            format = %config.sample_format,
            "device configured"
        );
        Ok(())
    }

    fn device_properties(&self, name: &str, is_input: bool) -> Result<NativeDevice> {
        let device = self.find_device(name, is_input)?;
        let default_name = if is_input {
            self.host.default_input_device()
        } else {
            self.host.default_output_device()
        }
        .and_then(|d| device_name(&d).ok());

        describe_device(&device, is_input, default_name.as_deref())
            .ok_or_else(|| Error::DeviceNotFound(name.to_string()))
    }
}

/// Harvest a cpal device into the bridge's device record.
fn describe_device(
    device: &cpal::Device,
    is_input: bool,
    default_name: Option<&str>,
) -> Option<NativeDevice> {
    let name = device_name(device).ok()?;

    let default_config = if is_input {
        device.default_input_config().ok()
    } else {
        device.default_output_config().ok()
    }
    .map(|c| SupportedConfig {
        channels: c.channels(),
        sample_rate: c.sample_rate(),
        sample_format: c.sample_format().to_string(),
    });

    Some(NativeDevice {
        is_default: default_name == Some(name.as_str()),
        supported_configs: supported_ranges(device, is_input),
        default_config,
        name,
    })
}

/// Collect one representative configuration per supported range.
fn supported_ranges(device: &cpal::Device, is_input: bool) -> Vec<SupportedConfig> {
    let collect = |ranges: Vec<cpal::SupportedStreamConfigRange>| {
        ranges
            .into_iter()
            .map(|r| SupportedConfig {
                channels: r.channels(),
                sample_rate: r.max_sample_rate(),
                sample_format: r.sample_format().to_string(),
            })
            .collect()
    };

    if is_input {
        device
            .supported_input_configs()
            .map(|r| collect(r.collect()))
            .unwrap_or_default()
    } else {
        device
            .supported_output_configs()
            .map(|r| collect(r.collect()))
            .unwrap_or_default()
    }
}
