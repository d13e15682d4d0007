//! Audio input device enumeration.

use serde::{Deserialize, Serialize};

/// Metadata about an audio input device.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceInfo {
    /// Human-readable device name reported by the OS.
    pub name: String,
    /// Whether this is the system default input device.
    pub is_default: bool,
    /// Input channel count of the device's default configuration.
    pub input_channels: u16,
    /// Sample rate of the device's default configuration (Hz).
    pub default_sample_rate: u32,
}

/// List all available audio input devices on the system.
///
/// Devices whose default configuration cannot be queried are skipped.
/// Returns an empty `Vec` if no host or no devices are available.
#[cfg(feature = "audio-cpal")]
pub fn list_input_devices() -> Vec<DeviceInfo> {
    use cpal::traits::{DeviceTrait, HostTrait};

    let host = cpal::default_host();
    let default_name = host.default_input_device().and_then(|d| d.name().ok());

    let devices = match host.input_devices() {
        Ok(devices) => devices,
        Err(e) => {
            tracing::warn!("failed to enumerate input devices: {e}");
            return vec![];
        }
    };

    let mut list: Vec<DeviceInfo> = devices
        .enumerate()
        .filter_map(|(idx, device)| {
            let name = device
                .name()
                .unwrap_or_else(|_| format!("Input Device {}", idx + 1));
            let config = device.default_input_config().ok()?;
            Some(DeviceInfo {
                is_default: default_name.as_deref() == Some(name.as_str()),
                input_channels: config.channels(),
                default_sample_rate: config.sample_rate().0,
                name,
            })
        })
        .collect();

    list.sort_by_key(|d| (!d.is_default, d.name.to_ascii_lowercase()));
    list
}

#[cfg(not(feature = "audio-cpal"))]
pub fn list_input_devices() -> Vec<DeviceInfo> {
    vec![]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_info_serializes_with_camel_case_fields() {
        let info = DeviceInfo {
            name: "USB Audio".into(),
            is_default: true,
            input_channels: 2,
            default_sample_rate: 44_100,
        };

        let json = serde_json::to_value(&info).expect("serialize device info");
        assert_eq!(json["name"], "USB Audio");
        assert_eq!(json["isDefault"], true);
        assert_eq!(json["inputChannels"], 2);
        assert_eq!(json["defaultSampleRate"], 44_100);
    }
}
