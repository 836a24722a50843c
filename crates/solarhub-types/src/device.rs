// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of SolarHub.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.
//
// For commercial licensing, please contact: info@solare.cz

use crate::meta::{ProviderMeta, composite_id};
use serde::{Deserialize, Serialize};

// ============= Device Vocabulary =============

/// Categories of solar equipment
///
/// Closed set shared by every adapter. Vendor codes without a mapping land in
/// `Unknown`, never in an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceType {
    Inverter,
    HybridInverter,
    MicroInverter,
    StringInverter,
    Battery,
    Meter,
    Ems,
    EvCharger,
    LoadMonitor,
    WeatherStation,
    DieselGenerator,
    HeatPump,
    SmartPlug,
    Optimizer,
    Gateway,
    #[default]
    Unknown,
}

/// Device status unified across vendors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceStatus {
    Online,
    Offline,
    Standby,
    Normal,
    Warning,
    Fault,
    Upgrading,
    #[default]
    Unknown,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FirmwareInfo {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub main_version: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub slave_version: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub display_version: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub module_model: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub module_sn: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub module_firmware: String,
}

/// Battery pack descriptor attached to devices that carry storage
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceBatteryInfo {
    pub count: u32,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub battery_type: String,
    /// "Ah" or "kWh"
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub capacity_unit: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub serial_numbers: Vec<String>,
}

// ============= Device =============

/// One physical unit belonging to exactly one plant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    pub id: String,
    pub provider: String,
    /// Composite id of the owning plant
    #[serde(default)]
    pub plant_id: String,
    pub name: String,
    #[serde(default)]
    pub serial_number: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub model: String,
    pub device_type: DeviceType,
    #[serde(default)]
    pub manufacturer: String,
    pub status: DeviceStatus,
    pub is_online: bool,
    pub has_alarm: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rated_power_w: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub firmware_info: Option<FirmwareInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub battery_info: Option<DeviceBatteryInfo>,
    pub meta: ProviderMeta,
}

impl Device {
    /// Start a device record; `plant_native_id` may be empty when the vendor
    /// does not report the owning plant.
    #[must_use]
    pub fn new(provider: &str, native_id: &str, plant_native_id: &str) -> Self {
        let plant_id = if plant_native_id.is_empty() {
            String::new()
        } else {
            composite_id(provider, plant_native_id)
        };

        Self {
            id: composite_id(provider, native_id),
            provider: provider.to_owned(),
            plant_id,
            name: String::new(),
            serial_number: String::new(),
            model: String::new(),
            device_type: DeviceType::Unknown,
            manufacturer: String::new(),
            status: DeviceStatus::Unknown,
            is_online: false,
            has_alarm: false,
            rated_power_w: None,
            firmware_info: None,
            battery_info: None,
            meta: ProviderMeta::for_device(provider, native_id).with_plant(plant_native_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_ids_are_composite() {
        let device = Device::new("huawei", "1000", "NE=33");
        assert_eq!(device.id, "huawei_1000");
        assert_eq!(device.plant_id, "huawei_NE=33");
        assert_eq!(device.meta.provider_device_id, "1000");
        assert_eq!(device.meta.provider_plant_id, "NE=33");
    }

    #[test]
    fn test_device_without_plant() {
        let device = Device::new("saj", "SN1", "");
        assert!(device.plant_id.is_empty());
    }

    #[test]
    fn test_device_type_serialization() {
        let json = serde_json::to_string(&DeviceType::EvCharger).unwrap();
        assert_eq!(json, "\"ev_charger\"");
        let parsed: DeviceType = serde_json::from_str("\"diesel_generator\"").unwrap();
        assert_eq!(parsed, DeviceType::DieselGenerator);
        assert_eq!(DeviceType::default(), DeviceType::Unknown);
    }
}
