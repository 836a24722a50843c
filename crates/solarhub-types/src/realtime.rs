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

//! Point-in-time telemetry snapshot.
//!
//! The shape covers grid-tied, hybrid and off-grid systems, single- and
//! three-phase. Everything below the top level is optional except the coarse
//! `total_power_w` figures on PV, grid, load and backup, which default to 0.

use crate::device::DeviceStatus;
use crate::meta::{ProviderMeta, composite_id};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============= Modes and Directions =============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperatingMode {
    Initializing,
    Waiting,
    GridConnected,
    OffGrid,
    Fault,
    Upgrading,
    Standby,
    Shutdown,
    #[default]
    Unknown,
}

/// Battery energy flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnergyDirection {
    Charging,
    Discharging,
    Idle,
    #[default]
    Unknown,
}

/// Energy flow at the grid interconnection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GridDirection {
    /// Buying from the grid
    Importing,
    /// Selling to the grid
    Exporting,
    Idle,
    #[default]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeterType {
    Grid,
    Pv,
    ExportLimiter,
    Storage,
    Consumption,
    #[default]
    Unknown,
}

// ============= PV =============

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PvData {
    pub total_power_w: f64,
    #[serde(default, rename = "todayEnergyKWh", skip_serializing_if = "Option::is_none")]
    pub today_energy_kwh: Option<f64>,
    #[serde(default, rename = "totalEnergyKWh", skip_serializing_if = "Option::is_none")]
    pub total_energy_kwh: Option<f64>,
    #[serde(default, rename = "monthEnergyKWh", skip_serializing_if = "Option::is_none")]
    pub month_energy_kwh: Option<f64>,
    #[serde(default, rename = "yearEnergyKWh", skip_serializing_if = "Option::is_none")]
    pub year_energy_kwh: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub strings: Vec<PvString>,
}

/// One MPPT input / string
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PvString {
    pub id: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voltage_v: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_a: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub power_w: Option<f64>,
}

impl PvString {
    /// Build a string entry, computing power from V*I when the vendor omits it.
    /// Returns `None` when the vendor reported nothing for this input.
    #[must_use]
    pub fn from_readings(
        id: u32,
        voltage_v: Option<f64>,
        current_a: Option<f64>,
        power_w: Option<f64>,
    ) -> Option<Self> {
        if voltage_v.is_none() && current_a.is_none() && power_w.is_none() {
            return None;
        }

        let power_w = power_w.or_else(|| Some(voltage_v? * current_a?));
        Some(Self {
            id,
            voltage_v,
            current_a,
            power_w,
        })
    }
}

// ============= Battery =============

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatteryData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub soc_percent: Option<f64>,
    pub power_w: f64,
    pub direction: EnergyDirection,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature_c: Option<f64>,
    #[serde(default, rename = "todayChargeKWh", skip_serializing_if = "Option::is_none")]
    pub today_charge_kwh: Option<f64>,
    #[serde(default, rename = "todayDischargeKWh", skip_serializing_if = "Option::is_none")]
    pub today_discharge_kwh: Option<f64>,
    #[serde(default, rename = "totalChargeKWh", skip_serializing_if = "Option::is_none")]
    pub total_charge_kwh: Option<f64>,
    #[serde(default, rename = "totalDischargeKWh", skip_serializing_if = "Option::is_none")]
    pub total_discharge_kwh: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_charge_power_w: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_discharge_power_w: Option<f64>,
    #[serde(default, rename = "voltageDC", skip_serializing_if = "Option::is_none")]
    pub voltage_dc: Option<f64>,
    #[serde(default, rename = "currentDC", skip_serializing_if = "Option::is_none")]
    pub current_dc: Option<f64>,
    /// Per-pack detail for multi-pack systems
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<BatteryGroup>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatteryGroup {
    pub id: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub soc_percent: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub power_w: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voltage_v: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_a: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature_c: Option<f64>,
}

// ============= Grid, Backup, Meters =============

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridData {
    pub total_power_w: f64,
    pub direction: GridDirection,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency_hz: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub power_factor: Option<f64>,
    #[serde(default, rename = "todayImportKWh", skip_serializing_if = "Option::is_none")]
    pub today_import_kwh: Option<f64>,
    #[serde(default, rename = "todayExportKWh", skip_serializing_if = "Option::is_none")]
    pub today_export_kwh: Option<f64>,
    #[serde(default, rename = "totalImportKWh", skip_serializing_if = "Option::is_none")]
    pub total_import_kwh: Option<f64>,
    #[serde(default, rename = "totalExportKWh", skip_serializing_if = "Option::is_none")]
    pub total_export_kwh: Option<f64>,
    #[serde(default, rename = "monthImportKWh", skip_serializing_if = "Option::is_none")]
    pub month_import_kwh: Option<f64>,
    #[serde(default, rename = "monthExportKWh", skip_serializing_if = "Option::is_none")]
    pub month_export_kwh: Option<f64>,
    #[serde(default, rename = "yearImportKWh", skip_serializing_if = "Option::is_none")]
    pub year_import_kwh: Option<f64>,
    #[serde(default, rename = "yearExportKWh", skip_serializing_if = "Option::is_none")]
    pub year_export_kwh: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub phases: Vec<PhaseData>,
}

/// Per-phase electrical readings. Vendor labels R/S/T are mapped to A/B/C.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseData {
    pub phase: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voltage_v: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_a: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub power_w: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency_hz: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub power_factor: Option<f64>,
    #[serde(default, rename = "apparentPowerVA", skip_serializing_if = "Option::is_none")]
    pub apparent_power_va: Option<f64>,
    #[serde(default, rename = "reactivePowerVAR", skip_serializing_if = "Option::is_none")]
    pub reactive_power_var: Option<f64>,
}

impl PhaseData {
    #[must_use]
    pub fn has_readings(&self) -> bool {
        self.voltage_v.is_some() || self.current_a.is_some() || self.power_w.is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadData {
    pub total_power_w: f64,
    #[serde(default, rename = "todayEnergyKWh", skip_serializing_if = "Option::is_none")]
    pub today_energy_kwh: Option<f64>,
    #[serde(default, rename = "totalEnergyKWh", skip_serializing_if = "Option::is_none")]
    pub total_energy_kwh: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub self_consumption_rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub self_sufficiency_rate: Option<f64>,
}

/// Backup (EPS) output, same phase shape as the grid
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupData {
    pub total_power_w: f64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub phases: Vec<PhaseData>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeterData {
    pub id: String,
    pub meter_type: MeterType,
    pub total_power_w: f64,
    #[serde(default, rename = "totalImportKWh", skip_serializing_if = "Option::is_none")]
    pub total_import_kwh: Option<f64>,
    #[serde(default, rename = "totalExportKWh", skip_serializing_if = "Option::is_none")]
    pub total_export_kwh: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub phases: Vec<PhaseData>,
}

// ============= Environment =============

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inverter_temperature_c: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ambient_temperature_c: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sink_temperature_c: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module_temperature_c: Option<f64>,
    #[serde(default, rename = "irradianceWM2", skip_serializing_if = "Option::is_none")]
    pub irradiance_wm2: Option<f64>,
    #[serde(default, rename = "windSpeedMS", skip_serializing_if = "Option::is_none")]
    pub wind_speed_ms: Option<f64>,
    #[serde(default, rename = "signalStrengthDBm", skip_serializing_if = "Option::is_none")]
    pub signal_strength_dbm: Option<i32>,
}

// ============= Snapshot =============

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Realtime {
    pub device_id: String,
    pub provider: String,
    /// Normalized UTC timestamp
    pub timestamp: DateTime<Utc>,
    /// Vendor timestamp exactly as received
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub original_timestamp: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub original_timezone: String,
    pub status: DeviceStatus,
    pub operating_mode: OperatingMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pv: Option<PvData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub battery: Option<BatteryData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grid: Option<GridData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub load: Option<LoadData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backup: Option<BackupData>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub meters: Vec<MeterData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment: Option<EnvironmentData>,
    pub meta: ProviderMeta,
}

impl Realtime {
    /// Empty snapshot for a device, stamped now
    #[must_use]
    pub fn new(provider: &str, native_device_id: &str) -> Self {
        let meta = ProviderMeta::for_device(provider, native_device_id).with_raw_data();
        Self {
            device_id: composite_id(provider, native_device_id),
            provider: provider.to_owned(),
            timestamp: meta.fetched_at,
            original_timestamp: String::new(),
            original_timezone: String::new(),
            status: DeviceStatus::Unknown,
            operating_mode: OperatingMode::Unknown,
            pv: None,
            battery: None,
            grid: None,
            load: None,
            backup: None,
            meters: Vec::new(),
            environment: None,
            meta,
        }
    }
}
