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

//! Vendor-agnostic data model shared by every SolarHub crate.

pub mod alarm;
pub mod device;
pub mod energy;
pub mod history;
pub mod meta;
pub mod plant;
pub mod realtime;

// Re-export common types for convenience
pub use alarm::{Alarm, AlarmSeverity, AlarmStatus};
pub use device::{Device, DeviceBatteryInfo, DeviceStatus, DeviceType, FirmwareInfo};
pub use energy::{EnergyBreakdown, EnergySummary, Period};
pub use history::{
    Granularity, HistoryRequest, HistoryResponse, TimeSeriesAggregate, TimeSeriesPoint,
};
pub use meta::{ProviderMeta, composite_id};
pub use plant::{GridConnectionType, LatLng, Plant, PlantType};
pub use realtime::{
    BackupData, BatteryData, BatteryGroup, EnergyDirection, EnvironmentData, GridData,
    GridDirection, LoadData, MeterData, MeterType, OperatingMode, PhaseData, PvData, PvString,
    Realtime,
};
