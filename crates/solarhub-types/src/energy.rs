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

use crate::device::DeviceStatus;
use crate::meta::{ProviderMeta, composite_id};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============= Period =============

/// Reporting window for energy statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Period {
    #[default]
    Day,
    Week,
    Month,
    Year,
    Total,
}

impl Period {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
            Self::Year => "year",
            Self::Total => "total",
        }
    }

    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Day, Self::Week, Self::Month, Self::Year, Self::Total]
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Period {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "day" => Ok(Self::Day),
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            "year" => Ok(Self::Year),
            "total" => Ok(Self::Total),
            _ => Err(format!(
                "Invalid period '{s}'. Supported: day, week, month, year, total"
            )),
        }
    }
}

// ============= Summary =============

/// Aggregated energy figures for one plant over one [`Period`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnergySummary {
    /// Composite id of the plant
    pub id: String,
    pub provider: String,
    pub period: Period,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period_start: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period_end: Option<DateTime<Utc>>,

    #[serde(default, rename = "pvGenerationKWh", skip_serializing_if = "Option::is_none")]
    pub pv_generation_kwh: Option<f64>,
    #[serde(default, rename = "loadConsumptionKWh", skip_serializing_if = "Option::is_none")]
    pub load_consumption_kwh: Option<f64>,
    #[serde(default, rename = "gridImportKWh", skip_serializing_if = "Option::is_none")]
    pub grid_import_kwh: Option<f64>,
    #[serde(default, rename = "gridExportKWh", skip_serializing_if = "Option::is_none")]
    pub grid_export_kwh: Option<f64>,
    #[serde(default, rename = "batteryChargeKWh", skip_serializing_if = "Option::is_none")]
    pub battery_charge_kwh: Option<f64>,
    #[serde(default, rename = "batteryDischargeKWh", skip_serializing_if = "Option::is_none")]
    pub battery_discharge_kwh: Option<f64>,
    #[serde(default, rename = "selfConsumptionKWh", skip_serializing_if = "Option::is_none")]
    pub self_consumption_kwh: Option<f64>,

    /// Fraction in [0, 1]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub self_consumption_rate: Option<f64>,
    /// Fraction in [0, 1]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub self_sufficiency_rate: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub co2_saved_kg: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trees_equivalent: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revenue: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub savings: Option<f64>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub currency: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_power_w: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_status: Option<DeviceStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub battery_soc: Option<f64>,

    pub meta: ProviderMeta,
}

impl EnergySummary {
    #[must_use]
    pub fn new(provider: &str, plant_native_id: &str, period: Period) -> Self {
        let meta = ProviderMeta::for_plant(provider, plant_native_id).with_raw_data();
        Self {
            id: composite_id(provider, plant_native_id),
            provider: provider.to_owned(),
            period,
            timestamp: meta.fetched_at,
            period_start: None,
            period_end: None,
            pv_generation_kwh: None,
            load_consumption_kwh: None,
            grid_import_kwh: None,
            grid_export_kwh: None,
            battery_charge_kwh: None,
            battery_discharge_kwh: None,
            self_consumption_kwh: None,
            self_consumption_rate: None,
            self_sufficiency_rate: None,
            co2_saved_kg: None,
            trees_equivalent: None,
            revenue: None,
            savings: None,
            currency: String::new(),
            current_power_w: None,
            device_status: None,
            battery_soc: None,
            meta,
        }
    }
}

/// Energy figures for one labelled window, used when comparing periods
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnergyBreakdown {
    pub label: String,
    #[serde(default, rename = "pvGenerationKWh", skip_serializing_if = "Option::is_none")]
    pub pv_generation_kwh: Option<f64>,
    #[serde(default, rename = "loadConsumptionKWh", skip_serializing_if = "Option::is_none")]
    pub load_consumption_kwh: Option<f64>,
    #[serde(default, rename = "gridImportKWh", skip_serializing_if = "Option::is_none")]
    pub grid_import_kwh: Option<f64>,
    #[serde(default, rename = "gridExportKWh", skip_serializing_if = "Option::is_none")]
    pub grid_export_kwh: Option<f64>,
    #[serde(default, rename = "batteryChargeKWh", skip_serializing_if = "Option::is_none")]
    pub battery_charge_kwh: Option<f64>,
    #[serde(default, rename = "batteryDischargeKWh", skip_serializing_if = "Option::is_none")]
    pub battery_discharge_kwh: Option<f64>,
}

impl From<&EnergySummary> for EnergyBreakdown {
    fn from(summary: &EnergySummary) -> Self {
        Self {
            label: summary.period.to_string(),
            pv_generation_kwh: summary.pv_generation_kwh,
            load_consumption_kwh: summary.load_consumption_kwh,
            grid_import_kwh: summary.grid_import_kwh,
            grid_export_kwh: summary.grid_export_kwh,
            battery_charge_kwh: summary.battery_charge_kwh,
            battery_discharge_kwh: summary.battery_discharge_kwh,
        }
    }
}
