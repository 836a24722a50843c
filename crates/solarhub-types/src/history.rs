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

//! Time-series history.
//!
//! Minute and hour points carry instantaneous power, coarser points carry
//! energy totals. A single point never mixes the two.

use crate::meta::{ProviderMeta, composite_id};
use crate::realtime::{EnergyDirection, PhaseData, PvString};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Granularity {
    Minute,
    #[default]
    Hour,
    Day,
    Month,
    Year,
}

impl Granularity {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Minute => "minute",
            Self::Hour => "hour",
            Self::Day => "day",
            Self::Month => "month",
            Self::Year => "year",
        }
    }

    /// Whether points at this resolution carry power rather than energy
    #[must_use]
    pub const fn is_power_series(self) -> bool {
        matches!(self, Self::Minute | Self::Hour)
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Granularity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "minute" => Ok(Self::Minute),
            "hour" => Ok(Self::Hour),
            "day" => Ok(Self::Day),
            "month" => Ok(Self::Month),
            "year" => Ok(Self::Year),
            _ => Err(format!(
                "Invalid granularity '{s}'. Supported: minute, hour, day, month, year"
            )),
        }
    }
}

/// Caller's history query; times are passed through as supplied (RFC 3339)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRequest {
    pub device_id: String,
    pub start_time: String,
    pub end_time: String,
    pub granularity: Granularity,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub metrics: Vec<String>,
    pub page: u32,
    pub page_size: u32,
}

impl HistoryRequest {
    pub const DEFAULT_PAGE_SIZE: u32 = 100;
    pub const MAX_PAGE_SIZE: u32 = 1000;

    #[must_use]
    pub fn new(
        device_id: impl Into<String>,
        start_time: impl Into<String>,
        end_time: impl Into<String>,
        granularity: Granularity,
    ) -> Self {
        Self {
            device_id: device_id.into(),
            start_time: start_time.into(),
            end_time: end_time.into(),
            granularity,
            metrics: Vec::new(),
            page: 1,
            page_size: Self::DEFAULT_PAGE_SIZE,
        }
    }

    /// Parsed start, if the caller supplied RFC 3339
    #[must_use]
    pub fn start(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.start_time)
            .ok()
            .map(|t| t.with_timezone(&Utc))
    }

    #[must_use]
    pub fn end(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.end_time)
            .ok()
            .map(|t| t.with_timezone(&Utc))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSeriesPoint {
    pub device_id: String,
    pub provider: String,
    pub timestamp: DateTime<Utc>,
    pub granularity: Granularity,

    // power series
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pv_power_w: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub load_power_w: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grid_power_w: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub battery_power_w: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub self_use_power_w: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grid_import_power_w: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grid_export_power_w: Option<f64>,
    #[serde(default, rename = "batterySOC", skip_serializing_if = "Option::is_none")]
    pub battery_soc: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub battery_direction: Option<EnergyDirection>,

    // energy series
    #[serde(default, rename = "pvEnergyKWh", skip_serializing_if = "Option::is_none")]
    pub pv_energy_kwh: Option<f64>,
    #[serde(default, rename = "loadEnergyKWh", skip_serializing_if = "Option::is_none")]
    pub load_energy_kwh: Option<f64>,
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

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pv_strings: Vec<PvString>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub grid_phases: Vec<PhaseData>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub inverter_phases: Vec<PhaseData>,

    pub meta: ProviderMeta,
}

impl TimeSeriesPoint {
    #[must_use]
    pub fn new(
        provider: &str,
        native_device_id: &str,
        timestamp: DateTime<Utc>,
        granularity: Granularity,
    ) -> Self {
        Self {
            device_id: composite_id(provider, native_device_id),
            provider: provider.to_owned(),
            timestamp,
            granularity,
            pv_power_w: None,
            load_power_w: None,
            grid_power_w: None,
            battery_power_w: None,
            self_use_power_w: None,
            grid_import_power_w: None,
            grid_export_power_w: None,
            battery_soc: None,
            battery_direction: None,
            pv_energy_kwh: None,
            load_energy_kwh: None,
            grid_import_kwh: None,
            grid_export_kwh: None,
            battery_charge_kwh: None,
            battery_discharge_kwh: None,
            self_consumption_kwh: None,
            pv_strings: Vec::new(),
            grid_phases: Vec::new(),
            inverter_phases: Vec::new(),
            meta: ProviderMeta::for_device(provider, native_device_id).with_raw_data(),
        }
    }
}

/// Totals over the whole requested window
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSeriesAggregate {
    #[serde(default, rename = "totalPvEnergyKWh", skip_serializing_if = "Option::is_none")]
    pub total_pv_energy_kwh: Option<f64>,
    #[serde(default, rename = "totalLoadEnergyKWh", skip_serializing_if = "Option::is_none")]
    pub total_load_energy_kwh: Option<f64>,
    #[serde(default, rename = "totalGridImportKWh", skip_serializing_if = "Option::is_none")]
    pub total_grid_import_kwh: Option<f64>,
    #[serde(default, rename = "totalGridExportKWh", skip_serializing_if = "Option::is_none")]
    pub total_grid_export_kwh: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub self_consumption_rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub self_sufficiency_rate: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryResponse {
    pub device_id: String,
    pub provider: String,
    pub granularity: Granularity,
    pub start_time: String,
    pub end_time: String,
    pub total_points: usize,
    pub data_points: Vec<TimeSeriesPoint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aggregate: Option<TimeSeriesAggregate>,
}

impl HistoryResponse {
    /// Wrap points for a request; `total_points` follows the point count
    #[must_use]
    pub fn new(provider: &str, request: &HistoryRequest, data_points: Vec<TimeSeriesPoint>) -> Self {
        Self {
            device_id: composite_id(provider, &request.device_id),
            provider: provider.to_owned(),
            granularity: request.granularity,
            start_time: request.start_time.clone(),
            end_time: request.end_time.clone(),
            total_points: data_points.len(),
            data_points,
            aggregate: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_granularity_power_or_energy() {
        assert!(Granularity::Minute.is_power_series());
        assert!(Granularity::Hour.is_power_series());
        assert!(!Granularity::Day.is_power_series());
        assert!(!Granularity::Year.is_power_series());
        assert_eq!("day".parse::<Granularity>().unwrap(), Granularity::Day);
        assert!("week".parse::<Granularity>().is_err());
    }

    #[test]
    fn test_request_parses_rfc3339_bounds() {
        let request = HistoryRequest::new(
            "SN1",
            "2025-03-01T00:00:00Z",
            "not a time",
            Granularity::Hour,
        );
        assert_eq!(
            request.start(),
            Some(Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap())
        );
        assert_eq!(request.end(), None);
        assert_eq!(request.page, 1);
        assert_eq!(request.page_size, HistoryRequest::DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn test_response_counts_points() {
        let request = HistoryRequest::new("SN1", "a", "b", Granularity::Day);
        let ts = Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap();
        let mut point = TimeSeriesPoint::new("saj", "SN1", ts, Granularity::Day);
        point.pv_energy_kwh = Some(12.5);

        let response = HistoryResponse::new("saj", &request, vec![point]);
        assert_eq!(response.device_id, "saj_SN1");
        assert_eq!(response.total_points, 1);

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["dataPoints"][0]["pvEnergyKWh"], 12.5);
        assert!(json["dataPoints"][0].get("pvPowerW").is_none());
    }
}
