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

//! SMA Monitoring API adapter.
//!
//! REST with an OAuth2 bearer token obtained out of band. Measurements come
//! as named sets (`PowerAc`, `PowerDc`, `EnergyBalance`) of timestamped
//! value maps.

use crate::extract::{get_array, get_f64, get_str, non_empty};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use serde_json::Value;
use solarhub_core::units::{fill_derived_metrics, parse_local_timestamp, wh_to_kwh, wp_to_kwp};
use solarhub_core::{Provider, ProviderConfig, ProviderError, ProviderResult, VendorHttpClient};
use solarhub_types::{
    Alarm, AlarmSeverity, AlarmStatus, Device, DeviceStatus, DeviceType, EnergySummary,
    Granularity, GridData, GridDirection, HistoryRequest, HistoryResponse, LatLng, OperatingMode,
    Period, PhaseData, Plant, PvData, PvString, Realtime, TimeSeriesPoint,
};
use tracing::{debug, info, warn};

pub const PROVIDER_NAME: &str = "sma";
const DEFAULT_BASE_URL: &str = "https://monitoring.smaapis.de/monitoring/v1";
const DEFAULT_RPS: f64 = 5.0;
const MAX_DC_INPUTS: u32 = 12;
const PHASES: [&str; 3] = ["A", "B", "C"];
const ALARM_SEVERITIES: [&str; 3] = ["alarm", "error", "warning"];

#[derive(Debug)]
pub struct SmaProvider {
    client: Option<VendorHttpClient>,
    tz: Tz,
}

impl Default for SmaProvider {
    fn default() -> Self {
        Self {
            client: None,
            tz: Tz::UTC,
        }
    }
}

/// Percent-encode a native id for use as a path segment
fn segment(id: &str) -> String {
    urlencoding::encode(id).into_owned()
}

impl SmaProvider {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn client(&self) -> ProviderResult<&VendorHttpClient> {
        self.client.as_ref().ok_or_else(|| {
            ProviderError::Config(format!("{PROVIDER_NAME} provider is not initialized"))
        })
    }

    async fn get(
        &self,
        path: &str,
        query: &[(&str, String)],
        operation: &str,
    ) -> ProviderResult<Value> {
        self.client()?
            .get_json(path, query)
            .await
            .map_err(|e| e.during(PROVIDER_NAME, operation))
    }

    /// SMA sends RFC 3339, but some sets omit the offset and are plant-local
    fn parse_time(&self, text: &str) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(text)
            .map(|t| t.with_timezone(&Utc))
            .ok()
            .or_else(|| parse_local_timestamp(text, "%Y-%m-%dT%H:%M:%S", self.tz))
    }

    async fn plant_logs(&self, plant_id: &str) -> ProviderResult<Vec<Alarm>> {
        let logs = self
            .get(&format!("/plants/{}/logs", segment(plant_id)), &[], "get_all_alarms")
            .await?;

        Ok(alarm_entries(&logs)
            .map(|entry| self.normalize_log_entry(entry, "").on_plant(plant_id))
            .collect())
    }

    fn normalize_realtime(&self, device_id: &str, ac: &Value, dc: Option<&Value>) -> Realtime {
        let mut rt = Realtime::new(PROVIDER_NAME, device_id);
        rt.status = DeviceStatus::Online;
        rt.operating_mode = OperatingMode::GridConnected;

        if let Some(latest) = latest_entry(ac) {
            if let Some(ts) = self.parse_time(&get_str(latest, "time")) {
                rt.timestamp = ts;
            }
            let values = &latest["values"];
            let phases = phase_readings(values, true);

            // per-phase sum only when the set has no total
            let total = get_f64(values, "PowerActive").unwrap_or_else(|| {
                phases.iter().filter_map(|p| p.power_w).sum()
            });

            rt.grid = Some(GridData {
                total_power_w: total,
                direction: GridDirection::Idle,
                phases,
                ..GridData::default()
            });
        }

        if let Some(latest) = dc.and_then(latest_entry) {
            let values = &latest["values"];
            let strings: Vec<PvString> = (1..=MAX_DC_INPUTS)
                .filter_map(|i| {
                    PvString::from_readings(
                        i,
                        get_f64(values, &format!("Voltage{i}")),
                        get_f64(values, &format!("Current{i}")),
                        get_f64(values, &format!("Power{i}")),
                    )
                })
                .collect();

            let total = get_f64(values, "PowerDc")
                .unwrap_or_else(|| strings.iter().filter_map(|s| s.power_w).sum());

            rt.pv = Some(PvData {
                total_power_w: total,
                strings,
                ..PvData::default()
            });
        }

        rt
    }

    fn normalize_history(
        &self,
        set: &Value,
        device_id: &str,
        granularity: Granularity,
    ) -> Vec<TimeSeriesPoint> {
        get_array(set, "set")
            .iter()
            .filter_map(|entry| {
                let timestamp = self.parse_time(&get_str(entry, "time"))?;
                let values = &entry["values"];
                let mut point = TimeSeriesPoint::new(PROVIDER_NAME, device_id, timestamp, granularity);
                // inverter AC output is the PV production seen by the grid
                point.pv_power_w = get_f64(values, "PowerActive");
                point.grid_phases = phase_readings(values, false);
                Some(point)
            })
            .collect()
    }

    fn normalize_log_entry(&self, entry: &Value, device_id: &str) -> Alarm {
        let log_id = get_str(entry, "logId");
        let message = get_str(entry, "message");
        let device = non_empty(get_str(entry, "deviceId")).unwrap_or_else(|| device_id.to_owned());

        let mut alarm = Alarm::new(PROVIDER_NAME, &log_id, message.clone())
            .on_device(&device)
            .with_window(self.parse_time(&get_str(entry, "time")), None);
        alarm.code = log_id;
        alarm.message = message;
        alarm.severity = log_severity(&get_str(entry, "severity"));
        // the log API has no clear events
        alarm.status = AlarmStatus::Active;
        alarm
    }
}

#[async_trait]
impl Provider for SmaProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    async fn initialize(&mut self, config: &ProviderConfig) -> ProviderResult<()> {
        let token = config.require_credential(PROVIDER_NAME, "bearerToken")?;
        self.tz = config.timezone_or_utc();

        let client =
            VendorHttpClient::from_config(PROVIDER_NAME, config, DEFAULT_BASE_URL, DEFAULT_RPS)?;
        client.set_header("Authorization", &format!("Bearer {token}"))?;
        self.client = Some(client);

        info!("✅ [SMA] Initialized against {}", config.base_url_or(DEFAULT_BASE_URL));
        Ok(())
    }

    async fn get_plants(&self) -> ProviderResult<Vec<Plant>> {
        let response = self.get("/plants", &[], "get_plants").await?;
        Ok(get_array(&response, "plants")
            .iter()
            .map(|raw| Plant::new(PROVIDER_NAME, &get_str(raw, "plantId"), get_str(raw, "name")))
            .collect())
    }

    async fn get_plant_details(&self, plant_id: &str) -> ProviderResult<Plant> {
        let raw = self
            .get(
                &format!("/plants/{}/installation", segment(plant_id)),
                &[],
                "get_plant_details",
            )
            .await?;

        Ok(normalize_installation(&raw, plant_id))
    }

    async fn get_devices(&self, plant_id: &str) -> ProviderResult<Vec<Device>> {
        let response = self
            .get(
                &format!("/plants/{}/devices", segment(plant_id)),
                &[],
                "get_devices",
            )
            .await?;

        Ok(get_array(&response, "devices")
            .iter()
            .map(|raw| normalize_device(raw, plant_id))
            .collect())
    }

    async fn get_device_details(&self, _device_id: &str) -> ProviderResult<Device> {
        Err(ProviderError::not_supported(
            PROVIDER_NAME,
            "get_device_details",
            "use get_devices with the plant id",
        ))
    }

    async fn get_realtime_data(&self, device_id: &str) -> ProviderResult<Realtime> {
        let base = format!("/devices/{}/measurements/sets", segment(device_id));
        let ac = self
            .get(&format!("{base}/PowerAc/Recent"), &[], "get_realtime_data")
            .await?;

        // inverters without DC metering answer with an error here
        let dc = match self
            .get(&format!("{base}/PowerDc/Recent"), &[], "get_realtime_data")
            .await
        {
            Ok(dc) => Some(dc),
            Err(e) => {
                debug!("⚠️ [SMA] No DC set for {}: {}", device_id, e);
                None
            }
        };

        Ok(self.normalize_realtime(device_id, &ac, dc.as_ref()))
    }

    async fn get_energy_stats(
        &self,
        plant_id: &str,
        period: Period,
        date: NaiveDate,
    ) -> ProviderResult<EnergySummary> {
        let set = self
            .get(
                &format!(
                    "/plants/{}/measurements/sets/EnergyBalance/{}",
                    segment(plant_id),
                    sma_period(period)
                ),
                &[("Date", date.format("%Y-%m-%d").to_string())],
                "get_energy_stats",
            )
            .await?;

        Ok(normalize_energy_balance(&set, plant_id, period))
    }

    async fn get_historical_data(
        &self,
        device_id: &str,
        request: &HistoryRequest,
    ) -> ProviderResult<HistoryResponse> {
        let day = request.start().map_or_else(
            || request.start_time.clone(),
            |t| t.with_timezone(&self.tz).format("%Y-%m-%d").to_string(),
        );

        let set = self
            .get(
                &format!(
                    "/devices/{}/measurements/sets/PowerAc/{}",
                    segment(device_id),
                    sma_granularity(request.granularity)
                ),
                &[("Date", day)],
                "get_historical_data",
            )
            .await?;

        let points = self.normalize_history(&set, device_id, request.granularity);
        let mut request = request.clone();
        device_id.clone_into(&mut request.device_id);
        Ok(HistoryResponse::new(PROVIDER_NAME, &request, points))
    }

    async fn get_alarms(&self, device_id: &str) -> ProviderResult<Vec<Alarm>> {
        let logs = self
            .get(&format!("/devices/{}/logs", segment(device_id)), &[], "get_alarms")
            .await?;

        Ok(alarm_entries(&logs)
            .map(|entry| self.normalize_log_entry(entry, device_id))
            .collect())
    }

    async fn get_all_alarms(&self) -> ProviderResult<Vec<Alarm>> {
        let plants = self.get_plants().await?;
        let mut alarms = Vec::new();

        for plant in &plants {
            let plant_id = &plant.meta.provider_plant_id;
            match self.plant_logs(plant_id).await {
                Ok(found) => alarms.extend(found),
                Err(e) => warn!("⚠️ [SMA] Skipping logs of plant {}: {}", plant_id, e),
            }
        }
        Ok(alarms)
    }

    async fn healthy(&self) -> bool {
        self.client.is_some()
    }

    fn close(&self) -> ProviderResult<()> {
        if let Some(client) = &self.client {
            client.remove_header("Authorization");
        }
        Ok(())
    }
}

// ============= Normalization =============

fn latest_entry(set: &Value) -> Option<&Value> {
    get_array(set, "set").last()
}

fn alarm_entries(logs: &Value) -> impl Iterator<Item = &Value> {
    get_array(logs, "logs")
        .iter()
        .filter(|entry| ALARM_SEVERITIES.contains(&get_str(entry, "severity").as_str()))
}

fn phase_readings(values: &Value, with_frequency: bool) -> Vec<PhaseData> {
    PHASES
        .iter()
        .map(|phase| PhaseData {
            phase: (*phase).to_owned(),
            voltage_v: get_f64(values, &format!("VoltagePhase{phase}")),
            current_a: get_f64(values, &format!("CurrentPhase{phase}")),
            power_w: get_f64(values, &format!("PowerActivePhase{phase}")),
            frequency_hz: if with_frequency {
                get_f64(values, &format!("FrequencyPhase{phase}"))
            } else {
                None
            },
            ..PhaseData::default()
        })
        .filter(PhaseData::has_readings)
        .collect()
}

fn normalize_installation(raw: &Value, plant_id: &str) -> Plant {
    let mut plant = Plant::new(PROVIDER_NAME, plant_id, get_str(raw, "name"));
    plant.timezone = get_str(raw, "timezone");
    plant.country = get_str(raw, "country");

    let locality = [get_str(raw, "postalCode"), get_str(raw, "city")]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    plant.address = [get_str(raw, "street"), locality]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(", ");

    if let (Some(latitude), Some(longitude)) = (get_f64(raw, "latitude"), get_f64(raw, "longitude"))
    {
        plant.location = Some(LatLng {
            latitude,
            longitude,
        });
    }
    plant.peak_power_kwp = get_f64(raw, "peakPower").map(wp_to_kwp);
    plant.meta = plant.meta.with_raw_data();
    plant
}

fn normalize_device(raw: &Value, plant_id: &str) -> Device {
    let active = raw.get("isActive").and_then(Value::as_bool).unwrap_or(false);

    let mut device = Device::new(PROVIDER_NAME, &get_str(raw, "deviceId"), plant_id);
    device.name = get_str(raw, "name");
    device.serial_number = get_str(raw, "serial");
    device.model = get_str(raw, "product");
    device.device_type = device_type(&get_str(raw, "type"));
    device.manufacturer = non_empty(get_str(raw, "manufacturer")).unwrap_or_else(|| "SMA".to_owned());
    device.status = device_status(&get_str(raw, "status"), active);
    device.is_online = active;
    device
}

fn normalize_energy_balance(set: &Value, plant_id: &str, period: Period) -> EnergySummary {
    let entries = get_array(set, "set");
    let sum_kwh = |key: &str| -> Option<f64> {
        entries
            .iter()
            .filter_map(|entry| get_f64(&entry["values"], key))
            .fold(None, |acc, wh| Some(acc.unwrap_or(0.0) + wh_to_kwh(wh)))
    };

    let mut energy = EnergySummary::new(PROVIDER_NAME, plant_id, period);
    energy.pv_generation_kwh = sum_kwh("PvGeneration");
    energy.load_consumption_kwh = sum_kwh("TotalConsumption");
    energy.grid_export_kwh = sum_kwh("GridFeedIn");
    energy.grid_import_kwh = sum_kwh("GridPurchase");
    energy.battery_charge_kwh = sum_kwh("BatteryCharge");
    energy.battery_discharge_kwh = sum_kwh("BatteryDischarge");
    fill_derived_metrics(&mut energy);
    energy
}

// ============= Mapping =============

fn device_type(kind: &str) -> DeviceType {
    match kind {
        "SolarInverter" | "PV Inverter" => DeviceType::StringInverter,
        "HybridInverter" => DeviceType::HybridInverter,
        "Battery" | "BatteryInverter" => DeviceType::Battery,
        "EnergyMeter" | "Meter" => DeviceType::Meter,
        "Gateway" | "CommunicationProduct" => DeviceType::Gateway,
        "Sensor" | "SatelliteSensor" => DeviceType::WeatherStation,
        "EVCharger" => DeviceType::EvCharger,
        _ => DeviceType::Unknown,
    }
}

fn device_status(status: &str, active: bool) -> DeviceStatus {
    if !active {
        return DeviceStatus::Offline;
    }
    match status.to_ascii_lowercase().as_str() {
        "ok" => DeviceStatus::Normal,
        "warning" => DeviceStatus::Warning,
        "error" | "alarm" => DeviceStatus::Fault,
        _ => DeviceStatus::Online,
    }
}

fn log_severity(severity: &str) -> AlarmSeverity {
    match severity {
        "info" => AlarmSeverity::Info,
        "warning" => AlarmSeverity::Warning,
        "alarm" | "error" => AlarmSeverity::Critical,
        _ => AlarmSeverity::Unknown,
    }
}

fn sma_period(period: Period) -> &'static str {
    match period {
        Period::Day => "Day",
        Period::Week => "Week",
        Period::Month => "Month",
        Period::Year => "Year",
        Period::Total => "Total",
    }
}

fn sma_granularity(granularity: Granularity) -> &'static str {
    match granularity {
        Granularity::Minute => "FiveMinutes",
        Granularity::Hour => "QuarterOfAnHour",
        Granularity::Day => "Day",
        Granularity::Month => "Month",
        Granularity::Year => "Year",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server, ServerGuard};
    use serde_json::json;

    async fn provider(server: &ServerGuard) -> SmaProvider {
        let config = ProviderConfig::new(PROVIDER_NAME)
            .with_base_url(&server.url())
            .with_credential("bearerToken", "bt-1");
        let mut provider = SmaProvider::new();
        provider.initialize(&config).await.unwrap();
        provider
    }

    #[tokio::test]
    async fn test_bearer_token_required() {
        let mut provider = SmaProvider::new();
        let err = provider
            .initialize(&ProviderConfig::new(PROVIDER_NAME).with_credential("bearerToken", ""))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::MissingCredential { ref key, .. } if key == "bearerToken"));
        assert!(!provider.healthy().await);
    }

    #[tokio::test]
    async fn test_installation_converts_peak_power() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/plants/P%201/installation")
            .match_header("Authorization", "Bearer bt-1")
            .with_status(200)
            .with_body(
                json!({"name": "Barn", "peakPower": 9800.0, "timezone": "Europe/Berlin",
                       "street": "Main St 1", "postalCode": "34266", "city": "Niestetal",
                       "latitude": 51.3, "longitude": 9.5})
                .to_string(),
            )
            .create_async()
            .await;

        let plant = provider(&server).await.get_plant_details("P 1").await.unwrap();
        assert_eq!(plant.id, "sma_P 1");
        assert_eq!(plant.peak_power_kwp, Some(9.8));
        assert_eq!(plant.address, "Main St 1, 34266 Niestetal");
        assert_eq!(plant.timezone, "Europe/Berlin");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_realtime_dc_is_best_effort() {
        let mut server = Server::new_async().await;
        let _ac = server
            .mock("GET", "/devices/D1/measurements/sets/PowerAc/Recent")
            .with_status(200)
            .with_body(
                json!({"setType": "PowerAc", "set": [
                    {"time": "2024-05-01T09:55:00Z", "values": {"PowerActive": 100.0}},
                    {"time": "2024-05-01T10:00:00Z", "values": {"PowerActivePhaseA": 1000.0, "PowerActivePhaseB": 1100.0, "VoltagePhaseA": 230.0}}
                ]})
                .to_string(),
            )
            .create_async()
            .await;
        let _dc = server
            .mock("GET", "/devices/D1/measurements/sets/PowerDc/Recent")
            .with_status(404)
            .create_async()
            .await;

        let rt = provider(&server).await.get_realtime_data("D1").await.unwrap();
        assert_eq!(rt.device_id, "sma_D1");
        assert_eq!(rt.timestamp.to_rfc3339(), "2024-05-01T10:00:00+00:00");
        let grid = rt.grid.unwrap();
        assert_eq!(grid.phases.len(), 2);
        assert!((grid.total_power_w - 2100.0).abs() < 1e-9);
        assert!(rt.pv.is_none());
    }

    #[test]
    fn test_realtime_dc_strings() {
        let provider = SmaProvider::default();
        let dc = json!({"set": [{"time": "2024-05-01T10:00:00Z", "values": {
            "Voltage1": 500.0, "Current1": 4.0, "Power1": 2000.0, "Power2": 1500.0
        }}]});

        let rt = provider.normalize_realtime("D1", &json!({}), Some(&dc));
        let pv = rt.pv.unwrap();
        assert_eq!(pv.strings.len(), 2);
        assert!((pv.total_power_w - 3500.0).abs() < 1e-9);
        assert!(rt.grid.is_none());
    }

    #[tokio::test]
    async fn test_energy_balance_sums_wh() {
        let mut server = Server::new_async().await;
        let _set = server
            .mock("GET", "/plants/P1/measurements/sets/EnergyBalance/Month")
            .match_query(Matcher::UrlEncoded("Date".into(), "2024-05-01".into()))
            .with_status(200)
            .with_body(
                json!({"set": [
                    {"time": "2024-05-01", "values": {"PvGeneration": 20000.0, "GridFeedIn": 5000.0, "TotalConsumption": 18000.0, "GridPurchase": 3000.0}},
                    {"time": "2024-05-02", "values": {"PvGeneration": 10000.0, "GridFeedIn": 1000.0, "TotalConsumption": 12000.0, "GridPurchase": 6000.0}}
                ]})
                .to_string(),
            )
            .create_async()
            .await;

        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let energy = provider(&server)
            .await
            .get_energy_stats("P1", Period::Month, date)
            .await
            .unwrap();

        assert!((energy.pv_generation_kwh.unwrap() - 30.0).abs() < 1e-9);
        assert!((energy.grid_export_kwh.unwrap() - 6.0).abs() < 1e-9);
        assert!((energy.self_consumption_rate.unwrap() - 0.8).abs() < 1e-9);
        assert!((energy.self_sufficiency_rate.unwrap() - 0.7).abs() < 1e-9);
        assert!(energy.battery_charge_kwh.is_none());
    }

    #[tokio::test]
    async fn test_all_alarms_skip_failing_plants() {
        let mut server = Server::new_async().await;
        let _plants = server
            .mock("GET", "/plants")
            .with_status(200)
            .with_body(json!({"plants": [{"plantId": "P1", "name": "A"}, {"plantId": "P2", "name": "B"}]}).to_string())
            .create_async()
            .await;
        let _p1 = server
            .mock("GET", "/plants/P1/logs")
            .with_status(200)
            .with_body(
                json!({"logs": [
                    {"logId": "L1", "time": "2024-05-01T08:00:00Z", "message": "Grid fault", "severity": "error", "deviceId": "D1"},
                    {"logId": "L2", "time": "2024-05-01T08:00:00Z", "message": "Update done", "severity": "info", "deviceId": "D1"},
                    {"logId": "L3", "time": "2024-05-01T09:00:00Z", "message": "Derating", "severity": "warning"}
                ]})
                .to_string(),
            )
            .create_async()
            .await;
        let _p2 = server
            .mock("GET", "/plants/P2/logs")
            .with_status(403)
            .create_async()
            .await;

        let alarms = provider(&server).await.get_all_alarms().await.unwrap();
        assert_eq!(alarms.len(), 2);
        assert_eq!(alarms[0].id, "sma_alarm_L1");
        assert_eq!(alarms[0].device_id, "sma_D1");
        assert_eq!(alarms[0].plant_id, "sma_P1");
        assert_eq!(alarms[0].severity, AlarmSeverity::Critical);
        assert_eq!(alarms[1].severity, AlarmSeverity::Warning);
        assert!(alarms[1].device_id.is_empty());
    }

    #[test]
    fn test_device_mapping() {
        let inverter = json!({"deviceId": "D1", "type": "SolarInverter", "isActive": true, "status": "Ok", "serial": "3001"});
        let offline = json!({"deviceId": "D2", "type": "Battery", "isActive": false, "manufacturer": "BYD"});
        let odd = json!({"deviceId": "D3", "type": "Toaster", "isActive": true});

        let d1 = normalize_device(&inverter, "P1");
        assert_eq!(d1.device_type, DeviceType::StringInverter);
        assert_eq!(d1.status, DeviceStatus::Normal);
        assert_eq!(d1.manufacturer, "SMA");

        let d2 = normalize_device(&offline, "P1");
        assert_eq!(d2.status, DeviceStatus::Offline);
        assert_eq!(d2.manufacturer, "BYD");

        let d3 = normalize_device(&odd, "P1");
        assert_eq!(d3.device_type, DeviceType::Unknown);
        assert_eq!(d3.status, DeviceStatus::Online);
    }

    #[test]
    fn test_local_times_without_offset() {
        let provider = SmaProvider {
            tz: chrono_tz::Europe::Berlin,
            ..SmaProvider::default()
        };
        let parsed = provider.parse_time("2024-01-10T12:00:00").unwrap();
        assert_eq!(parsed.to_rfc3339(), "2024-01-10T11:00:00+00:00");
    }
}
