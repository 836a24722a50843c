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

//! Huawei FusionSolar northbound ("thirdData") adapter.
//!
//! Session based: `POST /login` hands out an `xsrf-token` header that must be
//! echoed as `XSRF-TOKEN` on every later call. Every endpoint is a POST with a
//! JSON body and answers `{success, failCode, message, data}`.

use crate::extract::{get_array, get_f64, get_f64_or_zero, get_i64, get_str};
use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde_json::{Value, json};
use solarhub_core::units::{fill_derived_metrics, from_epoch_millis, kilowatts_to_watts};
use solarhub_core::{
    Provider, ProviderConfig, ProviderError, ProviderResult, SessionCache, SessionToken,
    VendorHttpClient,
};
use solarhub_types::{
    Alarm, AlarmSeverity, AlarmStatus, Device, DeviceStatus, DeviceType, EnergySummary,
    EnvironmentData, FirmwareInfo, GridData, GridDirection, Granularity, HistoryRequest,
    HistoryResponse, LatLng, OperatingMode, Period, PhaseData, Plant, PvData, PvString, Realtime,
    TimeSeriesPoint,
};
use std::fmt;
use tracing::{debug, info, warn};

pub const PROVIDER_NAME: &str = "huawei";
const DEFAULT_BASE_URL: &str = "https://eu5.fusionsolar.huawei.com/thirdData";
const DEFAULT_RPS: f64 = 5.0;
const STATION_PAGE_SIZE: i64 = 20;
const MAX_PV_STRINGS: u32 = 24;
/// failCode returned when the session has expired
const SESSION_EXPIRED: i64 = 305;

#[derive(Default)]
pub struct HuaweiProvider {
    client: Option<VendorHttpClient>,
    username: String,
    system_code: String,
    session: SessionCache,
}

impl fmt::Debug for HuaweiProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HuaweiProvider")
            .field("client", &self.client)
            .field("username", &self.username)
            .field("session_valid", &self.session.is_valid())
            .finish_non_exhaustive()
    }
}

impl HuaweiProvider {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn client(&self) -> ProviderResult<&VendorHttpClient> {
        self.client.as_ref().ok_or_else(|| {
            ProviderError::Config(format!("{PROVIDER_NAME} provider is not initialized"))
        })
    }

    async fn login(&self) -> ProviderResult<SessionToken> {
        let client = self.client()?;
        let body = json!({
            "userName": self.username,
            "systemCode": self.system_code,
        });

        let (response, headers): (Value, _) = client
            .post_json_with_headers("/login", &body)
            .await
            .map_err(|e| e.during(PROVIDER_NAME, "login"))?;

        if response.get("success").and_then(Value::as_bool) != Some(true) {
            return Err(ProviderError::AuthenticationFailed(format!(
                "{PROVIDER_NAME} login rejected: failCode={} message={}",
                get_i64(&response, "failCode").unwrap_or_default(),
                get_str(&response, "message")
            )));
        }

        let token = headers
            .get("xsrf-token")
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .map(str::to_owned);

        match &token {
            Some(token) => client.set_header("XSRF-TOKEN", token)?,
            None => warn!("⚠️ [HUAWEI] Login succeeded without an xsrf-token header"),
        }

        info!("✅ [HUAWEI] Authenticated as {}", self.username);
        Ok(SessionToken::new(
            token.unwrap_or_else(|| "authenticated".to_owned()),
        ))
    }

    /// Current session token, logging in when none is held
    async fn ensure_session(&self) -> ProviderResult<String> {
        self.session
            .get_or_refresh(Duration::zero(), || self.login())
            .await
    }

    /// POST to a KPI endpoint and unwrap `data`, re-logging in once on session expiry
    async fn call(&self, path: &str, body: &Value, operation: &str) -> ProviderResult<Value> {
        let session = self.ensure_session().await?;
        let client = self.client()?;

        let mut response: Value = client
            .post_json(path, body)
            .await
            .map_err(|e| e.during(PROVIDER_NAME, operation))?;

        if get_i64(&response, "failCode") == Some(SESSION_EXPIRED) {
            if self.session.invalidate(&session) {
                debug!("🔑 [HUAWEI] Session expired, logging in again");
            }
            self.ensure_session().await?;
            response = client
                .post_json(path, body)
                .await
                .map_err(|e| e.during(PROVIDER_NAME, operation))?;
        }

        if response.get("success").and_then(Value::as_bool) != Some(true) {
            return Err(ProviderError::Vendor {
                provider: PROVIDER_NAME.to_owned(),
                code: get_str(&response, "failCode"),
                message: format!("{operation}: {}", get_str(&response, "message")),
            });
        }

        Ok(response.get("data").cloned().unwrap_or(Value::Null))
    }

    /// First entry of a list-shaped `data`, or `NoData`
    async fn call_first(&self, path: &str, body: &Value, operation: &str) -> ProviderResult<Value> {
        let data = self.call(path, body, operation).await?;
        data.as_array()
            .and_then(|list| list.first())
            .cloned()
            .ok_or_else(|| ProviderError::no_data(PROVIDER_NAME, operation))
    }
}

#[async_trait]
impl Provider for HuaweiProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    async fn initialize(&mut self, config: &ProviderConfig) -> ProviderResult<()> {
        config
            .require_credential(PROVIDER_NAME, "username")?
            .clone_into(&mut self.username);
        config
            .require_credential(PROVIDER_NAME, "systemCode")?
            .clone_into(&mut self.system_code);

        let client =
            VendorHttpClient::from_config(PROVIDER_NAME, config, DEFAULT_BASE_URL, DEFAULT_RPS)?;
        self.client = Some(client);
        self.session.clear();

        self.ensure_session().await?;
        Ok(())
    }

    async fn get_plants(&self) -> ProviderResult<Vec<Plant>> {
        let mut plants = Vec::new();
        let mut page_no: i64 = 1;

        loop {
            let data = self
                .call("/getStationList", &json!({ "pageNo": page_no }), "get_plants")
                .await?;

            plants.extend(get_array(&data, "list").iter().map(normalize_station));

            let total = get_i64(&data, "total").unwrap_or_default();
            if page_no * STATION_PAGE_SIZE >= total {
                break;
            }
            page_no += 1;
        }

        debug!("✅ [HUAWEI] {} stations", plants.len());
        Ok(plants)
    }

    async fn get_plant_details(&self, plant_id: &str) -> ProviderResult<Plant> {
        let kpi = self
            .call_first(
                "/getStationRealKpi",
                &json!({ "stationCodes": plant_id }),
                "get_plant_details",
            )
            .await?;

        let mut plant = Plant::new(PROVIDER_NAME, plant_id, plant_id);
        plant.meta = plant.meta.with_raw_data();
        if let Some(state) = get_i64(&kpi["dataItemMap"], "real_health_state") {
            plant.meta = plant.meta.with_extra("realHealthState", state.to_string());
        }
        Ok(plant)
    }

    async fn get_devices(&self, plant_id: &str) -> ProviderResult<Vec<Device>> {
        let data = self
            .call(
                "/getDevList",
                &json!({ "stationCodes": plant_id }),
                "get_devices",
            )
            .await?;

        Ok(data
            .as_array()
            .map(|list| list.iter().map(|raw| normalize_device(raw, plant_id)).collect())
            .unwrap_or_default())
    }

    async fn get_device_details(&self, _device_id: &str) -> ProviderResult<Device> {
        Err(ProviderError::not_supported(
            PROVIDER_NAME,
            "get_device_details",
            "use get_devices with the station code",
        ))
    }

    async fn get_realtime_data(&self, device_id: &str) -> ProviderResult<Realtime> {
        // devTypeId 1 is the string inverter
        let kpi = self
            .call_first(
                "/getDevRealKpi",
                &json!({ "devIds": device_id, "devTypeId": 1 }),
                "get_realtime_data",
            )
            .await?;

        Ok(normalize_device_kpi(&kpi["dataItemMap"], device_id))
    }

    async fn get_energy_stats(
        &self,
        plant_id: &str,
        period: Period,
        _date: NaiveDate,
    ) -> ProviderResult<EnergySummary> {
        let kpi = self
            .call_first(
                "/getStationRealKpi",
                &json!({ "stationCodes": plant_id }),
                "get_energy_stats",
            )
            .await?;

        Ok(normalize_station_energy(&kpi["dataItemMap"], plant_id, period))
    }

    async fn get_historical_data(
        &self,
        device_id: &str,
        request: &HistoryRequest,
    ) -> ProviderResult<HistoryResponse> {
        let collect_time = request.start().unwrap_or_else(Utc::now).timestamp_millis();
        let data = self
            .call(
                kpi_endpoint(request.granularity),
                &json!({ "stationCodes": device_id, "collectTime": collect_time }),
                "get_historical_data",
            )
            .await?;

        let points = data
            .as_array()
            .map(|entries| {
                entries
                    .iter()
                    .filter_map(|entry| normalize_history_entry(entry, device_id, request.granularity))
                    .collect()
            })
            .unwrap_or_default();

        let mut request = request.clone();
        device_id.clone_into(&mut request.device_id);
        Ok(HistoryResponse::new(PROVIDER_NAME, &request, points))
    }

    async fn get_alarms(&self, device_id: &str) -> ProviderResult<Vec<Alarm>> {
        let now = Utc::now();
        let mut body = json!({
            "beginTime": (now - Duration::hours(24)).timestamp_millis(),
            "endTime": now.timestamp_millis(),
            "language": "en_US",
        });
        if !device_id.is_empty() {
            body["stationCodes"] = json!(device_id);
        }

        let data = self.call("/getAlarmList", &body, "get_alarms").await?;
        Ok(data
            .as_array()
            .map(|list| list.iter().map(normalize_alarm).collect())
            .unwrap_or_default())
    }

    async fn get_all_alarms(&self) -> ProviderResult<Vec<Alarm>> {
        self.get_alarms("").await
    }

    async fn healthy(&self) -> bool {
        self.client.is_some() && self.session.is_valid()
    }

    fn close(&self) -> ProviderResult<()> {
        self.session.clear();
        if let Some(client) = &self.client {
            client.remove_header("XSRF-TOKEN");
        }
        Ok(())
    }
}

// ============= Normalization =============

fn normalize_station(raw: &Value) -> Plant {
    let code = get_str(raw, "stationCode");
    let mut plant = Plant::new(PROVIDER_NAME, &code, get_str(raw, "stationName"));
    plant.address = get_str(raw, "stationAddr");
    plant.peak_power_kwp = get_f64(raw, "capacity");
    if let (Some(latitude), Some(longitude)) = (get_f64(raw, "latitude"), get_f64(raw, "longitude"))
    {
        plant.location = Some(LatLng {
            latitude,
            longitude,
        });
    }
    plant
}

fn normalize_device(raw: &Value, plant_id: &str) -> Device {
    let device_id = get_str(raw, "id");
    let type_id = get_i64(raw, "devTypeId").unwrap_or_default();

    let mut device = Device::new(PROVIDER_NAME, &device_id, plant_id);
    device.name = get_str(raw, "devName");
    device.serial_number = get_str(raw, "esnCode");
    device.model = get_str(raw, "invType");
    device.device_type = device_type(type_id);
    "Huawei".clone_into(&mut device.manufacturer);
    device.status = DeviceStatus::Unknown;
    device.firmware_info = Some(FirmwareInfo {
        main_version: get_str(raw, "softwareVersion"),
        ..FirmwareInfo::default()
    });
    device.meta = device
        .meta
        .with_extra("devTypeId", type_id.to_string())
        .with_extra("stationCode", get_str(raw, "stationCode"));
    device
}

fn normalize_device_kpi(data: &Value, device_id: &str) -> Realtime {
    let mut rt = Realtime::new(PROVIDER_NAME, device_id);
    rt.status = DeviceStatus::Online;
    rt.operating_mode = OperatingMode::GridConnected;

    let strings = (1..=MAX_PV_STRINGS)
        .filter_map(|i| {
            PvString::from_readings(
                i,
                get_f64(data, &format!("pv{i}_u")),
                get_f64(data, &format!("pv{i}_i")),
                None,
            )
        })
        .collect();

    rt.pv = Some(PvData {
        total_power_w: kilowatts_to_watts(get_f64_or_zero(data, "mppt_power")),
        today_energy_kwh: get_f64(data, "day_cap"),
        total_energy_kwh: get_f64(data, "total_cap"),
        strings,
        ..PvData::default()
    });

    let frequency_hz = get_f64(data, "elec_freq");
    let phases = [("a", "A"), ("b", "B"), ("c", "C")]
        .into_iter()
        .map(|(key, label)| PhaseData {
            phase: label.to_owned(),
            voltage_v: get_f64(data, &format!("{key}_u")),
            current_a: get_f64(data, &format!("{key}_i")),
            frequency_hz,
            ..PhaseData::default()
        })
        .filter(PhaseData::has_readings)
        .collect();

    rt.grid = Some(GridData {
        total_power_w: kilowatts_to_watts(get_f64_or_zero(data, "active_power")),
        direction: GridDirection::Idle,
        frequency_hz,
        power_factor: get_f64(data, "power_factor"),
        phases,
        ..GridData::default()
    });

    rt.environment = Some(EnvironmentData {
        inverter_temperature_c: get_f64(data, "temperature"),
        ..EnvironmentData::default()
    });

    rt
}

fn normalize_station_energy(data: &Value, plant_id: &str, period: Period) -> EnergySummary {
    let mut energy = EnergySummary::new(PROVIDER_NAME, plant_id, period);

    energy.pv_generation_kwh = match period {
        Period::Day => get_f64(data, "day_power"),
        Period::Month => get_f64(data, "month_power"),
        Period::Total => get_f64(data, "total_power"),
        Period::Week | Period::Year => None,
    };
    energy.current_power_w = get_f64(data, "real_power").map(kilowatts_to_watts);
    energy.revenue = match period {
        Period::Day => get_f64(data, "day_income"),
        Period::Total => get_f64(data, "total_income"),
        Period::Week | Period::Month | Period::Year => None,
    };

    fill_derived_metrics(&mut energy);
    energy
}

fn normalize_history_entry(
    entry: &Value,
    device_id: &str,
    granularity: Granularity,
) -> Option<TimeSeriesPoint> {
    let timestamp = get_i64(entry, "collectTime").and_then(from_epoch_millis)?;
    let data = &entry["dataItemMap"];
    let mut point = TimeSeriesPoint::new(PROVIDER_NAME, device_id, timestamp, granularity);

    let pv = get_f64(data, "inverter_power");
    let export = get_f64(data, "ongrid_power");
    let load = get_f64(data, "use_power");

    if granularity.is_power_series() {
        // hourly kWh is the average power over the hour
        point.pv_power_w = pv.map(kilowatts_to_watts);
        point.grid_export_power_w = export.map(kilowatts_to_watts);
        point.load_power_w = load.map(kilowatts_to_watts);
    } else {
        point.pv_energy_kwh = pv;
        point.grid_export_kwh = export;
        point.load_energy_kwh = load;
    }
    Some(point)
}

fn normalize_alarm(raw: &Value) -> Alarm {
    let alarm_id = get_str(raw, "alarmId");
    let esn = get_str(raw, "esnCode");
    let millis = |key| get_i64(raw, key).filter(|ms| *ms > 0).and_then(from_epoch_millis);
    let start: Option<DateTime<Utc>> = millis("raiseTime");

    let mut alarm = Alarm::new(PROVIDER_NAME, &alarm_id, get_str(raw, "alarmName"))
        .on_device(&esn)
        .on_plant(&get_str(raw, "stationCode"))
        .with_window(start, millis("clearTime"));
    alarm.code = alarm_id;
    alarm.severity = alarm_severity(get_i64(raw, "severity"));
    alarm.status = alarm_status(get_i64(raw, "status"));
    alarm.device_serial_number = esn;
    alarm.plant_name = get_str(raw, "stationName");
    alarm
}

// ============= Mapping =============

fn device_type(type_id: i64) -> DeviceType {
    match type_id {
        1 => DeviceType::StringInverter,
        2 => DeviceType::Meter,
        38 => DeviceType::Battery,
        39 => DeviceType::Optimizer,
        46 => DeviceType::Ems,
        47 => DeviceType::Gateway,
        62 => DeviceType::HybridInverter,
        _ => DeviceType::Unknown,
    }
}

fn alarm_severity(level: Option<i64>) -> AlarmSeverity {
    match level {
        Some(1 | 2) => AlarmSeverity::Critical,
        Some(3) => AlarmSeverity::Warning,
        Some(4) => AlarmSeverity::Info,
        Some(_) | None => AlarmSeverity::Unknown,
    }
}

fn alarm_status(status: Option<i64>) -> AlarmStatus {
    match status {
        Some(1) => AlarmStatus::Active,
        Some(2) => AlarmStatus::Resolved,
        Some(_) | None => AlarmStatus::Unknown,
    }
}

fn kpi_endpoint(granularity: Granularity) -> &'static str {
    match granularity {
        Granularity::Minute | Granularity::Hour => "/getKpiStationHour",
        Granularity::Day => "/getKpiStationDay",
        Granularity::Month => "/getKpiStationMonth",
        Granularity::Year => "/getKpiStationYear",
    }
}
