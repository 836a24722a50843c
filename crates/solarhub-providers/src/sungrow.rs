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

//! Sungrow iSolarCloud OpenAPI adapter.
//!
//! Login exchanges `appkey` + account + MD5 password for a token. Every call
//! is a POST whose body repeats `appkey` and `token`; answers carry
//! `result_code` ("1" on success), `result_msg` and `result_data`.

use crate::extract::{first_f64, get_array, get_f64, get_f64_or_zero, get_i64, get_str};
use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use chrono_tz::Tz;
use parking_lot::RwLock;
use serde_json::{Map, Value, json};
use solarhub_core::units::{
    battery_direction_from_power, fill_derived_metrics, grid_direction_from_power,
    parse_local_timestamp,
};
use solarhub_core::{
    Provider, ProviderConfig, ProviderError, ProviderResult, SessionCache, SessionToken,
    VendorHttpClient,
};
use solarhub_types::{
    Alarm, AlarmSeverity, AlarmStatus, BatteryData, Device, DeviceStatus, DeviceType,
    EnergySummary, Granularity, GridData, HistoryRequest, HistoryResponse, LatLng, LoadData,
    OperatingMode, Period, PhaseData, Plant, PvData, PvString, Realtime, TimeSeriesPoint,
};
use std::fmt;
use tracing::{debug, info};

pub const PROVIDER_NAME: &str = "sungrow";
const DEFAULT_BASE_URL: &str = "https://gateway.isolarcloud.com";
const DEFAULT_RPS: f64 = 10.0;
const MAX_MPPT: u32 = 12;
const SUCCESS: &str = "1";
/// result_code for an expired or unknown token
const TOKEN_INVALID: &str = "E00003";
const HISTORY_TIME_FORMAT: &str = "%Y%m%d%H%M%S";
const ALARM_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub struct SungrowProvider {
    client: Option<VendorHttpClient>,
    app_key: String,
    account: String,
    password_md5: String,
    user_id: RwLock<String>,
    session: SessionCache,
    tz: Tz,
}

impl Default for SungrowProvider {
    fn default() -> Self {
        Self {
            client: None,
            app_key: String::new(),
            account: String::new(),
            password_md5: String::new(),
            user_id: RwLock::new(String::new()),
            session: SessionCache::new(),
            tz: Tz::UTC,
        }
    }
}

impl fmt::Debug for SungrowProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SungrowProvider")
            .field("client", &self.client)
            .field("account", &self.account)
            .field("tz", &self.tz)
            .finish_non_exhaustive()
    }
}

/// iSolarCloud expects the hex MD5 of the password, never the plain text
fn hash_password(password: &str) -> String {
    format!("{:x}", md5::compute(password.as_bytes()))
}

impl SungrowProvider {
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
            "appkey": self.app_key,
            "user_account": self.account,
            "user_password": self.password_md5,
        });

        let response: Value = client
            .post_json("/openapi/login", &body)
            .await
            .map_err(|e| e.during(PROVIDER_NAME, "login"))?;

        if get_str(&response, "result_code") != SUCCESS {
            return Err(ProviderError::AuthenticationFailed(format!(
                "{PROVIDER_NAME} login rejected: code={} msg={}",
                get_str(&response, "result_code"),
                get_str(&response, "result_msg")
            )));
        }

        let data = &response["result_data"];
        let token = get_str(data, "token");
        if token.is_empty() {
            return Err(ProviderError::InvalidResponse(format!(
                "{PROVIDER_NAME} login returned no token"
            )));
        }

        client.set_header("token", &token)?;
        *self.user_id.write() = get_str(data, "user_id");

        info!("✅ [SUNGROW] Authenticated as {}", self.account);
        Ok(SessionToken::new(token))
    }

    async fn token(&self) -> ProviderResult<String> {
        self.session
            .get_or_refresh(Duration::zero(), || self.login())
            .await
    }

    /// POST with `appkey`/`token` merged into `params`; unwraps `result_data`
    async fn call(&self, path: &str, params: Value, operation: &str) -> ProviderResult<Value> {
        let client = self.client()?;
        let token = self.token().await?;
        let mut response = self.send(client, path, &params, &token, operation).await?;

        if get_str(&response, "result_code") == TOKEN_INVALID {
            if self.session.invalidate(&token) {
                debug!("🔑 [SUNGROW] Token rejected, logging in again");
            }
            let token = self.token().await?;
            response = self.send(client, path, &params, &token, operation).await?;
        }

        if get_str(&response, "result_code") != SUCCESS {
            return Err(ProviderError::Vendor {
                provider: PROVIDER_NAME.to_owned(),
                code: get_str(&response, "result_code"),
                message: format!("{operation}: {}", get_str(&response, "result_msg")),
            });
        }

        Ok(response.get("result_data").cloned().unwrap_or(Value::Null))
    }

    async fn send(
        &self,
        client: &VendorHttpClient,
        path: &str,
        params: &Value,
        token: &str,
        operation: &str,
    ) -> ProviderResult<Value> {
        let mut body = Map::new();
        body.insert("appkey".to_owned(), json!(self.app_key));
        body.insert("token".to_owned(), json!(token));
        if let Some(extra) = params.as_object() {
            body.extend(extra.clone());
        }

        client
            .post_json(path, &body)
            .await
            .map_err(|e| e.during(PROVIDER_NAME, operation))
    }

    fn user_id(&self) -> String {
        self.user_id.read().clone()
    }

    fn local_time(&self, text: &str, format: &str) -> Option<DateTime<Utc>> {
        parse_local_timestamp(text, format, self.tz)
    }

    fn vendor_time(&self, rfc3339: Option<DateTime<Utc>>, fallback: &str) -> String {
        rfc3339.map_or_else(
            || fallback.to_owned(),
            |t| t.with_timezone(&self.tz).format(HISTORY_TIME_FORMAT).to_string(),
        )
    }
}

#[async_trait]
impl Provider for SungrowProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    async fn initialize(&mut self, config: &ProviderConfig) -> ProviderResult<()> {
        config
            .require_credential(PROVIDER_NAME, "appKey")?
            .clone_into(&mut self.app_key);
        config
            .require_credential(PROVIDER_NAME, "userAccount")?
            .clone_into(&mut self.account);
        self.password_md5 = hash_password(config.require_credential(PROVIDER_NAME, "userPassword")?);
        self.tz = config.timezone_or_utc();

        let client =
            VendorHttpClient::from_config(PROVIDER_NAME, config, DEFAULT_BASE_URL, DEFAULT_RPS)?;
        self.client = Some(client);
        self.session.clear();

        self.token().await.map(|_| ())
    }

    async fn get_plants(&self) -> ProviderResult<Vec<Plant>> {
        self.token().await?;
        let data = self
            .call(
                "/openapi/getPowerStationList",
                json!({ "user_id": self.user_id() }),
                "get_plants",
            )
            .await?;

        Ok(get_array(&data, "pageList").iter().map(normalize_plant).collect())
    }

    async fn get_plant_details(&self, plant_id: &str) -> ProviderResult<Plant> {
        let data = self
            .call(
                "/openapi/getPowerStationDetail",
                json!({ "ps_id": plant_id }),
                "get_plant_details",
            )
            .await?;

        let mut plant = normalize_plant(&data);
        if plant.meta.provider_plant_id.is_empty() {
            plant = Plant::new(PROVIDER_NAME, plant_id, plant.name);
        }
        plant.meta = plant.meta.with_raw_data();
        Ok(plant)
    }

    async fn get_devices(&self, plant_id: &str) -> ProviderResult<Vec<Device>> {
        let data = self
            .call(
                "/openapi/getDeviceList",
                json!({ "ps_id": plant_id }),
                "get_devices",
            )
            .await?;

        Ok(get_array(&data, "pageList")
            .iter()
            .map(|raw| normalize_device(raw, plant_id))
            .collect())
    }

    async fn get_device_details(&self, _device_id: &str) -> ProviderResult<Device> {
        Err(ProviderError::not_supported(
            PROVIDER_NAME,
            "get_device_details",
            "use get_devices with the ps_id",
        ))
    }

    async fn get_realtime_data(&self, device_id: &str) -> ProviderResult<Realtime> {
        let data = self
            .call(
                "/openapi/queryDeviceRealTimeData",
                json!({ "device_id": device_id }),
                "get_realtime_data",
            )
            .await?;

        Ok(normalize_realtime(&data, device_id))
    }

    async fn get_energy_stats(
        &self,
        plant_id: &str,
        period: Period,
        _date: NaiveDate,
    ) -> ProviderResult<EnergySummary> {
        let data = self
            .call(
                "/openapi/getPowerStationDetail",
                json!({ "ps_id": plant_id }),
                "get_energy_stats",
            )
            .await?;

        Ok(normalize_energy(&data, plant_id, period))
    }

    async fn get_historical_data(
        &self,
        device_id: &str,
        request: &HistoryRequest,
    ) -> ProviderResult<HistoryResponse> {
        let data = self
            .call(
                "/openapi/queryDeviceHistoryData",
                json!({
                    "device_id": device_id,
                    "start_time": self.vendor_time(request.start(), &request.start_time),
                    "end_time": self.vendor_time(request.end(), &request.end_time),
                    "time_type": time_type(request.granularity),
                }),
                "get_historical_data",
            )
            .await?;

        let points = get_array(&data, "data_list")
            .iter()
            .filter_map(|raw| {
                let timestamp = self.local_time(&get_str(raw, "time_stamp"), HISTORY_TIME_FORMAT)?;
                let mut point =
                    TimeSeriesPoint::new(PROVIDER_NAME, device_id, timestamp, request.granularity);
                point.pv_power_w = get_f64(raw, "pac");
                point.pv_energy_kwh = get_f64(raw, "e_day");
                point.grid_power_w = get_f64(raw, "meter_power");
                Some(point)
            })
            .collect();

        let mut request = request.clone();
        device_id.clone_into(&mut request.device_id);
        Ok(HistoryResponse::new(PROVIDER_NAME, &request, points))
    }

    async fn get_alarms(&self, device_id: &str) -> ProviderResult<Vec<Alarm>> {
        let data = self
            .call(
                "/openapi/getAlarmList",
                json!({ "device_id": device_id }),
                "get_alarms",
            )
            .await?;

        Ok(get_array(&data, "pageList")
            .iter()
            .map(|raw| self.normalize_alarm(raw))
            .collect())
    }

    async fn get_all_alarms(&self) -> ProviderResult<Vec<Alarm>> {
        self.token().await?;
        let data = self
            .call(
                "/openapi/getAlarmList",
                json!({ "user_id": self.user_id() }),
                "get_all_alarms",
            )
            .await?;

        Ok(get_array(&data, "pageList")
            .iter()
            .map(|raw| self.normalize_alarm(raw))
            .collect())
    }

    async fn healthy(&self) -> bool {
        self.client.is_some() && self.session.is_valid()
    }

    fn close(&self) -> ProviderResult<()> {
        self.session.clear();
        if let Some(client) = &self.client {
            client.remove_header("token");
        }
        Ok(())
    }
}

// ============= Normalization =============

fn normalize_plant(raw: &Value) -> Plant {
    let mut plant = Plant::new(PROVIDER_NAME, &get_str(raw, "ps_id"), get_str(raw, "ps_name"));
    plant.address = get_str(raw, "ps_location");
    plant.peak_power_kwp = get_f64(raw, "design_capacity");
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
    let type_code = get_i64(raw, "device_type").unwrap_or_default();
    let status_code = get_i64(raw, "device_status");

    let mut device = Device::new(PROVIDER_NAME, &get_str(raw, "device_id"), plant_id);
    device.name = get_str(raw, "device_name");
    device.serial_number = get_str(raw, "device_sn");
    device.model = get_str(raw, "device_model_code");
    device.device_type = device_type(type_code);
    "Sungrow".clone_into(&mut device.manufacturer);
    device.status = device_status(status_code);
    device.is_online = status_code == Some(1);
    device.meta = device.meta.with_extra("deviceType", type_code.to_string());
    device
}

fn normalize_realtime(data: &Value, device_id: &str) -> Realtime {
    let mut rt = Realtime::new(PROVIDER_NAME, device_id);
    rt.status = DeviceStatus::Online;
    rt.operating_mode = OperatingMode::GridConnected;

    let strings = (1..=MAX_MPPT)
        .filter_map(|i| {
            PvString::from_readings(
                i,
                get_f64(data, &format!("mppt_{i}_cap_u")),
                get_f64(data, &format!("mppt_{i}_cap_i")),
                None,
            )
        })
        .collect();

    // total_dc_power is missing on older firmware; AC output is the closest stand-in
    let pv_power = first_f64(data, &["total_dc_power", "pac"]).unwrap_or_default();
    rt.pv = Some(PvData {
        total_power_w: pv_power,
        today_energy_kwh: get_f64(data, "e_today"),
        total_energy_kwh: get_f64(data, "e_total"),
        strings,
        ..PvData::default()
    });

    let frequency_hz = get_f64(data, "fac");
    let phases = [("ua", "ia", "A"), ("ub", "ib", "B"), ("uc", "ic", "C")]
        .into_iter()
        .map(|(v, i, label)| PhaseData {
            phase: label.to_owned(),
            voltage_v: get_f64(data, v),
            current_a: get_f64(data, i),
            frequency_hz,
            ..PhaseData::default()
        })
        .filter(PhaseData::has_readings)
        .collect();

    let grid_power = get_f64_or_zero(data, "meter_power");
    rt.grid = Some(GridData {
        total_power_w: grid_power,
        direction: grid_direction_from_power(grid_power),
        frequency_hz,
        power_factor: get_f64(data, "pf"),
        phases,
        ..GridData::default()
    });

    let battery_power = get_f64_or_zero(data, "battery_power");
    rt.battery = Some(BatteryData {
        soc_percent: get_f64(data, "soc"),
        power_w: battery_power,
        direction: battery_direction_from_power(battery_power),
        ..BatteryData::default()
    });

    rt.load = Some(LoadData {
        total_power_w: get_f64_or_zero(data, "load_power"),
        ..LoadData::default()
    });

    rt
}

fn normalize_energy(data: &Value, plant_id: &str, period: Period) -> EnergySummary {
    let mut energy = EnergySummary::new(PROVIDER_NAME, plant_id, period);
    energy.pv_generation_kwh = match period {
        Period::Day => get_f64(data, "today_energy"),
        Period::Month => get_f64(data, "month_energy"),
        Period::Year => get_f64(data, "year_energy"),
        Period::Total => get_f64(data, "total_energy"),
        Period::Week => None,
    };
    energy.current_power_w = get_f64(data, "curr_power");
    fill_derived_metrics(&mut energy);
    energy
}

impl SungrowProvider {
    fn normalize_alarm(&self, raw: &Value) -> Alarm {
        let alarm_id = get_str(raw, "alarm_id");
        let sn = get_str(raw, "device_sn");
        let start = self.local_time(&get_str(raw, "start_time"), ALARM_TIME_FORMAT);
        let end = self.local_time(&get_str(raw, "end_time"), ALARM_TIME_FORMAT);

        let mut alarm = Alarm::new(PROVIDER_NAME, &alarm_id, get_str(raw, "alarm_name"))
            .on_device(&sn)
            .on_plant(&get_str(raw, "ps_id"))
            .with_window(start, end);
        alarm.code = alarm_id;
        alarm.severity = alarm_severity(get_i64(raw, "alarm_level"));
        alarm.status = alarm_status(get_i64(raw, "alarm_status"));
        alarm.device_serial_number = sn;
        alarm.plant_name = get_str(raw, "ps_name");
        alarm
    }
}

// ============= Mapping =============

fn device_type(code: i64) -> DeviceType {
    match code {
        1 => DeviceType::StringInverter,
        // combiner box
        2 => DeviceType::Optimizer,
        3 => DeviceType::Meter,
        4 => DeviceType::WeatherStation,
        5 => DeviceType::Gateway,
        7 => DeviceType::Battery,
        11 => DeviceType::HybridInverter,
        14 => DeviceType::Ems,
        _ => DeviceType::Unknown,
    }
}

fn device_status(code: Option<i64>) -> DeviceStatus {
    match code {
        Some(0) => DeviceStatus::Offline,
        Some(1) => DeviceStatus::Online,
        Some(_) | None => DeviceStatus::Unknown,
    }
}

fn alarm_severity(level: Option<i64>) -> AlarmSeverity {
    match level {
        Some(1) => AlarmSeverity::Info,
        Some(2) => AlarmSeverity::Warning,
        Some(3) => AlarmSeverity::Critical,
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

fn time_type(granularity: Granularity) -> u8 {
    match granularity {
        Granularity::Minute | Granularity::Hour => 1,
        Granularity::Day => 2,
        Granularity::Month => 3,
        Granularity::Year => 4,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server, ServerGuard};
    use solarhub_types::{EnergyDirection, GridDirection};

    async fn login_mock(server: &mut ServerGuard) -> mockito::Mock {
        server
            .mock("POST", "/openapi/login")
            .match_body(Matcher::Json(json!({
                "appkey": "APPKEY",
                "user_account": "owner@example.com",
                "user_password": "5f4dcc3b5aa765d61d8327deb882cf99",
            })))
            .with_status(200)
            .with_body(
                json!({"result_code": "1", "result_data": {"token": "tok-1", "user_id": "77"}})
                    .to_string(),
            )
            .create_async()
            .await
    }

    fn config(server: &ServerGuard) -> ProviderConfig {
        let mut config = ProviderConfig::new(PROVIDER_NAME)
            .with_base_url(&server.url())
            .with_credential("appKey", "APPKEY")
            .with_credential("userAccount", "owner@example.com")
            .with_credential("userPassword", "password");
        config.timezone = Some("Asia/Shanghai".to_owned());
        config
    }

    async fn provider(server: &ServerGuard) -> SungrowProvider {
        let mut provider = SungrowProvider::new();
        provider.initialize(&config(server)).await.unwrap();
        provider
    }

    #[test]
    fn test_password_is_md5_hex() {
        assert_eq!(hash_password("password"), "5f4dcc3b5aa765d61d8327deb882cf99");
    }

    #[tokio::test]
    async fn test_login_failure_is_auth_error() {
        let mut server = Server::new_async().await;
        let _login = server
            .mock("POST", "/openapi/login")
            .with_status(200)
            .with_body(json!({"result_code": "0", "result_msg": "wrong password"}).to_string())
            .create_async()
            .await;

        let mut provider = SungrowProvider::new();
        let err = provider.initialize(&config(&server)).await.unwrap_err();
        assert!(err.is_auth_failure());
        assert!(err.to_string().contains("wrong password"));
    }

    #[tokio::test]
    async fn test_missing_password_fails_fast() {
        let mut provider = SungrowProvider::new();
        let config = ProviderConfig::new(PROVIDER_NAME)
            .with_credential("appKey", "k")
            .with_credential("userAccount", "a");
        let err = provider.initialize(&config).await.unwrap_err();
        assert!(matches!(err, ProviderError::MissingCredential { ref key, .. } if key == "userPassword"));
    }

    #[tokio::test]
    async fn test_plants_sent_with_token_and_user() {
        let mut server = Server::new_async().await;
        let login = login_mock(&mut server).await;
        let plants = server
            .mock("POST", "/openapi/getPowerStationList")
            .match_header("token", "tok-1")
            .match_body(Matcher::Json(json!({"appkey": "APPKEY", "token": "tok-1", "user_id": "77"})))
            .with_status(200)
            .with_body(
                json!({"result_code": "1", "result_data": {"pageList": [
                    {"ps_id": "5001", "ps_name": "Farm", "ps_location": "Hefei", "latitude": "31.8", "longitude": "117.2", "design_capacity": "49.5"}
                ]}})
                .to_string(),
            )
            .create_async()
            .await;

        let provider = provider(&server).await;
        let result = provider.get_plants().await.unwrap();

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].id, "sungrow_5001");
        assert_eq!(result[0].peak_power_kwp, Some(49.5));
        assert_eq!(result[0].location.as_ref().unwrap().longitude, 117.2);
        login.assert_async().await;
        plants.assert_async().await;
    }

    #[tokio::test]
    async fn test_expired_token_logs_in_again() {
        let mut server = Server::new_async().await;
        let login = server
            .mock("POST", "/openapi/login")
            .with_status(200)
            .with_body(json!({"result_code": "1", "result_data": {"token": "tok-1", "user_id": "77"}}).to_string())
            .expect(2)
            .create_async()
            .await;
        let _expired = server
            .mock("POST", "/openapi/getDeviceList")
            .with_status(200)
            .with_body(json!({"result_code": "E00003", "result_msg": "token invalid"}).to_string())
            .expect(1)
            .create_async()
            .await;

        let provider = provider(&server).await;
        let _ok = server
            .mock("POST", "/openapi/getDeviceList")
            .with_status(200)
            .with_body(json!({"result_code": "1", "result_data": {"pageList": []}}).to_string())
            .create_async()
            .await;

        let devices = provider.get_devices("5001").await.unwrap();
        assert!(devices.is_empty());
        login.assert_async().await;
    }

    #[tokio::test]
    async fn test_devices_map_types_and_status() {
        let mut server = Server::new_async().await;
        let _login = login_mock(&mut server).await;
        let _devices = server
            .mock("POST", "/openapi/getDeviceList")
            .match_body(Matcher::PartialJson(json!({"ps_id": "5001"})))
            .with_status(200)
            .with_body(
                json!({"result_code": "1", "result_data": {"pageList": [
                    {"device_id": "d1", "device_name": "SG10RT", "device_type": 1, "device_sn": "A1", "device_status": 1},
                    {"device_id": "d2", "device_type": "7", "device_status": 0},
                    {"device_id": "d3", "device_type": 42}
                ]}})
                .to_string(),
            )
            .create_async()
            .await;

        let devices = provider(&server).await.get_devices("5001").await.unwrap();
        assert_eq!(devices[0].id, "sungrow_d1");
        assert_eq!(devices[0].plant_id, "sungrow_5001");
        assert_eq!(devices[0].device_type, DeviceType::StringInverter);
        assert!(devices[0].is_online);
        assert_eq!(devices[1].device_type, DeviceType::Battery);
        assert_eq!(devices[1].status, DeviceStatus::Offline);
        assert_eq!(devices[2].device_type, DeviceType::Unknown);
        assert_eq!(devices[2].status, DeviceStatus::Unknown);
    }

    #[test]
    fn test_realtime_directions_from_sign() {
        let data = json!({
            "pac": "5200", "e_today": 21.4,
            "mppt_1_cap_u": 600.0, "mppt_1_cap_i": 4.5,
            "meter_power": -1800.0, "battery_power": 900.0, "soc": 64.0,
            "ua": 231.0, "ia": 7.5, "fac": 50.0, "load_power": 2500.0
        });

        let rt = normalize_realtime(&data, "d1");
        let pv = rt.pv.unwrap();
        assert_eq!(pv.total_power_w, 5200.0);
        assert_eq!(pv.strings[0].power_w, Some(2700.0));

        let grid = rt.grid.unwrap();
        assert_eq!(grid.direction, GridDirection::Exporting);
        assert_eq!(grid.phases.len(), 1);

        let battery = rt.battery.unwrap();
        assert_eq!(battery.direction, EnergyDirection::Charging);
        assert_eq!(battery.soc_percent, Some(64.0));
        assert_eq!(rt.load.unwrap().total_power_w, 2500.0);
    }

    #[tokio::test]
    async fn test_history_parses_local_timestamps() {
        let mut server = Server::new_async().await;
        let _login = login_mock(&mut server).await;
        let _history = server
            .mock("POST", "/openapi/queryDeviceHistoryData")
            .match_body(Matcher::PartialJson(json!({
                "start_time": "20240601080000",
                "time_type": 2,
            })))
            .with_status(200)
            .with_body(
                json!({"result_code": "1", "result_data": {"data_list": [
                    {"time_stamp": "20240601120000", "pac": 3000, "e_day": "12.5"},
                    {"time_stamp": "garbage", "pac": 1}
                ]}})
                .to_string(),
            )
            .create_async()
            .await;

        let request = HistoryRequest::new(
            "d1",
            "2024-06-01T00:00:00Z",
            "2024-06-02T00:00:00Z",
            Granularity::Day,
        );
        let history = provider(&server)
            .await
            .get_historical_data("d1", &request)
            .await
            .unwrap();

        assert_eq!(history.device_id, "sungrow_d1");
        assert_eq!(history.total_points, 1);
        let point = &history.data_points[0];
        assert_eq!(point.timestamp.to_rfc3339(), "2024-06-01T04:00:00+00:00");
        assert_eq!(point.pv_energy_kwh, Some(12.5));
    }

    #[tokio::test]
    async fn test_alarm_levels() {
        let mut server = Server::new_async().await;
        let _login = login_mock(&mut server).await;
        let _alarms = server
            .mock("POST", "/openapi/getAlarmList")
            .match_body(Matcher::PartialJson(json!({"user_id": "77"})))
            .with_status(200)
            .with_body(
                json!({"result_code": "1", "result_data": {"pageList": [
                    {"alarm_id": "9", "alarm_name": "Grid overvoltage", "alarm_level": 3, "alarm_status": 1,
                     "device_sn": "A1", "ps_id": "5001", "start_time": "2024-06-01 10:00:00"},
                    {"alarm_id": "10", "alarm_level": 1, "alarm_status": 2,
                     "start_time": "2024-06-01 10:00:00", "end_time": "2024-06-01 10:05:00"}
                ]}})
                .to_string(),
            )
            .create_async()
            .await;

        let alarms = provider(&server).await.get_all_alarms().await.unwrap();
        assert_eq!(alarms[0].id, "sungrow_alarm_9");
        assert_eq!(alarms[0].severity, AlarmSeverity::Critical);
        assert_eq!(alarms[0].plant_id, "sungrow_5001");
        assert!(alarms[0].is_active());
        assert_eq!(alarms[1].severity, AlarmSeverity::Info);
        assert_eq!(alarms[1].status, AlarmStatus::Resolved);
        assert_eq!(alarms[1].duration, Some(300));
    }
}
