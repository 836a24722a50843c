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

//! SAJ Elekeeper open platform adapter.
//!
//! Uses a short-lived `accessToken` header obtained from `appId`/`appSecret`.
//! Timestamps in responses are wall-clock times in the plant timezone.

use crate::extract::{first_f64, get_array, get_f64, get_f64_or_zero, get_i64, get_str, non_empty};
use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use chrono_tz::Tz;
use serde_json::Value;
use solarhub_core::units::{fill_derived_metrics, parse_local_timestamp};
use solarhub_core::{
    Provider, ProviderConfig, ProviderError, ProviderResult, SessionCache, SessionToken,
    VendorHttpClient,
};
use solarhub_types::{
    Alarm, AlarmSeverity, AlarmStatus, BatteryData, Device, DeviceStatus, DeviceType,
    EnergyDirection, EnergySummary, EnvironmentData, FirmwareInfo, Granularity, GridConnectionType,
    GridData, GridDirection, HistoryRequest, HistoryResponse, LatLng, LoadData, OperatingMode,
    Period, PhaseData, Plant, PlantType, PvData, PvString, Realtime, TimeSeriesAggregate,
    TimeSeriesPoint,
};
use std::fmt;
use tracing::{debug, info, warn};

pub const PROVIDER_NAME: &str = "saj";
const DEFAULT_BASE_URL: &str = "https://intl-developer.saj-electric.com/prod-api";
const DEFAULT_RPS: f64 = 5.0;
const PLANT_PAGE_SIZE: i64 = 100;
const MAX_PV_STRINGS: u32 = 16;
const SUCCESS: i64 = 200;
const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Refresh the access token this long before it expires
fn refresh_margin() -> Duration {
    Duration::minutes(5)
}

pub struct SajProvider {
    client: Option<VendorHttpClient>,
    app_id: String,
    app_secret: String,
    session: SessionCache,
    tz: Tz,
}

impl Default for SajProvider {
    fn default() -> Self {
        Self {
            client: None,
            app_id: String::new(),
            app_secret: String::new(),
            session: SessionCache::new(),
            tz: Tz::UTC,
        }
    }
}

impl fmt::Debug for SajProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SajProvider")
            .field("client", &self.client)
            .field("app_id", &self.app_id)
            .field("tz", &self.tz)
            .finish_non_exhaustive()
    }
}

impl SajProvider {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn client(&self) -> ProviderResult<&VendorHttpClient> {
        self.client.as_ref().ok_or_else(|| {
            ProviderError::Config(format!("{PROVIDER_NAME} provider is not initialized"))
        })
    }

    async fn fetch_token(&self) -> ProviderResult<SessionToken> {
        let client = self.client()?;
        let response: Value = client
            .get_json(
                "/open/api/access_token",
                &[
                    ("appId", self.app_id.clone()),
                    ("appSecret", self.app_secret.clone()),
                ],
            )
            .await
            .map_err(|e| e.during(PROVIDER_NAME, "access_token"))?;

        if get_i64(&response, "code") != Some(SUCCESS) {
            return Err(ProviderError::AuthenticationFailed(format!(
                "{PROVIDER_NAME} token request rejected: code={} msg={}",
                get_str(&response, "code"),
                get_str(&response, "msg")
            )));
        }

        let data = &response["data"];
        let token = get_str(data, "access_token");
        if token.is_empty() {
            return Err(ProviderError::InvalidResponse(format!(
                "{PROVIDER_NAME} token response has no access_token"
            )));
        }
        let expires = get_i64(data, "expires").unwrap_or_default();

        client.set_header("accessToken", &token)?;
        info!("✅ [SAJ] Access token issued, valid for {}s", expires);
        Ok(SessionToken::expiring_in(token, Duration::seconds(expires)))
    }

    async fn ensure_token(&self) -> ProviderResult<()> {
        self.session
            .get_or_refresh(refresh_margin(), || self.fetch_token())
            .await?;
        Ok(())
    }

    /// Authenticated GET returning the whole envelope after checking its status
    async fn get(
        &self,
        path: &str,
        query: &[(&str, String)],
        operation: &str,
    ) -> ProviderResult<Value> {
        self.ensure_token().await?;
        let response: Value = self
            .client()?
            .get_json(path, query)
            .await
            .map_err(|e| e.during(PROVIDER_NAME, operation))?;

        check_envelope(&response, operation)?;
        Ok(response)
    }

    fn local_time(&self, text: &str) -> Option<DateTime<Utc>> {
        parse_local_timestamp(text, TIME_FORMAT, self.tz)
    }

    fn vendor_time(&self, utc: Option<DateTime<Utc>>, fallback: &str) -> String {
        utc.map_or_else(
            || fallback.to_owned(),
            |t| t.with_timezone(&self.tz).format(TIME_FORMAT).to_string(),
        )
    }

    fn normalize_realtime(&self, data: &Value, device_id: &str) -> Realtime {
        let sn = non_empty(get_str(data, "deviceSn")).unwrap_or_else(|| device_id.to_owned());
        let mut rt = Realtime::new(PROVIDER_NAME, &sn);

        let data_time = get_str(data, "dataTime");
        if let Some(ts) = self.local_time(&data_time) {
            rt.timestamp = ts;
        }
        rt.original_timestamp = data_time;
        self.tz.name().clone_into(&mut rt.original_timezone);

        rt.status = if get_str(data, "isOnline") == "1" {
            DeviceStatus::Online
        } else {
            DeviceStatus::Offline
        };
        rt.operating_mode = operating_mode(get_i64(data, "mpvMode"));

        let strings = (1..=MAX_PV_STRINGS)
            .filter_map(|i| {
                PvString::from_readings(
                    i,
                    get_f64(data, &format!("pv{i}volt")),
                    get_f64(data, &format!("pv{i}curr")),
                    get_f64(data, &format!("pv{i}power")),
                )
            })
            .collect();

        rt.pv = Some(PvData {
            total_power_w: get_f64_or_zero(data, "totalPVPower"),
            today_energy_kwh: get_f64(data, "todayPvEnergy"),
            total_energy_kwh: get_f64(data, "totalPvEnergy"),
            strings,
            ..PvData::default()
        });

        rt.battery = Some(BatteryData {
            soc_percent: get_f64(data, "batEnergyPercent"),
            power_w: get_f64_or_zero(data, "totalBatteryPower"),
            direction: battery_direction(get_i64(data, "batteryDirection")),
            temperature_c: get_f64(data, "batTempC"),
            today_charge_kwh: get_f64(data, "todayBatChgEnergy"),
            today_discharge_kwh: get_f64(data, "todayBatDisEnergy"),
            total_charge_kwh: get_f64(data, "totalBatChgEnergy"),
            total_discharge_kwh: get_f64(data, "totalBatDisEnergy"),
            ..BatteryData::default()
        });

        let phases = [("r", "A"), ("s", "B"), ("t", "C")]
            .into_iter()
            .map(|(prefix, label)| PhaseData {
                phase: label.to_owned(),
                voltage_v: get_f64(data, &format!("{prefix}GridVolt")),
                current_a: get_f64(data, &format!("{prefix}GridCurr")),
                power_w: get_f64(data, &format!("{prefix}GridPowerWatt")),
                frequency_hz: get_f64(data, &format!("{prefix}GridFreq")),
                ..PhaseData::default()
            })
            .filter(PhaseData::has_readings)
            .collect();

        // sellEnergy is export, feedIn is what the vendor calls grid import
        rt.grid = Some(GridData {
            total_power_w: nonzero_first(data, &["totalGridPowerWatt", "sysGridPowerWatt"]),
            direction: grid_direction(get_i64(data, "gridDirection")),
            today_import_kwh: get_f64(data, "todayFeedInEnergy"),
            today_export_kwh: get_f64(data, "todaySellEnergy"),
            total_import_kwh: get_f64(data, "totalFeedInEnergy"),
            total_export_kwh: get_f64(data, "totalSellEnergy"),
            phases,
            ..GridData::default()
        });

        rt.load = Some(LoadData {
            total_power_w: nonzero_first(data, &["totalLoadPowerWatt", "sysTotalLoadWatt"]),
            today_energy_kwh: get_f64(data, "todayLoadEnergy"),
            total_energy_kwh: get_f64(data, "totalTotalLoadEnergy"),
            ..LoadData::default()
        });

        rt.environment = Some(EnvironmentData {
            inverter_temperature_c: get_f64(data, "invTempC"),
            ambient_temperature_c: get_f64(data, "ambTempC"),
            sink_temperature_c: get_f64(data, "sinkTempC"),
            signal_strength_dbm: get_i64(data, "linkSignal").and_then(|s| i32::try_from(s).ok()),
            ..EnvironmentData::default()
        });

        rt
    }

    fn normalize_history_point(
        &self,
        raw: &Value,
        device_id: &str,
        granularity: Granularity,
    ) -> Option<TimeSeriesPoint> {
        let timestamp = self.local_time(&get_str(raw, "dataTime"))?;
        let mut point = TimeSeriesPoint::new(PROVIDER_NAME, device_id, timestamp, granularity);

        if granularity == Granularity::Minute {
            point.pv_power_w = get_f64(raw, "pvPower");
            point.load_power_w = get_f64(raw, "loadPower");
            point.grid_import_power_w = get_f64(raw, "buyPower");
            point.grid_export_power_w = get_f64(raw, "sellPower");
            point.self_use_power_w = get_f64(raw, "selfUsePower");
            point.battery_soc = get_f64(raw, "batterySOC");

            match (get_f64(raw, "chargePower"), get_f64(raw, "dischargePower")) {
                (Some(charge), _) if charge > 0.0 => {
                    point.battery_power_w = Some(charge);
                    point.battery_direction = Some(EnergyDirection::Charging);
                }
                (_, Some(discharge)) if discharge > 0.0 => {
                    point.battery_power_w = Some(-discharge);
                    point.battery_direction = Some(EnergyDirection::Discharging);
                }
                (Some(_), _) | (_, Some(_)) => {
                    point.battery_power_w = Some(0.0);
                    point.battery_direction = Some(EnergyDirection::Idle);
                }
                (None, None) => {}
            }
        } else {
            // the vendor spells this key both ways depending on device family
            point.pv_energy_kwh = first_f64(raw, &["pVEnergy", "pvEnergy"]);
            point.load_energy_kwh = get_f64(raw, "loadEnergy");
            point.grid_import_kwh = get_f64(raw, "buyEnergy");
            point.grid_export_kwh = get_f64(raw, "sellEnergy");
            point.self_consumption_kwh = get_f64(raw, "selfConsumption");
        }
        Some(point)
    }

    fn normalize_alarm(&self, raw: &Value) -> Alarm {
        let sn = get_str(raw, "deviceSn");
        let code = get_str(raw, "alarmCode");

        let mut alarm = Alarm::new(PROVIDER_NAME, &format!("{sn}_{code}"), get_str(raw, "alarmName"))
            .on_device(&sn)
            .with_window(self.local_time(&get_str(raw, "alarmTime")), None);
        alarm.code = code;
        alarm.severity = alarm_severity(get_i64(raw, "alarmLevel"));
        alarm.status = alarm_status(get_i64(raw, "status"));
        alarm.device_serial_number = sn;
        alarm
    }
}

#[async_trait]
impl Provider for SajProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    async fn initialize(&mut self, config: &ProviderConfig) -> ProviderResult<()> {
        config
            .require_credential(PROVIDER_NAME, "appId")?
            .clone_into(&mut self.app_id);
        config
            .require_credential(PROVIDER_NAME, "appSecret")?
            .clone_into(&mut self.app_secret);
        self.tz = config.timezone_or_utc();

        let client =
            VendorHttpClient::from_config(PROVIDER_NAME, config, DEFAULT_BASE_URL, DEFAULT_RPS)?;
        client.set_header("content-language", "en_US")?;
        self.client = Some(client);
        self.session.clear();

        self.ensure_token().await
    }

    async fn get_plants(&self) -> ProviderResult<Vec<Plant>> {
        let mut plants = Vec::new();
        let mut page: i64 = 1;

        loop {
            let response = self
                .get(
                    "/open/api/developer/plant/page",
                    &[
                        ("appId", self.app_id.clone()),
                        ("pageSize", PLANT_PAGE_SIZE.to_string()),
                        ("pageNum", page.to_string()),
                    ],
                    "get_plants",
                )
                .await?;

            let rows = get_array(&response, "rows");
            plants.extend(rows.iter().map(normalize_plant_row));

            let total_pages = get_i64(&response, "totalPage").unwrap_or_default();
            if page >= total_pages || rows.is_empty() {
                break;
            }
            page += 1;
        }

        debug!("✅ [SAJ] {} plants", plants.len());
        Ok(plants)
    }

    async fn get_plant_details(&self, plant_id: &str) -> ProviderResult<Plant> {
        let response = self
            .get(
                "/open/api/plant/details",
                &[("plantId", plant_id.to_owned())],
                "get_plant_details",
            )
            .await?;

        Ok(normalize_plant_details(&response["data"], plant_id))
    }

    async fn get_devices(&self, plant_id: &str) -> ProviderResult<Vec<Device>> {
        let response = self
            .get(
                "/open/api/plant/getPlantAllDeviceList",
                &[("plantId", plant_id.to_owned()), ("userId", String::new())],
                "get_devices",
            )
            .await?;

        Ok(get_array(&response, "data")
            .iter()
            .filter_map(|raw| {
                let device = normalize_device(raw, plant_id);
                if device.is_none() {
                    warn!(
                        "⚠️ [SAJ] Skipping device without serial number in plant {} (type {:?})",
                        plant_id,
                        get_i64(raw, "deviceType")
                    );
                }
                device
            })
            .collect())
    }

    async fn get_device_details(&self, device_id: &str) -> ProviderResult<Device> {
        let response = self
            .get(
                "/open/api/device/baseinfo",
                &[("deviceSn", device_id.to_owned())],
                "get_device_details",
            )
            .await?;

        Ok(normalize_base_info(&response["data"], device_id))
    }

    async fn get_realtime_data(&self, device_id: &str) -> ProviderResult<Realtime> {
        let response = self
            .get(
                "/open/api/device/realtimeDataCommon",
                &[("deviceSn", device_id.to_owned())],
                "get_realtime_data",
            )
            .await?;

        let data = &response["data"];
        if !data.is_object() {
            return Err(ProviderError::no_data(PROVIDER_NAME, "get_realtime_data"));
        }
        Ok(self.normalize_realtime(data, device_id))
    }

    async fn get_energy_stats(
        &self,
        plant_id: &str,
        period: Period,
        date: NaiveDate,
    ) -> ProviderResult<EnergySummary> {
        let client_date = date
            .and_hms_opt(12, 0, 0)
            .map(|t| t.format(TIME_FORMAT).to_string())
            .unwrap_or_default();

        let response = self
            .get(
                "/open/api/plant/getPlantStatisticsData",
                &[("plantId", plant_id.to_owned()), ("clientDate", client_date)],
                "get_energy_stats",
            )
            .await?;

        Ok(normalize_plant_stats(&response["data"], plant_id, period))
    }

    async fn get_historical_data(
        &self,
        device_id: &str,
        request: &HistoryRequest,
    ) -> ProviderResult<HistoryResponse> {
        let response = self
            .get(
                "/open/api/device/uploadData",
                &[
                    ("deviceSn", device_id.to_owned()),
                    ("startTime", self.vendor_time(request.start(), &request.start_time)),
                    ("endTime", self.vendor_time(request.end(), &request.end_time)),
                    ("timeUnit", time_unit(request.granularity).to_string()),
                ],
                "get_historical_data",
            )
            .await?;

        let data = &response["data"];
        let points = get_array(data, "data")
            .iter()
            .filter_map(|raw| self.normalize_history_point(raw, device_id, request.granularity))
            .collect();

        let mut request = request.clone();
        device_id.clone_into(&mut request.device_id);
        let mut history = HistoryResponse::new(PROVIDER_NAME, &request, points);

        let total = &data["total"];
        if total.is_object() {
            history.aggregate = Some(TimeSeriesAggregate {
                total_pv_energy_kwh: get_f64(total, "totalPVEnergy"),
                total_load_energy_kwh: get_f64(total, "totalLoad"),
                total_grid_import_kwh: get_f64(total, "totalBuyEnergy"),
                total_grid_export_kwh: get_f64(total, "totalSellEnergy"),
                self_consumption_rate: get_f64(total, "pvSelfConsumedRate"),
                ..TimeSeriesAggregate::default()
            });
        }
        Ok(history)
    }

    async fn get_alarms(&self, device_id: &str) -> ProviderResult<Vec<Alarm>> {
        let response = self
            .get(
                "/open/api/device/alarmList",
                &[("deviceSn", device_id.to_owned()), ("status", "1,4".to_owned())],
                "get_alarms",
            )
            .await?;

        Ok(get_array(&response, "data")
            .iter()
            .map(|raw| self.normalize_alarm(raw))
            .collect())
    }

    async fn get_all_alarms(&self) -> ProviderResult<Vec<Alarm>> {
        let response = self
            .get(
                "/open/api/device/alarmList",
                &[("appId", self.app_id.clone()), ("status", "1,4".to_owned())],
                "get_all_alarms",
            )
            .await?;

        Ok(get_array(&response, "data")
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
            client.remove_header("accessToken");
        }
        Ok(())
    }
}

/// Most endpoints answer `{code: 200}`; the device data ones use `{errCode: 0}`
fn check_envelope(response: &Value, operation: &str) -> ProviderResult<()> {
    let failure = if let Some(code) = get_i64(response, "code") {
        (code != SUCCESS).then(|| (code.to_string(), get_str(response, "msg")))
    } else {
        let code = get_str(response, "errCode");
        (!code.is_empty() && code != "0" && code != "200")
            .then(|| (code, get_str(response, "errMsg")))
    };

    match failure {
        Some((code, message)) => Err(ProviderError::Vendor {
            provider: PROVIDER_NAME.to_owned(),
            code,
            message: format!("{operation}: {message}"),
        }),
        None => Ok(()),
    }
}

/// First reading that is present and non-zero, else zero
fn nonzero_first(data: &Value, keys: &[&str]) -> f64 {
    keys.iter()
        .filter_map(|key| get_f64(data, key))
        .find(|v| v.abs() > f64::EPSILON)
        .unwrap_or_default()
}

// ============= Normalization =============

fn normalize_plant_row(raw: &Value) -> Plant {
    let mut plant = Plant::new(PROVIDER_NAME, &get_str(raw, "plantId"), get_str(raw, "plantName"));
    plant.meta = plant
        .meta
        .with_extra("plantNo", get_str(raw, "plantNo"))
        .with_extra("nmi", get_str(raw, "NMI"));
    plant
}

fn normalize_plant_details(raw: &Value, plant_id: &str) -> Plant {
    let mut plant = Plant::new(PROVIDER_NAME, plant_id, get_str(raw, "plantName"));
    plant.timezone = get_str(raw, "timeZone");
    plant.country = get_str(raw, "country");
    plant.address = get_str(raw, "fullAddress");
    plant.peak_power_kwp = get_f64(raw, "systemPower");
    plant.plant_type = plant_type(get_i64(raw, "type"));
    plant.grid_connection_type = Some(grid_connection_type(&get_str(raw, "gridNetType")));
    plant.electricity_price = get_f64(raw, "gridPrice");
    plant.currency = get_str(raw, "currency");
    if let (Some(latitude), Some(longitude)) = (get_f64(raw, "latitude"), get_f64(raw, "longitude"))
    {
        plant.location = Some(LatLng {
            latitude,
            longitude,
        });
    }

    get_str(raw, "plantUid").clone_into(&mut plant.meta.provider_plant_uid);
    plant.meta = plant
        .meta
        .with_raw_data()
        .with_extra("plantNo", get_str(raw, "plantNo"))
        .with_extra("countryCode", get_str(raw, "countryCode"));
    plant
}

/// None when the row carries no serial number to identify the device
fn normalize_device(raw: &Value, plant_id: &str) -> Option<Device> {
    let inverter = &raw["inverterData"];
    let ems = &raw["emsModuleData"];
    let meter = &raw["electricMeterData"];

    let sn = non_empty(get_str(inverter, "deviceSn"))
        .or_else(|| non_empty(get_str(ems, "deviceSn")))
        .or_else(|| non_empty(get_str(meter, "meterSn")))
        .or_else(|| non_empty(get_str(raw, "sn")))?;

    let mut device = Device::new(PROVIDER_NAME, &sn, plant_id);
    device.name = non_empty(get_str(inverter, "aliases"))
        .or_else(|| non_empty(get_str(ems, "emsModuleName")))
        .unwrap_or_else(|| sn.clone());
    device.model = non_empty(get_str(inverter, "deviceModel"))
        .unwrap_or_else(|| get_str(ems, "emsModel"));
    device.serial_number = sn;
    device.device_type = device_type(get_i64(raw, "deviceType").unwrap_or(-1));
    "SAJ".clone_into(&mut device.manufacturer);
    Some(device)
}

fn normalize_base_info(raw: &Value, device_id: &str) -> Device {
    let mut device = Device::new(PROVIDER_NAME, device_id, "");
    device.serial_number = non_empty(get_str(raw, "invSN")).unwrap_or_else(|| device_id.to_owned());
    device.model = get_str(raw, "invType");
    device.device_type = DeviceType::Inverter;
    "SAJ".clone_into(&mut device.manufacturer);
    device.firmware_info = Some(FirmwareInfo {
        main_version: get_str(raw, "invMFW"),
        slave_version: get_str(raw, "invSFW"),
        display_version: get_str(raw, "invDFW"),
        module_model: get_str(raw, "moduleModel"),
        module_sn: get_str(raw, "moduleSN"),
        module_firmware: get_str(raw, "moduleFW"),
    });
    device.meta = device.meta.with_raw_data();
    device
}

fn normalize_plant_stats(raw: &Value, plant_id: &str, period: Period) -> EnergySummary {
    let mut energy = EnergySummary::new(PROVIDER_NAME, plant_id, period);

    let prefix = match period {
        Period::Day => Some("today"),
        Period::Month => Some("month"),
        Period::Year => Some("year"),
        Period::Total => Some("total"),
        Period::Week => None,
    };
    if let Some(prefix) = prefix {
        let field = |name: &str| get_f64(raw, &format!("{prefix}{name}"));
        energy.pv_generation_kwh = field("PvEnergy");
        energy.load_consumption_kwh = field("LoadEnergy");
        energy.grid_import_kwh = field("BuyEnergy");
        energy.grid_export_kwh = field("SellEnergy");
        energy.battery_charge_kwh = field("ChargeEnergy");
        energy.battery_discharge_kwh = field("DisChargeEnergy");
    }

    energy.current_power_w = get_f64(raw, "powerNow");
    energy.battery_soc = get_f64(raw, "batEnergyPercent");
    energy.co2_saved_kg = get_f64(raw, "totalReduceCo2");
    energy.trees_equivalent = get_f64(raw, "totalPlantTreeNum");
    fill_derived_metrics(&mut energy);
    energy
}

// ============= Mapping =============

fn plant_type(code: Option<i64>) -> PlantType {
    match code {
        Some(0) => PlantType::GridTied,
        Some(1) => PlantType::Hybrid,
        Some(3) => PlantType::AcCoupled,
        Some(_) | None => PlantType::Unknown,
    }
}

fn grid_connection_type(code: &str) -> GridConnectionType {
    match code {
        "1" => GridConnectionType::FullExport,
        "2" => GridConnectionType::SelfConsumption,
        "3" => GridConnectionType::OffGrid,
        _ => GridConnectionType::Unknown,
    }
}

fn device_type(code: i64) -> DeviceType {
    match code {
        0 => DeviceType::StringInverter,
        1 => DeviceType::HybridInverter,
        2 => DeviceType::LoadMonitor,
        3 => DeviceType::EvCharger,
        6 => DeviceType::Ems,
        7 => DeviceType::Meter,
        10 => DeviceType::DieselGenerator,
        16 | 18 => DeviceType::Optimizer,
        17 => DeviceType::HeatPump,
        19 => DeviceType::WeatherStation,
        _ => DeviceType::Unknown,
    }
}

fn operating_mode(code: Option<i64>) -> OperatingMode {
    match code {
        Some(0) => OperatingMode::Initializing,
        Some(1) => OperatingMode::Waiting,
        Some(2) => OperatingMode::GridConnected,
        Some(3) => OperatingMode::OffGrid,
        Some(5) => OperatingMode::Fault,
        Some(6) => OperatingMode::Upgrading,
        Some(_) | None => OperatingMode::Unknown,
    }
}

fn battery_direction(code: Option<i64>) -> EnergyDirection {
    match code {
        Some(-1) => EnergyDirection::Charging,
        Some(1) => EnergyDirection::Discharging,
        Some(0) => EnergyDirection::Idle,
        Some(_) | None => EnergyDirection::Unknown,
    }
}

fn grid_direction(code: Option<i64>) -> GridDirection {
    match code {
        Some(-1) => GridDirection::Importing,
        Some(1) => GridDirection::Exporting,
        Some(0) => GridDirection::Idle,
        Some(_) | None => GridDirection::Unknown,
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
        Some(4) => AlarmStatus::Resolved,
        Some(_) | None => AlarmStatus::Unknown,
    }
}

fn time_unit(granularity: Granularity) -> u8 {
    match granularity {
        Granularity::Minute => 0,
        Granularity::Hour | Granularity::Day => 1,
        Granularity::Month => 2,
        Granularity::Year => 3,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server, ServerGuard};
    use serde_json::json;

    async fn token_mock(server: &mut ServerGuard, expires: i64, hits: usize) -> mockito::Mock {
        server
            .mock("GET", "/open/api/access_token")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("appId".into(), "app-1".into()),
                Matcher::UrlEncoded("appSecret".into(), "secret".into()),
            ]))
            .with_status(200)
            .with_body(
                json!({"code": 200, "msg": "ok", "data": {"access_token": "acc-1", "expires": expires}})
                    .to_string(),
            )
            .expect(hits)
            .create_async()
            .await
    }

    async fn plant_page(server: &mut ServerGuard, page: &str, body: Value) -> mockito::Mock {
        server
            .mock("GET", "/open/api/developer/plant/page")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("pageNum".into(), page.into()),
                Matcher::UrlEncoded("pageSize".into(), "100".into()),
            ]))
            .with_status(200)
            .with_body(body.to_string())
            .create_async()
            .await
    }

    fn config(server: &ServerGuard) -> ProviderConfig {
        let mut config = ProviderConfig::new(PROVIDER_NAME)
            .with_base_url(&server.url())
            .with_credential("appId", "app-1")
            .with_credential("appSecret", "secret");
        config.timezone = Some("Europe/Prague".to_owned());
        config
    }

    async fn provider(server: &ServerGuard) -> SajProvider {
        let mut provider = SajProvider::new();
        provider.initialize(&config(server)).await.unwrap();
        provider
    }

    #[tokio::test]
    async fn test_token_reused_until_margin() {
        let mut server = Server::new_async().await;
        let token = token_mock(&mut server, 7200, 1).await;
        let details = server
            .mock("GET", "/open/api/plant/details")
            .match_header("accessToken", "acc-1")
            .match_header("content-language", "en_US")
            .with_status(200)
            .with_body(json!({"code": 200, "data": {"plantName": "Home", "plantUid": "U1", "systemPower": 8.2,
                "type": 1, "gridNetType": "2", "latitude": 50.1, "longitude": 14.4, "timeZone": "Europe/Prague"}}).to_string())
            .expect(2)
            .create_async()
            .await;

        let provider = provider(&server).await;
        assert!(provider.healthy().await);

        let plant = provider.get_plant_details("P1").await.unwrap();
        provider.get_plant_details("P1").await.unwrap();

        assert_eq!(plant.id, "saj_P1");
        assert_eq!(plant.meta.provider_plant_uid, "U1");
        assert_eq!(plant.plant_type, PlantType::Hybrid);
        assert_eq!(plant.grid_connection_type, Some(GridConnectionType::SelfConsumption));
        assert_eq!(plant.peak_power_kwp, Some(8.2));
        token.assert_async().await;
        details.assert_async().await;
    }

    #[tokio::test]
    async fn test_token_inside_margin_is_refreshed() {
        let mut server = Server::new_async().await;
        // expires in 4 minutes, inside the 5 minute margin
        let token = token_mock(&mut server, 240, 2).await;
        let _rows = server
            .mock("GET", "/open/api/developer/plant/page")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(json!({"code": 200, "totalPage": 1, "rows": []}).to_string())
            .create_async()
            .await;

        let provider = provider(&server).await;
        provider.get_plants().await.unwrap();
        token.assert_async().await;
    }

    #[tokio::test]
    async fn test_plants_stop_on_last_page() {
        let mut server = Server::new_async().await;
        let _token = token_mock(&mut server, 7200, 1).await;
        let first = plant_page(
            &mut server,
            "1",
            json!({"code": 200, "totalPage": 2, "rows": [{"plantId": "P1", "plantName": "A", "plantNo": "N1"}]}),
        )
        .await;
        let second = plant_page(
            &mut server,
            "2",
            json!({"code": 200, "totalPage": 2, "rows": [{"plantId": "P2", "plantName": "B"}]}),
        )
        .await;

        let plants = provider(&server).await.get_plants().await.unwrap();
        assert_eq!(plants.len(), 2);
        assert_eq!(plants[0].meta.extra.get("plantNo").unwrap(), "N1");
        assert_eq!(plants[1].id, "saj_P2");
        first.assert_async().await;
        second.assert_async().await;
    }

    #[tokio::test]
    async fn test_vendor_error_code() {
        let mut server = Server::new_async().await;
        let _token = token_mock(&mut server, 7200, 1).await;
        let _devices = server
            .mock("GET", "/open/api/plant/getPlantAllDeviceList")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(json!({"code": 500, "msg": "plant not found"}).to_string())
            .create_async()
            .await;

        let err = provider(&server).await.get_devices("nope").await.unwrap_err();
        assert!(matches!(err, ProviderError::Vendor { ref code, .. } if code == "500"));
        assert!(err.to_string().contains("plant not found"));
    }

    #[test]
    fn test_devices_pick_serial_from_sub_records() {
        let inverter = json!({"deviceType": 1, "sn": "X", "inverterData": {"deviceSn": "H1", "aliases": "Garage", "deviceModel": "H2-6K"}});
        let meter = json!({"deviceType": 7, "electricMeterData": {"meterSn": "M1"}});
        let unknown = json!({"deviceType": 99, "sn": "Z9"});

        let d = normalize_device(&inverter, "P1").unwrap();
        assert_eq!(d.id, "saj_H1");
        assert_eq!(d.name, "Garage");
        assert_eq!(d.device_type, DeviceType::HybridInverter);

        let m = normalize_device(&meter, "P1").unwrap();
        assert_eq!(m.serial_number, "M1");
        assert_eq!(m.name, "M1");
        assert_eq!(m.device_type, DeviceType::Meter);

        assert_eq!(
            normalize_device(&unknown, "P1").unwrap().device_type,
            DeviceType::Unknown
        );

        let anonymous = json!({"deviceType": 1, "sn": "", "inverterData": {"deviceSn": ""}});
        assert!(normalize_device(&anonymous, "P1").is_none());
    }

    #[tokio::test]
    async fn test_devices_without_serial_are_skipped() {
        let mut server = Server::new_async().await;
        let _token = token_mock(&mut server, 7200, 1).await;
        let _devices = server
            .mock("GET", "/open/api/plant/getPlantAllDeviceList")
            .match_query(Matcher::UrlEncoded("plantId".into(), "P1".into()))
            .with_status(200)
            .with_body(
                json!({"code": 200, "data": [
                    {"deviceType": 1, "inverterData": {"deviceSn": "H1"}},
                    {"deviceType": 7, "electricMeterData": {"meterSn": ""}}
                ]})
                .to_string(),
            )
            .create_async()
            .await;

        let devices = provider(&server).await.get_devices("P1").await.unwrap();
        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0].id, "saj_H1");
        assert_eq!(devices[0].plant_id, "saj_P1");
    }

    #[test]
    fn test_realtime_uses_plant_timezone() {
        let provider = SajProvider {
            tz: chrono_tz::Europe::Prague,
            ..SajProvider::default()
        };
        let data = json!({
            "deviceSn": "H1", "dataTime": "2024-07-01 12:00:00", "isOnline": "1", "mpvMode": 2,
            "totalPVPower": 4100, "pv1volt": 350.0, "pv1curr": 6.0, "pv1power": 2050.0,
            "batEnergyPercent": 80, "totalBatteryPower": 1200, "batteryDirection": -1,
            "totalGridPowerWatt": 0, "sysGridPowerWatt": 650, "gridDirection": 1,
            "rGridVolt": 232.0, "linkSignal": -67
        });

        let rt = provider.normalize_realtime(&data, "H1");
        assert_eq!(rt.timestamp.to_rfc3339(), "2024-07-01T10:00:00+00:00");
        assert_eq!(rt.original_timestamp, "2024-07-01 12:00:00");
        assert_eq!(rt.original_timezone, "Europe/Prague");
        assert_eq!(rt.status, DeviceStatus::Online);
        assert_eq!(rt.operating_mode, OperatingMode::GridConnected);

        let battery = rt.battery.unwrap();
        assert_eq!(battery.direction, EnergyDirection::Charging);

        let grid = rt.grid.unwrap();
        assert_eq!(grid.total_power_w, 650.0);
        assert_eq!(grid.direction, GridDirection::Exporting);
        assert_eq!(grid.phases.len(), 1);
        assert_eq!(rt.environment.unwrap().signal_strength_dbm, Some(-67));
    }

    #[test]
    fn test_history_minute_power_and_day_energy() {
        let provider = SajProvider::default();
        let raw = json!({"dataTime": "2024-07-01 12:05:00", "pvPower": 3000, "dischargePower": 500, "pvEnergy": 1.2});

        let minute = provider.normalize_history_point(&raw, "H1", Granularity::Minute).unwrap();
        assert_eq!(minute.pv_power_w, Some(3000.0));
        assert_eq!(minute.battery_power_w, Some(-500.0));
        assert_eq!(minute.battery_direction, Some(EnergyDirection::Discharging));

        let day = provider.normalize_history_point(&raw, "H1", Granularity::Day).unwrap();
        assert_eq!(day.pv_energy_kwh, Some(1.2));
        assert!(day.pv_power_w.is_none());
    }

    #[tokio::test]
    async fn test_alarm_ids_combine_serial_and_code() {
        let mut server = Server::new_async().await;
        let _token = token_mock(&mut server, 7200, 1).await;
        let _alarms = server
            .mock("GET", "/open/api/device/alarmList")
            .match_query(Matcher::UrlEncoded("status".into(), "1,4".into()))
            .with_status(200)
            .with_body(
                json!({"code": 200, "data": [
                    {"deviceSn": "H1", "alarmCode": 1021, "alarmName": "Bus overvoltage", "alarmLevel": 3, "status": 4,
                     "alarmTime": "2024-07-01 08:30:00"}
                ]})
                .to_string(),
            )
            .create_async()
            .await;

        let alarms = provider(&server).await.get_all_alarms().await.unwrap();
        assert_eq!(alarms.len(), 1);
        assert_eq!(alarms[0].id, "saj_alarm_H1_1021");
        assert_eq!(alarms[0].code, "1021");
        assert_eq!(alarms[0].device_id, "saj_H1");
        assert_eq!(alarms[0].severity, AlarmSeverity::Critical);
        assert_eq!(alarms[0].status, AlarmStatus::Resolved);
        assert_eq!(
            alarms[0].start_time.unwrap().to_rfc3339(),
            "2024-07-01T06:30:00+00:00"
        );
    }

    #[test]
    fn test_energy_period_prefixes() {
        let raw = json!({"monthPvEnergy": 400.0, "monthSellEnergy": 150.0, "todayPvEnergy": 12.0, "totalReduceCo2": 999.0});
        let month = normalize_plant_stats(&raw, "P1", Period::Month);
        assert_eq!(month.pv_generation_kwh, Some(400.0));
        assert_eq!(month.grid_export_kwh, Some(150.0));
        // vendor figure wins over the derived one
        assert_eq!(month.co2_saved_kg, Some(999.0));
        assert!((month.self_consumption_rate.unwrap() - 0.625).abs() < 1e-9);

        let week = normalize_plant_stats(&raw, "P1", Period::Week);
        assert!(week.pv_generation_kwh.is_none());
    }
}
