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

use crate::ApiState;
use crate::envelope::{ApiError, ApiResponse, ApiResult};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Duration, NaiveDate, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use solarhub_types::{
    Alarm, Device, EnergySummary, Granularity, HistoryRequest, HistoryResponse, Period, Plant,
    Realtime,
};
use std::collections::BTreeMap;
use tracing::{debug, warn};

// ============= Query parameters =============

#[derive(Debug, Default, Deserialize)]
pub struct ProviderQuery {
    pub provider: Option<String>,
}

impl ProviderQuery {
    fn require(&self) -> Result<&str, ApiError> {
        require_provider(self.provider.as_deref())
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct EnergyQuery {
    pub provider: Option<String>,
    pub period: Option<String>,
    pub date: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct HistoryQuery {
    pub provider: Option<String>,
    pub granularity: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub page: Option<String>,
    pub page_size: Option<String>,
    pub metrics: Option<String>,
}

fn require_provider(provider: Option<&str>) -> Result<&str, ApiError> {
    match provider.map(str::trim) {
        Some(name) if !name.is_empty() => Ok(name),
        Some(_) | None => Err(ApiError::bad_request(
            "Missing required query parameter 'provider'",
        )),
    }
}

fn parse_period(period: Option<&str>) -> Result<Period, ApiError> {
    match period {
        Some(text) if !text.trim().is_empty() => text.parse().map_err(ApiError::BadRequest),
        Some(_) | None => Ok(Period::Day),
    }
}

fn parse_date(date: Option<&str>) -> Result<NaiveDate, ApiError> {
    match date {
        Some(text) if !text.trim().is_empty() => NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d")
            .map_err(|_| {
                ApiError::bad_request(format!("Invalid date '{text}'. Expected YYYY-MM-DD"))
            }),
        Some(_) | None => Ok(Utc::now().date_naive()),
    }
}

fn rfc3339(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn parse_bound(name: &str, value: Option<&str>, default: DateTime<Utc>) -> Result<String, ApiError> {
    match value {
        Some(text) if !text.trim().is_empty() => DateTime::parse_from_rfc3339(text.trim())
            .map(|t| rfc3339(t.with_timezone(&Utc)))
            .map_err(|_| ApiError::bad_request(format!("Invalid {name} '{text}'. Expected RFC 3339"))),
        Some(_) | None => Ok(rfc3339(default)),
    }
}

/// Comma-separated metric names, trimmed, empties dropped
fn parse_metrics(metrics: Option<&str>) -> Vec<String> {
    metrics
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}

impl HistoryQuery {
    fn into_request(self, device_id: String) -> Result<HistoryRequest, ApiError> {
        let granularity = match self.granularity.as_deref() {
            Some(text) if !text.trim().is_empty() => {
                text.parse::<Granularity>().map_err(ApiError::BadRequest)?
            }
            Some(_) | None => Granularity::Hour,
        };

        let now = Utc::now();
        let start = parse_bound("start", self.start.as_deref(), now - Duration::hours(24))?;
        let end = parse_bound("end", self.end.as_deref(), now)?;

        let page = self
            .page
            .as_deref()
            .and_then(|p| p.trim().parse::<u32>().ok())
            .filter(|p| *p >= 1)
            .unwrap_or(1);
        let page_size = self
            .page_size
            .as_deref()
            .and_then(|p| p.trim().parse::<u32>().ok())
            .filter(|size| (1..=HistoryRequest::MAX_PAGE_SIZE).contains(size))
            .unwrap_or(HistoryRequest::DEFAULT_PAGE_SIZE);

        let mut request = HistoryRequest::new(device_id, start, end, granularity);
        request.metrics = parse_metrics(self.metrics.as_deref());
        request.page = page;
        request.page_size = page_size;
        Ok(request)
    }
}

// ============= Health =============

#[derive(Debug, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub providers: BTreeMap<String, bool>,
}

pub async fn health(State(state): State<ApiState>) -> Response {
    let providers: BTreeMap<String, bool> = state.engine.health_check().await.into_iter().collect();

    if providers.values().all(|healthy| *healthy) {
        let report = HealthReport {
            status: "healthy",
            providers,
        };
        return Json(ApiResponse::ok(report)).into_response();
    }

    let unhealthy: Vec<&str> = providers
        .iter()
        .filter(|(_, healthy)| !**healthy)
        .map(|(name, _)| name.as_str())
        .collect();
    warn!("⚠️ [API] Unhealthy providers: {}", unhealthy.join(", "));

    let mut body = ApiResponse::failure(format!("Unhealthy providers: {}", unhealthy.join(", ")));
    body.data = Some(HealthReport {
        status: "degraded",
        providers,
    });
    (StatusCode::SERVICE_UNAVAILABLE, Json(body)).into_response()
}

#[derive(Debug, Serialize)]
pub struct ProviderStatus {
    pub name: String,
    pub healthy: bool,
}

pub async fn list_providers(State(state): State<ApiState>) -> ApiResult<Vec<ProviderStatus>> {
    let health = state.engine.health_check().await;
    let providers = state
        .engine
        .provider_names()
        .into_iter()
        .map(|name| {
            let healthy = health.get(&name).copied().unwrap_or(false);
            ProviderStatus { name, healthy }
        })
        .collect();
    Ok(Json(ApiResponse::list(providers)))
}

// ============= Plants =============

pub async fn list_plants(State(state): State<ApiState>) -> ApiResult<Vec<Plant>> {
    let plants = state.engine.get_all_plants().await?;
    debug!("Returning {} plants", plants.len());
    Ok(Json(ApiResponse::list(plants)))
}

pub async fn plant_details(
    State(state): State<ApiState>,
    Path(plant_id): Path<String>,
    Query(query): Query<ProviderQuery>,
) -> ApiResult<Plant> {
    let provider = query.require()?;
    let plant = state.engine.get_plant_details(provider, &plant_id).await?;
    Ok(Json(ApiResponse::ok(plant)))
}

pub async fn plant_devices(
    State(state): State<ApiState>,
    Path(plant_id): Path<String>,
    Query(query): Query<ProviderQuery>,
) -> ApiResult<Vec<Device>> {
    let provider = query.require()?;
    let devices = state.engine.get_devices(provider, &plant_id).await?;
    Ok(Json(ApiResponse::list(devices)))
}

pub async fn plant_energy(
    State(state): State<ApiState>,
    Path(plant_id): Path<String>,
    Query(query): Query<EnergyQuery>,
) -> ApiResult<EnergySummary> {
    let provider = require_provider(query.provider.as_deref())?;
    let period = parse_period(query.period.as_deref())?;
    let date = parse_date(query.date.as_deref())?;

    let summary = state
        .engine
        .get_energy_stats(provider, &plant_id, period, date)
        .await?;
    Ok(Json(ApiResponse::ok(summary)))
}

// ============= Devices =============

pub async fn list_devices(State(state): State<ApiState>) -> ApiResult<Vec<Device>> {
    let devices = state.engine.get_all_devices().await?;
    Ok(Json(ApiResponse::list(devices)))
}

pub async fn device_details(
    State(state): State<ApiState>,
    Path(device_id): Path<String>,
    Query(query): Query<ProviderQuery>,
) -> ApiResult<Device> {
    let provider = query.require()?;
    let device = state.engine.get_device_details(provider, &device_id).await?;
    Ok(Json(ApiResponse::ok(device)))
}

pub async fn device_realtime(
    State(state): State<ApiState>,
    Path(device_id): Path<String>,
    Query(query): Query<ProviderQuery>,
) -> ApiResult<Realtime> {
    let provider = query.require()?;
    let realtime = state.engine.get_realtime_data(provider, &device_id).await?;
    Ok(Json(ApiResponse::ok(realtime)))
}

pub async fn device_history(
    State(state): State<ApiState>,
    Path(device_id): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> ApiResult<HistoryResponse> {
    let provider = require_provider(query.provider.as_deref())?.to_owned();
    let request = query.into_request(device_id)?;

    let history = state.engine.get_historical_data(&provider, &request).await?;
    Ok(Json(ApiResponse::ok(history)))
}

pub async fn device_alarms(
    State(state): State<ApiState>,
    Path(device_id): Path<String>,
    Query(query): Query<ProviderQuery>,
) -> ApiResult<Vec<Alarm>> {
    let provider = query.require()?;
    let alarms = state.engine.get_device_alarms(provider, &device_id).await?;
    Ok(Json(ApiResponse::list(alarms)))
}

// ============= Alarms =============

pub async fn list_alarms(State(state): State<ApiState>) -> ApiResult<Vec<Alarm>> {
    let alarms = state.engine.get_all_alarms().await;
    Ok(Json(ApiResponse::list(alarms)))
}
