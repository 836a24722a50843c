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

use crate::errors::{ProviderError, ProviderResult};
use async_trait::async_trait;
use chrono::NaiveDate;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use solarhub_types::{
    Alarm, Device, EnergySummary, HistoryRequest, HistoryResponse, Period, Plant, Realtime,
};
use std::collections::HashMap;
use std::time::Duration;
use tracing::warn;

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

fn default_enabled() -> bool {
    true
}

/// Settings for one provider instance, as read from `[[providers]]`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Registered provider type, e.g. "huawei"
    #[serde(rename = "type")]
    pub provider_type: String,

    /// Instance name used for logging
    #[serde(default)]
    pub name: String,

    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Override for the vendor API root
    #[serde(default)]
    pub base_url: Option<String>,

    #[serde(default)]
    pub credentials: HashMap<String, String>,

    /// Requests per second against the vendor API
    #[serde(default)]
    pub rate_limit_rps: Option<f64>,

    #[serde(default)]
    pub timeout_seconds: Option<u64>,

    /// IANA timezone used to read vendor wall-clock timestamps
    #[serde(default)]
    pub timezone: Option<String>,
}

impl ProviderConfig {
    #[must_use]
    pub fn new(provider_type: &str) -> Self {
        Self {
            provider_type: provider_type.to_owned(),
            name: provider_type.to_owned(),
            enabled: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_credential(mut self, key: &str, value: &str) -> Self {
        self.credentials.insert(key.to_owned(), value.to_owned());
        self
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = Some(base_url.to_owned());
        self
    }

    /// Credential value; empty strings count as absent
    #[must_use]
    pub fn credential(&self, key: &str) -> Option<&str> {
        self.credentials
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    pub fn require_credential(&self, provider: &str, key: &str) -> ProviderResult<&str> {
        self.credential(key)
            .ok_or_else(|| ProviderError::MissingCredential {
                provider: provider.to_owned(),
                key: key.to_owned(),
            })
    }

    #[must_use]
    pub fn base_url_or(&self, default: &str) -> String {
        self.base_url
            .as_deref()
            .filter(|url| !url.is_empty())
            .unwrap_or(default)
            .trim_end_matches('/')
            .to_owned()
    }

    #[must_use]
    pub fn rate_limit_or(&self, default: f64) -> f64 {
        self.rate_limit_rps
            .filter(|rps| *rps > 0.0)
            .unwrap_or(default)
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(
            self.timeout_seconds
                .filter(|secs| *secs > 0)
                .unwrap_or(DEFAULT_TIMEOUT_SECS),
        )
    }

    /// Configured timezone, UTC when absent or unparseable
    #[must_use]
    pub fn timezone_or_utc(&self) -> Tz {
        match self.timezone.as_deref() {
            None | Some("") => Tz::UTC,
            Some(name) => name.parse::<Tz>().unwrap_or_else(|_| {
                warn!(
                    "⚠️ [CONFIG] Unknown timezone '{}' for provider '{}', using UTC",
                    name, self.provider_type
                );
                Tz::UTC
            }),
        }
    }
}

/// Capability contract every vendor adapter implements.
///
/// Identifiers passed in are vendor-native; everything returned is normalized.
/// Dropping a returned future cancels the call.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Stable lowercase identifier, used for routing and as the composite id prefix
    fn name(&self) -> &str;

    /// Build the vendor client and perform the handshake
    async fn initialize(&mut self, config: &ProviderConfig) -> ProviderResult<()>;

    async fn get_plants(&self) -> ProviderResult<Vec<Plant>>;

    async fn get_plant_details(&self, plant_id: &str) -> ProviderResult<Plant>;

    async fn get_devices(&self, plant_id: &str) -> ProviderResult<Vec<Device>>;

    async fn get_device_details(&self, device_id: &str) -> ProviderResult<Device>;

    async fn get_realtime_data(&self, device_id: &str) -> ProviderResult<Realtime>;

    /// Energy figures for the period containing `date`
    async fn get_energy_stats(
        &self,
        plant_id: &str,
        period: Period,
        date: NaiveDate,
    ) -> ProviderResult<EnergySummary>;

    async fn get_historical_data(
        &self,
        device_id: &str,
        request: &HistoryRequest,
    ) -> ProviderResult<HistoryResponse>;

    async fn get_alarms(&self, device_id: &str) -> ProviderResult<Vec<Alarm>>;

    async fn get_all_alarms(&self) -> ProviderResult<Vec<Alarm>>;

    /// Whether a valid session is held. Never touches the network.
    async fn healthy(&self) -> bool;

    /// Drop the session; idempotent
    fn close(&self) -> ProviderResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_deserializes_type_key() {
        let config: ProviderConfig = serde_json::from_str(
            r#"{"type":"saj","name":"roof","credentials":{"appId":"a","appSecret":""},"rate_limit_rps":2.5}"#,
        )
        .unwrap();
        assert_eq!(config.provider_type, "saj");
        assert!(config.enabled);
        assert_eq!(config.credential("appId"), Some("a"));
        assert_eq!(config.credential("appSecret"), None);
        assert!((config.rate_limit_or(5.0) - 2.5).abs() < f64::EPSILON);
        assert_eq!(config.timeout(), Duration::from_secs(DEFAULT_TIMEOUT_SECS));
    }

    #[test]
    fn test_require_credential_names_key() {
        let config = ProviderConfig::new("sma");
        let err = config.require_credential("sma", "bearerToken").unwrap_err();
        assert!(matches!(err, ProviderError::MissingCredential { ref key, .. } if key == "bearerToken"));
        assert!(err.is_auth_failure());
    }

    #[test]
    fn test_base_url_and_timezone_fallbacks() {
        let config = ProviderConfig::new("huawei").with_base_url("http://localhost:1234/");
        assert_eq!(config.base_url_or("https://x"), "http://localhost:1234");
        assert_eq!(ProviderConfig::new("huawei").base_url_or("https://x/"), "https://x");

        let mut config = ProviderConfig::new("saj");
        assert_eq!(config.timezone_or_utc(), Tz::UTC);
        config.timezone = Some("Europe/Prague".to_owned());
        assert_eq!(config.timezone_or_utc(), chrono_tz::Europe::Prague);
        config.timezone = Some("Mars/Olympus".to_owned());
        assert_eq!(config.timezone_or_utc(), Tz::UTC);
    }
}
