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

use crate::meta::{ProviderMeta, composite_id};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlarmSeverity {
    Info,
    Warning,
    Critical,
    #[default]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlarmStatus {
    Active,
    Resolved,
    Acknowledged,
    #[default]
    Unknown,
}

/// A fault or warning event raised by a device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alarm {
    /// `"<provider>_alarm_<vendorId>"`
    pub id: String,
    pub provider: String,
    #[serde(default)]
    pub device_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub plant_id: String,
    #[serde(default)]
    pub code: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,
    pub severity: AlarmSeverity,
    pub status: AlarmStatus,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub device_serial_number: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub device_type: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub plant_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_time: Option<DateTime<Utc>>,
    /// Seconds between start and end, when both are known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<i64>,
    pub meta: ProviderMeta,
}

impl Alarm {
    #[must_use]
    pub fn new(provider: &str, vendor_alarm_id: &str, name: impl Into<String>) -> Self {
        Self {
            id: format!("{provider}_alarm_{vendor_alarm_id}"),
            provider: provider.to_owned(),
            device_id: String::new(),
            plant_id: String::new(),
            code: String::new(),
            name: name.into(),
            message: String::new(),
            severity: AlarmSeverity::Unknown,
            status: AlarmStatus::Unknown,
            device_serial_number: String::new(),
            device_type: String::new(),
            plant_name: String::new(),
            start_time: None,
            end_time: None,
            update_time: None,
            duration: None,
            meta: ProviderMeta::new(provider).with_raw_data(),
        }
    }

    /// Attach the owning device by native id
    #[must_use]
    pub fn on_device(mut self, native_device_id: &str) -> Self {
        if !native_device_id.is_empty() {
            self.device_id = composite_id(&self.provider, native_device_id);
            native_device_id.clone_into(&mut self.meta.provider_device_id);
        }
        self
    }

    /// Attach the owning plant by native id
    #[must_use]
    pub fn on_plant(mut self, native_plant_id: &str) -> Self {
        if !native_plant_id.is_empty() {
            self.plant_id = composite_id(&self.provider, native_plant_id);
            native_plant_id.clone_into(&mut self.meta.provider_plant_id);
        }
        self
    }

    /// Set the time window and derive `duration`
    #[must_use]
    pub fn with_window(
        mut self,
        start_time: Option<DateTime<Utc>>,
        end_time: Option<DateTime<Utc>>,
    ) -> Self {
        self.start_time = start_time;
        self.end_time = end_time;
        self.duration = match (start_time, end_time) {
            (Some(start), Some(end)) if end >= start => Some((end - start).num_seconds()),
            _ => None,
        };
        self
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == AlarmStatus::Active
    }
}
