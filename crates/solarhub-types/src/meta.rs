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

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Build the canonical cross-vendor identifier `"<provider>_<native>"`.
#[must_use]
pub fn composite_id(provider: &str, native_id: &str) -> String {
    format!("{provider}_{native_id}")
}

/// Provenance embedded in every normalized record.
///
/// Keeps the vendor-native identifiers so a record can always be traced back
/// to the upstream object it was built from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderMeta {
    pub provider: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub provider_plant_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub provider_device_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub provider_plant_uid: String,
    /// Whether the adapter read a raw vendor payload for this record
    pub raw_data_available: bool,
    /// Vendor-specific fields that have no home in the schema
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, String>,
    pub fetched_at: DateTime<Utc>,
}

impl ProviderMeta {
    /// Bare provenance stamped with the current time
    #[must_use]
    pub fn new(provider: &str) -> Self {
        Self {
            provider: provider.to_owned(),
            provider_plant_id: String::new(),
            provider_device_id: String::new(),
            provider_plant_uid: String::new(),
            raw_data_available: false,
            extra: BTreeMap::new(),
            fetched_at: Utc::now(),
        }
    }

    #[must_use]
    pub fn for_plant(provider: &str, plant_id: &str) -> Self {
        Self {
            provider_plant_id: plant_id.to_owned(),
            ..Self::new(provider)
        }
    }

    #[must_use]
    pub fn for_device(provider: &str, device_id: &str) -> Self {
        Self {
            provider_device_id: device_id.to_owned(),
            ..Self::new(provider)
        }
    }

    #[must_use]
    pub fn with_plant(mut self, plant_id: &str) -> Self {
        plant_id.clone_into(&mut self.provider_plant_id);
        self
    }

    #[must_use]
    pub fn with_raw_data(mut self) -> Self {
        self.raw_data_available = true;
        self
    }

    /// Attach a vendor-specific key; empty values are dropped
    #[must_use]
    pub fn with_extra(mut self, key: &str, value: impl Into<String>) -> Self {
        let value = value.into();
        if !value.is_empty() {
            self.extra.insert(key.to_owned(), value);
        }
        self
    }
}
