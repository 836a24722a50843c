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
use serde::{Deserialize, Serialize};

// ============= Plant Classification =============

/// Plant/system type unified across vendors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlantType {
    GridTied,
    /// Storage-backed plant
    Hybrid,
    OffGrid,
    AcCoupled,
    Commercial,
    UtilityScale,
    #[default]
    Unknown,
}

/// How the plant is wired to the public grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GridConnectionType {
    FullExport,
    SelfConsumption,
    OffGrid,
    #[default]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub latitude: f64,
    pub longitude: f64,
}

// ============= Plant =============

/// A physical installation (power station) in vendor-agnostic form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Plant {
    /// `"<provider>_<providerPlantId>"`
    pub id: String,
    pub provider: String,
    pub name: String,
    #[serde(default)]
    pub timezone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<LatLng>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub address: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub country: String,
    #[serde(default, rename = "peakPowerKWp", skip_serializing_if = "Option::is_none")]
    pub peak_power_kwp: Option<f64>,
    #[serde(default)]
    pub plant_type: PlantType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grid_connection_type: Option<GridConnectionType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub electricity_price: Option<f64>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub currency: String,
    pub meta: ProviderMeta,
}

impl Plant {
    /// Start a plant record whose id and provenance derive from the native id
    #[must_use]
    pub fn new(provider: &str, native_id: &str, name: impl Into<String>) -> Self {
        Self {
            id: composite_id(provider, native_id),
            provider: provider.to_owned(),
            name: name.into(),
            timezone: String::new(),
            location: None,
            address: String::new(),
            country: String::new(),
            peak_power_kwp: None,
            plant_type: PlantType::Unknown,
            grid_connection_type: None,
            electricity_price: None,
            currency: String::new(),
            meta: ProviderMeta::for_plant(provider, native_id),
        }
    }
}
