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

//! Unit conversions and derived energy metrics shared by all adapters.

use chrono::{DateTime, LocalResult, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use solarhub_types::{EnergyDirection, EnergySummary, GridDirection};

/// Grid emission factor used for CO2 savings
pub const CO2_KG_PER_KWH: f64 = 0.475;

/// CO2 absorbed by one tree per year
pub const KG_CO2_PER_TREE: f64 = 22.0;

// ============= Conversions =============

#[must_use]
pub fn watts_to_kilowatts(w: f64) -> f64 {
    w / 1000.0
}

#[must_use]
pub fn kilowatts_to_watts(kw: f64) -> f64 {
    kw * 1000.0
}

#[must_use]
pub fn wh_to_kwh(wh: f64) -> f64 {
    wh / 1000.0
}

#[must_use]
pub fn kwh_to_wh(kwh: f64) -> f64 {
    kwh * 1000.0
}

#[must_use]
pub fn mwh_to_kwh(mwh: f64) -> f64 {
    mwh * 1000.0
}

#[must_use]
pub fn wp_to_kwp(wp: f64) -> f64 {
    wp / 1000.0
}

#[must_use]
pub fn kwp_to_wp(kwp: f64) -> f64 {
    kwp * 1000.0
}

#[must_use]
pub fn celsius_to_fahrenheit(c: f64) -> f64 {
    c * 9.0 / 5.0 + 32.0
}

#[must_use]
pub fn fahrenheit_to_celsius(f: f64) -> f64 {
    (f - 32.0) * 5.0 / 9.0
}

// ============= Derived Metrics =============

#[must_use]
pub fn calculate_co2_savings(kwh: f64) -> f64 {
    kwh * CO2_KG_PER_KWH
}

#[must_use]
pub fn calculate_trees_equivalent(co2_kg: f64) -> f64 {
    co2_kg / KG_CO2_PER_TREE
}

/// Share of generation consumed on site, in [0, 1]
#[must_use]
pub fn calculate_self_consumption_rate(pv_generation_kwh: f64, grid_export_kwh: f64) -> f64 {
    if pv_generation_kwh <= 0.0 {
        return 0.0;
    }
    ((pv_generation_kwh - grid_export_kwh) / pv_generation_kwh).clamp(0.0, 1.0)
}

/// Share of consumption covered without the grid, in [0, 1]
#[must_use]
pub fn calculate_self_sufficiency_rate(consumption_kwh: f64, grid_import_kwh: f64) -> f64 {
    if consumption_kwh <= 0.0 {
        return 0.0;
    }
    ((consumption_kwh - grid_import_kwh) / consumption_kwh).clamp(0.0, 1.0)
}

/// Fill rates, CO2 and trees that the vendor did not report.
///
/// Values already present are kept.
pub fn fill_derived_metrics(summary: &mut EnergySummary) {
    if let Some(pv) = summary.pv_generation_kwh {
        if summary.self_consumption_rate.is_none()
            && let Some(export) = summary.grid_export_kwh
        {
            summary.self_consumption_rate = Some(calculate_self_consumption_rate(pv, export));
        }
        if summary.self_consumption_kwh.is_none()
            && let Some(export) = summary.grid_export_kwh
        {
            summary.self_consumption_kwh = Some((pv - export).max(0.0));
        }
        if summary.co2_saved_kg.is_none() {
            summary.co2_saved_kg = Some(calculate_co2_savings(pv));
        }
    }

    if summary.self_sufficiency_rate.is_none()
        && let (Some(load), Some(import)) = (summary.load_consumption_kwh, summary.grid_import_kwh)
    {
        summary.self_sufficiency_rate = Some(calculate_self_sufficiency_rate(load, import));
    }

    if summary.trees_equivalent.is_none()
        && let Some(co2) = summary.co2_saved_kg
    {
        summary.trees_equivalent = Some(calculate_trees_equivalent(co2));
    }
}

// ============= Directions =============

/// Positive power is drawn from the grid
#[must_use]
pub fn grid_direction_from_power(power_w: f64) -> GridDirection {
    if power_w > 0.0 {
        GridDirection::Importing
    } else if power_w < 0.0 {
        GridDirection::Exporting
    } else {
        GridDirection::Idle
    }
}

/// Positive power flows into the battery
#[must_use]
pub fn battery_direction_from_power(power_w: f64) -> EnergyDirection {
    if power_w > 0.0 {
        EnergyDirection::Charging
    } else if power_w < 0.0 {
        EnergyDirection::Discharging
    } else {
        EnergyDirection::Idle
    }
}

// ============= Time =============

/// Interpret a vendor wall-clock timestamp in the plant timezone.
///
/// Ambiguous local times (DST fall-back) resolve to the earlier instant;
/// times inside a DST gap yield `None`.
#[must_use]
pub fn parse_local_timestamp(text: &str, format: &str, tz: Tz) -> Option<DateTime<Utc>> {
    let naive = NaiveDateTime::parse_from_str(text.trim(), format).ok()?;
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(local) | LocalResult::Ambiguous(local, _) => {
            Some(local.with_timezone(&Utc))
        }
        LocalResult::None => None,
    }
}

/// Convert epoch milliseconds to UTC
#[must_use]
pub fn from_epoch_millis(ms: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_millis(ms)
}
