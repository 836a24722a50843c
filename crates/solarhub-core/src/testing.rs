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

//! In-memory provider used by the registry and engine tests.

use crate::errors::{ProviderError, ProviderResult};
use crate::provider::{Provider, ProviderConfig};
use async_trait::async_trait;
use chrono::NaiveDate;
use solarhub_types::{
    Alarm, Device, EnergySummary, HistoryRequest, HistoryResponse, Period, Plant, Realtime,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

/// Sets the flag when dropped, so tests can observe cancelled work
pub(crate) struct DropFlag(pub Arc<AtomicBool>);

impl Drop for DropFlag {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

#[derive(Default)]
pub(crate) struct StaticProvider {
    pub name: String,
    pub plants: Vec<Plant>,
    pub devices: Vec<Device>,
    pub alarms: Vec<Alarm>,
    pub failure: Option<String>,
    pub panic_on_plants: bool,
    pub delay: Option<Duration>,
    pub cancelled: Option<Arc<AtomicBool>>,
    pub unhealthy: bool,
    pub close_fails: bool,
    pub close_calls: Arc<AtomicUsize>,
}

impl StaticProvider {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            ..Self::default()
        }
    }

    pub fn with_plants(mut self, native_ids: &[&str]) -> Self {
        self.plants = native_ids
            .iter()
            .map(|id| Plant::new(&self.name, id, format!("Plant {id}")))
            .collect();
        self
    }

    pub fn with_devices(mut self, plant_native_id: &str, native_ids: &[&str]) -> Self {
        for id in native_ids {
            self.devices.push(Device::new(&self.name, id, plant_native_id));
        }
        self
    }

    pub fn with_alarms(mut self, vendor_ids: &[&str]) -> Self {
        self.alarms = vendor_ids
            .iter()
            .map(|id| Alarm::new(&self.name, id, "Test alarm"))
            .collect();
        self
    }

    pub fn failing(mut self, message: &str) -> Self {
        self.failure = Some(message.to_owned());
        self
    }

    pub fn slow(mut self, delay: Duration, cancelled: Arc<AtomicBool>) -> Self {
        self.delay = Some(delay);
        self.cancelled = Some(cancelled);
        self
    }

    fn check(&self) -> ProviderResult<()> {
        match &self.failure {
            Some(message) => Err(ProviderError::Api {
                status: 500,
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }

    async fn maybe_wait(&self) {
        if let Some(delay) = self.delay {
            let guard = self.cancelled.clone().map(DropFlag);
            tokio::time::sleep(delay).await;
            // completed normally, so not a cancellation
            std::mem::forget(guard);
        }
    }
}

#[async_trait]
impl Provider for StaticProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn initialize(&mut self, _config: &ProviderConfig) -> ProviderResult<()> {
        self.check()
    }

    async fn get_plants(&self) -> ProviderResult<Vec<Plant>> {
        assert!(!self.panic_on_plants, "provider {} exploded", self.name);
        self.maybe_wait().await;
        self.check()?;
        Ok(self.plants.clone())
    }

    async fn get_plant_details(&self, plant_id: &str) -> ProviderResult<Plant> {
        self.check()?;
        self.plants
            .iter()
            .find(|p| p.meta.provider_plant_id == plant_id)
            .cloned()
            .ok_or_else(|| ProviderError::no_data(&self.name, "get_plant_details"))
    }

    async fn get_devices(&self, plant_id: &str) -> ProviderResult<Vec<Device>> {
        self.check()?;
        Ok(self
            .devices
            .iter()
            .filter(|d| d.meta.provider_plant_id == plant_id)
            .cloned()
            .collect())
    }

    async fn get_device_details(&self, _device_id: &str) -> ProviderResult<Device> {
        Err(ProviderError::not_supported(
            &self.name,
            "get_device_details",
            "use get_devices",
        ))
    }

    async fn get_realtime_data(&self, device_id: &str) -> ProviderResult<Realtime> {
        self.check()?;
        Ok(Realtime::new(&self.name, device_id))
    }

    async fn get_energy_stats(
        &self,
        plant_id: &str,
        period: Period,
        _date: NaiveDate,
    ) -> ProviderResult<EnergySummary> {
        self.check()?;
        Ok(EnergySummary::new(&self.name, plant_id, period))
    }

    async fn get_historical_data(
        &self,
        device_id: &str,
        request: &HistoryRequest,
    ) -> ProviderResult<HistoryResponse> {
        self.check()?;
        let mut request = request.clone();
        device_id.clone_into(&mut request.device_id);
        Ok(HistoryResponse::new(&self.name, &request, Vec::new()))
    }

    async fn get_alarms(&self, _device_id: &str) -> ProviderResult<Vec<Alarm>> {
        self.check()?;
        Ok(self.alarms.clone())
    }

    async fn get_all_alarms(&self) -> ProviderResult<Vec<Alarm>> {
        self.check()?;
        Ok(self.alarms.clone())
    }

    async fn healthy(&self) -> bool {
        !self.unhealthy
    }

    fn close(&self) -> ProviderResult<()> {
        self.close_calls.fetch_add(1, Ordering::SeqCst);
        if self.close_fails {
            return Err(ProviderError::Config("close failed".to_owned()));
        }
        Ok(())
    }
}
