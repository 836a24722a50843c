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

//! Normalization engine: routes per-provider queries and fans out aggregates.
//!
//! Aggregates run one task per provider (or per plant) on a [`JoinSet`].
//! A failing branch is recorded and skipped; the aggregate only fails when
//! nothing was collected. Dropping an aggregate future aborts its branches.

use crate::errors::{EngineError, EngineResult, ProviderFailure};
use crate::provider::Provider;
use chrono::NaiveDate;
use parking_lot::RwLock;
use serde::Serialize;
use solarhub_types::{
    Alarm, Device, EnergySummary, HistoryRequest, HistoryResponse, Period, Plant, Realtime,
};
use std::collections::HashMap;
use std::fmt::{self, Display};
use std::future::Future;
use std::sync::Arc;
use tokio::task::{Id, JoinSet};
use tracing::{debug, error, info, warn};

/// Items collected by an aggregate plus the branches that failed
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateReport<T> {
    pub items: Vec<T>,
    pub failures: Vec<ProviderFailure>,
}

impl<T> Default for AggregateReport<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            failures: Vec::new(),
        }
    }
}

impl<T> AggregateReport<T> {
    /// Succeeds unless nothing was collected and at least one branch failed
    pub fn into_result(self) -> EngineResult<Vec<T>> {
        if self.items.is_empty() && !self.failures.is_empty() {
            return Err(EngineError::AllProvidersFailed {
                failures: self.failures,
            });
        }
        Ok(self.items)
    }
}

/// Run every job concurrently and drain all completions.
///
/// A panicking job is recorded as a failure of its label.
async fn fan_out<T, E, Fut>(operation: &str, jobs: Vec<(String, Fut)>) -> AggregateReport<T>
where
    T: Send + 'static,
    E: Display + Send + 'static,
    Fut: Future<Output = Result<Vec<T>, E>> + Send + 'static,
{
    let mut tasks = JoinSet::new();
    let mut labels: HashMap<Id, String> = HashMap::with_capacity(jobs.len());

    for (label, job) in jobs {
        let handle = tasks.spawn(job);
        labels.insert(handle.id(), label);
    }

    let mut report = AggregateReport::default();
    while let Some(joined) = tasks.join_next_with_id().await {
        let (label, outcome) = match joined {
            Ok((id, outcome)) => (labels.remove(&id).unwrap_or_default(), outcome),
            Err(join_error) => {
                let label = labels.remove(&join_error.id()).unwrap_or_default();
                error!("❌ [ENGINE] {} task for {} aborted: {}", operation, label, join_error);
                report.failures.push(ProviderFailure::new(label, join_error));
                continue;
            }
        };

        match outcome {
            Ok(items) => {
                debug!("   {} returned {} items for {}", label, items.len(), operation);
                report.items.extend(items);
            }
            Err(e) => {
                warn!("⚠️ [ENGINE] {} failed for {}: {}", operation, label, e);
                report.failures.push(ProviderFailure::new(label, e));
            }
        }
    }

    report
}

/// Owns the live provider instances and answers queries across them
#[derive(Default)]
pub struct NormalizationEngine {
    providers: RwLock<HashMap<String, Arc<dyn Provider>>>,
}

impl fmt::Debug for NormalizationEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NormalizationEngine")
            .field("providers", &self.provider_names())
            .finish()
    }
}

impl NormalizationEngine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an initialized provider under its own name, replacing any previous one
    pub fn register_provider(&self, provider: Arc<dyn Provider>) {
        let name = provider.name().to_owned();
        info!("✅ [ENGINE] Registered provider: {}", name);
        self.providers.write().insert(name, provider);
    }

    #[must_use]
    pub fn get_provider(&self, name: &str) -> Option<Arc<dyn Provider>> {
        self.providers.read().get(name).cloned()
    }

    /// Registered provider names, sorted
    #[must_use]
    pub fn provider_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.providers.read().keys().cloned().collect();
        names.sort();
        names
    }

    // The read lock is released before the caller awaits anything.
    fn snapshot(&self) -> Vec<(String, Arc<dyn Provider>)> {
        self.providers
            .read()
            .iter()
            .map(|(name, provider)| (name.clone(), Arc::clone(provider)))
            .collect()
    }

    fn provider(&self, name: &str) -> EngineResult<Arc<dyn Provider>> {
        self.get_provider(name)
            .ok_or_else(|| EngineError::NotRegistered(name.to_owned()))
    }

    // ============= Routed Queries =============

    pub async fn get_plant_details(&self, provider: &str, plant_id: &str) -> EngineResult<Plant> {
        Ok(self.provider(provider)?.get_plant_details(plant_id).await?)
    }

    pub async fn get_devices(&self, provider: &str, plant_id: &str) -> EngineResult<Vec<Device>> {
        Ok(self.provider(provider)?.get_devices(plant_id).await?)
    }

    pub async fn get_device_details(&self, provider: &str, device_id: &str) -> EngineResult<Device> {
        Ok(self.provider(provider)?.get_device_details(device_id).await?)
    }

    pub async fn get_realtime_data(
        &self,
        provider: &str,
        device_id: &str,
    ) -> EngineResult<Realtime> {
        Ok(self.provider(provider)?.get_realtime_data(device_id).await?)
    }

    pub async fn get_energy_stats(
        &self,
        provider: &str,
        plant_id: &str,
        period: Period,
        date: NaiveDate,
    ) -> EngineResult<EnergySummary> {
        Ok(self
            .provider(provider)?
            .get_energy_stats(plant_id, period, date)
            .await?)
    }

    pub async fn get_historical_data(
        &self,
        provider: &str,
        request: &HistoryRequest,
    ) -> EngineResult<HistoryResponse> {
        Ok(self
            .provider(provider)?
            .get_historical_data(&request.device_id, request)
            .await?)
    }

    pub async fn get_device_alarms(
        &self,
        provider: &str,
        device_id: &str,
    ) -> EngineResult<Vec<Alarm>> {
        Ok(self.provider(provider)?.get_alarms(device_id).await?)
    }

    // ============= Aggregates =============

    pub async fn get_all_plants_with_report(&self) -> AggregateReport<Plant> {
        let jobs = self
            .snapshot()
            .into_iter()
            .map(|(name, provider)| (name, async move { provider.get_plants().await }))
            .collect::<Vec<_>>();

        info!("🔄 [ENGINE] Fetching plants from {} providers", jobs.len());
        let report = fan_out("get_plants", jobs).await;
        info!(
            "✅ [ENGINE] Collected {} plants ({} providers failed)",
            report.items.len(),
            report.failures.len()
        );
        report
    }

    /// Plants from every provider; fails only when all of them failed
    pub async fn get_all_plants(&self) -> EngineResult<Vec<Plant>> {
        let report = self.get_all_plants_with_report().await;
        let result = report.into_result();
        if let Err(e) = &result {
            error!("❌ [ENGINE] {}", e);
        }
        result
    }

    /// Devices of every plant. Plant failures are logged and skipped.
    pub async fn get_all_devices(&self) -> EngineResult<Vec<Device>> {
        let plants = self.get_all_plants().await?;

        let jobs = plants
            .into_iter()
            .map(|plant| {
                let provider = self.get_provider(&plant.provider);
                let label = format!("{}/{}", plant.provider, plant.meta.provider_plant_id);
                let job = async move {
                    let Some(provider) = provider else {
                        return Err(EngineError::NotRegistered(plant.provider));
                    };
                    Ok(provider.get_devices(&plant.meta.provider_plant_id).await?)
                };
                (label, job)
            })
            .collect::<Vec<_>>();

        info!("🔄 [ENGINE] Fetching devices for {} plants", jobs.len());
        let report = fan_out("get_devices", jobs).await;
        Ok(report.items)
    }

    pub async fn get_all_alarms_with_report(&self) -> AggregateReport<Alarm> {
        let jobs = self
            .snapshot()
            .into_iter()
            .map(|(name, provider)| (name, async move { provider.get_all_alarms().await }))
            .collect::<Vec<_>>();

        fan_out("get_all_alarms", jobs).await
    }

    /// Alarms from every provider; provider failures are skipped
    pub async fn get_all_alarms(&self) -> Vec<Alarm> {
        self.get_all_alarms_with_report().await.items
    }

    /// Liveness per provider, without network I/O
    pub async fn health_check(&self) -> HashMap<String, bool> {
        let mut health = HashMap::new();
        for (name, provider) in self.snapshot() {
            let healthy = provider.healthy().await;
            if !healthy {
                warn!("⚠️ [ENGINE] Provider {} reports unhealthy", name);
            }
            health.insert(name, healthy);
        }
        health
    }

    /// Close every provider; failures are logged and never stop the sweep
    pub fn close(&self) {
        for (name, provider) in self.snapshot() {
            match provider.close() {
                Ok(()) => debug!("   Closed provider {}", name),
                Err(e) => error!("❌ [ENGINE] Failed to close provider {}: {}", name, e),
            }
        }
        info!("👋 [ENGINE] All providers closed");
    }
}
