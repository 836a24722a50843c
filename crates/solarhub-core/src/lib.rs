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

pub mod engine;
pub mod errors;
pub mod http;
pub mod provider;
pub mod rate_limit;
pub mod registry;
pub mod session;
pub mod units;

#[cfg(test)]
pub(crate) mod testing;

pub use engine::{AggregateReport, NormalizationEngine};
pub use errors::{
    EngineError, EngineResult, ProviderError, ProviderFailure, ProviderResult, RegistryError,
};
pub use http::VendorHttpClient;
pub use provider::{Provider, ProviderConfig};
pub use rate_limit::RateLimiter;
pub use registry::{ProviderConstructor, ProviderRegistry};
pub use session::{SessionCache, SessionToken};
