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

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Errors raised by a provider adapter
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API returned error status {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("{provider}: missing required credential '{key}'")]
    MissingCredential { provider: String, key: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{provider} API error {code}: {message}")]
    Vendor {
        provider: String,
        code: String,
        message: String,
    },

    #[error("{provider} does not support {operation}: {hint}")]
    NotSupported {
        provider: String,
        operation: String,
        hint: String,
    },

    #[error("{provider}: no data returned for {operation}")]
    NoData { provider: String, operation: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{provider} {operation} failed: {source}")]
    Operation {
        provider: String,
        operation: String,
        #[source]
        source: Box<ProviderError>,
    },
}

impl ProviderError {
    /// Wrap an error with the vendor operation that produced it
    #[must_use]
    pub fn during(self, provider: &str, operation: &str) -> Self {
        Self::Operation {
            provider: provider.to_owned(),
            operation: operation.to_owned(),
            source: Box::new(self),
        }
    }

    #[must_use]
    pub fn not_supported(provider: &str, operation: &str, hint: &str) -> Self {
        Self::NotSupported {
            provider: provider.to_owned(),
            operation: operation.to_owned(),
            hint: hint.to_owned(),
        }
    }

    #[must_use]
    pub fn no_data(provider: &str, operation: &str) -> Self {
        Self::NoData {
            provider: provider.to_owned(),
            operation: operation.to_owned(),
        }
    }

    /// True when the provider lacks the capability, looking through operation context
    #[must_use]
    pub fn is_not_supported(&self) -> bool {
        if let Self::Operation { source, .. } = self {
            return source.is_not_supported();
        }
        matches!(self, Self::NotSupported { .. })
    }

    /// True for 401/403 style failures, looking through operation context
    #[must_use]
    pub fn is_auth_failure(&self) -> bool {
        if let Self::Operation { source, .. } = self {
            return source.is_auth_failure();
        }
        matches!(
            self,
            Self::AuthenticationFailed(_) | Self::MissingCredential { .. }
        )
    }
}

pub type ProviderResult<T> = Result<T, ProviderError>;

/// Registry lookup failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Unknown provider type: '{name}'. Registered types: {}", registered.join(", "))]
    UnknownProviderType {
        name: String,
        registered: Vec<String>,
    },
}

/// One provider's failure inside an aggregate query
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderFailure {
    pub provider: String,
    pub error: String,
}

impl ProviderFailure {
    #[must_use]
    pub fn new(provider: impl Into<String>, error: impl fmt::Display) -> Self {
        Self {
            provider: provider.into(),
            error: error.to_string(),
        }
    }
}

impl fmt::Display for ProviderFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.provider, self.error)
    }
}

fn join_failures(failures: &[ProviderFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Errors returned by the normalization engine
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("provider not registered: {0}")]
    NotRegistered(String),

    #[error("all providers failed: {}", join_failures(failures))]
    AllProvidersFailed { failures: Vec<ProviderFailure> },

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

impl EngineError {
    #[must_use]
    pub fn is_not_supported(&self) -> bool {
        matches!(self, Self::Provider(err) if err.is_not_supported())
    }
}

pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_context_keeps_kind() {
        let err = ProviderError::not_supported("sma", "get_device_details", "use get_devices")
            .during("sma", "device details");
        assert!(err.is_not_supported());
        assert!(err.to_string().starts_with("sma device details failed"));

        let auth = ProviderError::AuthenticationFailed("token expired".to_owned())
            .during("saj", "realtime");
        assert!(auth.is_auth_failure());
        assert!(!auth.is_not_supported());
    }

    #[test]
    fn test_all_failed_message_lists_every_provider() {
        let err = EngineError::AllProvidersFailed {
            failures: vec![
                ProviderFailure::new("huawei", "login rejected"),
                ProviderFailure::new("sma", "timeout"),
            ],
        };
        let message = err.to_string();
        assert!(message.starts_with("all providers failed:"));
        assert!(message.contains("huawei: login rejected"));
        assert!(message.contains("sma: timeout"));
    }

    #[test]
    fn test_unknown_type_lists_registered() {
        let err = RegistryError::UnknownProviderType {
            name: "fronius".to_owned(),
            registered: vec!["huawei".to_owned(), "saj".to_owned()],
        };
        assert_eq!(
            err.to_string(),
            "Unknown provider type: 'fronius'. Registered types: huawei, saj"
        );
    }
}
