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

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use solarhub_core::EngineError;
use tracing::error;

/// Response metadata attached to every envelope
#[derive(Debug, Clone, Serialize)]
pub struct ResponseMeta {
    /// Item count for list responses
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<usize>,
    /// RFC 3339 generation time
    pub timestamp: String,
}

impl ResponseMeta {
    fn now(total: Option<usize>) -> Self {
        Self {
            total,
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        }
    }
}

/// JSON envelope returned by every route
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<ResponseMeta>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            meta: Some(ResponseMeta::now(None)),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
            meta: Some(ResponseMeta::now(None)),
        }
    }
}

impl<T> ApiResponse<Vec<T>> {
    /// List payload with `meta.total` set to its length
    pub fn list(items: Vec<T>) -> Self {
        let total = items.len();
        Self {
            success: true,
            data: Some(items),
            error: None,
            meta: Some(ResponseMeta::now(Some(total))),
        }
    }
}

pub type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

/// Failures a handler can answer with
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    NotImplemented(String),
    Internal,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::NotImplemented(_) => StatusCode::NOT_IMPLEMENTED,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        if err.is_not_supported() {
            return Self::NotImplemented(err.to_string());
        }
        match err {
            EngineError::NotRegistered(name) => {
                Self::NotFound(format!("Provider '{name}' is not registered"))
            }
            EngineError::Registry(e) => Self::NotFound(e.to_string()),
            e @ (EngineError::AllProvidersFailed { .. } | EngineError::Provider(_)) => {
                error!("❌ [API] Request failed: {}", e);
                Self::Internal
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            Self::BadRequest(m) | Self::NotFound(m) | Self::NotImplemented(m) => m,
            Self::Internal => INTERNAL_ERROR_MESSAGE.to_owned(),
        };
        (status, Json(ApiResponse::<()>::failure(message))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use solarhub_core::{ProviderError, ProviderFailure};

    #[test]
    fn test_list_sets_total() {
        let response = ApiResponse::list(vec![1, 2, 3]);
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["meta"]["total"], 3);
        assert!(json.get("error").is_none());
    }

    #[test]
    fn test_engine_errors_map_to_status() {
        let not_found: ApiError = EngineError::NotRegistered("growatt".to_owned()).into();
        assert_eq!(not_found.status(), StatusCode::NOT_FOUND);

        let unsupported: ApiError = EngineError::Provider(
            ProviderError::not_supported("sma", "get_device_details", "use get_devices")
                .during("sma", "device details"),
        )
        .into();
        assert_eq!(unsupported.status(), StatusCode::NOT_IMPLEMENTED);

        let failed: ApiError = EngineError::AllProvidersFailed {
            failures: vec![ProviderFailure::new("saj", "timeout")],
        }
        .into();
        assert_eq!(failed.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
