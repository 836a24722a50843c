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
use crate::provider::ProviderConfig;
use crate::rate_limit::RateLimiter;
use parking_lot::RwLock;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt;
use std::time::Duration;
use tracing::{debug, error, trace, warn};

const BODY_SNIPPET_BYTES: usize = 200;

/// JSON-over-HTTP client shared by all calls of one adapter.
///
/// Every request waits for a rate-limit slot, carries the shared session
/// headers and is retried with exponential backoff on network errors and 5xx.
pub struct VendorHttpClient {
    provider: String,
    base_url: String,
    client: Client,
    headers: RwLock<HeaderMap>,
    limiter: RateLimiter,
    max_retries: u32,
    retry_delay: Duration,
}

impl fmt::Debug for VendorHttpClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VendorHttpClient")
            .field("provider", &self.provider)
            .field("base_url", &self.base_url)
            .field("rate_limit_period", &self.limiter.period())
            .field("max_retries", &self.max_retries)
            .finish_non_exhaustive()
    }
}

impl VendorHttpClient {
    pub fn new(
        provider: &str,
        base_url: impl Into<String>,
        timeout: Duration,
        rate_limit_rps: f64,
    ) -> ProviderResult<Self> {
        let client = Client::builder().timeout(timeout).build().map_err(|e| {
            ProviderError::Config(format!("Failed to build HTTP client for {provider}: {e}"))
        })?;

        Ok(Self {
            provider: provider.to_owned(),
            base_url: base_url.into(),
            client,
            headers: RwLock::new(HeaderMap::new()),
            limiter: RateLimiter::per_second(rate_limit_rps),
            max_retries: 3,
            retry_delay: Duration::from_secs(1),
        })
    }

    /// Client configured from a provider entry, falling back to vendor defaults
    pub fn from_config(
        provider: &str,
        config: &ProviderConfig,
        default_base_url: &str,
        default_rps: f64,
    ) -> ProviderResult<Self> {
        Self::new(
            provider,
            config.base_url_or(default_base_url),
            config.timeout(),
            config.rate_limit_or(default_rps),
        )
    }

    /// Set custom retry configuration
    #[must_use]
    pub fn with_retry_config(mut self, max_retries: u32, retry_delay: Duration) -> Self {
        self.max_retries = max_retries.max(1);
        self.retry_delay = retry_delay;
        self
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Add or replace a header sent with every subsequent request
    pub fn set_header(&self, name: &str, value: &str) -> ProviderResult<()> {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| ProviderError::Config(format!("Invalid header name '{name}': {e}")))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| ProviderError::Config(format!("Invalid header value for {name}: {e}")))?;
        self.headers.write().insert(name, value);
        Ok(())
    }

    pub fn remove_header(&self, name: &str) {
        self.headers.write().remove(name);
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> ProviderResult<T> {
        let url = self.url(path);
        debug!("🔍 [{}] GET {}", self.provider, path);

        let response = self
            .send(|| self.client.get(&url).query(query))
            .await?;
        decode(response).await
    }

    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> ProviderResult<T>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let (value, _) = self.post_json_with_headers(path, body).await?;
        Ok(value)
    }

    /// POST returning the response headers too, for vendors that hand out tokens in headers
    pub async fn post_json_with_headers<B, T>(
        &self,
        path: &str,
        body: &B,
    ) -> ProviderResult<(T, HeaderMap)>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let url = self.url(path);
        debug!("📤 [{}] POST {}", self.provider, path);

        let response = self
            .send(|| self.client.post(&url).json(body))
            .await?;
        let headers = response.headers().clone();
        let value = decode(response).await?;
        Ok((value, headers))
    }

    async fn send<F>(&self, build: F) -> ProviderResult<Response>
    where
        F: Fn() -> RequestBuilder,
    {
        let mut attempts = 0;
        let mut delay = self.retry_delay;

        loop {
            attempts += 1;
            self.limiter.acquire().await;

            let headers = self.headers.read().clone();
            let outcome = build().headers(headers).send().await;

            let retry_reason = match outcome {
                Ok(response) if response.status().is_success() => return Ok(response),
                Ok(response) if response.status().is_server_error() => {
                    if attempts >= self.max_retries {
                        return Err(status_error(response).await);
                    }
                    format!("status {}", response.status())
                }
                Ok(response) => return Err(status_error(response).await),
                Err(e) if attempts >= self.max_retries => {
                    error!(
                        "❌ [{}] Request failed after {} attempts: {}",
                        self.provider, attempts, e
                    );
                    return Err(ProviderError::Http(e));
                }
                Err(e) => e.to_string(),
            };

            warn!(
                "⚠️ [{}] Request failed (attempt {}/{}): {}. Retrying in {:?}",
                self.provider, attempts, self.max_retries, retry_reason, delay
            );
            tokio::time::sleep(delay).await;
            delay *= 2; // Exponential backoff
        }
    }
}

async fn status_error(response: Response) -> ProviderError {
    let status = response.status();
    let message = response.text().await.unwrap_or_default();

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            error!("❌ [HTTP] Authentication rejected ({})", status);
            ProviderError::AuthenticationFailed(format!("status {}: {}", status.as_u16(), message))
        }
        _ => {
            error!("❌ [HTTP] Status {}: {}", status, message);
            ProviderError::Api {
                status: status.as_u16(),
                message,
            }
        }
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> ProviderResult<T> {
    let bytes = response.bytes().await?;
    trace!("   Body: {} bytes", bytes.len());

    serde_json::from_slice(&bytes).map_err(|e| {
        let snippet = bytes.get(..BODY_SNIPPET_BYTES).unwrap_or(&bytes);
        ProviderError::InvalidResponse(format!(
            "failed to decode response: {e}; body: {}",
            String::from_utf8_lossy(snippet)
        ))
    })
}
