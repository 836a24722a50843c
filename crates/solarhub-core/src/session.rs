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

use crate::errors::ProviderResult;
use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use std::future::Future;
use tokio::sync::Mutex;
use tracing::debug;

/// Vendor session credential with optional expiry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionToken {
    pub value: String,
    pub expires_at: Option<DateTime<Utc>>,
}

impl SessionToken {
    /// Token that never expires on our side
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            expires_at: None,
        }
    }

    #[must_use]
    pub fn expiring_in(value: impl Into<String>, ttl: Duration) -> Self {
        Self {
            value: value.into(),
            expires_at: Some(Utc::now() + ttl),
        }
    }

    /// Usable for at least `margin` more
    #[must_use]
    pub fn is_fresh(&self, margin: Duration) -> bool {
        !self.value.is_empty() && self.expires_at.is_none_or(|at| Utc::now() + margin < at)
    }
}

/// Cached session with single-flight refresh.
///
/// Concurrent callers that find the token stale queue on the refresh gate;
/// the first one refreshes, the rest see the new token on re-check.
#[derive(Debug, Default)]
pub struct SessionCache {
    token: RwLock<Option<SessionToken>>,
    refresh_gate: Mutex<()>,
}

impl SessionCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn current(&self) -> Option<SessionToken> {
        self.token.read().clone()
    }

    pub fn store(&self, token: SessionToken) {
        *self.token.write() = Some(token);
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.token
            .read()
            .as_ref()
            .is_some_and(|token| token.is_fresh(Duration::zero()))
    }

    pub fn clear(&self) {
        *self.token.write() = None;
    }

    /// Drop the cached token only if it is still `value`.
    ///
    /// Returns false when another caller already replaced it.
    pub fn invalidate(&self, value: &str) -> bool {
        let mut token = self.token.write();
        if token.as_ref().is_some_and(|t| t.value == value) {
            *token = None;
            return true;
        }
        false
    }

    fn fresh_value(&self, margin: Duration) -> Option<String> {
        self.token
            .read()
            .as_ref()
            .filter(|token| token.is_fresh(margin))
            .map(|token| token.value.clone())
    }

    /// Return the cached token value, refreshing it first when it expires within `margin`
    pub async fn get_or_refresh<F, Fut>(&self, margin: Duration, refresh: F) -> ProviderResult<String>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = ProviderResult<SessionToken>>,
    {
        if let Some(value) = self.fresh_value(margin) {
            return Ok(value);
        }

        let _gate = self.refresh_gate.lock().await;

        // another caller may have refreshed while we waited
        if let Some(value) = self.fresh_value(margin) {
            return Ok(value);
        }

        debug!("🔑 [SESSION] Refreshing session token");
        let token = refresh().await?;
        let value = token.value.clone();
        self.store(token);
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ProviderError;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_concurrent_callers_refresh_once() {
        let cache = Arc::new(SessionCache::new());
        let refreshes = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let cache = Arc::clone(&cache);
            let refreshes = Arc::clone(&refreshes);
            handles.push(tokio::spawn(async move {
                cache
                    .get_or_refresh(Duration::minutes(5), || async {
                        refreshes.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
                        Ok(SessionToken::expiring_in("tok-1", Duration::hours(2)))
                    })
                    .await
            }));
        }

        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap(), "tok-1");
        }
        assert_eq!(refreshes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_token_inside_margin_is_refreshed() {
        let cache = SessionCache::new();
        cache.store(SessionToken::expiring_in("old", Duration::minutes(2)));
        assert!(cache.is_valid());

        let value = cache
            .get_or_refresh(Duration::minutes(5), || async {
                Ok(SessionToken::expiring_in("new", Duration::hours(1)))
            })
            .await
            .unwrap();
        assert_eq!(value, "new");
    }

    #[tokio::test]
    async fn test_failed_refresh_leaves_cache_empty() {
        let cache = SessionCache::new();
        let err = cache
            .get_or_refresh(Duration::zero(), || async {
                Err(ProviderError::AuthenticationFailed("bad secret".to_owned()))
            })
            .await
            .unwrap_err();

        assert!(err.is_auth_failure());
        assert!(cache.current().is_none());
        assert!(!cache.is_valid());
    }

    #[test]
    fn test_clear_and_expiry() {
        let cache = SessionCache::new();
        cache.store(SessionToken::new("forever"));
        assert!(cache.is_valid());

        cache.store(SessionToken {
            value: "stale".to_owned(),
            expires_at: Some(Utc::now() - Duration::seconds(1)),
        });
        assert!(!cache.is_valid());

        cache.clear();
        assert!(cache.current().is_none());
    }

    #[test]
    fn test_invalidate_keeps_newer_token() {
        let cache = SessionCache::new();
        cache.store(SessionToken::new("tok-2"));

        // a late rejection of the previous token must not drop its replacement
        assert!(!cache.invalidate("tok-1"));
        assert_eq!(cache.current().unwrap().value, "tok-2");

        assert!(cache.invalidate("tok-2"));
        assert!(cache.current().is_none());
        assert!(!cache.invalidate("tok-2"));
    }
}
