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

use crate::errors::RegistryError;
use crate::provider::Provider;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Factory producing a fresh, uninitialized provider instance
pub type ProviderConstructor = Arc<dyn Fn() -> Box<dyn Provider> + Send + Sync>;

/// Maps provider type names to constructors.
///
/// Built once in the composition root and passed by reference; there is no
/// process-wide instance.
#[derive(Default)]
pub struct ProviderRegistry {
    constructors: RwLock<HashMap<String, ProviderConstructor>>,
}

impl fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("providers", &self.list_providers())
            .finish()
    }
}

impl ProviderRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a constructor; a later registration under the same name replaces it
    pub fn register<F>(&self, name: &str, constructor: F)
    where
        F: Fn() -> Box<dyn Provider> + Send + Sync + 'static,
    {
        let previous = self
            .constructors
            .write()
            .insert(name.to_owned(), Arc::new(constructor));

        if previous.is_some() {
            debug!("🔁 [REGISTRY] Replaced provider constructor: {}", name);
        } else {
            debug!("📝 [REGISTRY] Registered provider: {}", name);
        }
    }

    pub fn create(&self, name: &str) -> Result<Box<dyn Provider>, RegistryError> {
        let constructor = self.constructors.read().get(name).cloned();

        match constructor {
            Some(constructor) => Ok(constructor()),
            None => Err(RegistryError::UnknownProviderType {
                name: name.to_owned(),
                registered: self.list_providers(),
            }),
        }
    }

    /// Registered names, sorted
    #[must_use]
    pub fn list_providers(&self) -> Vec<String> {
        let mut names: Vec<String> = self.constructors.read().keys().cloned().collect();
        names.sort();
        names
    }

    #[must_use]
    pub fn is_registered(&self, name: &str) -> bool {
        self.constructors.read().contains_key(name)
    }
}
