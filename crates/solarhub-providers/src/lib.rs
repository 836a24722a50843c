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

mod extract;
pub mod huawei;
pub mod saj;
pub mod sma;
pub mod sungrow;

pub use huawei::HuaweiProvider;
pub use saj::SajProvider;
pub use sma::SmaProvider;
pub use sungrow::SungrowProvider;

use solarhub_core::{Provider, ProviderRegistry};

/// Register every built-in vendor adapter under its provider type name
pub fn register_all(registry: &ProviderRegistry) {
    registry.register(huawei::PROVIDER_NAME, || {
        Box::new(HuaweiProvider::new()) as Box<dyn Provider>
    });
    registry.register(sungrow::PROVIDER_NAME, || {
        Box::new(SungrowProvider::new()) as Box<dyn Provider>
    });
    registry.register(saj::PROVIDER_NAME, || {
        Box::new(SajProvider::new()) as Box<dyn Provider>
    });
    registry.register(sma::PROVIDER_NAME, || {
        Box::new(SmaProvider::new()) as Box<dyn Provider>
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_all() {
        let registry = ProviderRegistry::new();
        register_all(&registry);

        assert_eq!(
            registry.list_providers(),
            vec!["huawei", "saj", "sma", "sungrow"]
        );
        for name in registry.list_providers() {
            let provider = registry.create(&name).unwrap();
            assert_eq!(provider.name(), name);
        }
        assert!(registry.create("growatt").is_err());
    }
}
