//! Process-wide owner of the compiled rating model.
//!
//! The first `compile` builds the model; later calls reuse it. `reload` rebuilds from a
//! fresh read of the source and swaps the published `Arc` in one step. Readers hold
//! their own `Arc`, so a quote that started before a reload finishes on the old model.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use arc_swap::ArcSwapOption;
use tracing::{info, warn};

use crate::rating::compiler::{compile_generation, CompileError, CompiledRatingModel};
use crate::rating::source::RateSource;

pub struct ModelRegistry {
    source: Arc<dyn RateSource>,
    current: ArcSwapOption<CompiledRatingModel>,
    reload_lock: Mutex<()>,
    generation: AtomicU64,
}

impl ModelRegistry {
    pub fn new(source: Arc<dyn RateSource>) -> Self {
        Self {
            source,
            current: ArcSwapOption::empty(),
            reload_lock: Mutex::new(()),
            generation: AtomicU64::new(0),
        }
    }

    pub fn source(&self) -> &Arc<dyn RateSource> {
        &self.source
    }

    /// The published snapshot, if one has been compiled.
    pub fn current(&self) -> Option<Arc<CompiledRatingModel>> {
        self.current.load_full()
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Returns the published snapshot, compiling it on first use.
    pub fn compile(&self) -> Result<Arc<CompiledRatingModel>, CompileError> {
        if let Some(model) = self.current.load_full() {
            return Ok(model);
        }

        let _guard = self.reload_lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(model) = self.current.load_full() {
            return Ok(model);
        }
        self.build_and_publish()
    }

    /// Drops cached documents, recompiles, and publishes the new model.
    ///
    /// On failure the previously published model stays in place.
    pub fn reload(&self) -> Result<Arc<CompiledRatingModel>, CompileError> {
        let _guard = self.reload_lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        self.source.invalidate();

        match self.build_and_publish() {
            Ok(model) => {
                info!(
                    event_name = "rating.model.reloaded",
                    generation = model.generation(),
                    "rating model reloaded"
                );
                Ok(model)
            }
            Err(error) => {
                warn!(
                    event_name = "rating.model.reload_failed",
                    error = %error,
                    kept_generation = self.generation(),
                    "rating model reload failed; keeping current model"
                );
                Err(error)
            }
        }
    }

    // Caller holds `reload_lock`.
    fn build_and_publish(&self) -> Result<Arc<CompiledRatingModel>, CompileError> {
        let next = self.generation() + 1;
        let model = Arc::new(compile_generation(self.source.as_ref(), next)?);
        self.current.store(Some(Arc::clone(&model)));
        self.generation.store(next, Ordering::Release);
        Ok(model)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{HashMap, HashSet};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::thread;

    use rust_decimal::Decimal;
    use serde_json::json;

    use super::ModelRegistry;
    use crate::domain::rates::RateConfiguration;
    use crate::domain::request::QuoteRequest;
    use crate::domain::vertical::InsuranceType;
    use crate::rating::compiler::CompiledRatingModel;
    use crate::rating::engine::{EngineOptions, RatingEngine};
    use crate::rating::source::{InMemoryRateSource, RateSource};
    use crate::rating::test_support::{dec, sample_configuration};
    use crate::rating::variance::NoVariance;

    fn registry() -> (Arc<InMemoryRateSource>, ModelRegistry) {
        let source = Arc::new(
            InMemoryRateSource::from_configuration(&sample_configuration()).expect("source"),
        );
        let registry = ModelRegistry::new(Arc::clone(&source) as Arc<dyn RateSource>);
        (source, registry)
    }

    #[test]
    fn compile_is_lazy_and_cached() {
        let (source, registry) = registry();
        assert!(registry.current().is_none());

        let first = registry.compile().expect("compile");
        let loads_after_first = source.loads();
        let second = registry.compile().expect("compile again");

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(source.loads(), loads_after_first);
        assert_eq!(first.generation(), 1);
    }

    #[test]
    fn reload_publishes_new_generation_and_keeps_old_snapshot_intact() {
        let (source, registry) = registry();
        let before = registry.compile().expect("compile");

        source.insert("credit-factors", json!({ "tiers": { "excellent": 0.5 } }));
        let after = registry.reload().expect("reload");

        assert_eq!(after.generation(), 2);
        assert_eq!(registry.generation(), 2);
        assert_eq!(after.credit_multiplier(Some("excellent")), dec("0.5"));
        assert_eq!(before.credit_multiplier(Some("excellent")), dec("0.85"));
        let published = registry.current().expect("published");
        assert!(Arc::ptr_eq(&published, &after));
    }

    #[test]
    fn reload_with_unchanged_source_reproduces_lookups() {
        let (_source, registry) = registry();
        let before = registry.compile().expect("compile");
        let after = registry.reload().expect("reload");

        for age in [10, 16, 24, 35, 70, 120] {
            assert_eq!(before.age_multiplier(age), after.age_multiplier(age));
        }
        assert_eq!(before.summary().indexed_rates, after.summary().indexed_rates);
        assert_eq!(before.credit_multiplier(Some("poor")), after.credit_multiplier(Some("poor")));
    }

    #[test]
    fn failed_reload_keeps_previous_snapshot() {
        let (source, registry) = registry();
        let before = registry.compile().expect("compile");

        source.insert("age-factors", json!({ "brackets": "broken" }));
        assert!(registry.reload().is_err());

        let current = registry.current().expect("still published");
        assert!(Arc::ptr_eq(&current, &before));
        assert_eq!(registry.generation(), 1);
    }

    #[test]
    fn concurrent_first_compile_builds_once() {
        let (_source, registry) = registry();
        let registry = Arc::new(registry);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = Arc::clone(&registry);
                thread::spawn(move || registry.compile().expect("compile").generation())
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().expect("join"), 1);
        }
        assert_eq!(registry.generation(), 1);
    }

    fn configuration_for(generation: u64) -> RateConfiguration {
        let mut configuration = sample_configuration();
        configuration
            .base_rates
            .auto
            .insert("CA".to_string(), Decimal::from(2_000 + 100 * generation));
        configuration
    }

    fn neutral_engine() -> RatingEngine<NoVariance> {
        RatingEngine::with_variance(
            NoVariance,
            EngineOptions { variance_enabled: false, reference_year: 2025, include_breakdown: false },
        )
    }

    fn summit_premium(model: &CompiledRatingModel) -> i64 {
        let request = QuoteRequest::new("CA", InsuranceType::Auto);
        neutral_engine()
            .generate_quotes(model, &request)
            .find("summit")
            .map(|quote| quote.monthly_premium)
            .expect("summit quote")
    }

    #[test]
    fn quotes_in_flight_during_reloads_price_from_their_own_generation() {
        let (source, registry) = registry();
        source.insert(
            "base-rates",
            serde_json::to_value(&configuration_for(1).base_rates).expect("base rates"),
        );
        let registry = Arc::new(registry);
        registry.compile().expect("compile");

        let expected: HashMap<u64, i64> = (1..=6)
            .map(|generation| {
                let model = CompiledRatingModel::from_configuration(
                    configuration_for(generation),
                    generation,
                )
                .expect("reference model");
                (generation, summit_premium(&model))
            })
            .collect();
        assert_eq!(expected.values().collect::<HashSet<_>>().len(), 6);

        let done = Arc::new(AtomicBool::new(false));

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let registry = Arc::clone(&registry);
                let done = Arc::clone(&done);
                thread::spawn(move || {
                    let engine = neutral_engine();
                    let request = QuoteRequest::new("CA", InsuranceType::Auto);
                    let mut observed = Vec::new();
                    while observed.is_empty() || !done.load(Ordering::Acquire) {
                        let model = registry.current().expect("published");
                        let result = engine.generate_quotes(&model, &request);
                        let summit = result.find("summit").expect("summit quote");
                        observed.push((result.metadata.model_generation, summit.monthly_premium));
                    }
                    observed
                })
            })
            .collect();

        for generation in 2..=6 {
            let base_rates = configuration_for(generation).base_rates;
            source.insert("base-rates", serde_json::to_value(&base_rates).expect("base rates"));

            let model = registry.reload().expect("reload");
            assert_eq!(model.generation(), generation);
        }
        done.store(true, Ordering::Release);

        for reader in readers {
            for (generation, premium) in reader.join().expect("join") {
                assert_eq!(Some(&premium), expected.get(&generation), "generation {generation}");
            }
        }
    }
}
