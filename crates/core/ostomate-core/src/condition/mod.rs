//! Condition annotations for reconciled food records
//!
//! Resolution order, first hit wins: annotation store (by id, then name),
//! curated table (record id, exact name, alias, fuzzy), keyword inference,
//! neutral default. Everything except store hits is cached by normalized
//! name for the lifetime of the resolver.

pub mod rules;

use crate::config::CoreConfig;
use crate::dataset::{CuratedDataset, MatchKind};
use crate::types::{AnnotatedFood, AnnotationSource, ConditionAnnotation, FoodRecord};
use crate::Result;
use async_trait::async_trait;
use futures_util::future::join_all;
use std::cmp::Reverse;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::{debug, warn};

/// Structured store of per-food annotations
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AnnotationStore: Send + Sync {
    /// Look an annotation up by food id or by name
    async fn lookup_annotation(&self, key: &str) -> Result<Option<ConditionAnnotation>>;
}

/// Attaches condition annotations to food records
pub struct ConditionResolver {
    store: Option<Arc<dyn AnnotationStore>>,
    dataset: Arc<CuratedDataset>,
    threshold: f32,
    cache: RwLock<HashMap<String, (ConditionAnnotation, AnnotationSource)>>,
}

impl ConditionResolver {
    /// Resolver over the embedded curated table
    pub fn new(config: &CoreConfig) -> Self {
        Self {
            store: None,
            dataset: CuratedDataset::global(),
            threshold: config.fuzzy_threshold,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Consult this store before anything else
    pub fn with_store(mut self, store: Arc<dyn AnnotationStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Use a different curated table
    pub fn with_dataset(mut self, dataset: Arc<CuratedDataset>) -> Self {
        self.dataset = dataset;
        self
    }

    /// Annotation for a record; always returns a value
    pub async fn annotate(&self, record: &FoodRecord) -> ConditionAnnotation {
        self.resolve(record).await.0
    }

    /// Annotation for a record together with the step that produced it
    pub async fn resolve(&self, record: &FoodRecord) -> (ConditionAnnotation, AnnotationSource) {
        if let Some(found) = self.from_store(record).await {
            return (found, AnnotationSource::Store);
        }

        let key = record.normalized_name();
        if key.is_empty() {
            return (ConditionAnnotation::neutral(), AnnotationSource::Default);
        }
        if let Some(hit) = self.cached(&key) {
            return hit;
        }

        let resolved = self.resolve_uncached(record);
        debug!(name = %record.name, source = ?resolved.1, "resolved condition annotation");
        if let Ok(mut cache) = self.cache.write() {
            cache.insert(key, resolved.clone());
        }
        resolved
    }

    /// Annotate every record, preserving order
    pub async fn annotate_all(&self, records: Vec<FoodRecord>) -> Vec<AnnotatedFood> {
        let resolved = join_all(records.iter().map(|r| self.resolve(r))).await;
        records
            .into_iter()
            .zip(resolved)
            .map(|(record, (annotation, annotation_source))| AnnotatedFood {
                record,
                annotation,
                annotation_source,
            })
            .collect()
    }

    /// Number of cached annotations
    pub fn cache_len(&self) -> usize {
        self.cache.read().map(|c| c.len()).unwrap_or(0)
    }

    /// Drop all cached annotations
    pub fn clear_cache(&self) {
        if let Ok(mut cache) = self.cache.write() {
            cache.clear();
        }
    }

    async fn from_store(&self, record: &FoodRecord) -> Option<ConditionAnnotation> {
        let store = self.store.as_ref()?;
        for key in [record.id.as_str(), record.name.trim()] {
            if key.is_empty() {
                continue;
            }
            match store.lookup_annotation(key).await {
                Ok(Some(found)) => {
                    let score = found.digestibility_score;
                    return Some(found.with_digestibility(score));
                }
                Ok(None) => {}
                Err(e) => warn!(key, error = %e, "annotation store lookup failed"),
            }
        }
        None
    }

    fn cached(&self, key: &str) -> Option<(ConditionAnnotation, AnnotationSource)> {
        self.cache.read().ok()?.get(key).cloned()
    }

    fn resolve_uncached(&self, record: &FoodRecord) -> (ConditionAnnotation, AnnotationSource) {
        if let Some(food) = self.dataset.get_by_record_id(&record.id) {
            return (food.annotation.clone(), AnnotationSource::CuratedExact);
        }

        if let Some(found) = self.dataset.find(&record.name, self.threshold) {
            let source = match found.kind {
                MatchKind::Exact => AnnotationSource::CuratedExact,
                MatchKind::Alias => AnnotationSource::CuratedAlias,
                MatchKind::Fuzzy => AnnotationSource::CuratedFuzzy,
            };
            return (found.food.annotation.clone(), source);
        }

        if let Some(inferred) = rules::infer(&record.name) {
            return (inferred, AnnotationSource::Inferred);
        }

        (ConditionAnnotation::neutral(), AnnotationSource::Default)
    }
}

/// Stable sort by friendliness score, best first; ties keep their order
pub fn rank_by_friendliness(foods: &mut [AnnotatedFood]) {
    foods.sort_by_key(|f| Reverse(f.friendliness_score()));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nlp;
    use crate::types::{Friendliness, ProviderId, SpiceLevel};
    use crate::OstomateError;

    fn resolver() -> ConditionResolver {
        ConditionResolver::new(&CoreConfig::default())
    }

    fn record(source: ProviderId, name: &str) -> FoodRecord {
        FoodRecord::new(source, nlp::fold(name).replace(' ', "-"), name)
    }

    #[tokio::test]
    async fn test_resolution_order() {
        let resolver = resolver();

        let (_, source) = resolver.resolve(&record(ProviderId::Local, "banana")).await;
        assert_eq!(source, AnnotationSource::CuratedExact);

        let (a, source) = resolver.resolve(&record(ProviderId::Crowd, "Chiken")).await;
        assert_eq!(source, AnnotationSource::CuratedAlias);
        assert_eq!(a.friendliness, Friendliness::Excellent);

        let (_, source) = resolver.resolve(&record(ProviderId::Crowd, "Brocolli")).await;
        assert_eq!(source, AnnotationSource::CuratedFuzzy);

        let (a, source) = resolver
            .resolve(&record(ProviderId::Government, "Vindaloo sauce"))
            .await;
        assert_eq!(source, AnnotationSource::Inferred);
        assert_eq!(a.spice_level, SpiceLevel::Hot);

        let (a, source) = resolver
            .resolve(&record(ProviderId::Premium, "Quark"))
            .await;
        assert_eq!(source, AnnotationSource::Default);
        assert_eq!(a, ConditionAnnotation::neutral());
    }

    #[tokio::test]
    async fn test_store_wins_and_is_not_cached() {
        let mut store = MockAnnotationStore::new();
        store.expect_lookup_annotation().times(2).returning(|key| {
            if key == "crowd:123" {
                let mut a = ConditionAnnotation::neutral();
                a.friendliness = Friendliness::Avoid;
                Ok(Some(a))
            } else {
                Ok(None)
            }
        });
        let resolver = resolver().with_store(Arc::new(store));

        let banana = FoodRecord::new(ProviderId::Crowd, "123", "Banana");
        for _ in 0..2 {
            let (a, source) = resolver.resolve(&banana).await;
            assert_eq!(source, AnnotationSource::Store);
            assert_eq!(a.friendliness, Friendliness::Avoid);
        }
        assert_eq!(resolver.cache_len(), 0);
    }

    #[tokio::test]
    async fn test_store_errors_fall_through() {
        let mut store = MockAnnotationStore::new();
        store
            .expect_lookup_annotation()
            .returning(|_| Err(OstomateError::store("connection refused")));
        let resolver = resolver().with_store(Arc::new(store));

        let (_, source) = resolver
            .resolve(&record(ProviderId::Crowd, "White Rice"))
            .await;
        assert_eq!(source, AnnotationSource::CuratedExact);
    }

    #[tokio::test]
    async fn test_name_lookup_after_id_miss() {
        let mut store = MockAnnotationStore::new();
        store.expect_lookup_annotation().returning(|key| {
            Ok((key == "Oat Milk").then(ConditionAnnotation::neutral))
        });
        let resolver = resolver().with_store(Arc::new(store));
        let (_, source) = resolver
            .resolve(&FoodRecord::new(ProviderId::Premium, 9, "Oat Milk"))
            .await;
        assert_eq!(source, AnnotationSource::Store);
    }

    #[tokio::test]
    async fn test_results_are_cached_by_name() {
        let resolver = resolver();
        resolver.annotate(&record(ProviderId::Crowd, "Popcorn")).await;
        resolver.annotate(&record(ProviderId::Government, "  POPCORN ")).await;
        assert_eq!(resolver.cache_len(), 1);
        resolver.clear_cache();
        assert_eq!(resolver.cache_len(), 0);
    }

    #[tokio::test]
    async fn test_blank_name_gets_default() {
        let (_, source) = resolver().resolve(&record(ProviderId::Crowd, "   ")).await;
        assert_eq!(source, AnnotationSource::Default);
    }

    #[tokio::test]
    async fn test_rank_is_stable() {
        let resolver = resolver();
        let records = ["Popcorn", "Banana", "Quark", "Eggs", "Broccoli", "Cheddar Cheese"]
            .iter()
            .map(|n| record(ProviderId::Crowd, n))
            .collect();
        let mut foods = resolver.annotate_all(records).await;
        rank_by_friendliness(&mut foods);
        let names: Vec<&str> = foods.iter().map(|f| f.record.name.as_str()).collect();
        // Quark (default), Eggs and Cheddar are all "good" and keep input order
        assert_eq!(
            names,
            vec!["Banana", "Quark", "Eggs", "Cheddar Cheese", "Broccoli", "Popcorn"]
        );
    }
}
