//! The pipeline facade consumed by front ends

use crate::aggregator::{Aggregator, SearchOptions, SearchOutcome};
use crate::condition::{rank_by_friendliness, AnnotationStore, ConditionResolver};
use crate::config::CoreConfig;
use crate::dataset::{CuratedDataset, LocalDatasetProvider};
use crate::extractor::{EntryExtractor, EntryModel, Extraction, LocalExtractor};
use crate::provider::FoodProvider;
use crate::types::{AnnotatedFood, ConditionAnnotation, FoodRecord, ParsedLogEntry};
use crate::utils::Logger;
use chrono::{DateTime, FixedOffset};
use std::sync::Arc;

/// Builder for [`Ostomate`]
pub struct OstomateBuilder {
    config: CoreConfig,
    providers: Vec<Arc<dyn FoodProvider>>,
    include_local: bool,
    dataset: Arc<CuratedDataset>,
    model: Option<Arc<dyn EntryModel>>,
    store: Option<Arc<dyn AnnotationStore>>,
}

impl OstomateBuilder {
    /// Start from a configuration
    pub fn new(config: CoreConfig) -> Self {
        Self {
            config,
            providers: Vec::new(),
            include_local: true,
            dataset: CuratedDataset::global(),
            model: None,
            store: None,
        }
    }

    /// Register a remote food provider
    pub fn provider(mut self, provider: Arc<dyn FoodProvider>) -> Self {
        self.providers.push(provider);
        self
    }

    /// Do not register the curated table as a search provider
    pub fn without_local_provider(mut self) -> Self {
        self.include_local = false;
        self
    }

    /// Replace the curated table used for search, annotation and grounding
    pub fn dataset(mut self, dataset: Arc<CuratedDataset>) -> Self {
        self.dataset = dataset;
        self
    }

    /// Language model tried before the local extraction pass
    pub fn model(mut self, model: Arc<dyn EntryModel>) -> Self {
        self.model = Some(model);
        self
    }

    /// Annotation store consulted before the curated table
    pub fn annotation_store(mut self, store: Arc<dyn AnnotationStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Assemble the pipeline
    pub fn build(self) -> Ostomate {
        let config = self.config;

        let mut aggregator = Aggregator::empty(&config);
        if self.include_local {
            aggregator.register(Arc::new(LocalDatasetProvider::new(
                self.dataset.clone(),
                config.fuzzy_threshold,
            )));
        }
        for provider in self.providers {
            aggregator.register(provider);
        }
        let aggregator = Arc::new(aggregator);

        let mut resolver = ConditionResolver::new(&config).with_dataset(self.dataset.clone());
        if let Some(store) = self.store {
            resolver = resolver.with_store(store);
        }

        let local = LocalExtractor::new(aggregator.clone(), &config).with_dataset(self.dataset);
        let mut extractor = EntryExtractor::new(local, config.model_timeout);
        if let Some(model) = self.model {
            extractor = extractor.with_model(model);
        }

        let logger = Logger::new("ostomate");
        logger.debug(&format!(
            "pipeline ready: providers={:?} model={}",
            aggregator.provider_ids(),
            extractor.has_model()
        ));

        Ostomate {
            config,
            aggregator,
            resolver,
            extractor,
        }
    }
}

/// Food search, annotation and daily-log extraction
pub struct Ostomate {
    config: CoreConfig,
    aggregator: Arc<Aggregator>,
    resolver: ConditionResolver,
    extractor: EntryExtractor,
}

impl Ostomate {
    /// Pipeline with only the curated table and no language model
    pub fn new(config: CoreConfig) -> Self {
        OstomateBuilder::new(config).build()
    }

    /// Start building a pipeline
    pub fn builder(config: CoreConfig) -> OstomateBuilder {
        OstomateBuilder::new(config)
    }

    /// Active configuration
    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    /// The underlying aggregator
    pub fn aggregator(&self) -> &Arc<Aggregator> {
        &self.aggregator
    }

    /// Search options built from the configured defaults
    pub fn default_search_options(&self) -> SearchOptions {
        SearchOptions::default()
            .with_providers(self.config.enabled_providers.clone())
            .with_limit(self.config.default_limit)
    }

    /// Ranked, deduplicated records across providers
    pub async fn search(&self, query: &str, options: &SearchOptions) -> Vec<FoodRecord> {
        self.aggregator.search(query, options).await
    }

    /// Search with per-provider diagnostics
    pub async fn search_detailed(&self, query: &str, options: &SearchOptions) -> SearchOutcome {
        self.aggregator.search_detailed(query, options).await
    }

    /// Search, annotate every record, then stable-sort by friendliness
    pub async fn search_annotated(&self, query: &str, options: &SearchOptions) -> Vec<AnnotatedFood> {
        let records = self.aggregator.search(query, options).await;
        let mut foods = self.resolver.annotate_all(records).await;
        rank_by_friendliness(&mut foods);
        foods
    }

    /// Look a barcode up across the enabled providers
    pub async fn lookup_barcode(&self, code: &str) -> Option<FoodRecord> {
        self.aggregator
            .lookup_barcode(code, &self.config.enabled_providers)
            .await
    }

    /// Condition annotation for a record; always returns a value
    pub async fn annotate(&self, record: &FoodRecord) -> ConditionAnnotation {
        self.resolver.annotate(record).await
    }

    /// Attach an annotation and its provenance to a record
    pub async fn resolve(&self, record: FoodRecord) -> AnnotatedFood {
        let (annotation, annotation_source) = self.resolver.resolve(&record).await;
        AnnotatedFood {
            record,
            annotation,
            annotation_source,
        }
    }

    /// Split a description into typed entries
    pub async fn extract(
        &self,
        description: &str,
        reference: DateTime<FixedOffset>,
    ) -> Vec<ParsedLogEntry> {
        self.extractor.extract(description, reference).await
    }

    /// Split a description and report which strategy was used
    pub async fn extract_with_source(
        &self,
        description: &str,
        reference: DateTime<FixedOffset>,
    ) -> Extraction {
        self.extractor
            .extract_with_source(description, reference)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{food, reference_at, FakeEntryModel, InMemoryAnnotationStore, StaticProvider};
    use crate::types::{AnnotationSource, Friendliness, ProviderId};
    use serde_json::json;

    #[tokio::test]
    async fn test_search_annotated_ranks_friendliest_first() {
        let crowd = StaticProvider::new(
            ProviderId::Crowd,
            vec![
                food(ProviderId::Crowd, "1", "Salted Popcorn"),
                food(ProviderId::Crowd, "2", "Banana"),
                food(ProviderId::Crowd, "3", "Rice Cakes"),
            ],
        );
        let ostomate = Ostomate::builder(CoreConfig::default())
            .without_local_provider()
            .provider(Arc::new(crowd))
            .build();

        let foods = ostomate
            .search_annotated("snack", &SearchOptions::default())
            .await;
        let names: Vec<&str> = foods.iter().map(|f| f.record.name.as_str()).collect();
        assert_eq!(names, vec!["Banana", "Rice Cakes", "Salted Popcorn"]);
        assert_eq!(foods[2].annotation.friendliness, Friendliness::Avoid);
    }

    #[tokio::test]
    async fn test_annotation_store_is_consulted() {
        let mut custom = ConditionAnnotation::neutral();
        custom.friendliness = Friendliness::Excellent;
        let store = InMemoryAnnotationStore::new().with("Oat Milk", custom);
        let ostomate = Ostomate::builder(CoreConfig::default())
            .annotation_store(Arc::new(store))
            .build();

        let annotated = ostomate
            .resolve(food(ProviderId::Premium, "7", "Oat Milk"))
            .await;
        assert_eq!(annotated.annotation_source, AnnotationSource::Store);
        assert_eq!(annotated.annotation.friendliness, Friendliness::Excellent);
    }

    #[tokio::test]
    async fn test_model_is_wired_into_extraction() {
        let model = FakeEntryModel::replying(json!({"entries": []}));
        let ostomate = Ostomate::builder(CoreConfig::default())
            .model(Arc::new(model))
            .build();
        let extraction = ostomate
            .extract_with_source("nothing much", reference_at(12))
            .await;
        assert_eq!(extraction.source, crate::extractor::ExtractionSource::Remote);
        assert!(extraction.entries.is_empty());
    }

    #[tokio::test]
    async fn test_default_search_options_follow_config() {
        let config = CoreConfig {
            default_limit: 5,
            ..CoreConfig::default()
        };
        let ostomate = Ostomate::new(config);
        assert_eq!(ostomate.default_search_options().limit, 5);
        assert_eq!(ostomate.aggregator().provider_ids(), vec![ProviderId::Local]);
    }
}
