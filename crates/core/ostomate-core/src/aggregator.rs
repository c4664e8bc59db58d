//! Concurrent fan-out over food providers with name-based reconciliation
//!
//! Every provider call is wrapped so that its failure or timeout becomes an
//! empty contribution. The join waits for all calls to settle, then the
//! batches are flattened in provider priority order and deduplicated by
//! case-folded name, keeping the first record seen.

use crate::config::{CoreConfig, MAX_SEARCH_LIMIT};
use crate::dataset::{CuratedDataset, LocalDatasetProvider};
use crate::provider::FoodProvider;
use crate::types::{FoodRecord, ProviderId, ProviderSet};
use futures_util::future::join_all;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Per-search options
#[derive(Debug, Clone)]
pub struct SearchOptions {
    /// Providers to query; intersected with the aggregator's enabled set
    pub providers: ProviderSet,
    /// Maximum number of records; values above 50 are capped
    pub limit: usize,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            providers: ProviderSet::all(),
            limit: 25,
        }
    }
}

impl SearchOptions {
    /// Query only the given providers
    pub fn with_providers(mut self, providers: ProviderSet) -> Self {
        self.providers = providers;
        self
    }

    /// Set the limit
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Limit after applying the hard cap
    pub fn effective_limit(&self) -> usize {
        self.limit.min(MAX_SEARCH_LIMIT)
    }
}

/// What a single provider contributed to a search
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ContributionStatus {
    /// Call succeeded with this many records
    Ok {
        /// Records returned before deduplication
        count: usize,
    },
    /// Call failed; treated as zero records
    Failed {
        /// Error message
        error: String,
    },
    /// Call exceeded the provider timeout; treated as zero records
    TimedOut,
}

/// Per-provider diagnostics
#[derive(Debug, Clone, Serialize)]
pub struct ProviderContribution {
    /// Provider
    pub provider: ProviderId,
    /// Outcome
    #[serde(flatten)]
    pub status: ContributionStatus,
    /// Wall time of the call in milliseconds
    pub elapsed_ms: u64,
}

/// Search results together with per-provider diagnostics
#[derive(Debug, Clone, Serialize)]
pub struct SearchOutcome {
    /// Deduplicated, truncated records in priority order
    pub records: Vec<FoodRecord>,
    /// One entry per provider that was queried
    pub contributions: Vec<ProviderContribution>,
}

/// Fans searches out to the registered providers
pub struct Aggregator {
    providers: Vec<Arc<dyn FoodProvider>>,
    enabled: ProviderSet,
    provider_timeout: Duration,
}

impl Aggregator {
    /// Aggregator with the curated dataset registered and the given settings
    pub fn new(config: &CoreConfig) -> Self {
        let mut aggregator = Self::empty(config);
        aggregator.register(Arc::new(LocalDatasetProvider::new(
            CuratedDataset::global(),
            config.fuzzy_threshold,
        )));
        aggregator
    }

    /// Aggregator with no providers registered
    pub fn empty(config: &CoreConfig) -> Self {
        Self {
            providers: Vec::new(),
            enabled: config.enabled_providers.clone(),
            provider_timeout: config.provider_timeout,
        }
    }

    /// Register a provider; providers are kept in priority order
    pub fn register(&mut self, provider: Arc<dyn FoodProvider>) {
        debug!(provider = provider.name(), id = %provider.id(), "registering food provider");
        self.providers.push(provider);
        self.providers.sort_by_key(|p| p.id().priority());
    }

    /// Builder-style [`register`](Self::register)
    pub fn with_provider(mut self, provider: Arc<dyn FoodProvider>) -> Self {
        self.register(provider);
        self
    }

    /// Ids of the registered providers, in priority order
    pub fn provider_ids(&self) -> Vec<ProviderId> {
        self.providers.iter().map(|p| p.id()).collect()
    }

    /// Search and return only the records
    pub async fn search(&self, query: &str, options: &SearchOptions) -> Vec<FoodRecord> {
        self.search_detailed(query, options).await.records
    }

    /// Search and report what each provider contributed
    pub async fn search_detailed(&self, query: &str, options: &SearchOptions) -> SearchOutcome {
        let query = query.trim();
        let limit = options.effective_limit();
        if query.is_empty() || limit == 0 {
            return SearchOutcome {
                records: Vec::new(),
                contributions: Vec::new(),
            };
        }

        let selected = self.selected(&options.providers);
        let calls = selected
            .iter()
            .map(|provider| self.settled_search(provider.as_ref(), query, limit));
        let settled = join_all(calls).await;

        let mut contributions = Vec::with_capacity(settled.len());
        let mut batches = Vec::with_capacity(settled.len());
        for (contribution, records) in settled {
            contributions.push(contribution);
            batches.push(records);
        }

        let mut records = deduplicate(batches.into_iter().flatten());
        records.truncate(limit);
        debug!(query, count = records.len(), "aggregated search complete");

        SearchOutcome {
            records,
            contributions,
        }
    }

    /// Look a barcode up across providers; the highest-priority hit wins
    pub async fn lookup_barcode(&self, code: &str, providers: &ProviderSet) -> Option<FoodRecord> {
        let code = code.trim();
        if !is_plausible_barcode(code) {
            debug!(code, "ignoring implausible barcode");
            return None;
        }

        let selected = self.selected(providers);
        let calls = selected.iter().map(|provider| async move {
            match tokio::time::timeout(self.provider_timeout, provider.get_by_barcode(code)).await
            {
                Ok(Ok(found)) => found,
                Ok(Err(e)) => {
                    warn!(provider = provider.name(), error = %e, "barcode lookup failed");
                    None
                }
                Err(_) => {
                    warn!(provider = provider.name(), "barcode lookup timed out");
                    None
                }
            }
        });
        join_all(calls).await.into_iter().flatten().next()
    }

    fn selected(&self, requested: &ProviderSet) -> Vec<&Arc<dyn FoodProvider>> {
        self.providers
            .iter()
            .filter(|p| requested.contains(p.id()) && self.enabled.contains(p.id()))
            .collect()
    }

    async fn settled_search(
        &self,
        provider: &dyn FoodProvider,
        query: &str,
        limit: usize,
    ) -> (ProviderContribution, Vec<FoodRecord>) {
        let started = Instant::now();
        let result =
            tokio::time::timeout(self.provider_timeout, provider.search_by_query(query, limit))
                .await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        let (status, records) = match result {
            Ok(Ok(records)) => {
                debug!(provider = provider.name(), count = records.len(), elapsed_ms, "provider answered");
                (
                    ContributionStatus::Ok {
                        count: records.len(),
                    },
                    records,
                )
            }
            Ok(Err(e)) => {
                warn!(provider = provider.name(), error = %e, "provider search failed; contributing no results");
                (
                    ContributionStatus::Failed {
                        error: e.to_string(),
                    },
                    Vec::new(),
                )
            }
            Err(_) => {
                warn!(provider = provider.name(), elapsed_ms, "provider search timed out; contributing no results");
                (ContributionStatus::TimedOut, Vec::new())
            }
        };

        (
            ProviderContribution {
                provider: provider.id(),
                status,
                elapsed_ms,
            },
            records,
        )
    }
}

/// Keep the first record for each case-folded name (and each id).
///
/// Input must already be in provider priority order.
pub fn deduplicate(records: impl IntoIterator<Item = FoodRecord>) -> Vec<FoodRecord> {
    let mut names = HashSet::new();
    let mut ids = HashSet::new();
    let mut out = Vec::new();
    for record in records {
        let name = record.normalized_name();
        if name.is_empty() {
            continue;
        }
        if names.contains(&name) || ids.contains(&record.id) {
            continue;
        }
        names.insert(name);
        ids.insert(record.id.clone());
        out.push(record);
    }
    out
}

fn is_plausible_barcode(code: &str) -> bool {
    (6..=14).contains(&code.len()) && code.chars().all(|c| c.is_ascii_digit())
}
