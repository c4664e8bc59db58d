//! Test doubles for providers, models and annotation stores

use crate::condition::AnnotationStore;
use crate::extractor::{EntryModel, ExtractionRequest};
use crate::provider::FoodProvider;
use crate::types::{ConditionAnnotation, FoodRecord, ProviderId};
use crate::{OstomateError, Result};
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, TimeZone};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Provider that returns a fixed set of records for every query
pub struct StaticProvider {
    id: ProviderId,
    records: Vec<FoodRecord>,
    calls: AtomicUsize,
}

impl StaticProvider {
    /// Create a provider answering with `records`
    pub fn new(id: ProviderId, records: Vec<FoodRecord>) -> Self {
        Self {
            id,
            records,
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of search and barcode calls received
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FoodProvider for StaticProvider {
    fn id(&self) -> ProviderId {
        self.id
    }

    fn name(&self) -> &str {
        "static"
    }

    async fn search_by_query(&self, _query: &str, limit: usize) -> Result<Vec<FoodRecord>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.records.iter().take(limit).cloned().collect())
    }

    async fn get_by_barcode(&self, code: &str) -> Result<Option<FoodRecord>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .records
            .iter()
            .find(|r| r.barcode.as_deref() == Some(code))
            .cloned())
    }
}

/// Provider whose every call fails as a network error would
pub struct FailingProvider {
    id: ProviderId,
}

impl FailingProvider {
    /// Create a failing provider
    pub fn new(id: ProviderId) -> Self {
        Self { id }
    }
}

#[async_trait]
impl FoodProvider for FailingProvider {
    fn id(&self) -> ProviderId {
        self.id
    }

    fn name(&self) -> &str {
        "failing"
    }

    async fn search_by_query(&self, _query: &str, _limit: usize) -> Result<Vec<FoodRecord>> {
        Err(OstomateError::provider("connection reset by peer"))
    }

    async fn get_by_barcode(&self, _code: &str) -> Result<Option<FoodRecord>> {
        Err(OstomateError::provider("connection reset by peer"))
    }
}

/// Provider that sleeps before answering with nothing
pub struct SlowProvider {
    id: ProviderId,
    delay: Duration,
}

impl SlowProvider {
    /// Create a provider that takes `delay` to answer
    pub fn new(id: ProviderId, delay: Duration) -> Self {
        Self { id, delay }
    }
}

#[async_trait]
impl FoodProvider for SlowProvider {
    fn id(&self) -> ProviderId {
        self.id
    }

    fn name(&self) -> &str {
        "slow"
    }

    async fn search_by_query(&self, _query: &str, _limit: usize) -> Result<Vec<FoodRecord>> {
        tokio::time::sleep(self.delay).await;
        Ok(Vec::new())
    }

    async fn get_by_barcode(&self, _code: &str) -> Result<Option<FoodRecord>> {
        tokio::time::sleep(self.delay).await;
        Ok(None)
    }
}

/// Scripted language model
pub struct FakeEntryModel {
    reply: Option<serde_json::Value>,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl FakeEntryModel {
    /// Model that answers every request with `reply`
    pub fn replying(reply: serde_json::Value) -> Self {
        Self {
            reply: Some(reply),
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Model whose every request fails
    pub fn failing() -> Self {
        Self {
            reply: None,
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Sleep before answering
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of requests received
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EntryModel for FakeEntryModel {
    fn name(&self) -> &str {
        "fake"
    }

    async fn extract_entries(&self, _request: &ExtractionRequest) -> Result<serde_json::Value> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.reply
            .clone()
            .ok_or_else(|| OstomateError::model("service unavailable (503)"))
    }
}

/// Annotation store backed by a map
#[derive(Default)]
pub struct InMemoryAnnotationStore {
    annotations: HashMap<String, ConditionAnnotation>,
}

impl InMemoryAnnotationStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an annotation under a food id or name
    pub fn with(mut self, key: impl Into<String>, annotation: ConditionAnnotation) -> Self {
        self.annotations.insert(key.into(), annotation);
        self
    }
}

#[async_trait]
impl AnnotationStore for InMemoryAnnotationStore {
    async fn lookup_annotation(&self, key: &str) -> Result<Option<ConditionAnnotation>> {
        Ok(self.annotations.get(key).cloned())
    }
}

/// Build a record for tests
pub fn food(source: ProviderId, source_id: &str, name: &str) -> FoodRecord {
    FoodRecord::new(source, source_id, name)
}

/// A fixed reference instant on 2024-05-14 at `hour`:00 UTC
pub fn reference_at(hour: u32) -> DateTime<FixedOffset> {
    let utc = FixedOffset::east_opt(0).expect("zero offset is valid");
    utc.with_ymd_and_hms(2024, 5, 14, hour, 0, 0)
        .single()
        .expect("valid reference time")
}
