//! Free-text daily log extraction
//!
//! Two interchangeable strategies produce the same [`ParsedLogEntry`] shape:
//! a remote language model whose JSON reply is normalized by [`remote`], and
//! the deterministic [`local::LocalExtractor`]. The remote strategy is tried
//! first when one is configured; any failure, timeout or malformed reply
//! selects the local one. There is no retry.

pub mod local;
pub mod remote;
pub mod timing;
pub mod vocabulary;

pub use local::LocalExtractor;

use crate::types::ParsedLogEntry;
use crate::Result;
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Payload sent to the language model collaborator
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionRequest {
    /// The user's description of their day
    pub free_text: String,
    /// Instant that relative times are resolved against
    pub reference_timestamp: DateTime<FixedOffset>,
}

impl ExtractionRequest {
    /// Create a request
    pub fn new(free_text: impl Into<String>, reference_timestamp: DateTime<FixedOffset>) -> Self {
        Self {
            free_text: free_text.into(),
            reference_timestamp,
        }
    }
}

/// An external model that turns a description into raw entry JSON
#[async_trait]
pub trait EntryModel: Send + Sync {
    /// Model name for logs
    fn name(&self) -> &str;

    /// Return the model's raw structured reply
    async fn extract_entries(&self, request: &ExtractionRequest) -> Result<serde_json::Value>;
}

/// Which strategy produced an extraction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionSource {
    /// Normalized language model reply
    Remote,
    /// Deterministic local pass
    Local,
}

/// Entries together with the strategy that produced them
#[derive(Debug, Clone, Serialize)]
pub struct Extraction {
    /// Strategy used
    pub source: ExtractionSource,
    /// Extracted entries, possibly empty
    pub entries: Vec<ParsedLogEntry>,
}

impl Extraction {
    fn local(entries: Vec<ParsedLogEntry>) -> Self {
        Self {
            source: ExtractionSource::Local,
            entries,
        }
    }
}

/// Remote-first extractor with a local fallback
pub struct EntryExtractor {
    model: Option<Arc<dyn EntryModel>>,
    local: LocalExtractor,
    model_timeout: Duration,
}

impl EntryExtractor {
    /// Create an extractor that only runs the local pass
    pub fn new(local: LocalExtractor, model_timeout: Duration) -> Self {
        Self {
            model: None,
            local,
            model_timeout,
        }
    }

    /// Try this model before falling back
    pub fn with_model(mut self, model: Arc<dyn EntryModel>) -> Self {
        self.model = Some(model);
        self
    }

    /// Whether a remote model is configured
    pub fn has_model(&self) -> bool {
        self.model.is_some()
    }

    /// Extract entries from a description
    pub async fn extract(
        &self,
        description: &str,
        reference: DateTime<FixedOffset>,
    ) -> Vec<ParsedLogEntry> {
        self.extract_with_source(description, reference)
            .await
            .entries
    }

    /// Extract entries and report which strategy produced them
    pub async fn extract_with_source(
        &self,
        description: &str,
        reference: DateTime<FixedOffset>,
    ) -> Extraction {
        let description = description.trim();
        if description.is_empty() {
            return Extraction::local(Vec::new());
        }

        if let Some(model) = &self.model {
            match self.try_remote(model.as_ref(), description, reference).await {
                Ok(entries) => {
                    debug!(model = model.name(), count = entries.len(), "remote extraction succeeded");
                    return Extraction {
                        source: ExtractionSource::Remote,
                        entries,
                    };
                }
                Err(e) => {
                    warn!(model = model.name(), error = %e, "remote extraction failed, using local pass");
                }
            }
        }

        Extraction::local(self.local.extract(description, reference).await)
    }

    async fn try_remote(
        &self,
        model: &dyn EntryModel,
        description: &str,
        reference: DateTime<FixedOffset>,
    ) -> Result<Vec<ParsedLogEntry>> {
        let request = ExtractionRequest::new(description, reference);
        let value = tokio::time::timeout(self.model_timeout, model.extract_entries(&request))
            .await
            .map_err(|_| {
                crate::OstomateError::timeout(format!(
                    "{} did not answer within {:?}",
                    model.name(),
                    self.model_timeout
                ))
            })??;
        remote::normalize(&value, reference)
    }
}
