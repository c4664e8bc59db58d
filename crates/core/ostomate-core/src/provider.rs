//! Seam between the aggregator and the food data sources

use crate::types::{FoodRecord, ProviderId};
use crate::Result;
use async_trait::async_trait;

/// A source of food records.
///
/// Implementations translate their provider's payloads into [`FoodRecord`]s
/// and must default missing or malformed fields instead of failing the whole
/// call. Errors are reserved for transport failures and payloads that cannot
/// be read at all.
#[async_trait]
pub trait FoodProvider: Send + Sync {
    /// Which slot of the priority order this provider occupies
    fn id(&self) -> ProviderId;

    /// Human readable provider name for logs
    fn name(&self) -> &str;

    /// Search foods by free-text query
    async fn search_by_query(&self, query: &str, limit: usize) -> Result<Vec<FoodRecord>>;

    /// Look a product up by EAN/UPC barcode
    async fn get_by_barcode(&self, code: &str) -> Result<Option<FoodRecord>>;
}
